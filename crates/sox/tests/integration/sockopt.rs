//! Get, set and list integration tests.
//!
//! Operates on sockets of the test process through the pidfd path.

use sox::{DISPLAY_ORDER, Error, OptionRegistry, OptionValue, Result, SockOpt};

use crate::common::{TcpPair, self_pid};

#[test]
fn test_set_then_get_nodelay() -> Result<()> {
    require_pidfd!();

    let pair = TcpPair::new()?;
    let registry = OptionRegistry::new();
    let sockopt = SockOpt::new(&registry);

    let set = sockopt.set_option(self_pid(), pair.client_fd(), "TCP_NODELAY", 1)?;
    assert_eq!(set.value, Some(OptionValue::Signed(1)));

    let get = sockopt.get_option(self_pid(), pair.client_fd(), "TCP_NODELAY")?;
    assert_eq!(get, set);

    // The change is visible through the original descriptor.
    assert!(pair.client.nodelay()?);

    Ok(())
}

#[test]
fn test_set_is_idempotent() -> Result<()> {
    require_pidfd!();

    let pair = TcpPair::new()?;
    let registry = OptionRegistry::new();
    let sockopt = SockOpt::new(&registry);

    let first = sockopt.set_option(self_pid(), pair.client_fd(), "TCP_KEEPIDLE", 120)?;
    let second = sockopt.set_option(self_pid(), pair.client_fd(), "TCP_KEEPIDLE", 120)?;
    assert_eq!(first, second);
    assert_eq!(first.value, Some(OptionValue::Signed(120)));

    Ok(())
}

#[test]
fn test_buffer_size_reports_kernel_value() -> Result<()> {
    require_pidfd!();

    let pair = TcpPair::new()?;
    let registry = OptionRegistry::new();
    let sockopt = SockOpt::new(&registry);

    let result = sockopt.set_option(self_pid(), pair.client_fd(), "SO_RCVBUF", 65536)?;
    let value = result.value.map(|v| v.as_i64()).unwrap_or_default();

    // Linux doubles the requested size for bookkeeping overhead.
    assert!(value >= 65536, "SO_RCVBUF = {}", value);

    Ok(())
}

#[test]
fn test_out_of_range_leaves_socket_untouched() -> Result<()> {
    require_pidfd!();

    let pair = TcpPair::new()?;
    let registry = OptionRegistry::new();
    let sockopt = SockOpt::new(&registry);

    let before = sockopt.get_option(self_pid(), pair.client_fd(), "TCP_KEEPCNT")?;
    let err = sockopt
        .set_option(self_pid(), pair.client_fd(), "TCP_KEEPCNT", 0)
        .unwrap_err();
    assert!(matches!(err, Error::ValueOutOfRange { .. }));
    assert!(err.to_string().contains("TCP_KEEPCNT"));

    let after = sockopt.get_option(self_pid(), pair.client_fd(), "TCP_KEEPCNT")?;
    assert_eq!(before, after);

    Ok(())
}

#[test]
fn test_unknown_option() -> Result<()> {
    require_pidfd!();

    let pair = TcpPair::new()?;
    let registry = OptionRegistry::new();
    let sockopt = SockOpt::new(&registry);

    let err = sockopt
        .get_option(self_pid(), pair.client_fd(), "TCP_NOT_AN_OPTION")
        .unwrap_err();
    assert!(matches!(err, Error::UnknownOption { ref name } if name == "TCP_NOT_AN_OPTION"));
    assert!(err.is_not_found());

    Ok(())
}

#[test]
fn test_list_follows_display_order() -> Result<()> {
    require_pidfd!();

    let pair = TcpPair::new()?;
    let registry = OptionRegistry::new();
    let sockopt = SockOpt::new(&registry);

    let listing = sockopt.list_options(self_pid(), pair.client_fd())?;
    assert!(!listing.results.is_empty());

    // Results are a subsequence of the display order.
    let mut order = DISPLAY_ORDER.iter();
    for result in &listing.results {
        assert!(
            order.any(|name| *name == result.name),
            "{} out of order",
            result.name
        );
    }

    let rows = listing.rows();
    let names: Vec<_> = rows.iter().map(|r| r.name).collect();
    assert_eq!(names, DISPLAY_ORDER);

    // A plain connected socket exposes at least these.
    for name in ["SO_KEEPALIVE", "TCP_NODELAY", "SO_RCVBUF", "SO_SNDBUF"] {
        assert!(listing.results.iter().any(|r| r.name == name), "{}", name);
    }

    Ok(())
}

#[test]
fn test_descriptor_not_open() -> Result<()> {
    require_pidfd!();

    let registry = OptionRegistry::new();
    let sockopt = SockOpt::new(&registry);

    // Far above any descriptor the test harness opens.
    let err = sockopt.list_options(self_pid(), 1_000_000).unwrap_err();
    assert!(matches!(err, Error::DescriptorUnavailable { .. }));
    assert!(err.is_not_found());

    Ok(())
}

#[test]
fn test_descriptor_not_socket() -> Result<()> {
    require_pidfd!();

    let file = std::fs::File::open("/dev/null")?;
    let registry = OptionRegistry::new();
    let sockopt = SockOpt::new(&registry);

    let err = sockopt
        .get_option(
            self_pid(),
            std::os::fd::AsRawFd::as_raw_fd(&file),
            "TCP_NODELAY",
        )
        .unwrap_err();
    assert_eq!(err.errno(), Some(libc::ENOTSOCK));

    Ok(())
}
