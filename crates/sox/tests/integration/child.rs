//! Options of a socket owned by another process.

use sox::{OptionRegistry, OptionValue, Result, SockOpt};

use crate::common::{SocketHolder, TcpPair};

#[test]
fn test_set_on_child_socket() -> Result<()> {
    require_pidfd!();

    let pair = TcpPair::new()?;
    let holder = match SocketHolder::spawn(&pair.client) {
        Ok(holder) => holder,
        Err(e) => {
            eprintln!("Skipping test: cannot spawn child: {}", e);
            return Ok(());
        }
    };

    let registry = OptionRegistry::new();
    let sockopt = SockOpt::new(&registry);

    // A child of the test process is ptrace-accessible to it; a sandbox may
    // still refuse.
    let result = match sockopt.set_option(holder.pid(), 0, "TCP_NODELAY", 1) {
        Ok(result) => result,
        Err(e) if e.is_permission_denied() => {
            eprintln!("Skipping test: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    assert_eq!(result.value, Some(OptionValue::Signed(1)));

    // Same kernel socket, so the change shows through our descriptor.
    assert!(pair.client.nodelay()?);

    Ok(())
}

#[test]
fn test_exited_process() -> Result<()> {
    require_pidfd!();

    let mut child = match std::process::Command::new("true").spawn() {
        Ok(child) => child,
        Err(e) => {
            eprintln!("Skipping test: cannot spawn child: {}", e);
            return Ok(());
        }
    };
    let pid = child.id() as libc::pid_t;
    child.wait()?;

    let registry = OptionRegistry::new();
    let err = SockOpt::new(&registry).list_options(pid, 0).unwrap_err();
    assert!(err.is_not_found(), "{}", err);

    Ok(())
}
