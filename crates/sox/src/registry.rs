//! Catalog of supported socket options.
//!
//! Every option the access layer can read or write is described by a
//! [`SocketOptionSpec`]: its kernel (level, code) pair, the inclusive range
//! of values accepted by `set`, and whether the raw 32-bit value is
//! unsigned. The [`OptionRegistry`] indexes the built-in table by name and
//! enumerates it in a fixed display order so list output is reproducible.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

// Not exported by every libc release (linux/tcp.h).
const TCP_REPAIR: libc::c_int = 19;
const TCP_REPAIR_QUEUE: libc::c_int = 20;
const TCP_QUEUE_SEQ: libc::c_int = 21;
const TCP_TIMESTAMP: libc::c_int = 24;

/// Protocol layer an option belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Level {
    /// Generic socket layer (`SOL_SOCKET`).
    Socket = libc::SOL_SOCKET,
    /// TCP layer (`IPPROTO_TCP`).
    Tcp = libc::IPPROTO_TCP,
}

impl Level {
    /// Platform numeric constant for this level.
    pub fn as_raw(self) -> libc::c_int {
        self as libc::c_int
    }

    /// Parse from the platform numeric constant.
    pub fn from_raw(value: libc::c_int) -> Option<Self> {
        match value {
            libc::SOL_SOCKET => Some(Self::Socket),
            libc::IPPROTO_TCP => Some(Self::Tcp),
            _ => None,
        }
    }

    /// Symbolic name of the level constant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Socket => "SOL_SOCKET",
            Self::Tcp => "IPPROTO_TCP",
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_raw())
    }
}

/// Static description of one socket option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SocketOptionSpec {
    /// Option name, e.g. `TCP_NODELAY`.
    pub name: &'static str,
    /// Protocol level.
    pub level: Level,
    /// Option number within the level.
    pub code: libc::c_int,
    /// Inclusive minimum accepted by `set`.
    pub min_value: i64,
    /// Inclusive maximum accepted by `set`; `None` means unbounded.
    pub max_value: Option<i64>,
    /// Human-readable explanation.
    pub description: &'static str,
    /// Raw value is an unsigned 32-bit integer.
    pub unsigned: bool,
}

impl SocketOptionSpec {
    const fn new(
        name: &'static str,
        level: Level,
        code: libc::c_int,
        min_value: i64,
        max_value: Option<i64>,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            level,
            code,
            min_value,
            max_value,
            description,
            unsigned: false,
        }
    }

    const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Check whether `value` lies in the declared range.
    pub fn contains(&self, value: i64) -> bool {
        value >= self.min_value && self.max_value.is_none_or(|max| value <= max)
    }
}

const TCP: Level = Level::Tcp;
const SOCKET: Level = Level::Socket;

/// Built-in option table, grouped by level.
pub const BUILTIN_OPTIONS: &[SocketOptionSpec] = &[
    // TCP level
    SocketOptionSpec::new(
        "TCP_NODELAY",
        TCP,
        libc::TCP_NODELAY,
        0,
        Some(1),
        "Disable Nagle's algorithm (0: disabled, 1: enabled)",
    ),
    SocketOptionSpec::new(
        "TCP_MAXSEG",
        TCP,
        libc::TCP_MAXSEG,
        536,
        Some(65535),
        "Maximum segment size (bytes)",
    ),
    SocketOptionSpec::new(
        "TCP_CORK",
        TCP,
        libc::TCP_CORK,
        0,
        Some(1),
        "Don't send partial frames (0: disabled, 1: enabled)",
    ),
    SocketOptionSpec::new(
        "TCP_KEEPIDLE",
        TCP,
        libc::TCP_KEEPIDLE,
        1,
        Some(32767),
        "Idle time before sending keepalive probes (seconds)",
    ),
    SocketOptionSpec::new(
        "TCP_KEEPINTVL",
        TCP,
        libc::TCP_KEEPINTVL,
        1,
        Some(32767),
        "Interval between keepalive probes (seconds)",
    ),
    SocketOptionSpec::new(
        "TCP_KEEPCNT",
        TCP,
        libc::TCP_KEEPCNT,
        1,
        Some(127),
        "Number of keepalive probes before dropping the connection",
    ),
    SocketOptionSpec::new(
        "TCP_SYNCNT",
        TCP,
        libc::TCP_SYNCNT,
        1,
        Some(127),
        "Number of SYN retransmits before giving up",
    ),
    SocketOptionSpec::new(
        "TCP_LINGER2",
        TCP,
        libc::TCP_LINGER2,
        -1,
        Some(32767),
        "Lifetime of orphaned FIN-WAIT-2 state (seconds, -1: disabled)",
    ),
    SocketOptionSpec::new(
        "TCP_DEFER_ACCEPT",
        TCP,
        libc::TCP_DEFER_ACCEPT,
        0,
        Some(32767),
        "Delay accept() until data arrives (seconds)",
    ),
    SocketOptionSpec::new(
        "TCP_WINDOW_CLAMP",
        TCP,
        libc::TCP_WINDOW_CLAMP,
        0,
        None,
        "Bound on the advertised window (bytes)",
    ),
    SocketOptionSpec::new(
        "TCP_QUICKACK",
        TCP,
        libc::TCP_QUICKACK,
        0,
        Some(1),
        "Enable quickack mode (0: disabled, 1: enabled)",
    ),
    SocketOptionSpec::new(
        "TCP_FASTOPEN",
        TCP,
        libc::TCP_FASTOPEN,
        0,
        None,
        "TCP Fast Open (0: disabled, others: pending SYN queue length)",
    ),
    SocketOptionSpec::new(
        "TCP_USER_TIMEOUT",
        TCP,
        libc::TCP_USER_TIMEOUT,
        0,
        None,
        "Max time transmitted data may stay unacknowledged (milliseconds)",
    ),
    SocketOptionSpec::new(
        "TCP_REPAIR",
        TCP,
        TCP_REPAIR,
        0,
        Some(1),
        "TCP repair mode (0: off, 1: on)",
    ),
    SocketOptionSpec::new(
        "TCP_REPAIR_QUEUE",
        TCP,
        TCP_REPAIR_QUEUE,
        0,
        Some(3),
        "Queue selected in repair mode (0: none, 1: recv, 2: send, 3: urgent)",
    ),
    SocketOptionSpec::new(
        "TCP_QUEUE_SEQ",
        TCP,
        TCP_QUEUE_SEQ,
        0,
        None,
        "Sequence number of the repair queue",
    )
    .unsigned(),
    SocketOptionSpec::new(
        "TCP_TIMESTAMP",
        TCP,
        TCP_TIMESTAMP,
        0,
        None,
        "Current TCP timestamp offset",
    )
    .unsigned(),
    // Socket level
    SocketOptionSpec::new(
        "SO_KEEPALIVE",
        SOCKET,
        libc::SO_KEEPALIVE,
        0,
        Some(1),
        "Enable TCP keepalive (0: disabled, 1: enabled)",
    ),
    SocketOptionSpec::new(
        "SO_RCVBUF",
        SOCKET,
        libc::SO_RCVBUF,
        2048,
        None,
        "Socket receive buffer size (bytes)",
    ),
    SocketOptionSpec::new(
        "SO_SNDBUF",
        SOCKET,
        libc::SO_SNDBUF,
        2048,
        None,
        "Socket send buffer size (bytes)",
    ),
    SocketOptionSpec::new(
        "SO_RCVLOWAT",
        SOCKET,
        libc::SO_RCVLOWAT,
        1,
        None,
        "Minimum bytes to process for receive operations",
    ),
    SocketOptionSpec::new(
        "SO_SNDLOWAT",
        SOCKET,
        libc::SO_SNDLOWAT,
        1,
        None,
        "Minimum bytes to process for send operations",
    ),
    SocketOptionSpec::new(
        "SO_REUSEADDR",
        SOCKET,
        libc::SO_REUSEADDR,
        0,
        Some(1),
        "Allow reuse of local addresses (0: disabled, 1: enabled)",
    ),
    SocketOptionSpec::new(
        "SO_REUSEPORT",
        SOCKET,
        libc::SO_REUSEPORT,
        0,
        Some(1),
        "Allow multiple sockets to bind the same address/port (0: disabled, 1: enabled)",
    ),
];

/// Order in which options are listed.
pub const DISPLAY_ORDER: &[&str] = &[
    "SO_KEEPALIVE",
    "TCP_KEEPIDLE",
    "TCP_KEEPINTVL",
    "TCP_KEEPCNT",
    "TCP_USER_TIMEOUT",
    "TCP_NODELAY",
    "TCP_MAXSEG",
    "TCP_CORK",
    "TCP_SYNCNT",
    "TCP_LINGER2",
    "TCP_DEFER_ACCEPT",
    "TCP_WINDOW_CLAMP",
    "TCP_QUICKACK",
    "TCP_REPAIR",
    "TCP_REPAIR_QUEUE",
    "TCP_QUEUE_SEQ",
    "TCP_FASTOPEN",
    "TCP_TIMESTAMP",
    "SO_RCVBUF",
    "SO_SNDBUF",
    "SO_RCVLOWAT",
    "SO_SNDLOWAT",
    "SO_REUSEADDR",
    "SO_REUSEPORT",
];

/// Read-only index over the option table.
///
/// Build one at startup and pass it by reference to the components that
/// need it.
#[derive(Debug, Clone)]
pub struct OptionRegistry {
    specs: &'static [SocketOptionSpec],
    by_name: HashMap<&'static str, usize>,
    order: Vec<usize>,
}

impl OptionRegistry {
    /// Build the registry over [`BUILTIN_OPTIONS`] in [`DISPLAY_ORDER`].
    ///
    /// # Panics
    ///
    /// Panics if [`DISPLAY_ORDER`] names an option missing from the table.
    pub fn new() -> Self {
        match Self::with_order(DISPLAY_ORDER) {
            Ok(registry) => registry,
            Err(e) => panic!("built-in display order is inconsistent: {}", e),
        }
    }

    /// Build the registry over [`BUILTIN_OPTIONS`] enumerated in `order`.
    ///
    /// Options not named in `order` remain available to [`lookup`] but are
    /// not enumerated. Naming an option twice is an error.
    ///
    /// [`lookup`]: OptionRegistry::lookup
    pub fn with_order(order: &[&str]) -> Result<Self> {
        let by_name: HashMap<_, _> = BUILTIN_OPTIONS
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name, i))
            .collect();

        let mut seen = vec![false; BUILTIN_OPTIONS.len()];
        let order = order
            .iter()
            .map(|name| {
                let i = by_name
                    .get(*name)
                    .copied()
                    .ok_or_else(|| Error::unknown_option(*name))?;
                if std::mem::replace(&mut seen[i], true) {
                    return Err(Error::InvalidArgument(format!(
                        "option {} listed twice",
                        name
                    )));
                }
                Ok(i)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            specs: BUILTIN_OPTIONS,
            by_name,
            order,
        })
    }

    /// Look up an option by name.
    pub fn lookup(&self, name: &str) -> Result<&'static SocketOptionSpec> {
        let specs = self.specs;
        self.by_name
            .get(name)
            .map(|&i| &specs[i])
            .ok_or_else(|| Error::unknown_option(name))
    }

    /// Iterate over options in display order.
    pub fn iter(&self) -> impl Iterator<Item = &'static SocketOptionSpec> + '_ {
        let specs = self.specs;
        self.order.iter().map(move |&i| &specs[i])
    }

    /// Option names in display order.
    pub fn names(&self) -> Vec<&'static str> {
        self.order.iter().map(|&i| self.specs[i].name).collect()
    }

    /// Number of enumerated options.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if no options are enumerated.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for OptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
