//! Cross-process TCP socket option access for Linux.
//!
//! This crate reads and writes integer socket options (`TCP_NODELAY`,
//! `SO_RCVBUF`, `TCP_KEEPIDLE`, ...) on sockets owned by other running
//! processes, addressed by process id and descriptor number. The descriptor
//! is duplicated into the calling process with `pidfd_getfd(2)`; since both
//! copies refer to the same kernel socket, option changes are visible to the
//! owner immediately.
//!
//! # Features
//!
//! - Validated writes against a built-in option registry
//! - Read-back of the value the kernel actually applied
//! - Best-effort listing of every option with per-option diagnostics
//! - TCP socket discovery via procfs to find (pid, fd) pairs
//!
//! # Example
//!
//! ```ignore
//! use sox::{OptionRegistry, SockOpt};
//!
//! fn main() -> sox::Result<()> {
//!     let registry = OptionRegistry::new();
//!     let sockopt = SockOpt::new(&registry);
//!
//!     // Disable Nagle on fd 5 of process 1234
//!     let result = sockopt.set_option(1234, 5, "TCP_NODELAY", 1)?;
//!     println!("TCP_NODELAY = {:?}", result.value);
//!
//!     let listing = sockopt.list_options(1234, 5)?;
//!     for row in listing.rows() {
//!         println!("{:?}", row);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Permissions
//!
//! Duplicating another process's descriptor requires ptrace access to it:
//! the same user with a permissive Yama `ptrace_scope`, or `CAP_SYS_PTRACE`.
//! Failures report [`Error::is_permission_denied`].

pub mod accessor;
pub mod error;
pub mod lister;
pub mod procfs;
pub mod registry;
pub mod resolver;
pub mod sockopt;
pub mod types;

pub use accessor::{OptionAccessor, SocketOptionIo};
pub use error::{Access, Bound, Error, Result};
pub use lister::OptionLister;
pub use procfs::{AddressFamily, SocketOwner, TcpSocketEntry, TcpState};
pub use registry::{BUILTIN_OPTIONS, DISPLAY_ORDER, Level, OptionRegistry, SocketOptionSpec};
pub use resolver::{
    DescriptorResolver, PidFd, PidFdOpener, ProcessHandle, ProcessOpener, ResolvedDescriptor,
};
pub use sockopt::SockOpt;
pub use types::{OptionDiagnostic, OptionListing, OptionResult, OptionValue};
