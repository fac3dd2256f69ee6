//! Error types for socket option access.

use std::fmt;
use std::io;

/// Result type for socket option operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of an option's legal range a value violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Value is below the inclusive minimum.
    Min(i64),
    /// Value is above the inclusive maximum.
    Max(i64),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Min(min) => write!(f, "is below minimum {}", min),
            Bound::Max(max) => write!(f, "exceeds maximum {}", max),
        }
    }
}

/// The kind of socket option access that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// getsockopt(2).
    Get,
    /// setsockopt(2).
    Set,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Get => f.write_str("get"),
            Access::Set => f.write_str("set"),
        }
    }
}

/// Errors that can occur while resolving a foreign descriptor or accessing
/// one of its options.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Argument rejected before any system call was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The target process could not be referenced.
    #[error("cannot access process {pid}: {source}")]
    ProcessUnavailable {
        /// Target process id.
        pid: i32,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The descriptor could not be duplicated from the target process.
    #[error("cannot duplicate fd {fd} of process {pid}: {source}")]
    DescriptorUnavailable {
        /// Target process id.
        pid: i32,
        /// Descriptor number in the target process.
        fd: i32,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Option name is not in the registry.
    #[error("unknown socket option: {name}")]
    UnknownOption {
        /// The requested option name.
        name: String,
    },

    /// Requested value violates the option's declared bounds.
    #[error("value {value} {bound} for option {name}")]
    ValueOutOfRange {
        /// Option name.
        name: String,
        /// Requested value.
        value: i64,
        /// The violated bound.
        bound: Bound,
    },

    /// getsockopt/setsockopt failed on a resolved descriptor.
    #[error("failed to {op} option {name}: {source}")]
    OptionAccessFailed {
        /// Option name.
        name: String,
        /// Operation that failed.
        op: Access,
        /// Underlying OS error.
        source: io::Error,
    },

    /// I/O error while reading procfs.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an unknown option error.
    pub fn unknown_option(name: impl Into<String>) -> Self {
        Error::UnknownOption { name: name.into() }
    }

    /// Get the errno value if this error wraps an OS error.
    pub fn errno(&self) -> Option<i32> {
        self.os_error().and_then(io::Error::raw_os_error)
    }

    /// Check if this is a permission error (EPERM, EACCES).
    ///
    /// Both process and descriptor access require ptrace-level access to the
    /// target, so callers can use this to suggest running with elevated
    /// privileges.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM) | Some(libc::EACCES))
    }

    /// Check if the target process or descriptor is gone (ESRCH, EBADF).
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::ProcessUnavailable { source, .. } => {
                source.raw_os_error() == Some(libc::ESRCH)
            }
            Error::DescriptorUnavailable { source, .. } => {
                source.raw_os_error() == Some(libc::EBADF)
            }
            Error::UnknownOption { .. } => true,
            _ => false,
        }
    }

    fn os_error(&self) -> Option<&io::Error> {
        match self {
            Error::ProcessUnavailable { source, .. }
            | Error::DescriptorUnavailable { source, .. }
            | Error::OptionAccessFailed { source, .. }
            | Error::Io(source) => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_out_of_range_message() {
        let err = Error::ValueOutOfRange {
            name: "TCP_MAXSEG".into(),
            value: 70000,
            bound: Bound::Max(65535),
        };
        assert_eq!(
            err.to_string(),
            "value 70000 exceeds maximum 65535 for option TCP_MAXSEG"
        );

        let err = Error::ValueOutOfRange {
            name: "TCP_KEEPCNT".into(),
            value: 0,
            bound: Bound::Min(1),
        };
        assert_eq!(
            err.to_string(),
            "value 0 is below minimum 1 for option TCP_KEEPCNT"
        );
    }

    #[test]
    fn test_is_permission_denied() {
        let err = Error::ProcessUnavailable {
            pid: 1,
            source: io::Error::from_raw_os_error(libc::EPERM),
        };
        assert!(err.is_permission_denied());
        assert_eq!(err.errno(), Some(libc::EPERM));

        let err = Error::DescriptorUnavailable {
            pid: 1,
            fd: 3,
            source: io::Error::from_raw_os_error(libc::EACCES),
        };
        assert!(err.is_permission_denied());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_is_not_found() {
        let err = Error::ProcessUnavailable {
            pid: 99999,
            source: io::Error::from_raw_os_error(libc::ESRCH),
        };
        assert!(err.is_not_found());
        assert!(!err.is_permission_denied());

        let err = Error::DescriptorUnavailable {
            pid: 42,
            fd: 77,
            source: io::Error::from_raw_os_error(libc::EBADF),
        };
        assert!(err.is_not_found());
        assert!(Error::unknown_option("NOPE").is_not_found());
    }

    #[test]
    fn test_access_failed_message() {
        let err = Error::OptionAccessFailed {
            name: "TCP_CORK".into(),
            op: Access::Set,
            source: io::Error::from_raw_os_error(libc::EOPNOTSUPP),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("failed to set option TCP_CORK"));
        assert_eq!(err.errno(), Some(libc::EOPNOTSUPP));
        assert_eq!(Error::InvalidArgument("pid".into()).errno(), None);
    }
}
