//! Single-option get and set.

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};

use crate::error::{Access, Bound, Error, Result};
use crate::registry::{Level, OptionRegistry, SocketOptionSpec};
use crate::resolver::ResolvedDescriptor;
use crate::types::{OptionResult, OptionValue};

/// Integer socket option I/O on some socket.
pub trait SocketOptionIo {
    /// Read an integer option.
    fn get_int(&self, level: Level, code: libc::c_int) -> io::Result<libc::c_int>;

    /// Write an integer option.
    fn set_int(&self, level: Level, code: libc::c_int, value: libc::c_int) -> io::Result<()>;
}

impl SocketOptionIo for BorrowedFd<'_> {
    fn get_int(&self, level: Level, code: libc::c_int) -> io::Result<libc::c_int> {
        let mut value: libc::c_int = 0;
        let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;

        // SAFETY: value and len point to valid, correctly sized storage.
        let ret = unsafe {
            libc::getsockopt(
                self.as_raw_fd(),
                level.as_raw(),
                code,
                &mut value as *mut libc::c_int as *mut libc::c_void,
                &mut len,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(value)
    }

    fn set_int(&self, level: Level, code: libc::c_int, value: libc::c_int) -> io::Result<()> {
        // SAFETY: value is a valid c_int for the duration of the call.
        let ret = unsafe {
            libc::setsockopt(
                self.as_raw_fd(),
                level.as_raw(),
                code,
                &value as *const libc::c_int as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl SocketOptionIo for ResolvedDescriptor {
    fn get_int(&self, level: Level, code: libc::c_int) -> io::Result<libc::c_int> {
        self.as_fd().get_int(level, code)
    }

    fn set_int(&self, level: Level, code: libc::c_int, value: libc::c_int) -> io::Result<()> {
        self.as_fd().set_int(level, code, value)
    }
}

/// Reads and writes one option at a time, validating against the registry.
#[derive(Debug, Clone, Copy)]
pub struct OptionAccessor<'a> {
    registry: &'a OptionRegistry,
}

impl<'a> OptionAccessor<'a> {
    /// Create an accessor over `registry`.
    pub fn new(registry: &'a OptionRegistry) -> Self {
        Self { registry }
    }

    /// Get the registry.
    pub fn registry(&self) -> &'a OptionRegistry {
        self.registry
    }

    /// Read the current value of option `name`.
    pub fn get<S: SocketOptionIo + ?Sized>(&self, sock: &S, name: &str) -> Result<OptionResult> {
        let spec = self.registry.lookup(name)?;
        self.get_spec(sock, spec)
    }

    /// Read the current value of the option described by `spec`.
    pub fn get_spec<S: SocketOptionIo + ?Sized>(
        &self,
        sock: &S,
        spec: &SocketOptionSpec,
    ) -> Result<OptionResult> {
        let raw = sock
            .get_int(spec.level, spec.code)
            .map_err(|source| Error::OptionAccessFailed {
                name: spec.name.to_string(),
                op: Access::Get,
                source,
            })?;

        tracing::trace!(option = spec.name, raw, "read option");
        Ok(OptionResult::new(spec, OptionValue::from_raw(spec, raw)))
    }

    /// Write `value` to option `name`, then return the value actually in
    /// effect.
    ///
    /// The kernel may round or clamp the requested value (buffer sizes are
    /// doubled, for example), so the result is read back rather than echoed.
    pub fn set<S: SocketOptionIo + ?Sized>(
        &self,
        sock: &S,
        name: &str,
        value: i64,
    ) -> Result<OptionResult> {
        let spec = self.registry.lookup(name)?;
        let raw = validate(spec, value)?;

        sock.set_int(spec.level, spec.code, raw)
            .map_err(|source| Error::OptionAccessFailed {
                name: spec.name.to_string(),
                op: Access::Set,
                source,
            })?;
        tracing::debug!(option = spec.name, value, "wrote option");

        self.get_spec(sock, spec)
    }
}

/// Check `value` against the declared range and the 32-bit representation,
/// returning the raw integer to write.
pub fn validate(spec: &SocketOptionSpec, value: i64) -> Result<libc::c_int> {
    let out_of_range = |bound| Error::ValueOutOfRange {
        name: spec.name.to_string(),
        value,
        bound,
    };

    if value < spec.min_value {
        return Err(out_of_range(Bound::Min(spec.min_value)));
    }
    if let Some(max) = spec.max_value
        && value > max
    {
        return Err(out_of_range(Bound::Max(max)));
    }

    if spec.unsigned {
        u32::try_from(value)
            .map(|v| v as libc::c_int)
            .map_err(|_| out_of_range(Bound::Max(i64::from(u32::MAX))))
    } else {
        libc::c_int::try_from(value).map_err(|_| out_of_range(Bound::Max(i64::from(i32::MAX))))
    }
}
