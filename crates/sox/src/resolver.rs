//! Local duplicates of descriptors owned by other processes.
//!
//! Resolution goes through a process handle: the target is opened by pid,
//! then asked for a copy of one of its descriptors. On Linux this is
//! `pidfd_open(2)` followed by `pidfd_getfd(2)`, which requires ptrace
//! access to the target (same user and no Yama restriction, or
//! `CAP_SYS_PTRACE`).
//!
//! The target can close or reuse the descriptor at any time. A resolved
//! descriptor refers to the socket that was open at resolution time and is
//! never cached; each operation resolves afresh.

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use crate::error::{Error, Result};

/// A handle to a running process that can hand out copies of its
/// descriptors.
pub trait ProcessHandle {
    /// Duplicate descriptor `fd` of the process into the calling process.
    fn duplicate_descriptor(&self, fd: RawFd) -> io::Result<OwnedFd>;
}

/// Opens [`ProcessHandle`]s by pid.
pub trait ProcessOpener {
    /// The handle type produced.
    type Handle: ProcessHandle;

    /// Open a handle to process `pid`.
    fn open(&self, pid: libc::pid_t) -> io::Result<Self::Handle>;
}

/// A Linux process file descriptor.
#[derive(Debug)]
pub struct PidFd {
    fd: OwnedFd,
}

impl PidFd {
    /// Open a pidfd for `pid`.
    pub fn open(pid: libc::pid_t) -> io::Result<Self> {
        // SAFETY: pidfd_open takes a pid and a flags word and returns a new
        // descriptor or -1.
        let ret = unsafe { libc::syscall(libc::SYS_pidfd_open, pid, 0 as libc::c_uint) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        // SAFETY: the kernel returned a fresh descriptor that we now own.
        let fd = unsafe { OwnedFd::from_raw_fd(ret as RawFd) };
        Ok(Self { fd })
    }
}

impl ProcessHandle for PidFd {
    fn duplicate_descriptor(&self, fd: RawFd) -> io::Result<OwnedFd> {
        // SAFETY: pidfd_getfd takes a pidfd, a target descriptor number and
        // a flags word, and returns a new descriptor or -1.
        let ret = unsafe {
            libc::syscall(
                libc::SYS_pidfd_getfd,
                self.fd.as_raw_fd(),
                fd,
                0 as libc::c_uint,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        // SAFETY: the kernel returned a fresh descriptor (O_CLOEXEC set)
        // that we now own.
        Ok(unsafe { OwnedFd::from_raw_fd(ret as RawFd) })
    }
}

impl AsFd for PidFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

/// The default opener, backed by pidfd.
#[derive(Debug, Clone, Copy, Default)]
pub struct PidFdOpener;

impl ProcessOpener for PidFdOpener {
    type Handle = PidFd;

    fn open(&self, pid: libc::pid_t) -> io::Result<PidFd> {
        PidFd::open(pid)
    }
}

/// A local descriptor referring to a socket owned by another process.
///
/// Closed on drop.
#[derive(Debug)]
pub struct ResolvedDescriptor {
    fd: OwnedFd,
    pid: libc::pid_t,
    target_fd: RawFd,
}

impl ResolvedDescriptor {
    /// Wrap an already-owned socket descriptor.
    ///
    /// `pid` and `target_fd` record where the descriptor came from.
    pub fn from_owned(fd: OwnedFd, pid: libc::pid_t, target_fd: RawFd) -> Self {
        Self { fd, pid, target_fd }
    }

    /// Process the descriptor was duplicated from.
    pub fn pid(&self) -> libc::pid_t {
        self.pid
    }

    /// Descriptor number in the owning process.
    pub fn target_fd(&self) -> RawFd {
        self.target_fd
    }
}

impl AsFd for ResolvedDescriptor {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for ResolvedDescriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

/// Resolves (pid, fd) pairs to local descriptors.
#[derive(Debug, Clone, Default)]
pub struct DescriptorResolver<O = PidFdOpener> {
    opener: O,
}

impl DescriptorResolver<PidFdOpener> {
    /// Create a resolver backed by pidfd.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: ProcessOpener> DescriptorResolver<O> {
    /// Create a resolver using a custom process opener.
    pub fn with_opener(opener: O) -> Self {
        Self { opener }
    }

    /// Get the process opener.
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Duplicate descriptor `fd` of process `pid` into this process.
    pub fn resolve(&self, pid: libc::pid_t, fd: RawFd) -> Result<ResolvedDescriptor> {
        if pid <= 0 {
            return Err(Error::InvalidArgument(format!(
                "pid must be positive, got {}",
                pid
            )));
        }
        if fd < 0 {
            return Err(Error::InvalidArgument(format!(
                "fd must be non-negative, got {}",
                fd
            )));
        }

        let handle = self.opener.open(pid).map_err(|source| {
            // No process handles at all: the descriptor can never be reached.
            if source.raw_os_error() == Some(libc::ENOSYS) {
                Error::DescriptorUnavailable { pid, fd, source }
            } else {
                Error::ProcessUnavailable { pid, source }
            }
        })?;

        let local = handle
            .duplicate_descriptor(fd)
            .map_err(|source| Error::DescriptorUnavailable { pid, fd, source })?;

        if !is_socket(local.as_fd())
            .map_err(|source| Error::DescriptorUnavailable { pid, fd, source })?
        {
            return Err(Error::DescriptorUnavailable {
                pid,
                fd,
                source: io::Error::from_raw_os_error(libc::ENOTSOCK),
            });
        }

        tracing::debug!(pid, fd, local_fd = local.as_raw_fd(), "resolved descriptor");
        Ok(ResolvedDescriptor::from_owned(local, pid, fd))
    }
}

fn is_socket(fd: BorrowedFd<'_>) -> io::Result<bool> {
    // SAFETY: zeroed stat is a valid out-buffer for fstat.
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    // SAFETY: fd is a valid borrowed descriptor and st is writable.
    let ret = unsafe { libc::fstat(fd.as_raw_fd(), &mut st) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(st.st_mode & libc::S_IFMT == libc::S_IFSOCK)
}
