//! Common test utilities for integration tests.
//!
//! Provides loopback TCP connections, a child process holding a socket and
//! helper macros for conditional test execution.

use std::net::{TcpListener, TcpStream};
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
use std::process::{Child, Command, Stdio};

use sox::{PidFd, ProcessHandle};

/// A connected loopback TCP pair.
pub struct TcpPair {
    #[allow(dead_code)]
    pub listener: TcpListener,
    pub client: TcpStream,
    #[allow(dead_code)]
    pub server: TcpStream,
}

impl TcpPair {
    /// Connect a client to a fresh loopback listener.
    pub fn new() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let client = TcpStream::connect(listener.local_addr()?)?;
        let (server, _) = listener.accept()?;
        Ok(Self {
            listener,
            client,
            server,
        })
    }

    /// Descriptor number of the client end in this process.
    pub fn client_fd(&self) -> RawFd {
        self.client.as_raw_fd()
    }
}

/// A child process whose stdin is one end of a TCP connection.
///
/// The socket is fd 0 in the child. Killed on drop.
pub struct SocketHolder {
    child: Child,
}

impl SocketHolder {
    /// Spawn `sleep` holding a duplicate of `stream`.
    pub fn spawn(stream: &TcpStream) -> std::io::Result<Self> {
        let fd: OwnedFd = stream.as_fd().try_clone_to_owned()?;
        let child = Command::new("sleep")
            .arg("30")
            .stdin(Stdio::from(fd))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(Self { child })
    }

    /// Pid of the child.
    pub fn pid(&self) -> libc::pid_t {
        self.child.id() as libc::pid_t
    }
}

impl Drop for SocketHolder {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Current process id.
pub fn self_pid() -> libc::pid_t {
    std::process::id() as libc::pid_t
}

/// Check if pidfd_open and pidfd_getfd work on this process.
pub fn pidfd_available() -> bool {
    let Ok(pidfd) = PidFd::open(self_pid()) else {
        return false;
    };
    // Duplicate the pidfd itself; stdin may be closed under some runners.
    pidfd.duplicate_descriptor(pidfd.as_fd().as_raw_fd()).is_ok()
}

/// Skip the test if pidfd descriptor duplication is unavailable.
#[macro_export]
macro_rules! require_pidfd {
    () => {
        if !crate::common::pidfd_available() {
            eprintln!("Skipping test: pidfd_getfd unavailable");
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_pair() {
        let pair = TcpPair::new().unwrap();
        assert_eq!(
            pair.client.local_addr().unwrap(),
            pair.server.peer_addr().unwrap()
        );
    }
}
