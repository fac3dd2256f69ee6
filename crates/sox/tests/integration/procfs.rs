//! TCP socket discovery integration tests.

use sox::procfs::{socket_inodes, tcp_sockets};
use sox::{Result, TcpState};

use crate::common::{TcpPair, self_pid};

#[test]
fn test_finds_own_connection() -> Result<()> {
    let pair = TcpPair::new()?;
    let local = pair.client.local_addr()?;

    let sockets = tcp_sockets(Some(self_pid()))?;
    let entry = sockets
        .iter()
        .find(|e| e.local == local)
        .expect("client socket listed");

    assert_eq!(entry.state, TcpState::Established);
    assert_eq!(entry.remote, pair.client.peer_addr()?);

    let owner = entry.owner.expect("owner resolved");
    assert_eq!(owner.pid, self_pid());

    // The owner fd is one of the two descriptors for this socket.
    let inodes = socket_inodes(self_pid())?;
    assert!(inodes.contains(&(owner.fd, entry.inode)));

    Ok(())
}

#[test]
fn test_pid_filter_only_returns_owned() -> Result<()> {
    let _pair = TcpPair::new()?;

    let sockets = tcp_sockets(Some(self_pid()))?;
    assert!(
        sockets
            .iter()
            .all(|e| e.owner.is_some_and(|o| o.pid == self_pid()))
    );
    assert!(sockets.iter().any(|e| e.state == TcpState::Listen));

    Ok(())
}
