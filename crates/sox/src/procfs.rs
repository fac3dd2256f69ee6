//! TCP socket discovery via procfs.
//!
//! Finds the (pid, fd) pairs that the rest of the crate operates on: the
//! kernel's `/proc/net/tcp` and `/proc/net/tcp6` tables list every TCP
//! socket with its inode, and each process's `/proc/<pid>/fd` links name the
//! socket inodes it holds.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::os::fd::RawFd;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Address family of a TCP table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AddressFamily {
    /// IPv4 (`/proc/net/tcp`).
    Inet,
    /// IPv6 (`/proc/net/tcp6`).
    Inet6,
}

impl AddressFamily {
    /// Table file name under `net/`.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Inet => "tcp",
            Self::Inet6 => "tcp6",
        }
    }
}

/// TCP socket states as numbered by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TcpState {
    /// Unknown state.
    Unknown = 0,
    /// Connection established.
    Established = 1,
    /// SYN sent, waiting for matching SYN.
    SynSent = 2,
    /// SYN received, waiting for ACK.
    SynRecv = 3,
    /// FIN sent, waiting for FIN or FIN-ACK.
    FinWait1 = 4,
    /// FIN received, waiting for FIN.
    FinWait2 = 5,
    /// In TIME-WAIT state.
    TimeWait = 6,
    /// Socket is closed.
    Close = 7,
    /// FIN received, close pending.
    CloseWait = 8,
    /// Close wait acknowledged, waiting for FIN.
    LastAck = 9,
    /// Socket is listening.
    Listen = 10,
    /// Both sides sent FIN simultaneously.
    Closing = 11,
    /// New SYN received (kernel only).
    NewSynRecv = 12,
}

impl TcpState {
    /// Parse from a raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Established,
            2 => Self::SynSent,
            3 => Self::SynRecv,
            4 => Self::FinWait1,
            5 => Self::FinWait2,
            6 => Self::TimeWait,
            7 => Self::Close,
            8 => Self::CloseWait,
            9 => Self::LastAck,
            10 => Self::Listen,
            11 => Self::Closing,
            12 => Self::NewSynRecv,
            _ => Self::Unknown,
        }
    }

    /// Get the state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Established => "ESTABLISHED",
            Self::SynSent => "SYN_SENT",
            Self::SynRecv => "SYN_RECV",
            Self::FinWait1 => "FIN_WAIT1",
            Self::FinWait2 => "FIN_WAIT2",
            Self::TimeWait => "TIME_WAIT",
            Self::Close => "CLOSE",
            Self::CloseWait => "CLOSE_WAIT",
            Self::LastAck => "LAST_ACK",
            Self::Listen => "LISTEN",
            Self::Closing => "CLOSING",
            Self::NewSynRecv => "NEW_SYN_RECV",
        }
    }
}

/// Process and descriptor holding a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SocketOwner {
    /// Owning process.
    pub pid: libc::pid_t,
    /// Descriptor number in that process.
    pub fd: RawFd,
}

/// One row of a TCP table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TcpSocketEntry {
    /// Table the entry came from.
    pub family: AddressFamily,
    /// Local address and port.
    pub local: SocketAddr,
    /// Remote address and port.
    pub remote: SocketAddr,
    /// Connection state.
    pub state: TcpState,
    /// Socket owner UID.
    pub uid: u32,
    /// Socket inode.
    pub inode: u64,
    /// Holder of the socket, if one was found.
    pub owner: Option<SocketOwner>,
}

/// Parse the contents of `/proc/net/tcp` or `/proc/net/tcp6`.
///
/// The header line and malformed lines are skipped.
pub fn parse_proc_net_tcp(content: &str, family: AddressFamily) -> Vec<TcpSocketEntry> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| parse_tcp_line(line, family))
        .collect()
}

fn parse_tcp_line(line: &str, family: AddressFamily) -> Option<TcpSocketEntry> {
    // sl local_address rem_address st tx_queue:rx_queue tr:tm->when retrnsmt uid timeout inode
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 10 {
        return None;
    }

    Some(TcpSocketEntry {
        family,
        local: parse_socket_addr(fields[1])?,
        remote: parse_socket_addr(fields[2])?,
        state: TcpState::from_u8(u8::from_str_radix(fields[3], 16).ok()?),
        uid: fields[7].parse().ok()?,
        inode: fields[9].parse().ok()?,
        owner: None,
    })
}

/// Parse a `ADDR:PORT` pair as printed in the TCP tables.
///
/// The address is printed as 32-bit words in host byte order, the port as a
/// plain hex number.
fn parse_socket_addr(s: &str) -> Option<SocketAddr> {
    let (addr, port) = s.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;

    let ip = match addr.len() {
        8 => IpAddr::V4(Ipv4Addr::from(parse_word(addr)?)),
        32 => {
            let mut octets = [0u8; 16];
            for (i, chunk) in octets.chunks_exact_mut(4).enumerate() {
                chunk.copy_from_slice(&parse_word(addr.get(i * 8..i * 8 + 8)?)?);
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return None,
    };

    Some(SocketAddr::new(ip, port))
}

fn parse_word(hex: &str) -> Option<[u8; 4]> {
    u32::from_str_radix(hex, 16).ok().map(u32::to_ne_bytes)
}

/// Parse a `/proc/<pid>/fd/<n>` link target of the form `socket:[inode]`.
pub fn parse_socket_link(target: &str) -> Option<u64> {
    target
        .strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

/// List `(fd, inode)` for every socket descriptor held by `pid`.
pub fn socket_inodes(pid: libc::pid_t) -> Result<Vec<(RawFd, u64)>> {
    socket_inodes_in(Path::new("/proc"), pid)
}

fn socket_inodes_in(proc_root: &Path, pid: libc::pid_t) -> Result<Vec<(RawFd, u64)>> {
    let mut sockets = Vec::new();

    for entry in fs::read_dir(proc_root.join(pid.to_string()).join("fd"))? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(fd) = name.to_str().and_then(|s| s.parse::<RawFd>().ok()) else {
            continue;
        };
        // The descriptor may be closed between readdir and readlink.
        let Ok(target) = fs::read_link(entry.path()) else {
            continue;
        };
        if let Some(inode) = target.to_str().and_then(parse_socket_link) {
            sockets.push((fd, inode));
        }
    }

    sockets.sort_unstable();
    Ok(sockets)
}

/// Enumerate TCP sockets and the processes holding them.
///
/// With `pid` set, the tables are read from that process's network
/// namespace and only sockets it holds are returned; failing to read that
/// process's tables or descriptors is an error. Otherwise every process is
/// scanned; processes whose descriptors cannot be read are skipped and their
/// sockets are returned without an owner.
pub fn tcp_sockets(pid: Option<libc::pid_t>) -> Result<Vec<TcpSocketEntry>> {
    tcp_sockets_in(Path::new("/proc"), pid)
}

fn tcp_sockets_in(proc_root: &Path, pid: Option<libc::pid_t>) -> Result<Vec<TcpSocketEntry>> {
    let net_dir = match pid {
        Some(pid) => proc_root.join(pid.to_string()).join("net"),
        None => proc_root.join("net"),
    };

    let mut entries = Vec::new();
    for family in [AddressFamily::Inet, AddressFamily::Inet6] {
        match fs::read_to_string(net_dir.join(family.table())) {
            Ok(content) => entries.extend(parse_proc_net_tcp(&content, family)),
            // IPv6 may be disabled.
            Err(e) if family == AddressFamily::Inet6 && e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(table = family.table(), "table not present");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut owners: HashMap<u64, SocketOwner> = HashMap::new();
    let mut record = |pid, sockets: Vec<(RawFd, u64)>| {
        for (fd, inode) in sockets {
            owners.entry(inode).or_insert(SocketOwner { pid, fd });
        }
    };

    match pid {
        Some(pid) => record(pid, socket_inodes_in(proc_root, pid)?),
        None => {
            for pid in all_pids(proc_root)? {
                match socket_inodes_in(proc_root, pid) {
                    Ok(sockets) => record(pid, sockets),
                    Err(e) => tracing::debug!(pid, error = %e, "cannot read descriptors"),
                }
            }
        }
    }

    for entry in &mut entries {
        entry.owner = owners.get(&entry.inode).copied();
    }
    if pid.is_some() {
        entries.retain(|e| e.owner.is_some());
    }

    Ok(entries)
}

fn all_pids(proc_root: &Path) -> Result<Vec<libc::pid_t>> {
    let mut pids: Vec<libc::pid_t> = fs::read_dir(proc_root)?
        .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse().ok())
        .collect();
    pids.sort_unstable();
    Ok(pids)
}
