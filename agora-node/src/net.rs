//! Socket plumbing: interface discovery, broadcast, multicast groups.

use rand::Rng;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;

/// Learn the address of the outbound interface by dummy-connecting a UDP
/// socket. The connect only performs a local route lookup; no packet
/// leaves the host.
pub fn local_ip(probe: SocketAddr) -> io::Result<IpAddr> {
    let socket = std::net::UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(probe)?;
    Ok(socket.local_addr()?.ip())
}

/// The limited broadcast address on the given port.
pub fn broadcast_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::BROADCAST, port))
}

/// Pick a fresh multicast group in 239.1.0.0 – 239.255.255.255.
///
/// 239.0.0.0/16 is skipped as reserved. Two rooms landing on the same
/// group is tolerated: the room id inside every payload disambiguates.
pub fn random_group(port: u16) -> SocketAddr {
    let mut rng = rand::thread_rng();
    let ip = Ipv4Addr::new(
        239,
        rng.gen_range(1..=255),
        rng.gen_range(0..=255),
        rng.gen_range(0..=255),
    );
    SocketAddr::from((ip, port))
}

/// Bind the shared unicast socket: broadcast sends enabled, multicast
/// sends routed through `multicast_if` when pinned.
pub fn bind_unicast(port: u16, multicast_if: Option<Ipv4Addr>) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_broadcast(true)?;
    if let Some(iface) = multicast_if {
        socket.set_multicast_if_v4(&iface)?;
    }
    socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())?;
    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into())
}

/// Build a socket joined to a room's multicast group.
///
/// Reuse-address lets every process on the host (and every joined room)
/// share the well-known multicast port; loopback stays on so co-hosted
/// peers hear each other. The wildcard bind means traffic for colliding
/// groups can arrive here too; payload room ids sort that out.
pub fn join_group(group: SocketAddr, multicast_if: Option<Ipv4Addr>) -> io::Result<UdpSocket> {
    let ip = match group.ip() {
        IpAddr::V4(ip) => ip,
        IpAddr::V6(_) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "multicast groups are IPv4",
            ))
        }
    };
    if !ip.is_multicast() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{ip} is not a multicast address"),
        ));
    }

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, group.port())).into())?;
    socket.join_multicast_v4(&ip, &multicast_if.unwrap_or(Ipv4Addr::UNSPECIFIED))?;
    socket.set_multicast_loop_v4(true)?;
    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into())
}
