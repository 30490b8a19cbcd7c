//! Socket transport and the host-side collaborators that act on a lease.

pub mod configurator;
pub mod interface;
pub mod resolv;

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use std::{
    io,
    net::{Ipv4Addr, SocketAddr, UdpSocket as StdUdpSocket},
};
use thiserror::Error;
use tokio::net::UdpSocket as TokioUdpSocket;

/// One variant per step of setting up the client socket.
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("Failed to open UDP socket")]
    Open(#[source] io::Error),

    #[error("Failed to enable SO_BROADCAST")]
    Broadcast(#[source] io::Error),

    #[error("Failed to enable SO_REUSEADDR")]
    ReuseAddress(#[source] io::Error),

    #[error("Failed to pin socket to interface '{interface}'")]
    BindToDevice {
        interface: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind socket to port {port}")]
    BindSocket {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Failed to register socket with the runtime")]
    Register(#[source] io::Error),

    #[error("Pinning a socket to an interface is only supported on Linux")]
    NotImplemented,
}

/// Datagram endpoint used by the negotiation driver.
///
/// Implementations deliver whole datagrams; the driver bounds every `recv`
/// with its own timeout.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, packet: &[u8], target: SocketAddr) -> io::Result<usize>;
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// A broadcast-capable UDP endpoint pinned to one interface.
///
/// The socket is closed when the transport is dropped.
pub struct UdpTransport {
    socket: TokioUdpSocket,
}

impl UdpTransport {
    /// Opens the DHCP client socket on `interface`: broadcast-enabled,
    /// address-reusable, pinned with `SO_BINDTODEVICE` and bound to
    /// `0.0.0.0:port`, so replies to the limited broadcast address arrive.
    pub fn bind(interface: &str, port: u16) -> Result<Self, SocketError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(SocketError::Open)?;
        socket.set_broadcast(true).map_err(SocketError::Broadcast)?;
        socket
            .set_reuse_address(true)
            .map_err(SocketError::ReuseAddress)?;
        pin_to_device(&socket, interface)?;

        let local = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        socket
            .bind(&local.into())
            .map_err(|source| SocketError::BindSocket { port, source })?;
        socket.set_nonblocking(true).map_err(SocketError::Register)?;

        let socket = TokioUdpSocket::from_std(StdUdpSocket::from(socket))
            .map_err(SocketError::Register)?;
        tracing::debug!("{}: listening on {}", interface, local);
        Ok(Self { socket })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&mut self, packet: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(packet, target).await
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (len, addr) = self.socket.recv_from(buf).await?;
        tracing::debug!("Received {} bytes from {}", len, addr);
        Ok(len)
    }
}

#[cfg(target_os = "linux")]
fn pin_to_device(socket: &Socket, interface: &str) -> Result<(), SocketError> {
    use std::os::fd::AsRawFd;

    // SAFETY: the descriptor is open for the lifetime of `socket` and the
    // option value is the interface name with its exact length.
    let ret = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_BINDTODEVICE,
            interface.as_ptr().cast::<libc::c_void>(),
            interface.len() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(SocketError::BindToDevice {
            interface: interface.to_string(),
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn pin_to_device(_socket: &Socket, _interface: &str) -> Result<(), SocketError> {
    Err(SocketError::NotImplemented)
}
