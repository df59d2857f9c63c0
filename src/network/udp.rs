use std::io::Result;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::config::RECV_BUFFER_SIZE;

pub struct UdpServer {
    socket: UdpSocket,
}

impl UdpServer {
    pub async fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        tracing::info!("UDP server listening on {}", socket.local_addr()?);
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub async fn recv(&self) -> Result<(Vec<u8>, SocketAddr)> {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let (len, addr) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        Ok((buf, addr))
    }

    pub async fn send(&self, data: &[u8], addr: SocketAddr) -> Result<()> {
        self.socket.send_to(data, addr).await?;
        Ok(())
    }

    pub async fn send_to_many(&self, data: &[u8], addrs: &[SocketAddr]) {
        for addr in addrs {
            if let Err(e) = self.socket.send_to(data, addr).await {
                tracing::warn!("Failed to send to {}: {}", addr, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_recv() {
        let server = UdpServer::bind("127.0.0.1:0").await.unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        client.send_to(b"hello", server_addr).await.unwrap();
        let (data, from) = server.recv().await.unwrap();
        assert_eq!(data, b"hello");
        assert_eq!(from, client.local_addr().unwrap());

        server.send_to_many(b"back", &[from]).await;
        let mut buf = [0u8; 16];
        let (len, _) = client.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"back");
    }
}
