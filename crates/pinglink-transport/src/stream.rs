use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::traits::ByteStream;

/// A connected link stream. Implements Read + Write and [`ByteStream`].
///
/// On Unix this can wrap a Unix domain socket (socat/ser2net style serial
/// bridges, socket pairs in tests). Anywhere it can wrap a TCP connection.
pub struct LinkStream {
    inner: LinkStreamInner,
}

enum LinkStreamInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
    Tcp(TcpStream),
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.read(buf),
            LinkStreamInner::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.write(buf),
            LinkStreamInner::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.flush(),
            LinkStreamInner::Tcp(stream) => stream.flush(),
        }
    }
}

impl LinkStream {
    /// Create a LinkStream from a Unix domain socket stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkStreamInner::Unix(stream),
        }
    }

    /// Create a LinkStream from a TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: LinkStreamInner::Tcp(stream),
        }
    }

    /// Connect to a Unix socket path exposing the serial line.
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = std::os::unix::net::UnixStream::connect(path).map_err(|source| {
            TransportError::ConnectUnix {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(path = %path.display(), "connected unix link");
        Ok(Self::from_unix(stream))
    }

    /// Connect to a TCP serial bridge, trying each resolved address in turn.
    pub fn connect_tcp(addr: impl ToSocketAddrs + std::fmt::Debug, timeout: Duration) -> Result<Self> {
        let label = format!("{addr:?}");
        let addrs = addr
            .to_socket_addrs()
            .map_err(|_| TransportError::Resolve(label.clone()))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    tracing::debug!(%addr, "connected tcp link");
                    return Ok(Self::from_tcp(stream));
                }
                Err(source) => last_err = Some(TransportError::ConnectTcp { addr, source }),
            }
        }

        Err(last_err.unwrap_or(TransportError::Resolve(label)))
    }

    /// Create a connected pair of Unix socket streams.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }

    /// Set read timeout on the underlying stream.
    ///
    /// Reads that time out surface as empty [`ByteStream::read_bytes`] results.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Peer address for TCP links.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => None,
            LinkStreamInner::Tcp(stream) => stream.peer_addr().ok(),
        }
    }

    fn shutdown(&self) -> std::io::Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.shutdown(Shutdown::Both),
            LinkStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl ByteStream for LinkStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        LinkStream::set_read_timeout(self, timeout)
    }

    fn read_bytes(&mut self, max_bytes: usize) -> Result<Bytes> {
        if max_bytes == 0 {
            return Ok(Bytes::new());
        }

        let mut buf = vec![0u8; max_bytes];
        loop {
            match self.read(&mut buf) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Bytes::from(buf));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
                {
                    return Ok(Bytes::new());
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        match self.write_all(data).and_then(|()| self.flush()) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WriteZero | ErrorKind::BrokenPipe | ErrorKind::NotConnected
                ) =>
            {
                Err(TransportError::Closed)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self.shutdown() {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
            LinkStreamInner::Tcp(stream) => Ok(Self::from_tcp(stream.try_clone()?)),
        }
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => f.debug_struct("LinkStream").field("type", &"unix").finish(),
            LinkStreamInner::Tcp(stream) => f
                .debug_struct("LinkStream")
                .field("type", &"tcp")
                .field("peer", &stream.peer_addr().ok())
                .finish(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    #[test]
    fn pair_roundtrip() {
        let (mut left, mut right) = LinkStream::pair().unwrap();
        left.write_bytes(b"BR").unwrap();

        let got = right.read_bytes(16).unwrap();
        assert_eq!(got.as_ref(), b"BR");
    }

    #[test]
    fn read_respects_max_bytes() {
        let (mut left, mut right) = LinkStream::pair().unwrap();
        left.write_bytes(&[1, 2, 3, 4, 5]).unwrap();

        let first = right.read_bytes(2).unwrap();
        let rest = right.read_bytes(16).unwrap();
        assert_eq!(first.as_ref(), &[1, 2]);
        assert_eq!(rest.as_ref(), &[3, 4, 5]);
    }

    #[test]
    fn read_timeout_yields_empty_buffer() {
        let (_left, mut right) = LinkStream::pair().unwrap();
        right
            .set_read_timeout(Some(Duration::from_millis(10)))
            .unwrap();

        let got = right.read_bytes(8).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn zero_max_bytes_does_not_touch_stream() {
        let (_left, mut right) = LinkStream::pair().unwrap();
        assert!(right.read_bytes(0).unwrap().is_empty());
    }

    #[test]
    fn remote_drop_reports_closed() {
        let (left, mut right) = LinkStream::pair().unwrap();
        drop(left);

        let err = right.read_bytes(8).unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[test]
    fn close_unblocks_reader_on_clone() {
        let (_left, right) = LinkStream::pair().unwrap();
        let mut reader = right.try_clone().unwrap();
        let mut closer = right;

        let handle = thread::spawn(move || reader.read_bytes(8));
        thread::sleep(Duration::from_millis(20));
        closer.close().unwrap();

        let result = handle.join().unwrap();
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[test]
    fn tcp_connect_and_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut stream = LinkStream::from_tcp(stream);
            let got = stream.read_bytes(16).unwrap();
            stream.write_bytes(&got).unwrap();
        });

        let mut client = LinkStream::connect_tcp(addr, Duration::from_secs(1)).unwrap();
        assert_eq!(client.peer_addr(), Some(addr));
        client.write_bytes(b"ping").unwrap();
        let echoed = client.read_bytes(16).unwrap();
        assert_eq!(echoed.as_ref(), b"ping");

        server.join().unwrap();
    }

    #[test]
    fn connect_unix_missing_path_fails() {
        let path = std::env::temp_dir().join(format!(
            "pinglink-missing-{}.sock",
            std::process::id()
        ));
        let err = LinkStream::connect_unix(&path).unwrap_err();
        assert!(matches!(err, TransportError::ConnectUnix { .. }));
    }
}
