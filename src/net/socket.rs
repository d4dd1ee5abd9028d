//! Socket configuration boundary.

use std::io;
use std::time::Duration;

/// Contract the transport layer provides for per-connection timeout setup.
///
/// [`ServerSettings::configure_socket`](crate::config::ServerSettings::configure_socket)
/// is generic over this trait; the connection handle stays opaque to the
/// admission core. Implementations apply the timeout to the one socket they
/// wrap and nothing else.
pub trait ConfigurableSocket {
    fn set_receive_timeout(&self, timeout: Duration) -> io::Result<()>;
    fn set_send_timeout(&self, timeout: Duration) -> io::Result<()>;
}

impl ConfigurableSocket for std::net::TcpStream {
    fn set_receive_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.set_read_timeout(Some(timeout))
    }

    fn set_send_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.set_write_timeout(Some(timeout))
    }
}
