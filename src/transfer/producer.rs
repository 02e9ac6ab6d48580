use async_stream::stream;
use futures::Stream;
use tokio::net::TcpStream;

use crate::config::ReceiverSettings;
use crate::transfer::connection::Connection;

/* The console dials out to the desktop tool, so connections come from a connect loop instead of a
 * listener. */
pub struct ConnectionProducer {
    settings: ReceiverSettings,
}

impl ConnectionProducer {
    pub fn new(settings: ReceiverSettings) -> Self {
        Self { settings }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.settings.host, self.settings.port)
    }

    async fn connect(&self) -> std::io::Result<Connection<TcpStream>> {
        let addr = self.addr();
        let socket = TcpStream::connect(&addr).await?;
        socket.set_nodelay(true)?;
        Ok(Connection::new(socket, addr, self.settings.read_timeout_s))
    }

    /* Returned stream never ends. Failed attempts are retried after the reconnect interval. */
    pub fn connections(&self) -> impl Stream<Item = Connection<TcpStream>> + '_ {
        stream! {
            loop {
                match self.connect().await {
                    Ok(c) => {
                        log::info!("Connected to {}", self.addr());
                        yield c;
                    }
                    Err(e) => log::debug!("Could not connect to {}: {}", self.addr(), e),
                }
                tokio::time::sleep(self.settings.reconnect_interval_s).await;
            }
        }
    }
}
