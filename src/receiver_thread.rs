use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::{TransferError, TransferResult};
use crate::transfer::{Connection, ConnectionProducer, ReceivedScript, ScriptDirectory, ScriptReceiver};
use crate::util::thread::{local_runtime, ServiceThread};
use crate::util::timeout::cancellable;

pub const GREETING: &str = "connected!";

/* Owns the link to the desktop tool. Socket reads never share a thread with the host tick loop. */
pub fn spawn(
    config: Settings,
    tx: UnboundedSender<ReceivedScript>,
    shutdown_token: CancellationToken,
) -> std::io::Result<ServiceThread> {
    ServiceThread::spawn("receiver", shutdown_token, move |token| run(config, tx, token))
}

fn run(config: Settings, tx: UnboundedSender<ReceivedScript>, shutdown_token: CancellationToken) {
    let Some(local_loop) = local_runtime("receiver") else {
        return;
    };
    let producer = ConnectionProducer::new(config.receiver.clone());
    let receiver = ScriptReceiver::new(
        ScriptDirectory::new(&config.storage.script_directory),
        config.receiver.max_script_size,
    );
    local_loop.block_on(receive_loop(&producer, &receiver, &tx, &shutdown_token));
    log::debug!("Receiver thread finished");
}

pub async fn receive_loop(
    producer: &ConnectionProducer,
    receiver: &ScriptReceiver,
    tx: &UnboundedSender<ReceivedScript>,
    shutdown_token: &CancellationToken,
) {
    let connections = producer.connections();
    futures::pin_mut!(connections);
    while let Some(Some(mut conn)) = cancellable(connections.next(), shutdown_token).await {
        match cancellable(serve_connection(&mut conn, receiver, tx), shutdown_token).await {
            None => break,
            Some(Ok(())) => log::info!("{} closed", conn),
            Some(Err(e)) => log::warn!("{} dropped: {}", conn, e),
        }
        if tx.is_closed() {
            break;
        }
    }
}

/* Serves one connection until the peer goes away. Completed scripts are handed to `tx` as soon as
 * they are on disk. */
pub async fn serve_connection<S: AsyncRead + AsyncWrite + Unpin>(
    conn: &mut Connection<S>,
    receiver: &ScriptReceiver,
    tx: &UnboundedSender<ReceivedScript>,
) -> TransferResult<()> {
    conn.send_message(GREETING).await?;
    loop {
        let script = match receiver.handle_packet(conn).await {
            Ok(None) => continue,
            Ok(Some(s)) => s,
            Err(TransferError::NoData) => return Ok(()),
            Err(e) => return Err(e),
        };
        log::info!("Received script '{}' ({} bytes)", script.name, script.size);
        conn.send_message(&format!("received script '{}' ({} bytes)", script.name, script.size))
            .await?;
        if tx.send(script).is_err() {
            log::debug!("Nobody is listening for scripts anymore");
            return Ok(());
        }
    }
}
