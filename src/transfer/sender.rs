use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::TransferResult;
use crate::transfer::packet::{encode_filename, PacketHeader, PacketKind, CHUNK_SIZE};

/* Desktop side of the link. Pushes a whole script as one packet. */
pub async fn send_script<W: AsyncWrite + Unpin>(w: &mut W, name: &str, data: &[u8]) -> TransferResult<()> {
    let payload_len: u32 = data
        .len()
        .try_into()
        .map_err(|_| format!("Script '{}' is too large to send ({} bytes)", name, data.len()))?;
    let field = encode_filename(name)?;
    let header = PacketHeader {
        kind: PacketKind::Script,
        payload_len,
    };
    w.write_all(&header.encode(name.len() as u8)).await?;
    w.write_all(&field).await?;
    for chunk in data.chunks(CHUNK_SIZE) {
        w.write_all(chunk).await?;
    }
    w.flush().await?;
    Ok(())
}

pub async fn send_keepalive<W: AsyncWrite + Unpin>(w: &mut W) -> TransferResult<()> {
    let header = PacketHeader {
        kind: PacketKind::None,
        payload_len: 0,
    };
    w.write_all(&header.encode(0)).await?;
    w.flush().await?;
    Ok(())
}
