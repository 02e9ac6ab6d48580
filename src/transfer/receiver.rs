use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::error::{AddContext, TransferResult};
use crate::metrics;
use crate::transfer::connection::Connection;
use crate::transfer::directory::ScriptDirectory;
use crate::transfer::packet::{
    parse_filename, PacketHeader, PacketKind, CHUNK_SIZE, FILENAME_FIELD_SIZE, PACKET_HEADER_SIZE,
};

/* A script that made it to disk in full. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedScript {
    pub name: String,
    pub path: PathBuf,
    pub size: u32,
}

struct TransferSession {
    declared_len: u32,
    written: u32,
}

impl TransferSession {
    fn remaining(&self) -> usize {
        (self.declared_len - self.written) as usize
    }

    fn is_complete(&self) -> bool {
        self.written == self.declared_len
    }
}

pub struct ScriptReceiver {
    directory: ScriptDirectory,
    max_script_size: u32,
}

impl ScriptReceiver {
    pub fn new(directory: ScriptDirectory, max_script_size: u32) -> Self {
        Self {
            directory,
            max_script_size,
        }
    }

    pub fn directory(&self) -> &ScriptDirectory {
        &self.directory
    }

    /* Reads one packet. Keepalives give `None`, a complete script transfer gives its file.
     * Any error means the connection is no longer usable. */
    pub async fn handle_packet<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        conn: &mut Connection<S>,
    ) -> TransferResult<Option<ReceivedScript>> {
        let mut buf = [0u8; PACKET_HEADER_SIZE];
        conn.read_packet_start(&mut buf).await?;
        let header = PacketHeader::parse(&buf)?;
        log::debug!("{}: packet {:?}, {} bytes", conn, header.kind, header.payload_len);

        match header.kind {
            PacketKind::None => Ok(None),
            PacketKind::Script => {
                let res = self.receive_script(conn, header.payload_len).await;
                metrics::inc_transfers(&res);
                res.map(Some)
            }
        }
    }

    async fn receive_script<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        conn: &mut Connection<S>,
        declared_len: u32,
    ) -> TransferResult<ReceivedScript> {
        let mut field = [0u8; FILENAME_FIELD_SIZE];
        conn.read_exact_timeout(&mut field).await?;
        let name = parse_filename(&field)?;
        if declared_len > self.max_script_size {
            return Err(format!(
                "Script '{}' is {} bytes, the limit is {}",
                name, declared_len, self.max_script_size
            )
            .into());
        }
        log::info!("{}: receiving script '{}' ({} bytes)", conn, name, declared_len);

        let (partial, mut file) = self.directory.create_file(&name).await?;
        let mut session = TransferSession {
            declared_len,
            written: 0,
        };
        let res = Self::write_chunks(conn, &mut file, &mut session).await;
        drop(file);
        // Dropping `partial` on any early return, or with this whole future, deletes the part file.
        if let Err(e) = res {
            return Err::<ReceivedScript, _>(e).context(format!("script '{}' at byte {}", name, session.written));
        }
        debug_assert!(session.is_complete());
        let path = partial.commit().await?;
        Ok(ReceivedScript {
            name,
            path,
            size: session.written,
        })
    }

    async fn write_chunks<S: AsyncRead + AsyncWrite + Unpin>(
        conn: &mut Connection<S>,
        file: &mut tokio::fs::File,
        session: &mut TransferSession,
    ) -> TransferResult<()> {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        while !session.is_complete() {
            let len = session.remaining().min(CHUNK_SIZE);
            conn.read_exact_timeout(&mut chunk[..len]).await?;
            file.write_all(&chunk[..len]).await?;
            file.flush().await?;
            session.written += len as u32;
            metrics::RECEIVED_BYTES.inc_by(len as u64);
        }
        file.sync_all().await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use rand::Rng;
    use tokio::io::{AsyncWriteExt, DuplexStream};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::error::TransferError;
    use crate::transfer::connection::test::duplex_connection;
    use crate::transfer::sender::{send_keepalive, send_script};
    use crate::util::test::{checksum, compare_bufs, setup_logging, sleep_ms, test_payload};
    use crate::util::timeout::cancellable;

    fn receiver_in(dir: &tempfile::TempDir) -> ScriptReceiver {
        ScriptReceiver::new(ScriptDirectory::new(dir.path()), 1024 * 1024)
    }

    /* Writes bytes in random small pieces, so the receiver sees every kind of short read. */
    async fn write_in_random_chunks(w: &mut DuplexStream, data: &[u8]) {
        let mut pos = 0;
        while pos < data.len() {
            let len = rand::rng().random_range(1..=2048).min(data.len() - pos);
            w.write_all(&data[pos..pos + len]).await.unwrap();
            pos += len;
        }
    }

    fn encoded_script(name: &str, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let h = PacketHeader {
            kind: PacketKind::Script,
            payload_len: data.len() as u32,
        };
        out.extend_from_slice(&h.encode(name.len() as u8));
        out.extend_from_slice(&crate::transfer::packet::encode_filename(name).unwrap());
        out.extend_from_slice(data);
        out
    }

    #[tokio::test]
    async fn test_receive_script_over_one_byte_pipe() {
        setup_logging();
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        let (mut conn, mut other) = duplex_connection(1);
        let payload = test_payload(0x10010);

        let sending = async {
            send_script(&mut other, "big.stas", &payload).await.unwrap();
            other
        };
        let (_other, received) = tokio::join!(sending, receiver.handle_packet(&mut conn));
        let received = received.unwrap().unwrap();

        assert_eq!(received.name, "big.stas");
        assert_eq!(received.size, 0x10010);
        assert_eq!(received.path, tmp.path().join("big.stas"));
        let on_disk = std::fs::read(&received.path).unwrap();
        assert_eq!(checksum(&on_disk), checksum(&payload));
        compare_bufs(on_disk, payload);
    }

    #[tokio::test]
    async fn test_receive_script_random_chunks() {
        setup_logging();
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        let (mut conn, mut other) = duplex_connection(4096);
        let payload = test_payload(200_000);
        let wire = encoded_script("chunky.stas", &payload);

        let sending = async {
            write_in_random_chunks(&mut other, &wire).await;
            other
        };
        let (_other, received) = tokio::join!(sending, receiver.handle_packet(&mut conn));
        let received = received.unwrap().unwrap();
        compare_bufs(std::fs::read(&received.path).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_empty_script() {
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        let (mut conn, mut other) = duplex_connection(1024);
        send_script(&mut other, "empty.stas", &[]).await.unwrap();
        let received = receiver.handle_packet(&mut conn).await.unwrap().unwrap();
        assert_eq!(received.size, 0);
        assert!(std::fs::read(&received.path).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keepalive_then_script() {
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        let (mut conn, mut other) = duplex_connection(1024);
        send_keepalive(&mut other).await.unwrap();
        send_script(&mut other, "after.stas", b"STAS").await.unwrap();

        assert_eq!(receiver.handle_packet(&mut conn).await.unwrap(), None);
        let received = receiver.handle_packet(&mut conn).await.unwrap().unwrap();
        assert_eq!(received.name, "after.stas");
    }

    #[tokio::test]
    async fn test_disconnect_mid_transfer_removes_file() {
        setup_logging();
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        let (mut conn, mut other) = duplex_connection(1 << 20);
        let payload = test_payload(100_000);
        let wire = encoded_script("cut.stas", &payload);
        other.write_all(&wire[..wire.len() - 1000]).await.unwrap();
        drop(other);

        let res = receiver.handle_packet(&mut conn).await;
        assert!(matches!(res, Err(TransferError::IO { .. })));
        assert!(!tmp.path().join("cut.stas").exists());
        assert!(!tmp.path().join("cut.stas.part").exists());
    }

    #[tokio::test]
    async fn test_shutdown_mid_transfer_keeps_previous_script() {
        setup_logging();
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        let old = test_payload(300);
        std::fs::write(tmp.path().join("keep.stas"), &old).unwrap();

        let (mut conn, mut other) = duplex_connection(1 << 20);
        let wire = encoded_script("keep.stas", &test_payload(1000));
        other.write_all(&wire[..wire.len() - 500]).await.unwrap();

        let token = CancellationToken::new();
        let stop = async {
            sleep_ms(200).await;
            token.cancel();
        };
        let (res, _) = tokio::join!(cancellable(receiver.handle_packet(&mut conn), &token), stop);
        assert!(res.is_none());

        compare_bufs(std::fs::read(tmp.path().join("keep.stas")).unwrap(), old);
        assert!(!tmp.path().join("keep.stas.part").exists());
        drop(other);
    }

    #[tokio::test]
    async fn test_finished_script_leaves_no_part_file() {
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        std::fs::write(tmp.path().join("swap.stas"), b"old").unwrap();
        let (mut conn, mut other) = duplex_connection(1024);
        send_script(&mut other, "swap.stas", b"new").await.unwrap();

        receiver.handle_packet(&mut conn).await.unwrap().unwrap();
        assert_eq!(std::fs::read(tmp.path().join("swap.stas")).unwrap(), b"new");
        assert!(!tmp.path().join("swap.stas.part").exists());
    }

    #[tokio::test]
    async fn test_stall_mid_transfer_times_out() {
        tokio::time::pause();
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        let (mut conn, mut other) = duplex_connection(1 << 20);
        let wire = encoded_script("slow.stas", &test_payload(5000));
        other.write_all(&wire[..wire.len() - 10]).await.unwrap();

        let res = receiver.handle_packet(&mut conn).await;
        assert!(matches!(res, Err(TransferError::Timeout)));
        assert!(!tmp.path().join("slow.stas").exists());
        assert!(!tmp.path().join("slow.stas.part").exists());
        drop(other);
    }

    #[tokio::test]
    async fn test_oversized_script_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let receiver = ScriptReceiver::new(ScriptDirectory::new(tmp.path()), 100);
        let (mut conn, mut other) = duplex_connection(1024);
        send_script(&mut other, "huge.stas", &test_payload(101)).await.unwrap();

        let res = receiver.handle_packet(&mut conn).await;
        assert!(matches!(res, Err(TransferError::BadData(..))));
        assert!(!tmp.path().join("huge.stas").exists());
    }

    #[tokio::test]
    async fn test_path_in_filename_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        let (mut conn, mut other) = duplex_connection(1024);
        let mut wire = encoded_script("x.stas", b"data");
        let evil = b"../x.stas";
        wire[PACKET_HEADER_SIZE..PACKET_HEADER_SIZE + evil.len()].copy_from_slice(evil);
        other.write_all(&wire).await.unwrap();

        let res = receiver.handle_packet(&mut conn).await;
        assert!(matches!(res, Err(TransferError::BadData(..))));
    }

    #[tokio::test]
    async fn test_unknown_packet_kind() {
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        let (mut conn, mut other) = duplex_connection(1024);
        let mut header = [0u8; PACKET_HEADER_SIZE];
        header[0] = 9;
        other.write_all(&header).await.unwrap();
        assert!(matches!(
            receiver.handle_packet(&mut conn).await,
            Err(TransferError::BadData(..))
        ));
    }

    #[tokio::test]
    async fn test_idle_link_waits_for_header() {
        tokio::time::pause();
        let tmp = tempfile::tempdir().unwrap();
        let receiver = receiver_in(&tmp);
        let (mut conn, mut other) = duplex_connection(1024);

        let sending = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            send_keepalive(&mut other).await.unwrap();
            other
        };
        let (_other, res) = tokio::join!(sending, receiver.handle_packet(&mut conn));
        assert_eq!(res.unwrap(), None);
    }
}
