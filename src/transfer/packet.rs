use std::str::from_utf8;

use crate::error::{TransferError, TransferResult};
use crate::util::pretty_bytes;

pub const PACKET_HEADER_SIZE: usize = 0x10;
pub const FILENAME_FIELD_SIZE: usize = 0xff;
pub const CHUNK_SIZE: usize = 0x10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    None = 0x00,
    Script = 0x01,
}

/* Fixed 16-byte header in front of every packet.
 *
 * Byte 0 is the kind, bytes 4..8 the big-endian payload length. Byte 1 carries the filename
 * length for script packets, which we don't rely on: the filename field is NUL-padded anyway.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub kind: PacketKind,
    pub payload_len: u32,
}

impl PacketHeader {
    pub fn parse(buf: &[u8; PACKET_HEADER_SIZE]) -> TransferResult<Self> {
        let kind = match buf[0] {
            0x00 => PacketKind::None,
            0x01 => PacketKind::Script,
            k => return Err(format!("Unknown packet kind {}", k).into()),
        };
        let payload_len = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        Ok(Self { kind, payload_len })
    }

    pub fn encode(&self, name_len: u8) -> [u8; PACKET_HEADER_SIZE] {
        let mut buf = [0u8; PACKET_HEADER_SIZE];
        buf[0] = self.kind as u8;
        buf[1] = name_len;
        buf[4..8].copy_from_slice(&self.payload_len.to_be_bytes());
        buf
    }
}

/* Script names end up as file names in the script directory, so they must stay in it. */
pub fn validate_script_name(name: &str) -> TransferResult<()> {
    if name.is_empty() {
        return Err("Empty script name".into());
    }
    if name.len() > FILENAME_FIELD_SIZE {
        return Err(format!("Script name is {} bytes long", name.len()).into());
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) || name.contains(':') {
        return Err(format!("Script name '{}' is not a plain file name", name).into());
    }
    Ok(())
}

pub fn parse_filename(field: &[u8; FILENAME_FIELD_SIZE]) -> TransferResult<String> {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    let name = from_utf8(&field[..end])
        .map_err(|_| TransferError::BadData(format!("Script name '{}' is not UTF-8", pretty_bytes(&field[..end]))))?;
    validate_script_name(name)?;
    Ok(name.into())
}

pub fn encode_filename(name: &str) -> TransferResult<[u8; FILENAME_FIELD_SIZE]> {
    validate_script_name(name)?;
    let mut field = [0u8; FILENAME_FIELD_SIZE];
    field[..name.len()].copy_from_slice(name.as_bytes());
    Ok(field)
}
