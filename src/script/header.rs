use std::fmt;

use crate::error::{ScriptError, ScriptResult};

use super::reader::BinaryReader;

pub const STAS_MAGIC: &[u8; 4] = b"STAS";
pub const SUPPORTED_TITLE_ID: u64 = 0x0100000000010000;
pub const FORMAT_VERSION: u16 = 0;
pub const GAME_VERSION: u16 = 0;
pub const MAX_PLAYERS: usize = 2;
pub const CONTROLLER_SLOTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerType {
    ProController = 0,
    DualJoycon,
    LeftJoycon,
    RightJoycon,
    Handheld,
}

impl ControllerType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::ProController),
            1 => Some(Self::DualJoycon),
            2 => Some(Self::LeftJoycon),
            3 => Some(Self::RightJoycon),
            4 => Some(Self::Handheld),
            _ => None,
        }
    }

    /* Two Joy-Cons means two separate motion sensors. */
    pub fn has_two_motion_devices(self) -> bool {
        matches!(self, Self::DualJoycon | Self::Handheld)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptHeader {
    pub format_version: u16,
    pub game_version: u16,
    pub editor_version: u16,
    pub title_id: u64,
    pub command_count: u32,
    pub seconds_edited: u32,
    pub player_count: u8,
    pub controller_types: [u8; CONTROLLER_SLOTS],
    pub author: String,
}

impl ScriptHeader {
    /* Leaves the reader at the start of the command stream. */
    pub fn read(r: &mut BinaryReader) -> ScriptResult<Self> {
        r.check_signature(STAS_MAGIC)?;
        let format_version = r.read_u16()?;
        let game_version = r.read_u16()?;
        let editor_version = r.read_u16()?;
        r.align_up(4);

        let title_id = r.read_u64()?;
        if title_id != SUPPORTED_TITLE_ID {
            return Err(ScriptError::InvalidTitleId(title_id));
        }
        if format_version != FORMAT_VERSION || game_version != GAME_VERSION {
            return Err(ScriptError::UnsupportedVersion {
                format: format_version,
                game: game_version,
            });
        }

        let command_count = r.read_u32()?;
        let seconds_edited = r.read_u32()?;
        let player_count = r.read_u8()?;
        if player_count == 0 || player_count as usize > MAX_PLAYERS {
            return Err(ScriptError::InvalidPlayerCount(player_count));
        }
        r.align_up(4);

        let mut controller_types = [0u8; CONTROLLER_SLOTS];
        for t in controller_types.iter_mut() {
            *t = r.read_u8()?;
        }
        let author = r.read_prefixed_string()?;
        r.align_up(4);

        Ok(Self {
            format_version,
            game_version,
            editor_version,
            title_id,
            command_count,
            seconds_edited,
            player_count,
            controller_types,
            author,
        })
    }

    pub fn controller_type(&self, player: u8) -> Option<ControllerType> {
        self.controller_types
            .get(player as usize)
            .and_then(|t| ControllerType::from_tag(*t))
    }
}

impl fmt::Display for ScriptHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "STAS v{} (game {}, editor {}), title {:016x}, {} commands, {} player(s), by '{}'",
            self.format_version,
            self.game_version,
            self.editor_version,
            self.title_id,
            self.command_count,
            self.player_count,
            self.author
        )
    }
}
