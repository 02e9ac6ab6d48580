use crate::error::{ScriptError, ScriptResult};

use super::buttons::ButtonSet;
use super::reader::BinaryReader;
use super::types::{Vec2i, Vec3f};

pub const COMMAND_HEADER_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CommandType {
    Frame = 0,
    Controller = 1,
    Motion = 2,
    Amiibo = 3,
}

impl CommandType {
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(Self::Frame),
            1 => Some(Self::Controller),
            2 => Some(Self::Motion),
            3 => Some(Self::Amiibo),
            _ => None,
        }
    }

    pub fn payload_size(self) -> u16 {
        match self {
            Self::Frame => 4,
            Self::Controller => 0x1c,
            Self::Motion => 0x1c,
            Self::Amiibo => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerCommand {
    pub player: u8,
    pub buttons: ButtonSet,
    pub left_stick: Vec2i,
    pub right_stick: Vec2i,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    pub player: u8,
    pub device: u8,
    pub accel: Vec3f,
    pub gyro: Vec3f,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Frame(u32),
    Controller(ControllerCommand),
    Motion(MotionCommand),
    Amiibo(u64),
}

impl Command {
    pub fn command_type(&self) -> CommandType {
        match self {
            Self::Frame(..) => CommandType::Frame,
            Self::Controller(..) => CommandType::Controller,
            Self::Motion(..) => CommandType::Motion,
            Self::Amiibo(..) => CommandType::Amiibo,
        }
    }
}

/* A decoded command together with what its header claimed about it. */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckedCommand {
    pub command: Command,
    pub declared_size: u16,
    pub payload_size: usize,
}

/* Pulls commands one at a time out of the command stream of a script.
 *
 * The decoder only tracks the byte position and how many commands it handed out; it does not
 * check the declared sizes or the frame order. That's done once, when the script is verified.
 */
#[derive(Debug, Clone)]
pub struct CommandStream<'a> {
    reader: BinaryReader<'a>,
    command_index: u32,
    command_count: u32,
}

impl<'a> CommandStream<'a> {
    pub fn new(reader: BinaryReader<'a>, command_index: u32, command_count: u32) -> Self {
        Self {
            reader,
            command_index,
            command_count,
        }
    }

    pub fn position(&self) -> usize {
        self.reader.position()
    }

    pub fn command_index(&self) -> u32 {
        self.command_index
    }

    pub fn command_count(&self) -> u32 {
        self.command_count
    }

    pub fn is_exhausted(&self) -> bool {
        self.command_index >= self.command_count
    }

    pub fn next_command(&mut self) -> ScriptResult<Command> {
        self.next_checked().map(|c| c.command)
    }

    pub fn next_checked(&mut self) -> ScriptResult<CheckedCommand> {
        if self.is_exhausted() {
            return Err(ScriptError::EndOfScript);
        }
        let r = &mut self.reader;
        let tag = r.read_u16()?;
        let declared_size = r.read_u16()?;
        let ty = CommandType::from_tag(tag).ok_or_else(|| ScriptError::from(format!("unknown command type {}", tag)))?;

        let payload_start = r.position();
        let command = match ty {
            CommandType::Frame => Command::Frame(r.read_u32()?),
            CommandType::Controller => {
                let player = r.read_u8()?;
                r.align_up(4);
                let buttons = ButtonSet(r.read_u64()?);
                let left_stick = r.read_vec2i()?;
                let right_stick = r.read_vec2i()?;
                Command::Controller(ControllerCommand {
                    player,
                    buttons,
                    left_stick,
                    right_stick,
                })
            }
            CommandType::Motion => {
                let player = r.read_u8()?;
                let device = r.read_u8()?;
                r.align_up(4);
                let accel = r.read_vec3f()?;
                let gyro = r.read_vec3f()?;
                Command::Motion(MotionCommand {
                    player,
                    device,
                    accel,
                    gyro,
                })
            }
            CommandType::Amiibo => Command::Amiibo(r.read_u64()?),
        };
        let payload_size = r.position() - payload_start;

        self.command_index += 1;
        Ok(CheckedCommand {
            command,
            declared_size,
            payload_size,
        })
    }
}
