use std::path::Path;

use crate::error::{AddContext, ScriptError, ScriptResult};

use super::command::{Command, CommandStream};
use super::header::ScriptHeader;
use super::reader::BinaryReader;

/* A parsed and verified STAS script. Owns its bytes. */
#[derive(Debug, Clone)]
pub struct ScriptContainer {
    data: Vec<u8>,
    header: ScriptHeader,
    stream_start: usize,
    frame_count: u32,
}

impl ScriptContainer {
    pub fn open(data: Vec<u8>) -> ScriptResult<Self> {
        let mut r = BinaryReader::new(&data);
        let header = ScriptHeader::read(&mut r)?;
        let stream_start = r.position();
        // Header padding counts: a file cut off inside it is truncated.
        if stream_start > data.len() {
            return Err(ScriptError::EofReached {
                offset: data.len(),
                needed: stream_start - data.len(),
                available: 0,
            });
        }
        let mut script = Self {
            data,
            header,
            stream_start,
            frame_count: 0,
        };
        script.frame_count = script.verify()?;
        Ok(script)
    }

    pub fn from_file(path: &Path) -> ScriptResult<Self> {
        let data = std::fs::read(path)?;
        Self::open(data)
    }

    pub fn header(&self) -> &ScriptHeader {
        &self.header
    }

    pub fn stream_start(&self) -> usize {
        self.stream_start
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /* Decoder positioned at `pos`, with `command_index` commands already consumed. */
    pub fn commands_at(&self, pos: usize, command_index: u32) -> ScriptResult<CommandStream<'_>> {
        let reader = BinaryReader::at(&self.data, pos)?;
        Ok(CommandStream::new(reader, command_index, self.header.command_count))
    }

    pub fn commands(&self) -> CommandStream<'_> {
        let mut reader = BinaryReader::new(&self.data);
        // stream_start came out of a reader over this very buffer.
        reader.skip(self.stream_start).ok();
        CommandStream::new(reader, 0, self.header.command_count)
    }

    /* Walks the whole command stream once, returning the number of frames in it.
     *
     * Replay skips all of these checks, so anything replay relies on has to be enforced here.
     */
    fn verify(&self) -> ScriptResult<u32> {
        let mut stream = self.commands();
        let mut last_frame: Option<u32> = None;
        while !stream.is_exhausted() {
            let index = stream.command_index();
            let frame = last_frame.unwrap_or(0);
            self.verify_next(&mut stream, &mut last_frame)
                .context(format!("frame {}, command {}", frame, index))?;
        }
        Ok(last_frame.map_or(0, |f| f + 1))
    }

    fn verify_next(&self, stream: &mut CommandStream, last_frame: &mut Option<u32>) -> ScriptResult<()> {
        let checked = stream.next_checked()?;
        if checked.payload_size != checked.declared_size as usize {
            return Err(format!(
                "{:?} declares {} bytes but holds {}",
                checked.command.command_type(),
                checked.declared_size,
                checked.payload_size
            )
            .into());
        }

        let player_count = self.header.player_count;
        match checked.command {
            Command::Frame(f) => {
                if let Some(last) = *last_frame {
                    if f < last {
                        return Err(format!("frame {} comes after frame {}", f, last).into());
                    }
                }
                *last_frame = Some(f);
            }
            Command::Controller(c) => {
                if c.player >= player_count {
                    return Err(format!("controller input for player {} of {}", c.player, player_count).into());
                }
            }
            Command::Motion(m) => {
                if m.player >= player_count {
                    return Err(format!("motion input for player {} of {}", m.player, player_count).into());
                }
                let two_devices = self
                    .header
                    .controller_type(m.player)
                    .is_some_and(|t| t.has_two_motion_devices());
                let max_device = if two_devices { 1 } else { 0 };
                if m.device > max_device {
                    return Err(format!("motion device {} for player {}", m.device, m.player).into());
                }
            }
            Command::Amiibo(..) => (),
        }
        Ok(())
    }
}
