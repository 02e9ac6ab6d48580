use crate::error::{ScriptError, ScriptResult};
use crate::metrics;
use crate::script::{Command, ScriptContainer};

use super::input::FrameSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    Idle,
    Loaded,
    Replaying,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayCursor {
    pub current_frame: u32,
    pub next_frame: u32,
    pub command_index: u32,
    pub command_count: u32,
    position: usize,
    exhausted: bool,
}

/* Turns a verified script into one input snapshot per host frame.
 *
 * Frame commands are barriers: everything decoded after `Frame(n)` belongs to frame n. Frames
 * without commands repeat the previous state, so consecutive calls to `get_next_frame` always
 * produce consecutive frame numbers.
 */
#[derive(Debug)]
pub struct ReplayScheduler {
    script: Option<ScriptContainer>,
    replaying: bool,
    cursor: ReplayCursor,
    snapshot: FrameSnapshot,
}

impl Default for ReplayScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayScheduler {
    pub fn new() -> Self {
        Self {
            script: None,
            replaying: false,
            cursor: ReplayCursor::default(),
            snapshot: FrameSnapshot::neutral(),
        }
    }

    pub fn state(&self) -> ReplayState {
        match (&self.script, self.replaying) {
            (None, _) => ReplayState::Idle,
            (Some(..), false) => ReplayState::Loaded,
            (Some(..), true) => ReplayState::Replaying,
        }
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn script(&self) -> Option<&ScriptContainer> {
        self.script.as_ref()
    }

    pub fn cursor(&self) -> &ReplayCursor {
        &self.cursor
    }

    /* All buttons released whenever nothing is replaying. */
    pub fn current_snapshot(&self) -> &FrameSnapshot {
        &self.snapshot
    }

    /* Replaces whatever was loaded. A running replay of the old script is stopped first. */
    pub fn load(&mut self, script: ScriptContainer) {
        if self.replaying {
            log::info!("Stopping current replay to load a new script");
        }
        self.stop_replay();
        self.script = Some(script);
    }

    pub fn start_replay(&mut self) -> ScriptResult<()> {
        if self.replaying {
            return Ok(());
        }
        let script = self.script.as_ref().ok_or(ScriptError::NotLoaded)?;
        self.cursor = ReplayCursor {
            command_count: script.header().command_count,
            position: script.stream_start(),
            ..Default::default()
        };
        self.snapshot = FrameSnapshot::neutral();
        self.replaying = true;

        // Anything before the first frame command is metadata for the whole script.
        if let Err(e) = self.decode_until_frame(None) {
            log::warn!("Could not start replay: {}", e);
            self.stop_replay();
            return Err(e);
        }
        log::info!(
            "Started replaying, {} frames",
            self.script.as_ref().map_or(0, |s| s.frame_count())
        );
        metrics::REPLAYS_STARTED.inc();
        metrics::REPLAY_ACTIVE.set(1);
        Ok(())
    }

    pub fn get_next_frame(&mut self) -> ScriptResult<&FrameSnapshot> {
        if !self.replaying {
            return Err(ScriptError::NotLoaded);
        }
        self.snapshot.advance();

        if self.cursor.current_frame >= self.cursor.next_frame {
            if self.cursor.exhausted {
                log::info!("Replay finished after {} frames", self.cursor.current_frame);
                self.stop_replay();
                return Err(ScriptError::EndOfScript);
            }
            match self.decode_until_frame(Some(self.cursor.current_frame)) {
                Ok(()) => (),
                // The last frame's commands are in, the frame still has to be played.
                Err(ScriptError::EndOfScript) => self.cursor.exhausted = true,
                Err(e) => {
                    log::warn!("Replay stopped at frame {}: {}", self.cursor.current_frame, e);
                    self.stop_replay();
                    return Err(e);
                }
            }
        }

        self.snapshot.frame = self.cursor.current_frame;
        self.cursor.current_frame += 1;
        metrics::REPLAYED_FRAMES.inc();
        log::trace!(
            "{:05}: {} {}",
            self.snapshot.frame,
            self.snapshot.players[0].current().buttons,
            self.snapshot.players[1].current().buttons
        );
        Ok(&self.snapshot)
    }

    /* Drops the script along with all replay state. */
    pub fn stop_replay(&mut self) {
        if self.replaying {
            log::info!("Stopped replaying");
            metrics::REPLAY_ACTIVE.set(0);
        }
        self.replaying = false;
        self.script = None;
        self.cursor = ReplayCursor::default();
        self.snapshot = FrameSnapshot::neutral();
    }

    /* Stops replaying but keeps the script loaded, ready to be started from the top again. */
    pub fn rewind(&mut self) {
        if self.replaying {
            log::info!("Rewound replay at frame {}", self.cursor.current_frame);
            metrics::REPLAY_ACTIVE.set(0);
        }
        self.replaying = false;
        self.cursor = ReplayCursor::default();
        self.snapshot = FrameSnapshot::neutral();
    }

    // Applies commands until a frame command past `after` (or any frame command, if `after` is
    // None) is read.
    fn decode_until_frame(&mut self, after: Option<u32>) -> ScriptResult<()> {
        let script = self.script.as_ref().ok_or(ScriptError::NotLoaded)?;
        let mut stream = script.commands_at(self.cursor.position, self.cursor.command_index)?;
        let res = loop {
            let command = match stream.next_command() {
                Ok(c) => c,
                Err(e) => break Err(e),
            };
            match command {
                Command::Frame(f) => {
                    self.cursor.next_frame = f;
                    if after.map_or(true, |a| f > a) {
                        break Ok(());
                    }
                }
                Command::Controller(c) => self.snapshot.apply_controller(&c),
                Command::Motion(m) => self.snapshot.apply_motion(&m),
                Command::Amiibo(id) => self.snapshot.amiibo = Some(id),
            }
        };
        self.cursor.position = stream.position();
        self.cursor.command_index = stream.command_index();
        res
    }
}
