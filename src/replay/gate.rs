/* Pause / single-step control over the host loop.
 *
 * The same admission decision has to gate both the game's simulation tick and the replay's
 * `get_next_frame`, otherwise script frames drift away from game frames.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameGate {
    paused: bool,
    advance_count: u32,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pending_advances(&self) -> u32 {
        self.advance_count
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /* Pending single steps don't survive unpausing. */
    pub fn play(&mut self) {
        self.paused = false;
        self.advance_count = 0;
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.play();
        } else {
            self.pause();
        }
        log::debug!("Frame gate {}", if self.paused { "paused" } else { "playing" });
    }

    /* Ignored while playing, there's nothing to step over. */
    pub fn advance_frame(&mut self) {
        if self.paused {
            self.advance_count += 1;
        }
    }

    pub fn admits(&self) -> bool {
        !self.paused || self.advance_count > 0
    }

    /* Call once at the end of every host tick. */
    pub fn finish_tick(&mut self) {
        if self.paused && self.advance_count > 0 {
            self.advance_count -= 1;
        }
    }
}
