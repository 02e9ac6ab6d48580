use crate::script::command::{ControllerCommand, MotionCommand};
use crate::script::header::MAX_PLAYERS;
use crate::script::types::{Vec2i, Vec3f};
use crate::script::ButtonSet;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionState {
    pub accel: Vec3f,
    pub gyro: Vec3f,
}

/* One player's controller state for a single frame. */
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub buttons: ButtonSet,
    pub left_stick: Vec2i,
    pub right_stick: Vec2i,
    // Left and right Joy-Con, or just the left slot for single-sensor controllers.
    pub motion: [MotionState; 2],
}

/* Double-buffered player input. `previous` only exists to compute newly pressed buttons. */
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInputState {
    previous: PlayerInput,
    current: PlayerInput,
}

impl PlayerInputState {
    pub fn current(&self) -> &PlayerInput {
        &self.current
    }

    pub fn previous(&self) -> &PlayerInput {
        &self.previous
    }

    pub fn triggered(&self) -> ButtonSet {
        self.current.buttons.newly_pressed(self.previous.buttons)
    }

    fn advance(&mut self) {
        self.previous = self.current;
    }
}

/* What the consumer substitutes for real controller input on one host frame. */
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u32,
    pub players: [PlayerInputState; MAX_PLAYERS],
    pub amiibo: Option<u64>,
}

impl FrameSnapshot {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn player(&self, player: usize) -> Option<&PlayerInputState> {
        self.players.get(player)
    }

    pub fn is_neutral(&self) -> bool {
        self.players
            .iter()
            .all(|p| *p.current() == PlayerInput::default() && p.triggered().is_empty())
            && self.amiibo.is_none()
    }

    /* Start of a new host frame: what was current becomes previous. */
    pub(crate) fn advance(&mut self) {
        for p in self.players.iter_mut() {
            p.advance();
        }
    }

    // Player and device ids were checked when the script was verified. Out of range ones are
    // dropped rather than trusted.
    pub(crate) fn apply_controller(&mut self, c: &ControllerCommand) {
        if let Some(p) = self.players.get_mut(c.player as usize) {
            p.current.buttons = c.buttons;
            p.current.left_stick = c.left_stick;
            p.current.right_stick = c.right_stick;
        }
    }

    pub(crate) fn apply_motion(&mut self, m: &MotionCommand) {
        if let Some(p) = self.players.get_mut(m.player as usize) {
            if let Some(slot) = p.current.motion.get_mut(m.device as usize) {
                *slot = MotionState {
                    accel: m.accel,
                    gyro: m.gyro,
                };
            }
        }
    }
}
