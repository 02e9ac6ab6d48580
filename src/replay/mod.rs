pub mod gate;
pub mod hotkeys;
pub mod input;
pub mod scheduler;

pub use gate::FrameGate;
pub use hotkeys::{HotkeyAction, Hotkeys};
pub use input::{FrameSnapshot, PlayerInput, PlayerInputState};
pub use scheduler::{ReplayCursor, ReplayScheduler, ReplayState};
