use crate::config::HotkeySettings;
use crate::script::ButtonSet;

use super::gate::FrameGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    TogglePause,
    FrameAdvance,
}

/* Button chords on the real controller that drive the frame gate.
 *
 * A chord fires once, on the poll where its last button goes down. Holding it does nothing
 * further.
 */
#[derive(Debug, Clone)]
pub struct Hotkeys {
    toggle_pause: ButtonSet,
    frame_advance: ButtonSet,
    last: ButtonSet,
}

impl Hotkeys {
    pub fn new(settings: &HotkeySettings) -> Self {
        Self {
            toggle_pause: ButtonSet::of(&settings.toggle_pause),
            frame_advance: ButtonSet::of(&settings.frame_advance),
            last: ButtonSet::NONE,
        }
    }

    fn fired(&self, chord: ButtonSet, held: ButtonSet) -> bool {
        !chord.is_empty() && held.contains(chord) && !self.last.contains(chord)
    }

    pub fn poll(&mut self, held: ButtonSet) -> Option<HotkeyAction> {
        let action = if self.fired(self.toggle_pause, held) {
            Some(HotkeyAction::TogglePause)
        } else if self.fired(self.frame_advance, held) {
            Some(HotkeyAction::FrameAdvance)
        } else {
            None
        };
        self.last = held;
        action
    }

    pub fn apply(&mut self, held: ButtonSet, gate: &mut FrameGate) -> Option<HotkeyAction> {
        let action = self.poll(held);
        match action {
            Some(HotkeyAction::TogglePause) => gate.toggle_pause(),
            Some(HotkeyAction::FrameAdvance) => gate.advance_frame(),
            None => (),
        }
        action
    }
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self::new(&HotkeySettings::default())
    }
}
