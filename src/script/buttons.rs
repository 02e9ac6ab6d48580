use std::fmt;

use serde::Deserialize;

/* Bit positions of the buttons in a STAS controller command. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[repr(u8)]
pub enum Button {
    A = 0,
    B,
    X,
    Y,
    LeftStick,
    RightStick,
    L,
    R,
    ZL,
    ZR,
    Plus,
    Minus,
    DLeft,
    DUp,
    DRight,
    DDown,
    LeftStickLeft,
    LeftStickUp,
    LeftStickRight,
    LeftStickDown,
    RightStickLeft,
    RightStickUp,
    RightStickRight,
    RightStickDown,
}

impl Button {
    pub const ALL: [Button; 24] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::LeftStick,
        Button::RightStick,
        Button::L,
        Button::R,
        Button::ZL,
        Button::ZR,
        Button::Plus,
        Button::Minus,
        Button::DLeft,
        Button::DUp,
        Button::DRight,
        Button::DDown,
        Button::LeftStickLeft,
        Button::LeftStickUp,
        Button::LeftStickRight,
        Button::LeftStickDown,
        Button::RightStickLeft,
        Button::RightStickUp,
        Button::RightStickRight,
        Button::RightStickDown,
    ];

    pub fn bit(self) -> u64 {
        1u64 << (self as u8)
    }
}

/* A 64-bit button set. Bits above `RightStickDown` are carried through untouched. */
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonSet(pub u64);

impl ButtonSet {
    pub const NONE: ButtonSet = ButtonSet(0);

    pub fn of(buttons: &[Button]) -> Self {
        Self(buttons.iter().fold(0, |acc, b| acc | b.bit()))
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_pressed(self, b: Button) -> bool {
        self.0 & b.bit() != 0
    }

    pub fn contains(self, other: ButtonSet) -> bool {
        self.0 & other.0 == other.0
    }

    /* Buttons held now that were not held in `previous`. */
    pub fn newly_pressed(self, previous: ButtonSet) -> ButtonSet {
        ButtonSet(self.0 & !previous.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.is_pressed(*b))
    }
}

impl From<u64> for ButtonSet {
    fn from(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for ButtonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ButtonSet({:#018x})", self.0)
    }
}

impl fmt::Display for ButtonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|b| format!("{:?}", b)).collect();
        write!(f, "[{}]", names.join(" "))
    }
}
