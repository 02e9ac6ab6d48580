pub mod buttons;
pub mod command;
mod container;
pub mod header;
pub mod reader;
pub mod types;

pub use buttons::{Button, ButtonSet};
pub use command::{Command, CommandStream, CommandType};
pub use container::ScriptContainer;
pub use header::{ControllerType, ScriptHeader};
pub use reader::BinaryReader;
