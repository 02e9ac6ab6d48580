pub mod connection;
pub mod directory;
pub mod packet;
pub mod producer;
pub mod receiver;
pub mod sender;

pub use connection::Connection;
pub use directory::ScriptDirectory;
pub use producer::ConnectionProducer;
pub use receiver::{ReceivedScript, ScriptReceiver};
