use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Reached end of data: needed {needed} bytes at offset {offset}, {available} available")]
    EofReached {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("Signature mismatch")]
    SignatureMismatch,
    #[error("Script was made for title {0:016x}")]
    InvalidTitleId(u64),
    #[error("Unsupported script version (format {format}, game {game})")]
    UnsupportedVersion { format: u16, game: u16 },
    #[error("Invalid player count {0}")]
    InvalidPlayerCount(u8),
    #[error("Decode failure: {0}")]
    DecodeFailure(String),
    #[error("Invalid script name: {0}")]
    InvalidName(String),
    #[error("End of script reached")]
    EndOfScript,
    #[error("No script loaded")]
    NotLoaded,
    #[error("IO error: {source}")]
    IO {
        #[from]
        source: std::io::Error,
    },
}

pub type ScriptResult<T> = Result<T, ScriptError>;

impl ScriptError {
    /* End of script is how a replay normally finishes, everything else is a real failure. */
    pub fn is_end_of_script(&self) -> bool {
        matches!(self, ScriptError::EndOfScript)
    }
}

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Connection closed before any data arrived")]
    NoData,
    #[error("Bad data: {0}")]
    BadData(String),
    #[error("Timed out waiting for data")]
    Timeout,
    #[error("IO error: {source}")]
    IO {
        #[from]
        source: std::io::Error,
    },
}

pub type TransferResult<T> = Result<T, TransferError>;

// Plain strings become the "bad data" variant of each error kind.

impl From<String> for ScriptError {
    fn from(s: String) -> Self {
        Self::DecodeFailure(s)
    }
}

impl From<&str> for ScriptError {
    fn from(s: &str) -> Self {
        Self::DecodeFailure(String::from(s))
    }
}

impl From<String> for TransferError {
    fn from(s: String) -> Self {
        Self::BadData(s)
    }
}

impl From<&str> for TransferError {
    fn from(s: &str) -> Self {
        Self::BadData(String::from(s))
    }
}

// Add location context to errors. Only the "bad data" kinds get it, IO and EOF errors are
// descriptive enough on their own.
pub trait AddContext<T> {
    fn context(self, c: T) -> Self;
}

impl<T> AddContext<String> for ScriptResult<T> {
    fn context(self, s: String) -> Self {
        match self {
            Err(ScriptError::DecodeFailure(m)) => Err(ScriptError::DecodeFailure(format!("{}: {}", s, m))),
            e => e,
        }
    }
}

impl<T> AddContext<&str> for ScriptResult<T> {
    fn context(self, s: &str) -> Self {
        self.context(String::from(s))
    }
}

impl<T> AddContext<String> for TransferResult<T> {
    fn context(self, s: String) -> Self {
        match self {
            Err(TransferError::BadData(m)) => Err(TransferError::BadData(format!("{}: {}", s, m))),
            e => e,
        }
    }
}

impl<T> AddContext<&str> for TransferResult<T> {
    fn context(self, s: &str) -> Self {
        self.context(String::from(s))
    }
}
