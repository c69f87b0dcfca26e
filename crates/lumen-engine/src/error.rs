use std::io;
use std::path::PathBuf;

use crate::shader::StageKind;

/// Result alias used across the engine.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the engine can report.
///
/// All variants describe a static configuration or programming defect: there is
/// no retry path anywhere in the engine. Callers are expected to report the
/// diagnostic and stop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A shader source file could not be turned into text.
    #[error("{stage} shader source `{}`: {cause}", path.display())]
    FileRead {
        stage: StageKind,
        path: PathBuf,
        #[source]
        cause: FileReadError,
    },

    /// The shader compiler rejected a stage.
    #[error("{stage} stage failed to compile:\n{log}")]
    Compile { stage: StageKind, log: String },

    /// Two compiled stages could not be combined into a program.
    #[error("program failed to link:\n{log}")]
    Link { log: String },

    /// Vertex data, indices or attribute layout break the geometry invariants.
    #[error("vertex layout mismatch: {reason}")]
    LayoutMismatch { reason: String },

    /// The image decoder produced nothing usable.
    #[error("texture input unavailable: {reason}")]
    DecodeInput { reason: String },

    /// Event loop, window, adapter or device setup failed.
    #[error("graphics context initialization failed: {message}")]
    ContextInit { message: String },

    /// A frame could not be recorded or presented.
    #[error("frame failed: {message}")]
    Frame { message: String },
}

/// Distinct causes of a shader file load failure.
#[derive(Debug, thiserror::Error)]
pub enum FileReadError {
    #[error("file not found")]
    NotFound,

    #[error("file could not be read: {0}")]
    Unreadable(#[source] io::Error),

    #[error("file is empty")]
    Empty,
}

impl Error {
    pub(crate) fn layout(reason: impl Into<String>) -> Self {
        Self::LayoutMismatch { reason: reason.into() }
    }

    pub(crate) fn decode_input(reason: impl Into<String>) -> Self {
        Self::DecodeInput { reason: reason.into() }
    }

    pub(crate) fn context_init(message: impl Into<String>) -> Self {
        Self::ContextInit { message: message.into() }
    }

    pub(crate) fn frame(message: impl Into<String>) -> Self {
        Self::Frame { message: message.into() }
    }
}

impl From<io::Error> for FileReadError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Unreadable(err),
        }
    }
}
