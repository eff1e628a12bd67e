use std::fmt;
use std::path::PathBuf;

/// Convenience result type used throughout cubemovie.
pub type CubeMovieResult<T> = Result<T, CubeMovieError>;

/// Top-level error type for a render session.
///
/// Variants follow the session's failure taxonomy: configuration problems are detected before
/// anything is drawn, render errors come from the drawing backend, encoding errors from the
/// external encoder, and restore errors from putting global state back.
#[derive(thiserror::Error, Debug)]
pub enum CubeMovieError {
    /// Invalid input or options, detected before rendering begins.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Drawing backend failure while building or updating the scene.
    #[error("render error: {0}")]
    Render(String),

    /// External encoder failure.
    #[error("encoding error: {0}")]
    Encoding(EncodingFailure),

    /// Global state could not be restored after a session.
    #[error("environment restore error: {0}")]
    EnvironmentRestore(String),

    /// IO and other context-carrying failures.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CubeMovieError {
    /// Build a [`CubeMovieError::Configuration`].
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`CubeMovieError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CubeMovieError::Encoding`] without partial-output information.
    pub fn encoding(kind: EncodingErrorKind, msg: impl Into<String>) -> Self {
        Self::Encoding(EncodingFailure {
            kind,
            message: msg.into(),
            partial_output: None,
        })
    }

    /// Build a [`CubeMovieError::EnvironmentRestore`].
    pub fn environment_restore(msg: impl Into<String>) -> Self {
        Self::EnvironmentRestore(msg.into())
    }

    /// Encoding failure details, if this is an encoding error.
    pub fn as_encoding(&self) -> Option<&EncodingFailure> {
        match self {
            Self::Encoding(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Classification of an encoder failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingErrorKind {
    /// The encoder executable could not be found.
    EncoderNotFound,
    /// The requested encoder is not one cubemovie integrates with.
    UnsupportedEncoder,
    /// The requested codec is unknown or unavailable in the encoder build.
    UnsupportedCodec,
    /// The output location is not writable.
    PermissionDenied,
    /// The output device ran out of space.
    DiskFull,
    /// Any other encoder process failure.
    Process,
}

impl fmt::Display for EncodingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EncoderNotFound => "encoder not found",
            Self::UnsupportedEncoder => "unsupported encoder",
            Self::UnsupportedCodec => "unsupported codec",
            Self::PermissionDenied => "permission denied",
            Self::DiskFull => "disk full",
            Self::Process => "encoder process failed",
        };
        f.write_str(s)
    }
}

/// Details of an encoding failure.
///
/// Partial output files are never removed; their presence is reported here so the caller can
/// decide what to do with them.
#[derive(Debug)]
pub struct EncodingFailure {
    /// Failure classification.
    pub kind: EncodingErrorKind,
    /// Diagnostic, including the encoder's own stderr when available.
    pub message: String,
    /// Output file left behind by the failed run, if any.
    pub partial_output: Option<PathBuf>,
}

impl fmt::Display for EncodingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(path) = &self.partial_output {
            write!(f, " (partial output left at '{}')", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for EncodingFailure {}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
