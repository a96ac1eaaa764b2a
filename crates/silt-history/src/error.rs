//! Error types for history navigation and the persisted-state codec.

use std::error::Error;
use std::fmt;

/// Errors from illegal history-navigation transitions.
///
/// These are protocol-state errors: the manager is left unchanged and
/// the caller reports them as values. The one operation that can never
/// fail is `reset_to_initial`, by design.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryError {
    /// `begin_navigation` called while already navigating.
    AlreadyNavigating,
    /// `navigate` or `resume_live` called while live.
    NotNavigating,
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyNavigating => write!(f, "already navigating history"),
            Self::NotNavigating => write!(f, "not navigating history"),
        }
    }
}

impl Error for HistoryError {}

/// Errors from the binary persisted-state codec.
#[derive(Debug)]
pub enum CodecError {
    /// An underlying read or write failed.
    Io(std::io::Error),
    /// The stream does not start with the silt magic bytes.
    BadMagic { found: [u8; 4] },
    /// The stream was written by an unknown format version.
    UnsupportedVersion { found: u8 },
    /// A material tag byte names no known material.
    UnknownMaterial { tag: u8 },
    /// The stream is structurally invalid.
    MalformedFrame { detail: String },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::BadMagic { found } => write!(f, "bad magic bytes {found:?}"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::UnknownMaterial { tag } => write!(f, "unknown material tag {tag}"),
            Self::MalformedFrame { detail } => write!(f, "malformed frame: {detail}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
