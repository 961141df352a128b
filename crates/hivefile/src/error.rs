//! Error types for the accessor API.

use std::fmt;
use std::io;

use hivefile_format::error::FormatError;

/// Errors that can occur when operating on a container file.
///
/// Existence probes ([`ContainerFile::has_group`] and
/// [`ContainerFile::has_dataset`]) never produce any of these — "absent" is
/// their normal `false` result. Every other failure propagates immediately;
/// this layer performs no retry and guarantees no rollback of partial
/// mutations.
///
/// [`ContainerFile::has_group`]: crate::ContainerFile::has_group
/// [`ContainerFile::has_dataset`]: crate::ContainerFile::has_dataset
#[derive(Debug)]
pub enum Error {
    /// A requested capability is unavailable (e.g. collective I/O with no
    /// process-group driver installed).
    Configuration(String),
    /// I/O error from the filesystem.
    Io(io::Error),
    /// The container image is malformed.
    Format(FormatError),
    /// The path does not resolve to any object.
    NotFound(String),
    /// The path resolves to a group where a dataset is required.
    NotADataset(String),
    /// The path resolves to a dataset where a group is required.
    NotAGroup(String),
    /// An object already occupies the path of a dataset being created.
    AlreadyExists(String),
    /// Dataset rank exceeds what a dataset record can store.
    RankTooLarge(usize),
    /// A link name exceeds what a group record can store.
    NameTooLong(usize),
    /// The shape's extent product overflows the element-count range.
    ShapeOverflow,
    /// Element count does not match the shape's extent product.
    ShapeMismatch {
        /// Element count implied by the shape.
        expected: u64,
        /// Element count actually supplied.
        actual: u64,
    },
    /// Typed read against a dataset of a different element type.
    TypeMismatch {
        /// The type that was requested.
        expected: &'static str,
        /// The dataset's stored type.
        actual: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Format(e) => write!(f, "container format error: {e}"),
            Error::NotFound(path) => write!(f, "no such object: {path}"),
            Error::NotADataset(path) => write!(f, "not a dataset: {path}"),
            Error::NotAGroup(path) => write!(f, "not a group: {path}"),
            Error::AlreadyExists(path) => write!(f, "object already exists: {path}"),
            Error::RankTooLarge(rank) => {
                write!(f, "dataset rank {rank} exceeds the format limit of 255")
            }
            Error::NameTooLong(len) => {
                write!(
                    f,
                    "link name of {len} bytes exceeds the format limit of 65535"
                )
            }
            Error::ShapeOverflow => {
                write!(f, "shape extent product overflows the element-count range")
            }
            Error::ShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "shape mismatch: shape implies {expected} elements, got {actual}"
                )
            }
            Error::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {expected}, dataset is {actual}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Error::Format(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
