//! Errors that occur during writing

use crate::graph::{ObjectId, OffsetLen, Overflow};
use crate::validate::ValidationReport;

/// A packing could not be found that satisfied all offsets
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackingError {
    /// Offsets that still did not fit once every strategy was exhausted.
    Overflows(Vec<Overflow>),
    /// An object is larger than any offset of the required width can span.
    OversizedNode {
        id: ObjectId,
        size: usize,
        capacity: OffsetLen,
    },
}

/// An error occured while writing this table
#[derive(Clone, Debug)]
pub enum Error {
    ValidationFailed(ValidationReport),
    PackingFailed(PackingError),
    /// The table directory's 16-bit fields cannot describe this many tables.
    TooManyTables(usize),
    /// A table of this length would end beyond the reach of a 32-bit offset.
    TableOutOfRange(usize),
}

impl From<ValidationReport> for Error {
    fn from(src: ValidationReport) -> Error {
        Error::ValidationFailed(src)
    }
}

impl From<PackingError> for Error {
    fn from(src: PackingError) -> Error {
        Error::PackingFailed(src)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ValidationFailed(report) => report.fmt(f),
            Error::PackingFailed(error) => error.fmt(f),
            Error::TooManyTables(count) => {
                write!(f, "a table directory cannot hold {count} tables")
            }
            Error::TableOutOfRange(len) => {
                write!(f, "a table of {len} bytes would end past 4GiB")
            }
        }
    }
}

impl std::fmt::Display for PackingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackingError::Overflows(overflows) => {
                write!(f, "Table packing failed with {} overflows", overflows.len())
            }
            PackingError::OversizedNode { id, size, capacity } => write!(
                f,
                "object {id:?} has size {size}, which cannot be addressed by an {capacity}"
            ),
        }
    }
}

impl std::error::Error for PackingError {}
impl std::error::Error for Error {}
