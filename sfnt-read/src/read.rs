//! Parsing tables and records out of [`FontData`].

use types::Tag;

use crate::font_data::FontData;

/// Parse `Self` from the start of some bytes.
///
/// Parsing checks what is needed for the accessors to be total: version
/// dependent fields exist and arrays fit in `data`. Offsets are not followed;
/// the sanitizer does that.
pub trait FontRead<'a>: Sized {
    fn read(data: FontData<'a>) -> Result<Self, ReadError>;
}

/// Names the arguments a type needs from its parent in order to be parsed.
///
/// Value formats, class counts and feature tags all travel this way.
pub trait ReadArgs {
    type Args: Copy;
}

/// Parse `Self` with help from the parent.
///
/// Several arguments are passed as a tuple.
pub trait FontReadWithArgs<'a>: Sized + ReadArgs {
    fn read_with_args(data: FontData<'a>, args: &Self::Args) -> Result<Self, ReadError>;
}

// anything self describing can be read wherever args are expected.
impl<'a, T: FontRead<'a>> ReadArgs for T {
    type Args = ();
}

impl<'a, T: FontRead<'a>> FontReadWithArgs<'a> for T {
    fn read_with_args(data: FontData<'a>, _: &()) -> Result<Self, ReadError> {
        T::read(data)
    }
}

/// The format number stored at the start of one variant of a table.
pub trait Format<T> {
    const FORMAT: T;
}

/// The encoded size of a record whose size depends on its args.
///
/// Records of constant size use [`FixedSize`](types::FixedSize).
pub trait ComputeSize: ReadArgs {
    fn compute_size(args: &Self::Args) -> usize;
}

/// Why some bytes could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// A read or an array ran past the end of the data.
    OutOfBounds,
    /// A format or version selector had no known layout.
    InvalidFormat(i64),
    /// The first four bytes were not a known sfnt version.
    InvalidSfnt(u32),
    /// A length was not a whole number of items.
    InvalidArrayLen,
    /// A required offset was zero.
    NullOffset,
    TableIsMissing(Tag),
    MalformedData(&'static str),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds => f.write_str("read past the end of the data"),
            Self::InvalidFormat(format) => write!(f, "no layout for format {format}"),
            Self::InvalidSfnt(version) => write!(f, "unknown sfnt version {version:#010X}"),
            Self::InvalidArrayLen => f.write_str("length is not a multiple of the item size"),
            Self::NullOffset => f.write_str("required offset is null"),
            Self::TableIsMissing(tag) => write!(f, "no '{tag}' table"),
            Self::MalformedData(reason) => write!(f, "malformed data: {reason}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReadError {}
