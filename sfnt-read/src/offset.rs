//! Following offsets from a parent table to its children.

use crate::font_data::FontData;
use crate::read::{FontRead, FontReadWithArgs, ReadError};
use types::{Nullable, Offset16, Offset24, Offset32};

/// An offset of any width, measured from the start of its parent.
pub trait Offset: Copy {
    fn to_usize(self) -> usize;

    /// The offset, unless it is zero.
    fn non_null(self) -> Option<usize> {
        Some(self.to_usize()).filter(|pos| *pos != 0)
    }
}

impl Offset for Offset16 {
    #[inline]
    fn to_usize(self) -> usize {
        self.to_u32() as usize
    }
}

impl Offset for Offset24 {
    #[inline]
    fn to_usize(self) -> usize {
        self.to_u32() as usize
    }
}

impl Offset for Offset32 {
    #[inline]
    fn to_usize(self) -> usize {
        self.to_u32() as usize
    }
}

/// The data an offset points at, relative to `parent`.
fn target<'a>(parent: FontData<'a>, offset: impl Offset) -> Result<FontData<'a>, ReadError> {
    let pos = offset.non_null().ok_or(ReadError::NullOffset)?;
    parent.split_off(pos).ok_or(ReadError::OutOfBounds)
}

/// Parse the child table an offset points to.
///
/// A null offset is [`ReadError::NullOffset`].
pub trait ResolveOffset {
    fn resolve<'a, T: FontRead<'a>>(&self, data: FontData<'a>) -> Result<T, ReadError>;

    fn resolve_with_args<'a, T: FontReadWithArgs<'a>>(
        &self,
        data: FontData<'a>,
        args: &T::Args,
    ) -> Result<T, ReadError>;
}

impl<O: Offset> ResolveOffset for O {
    fn resolve<'a, T: FontRead<'a>>(&self, data: FontData<'a>) -> Result<T, ReadError> {
        target(data, *self).and_then(T::read)
    }

    fn resolve_with_args<'a, T: FontReadWithArgs<'a>>(
        &self,
        data: FontData<'a>,
        args: &T::Args,
    ) -> Result<T, ReadError> {
        target(data, *self).and_then(|child| T::read_with_args(child, args))
    }
}

/// Parse the child of an offset that is allowed to be null.
///
/// A null offset is `None`, which is not an error.
pub trait ResolveNullableOffset {
    fn resolve<'a, T: FontRead<'a>>(&self, data: FontData<'a>) -> Option<Result<T, ReadError>>;

    fn resolve_with_args<'a, T: FontReadWithArgs<'a>>(
        &self,
        data: FontData<'a>,
        args: &T::Args,
    ) -> Option<Result<T, ReadError>>;
}

impl<O: Offset> ResolveNullableOffset for Nullable<O> {
    fn resolve<'a, T: FontRead<'a>>(&self, data: FontData<'a>) -> Option<Result<T, ReadError>> {
        self.offset().non_null()?;
        Some(self.offset().resolve(data))
    }

    fn resolve_with_args<'a, T: FontReadWithArgs<'a>>(
        &self,
        data: FontData<'a>,
        args: &T::Args,
    ) -> Option<Result<T, ReadError>> {
        self.offset().non_null()?;
        Some(self.offset().resolve_with_args(data, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::layout::CoverageTable;
    use sfnt_test_data::be_buffer;

    #[test]
    fn null_and_out_of_range_offsets() {
        // a format 1 coverage of one glyph, four bytes in
        let buf = be_buffer! { 0u16, 0u16, 1u16, 1u16, 5u16 };
        let data = FontData::new(&buf);

        let coverage: CoverageTable = Offset16::new(4).resolve(data).unwrap();
        assert_eq!(coverage.iter().count(), 1);

        assert_eq!(
            Offset16::new(0).resolve::<CoverageTable>(data).err(),
            Some(ReadError::NullOffset)
        );
        assert_eq!(
            Offset32::new(0x100).resolve::<CoverageTable>(data).err(),
            Some(ReadError::OutOfBounds)
        );

        let nullable: Nullable<Offset16> = Nullable::from(Offset16::new(0));
        assert!(nullable.resolve::<CoverageTable>(data).is_none());
        let nullable = Nullable::from(Offset16::new(0x100));
        assert!(matches!(
            nullable.resolve::<CoverageTable>(data),
            Some(Err(ReadError::OutOfBounds))
        ));
    }
}
