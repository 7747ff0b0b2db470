//! Format-tagged dispatch.
//!
//! Many tables come in several layouts, distinguished by a small integer
//! selector (usually a `format` field at the start of the table, sometimes a
//! lookup type or a delta format stored elsewhere). A [`FormatRecord`] knows
//! how to pick its variant from that selector, and a [`DispatchContext`] is
//! the visitor that gets applied to whichever variant was picked.
//!
//! The selector is always read (with bounds checks) before any variant field
//! is touched, and a selector that is not recognized is not an error: the
//! context's [`default_return_value`] is returned instead, so that fonts
//! using newer formats still work with older readers.
//!
//! [`default_return_value`]: DispatchContext::default_return_value

use crate::{FontData, FontRead, Format, ReadError, TableRef};

/// A visitor that is applied to format-tagged structures.
///
/// A context is created for a single traversal and may carry state across
/// the whole walk (a visited set, a budget, an output buffer...).
pub trait DispatchContext<'a> {
    /// The value produced by visiting a structure.
    type Output;

    /// Called with the selector of a structure before it is visited.
    ///
    /// Returning `false` skips the structure, and [`no_dispatch_return_value`]
    /// is returned in its place.
    ///
    /// [`no_dispatch_return_value`]: DispatchContext::no_dispatch_return_value
    fn may_dispatch(&mut self, _data: FontData<'a>, _format: u16) -> bool {
        true
    }

    /// The value returned for selectors this crate does not know about.
    fn default_return_value(&mut self) -> Self::Output;

    /// The value returned when [`may_dispatch`](Self::may_dispatch) refuses.
    fn no_dispatch_return_value(&mut self) -> Self::Output {
        self.default_return_value()
    }

    /// The value returned when the selector, or the selected variant, cannot
    /// be read from `data`.
    fn read_error(&mut self, data: FontData<'a>, error: ReadError) -> Self::Output;
}

/// A structure whose layout is chosen by a selector value.
pub trait FormatRecord<'a>: Sized {
    /// The position of the selector, relative to the start of the structure.
    const SELECTOR_POS: usize = 0;

    /// Read the selector for the structure at `data`.
    fn read_selector(data: FontData<'a>) -> Result<u16, ReadError> {
        data.read_at(Self::SELECTOR_POS)
    }

    /// Read the variant identified by `selector`.
    ///
    /// Returns `None` if the selector is not recognized.
    fn select(data: FontData<'a>, selector: u16) -> Option<Result<Self, ReadError>>;
}

// a table with a single format selects itself when the format matches
impl<'a, T> FormatRecord<'a> for TableRef<'a, T>
where
    T: Format<u16>,
    TableRef<'a, T>: FontRead<'a>,
{
    fn select(data: FontData<'a>, selector: u16) -> Option<Result<Self, ReadError>> {
        (selector == T::FORMAT).then(|| Self::read(data))
    }
}

/// An operation that a [`DispatchContext`] can apply to a concrete table.
pub trait Dispatch<'a, C: DispatchContext<'a>> {
    fn dispatch(&self, ctx: &mut C) -> C::Output;
}

/// Read the selector of `T` at `data` and apply `ctx` to the selected variant.
pub fn dispatch<'a, T, C>(data: FontData<'a>, ctx: &mut C) -> C::Output
where
    T: FormatRecord<'a> + Dispatch<'a, C>,
    C: DispatchContext<'a>,
{
    let selector = match T::read_selector(data) {
        Ok(selector) => selector,
        Err(e) => return ctx.read_error(data, e),
    };
    if !ctx.may_dispatch(data, selector) {
        return ctx.no_dispatch_return_value();
    }
    match T::select(data, selector) {
        None => ctx.default_return_value(),
        Some(Ok(record)) => record.dispatch(ctx),
        Some(Err(e)) => ctx.read_error(data, e),
    }
}

/// Implements [`FontRead`](crate::FontRead) for a [`FormatRecord`], where an
/// unknown selector is reported as [`ReadError::InvalidFormat`].
macro_rules! format_record_font_read {
    ($ty:ident) => {
        impl<'a> $crate::FontRead<'a> for $ty<'a> {
            fn read(data: $crate::FontData<'a>) -> Result<Self, $crate::ReadError> {
                let selector = <Self as $crate::dispatch::FormatRecord<'a>>::read_selector(data)?;
                <Self as $crate::dispatch::FormatRecord<'a>>::select(data, selector)
                    .unwrap_or(Err($crate::ReadError::InvalidFormat(selector.into())))
            }
        }
    };
}

pub(crate) use format_record_font_read;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::layout::{CoverageFormat1, CoverageFormat2, CoverageTable};
    use sfnt_test_data::{be_buffer, bebuffer::BeBuffer};

    /// Records which coverage formats were visited.
    #[derive(Default)]
    struct FormatLog {
        seen: Vec<u16>,
        refuse: Option<u16>,
        errors: usize,
    }

    impl<'a> DispatchContext<'a> for FormatLog {
        type Output = Option<u16>;

        fn may_dispatch(&mut self, _data: FontData<'a>, format: u16) -> bool {
            self.refuse != Some(format)
        }

        fn default_return_value(&mut self) -> Option<u16> {
            None
        }

        fn read_error(&mut self, _data: FontData<'a>, _error: ReadError) -> Option<u16> {
            self.errors += 1;
            None
        }
    }

    impl<'a> Dispatch<'a, FormatLog> for CoverageFormat1<'a> {
        fn dispatch(&self, ctx: &mut FormatLog) -> Option<u16> {
            ctx.seen.push(1);
            Some(self.glyph_count())
        }
    }

    impl<'a> Dispatch<'a, FormatLog> for CoverageFormat2<'a> {
        fn dispatch(&self, ctx: &mut FormatLog) -> Option<u16> {
            ctx.seen.push(2);
            Some(self.range_count())
        }
    }

    impl<'a> Dispatch<'a, FormatLog> for CoverageTable<'a> {
        fn dispatch(&self, ctx: &mut FormatLog) -> Option<u16> {
            match self {
                CoverageTable::Format1(table) => table.dispatch(ctx),
                CoverageTable::Format2(table) => table.dispatch(ctx),
            }
        }
    }

    fn format1() -> BeBuffer {
        be_buffer! { 1u16, 2u16, [5u16, 9] }
    }

    #[test]
    fn selects_variant_by_format() {
        let buf = format1();
        let mut ctx = FormatLog::default();
        let result = dispatch::<CoverageTable, _>(FontData::new(&buf), &mut ctx);
        assert_eq!(result, Some(2));
        assert_eq!(ctx.seen, [1]);

        let buf = be_buffer! { 2u16, 1u16, [5u16, 9, 0] };
        assert_eq!(dispatch::<CoverageTable, _>(FontData::new(&buf), &mut ctx), Some(1));
        assert_eq!(ctx.seen, [1, 2]);
    }

    #[test]
    fn unknown_format_is_default() {
        let buf = be_buffer! { 7u16, 0u16 };
        let mut ctx = FormatLog::default();
        assert_eq!(dispatch::<CoverageTable, _>(FontData::new(&buf), &mut ctx), None);
        assert!(ctx.seen.is_empty());
        assert_eq!(ctx.errors, 0);
    }

    #[test]
    fn unreadable_selector_is_error() {
        let mut ctx = FormatLog::default();
        assert_eq!(
            dispatch::<CoverageTable, _>(FontData::new(&[0]), &mut ctx),
            None
        );
        assert_eq!(ctx.errors, 1);
    }

    #[test]
    fn refused_dispatch_skips_variant() {
        let buf = format1();
        let mut ctx = FormatLog {
            refuse: Some(1),
            ..Default::default()
        };
        assert_eq!(dispatch::<CoverageTable, _>(FontData::new(&buf), &mut ctx), None);
        assert!(ctx.seen.is_empty());
    }

    #[test]
    fn truncated_variant_is_error() {
        // claims two glyphs, has one
        let buf = be_buffer! { 1u16, 2u16, 5u16 };
        let mut ctx = FormatLog::default();
        assert_eq!(dispatch::<CoverageTable, _>(FontData::new(&buf), &mut ctx), None);
        assert_eq!(ctx.errors, 1);
    }
}
