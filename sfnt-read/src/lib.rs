//! Reading and sanitizing sfnt font tables
//!
//! This crate provides memory safe zero-allocation parsing of the binary
//! tables in an OpenType font file, along with a [sanitizer] that checks
//! everything reachable from a table is in bounds before a shaping engine
//! starts trusting it.
//!
//! All reads are bounds-checked: a table is only constructed once its header
//! and the arrays it declares are known to fit inside the data, and getters
//! on a constructed table never panic.
//!
//! ## Structure
//!
//! The root [`tables`] module contains a submodule for each supported
//! [table][table-directory]: currently `GPOS` (with the common layout
//! structures it uses) and `maxp`.
//!
//! Tables that come in several formats are modeled as enums implementing
//! [`FormatRecord`], and can be visited with a [`DispatchContext`] through
//! [`dispatch()`].
//!
//! # Example
//!
//! ```no_run
//! # let path_to_my_font_file = std::path::Path::new("");
//! use sfnt_read::{FontRef, TableProvider};
//! let font_bytes = std::fs::read(path_to_my_font_file).unwrap();
//! let font = FontRef::new(&font_bytes).expect("failed to read font data");
//! let maxp = font.maxp().expect("missing 'maxp' table");
//! let gpos = font.gpos().expect("missing 'GPOS' table");
//!
//! println!("{} glyphs, {} lookups", maxp.num_glyphs(), gpos.lookup_list().unwrap().lookup_count());
//! ```
//!
//! [sanitizer]: crate::sanitize
//! [table-directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(all(not(feature = "std"), not(test)))]
#[macro_use]
extern crate core as std;

pub mod array;
pub mod dispatch;
mod font_data;
mod offset;
mod read;
#[cfg(feature = "std")]
pub mod sanitize;
mod table_provider;
mod table_ref;
pub mod tables;

pub use dispatch::{dispatch, Dispatch, DispatchContext, FormatRecord};
pub use font_data::FontData;
pub use offset::{Offset, ResolveNullableOffset, ResolveOffset};
pub use read::{ComputeSize, FontRead, FontReadWithArgs, Format, ReadArgs, ReadError};
pub use table_provider::TableProvider;
pub use table_ref::TableRef;

/// Public re-export of the sfnt-types crate.
pub extern crate sfnt_types as types;

use tables::font::TableDirectory;
use types::{Offset32, Tag};

/// The sfnt version of fonts with TrueType outlines.
pub const TT_SFNT_VERSION: u32 = 0x00010000;
/// The sfnt version of fonts with CFF outlines ('OTTO').
pub const CFF_SFNT_VERSION: u32 = 0x4F54544F;
/// The sfnt version used by some older Apple fonts ('true').
pub const TRUE_SFNT_VERSION: u32 = 0x74727565;

/// All the types that may be referenced by table definitions.
#[doc(hidden)]
pub(crate) mod table_prelude {
    pub use crate::array::ComputedArray;
    pub(crate) use crate::dispatch::format_record_font_read;
    pub use crate::dispatch::FormatRecord;
    pub use crate::font_data::{Cursor, FontData};
    pub use crate::offset::{Offset, ResolveNullableOffset, ResolveOffset};
    pub use crate::read::{ComputeSize, FontRead, FontReadWithArgs, Format, ReadArgs, ReadError};
    pub use crate::table_ref::TableRef;
    pub use std::ops::Range;

    pub use types::*;
}

/// Reference to an in-memory font.
///
/// This is a simple implementation of the [`TableProvider`] trait backed
/// by a borrowed slice containing font data.
#[derive(Clone)]
pub struct FontRef<'a> {
    data: FontData<'a>,
    pub table_directory: TableDirectory<'a>,
    // Fonts are required to have a sorted table directory, but some don't;
    // when it is sorted we can binary search it.
    table_directory_sorted: bool,
}

impl<'a> FontRef<'a> {
    /// Creates a new reference to an in-memory font backed by the given data.
    ///
    /// The data must be a single font (not a font collection) and must begin
    /// with a [table directory](https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory).
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        let data = FontData::new(data);
        let table_directory = TableDirectory::read(data)?;
        if [TT_SFNT_VERSION, CFF_SFNT_VERSION, TRUE_SFNT_VERSION]
            .contains(&table_directory.sfnt_version())
        {
            let table_directory_sorted = table_directory.is_sorted();
            Ok(FontRef {
                data,
                table_directory,
                table_directory_sorted,
            })
        } else {
            Err(ReadError::InvalidSfnt(table_directory.sfnt_version()))
        }
    }

    /// Returns the underlying font data.
    pub fn data(&self) -> FontData<'a> {
        self.data
    }

    /// Returns the associated table directory.
    pub fn table_directory(&self) -> &TableDirectory<'a> {
        &self.table_directory
    }

    /// Returns the data for the table with the specified tag, if present.
    ///
    /// Returns `None` if the table is missing, or if its record points
    /// outside the font.
    pub fn table_data(&self, tag: Tag) -> Option<FontData<'a>> {
        let records = self.table_directory.table_records();
        let entry = if self.table_directory_sorted {
            records.binary_search_by(|rec| rec.tag().cmp(&tag)).ok()
        } else {
            records.iter().position(|rec| rec.tag() == tag)
        };

        entry
            .and_then(|idx| records.get(idx))
            .and_then(|record| {
                let start = Offset32::new(record.offset()).non_null()?;
                let len = record.length() as usize;
                self.data.slice(start..start.checked_add(len)?)
            })
    }
}

impl<'a> TableProvider<'a> for FontRef<'a> {
    fn data_for_tag(&self, tag: Tag) -> Option<FontData<'a>> {
        self.table_data(tag)
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::{be_buffer, maxp::MAXP_V05};
    use types::Tag;

    use super::*;

    #[test]
    fn unsorted_table_directory() {
        let gpos_data = sfnt_test_data::gpos::SINGLEPOSFORMAT1;

        let font_data = be_buffer! {
            TT_SFNT_VERSION,
            2u16,    // num tables
            32u16,   // search range
            1u16,    // entry selector
            0u16,    // range shift

            (Tag::new(b"maxp")),
            0u32,    // checksum
            44u32,   // offset
            (MAXP_V05.len() as u32),

            (Tag::new(b"GPOS")),
            0u32,    // checksum
            52u32,   // offset
            (gpos_data.len() as u32)
        };

        let mut full_font = font_data.to_vec();
        full_font.extend_from_slice(MAXP_V05);
        full_font.extend_from_slice(&[0, 0]);
        full_font.extend_from_slice(gpos_data);

        let font = FontRef::new(&full_font).unwrap();

        assert!(!font.table_directory_sorted);
        assert_eq!(font.maxp().unwrap().num_glyphs(), 5);
        assert!(font.table_data(Tag::new(b"GPOS")).is_some());
        assert!(font.table_data(Tag::new(b"head")).is_none());
    }

    #[test]
    fn sorted_table_directory() {
        let gpos = sfnt_test_data::gpos::simple_gpos();
        let font = sfnt_test_data::sfnt(&[
            (Tag::new(b"maxp"), MAXP_V05),
            (Tag::new(b"GPOS"), gpos.as_slice()),
        ]);
        let font = FontRef::new(&font).unwrap();
        assert!(font.table_directory_sorted);
        assert_eq!(font.table_directory().num_tables(), 2);
        assert_eq!(
            font.table_data(Tag::new(b"GPOS")).map(|data| data.len()),
            Some(gpos.len())
        );
    }

    #[test]
    fn record_out_of_bounds() {
        let font_data = be_buffer! {
            TT_SFNT_VERSION, 1u16, 16u16, 0u16, 0u16,
            (Tag::new(b"maxp")), 0u32, 28u32, 0xFFFF_FFFFu32
        };
        let font = FontRef::new(&font_data).unwrap();
        assert!(font.table_data(Tag::new(b"maxp")).is_none());
        assert!(matches!(
            font.maxp(),
            Err(ReadError::TableIsMissing(_))
        ));
    }

    #[test]
    fn bad_sfnt_version() {
        let font_data = be_buffer! { 0x1234_5678u32, 0u16, 0u16, 0u16, 0u16 };
        assert!(matches!(
            FontRef::new(&font_data),
            Err(ReadError::InvalidSfnt(0x1234_5678))
        ));
    }
}
