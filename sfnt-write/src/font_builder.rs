//!  A builder for top-level font objects

use std::collections::BTreeMap;
use std::{borrow::Cow, fmt::Display};

use read::{FontRef, TableProvider};
use types::{Tag, TT_SFNT_VERSION};

use crate::{error::Error, validate::Validate, FontWrite, TableWriter};

const TABLE_RECORD_LEN: usize = 16;
const HEADER_LEN: usize = 12;

/// A table that can appear at the top level of a font, with its own tag.
pub trait TopLevelTable {
    /// The tag of this table in the table directory.
    const TAG: Tag;
}

/// Build a font from some set of tables.
#[derive(Debug, Clone, Default)]
pub struct FontBuilder<'a> {
    tables: BTreeMap<Tag, Cow<'a, [u8]>>,
}

/// The location of a table in a compiled font.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableDirectoryEntry {
    pub tag: Tag,
    pub checksum: u32,
    /// Offset of the table from the start of the font.
    pub offset: u32,
    /// Length of the table, excluding padding.
    pub length: u32,
}

/// An error returned when attempting to add a table to the builder, or to
/// assemble the font.
///
/// This wraps a compilation error, adding the tag of the table where it was
/// encountered.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct BuilderError {
    /// The tag of the root table where the error occurred
    pub tag: Tag,
    /// The underlying error
    pub inner: crate::error::Error,
}

/// The binary search fields of the table directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SearchRange {
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
}

impl SearchRange {
    /// `None` if any of the fields does not fit in 16 bits.
    fn compute(n_items: usize, item_size: usize) -> Option<Self> {
        if n_items == 0 {
            return Some(SearchRange {
                search_range: 0,
                entry_selector: 0,
                range_shift: 0,
            });
        }
        let entry_selector = n_items.ilog2();
        let search_range = 1usize
            .checked_shl(entry_selector)?
            .checked_mul(item_size)?;
        let range_shift = n_items.checked_mul(item_size)? - search_range;
        Some(SearchRange {
            search_range: search_range.try_into().ok()?,
            entry_selector: entry_selector.try_into().ok()?,
            range_shift: range_shift.try_into().ok()?,
        })
    }
}

struct TableDirectory<'a> {
    entries: &'a [TableDirectoryEntry],
    num_tables: u16,
    search: SearchRange,
}

impl FontWrite for TableDirectory<'_> {
    fn write_into(&self, writer: &mut TableWriter) {
        TT_SFNT_VERSION.write_into(writer);
        self.num_tables.write_into(writer);
        self.search.search_range.write_into(writer);
        self.search.entry_selector.write_into(writer);
        self.search.range_shift.write_into(writer);
        self.entries.write_into(writer);
    }
}

impl FontWrite for TableDirectoryEntry {
    fn write_into(&self, writer: &mut TableWriter) {
        self.tag.write_into(writer);
        self.checksum.write_into(writer);
        self.offset.write_into(writer);
        self.length.write_into(writer);
    }
}

impl<'a> FontBuilder<'a> {
    /// Create a new builder to compile a binary font
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to the builder.
    ///
    /// The table can be any top-level table defined in this crate. This function
    /// will attempt to compile the table and then add it to the builder if
    /// successful, returning an error otherwise.
    pub fn add_table<T>(&mut self, table: &T) -> Result<&mut Self, BuilderError>
    where
        T: FontWrite + Validate + TopLevelTable,
    {
        let tag = T::TAG;
        let bytes = crate::dump_table(table).map_err(|inner| BuilderError { inner, tag })?;
        Ok(self.add_raw(tag, bytes))
    }

    /// A builder method to add raw data for the provided tag
    pub fn add_raw(&mut self, tag: Tag, data: impl Into<Cow<'a, [u8]>>) -> &mut Self {
        self.tables.insert(tag, data.into());
        self
    }

    /// Copy each table from the source font if it does not already exist
    pub fn copy_missing_tables(&mut self, font: FontRef<'a>) -> &mut Self {
        for record in font.table_directory.table_records() {
            let tag = record.tag();
            if !self.tables.contains_key(&tag) {
                if let Some(data) = font.data_for_tag(tag) {
                    self.add_raw(tag, data.as_bytes());
                } else {
                    log::warn!("data for '{tag}' is malformed");
                }
            }
        }
        self
    }

    /// Returns `true` if the builder contains a table with this tag.
    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// Assemble all the tables into a binary font file with a [Table Directory].
    ///
    /// Fails if the directory cannot describe the tables: too many of them
    /// for its 16-bit fields, or data reaching past a 32-bit offset.
    ///
    /// [Table Directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory
    pub fn build(&mut self) -> Result<Vec<u8>, BuilderError> {
        self.build_with_directory().map(|(bytes, _)| bytes)
    }

    /// Assemble the font, also returning where each table was placed.
    ///
    /// Tables are written in tag order, each padded to a multiple of four bytes.
    pub fn build_with_directory(
        &mut self,
    ) -> Result<(Vec<u8>, Vec<TableDirectoryEntry>), BuilderError> {
        let n_tables = self.tables.len();
        let too_many = || BuilderError {
            tag: self.tables.keys().last().copied().unwrap_or_default(),
            inner: Error::TooManyTables(n_tables),
        };
        let num_tables = u16::try_from(n_tables).map_err(|_| too_many())?;
        let search = SearchRange::compute(n_tables, TABLE_RECORD_LEN).ok_or_else(too_many)?;

        let header_len = HEADER_LEN + n_tables * TABLE_RECORD_LEN;
        let mut position = header_len as u32;
        let mut entries = Vec::with_capacity(n_tables);
        for (tag, data) in &self.tables {
            let out_of_range = || BuilderError {
                tag: *tag,
                inner: Error::TableOutOfRange(data.len()),
            };
            let offset = position;
            let length = u32::try_from(data.len()).map_err(|_| out_of_range())?;
            position = next_table_position(offset, length).ok_or_else(out_of_range)?;
            entries.push(TableDirectoryEntry {
                tag: *tag,
                checksum: compute_checksum(data),
                offset,
                length,
            });
        }

        let mut writer = TableWriter::default();
        TableDirectory {
            entries: &entries,
            num_tables,
            search,
        }
        .write_into(&mut writer);
        let mut data = writer.into_data().bytes;
        log::debug!("writing {n_tables} tables, {position} bytes");
        data.reserve(position as usize - data.len());
        for table in self.tables.values() {
            data.extend_from_slice(table);
            let rem = round4(table.len()) - table.len();
            let padding = [0u8; 4];
            data.extend_from_slice(&padding[..rem]);
        }
        Ok((data, entries))
    }
}

/// Where the table after one of `length` bytes at `offset` starts, once
/// padded to four bytes.
fn next_table_position(offset: u32, length: u32) -> Option<u32> {
    offset.checked_add(length)?.checked_next_multiple_of(4)
}

/// <https://github.com/google/woff2/blob/a0d0ed7da27b708c0a4e96ad7a998bddc933c06e/src/round.h#L19>
fn round4(sz: usize) -> usize {
    (sz + 3) & !3
}

/// The table checksum: the sum of the table's big-endian u32s, with the final
/// partial word padded with zeros.
fn compute_checksum(table: &[u8]) -> u32 {
    table
        .chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .fold(0u32, u32::wrapping_add)
}

impl Display for BuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to build '{}' table: '{}'", self.tag, self.inner)
    }
}

impl std::error::Error for BuilderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}
