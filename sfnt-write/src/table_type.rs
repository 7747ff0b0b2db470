//! Identifiers for specific tables
//!
//! These are used to record the type of certain serialized tables & subtables
//! that may require special attention while compiling the object graph.

use std::fmt::Display;

use types::Tag;

/// The lookup type of a GPOS extension lookup.
pub(crate) const GPOS_EXTENSION: u16 = read::tables::gpos::EXTENSION_LOOKUP_TYPE;
/// The lookup type of a GPOS pair adjustment lookup.
pub(crate) const GPOS_PAIR: u16 = 2;
/// The lookup type of a GPOS mark-to-base attachment lookup.
pub(crate) const GPOS_MARK_TO_BASE: u16 = 4;

/// A marker for identifying the original source of various compiled tables.
///
/// In the general case, once a table has been compiled we do not need to know
/// what the bytes represent; however in certain special cases we do need this
/// information, in order to try alternate compilation strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TableType {
    // a table with no special behaviour
    #[default]
    Unknown,
    /// A top-level table
    TopLevel(Tag),
    /// A GPOS lookup, with its lookup type
    GposLookup(u16),
}

impl TableType {
    pub(crate) const GPOS: TableType = TableType::TopLevel(read::tables::gpos::TAG);

    /// `true` if this lookup can be moved behind an extension lookup.
    pub(crate) fn is_promotable(self) -> bool {
        matches!(self, TableType::GposLookup(type_) if type_ != GPOS_EXTENSION)
    }

    /// `true` if the subtables of this lookup may be split into several.
    ///
    /// Extension lookups qualify because the subtable they wrap may.
    pub(crate) fn is_splittable(self) -> bool {
        matches!(
            self,
            TableType::GposLookup(GPOS_PAIR | GPOS_MARK_TO_BASE | GPOS_EXTENSION)
        )
    }
}

impl Display for TableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableType::Unknown => f.write_str("Unknown"),
            TableType::TopLevel(tag) => write!(f, "{tag}"),
            TableType::GposLookup(type_) => write!(f, "GPOS lookup type {type_}"),
        }
    }
}
