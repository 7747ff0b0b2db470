//! test data shared between the sfnt crates.

pub mod bebuffer;
pub mod gpos;
pub mod maxp;

use sfnt_types::Tag;

/// Wrap a set of tables in a minimal TrueType sfnt wrapper.
///
/// Tables are sorted by tag and padded to four bytes; checksums are left
/// as zero, since nothing in these tests reads them.
pub fn sfnt(tables: &[(Tag, &[u8])]) -> Vec<u8> {
    let mut tables = tables.to_vec();
    tables.sort_by_key(|(tag, _)| *tag);
    let num_tables = tables.len() as u16;
    let entry_selector = (num_tables.max(1)).ilog2() as u16;
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);

    let mut out = Vec::new();
    out.extend(0x0001_0000u32.to_be_bytes());
    out.extend(num_tables.to_be_bytes());
    out.extend(search_range.to_be_bytes());
    out.extend(entry_selector.to_be_bytes());
    out.extend(range_shift.to_be_bytes());

    let mut offset = 12 + tables.len() * 16;
    for (tag, data) in &tables {
        out.extend(tag.to_be_bytes());
        out.extend(0u32.to_be_bytes());
        out.extend((offset as u32).to_be_bytes());
        out.extend((data.len() as u32).to_be_bytes());
        offset += data.len().next_multiple_of(4);
    }
    for (_, data) in &tables {
        out.extend_from_slice(data);
        out.resize(out.len().next_multiple_of(4), 0);
    }
    out
}
