//! Choosing the most compact format for coverage and class tables

use std::collections::BTreeMap;

use types::GlyphId16;

use super::{
    are_sequential, ClassDef, ClassDefFormat1, ClassDefFormat2, ClassRangeRecord,
    CoverageFormat1, CoverageFormat2, CoverageTable, RangeRecord,
};

// every format starts with a format and a count (or start glyph)
const COVERAGE_HEADER: usize = 4;
const CLASS_DEF_1_HEADER: usize = 6;
const CLASS_DEF_2_HEADER: usize = 4;
const GLYPH_LEN: usize = 2;
const RANGE_LEN: usize = 6;

/// A run of consecutive glyphs that share a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Run<T> {
    first: GlyphId16,
    last: GlyphId16,
    value: T,
}

impl<T> Run<T> {
    fn len(&self) -> u16 {
        self.last.to_u16() - self.first.to_u16() + 1
    }
}

/// Group sorted, unique glyphs into runs.
fn runs<T: Copy + Eq>(items: impl IntoIterator<Item = (GlyphId16, T)>) -> Vec<Run<T>> {
    let mut out: Vec<Run<T>> = Vec::new();
    for (glyph, value) in items {
        match out.last_mut() {
            Some(run) if run.value == value && are_sequential(run.last, glyph) => run.last = glyph,
            _ => out.push(Run {
                first: glyph,
                last: glyph,
                value,
            }),
        }
    }
    out
}

/// Builds a [ClassDef], picking whichever format is smaller.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ClassDefBuilder {
    pub items: BTreeMap<GlyphId16, u16>,
}

impl ClassDefBuilder {
    /// Assign a glyph to a class. Class 0 is implicit and is not stored.
    pub fn insert(&mut self, glyph: GlyphId16, class: u16) {
        if class != 0 {
            self.items.insert(glyph, class);
        }
    }

    pub fn build(&self) -> ClassDef {
        let ranges = runs(self.items.iter().map(|(glyph, class)| (*glyph, *class)));
        let span = self
            .items
            .keys()
            .next()
            .zip(self.items.keys().next_back())
            .map(|(first, last)| (*first, *last));

        // an empty class def is smallest as format 2
        let Some((first, last)) = span else {
            return ClassDefFormat2::new(Vec::new()).into();
        };
        let format_1_len =
            CLASS_DEF_1_HEADER + GLYPH_LEN * (last.to_u16() - first.to_u16()) as usize + GLYPH_LEN;
        let format_2_len = CLASS_DEF_2_HEADER + RANGE_LEN * ranges.len();

        if format_1_len < format_2_len {
            let classes = (first.to_u16()..=last.to_u16())
                .map(|gid| self.items.get(&GlyphId16::new(gid)).copied().unwrap_or(0))
                .collect();
            ClassDefFormat1::new(first, classes).into()
        } else {
            let records = ranges
                .into_iter()
                .map(|run| ClassRangeRecord::new(run.first, run.last, run.value))
                .collect();
            ClassDefFormat2::new(records).into()
        }
    }
}

impl FromIterator<(GlyphId16, u16)> for ClassDefBuilder {
    fn from_iter<T: IntoIterator<Item = (GlyphId16, u16)>>(iter: T) -> Self {
        let mut builder = ClassDefBuilder::default();
        iter.into_iter()
            .for_each(|(glyph, class)| builder.insert(glyph, class));
        builder
    }
}

/// Builds a [CoverageTable], picking whichever format is smaller.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CoverageTableBuilder {
    // sorted, without duplicates
    glyphs: Vec<GlyphId16>,
}

impl CoverageTableBuilder {
    pub fn from_glyphs(mut glyphs: Vec<GlyphId16>) -> Self {
        glyphs.sort_unstable();
        glyphs.dedup();
        CoverageTableBuilder { glyphs }
    }

    /// Add a glyph, returning its coverage index.
    ///
    /// Adding a glyph that is already covered returns its existing index.
    /// Indices of glyphs after it shift up by one.
    pub fn add(&mut self, glyph: GlyphId16) -> u16 {
        let index = self.glyphs.binary_search(&glyph).unwrap_or_else(|slot| {
            self.glyphs.insert(slot, glyph);
            slot
        });
        // at most u16::MAX + 1 distinct glyphs, so the index fits
        index as u16
    }

    pub fn build(self) -> CoverageTable {
        let ranges = runs(self.glyphs.iter().map(|glyph| (*glyph, ())));
        let format_1_len = COVERAGE_HEADER + GLYPH_LEN * self.glyphs.len();
        let format_2_len = COVERAGE_HEADER + RANGE_LEN * ranges.len();
        if format_2_len >= format_1_len {
            return CoverageTable::Format1(CoverageFormat1::new(self.glyphs));
        }

        let mut index = 0u16;
        let records = ranges
            .iter()
            .map(|run| {
                let record = RangeRecord::new(run.first, run.last, index);
                index = index.wrapping_add(run.len());
                record
            })
            .collect();
        CoverageTable::Format2(CoverageFormat2::new(records))
    }
}

impl FromIterator<GlyphId16> for CoverageTableBuilder {
    fn from_iter<T: IntoIterator<Item = GlyphId16>>(iter: T) -> Self {
        CoverageTableBuilder::from_glyphs(iter.into_iter().collect())
    }
}
