//! OpenType layout.
//!
//! The common tables shared by `GPOS` and `GSUB`: script and feature lists,
//! lookups, coverage and class definitions, and device tables.

use std::collections::BTreeSet;

pub use read::tables::layout::LookupFlag;
use types::{GlyphId16, Tag};

use crate::{
    offsets::{NullableOffsetMarker, OffsetMarker},
    table_type::TableType,
    validate::{Validate, ValidationCtx},
    write::{FontWrite, TableWriter},
};

mod builders;

pub use builders::{ClassDefBuilder, CoverageTableBuilder};

/// A utility trait for writing lookup tables.
///
/// This allows us to attach the numerical lookup type to the appropriate concrete
/// types, so that we can write it as needed without passing it around.
pub trait LookupSubtable {
    /// The lookup type of this layout subtable.
    const TYPE: u16;
}

/// A macro to implement the [LookupSubtable] trait.
macro_rules! lookup_type {
    ($ty:ty, $val:expr) => {
        impl LookupSubtable for $ty {
            const TYPE: u16 = $val;
        }
    };
}

pub(crate) use lookup_type;

fn check_array_len<T>(items: &[T], ctx: &mut ValidationCtx) {
    if items.len() > u16::MAX as usize {
        ctx.report("array exceeds max length");
    }
}

impl FontWrite for LookupFlag {
    fn write_into(&self, writer: &mut TableWriter) {
        self.to_bits().write_into(writer)
    }
}

/// [Script List Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#script-list-table-and-script-record)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptList {
    pub script_records: Vec<ScriptRecord>,
}

impl ScriptList {
    pub fn new(script_records: Vec<ScriptRecord>) -> Self {
        Self { script_records }
    }
}

impl FontWrite for ScriptList {
    fn write_into(&self, writer: &mut TableWriter) {
        (self.script_records.len() as u16).write_into(writer);
        self.script_records.write_into(writer);
    }
}

impl Validate for ScriptList {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ScriptList", |ctx| {
            ctx.in_field("script_records", |ctx| {
                check_array_len(&self.script_records, ctx);
                if !self
                    .script_records
                    .windows(2)
                    .all(|pair| pair[0].script_tag < pair[1].script_tag)
                {
                    ctx.report("script records must be sorted by tag");
                }
                self.script_records.validate_impl(ctx);
            });
        })
    }
}

/// Part of [ScriptList]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptRecord {
    pub script_tag: Tag,
    pub script: OffsetMarker<Script>,
}

impl ScriptRecord {
    pub fn new(script_tag: Tag, script: Script) -> Self {
        Self {
            script_tag,
            script: script.into(),
        }
    }
}

impl FontWrite for ScriptRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.script_tag.write_into(writer);
        self.script.write_into(writer);
    }
}

impl Validate for ScriptRecord {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_field("script", |ctx| self.script.validate_impl(ctx));
    }
}

/// [Script Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#script-table-and-language-system-record)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    pub default_lang_sys: NullableOffsetMarker<LangSys>,
    pub lang_sys_records: Vec<LangSysRecord>,
}

impl Script {
    pub fn new(default_lang_sys: Option<LangSys>, lang_sys_records: Vec<LangSysRecord>) -> Self {
        Self {
            default_lang_sys: default_lang_sys.into(),
            lang_sys_records,
        }
    }
}

impl FontWrite for Script {
    fn write_into(&self, writer: &mut TableWriter) {
        self.default_lang_sys.write_into(writer);
        (self.lang_sys_records.len() as u16).write_into(writer);
        self.lang_sys_records.write_into(writer);
    }
}

impl Validate for Script {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Script", |ctx| {
            ctx.in_field("default_lang_sys", |ctx| {
                self.default_lang_sys.validate_impl(ctx)
            });
            ctx.in_field("lang_sys_records", |ctx| {
                check_array_len(&self.lang_sys_records, ctx);
                self.lang_sys_records.validate_impl(ctx);
            });
        })
    }
}

/// Part of [Script]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LangSysRecord {
    pub lang_sys_tag: Tag,
    pub lang_sys: OffsetMarker<LangSys>,
}

impl LangSysRecord {
    pub fn new(lang_sys_tag: Tag, lang_sys: LangSys) -> Self {
        Self {
            lang_sys_tag,
            lang_sys: lang_sys.into(),
        }
    }
}

impl FontWrite for LangSysRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.lang_sys_tag.write_into(writer);
        self.lang_sys.write_into(writer);
    }
}

impl Validate for LangSysRecord {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_field("lang_sys", |ctx| self.lang_sys.validate_impl(ctx));
    }
}

/// [Language System Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#language-system-table)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LangSys {
    /// Index of a feature required for this language system; if no required
    /// features = 0xFFFF
    pub required_feature_index: u16,
    pub feature_indices: Vec<u16>,
}

impl Default for LangSys {
    fn default() -> Self {
        LangSys {
            required_feature_index: 0xFFFF,
            feature_indices: Vec::new(),
        }
    }
}

impl LangSys {
    pub fn new(feature_indices: Vec<u16>) -> Self {
        Self {
            feature_indices,
            ..Default::default()
        }
    }
}

impl FontWrite for LangSys {
    fn write_into(&self, writer: &mut TableWriter) {
        // lookupOrderOffset, reserved
        0u16.write_into(writer);
        self.required_feature_index.write_into(writer);
        (self.feature_indices.len() as u16).write_into(writer);
        self.feature_indices.write_into(writer);
    }
}

impl Validate for LangSys {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("LangSys", |ctx| {
            ctx.in_field("feature_indices", |ctx| {
                check_array_len(&self.feature_indices, ctx)
            });
        })
    }
}

/// [Feature List Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-list-table)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureList {
    pub feature_records: Vec<FeatureRecord>,
}

impl FeatureList {
    pub fn new(feature_records: Vec<FeatureRecord>) -> Self {
        Self { feature_records }
    }
}

impl FontWrite for FeatureList {
    fn write_into(&self, writer: &mut TableWriter) {
        (self.feature_records.len() as u16).write_into(writer);
        self.feature_records.write_into(writer);
    }
}

impl Validate for FeatureList {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("FeatureList", |ctx| {
            ctx.in_field("feature_records", |ctx| {
                check_array_len(&self.feature_records, ctx);
                self.feature_records.validate_impl(ctx);
            });
        })
    }
}

/// Part of [FeatureList]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureRecord {
    pub feature_tag: Tag,
    pub feature: OffsetMarker<Feature>,
}

impl FeatureRecord {
    pub fn new(feature_tag: Tag, feature: Feature) -> Self {
        Self {
            feature_tag,
            feature: feature.into(),
        }
    }
}

impl FontWrite for FeatureRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.feature_tag.write_into(writer);
        self.feature.write_into(writer);
    }
}

impl Validate for FeatureRecord {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_field("feature", |ctx| self.feature.validate_impl(ctx));
    }
}

/// [Feature Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-table)
///
/// Feature parameters are not supported; the offset is always written as null.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Feature {
    pub lookup_list_indices: Vec<u16>,
}

impl Feature {
    pub fn new(lookup_list_indices: Vec<u16>) -> Self {
        Self {
            lookup_list_indices,
        }
    }
}

impl FontWrite for Feature {
    fn write_into(&self, writer: &mut TableWriter) {
        // featureParamsOffset
        0u16.write_into(writer);
        (self.lookup_list_indices.len() as u16).write_into(writer);
        self.lookup_list_indices.write_into(writer);
    }
}

impl Validate for Feature {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Feature", |ctx| {
            ctx.in_field("lookup_list_indices", |ctx| {
                check_array_len(&self.lookup_list_indices, ctx)
            });
        })
    }
}

/// [Lookup List Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-list-table)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupList<T> {
    pub lookups: Vec<OffsetMarker<T>>,
}

impl<T> Default for LookupList<T> {
    fn default() -> Self {
        LookupList {
            lookups: Vec::new(),
        }
    }
}

impl<T> LookupList<T> {
    pub fn new(lookups: Vec<T>) -> Self {
        Self {
            lookups: lookups.into_iter().map(Into::into).collect(),
        }
    }
}

impl<T: FontWrite> FontWrite for LookupList<T> {
    fn write_into(&self, writer: &mut TableWriter) {
        (self.lookups.len() as u16).write_into(writer);
        self.lookups.write_into(writer);
    }
}

impl<T: Validate> Validate for LookupList<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("LookupList", |ctx| {
            ctx.in_field("lookups", |ctx| {
                check_array_len(&self.lookups, ctx);
                self.lookups.validate_impl(ctx);
            });
        })
    }
}

/// [Lookup Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-table)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lookup<T> {
    pub lookup_flag: LookupFlag,
    pub subtables: Vec<OffsetMarker<T>>,
    /// Only present if `lookup_flag` has `USE_MARK_FILTERING_SET` set.
    pub mark_filtering_set: Option<u16>,
}

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Lookup {
            lookup_flag: LookupFlag::empty(),
            subtables: Vec::new(),
            mark_filtering_set: None,
        }
    }
}

impl<T> Lookup<T> {
    pub fn new(lookup_flag: LookupFlag, subtables: Vec<T>) -> Self {
        Self {
            lookup_flag,
            subtables: subtables.into_iter().map(Into::into).collect(),
            mark_filtering_set: None,
        }
    }

    /// Set the mark filtering set, also setting the corresponding flag.
    pub fn with_mark_filtering_set(mut self, set: u16) -> Self {
        self.lookup_flag = self.lookup_flag.with_use_mark_filtering_set(true);
        self.mark_filtering_set = Some(set);
        self
    }
}

impl<T: LookupSubtable + FontWrite> FontWrite for Lookup<T> {
    fn write_into(&self, writer: &mut TableWriter) {
        T::TYPE.write_into(writer);
        self.lookup_flag.write_into(writer);
        (self.subtables.len() as u16).write_into(writer);
        self.subtables.write_into(writer);
        if let Some(set) = self.mark_filtering_set {
            set.write_into(writer);
        }
    }

    fn table_type(&self) -> TableType {
        TableType::GposLookup(T::TYPE)
    }
}

impl<T: Validate> Validate for Lookup<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Lookup", |ctx| {
            if self.lookup_flag.use_mark_filtering_set() != self.mark_filtering_set.is_some() {
                ctx.report("mark_filtering_set must be present iff USE_MARK_FILTERING_SET is set");
            }
            ctx.in_field("subtables", |ctx| {
                check_array_len(&self.subtables, ctx);
                self.subtables.validate_impl(ctx);
            });
        })
    }
}

/// [Coverage Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-1)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageFormat1 {
    /// Array of glyph IDs, in numerical order
    pub glyph_array: Vec<GlyphId16>,
}

impl CoverageFormat1 {
    pub fn new(glyph_array: Vec<GlyphId16>) -> Self {
        Self { glyph_array }
    }

    fn iter(&self) -> impl Iterator<Item = GlyphId16> + '_ {
        self.glyph_array.iter().copied()
    }

    fn len(&self) -> usize {
        self.glyph_array.len()
    }
}

impl FontWrite for CoverageFormat1 {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        (self.glyph_array.len() as u16).write_into(writer);
        self.glyph_array.write_into(writer);
    }
}

impl Validate for CoverageFormat1 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("CoverageFormat1", |ctx| {
            ctx.in_field("glyph_array", |ctx| {
                check_array_len(&self.glyph_array, ctx);
                if !self.glyph_array.windows(2).all(|pair| pair[0] < pair[1]) {
                    ctx.report("glyphs must be sorted and unique");
                }
            });
        })
    }
}

/// [Coverage Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-2)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageFormat2 {
    /// Array of glyph ranges, ordered by startGlyphID.
    pub range_records: Vec<RangeRecord>,
}

impl CoverageFormat2 {
    pub fn new(range_records: Vec<RangeRecord>) -> Self {
        Self { range_records }
    }

    fn iter(&self) -> impl Iterator<Item = GlyphId16> + '_ {
        self.range_records
            .iter()
            .flat_map(|rcd| iter_gids(rcd.start_glyph_id, rcd.end_glyph_id))
    }

    fn len(&self) -> usize {
        self.range_records
            .iter()
            .map(|rcd| {
                rcd.end_glyph_id
                    .to_u16()
                    .saturating_sub(rcd.start_glyph_id.to_u16()) as usize
                    + 1
            })
            .sum()
    }
}

impl FontWrite for CoverageFormat2 {
    fn write_into(&self, writer: &mut TableWriter) {
        2u16.write_into(writer);
        (self.range_records.len() as u16).write_into(writer);
        self.range_records.write_into(writer);
    }
}

impl Validate for CoverageFormat2 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("CoverageFormat2", |ctx| {
            ctx.in_field("range_records", |ctx| {
                check_array_len(&self.range_records, ctx);
                ctx.in_array(|ctx| {
                    for rec in &self.range_records {
                        ctx.array_item(|ctx| {
                            if rec.start_glyph_id > rec.end_glyph_id {
                                ctx.report(format!(
                                    "start_glyph_id {} larger than end_glyph_id {}",
                                    rec.start_glyph_id, rec.end_glyph_id
                                ));
                            }
                        })
                    }
                })
            });
        })
    }
}

/// Used in [CoverageFormat2]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RangeRecord {
    pub start_glyph_id: GlyphId16,
    pub end_glyph_id: GlyphId16,
    /// Coverage Index of first glyph ID in range
    pub start_coverage_index: u16,
}

impl RangeRecord {
    pub fn new(
        start_glyph_id: GlyphId16,
        end_glyph_id: GlyphId16,
        start_coverage_index: u16,
    ) -> Self {
        Self {
            start_glyph_id,
            end_glyph_id,
            start_coverage_index,
        }
    }
}

impl FontWrite for RangeRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.start_glyph_id.write_into(writer);
        self.end_glyph_id.write_into(writer);
        self.start_coverage_index.write_into(writer);
    }
}

/// [Coverage Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoverageTable {
    Format1(CoverageFormat1),
    Format2(CoverageFormat2),
}

impl Default for CoverageTable {
    fn default() -> Self {
        Self::Format1(Default::default())
    }
}

impl CoverageTable {
    pub fn format_1(glyph_array: Vec<GlyphId16>) -> Self {
        Self::Format1(CoverageFormat1::new(glyph_array))
    }

    pub fn format_2(range_records: Vec<RangeRecord>) -> Self {
        Self::Format2(CoverageFormat2::new(range_records))
    }

    pub fn iter(&self) -> impl Iterator<Item = GlyphId16> + '_ {
        let (one, two) = match self {
            Self::Format1(table) => (Some(table.iter()), None),
            Self::Format2(table) => (None, Some(table.iter())),
        };

        one.into_iter().flatten().chain(two.into_iter().flatten())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Format1(table) => table.len(),
            Self::Format2(table) => table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FontWrite for CoverageTable {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            Self::Format1(table) => table.write_into(writer),
            Self::Format2(table) => table.write_into(writer),
        }
    }
}

impl Validate for CoverageTable {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            Self::Format1(table) => table.validate_impl(ctx),
            Self::Format2(table) => table.validate_impl(ctx),
        }
    }
}

impl FromIterator<GlyphId16> for CoverageTable {
    fn from_iter<T: IntoIterator<Item = GlyphId16>>(iter: T) -> Self {
        let glyphs = iter.into_iter().collect::<Vec<_>>();
        CoverageTableBuilder::from_glyphs(glyphs).build()
    }
}

/// [Class Definition Table Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table-format-1)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassDefFormat1 {
    pub start_glyph_id: GlyphId16,
    pub class_value_array: Vec<u16>,
}

impl ClassDefFormat1 {
    pub fn new(start_glyph_id: GlyphId16, class_value_array: Vec<u16>) -> Self {
        Self {
            start_glyph_id,
            class_value_array,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (GlyphId16, u16)> + '_ {
        self.class_value_array.iter().enumerate().map(|(i, cls)| {
            (
                GlyphId16::new(self.start_glyph_id.to_u16().saturating_add(i as u16)),
                *cls,
            )
        })
    }
}

impl FontWrite for ClassDefFormat1 {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        self.start_glyph_id.write_into(writer);
        (self.class_value_array.len() as u16).write_into(writer);
        self.class_value_array.write_into(writer);
    }
}

impl Validate for ClassDefFormat1 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ClassDefFormat1", |ctx| {
            ctx.in_field("class_value_array", |ctx| {
                check_array_len(&self.class_value_array, ctx)
            });
        })
    }
}

/// [Class Definition Table Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table-format-2)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassDefFormat2 {
    pub class_range_records: Vec<ClassRangeRecord>,
}

impl ClassDefFormat2 {
    pub fn new(class_range_records: Vec<ClassRangeRecord>) -> Self {
        Self {
            class_range_records,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (GlyphId16, u16)> + '_ {
        self.class_range_records.iter().flat_map(|rcd| {
            iter_gids(rcd.start_glyph_id, rcd.end_glyph_id).map(|gid| (gid, rcd.class))
        })
    }
}

impl FontWrite for ClassDefFormat2 {
    fn write_into(&self, writer: &mut TableWriter) {
        2u16.write_into(writer);
        (self.class_range_records.len() as u16).write_into(writer);
        self.class_range_records.write_into(writer);
    }
}

impl Validate for ClassDefFormat2 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ClassDefFormat2", |ctx| {
            ctx.in_field("class_range_records", |ctx| {
                check_array_len(&self.class_range_records, ctx);
                ctx.in_array(|ctx| {
                    for rec in &self.class_range_records {
                        ctx.array_item(|ctx| rec.validate_glyph_range(ctx))
                    }
                })
            });
        })
    }
}

/// Used in [ClassDefFormat2]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassRangeRecord {
    pub start_glyph_id: GlyphId16,
    pub end_glyph_id: GlyphId16,
    pub class: u16,
}

impl ClassRangeRecord {
    pub fn new(start_glyph_id: GlyphId16, end_glyph_id: GlyphId16, class: u16) -> Self {
        Self {
            start_glyph_id,
            end_glyph_id,
            class,
        }
    }

    fn validate_glyph_range(&self, ctx: &mut ValidationCtx) {
        if self.start_glyph_id > self.end_glyph_id {
            ctx.report(format!(
                "start_glyph_id {} larger than end_glyph_id {}",
                self.start_glyph_id, self.end_glyph_id
            ));
        }
    }
}

impl FontWrite for ClassRangeRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.start_glyph_id.write_into(writer);
        self.end_glyph_id.write_into(writer);
        self.class.write_into(writer);
    }
}

/// A [Class Definition Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassDef {
    Format1(ClassDefFormat1),
    Format2(ClassDefFormat2),
}

impl Default for ClassDef {
    fn default() -> Self {
        Self::Format2(Default::default())
    }
}

impl ClassDef {
    pub fn iter(&self) -> impl Iterator<Item = (GlyphId16, u16)> + '_ {
        let (one, two) = match self {
            Self::Format1(table) => (Some(table.iter()), None),
            Self::Format2(table) => (None, Some(table.iter())),
        };

        one.into_iter().flatten().chain(two.into_iter().flatten())
    }

    /// Return the glyph class for the provided glyph.
    ///
    /// Glyphs which have not been assigned a class are given class 0
    pub fn get(&self, glyph: GlyphId16) -> u16 {
        self.get_raw(glyph).unwrap_or(0)
    }

    // exposed for testing
    fn get_raw(&self, glyph: GlyphId16) -> Option<u16> {
        match self {
            ClassDef::Format1(table) => glyph
                .to_u16()
                .checked_sub(table.start_glyph_id.to_u16())
                .and_then(|idx| table.class_value_array.get(idx as usize))
                .copied()
                .filter(|cls| *cls != 0),
            ClassDef::Format2(table) => table.class_range_records.iter().find_map(|rec| {
                (rec.start_glyph_id <= glyph && glyph <= rec.end_glyph_id).then_some(rec.class)
            }),
        }
    }

    /// The number of classes, including the implicit class 0.
    ///
    /// Classes index arrays, so this is one more than the largest class.
    pub fn class_count(&self) -> u16 {
        self.iter()
            .map(|(_, cls)| cls)
            .max()
            .map(|max| max.saturating_add(1))
            .unwrap_or(1)
    }

    /// The set of classes actually assigned to some glyph.
    pub fn used_classes(&self) -> BTreeSet<u16> {
        self.iter().map(|(_, cls)| cls).collect()
    }
}

impl FontWrite for ClassDef {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            Self::Format1(table) => table.write_into(writer),
            Self::Format2(table) => table.write_into(writer),
        }
    }
}

impl Validate for ClassDef {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            Self::Format1(table) => table.validate_impl(ctx),
            Self::Format2(table) => table.validate_impl(ctx),
        }
    }
}

impl From<ClassDefFormat1> for ClassDef {
    fn from(src: ClassDefFormat1) -> ClassDef {
        ClassDef::Format1(src)
    }
}

impl From<ClassDefFormat2> for ClassDef {
    fn from(src: ClassDefFormat2) -> ClassDef {
        ClassDef::Format2(src)
    }
}

impl FromIterator<(GlyphId16, u16)> for ClassDef {
    fn from_iter<T: IntoIterator<Item = (GlyphId16, u16)>>(iter: T) -> Self {
        ClassDefBuilder::from_iter(iter).build()
    }
}

/// The packing of the values in a [Device] table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum DeltaFormat {
    /// Signed 2-bit value, 8 values per uint16
    #[default]
    Local2BitDeltas = 0x0001,
    /// Signed 4-bit value, 4 values per uint16
    Local4BitDeltas = 0x0002,
    /// Signed 8-bit value, 2 values per uint16
    Local8BitDeltas = 0x0003,
}

impl FontWrite for DeltaFormat {
    fn write_into(&self, writer: &mut TableWriter) {
        (*self as u16).write_into(writer)
    }
}

/// [Device Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#device-and-variationindex-tables)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Device {
    /// Smallest size to correct, in ppem
    pub start_size: u16,
    /// Largest size to correct, in ppem
    pub end_size: u16,
    pub delta_format: DeltaFormat,
    /// Array of compressed data
    pub delta_value: Vec<u16>,
}

impl Device {
    /// Create a device table from one adjustment per ppem size, choosing the
    /// most compact packing that can hold every value.
    pub fn new(start_size: u16, end_size: u16, values: &[i8]) -> Self {
        debug_assert_eq!(
            (start_size..=end_size).count(),
            values.len(),
            "device range and values must match"
        );
        let delta_format: DeltaFormat = values
            .iter()
            .map(|val| match val {
                -2..=1 => DeltaFormat::Local2BitDeltas,
                -8..=7 => DeltaFormat::Local4BitDeltas,
                _ => DeltaFormat::Local8BitDeltas,
            })
            .max()
            .unwrap_or_default();
        let delta_value = encode_delta(delta_format, values);

        Device {
            start_size,
            end_size,
            delta_format,
            delta_value,
        }
    }
}

impl FontWrite for Device {
    fn write_into(&self, writer: &mut TableWriter) {
        self.start_size.write_into(writer);
        self.end_size.write_into(writer);
        self.delta_format.write_into(writer);
        self.delta_value.write_into(writer);
    }
}

impl Validate for Device {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Device", |ctx| {
            if self.start_size > self.end_size {
                ctx.report("start_size must not be larger than end_size");
            }
        })
    }
}

fn encode_delta(format: DeltaFormat, values: &[i8]) -> Vec<u16> {
    let (chunk_size, mask, bits) = match format {
        DeltaFormat::Local2BitDeltas => (8, 0b11, 2),
        DeltaFormat::Local4BitDeltas => (4, 0b1111, 4),
        DeltaFormat::Local8BitDeltas => (2, 0b11111111, 8),
    };
    values
        .chunks(chunk_size)
        .map(|chunk| encode_chunk(chunk, mask, bits))
        .collect()
}

fn encode_chunk(chunk: &[i8], mask: u8, bits: usize) -> u16 {
    let mut out = 0u16;
    for (i, val) in chunk.iter().enumerate() {
        out |= ((val.to_be_bytes()[0] & mask) as u16) << ((16 - bits) - i * bits);
    }
    out
}

/// A [VariationIndex](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#variationindex-table) table
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VariationIndex {
    /// A delta-set outer index, used to select an item variation data subtable
    pub delta_set_outer_index: u16,
    /// A delta-set inner index, used to select a delta-set row
    pub delta_set_inner_index: u16,
}

impl VariationIndex {
    const DELTA_FORMAT: u16 = 0x8000;

    pub fn new(delta_set_outer_index: u16, delta_set_inner_index: u16) -> Self {
        Self {
            delta_set_outer_index,
            delta_set_inner_index,
        }
    }
}

impl FontWrite for VariationIndex {
    fn write_into(&self, writer: &mut TableWriter) {
        self.delta_set_outer_index.write_into(writer);
        self.delta_set_inner_index.write_into(writer);
        Self::DELTA_FORMAT.write_into(writer);
    }
}

impl Validate for VariationIndex {
    fn validate_impl(&self, _ctx: &mut ValidationCtx) {}
}

/// Either a [Device] or a [VariationIndex] table
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceOrVariationIndex {
    Device(Device),
    VariationIndex(VariationIndex),
}

impl From<Device> for DeviceOrVariationIndex {
    fn from(src: Device) -> Self {
        Self::Device(src)
    }
}

impl From<VariationIndex> for DeviceOrVariationIndex {
    fn from(src: VariationIndex) -> Self {
        Self::VariationIndex(src)
    }
}

impl FontWrite for DeviceOrVariationIndex {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            Self::Device(table) => table.write_into(writer),
            Self::VariationIndex(table) => table.write_into(writer),
        }
    }
}

impl Validate for DeviceOrVariationIndex {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            Self::Device(table) => table.validate_impl(ctx),
            Self::VariationIndex(table) => table.validate_impl(ctx),
        }
    }
}

fn iter_gids(gid1: GlyphId16, gid2: GlyphId16) -> impl Iterator<Item = GlyphId16> {
    (gid1.to_u16()..=gid2.to_u16()).map(GlyphId16::new)
}

fn are_sequential(gid1: GlyphId16, gid2: GlyphId16) -> bool {
    gid2.to_u16().saturating_sub(gid1.to_u16()) == 1
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::{tables::layout as read_layout, FontData, FontRead};

    use super::*;

    #[test]
    #[should_panic(expected = "array exceeds max length")]
    fn array_len_smoke_test() {
        let table = ScriptList {
            script_records: vec![ScriptRecord {
                script_tag: Tag::new(b"hihi"),
                script: OffsetMarker::new(Script {
                    default_lang_sys: NullableOffsetMarker::new(None),
                    lang_sys_records: vec![LangSysRecord {
                        lang_sys_tag: Tag::new(b"coco"),
                        lang_sys: OffsetMarker::new(LangSys {
                            required_feature_index: 0xffff,
                            feature_indices: vec![69; (u16::MAX) as usize + 5],
                        }),
                    }],
                }),
            }],
        };

        table.validate().unwrap();
    }

    #[test]
    #[should_panic(expected = "larger than end_glyph_id")]
    fn validate_classdef_ranges() {
        let classdef = ClassDefFormat2::new(vec![ClassRangeRecord::new(
            GlyphId16::new(12),
            GlyphId16::new(3),
            7,
        )]);

        classdef.validate().unwrap();
    }

    #[test]
    fn unsorted_scripts_are_reported() {
        let table = ScriptList::new(vec![
            ScriptRecord::new(Tag::new(b"latn"), Script::default()),
            ScriptRecord::new(Tag::new(b"DFLT"), Script::default()),
        ]);
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("sorted by tag"), "{err}");
    }

    #[test]
    fn delta_encode() {
        let inp = [1i8, 2, 3, -1];
        let result = encode_delta(DeltaFormat::Local4BitDeltas, &inp);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0], 0x123f_u16);

        let inp = [1i8, 1, 1, 1, 1];
        let result = encode_delta(DeltaFormat::Local2BitDeltas, &inp);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0], 0x5540_u16);
    }

    #[test]
    fn device_picks_smallest_format() {
        assert_eq!(
            Device::new(10, 12, &[1, -2, 0]).delta_format,
            DeltaFormat::Local2BitDeltas
        );
        assert_eq!(
            Device::new(10, 12, &[1, -8, 0]).delta_format,
            DeltaFormat::Local4BitDeltas
        );
        let device = Device::new(10, 12, &[1, 100, 0]);
        assert_eq!(device.delta_format, DeltaFormat::Local8BitDeltas);

        let bytes = crate::dump_table(&device).unwrap();
        let read_back = read_layout::Device::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.start_size(), 10);
        assert_eq!(read_back.end_size(), 12);
        assert_eq!(read_back.delta_format(), 3);
        assert_eq!(read_back.delta_value().len(), 2);
    }

    #[test]
    fn variation_index_reads_back() {
        let table = DeviceOrVariationIndex::from(VariationIndex::new(3, 7));
        let bytes = crate::dump_table(&table).unwrap();
        let read_layout::DeviceOrVariationIndex::VariationIndex(read_back) =
            read_layout::DeviceOrVariationIndex::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("not a variation index");
        };
        assert_eq!(read_back.delta_set_outer_index(), 3);
        assert_eq!(read_back.delta_set_inner_index(), 7);
        assert_eq!(read_back.delta_format(), 0x8000);
    }

    #[test]
    fn class_def_get() {
        let class = [(4u16, 0u16), (5, 1), (6, 1), (9, 3)]
            .into_iter()
            .map(|(gid, cls)| (GlyphId16::new(gid), cls))
            .collect::<ClassDef>();
        assert!(class.get_raw(GlyphId16::new(4)).is_none());
        assert_eq!(class.get(GlyphId16::new(6)), 1);
        assert_eq!(class.get(GlyphId16::new(7)), 0);
        assert_eq!(class.get(GlyphId16::new(9)), 3);
        assert_eq!(class.class_count(), 4);
        assert_eq!(ClassDef::default().class_count(), 1);
    }

    #[test]
    fn coverage_reads_back() {
        let glyphs = [3u16, 1, 2, 10, 11, 40];
        let coverage = glyphs
            .iter()
            .copied()
            .map(GlyphId16::new)
            .collect::<CoverageTable>();
        assert_eq!(coverage.len(), 6);

        let bytes = crate::dump_table(&coverage).unwrap();
        let read_back = read_layout::CoverageTable::read(FontData::new(&bytes)).unwrap();
        let mut expected = glyphs.map(GlyphId16::new).to_vec();
        expected.sort();
        assert_eq!(read_back.iter().collect::<Vec<_>>(), expected);
        assert_eq!(read_back.get(GlyphId16::new(10)), Some(3));
    }

    #[test]
    fn lookup_with_mark_filtering_set() {
        struct Empty;
        impl LookupSubtable for Empty {
            const TYPE: u16 = 1;
        }
        impl FontWrite for Empty {
            fn write_into(&self, writer: &mut TableWriter) {
                0xdeadu16.write_into(writer);
            }
        }
        impl Validate for Empty {
            fn validate_impl(&self, _ctx: &mut ValidationCtx) {}
        }

        let lookup = Lookup::new(LookupFlag::empty().with_ignore_marks(true), vec![Empty])
            .with_mark_filtering_set(5);
        let bytes = crate::dump_table(&lookup).unwrap();
        let read_back = read_layout::Lookup::<()>::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.lookup_type(), 1);
        assert!(read_back.lookup_flag().ignore_marks());
        assert!(read_back.lookup_flag().use_mark_filtering_set());
        assert_eq!(read_back.sub_table_count(), 1);
        assert_eq!(read_back.mark_filtering_set(), Some(5));

        // the flag without the set is a validation error
        let mut bad = Lookup::new(LookupFlag::empty(), vec![Empty]);
        bad.lookup_flag = bad.lookup_flag.with_use_mark_filtering_set(true);
        assert!(crate::dump_table(&bad).is_err());
    }

    #[test]
    fn script_and_feature_lists_read_back() {
        let scripts = ScriptList::new(vec![ScriptRecord::new(
            Tag::new(b"latn"),
            Script::new(
                Some(LangSys::new(vec![0, 1])),
                vec![LangSysRecord::new(Tag::new(b"TRK "), LangSys::new(vec![1]))],
            ),
        )]);
        let bytes = crate::dump_table(&scripts).unwrap();
        let read_back = read_layout::ScriptList::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.script_count(), 1);
        let record = &read_back.script_records()[0];
        assert_eq!(record.script_tag(), Tag::new(b"latn"));
        let script = record.script(FontData::new(&bytes)).unwrap();
        let default = script.default_lang_sys().unwrap().unwrap();
        assert_eq!(default.required_feature_index(), 0xFFFF);
        assert_eq!(default.feature_index_count(), 2);
        assert_eq!(script.lang_sys_count(), 1);

        let features = FeatureList::new(vec![FeatureRecord::new(
            Tag::new(b"kern"),
            Feature::new(vec![0, 2]),
        )]);
        let bytes = crate::dump_table(&features).unwrap();
        let read_back = read_layout::FeatureList::read(FontData::new(&bytes)).unwrap();
        let record = &read_back.feature_records()[0];
        assert_eq!(record.feature_tag(), Tag::new(b"kern"));
        let feature = record.feature(FontData::new(&bytes)).unwrap();
        assert!(feature.feature_params_offset().offset().is_null());
        assert_eq!(feature.lookup_index_count(), 2);
    }
}
