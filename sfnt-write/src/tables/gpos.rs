//! the [GPOS] table
//!
//! Single and pair adjustment and mark-to-base attachment subtables are
//! modeled, along with the extension subtable that lets any of them be
//! addressed with a 32-bit offset.
//!
//! [GPOS]: https://docs.microsoft.com/en-us/typography/opentype/spec/gpos

use std::collections::BTreeSet;

use types::{GlyphId16, MajorMinor, Tag};

pub use read::tables::gpos::ValueFormat;

use crate::{
    font_builder::TopLevelTable,
    offsets::{NullableOffsetMarker, OffsetMarker, WIDTH_32},
    table_type::TableType,
    validate::{Validate, ValidationCtx},
    write::{FontWrite, TableWriter},
};

use super::layout::{
    lookup_type, ClassDef, CoverageTable, DeviceOrVariationIndex, FeatureList, Lookup,
    LookupList, LookupSubtable, ScriptList,
};

mod value_record;

pub use value_record::ValueRecord;

/// A GPOS lookup list table.
pub type PositionLookupList = LookupList<PositionLookup>;

impl FontWrite for ValueFormat {
    fn write_into(&self, writer: &mut TableWriter) {
        self.bits().write_into(writer)
    }
}

/// [GPOS Version 1.0](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#gpos-header)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gpos {
    pub script_list: OffsetMarker<ScriptList>,
    pub feature_list: OffsetMarker<FeatureList>,
    pub lookup_list: OffsetMarker<PositionLookupList>,
}

impl Gpos {
    pub fn new(
        script_list: ScriptList,
        feature_list: FeatureList,
        lookup_list: PositionLookupList,
    ) -> Self {
        Self {
            script_list: script_list.into(),
            feature_list: feature_list.into(),
            lookup_list: lookup_list.into(),
        }
    }
}

impl FontWrite for Gpos {
    fn write_into(&self, writer: &mut TableWriter) {
        MajorMinor::VERSION_1_0.write_into(writer);
        self.script_list.write_into(writer);
        self.feature_list.write_into(writer);
        self.lookup_list.write_into(writer);
    }

    fn table_type(&self) -> TableType {
        TableType::GPOS
    }
}

impl Validate for Gpos {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Gpos", |ctx| {
            ctx.in_field("script_list", |ctx| self.script_list.validate_impl(ctx));
            ctx.in_field("feature_list", |ctx| self.feature_list.validate_impl(ctx));
            ctx.in_field("lookup_list", |ctx| self.lookup_list.validate_impl(ctx));
        })
    }
}

impl TopLevelTable for Gpos {
    const TAG: Tag = read::tables::gpos::TAG;
}

/// A GPOS lookup, with the type of its subtables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PositionLookup {
    Single(Lookup<SinglePos>),
    Pair(Lookup<PairPos>),
    MarkToBase(Lookup<MarkBasePosFormat1>),
    Extension(Lookup<ExtensionSubtable>),
}

impl FontWrite for PositionLookup {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            PositionLookup::Single(lookup) => lookup.write_into(writer),
            PositionLookup::Pair(lookup) => lookup.write_into(writer),
            PositionLookup::MarkToBase(lookup) => lookup.write_into(writer),
            PositionLookup::Extension(lookup) => lookup.write_into(writer),
        }
    }

    fn table_type(&self) -> TableType {
        match self {
            PositionLookup::Single(lookup) => lookup.table_type(),
            PositionLookup::Pair(lookup) => lookup.table_type(),
            PositionLookup::MarkToBase(lookup) => lookup.table_type(),
            PositionLookup::Extension(lookup) => lookup.table_type(),
        }
    }
}

impl Validate for PositionLookup {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            PositionLookup::Single(lookup) => lookup.validate_impl(ctx),
            PositionLookup::Pair(lookup) => lookup.validate_impl(ctx),
            PositionLookup::MarkToBase(lookup) => lookup.validate_impl(ctx),
            PositionLookup::Extension(lookup) => lookup.validate_impl(ctx),
        }
    }
}

lookup_type!(SinglePos, 1);
lookup_type!(PairPos, 2);
lookup_type!(MarkBasePosFormat1, 4);
lookup_type!(ExtensionSubtable, read::tables::gpos::EXTENSION_LOOKUP_TYPE);

/// [Single Adjustment Positioning Subtable](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-1-single-adjustment-positioning-subtable)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinglePos {
    Format1(SinglePosFormat1),
    Format2(SinglePosFormat2),
}

impl SinglePos {
    /// One value record, applied to every covered glyph.
    pub fn format_1(coverage: CoverageTable, value_record: ValueRecord) -> Self {
        Self::Format1(SinglePosFormat1 {
            coverage: coverage.into(),
            value_record,
        })
    }

    /// A value record for each covered glyph, in coverage order.
    pub fn format_2(coverage: CoverageTable, value_records: Vec<ValueRecord>) -> Self {
        Self::Format2(SinglePosFormat2 {
            coverage: coverage.into(),
            value_records,
        })
    }
}

impl FontWrite for SinglePos {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            Self::Format1(table) => table.write_into(writer),
            Self::Format2(table) => table.write_into(writer),
        }
    }
}

impl Validate for SinglePos {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            Self::Format1(table) => table.validate_impl(ctx),
            Self::Format2(table) => table.validate_impl(ctx),
        }
    }
}

/// [Single Adjustment Positioning Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#single-adjustment-positioning-format-1-single-positioning-value)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SinglePosFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub value_record: ValueRecord,
}

impl FontWrite for SinglePosFormat1 {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        self.coverage.write_into(writer);
        self.value_record.format().write_into(writer);
        self.value_record.write_into(writer);
    }
}

impl Validate for SinglePosFormat1 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("SinglePosFormat1", |ctx| {
            ctx.in_field("coverage", |ctx| self.coverage.validate_impl(ctx));
            ctx.in_field("value_record", |ctx| self.value_record.validate_impl(ctx));
        })
    }
}

/// [Single Adjustment Positioning Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#single-adjustment-positioning-format-2-array-of-positioning-values)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SinglePosFormat2 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub value_records: Vec<ValueRecord>,
}

impl SinglePosFormat2 {
    fn compute_value_format(&self) -> ValueFormat {
        self.value_records
            .first()
            .map(ValueRecord::format)
            .unwrap_or(ValueFormat::empty())
    }
}

impl FontWrite for SinglePosFormat2 {
    fn write_into(&self, writer: &mut TableWriter) {
        2u16.write_into(writer);
        self.coverage.write_into(writer);
        self.compute_value_format().write_into(writer);
        (self.value_records.len() as u16).write_into(writer);
        self.value_records.write_into(writer);
    }
}

impl Validate for SinglePosFormat2 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("SinglePosFormat2", |ctx| {
            ctx.in_field("coverage", |ctx| self.coverage.validate_impl(ctx));
            ctx.in_field("value_records", |ctx| {
                if self.value_records.len() > u16::MAX as usize {
                    ctx.report("array exceeds max length");
                }
                if let Some(coverage) = self.coverage.get() {
                    if coverage.len() != self.value_records.len() {
                        ctx.report("must have one value record per covered glyph");
                    }
                }
                let format = self.compute_value_format();
                if self.value_records.iter().any(|rec| rec.format() != format) {
                    ctx.report("all value records must have the same format");
                }
                self.value_records.validate_impl(ctx);
            });
        })
    }
}

/// [Pair Adjustment Positioning Subtable](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-2-pair-adjustment-positioning-subtable)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PairPos {
    Format1(PairPosFormat1),
    Format2(PairPosFormat2),
}

impl Default for PairPos {
    fn default() -> Self {
        Self::Format1(Default::default())
    }
}

impl PairPos {
    /// Adjustments for individual glyph pairs, one pair set per covered glyph.
    pub fn format_1(coverage: CoverageTable, pair_sets: Vec<PairSet>) -> Self {
        Self::Format1(PairPosFormat1::new(coverage, pair_sets))
    }

    /// Adjustments for pairs of glyph classes.
    pub fn format_2(
        coverage: CoverageTable,
        class_def1: ClassDef,
        class_def2: ClassDef,
        class1_records: Vec<Class1Record>,
    ) -> Self {
        Self::Format2(PairPosFormat2 {
            coverage: coverage.into(),
            class_def1: class_def1.into(),
            class_def2: class_def2.into(),
            class1_records,
        })
    }
}

impl FontWrite for PairPos {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            Self::Format1(table) => table.write_into(writer),
            Self::Format2(table) => table.write_into(writer),
        }
    }
}

impl Validate for PairPos {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            Self::Format1(table) => table.validate_impl(ctx),
            Self::Format2(table) => table.validate_impl(ctx),
        }
    }
}

/// [Pair Adjustment Positioning Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#pair-adjustment-positioning-format-1-adjustments-for-glyph-pairs)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairPosFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    /// One pair set for each covered glyph, in coverage order.
    pub pair_sets: Vec<OffsetMarker<PairSet>>,
}

impl PairPosFormat1 {
    pub fn new(coverage: CoverageTable, pair_sets: Vec<PairSet>) -> Self {
        Self {
            coverage: coverage.into(),
            pair_sets: pair_sets.into_iter().map(Into::into).collect(),
        }
    }

    fn first_record(&self) -> Option<&PairValueRecord> {
        self.pair_sets
            .iter()
            .filter_map(OffsetMarker::get)
            .find_map(|set| set.pair_value_records.first())
    }

    fn compute_value_format1(&self) -> ValueFormat {
        self.first_record()
            .map(|rec| rec.value_record1.format())
            .unwrap_or(ValueFormat::empty())
    }

    fn compute_value_format2(&self) -> ValueFormat {
        self.first_record()
            .map(|rec| rec.value_record2.format())
            .unwrap_or(ValueFormat::empty())
    }

    fn check_format_consistency(&self, ctx: &mut ValidationCtx) {
        let vf1 = self.compute_value_format1();
        let vf2 = self.compute_value_format2();
        ctx.in_array(|ctx| {
            for set in self.pair_sets.iter().filter_map(OffsetMarker::get) {
                ctx.array_item(|ctx| {
                    ctx.in_field("pair_value_records", |ctx| {
                        if set.pair_value_records.iter().any(|rec| {
                            rec.value_record1.format() != vf1 || rec.value_record2.format() != vf2
                        }) {
                            ctx.report("all ValueRecords must have same format")
                        }
                    })
                })
            }
        })
    }
}

impl FontWrite for PairPosFormat1 {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        self.coverage.write_into(writer);
        self.compute_value_format1().write_into(writer);
        self.compute_value_format2().write_into(writer);
        (self.pair_sets.len() as u16).write_into(writer);
        self.pair_sets.write_into(writer);
    }
}

impl Validate for PairPosFormat1 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("PairPosFormat1", |ctx| {
            ctx.in_field("coverage", |ctx| self.coverage.validate_impl(ctx));
            ctx.in_field("pair_sets", |ctx| {
                if self.pair_sets.len() > u16::MAX as usize {
                    ctx.report("array exceeds max length");
                }
                if let Some(coverage) = self.coverage.get() {
                    if coverage.len() != self.pair_sets.len() {
                        ctx.report("must have one pair set per covered glyph");
                    }
                }
                self.check_format_consistency(ctx);
                self.pair_sets.validate_impl(ctx);
            });
        })
    }
}

/// Part of [PairPosFormat1]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairSet {
    /// Records ordered by the glyph id of the second glyph.
    pub pair_value_records: Vec<PairValueRecord>,
}

impl PairSet {
    pub fn new(pair_value_records: Vec<PairValueRecord>) -> Self {
        Self { pair_value_records }
    }
}

impl FontWrite for PairSet {
    fn write_into(&self, writer: &mut TableWriter) {
        (self.pair_value_records.len() as u16).write_into(writer);
        self.pair_value_records.write_into(writer);
    }
}

impl Validate for PairSet {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("PairSet", |ctx| {
            ctx.in_field("pair_value_records", |ctx| {
                if self.pair_value_records.len() > u16::MAX as usize {
                    ctx.report("array exceeds max length");
                }
                if !self
                    .pair_value_records
                    .windows(2)
                    .all(|pair| pair[0].second_glyph < pair[1].second_glyph)
                {
                    ctx.report("records must be sorted by second glyph");
                }
                ctx.in_array(|ctx| {
                    for rec in &self.pair_value_records {
                        ctx.array_item(|ctx| rec.validate_impl(ctx))
                    }
                })
            })
        })
    }
}

/// Part of [PairSet]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairValueRecord {
    /// Glyph ID of second glyph in the pair
    pub second_glyph: GlyphId16,
    /// Positioning data for the first glyph in the pair.
    pub value_record1: ValueRecord,
    /// Positioning data for the second glyph in the pair.
    pub value_record2: ValueRecord,
}

impl PairValueRecord {
    pub fn new(
        second_glyph: GlyphId16,
        value_record1: ValueRecord,
        value_record2: ValueRecord,
    ) -> Self {
        Self {
            second_glyph,
            value_record1,
            value_record2,
        }
    }
}

impl FontWrite for PairValueRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.second_glyph.write_into(writer);
        self.value_record1.write_into(writer);
        self.value_record2.write_into(writer);
    }
}

impl Validate for PairValueRecord {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_field("value_record1", |ctx| self.value_record1.validate_impl(ctx));
        ctx.in_field("value_record2", |ctx| self.value_record2.validate_impl(ctx));
    }
}

/// [Pair Adjustment Positioning Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#pair-adjustment-positioning-format-2-class-pair-adjustment)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairPosFormat2 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub class_def1: OffsetMarker<ClassDef>,
    pub class_def2: OffsetMarker<ClassDef>,
    /// One record per class in `class_def1`, each holding one record per
    /// class in `class_def2`.
    pub class1_records: Vec<Class1Record>,
}

impl PairPosFormat2 {
    fn first_record(&self) -> Option<&Class2Record> {
        self.class1_records
            .first()
            .and_then(|rec| rec.class2_records.first())
    }

    fn compute_value_format1(&self) -> ValueFormat {
        self.first_record()
            .map(|rec| rec.value_record1.format())
            .unwrap_or(ValueFormat::empty())
    }

    fn compute_value_format2(&self) -> ValueFormat {
        self.first_record()
            .map(|rec| rec.value_record2.format())
            .unwrap_or(ValueFormat::empty())
    }

    fn compute_class1_count(&self) -> u16 {
        self.class_def1.get().map(ClassDef::class_count).unwrap_or(1)
    }

    fn compute_class2_count(&self) -> u16 {
        self.class_def2.get().map(ClassDef::class_count).unwrap_or(1)
    }

    fn check_length_and_format_conformance(&self, ctx: &mut ValidationCtx) {
        let n_class_1s = self.compute_class1_count();
        let n_class_2s = self.compute_class2_count();
        let format_1 = self.compute_value_format1();
        let format_2 = self.compute_value_format2();
        if self.class1_records.len() != n_class_1s as usize {
            ctx.report("class1_records length must match number of class1 classes");
        }
        ctx.in_field("class1_records", |ctx| {
            ctx.in_array(|ctx| {
                for c1rec in &self.class1_records {
                    ctx.array_item(|ctx| {
                        if c1rec.class2_records.len() != n_class_2s as usize {
                            ctx.report("class2_records length must match number of class2 classes ");
                        }
                        if c1rec.class2_records.iter().any(|rec| {
                            rec.value_record1.format() != format_1
                                || rec.value_record2.format() != format_2
                        }) {
                            ctx.report("all value records should report the same format");
                        }
                        c1rec.validate_impl(ctx);
                    })
                }
            })
        });
    }
}

impl FontWrite for PairPosFormat2 {
    fn write_into(&self, writer: &mut TableWriter) {
        2u16.write_into(writer);
        self.coverage.write_into(writer);
        self.compute_value_format1().write_into(writer);
        self.compute_value_format2().write_into(writer);
        self.class_def1.write_into(writer);
        self.class_def2.write_into(writer);
        self.compute_class1_count().write_into(writer);
        self.compute_class2_count().write_into(writer);
        self.class1_records.write_into(writer);
    }
}

impl Validate for PairPosFormat2 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("PairPosFormat2", |ctx| {
            ctx.in_field("coverage", |ctx| self.coverage.validate_impl(ctx));
            ctx.in_field("class_def1", |ctx| self.class_def1.validate_impl(ctx));
            ctx.in_field("class_def2", |ctx| self.class_def2.validate_impl(ctx));
            self.check_length_and_format_conformance(ctx);
        })
    }
}

/// Part of [PairPosFormat2]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Class1Record {
    /// Array of Class2 records, ordered by classes in classDef2.
    pub class2_records: Vec<Class2Record>,
}

impl Class1Record {
    pub fn new(class2_records: Vec<Class2Record>) -> Self {
        Self { class2_records }
    }
}

impl FontWrite for Class1Record {
    fn write_into(&self, writer: &mut TableWriter) {
        self.class2_records.write_into(writer);
    }
}

impl Validate for Class1Record {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_field("class2_records", |ctx| {
            ctx.in_array(|ctx| {
                for rec in &self.class2_records {
                    ctx.array_item(|ctx| rec.validate_impl(ctx))
                }
            })
        })
    }
}

/// Part of [PairPosFormat2]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Class2Record {
    /// Positioning for first glyph; empty if valueFormat1 = 0.
    pub value_record1: ValueRecord,
    /// Positioning for second glyph; empty if valueFormat2 = 0.
    pub value_record2: ValueRecord,
}

impl Class2Record {
    pub fn new(value_record1: ValueRecord, value_record2: ValueRecord) -> Self {
        Self {
            value_record1,
            value_record2,
        }
    }
}

impl FontWrite for Class2Record {
    fn write_into(&self, writer: &mut TableWriter) {
        self.value_record1.write_into(writer);
        self.value_record2.write_into(writer);
    }
}

impl Validate for Class2Record {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_field("value_record1", |ctx| self.value_record1.validate_impl(ctx));
        ctx.in_field("value_record2", |ctx| self.value_record2.validate_impl(ctx));
    }
}

/// [Anchor Table](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-tables)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnchorTable {
    Format1(AnchorFormat1),
    Format2(AnchorFormat2),
    Format3(AnchorFormat3),
}

impl AnchorTable {
    /// A design-unit coordinate.
    pub fn format_1(x_coordinate: i16, y_coordinate: i16) -> Self {
        Self::Format1(AnchorFormat1 {
            x_coordinate,
            y_coordinate,
        })
    }

    /// A coordinate plus an outline contour point.
    pub fn format_2(x_coordinate: i16, y_coordinate: i16, anchor_point: u16) -> Self {
        Self::Format2(AnchorFormat2 {
            x_coordinate,
            y_coordinate,
            anchor_point,
        })
    }

    /// A coordinate with optional device or variation tables.
    pub fn format_3(
        x_coordinate: i16,
        y_coordinate: i16,
        x_device: Option<DeviceOrVariationIndex>,
        y_device: Option<DeviceOrVariationIndex>,
    ) -> Self {
        Self::Format3(AnchorFormat3 {
            x_coordinate,
            y_coordinate,
            x_device: x_device.into(),
            y_device: y_device.into(),
        })
    }
}

impl FontWrite for AnchorTable {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            Self::Format1(table) => table.write_into(writer),
            Self::Format2(table) => table.write_into(writer),
            Self::Format3(table) => table.write_into(writer),
        }
    }
}

impl Validate for AnchorTable {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if let Self::Format3(table) = self {
            ctx.in_table("AnchorFormat3", |ctx| {
                ctx.in_field("x_device", |ctx| table.x_device.validate_impl(ctx));
                ctx.in_field("y_device", |ctx| table.y_device.validate_impl(ctx));
            })
        }
    }
}

/// Part of [AnchorTable]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnchorFormat1 {
    pub x_coordinate: i16,
    pub y_coordinate: i16,
}

impl FontWrite for AnchorFormat1 {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        self.x_coordinate.write_into(writer);
        self.y_coordinate.write_into(writer);
    }
}

/// Part of [AnchorTable]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnchorFormat2 {
    pub x_coordinate: i16,
    pub y_coordinate: i16,
    /// Index to glyph contour point.
    pub anchor_point: u16,
}

impl FontWrite for AnchorFormat2 {
    fn write_into(&self, writer: &mut TableWriter) {
        2u16.write_into(writer);
        self.x_coordinate.write_into(writer);
        self.y_coordinate.write_into(writer);
        self.anchor_point.write_into(writer);
    }
}

/// Part of [AnchorTable]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnchorFormat3 {
    pub x_coordinate: i16,
    pub y_coordinate: i16,
    pub x_device: NullableOffsetMarker<DeviceOrVariationIndex>,
    pub y_device: NullableOffsetMarker<DeviceOrVariationIndex>,
}

impl FontWrite for AnchorFormat3 {
    fn write_into(&self, writer: &mut TableWriter) {
        3u16.write_into(writer);
        self.x_coordinate.write_into(writer);
        self.y_coordinate.write_into(writer);
        self.x_device.write_into(writer);
        self.y_device.write_into(writer);
    }
}

/// [Mark Array Table](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos_delta_tables#mark-array-table)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkArray {
    /// One record per covered mark glyph, in coverage order.
    pub mark_records: Vec<MarkRecord>,
}

impl MarkArray {
    pub fn new(mark_records: Vec<MarkRecord>) -> Self {
        Self { mark_records }
    }

    /// The number of distinct mark classes used by the records.
    pub fn class_count(&self) -> u16 {
        self.mark_records
            .iter()
            .map(|rec| rec.mark_class)
            .collect::<BTreeSet<_>>()
            .len() as u16
    }
}

impl FontWrite for MarkArray {
    fn write_into(&self, writer: &mut TableWriter) {
        (self.mark_records.len() as u16).write_into(writer);
        self.mark_records.write_into(writer);
    }
}

impl Validate for MarkArray {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("MarkArray", |ctx| {
            ctx.in_field("mark_records", |ctx| {
                if self.mark_records.len() > u16::MAX as usize {
                    ctx.report("array exceeds max length");
                }
                ctx.in_array(|ctx| {
                    for rec in &self.mark_records {
                        ctx.array_item(|ctx| {
                            ctx.in_field("mark_anchor", |ctx| rec.mark_anchor.validate_impl(ctx))
                        })
                    }
                })
            })
        })
    }
}

/// Part of [MarkArray]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkRecord {
    pub mark_class: u16,
    pub mark_anchor: OffsetMarker<AnchorTable>,
}

impl MarkRecord {
    pub fn new(mark_class: u16, mark_anchor: AnchorTable) -> Self {
        Self {
            mark_class,
            mark_anchor: mark_anchor.into(),
        }
    }
}

impl FontWrite for MarkRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.mark_class.write_into(writer);
        self.mark_anchor.write_into(writer);
    }
}

/// [Mark-to-Base Attachment Positioning Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#mark-to-base-attachment-positioning-format-1-mark-to-base-attachment-point)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkBasePosFormat1 {
    pub mark_coverage: OffsetMarker<CoverageTable>,
    pub base_coverage: OffsetMarker<CoverageTable>,
    pub mark_array: OffsetMarker<MarkArray>,
    pub base_array: OffsetMarker<BaseArray>,
}

impl MarkBasePosFormat1 {
    pub fn new(
        mark_coverage: CoverageTable,
        base_coverage: CoverageTable,
        mark_array: MarkArray,
        base_array: BaseArray,
    ) -> Self {
        Self {
            mark_coverage: mark_coverage.into(),
            base_coverage: base_coverage.into(),
            mark_array: mark_array.into(),
            base_array: base_array.into(),
        }
    }

    fn compute_mark_class_count(&self) -> u16 {
        self.mark_array
            .get()
            .map(MarkArray::class_count)
            .unwrap_or_default()
    }

    fn check_classes(&self, ctx: &mut ValidationCtx) {
        let class_count = self.compute_mark_class_count();
        if let Some(marks) = self.mark_array.get() {
            if let Some(coverage) = self.mark_coverage.get() {
                if coverage.len() != marks.mark_records.len() {
                    ctx.report("must have one mark record per covered mark");
                }
            }
            if marks
                .mark_records
                .iter()
                .any(|rec| rec.mark_class >= class_count)
            {
                ctx.report("mark classes must be contiguous from zero");
            }
        }
        if let Some(bases) = self.base_array.get() {
            if let Some(coverage) = self.base_coverage.get() {
                if coverage.len() != bases.base_records.len() {
                    ctx.report("must have one base record per covered base");
                }
            }
            if bases
                .base_records
                .iter()
                .any(|rec| rec.base_anchors.len() != class_count as usize)
            {
                ctx.report("each base record needs one anchor per mark class");
            }
        }
    }
}

impl FontWrite for MarkBasePosFormat1 {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        self.mark_coverage.write_into(writer);
        self.base_coverage.write_into(writer);
        self.compute_mark_class_count().write_into(writer);
        self.mark_array.write_into(writer);
        self.base_array.write_into(writer);
    }
}

impl Validate for MarkBasePosFormat1 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("MarkBasePosFormat1", |ctx| {
            ctx.in_field("mark_coverage", |ctx| self.mark_coverage.validate_impl(ctx));
            ctx.in_field("base_coverage", |ctx| self.base_coverage.validate_impl(ctx));
            ctx.in_field("mark_array", |ctx| self.mark_array.validate_impl(ctx));
            ctx.in_field("base_array", |ctx| self.base_array.validate_impl(ctx));
            self.check_classes(ctx);
        })
    }
}

/// Part of [MarkBasePosFormat1]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BaseArray {
    /// One record per covered base glyph, in coverage order.
    pub base_records: Vec<BaseRecord>,
}

impl BaseArray {
    pub fn new(base_records: Vec<BaseRecord>) -> Self {
        Self { base_records }
    }
}

impl FontWrite for BaseArray {
    fn write_into(&self, writer: &mut TableWriter) {
        (self.base_records.len() as u16).write_into(writer);
        self.base_records.write_into(writer);
    }
}

impl Validate for BaseArray {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("BaseArray", |ctx| {
            ctx.in_field("base_records", |ctx| {
                if self.base_records.len() > u16::MAX as usize {
                    ctx.report("array exceeds max length");
                }
                ctx.in_array(|ctx| {
                    for rec in &self.base_records {
                        ctx.array_item(|ctx| {
                            ctx.in_field("base_anchors", |ctx| rec.base_anchors.validate_impl(ctx))
                        })
                    }
                })
            })
        })
    }
}

/// Part of [BaseArray]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BaseRecord {
    /// One anchor per mark class; `None` where a class never attaches.
    pub base_anchors: Vec<NullableOffsetMarker<AnchorTable>>,
}

impl BaseRecord {
    pub fn new(base_anchors: Vec<Option<AnchorTable>>) -> Self {
        Self {
            base_anchors: base_anchors.into_iter().map(Into::into).collect(),
        }
    }
}

impl FontWrite for BaseRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.base_anchors.write_into(writer);
    }
}

/// [Extension Positioning Subtable Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#extension-positioning-subtable-format-1)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionPosFormat1<T> {
    pub extension: OffsetMarker<T, WIDTH_32>,
}

impl<T> ExtensionPosFormat1<T> {
    pub fn new(extension: T) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl<T: LookupSubtable + FontWrite> FontWrite for ExtensionPosFormat1<T> {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        T::TYPE.write_into(writer);
        self.extension.write_into(writer);
    }
}

impl<T: Validate> Validate for ExtensionPosFormat1<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ExtensionPosFormat1", |ctx| {
            ctx.in_field("extension", |ctx| self.extension.validate_impl(ctx));
        })
    }
}

/// A subtable of an extension lookup, wrapping a subtable of another type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtensionSubtable {
    Single(ExtensionPosFormat1<SinglePos>),
    Pair(ExtensionPosFormat1<PairPos>),
    MarkToBase(ExtensionPosFormat1<MarkBasePosFormat1>),
}

impl FontWrite for ExtensionSubtable {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            Self::Single(table) => table.write_into(writer),
            Self::Pair(table) => table.write_into(writer),
            Self::MarkToBase(table) => table.write_into(writer),
        }
    }
}

impl Validate for ExtensionSubtable {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            Self::Single(table) => table.validate_impl(ctx),
            Self::Pair(table) => table.validate_impl(ctx),
            Self::MarkToBase(table) => table.validate_impl(ctx),
        }
    }
}

impl From<PairPos> for ExtensionSubtable {
    fn from(src: PairPos) -> Self {
        Self::Pair(ExtensionPosFormat1::new(src))
    }
}

impl From<MarkBasePosFormat1> for ExtensionSubtable {
    fn from(src: MarkBasePosFormat1) -> Self {
        Self::MarkToBase(ExtensionPosFormat1::new(src))
    }
}

impl From<SinglePos> for ExtensionSubtable {
    fn from(src: SinglePos) -> Self {
        Self::Single(ExtensionPosFormat1::new(src))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::{
        tables::{gpos as read_gpos, layout::LookupFlag},
        FontData, FontRead,
    };

    use crate::tables::layout::{ClassDef, VariationIndex};

    use super::*;

    // adapted from/motivated by https://github.com/fonttools/fonttools/issues/471
    #[test]
    fn gpos_1_zero() {
        let cov_one = CoverageTable::format_1(vec![GlyphId16::new(2)]);
        let cov_two = CoverageTable::format_1(vec![GlyphId16::new(4)]);
        let sub1 = SinglePos::format_1(cov_one, ValueRecord::default());
        let sub2 = SinglePos::format_1(cov_two, ValueRecord::default().with_x_advance(500));
        let lookup = Lookup::new(LookupFlag::default(), vec![sub1, sub2]);
        let bytes = crate::dump_table(&lookup).unwrap();

        let parsed = read_gpos::PositionLookup::read(FontData::new(&bytes)).unwrap();
        let read_gpos::PositionLookup::Single(table) = parsed else {
            panic!("something has gone seriously wrong");
        };

        assert_eq!(table.lookup_flag(), LookupFlag::empty());
        assert_eq!(table.sub_table_count(), 2);
        let mut subtables = table.subtables();
        let read_gpos::SinglePos::Format1(sub1) = subtables.next().unwrap().unwrap() else {
            panic!("wrong table type");
        };
        let read_gpos::SinglePos::Format1(sub2) = subtables.next().unwrap().unwrap() else {
            panic!("wrong table type");
        };

        assert_eq!(sub1.value_format(), ValueFormat::empty());
        assert_eq!(sub1.value_record(), read_gpos::ValueRecord::default());

        assert_eq!(sub2.value_format(), ValueFormat::X_ADVANCE);
        assert_eq!(
            sub2.value_record(),
            read_gpos::ValueRecord {
                x_advance: Some(500),
                ..Default::default()
            }
        );
    }

    // shared between a pair of tests below
    fn make_rec(i: u16) -> ValueRecord {
        // '0' here is shorthand for 'no device table'
        if i == 0 {
            return ValueRecord::new().with_explicit_value_format(ValueFormat::X_ADVANCE_DEVICE);
        }
        ValueRecord::new().with_x_advance_device(VariationIndex::new(0xff, i))
    }

    #[test]
    fn compile_devices_pairpos2() {
        let class1 = ClassDef::from_iter([(GlyphId16::new(5), 0), (GlyphId16::new(6), 1)]);
        // class 0 is 'all the rest', here, always implicitly present
        let class2 = ClassDef::from_iter([(GlyphId16::new(8), 1)]);

        // two c1recs, each with two c2recs
        let class1recs = vec![
            Class1Record::new(vec![
                Class2Record::new(make_rec(0), make_rec(0)),
                Class2Record::new(make_rec(1), make_rec(2)),
            ]),
            Class1Record::new(vec![
                Class2Record::new(make_rec(0), make_rec(0)),
                Class2Record::new(make_rec(2), make_rec(3)),
            ]),
        ];
        let coverage = [5, 6].into_iter().map(GlyphId16::new).collect();
        let a_table = PairPos::format_2(coverage, class1, class2, class1recs);

        let bytes = crate::dump_table(&a_table).unwrap();
        let data = FontData::new(&bytes);
        let read_back = read_gpos::PairPosFormat2::read(data).unwrap();
        assert_eq!(read_back.class1_count(), 2);
        assert_eq!(read_back.class2_count(), 2);
        let records = read_back
            .class1_records()
            .iter()
            .map(|rec| rec.unwrap())
            .collect::<Vec<_>>();

        let first = records[0].class2_records().get(0).unwrap();
        assert!(first.value_record1.x_advance_device(data).is_none());
        let last = records[1].class2_records().get(1).unwrap();
        assert!(last.value_record1.x_advance_device(data).is_some());

        let second = records[0].class2_records().get(1).unwrap();
        let read::tables::layout::DeviceOrVariationIndex::VariationIndex(dev2) = second
            .value_record2
            .x_advance_device(data)
            .unwrap()
            .unwrap()
        else {
            panic!("not a variation index")
        };
        assert_eq!(dev2.delta_set_inner_index(), 2);
    }

    #[should_panic(expected = "all value records should report the same format")]
    #[test]
    fn validate_bad_pairpos2() {
        let class1 = ClassDef::from_iter([(GlyphId16::new(5), 0), (GlyphId16::new(6), 1)]);
        // class 0 is 'all the rest', here, always implicitly present
        let class2 = ClassDef::from_iter([(GlyphId16::new(8), 1)]);
        let coverage = [5, 6].into_iter().map(GlyphId16::new).collect();

        // two c1recs, each with two c2recs
        let class1recs = vec![
            Class1Record::new(vec![
                Class2Record::new(make_rec(0), make_rec(0)),
                Class2Record::new(make_rec(1), make_rec(2)),
            ]),
            Class1Record::new(vec![
                Class2Record::new(make_rec(0), make_rec(0)),
                // this is now the wrong type
                Class2Record::new(make_rec(2), make_rec(3).with_x_advance(0x514)),
            ]),
        ];
        let ppf2 = PairPos::format_2(coverage, class1, class2, class1recs);
        crate::dump_table(&ppf2).unwrap();
    }

    #[test]
    fn validate_pairpos1() {
        let coverage: CoverageTable = [1, 2].into_iter().map(GlyphId16::new).collect();
        let good_table = PairPosFormat1::new(
            coverage.clone(),
            vec![
                PairSet::new(vec![PairValueRecord::new(
                    GlyphId16::new(5),
                    ValueRecord::new().with_x_advance(5),
                    ValueRecord::new(),
                )]),
                PairSet::new(vec![PairValueRecord::new(
                    GlyphId16::new(1),
                    ValueRecord::new().with_x_advance(42),
                    ValueRecord::new(),
                )]),
            ],
        );

        let bad_table = PairPosFormat1::new(
            coverage,
            vec![
                PairSet::new(vec![PairValueRecord::new(
                    GlyphId16::new(5),
                    ValueRecord::new().with_x_advance(5),
                    ValueRecord::new(),
                )]),
                PairSet::new(vec![PairValueRecord::new(
                    GlyphId16::new(1),
                    //this is a different format, which is not okay
                    ValueRecord::new().with_x_placement(42),
                    ValueRecord::new(),
                )]),
            ],
        );

        assert!(crate::dump_table(&good_table).is_ok());
        assert!(matches!(
            crate::dump_table(&bad_table),
            Err(crate::error::Error::ValidationFailed(_))
        ));
    }

    #[test]
    fn pair_sets_must_match_coverage() {
        let coverage: CoverageTable = [1, 2, 3].into_iter().map(GlyphId16::new).collect();
        let table = PairPosFormat1::new(coverage, vec![PairSet::default()]);
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("one pair set per covered glyph"), "{err}");
    }

    fn mark_base_pos(mark_classes: [u16; 2]) -> MarkBasePosFormat1 {
        MarkBasePosFormat1::new(
            [0x333, 0x334].into_iter().map(GlyphId16::new).collect(),
            [0xc6].into_iter().map(GlyphId16::new).collect(),
            MarkArray::new(vec![
                MarkRecord::new(mark_classes[0], AnchorTable::format_1(346, -22)),
                MarkRecord::new(mark_classes[1], AnchorTable::format_1(346, 1364)),
            ]),
            BaseArray::new(vec![BaseRecord::new(vec![
                Some(AnchorTable::format_3(
                    400,
                    1500,
                    Some(VariationIndex::new(2, 5).into()),
                    None,
                )),
                None,
            ])]),
        )
    }

    #[test]
    fn write_mark_base_pos() {
        let table = mark_base_pos([0, 1]);
        let bytes = crate::dump_table(&table).unwrap();
        let read_back = read_gpos::MarkBasePosFormat1::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.mark_class_count(), 2);
        assert_eq!(
            read_back.mark_coverage().unwrap().iter().collect::<Vec<_>>(),
            [GlyphId16::new(0x333), GlyphId16::new(0x334)]
        );

        let marks = read_back.mark_array().unwrap();
        let anchors = marks
            .mark_records()
            .iter()
            .map(|rec| {
                let anchor = rec.mark_anchor(marks.offset_data()).unwrap();
                (rec.mark_class(), anchor.coordinates())
            })
            .collect::<Vec<_>>();
        assert_eq!(anchors, [(0, (346, -22)), (1, (346, 1364))]);

        let bases = read_back.base_array().unwrap();
        assert_eq!(bases.base_count(), 1);
        let record = bases.base_records().get(0).unwrap();
        assert!(record.base_anchor(bases.offset_data(), 1).is_none());
        let read_gpos::AnchorTable::Format3(anchor) =
            record.base_anchor(bases.offset_data(), 0).unwrap().unwrap()
        else {
            panic!("wrong anchor format");
        };
        assert_eq!((anchor.x_coordinate(), anchor.y_coordinate()), (400, 1500));
        assert!(anchor.y_device().is_none());
        let read::tables::layout::DeviceOrVariationIndex::VariationIndex(device) =
            anchor.x_device().unwrap().unwrap()
        else {
            panic!("not a variation index");
        };
        assert_eq!(device.delta_set_inner_index(), 5);
    }

    #[test]
    fn mark_classes_must_be_contiguous() {
        let err = mark_base_pos([0, 2]).validate().unwrap_err();
        assert!(err.to_string().contains("contiguous from zero"), "{err}");
    }

    #[test]
    fn base_records_need_an_anchor_per_class() {
        let mut table = mark_base_pos([0, 1]);
        table.base_array = BaseArray::new(vec![BaseRecord::new(vec![None])]).into();
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("one anchor per mark class"), "{err}");
    }

    #[test]
    fn mark_base_in_extension() {
        let lookup = PositionLookup::Extension(Lookup::new(
            LookupFlag::empty(),
            vec![mark_base_pos([0, 1]).into()],
        ));
        let bytes = crate::dump_table(&lookup).unwrap();
        let read_gpos::PositionLookup::Extension(lookup) =
            read_gpos::PositionLookup::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("not an extension");
        };
        let ext = lookup.subtables().next().unwrap().unwrap();
        assert_eq!(ext.extension_lookup_type(), 4);
        let table = ext.extension::<read_gpos::MarkBasePosFormat1>().unwrap();
        assert_eq!(table.mark_array().unwrap().mark_count(), 2);
    }

    #[test]
    fn write_full_gpos() {
        use crate::tables::layout::{Feature, FeatureRecord, LangSys, Script, ScriptRecord};

        let _ = env_logger::builder().is_test(true).try_init();
        let pair_pos = PairPos::format_1(
            [3].into_iter().map(GlyphId16::new).collect(),
            vec![PairSet::new(vec![
                PairValueRecord::new(
                    GlyphId16::new(7),
                    ValueRecord::new().with_x_advance(-20),
                    ValueRecord::new(),
                ),
                PairValueRecord::new(
                    GlyphId16::new(9),
                    ValueRecord::new().with_x_advance(15),
                    ValueRecord::new(),
                ),
            ])],
        );
        let gpos = Gpos::new(
            ScriptList::new(vec![ScriptRecord::new(
                Tag::new(b"DFLT"),
                Script::new(Some(LangSys::new(vec![0])), vec![]),
            )]),
            FeatureList::new(vec![FeatureRecord::new(
                Tag::new(b"kern"),
                Feature::new(vec![0, 1]),
            )]),
            PositionLookupList::new(vec![
                PositionLookup::Pair(Lookup::new(LookupFlag::empty(), vec![pair_pos.clone()])),
                PositionLookup::Extension(Lookup::new(
                    LookupFlag::empty(),
                    vec![pair_pos.into()],
                )),
            ]),
        );

        let bytes = crate::dump_table(&gpos).unwrap();
        let read_back = read_gpos::Gpos::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.version(), MajorMinor::VERSION_1_0);
        assert_eq!(read_back.script_list().unwrap().script_count(), 1);
        assert_eq!(read_back.feature_list().unwrap().feature_count(), 1);
        let lookups = read_back.lookup_list().unwrap();
        assert_eq!(lookups.lookup_count(), 2);

        for lookup in lookups.lookups() {
            let pair_pos = match lookup.unwrap() {
                read_gpos::PositionLookup::Pair(lookup) => {
                    lookup.subtables().next().unwrap().unwrap()
                }
                read_gpos::PositionLookup::Extension(lookup) => {
                    let ext = lookup.subtables().next().unwrap().unwrap();
                    assert_eq!(ext.extension_lookup_type(), 2);
                    ext.extension::<read_gpos::PairPos>().unwrap()
                }
                other => panic!("unexpected lookup {other:?}"),
            };
            let read_gpos::PairPos::Format1(pair_pos) = pair_pos else {
                panic!("wrong format");
            };
            assert_eq!(pair_pos.value_format1(), ValueFormat::X_ADVANCE);
            let set = pair_pos.pair_sets().next().unwrap().unwrap();
            let records = set
                .pair_value_records()
                .iter()
                .map(|rec| rec.unwrap())
                .collect::<Vec<_>>();
            assert_eq!(records[0].second_glyph, GlyphId16::new(7));
            assert_eq!(records[0].value_record1.x_advance, Some(-20));
            assert_eq!(records[1].value_record1.x_advance, Some(15));
        }
    }
}
