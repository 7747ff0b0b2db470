//! the [GPOS] table
//!
//! Only the lookup kinds that carry the bulk of a real font's positioning
//! data are modeled: single and pair adjustment, mark-to-base attachment,
//! and the extension wrapper. Other lookup types are recognized, and their
//! subtables are treated as opaque.
//!
//! [GPOS]: https://docs.microsoft.com/en-us/typography/opentype/spec/gpos

#[path = "./value_record.rs"]
mod value_record;

use crate::table_prelude::*;

/// reexport stuff from layout that we use
pub use super::layout::{
    ClassDef, CoverageTable, Device, DeviceOrVariationIndex, FeatureList, Lookup, LookupFlag,
    LookupList, ScriptList,
};
pub use value_record::{ValueFormat, ValueRecord};

/// 'GPOS'
pub const TAG: Tag = Tag::new(b"GPOS");

/// The lookup type of an extension lookup.
pub const EXTENSION_LOOKUP_TYPE: u16 = 9;

/// [GPOS Header](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#gpos-header)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct GposMarker {
    feature_variations_offset_byte_start: Option<usize>,
}

impl GposMarker {
    fn version_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + MajorMinor::RAW_BYTE_LEN
    }

    fn script_list_offset_byte_range(&self) -> Range<usize> {
        let start = self.version_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn feature_list_offset_byte_range(&self) -> Range<usize> {
        let start = self.script_list_offset_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn lookup_list_offset_byte_range(&self) -> Range<usize> {
        let start = self.feature_list_offset_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn feature_variations_offset_byte_range(&self) -> Option<Range<usize>> {
        let start = self.feature_variations_offset_byte_start?;
        Some(start..start + Offset32::RAW_BYTE_LEN)
    }
}

impl<'a> FontRead<'a> for Gpos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version: MajorMinor = cursor.read()?;
        if version.major != 1 {
            return Err(ReadError::InvalidFormat(version.major.into()));
        }
        cursor.advance::<Offset16>();
        cursor.advance::<Offset16>();
        cursor.advance::<Offset16>();
        let feature_variations_offset_byte_start = version
            .compatible(MajorMinor::VERSION_1_1)
            .then(|| cursor.position())
            .transpose()?;
        if feature_variations_offset_byte_start.is_some() {
            cursor.advance::<Offset32>();
        }
        cursor.finish(GposMarker {
            feature_variations_offset_byte_start,
        })
    }
}

/// [GPOS (Glyph Positioning)](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos) table
pub type Gpos<'a> = TableRef<'a, GposMarker>;

impl<'a> Gpos<'a> {
    /// The major and minor version of the GPOS table, as a tuple of u16 values.
    pub fn version(&self) -> MajorMinor {
        let range = self.shape.version_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Offset to ScriptList table, from beginning of GPOS table
    pub fn script_list_offset(&self) -> Offset16 {
        let range = self.shape.script_list_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn script_list(&self) -> Result<ScriptList<'a>, ReadError> {
        self.script_list_offset().resolve(self.data)
    }

    /// Offset to FeatureList table, from beginning of GPOS table
    pub fn feature_list_offset(&self) -> Offset16 {
        let range = self.shape.feature_list_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn feature_list(&self) -> Result<FeatureList<'a>, ReadError> {
        self.feature_list_offset().resolve(self.data)
    }

    /// Offset to LookupList table, from beginning of GPOS table
    pub fn lookup_list_offset(&self) -> Offset16 {
        let range = self.shape.lookup_list_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn lookup_list(&self) -> Result<PositionLookupList<'a>, ReadError> {
        self.lookup_list_offset().resolve(self.data)
    }

    /// Offset to the FeatureVariations table, present in version 1.1.
    ///
    /// The table itself is not parsed here.
    pub fn feature_variations_offset(&self) -> Option<Nullable<Offset32>> {
        let range = self.shape.feature_variations_offset_byte_range()?;
        Some(self.data.read_at(range.start).unwrap_or_default())
    }
}

/// A typed GPOS [LookupList](super::layout::LookupList) table
pub type PositionLookupList<'a> = LookupList<'a, PositionLookup<'a>>;

/// A GPOS lookup, typed by its `lookupType`.
#[derive(Clone)]
pub enum PositionLookup<'a> {
    Single(Lookup<'a, SinglePos<'a>>),
    Pair(Lookup<'a, PairPos<'a>>),
    MarkToBase(Lookup<'a, MarkBasePosFormat1<'a>>),
    Extension(Lookup<'a, ExtensionPosFormat1<'a>>),
    /// A lookup of a kind whose subtables are not modeled here.
    Other(Lookup<'a, ()>),
}

impl<'a> FormatRecord<'a> for PositionLookup<'a> {
    fn select(data: FontData<'a>, selector: u16) -> Option<Result<Self, ReadError>> {
        match selector {
            1 => Some(Lookup::read(data).map(Self::Single)),
            2 => Some(Lookup::read(data).map(Self::Pair)),
            3 | 5..=8 => Some(Lookup::read(data).map(Self::Other)),
            4 => Some(Lookup::read(data).map(Self::MarkToBase)),
            EXTENSION_LOOKUP_TYPE => Some(Lookup::read(data).map(Self::Extension)),
            _ => None,
        }
    }
}

format_record_font_read!(PositionLookup);

impl<'a> PositionLookup<'a> {
    /// The lookup with its subtable type erased.
    pub fn of_unit_type(&self) -> Lookup<'a, ()> {
        match self {
            PositionLookup::Single(lookup) => lookup.of_unit_type(),
            PositionLookup::Pair(lookup) => lookup.of_unit_type(),
            PositionLookup::MarkToBase(lookup) => lookup.of_unit_type(),
            PositionLookup::Extension(lookup) => lookup.of_unit_type(),
            PositionLookup::Other(lookup) => lookup.clone(),
        }
    }

    /// Different enumerations for GSUB and GPOS
    pub fn lookup_type(&self) -> u16 {
        self.of_unit_type().lookup_type()
    }

    pub fn lookup_flag(&self) -> LookupFlag {
        self.of_unit_type().lookup_flag()
    }

    pub fn mark_filtering_set(&self) -> Option<u16> {
        self.of_unit_type().mark_filtering_set()
    }
}

impl std::fmt::Debug for PositionLookup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lookup = self.of_unit_type();
        f.debug_struct("PositionLookup")
            .field("lookup_type", &lookup.lookup_type())
            .field("sub_table_count", &lookup.sub_table_count())
            .finish()
    }
}

impl Format<u16> for SinglePosFormat1Marker {
    const FORMAT: u16 = 1;
}

/// [Single Adjustment Positioning Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#single-adjustment-positioning-format-1-single-positioning-value)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct SinglePosFormat1Marker {
    value_record_byte_len: usize,
}

impl SinglePosFormat1Marker {
    fn pos_format_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn coverage_offset_byte_range(&self) -> Range<usize> {
        let start = self.pos_format_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn value_format_byte_range(&self) -> Range<usize> {
        let start = self.coverage_offset_byte_range().end;
        start..start + ValueFormat::RAW_BYTE_LEN
    }

    fn value_record_byte_range(&self) -> Range<usize> {
        let start = self.value_format_byte_range().end;
        start..start + self.value_record_byte_len
    }
}

impl<'a> FontRead<'a> for SinglePosFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<Offset16>();
        let value_format: ValueFormat = cursor.read()?;
        let value_record_byte_len = ValueRecord::compute_size(&value_format);
        cursor.advance_by(value_record_byte_len);
        cursor.finish(SinglePosFormat1Marker {
            value_record_byte_len,
        })
    }
}

pub type SinglePosFormat1<'a> = TableRef<'a, SinglePosFormat1Marker>;

impl<'a> SinglePosFormat1<'a> {
    pub fn pos_format(&self) -> u16 {
        let range = self.shape.pos_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Offset to Coverage table, from beginning of SinglePos subtable.
    pub fn coverage_offset(&self) -> Offset16 {
        let range = self.shape.coverage_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset().resolve(self.data)
    }

    pub fn value_format(&self) -> ValueFormat {
        let range = self.shape.value_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Positioning value (may be empty, if the format is empty)
    pub fn value_record(&self) -> ValueRecord {
        let range = self.shape.value_record_byte_range();
        self.data
            .read_with_args(range, &self.value_format())
            .unwrap_or_default()
    }
}

impl Format<u16> for SinglePosFormat2Marker {
    const FORMAT: u16 = 2;
}

/// [Single Adjustment Positioning Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#single-adjustment-positioning-format-2-array-of-positioning-values)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct SinglePosFormat2Marker {
    value_records_byte_len: usize,
}

impl SinglePosFormat2Marker {
    fn pos_format_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn coverage_offset_byte_range(&self) -> Range<usize> {
        let start = self.pos_format_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn value_format_byte_range(&self) -> Range<usize> {
        let start = self.coverage_offset_byte_range().end;
        start..start + ValueFormat::RAW_BYTE_LEN
    }

    fn value_count_byte_range(&self) -> Range<usize> {
        let start = self.value_format_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn value_records_byte_range(&self) -> Range<usize> {
        let start = self.value_count_byte_range().end;
        start..start + self.value_records_byte_len
    }
}

impl<'a> FontRead<'a> for SinglePosFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<Offset16>();
        let value_format: ValueFormat = cursor.read()?;
        let value_count: u16 = cursor.read()?;
        let value_records_byte_len = (value_count as usize)
            .checked_mul(ValueRecord::compute_size(&value_format))
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(value_records_byte_len);
        cursor.finish(SinglePosFormat2Marker {
            value_records_byte_len,
        })
    }
}

pub type SinglePosFormat2<'a> = TableRef<'a, SinglePosFormat2Marker>;

impl<'a> SinglePosFormat2<'a> {
    pub fn pos_format(&self) -> u16 {
        let range = self.shape.pos_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Offset to Coverage table, from beginning of SinglePos subtable.
    pub fn coverage_offset(&self) -> Offset16 {
        let range = self.shape.coverage_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset().resolve(self.data)
    }

    pub fn value_format(&self) -> ValueFormat {
        let range = self.shape.value_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Number of ValueRecords, must equal glyphCount in the Coverage table.
    pub fn value_count(&self) -> u16 {
        let range = self.shape.value_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of ValueRecords, positioning values applied to glyphs.
    pub fn value_records(&self) -> ComputedArray<'a, ValueRecord> {
        let range = self.shape.value_records_byte_range();
        ComputedArray::new(
            self.data.slice(range).unwrap_or_default(),
            self.value_format(),
        )
    }
}

/// [Single Adjustment Positioning Subtable](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-1-single-adjustment-positioning-subtable)
#[derive(Clone)]
pub enum SinglePos<'a> {
    Format1(SinglePosFormat1<'a>),
    Format2(SinglePosFormat2<'a>),
}

impl<'a> FormatRecord<'a> for SinglePos<'a> {
    fn select(data: FontData<'a>, selector: u16) -> Option<Result<Self, ReadError>> {
        match selector {
            SinglePosFormat1Marker::FORMAT => Some(FontRead::read(data).map(Self::Format1)),
            SinglePosFormat2Marker::FORMAT => Some(FontRead::read(data).map(Self::Format2)),
            _ => None,
        }
    }
}

format_record_font_read!(SinglePos);

impl<'a> SinglePos<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        match self {
            Self::Format1(table) => table.coverage(),
            Self::Format2(table) => table.coverage(),
        }
    }

    pub fn value_format(&self) -> ValueFormat {
        match self {
            Self::Format1(table) => table.value_format(),
            Self::Format2(table) => table.value_format(),
        }
    }
}

impl std::fmt::Debug for SinglePos<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format1(table) => table.fmt(f),
            Self::Format2(table) => table.fmt(f),
        }
    }
}

impl Format<u16> for PairPosFormat1Marker {
    const FORMAT: u16 = 1;
}

/// [Pair Adjustment Positioning Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#pair-adjustment-positioning-format-1-adjustments-for-glyph-pairs)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct PairPosFormat1Marker {
    pair_set_offsets_byte_len: usize,
}

impl PairPosFormat1Marker {
    fn pos_format_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn coverage_offset_byte_range(&self) -> Range<usize> {
        let start = self.pos_format_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn value_format1_byte_range(&self) -> Range<usize> {
        let start = self.coverage_offset_byte_range().end;
        start..start + ValueFormat::RAW_BYTE_LEN
    }

    fn value_format2_byte_range(&self) -> Range<usize> {
        let start = self.value_format1_byte_range().end;
        start..start + ValueFormat::RAW_BYTE_LEN
    }

    fn pair_set_count_byte_range(&self) -> Range<usize> {
        let start = self.value_format2_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn pair_set_offsets_byte_range(&self) -> Range<usize> {
        let start = self.pair_set_count_byte_range().end;
        start..start + self.pair_set_offsets_byte_len
    }
}

impl<'a> FontRead<'a> for PairPosFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<Offset16>();
        cursor.advance::<ValueFormat>();
        cursor.advance::<ValueFormat>();
        let pair_set_count: u16 = cursor.read()?;
        let pair_set_offsets_byte_len = (pair_set_count as usize)
            .checked_mul(Offset16::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(pair_set_offsets_byte_len);
        cursor.finish(PairPosFormat1Marker {
            pair_set_offsets_byte_len,
        })
    }
}

pub type PairPosFormat1<'a> = TableRef<'a, PairPosFormat1Marker>;

impl<'a> PairPosFormat1<'a> {
    pub fn pos_format(&self) -> u16 {
        let range = self.shape.pos_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Offset to Coverage table, from beginning of PairPos subtable.
    pub fn coverage_offset(&self) -> Offset16 {
        let range = self.shape.coverage_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset().resolve(self.data)
    }

    /// Defines the types of data in valueRecord1, for the first glyph in
    /// the pair (may be zero).
    pub fn value_format1(&self) -> ValueFormat {
        let range = self.shape.value_format1_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Defines the types of data in valueRecord2, for the second glyph in
    /// the pair (may be zero).
    pub fn value_format2(&self) -> ValueFormat {
        let range = self.shape.value_format2_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn pair_set_count(&self) -> u16 {
        let range = self.shape.pair_set_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of offsets to PairSet tables. Offsets are from beginning of
    /// PairPos subtable, ordered by Coverage Index.
    pub fn pair_set_offsets(&self) -> &'a [BigEndian<Offset16>] {
        let range = self.shape.pair_set_offsets_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }

    /// The pair sets, resolved with this table's value formats.
    pub fn pair_sets(&self) -> impl Iterator<Item = Result<PairSet<'a>, ReadError>> + 'a {
        let data = self.data;
        let args = (self.value_format1(), self.value_format2());
        self.pair_set_offsets()
            .iter()
            .map(move |offset| offset.get().resolve_with_args(data, &args))
    }
}

/// Part of [PairPosFormat1]
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct PairSetMarker {
    value_format1: ValueFormat,
    value_format2: ValueFormat,
    pair_value_records_byte_len: usize,
}

impl PairSetMarker {
    fn pair_value_count_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn pair_value_records_byte_range(&self) -> Range<usize> {
        let start = self.pair_value_count_byte_range().end;
        start..start + self.pair_value_records_byte_len
    }
}

impl ReadArgs for PairSet<'_> {
    type Args = (ValueFormat, ValueFormat);
}

impl<'a> FontReadWithArgs<'a> for PairSet<'a> {
    fn read_with_args(data: FontData<'a>, args: &(ValueFormat, ValueFormat)) -> Result<Self, ReadError> {
        let (value_format1, value_format2) = *args;
        let mut cursor = data.cursor();
        let pair_value_count: u16 = cursor.read()?;
        let pair_value_records_byte_len = (pair_value_count as usize)
            .checked_mul(PairValueRecord::compute_size(args))
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(pair_value_records_byte_len);
        cursor.finish(PairSetMarker {
            value_format1,
            value_format2,
            pair_value_records_byte_len,
        })
    }
}

impl<'a> PairSet<'a> {
    /// A constructor that requires additional arguments.
    ///
    /// This type requires some external state in order to be
    /// parsed.
    pub fn read(
        data: FontData<'a>,
        value_format1: ValueFormat,
        value_format2: ValueFormat,
    ) -> Result<Self, ReadError> {
        Self::read_with_args(data, &(value_format1, value_format2))
    }
}

pub type PairSet<'a> = TableRef<'a, PairSetMarker>;

impl<'a> PairSet<'a> {
    /// Number of PairValueRecords
    pub fn pair_value_count(&self) -> u16 {
        let range = self.shape.pair_value_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of PairValueRecords, ordered by glyph ID of the second glyph.
    pub fn pair_value_records(&self) -> ComputedArray<'a, PairValueRecord> {
        let range = self.shape.pair_value_records_byte_range();
        ComputedArray::new(
            self.data.slice(range).unwrap_or_default(),
            (self.shape.value_format1, self.shape.value_format2),
        )
    }

    pub fn value_format1(&self) -> ValueFormat {
        self.shape.value_format1
    }

    pub fn value_format2(&self) -> ValueFormat {
        self.shape.value_format2
    }
}

/// Part of [PairSet]
#[derive(Clone, Debug, PartialEq)]
pub struct PairValueRecord {
    /// Glyph ID of second glyph in the pair
    pub second_glyph: GlyphId16,
    /// Positioning data for the first glyph in the pair.
    pub value_record1: ValueRecord,
    /// Positioning data for the second glyph in the pair.
    pub value_record2: ValueRecord,
}

impl ReadArgs for PairValueRecord {
    type Args = (ValueFormat, ValueFormat);
}

impl ComputeSize for PairValueRecord {
    fn compute_size(args: &(ValueFormat, ValueFormat)) -> usize {
        let (value_format1, value_format2) = *args;
        GlyphId16::RAW_BYTE_LEN
            + value_format1.record_byte_len()
            + value_format2.record_byte_len()
    }
}

impl<'a> FontReadWithArgs<'a> for PairValueRecord {
    fn read_with_args(data: FontData<'a>, args: &(ValueFormat, ValueFormat)) -> Result<Self, ReadError> {
        let (value_format1, value_format2) = *args;
        let second_glyph: GlyphId16 = data.read_at(0)?;
        let split = GlyphId16::RAW_BYTE_LEN + value_format1.record_byte_len();
        let value_record1 = data
            .slice(GlyphId16::RAW_BYTE_LEN..split)
            .ok_or(ReadError::OutOfBounds)
            .and_then(|data| ValueRecord::read(data, value_format1))?;
        let value_record2 = data
            .split_off(split)
            .ok_or(ReadError::OutOfBounds)
            .and_then(|data| ValueRecord::read(data, value_format2))?;
        Ok(PairValueRecord {
            second_glyph,
            value_record1,
            value_record2,
        })
    }
}

impl Format<u16> for PairPosFormat2Marker {
    const FORMAT: u16 = 2;
}

/// [Pair Adjustment Positioning Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#pair-adjustment-positioning-format-2-class-pair-adjustment)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct PairPosFormat2Marker {
    class1_records_byte_len: usize,
}

impl PairPosFormat2Marker {
    fn pos_format_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn coverage_offset_byte_range(&self) -> Range<usize> {
        let start = self.pos_format_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn value_format1_byte_range(&self) -> Range<usize> {
        let start = self.coverage_offset_byte_range().end;
        start..start + ValueFormat::RAW_BYTE_LEN
    }

    fn value_format2_byte_range(&self) -> Range<usize> {
        let start = self.value_format1_byte_range().end;
        start..start + ValueFormat::RAW_BYTE_LEN
    }

    fn class_def1_offset_byte_range(&self) -> Range<usize> {
        let start = self.value_format2_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn class_def2_offset_byte_range(&self) -> Range<usize> {
        let start = self.class_def1_offset_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn class1_count_byte_range(&self) -> Range<usize> {
        let start = self.class_def2_offset_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn class2_count_byte_range(&self) -> Range<usize> {
        let start = self.class1_count_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn class1_records_byte_range(&self) -> Range<usize> {
        let start = self.class2_count_byte_range().end;
        start..start + self.class1_records_byte_len
    }
}

impl<'a> FontRead<'a> for PairPosFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<Offset16>();
        let value_format1: ValueFormat = cursor.read()?;
        let value_format2: ValueFormat = cursor.read()?;
        cursor.advance::<Offset16>();
        cursor.advance::<Offset16>();
        let class1_count: u16 = cursor.read()?;
        let class2_count: u16 = cursor.read()?;
        let class1_records_byte_len = (class1_count as usize)
            .checked_mul(Class1Record::compute_size(&(
                class2_count,
                value_format1,
                value_format2,
            )))
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(class1_records_byte_len);
        cursor.finish(PairPosFormat2Marker {
            class1_records_byte_len,
        })
    }
}

pub type PairPosFormat2<'a> = TableRef<'a, PairPosFormat2Marker>;

impl<'a> PairPosFormat2<'a> {
    pub fn pos_format(&self) -> u16 {
        let range = self.shape.pos_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Offset to Coverage table, from beginning of PairPos subtable.
    pub fn coverage_offset(&self) -> Offset16 {
        let range = self.shape.coverage_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset().resolve(self.data)
    }

    /// ValueRecord definition, for the first glyph of the pair (may be zero).
    pub fn value_format1(&self) -> ValueFormat {
        let range = self.shape.value_format1_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// ValueRecord definition, for the second glyph of the pair (may be zero).
    pub fn value_format2(&self) -> ValueFormat {
        let range = self.shape.value_format2_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Offset to ClassDef table, from beginning of PairPos subtable, for
    /// the first glyph of the pair.
    pub fn class_def1_offset(&self) -> Offset16 {
        let range = self.shape.class_def1_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn class_def1(&self) -> Result<ClassDef<'a>, ReadError> {
        self.class_def1_offset().resolve(self.data)
    }

    /// Offset to ClassDef table, from beginning of PairPos subtable, for
    /// the second glyph of the pair.
    pub fn class_def2_offset(&self) -> Offset16 {
        let range = self.shape.class_def2_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn class_def2(&self) -> Result<ClassDef<'a>, ReadError> {
        self.class_def2_offset().resolve(self.data)
    }

    /// Number of classes in classDef1 table, includes Class 0.
    pub fn class1_count(&self) -> u16 {
        let range = self.shape.class1_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Number of classes in classDef2 table, includes Class 0.
    pub fn class2_count(&self) -> u16 {
        let range = self.shape.class2_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of Class1 records, ordered by classes in classDef1.
    pub fn class1_records(&self) -> ComputedArray<'a, Class1Record<'a>> {
        let range = self.shape.class1_records_byte_range();
        ComputedArray::new(
            self.data.slice(range).unwrap_or_default(),
            (
                self.class2_count(),
                self.value_format1(),
                self.value_format2(),
            ),
        )
    }
}

/// Part of [PairPosFormat2]
#[derive(Clone, Debug)]
pub struct Class1Record<'a> {
    /// Array of Class2 records, ordered by classes in classDef2.
    pub class2_records: ComputedArray<'a, Class2Record>,
}

impl<'a> Class1Record<'a> {
    pub fn class2_records(&self) -> &ComputedArray<'a, Class2Record> {
        &self.class2_records
    }
}

impl ReadArgs for Class1Record<'_> {
    type Args = (u16, ValueFormat, ValueFormat);
}

impl ComputeSize for Class1Record<'_> {
    fn compute_size(args: &(u16, ValueFormat, ValueFormat)) -> usize {
        let (class2_count, value_format1, value_format2) = *args;
        (class2_count as usize)
            .saturating_mul(Class2Record::compute_size(&(value_format1, value_format2)))
    }
}

impl<'a> FontReadWithArgs<'a> for Class1Record<'a> {
    fn read_with_args(
        data: FontData<'a>,
        args: &(u16, ValueFormat, ValueFormat),
    ) -> Result<Self, ReadError> {
        let (class2_count, value_format1, value_format2) = *args;
        let mut cursor = data.cursor();
        let class2_records =
            cursor.read_computed_array(class2_count as usize, &(value_format1, value_format2))?;
        cursor.finish(())?;
        Ok(Class1Record { class2_records })
    }
}

/// Part of [PairPosFormat2]
#[derive(Clone, Debug, PartialEq)]
pub struct Class2Record {
    /// Positioning for first glyph, empty if valueFormat1 = 0.
    pub value_record1: ValueRecord,
    /// Positioning for second glyph, empty if valueFormat2 = 0.
    pub value_record2: ValueRecord,
}

impl ReadArgs for Class2Record {
    type Args = (ValueFormat, ValueFormat);
}

impl ComputeSize for Class2Record {
    fn compute_size(args: &(ValueFormat, ValueFormat)) -> usize {
        let (value_format1, value_format2) = *args;
        value_format1.record_byte_len() + value_format2.record_byte_len()
    }
}

impl<'a> FontReadWithArgs<'a> for Class2Record {
    fn read_with_args(data: FontData<'a>, args: &(ValueFormat, ValueFormat)) -> Result<Self, ReadError> {
        let (value_format1, value_format2) = *args;
        let split = value_format1.record_byte_len();
        let value_record1 = data
            .slice(..split)
            .ok_or(ReadError::OutOfBounds)
            .and_then(|data| ValueRecord::read(data, value_format1))?;
        let value_record2 = data
            .split_off(split)
            .ok_or(ReadError::OutOfBounds)
            .and_then(|data| ValueRecord::read(data, value_format2))?;
        Ok(Class2Record {
            value_record1,
            value_record2,
        })
    }
}

/// [Pair Adjustment Positioning Subtable](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-2-pair-adjustment-positioning-subtable)
#[derive(Clone)]
pub enum PairPos<'a> {
    Format1(PairPosFormat1<'a>),
    Format2(PairPosFormat2<'a>),
}

impl<'a> FormatRecord<'a> for PairPos<'a> {
    fn select(data: FontData<'a>, selector: u16) -> Option<Result<Self, ReadError>> {
        match selector {
            PairPosFormat1Marker::FORMAT => Some(FontRead::read(data).map(Self::Format1)),
            PairPosFormat2Marker::FORMAT => Some(FontRead::read(data).map(Self::Format2)),
            _ => None,
        }
    }
}

format_record_font_read!(PairPos);

impl<'a> PairPos<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        match self {
            Self::Format1(table) => table.coverage(),
            Self::Format2(table) => table.coverage(),
        }
    }
}

impl std::fmt::Debug for PairPos<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format1(table) => table.fmt(f),
            Self::Format2(table) => table.fmt(f),
        }
    }
}

impl Format<u16> for AnchorFormat1Marker {
    const FORMAT: u16 = 1;
}

/// [Anchor Table Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-table-format-1-design-units): Design Units
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct AnchorFormat1Marker;

impl AnchorFormat1Marker {
    fn x_coordinate_byte_range(&self) -> Range<usize> {
        let start = u16::RAW_BYTE_LEN;
        start..start + i16::RAW_BYTE_LEN
    }

    fn y_coordinate_byte_range(&self) -> Range<usize> {
        let start = self.x_coordinate_byte_range().end;
        start..start + i16::RAW_BYTE_LEN
    }
}

impl<'a> FontRead<'a> for AnchorFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<i16>();
        cursor.advance::<i16>();
        cursor.finish(AnchorFormat1Marker)
    }
}

pub type AnchorFormat1<'a> = TableRef<'a, AnchorFormat1Marker>;

impl<'a> AnchorFormat1<'a> {
    /// Horizontal value, in design units
    pub fn x_coordinate(&self) -> i16 {
        let range = self.shape.x_coordinate_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Vertical value, in design units
    pub fn y_coordinate(&self) -> i16 {
        let range = self.shape.y_coordinate_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }
}

impl Format<u16> for AnchorFormat2Marker {
    const FORMAT: u16 = 2;
}

/// [Anchor Table Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-table-format-2-design-units-plus-contour-point): Design Units Plus Contour Point
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct AnchorFormat2Marker;

impl AnchorFormat2Marker {
    fn x_coordinate_byte_range(&self) -> Range<usize> {
        let start = u16::RAW_BYTE_LEN;
        start..start + i16::RAW_BYTE_LEN
    }

    fn y_coordinate_byte_range(&self) -> Range<usize> {
        let start = self.x_coordinate_byte_range().end;
        start..start + i16::RAW_BYTE_LEN
    }

    fn anchor_point_byte_range(&self) -> Range<usize> {
        let start = self.y_coordinate_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }
}

impl<'a> FontRead<'a> for AnchorFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<i16>();
        cursor.advance::<i16>();
        cursor.advance::<u16>();
        cursor.finish(AnchorFormat2Marker)
    }
}

pub type AnchorFormat2<'a> = TableRef<'a, AnchorFormat2Marker>;

impl<'a> AnchorFormat2<'a> {
    pub fn x_coordinate(&self) -> i16 {
        let range = self.shape.x_coordinate_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn y_coordinate(&self) -> i16 {
        let range = self.shape.y_coordinate_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Index to glyph contour point
    pub fn anchor_point(&self) -> u16 {
        let range = self.shape.anchor_point_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }
}

impl Format<u16> for AnchorFormat3Marker {
    const FORMAT: u16 = 3;
}

/// [Anchor Table Format 3](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-table-format-3-design-units-plus-device-or-variationindex-tables): Design Units Plus Device or VariationIndex Tables
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct AnchorFormat3Marker;

impl AnchorFormat3Marker {
    fn x_coordinate_byte_range(&self) -> Range<usize> {
        let start = u16::RAW_BYTE_LEN;
        start..start + i16::RAW_BYTE_LEN
    }

    fn y_coordinate_byte_range(&self) -> Range<usize> {
        let start = self.x_coordinate_byte_range().end;
        start..start + i16::RAW_BYTE_LEN
    }

    fn x_device_offset_byte_range(&self) -> Range<usize> {
        let start = self.y_coordinate_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn y_device_offset_byte_range(&self) -> Range<usize> {
        let start = self.x_device_offset_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }
}

impl<'a> FontRead<'a> for AnchorFormat3<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<i16>();
        cursor.advance::<i16>();
        cursor.advance::<Offset16>();
        cursor.advance::<Offset16>();
        cursor.finish(AnchorFormat3Marker)
    }
}

pub type AnchorFormat3<'a> = TableRef<'a, AnchorFormat3Marker>;

impl<'a> AnchorFormat3<'a> {
    pub fn x_coordinate(&self) -> i16 {
        let range = self.shape.x_coordinate_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn y_coordinate(&self) -> i16 {
        let range = self.shape.y_coordinate_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Offset to Device table (non-variable font) / VariationIndex
    /// table (variable font) for X coordinate, from beginning of
    /// Anchor table (may be NULL)
    pub fn x_device_offset(&self) -> Nullable<Offset16> {
        let range = self.shape.x_device_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn x_device(&self) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.x_device_offset().resolve(self.data)
    }

    /// Offset to Device table (non-variable font) / VariationIndex
    /// table (variable font) for Y coordinate, from beginning of
    /// Anchor table (may be NULL)
    pub fn y_device_offset(&self) -> Nullable<Offset16> {
        let range = self.shape.y_device_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn y_device(&self) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.y_device_offset().resolve(self.data)
    }
}

/// [Anchor Tables](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-tables)
#[derive(Clone)]
pub enum AnchorTable<'a> {
    Format1(AnchorFormat1<'a>),
    Format2(AnchorFormat2<'a>),
    Format3(AnchorFormat3<'a>),
}

impl<'a> FormatRecord<'a> for AnchorTable<'a> {
    fn select(data: FontData<'a>, selector: u16) -> Option<Result<Self, ReadError>> {
        match selector {
            AnchorFormat1Marker::FORMAT => Some(FontRead::read(data).map(Self::Format1)),
            AnchorFormat2Marker::FORMAT => Some(FontRead::read(data).map(Self::Format2)),
            AnchorFormat3Marker::FORMAT => Some(FontRead::read(data).map(Self::Format3)),
            _ => None,
        }
    }
}

format_record_font_read!(AnchorTable);

impl AnchorTable<'_> {
    /// The anchor position, in design units.
    pub fn coordinates(&self) -> (i16, i16) {
        match self {
            Self::Format1(table) => (table.x_coordinate(), table.y_coordinate()),
            Self::Format2(table) => (table.x_coordinate(), table.y_coordinate()),
            Self::Format3(table) => (table.x_coordinate(), table.y_coordinate()),
        }
    }
}

impl std::fmt::Debug for AnchorTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format1(table) => table.fmt(f),
            Self::Format2(table) => table.fmt(f),
            Self::Format3(table) => table.fmt(f),
        }
    }
}

/// [Mark Array Table](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#mark-array-table)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct MarkArrayMarker {
    mark_records_byte_len: usize,
}

impl MarkArrayMarker {
    fn mark_count_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn mark_records_byte_range(&self) -> Range<usize> {
        let start = self.mark_count_byte_range().end;
        start..start + self.mark_records_byte_len
    }
}

impl<'a> FontRead<'a> for MarkArray<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let mark_count: u16 = cursor.read()?;
        let mark_records_byte_len = (mark_count as usize)
            .checked_mul(MarkRecord::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(mark_records_byte_len);
        cursor.finish(MarkArrayMarker {
            mark_records_byte_len,
        })
    }
}

pub type MarkArray<'a> = TableRef<'a, MarkArrayMarker>;

impl<'a> MarkArray<'a> {
    pub fn mark_count(&self) -> u16 {
        let range = self.shape.mark_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of MarkRecords, ordered by corresponding glyphs in the
    /// associated mark Coverage table.
    pub fn mark_records(&self) -> &'a [MarkRecord] {
        let range = self.shape.mark_records_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

/// Part of [MarkArray]
#[derive(Clone, Debug, Copy, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct MarkRecord {
    pub mark_class: BigEndian<u16>,
    pub mark_anchor_offset: BigEndian<Offset16>,
}

impl MarkRecord {
    /// Class defined for the associated mark.
    pub fn mark_class(&self) -> u16 {
        self.mark_class.get()
    }

    /// Offset to Anchor table, from beginning of MarkArray table.
    pub fn mark_anchor_offset(&self) -> Offset16 {
        self.mark_anchor_offset.get()
    }

    /// `data` is the data of the parent [`MarkArray`].
    pub fn mark_anchor<'a>(&self, data: FontData<'a>) -> Result<AnchorTable<'a>, ReadError> {
        self.mark_anchor_offset().resolve(data)
    }
}

impl FixedSize for MarkRecord {
    const RAW_BYTE_LEN: usize = u16::RAW_BYTE_LEN + Offset16::RAW_BYTE_LEN;
}

impl Format<u16> for MarkBasePosFormat1Marker {
    const FORMAT: u16 = 1;
}

/// [Mark-to-Base Attachment Positioning Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#mark-to-base-attachment-positioning-format-1-mark-to-base-attachment-point)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct MarkBasePosFormat1Marker;

impl MarkBasePosFormat1Marker {
    fn pos_format_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn mark_coverage_offset_byte_range(&self) -> Range<usize> {
        let start = self.pos_format_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn base_coverage_offset_byte_range(&self) -> Range<usize> {
        let start = self.mark_coverage_offset_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn mark_class_count_byte_range(&self) -> Range<usize> {
        let start = self.base_coverage_offset_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn mark_array_offset_byte_range(&self) -> Range<usize> {
        let start = self.mark_class_count_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn base_array_offset_byte_range(&self) -> Range<usize> {
        let start = self.mark_array_offset_byte_range().end;
        start..start + Offset16::RAW_BYTE_LEN
    }
}

impl<'a> FontRead<'a> for MarkBasePosFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<Offset16>();
        cursor.advance::<Offset16>();
        cursor.advance::<u16>();
        cursor.advance::<Offset16>();
        cursor.advance::<Offset16>();
        cursor.finish(MarkBasePosFormat1Marker)
    }
}

pub type MarkBasePosFormat1<'a> = TableRef<'a, MarkBasePosFormat1Marker>;

impl<'a> MarkBasePosFormat1<'a> {
    pub fn pos_format(&self) -> u16 {
        let range = self.shape.pos_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Offset to markCoverage table, from beginning of MarkBasePos subtable.
    pub fn mark_coverage_offset(&self) -> Offset16 {
        let range = self.shape.mark_coverage_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn mark_coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.mark_coverage_offset().resolve(self.data)
    }

    /// Offset to baseCoverage table, from beginning of MarkBasePos subtable.
    pub fn base_coverage_offset(&self) -> Offset16 {
        let range = self.shape.base_coverage_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn base_coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.base_coverage_offset().resolve(self.data)
    }

    /// Number of classes defined for marks
    pub fn mark_class_count(&self) -> u16 {
        let range = self.shape.mark_class_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn mark_array_offset(&self) -> Offset16 {
        let range = self.shape.mark_array_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn mark_array(&self) -> Result<MarkArray<'a>, ReadError> {
        self.mark_array_offset().resolve(self.data)
    }

    pub fn base_array_offset(&self) -> Offset16 {
        let range = self.shape.base_array_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn base_array(&self) -> Result<BaseArray<'a>, ReadError> {
        self.base_array_offset()
            .resolve_with_args(self.data, &self.mark_class_count())
    }
}

/// Part of [MarkBasePosFormat1]
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct BaseArrayMarker {
    mark_class_count: u16,
    base_records_byte_len: usize,
}

impl BaseArrayMarker {
    fn base_count_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn base_records_byte_range(&self) -> Range<usize> {
        let start = self.base_count_byte_range().end;
        start..start + self.base_records_byte_len
    }
}

impl ReadArgs for BaseArray<'_> {
    type Args = u16;
}

impl<'a> FontReadWithArgs<'a> for BaseArray<'a> {
    fn read_with_args(data: FontData<'a>, args: &u16) -> Result<Self, ReadError> {
        let mark_class_count = *args;
        let mut cursor = data.cursor();
        let base_count: u16 = cursor.read()?;
        let base_records_byte_len = (base_count as usize)
            .checked_mul(BaseRecord::compute_size(args))
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(base_records_byte_len);
        cursor.finish(BaseArrayMarker {
            mark_class_count,
            base_records_byte_len,
        })
    }
}

pub type BaseArray<'a> = TableRef<'a, BaseArrayMarker>;

impl<'a> BaseArray<'a> {
    pub fn base_count(&self) -> u16 {
        let range = self.shape.base_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of BaseRecords, in order of baseCoverage Index.
    pub fn base_records(&self) -> ComputedArray<'a, BaseRecord<'a>> {
        let range = self.shape.base_records_byte_range();
        ComputedArray::new(
            self.data.slice(range).unwrap_or_default(),
            self.shape.mark_class_count,
        )
    }
}

/// Part of [BaseArray]
#[derive(Clone, Debug)]
pub struct BaseRecord<'a> {
    /// Offsets (one per mark class) to Anchor tables, from the beginning of
    /// the BaseArray table; any may be NULL.
    pub base_anchor_offsets: &'a [BigEndian<Nullable<Offset16>>],
}

impl<'a> BaseRecord<'a> {
    pub fn base_anchor_offsets(&self) -> &'a [BigEndian<Nullable<Offset16>>] {
        self.base_anchor_offsets
    }

    /// The anchor for `mark_class`, if there is one.
    ///
    /// `data` is the data of the parent [`BaseArray`].
    pub fn base_anchor(
        &self,
        data: FontData<'a>,
        mark_class: u16,
    ) -> Option<Result<AnchorTable<'a>, ReadError>> {
        self.base_anchor_offsets
            .get(mark_class as usize)?
            .get()
            .resolve(data)
    }
}

impl ReadArgs for BaseRecord<'_> {
    type Args = u16;
}

impl ComputeSize for BaseRecord<'_> {
    fn compute_size(args: &u16) -> usize {
        *args as usize * Offset16::RAW_BYTE_LEN
    }
}

impl<'a> FontReadWithArgs<'a> for BaseRecord<'a> {
    fn read_with_args(data: FontData<'a>, args: &u16) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let base_anchor_offsets = cursor.read_array(*args as usize)?;
        cursor.finish(())?;
        Ok(BaseRecord {
            base_anchor_offsets,
        })
    }
}

impl Format<u16> for ExtensionPosFormat1Marker {
    const FORMAT: u16 = 1;
}

/// [Extension Positioning Subtable Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-9-extension-positioning)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct ExtensionPosFormat1Marker;

impl ExtensionPosFormat1Marker {
    fn pos_format_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn extension_lookup_type_byte_range(&self) -> Range<usize> {
        let start = self.pos_format_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn extension_offset_byte_range(&self) -> Range<usize> {
        let start = self.extension_lookup_type_byte_range().end;
        start..start + Offset32::RAW_BYTE_LEN
    }
}

impl<'a> FontRead<'a> for ExtensionPosFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<u16>();
        cursor.advance::<Offset32>();
        cursor.finish(ExtensionPosFormat1Marker)
    }
}

pub type ExtensionPosFormat1<'a> = TableRef<'a, ExtensionPosFormat1Marker>;

impl<'a> ExtensionPosFormat1<'a> {
    pub fn pos_format(&self) -> u16 {
        let range = self.shape.pos_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Lookup type of subtable referenced by extensionOffset (i.e. the
    /// extension subtable).
    pub fn extension_lookup_type(&self) -> u16 {
        let range = self.shape.extension_lookup_type_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Offset to the extension subtable, of lookup type
    /// extensionLookupType, relative to the start of the
    /// ExtensionPosFormat1 subtable.
    pub fn extension_offset(&self) -> Offset32 {
        let range = self.shape.extension_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Resolve the wrapped subtable as `T`.
    pub fn extension<T: FontRead<'a>>(&self) -> Result<T, ReadError> {
        self.extension_offset().resolve(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sfnt_test_data::gpos as test_data;

    #[test]
    fn single_pos_format1() {
        let table = SinglePos::read(FontData::new(test_data::SINGLEPOSFORMAT1)).unwrap();
        let SinglePos::Format1(table) = table else {
            panic!("expected format 1");
        };
        assert_eq!(table.value_format(), ValueFormat::Y_PLACEMENT);
        assert_eq!(table.value_record().y_placement, Some(-80));
        let coverage = table.coverage().unwrap();
        assert_eq!(coverage.population(), 10);
    }

    #[test]
    fn single_pos_format2() {
        let table = SinglePosFormat2::read(FontData::new(test_data::SINGLEPOSFORMAT2)).unwrap();
        assert_eq!(table.value_count(), 3);
        let records = table
            .value_records()
            .iter()
            .map(|rec| rec.map(|rec| (rec.x_placement, rec.x_advance)))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            records,
            [
                (Some(50), Some(50)),
                (Some(25), Some(25)),
                (Some(10), Some(10))
            ]
        );
    }

    #[test]
    fn pair_pos_format1() {
        let table = PairPosFormat1::read(FontData::new(test_data::PAIRPOSFORMAT1)).unwrap();
        assert_eq!(table.pair_set_count(), 2);
        let sets = table.pair_sets().collect::<Result<Vec<_>, _>>().unwrap();
        let record = sets[1].pair_value_records().get(0).unwrap();
        assert_eq!(record.second_glyph, GlyphId16::new(0x59));
        assert_eq!(record.value_record1.x_advance, Some(-40));
        assert_eq!(record.value_record2.x_placement, Some(-25));
    }

    #[test]
    fn pair_pos_format2() {
        let table = PairPosFormat2::read(FontData::new(test_data::PAIRPOSFORMAT2)).unwrap();
        assert_eq!(table.class1_count(), 2);
        assert_eq!(table.class_def1().unwrap().get(GlyphId16::new(0x47)), 1);
        assert_eq!(table.class_def2().unwrap().get(GlyphId16::new(0x6B)), 1);
        let class1 = table.class1_records().get(1).unwrap();
        let class2 = class1.class2_records().get(1).unwrap();
        assert_eq!(class2.value_record1.x_advance, Some(-50));
    }

    #[test]
    fn mark_base_pos_format1() {
        let table = MarkBasePosFormat1::read(FontData::new(test_data::MARKBASEPOSFORMAT1)).unwrap();
        assert_eq!(table.mark_class_count(), 2);
        assert_eq!(table.base_coverage().unwrap().population(), 1);

        let mark_array = table.mark_array().unwrap();
        let classes = mark_array
            .mark_records()
            .iter()
            .map(|rec| rec.mark_class())
            .collect::<Vec<_>>();
        assert_eq!(classes, [0, 1]);
        let anchor = mark_array.mark_records()[1]
            .mark_anchor(mark_array.offset_data())
            .unwrap();
        assert_eq!(anchor.coordinates(), (346, 1364));

        let base_array = table.base_array().unwrap();
        assert_eq!(base_array.base_count(), 1);
        let record = base_array.base_records().get(0).unwrap();
        assert_eq!(record.base_anchor_offsets().len(), 2);
        let anchor = record
            .base_anchor(base_array.offset_data(), 0)
            .unwrap()
            .unwrap();
        assert!(matches!(anchor, AnchorTable::Format3(_)));
        assert_eq!(anchor.coordinates(), (400, 1500));
        assert!(record.base_anchor(base_array.offset_data(), 1).is_none());
    }

    #[test]
    fn gpos_lookups() {
        let buf = test_data::simple_gpos();
        let gpos = Gpos::read(FontData::new(&buf)).unwrap();
        assert_eq!(gpos.version(), MajorMinor::VERSION_1_0);
        assert!(gpos.feature_variations_offset().is_none());
        let lookups = gpos
            .lookup_list()
            .unwrap()
            .lookups()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            lookups.iter().map(|l| l.lookup_type()).collect::<Vec<_>>(),
            [1, 2, 9]
        );
        let PositionLookup::Extension(ext) = &lookups[2] else {
            panic!("expected extension lookup");
        };
        let subtable = ext.subtables().next().unwrap().unwrap();
        assert_eq!(subtable.extension_lookup_type(), 2);
        let pair: PairPos = subtable.extension().unwrap();
        assert!(matches!(pair, PairPos::Format2(_)));
    }

    #[test]
    fn unsupported_gpos_version() {
        let buf = [0u8, 2, 0, 0, 0, 10, 0, 10, 0, 10];
        assert_eq!(
            Gpos::read(FontData::new(&buf)).err(),
            Some(ReadError::InvalidFormat(2))
        );
    }
}
