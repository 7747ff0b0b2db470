//! OpenType Layout common table formats
//!
//! These are shared by GPOS and GSUB: the script and feature lists, the
//! generic lookup list, coverage and class definition tables, and device
//! tables.

#[path = "./lookup_flag.rs"]
mod lookup_flag;

pub use lookup_flag::LookupFlag;

use std::marker::PhantomData;

use crate::table_prelude::*;

/// [Script List Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#script-list-table-and-script-record)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct ScriptListMarker {
    script_records_byte_len: usize,
}

impl ScriptListMarker {
    fn script_count_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn script_records_byte_range(&self) -> Range<usize> {
        let start = self.script_count_byte_range().end;
        start..start + self.script_records_byte_len
    }
}

impl<'a> FontRead<'a> for ScriptList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let script_count: u16 = cursor.read()?;
        let script_records_byte_len = (script_count as usize)
            .checked_mul(ScriptRecord::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(script_records_byte_len);
        cursor.finish(ScriptListMarker {
            script_records_byte_len,
        })
    }
}

pub type ScriptList<'a> = TableRef<'a, ScriptListMarker>;

impl<'a> ScriptList<'a> {
    /// Number of ScriptRecords
    pub fn script_count(&self) -> u16 {
        let range = self.shape.script_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of ScriptRecords, listed alphabetically by script tag
    pub fn script_records(&self) -> &'a [ScriptRecord] {
        let range = self.shape.script_records_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

/// A tag and an offset to a [`Script`], from the start of the [`ScriptList`].
#[derive(Clone, Debug, Copy, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct ScriptRecord {
    pub script_tag: BigEndian<Tag>,
    pub script_offset: BigEndian<Offset16>,
}

impl ScriptRecord {
    pub fn script_tag(&self) -> Tag {
        self.script_tag.get()
    }

    pub fn script_offset(&self) -> Offset16 {
        self.script_offset.get()
    }

    /// `data` is the data of the parent [`ScriptList`].
    pub fn script<'a>(&self, data: FontData<'a>) -> Result<Script<'a>, ReadError> {
        self.script_offset().resolve(data)
    }
}

impl FixedSize for ScriptRecord {
    const RAW_BYTE_LEN: usize = Tag::RAW_BYTE_LEN + Offset16::RAW_BYTE_LEN;
}

/// [Script Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#script-table-and-language-system-record)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct ScriptMarker {
    lang_sys_records_byte_len: usize,
}

impl ScriptMarker {
    fn default_lang_sys_offset_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn lang_sys_count_byte_range(&self) -> Range<usize> {
        let start = self.default_lang_sys_offset_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn lang_sys_records_byte_range(&self) -> Range<usize> {
        let start = self.lang_sys_count_byte_range().end;
        start..start + self.lang_sys_records_byte_len
    }
}

impl<'a> FontRead<'a> for Script<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<Offset16>();
        let lang_sys_count: u16 = cursor.read()?;
        let lang_sys_records_byte_len = (lang_sys_count as usize)
            .checked_mul(LangSysRecord::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(lang_sys_records_byte_len);
        cursor.finish(ScriptMarker {
            lang_sys_records_byte_len,
        })
    }
}

pub type Script<'a> = TableRef<'a, ScriptMarker>;

impl<'a> Script<'a> {
    /// Offset to default LangSys table, from beginning of Script table, may be NULL
    pub fn default_lang_sys_offset(&self) -> Nullable<Offset16> {
        let range = self.shape.default_lang_sys_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn default_lang_sys(&self) -> Option<Result<LangSys<'a>, ReadError>> {
        self.default_lang_sys_offset().resolve(self.data)
    }

    pub fn lang_sys_count(&self) -> u16 {
        let range = self.shape.lang_sys_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn lang_sys_records(&self) -> &'a [LangSysRecord] {
        let range = self.shape.lang_sys_records_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

#[derive(Clone, Debug, Copy, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct LangSysRecord {
    pub lang_sys_tag: BigEndian<Tag>,
    pub lang_sys_offset: BigEndian<Offset16>,
}

impl LangSysRecord {
    pub fn lang_sys_tag(&self) -> Tag {
        self.lang_sys_tag.get()
    }

    pub fn lang_sys_offset(&self) -> Offset16 {
        self.lang_sys_offset.get()
    }

    /// `data` is the data of the parent [`Script`].
    pub fn lang_sys<'a>(&self, data: FontData<'a>) -> Result<LangSys<'a>, ReadError> {
        self.lang_sys_offset().resolve(data)
    }
}

impl FixedSize for LangSysRecord {
    const RAW_BYTE_LEN: usize = Tag::RAW_BYTE_LEN + Offset16::RAW_BYTE_LEN;
}

/// [Language System Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#language-system-table)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct LangSysMarker {
    feature_indices_byte_len: usize,
}

impl LangSysMarker {
    fn lookup_order_offset_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn required_feature_index_byte_range(&self) -> Range<usize> {
        let start = self.lookup_order_offset_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn feature_index_count_byte_range(&self) -> Range<usize> {
        let start = self.required_feature_index_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn feature_indices_byte_range(&self) -> Range<usize> {
        let start = self.feature_index_count_byte_range().end;
        start..start + self.feature_indices_byte_len
    }
}

impl<'a> FontRead<'a> for LangSys<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<u16>();
        let feature_index_count: u16 = cursor.read()?;
        let feature_indices_byte_len = (feature_index_count as usize)
            .checked_mul(u16::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(feature_indices_byte_len);
        cursor.finish(LangSysMarker {
            feature_indices_byte_len,
        })
    }
}

pub type LangSys<'a> = TableRef<'a, LangSysMarker>;

impl<'a> LangSys<'a> {
    /// Index of a feature required for this language system; if no
    /// required features = 0xFFFF
    pub fn required_feature_index(&self) -> u16 {
        let range = self.shape.required_feature_index_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn feature_index_count(&self) -> u16 {
        let range = self.shape.feature_index_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of indices into the FeatureList, in arbitrary order
    pub fn feature_indices(&self) -> &'a [BigEndian<u16>] {
        let range = self.shape.feature_indices_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

/// [Feature List Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-list-table)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct FeatureListMarker {
    feature_records_byte_len: usize,
}

impl FeatureListMarker {
    fn feature_count_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn feature_records_byte_range(&self) -> Range<usize> {
        let start = self.feature_count_byte_range().end;
        start..start + self.feature_records_byte_len
    }
}

impl<'a> FontRead<'a> for FeatureList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let feature_count: u16 = cursor.read()?;
        let feature_records_byte_len = (feature_count as usize)
            .checked_mul(FeatureRecord::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(feature_records_byte_len);
        cursor.finish(FeatureListMarker {
            feature_records_byte_len,
        })
    }
}

pub type FeatureList<'a> = TableRef<'a, FeatureListMarker>;

impl<'a> FeatureList<'a> {
    pub fn feature_count(&self) -> u16 {
        let range = self.shape.feature_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of FeatureRecords, zero-numbered, listed alphabetically by tag
    pub fn feature_records(&self) -> &'a [FeatureRecord] {
        let range = self.shape.feature_records_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

#[derive(Clone, Debug, Copy, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct FeatureRecord {
    pub feature_tag: BigEndian<Tag>,
    pub feature_offset: BigEndian<Offset16>,
}

impl FeatureRecord {
    pub fn feature_tag(&self) -> Tag {
        self.feature_tag.get()
    }

    pub fn feature_offset(&self) -> Offset16 {
        self.feature_offset.get()
    }

    /// `data` is the data of the parent [`FeatureList`].
    pub fn feature<'a>(&self, data: FontData<'a>) -> Result<Feature<'a>, ReadError> {
        self.feature_offset()
            .resolve_with_args(data, &self.feature_tag())
    }
}

impl FixedSize for FeatureRecord {
    const RAW_BYTE_LEN: usize = Tag::RAW_BYTE_LEN + Offset16::RAW_BYTE_LEN;
}

/// [Feature Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-table)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct FeatureMarker {
    feature_tag: Tag,
    lookup_list_indices_byte_len: usize,
}

impl FeatureMarker {
    fn feature_params_offset_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + Offset16::RAW_BYTE_LEN
    }

    fn lookup_index_count_byte_range(&self) -> Range<usize> {
        let start = self.feature_params_offset_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn lookup_list_indices_byte_range(&self) -> Range<usize> {
        let start = self.lookup_index_count_byte_range().end;
        start..start + self.lookup_list_indices_byte_len
    }
}

impl ReadArgs for Feature<'_> {
    type Args = Tag;
}

impl<'a> FontReadWithArgs<'a> for Feature<'a> {
    fn read_with_args(data: FontData<'a>, args: &Tag) -> Result<Self, ReadError> {
        let feature_tag = *args;
        let mut cursor = data.cursor();
        cursor.advance::<Offset16>();
        let lookup_index_count: u16 = cursor.read()?;
        let lookup_list_indices_byte_len = (lookup_index_count as usize)
            .checked_mul(u16::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(lookup_list_indices_byte_len);
        cursor.finish(FeatureMarker {
            feature_tag,
            lookup_list_indices_byte_len,
        })
    }
}

pub type Feature<'a> = TableRef<'a, FeatureMarker>;

impl<'a> Feature<'a> {
    /// The tag of the record this feature was read through.
    pub fn feature_tag(&self) -> Tag {
        self.shape.feature_tag
    }

    /// Offset from start of Feature table to FeatureParams table, if defined
    /// for the feature and present, else NULL
    pub fn feature_params_offset(&self) -> Nullable<Offset16> {
        let range = self.shape.feature_params_offset_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Attempt to resolve [`feature_params_offset`][Self::feature_params_offset].
    ///
    /// The layout of the params is chosen by the feature tag.
    pub fn feature_params(&self) -> Option<Result<FeatureParams<'a>, ReadError>> {
        self.feature_params_offset()
            .resolve_with_args(self.data, &self.feature_tag())
    }

    pub fn lookup_index_count(&self) -> u16 {
        let range = self.shape.lookup_index_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of indices into the LookupList, zero-based (first lookup is
    /// LookupListIndex = 0)
    pub fn lookup_list_indices(&self) -> &'a [BigEndian<u16>] {
        let range = self.shape.lookup_list_indices_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

/// The params of a feature, whose layout depends on the feature tag.
#[derive(Clone)]
pub enum FeatureParams<'a> {
    StylisticSet(StylisticSetParams<'a>),
    Size(SizeParams<'a>),
    CharacterVariant(CharacterVariantParams<'a>),
}

impl ReadArgs for FeatureParams<'_> {
    type Args = Tag;
}

impl<'a> FontReadWithArgs<'a> for FeatureParams<'a> {
    fn read_with_args(data: FontData<'a>, args: &Tag) -> Result<FeatureParams<'a>, ReadError> {
        match *args {
            t if t == Tag::new(b"size") => SizeParams::read(data).map(Self::Size),
            t if t.to_be_bytes().starts_with(b"ss") => {
                StylisticSetParams::read(data).map(Self::StylisticSet)
            }
            t if t.to_be_bytes().starts_with(b"cv") => {
                CharacterVariantParams::read(data).map(Self::CharacterVariant)
            }
            // other features have no defined params
            _ => Err(ReadError::InvalidFormat(0xdead)),
        }
    }
}

impl std::fmt::Debug for FeatureParams<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StylisticSet(table) => table.fmt(f),
            Self::Size(table) => table.fmt(f),
            Self::CharacterVariant(table) => table.fmt(f),
        }
    }
}

/// [`size`](https://learn.microsoft.com/en-us/typography/opentype/spec/features_pt#tag-size) params
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct SizeParamsMarker;

impl SizeParamsMarker {
    const DESIGN_SIZE: usize = 0;
    const IDENTIFIER: usize = 2;
    const NAME_ENTRY: usize = 4;
    const RANGE_START: usize = 6;
    const RANGE_END: usize = 8;
    const BYTE_LEN: usize = 10;
}

impl<'a> FontRead<'a> for SizeParams<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance_by(SizeParamsMarker::BYTE_LEN);
        cursor.finish(SizeParamsMarker)
    }
}

pub type SizeParams<'a> = TableRef<'a, SizeParamsMarker>;

impl SizeParams<'_> {
    /// The design size, in decipoints.
    pub fn design_size(&self) -> u16 {
        self.data.read_at(SizeParamsMarker::DESIGN_SIZE).unwrap_or_default()
    }

    /// Identifies the family that this font shares design size data with.
    pub fn identifier(&self) -> u16 {
        self.data.read_at(SizeParamsMarker::IDENTIFIER).unwrap_or_default()
    }

    /// The 'name' table id of the subfamily name, or zero.
    pub fn name_entry(&self) -> u16 {
        self.data.read_at(SizeParamsMarker::NAME_ENTRY).unwrap_or_default()
    }

    /// Small end of the recommended usage range (exclusive), in decipoints.
    pub fn range_start(&self) -> u16 {
        self.data.read_at(SizeParamsMarker::RANGE_START).unwrap_or_default()
    }

    /// Large end of the recommended usage range (inclusive), in decipoints.
    pub fn range_end(&self) -> u16 {
        self.data.read_at(SizeParamsMarker::RANGE_END).unwrap_or_default()
    }
}

/// Params for the stylistic set features, `ss01` through `ss20`.
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct StylisticSetParamsMarker;

impl StylisticSetParamsMarker {
    const BYTE_LEN: usize = 2 * u16::RAW_BYTE_LEN;
}

impl<'a> FontRead<'a> for StylisticSetParams<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance_by(StylisticSetParamsMarker::BYTE_LEN);
        cursor.finish(StylisticSetParamsMarker)
    }
}

pub type StylisticSetParams<'a> = TableRef<'a, StylisticSetParamsMarker>;

impl StylisticSetParams<'_> {
    pub fn version(&self) -> u16 {
        self.data.read_at(0).unwrap_or_default()
    }

    /// The 'name' table id of the string naming this set.
    pub fn ui_name_id(&self) -> u16 {
        self.data.read_at(u16::RAW_BYTE_LEN).unwrap_or_default()
    }
}

/// Params for the character variant features, `cv01` through `cv99`.
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct CharacterVariantParamsMarker {
    character_byte_len: usize,
}

impl CharacterVariantParamsMarker {
    const CHAR_COUNT: usize = 12;

    fn character_byte_range(&self) -> Range<usize> {
        let start = Self::CHAR_COUNT + u16::RAW_BYTE_LEN;
        start..start + self.character_byte_len
    }
}

impl<'a> FontRead<'a> for CharacterVariantParams<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance_by(CharacterVariantParamsMarker::CHAR_COUNT);
        let char_count: u16 = cursor.read()?;
        let character_byte_len = (char_count as usize)
            .checked_mul(Uint24::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(character_byte_len);
        cursor.finish(CharacterVariantParamsMarker { character_byte_len })
    }
}

pub type CharacterVariantParams<'a> = TableRef<'a, CharacterVariantParamsMarker>;

impl<'a> CharacterVariantParams<'a> {
    pub fn format(&self) -> u16 {
        self.data.read_at(0).unwrap_or_default()
    }

    /// The 'name' table id of the label for this feature in a UI.
    pub fn feat_ui_label_name_id(&self) -> u16 {
        self.data.read_at(2).unwrap_or_default()
    }

    pub fn feat_ui_tooltip_text_name_id(&self) -> u16 {
        self.data.read_at(4).unwrap_or_default()
    }

    pub fn sample_text_name_id(&self) -> u16 {
        self.data.read_at(6).unwrap_or_default()
    }

    pub fn num_named_parameters(&self) -> u16 {
        self.data.read_at(8).unwrap_or_default()
    }

    pub fn first_param_ui_label_name_id(&self) -> u16 {
        self.data.read_at(10).unwrap_or_default()
    }

    pub fn char_count(&self) -> u16 {
        self.data
            .read_at(CharacterVariantParamsMarker::CHAR_COUNT)
            .unwrap_or_default()
    }

    /// The Unicode scalar values of the characters this feature applies to.
    pub fn character(&self) -> &'a [BigEndian<Uint24>] {
        let range = self.shape.character_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

/// [Lookup List Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-list-table)
///
/// `T` is the type of the lookups in the list.
#[derive(Debug)]
#[doc(hidden)]
pub struct LookupListMarker<T = ()> {
    lookup_offsets_byte_len: usize,
    offset_type: PhantomData<fn() -> T>,
}

impl<T> LookupListMarker<T> {
    fn lookup_count_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn lookup_offsets_byte_range(&self) -> Range<usize> {
        let start = self.lookup_count_byte_range().end;
        start..start + self.lookup_offsets_byte_len
    }
}

impl<T> Clone for LookupListMarker<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for LookupListMarker<T> {}

impl<'a, T> FontRead<'a> for LookupList<'a, T> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let lookup_count: u16 = cursor.read()?;
        let lookup_offsets_byte_len = (lookup_count as usize)
            .checked_mul(Offset16::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(lookup_offsets_byte_len);
        cursor.finish(LookupListMarker {
            lookup_offsets_byte_len,
            offset_type: PhantomData,
        })
    }
}

pub type LookupList<'a, T> = TableRef<'a, LookupListMarker<T>>;

impl<'a, T> LookupList<'a, T> {
    pub fn lookup_count(&self) -> u16 {
        let range = self.shape.lookup_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of offsets to Lookup tables, from beginning of LookupList
    pub fn lookup_offsets(&self) -> &'a [BigEndian<Offset16>] {
        let range = self.shape.lookup_offsets_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

impl<'a, T: FontRead<'a> + 'a> LookupList<'a, T> {
    pub fn lookups(&self) -> impl Iterator<Item = Result<T, ReadError>> + 'a {
        let data = self.data;
        self.lookup_offsets()
            .iter()
            .map(move |offset| offset.get().resolve(data))
    }

    pub fn get(&self, index: usize) -> Result<T, ReadError> {
        self.lookup_offsets()
            .get(index)
            .ok_or(ReadError::OutOfBounds)
            .and_then(|offset| offset.get().resolve(self.data))
    }
}

/// [Lookup Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-table)
///
/// `T` is the type of the subtables.
#[derive(Debug)]
#[doc(hidden)]
pub struct LookupMarker<T = ()> {
    subtable_offsets_byte_len: usize,
    mark_filtering_set_byte_start: Option<usize>,
    offset_type: PhantomData<fn() -> T>,
}

impl<T> LookupMarker<T> {
    fn lookup_type_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn lookup_flag_byte_range(&self) -> Range<usize> {
        let start = self.lookup_type_byte_range().end;
        start..start + LookupFlag::RAW_BYTE_LEN
    }

    fn sub_table_count_byte_range(&self) -> Range<usize> {
        let start = self.lookup_flag_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn subtable_offsets_byte_range(&self) -> Range<usize> {
        let start = self.sub_table_count_byte_range().end;
        start..start + self.subtable_offsets_byte_len
    }

    fn mark_filtering_set_byte_range(&self) -> Option<Range<usize>> {
        let start = self.mark_filtering_set_byte_start?;
        Some(start..start + u16::RAW_BYTE_LEN)
    }
}

impl<T> Clone for LookupMarker<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for LookupMarker<T> {}

impl<'a, T> FontRead<'a> for Lookup<'a, T> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let lookup_flag: LookupFlag = cursor.read()?;
        let sub_table_count: u16 = cursor.read()?;
        let subtable_offsets_byte_len = (sub_table_count as usize)
            .checked_mul(Offset16::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(subtable_offsets_byte_len);
        let mark_filtering_set_byte_start = lookup_flag
            .use_mark_filtering_set()
            .then(|| cursor.position())
            .transpose()?;
        if mark_filtering_set_byte_start.is_some() {
            cursor.advance::<u16>();
        }
        cursor.finish(LookupMarker {
            subtable_offsets_byte_len,
            mark_filtering_set_byte_start,
            offset_type: PhantomData,
        })
    }
}

pub type Lookup<'a, T> = TableRef<'a, LookupMarker<T>>;

impl<'a, T> Lookup<'a, T> {
    /// Different enumerations for GSUB and GPOS
    pub fn lookup_type(&self) -> u16 {
        let range = self.shape.lookup_type_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn lookup_flag(&self) -> LookupFlag {
        let range = self.shape.lookup_flag_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn sub_table_count(&self) -> u16 {
        let range = self.shape.sub_table_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of offsets to lookup subtables, from beginning of Lookup table
    pub fn subtable_offsets(&self) -> &'a [BigEndian<Offset16>] {
        let range = self.shape.subtable_offsets_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }

    /// Index (base 0) into GDEF mark glyph sets structure, present only if
    /// the `USE_MARK_FILTERING_SET` flag is set.
    pub fn mark_filtering_set(&self) -> Option<u16> {
        let range = self.shape.mark_filtering_set_byte_range()?;
        Some(self.data.read_at(range.start).unwrap_or_default())
    }

    /// The same lookup, with the subtable type erased.
    pub fn of_unit_type(&self) -> Lookup<'a, ()> {
        TableRef {
            shape: LookupMarker {
                subtable_offsets_byte_len: self.shape.subtable_offsets_byte_len,
                mark_filtering_set_byte_start: self.shape.mark_filtering_set_byte_start,
                offset_type: PhantomData,
            },
            data: self.data,
        }
    }
}

impl<'a, T: FontRead<'a> + 'a> Lookup<'a, T> {
    pub fn subtables(&self) -> impl Iterator<Item = Result<T, ReadError>> + 'a {
        let data = self.data;
        self.subtable_offsets()
            .iter()
            .map(move |offset| offset.get().resolve(data))
    }

    pub fn get_subtable(&self, offset: Offset16) -> Result<T, ReadError> {
        self.resolve_offset(offset)
    }
}

impl Format<u16> for CoverageFormat1Marker {
    const FORMAT: u16 = 1;
}

/// [Coverage Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-1)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct CoverageFormat1Marker {
    glyph_array_byte_len: usize,
}

impl CoverageFormat1Marker {
    fn coverage_format_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn glyph_count_byte_range(&self) -> Range<usize> {
        let start = self.coverage_format_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn glyph_array_byte_range(&self) -> Range<usize> {
        let start = self.glyph_count_byte_range().end;
        start..start + self.glyph_array_byte_len
    }
}

impl<'a> FontRead<'a> for CoverageFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let glyph_count: u16 = cursor.read()?;
        let glyph_array_byte_len = (glyph_count as usize)
            .checked_mul(GlyphId16::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(glyph_array_byte_len);
        cursor.finish(CoverageFormat1Marker {
            glyph_array_byte_len,
        })
    }
}

pub type CoverageFormat1<'a> = TableRef<'a, CoverageFormat1Marker>;

impl<'a> CoverageFormat1<'a> {
    /// Format identifier, format = 1
    pub fn coverage_format(&self) -> u16 {
        let range = self.shape.coverage_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Number of glyphs in the glyph array
    pub fn glyph_count(&self) -> u16 {
        let range = self.shape.glyph_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of glyph IDs, in numerical order
    pub fn glyph_array(&self) -> &'a [BigEndian<GlyphId16>] {
        let range = self.shape.glyph_array_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

impl Format<u16> for CoverageFormat2Marker {
    const FORMAT: u16 = 2;
}

/// [Coverage Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-2)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct CoverageFormat2Marker {
    range_records_byte_len: usize,
}

impl CoverageFormat2Marker {
    fn coverage_format_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn range_count_byte_range(&self) -> Range<usize> {
        let start = self.coverage_format_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn range_records_byte_range(&self) -> Range<usize> {
        let start = self.range_count_byte_range().end;
        start..start + self.range_records_byte_len
    }
}

impl<'a> FontRead<'a> for CoverageFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let range_count: u16 = cursor.read()?;
        let range_records_byte_len = (range_count as usize)
            .checked_mul(RangeRecord::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(range_records_byte_len);
        cursor.finish(CoverageFormat2Marker {
            range_records_byte_len,
        })
    }
}

pub type CoverageFormat2<'a> = TableRef<'a, CoverageFormat2Marker>;

impl<'a> CoverageFormat2<'a> {
    /// Format identifier, format = 2
    pub fn coverage_format(&self) -> u16 {
        let range = self.shape.coverage_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Number of RangeRecords
    pub fn range_count(&self) -> u16 {
        let range = self.shape.range_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of glyph ranges, ordered by startGlyphID.
    pub fn range_records(&self) -> &'a [RangeRecord] {
        let range = self.shape.range_records_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

/// Used in [CoverageFormat2]
#[derive(Clone, Debug, Copy, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct RangeRecord {
    pub start_glyph_id: BigEndian<GlyphId16>,
    pub end_glyph_id: BigEndian<GlyphId16>,
    /// Coverage Index of first glyph ID in range
    pub start_coverage_index: BigEndian<u16>,
}

impl RangeRecord {
    pub fn start_glyph_id(&self) -> GlyphId16 {
        self.start_glyph_id.get()
    }

    pub fn end_glyph_id(&self) -> GlyphId16 {
        self.end_glyph_id.get()
    }

    pub fn start_coverage_index(&self) -> u16 {
        self.start_coverage_index.get()
    }

    fn iter(&self) -> impl Iterator<Item = GlyphId16> {
        (self.start_glyph_id().to_u16()..=self.end_glyph_id().to_u16()).map(GlyphId16::new)
    }
}

impl FixedSize for RangeRecord {
    const RAW_BYTE_LEN: usize = GlyphId16::RAW_BYTE_LEN * 2 + u16::RAW_BYTE_LEN;
}

/// [Coverage Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table)
#[derive(Clone)]
pub enum CoverageTable<'a> {
    Format1(CoverageFormat1<'a>),
    Format2(CoverageFormat2<'a>),
}

impl<'a> FormatRecord<'a> for CoverageTable<'a> {
    fn select(data: FontData<'a>, selector: u16) -> Option<Result<Self, ReadError>> {
        match selector {
            CoverageFormat1Marker::FORMAT => Some(FontRead::read(data).map(Self::Format1)),
            CoverageFormat2Marker::FORMAT => Some(FontRead::read(data).map(Self::Format2)),
            _ => None,
        }
    }
}

format_record_font_read!(CoverageTable);

impl<'a> CoverageTable<'a> {
    /// The glyphs in this coverage, in coverage index order.
    pub fn iter(&self) -> impl Iterator<Item = GlyphId16> + 'a {
        // all one expression so that we have a single return type
        let (iter1, iter2) = match self {
            CoverageTable::Format1(t) => (Some(t.glyph_array().iter().map(|g| g.get())), None),
            CoverageTable::Format2(t) => {
                let iter = t.range_records().iter().flat_map(RangeRecord::iter);
                (None, Some(iter))
            }
        };

        iter1
            .into_iter()
            .flatten()
            .chain(iter2.into_iter().flatten())
    }

    /// The coverage index of `gid`, if it is covered.
    pub fn get(&self, gid: GlyphId16) -> Option<u16> {
        match self {
            CoverageTable::Format1(t) => t
                .glyph_array()
                .binary_search_by(|g| g.get().cmp(&gid))
                .ok()
                .map(|idx| idx as _),
            CoverageTable::Format2(t) => {
                let records = t.range_records();
                let idx = records
                    .binary_search_by(|rec| {
                        if rec.end_glyph_id() < gid {
                            std::cmp::Ordering::Less
                        } else if rec.start_glyph_id() > gid {
                            std::cmp::Ordering::Greater
                        } else {
                            std::cmp::Ordering::Equal
                        }
                    })
                    .ok()?;
                let rec = &records[idx];
                Some(rec.start_coverage_index() + gid.to_u16() - rec.start_glyph_id().to_u16())
            }
        }
    }

    /// The number of glyphs covered.
    pub fn population(&self) -> usize {
        match self {
            CoverageTable::Format1(t) => t.glyph_count() as usize,
            CoverageTable::Format2(t) => t
                .range_records()
                .iter()
                .map(|rec| {
                    (rec.end_glyph_id().to_u16() as usize + 1)
                        .saturating_sub(rec.start_glyph_id().to_u16() as usize)
                })
                .sum(),
        }
    }
}

impl std::fmt::Debug for CoverageTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format1(table) => table.fmt(f),
            Self::Format2(table) => table.fmt(f),
        }
    }
}

impl Format<u16> for ClassDefFormat1Marker {
    const FORMAT: u16 = 1;
}

/// [Class Definition Table Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table-format-1)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct ClassDefFormat1Marker {
    class_value_array_byte_len: usize,
}

impl ClassDefFormat1Marker {
    fn class_format_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn start_glyph_id_byte_range(&self) -> Range<usize> {
        let start = self.class_format_byte_range().end;
        start..start + GlyphId16::RAW_BYTE_LEN
    }

    fn glyph_count_byte_range(&self) -> Range<usize> {
        let start = self.start_glyph_id_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn class_value_array_byte_range(&self) -> Range<usize> {
        let start = self.glyph_count_byte_range().end;
        start..start + self.class_value_array_byte_len
    }
}

impl<'a> FontRead<'a> for ClassDefFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<GlyphId16>();
        let glyph_count: u16 = cursor.read()?;
        let class_value_array_byte_len = (glyph_count as usize)
            .checked_mul(u16::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(class_value_array_byte_len);
        cursor.finish(ClassDefFormat1Marker {
            class_value_array_byte_len,
        })
    }
}

pub type ClassDefFormat1<'a> = TableRef<'a, ClassDefFormat1Marker>;

impl<'a> ClassDefFormat1<'a> {
    pub fn class_format(&self) -> u16 {
        let range = self.shape.class_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// First glyph ID of the classValueArray
    pub fn start_glyph_id(&self) -> GlyphId16 {
        let range = self.shape.start_glyph_id_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn glyph_count(&self) -> u16 {
        let range = self.shape.glyph_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of Class Values, one per glyph ID
    pub fn class_value_array(&self) -> &'a [BigEndian<u16>] {
        let range = self.shape.class_value_array_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

impl Format<u16> for ClassDefFormat2Marker {
    const FORMAT: u16 = 2;
}

/// [Class Definition Table Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table-format-2)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct ClassDefFormat2Marker {
    class_range_records_byte_len: usize,
}

impl ClassDefFormat2Marker {
    fn class_format_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn class_range_count_byte_range(&self) -> Range<usize> {
        let start = self.class_format_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn class_range_records_byte_range(&self) -> Range<usize> {
        let start = self.class_range_count_byte_range().end;
        start..start + self.class_range_records_byte_len
    }
}

impl<'a> FontRead<'a> for ClassDefFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let class_range_count: u16 = cursor.read()?;
        let class_range_records_byte_len = (class_range_count as usize)
            .checked_mul(ClassRangeRecord::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(class_range_records_byte_len);
        cursor.finish(ClassDefFormat2Marker {
            class_range_records_byte_len,
        })
    }
}

pub type ClassDefFormat2<'a> = TableRef<'a, ClassDefFormat2Marker>;

impl<'a> ClassDefFormat2<'a> {
    pub fn class_format(&self) -> u16 {
        let range = self.shape.class_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn class_range_count(&self) -> u16 {
        let range = self.shape.class_range_count_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of ClassRangeRecords, ordered by startGlyphID
    pub fn class_range_records(&self) -> &'a [ClassRangeRecord] {
        let range = self.shape.class_range_records_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

/// Used in [ClassDefFormat2]
#[derive(Clone, Debug, Copy, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct ClassRangeRecord {
    pub start_glyph_id: BigEndian<GlyphId16>,
    pub end_glyph_id: BigEndian<GlyphId16>,
    pub class: BigEndian<u16>,
}

impl ClassRangeRecord {
    pub fn start_glyph_id(&self) -> GlyphId16 {
        self.start_glyph_id.get()
    }

    pub fn end_glyph_id(&self) -> GlyphId16 {
        self.end_glyph_id.get()
    }

    pub fn class(&self) -> u16 {
        self.class.get()
    }
}

impl FixedSize for ClassRangeRecord {
    const RAW_BYTE_LEN: usize = GlyphId16::RAW_BYTE_LEN * 2 + u16::RAW_BYTE_LEN;
}

/// A [Class Definition Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table)
#[derive(Clone)]
pub enum ClassDef<'a> {
    Format1(ClassDefFormat1<'a>),
    Format2(ClassDefFormat2<'a>),
}

impl<'a> FormatRecord<'a> for ClassDef<'a> {
    fn select(data: FontData<'a>, selector: u16) -> Option<Result<Self, ReadError>> {
        match selector {
            ClassDefFormat1Marker::FORMAT => Some(FontRead::read(data).map(Self::Format1)),
            ClassDefFormat2Marker::FORMAT => Some(FontRead::read(data).map(Self::Format2)),
            _ => None,
        }
    }
}

format_record_font_read!(ClassDef);

impl<'a> ClassDef<'a> {
    /// Get the class for this glyph id; glyphs not listed are class 0.
    pub fn get(&self, gid: GlyphId16) -> u16 {
        match self {
            ClassDef::Format1(t) => {
                let idx = gid.to_u16().wrapping_sub(t.start_glyph_id().to_u16());
                t.class_value_array()
                    .get(idx as usize)
                    .map(|class| class.get())
                    .unwrap_or(0)
            }
            ClassDef::Format2(t) => t
                .class_range_records()
                .iter()
                .find(|rec| rec.start_glyph_id() <= gid && rec.end_glyph_id() >= gid)
                .map(|rec| rec.class())
                .unwrap_or(0),
        }
    }

    /// Iterate over each glyph and its class; class 0 glyphs are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (GlyphId16, u16)> + 'a {
        let (one, two) = match self {
            ClassDef::Format1(t) => {
                let start = t.start_glyph_id().to_u16();
                let iter = t
                    .class_value_array()
                    .iter()
                    .enumerate()
                    .map(move |(i, class)| {
                        (GlyphId16::new(start.saturating_add(i as u16)), class.get())
                    });
                (Some(iter), None)
            }
            ClassDef::Format2(t) => {
                let iter = t.class_range_records().iter().flat_map(|rec| {
                    let class = rec.class();
                    (rec.start_glyph_id().to_u16()..=rec.end_glyph_id().to_u16())
                        .map(move |gid| (GlyphId16::new(gid), class))
                });
                (None, Some(iter))
            }
        };
        one.into_iter()
            .flatten()
            .chain(two.into_iter().flatten())
            .filter(|(_, class)| *class != 0)
    }
}

impl std::fmt::Debug for ClassDef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format1(table) => table.fmt(f),
            Self::Format2(table) => table.fmt(f),
        }
    }
}

/// The number of u16 words holding the deltas of a [`Device`] table.
///
/// Unknown formats hold no deltas.
pub(crate) fn delta_value_count(start_size: u16, end_size: u16, delta_format: u16) -> usize {
    let range_len = end_size.saturating_add(1).saturating_sub(start_size) as usize;
    let values_per_word = match delta_format {
        1 => 8,
        2 => 4,
        3 => 2,
        _ => return 0,
    };
    range_len.div_ceil(values_per_word)
}

/// [Device Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#device-and-variationindex-tables)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct DeviceMarker {
    delta_value_byte_len: usize,
}

impl DeviceMarker {
    fn start_size_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn end_size_byte_range(&self) -> Range<usize> {
        let start = self.start_size_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn delta_format_byte_range(&self) -> Range<usize> {
        let start = self.end_size_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn delta_value_byte_range(&self) -> Range<usize> {
        let start = self.delta_format_byte_range().end;
        start..start + self.delta_value_byte_len
    }
}

impl<'a> FontRead<'a> for Device<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let start_size: u16 = cursor.read()?;
        let end_size: u16 = cursor.read()?;
        let delta_format: u16 = cursor.read()?;
        let delta_value_byte_len = delta_value_count(start_size, end_size, delta_format)
            .checked_mul(u16::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        cursor.advance_by(delta_value_byte_len);
        cursor.finish(DeviceMarker {
            delta_value_byte_len,
        })
    }
}

pub type Device<'a> = TableRef<'a, DeviceMarker>;

impl<'a> Device<'a> {
    /// Smallest size to correct, in ppem
    pub fn start_size(&self) -> u16 {
        let range = self.shape.start_size_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Largest size to correct, in ppem
    pub fn end_size(&self) -> u16 {
        let range = self.shape.end_size_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    pub fn delta_format(&self) -> u16 {
        let range = self.shape.delta_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Array of compressed data
    pub fn delta_value(&self) -> &'a [BigEndian<u16>] {
        let range = self.shape.delta_value_byte_range();
        self.data.read_array(range).unwrap_or_default()
    }
}

/// Variation index table
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct VariationIndexMarker;

impl Format<u16> for VariationIndexMarker {
    const FORMAT: u16 = 0x8000;
}

impl VariationIndexMarker {
    fn delta_set_outer_index_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + u16::RAW_BYTE_LEN
    }

    fn delta_set_inner_index_byte_range(&self) -> Range<usize> {
        let start = self.delta_set_outer_index_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    fn delta_format_byte_range(&self) -> Range<usize> {
        let start = self.delta_set_inner_index_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }
}

impl<'a> FontRead<'a> for VariationIndex<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        cursor.advance::<u16>();
        cursor.advance::<u16>();
        cursor.finish(VariationIndexMarker)
    }
}

pub type VariationIndex<'a> = TableRef<'a, VariationIndexMarker>;

impl<'a> VariationIndex<'a> {
    /// A delta-set outer index, used to select an item variation data subtable
    pub fn delta_set_outer_index(&self) -> u16 {
        let range = self.shape.delta_set_outer_index_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// A delta-set inner index, used to select a delta-set row
    pub fn delta_set_inner_index(&self) -> u16 {
        let range = self.shape.delta_set_inner_index_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// Format, = 0x8000
    pub fn delta_format(&self) -> u16 {
        let range = self.shape.delta_format_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }
}

/// Either a [`Device`] or a [`VariationIndex`], told apart by the
/// `deltaFormat` field at byte 4.
#[derive(Clone)]
pub enum DeviceOrVariationIndex<'a> {
    Device(Device<'a>),
    VariationIndex(VariationIndex<'a>),
}

impl<'a> FormatRecord<'a> for DeviceOrVariationIndex<'a> {
    const SELECTOR_POS: usize = 4;

    fn select(data: FontData<'a>, selector: u16) -> Option<Result<Self, ReadError>> {
        match selector {
            1..=3 => Some(Device::read(data).map(Self::Device)),
            VariationIndexMarker::FORMAT => {
                Some(VariationIndex::read(data).map(Self::VariationIndex))
            }
            _ => None,
        }
    }
}

format_record_font_read!(DeviceOrVariationIndex);

impl std::fmt::Debug for DeviceOrVariationIndex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device(table) => table.fmt(f),
            Self::VariationIndex(table) => table.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use sfnt_test_data::{be_buffer, bebuffer::BeBuffer, gpos};

    #[test]
    fn coverage_format1() {
        let buf = be_buffer! { 1u16, 3u16, [2u16, 5, 9] };
        let coverage = CoverageTable::read(FontData::new(&buf)).unwrap();
        assert_eq!(coverage.get(GlyphId16::new(5)), Some(1));
        assert_eq!(coverage.get(GlyphId16::new(6)), None);
        assert_eq!(coverage.population(), 3);
        assert_eq!(
            coverage.iter().map(|g| g.to_u16()).collect::<Vec<_>>(),
            [2, 5, 9]
        );
    }

    #[test]
    fn coverage_format2() {
        let buf = be_buffer! { 2u16, 2u16, [4u16, 6, 0], [10u16, 11, 3] };
        let coverage = CoverageTable::read(FontData::new(&buf)).unwrap();
        assert_eq!(coverage.get(GlyphId16::new(4)), Some(0));
        assert_eq!(coverage.get(GlyphId16::new(11)), Some(4));
        assert_eq!(coverage.get(GlyphId16::new(8)), None);
        assert_eq!(coverage.population(), 5);
    }

    #[test]
    fn unknown_coverage_format() {
        let buf = be_buffer! { 3u16, 0u16 };
        assert_eq!(
            CoverageTable::read(FontData::new(&buf)).err(),
            Some(ReadError::InvalidFormat(3))
        );
    }

    #[rstest]
    #[case::format1(be_buffer! { 1u16, 20u16, 3u16, [1u16, 0, 2] })]
    #[case::format2(be_buffer! { 2u16, 2u16, [20u16, 20, 1], [22u16, 22, 2] })]
    fn class_def(#[case] buf: BeBuffer) {
        let class_def = ClassDef::read(FontData::new(&buf)).unwrap();
        assert_eq!(class_def.get(GlyphId16::new(20)), 1);
        assert_eq!(class_def.get(GlyphId16::new(21)), 0);
        assert_eq!(class_def.get(GlyphId16::new(22)), 2);
        assert_eq!(class_def.get(GlyphId16::new(400)), 0);
        assert_eq!(
            class_def.iter().map(|(g, c)| (g.to_u16(), c)).collect::<Vec<_>>(),
            [(20, 1), (22, 2)]
        );
    }

    #[test]
    fn device_delta_len() {
        // sizes 11..=15 at 2 bits per value fit in one word
        let buf = be_buffer! { 11u16, 15u16, 1u16, 0x5540u16 };
        let device = DeviceOrVariationIndex::read(FontData::new(&buf)).unwrap();
        let DeviceOrVariationIndex::Device(device) = device else {
            panic!("expected device");
        };
        assert_eq!(device.delta_value().len(), 1);

        let buf = be_buffer! { 11u16, 15u16, 3u16, 0u16 };
        assert!(Device::read(FontData::new(&buf)).is_err());
    }

    #[test]
    fn variation_index() {
        let buf = be_buffer! { 1u16, 7u16, 0x8000u16 };
        let table = DeviceOrVariationIndex::read(FontData::new(&buf)).unwrap();
        let DeviceOrVariationIndex::VariationIndex(table) = table else {
            panic!("expected variation index");
        };
        assert_eq!(table.delta_set_inner_index(), 7);
    }

    #[test]
    fn script_and_feature_lists() {
        let scripts = ScriptList::read(FontData::new(gpos::SCRIPT_LIST)).unwrap();
        let record = &scripts.script_records()[0];
        assert_eq!(record.script_tag(), Tag::new(b"DFLT"));
        let script = record.script(scripts.offset_data()).unwrap();
        let lang_sys = script.default_lang_sys().unwrap().unwrap();
        assert_eq!(lang_sys.required_feature_index(), 0xFFFF);
        assert_eq!(lang_sys.feature_indices()[0].get(), 0);

        let features = FeatureList::read(FontData::new(gpos::FEATURE_LIST)).unwrap();
        let record = &features.feature_records()[0];
        assert_eq!(record.feature_tag(), Tag::new(b"kern"));
        let feature = record.feature(features.offset_data()).unwrap();
        assert!(feature.feature_params_offset().offset().is_null());
        assert_eq!(feature.lookup_list_indices().len(), 3);
    }

    #[rstest]
    #[case::size(b"size", true)]
    #[case::stylistic_set(b"ss07", true)]
    #[case::character_variant(b"cv01", true)]
    #[case::kern(b"kern", false)]
    fn feature_params_follow_the_tag(#[case] tag: &[u8; 4], #[case] known: bool) {
        let buf = be_buffer! {
            4u16, 0u16,
            [1u16, 2, 3, 4, 5, 6],
            1u16,
            (Uint24::new(0x1F600))
        };
        let feature = Feature::read_with_args(FontData::new(&buf), &Tag::new(tag)).unwrap();
        assert_eq!(feature.feature_tag(), Tag::new(tag));
        let params = feature.feature_params().unwrap();
        assert_eq!(params.is_ok(), known);
        match params {
            Ok(FeatureParams::Size(size)) => {
                assert_eq!(size.design_size(), 1);
                assert_eq!(size.range_end(), 5);
            }
            Ok(FeatureParams::StylisticSet(set)) => assert_eq!(set.ui_name_id(), 2),
            Ok(FeatureParams::CharacterVariant(cv)) => {
                assert_eq!(cv.feat_ui_label_name_id(), 2);
                assert_eq!(cv.char_count(), 1);
                assert_eq!(cv.character()[0].get(), Uint24::new(0x1F600));
            }
            Err(_) => (),
        }
    }

    #[test]
    fn lookup_with_mark_filtering_set() {
        let buf = be_buffer! { 1u16, 0x0010u16, 1u16, 10u16, 7u16 };
        let lookup = Lookup::<()>::read(FontData::new(&buf)).unwrap();
        assert_eq!(lookup.mark_filtering_set(), Some(7));
        assert_eq!(lookup.subtable_offsets().len(), 1);

        // flag says there's a set, but the data ends early
        let buf = be_buffer! { 1u16, 0x0010u16, 1u16, 10u16 };
        assert!(Lookup::<()>::read(FontData::new(&buf)).is_err());
    }
}
