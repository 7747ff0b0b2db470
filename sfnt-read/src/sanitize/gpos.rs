//! Sanitizing GPOS.

use types::{FixedSize, MajorMinor};

use super::{Sanitize, SanitizeContext, SanitizeError};
use crate::tables::gpos::{
    AnchorTable, BaseArray, ClassDef, CoverageTable, DeviceOrVariationIndex, ExtensionPosFormat1,
    FeatureList, Gpos, MarkArray, MarkBasePosFormat1, PairPos, PairPosFormat1, PairPosFormat2,
    PairSet, PositionLookup, PositionLookupList, ScriptList, SinglePos, SinglePosFormat1,
    SinglePosFormat2, ValueFormat, ValueRecord, EXTENSION_LOOKUP_TYPE,
};
use crate::{FontData, Offset};

impl<'a> Sanitize<'a> for Gpos<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        let data = self.offset_data();
        ctx.visit_table::<ScriptList>(data, self.script_list_offset())?;
        ctx.visit_table::<FeatureList>(data, self.feature_list_offset())?;
        ctx.visit_table::<PositionLookupList>(data, self.lookup_list_offset())?;
        // the variations table is not modeled; check its header
        if let Some(offset) = self
            .feature_variations_offset()
            .and_then(|offset| offset.offset().non_null())
        {
            ctx.check_range(data, offset, MajorMinor::RAW_BYTE_LEN + u32::RAW_BYTE_LEN)?;
        }
        Ok(())
    }
}

impl<'a> Sanitize<'a> for PositionLookup<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        match self {
            PositionLookup::Single(lookup) => lookup.sanitize_with(ctx),
            PositionLookup::Pair(lookup) => lookup.sanitize_with(ctx),
            PositionLookup::MarkToBase(lookup) => lookup.sanitize_with(ctx),
            PositionLookup::Extension(lookup) => {
                lookup.sanitize_with(ctx)?;
                // every subtable of an extension lookup wraps the same type
                let mut wrapped_type = None;
                for subtable in lookup.subtables() {
                    let Ok(subtable) = subtable else {
                        continue;
                    };
                    let this_type = subtable.extension_lookup_type();
                    if *wrapped_type.get_or_insert(this_type) != this_type {
                        return Err(SanitizeError::Malformed {
                            offset: ctx.relative(lookup.offset_data(), 0),
                            reason: "extension subtables of different types",
                        });
                    }
                }
                Ok(())
            }
            PositionLookup::Other(lookup) => {
                let data = lookup.offset_data();
                for offset in lookup.subtable_offsets() {
                    if let Some(offset) = offset.get().non_null() {
                        ctx.check_range(data, offset, u16::RAW_BYTE_LEN)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl<'a> Sanitize<'a> for SinglePos<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        match self {
            SinglePos::Format1(table) => table.sanitize_with(ctx),
            SinglePos::Format2(table) => table.sanitize_with(ctx),
        }
    }
}

impl<'a> Sanitize<'a> for SinglePosFormat1<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        ctx.visit_format::<CoverageTable>(self.offset_data(), self.coverage_offset())?;
        sanitize_devices(ctx, self.offset_data(), &self.value_record())
    }
}

impl<'a> Sanitize<'a> for SinglePosFormat2<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        let data = self.offset_data();
        ctx.visit_format::<CoverageTable>(data, self.coverage_offset())?;
        if !has_devices(self.value_format()) {
            return Ok(());
        }
        for record in self.value_records().iter() {
            match record {
                Ok(record) => sanitize_devices(ctx, data, &record)?,
                Err(e) => ctx.read_error(data, e)?,
            }
        }
        Ok(())
    }
}

impl<'a> Sanitize<'a> for PairPos<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        match self {
            PairPos::Format1(table) => table.sanitize_with(ctx),
            PairPos::Format2(table) => table.sanitize_with(ctx),
        }
    }
}

impl<'a> Sanitize<'a> for PairPosFormat1<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        let data = self.offset_data();
        ctx.visit_format::<CoverageTable>(data, self.coverage_offset())?;
        let args = (self.value_format1(), self.value_format2());
        for offset in self.pair_set_offsets() {
            ctx.visit_table_with_args::<PairSet>(data, offset.get(), &args)?;
        }
        Ok(())
    }
}

// device offsets in a pair set are relative to the pair set
impl<'a> Sanitize<'a> for PairSet<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        if !has_devices(self.value_format1()) && !has_devices(self.value_format2()) {
            return Ok(());
        }
        let data = self.offset_data();
        for record in self.pair_value_records().iter() {
            match record {
                Ok(record) => {
                    sanitize_devices(ctx, data, &record.value_record1)?;
                    sanitize_devices(ctx, data, &record.value_record2)?;
                }
                Err(e) => ctx.read_error(data, e)?,
            }
        }
        Ok(())
    }
}

impl<'a> Sanitize<'a> for PairPosFormat2<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        let data = self.offset_data();
        ctx.visit_format::<CoverageTable>(data, self.coverage_offset())?;
        ctx.visit_format::<ClassDef>(data, self.class_def1_offset())?;
        ctx.visit_format::<ClassDef>(data, self.class_def2_offset())?;
        if !has_devices(self.value_format1()) && !has_devices(self.value_format2()) {
            return Ok(());
        }
        for class1 in self.class1_records().iter() {
            let class1 = match class1 {
                Ok(class1) => class1,
                Err(e) => {
                    ctx.read_error(data, e)?;
                    continue;
                }
            };
            for class2 in class1.class2_records().iter() {
                match class2 {
                    Ok(record) => {
                        sanitize_devices(ctx, data, &record.value_record1)?;
                        sanitize_devices(ctx, data, &record.value_record2)?;
                    }
                    Err(e) => ctx.read_error(data, e)?,
                }
            }
        }
        Ok(())
    }
}

impl<'a> Sanitize<'a> for MarkBasePosFormat1<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        let data = self.offset_data();
        ctx.visit_format::<CoverageTable>(data, self.mark_coverage_offset())?;
        ctx.visit_format::<CoverageTable>(data, self.base_coverage_offset())?;
        ctx.visit_table::<MarkArray>(data, self.mark_array_offset())?;
        ctx.visit_table_with_args::<BaseArray>(
            data,
            self.base_array_offset(),
            &self.mark_class_count(),
        )
    }
}

impl<'a> Sanitize<'a> for MarkArray<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        for record in self.mark_records() {
            ctx.visit_format::<AnchorTable>(self.offset_data(), record.mark_anchor_offset())?;
        }
        Ok(())
    }
}

impl<'a> Sanitize<'a> for BaseArray<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        let data = self.offset_data();
        for record in self.base_records().iter() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    ctx.read_error(data, e)?;
                    continue;
                }
            };
            for offset in record.base_anchor_offsets() {
                ctx.visit_format::<AnchorTable>(data, *offset.get().offset())?;
            }
        }
        Ok(())
    }
}

impl<'a> Sanitize<'a> for AnchorTable<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        if let AnchorTable::Format3(table) = self {
            let data = table.offset_data();
            ctx.visit_format::<DeviceOrVariationIndex>(data, *table.x_device_offset().offset())?;
            ctx.visit_format::<DeviceOrVariationIndex>(data, *table.y_device_offset().offset())?;
        }
        Ok(())
    }
}

impl<'a> Sanitize<'a> for ExtensionPosFormat1<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        let data = self.offset_data();
        let offset = self.extension_offset();
        match self.extension_lookup_type() {
            1 => ctx.visit_format::<SinglePos>(data, offset),
            2 => ctx.visit_format::<PairPos>(data, offset),
            4 => ctx.visit_format::<MarkBasePosFormat1>(data, offset),
            EXTENSION_LOOKUP_TYPE => Err(SanitizeError::Malformed {
                offset: ctx.relative(data, 0),
                reason: "extension subtable wraps another extension",
            }),
            // other subtables are opaque, but must have a readable format
            _ => match offset.non_null() {
                Some(offset) => ctx.check_range(data, offset, u16::RAW_BYTE_LEN),
                None => Ok(()),
            },
        }
    }
}

fn has_devices(format: ValueFormat) -> bool {
    format.intersects(ValueFormat::ANY_DEVICE_OR_VARIDX)
}

fn sanitize_devices<'a>(
    ctx: &mut SanitizeContext<'a>,
    base: FontData<'a>,
    record: &ValueRecord,
) -> Result<(), SanitizeError> {
    for offset in record.device_offsets() {
        ctx.visit_format::<DeviceOrVariationIndex>(base, *offset.offset())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::SanitizeOptions;
    use crate::FontRead;
    use sfnt_test_data::{be_buffer, gpos as gpos_data};

    fn check<'a, T: FontRead<'a> + Sanitize<'a>>(data: &'a [u8]) -> Result<(), SanitizeError> {
        let data = FontData::new(data);
        SanitizeContext::new(data, &SanitizeOptions::default()).visit::<T>(data)
    }

    #[test]
    fn well_formed_subtables() {
        assert_eq!(check::<SinglePos>(gpos_data::SINGLEPOSFORMAT1), Ok(()));
        assert_eq!(check::<SinglePos>(gpos_data::SINGLEPOSFORMAT2), Ok(()));
        assert_eq!(check::<PairPos>(gpos_data::PAIRPOSFORMAT1), Ok(()));
        assert_eq!(check::<PairPos>(gpos_data::PAIRPOSFORMAT2), Ok(()));
        assert_eq!(
            check::<MarkBasePosFormat1>(gpos_data::MARKBASEPOSFORMAT1),
            Ok(())
        );
    }

    #[test]
    fn truncated_base_anchor() {
        // cut off the last base anchor, a format 3 table
        let data = gpos_data::MARKBASEPOSFORMAT1;
        let truncated = &data[..data.len() - 4];
        assert!(matches!(
            check::<MarkBasePosFormat1>(truncated),
            Err(SanitizeError::Truncation { .. })
        ));
    }

    #[test]
    fn base_records_use_mark_class_count() {
        // claiming three mark classes makes the base record run past the
        // end of the data
        let mut data = gpos_data::MARKBASEPOSFORMAT1.to_vec();
        data[7] = 3;
        let base_array = 0x30;
        data.truncate(base_array + 6);
        assert!(check::<MarkBasePosFormat1>(&data).is_err());
    }

    #[test]
    fn pair_set_devices_are_relative_to_pair_set() {
        // one pair set at 12, with a single record whose x placement device
        // is at 8 from the pair set (but 20 from the subtable)
        let buf = be_buffer! {
            1u16, 0u16, 0x0010u16, 0u16, 1u16, 12u16,
            // pair set
            1u16, 5u16, 8u16, 0u16,
            // device: sizes 12..=12, format 1, one word of deltas
            12u16, 12u16, 1u16, 0u16
        };
        assert_eq!(check::<PairPos>(&buf), Ok(()));
        // the same device offset from the subtable would be past the end
        let buf = be_buffer! {
            1u16, 0u16, 0x0010u16, 0u16, 1u16, 12u16,
            1u16, 5u16, 20u16, 0u16,
            12u16, 12u16, 1u16, 0u16
        };
        assert!(check::<PairPos>(&buf).is_err());
    }

    #[test]
    fn class_pair_devices_are_checked() {
        // no coverage or class defs, one class of each, a device at 0x80
        let buf = be_buffer! {
            2u16, 0u16, 0x0010u16, 0u16, 0u16, 0u16, 1u16, 1u16, 0x80u16
        };
        assert!(matches!(
            check::<PairPos>(&buf),
            Err(SanitizeError::Truncation { .. })
        ));
    }

    #[test]
    fn extension_wrapping_unknown_type() {
        // a cursive attachment subtable is opaque
        let ext = gpos_data::extension(3, &[0, 1, 0, 0]);
        assert_eq!(check::<ExtensionPosFormat1>(&ext), Ok(()));
        let ext = be_buffer! { 1u16, 3u16, 0x100u32 };
        assert!(check::<ExtensionPosFormat1>(&ext).is_err());
    }

    #[test]
    fn unknown_gpos_version_is_not_inspected() {
        let buf = be_buffer! { 2u16, 0u16, 0xFFu16, 0xFFu16, 0xFFu16 };
        assert_eq!(check::<Gpos>(&buf), Ok(()));
    }
}
