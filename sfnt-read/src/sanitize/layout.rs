//! Sanitizing the tables shared by GPOS and GSUB.

use super::{Sanitize, SanitizeContext, SanitizeError};
use types::FixedSize;

use crate::dispatch::FormatRecord;
use crate::{Offset, ReadError};
use crate::tables::layout::{
    ClassDef, CoverageTable, DeviceOrVariationIndex, Feature, FeatureList, LangSys, Lookup,
    LookupList, Script, ScriptList,
};

impl<'a> Sanitize<'a> for ScriptList<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        for record in self.script_records() {
            ctx.visit_table::<Script>(self.offset_data(), record.script_offset())?;
        }
        Ok(())
    }
}

impl<'a> Sanitize<'a> for Script<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        ctx.visit_table::<LangSys>(self.offset_data(), *self.default_lang_sys_offset().offset())?;
        for record in self.lang_sys_records() {
            ctx.visit_table::<LangSys>(self.offset_data(), record.lang_sys_offset())?;
        }
        Ok(())
    }
}

// feature indices are only meaningful against the feature list, and are
// checked when they are used.
impl<'a> Sanitize<'a> for LangSys<'a> {
    fn sanitize_with(&self, _ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        Ok(())
    }
}

impl<'a> Sanitize<'a> for FeatureList<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        for record in self.feature_records() {
            ctx.visit_table_with_args::<Feature>(
                self.offset_data(),
                record.feature_offset(),
                &record.feature_tag(),
            )?;
        }
        Ok(())
    }
}

impl<'a> Sanitize<'a> for Feature<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        let Some(offset) = self.feature_params_offset().offset().non_null() else {
            return Ok(());
        };
        ctx.check_range(self.offset_data(), offset, u16::RAW_BYTE_LEN)?;
        match self.feature_params() {
            // params of features without a known layout are left alone
            Some(Err(ReadError::InvalidFormat(_))) | Some(Ok(_)) | None => Ok(()),
            Some(Err(error)) => {
                let params = self.offset_data().split_off(offset).unwrap_or(self.offset_data());
                ctx.read_error(params, error)
            }
        }
    }
}

impl<'a, T> Sanitize<'a> for LookupList<'a, T>
where
    T: FormatRecord<'a> + Sanitize<'a>,
{
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        for offset in self.lookup_offsets() {
            ctx.visit_format::<T>(self.offset_data(), offset.get())?;
        }
        Ok(())
    }
}

impl<'a, T> Sanitize<'a> for Lookup<'a, T>
where
    T: FormatRecord<'a> + Sanitize<'a>,
{
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        for offset in self.subtable_offsets() {
            ctx.visit_format::<T>(self.offset_data(), offset.get())?;
        }
        Ok(())
    }
}

// coverage, class and device tables have no offsets, and reading them
// checks their arrays.
impl<'a> Sanitize<'a> for CoverageTable<'a> {
    fn sanitize_with(&self, _ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        Ok(())
    }
}

impl<'a> Sanitize<'a> for ClassDef<'a> {
    fn sanitize_with(&self, _ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        Ok(())
    }
}

impl<'a> Sanitize<'a> for DeviceOrVariationIndex<'a> {
    fn sanitize_with(&self, _ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Tag, Uint24};
    use crate::sanitize::SanitizeOptions;
    use crate::{FontData, FontRead};
    use sfnt_test_data::{be_buffer, gpos as gpos_data};

    fn check<'a, T: FontRead<'a> + Sanitize<'a>>(data: &'a [u8]) -> Result<(), SanitizeError> {
        let data = FontData::new(data);
        SanitizeContext::new(data, &SanitizeOptions::default()).visit::<T>(data)
    }

    #[test]
    fn script_and_feature_lists() {
        assert_eq!(check::<ScriptList>(gpos_data::SCRIPT_LIST), Ok(()));
        assert_eq!(check::<FeatureList>(gpos_data::FEATURE_LIST), Ok(()));
    }

    #[test]
    fn lang_sys_out_of_bounds() {
        // one script, whose default lang sys is past the end
        let buf = be_buffer! { 1u16, (Tag::new(b"DFLT")), 8u16, 0x40u16, 0u16 };
        assert!(matches!(
            check::<ScriptList>(&buf),
            Err(SanitizeError::Truncation { .. })
        ));
    }

    #[test]
    fn feature_params_must_start_inside() {
        let buf = be_buffer! { 1u16, (Tag::new(b"size")), 8u16, 0x10u16, 0u16 };
        assert!(check::<FeatureList>(&buf).is_err());
        // no known layout, so two bytes are enough
        let buf = be_buffer! { 1u16, (Tag::new(b"kern")), 8u16, 4u16, 0u16, 0u16 };
        assert_eq!(check::<FeatureList>(&buf), Ok(()));
    }

    #[test]
    fn size_params_are_checked() {
        let buf = be_buffer! {
            1u16, (Tag::new(b"size")), 8u16,
            4u16, 0u16,
            [100u16, 1, 256, 80, 120]
        };
        assert_eq!(check::<FeatureList>(&buf), Ok(()));

        // missing range_end
        let buf = be_buffer! {
            1u16, (Tag::new(b"size")), 8u16,
            4u16, 0u16,
            [100u16, 1, 256, 80]
        };
        assert!(matches!(
            check::<FeatureList>(&buf),
            Err(SanitizeError::Truncation { .. })
        ));
    }

    #[test]
    fn stylistic_set_params_are_checked() {
        let buf = be_buffer! { 1u16, (Tag::new(b"ss03")), 8u16, 4u16, 0u16, 0u16, 256u16 };
        assert_eq!(check::<FeatureList>(&buf), Ok(()));

        let buf = be_buffer! { 1u16, (Tag::new(b"ss03")), 8u16, 4u16, 0u16, 0u16 };
        assert!(matches!(
            check::<FeatureList>(&buf),
            Err(SanitizeError::Truncation { .. })
        ));
    }

    #[test]
    fn character_variant_chars_must_fit() {
        let buf = be_buffer! {
            1u16, (Tag::new(b"cv12")), 8u16,
            4u16, 0u16,
            [0u16, 256, 257, 258, 0, 0],
            2u16,
            (Uint24::new(0x61)), (Uint24::new(0x62))
        };
        assert_eq!(check::<FeatureList>(&buf), Ok(()));

        // char_count says two, but only one is present
        let buf = be_buffer! {
            1u16, (Tag::new(b"cv12")), 8u16,
            4u16, 0u16,
            [0u16, 256, 257, 258, 0, 0],
            2u16,
            (Uint24::new(0x61))
        };
        assert!(matches!(
            check::<FeatureList>(&buf),
            Err(SanitizeError::Truncation { .. })
        ));
    }

    #[test]
    fn same_feature_under_two_tags() {
        // both records share one feature, which only has room for `ss01` params
        let buf = be_buffer! {
            2u16,
            (Tag::new(b"ss01")), 14u16,
            (Tag::new(b"size")), 14u16,
            4u16, 0u16, 0u16, 256u16
        };
        assert!(matches!(
            check::<FeatureList>(&buf),
            Err(SanitizeError::Truncation { .. })
        ));
    }
}
