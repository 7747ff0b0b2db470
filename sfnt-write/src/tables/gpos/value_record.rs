//! The ValueRecord type used in the GPOS table

use super::ValueFormat;
use crate::{
    offsets::NullableOffsetMarker,
    tables::layout::DeviceOrVariationIndex,
    validate::{Validate, ValidationCtx},
    write::{FontWrite, TableWriter},
};

/// A [ValueRecord](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#valueRecord)
///
/// The adjustments to apply to a glyph's placement and advance, in design
/// units, optionally with a device or variation index table for each.
///
/// The encoded form of a record depends on which fields are present; see
/// [`ValueRecord::format`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ValueRecord {
    // Usually the format is computed from the fields that are present. A class
    // pair adjustment table needs records of a fixed shape even where two
    // classes have no adjustment, and null device offsets would otherwise be
    // dropped from the format. An explicit format overrides the computed one.
    explicit_format: Option<ValueFormat>,
    pub x_placement: Option<i16>,
    pub y_placement: Option<i16>,
    pub x_advance: Option<i16>,
    pub y_advance: Option<i16>,
    pub x_placement_device: NullableOffsetMarker<DeviceOrVariationIndex>,
    pub y_placement_device: NullableOffsetMarker<DeviceOrVariationIndex>,
    pub x_advance_device: NullableOffsetMarker<DeviceOrVariationIndex>,
    pub y_advance_device: NullableOffsetMarker<DeviceOrVariationIndex>,
}

impl ValueRecord {
    pub fn new() -> ValueRecord {
        ValueRecord::default()
    }

    pub fn with_x_placement(mut self, val: i16) -> Self {
        self.x_placement = Some(val);
        self
    }

    pub fn with_y_placement(mut self, val: i16) -> Self {
        self.y_placement = Some(val);
        self
    }

    pub fn with_x_advance(mut self, val: i16) -> Self {
        self.x_advance = Some(val);
        self
    }

    pub fn with_y_advance(mut self, val: i16) -> Self {
        self.y_advance = Some(val);
        self
    }

    pub fn with_x_placement_device(mut self, val: impl Into<DeviceOrVariationIndex>) -> Self {
        self.x_placement_device = Some(val.into()).into();
        self
    }

    pub fn with_y_placement_device(mut self, val: impl Into<DeviceOrVariationIndex>) -> Self {
        self.y_placement_device = Some(val.into()).into();
        self
    }

    pub fn with_x_advance_device(mut self, val: impl Into<DeviceOrVariationIndex>) -> Self {
        self.x_advance_device = Some(val.into()).into();
        self
    }

    pub fn with_y_advance_device(mut self, val: impl Into<DeviceOrVariationIndex>) -> Self {
        self.y_advance_device = Some(val.into()).into();
        self
    }

    pub fn with_explicit_value_format(mut self, format: ValueFormat) -> Self {
        self.set_explicit_value_format(format);
        self
    }

    /// Set an explicit ValueFormat, overriding the computed format.
    ///
    /// Use this to write explicit null offsets for any of the device or
    /// variation index tables.
    pub fn set_explicit_value_format(&mut self, format: ValueFormat) {
        self.explicit_format = Some(format)
    }

    /// The [ValueFormat] of this record.
    pub fn format(&self) -> ValueFormat {
        if let Some(format) = self.explicit_format {
            return format;
        }

        let fields = [
            (self.x_placement.is_some(), ValueFormat::X_PLACEMENT),
            (self.y_placement.is_some(), ValueFormat::Y_PLACEMENT),
            (self.x_advance.is_some(), ValueFormat::X_ADVANCE),
            (self.y_advance.is_some(), ValueFormat::Y_ADVANCE),
            (
                !self.x_placement_device.is_none(),
                ValueFormat::X_PLACEMENT_DEVICE,
            ),
            (
                !self.y_placement_device.is_none(),
                ValueFormat::Y_PLACEMENT_DEVICE,
            ),
            (
                !self.x_advance_device.is_none(),
                ValueFormat::X_ADVANCE_DEVICE,
            ),
            (
                !self.y_advance_device.is_none(),
                ValueFormat::Y_ADVANCE_DEVICE,
            ),
        ];
        fields
            .into_iter()
            .filter(|(present, _)| *present)
            .fold(ValueFormat::empty(), |acc, (_, flag)| acc | flag)
    }

    /// Return the number of bytes required to encode this value record
    pub fn encoded_size(&self) -> usize {
        self.format().record_byte_len()
    }
}

impl FontWrite for ValueRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        let format = self.format();
        macro_rules! write_field {
            ($field:expr, $flag:expr) => {
                if format.contains($flag) {
                    $field.unwrap_or_default().write_into(writer);
                }
            };
            ($field:expr, $flag:expr, off) => {
                if format.contains($flag) {
                    $field.write_into(writer);
                }
            };
        }

        write_field!(self.x_placement, ValueFormat::X_PLACEMENT);
        write_field!(self.y_placement, ValueFormat::Y_PLACEMENT);
        write_field!(self.x_advance, ValueFormat::X_ADVANCE);
        write_field!(self.y_advance, ValueFormat::Y_ADVANCE);
        write_field!(
            self.x_placement_device,
            ValueFormat::X_PLACEMENT_DEVICE,
            off
        );
        write_field!(
            self.y_placement_device,
            ValueFormat::Y_PLACEMENT_DEVICE,
            off
        );
        write_field!(self.x_advance_device, ValueFormat::X_ADVANCE_DEVICE, off);
        write_field!(self.y_advance_device, ValueFormat::Y_ADVANCE_DEVICE, off);
    }
}

impl std::fmt::Debug for ValueRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut f = f.debug_struct("ValueRecord");
        if let Some(x) = self.x_placement {
            f.field("x_placement", &x);
        }
        if let Some(y) = self.y_placement {
            f.field("y_placement", &y);
        }
        if let Some(x) = self.x_advance {
            f.field("x_advance", &x);
        }
        if let Some(y) = self.y_advance {
            f.field("y_advance", &y);
        }
        if let Some(x) = self.x_placement_device.get() {
            f.field("x_placement_device", x);
        }
        if let Some(y) = self.y_placement_device.get() {
            f.field("y_placement_device", y);
        }
        if let Some(x) = self.x_advance_device.get() {
            f.field("x_advance_device", x);
        }
        if let Some(y) = self.y_advance_device.get() {
            f.field("y_advance_device", y);
        }
        f.finish()
    }
}

impl Validate for ValueRecord {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        let format = self.format();
        let devices = [
            (&self.x_placement_device, ValueFormat::X_PLACEMENT_DEVICE),
            (&self.y_placement_device, ValueFormat::Y_PLACEMENT_DEVICE),
            (&self.x_advance_device, ValueFormat::X_ADVANCE_DEVICE),
            (&self.y_advance_device, ValueFormat::Y_ADVANCE_DEVICE),
        ];
        for (device, flag) in devices {
            if !device.is_none() && !format.contains(flag) {
                ctx.report("explicit format omits a device table that is present");
            }
            device.validate_impl(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::{FontData, FontRead};
    use types::GlyphId16;

    use crate::tables::{
        gpos::SinglePos,
        layout::{CoverageTableBuilder, Device, DeviceOrVariationIndex, VariationIndex},
    };

    use super::*;

    #[test]
    fn serialize_explicit_value_record() {
        let mut my_record = ValueRecord {
            x_advance: Some(5),
            ..Default::default()
        };
        my_record.set_explicit_value_format(ValueFormat::X_ADVANCE | ValueFormat::X_ADVANCE_DEVICE);
        let bytes = crate::dump_table(&my_record).unwrap();
        assert_eq!(bytes.len(), 4);
        assert_eq!(my_record.encoded_size(), 4);
        let read_back =
            read::tables::gpos::ValueRecord::read(FontData::new(&bytes), my_record.format())
                .unwrap();
        assert_eq!(read_back.x_advance, Some(5));
        assert!(read_back.x_advance_device.offset().is_null());
    }

    #[test]
    fn computed_format() {
        let record = ValueRecord::new()
            .with_y_placement(-3)
            .with_x_advance(12)
            .with_y_advance_device(VariationIndex::new(1, 2));
        assert_eq!(
            record.format(),
            ValueFormat::Y_PLACEMENT | ValueFormat::X_ADVANCE | ValueFormat::Y_ADVANCE_DEVICE
        );
        assert_eq!(record.encoded_size(), 6);
        assert_eq!(ValueRecord::new().format(), ValueFormat::empty());
    }

    #[test]
    fn explicit_format_must_cover_devices() {
        let record = ValueRecord::new()
            .with_x_advance_device(Device::new(10, 11, &[1, -1]))
            .with_explicit_value_format(ValueFormat::X_ADVANCE);
        assert!(record.validate().is_err());
    }

    #[test]
    fn compile_devices() {
        let _ = env_logger::builder().is_test(true).try_init();
        let coverage = CoverageTableBuilder::from_glyphs(vec![GlyphId16::new(5)]).build();
        let value_record = ValueRecord::new().with_x_advance_device(VariationIndex::new(0xff, 0xee));
        let a_table = SinglePos::format_1(coverage, value_record);

        let bytes = crate::dump_table(&a_table).unwrap();
        let read_back = read::tables::gpos::SinglePosFormat1::read(bytes.as_slice().into()).unwrap();

        assert!(!read_back.value_record().x_advance_device.offset().is_null());
        let device = read_back
            .value_record()
            .x_advance_device(read_back.offset_data())
            .unwrap()
            .unwrap();
        match device {
            read::tables::layout::DeviceOrVariationIndex::VariationIndex(idx) => {
                assert_eq!(idx.delta_set_outer_index(), 0xff);
                assert_eq!(idx.delta_set_inner_index(), 0xee);
            }
            _ => panic!("not a variation index"),
        }

        let written = match a_table {
            SinglePos::Format1(table) => table.value_record,
            SinglePos::Format2(_) => unreachable!(),
        };
        assert!(matches!(
            written.x_advance_device.get(),
            Some(DeviceOrVariationIndex::VariationIndex(_))
        ));
    }
}
