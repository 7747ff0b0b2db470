//! A GPOS ValueRecord

use types::{FixedSize, Nullable, Offset16, Scalar};

use crate::tables::layout::DeviceOrVariationIndex;
use crate::{
    ComputeSize, FontData, FontReadWithArgs, ReadArgs, ReadError, ResolveNullableOffset,
};

/// The [ValueFormat] flags, describing which fields a [`ValueRecord`] holds.
///
/// [ValueFormat]: https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#value-record
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueFormat(u16);

impl ValueFormat {
    /// Includes horizontal adjustment for placement
    pub const X_PLACEMENT: Self = Self(0x0001);
    /// Includes vertical adjustment for placement
    pub const Y_PLACEMENT: Self = Self(0x0002);
    /// Includes horizontal adjustment for advance
    pub const X_ADVANCE: Self = Self(0x0004);
    /// Includes vertical adjustment for advance
    pub const Y_ADVANCE: Self = Self(0x0008);
    /// Includes Device table (non-variable font) / VariationIndex
    /// table (variable font) for horizontal placement
    pub const X_PLACEMENT_DEVICE: Self = Self(0x0010);
    pub const Y_PLACEMENT_DEVICE: Self = Self(0x0020);
    pub const X_ADVANCE_DEVICE: Self = Self(0x0040);
    pub const Y_ADVANCE_DEVICE: Self = Self(0x0080);

    /// A mask with all the device/variation index bits set
    pub const ANY_DEVICE_OR_VARIDX: Self = Self(0x00F0);

    const ALL: u16 = 0x00FF;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Construct from raw bits, dropping the reserved ones.
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & Self::ALL)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Return the number of bytes required to store a [`ValueRecord`] in this format.
    #[inline]
    pub fn record_byte_len(self) -> usize {
        self.0.count_ones() as usize * u16::RAW_BYTE_LEN
    }
}

impl std::ops::BitOr for ValueFormat {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ValueFormat {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl std::fmt::Debug for ValueFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValueFormat(0x{:04X})", self.0)
    }
}

impl Scalar for ValueFormat {
    type Raw = <u16 as Scalar>::Raw;
    fn to_raw(self) -> Self::Raw {
        self.0.to_raw()
    }
    fn from_raw(raw: Self::Raw) -> Self {
        Self::from_bits_truncate(u16::from_raw(raw))
    }
}

/// A Positioning ValueRecord.
///
/// These are parsed by hand, since which fields are present depends on the
/// associated [`ValueFormat`].
///
/// Device offsets are relative to a table chosen by the containing record:
/// the subtable for single adjustment and class pair adjustment, and the
/// pair set for glyph pair adjustment.
#[derive(Clone, Default, Eq)]
pub struct ValueRecord {
    pub x_placement: Option<i16>,
    pub y_placement: Option<i16>,
    pub x_advance: Option<i16>,
    pub y_advance: Option<i16>,
    pub x_placement_device: Nullable<Offset16>,
    pub y_placement_device: Nullable<Offset16>,
    pub x_advance_device: Nullable<Offset16>,
    pub y_advance_device: Nullable<Offset16>,
    #[doc(hidden)]
    // exposed so that we can preserve format when we round-trip a value record
    pub format: ValueFormat,
}

// we ignore the format for the purpose of equality testing, it's redundant
impl PartialEq for ValueRecord {
    fn eq(&self, other: &Self) -> bool {
        self.x_placement == other.x_placement
            && self.y_placement == other.y_placement
            && self.x_advance == other.x_advance
            && self.y_advance == other.y_advance
            && self.x_placement_device == other.x_placement_device
            && self.y_placement_device == other.y_placement_device
            && self.x_advance_device == other.x_advance_device
            && self.y_advance_device == other.y_advance_device
    }
}

impl ValueRecord {
    pub fn read(data: FontData, format: ValueFormat) -> Result<Self, ReadError> {
        let mut this = ValueRecord {
            format,
            ..Default::default()
        };
        let mut cursor = data.cursor();

        if format.contains(ValueFormat::X_PLACEMENT) {
            this.x_placement = Some(cursor.read()?);
        }
        if format.contains(ValueFormat::Y_PLACEMENT) {
            this.y_placement = Some(cursor.read()?);
        }
        if format.contains(ValueFormat::X_ADVANCE) {
            this.x_advance = Some(cursor.read()?);
        }
        if format.contains(ValueFormat::Y_ADVANCE) {
            this.y_advance = Some(cursor.read()?);
        }
        if format.contains(ValueFormat::X_PLACEMENT_DEVICE) {
            this.x_placement_device = cursor.read()?;
        }
        if format.contains(ValueFormat::Y_PLACEMENT_DEVICE) {
            this.y_placement_device = cursor.read()?;
        }
        if format.contains(ValueFormat::X_ADVANCE_DEVICE) {
            this.x_advance_device = cursor.read()?;
        }
        if format.contains(ValueFormat::Y_ADVANCE_DEVICE) {
            this.y_advance_device = cursor.read()?;
        }
        Ok(this)
    }

    /// The format of this record, as it was read.
    pub fn format(&self) -> ValueFormat {
        self.format
    }

    /// The device offsets present in this record, in field order.
    pub fn device_offsets(&self) -> impl Iterator<Item = Nullable<Offset16>> {
        [
            self.x_placement_device,
            self.y_placement_device,
            self.x_advance_device,
            self.y_advance_device,
        ]
        .into_iter()
        .filter(|offset| !offset.offset().is_null())
    }

    /// Resolve the device table for the horizontal placement, if any.
    ///
    /// `data` is the table the offsets are relative to.
    pub fn x_placement_device<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.x_placement_device.resolve(data)
    }

    pub fn y_placement_device<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.y_placement_device.resolve(data)
    }

    pub fn x_advance_device<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.x_advance_device.resolve(data)
    }

    pub fn y_advance_device<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.y_advance_device.resolve(data)
    }
}

impl ReadArgs for ValueRecord {
    type Args = ValueFormat;
}

impl<'a> FontReadWithArgs<'a> for ValueRecord {
    fn read_with_args(data: FontData<'a>, args: &Self::Args) -> Result<Self, ReadError> {
        ValueRecord::read(data, *args)
    }
}

impl ComputeSize for ValueRecord {
    #[inline]
    fn compute_size(args: &ValueFormat) -> usize {
        args.record_byte_len()
    }
}

impl std::fmt::Debug for ValueRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut f = f.debug_struct("ValueRecord");
        self.x_placement.map(|x| f.field("x_placement", &x));
        self.y_placement.map(|y| f.field("y_placement", &y));
        self.x_advance.map(|x| f.field("x_advance", &x));
        self.y_advance.map(|y| f.field("y_advance", &y));
        for (name, offset) in [
            ("x_placement_device", self.x_placement_device),
            ("y_placement_device", self.y_placement_device),
            ("x_advance_device", self.x_advance_device),
            ("y_advance_device", self.y_advance_device),
        ] {
            if !offset.offset().is_null() {
                f.field(name, offset.offset());
            }
        }
        f.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfnt_test_data::be_buffer;

    #[test]
    fn sanity_check_format_const() {
        let format = ValueFormat::X_ADVANCE_DEVICE
            | ValueFormat::Y_ADVANCE_DEVICE
            | ValueFormat::Y_PLACEMENT_DEVICE
            | ValueFormat::X_PLACEMENT_DEVICE;
        assert_eq!(format, ValueFormat::ANY_DEVICE_OR_VARIDX);
        assert_eq!(format.record_byte_len(), 4 * 2);
        assert_eq!(ValueFormat::from_bits_truncate(0xFF01).bits(), 1);
    }

    #[test]
    fn fields_follow_format_order() {
        let buf = be_buffer! { (-5i16), 12u16, 0u16 };
        let format = ValueFormat::X_PLACEMENT | ValueFormat::X_ADVANCE_DEVICE;
        let record = ValueRecord::read(FontData::new(&buf), format).unwrap();
        assert_eq!(record.x_placement, Some(-5));
        assert_eq!(record.x_advance, None);
        assert_eq!(record.x_advance_device.offset().to_u32(), 12);
        assert_eq!(record.device_offsets().count(), 1);
        assert!(ValueRecord::read(FontData::new(&buf[..3]), format).is_err());
    }
}
