//! The [maxp](https://docs.microsoft.com/en-us/typography/opentype/spec/maxp) table

use crate::table_prelude::*;

/// 'maxp'
pub const TAG: Tag = Tag::new(b"maxp");

/// [`maxp`](https://docs.microsoft.com/en-us/typography/opentype/spec/maxp)
#[derive(Debug, Clone, Copy)]
#[doc(hidden)]
pub struct MaxpMarker {
    // the version 1.0 fields, if present
    v1_byte_start: Option<usize>,
}

impl MaxpMarker {
    /// The byte length of the fields only present in version 1.0.
    const V1_FIELDS_BYTE_LEN: usize = 13 * u16::RAW_BYTE_LEN;

    fn version_byte_range(&self) -> Range<usize> {
        let start = 0;
        start..start + Version16Dot16::RAW_BYTE_LEN
    }

    fn num_glyphs_byte_range(&self) -> Range<usize> {
        let start = self.version_byte_range().end;
        start..start + u16::RAW_BYTE_LEN
    }

    // the nth u16 after num_glyphs, in version 1.0 tables
    fn v1_field(&self, idx: usize) -> Option<usize> {
        Some(self.v1_byte_start? + idx * u16::RAW_BYTE_LEN)
    }
}

impl<'a> FontRead<'a> for Maxp<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version: Version16Dot16 = cursor.read()?;
        cursor.advance::<u16>();
        let v1_byte_start = match version {
            Version16Dot16::VERSION_0_5 => None,
            Version16Dot16::VERSION_1_0 => {
                let start = cursor.position()?;
                cursor.advance_by(MaxpMarker::V1_FIELDS_BYTE_LEN);
                Some(start)
            }
            _ => return Err(ReadError::MalformedData("unknown maxp version")),
        };
        cursor.finish(MaxpMarker { v1_byte_start })
    }
}

/// [`maxp`](https://docs.microsoft.com/en-us/typography/opentype/spec/maxp)
pub type Maxp<'a> = TableRef<'a, MaxpMarker>;

impl<'a> Maxp<'a> {
    /// The version: 0x00005000 for version 0.5, 0x00010000 for version 1.0.
    pub fn version(&self) -> Version16Dot16 {
        let range = self.shape.version_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    /// The number of glyphs in the font.
    pub fn num_glyphs(&self) -> u16 {
        let range = self.shape.num_glyphs_byte_range();
        self.data.read_at(range.start).unwrap_or_default()
    }

    fn v1_field(&self, idx: usize) -> Option<u16> {
        let pos = self.shape.v1_field(idx)?;
        Some(self.data.read_at(pos).unwrap_or_default())
    }

    /// Maximum points in a non-composite glyph.
    pub fn max_points(&self) -> Option<u16> {
        self.v1_field(0)
    }

    /// Maximum contours in a non-composite glyph.
    pub fn max_contours(&self) -> Option<u16> {
        self.v1_field(1)
    }

    /// Maximum points in a composite glyph.
    pub fn max_composite_points(&self) -> Option<u16> {
        self.v1_field(2)
    }

    /// Maximum contours in a composite glyph.
    pub fn max_composite_contours(&self) -> Option<u16> {
        self.v1_field(3)
    }

    /// 1 if instructions do not use the twilight zone (Z0), or 2 if
    /// instructions do use Z0
    pub fn max_zones(&self) -> Option<u16> {
        self.v1_field(4)
    }

    pub fn max_twilight_points(&self) -> Option<u16> {
        self.v1_field(5)
    }

    /// Number of Storage Area locations.
    pub fn max_storage(&self) -> Option<u16> {
        self.v1_field(6)
    }

    pub fn max_function_defs(&self) -> Option<u16> {
        self.v1_field(7)
    }

    pub fn max_instruction_defs(&self) -> Option<u16> {
        self.v1_field(8)
    }

    /// Maximum stack depth across Font Program ('fpgm' table), CVT Program
    /// ('prep' table) and all glyph instructions (in the 'glyf' table).
    pub fn max_stack_elements(&self) -> Option<u16> {
        self.v1_field(9)
    }

    pub fn max_size_of_instructions(&self) -> Option<u16> {
        self.v1_field(10)
    }

    pub fn max_component_elements(&self) -> Option<u16> {
        self.v1_field(11)
    }

    /// Maximum levels of recursion; 1 for simple components.
    pub fn max_component_depth(&self) -> Option<u16> {
        self.v1_field(12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfnt_test_data::maxp;

    #[test]
    fn versions() {
        let v05 = Maxp::read(FontData::new(maxp::MAXP_V05)).unwrap();
        assert_eq!(v05.version(), Version16Dot16::VERSION_0_5);
        assert_eq!(v05.num_glyphs(), 5);
        assert_eq!(v05.max_points(), None);

        let v1 = Maxp::read(FontData::new(maxp::MAXP_V1)).unwrap();
        assert_eq!(v1.max_points(), Some(0x40));
        assert_eq!(v1.max_stack_elements(), Some(0x40));
        assert_eq!(v1.max_component_depth(), Some(0));
    }

    #[test]
    fn short_v1_table() {
        assert!(Maxp::read(FontData::new(&maxp::MAXP_V1[..30])).is_err());
    }
}
