//! The [maxp](https://learn.microsoft.com/en-us/typography/opentype/spec/maxp) table

use types::{Tag, Version16Dot16};

use crate::{
    font_builder::TopLevelTable,
    table_type::TableType,
    validate::{Validate, ValidationCtx},
    write::{FontWrite, TableWriter},
};

/// The maximum profile.
///
/// The version is computed: a table with only a glyph count is written as
/// version 0.5, and setting any other field promotes it to version 1.0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Maxp {
    /// The number of glyphs in the font.
    pub num_glyphs: u16,
    pub max_points: Option<u16>,
    pub max_contours: Option<u16>,
    pub max_composite_points: Option<u16>,
    pub max_composite_contours: Option<u16>,
    pub max_zones: Option<u16>,
    pub max_twilight_points: Option<u16>,
    pub max_storage: Option<u16>,
    pub max_function_defs: Option<u16>,
    pub max_instruction_defs: Option<u16>,
    pub max_stack_elements: Option<u16>,
    pub max_size_of_instructions: Option<u16>,
    pub max_component_elements: Option<u16>,
    pub max_component_depth: Option<u16>,
}

impl Maxp {
    /// Construct a version 0.5 table
    pub fn new(num_glyphs: u16) -> Self {
        Self {
            num_glyphs,
            ..Default::default()
        }
    }

    fn version_1_fields(&self) -> [Option<u16>; 13] {
        [
            self.max_points,
            self.max_contours,
            self.max_composite_points,
            self.max_composite_contours,
            self.max_zones,
            self.max_twilight_points,
            self.max_storage,
            self.max_function_defs,
            self.max_instruction_defs,
            self.max_stack_elements,
            self.max_size_of_instructions,
            self.max_component_elements,
            self.max_component_depth,
        ]
    }

    fn compute_version(&self) -> Version16Dot16 {
        if self.version_1_fields().iter().any(Option::is_some) {
            Version16Dot16::VERSION_1_0
        } else {
            Version16Dot16::VERSION_0_5
        }
    }
}

impl FontWrite for Maxp {
    fn write_into(&self, writer: &mut TableWriter) {
        let version = self.compute_version();
        version.write_into(writer);
        self.num_glyphs.write_into(writer);
        if version == Version16Dot16::VERSION_1_0 {
            for field in self.version_1_fields() {
                field.unwrap_or_default().write_into(writer);
            }
        }
    }

    fn table_type(&self) -> TableType {
        TableType::TopLevel(Self::TAG)
    }
}

impl Validate for Maxp {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Maxp", |ctx| {
            let fields = self.version_1_fields();
            if fields.iter().any(Option::is_some) && !fields.iter().all(Option::is_some) {
                ctx.report("version 1.0 fields must all be present or all be absent");
            }
        })
    }
}

impl TopLevelTable for Maxp {
    const TAG: Tag = read::tables::maxp::TAG;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::{FontData, FontRead};

    use super::*;

    #[test]
    fn maxp_05() {
        let maxp_05 = Maxp::new(5);

        let dumped = crate::write::dump_table(&maxp_05).unwrap();
        assert_eq!(dumped.len(), 6);
        let data = FontData::new(&dumped);
        let loaded = read::tables::maxp::Maxp::read(data).unwrap();
        assert_eq!(loaded.version(), Version16Dot16::VERSION_0_5);
        assert_eq!(loaded.num_glyphs(), 5);
        assert_eq!(loaded.max_points(), None);
    }

    #[test]
    fn maxp_10() {
        let maxp_10 = Maxp {
            num_glyphs: 5,
            max_points: Some(6),
            max_contours: Some(7),
            max_composite_points: Some(8),
            max_composite_contours: Some(9),
            max_zones: Some(10),
            max_twilight_points: Some(11),
            max_storage: Some(12),
            max_function_defs: Some(13),
            max_instruction_defs: Some(14),
            max_stack_elements: Some(15),
            max_size_of_instructions: Some(16),
            max_component_elements: Some(17),
            max_component_depth: Some(18),
        };

        let dumped = crate::write::dump_table(&maxp_10).unwrap();
        assert_eq!(dumped.len(), 32);

        let data = FontData::new(&dumped);
        let loaded = read::tables::maxp::Maxp::read(data).unwrap();
        assert_eq!(loaded.version(), Version16Dot16::VERSION_1_0);
        assert_eq!(loaded.max_composite_contours(), Some(9));
        assert_eq!(loaded.max_zones(), Some(10));
        assert_eq!(loaded.max_component_depth(), Some(18));
    }

    #[test]
    fn partial_version_1() {
        let maxp = Maxp {
            max_zones: Some(2),
            ..Maxp::new(3)
        };
        assert!(crate::dump_table(&maxp).is_err());
    }
}
