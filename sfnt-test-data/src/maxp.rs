//! maxp test data

/// Version 0.5: version and numGlyphs only.
#[rustfmt::skip]
pub static MAXP_V05: &[u8] = &[
    0x00, 0x00, 0x50, 0x00, // version 0.5
    0x00, 0x05,             // numGlyphs 5
];

#[rustfmt::skip]
pub static MAXP_V1: &[u8] = &[
    0x00, 0x01, 0x00, 0x00, // version 1.0
    0x00, 0x05,             // numGlyphs 5
    0x00, 0x40,             // maxPoints
    0x00, 0x03,             // maxContours
    0x00, 0x00,             // maxCompositePoints
    0x00, 0x00,             // maxCompositeContours
    0x00, 0x02,             // maxZones
    0x00, 0x00,             // maxTwilightPoints
    0x00, 0x10,             // maxStorage
    0x00, 0x01,             // maxFunctionDefs
    0x00, 0x00,             // maxInstructionDefs
    0x00, 0x40,             // maxStackElements
    0x00, 0x00,             // maxSizeOfInstructions
    0x00, 0x00,             // maxComponentElements
    0x00, 0x00,             // maxComponentDepth
];
