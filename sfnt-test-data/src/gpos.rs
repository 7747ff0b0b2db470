//! GPOS test data

use crate::{be_buffer, bebuffer::BeBuffer};

// https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#example-2-singleposformat1-subtable
#[rustfmt::skip]
pub static SINGLEPOSFORMAT1: &[u8] = &[
    0x00, 0x01,             // posFormat
    0x00, 0x08,             // coverageOffset
    0x00, 0x02,             // valueFormat: Y_PLACEMENT
    0xFF, 0xB0,             // yPlacement -80
    // Coverage
    0x00, 0x02,             // coverageFormat
    0x00, 0x01,             // rangeCount
    0x00, 0xB2, 0x00, 0xBB, 0x00, 0x00, // glyphs 0xB2..=0xBB, startCoverageIndex 0
];

#[rustfmt::skip]
pub static SINGLEPOSFORMAT2: &[u8] = &[
    0x00, 0x02,             // posFormat
    0x00, 0x14,             // coverageOffset
    0x00, 0x05,             // valueFormat: X_PLACEMENT | X_ADVANCE
    0x00, 0x03,             // valueCount
    0x00, 0x32, 0x00, 0x32, // valueRecord[0]
    0x00, 0x19, 0x00, 0x19, // valueRecord[1]
    0x00, 0x0A, 0x00, 0x0A, // valueRecord[2]
    // Coverage
    0x00, 0x01,             // coverageFormat
    0x00, 0x03,             // glyphCount
    0x00, 0x4F, 0x01, 0x25, 0x01, 0x29,
];

#[rustfmt::skip]
pub static PAIRPOSFORMAT1: &[u8] = &[
    0x00, 0x01,             // posFormat
    0x00, 0x0E,             // coverageOffset
    0x00, 0x04,             // valueFormat1: X_ADVANCE
    0x00, 0x01,             // valueFormat2: X_PLACEMENT
    0x00, 0x02,             // pairSetCount
    0x00, 0x16,             // pairSetOffsets[0]
    0x00, 0x1E,             // pairSetOffsets[1]
    // Coverage
    0x00, 0x01,             // coverageFormat
    0x00, 0x02,             // glyphCount
    0x00, 0x2D, 0x00, 0x31,
    // PairSet[0]
    0x00, 0x01,             // pairValueCount
    0x00, 0x59,             // secondGlyph
    0xFF, 0xE2,             // valueRecord1.xAdvance -30
    0xFF, 0xEC,             // valueRecord2.xPlacement -20
    // PairSet[1]
    0x00, 0x01,             // pairValueCount
    0x00, 0x59,             // secondGlyph
    0xFF, 0xD8,             // valueRecord1.xAdvance -40
    0xFF, 0xE7,             // valueRecord2.xPlacement -25
];

#[rustfmt::skip]
pub static PAIRPOSFORMAT2: &[u8] = &[
    0x00, 0x02,             // posFormat
    0x00, 0x18,             // coverageOffset
    0x00, 0x04,             // valueFormat1: X_ADVANCE
    0x00, 0x00,             // valueFormat2
    0x00, 0x22,             // classDef1Offset
    0x00, 0x2C,             // classDef2Offset
    0x00, 0x02,             // class1Count
    0x00, 0x02,             // class2Count
    // class1Records[0]
    0x00, 0x00,             // class2Records[0].xAdvance
    0xFF, 0xF6,             // class2Records[1].xAdvance -10
    // class1Records[1]
    0x00, 0x00,             // class2Records[0].xAdvance
    0xFF, 0xCE,             // class2Records[1].xAdvance -50
    // Coverage
    0x00, 0x01,             // coverageFormat
    0x00, 0x03,             // glyphCount
    0x00, 0x46, 0x00, 0x47, 0x00, 0x49,
    // ClassDef1
    0x00, 0x02,             // classFormat
    0x00, 0x01,             // classRangeCount
    0x00, 0x46, 0x00, 0x47, 0x00, 0x01, // 0x46..=0x47 -> class 1
    // ClassDef2
    0x00, 0x01,             // classFormat
    0x00, 0x6A,             // startGlyphID
    0x00, 0x02,             // glyphCount
    0x00, 0x01, 0x00, 0x01, // classValueArray
];

#[rustfmt::skip]
pub static MARKBASEPOSFORMAT1: &[u8] = &[
    0x00, 0x01,             // posFormat
    0x00, 0x0C,             // markCoverageOffset
    0x00, 0x14,             // baseCoverageOffset
    0x00, 0x02,             // markClassCount
    0x00, 0x1A,             // markArrayOffset
    0x00, 0x30,             // baseArrayOffset
    // mark Coverage
    0x00, 0x01,             // coverageFormat
    0x00, 0x02,             // glyphCount
    0x03, 0x33, 0x03, 0x34,
    // base Coverage
    0x00, 0x01,             // coverageFormat
    0x00, 0x01,             // glyphCount
    0x00, 0xC6,
    // MarkArray
    0x00, 0x02,             // markCount
    0x00, 0x00, 0x00, 0x0A, // markRecords[0]: class 0, anchor at 10
    0x00, 0x01, 0x00, 0x10, // markRecords[1]: class 1, anchor at 16
    // mark anchors
    0x00, 0x01, 0x01, 0x5A, 0xFF, 0xEA, // format 1, (346, -22)
    0x00, 0x01, 0x01, 0x5A, 0x05, 0x54, // format 1, (346, 1364)
    // BaseArray
    0x00, 0x01,             // baseCount
    0x00, 0x06, 0x00, 0x00, // baseRecords[0]: class 0 at 6, no class 1 anchor
    // base anchor
    0x00, 0x03,             // anchorFormat
    0x01, 0x90, 0x05, 0xDC, // (400, 1500)
    0x00, 0x00, 0x00, 0x00, // no devices
];

#[rustfmt::skip]
pub static SCRIPT_LIST: &[u8] = &[
    0x00, 0x01,             // scriptCount
    b'D', b'F', b'L', b'T', 0x00, 0x08, // scriptRecords[0]
    // Script
    0x00, 0x04,             // defaultLangSysOffset
    0x00, 0x00,             // langSysCount
    // LangSys
    0x00, 0x00,             // lookupOrderOffset
    0xFF, 0xFF,             // requiredFeatureIndex
    0x00, 0x01,             // featureIndexCount
    0x00, 0x00,             // featureIndices
];

#[rustfmt::skip]
pub static FEATURE_LIST: &[u8] = &[
    0x00, 0x01,             // featureCount
    b'k', b'e', b'r', b'n', 0x00, 0x08, // featureRecords[0]
    // Feature
    0x00, 0x00,             // featureParamsOffset
    0x00, 0x03,             // lookupIndexCount
    0x00, 0x00, 0x00, 0x01, 0x00, 0x02,
];

/// A lookup with flag 0 and the given subtables packed directly after it.
pub fn lookup(lookup_type: u16, subtables: &[&[u8]]) -> BeBuffer {
    let mut offset = 6 + 2 * subtables.len();
    let mut buf = be_buffer! { lookup_type, 0u16, (subtables.len() as u16) };
    for subtable in subtables {
        buf = buf.push(offset as u16);
        offset += subtable.len();
    }
    subtables
        .iter()
        .fold(buf, |buf, subtable| buf.extend_bytes(subtable))
}

/// An extension subtable wrapping `subtable`, which follows it directly.
pub fn extension(lookup_type: u16, subtable: &[u8]) -> BeBuffer {
    be_buffer! { 1u16, lookup_type, 8u32 }.extend_bytes(subtable)
}

/// A lookup list with the given lookups packed directly after it.
pub fn lookup_list(lookups: &[&[u8]]) -> BeBuffer {
    let mut offset = 2 + 2 * lookups.len();
    let mut buf = be_buffer! { (lookups.len() as u16) };
    for lookup in lookups {
        buf = buf.push(offset as u16);
        offset += lookup.len();
    }
    lookups
        .iter()
        .fold(buf, |buf, lookup| buf.extend_bytes(lookup))
}

/// A version 1.0 GPOS table with one single, one pair and one extension lookup.
///
/// The lookup list is the last child, so truncating the table anywhere
/// leaves at least one offset pointing past the end.
pub fn simple_gpos() -> BeBuffer {
    let single = lookup(1, &[SINGLEPOSFORMAT1, SINGLEPOSFORMAT2]);
    let pair = lookup(2, &[PAIRPOSFORMAT1]);
    let ext = extension(2, PAIRPOSFORMAT2);
    let ext = lookup(9, &[&ext]);
    let lookups = lookup_list(&[&single, &pair, &ext]);

    let script_list = 10u16;
    let feature_list = script_list + SCRIPT_LIST.len() as u16;
    let lookup_list = feature_list + FEATURE_LIST.len() as u16;
    be_buffer! { 1u16, 0u16, script_list, feature_list, lookup_list }
        .extend_bytes(SCRIPT_LIST)
        .extend_bytes(FEATURE_LIST)
        .extend_bytes(&lookups)
}
