//! The lookup flag type.
//!
//! The low byte is a set of bits, and the high byte is a mark attachment
//! class, so this is not quite a plain bit set and we implement it by hand.

/// The [LookupFlag](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookupFlag) field of a lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookupFlag(u16);

impl LookupFlag {
    pub const RIGHT_TO_LEFT: u16 = 0x0001;
    pub const IGNORE_BASE_GLYPHS: u16 = 0x0002;
    pub const IGNORE_LIGATURES: u16 = 0x0004;
    pub const IGNORE_MARKS: u16 = 0x0008;
    pub const USE_MARK_FILTERING_SET: u16 = 0x0010;
    const RESERVED: u16 = 0x00E0;
    const MARK_ATTACHMENT_TYPE: u16 = 0xFF00;

    /// Return new, empty flags
    pub fn empty() -> Self {
        Self(0)
    }

    /// Construct a LookupFlag from a raw value, discarding reserved bits
    pub fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & !Self::RESERVED)
    }

    /// Raw transmutation to u16.
    pub fn to_bits(self) -> u16 {
        self.0
    }

    fn has(self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    fn with(self, bit: u16, val: bool) -> Self {
        if val {
            Self(self.0 | bit)
        } else {
            Self(self.0 & !bit)
        }
    }

    /// Only relevant to cursive attachment (GPOS lookup type 3).
    pub fn right_to_left(self) -> bool {
        self.has(Self::RIGHT_TO_LEFT)
    }

    pub fn ignore_base_glyphs(self) -> bool {
        self.has(Self::IGNORE_BASE_GLYPHS)
    }

    pub fn ignore_ligatures(self) -> bool {
        self.has(Self::IGNORE_LIGATURES)
    }

    pub fn ignore_marks(self) -> bool {
        self.has(Self::IGNORE_MARKS)
    }

    /// If set, the lookup is followed by a `markFilteringSet` field.
    pub fn use_mark_filtering_set(self) -> bool {
        self.has(Self::USE_MARK_FILTERING_SET)
    }

    pub fn with_ignore_marks(self, val: bool) -> Self {
        self.with(Self::IGNORE_MARKS, val)
    }

    pub fn with_use_mark_filtering_set(self, val: bool) -> Self {
        self.with(Self::USE_MARK_FILTERING_SET, val)
    }

    /// The mark attachment class, if not zero.
    pub fn mark_attachment_type(self) -> Option<u8> {
        match (self.0 & Self::MARK_ATTACHMENT_TYPE) >> 8 {
            0 => None,
            class => Some(class as u8),
        }
    }

    pub fn with_mark_attachment_type(self, class: u8) -> Self {
        Self((self.0 & !Self::MARK_ATTACHMENT_TYPE) | (class as u16) << 8)
    }
}

impl types::Scalar for LookupFlag {
    type Raw = <u16 as types::Scalar>::Raw;
    fn to_raw(self) -> Self::Raw {
        types::Scalar::to_raw(self.0)
    }
    fn from_raw(raw: Self::Raw) -> Self {
        Self::from_bits_truncate(<u16 as types::Scalar>::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_bits_are_dropped() {
        let flag = LookupFlag::from_bits_truncate(0xFFFF);
        assert_eq!(flag.to_bits(), 0xFF1F);
        assert!(flag.use_mark_filtering_set());
        assert_eq!(flag.mark_attachment_type(), Some(0xFF));
    }

    #[test]
    fn mark_attachment_type_keeps_low_bits() {
        let flag = LookupFlag::empty()
            .with_ignore_marks(true)
            .with_mark_attachment_type(3);
        assert_eq!(flag.to_bits(), 0x0308);
        assert_eq!(flag.with_mark_attachment_type(0).mark_attachment_type(), None);
    }
}
