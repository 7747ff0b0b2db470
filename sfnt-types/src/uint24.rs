/// An unsigned integer stored in three bytes.
///
/// Used for 24-bit offsets and for Unicode scalar values in layout params.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::AnyBitPattern))]
#[repr(transparent)]
pub struct Uint24(u32);

/// The value did not fit in 24 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uint24Overflow(pub u32);

impl Uint24 {
    pub const MIN: Self = Uint24(0);
    pub const MAX: Self = Uint24((1 << 24) - 1);

    /// Clamp `raw` to the 24-bit range.
    pub const fn new(raw: u32) -> Uint24 {
        match Self::checked_new(raw) {
            Some(value) => value,
            None => Self::MAX,
        }
    }

    /// `None` if `raw` needs more than 24 bits.
    pub const fn checked_new(raw: u32) -> Option<Uint24> {
        if raw >> 24 == 0 {
            Some(Uint24(raw))
        } else {
            None
        }
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn to_be_bytes(self) -> [u8; 3] {
        let bytes = self.0.to_be_bytes();
        [bytes[1], bytes[2], bytes[3]]
    }

    pub const fn from_be_bytes(bytes: [u8; 3]) -> Self {
        Uint24((bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32)
    }
}

impl TryFrom<u32> for Uint24 {
    type Error = Uint24Overflow;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::checked_new(raw).ok_or(Uint24Overflow(raw))
    }
}

impl From<Uint24> for u32 {
    fn from(src: Uint24) -> u32 {
        src.to_u32()
    }
}

impl From<Uint24> for usize {
    fn from(src: Uint24) -> usize {
        src.to_u32() as usize
    }
}

impl std::fmt::Display for Uint24 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::fmt::Display for Uint24Overflow {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:#x} does not fit in 24 bits", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_clamps() {
        assert_eq!(Uint24::new(0x0100_0000), Uint24::MAX);
        assert_eq!(Uint24::new(0xff_ffff).to_u32(), 0xff_ffff);
        assert_eq!(Uint24::try_from(0x0100_0000), Err(Uint24Overflow(0x0100_0000)));
        assert_eq!(Uint24::try_from(0x1F600).map(u32::from), Ok(0x1F600));
    }

    #[test]
    fn three_byte_encoding() {
        let offset = Uint24::new(0x01_0203);
        assert_eq!(offset.to_be_bytes(), [1, 2, 3]);
        assert_eq!(Uint24::from_be_bytes([0xff, 0, 1]).to_u32(), 0xff_0001);
        assert_eq!(usize::from(Uint24::from_be_bytes([0, 0, 0])), 0);
    }
}
