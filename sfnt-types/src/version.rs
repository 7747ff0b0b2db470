//! Table version numbers.

use crate::Scalar;

/// Packed 32-bit value with major and minor version numbers.
///
/// This is the legacy encoding used by `maxp`, where version 0.5 is stored
/// as `0x00005000`.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version16Dot16(u32);

/// A major, minor version pair, stored as two consecutive u16s.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MajorMinor {
    /// The major version number
    pub major: u16,
    /// The minor version number
    pub minor: u16,
}

impl Version16Dot16 {
    /// Version 0.5
    pub const VERSION_0_5: Version16Dot16 = Version16Dot16::new(0, 5);
    /// Version 1.0
    pub const VERSION_1_0: Version16Dot16 = Version16Dot16::new(1, 0);

    /// Create a new version with the provided major and minor parts.
    ///
    /// # Panics
    ///
    /// Panics if `minor > 9`.
    pub const fn new(major: u16, minor: u16) -> Self {
        assert!(minor < 10, "minor version must be in the range [0, 9]");
        Version16Dot16((major as u32) << 16 | (minor as u32) << 12)
    }

    /// Return the separate major & minor version numbers.
    pub const fn to_major_minor(self) -> (u16, u16) {
        let major = (self.0 >> 16) as u16;
        let minor = ((self.0 & 0xFFFF) >> 12) as u16;
        (major, minor)
    }

    /// The representation of this version as a big-endian byte array.
    #[inline]
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

crate::newtype_scalar!(Version16Dot16, [u8; 4]);

impl MajorMinor {
    /// Version 1.0
    pub const VERSION_1_0: MajorMinor = MajorMinor::new(1, 0);
    /// Version 1.1
    pub const VERSION_1_1: MajorMinor = MajorMinor::new(1, 1);

    /// Create a new version with major and minor parts.
    #[inline]
    pub const fn new(major: u16, minor: u16) -> Self {
        MajorMinor { major, minor }
    }

    /// The representation of this version as a big-endian byte array.
    #[inline]
    pub const fn to_be_bytes(self) -> [u8; 4] {
        let [a, b] = self.major.to_be_bytes();
        let [c, d] = self.minor.to_be_bytes();
        [a, b, c, d]
    }

    /// `true` if the major versions match and `self.minor >= other.minor`
    #[inline]
    pub const fn compatible(self, other: MajorMinor) -> bool {
        self.major == other.major && self.minor >= other.minor
    }
}

impl Scalar for MajorMinor {
    type Raw = [u8; 4];

    fn from_raw(raw: Self::Raw) -> Self {
        let [a, b, c, d] = raw;
        MajorMinor::new(u16::from_be_bytes([a, b]), u16::from_be_bytes([c, d]))
    }

    fn to_raw(self) -> Self::Raw {
        let [a, b] = self.major.to_be_bytes();
        let [c, d] = self.minor.to_be_bytes();
        [a, b, c, d]
    }
}

impl std::fmt::Debug for Version16Dot16 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Version16Dot16({:08x})", self.0)
    }
}

impl std::fmt::Display for Version16Dot16 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (major, minor) = self.to_major_minor();
        write!(f, "{major}.{minor}")
    }
}

impl std::fmt::Display for MajorMinor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_version_packing() {
        assert_eq!(Version16Dot16::VERSION_0_5.to_be_bytes(), [0, 0, 0x50, 0]);
        assert_eq!(Version16Dot16::VERSION_1_0.to_be_bytes(), [0, 1, 0, 0]);
        assert_eq!(Version16Dot16::new(1, 1).to_major_minor(), (1, 1));
    }

    #[test]
    fn major_minor_bytes() {
        let version = MajorMinor::VERSION_1_1;
        assert_eq!(version.to_raw(), [0, 1, 0, 1]);
        assert_eq!(version.to_be_bytes(), version.to_raw());
        assert_eq!(MajorMinor::new(0x102, 3).to_be_bytes(), [1, 2, 0, 3]);
        assert_eq!(MajorMinor::from_raw([0, 1, 0, 0]), MajorMinor::VERSION_1_0);
        assert!(version.compatible(MajorMinor::VERSION_1_0));
        assert!(!MajorMinor::VERSION_1_0.compatible(version));
    }
}
