//! Offsets to tables

use crate::{Scalar, Uint24};

/// An offset of a given width for which NULL (zero) is a valid value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Nullable<T>(T);

macro_rules! impl_offset {
    ($name:ident, $bits:literal, $rawty:ty) => {
        #[doc = concat!("A", stringify!($bits), "-bit offset to a table.")]
        ///
        /// Specific offset fields may or may not permit NULL values; however we
        /// assume that errors are possible, and expect the caller to handle
        /// the `None` case.
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name($rawty);

        impl $name {
            /// Create a new offset.
            #[inline]
            pub fn new(raw: $rawty) -> Self {
                Self(raw)
            }

            /// Return `true` if this offset is null.
            #[inline]
            pub fn is_null(self) -> bool {
                self.to_u32() == 0
            }

            /// Return the offset as a u32.
            #[inline]
            pub fn to_u32(self) -> u32 {
                self.0.into()
            }
        }

        impl Scalar for $name {
            type Raw = <$rawty as Scalar>::Raw;
            fn from_raw(raw: Self::Raw) -> Self {
                $name(<$rawty>::from_raw(raw))
            }

            fn to_raw(self) -> Self::Raw {
                self.0.to_raw()
            }
        }

        impl Scalar for Nullable<$name> {
            type Raw = <$rawty as Scalar>::Raw;
            fn from_raw(raw: Self::Raw) -> Self {
                Nullable($name::from_raw(raw))
            }

            fn to_raw(self) -> Self::Raw {
                self.0.to_raw()
            }
        }

        impl From<$name> for Nullable<$name> {
            fn from(src: $name) -> Self {
                Nullable(src)
            }
        }

        impl PartialEq<u32> for $name {
            fn eq(&self, other: &u32) -> bool {
                self.to_u32() == *other
            }
        }
    };
}

impl_offset!(Offset16, 16, u16);
impl_offset!(Offset24, 24, Uint24);
impl_offset!(Offset32, 32, u32);

impl<T> Nullable<T> {
    /// Return a reference to the inner offset.
    #[inline]
    pub fn offset(&self) -> &T {
        &self.0
    }
}

impl<T: PartialEq<u32>> PartialEq<u32> for Nullable<T> {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedSize;

    #[test]
    fn offset_widths() {
        assert_eq!(Offset16::RAW_BYTE_LEN, 2);
        assert_eq!(Offset24::RAW_BYTE_LEN, 3);
        assert_eq!(Offset32::RAW_BYTE_LEN, 4);
        assert_eq!(Nullable::<Offset16>::RAW_BYTE_LEN, 2);
    }

    #[test]
    fn null_offsets() {
        assert!(Offset16::new(0).is_null());
        assert!(!Offset24::new(Uint24::new(7)).is_null());
        let nullable = Nullable::<Offset32>::read(&[0, 0, 1, 0]).unwrap();
        assert_eq!(nullable, 256);
        assert_eq!(Offset32::read(&[0, 0, 1, 0]).unwrap().to_u32(), 256);
    }
}
