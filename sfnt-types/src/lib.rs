//! Common [scalar data types][data types] used in sfnt font files
//!
//! Everything here has a fixed big-endian encoding, described by the
//! [`Scalar`] trait and wrapped by [`BigEndian`] when stored as raw bytes.
//!
//! [data types]: https://docs.microsoft.com/en-us/typography/opentype/spec/otff#data-types

#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(all(not(feature = "std"), not(test)))]
#[macro_use]
extern crate core as std;

mod glyph_id;
mod offset;
pub mod raw;
mod tag;
mod uint24;
mod version;

pub use glyph_id::GlyphId16;
pub use offset::{Nullable, Offset16, Offset24, Offset32};
pub use raw::{BigEndian, FixedSize, Scalar};
pub use tag::{InvalidTag, Tag};
pub use uint24::{Uint24, Uint24Overflow};
pub use version::{MajorMinor, Version16Dot16};

/// The SFNT version for fonts containing TrueType outlines.
pub const TT_SFNT_VERSION: u32 = 0x00010000;
/// The SFNT version for fonts containing CFF outlines.
pub const CFF_SFNT_VERSION: u32 = 0x4F54544F;
