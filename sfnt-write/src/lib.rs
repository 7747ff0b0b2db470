//! Writing sfnt font tables
//!
//! This crate compiles in-memory representations of font tables into their
//! binary form. Each table is serialized into a graph of subtables joined by
//! offsets; that graph is then packed, finding an order for the subtables such
//! that every offset is small enough to be encoded in its field.
//!
//! Most graphs pack trivially. Large `GPOS` tables may not: when a pair
//! adjustment or mark-to-base subtable grows beyond what a 16-bit offset can
//! reach, it is split into several subtables, and lookups may be moved
//! behind extension subtables, so that the final table is still valid.
//!
//! # Example
//!
//! ```
//! use sfnt_write::{
//!     tables::maxp::Maxp,
//!     types::Tag,
//!     FontBuilder,
//! };
//!
//! let maxp = Maxp::new(42);
//! let mut builder = FontBuilder::new();
//! builder.add_table(&maxp).unwrap();
//! let (bytes, directory) = builder.build_with_directory().unwrap();
//! assert_eq!(directory[0].tag, Tag::new(b"maxp"));
//! assert_eq!(directory[0].offset as usize, 12 + 16);
//! assert!(bytes.len() > directory[0].offset as usize);
//! ```

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
mod font_builder;
mod graph;
pub mod offsets;
pub mod table_type;
pub mod tables;
pub mod validate;
mod write;

pub use font_builder::{BuilderError, FontBuilder, TableDirectoryEntry, TopLevelTable};
pub use graph::{ObjectId, OffsetLen, Overflow, PackOptions};
pub use write::{dump_table, dump_table_with, FontWrite, OffsetLink, TableWriter, Whence};

/// Public re-export of the sfnt-types crate.
pub extern crate sfnt_types as types;

/// Public re-export of the sfnt-read crate.
pub extern crate sfnt_read as read;
