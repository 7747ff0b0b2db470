//! The various font tables

pub mod font;
pub mod gpos;
pub mod layout;
pub mod maxp;
