//! The font tables that can be written.

pub mod gpos;
pub mod layout;
pub mod maxp;
