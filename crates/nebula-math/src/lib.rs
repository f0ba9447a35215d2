//! Mathematical primitives for Nebulous.

pub mod grid;
pub mod interp;
pub mod smooth;
pub mod stats;
