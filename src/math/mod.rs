//! Mathematical utilities: polynomial evaluation and linear interpolation.

pub mod interp;
pub mod poly;

pub use interp::*;
pub use poly::*;
