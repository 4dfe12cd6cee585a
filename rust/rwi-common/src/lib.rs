//! Core definitions (error taxonomy and result helpers), relied upon by all rwi-* crates.

pub mod error;
pub mod result;

pub use result::Result;
