//! Outer surfaces: request decoding and handling, and CSV import/export.

pub mod csv;
pub mod handler;
pub mod request;
