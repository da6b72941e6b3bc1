//! Encoding cleaned datasets.

mod writer;

pub use writer::{OutputFormat, Writer};
