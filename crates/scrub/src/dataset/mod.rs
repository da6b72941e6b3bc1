//! In-memory tabular data: polymorphic cell values, open rows and datasets.

mod table;
mod value;

pub use table::{Dataset, Row};
pub use value::Value;
