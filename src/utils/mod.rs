pub mod format;
pub mod table;

pub use format::{format_amount, format_date};
pub use table::Table;
