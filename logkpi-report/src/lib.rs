pub mod writer;

pub use logkpi_core::config::OutputFormat;
pub use writer::{write_atomic, write_rows};
