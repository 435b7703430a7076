pub mod format;

pub use format::{render, OutputShape};
