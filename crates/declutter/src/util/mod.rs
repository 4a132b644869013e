pub mod format;
pub mod progress;

pub use format::{format_bytes, format_duration, format_timestamp, parse_size_string};
pub use progress::{create_progress_bar, create_spinner};
