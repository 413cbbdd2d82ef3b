pub mod fs;

pub use fs::{ensure_dir, file_exists, safe_join};
