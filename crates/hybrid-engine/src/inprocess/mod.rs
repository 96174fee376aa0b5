//! In-process fallback implementations, grounded on
//! `migration_assistant/performance/fallback.py`'s `PythonFallbackEngine`.

mod checksum;
mod compress;
mod copy;
mod stats;

pub use checksum::calculate_checksums;
pub use compress::{compress_file, decompress_file};
pub use copy::copy_file;
pub use stats::get_system_stats;
