use std::path::PathBuf;
use std::time::Duration;

/// Grounded on `hybrid.py`'s `HybridPerformanceEngine.__init__` defaults
/// (`go_binary_path`, `prefer_go`) plus `engine.py`'s per-call timeout.
#[derive(Debug, Clone)]
pub struct HybridEngineConfig {
    pub helper_path: Option<PathBuf>,
    pub prefer_native: bool,
    pub fallback_on_error: bool,
    pub call_timeout: Duration,
}

impl Default for HybridEngineConfig {
    fn default() -> Self {
        Self {
            helper_path: None,
            prefer_native: true,
            fallback_on_error: true,
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl HybridEngineConfig {
    /// Search common relative locations and `PATH`, mirroring
    /// `GoPerformanceEngine._find_go_binary`.
    pub fn discover_helper(binary_name: &str) -> Option<PathBuf> {
        let candidates = [
            format!("helper/bin/{binary_name}"),
            format!("./helper/bin/{binary_name}"),
            format!("../helper/bin/{binary_name}"),
            format!("bin/{binary_name}"),
            format!("./bin/{binary_name}"),
        ];
        for candidate in candidates {
            let path = PathBuf::from(&candidate);
            if path.is_file() {
                return Some(path);
            }
        }
        which(binary_name)
    }
}

fn which(binary_name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(binary_name);
        candidate.is_file().then_some(candidate)
    })
}
