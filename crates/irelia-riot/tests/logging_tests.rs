//! The global subscriber can only be installed once per process, so every
//! logging assertion lives in this one test binary.

use irelia_riot::logging::{self, LogConfig};
use tempfile::TempDir;

#[test]
fn test_file_logging_and_single_install() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs").join("RiotAPI.log");

    let config = LogConfig {
        debug: true,
        file: Some(log_path.clone()),
        ..LogConfig::default()
    };
    logging::init(&config).unwrap();

    tracing::debug!("cache warmed for faker");
    tracing::info!("fetching 3 key(s) from matches");

    let written = std::fs::read_to_string(&log_path).unwrap();
    assert!(written.contains("cache warmed for faker"));
    assert!(written.contains("fetching 3 key(s) from matches"));

    let second = logging::init(&LogConfig::default());
    assert!(second.is_err());
}
