use std::fs;

use smlib::{get_default_cfg, log_with_color, tracing_setup::tracing_setup, LogColor};
use tracing::Level;

#[test]
fn test_logs_to_folder() {
    let folder = std::env::temp_dir()
        .join("shotmark-tests")
        .join(format!("logs-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&folder).unwrap();
    let mut cfg = get_default_cfg();
    cfg.set_log_folder(folder.clone());
    cfg.set_log_level(Level::WARN);
    let guard = tracing_setup(&cfg);
    log_with_color("written to the log file", LogColor::Yellow);
    log_with_color("below the configured level", LogColor::Green);
    drop(guard);
    let logs = fs::read_dir(&folder)
        .unwrap()
        .flatten()
        .filter(|de| de.file_name().to_string_lossy().starts_with("shotmark.log"))
        .map(|de| fs::read_to_string(de.path()).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].contains("written to the log file"));
    assert!(logs[0].contains("yellow"));
    assert!(!logs[0].contains("below the configured level"));
    fs::remove_dir_all(&folder).unwrap();
}
