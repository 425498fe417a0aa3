use std::{io::Write, process::Command};

// Nothing listens on port 1, so the run fails while connecting without
// needing a database.
const UNREACHABLE_CONFIG: &str = r#"{
    "source": { "host": "127.0.0.1", "port": 1, "database": "warehouse", "user": "etl" },
    "destination": { "host": "127.0.0.1", "port": 1, "database": "mirror", "user": "etl" },
    "settings": { "connect_timeout_secs": 5 }
}"#;

#[test]
fn report_on_stdout_is_not_mixed_with_logs() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    config.write_all(UNREACHABLE_CONFIG.as_bytes()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_dbmirror"))
        .args(["replicate", "--config"])
        .arg(config.path())
        .env("RUST_LOG", "info")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("stdout is not a JSON report ({e}): {stdout}"));
    assert_eq!(report["status"], "failed");
    assert_eq!(report["failure"]["kind"], "connection_error");

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Replicating schema 'public'"));
    assert!(stderr.contains("Connection failed"));
}
