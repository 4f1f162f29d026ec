//! Integration tests for the journal bridge against real shell scripts.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::Duration;
use taskflow_journal::{JournalBridge, JournalEntry, JournalReply, Period};

/// Script file under the temp dir, removed when dropped.
struct Script(PathBuf);

impl Script {
    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Script {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn script(name: &str, body: &str) -> Script {
    let path = std::env::temp_dir().join(format!(
        "taskflow-journal-{}-{}.sh",
        name,
        std::process::id()
    ));
    std::fs::write(&path, body).unwrap();
    Script(path)
}

fn entry() -> JournalEntry {
    JournalEntry {
        morning: Period::new("09:00", "12:00").with_content("wrote tests"),
        ..Default::default()
    }
}

// =============================================================================
// Successful exchanges
// =============================================================================

#[tokio::test]
async fn test_script_receives_payload() {
    let file = script(
        "echo",
        r#"case "$1" in
  *'"morning"'*'wrote tests'*) echo '{"success": true, "message": "saved"}' ;;
  *) echo '{"success": false, "message": "bad payload"}' ;;
esac
"#,
    );

    let reply = JournalBridge::new("sh", file.path()).save(&entry()).await;
    assert_eq!(
        reply,
        JournalReply {
            success: true,
            message: Some("saved".to_string())
        }
    );
}

#[tokio::test]
async fn test_failure_reply_passes_through() {
    let file = script(
        "refuse",
        "echo '{\"success\": false, \"message\": \"disk full\"}'\nexit 1\n",
    );

    let reply = JournalBridge::new("sh", file.path()).save(&entry()).await;
    assert!(!reply.success);
    assert_eq!(reply.message.as_deref(), Some("disk full"));
}

// =============================================================================
// Broken collaborators
// =============================================================================

#[tokio::test]
async fn test_garbage_output() {
    let file = script("garbage", "echo 'not json at all'\n");
    let reply = JournalBridge::new("sh", file.path()).save(&entry()).await;
    assert_eq!(reply, JournalReply::parse_failure());
}

#[tokio::test]
async fn test_silent_script() {
    let file = script("silent", "exit 0\n");
    let reply = JournalBridge::new("sh", file.path()).save(&entry()).await;
    assert_eq!(reply, JournalReply::parse_failure());
}

#[test]
fn test_script_file_removed_on_drop() {
    let file = script("cleanup", "exit 0\n");
    let path = file.path().to_path_buf();
    assert!(path.exists());
    drop(file);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_missing_program() {
    let reply = JournalBridge::new("taskflow-no-such-interpreter", "journal.py")
        .save(&entry())
        .await;
    assert_eq!(reply, JournalReply::parse_failure());
}

#[tokio::test]
async fn test_timeout() {
    let file = script("sleepy", "sleep 5\necho '{\"success\": true}'\n");
    let reply = JournalBridge::new("sh", file.path())
        .with_timeout(Duration::from_millis(100))
        .save(&entry())
        .await;
    assert_eq!(reply, JournalReply::parse_failure());
}
