use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use notion_mentions::{Checkpoint, CheckpointStore};

#[test]
fn missing_file_is_fresh() -> Result<()> {
    let root = unique_root("cp-missing");
    let cp = CheckpointStore::open(root.join("cursor_metadata.json"));
    assert_eq!(cp.load(), Checkpoint::Fresh);
    assert_eq!(cp.load().start_cursor(), None);
    assert!(!cp.clear()?);
    Ok(())
}

#[test]
fn save_then_load_cursor() -> Result<()> {
    let root = unique_root("cp-save");
    // parent directory is created on demand
    let cp = CheckpointStore::open(root.join("state").join("cursor_metadata.json"));

    cp.save(Some("abc-123"))?;
    assert_eq!(cp.load(), Checkpoint::Resume("abc-123".into()));
    assert_eq!(cp.load().start_cursor().as_deref(), Some("abc-123"));

    cp.save(Some("def-456"))?;
    assert_eq!(cp.load(), Checkpoint::Resume("def-456".into()));

    // no temp file left behind
    let leftovers: Vec<_> = fs::read_dir(root.join("state"))?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["cursor_metadata.json".to_string()]);
    Ok(())
}

#[test]
fn null_cursor_means_start() -> Result<()> {
    let root = unique_root("cp-null");
    fs::create_dir_all(&root)?;
    let path = root.join("cursor_metadata.json");

    fs::write(&path, br#"{"cursor": null}"#)?;
    let cp = CheckpointStore::open(&path);
    assert_eq!(cp.load(), Checkpoint::Fresh);
    assert_eq!(cp.load().start_cursor(), None);

    cp.save(Some("x"))?;
    assert_eq!(cp.load(), Checkpoint::Resume("x".into()));
    cp.save(None)?;
    assert_eq!(cp.load(), Checkpoint::Fresh);
    assert!(path.exists());
    Ok(())
}

#[test]
fn file_format_is_a_cursor_object() -> Result<()> {
    let root = unique_root("cp-format");
    let path = root.join("cursor_metadata.json");
    let cp = CheckpointStore::open(&path);
    cp.save(Some("c1"))?;

    let v: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
    assert_eq!(v, serde_json::json!({ "cursor": "c1" }));

    // hand-written files in the same shape are accepted
    fs::write(&path, br#"{"cursor":"c2"}"#)?;
    assert_eq!(cp.load(), Checkpoint::Resume("c2".into()));
    Ok(())
}

#[test]
fn unreadable_file_falls_back_to_fresh() -> Result<()> {
    let root = unique_root("cp-corrupt");
    fs::create_dir_all(&root)?;
    let path = root.join("cursor_metadata.json");
    let cp = CheckpointStore::open(&path);

    let junk_files: [&[u8]; 5] = [b"", b"{", b"[1,2]", b"{\"cursor\": 42}", b"\xff\xfe"];
    for junk in junk_files {
        fs::write(&path, junk)?;
        assert_eq!(cp.load(), Checkpoint::Fresh, "junk {:?}", junk);
    }

    // a directory in place of the file
    fs::remove_file(&path)?;
    fs::create_dir_all(&path)?;
    assert_eq!(cp.load(), Checkpoint::Fresh);
    Ok(())
}

#[test]
fn clear_removes_state() -> Result<()> {
    let root = unique_root("cp-clear");
    let cp = CheckpointStore::open(root.join("cursor_metadata.json"));
    cp.save(Some("c"))?;
    assert!(cp.clear()?);
    assert!(!cp.path().exists());
    assert_eq!(cp.load(), Checkpoint::Fresh);
    assert!(!cp.clear()?);
    Ok(())
}

// ---------- helpers ----------

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("nm-{}-{}-{}", prefix, pid, t))
}
