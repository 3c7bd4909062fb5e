use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use notion_mentions::{
    Block, BlockKind, Checkpoint, CheckpointStore, MemoryStore, Migrator, Reference, Run,
    WalkOptions,
};

fn reference(name: &str) -> Run {
    Run::Reference(Reference::category(name, Default::default()))
}

// Workspace P, C (one listing batch each with page_size=1):
//   P: A "See [[Projects]] and [[Ideas]]" -> child B "plain text"
//   C: D "[[Projects]]"
fn workspace() -> MemoryStore {
    let mut s = MemoryStore::new().with_page_size(1);
    s.add_page("P", Some("Journal"));
    s.add_page("C", Some("Inbox"));
    s.add_block(
        "P",
        Block::text(
            "A",
            BlockKind::Paragraph,
            vec![Run::text("See [[Projects]] and [[Ideas]]")],
        ),
    );
    s.add_block(
        "A",
        Block::text("B", BlockKind::BulletedListItem, vec![Run::text("plain text")]),
    );
    s.add_block(
        "C",
        Block::text("D", BlockKind::Heading2, vec![Run::text("[[Projects]]")]),
    );
    s
}

#[test]
fn migrates_whole_workspace_and_saves_null_cursor() -> Result<()> {
    let root = unique_root("e2e");
    fs::create_dir_all(&root)?;
    let cp = CheckpointStore::open(root.join("cursor_metadata.json"));

    let mut m = Migrator::new(workspace(), cp.clone(), WalkOptions::default());
    let report = m.run()?;

    assert_eq!(report.batches, 2);
    assert_eq!(report.pages, 2);
    assert_eq!(report.stats.visited, 3);
    assert_eq!(report.stats.rewritten, 2);
    assert_eq!(report.stats.references, 3);

    let store = m.store();
    assert_eq!(
        store.block("A").unwrap().runs().unwrap(),
        &[
            Run::text("See "),
            reference("Projects"),
            Run::text(" and "),
            reference("Ideas"),
        ]
    );
    assert_eq!(
        store.block("B").unwrap().runs().unwrap(),
        &[Run::text("plain text")]
    );
    assert_eq!(store.block("D").unwrap().runs().unwrap(), &[reference("Projects")]);

    // B had nothing to rewrite: exactly two updates, A before D.
    let updated: Vec<&str> = store.updates().iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(updated, vec!["A", "D"]);

    // last batch had no next cursor: the file holds null, i.e. the start
    let v: serde_json::Value = serde_json::from_slice(&fs::read(cp.path())?)?;
    assert_eq!(v, serde_json::json!({ "cursor": null }));
    assert_eq!(cp.load(), Checkpoint::Fresh);
    Ok(())
}

#[test]
fn null_cursor_file_starts_from_first_page() -> Result<()> {
    let root = unique_root("e2e-null");
    fs::create_dir_all(&root)?;
    let path = root.join("cursor_metadata.json");
    fs::write(&path, br#"{"cursor": null}"#)?;

    let mut m = Migrator::new(workspace(), CheckpointStore::open(&path), WalkOptions::default());
    let report = m.run()?;
    assert_eq!(report.resumed_from, None);
    assert_eq!(m.store().page_requests()[0], None);
    assert_eq!(report.pages, 2);
    assert_eq!(report.batches, 2);
    assert_eq!(report.stats.rewritten, 2);
    assert_eq!(m.store().updates().len(), 2);
    Ok(())
}

#[test]
fn second_full_run_rewrites_nothing() -> Result<()> {
    let root = unique_root("e2e-idem");
    fs::create_dir_all(&root)?;
    let cp = CheckpointStore::open(root.join("cursor_metadata.json"));

    let mut m = Migrator::new(workspace(), cp.clone(), WalkOptions::default());
    m.run()?;
    let after_first: Vec<Block> = ["A", "B", "D"]
        .iter()
        .map(|id| m.store().block(id).cloned().unwrap())
        .collect();

    // no reset needed: the saved null cursor starts over
    m.store_mut().clear_log();
    let report = m.run()?;

    assert_eq!(report.stats.visited, 3);
    assert_eq!(report.stats.rewritten, 0);
    assert!(m.store().updates().is_empty());
    for b in &after_first {
        assert_eq!(m.store().block(&b.id), Some(b));
    }
    Ok(())
}

#[test]
fn dry_run_writes_neither_blocks_nor_checkpoint() -> Result<()> {
    let root = unique_root("e2e-dry");
    fs::create_dir_all(&root)?;
    let cp = CheckpointStore::open(root.join("cursor_metadata.json"));

    let mut m = Migrator::new(workspace(), cp.clone(), WalkOptions { dry_run: true });
    let report = m.run()?;

    assert!(report.dry_run);
    assert_eq!(report.stats.rewritten, 2);
    assert_eq!(report.stats.references, 3);
    assert!(m.store().updates().is_empty());
    assert_eq!(
        m.store().block("A").unwrap().runs().unwrap(),
        &[Run::text("See [[Projects]] and [[Ideas]]")]
    );
    assert!(!cp.path().exists());
    assert_eq!(cp.load(), Checkpoint::Fresh);
    Ok(())
}

#[test]
fn empty_workspace_finishes_immediately() -> Result<()> {
    let root = unique_root("e2e-empty");
    fs::create_dir_all(&root)?;
    let cp = CheckpointStore::open(root.join("cursor_metadata.json"));

    let mut m = Migrator::new(MemoryStore::new(), cp.clone(), WalkOptions::default());
    let report = m.run()?;
    assert_eq!(report.batches, 1);
    assert_eq!(report.pages, 0);
    assert!(cp.path().exists());
    assert_eq!(cp.load(), Checkpoint::Fresh);
    Ok(())
}

#[test]
fn process_page_ignores_checkpoint() -> Result<()> {
    let root = unique_root("e2e-page");
    fs::create_dir_all(&root)?;
    let cp = CheckpointStore::open(root.join("cursor_metadata.json"));
    cp.save(Some("1"))?;

    let mut m = Migrator::new(workspace(), cp.clone(), WalkOptions::default());
    let stats = m.process_page("C")?;
    assert_eq!(stats.visited, 1);
    assert_eq!(stats.references, 1);
    assert!(m.store().page_requests().is_empty());
    assert_eq!(cp.load(), Checkpoint::Resume("1".into()));
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
