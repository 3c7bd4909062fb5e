//! checkpoint: курсор пагинации страниц, переживающий перезапуск.
//!
//! Формат: один JSON-объект на диске
//! {
//!   "cursor": "<string>" | null
//! }
//!
//! Семантика:
//! - файла нет                  -> Checkpoint::Fresh (начать с начала);
//! - "cursor": null             -> Checkpoint::Fresh (тоже начало);
//! - "cursor": "<c>"            -> Checkpoint::Resume(c) (продолжить с батча c);
//! - файл не читается/битый     -> warn + Fresh.
//!
//! После последнего батча сохраняется null: следующий прогон идёт с начала
//! и ничего не пишет, если все блоки уже покрыты.
//!
//! Замечания:
//! - Запись атомарная: <file>.tmp + fsync + rename (+ fsync каталога best-effort),
//!   так что файл либо старый, либо новый целиком.
//! - Писатель один (один процесс), блокировка не берётся.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::metrics::record_checkpoint_save;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Checkpoint {
    Fresh,
    Resume(String),
}

impl Checkpoint {
    /// Cursor to start enumeration from (None for the beginning).
    pub fn start_cursor(&self) -> Option<String> {
        match self {
            Checkpoint::Resume(c) => Some(c.clone()),
            Checkpoint::Fresh => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    cursor: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "checkpoint".to_string());
        self.path.with_file_name(format!("{}.tmp", name))
    }

    /// Read the persisted state. Never fails: unreadable files mean start from scratch.
    pub fn load(&self) -> Checkpoint {
        match self.try_load() {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "checkpoint {} unreadable, starting from scratch: {:#}",
                    self.path.display(),
                    e
                );
                Checkpoint::Fresh
            }
        }
    }

    fn try_load(&self) -> Result<Checkpoint> {
        if !self.path.exists() {
            return Ok(Checkpoint::Fresh);
        }
        let bytes =
            fs::read(&self.path).with_context(|| format!("read {}", self.path.display()))?;
        let f: CheckpointFile = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse {}", self.path.display()))?;
        Ok(match f.cursor {
            Some(c) => Checkpoint::Resume(c),
            None => Checkpoint::Fresh,
        })
    }

    /// Durably replace the stored cursor. `None` is the start of the listing.
    pub fn save(&self, cursor: Option<&str>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
            }
        }
        let tmp = self.tmp_path();
        let data = serde_json::to_vec_pretty(&CheckpointFile {
            cursor: cursor.map(str::to_string),
        })
        .context("serialize checkpoint")?;

        {
            let mut f = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&tmp)
                .with_context(|| format!("open {}", tmp.display()))?;
            f.write_all(&data)
                .with_context(|| format!("write {}", tmp.display()))?;
            f.sync_all()
                .with_context(|| format!("fsync {}", tmp.display()))?;
        }

        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        let _ = fsync_parent_dir(&self.path);

        record_checkpoint_save();
        debug!("checkpoint saved: {:?}", cursor);
        Ok(())
    }

    /// Forget progress. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        let _ = fs::remove_file(self.tmp_path());
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("remove {}", self.path.display())),
        }
    }
}

// Best-effort fsync parent directory after rename (Unix only).
#[cfg(unix)]
fn fsync_parent_dir(p: &Path) -> std::io::Result<()> {
    use std::fs::File;
    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
    }
    Ok(())
}
#[cfg(not(unix))]
fn fsync_parent_dir(_p: &Path) -> std::io::Result<()> {
    Ok(())
}
