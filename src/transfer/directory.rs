use std::path::{Path, PathBuf};

use crate::error::TransferResult;
use crate::transfer::packet::validate_script_name;

pub struct ScriptDirectory {
    root: PathBuf,
}

impl ScriptDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /* Names come off the wire, so they are checked again here even if the caller already did. */
    pub fn script_path(&self, name: &str) -> TransferResult<PathBuf> {
        validate_script_name(name)?;
        Ok(self.root.join(name))
    }

    /* Starts writing `name` next to its final location. A script with the same name stays untouched
     * until the new one is committed. */
    pub async fn create_file(&self, name: &str) -> TransferResult<(PartialScript, tokio::fs::File)> {
        let target = self.script_path(name)?;
        let part_path = self.root.join(format!("{}.part", name));
        tokio::fs::create_dir_all(&self.root).await?;
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&part_path)
            .await?;
        let partial = PartialScript {
            part_path,
            target,
            committed: false,
        };
        Ok((partial, file))
    }
}

/* A script still being written. Dropping it uncommitted deletes what was written so far, which also
 * covers a transfer future dropped on shutdown. */
pub struct PartialScript {
    part_path: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl PartialScript {
    pub fn part_path(&self) -> &Path {
        &self.part_path
    }

    /* Moves the finished file over its real name. The file handle should be closed by now. */
    pub async fn commit(mut self) -> TransferResult<PathBuf> {
        tokio::fs::rename(&self.part_path, &self.target).await?;
        self.committed = true;
        Ok(std::mem::take(&mut self.target))
    }
}

impl Drop for PartialScript {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        log::debug!("Removing partial script {}", self.part_path.display());
        match std::fs::remove_file(&self.part_path) {
            Ok(()) => (),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (),
            Err(e) => log::warn!("Could not remove partial script {}: {}", self.part_path.display(), e),
        }
    }
}
