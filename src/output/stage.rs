//! Staged output writes with an atomic commit.
//!
//! Everything a pass produces is written into a sibling staging directory
//! (`.<output>.staging`). Only `commit()` swaps it into place; dropping an
//! uncommitted stage removes it, so failed or cancelled passes leave the
//! destination untouched.

use anyhow::{Context, Result};
use jwalk::WalkDir;
use std::fs;
use std::path::{Path, PathBuf};

/// A staging directory for one build pass.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagingDir {
    /// Create a fresh staging directory next to `target`.
    ///
    /// A leftover stage from an interrupted run is removed first.
    pub fn create(target: &Path) -> Result<Self> {
        let path = sibling(target, "staging");
        if path.exists() {
            fs::remove_dir_all(&path)
                .with_context(|| format!("failed to remove stale stage {}", path.display()))?;
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create stage {}", path.display()))?;

        Ok(Self {
            path,
            target: target.to_path_buf(),
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy the current destination into the stage.
    ///
    /// Used when the output is not cleaned: files the pass does not produce
    /// survive the commit.
    pub fn carry_over(&self) -> Result<usize> {
        if !self.target.is_dir() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(&self.target).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let source = entry.path();
            let rel = source.strip_prefix(&self.target)?;
            let dest = self.path.join(rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &dest)
                .with_context(|| format!("failed to carry over {}", rel.display()))?;
            copied += 1;
        }
        Ok(copied)
    }

    /// Write a file at `rel` inside the stage.
    pub fn write(&self, rel: &str, content: &[u8]) -> Result<()> {
        let dest = self.path.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, content).with_context(|| format!("failed to stage {rel}"))
    }

    /// Swap the stage into the destination.
    ///
    /// The previous destination is moved aside first and restored if the
    /// swap fails.
    pub fn commit(mut self) -> Result<()> {
        if let Some(parent) = self.target.parent() {
            fs::create_dir_all(parent)?;
        }

        let backup = sibling(&self.target, "old");
        let had_previous = self.target.exists();
        if had_previous {
            if backup.exists() {
                fs::remove_dir_all(&backup)?;
            }
            fs::rename(&self.target, &backup).with_context(|| {
                format!("failed to move aside {}", self.target.display())
            })?;
        }

        if let Err(err) = fs::rename(&self.path, &self.target) {
            let err = anyhow::Error::new(err)
                .context(format!("failed to commit {}", self.target.display()));
            return Err(if had_previous {
                restore(&backup, &self.target, err)
            } else {
                err
            });
        }

        self.committed = true;
        if had_previous {
            fs::remove_dir_all(&backup).ok();
        }
        Ok(())
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if !self.committed {
            fs::remove_dir_all(&self.path).ok();
        }
    }
}

/// Move the previous destination back after a failed swap.
///
/// A failed restore is added to `err`: the old output then only exists at
/// `backup`.
fn restore(backup: &Path, target: &Path, err: anyhow::Error) -> anyhow::Error {
    match fs::rename(backup, target) {
        Ok(()) => err,
        Err(restore_err) => err.context(format!(
            "previous output left at {}: {restore_err}",
            backup.display()
        )),
    }
}

/// `.<name>.<suffix>` next to `target`.
fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!(".{name}.{suffix}"))
}
