//! Project files on disk.

use super::schema::{deserialize_versioned, serialize};
use super::{PersistError, PersistResult};
use crate::model::Project;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Project file extension.
pub const FILE_EXTENSION: &str = "dio";

/// `path` with `.dio` appended unless it already ends in it.
pub fn with_dio_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case(FILE_EXTENSION) => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name.push(FILE_EXTENSION);
            PathBuf::from(name)
        }
    }
}

/// A fully written and synced temp file waiting to replace its target.
///
/// Dropping it without [`commit`](Self::commit) removes the temp file and
/// leaves the target untouched.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    /// The file that [`commit`](Self::commit) will replace.
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Atomically move the staged bytes over the target.
    pub fn commit(self) -> PersistResult<PathBuf> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| PersistError::io(&target, e.error))?;
        log::info!("Saved project to {}", target.display());
        Ok(target)
    }

    /// Discard the staged bytes.
    pub fn abort(self) {
        log::debug!("Discarded staged write for {}", self.target.display());
    }
}

/// Serialize `project` into a temp file next to `path` (with `.dio` enforced).
pub fn stage(path: &Path, project: &Project) -> PersistResult<StagedWrite> {
    let target = with_dio_extension(path);
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let bytes = serialize(project)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".dimensio-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| PersistError::io(&dir, e))?;
    temp.write_all(&bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| PersistError::io(temp.path(), e))?;

    Ok(StagedWrite { temp, target })
}

/// Atomically save `project`. Returns the path actually written.
pub fn write(path: &Path, project: &Project) -> PersistResult<PathBuf> {
    stage(path, project)?.commit()
}

/// Load a project file, migrating older formats.
pub fn load(path: &Path) -> PersistResult<Project> {
    read_document(path).map(|(project, _)| project)
}

/// Load a project file and report the version it was stored in.
pub fn read_document(path: &Path) -> PersistResult<(Project, u32)> {
    let bytes = fs::read(path).map_err(|e| PersistError::io(path, e))?;
    let (project, version) = deserialize_versioned(&bytes)?;
    log::info!(
        "Loaded project from {} ({} frames, format v{})",
        path.display(),
        project.len(),
        version
    );
    Ok((project, version))
}
