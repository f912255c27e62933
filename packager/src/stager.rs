//! Staging of the install tree and extra files.
//!
//! Everything the image build needs is gathered beneath one staging root.
//! Absolute source paths are re-rooted there, so `/etc/myapp/app.yml` lands
//! at `<staging>/etc/myapp/app.yml`.

use crate::error::{PackagerError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use walkdir::WalkDir;

const PROBE_FILENAME: &str = ".omnibus-docker-probe";

/// Copies files into a staging directory.
#[derive(Debug, Clone)]
pub struct Stager {
    staging_root: Utf8PathBuf,
}

impl Stager {
    /// Create a stager rooted at `staging_root`.
    #[must_use]
    pub fn new(staging_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            staging_root: staging_root.into(),
        }
    }

    /// Return the staging root.
    #[must_use]
    pub fn staging_root(&self) -> &Utf8Path {
        &self.staging_root
    }

    /// Ensure the staging root exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::TargetNotWritable`] if the directory cannot be
    /// created or written to.
    pub fn prepare(&self) -> Result<()> {
        let not_writable = |e: std::io::Error| PackagerError::TargetNotWritable {
            path: self.staging_root.clone(),
            reason: e.to_string(),
        };

        fs::create_dir_all(&self.staging_root).map_err(not_writable)?;

        let probe = self.staging_root.join(PROBE_FILENAME);
        fs::write(&probe, b"probe").map_err(not_writable)?;
        let _ = fs::remove_file(&probe);
        Ok(())
    }

    /// Where `source` lands inside the staging root.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::StagingFailed`] if the path contains `..`
    /// components or nothing remains once its root is stripped.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use omnibus_docker_packager::stager::Stager;
    ///
    /// let stager = Stager::new("/stage");
    /// let dest = stager.destination_for(Utf8Path::new("/etc/myapp/app.yml"))?;
    /// assert_eq!(dest, "/stage/etc/myapp/app.yml");
    /// # Ok::<(), omnibus_docker_packager::error::PackagerError>(())
    /// ```
    pub fn destination_for(&self, source: &Utf8Path) -> Result<Utf8PathBuf> {
        Ok(self.staging_root.join(relative_to_root(source)?))
    }

    /// Copy each extra file into the staging root, preserving its path.
    ///
    /// Existing copies are overwritten, so staging twice yields the same tree.
    /// Returns the staged paths relative to the staging root, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::StagingFailed`] for unsafe paths, missing
    /// sources or failed copies.
    pub fn stage_extra_files(&self, files: &[Utf8PathBuf]) -> Result<Vec<Utf8PathBuf>> {
        files.iter().map(|file| self.stage_file(file)).collect()
    }

    fn stage_file(&self, source: &Utf8Path) -> Result<Utf8PathBuf> {
        let relative = relative_to_root(source)?;
        let dest = self.staging_root.join(&relative);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| staging_failed(source, &e))?;
        }
        copy_file(source, &dest)?;

        debug!("staged {source} -> {dest}");
        Ok(relative)
    }

    /// Mirror the install directory beneath the staging root.
    ///
    /// Directories, regular files and symbolic links are reproduced; links
    /// are recreated rather than followed.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::StagingFailed`] if the tree cannot be walked
    /// or any entry cannot be reproduced.
    pub fn stage_install_dir(&self, install_dir: &Utf8Path) -> Result<Utf8PathBuf> {
        let dest_root = self.staging_root.join(relative_to_root(install_dir)?);

        for entry in WalkDir::new(install_dir).follow_links(false) {
            let entry = entry.map_err(|e| staging_failed(install_dir, &e))?;
            let source = Utf8Path::from_path(entry.path()).ok_or_else(|| {
                staging_failed(install_dir, &format!("non-UTF-8 path {}", entry.path().display()))
            })?;
            let suffix = source
                .strip_prefix(install_dir)
                .map_err(|e| staging_failed(source, &e))?;
            let dest = dest_root.join(suffix);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                fs::create_dir_all(&dest).map_err(|e| staging_failed(source, &e))?;
            } else if file_type.is_symlink() {
                copy_symlink(source, &dest)?;
            } else {
                copy_file(source, &dest)?;
            }
        }

        debug!("staged install tree {install_dir} -> {dest_root}");
        Ok(dest_root)
    }
}

/// Strip the root and prefix from `path`, rejecting parent traversal.
///
/// # Errors
///
/// Returns [`PackagerError::StagingFailed`] if the path contains `..`
/// components or nothing remains once its root is stripped.
pub fn relative_to_root(path: &Utf8Path) -> Result<Utf8PathBuf> {
    let mut relative = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir | Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                return Err(staging_failed(path, &"parent directory components are not allowed"));
            }
            Utf8Component::Normal(part) => relative.push(part),
        }
    }

    if relative.as_str().is_empty() {
        return Err(staging_failed(path, &"path has no components to stage"));
    }
    Ok(relative)
}

/// Copy a regular file, replacing any earlier copy.
///
/// `fs::copy` carries the source permissions over, so a read-only source
/// leaves a read-only copy that cannot be reopened for writing.
fn copy_file(source: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    remove_existing(source, dest)?;
    fs::copy(source, dest)
        .map(|_| ())
        .map_err(|e| staging_failed(source, &format!("failed to copy to {dest}: {e}")))
}

fn remove_existing(source: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    match fs::symlink_metadata(dest) {
        Ok(meta) if !meta.is_dir() => {
            fs::remove_file(dest).map_err(|e| staging_failed(source, &e))
        }
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn copy_symlink(source: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    let target = fs::read_link(source).map_err(|e| staging_failed(source, &e))?;
    remove_existing(source, dest)?;
    std::os::unix::fs::symlink(&target, dest).map_err(|e| staging_failed(source, &e))
}

#[cfg(not(unix))]
fn copy_symlink(source: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    copy_file(source, dest)
}

fn staging_failed(path: &Utf8Path, reason: &dyn std::fmt::Display) -> PackagerError {
    PackagerError::StagingFailed {
        path: path.to_owned(),
        reason: reason.to_string(),
    }
}
