use std::fs;
use std::path::Path;

use jwalk::WalkDir;
use tracing::info;

use crate::error::{Result, Chainable, ErrorKind};

/// Removes `dist` if it exists, then creates it empty.
///
/// Builds are never incremental: whatever a previous run left behind,
/// including the output of a successful build, is gone once this returns.
pub fn prepare_dist(dist: &Path) -> Result<()> {
    if dist.exists() {
        info!(dist = %dist.display(), "re-creating dist directory");
        fs::remove_dir_all(dist)
            .chain_with(|| error! {
                "failed to remove previous dist directory",
                "path" => dist.display(),
            })
            .with_kind(ErrorKind::Filesystem)?;
    } else {
        info!(dist = %dist.display(), "creating dist directory");
    }

    fs::create_dir_all(dist)
        .chain_with(|| error! {
            "failed to create dist directory",
            "path" => dist.display(),
        })
        .with_kind(ErrorKind::Filesystem)
}

/// Copies the tree at `src` verbatim into `dist`, returning the number of
/// files copied. A missing `src` is not an error: nothing is copied.
pub fn copy_static(src: &Path, dist: &Path) -> Result<usize> {
    if !src.is_dir() {
        info!(path = %src.display(), "static directory not found; skip copying static files");
        return Ok(0);
    }

    info!(from = %src.display(), to = %dist.display(), "copying static files");
    let walker = WalkDir::new(src)
        .sort(true)
        .skip_hidden(false)
        .follow_links(true);

    let mut copied = 0;
    for entry in walker {
        let entry = entry
            .chain_with(|| error! {
                "failed to walk static directory",
                "path" => src.display(),
            })
            .with_kind(ErrorKind::Filesystem)?;

        let path = entry.path();
        let relative = path.strip_prefix(src).with_kind(ErrorKind::Filesystem)?;
        let target = dist.join(relative);
        if entry.file_type.is_dir() {
            fs::create_dir_all(&target)
                .chain_with(|| error! {
                    "failed to create static directory",
                    "path" => target.display(),
                })
                .with_kind(ErrorKind::Filesystem)?;
        } else if entry.file_type.is_file() {
            fs::copy(&path, &target)
                .chain_with(|| error! {
                    "failed to copy static file",
                    "source path" => path.display(),
                    "destination path" => target.display(),
                })
                .with_kind(ErrorKind::Filesystem)?;

            copied += 1;
        }
    }

    Ok(copied)
}
