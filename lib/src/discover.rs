use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::error::{Result, Chainable, ErrorKind};

/// Returns the root-relative path of every regular file under `root` whose
/// name ends with `extension` (e.g. `".md"`).
///
/// Hidden entries are skipped, as is every directory in `exclude` (given
/// relative to `root`). Entries are visited in sorted order so repeated
/// walks of an unchanged tree agree. The first unreadable path aborts the
/// walk; no partial result is returned.
pub fn discover<P: AsRef<Path>>(root: P, extension: &str, exclude: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        let error = error! {
            "discovery root is not a directory",
            "search root" => root.display(),
        };

        return Err(error.with_kind(ErrorKind::Filesystem));
    }

    let excluded: Vec<PathBuf> = exclude.iter().map(|dir| root.join(dir)).collect();
    let walker = WalkDir::new(root)
        .sort(true)
        .follow_links(true)
        .process_read_dir(move |_, _, _, children| {
            children.retain(|entry| match entry {
                Ok(entry) => !excluded.iter().any(|dir| entry.path() == *dir),
                Err(_) => true,
            });
        });

    let mut paths = vec![];
    for entry in walker {
        let entry = entry
            .chain_with(|| error! {
                "failed to walk directory tree",
                "search root" => root.display(),
            })
            .with_kind(ErrorKind::Filesystem)?;

        if !entry.file_type.is_file() || !entry.file_name.to_string_lossy().ends_with(extension) {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root)
            .chain_with(|| error! {
                "discovered path escapes the search root",
                "search root" => root.display(),
                "path" => path.display(),
            })
            .with_kind(ErrorKind::Filesystem)?;

        paths.push(relative.to_path_buf());
    }

    Ok(paths)
}

/// Drops every path whose file name appears in `ignore_files`.
pub fn purge_ignored(paths: Vec<PathBuf>, ignore_files: &[String]) -> Vec<PathBuf> {
    if ignore_files.is_empty() {
        return paths;
    }

    paths.into_iter()
        .filter(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy());
            !name.map_or(false, |name| ignore_files.iter().any(|i| *i == *name))
        })
        .collect()
}
