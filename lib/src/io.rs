use std::fs;
use std::path::{Path, PathBuf};
use std::fmt::Debug;

use crate::error::{Result, Chainable, ErrorKind};

/// Something text can be read from: a file path or an in-memory string.
pub trait Source: Debug {
    fn read(&self) -> Result<String>;

    fn path(&self) -> Option<&Path> {
        None
    }
}

/// Something bytes can be written to.
pub trait Sink: Debug {
    fn write_bytes(&self, bytes: &[u8]) -> Result<()>;

    #[inline]
    fn write<B: AsRef<[u8]>>(&self, bytes: B) -> Result<()> {
        self.write_bytes(bytes.as_ref())
    }
}

impl Source for str {
    fn read(&self) -> Result<String> {
        Ok(self.to_owned())
    }
}

impl Source for String {
    fn read(&self) -> Result<String> {
        Ok(self.clone())
    }
}

impl Source for Path {
    /// Reads the file as UTF-8, replacing invalid sequences with `U+FFFD`.
    fn read(&self) -> Result<String> {
        let bytes = fs::read(self)
            .chain_with(|| error! {
                "failed to read file",
                "file path" => self.display(),
            })
            .with_kind(ErrorKind::Filesystem)?;

        match String::from_utf8(bytes) {
            Ok(string) => Ok(string),
            Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }

    fn path(&self) -> Option<&Path> {
        Some(self)
    }
}

impl Source for PathBuf {
    fn read(&self) -> Result<String> {
        self.as_path().read()
    }

    fn path(&self) -> Option<&Path> {
        Some(self)
    }
}

impl<T: Source + ?Sized> Source for &T {
    fn read(&self) -> Result<String> {
        T::read(self)
    }

    fn path(&self) -> Option<&Path> {
        T::path(self)
    }
}

impl Sink for Path {
    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        fs::write(self, bytes)
            .chain_with(|| error! {
                "failed to open/create file for writing",
                "file path" => self.display(),
            })
            .with_kind(ErrorKind::Filesystem)
    }
}

impl Sink for PathBuf {
    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.as_path().write_bytes(bytes)
    }
}

impl<T: Sink + ?Sized> Sink for &T {
    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        T::write_bytes(self, bytes)
    }
}

/// Creates every missing ancestor directory of `path`.
pub fn create_parent_dirs(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent)
        .chain_with(|| error! {
            "failed to create destination directory",
            "directory" => parent.display(),
        })
        .with_kind(ErrorKind::Filesystem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested/deeper/page.html");

        create_parent_dirs(&file).unwrap();
        file.write("<p>hi</p>").unwrap();
        assert_eq!(file.read().unwrap(), "<p>hi</p>");

        let error = dir.path().join("absent.md").read().unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Filesystem));
        assert!(error.mentions("absent.md"));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("latin1.md");
        fs::write(&file, b"caf\xe9\n").unwrap();
        assert_eq!(file.read().unwrap(), "caf\u{FFFD}\n");
    }

    #[test]
    fn strings_are_sources() {
        assert_eq!("text".read().unwrap(), "text");
        assert!("text".path().is_none());
    }
}
