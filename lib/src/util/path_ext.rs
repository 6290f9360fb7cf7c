use std::borrow::Cow;
use std::path::{Component, Path};

pub trait PathExt: AsRef<Path> {
    /// Joins the normal components of `self` with `/`, regardless of the
    /// platform's separator. Root, prefix, and `.` components are dropped.
    fn to_slash(&self) -> String;

    /// Replaces the extension with `to` if the current one is `from`
    /// (compared case-insensitively). Other paths are returned unchanged.
    fn replace_ext(&self, from: &str, to: &str) -> Cow<'_, Path>;
}

impl PathExt for Path {
    fn to_slash(&self) -> String {
        let mut string = String::with_capacity(self.as_os_str().len());
        for component in self.components() {
            match component {
                Component::Normal(part) => {
                    if !string.is_empty() {
                        string.push('/');
                    }

                    string.push_str(&part.to_string_lossy());
                }
                Component::ParentDir => {
                    if !string.is_empty() {
                        string.push('/');
                    }

                    string.push_str("..");
                }
                Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            }
        }

        string
    }

    fn replace_ext(&self, from: &str, to: &str) -> Cow<'_, Path> {
        match self.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(from) => self.with_extension(to).into(),
            _ => self.into(),
        }
    }
}
