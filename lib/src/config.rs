use std::sync::Arc;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, Chainable, ErrorKind};
use crate::value::{unwrap_datetimes, Dict, Format, Toml, Value};

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE: &str = "vss.toml";

/// Site configuration, usually read from `vss.toml`.
///
/// Paths are relative to [`Config::root`]. Top-level keys that aren't
/// recognized here (`site_title`, `author`, ...) are collected into
/// [`Config::globals`] and exposed to every template.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Directory containing the configuration file. Not deserialized.
    #[serde(skip, default = "defaults::root")]
    pub root: PathBuf,
    #[serde(default)]
    pub base_url: String,
    #[serde(rename = "static", default = "defaults::static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "defaults::layouts")]
    pub layouts: PathBuf,
    #[serde(default = "defaults::dist")]
    pub dist: PathBuf,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(flatten)]
    pub globals: Dict,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BuildSettings {
    /// File names (not paths) skipped during Markdown discovery.
    #[serde(default)]
    pub ignore_files: Vec<String>,
    /// Number of rendering workers. Defaults to the available parallelism.
    #[serde(default)]
    pub jobs: Option<usize>,
    #[serde(default)]
    pub markdown: MarkdownOptions,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MarkdownOptions {
    /// Enables highlighting of fenced code blocks when present.
    #[serde(default)]
    pub highlight: Option<HighlightOptions>,
    #[serde(default)]
    pub renderer: RendererOptions,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HighlightOptions {
    /// A `syntect` theme name, e.g. `base16-ocean.dark`. Without one, code is
    /// emitted with CSS classes instead of inline styles.
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub with_numbers: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RendererOptions {
    /// Pass raw HTML embedded in Markdown through unescaped.
    #[serde(default)]
    pub with_unsafe: bool,
}

mod defaults {
    use std::path::PathBuf;

    pub fn root() -> PathBuf { PathBuf::from(".") }
    pub fn static_dir() -> PathBuf { PathBuf::from("static") }
    pub fn layouts() -> PathBuf { PathBuf::from("layouts") }
    pub fn dist() -> PathBuf { PathBuf::from("dist") }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root: defaults::root(),
            base_url: String::new(),
            static_dir: defaults::static_dir(),
            layouts: defaults::layouts(),
            dist: defaults::dist(),
            build: BuildSettings::default(),
            globals: Dict::new(),
        }
    }
}

impl Config {
    /// Reads the configuration file at `path`. The file's directory becomes
    /// the project root.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config: Config = Toml::read(path)
            .chain_with(|| error! {
                "invalid configuration file",
                "path" => path.display(),
            })
            .with_kind(ErrorKind::Config)?;

        config.root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => defaults::root(),
        };

        config.globals = unwrap_datetimes(std::mem::take(&mut config.globals));
        Ok(config)
    }

    /// Loads `root/vss.toml` if it exists, otherwise uses defaults rooted at
    /// `root`.
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let file = root.join(CONFIG_FILE);
        if file.is_file() {
            return Config::load(file);
        }

        Ok(Config { root: root.to_path_buf(), ..Config::default() })
    }

    pub fn set_base_url<S: Into<String>>(&mut self, base_url: S) {
        self.base_url = base_url.into();
    }

    pub fn static_root(&self) -> PathBuf {
        self.root.join(&self.static_dir)
    }

    pub fn layouts_root(&self) -> PathBuf {
        self.root.join(&self.layouts)
    }

    pub fn dist_root(&self) -> PathBuf {
        self.root.join(&self.dist)
    }

    /// The site-wide layer of every page's render context: `base_url` plus
    /// all global keys.
    pub fn base_context(&self) -> Dict {
        let mut context = self.globals.clone();
        context.insert(Arc::from("base_url"), Value::from(self.base_url.as_str()));
        context
    }
}
