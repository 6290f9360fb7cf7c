pub mod minijinja;

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::context::RenderContext;
use crate::error::{Result, Chainable, ErrorKind};
use crate::util::PathExt;

pub trait EngineInit {
    type Engine: Engine + 'static;

    /// Creates an engine that loads templates by name from `layouts_root`.
    fn init(layouts_root: &Path) -> Self::Engine;
}

/// A template engine. Templates are addressed by their path relative to the
/// layouts root, with `/` separators.
pub trait Engine: Send + Sync + Debug {
    /// Parses and caches the template `name`.
    fn load(&self, name: &str) -> Result<()>;

    /// Renders the previously loaded template `name` with `context`.
    fn render(&self, name: &str, context: &RenderContext) -> Result<String>;
}

/// Every layout under the layouts root, parsed once and shared read-only by
/// all rendering workers.
#[derive(Debug)]
pub struct TemplateRegistry {
    root: PathBuf,
    names: FxHashSet<String>,
    engine: Box<dyn Engine>,
}

/// A resolved template, ready to render.
#[derive(Debug, Clone, Copy)]
pub struct Template<'r> {
    registry: &'r TemplateRegistry,
    name: &'r str,
}

impl TemplateRegistry {
    /// The file name of directory and global fallback templates.
    pub const DEFAULT: &'static str = "default.html";

    /// Loads every template in `files`, which are relative to `root`. Fails
    /// on the first template that doesn't parse.
    pub fn load<E: EngineInit>(root: &Path, files: &[PathBuf]) -> Result<Self> {
        let engine = E::init(root);
        let mut names = FxHashSet::default();
        for file in files {
            let name = file.to_slash();
            debug!(template = %name, "loading template");
            engine.load(&name)
                .chain_with(|| error! {
                    "failed to parse template",
                    "path" => root.join(file).display(),
                })
                .with_kind(ErrorKind::TemplateParse)?;

            names.insert(name);
        }

        info!(count = names.len(), root = %root.display(), "loaded templates");
        Ok(TemplateRegistry { root: root.to_path_buf(), names, engine: Box::new(engine) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// The names tried for `output`, most specific first: the exact path,
    /// the default in its directory, and the global default. Duplicates are
    /// removed, so a top-level output yields two candidates.
    pub fn candidates(output: &Path) -> Vec<String> {
        let exact = output.to_slash();
        let directory = output.parent()
            .map(|dir| dir.join(Self::DEFAULT).to_slash())
            .unwrap_or_else(|| Self::DEFAULT.to_string());

        let mut candidates = vec![exact];
        for name in [directory, Self::DEFAULT.to_string()] {
            if !candidates.contains(&name) {
                candidates.push(name);
            }
        }

        candidates
    }

    /// Finds the template for the output path `output`, relative to the
    /// output root.
    pub fn resolve(&self, output: &Path) -> Result<Template<'_>> {
        let candidates = Self::candidates(output);
        for candidate in &candidates {
            if let Some(name) = self.names.get(candidate) {
                return Ok(Template { registry: self, name });
            }
        }

        let error = error! {
            "no template found",
            "output path" => output.display(),
            "layouts" => self.root.display(),
            "candidates" => candidates.join(", "),
        };

        Err(error.with_kind(ErrorKind::TemplateNotFound))
    }
}

impl Template<'_> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn render(&self, context: &RenderContext) -> Result<String> {
        self.registry.engine.render(self.name, context)
            .chain_with(|| error! {
                "failed to render template",
                "path" => self.registry.root.join(self.name).display(),
            })
            .with_kind(ErrorKind::TemplateRender)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    /// Accepts any template not named `broken.html` and renders its name.
    #[derive(Debug)]
    struct Echo;

    impl EngineInit for Echo {
        type Engine = Echo;

        fn init(_: &Path) -> Echo { Echo }
    }

    impl Engine for Echo {
        fn load(&self, name: &str) -> Result<()> {
            match name.ends_with("broken.html") {
                true => err!("unexpected end of template"),
                false => Ok(()),
            }
        }

        fn render(&self, name: &str, context: &RenderContext) -> Result<String> {
            let contents = context.get(RenderContext::CONTENTS)
                .and_then(|v| v.as_str())
                .unwrap_or_default();

            Ok(format!("{name}: {contents}"))
        }
    }

    fn registry(files: &[&str]) -> TemplateRegistry {
        let files: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
        TemplateRegistry::load::<Echo>(Path::new("layouts"), &files).unwrap()
    }

    fn resolve<'r>(registry: &'r TemplateRegistry, output: &str) -> Result<&'r str> {
        registry.resolve(Path::new(output)).map(|t| t.name)
    }

    #[test]
    fn tiers_resolve_most_specific_first() {
        let registry = registry(&["default.html", "blog/default.html", "blog/special.html"]);
        assert_eq!(registry.len(), 3);

        assert_eq!(resolve(&registry, "blog/special.html").unwrap(), "blog/special.html");
        assert_eq!(resolve(&registry, "blog/other.html").unwrap(), "blog/default.html");
        assert_eq!(resolve(&registry, "blog/2024/deep.html").unwrap(), "default.html");
        assert_eq!(resolve(&registry, "about.html").unwrap(), "default.html");
    }

    #[test]
    fn candidates_are_deduplicated() {
        assert_eq!(TemplateRegistry::candidates(Path::new("a/b.html")),
            vec!["a/b.html", "a/default.html", "default.html"]);

        assert_eq!(TemplateRegistry::candidates(Path::new("index.html")),
            vec!["index.html", "default.html"]);
    }

    #[test]
    fn missing_template_lists_candidates() {
        let registry = registry(&["notes/default.html"]);
        let error = registry.resolve(Path::new("blog/post.html")).unwrap_err();

        assert_eq!(error.kind(), Some(ErrorKind::TemplateNotFound));
        assert!(error.mentions("blog/post.html, blog/default.html, default.html"));
    }

    #[test]
    fn parse_failure_names_the_file() {
        let files = vec![PathBuf::from("default.html"), PathBuf::from("blog/broken.html")];
        let error = TemplateRegistry::load::<Echo>(Path::new("layouts"), &files).unwrap_err();

        assert_eq!(error.kind(), Some(ErrorKind::TemplateParse));
        assert!(error.mentions("broken.html"));
        assert!(error.mentions("unexpected end of template"));
    }

    #[test]
    fn templates_render_through_the_engine() {
        let registry = registry(&["default.html"]);
        let context = RenderContext::from(crate::dict! {
            RenderContext::CONTENTS => crate::value::Value::html("<p>hi</p>"),
        });

        let template = registry.resolve(Path::new("x.html")).unwrap();
        assert_eq!(template.render(&context).unwrap(), "default.html: <p>hi</p>");
    }
}
