use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::assets::{copy_static, prepare_dist};
use crate::config::Config;
use crate::discover::{discover, purge_ignored};
use crate::document::Extractor;
use crate::error::{Result, Chainable};
use crate::markdown::Markdown;
use crate::ogimage::EmojiRenderer;
use crate::page::PageRenderer;
use crate::templating::{EngineInit, TemplateRegistry};
use crate::templating::minijinja::MiniJinjaEngine;

/// What a successful build produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Number of HTML pages written.
    pub pages: usize,
    /// Number of static files copied.
    pub assets: usize,
}

/// Runs a full build of one project.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    emoji: Option<Arc<dyn EmojiRenderer>>,
}

impl Builder {
    pub fn new(config: Config) -> Self {
        Builder { config, emoji: None }
    }

    /// Replaces the default share-image renderer.
    pub fn with_emoji_renderer<E: EmojiRenderer + 'static>(mut self, renderer: E) -> Self {
        self.emoji = Some(Arc::new(renderer));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the site with the default template engine.
    pub fn run(&self) -> Result<BuildSummary> {
        self.run_with::<MiniJinjaEngine>()
    }

    /// Builds the site: recreates dist, copies static files, then renders
    /// every Markdown source on a bounded worker pool.
    ///
    /// The first failure aborts the build. Pages that hadn't started by then
    /// are skipped, and since dist was emptied first, it is left incomplete.
    pub fn run_with<E: EngineInit>(&self) -> Result<BuildSummary> {
        let start = Instant::now();
        let config = &self.config;
        let (dist, layouts) = (config.dist_root(), config.layouts_root());

        prepare_dist(&dist)?;
        let assets = copy_static(&config.static_root(), &dist)?;

        let exclude = [config.layouts.clone(), config.static_dir.clone(), config.dist.clone()];
        let sources = discover(&config.root, ".md", &exclude)?;
        let sources = purge_ignored(sources, &config.build.ignore_files);
        info!(count = sources.len(), root = %config.root.display(), "discovered markdown sources");
        if sources.is_empty() {
            warn!("no markdown sources found");
        }

        let templates = discover(&layouts, ".html", &[])?;
        let registry = TemplateRegistry::load::<E>(&layouts, &templates)?;

        let markdown = Markdown::new(&config.build.markdown)?;
        markdown.warm_up();
        let mut extractor = Extractor::new(&config.root, &dist, markdown);
        if let Some(emoji) = &self.emoji {
            extractor = extractor.with_shared_emoji_renderer(emoji.clone());
        }

        let base = config.base_context();
        let renderer = PageRenderer {
            registry: &registry,
            extractor: &extractor,
            base: &base,
            dist: &dist,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.build.jobs.unwrap_or(0))
            .thread_name(|i| format!("vss-render-{i}"))
            .build()
            .chain_with(|| "failed to start rendering workers")?;

        info!(jobs = pool.current_num_threads(), "rendering pages");
        let failed = AtomicBool::new(false);
        pool.install(|| sources.par_iter().try_for_each(|path| {
            if failed.load(Ordering::Acquire) {
                return Ok(());
            }

            renderer.render(path).map(|_| ()).map_err(|e| {
                failed.store(true, Ordering::Release);
                e
            })
        }))?;

        let summary = BuildSummary { pages: sources.len(), assets };
        info!(
            pages = summary.pages,
            assets = summary.assets,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "build finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use static_assertions::assert_impl_all;

    use crate::error::ErrorKind;

    use super::*;

    assert_impl_all!(TemplateRegistry: Send, Sync);
    assert_impl_all!(Extractor: Send, Sync);
    assert_impl_all!(PageRenderer<'static>: Send, Sync);
    assert_impl_all!(Builder: Send, Sync);

    fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }

        dir
    }

    fn build(root: &Path, jobs: usize) -> Result<BuildSummary> {
        let mut config = Config::discover(root).unwrap();
        config.build.jobs = Some(jobs);
        Builder::new(config).run()
    }

    #[test]
    fn sources_under_layouts_and_static_are_not_pages() {
        let dir = project(&[
            ("layouts/default.html", "{{ contents }}"),
            ("layouts/partial.md", "not a page"),
            ("static/readme.md", "copied, not rendered"),
            ("index.md", "# Home"),
        ]);

        let summary = build(dir.path(), 2).unwrap();
        assert_eq!(summary, BuildSummary { pages: 1, assets: 1 });
        assert!(dir.path().join("dist/index.html").is_file());
        assert!(dir.path().join("dist/readme.md").is_file());
        assert!(!dir.path().join("dist/layouts").exists());
    }

    #[test]
    fn later_pages_are_skipped_after_a_failure() {
        let dir = project(&[
            ("layouts/default.html", "{{ contents }}"),
            ("a.md", "---\ntitle: [broken\n---\n"),
            ("b.md", "fine"),
        ]);

        let error = build(dir.path(), 1).unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::FrontMatter));
        assert!(!dir.path().join("dist/b.html").exists());
    }

    #[test]
    fn missing_layouts_is_a_filesystem_error() {
        let dir = project(&[("index.md", "# Home")]);
        let error = build(dir.path(), 1).unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Filesystem));
        assert!(error.mentions("layouts"));
    }
}
