use std::path::{Path, PathBuf};

use tracing::info;

use crate::context::RenderContext;
use crate::document::Extractor;
use crate::error::{Result, Chainable};
use crate::io::{create_parent_dirs, Sink};
use crate::templating::TemplateRegistry;
use crate::util::PathExt;
use crate::value::Dict;

/// Renders single pages: one source file in, one HTML file (and at most one
/// share image) out.
#[derive(Debug, Clone, Copy)]
pub struct PageRenderer<'a> {
    pub registry: &'a TemplateRegistry,
    pub extractor: &'a Extractor,
    pub base: &'a Dict,
    pub dist: &'a Path,
}

impl PageRenderer<'_> {
    /// Renders the source at `path`, relative to the project root, and
    /// returns the path of the written page.
    pub fn render(&self, path: &Path) -> Result<PathBuf> {
        info!(path = %path.display(), "rendering");
        let output = path.replace_ext("md", "html");
        let template = self.registry.resolve(&output)?;
        let document = self.extractor.extract(path)?;
        let context = RenderContext::build(self.base, &document);
        let html = template.render(&context)
            .chain_with(|| error! {
                "failed to render page",
                "path" => path.display(),
            })?;

        let target = self.dist.join(&output);
        create_parent_dirs(&target)?;
        target.write(html)?;
        Ok(target)
    }
}
