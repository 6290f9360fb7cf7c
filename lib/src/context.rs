use std::sync::Arc;

use crate::document::SourceDocument;
use crate::markdown::FrontMatter;
use crate::value::{Dict, Value};

/// The values a page's template is rendered with.
///
/// Built from three layers, later layers overwriting earlier ones on key
/// collisions: the rendered `contents`, the site-wide base context, and the
/// page's front matter.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext(Arc<Dict>);

impl RenderContext {
    /// The key holding the page's rendered Markdown.
    pub const CONTENTS: &'static str = "contents";

    pub fn build(base: &Dict, document: &SourceDocument) -> Self {
        Self::merge(&document.contents, base, &document.front_matter)
    }

    pub fn merge(contents: &str, base: &Dict, front_matter: &FrontMatter) -> Self {
        let mut dict = Dict::new();
        dict.insert(Arc::from(Self::CONTENTS), Value::html(contents));
        dict.extend(base.iter().map(|(k, v)| (k.clone(), v.clone())));
        dict.extend(front_matter.to_dict());
        RenderContext(Arc::new(dict))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_dict(&self) -> &Dict {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Dict(self.0.clone())
    }
}

impl From<Dict> for RenderContext {
    fn from(dict: Dict) -> Self {
        RenderContext(Arc::new(dict))
    }
}

#[cfg(test)]
mod tests {
    use crate::dict;

    use super::*;

    #[test]
    fn later_layers_win() {
        let base = dict! { "title" => "Site", "author" => "Ana", "base_url" => "/" };
        let mut front_matter = FrontMatter::default();
        front_matter.extra.insert("title".into(), "Post".into());
        front_matter.post_slug = Some("post".into());

        let context = RenderContext::merge("<p>x</p>", &base, &front_matter);
        assert_eq!(context.get("title"), Some(&Value::from("Post")));
        assert_eq!(context.get("author"), Some(&Value::from("Ana")));
        assert_eq!(context.get("post_slug"), Some(&Value::from("post")));
        assert_eq!(context.get(RenderContext::CONTENTS), Some(&Value::html("<p>x</p>")));
        assert_eq!(context.get("og_image"), None);
    }

    #[test]
    fn contents_can_be_overridden() {
        let base = dict! { "contents" => "from config" };
        let context = RenderContext::merge("<p>x</p>", &base, &FrontMatter::default());
        assert_eq!(context.get(RenderContext::CONTENTS), Some(&Value::from("from config")));

        let mut front_matter = FrontMatter::default();
        front_matter.extra.insert("contents".into(), "from page".into());
        let context = RenderContext::merge("<p>x</p>", &base, &front_matter);
        assert_eq!(context.get(RenderContext::CONTENTS), Some(&Value::from("from page")));
    }
}
