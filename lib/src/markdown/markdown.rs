use pulldown_cmark::{html, Parser, Options};

use crate::config::MarkdownOptions;
use crate::error::{Result, Chainable, ErrorKind};
use crate::markdown::{Highlight, Highlighter, RawHtml};

/// Converts Markdown to HTML according to the site's Markdown options.
///
/// A `Markdown` is immutable once built and is shared by every rendering
/// worker.
#[derive(Debug, Clone)]
pub struct Markdown {
    options: Options,
    highlight: Option<Highlight>,
    raw_html: bool,
}

impl Markdown {
    /// Extensions matching GitHub-flavored Markdown.
    pub const EXTENSIONS: Options = Options::ENABLE_TABLES
        .union(Options::ENABLE_FOOTNOTES)
        .union(Options::ENABLE_STRIKETHROUGH)
        .union(Options::ENABLE_TASKLISTS);

    pub fn new(options: &MarkdownOptions) -> Result<Self> {
        let highlight = options.highlight.as_ref()
            .map(Highlight::new)
            .transpose()
            .chain_with(|| "invalid markdown highlight options")
            .with_kind(ErrorKind::Config)?;

        Ok(Markdown {
            options: Self::EXTENSIONS,
            highlight,
            raw_html: options.renderer.with_unsafe,
        })
    }

    /// Loads highlighting data in the background so the first page doesn't
    /// pay for it.
    pub fn warm_up(&self) {
        if self.highlight.is_some() {
            Highlight::warm_up();
        }
    }

    pub fn render(&self, input: &str) -> Result<String> {
        let events = RawHtml::new(Parser::new_ext(input, self.options), self.raw_html);
        let mut output = String::with_capacity(input.len() + input.len() / 2);
        match &self.highlight {
            Some(highlight) => {
                let mut highlighter = Highlighter::new(events, highlight);
                html::push_html(&mut output, &mut highlighter);
                highlighter.finish()
                    .chain_with(|| "failed to highlight code block")
                    .with_kind(ErrorKind::MarkdownRender)?;
            }
            None => html::push_html(&mut output, events),
        }

        Ok(output)
    }
}

impl Default for Markdown {
    fn default() -> Self {
        Markdown { options: Self::EXTENSIONS, highlight: None, raw_html: false }
    }
}
