use std::fmt::Write;

use pulldown_cmark::{Event, Tag, CodeBlockKind, TagEnd};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, ClassedHTMLGenerator, ClassStyle, IncludeBackground};
use syntect::parsing::{SyntaxSet, SyntaxReference};
use syntect::util::LinesWithEndings;
use once_cell::sync::Lazy;

use crate::config::HighlightOptions;
use crate::error::{Error, Result};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Resolved code highlighting settings.
#[derive(Debug, Clone)]
pub struct Highlight {
    theme: Option<&'static Theme>,
    line_numbers: bool,
}

impl Highlight {
    pub fn new(options: &HighlightOptions) -> Result<Self> {
        let theme = match options.style.as_deref() {
            Some(name) => match THEME_SET.themes.get(name) {
                Some(theme) => Some(theme),
                None => return err! {
                    "unknown highlight style",
                    "style" => name,
                    "available styles" => THEME_SET.themes.keys()
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(", "),
                },
            },
            None => None,
        };

        Ok(Highlight { theme, line_numbers: options.with_numbers })
    }

    #[inline]
    pub fn warm_up() {
        rayon::spawn(|| { Lazy::force(&SYNTAX_SET); });
    }

    fn syntax(lang: &str) -> &'static SyntaxReference {
        SYNTAX_SET.find_syntax_by_token(lang)
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
    }

    fn render(&self, lang: &str, code: &str) -> Result<String> {
        let syntax = Self::syntax(lang);
        let lines = LinesWithEndings::from(code).count();
        let (html, style) = match self.theme {
            Some(theme) => {
                let mut html = String::with_capacity(code.len() * 4);
                let mut highlighter = HighlightLines::new(syntax, theme);
                for line in LinesWithEndings::from(code) {
                    let ranges = highlighter.highlight_line(line, &SYNTAX_SET).map_err(syntect_error)?;
                    let styled = styled_line_to_highlighted_html(&ranges[..], IncludeBackground::No);
                    html.push_str(&styled.map_err(syntect_error)?);
                }

                let style = theme.settings.background
                    .map(|c| format!("background-color:#{:02x}{:02x}{:02x};", c.r, c.g, c.b));

                (html, style)
            }
            None => {
                let mut generator = ClassedHTMLGenerator::new_with_class_style(
                    syntax, &SYNTAX_SET, ClassStyle::Spaced
                );

                for line in LinesWithEndings::from(code) {
                    generator.parse_html_for_line_which_includes_newline(line)
                        .map_err(syntect_error)?;
                }

                (generator.finalize(), None)
            }
        };

        Ok(code_div(self.line_numbers.then_some(lines), style.as_deref(), &html))
    }
}

fn syntect_error(error: syntect::Error) -> Error {
    error!("syntax highlighting failed", error)
}

#[allow(unused_must_use)]
fn code_div(lines: Option<usize>, style: Option<&str>, code: &str) -> String {
    let mut div = String::with_capacity(code.len() + 128);
    let pre = match style {
        Some(style) => format!("<pre class=\"code\" style=\"{style}\">"),
        None => "<pre class=\"code\">".to_string(),
    };

    let Some(lines) = lines else {
        write!(&mut div, "{pre}{code}</pre>");
        return div;
    };

    write!(&mut div, "<div class=\"code\" style=\"display: flex;\">");

    write!(&mut div, "<pre class=\"line-nums\">");
    for i in 1..=lines {
        if i < lines { write!(&mut div, "{}\n", i); }
        else { write!(&mut div, "{}", i); }
    }
    write!(&mut div, "</pre>");

    write!(&mut div, "{pre}{code}</pre>");
    write!(&mut div, "</div>");

    div
}

/// Replaces fenced code blocks in an event stream with highlighted HTML.
///
/// Highlighting errors can't surface through `Iterator`; the first one is
/// kept and returned by [`Highlighter::finish()`].
pub struct Highlighter<'h, 'a, I> {
    highlight: &'h Highlight,
    block: Option<(pulldown_cmark::CowStr<'a>, String)>,
    error: Option<Error>,
    inner: I,
}

impl<'h, 'a, I: Iterator<Item = Event<'a>>> Highlighter<'h, 'a, I> {
    pub fn new(inner: I, highlight: &'h Highlight) -> Self {
        Highlighter { highlight, block: None, error: None, inner }
    }

    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(())
        }
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for Highlighter<'_, 'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(label))) => {
                    self.block = Some((label, String::new()));
                }
                Event::Text(text) if self.block.is_some() => {
                    if let Some((_, code)) = self.block.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if self.block.is_some() => {
                    let (label, code) = self.block.take()?;
                    let lang = label.split_once(',')
                        .map(|(prefix, _)| prefix)
                        .unwrap_or(&*label)
                        .trim();

                    match self.highlight.render(lang, &code) {
                        Ok(html) => return Some(Event::Html(html.into())),
                        Err(e) => {
                            self.error.get_or_insert(e);
                            return Some(Event::Html(String::new().into()));
                        }
                    }
                },
                ev => return Some(ev),
            }
        }
    }
}
