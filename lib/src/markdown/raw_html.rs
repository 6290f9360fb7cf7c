use pulldown_cmark::{Event, Tag, TagEnd};

/// The placeholder emitted in place of omitted raw HTML.
pub const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

/// Replaces raw HTML embedded in Markdown with a placeholder comment unless
/// `allow` is set, in which case events pass through untouched.
pub struct RawHtml<I> {
    inner: I,
    allow: bool,
    in_block: bool,
}

impl<I> RawHtml<I> {
    pub fn new(inner: I, allow: bool) -> Self {
        RawHtml { inner, allow, in_block: false }
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for RawHtml<I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let event = self.inner.next()?;
            if self.allow {
                return Some(event);
            }

            match event {
                Event::Start(Tag::HtmlBlock) => {
                    self.in_block = true;
                    return Some(Event::Html(format!("{}\n", RAW_HTML_OMITTED).into()));
                }
                Event::End(TagEnd::HtmlBlock) => self.in_block = false,
                Event::Html(_) if self.in_block => continue,
                Event::Html(_) | Event::InlineHtml(_) => {
                    return Some(Event::InlineHtml(RAW_HTML_OMITTED.into()));
                }
                event => return Some(event),
            }
        }
    }
}
