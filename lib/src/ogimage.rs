use std::fmt::Debug;
use std::sync::Arc;

use once_cell::sync::Lazy;
use resvg::{tiny_skia, usvg};

use crate::error::{Result, ErrorKind};
use crate::util::escape_xml;

/// Draws the Open-Graph share image for a page from its emoji marker.
pub trait EmojiRenderer: Send + Sync + Debug {
    /// Returns PNG-encoded image data.
    fn render_png(&self, emoji: &str) -> Result<Vec<u8>>;
}

static FONTS: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    Arc::new(fontdb)
});

/// Rasterizes the emoji, centered on a white card, with the system's emoji
/// fonts. Pages render fine without such fonts; the card is then blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgEmojiRenderer {
    pub width: u32,
    pub height: u32,
}

impl SvgEmojiRenderer {
    const FONT_FAMILIES: &'static str =
        "'Noto Color Emoji', 'Apple Color Emoji', 'Segoe UI Emoji', 'Twemoji Mozilla', sans-serif";

    pub fn svg(&self, emoji: &str) -> String {
        let (w, h) = (self.width, self.height);
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<rect width="{w}" height="{h}" fill="#ffffff"/>
<text x="{x}" y="{y}" font-size="{size}" font-family="{families}" text-anchor="middle" dominant-baseline="central">{emoji}</text>
</svg>"##,
            x = w / 2,
            y = h / 2,
            size = h / 2,
            families = Self::FONT_FAMILIES,
            emoji = escape_xml(emoji),
        )
    }
}

impl Default for SvgEmojiRenderer {
    fn default() -> Self {
        SvgEmojiRenderer { width: 1200, height: 630 }
    }
}

impl EmojiRenderer for SvgEmojiRenderer {
    fn render_png(&self, emoji: &str) -> Result<Vec<u8>> {
        let options = usvg::Options {
            fontdb: FONTS.clone(),
            ..Default::default()
        };

        let svg = self.svg(emoji);
        let tree = usvg::Tree::from_data(svg.as_bytes(), &options)
            .map_err(|e| error!("failed to lay out share image", e, "emoji" => emoji))
            .map_err(|e| e.with_kind(ErrorKind::ImageRender))?;

        let mut pixmap = tiny_skia::Pixmap::new(self.width, self.height)
            .ok_or_else(|| error! {
                "invalid share image dimensions",
                "width" => self.width,
                "height" => self.height,
            })
            .map_err(|e| e.with_kind(ErrorKind::ImageRender))?;

        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        pixmap.encode_png()
            .map_err(|e| error!("failed to encode share image", e, "emoji" => emoji))
            .map_err(|e| e.with_kind(ErrorKind::ImageRender))
    }
}
