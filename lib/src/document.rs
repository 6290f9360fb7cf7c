use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, Chainable};
use crate::io::{create_parent_dirs, Sink, Source};
use crate::markdown::{self, FrontMatter, Markdown};
use crate::ogimage::{EmojiRenderer, SvgEmojiRenderer};
use crate::util::PathExt;

/// A Markdown source file after extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Path relative to the project root.
    pub path: PathBuf,
    pub raw: String,
    pub front_matter: FrontMatter,
    /// Whether the source began with a complete front-matter block. An empty
    /// block counts; its metadata is the default.
    pub has_front_matter: bool,
    /// The rendered HTML of the body.
    pub contents: String,
}

/// Turns source files into [`SourceDocument`]s.
///
/// Extraction has one side effect: a page with an `emoji` but no `og_image`
/// gets a PNG share image written into the dist directory.
#[derive(Debug, Clone)]
pub struct Extractor {
    root: PathBuf,
    dist: PathBuf,
    markdown: Markdown,
    emoji: Arc<dyn EmojiRenderer>,
}

impl Extractor {
    pub fn new<R: Into<PathBuf>, D: Into<PathBuf>>(root: R, dist: D, markdown: Markdown) -> Self {
        Extractor {
            root: root.into(),
            dist: dist.into(),
            markdown,
            emoji: Arc::new(SvgEmojiRenderer::default()),
        }
    }

    pub fn with_emoji_renderer<E: EmojiRenderer + 'static>(self, renderer: E) -> Self {
        self.with_shared_emoji_renderer(Arc::new(renderer))
    }

    pub fn with_shared_emoji_renderer(mut self, renderer: Arc<dyn EmojiRenderer>) -> Self {
        self.emoji = renderer;
        self
    }

    /// Reads, splits and renders the file at `path`, relative to the project
    /// root, then applies slug and share-image defaults.
    pub fn extract(&self, path: &Path) -> Result<SourceDocument> {
        let source = self.root.join(path);
        let raw = source.read()?;

        let split = markdown::split(&raw);
        let has_front_matter = split.found();
        let front_matter = match split.format {
            Some(format) => FrontMatter::parse(format, split.matter)
                .chain_with(|| error! {
                    "invalid front matter",
                    "path" => source.display(),
                })?,
            None => FrontMatter::default(),
        };

        let contents = self.markdown.render(split.body)
            .chain_with(|| error! {
                "failed to render markdown",
                "path" => source.display(),
            })?;

        let mut document = SourceDocument {
            path: path.to_path_buf(),
            raw,
            front_matter,
            has_front_matter,
            contents,
        };

        self.apply_defaults(&mut document)?;
        Ok(document)
    }

    /// Fills in `post_slug` and `og_image` when unset. Fields that are
    /// already set are left alone, so applying defaults twice is harmless.
    pub fn apply_defaults(&self, document: &mut SourceDocument) -> Result<()> {
        let front_matter = &mut document.front_matter;
        if front_matter.post_slug.is_none() {
            let output = document.path.replace_ext("md", "html");
            front_matter.post_slug = Some(output.with_extension("").to_slash());
        }

        if front_matter.og_image.is_some() {
            return Ok(());
        }

        let Some(emoji) = front_matter.emoji.as_deref() else {
            return Ok(());
        };

        let image = document.path.with_extension("png");
        let target = self.dist.join(&image);
        debug!(path = %target.display(), "rendering share image");
        let png = self.emoji.render_png(emoji)
            .chain_with(|| error! {
                "failed to render share image",
                "path" => document.path.display(),
            })?;

        create_parent_dirs(&target)?;
        target.write(png)?;
        front_matter.og_image = Some(image.to_slash());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::ErrorKind;
    use crate::value::Value;

    use super::*;

    /// Records how often it was asked to draw.
    #[derive(Debug, Default, Clone)]
    struct Counting(Arc<AtomicUsize>);

    impl EmojiRenderer for Counting {
        fn render_png(&self, emoji: &str) -> Result<Vec<u8>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            match emoji {
                "💥" => Err(error!("no glyph").with_kind(ErrorKind::ImageRender)),
                _ => Ok(b"png".to_vec()),
            }
        }
    }

    struct Project {
        dir: tempfile::TempDir,
        counter: Counting,
    }

    impl Project {
        fn new(files: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            for (name, contents) in files {
                let path = dir.path().join(name);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, contents).unwrap();
            }

            Project { dir, counter: Counting::default() }
        }

        fn dist(&self) -> PathBuf {
            self.dir.path().join("dist")
        }

        fn extractor(&self) -> Extractor {
            Extractor::new(self.dir.path(), self.dist(), Markdown::default())
                .with_emoji_renderer(self.counter.clone())
        }

        fn extract(&self, path: &str) -> Result<SourceDocument> {
            self.extractor().extract(Path::new(path))
        }
    }

    #[test]
    fn no_front_matter_renders_everything() {
        let text = "# Hi\n\nSome *text*.\n";
        let project = Project::new(&[("notes/hi.md", text)]);
        let document = project.extract("notes/hi.md").unwrap();

        assert!(!document.has_front_matter);
        assert_eq!(document.raw, text);
        assert_eq!(document.contents, Markdown::default().render(text).unwrap());
        assert_eq!(document.front_matter.slug(), Some("notes/hi"));
        assert_eq!(document.front_matter.og_image, None);
        assert!(document.front_matter.extra.is_empty());
    }

    #[test]
    fn front_matter_is_split_off() {
        let project = Project::new(&[
            ("a.md", "---\ntitle: A\npost_slug: custom/a\n---\n# Body\n"),
            ("b.md", "+++\ntitle = 'B'\n+++\nbody\n"),
        ]);

        let a = project.extract("a.md").unwrap();
        assert!(a.has_front_matter);
        assert_eq!(a.front_matter.slug(), Some("custom/a"));
        assert_eq!(a.front_matter.extra["title"], Value::from("A"));
        assert_eq!(a.contents, "<h1>Body</h1>\n");

        let b = project.extract("b.md").unwrap();
        assert_eq!(b.front_matter.extra["title"], Value::from("B"));
        assert_eq!(b.front_matter.slug(), Some("b"));
        assert_eq!(b.contents, "<p>body</p>\n");
    }

    #[test]
    fn non_utf8_sources_are_decoded_lossily() {
        let project = Project::new(&[]);
        fs::write(project.dir.path().join("latin1.md"), b"caf\xe9\n").unwrap();

        let document = project.extract("latin1.md").unwrap();
        assert_eq!(document.raw, "caf\u{FFFD}\n");
        assert_eq!(document.contents, "<p>caf\u{FFFD}</p>\n");
    }

    #[test]
    fn emoji_renders_share_image_once() {
        let project = Project::new(&[("blog/post.md", "---\nemoji: \"🦀\"\n---\nhi\n")]);
        let extractor = project.extractor();
        let mut document = extractor.extract(Path::new("blog/post.md")).unwrap();

        assert_eq!(document.front_matter.og_image.as_deref(), Some("blog/post.png"));
        assert_eq!(fs::read(project.dist().join("blog/post.png")).unwrap(), b"png");
        assert_eq!(project.counter.0.load(Ordering::SeqCst), 1);

        let before = document.clone();
        extractor.apply_defaults(&mut document).unwrap();
        assert_eq!(document, before);
        assert_eq!(project.counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_share_image_wins() {
        let project = Project::new(&[("p.md", "---\nemoji: \"🦀\"\nog_image: /img/p.jpg\n---\n")]);
        let document = project.extract("p.md").unwrap();

        assert_eq!(document.front_matter.og_image.as_deref(), Some("/img/p.jpg"));
        assert_eq!(project.counter.0.load(Ordering::SeqCst), 0);
        assert!(!project.dist().exists());
    }

    #[test]
    fn failures_carry_kind_and_path() {
        let project = Project::new(&[
            ("bad.md", "---\ntitle: [unclosed\n---\nbody\n"),
            ("boom.md", "---\nemoji: \"💥\"\n---\nbody\n"),
        ]);

        let error = project.extract("bad.md").unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::FrontMatter));
        assert!(error.mentions("bad.md"));

        let error = project.extract("boom.md").unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::ImageRender));
        assert!(error.mentions("boom.md"));

        let error = project.extract("missing.md").unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Filesystem));
        assert!(error.mentions("missing.md"));
    }
}
