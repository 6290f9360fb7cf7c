#![doc = svgbobdoc::transform!(
//! A static site builder: Markdown with front matter in, HTML out.
//!
//! # Overview
//!
//! A project is a directory holding an optional `vss.toml`, a `layouts/`
//! directory of templates, an optional `static/` directory, and Markdown
//! files anywhere else. A build mirrors the Markdown tree into `dist/`,
//! rendering each `.md` file into an `.html` file through a layout:
//!
//! ```svgbob
//!  +----------+     +------------+     +---------------+
//!  | vss.toml |---->|   Config   |---->| base context  |------+
//!  +----------+     +------------+     +---------------+      |
//!                                                             v
//!  +----------+     +------------+     +---------------+   +------+   +-----------+
//!  |  *.md    |---->| Extractor  |---->| front matter  |-->| merge|-->| template  |
//!  +----------+     +-----+------+     | + contents    |   +------+   +-----+-----+
//!                         |            +---------------+                    |
//!                         | emoji                                           v
//!                         v                                          +-------------+
//!                   +------------+                                   | dist/*.html |
//!                   | dist/*.png |                                   +-------------+
//!                   +------------+
//! ```
//!
//! ## Building
//!
//! [`Builder::run()`] performs a full build:
//!
//! 1. `dist/` is removed and re-created. Builds are never incremental.
//! 2. `static/` is copied verbatim into `dist/`, if it exists.
//! 3. Markdown sources are discovered, minus `build.ignore_files`.
//! 4. Every `.html` file under `layouts/` is parsed into a
//!    [`TemplateRegistry`].
//! 5. Pages are rendered in parallel. For `blog/post.md`, the layout is the
//!    first of `layouts/blog/post.html`, `layouts/blog/default.html`, and
//!    `layouts/default.html` that exists.
//!
//! The first error aborts the build and is returned; see
//! [`ErrorKind`](error::ErrorKind) for the possible failures.
//!
//! ## Templates
//!
//! A page's template sees, in increasing priority: `contents` (the rendered
//! Markdown), the site globals from `vss.toml` including `base_url`, and the
//! page's front matter. A page without a `post_slug` gets one from its path
//! (`blog/post`); a page with an `emoji` but no `og_image` gets a rendered
//! PNG share image and an `og_image` pointing at it.
)]

#[macro_use]
pub mod error;
pub mod util;
pub mod value;
pub mod io;
pub mod config;
pub mod discover;
pub mod assets;
pub mod markdown;
pub mod templating;
pub mod context;
pub mod ogimage;
pub mod document;
pub mod page;
pub mod builder;

pub use config::Config;
pub use builder::{Builder, BuildSummary};
pub use context::RenderContext;
pub use document::{Extractor, SourceDocument};
pub use page::PageRenderer;
pub use templating::TemplateRegistry;

pub use rayon;
