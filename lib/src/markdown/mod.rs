mod markdown;
mod highlight;
mod raw_html;
mod frontmatter;

pub use markdown::*;
pub use highlight::*;
pub use raw_html::*;
pub use frontmatter::*;
