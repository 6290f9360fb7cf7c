use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, Chainable, ErrorKind};
use crate::value::{unwrap_datetimes, Dict, Format, Json, Toml, Value, Yaml};

/// The syntax of a front-matter block, chosen by its opening fence.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrontMatterFormat {
    /// Fenced by `---`, closed by `---` or `...`.
    Yaml,
    /// Fenced by `+++`.
    Toml,
    /// Fenced by `;;;`. The block holds a single JSON object.
    Json,
}

/// A source text split into an optional front-matter block and a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// `Some` only if a complete block was found.
    pub format: Option<FrontMatterFormat>,
    pub matter: &'a str,
    pub body: &'a str,
}

impl<'a> Split<'a> {
    pub fn found(&self) -> bool {
        self.format.is_some()
    }
}

/// Splits a leading front-matter block off `input`.
///
/// The opening fence must be the very first line. Without a closing fence
/// the whole input is body and no block is reported.
pub fn split(input: &str) -> Split<'_> {
    let none = Split { format: None, matter: "", body: input };
    let Some((first, rest)) = next_line(input) else {
        return none;
    };

    let (format, closers): (_, &[&str]) = match first {
        "---" => (FrontMatterFormat::Yaml, &["---", "..."][..]),
        "+++" => (FrontMatterFormat::Toml, &["+++"][..]),
        ";;;" => (FrontMatterFormat::Json, &[";;;"][..]),
        _ => return none,
    };

    let mut cursor = rest;
    while let Some((line, remaining)) = next_line(cursor) {
        if closers.contains(&line) {
            let matter = &rest[..rest.len() - cursor.len()];
            return Split { format: Some(format), matter, body: remaining };
        }

        cursor = remaining;
    }

    none
}

/// Returns the first line of `input` without its terminator, and the rest.
/// `None` if `input` is empty.
fn next_line(input: &str) -> Option<(&str, &str)> {
    if input.is_empty() {
        return None;
    }

    let (line, rest) = match memchr::memchr(b'\n', input.as_bytes()) {
        Some(i) => (&input[..i], &input[i + 1..]),
        None => (input, ""),
    };

    Some((line.strip_suffix('\r').unwrap_or(line), rest))
}

/// Page metadata declared in front matter.
///
/// The named fields drive defaulting during extraction; everything else is
/// kept in [`FrontMatter::extra`] and exposed to templates as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(flatten)]
    pub extra: Dict,
}

impl FrontMatter {
    /// Parses the block found by [`split()`]. An empty or whitespace-only
    /// block yields the default. TOML datetimes become strings.
    pub fn parse(format: FrontMatterFormat, matter: &str) -> Result<Self> {
        if matter.trim().is_empty() {
            return Ok(FrontMatter::default());
        }

        let mut front_matter: FrontMatter = match format {
            FrontMatterFormat::Yaml => Yaml::from_str::<FrontMatter>(matter)
                .chain_with(|| error!("malformed front matter", "format" => Yaml::NAME)),
            FrontMatterFormat::Toml => Toml::from_str::<FrontMatter>(matter)
                .chain_with(|| error!("malformed front matter", "format" => Toml::NAME)),
            FrontMatterFormat::Json => Json::from_str::<FrontMatter>(matter)
                .chain_with(|| error!("malformed front matter", "format" => Json::NAME)),
        }.with_kind(ErrorKind::FrontMatter)?;

        front_matter.extra = unwrap_datetimes(std::mem::take(&mut front_matter.extra));

        for field in [&mut front_matter.post_slug, &mut front_matter.og_image, &mut front_matter.emoji] {
            if field.as_deref().map_or(false, |s| s.trim().is_empty()) {
                *field = None;
            }
        }

        Ok(front_matter)
    }

    pub fn slug(&self) -> Option<&str> {
        self.post_slug.as_deref()
    }

    /// All metadata as template values: the open map plus the named fields
    /// that are set.
    pub fn to_dict(&self) -> Dict {
        let mut dict = self.extra.clone();
        let named = [
            ("post_slug", &self.post_slug),
            ("og_image", &self.og_image),
            ("emoji", &self.emoji),
        ];

        for (key, value) in named {
            if let Some(value) = value {
                dict.insert(Arc::from(key), Value::from(value.as_str()));
            }
        }

        dict
    }
}

#[cfg(test)]
mod tests {
    use crate::dict;

    use super::*;

    #[test]
    fn splits_yaml_and_toml() {
        let yaml = split("---\ntitle: Hi\n---\n# Body\n");
        assert_eq!(yaml.format, Some(FrontMatterFormat::Yaml));
        assert_eq!(yaml.matter, "title: Hi\n");
        assert_eq!(yaml.body, "# Body\n");

        let toml = split("+++\ntitle = 'Hi'\n+++\nBody");
        assert_eq!(toml.format, Some(FrontMatterFormat::Toml));
        assert_eq!(toml.matter, "title = 'Hi'\n");
        assert_eq!(toml.body, "Body");

        let json = split(";;;\n{ \"title\": \"Hi\" }\n;;;\nBody");
        assert_eq!(json.format, Some(FrontMatterFormat::Json));
        assert_eq!(json.matter, "{ \"title\": \"Hi\" }\n");
        assert_eq!(json.body, "Body");

        let dots = split("---\na: 1\n...\nrest");
        assert!(dots.found());
        assert_eq!(dots.body, "rest");

        let crlf = split("---\r\na: 1\r\n---\r\nrest\r\n");
        assert!(crlf.found());
        assert_eq!(crlf.matter, "a: 1\r\n");
        assert_eq!(crlf.body, "rest\r\n");
    }

    #[test]
    fn absent_or_unclosed_blocks_are_body() {
        for input in ["# Just markdown\n", "", "---\nnever closed\n", " ---\na: 1\n---\n", "+++\na = 1\n---\n"] {
            let split = split(input);
            assert!(!split.found(), "{input:?}");
            assert_eq!(split.body, input);
        }
    }

    #[test]
    fn empty_block_is_found_and_default() {
        let split = split("---\n---\nbody");
        assert!(split.found());
        assert_eq!(split.matter, "");
        assert_eq!(split.body, "body");
        assert_eq!(FrontMatter::parse(FrontMatterFormat::Yaml, split.matter).unwrap(), FrontMatter::default());
    }

    #[test]
    fn named_fields_and_extra() {
        let matter = "post_slug: hello\nemoji: \"🦀\"\nog_image: ''\ntitle: Hello\ntags: [a, b]\n";
        let front_matter = FrontMatter::parse(FrontMatterFormat::Yaml, matter).unwrap();
        assert_eq!(front_matter.slug(), Some("hello"));
        assert_eq!(front_matter.emoji.as_deref(), Some("🦀"));
        assert_eq!(front_matter.og_image, None);
        assert_eq!(front_matter.extra["title"], Value::from("Hello"));

        let dict = front_matter.to_dict();
        assert_eq!(dict["post_slug"], Value::from("hello"));
        assert_eq!(dict["tags"], Value::from(vec!["a", "b"]));
        assert!(!dict.contains_key("og_image"));
    }

    #[test]
    fn json_front_matter() {
        let matter = r#"{ "post_slug": "hi", "title": "Hi", "tags": ["a"] }"#;
        let front_matter = FrontMatter::parse(FrontMatterFormat::Json, matter).unwrap();
        assert_eq!(front_matter.slug(), Some("hi"));
        assert_eq!(front_matter.extra["title"], Value::from("Hi"));
        assert_eq!(front_matter.extra["tags"], Value::from(vec!["a"]));

        let error = FrontMatter::parse(FrontMatterFormat::Json, "{ title: }").unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::FrontMatter));
        assert!(error.mentions("JSON"));
    }

    #[test]
    fn toml_datetimes_are_strings() {
        let matter = "date = 2024-01-02\nat = 2024-01-02T03:04:05Z\n[event]\nstarts = 10:30:00\n";
        let front_matter = FrontMatter::parse(FrontMatterFormat::Toml, matter).unwrap();
        assert_eq!(front_matter.extra["date"], Value::from("2024-01-02"));
        assert_eq!(front_matter.extra["at"], Value::from("2024-01-02T03:04:05Z"));
        assert_eq!(front_matter.extra["event"], Value::from(dict! { "starts" => "10:30:00" }));
    }

    #[test]
    fn malformed_front_matter() {
        let error = FrontMatter::parse(FrontMatterFormat::Toml, "title = [").unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::FrontMatter));
        assert!(error.mentions("TOML"));

        let error = FrontMatter::parse(FrontMatterFormat::Yaml, "post_slug: [1, 2]").unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::FrontMatter));
    }
}
