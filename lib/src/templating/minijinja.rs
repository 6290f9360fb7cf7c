use std::path::Path;

use minijinja::{Environment, path_loader};
use minijinja::value::Value;

use crate::context::RenderContext;
use crate::error::Result;
use crate::templating::{Engine, EngineInit};

/// The default engine: Jinja2-style templates rendered by `minijinja`.
///
/// Templates named `*.html` auto-escape interpolated strings; the page's
/// `contents` is trusted markup and is never escaped. Besides the built-ins,
/// templates can call `url(path, ...)` and `now()` and use the `date(fmt)`
/// and `split(pat, n?)` filters.
#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl EngineInit for MiniJinjaEngine {
    type Engine = Self;

    fn init(layouts_root: &Path) -> Self::Engine {
        let mut env = Environment::new();
        env.set_loader(path_loader(layouts_root));
        env.add_function("url", ext::url);
        env.add_function("now", ext::now);
        env.add_filter("date", ext::date);
        env.add_filter("split", ext::split);
        MiniJinjaEngine { env }
    }
}

impl Engine for MiniJinjaEngine {
    fn load(&self, name: &str) -> Result<()> {
        self.env.get_template(name)?;
        Ok(())
    }

    fn render(&self, name: &str, context: &RenderContext) -> Result<String> {
        let template = self.env.get_template(name)?;
        let context = Value::from(context.to_value());
        Ok(template.render(context)?)
    }
}

mod ext {
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveTime, NaiveDateTime, DateTime, Utc};
    use minijinja::{value::{intern, Rest, Value}, Error, ErrorKind, State};

    /// Joins `parts` onto the site's `base_url` with single slashes.
    pub fn url<'a>(state: &'a State<'a, 'a>, parts: Rest<Arc<str>>) -> Result<Value, Error> {
        let base = state.lookup("base_url")
            .filter(|v| !v.is_undefined() && !v.is_none())
            .ok_or_else(|| Error::new(
                ErrorKind::MissingArgument,
                "expected `base_url` in context but it wasn't found"
            ))?;

        let base = base.as_str()
            .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "`base_url` must be a string"))?;

        let mut url = base.trim_end_matches('/').to_string();
        for part in parts.iter() {
            let part = part.trim_matches('/');
            if !part.is_empty() {
                url.push('/');
                url.push_str(part);
            }
        }

        if url.is_empty() {
            url.push('/');
        }

        Ok(Value::from_safe_string(url))
    }

    pub fn date(value: Value, fmt: &str) -> Result<Value, Error> {
        if let Ok(ts) = i64::try_from(value.clone()) {
            let datetime = DateTime::<Utc>::from_timestamp(ts, 0)
                .ok_or_else(|| Error::new(
                    ErrorKind::InvalidOperation,
                    "invalid timestamp provided to `date`"
                ))?;

            return Ok(datetime.format(fmt).to_string().into());
        }

        let string = value.as_str()
            .ok_or_else(|| Error::new(
                ErrorKind::InvalidOperation,
                format!("`date` must be applied to a string or integer, found {}", value.kind())
            ))?;

        let datetime = string.parse::<NaiveDate>().map(|d| d.format(fmt))
            .or_else(|_| string.parse::<NaiveTime>().map(|t| t.format(fmt)))
            .or_else(|_| string.parse::<NaiveDateTime>().map(|dt| dt.format(fmt)))
            .or_else(|_| string.parse::<DateTime<Utc>>().map(|dt| dt.format(fmt)))
            .map_err(|e| Error::new(
                ErrorKind::InvalidOperation,
                format!("failed to parse {string}: {e}")
            ))?;

        Ok(datetime.to_string().into())
    }

    pub fn split(value: &str, pat: &str, n: Option<usize>) -> Result<Value, Error> {
        match n {
            Some(n) => Ok(value.split(pat).nth(n).map(Value::from).unwrap_or(Value::UNDEFINED)),
            None => Ok(value.split(pat).map(intern).collect()),
        }
    }

    pub fn now() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }
}

mod value_object {
    use std::sync::Arc;
    use minijinja::value::{MapObject, SeqObject, Value};

    use crate::value;

    #[derive(Debug)]
    pub struct DictObject(pub Arc<value::Dict>);

    #[derive(Debug)]
    pub struct ArrayObject(pub Arc<Vec<value::Value>>);

    impl MapObject for DictObject {
        fn get_field(self: &Arc<Self>, key: &Value) -> Option<Value> {
            self.0.get(key.as_str()?)
                .cloned()
                .map(Value::from)
        }

        fn fields(self: &Arc<Self>) -> Vec<Value> {
            self.0.keys()
                .cloned()
                .map(Value::from)
                .collect()
        }

        fn field_count(self: &Arc<Self>) -> usize {
            self.0.len()
        }
    }

    impl SeqObject for ArrayObject {
        fn get_item(self: &Arc<Self>, idx: usize) -> Option<Value> {
            self.0.get(idx)
                .cloned()
                .map(Value::from)
        }

        fn item_count(self: &Arc<Self>) -> usize {
            self.0.len()
        }
    }

    impl From<value::Value> for Value {
        fn from(value: value::Value) -> Self {
            use crate::value::Value;

            match value {
                Value::Null => Self::from(()),
                Value::Bool(b) => Self::from(b),
                Value::Num(n) => match n.to_u128_lossy() {
                    Ok(v) => Self::from(v),
                    Err(v) => Self::from(v),
                },
                Value::Float(f) => Self::from(f),
                Value::String(s) => Self::from(s),
                Value::Html(s) => Self::from_safe_string(s.to_string()),
                Value::Array(a) => Self::from_any_seq_object(Arc::new(ArrayObject(a))),
                Value::Dict(d) => Self::from_any_map_object(Arc::new(DictObject(d))),
            }
        }
    }
}

impl_error_detail_with_std_error!(minijinja::Error);

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use crate::context::RenderContext;
    use crate::dict;
    use crate::error::ErrorKind;
    use crate::templating::TemplateRegistry;
    use crate::value::Value;

    use super::*;

    fn layouts(files: &[(&str, &str)]) -> (tempfile::TempDir, Vec<PathBuf>) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }

        let names = files.iter().map(|(name, _)| PathBuf::from(name)).collect();
        (dir, names)
    }

    fn render(template: &str, context: crate::value::Dict) -> crate::error::Result<String> {
        let (dir, files) = layouts(&[("default.html", template)]);
        let registry = TemplateRegistry::load::<MiniJinjaEngine>(dir.path(), &files)?;
        let template = registry.resolve(Path::new("page.html"))?;
        template.render(&RenderContext::from(context))
    }

    #[test]
    fn contents_is_trusted_and_strings_are_escaped() {
        let html = render("<main>{{ contents }}</main><h1>{{ title }}</h1>", dict! {
            "contents" => Value::html("<p>Hi & bye</p>"),
            "title" => "Tom & <Jerry>",
        }).unwrap();

        assert_eq!(html, "<main><p>Hi & bye</p></main><h1>Tom &amp; &lt;Jerry&gt;</h1>");
    }

    #[test]
    fn nested_values_and_missing_keys() {
        let html = render("{{ site.name }}|{% for t in tags %}{{ t }};{% endfor %}|{{ nope }}|{{ n + 1 }}", dict! {
            "site" => dict! { "name" => "vss" },
            "tags" => vec!["a", "b"],
            "n" => 41u8,
        }).unwrap();

        assert_eq!(html, "vss|a;b;||42");
    }

    #[test]
    fn helpers() {
        let html = render("{{ url('/blog/', 'post.html') }} {{ 'a-b-c' | split('-', 1) }} {{ 0 | date('%Y') }}", dict! {
            "base_url" => "https://example.com/",
        }).unwrap();

        assert_eq!(html, "https://example.com/blog/post.html b 1970");

        let html = render("{{ '2024-03-09' | date('%d.%m.%Y') }}", dict! {}).unwrap();
        assert_eq!(html, "09.03.2024");
    }

    #[test]
    fn parse_and_render_errors_are_tagged() {
        let error = render("{% if %}", dict! {}).unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::TemplateParse));
        assert!(error.mentions("default.html"));

        let error = render("{{ url('x') }}", dict! {}).unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::TemplateRender));
    }
}
