//! Template rendering using the Tera template engine
//!
//! A default theme is embedded in the binary. Any `*.html` file found in the
//! site's templates directory is loaded on top of it, so a site can override a
//! single template (say `post.html`) and keep the rest.

use anyhow::{Context as _, Result};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

use crate::content::parse_date;
use walkdir::WalkDir;

/// Subdirectory of the templates directory copied verbatim to `output/static`
pub const STATIC_DIR: &str = "static";

/// Template used for each post
pub const POST_TEMPLATE: &str = "post";
/// Template used for each page
pub const PAGE_TEMPLATE: &str = "page";
/// Template used for the home listing
pub const INDEX_TEMPLATE: &str = "index";
/// Template used for each tag listing
pub const TAG_TEMPLATE: &str = "tag";

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("default/base.html")),
    ("index.html", include_str!("default/index.html")),
    ("post.html", include_str!("default/post.html")),
    ("page.html", include_str!("default/page.html")),
    ("tag.html", include_str!("default/tag.html")),
    ("partials/nav.html", include_str!("default/partials/nav.html")),
    (
        "partials/post_list.html",
        include_str!("default/partials/post_list.html"),
    ),
    (
        "partials/pagination.html",
        include_str!("default/partials/pagination.html"),
    ),
];

/// Static assets of the default theme, relative to `output/static`
pub const DEFAULT_STATIC: &[(&str, &str)] =
    &[("style.css", include_str!("default/static/style.css"))];

/// Template renderer for a site
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Renderer with the built-in theme only
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // `.html` templates autoescape; rendered content is marked `| safe`
        tera.set_escape_fn(escape_html);

        tera.add_raw_templates(DEFAULT_TEMPLATES.to_vec())?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Renderer with the built-in theme overridden by the site's templates
    pub fn load(templates_dir: &Path) -> Result<Self> {
        let mut renderer = Self::new()?;

        let files = template_files(templates_dir)?;
        if !files.is_empty() {
            tracing::debug!("Loading {} templates from {:?}", files.len(), templates_dir);
            renderer
                .tera
                .add_template_files(files)
                .with_context(|| format!("Failed to load templates from {:?}", templates_dir))?;
        }

        Ok(renderer)
    }

    /// Render the named template (`post`, `page`, ...) with the given context
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        let template = format!("{}.html", name);
        self.tera
            .render(&template, context)
            .with_context(|| format!("Failed to render template {:?}", template))
    }
}

/// `*.html` files under `templates_dir` (outside `static/`), named by their
/// path relative to the directory
fn template_files(templates_dir: &Path) -> Result<Vec<(PathBuf, Option<String>)>> {
    if !templates_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(templates_dir)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to list {:?}", templates_dir))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("html")
        {
            continue;
        }

        let relative = path.strip_prefix(templates_dir)?;
        if relative.starts_with(STATIC_DIR) {
            continue;
        }
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((path.to_path_buf(), Some(name)));
    }

    Ok(files)
}

/// Copy the site's static folder into `dest`, or the built-in assets when the
/// site has none
pub fn copy_static(templates_dir: &Path, dest: &Path) -> Result<()> {
    let static_dir = templates_dir.join(STATIC_DIR);
    fs::create_dir_all(dest).with_context(|| format!("Failed to create {:?}", dest))?;

    if !static_dir.is_dir() {
        for (name, content) in DEFAULT_STATIC {
            let path = dest.join(name);
            fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
        }
        return Ok(());
    }

    copy_dir(&static_dir, dest)
}

/// Recursively copy the contents of `src` into `dest`
pub fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to list {:?}", src))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {:?}", target))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {:?} to {:?}", entry.path(), target)
            })?;
            tracing::debug!("Copied: {:?} -> {:?}", entry.path(), target);
        }
    }
    Ok(())
}

/// Escape text for HTML element content and quoted attributes. Unlike
/// Tera's default, `/` is left alone so URLs stay readable.
fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(c),
        }
    }
    output
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    Ok(tera::Value::String(result))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Tera filter: format an ISO date with a chrono format string
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%B %d, %Y".to_string(),
    };

    // Show the calendar date as written, even when an offset is given
    let date = match chrono::DateTime::parse_from_rfc3339(s.trim()) {
        Ok(datetime) => datetime.date_naive(),
        Err(_) => match parse_date(&s) {
            Some(datetime) => datetime.date(),
            None => return Ok(tera::Value::String(s)),
        },
    };

    // An invalid format string makes chrono's Display fail
    let mut formatted = String::new();
    write!(formatted, "{}", date.format(&format))
        .map_err(|_| tera::Error::msg(format!("Invalid date format {:?}", format)))?;
    Ok(tera::Value::String(formatted))
}
