//! Self-contained HTML report.
//!
//! Rendering is a pure function of the [`ReportModel`], the [`Mode`] and a
//! preview-URL builder. In watch mode the page refreshes itself every
//! [`REFRESH_SECS`] seconds so the live server's latest report shows up
//! without manual reloads.
//!
//! Layout:
//! - summary list with sizes and counts for all/used/unused
//! - one table row per image: preview, path, size, status
//! - used rows first, then unused rows (highlighted)

use std::borrow::Cow;
use std::fmt::Write;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;
use url::Url;

use crate::config::Mode;
use crate::model::ReportModel;
use crate::report::format_size;
use crate::scan::AssetRecord;

/// Reload interval for watch-mode reports.
pub const REFRESH_SECS: u32 = 2;

/// Path of the live server's preview endpoint.
pub const PREVIEW_ENDPOINT: &str = "/preview";

/// Path of the live server's favicon endpoint.
pub const FAVICON_ENDPOINT: &str = "/favicon.ico";

/// Content type of an embedded `.ico` page icon.
const ICON_CONTENT_TYPE: &str = "image/x-icon";

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Extra head/link data that is not part of the report model.
#[derive(Debug, Clone, Default)]
pub struct HtmlContext {
    /// `href` of the page icon, if the project has one.
    pub favicon_href: Option<String>,
}

/// Escape HTML special characters. Borrows when nothing needs escaping.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(&['<', '>', '&', '"', '\''][..]) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Direct `file://` reference to a local file.
pub fn file_url(path: &Path) -> String {
    Url::from_file_path(path)
        .map(String::from)
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

/// Inline `data:` URI carrying the icon bytes, so a static report opened
/// from anywhere still shows its icon. `None` if the file cannot be read.
pub fn favicon_data_uri(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(format!(
            "data:{};base64,{}",
            ICON_CONTENT_TYPE,
            general_purpose::STANDARD.encode(bytes)
        )),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "favicon not embedded");
            None
        }
    }
}

/// Indirect reference through the live server's preview endpoint.
pub fn preview_url(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!(
        "{}?path={}",
        PREVIEW_ENDPOINT,
        utf8_percent_encode(&raw, URI_COMPONENT)
    )
}

impl Mode {
    /// Preview-URL builder matching this mode.
    pub fn preview_url_builder(self) -> fn(&Path) -> String {
        match self {
            Mode::Static => file_url,
            Mode::Watch => preview_url,
        }
    }
}

/// Render the report page.
pub fn render_html(
    model: &ReportModel,
    mode: Mode,
    context: &HtmlContext,
    preview: impl Fn(&Path) -> String,
) -> String {
    // ~300 bytes per row + fixed head/summary
    let mut html = String::with_capacity(2048 + model.all_assets.len() * 300);

    // Writing into a String cannot fail
    let _ = write_document(&mut html, model, mode, context, &preview);
    html
}

fn write_document(
    html: &mut String,
    model: &ReportModel,
    mode: Mode,
    context: &HtmlContext,
    preview: &dyn Fn(&Path) -> String,
) -> std::fmt::Result {
    let title = escape_html(&model.project_name);

    write!(html, "<!doctype html><html><head><meta charset=\"utf-8\">")?;
    if mode == Mode::Watch {
        write!(html, "<meta http-equiv=\"refresh\" content=\"{REFRESH_SECS}\">")?;
    }
    if let Some(href) = &context.favicon_href {
        write!(html, "<link rel=\"icon\" href=\"{}\">", escape_html(href))?;
    }
    write!(html, "<title>{title} - Image Assets</title>")?;
    html.push_str(STYLE);
    write!(html, "</head><body><h1>Image Asset Report</h1>")?;
    write!(
        html,
        "<p class=\"meta\">{title} &middot; {} mode &middot; generated {}</p>",
        mode,
        model.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;

    write!(html, "<ul class=\"summary\">")?;
    write!(html, "<li>Total size: {}</li>", format_size(model.totals.all))?;
    write!(html, "<li>Used size: {}</li>", format_size(model.totals.used))?;
    write!(html, "<li>Unused size: {}</li>", format_size(model.totals.unused))?;
    write!(html, "<li>Total count: {}</li>", model.counts.all)?;
    write!(html, "<li>Used count: {}</li>", model.counts.used)?;
    write!(html, "<li>Unused count: {}</li>", model.counts.unused)?;
    write!(html, "</ul>")?;

    write!(
        html,
        "<table><thead><tr><th>Preview</th><th>Path</th><th>Size</th><th>Status</th></tr></thead><tbody>"
    )?;
    for asset in &model.used_assets {
        write_row(html, asset, preview, false)?;
    }
    for asset in &model.unused_assets {
        write_row(html, asset, preview, true)?;
    }
    write!(html, "</tbody></table></body></html>")
}

fn write_row(
    html: &mut String,
    asset: &AssetRecord,
    preview: &dyn Fn(&Path) -> String,
    unused: bool,
) -> std::fmt::Result {
    let (class, status) = if unused {
        (" class=\"unused\"", "unused")
    } else {
        ("", "used")
    };
    write!(
        html,
        "<tr{class}><td><img src=\"{}\" alt=\"\" loading=\"lazy\"></td><td>{}</td><td>{}</td><td>{status}</td></tr>",
        escape_html(&preview(&asset.absolute_path)),
        escape_html(&asset.relative_path),
        format_size(asset.size_bytes),
    )
}

const STYLE: &str = "<style>\
body{font-family:system-ui,-apple-system,Segoe UI,Roboto,Helvetica,Arial;margin:24px}\
.meta{color:#666}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #ddd;padding:8px}\
th{background:#f7f7f7;text-align:left}\
td img{max-width:64px;max-height:64px;object-fit:contain}\
tr.unused{color:#2e7d32}\
</style>";
