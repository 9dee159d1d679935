use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

lazy_static! {
    static ref VERSIONED_SEGMENT: Regex = Regex::new(r"/v\d+(/|$|\?)").unwrap();
}

const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs"];
const STYLESHEET_EXTENSIONS: &[&str] = &["css"];
const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "otf", "eot"];
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "avif", "bmp",
];
const PAGE_EXTENSIONS: &[&str] = &["html", "htm", "php", "aspx", "jsp"];

/// Coarse resource category derived from the URL alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "JavaScript")]
    Script,
    #[serde(rename = "CSS")]
    Stylesheet,
    Font,
    Image,
    #[serde(rename = "API")]
    Api,
    #[serde(rename = "HTML")]
    Page,
    Other,
}

impl ResourceType {
    /// Every type, in reporting order.
    pub const ALL: [ResourceType; 7] = [
        ResourceType::Script,
        ResourceType::Stylesheet,
        ResourceType::Font,
        ResourceType::Image,
        ResourceType::Api,
        ResourceType::Page,
        ResourceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Script => "JavaScript",
            ResourceType::Stylesheet => "CSS",
            ResourceType::Font => "Font",
            ResourceType::Image => "Image",
            ResourceType::Api => "API",
            ResourceType::Page => "HTML",
            ResourceType::Other => "Other",
        }
    }

    /// Duration assumed for an unmatched start when no real sample of this
    /// type has been completed yet.
    pub fn default_duration_ms(&self) -> f64 {
        match self {
            ResourceType::Script => 800.0,
            ResourceType::Stylesheet => 300.0,
            ResourceType::Font => 400.0,
            ResourceType::Image => 500.0,
            ResourceType::Api => 1200.0,
            ResourceType::Page => 600.0,
            ResourceType::Other => 500.0,
        }
    }

    /// Remediation advice attached to recommendations about this type.
    pub fn suggestion(&self) -> &'static str {
        match self {
            ResourceType::Script => {
                "Split bundles, defer non-critical scripts, and enable minification and compression"
            }
            ResourceType::Stylesheet => {
                "Inline critical CSS, remove unused rules, and load the rest asynchronously"
            }
            ResourceType::Font => {
                "Preload key fonts, subset glyphs, serve WOFF2, and use font-display: swap"
            }
            ResourceType::Image => {
                "Compress images, serve WebP/AVIF, size them responsively, and lazy-load offscreen images"
            }
            ResourceType::Api => {
                "Cache responses, batch or paginate calls, and check server-side query performance"
            }
            ResourceType::Page => {
                "Reduce server response time, enable caching, and stream the document early"
            }
            ResourceType::Other => {
                "Check whether the resource is needed, cache it, and serve it from a CDN"
            }
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a URL by case-insensitive extension and path heuristics.
///
/// Checks run in a fixed order and the first hit wins: script, stylesheet,
/// font, image, API markers, `polyfill`, page markers, then other.
pub fn classify(url: &str) -> ResourceType {
    let lower = url.to_lowercase();

    if has_extension(&lower, SCRIPT_EXTENSIONS) {
        return ResourceType::Script;
    }
    if has_extension(&lower, STYLESHEET_EXTENSIONS) {
        return ResourceType::Stylesheet;
    }
    if has_extension(&lower, FONT_EXTENSIONS) {
        return ResourceType::Font;
    }
    if has_extension(&lower, IMAGE_EXTENSIONS) {
        return ResourceType::Image;
    }
    if lower.contains("/api/") || lower.contains("api.") || VERSIONED_SEGMENT.is_match(&lower) {
        return ResourceType::Api;
    }
    if lower.contains("polyfill") {
        return ResourceType::Script;
    }
    if has_extension(&lower, PAGE_EXTENSIONS) || is_document_path(&lower) {
        return ResourceType::Page;
    }

    ResourceType::Other
}

/// True when `.ext` appears followed by end of string, `?`, or `#`.
fn has_extension(url: &str, extensions: &[&str]) -> bool {
    extensions.iter().any(|ext| {
        let needle = format!(".{}", ext);
        url.match_indices(&needle).any(|(idx, _)| {
            matches!(url[idx + needle.len()..].chars().next(), None | Some('?') | Some('#'))
        })
    })
}

/// Site root or directory index. A bare host such as `https://x.com` has
/// an empty path, which parses to `/`.
fn is_document_path(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().ends_with('/'),
        Err(_) => {
            let without_query = url.split(['?', '#']).next().unwrap_or(url);
            without_query.ends_with('/')
        }
    }
}
