//! Embedded asset mirroring for HTML content.
//!
//! Pages, assignments, quizzes and discussions embed images and links pointing at
//! remote hosts. Each absolute `<img src>` and `<a href>` is mirrored once under the
//! page's folder, named by the blake3 digest of its URL, and the attribute is rewritten
//! to the local relative path. Rewriting is textual: only the attribute value changes,
//! so running it again over its own output fetches nothing and returns the same bytes.

use crate::error::ApiError;
use crate::mirror::store;
use crate::remote::LmsApi;
use crate::types::AssetHash;
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Matches either a comment or an `img`/`a` start tag. Comments carry no capture group
/// and are skipped, so markup inside them is never mirrored.
fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<!--.*?-->|<(img|a)\b(?:"[^"]*"|'[^']*'|[^'">])*>"#)
            .expect("valid tag pattern")
    })
}

/// One attribute inside a start tag: name, then an optional double, single or unquoted value.
fn attribute_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\s([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
            .expect("valid attribute pattern")
    })
}

/// Where a mirrored asset lives relative to its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Linked,
}

impl AssetKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetKind::Image => "img",
            AssetKind::Linked => "files",
        }
    }

    fn attribute(&self) -> &'static str {
        match self {
            AssetKind::Image => "src",
            AssetKind::Linked => "href",
        }
    }

    /// Relative reference written back into the page.
    pub fn local_reference(&self, hash: &str) -> String {
        format!("./{}/{}", self.dir_name(), hash)
    }
}

/// Stable local file name for an asset URL.
pub fn asset_hash(url: &str) -> AssetHash {
    hex::encode(blake3::hash(url.as_bytes()).as_bytes())
}

/// Only scheme-qualified network URLs are mirrored; everything else is already local.
pub fn is_remote_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn decode_attribute(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Result of rewriting one HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub html: String,
    /// Assets downloaded during this call.
    pub fetched: usize,
    /// Assets already present on disk.
    pub reused: usize,
    /// Assets whose download failed; their references are left untouched.
    pub failed: usize,
}

/// Mirrors assets embedded in HTML and points references at the local copies.
pub struct AssetRewriter<'a> {
    lms: &'a dyn LmsApi,
}

impl<'a> AssetRewriter<'a> {
    pub fn new(lms: &'a dyn LmsApi) -> Self {
        Self { lms }
    }

    /// Rewrite `html`, storing assets under `asset_dir/img` and `asset_dir/files`.
    ///
    /// A failed asset download is logged and leaves that reference as it was; the rest
    /// of the page is still processed.
    pub fn rewrite(&self, html: &str, asset_dir: &Path) -> Rewrite {
        let mut out = String::with_capacity(html.len());
        let mut last = 0;
        let mut result = Rewrite {
            html: String::new(),
            fetched: 0,
            reused: 0,
            failed: 0,
        };

        for caps in tag_pattern().captures_iter(html) {
            let (Some(tag), Some(element)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let kind = if element.as_str().eq_ignore_ascii_case("img") {
                AssetKind::Image
            } else {
                AssetKind::Linked
            };

            let Some((value_range, url)) = find_attribute(tag.as_str(), kind) else {
                continue;
            };
            if !is_remote_url(&url) {
                continue;
            }

            let hash = asset_hash(&url);
            match self.mirror_asset(&url, &hash, kind, asset_dir) {
                Ok(true) => result.fetched += 1,
                Ok(false) => result.reused += 1,
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to mirror asset");
                    result.failed += 1;
                    continue;
                }
            }

            let start = tag.start() + value_range.start;
            let end = tag.start() + value_range.end;
            out.push_str(&html[last..start]);
            out.push_str(&kind.local_reference(&hash));
            last = end;
        }

        out.push_str(&html[last..]);
        result.html = out;
        result
    }

    /// Download the asset unless a copy already exists. Returns whether it was fetched.
    fn mirror_asset(
        &self,
        url: &str,
        hash: &str,
        kind: AssetKind,
        asset_dir: &Path,
    ) -> Result<bool, ApiError> {
        let path = asset_dir.join(kind.dir_name()).join(hash);
        if path.is_file() {
            debug!(url, "asset already mirrored");
            return Ok(false);
        }
        debug!(url, path = %path.display(), "downloading asset");
        store::download_to(self.lms, url, &path)?;
        Ok(true)
    }
}

/// Locate the value of the asset attribute inside a start tag.
///
/// Returns the byte range of the raw value within `tag` and the decoded URL.
fn find_attribute(tag: &str, kind: AssetKind) -> Option<(Range<usize>, String)> {
    let caps = attribute_pattern()
        .captures_iter(tag)
        .find(|caps| {
            caps.get(1)
                .is_some_and(|name| name.as_str().eq_ignore_ascii_case(kind.attribute()))
        })?;
    let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;
    Some((value.range(), decode_attribute(value.as_str())))
}
