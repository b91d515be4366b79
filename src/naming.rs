//! Filesystem-safe names for remote display names.
//!
//! Remote names arrive with URL escapes, spaces and assorted punctuation. Local paths
//! are a pure function of the normalized name, so two remote items whose names
//! normalize identically share a local path.

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

fn percent_escape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%[0-9a-fA-F]{2}").expect("valid percent-escape pattern"))
}

fn separator_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s+_\-:\\/]+").expect("valid separator pattern"))
}

/// Separator run for a stem that was split off an extension; inner dots become separators.
fn stem_separator_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s+_\-:.\\/]+").expect("valid stem separator pattern"))
}

/// Normalize a remote display name into a filesystem-safe name.
///
/// `%XX` escapes become `-`, runs of whitespace, `+`, `_`, `-`, `:` and path separators
/// collapse into a single `-`, and the stem never starts or ends with `-`. With
/// `has_extension` the text after the last `.` is kept verbatim as the extension.
pub fn normalize(name: &str, has_extension: bool) -> String {
    let unescaped = percent_escape().replace_all(name, "-");

    let split = if has_extension {
        unescaped.rsplit_once('.')
    } else {
        None
    };

    match split {
        Some((stem, ext)) => {
            let stem = stem_separator_run().replace_all(stem, "-");
            let ext = ext.replace(['/', '\\'], "-");
            format!("{}.{}", stem.trim_matches('-'), ext)
        }
        None => {
            let stem = separator_run().replace_all(&unescaped, "-");
            stem.trim_matches('-').to_string()
        }
    }
}

/// Normalize one directory segment: dots are separators too and the result is lowercase.
pub fn normalize_dir_name(segment: &str) -> String {
    let unescaped = percent_escape().replace_all(segment, "-");
    stem_separator_run()
        .replace_all(&unescaped, "-")
        .trim_matches('-')
        .to_lowercase()
}

/// Map a hierarchical remote folder name (`course files/Week 1`) onto a relative
/// local directory, one normalized segment per level. Empty segments are dropped.
pub fn folder_path(full_name: &str) -> PathBuf {
    full_name
        .split('/')
        .map(normalize_dir_name)
        .filter(|segment| !segment.is_empty())
        .collect()
}
