//! Alias normalization for platform resources

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Alias reserved by the platform
pub const FORBIDDEN_ALIAS: &str = "INIT";

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ -]").expect("valid separator regex"))
}

fn invalid_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid alias regex"))
}

/// Replace the reserved alias with `ALIAS_INIT`, leave anything else untouched
pub fn fix_forbidden_alias(alias: &str) -> String {
    if alias.eq_ignore_ascii_case(FORBIDDEN_ALIAS) {
        format!("ALIAS_{}", FORBIDDEN_ALIAS)
    } else {
        alias.to_string()
    }
}

/// Derive an identifier-safe alias from a display name
///
/// Accents are stripped through NFD decomposition, spaces and dashes become
/// underscores and every other character outside `[A-Za-z0-9_]` is dropped.
/// Results shorter than two characters fall back to `default_alias`.
pub fn normalize_name_to_alias(name: &str, default_alias: &str) -> String {
    let ascii: String = name.nfd().filter(char::is_ascii).collect();
    let underscored = separators().replace_all(&ascii, "_");
    let alias = invalid_chars().replace_all(&underscored, "");

    if alias.chars().count() < 2 {
        fix_forbidden_alias(default_alias)
    } else {
        fix_forbidden_alias(&alias)
    }
}
