//! Slug normalisation

use regex::Regex;
use std::sync::OnceLock;

fn separator_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s_-]+").expect("valid regex"))
}

fn disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9-]").expect("valid regex"))
}

fn hyphen_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-{2,}").expect("valid regex"))
}

/// Lower-case, hyphen-delimited `[a-z0-9-]` form of `raw`.
///
/// Total and idempotent. Input made only of symbols yields `""`; rejecting
/// that is up to the caller.
pub fn format_slug(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let hyphenated = separator_runs().replace_all(lowered.trim(), "-");
    let stripped = disallowed().replace_all(&hyphenated, "");
    let collapsed = hyphen_runs().replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

/// Append `-{locale}` for localized fields unless already present
pub fn ensure_locale_suffix(slug: &str, locale: Option<&str>, localized: bool) -> String {
    match locale.map(str::trim).filter(|l| !l.is_empty()) {
        Some(locale) if localized && !slug.ends_with(&format!("-{}", locale)) => {
            format!("{}-{}", slug, locale)
        }
        _ => slug.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_basic() {
        assert_eq!(format_slug("  Hello World  "), "hello-world");
        assert_eq!(format_slug("Spring_Festival -- Gala"), "spring-festival-gala");
        assert_eq!(format_slug("What's new?"), "whats-new");
        assert_eq!(format_slug("a ! b"), "a-b");
        assert_eq!(format_slug("Café au lait"), "caf-au-lait");
        assert_eq!(format_slug("Top 10 Tips"), "top-10-tips");
    }

    #[test]
    fn test_format_is_total() {
        assert_eq!(format_slug(""), "");
        assert_eq!(format_slug("   \t\n "), "");
        assert_eq!(format_slug("!!!"), "");
        assert_eq!(format_slug("---___"), "");
        assert_eq!(format_slug("你好"), "");
    }

    #[test]
    fn test_format_is_idempotent() {
        let samples = [
            "",
            "Hello World",
            "-leading and trailing-",
            "a - ! - b",
            "MiXeD_case__with   spaces",
            "emoji 🎉 party",
            "İstanbul straße",
            "x\u{00a0}y",
            "!!!",
            "a--b",
        ];

        for sample in samples {
            let once = format_slug(sample);
            assert_eq!(format_slug(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_ensure_locale_suffix() {
        assert_eq!(ensure_locale_suffix("hello", Some("en"), true), "hello-en");
        assert_eq!(ensure_locale_suffix("hello-en", Some("en"), true), "hello-en");
        assert_eq!(ensure_locale_suffix("hello", Some("en"), false), "hello");
        assert_eq!(ensure_locale_suffix("hello", None, true), "hello");
        assert_eq!(ensure_locale_suffix("hello", Some(""), true), "hello");
    }
}
