use anyhow::{anyhow, Result};
use regex::{Captures, Regex};
use std::str::FromStr;
use std::sync::OnceLock;

pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Decode at most once, and only when `%XX` octets are present.
    #[default]
    Once,
    /// Up to two passes; a pass producing control characters or U+FFFD
    /// reverts to the raw value.
    Strict,
}

impl FromStr for DecodePolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "strict" => Ok(Self::Strict),
            other => Err(anyhow!(
                "unknown stat decode policy '{}' (expected once or strict)",
                other
            )),
        }
    }
}

fn escape_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"%[0-9A-Fa-f]{2}").expect("valid escape pattern"))
}

fn percent_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"%([0-9A-Fa-f]{2})?").expect("valid percent pattern"))
}

pub fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn has_percent_escape(value: &str) -> bool {
    escape_pattern().is_match(value)
}

pub fn normalize_stat(raw: &str, policy: DecodePolicy, max_len: usize) -> String {
    let decoded = match policy {
        DecodePolicy::Once => decode_once(raw),
        DecodePolicy::Strict => decode_strict(raw),
    };
    truncate_with_ellipsis(&decoded, max_len)
}

pub fn decode_once(raw: &str) -> String {
    let value = raw.replace('+', " ");
    if !has_percent_escape(&value) {
        return value;
    }
    decode_pass(&value).unwrap_or(value)
}

pub fn decode_strict(raw: &str) -> String {
    let original = raw.replace('+', " ");
    let mut current = original.clone();
    for _ in 0..2 {
        if !has_percent_escape(&current) {
            break;
        }
        let Some(decoded) = decode_pass(&current) else {
            break;
        };
        if decoded
            .chars()
            .any(|ch| ch.is_control() || ch == char::REPLACEMENT_CHARACTER)
        {
            return original;
        }
        current = decoded;
    }
    current
}

pub fn truncate_with_ellipsis(value: &str, max_len: usize) -> String {
    match value.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}{}", &value[..cut], ELLIPSIS),
        None => value.to_string(),
    }
}

/// One decode attempt, then one retry with stray `%` escaped to `%25`.
fn decode_pass(value: &str) -> Option<String> {
    if let Ok(decoded) = decode_component(value) {
        return Some(decoded);
    }
    decode_component(&sanitize_stray_percent(value)).ok()
}

fn decode_component(value: &str) -> Result<String> {
    let escapes = escape_pattern().find_iter(value).count();
    let percents = value.matches('%').count();
    if escapes != percents {
        return Err(anyhow!("malformed percent escape"));
    }
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|err| anyhow!("percent escape is not UTF-8: {}", err))
}

fn sanitize_stray_percent(value: &str) -> String {
    percent_pattern()
        .replace_all(value, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                caps[0].to_string()
            } else {
                "%25".to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_replaces_markup_characters() {
        let escaped = escape_xml(r#"<a href="x">Tom & Jerry's</a>"#);
        assert_eq!(
            escaped,
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;"
        );
        for raw in ['<', '>', '"', '\''] {
            assert!(!escaped.contains(raw));
        }
        assert!(escaped.split('&').skip(1).all(|chunk| {
            ["amp;", "lt;", "gt;", "quot;", "apos;"]
                .iter()
                .any(|entity| chunk.starts_with(entity))
        }));
    }

    #[test]
    fn values_without_escapes_pass_through() {
        for value in ["100%", "50% off", "plain", "%zz", "%4", "♥"] {
            assert_eq!(decode_once(value), value);
            assert_eq!(decode_strict(value), value);
        }
    }

    #[test]
    fn plus_becomes_space() {
        assert_eq!(decode_once("a+b"), "a b");
    }

    #[test]
    fn encoded_percent_decodes_once() {
        assert_eq!(decode_once("10%25"), "10%");
        assert_eq!(decode_once("10%2525"), "10%25");
    }

    #[test]
    fn encoded_component_round_trips() {
        for value in ["HP 120 / MP 30", "♥ 사랑 ♥", "a&b=c?d", "100% sure"] {
            let encoded = urlencoding::encode(value).into_owned();
            assert_eq!(decode_once(&encoded), value);
            assert_eq!(decode_strict(&encoded), value);
        }
    }

    #[test]
    fn stray_percent_is_sanitized_before_decoding() {
        assert_eq!(decode_once("50% %E2%99%A5"), "50% ♥");
        assert_eq!(decode_once("%%41"), "%A");
        assert_eq!(sanitize_stray_percent("5% %41 %"), "5%25 %41 %25");
    }

    #[test]
    fn invalid_utf8_falls_back_to_raw_value() {
        assert_eq!(decode_once("bad %FF byte"), "bad %FF byte");
        assert_eq!(decode_strict("bad %FF byte"), "bad %FF byte");
    }

    #[test]
    fn strict_decodes_twice() {
        assert_eq!(decode_strict("%25E2%2599%25A5"), "♥");
        assert_eq!(decode_once("%25E2%2599%25A5"), "%E2%99%A5");
    }

    #[test]
    fn strict_rejects_control_characters() {
        assert_eq!(decode_strict("line%0Abreak"), "line%0Abreak");
        assert_eq!(decode_strict("bad%EF%BF%BD"), "bad%EF%BF%BD");
        assert_eq!(decode_once("line%0Abreak"), "line\nbreak");
    }

    #[test]
    fn truncation_appends_ellipsis_only_when_needed() {
        assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
        assert_eq!(truncate_with_ellipsis("abcd", 3), "abc...");
        assert_eq!(truncate_with_ellipsis("가나다라", 2), "가나...");
    }

    #[test]
    fn capped_stat_never_exceeds_limit_plus_ellipsis() {
        let raw = "<&>".repeat(300);
        let stat = normalize_stat(&raw, DecodePolicy::Once, 400);
        assert_eq!(stat.chars().count(), 400 + ELLIPSIS.len());
        assert!(!escape_xml(&stat).contains('<'));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("once".parse::<DecodePolicy>().unwrap(), DecodePolicy::Once);
        assert_eq!(" Strict ".parse::<DecodePolicy>().unwrap(), DecodePolicy::Strict);
        assert!("twice".parse::<DecodePolicy>().is_err());
    }
}
