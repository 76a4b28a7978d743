//! Locale descriptors and the injectable locale-resolution service.
//!
//! A [`Culture`] carries everything the value converters need for
//! locale-aware parsing and rendering: date patterns (in `chrono` strftime
//! syntax) and number separators. [`LocaleService`] resolves culture tokens
//! found in the data (a designated culture column may hold `"de-DE"`,
//! `"DEU"` or `"DE"`) against a table of known locales.
//!
//! The service is constructed explicitly and passed where it is needed;
//! there is no process-wide cache. Building one allocates the full lookup
//! table (a few dozen entries), so share it via `Arc` when several
//! processors use the same locales.

use std::collections::HashMap;
use std::sync::Arc;

/// A locale descriptor governing date/number parsing and formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Culture {
    /// IETF-style tag, e.g. `"de-DE"`. Empty for the invariant culture.
    pub tag: String,
    /// Two-letter lowercase language code, e.g. `"de"`.
    pub language: String,
    /// Two-letter uppercase country code, e.g. `"DE"`.
    pub country: String,
    /// Date/date-time patterns tried in order when parsing.
    pub date_patterns: Vec<&'static str>,
    pub decimal_separator: char,
    pub group_separator: char,
}

impl Culture {
    /// The invariant culture: ISO date patterns, `.` decimal separator.
    pub fn invariant() -> Self {
        Culture {
            tag: String::new(),
            language: String::new(),
            country: String::new(),
            date_patterns: ISO_PATTERNS.to_vec(),
            decimal_separator: '.',
            group_separator: ',',
        }
    }

    pub fn is_invariant(&self) -> bool {
        self.tag.is_empty()
    }

    /// Display name used in error messages; `"invariant"` for the invariant
    /// culture.
    pub fn name(&self) -> &str {
        if self.tag.is_empty() { "invariant" } else { &self.tag }
    }
}

pub(crate) const ISO_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%Y%m%d",
];

const DMY_DOT: &[&str] = &[
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y",
    "%d.%m.%y",
];

const DMY_SLASH: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y",
    "%d/%m/%y",
];

const MDY_SLASH: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y",
    "%m/%d/%y",
];

struct LocaleSpec {
    tag: &'static str,
    region3: &'static str,
    date_patterns: &'static [&'static str],
    decimal_separator: char,
    group_separator: char,
}

const LOCALES: &[LocaleSpec] = &[
    LocaleSpec { tag: "de-DE", region3: "DEU", date_patterns: DMY_DOT, decimal_separator: ',', group_separator: '.' },
    LocaleSpec { tag: "de-AT", region3: "AUT", date_patterns: DMY_DOT, decimal_separator: ',', group_separator: '.' },
    LocaleSpec { tag: "de-CH", region3: "CHE", date_patterns: DMY_DOT, decimal_separator: '.', group_separator: '\'' },
    LocaleSpec { tag: "en-US", region3: "USA", date_patterns: MDY_SLASH, decimal_separator: '.', group_separator: ',' },
    LocaleSpec { tag: "en-GB", region3: "GBR", date_patterns: DMY_SLASH, decimal_separator: '.', group_separator: ',' },
    LocaleSpec { tag: "en-AU", region3: "AUS", date_patterns: DMY_SLASH, decimal_separator: '.', group_separator: ',' },
    LocaleSpec { tag: "fr-FR", region3: "FRA", date_patterns: DMY_SLASH, decimal_separator: ',', group_separator: ' ' },
    LocaleSpec { tag: "it-IT", region3: "ITA", date_patterns: DMY_SLASH, decimal_separator: ',', group_separator: '.' },
    LocaleSpec { tag: "es-ES", region3: "ESP", date_patterns: DMY_SLASH, decimal_separator: ',', group_separator: '.' },
    LocaleSpec { tag: "pt-PT", region3: "PRT", date_patterns: DMY_SLASH, decimal_separator: ',', group_separator: '.' },
    LocaleSpec { tag: "nl-NL", region3: "NLD", date_patterns: DMY_DOT, decimal_separator: ',', group_separator: '.' },
    LocaleSpec { tag: "pl-PL", region3: "POL", date_patterns: DMY_DOT, decimal_separator: ',', group_separator: ' ' },
    LocaleSpec { tag: "ru-RU", region3: "RUS", date_patterns: DMY_DOT, decimal_separator: ',', group_separator: ' ' },
    LocaleSpec { tag: "sv-SE", region3: "SWE", date_patterns: ISO_PATTERNS, decimal_separator: ',', group_separator: ' ' },
    LocaleSpec { tag: "ja-JP", region3: "JPN", date_patterns: ISO_PATTERNS, decimal_separator: '.', group_separator: ',' },
    LocaleSpec { tag: "zh-CN", region3: "CHN", date_patterns: ISO_PATTERNS, decimal_separator: '.', group_separator: ',' },
];

/// Resolves culture tokens to [`Culture`] descriptors.
///
/// Token forms are tried in this order:
/// 1. five-letter locale tag (`"de-DE"`, case-insensitive, `_` accepted),
/// 2. three-letter region code (`"DEU"`),
/// 3. two-letter region code (`"DE"`).
pub struct LocaleService {
    by_tag: HashMap<String, Culture>,
    by_region3: HashMap<String, Culture>,
    by_region2: HashMap<String, Culture>,
}

impl LocaleService {
    pub fn new() -> Self {
        let mut by_tag = HashMap::new();
        let mut by_region3 = HashMap::new();
        let mut by_region2 = HashMap::new();

        for spec in LOCALES {
            let (language, country) = spec.tag.split_once('-').unwrap_or((spec.tag, ""));
            let culture = Culture {
                tag: spec.tag.to_string(),
                language: language.to_string(),
                country: country.to_string(),
                date_patterns: spec.date_patterns.to_vec(),
                decimal_separator: spec.decimal_separator,
                group_separator: spec.group_separator,
            };
            by_tag.insert(spec.tag.to_lowercase(), culture.clone());
            by_region3.entry(spec.region3.to_string()).or_insert_with(|| culture.clone());
            by_region2.entry(country.to_string()).or_insert(culture);
        }

        LocaleService { by_tag, by_region3, by_region2 }
    }

    /// Resolve a culture token; `None` when the token is empty or unknown.
    pub fn resolve(&self, token: &str) -> Option<Culture> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        match token.len() {
            5 => self.by_tag.get(&token.replace('_', "-").to_lowercase()).cloned(),
            3 => self.by_region3.get(&token.to_uppercase()).cloned(),
            2 => self.by_region2.get(&token.to_uppercase()).cloned(),
            _ => None,
        }
    }

    /// Date patterns for a two-letter country code, used by the automatic
    /// date converter when the caller supplies an explicit country as the
    /// converter parameter. Unknown codes fall back to the ISO patterns.
    pub fn country_date_patterns(&self, country: &str) -> Vec<&'static str> {
        self.by_region2
            .get(&country.to_uppercase())
            .map(|c| c.date_patterns.clone())
            .unwrap_or_else(|| ISO_PATTERNS.to_vec())
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for LocaleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_tokens_by_size() {
        let locales = LocaleService::new();
        assert_eq!(locales.resolve("de-DE").unwrap().country, "DE");
        assert_eq!(locales.resolve("DEU").unwrap().tag, "de-DE");
        assert_eq!(locales.resolve("DE").unwrap().decimal_separator, ',');
        assert_eq!(locales.resolve("de_de").unwrap().tag, "de-DE");
        assert!(locales.resolve("").is_none());
        assert!(locales.resolve("XX").is_none());
    }

    #[test]
    fn unknown_country_falls_back_to_iso_patterns() {
        let locales = LocaleService::new();
        assert_eq!(locales.country_date_patterns("ZZ"), ISO_PATTERNS.to_vec());
    }
}
