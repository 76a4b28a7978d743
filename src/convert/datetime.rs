use crate::culture::{Culture, LocaleService};
use crate::error::Result;
use crate::table::{DataType, Value};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;

use super::{ValueConverter, conversion_failed};

fn parse_with_patterns(text: &str, patterns: &[&str]) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for pattern in patterns {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(dt);
        }
        // date-only patterns parse as a date at midnight
        if let Ok(d) = NaiveDate::parse_from_str(text, pattern) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Locale-sensitive date/time parser.
///
/// Tries the effective culture's date patterns; when the converter parameter
/// is a two-letter country code (e.g. `"DE"`), that country's pattern set is
/// used instead. ISO patterns are always tried last.
pub struct DateTimeAutoConverter {
    locales: Arc<LocaleService>,
}

impl DateTimeAutoConverter {
    pub fn new(locales: Arc<LocaleService>) -> Self {
        DateTimeAutoConverter { locales }
    }
}

impl Default for DateTimeAutoConverter {
    fn default() -> Self {
        DateTimeAutoConverter { locales: LocaleService::shared() }
    }
}

impl ValueConverter for DateTimeAutoConverter {
    fn convert(
        &self,
        value: Value,
        _target: Option<DataType>,
        parameter: Option<&str>,
        culture: &Culture,
    ) -> Value {
        let Value::Text(text) = &value else {
            return value;
        };

        let country_override = parameter
            .map(str::trim)
            .filter(|p| p.len() == 2);

        let patterns: Vec<&'static str> = match country_override {
            Some(country) => self.locales.country_date_patterns(country),
            None => culture.date_patterns.clone(),
        };

        if let Some(dt) = parse_with_patterns(text, &patterns) {
            return Value::DateTime(dt);
        }
        if let Some(dt) = parse_with_patterns(text, crate::culture::ISO_PATTERNS) {
            return Value::DateTime(dt);
        }
        value
    }

    fn convert_back(
        &self,
        value: Value,
        _target: Option<DataType>,
        _parameter: Option<&str>,
        culture: &Culture,
    ) -> Result<Value> {
        match value {
            Value::DateTime(dt) => {
                let pattern = culture.date_patterns.first().copied().unwrap_or("%Y-%m-%dT%H:%M:%S");
                Ok(Value::Text(dt.format(pattern).to_string()))
            }
            Value::Null => Ok(Value::Null),
            other => Err(conversion_failed(&other, "datetime text", culture)),
        }
    }
}

/// Parses and formats with one explicit `chrono` pattern supplied as the
/// converter parameter, e.g. `"%d.%m.%Y"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeFormatConverter;

impl ValueConverter for DateTimeFormatConverter {
    fn convert(
        &self,
        value: Value,
        _target: Option<DataType>,
        parameter: Option<&str>,
        _culture: &Culture,
    ) -> Value {
        let (Value::Text(text), Some(pattern)) = (&value, parameter) else {
            return value;
        };
        match parse_with_patterns(text, &[pattern]) {
            Some(dt) => Value::DateTime(dt),
            None => value,
        }
    }

    fn convert_back(
        &self,
        value: Value,
        _target: Option<DataType>,
        parameter: Option<&str>,
        culture: &Culture,
    ) -> Result<Value> {
        let Some(pattern) = parameter else {
            return Err(conversion_failed(&value, "datetime text (missing pattern)", culture));
        };
        match value {
            Value::DateTime(dt) => Ok(Value::Text(dt.format(pattern).to_string())),
            Value::Null => Ok(Value::Null),
            other => Err(conversion_failed(&other, "datetime text", culture)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn auto_converter_honors_country_parameter() {
        let conv = DateTimeAutoConverter::default();
        let invariant = Culture::invariant();

        // with a German country code, day comes first
        let v = conv.convert("24.12.2015".into(), None, Some("DE"), &invariant);
        assert_eq!(v, Value::DateTime(dt(2015, 12, 24)));
    }

    #[test]
    fn auto_converter_uses_culture_patterns() {
        let locales = LocaleService::shared();
        let conv = DateTimeAutoConverter::new(locales.clone());
        let us = locales.resolve("en-US").unwrap();

        let v = conv.convert("12/24/2015".into(), None, None, &us);
        assert_eq!(v, Value::DateTime(dt(2015, 12, 24)));
    }

    #[test]
    fn unparsable_value_passes_through() {
        let conv = DateTimeAutoConverter::default();
        let v = conv.convert("not a date".into(), None, None, &Culture::invariant());
        assert_eq!(v, Value::Text("not a date".into()));
    }

    #[test]
    fn format_converter_roundtrip() {
        let conv = DateTimeFormatConverter;
        let culture = Culture::invariant();
        let parsed = conv.convert("24.12.2015".into(), None, Some("%d.%m.%Y"), &culture);
        assert_eq!(parsed, Value::DateTime(dt(2015, 12, 24)));

        let rendered = conv
            .convert_back(parsed, None, Some("%d.%m.%Y"), &culture)
            .unwrap();
        assert_eq!(rendered, Value::Text("24.12.2015".into()));
    }

    #[test]
    fn convert_back_rejects_non_datetime() {
        let conv = DateTimeFormatConverter;
        let err = conv
            .convert_back(Value::Integer(5), None, Some("%Y"), &Culture::invariant())
            .unwrap_err();
        assert!(err.to_string().contains("cannot convert"));
    }
}
