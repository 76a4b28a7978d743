use crate::culture::Culture;
use crate::error::Result;
use crate::table::{DataType, Value};

use super::{ValueConverter, conversion_failed};

fn normalize(text: &str, culture: &Culture) -> String {
    text.trim()
        .replace(culture.group_separator, "")
        .replace(culture.decimal_separator, ".")
}

/// Culture-aware numeric parser: strips the culture's group separator,
/// treats its decimal separator as the radix point, and picks integer vs
/// floating point from the target type (or from the shape of the value).
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberAutoConverter;

impl ValueConverter for NumberAutoConverter {
    fn convert(
        &self,
        value: Value,
        target: Option<DataType>,
        _parameter: Option<&str>,
        culture: &Culture,
    ) -> Value {
        let Value::Text(text) = &value else {
            return value;
        };
        let normalized = normalize(text, culture);
        if normalized.is_empty() {
            return value;
        }

        match target {
            Some(DataType::Integer) => match normalized.parse::<i64>() {
                Ok(i) => Value::Integer(i),
                Err(_) => value,
            },
            Some(DataType::Float) => match normalized.parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => value,
            },
            // no target type: integer when it looks integral, float otherwise
            _ => {
                if let Ok(i) = normalized.parse::<i64>() {
                    Value::Integer(i)
                } else if let Ok(f) = normalized.parse::<f64>() {
                    Value::Float(f)
                } else {
                    value
                }
            }
        }
    }

    fn convert_back(
        &self,
        value: Value,
        _target: Option<DataType>,
        _parameter: Option<&str>,
        culture: &Culture,
    ) -> Result<Value> {
        match value {
            Value::Integer(i) => Ok(Value::Text(i.to_string())),
            Value::Float(f) => {
                Ok(Value::Text(f.to_string().replace('.', &culture.decimal_separator.to_string())))
            }
            Value::Null => Ok(Value::Null),
            other => Err(conversion_failed(&other, "numeric text", culture)),
        }
    }
}

/// Fixed-precision numeric rendering; the converter parameter is the number
/// of decimal places, e.g. `"2"` renders `1.5` as `1,50` under a comma
/// culture.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberFormatConverter;

impl NumberFormatConverter {
    fn decimals(parameter: Option<&str>) -> usize {
        parameter.and_then(|p| p.trim().parse().ok()).unwrap_or(2)
    }
}

impl ValueConverter for NumberFormatConverter {
    fn convert(
        &self,
        value: Value,
        target: Option<DataType>,
        _parameter: Option<&str>,
        culture: &Culture,
    ) -> Value {
        NumberAutoConverter.convert(value, target.or(Some(DataType::Float)), None, culture)
    }

    fn convert_back(
        &self,
        value: Value,
        _target: Option<DataType>,
        parameter: Option<&str>,
        culture: &Culture,
    ) -> Result<Value> {
        let decimals = Self::decimals(parameter);
        let rendered = match value {
            Value::Float(f) => format!("{f:.decimals$}"),
            Value::Integer(i) => format!("{:.decimals$}", i as f64),
            Value::Null => return Ok(Value::Null),
            other => return Err(conversion_failed(&other, "numeric text", culture)),
        };
        Ok(Value::Text(rendered.replace('.', &culture.decimal_separator.to_string())))
    }
}
