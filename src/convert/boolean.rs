use crate::culture::Culture;
use crate::error::Result;
use crate::table::{DataType, Value};

use super::ValueConverter;

/// Case-insensitive match against a fixed true-token set; everything else is
/// `false`.
#[derive(Debug, Clone)]
pub struct BooleanAutoConverter {
    true_tokens: Vec<&'static str>,
}

impl Default for BooleanAutoConverter {
    fn default() -> Self {
        BooleanAutoConverter {
            true_tokens: vec!["1", "true", "t", "yes", "y", "x"],
        }
    }
}

impl BooleanAutoConverter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ValueConverter for BooleanAutoConverter {
    fn convert(
        &self,
        value: Value,
        _target: Option<DataType>,
        _parameter: Option<&str>,
        _culture: &Culture,
    ) -> Value {
        match &value {
            Value::Text(s) => {
                let token = s.trim().to_lowercase();
                Value::Boolean(self.true_tokens.contains(&token.as_str()))
            }
            Value::Boolean(_) => value,
            _ => value,
        }
    }

    fn convert_back(
        &self,
        value: Value,
        _target: Option<DataType>,
        _parameter: Option<&str>,
        _culture: &Culture,
    ) -> Result<Value> {
        match value {
            Value::Boolean(b) => Ok(Value::Text(if b { "true" } else { "false" }.to_string())),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_set_is_case_insensitive() {
        let conv = BooleanAutoConverter::new();
        let culture = Culture::invariant();
        assert_eq!(conv.convert("Y".into(), None, None, &culture), Value::Boolean(true));
        assert_eq!(conv.convert("X".into(), None, None, &culture), Value::Boolean(true));
        assert_eq!(conv.convert("no".into(), None, None, &culture), Value::Boolean(false));
        assert_eq!(conv.convert("".into(), None, None, &culture), Value::Boolean(false));
    }
}
