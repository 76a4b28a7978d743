//! Field-level value conversion.
//!
//! A [`ValueConverter`] coerces a single cell between its external raw form
//! and a typed value, parameterized by culture and an optional converter
//! argument (e.g. a date format string). Conversion is direction-aware:
//!
//! * `convert` (read direction) is **lenient**: a value that cannot be
//!   parsed is returned unchanged rather than raising. This matches the
//!   best-effort ETL character of the library and is consistent across all
//!   converter implementations.
//! * `convert_back` (write direction) **raises**
//!   [`RowlinkError::ConversionFailed`](crate::error::RowlinkError) when a
//!   value cannot be rendered; the error carries the offending value, the
//!   target type and the culture name, and aborts the current row.

mod boolean;
mod datetime;
mod number;
mod processor;

pub use boolean::BooleanAutoConverter;
pub use datetime::{DateTimeAutoConverter, DateTimeFormatConverter};
pub use number::{NumberAutoConverter, NumberFormatConverter};
pub use processor::{ConvertDirection, ConvertProcessor, ConverterDefinition};

use crate::culture::Culture;
use crate::error::Result;
use crate::table::{DataType, Value};

pub trait ValueConverter: Send + Sync {
    /// Read-direction conversion; lenient (see module docs).
    fn convert(
        &self,
        value: Value,
        target: Option<DataType>,
        parameter: Option<&str>,
        culture: &Culture,
    ) -> Value {
        let _ = (target, parameter, culture);
        value
    }

    /// Write-direction conversion; raises `ConversionFailed` when the value
    /// cannot be rendered.
    fn convert_back(
        &self,
        value: Value,
        target: Option<DataType>,
        parameter: Option<&str>,
        culture: &Culture,
    ) -> Result<Value> {
        let _ = (target, parameter, culture);
        Ok(value)
    }
}

/// No-op converter; both directions pass the value through.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityConverter;

impl ValueConverter for IdentityConverter {}

pub(crate) fn conversion_failed(
    value: &Value,
    target: &str,
    culture: &Culture,
) -> crate::error::RowlinkError {
    crate::error::RowlinkError::ConversionFailed {
        value: value.render(),
        target: target.to_string(),
        culture: culture.name().to_string(),
    }
}
