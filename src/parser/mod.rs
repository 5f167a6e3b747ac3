//! Payload decoding.
//!
//! Values arrive from an external store and may be malformed; decoding always
//! returns an error instead of panicking so the watch path can log and skip.

#[cfg(test)]
mod parser_test;

use serde::de::DeserializeOwned;

use crate::ParseError;
use crate::ValueFormat;

/// Decodes raw store values into a format-neutral document.
///
/// Returning `Ok(None)` means the format is recognised but not decoded, and the
/// caller's target must be left untouched.
pub trait ConfigParser: Send + Sync + 'static {
    fn decode_value(
        &self,
        kind: ValueFormat,
        data: &str,
    ) -> Result<Option<serde_json::Value>, ParseError>;
}

impl dyn ConfigParser {
    /// Decodes `data` into `target`.
    ///
    /// `target` is only overwritten when the whole document decodes.
    pub fn decode<T: DeserializeOwned>(
        &self,
        kind: ValueFormat,
        data: &str,
        target: &mut T,
    ) -> Result<(), ParseError> {
        if let Some(value) = self.decode_value(kind, data)? {
            *target = serde_json::from_value(value)?;
        }
        Ok(())
    }
}

/// JSON and YAML parser. HCL is accepted but not decoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultParser;

impl ConfigParser for DefaultParser {
    fn decode_value(
        &self,
        kind: ValueFormat,
        data: &str,
    ) -> Result<Option<serde_json::Value>, ParseError> {
        match kind {
            ValueFormat::Json => Ok(Some(serde_json::from_str(data)?)),
            ValueFormat::Yaml => Ok(Some(serde_yaml::from_str(data)?)),
            // TODO: decode HCL once an HCL document model is chosen.
            ValueFormat::Hcl => Ok(None),
        }
    }
}

/// Decodes a payload whose format is only known by name.
pub fn decode_named<T: DeserializeOwned>(
    parser: &dyn ConfigParser,
    kind: &str,
    data: &str,
    target: &mut T,
) -> Result<(), ParseError> {
    let kind: ValueFormat = kind.parse()?;
    parser.decode(kind, data, target)
}
