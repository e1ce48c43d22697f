//! Container tags applied to the repaired file.
//!
//! The native library takes them as one string,
//! `key1=value1;key2="value;with;separators"`. Quoted text is taken
//! verbatim. A backslash inside quotes only keeps the following character
//! from ending the value, and stays part of it.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Key used by the native library to request encrypted output. Never
/// written as a tag.
pub const PASSWORD_KEY: &str = "password";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Entries to write as container tags.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(k, _)| k.as_str() != PASSWORD_KEY)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode as `key=value;...`.
    ///
    /// Fails for entries the native parser would not read back unchanged:
    /// keys that are empty or contain `=` or `;`, and values needing quotes
    /// that contain a `"` not preceded by a backslash or end in an unpaired
    /// backslash.
    pub fn encode(&self) -> Result<String> {
        let mut out = String::new();
        for (key, value) in self.0.iter() {
            let invalid = || Error::InvalidMetadata(format!("{key}={value}"));
            if key.is_empty() || key.contains(['=', ';']) {
                return Err(invalid());
            }
            if !out.is_empty() {
                out.push(';');
            }
            out.push_str(key);
            out.push('=');
            if value.is_empty() || value.contains(';') || value.starts_with('"') {
                if closing_quote(value).is_some() || !ends_cleanly(value) {
                    return Err(invalid());
                }
                out.push('"');
                out.push_str(value);
                out.push('"');
            } else {
                out.push_str(value);
            }
        }
        Ok(out)
    }

    /// Parse the `key=value;...` form.
    pub fn decode(encoded: &str) -> Result<Self> {
        let mut metadata = Metadata::new();
        let mut rest = encoded;
        while !rest.is_empty() {
            let malformed = || Error::InvalidMetadata(rest.to_string());
            let (key, after_key) = rest.split_once('=').ok_or_else(malformed)?;
            if key.is_empty() || key.contains(';') {
                return Err(malformed());
            }
            let (value, after_value) = if let Some(quoted) = after_key.strip_prefix('"') {
                let end = closing_quote(quoted).ok_or_else(malformed)?;
                // Anything between the closing quote and the separator is dropped.
                let after_value = quoted[end + 1..]
                    .split_once(';')
                    .map_or("", |(_, after)| after);
                (&quoted[..end], after_value)
            } else {
                let (value, after_value) = after_key.split_once(';').unwrap_or((after_key, ""));
                if value.is_empty() {
                    return Err(malformed());
                }
                (value, after_value)
            };
            metadata.insert(key, value);
            rest = after_value;
        }
        Ok(metadata)
    }
}

/// Byte index of the quote ending `s`, which follows an opening quote. A
/// backslash skips the next byte.
fn closing_quote(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\\' => idx += 2,
            b'"' => return Some(idx),
            _ => idx += 1,
        }
    }
    None
}

/// Whether `s` has no trailing backslash left without its escaped byte.
fn ends_cleanly(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        idx += if bytes[idx] == b'\\' { 2 } else { 1 };
    }
    idx == bytes.len()
}

/// Parse one `KEY=VALUE` argument.
pub fn parse_key_value(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() && !key.contains(';') => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(Error::InvalidMetadata(arg.to_string())),
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
