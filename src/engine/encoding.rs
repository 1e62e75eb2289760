//! String literals and field references as they appear inside a `$filter` expression.
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// A quoted, escaped and percent-encoded string literal: `O'Neal` renders as `'O%27%27Neal'`.
///
/// The surrounding quotes are part of the expression syntax and stay unencoded.
#[derive(Debug, Clone, Copy)]
pub struct EncodedValue<'a> {
    value: &'a str,
    case_insensitive: bool,
}

impl<'a> EncodedValue<'a> {
    pub fn new(value: &'a str, case_insensitive: bool) -> Self {
        EncodedValue {
            value,
            case_insensitive,
        }
    }
}

impl Display for EncodedValue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let folded = if self.case_insensitive {
            Cow::Owned(self.value.to_lowercase())
        } else {
            Cow::Borrowed(self.value)
        };

        // OData escapes a single quote inside a literal with another single quote.
        let escaped = folded.replace('\'', "''");

        write!(f, "'{}'", urlencoding::encode(&escaped))
    }
}

/// A field name, optionally qualified by a collection iterator and wrapped in `tolower()`.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    prefix: &'a str,
    name: &'a str,
    case_insensitive: bool,
}

impl<'a> FieldRef<'a> {
    pub fn new(prefix: &'a str, name: &'a str, case_insensitive: bool) -> Self {
        FieldRef {
            prefix,
            name,
            case_insensitive,
        }
    }

    /// The field exactly as written, no prefix and no case folding.
    pub fn plain(name: &'a str) -> Self {
        FieldRef::new("", name, false)
    }
}

impl Display for FieldRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Self {
            prefix,
            name,
            case_insensitive,
        } = self;

        if *case_insensitive {
            write!(f, "tolower({prefix}{name})")
        } else {
            write!(f, "{prefix}{name}")
        }
    }
}

pub fn encode_value(value: &str, case_insensitive: bool) -> String {
    EncodedValue::new(value, case_insensitive).to_string()
}

pub fn field_ref(name: &str, case_insensitive: bool) -> String {
    FieldRef::new("", name, case_insensitive).to_string()
}

/// Reverses [`encode_value`] for a case-sensitive literal.
///
/// Returns `None` if the input is not quoted or does not decode to UTF-8.
pub fn decode_value(encoded: &str) -> Option<String> {
    let inner = encoded.strip_prefix('\'')?.strip_suffix('\'')?;
    let decoded = urlencoding::decode(inner).ok()?;

    Some(decoded.replace("''", "'"))
}
