//! Result types returned by get, set and list.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::Error;
use crate::registry::SocketOptionSpec;

/// A socket option value interpreted per its spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionValue {
    /// Signed 32-bit value.
    Signed(i32),
    /// Unsigned 32-bit value.
    Unsigned(u32),
}

impl OptionValue {
    /// Interpret a raw kernel integer according to `spec`.
    pub fn from_raw(spec: &SocketOptionSpec, raw: libc::c_int) -> Self {
        if spec.unsigned {
            OptionValue::Unsigned(raw as u32)
        } else {
            OptionValue::Signed(raw)
        }
    }

    /// Widen to i64 without loss.
    pub fn as_i64(&self) -> i64 {
        match *self {
            OptionValue::Signed(v) => i64::from(v),
            OptionValue::Unsigned(v) => i64::from(v),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Signed(v) => write!(f, "{}", v),
            OptionValue::Unsigned(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for OptionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            OptionValue::Signed(v) => serializer.serialize_i32(v),
            OptionValue::Unsigned(v) => serializer.serialize_u32(v),
        }
    }
}

impl PartialEq<i64> for OptionValue {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == *other
    }
}

/// Outcome for one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionResult {
    /// Option name.
    pub name: &'static str,
    /// Observed value, absent when the read failed.
    pub value: Option<OptionValue>,
    /// Option description.
    pub description: &'static str,
    /// Failure message for this option, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OptionResult {
    /// Build a successful result.
    pub fn new(spec: &SocketOptionSpec, value: OptionValue) -> Self {
        Self {
            name: spec.name,
            value: Some(value),
            description: spec.description,
            error: None,
        }
    }

    /// Build a failed row for `spec`.
    pub fn failed(spec: &SocketOptionSpec, error: &Error) -> Self {
        Self {
            name: spec.name,
            value: None,
            description: spec.description,
            error: Some(error.to_string()),
        }
    }

    /// Check if this result carries a value.
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.value.is_some()
    }
}

/// A per-option failure collected while listing.
#[derive(Debug)]
pub struct OptionDiagnostic {
    /// Position of the option in the listing order.
    pub position: usize,
    /// The spec of the option that failed.
    pub spec: &'static SocketOptionSpec,
    /// Why it failed.
    pub error: Error,
}

impl OptionDiagnostic {
    /// Option name.
    pub fn name(&self) -> &'static str {
        self.spec.name
    }
}

impl fmt::Display for OptionDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.spec.name, self.error)
    }
}

impl Serialize for OptionDiagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("OptionDiagnostic", 3)?;
        state.serialize_field("name", self.spec.name)?;
        state.serialize_field("errno", &self.error.errno())?;
        state.serialize_field("error", &self.error.to_string())?;
        state.end()
    }
}

/// Everything gathered by one list operation.
#[derive(Debug, Default, Serialize)]
pub struct OptionListing {
    /// Readable options, in display order.
    pub results: Vec<OptionResult>,
    /// Options that could not be read, in display order.
    pub diagnostics: Vec<OptionDiagnostic>,
}

impl OptionListing {
    /// Merge results and diagnostics into one sequence in display order,
    /// with `error` populated on failed rows.
    pub fn rows(&self) -> Vec<OptionResult> {
        let total = self.results.len() + self.diagnostics.len();
        let mut results = self.results.iter();
        let mut diagnostics = self.diagnostics.iter().peekable();

        (0..total)
            .filter_map(|position| match diagnostics.peek().copied() {
                Some(d) if d.position == position => {
                    diagnostics.next();
                    Some(OptionResult::failed(d.spec, &d.error))
                }
                _ => results.next().cloned(),
            })
            .collect()
    }

    /// Check if every option was read.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
