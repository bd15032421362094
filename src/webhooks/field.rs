//! Field-scoped validation errors.
//!
//! Errors render in the Kubernetes apimachinery format so that denials read the
//! same as any other API server validation failure:
//!
//! ```text
//! spec.plugins: Unsupported value: "foo": supported values: "approver", "rego"
//! spec.selector: Required value: one of issuerRef or namespace must be defined
//! ```

use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;

use serde_json::Value;

/// Path to a field within a resource, e.g. `spec.selector.namespace`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// Create a root path
    pub fn new(root: &str) -> Self {
        Self(root.to_string())
    }

    /// Path to a named child field
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    /// Path to an element of a list field
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    /// Path to an entry of a map field
    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{}]", self.0, key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of validation failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldErrorType {
    /// A required field was not set
    Required,
    /// A field was set to a malformed value
    Invalid,
    /// A field was set to a value outside the supported set
    NotSupported,
}

impl fmt::Display for FieldErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldErrorType::Required => write!(f, "Required value"),
            FieldErrorType::Invalid => write!(f, "Invalid value"),
            FieldErrorType::NotSupported => write!(f, "Unsupported value"),
        }
    }
}

/// A single validation failure at a path within the resource
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    pub path: FieldPath,
    pub kind: FieldErrorType,
    /// The offending value; `Null` for required errors
    pub value: Value,
    /// Human readable detail, or the list of supported values
    pub detail: String,
}

impl FieldError {
    /// A required field is missing
    pub fn required(path: FieldPath, detail: impl Into<String>) -> Self {
        Self {
            path,
            kind: FieldErrorType::Required,
            value: Value::Null,
            detail: detail.into(),
        }
    }

    /// A field holds a malformed value
    pub fn invalid(path: FieldPath, value: impl Into<Value>, detail: impl Into<String>) -> Self {
        Self {
            path,
            kind: FieldErrorType::Invalid,
            value: value.into(),
            detail: detail.into(),
        }
    }

    /// A field holds a value outside `supported`
    pub fn not_supported<S: AsRef<str>>(
        path: FieldPath,
        value: impl Into<Value>,
        supported: &[S],
    ) -> Self {
        let detail = if supported.is_empty() {
            String::new()
        } else {
            let quoted: Vec<String> = supported
                .iter()
                .map(|s| Value::from(s.as_ref()).to_string())
                .collect();
            format!("supported values: {}", quoted.join(", "))
        };

        Self {
            path,
            kind: FieldErrorType::NotSupported,
            value: value.into(),
            detail,
        }
    }

    /// The error message without the leading field path
    pub fn body(&self) -> String {
        let mut body = self.kind.to_string();
        if self.kind != FieldErrorType::Required {
            body.push_str(": ");
            body.push_str(&self.value.to_string());
        }
        if !self.detail.is_empty() {
            body.push_str(": ");
            body.push_str(&self.detail);
        }
        body
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.body())
    }
}

impl std::error::Error for FieldError {}

/// Ordered list of field errors. Empty means the resource is valid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldErrorList(Vec<FieldError>);

impl FieldErrorList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Render every error into one message.
    ///
    /// Duplicate messages are dropped keeping first occurrence. One error
    /// renders alone, several render as `[a, b]`. Returns `None` when empty.
    pub fn aggregate_message(&self) -> Option<String> {
        let mut seen = HashSet::new();
        let messages: Vec<String> = self
            .0
            .iter()
            .map(ToString::to_string)
            .filter(|msg| seen.insert(msg.clone()))
            .collect();

        match messages.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            _ => Some(format!("[{}]", messages.join(", "))),
        }
    }
}

impl Deref for FieldErrorList {
    type Target = [FieldError];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Extend<FieldError> for FieldErrorList {
    fn extend<T: IntoIterator<Item = FieldError>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<FieldError> for FieldErrorList {
    fn from_iter<T: IntoIterator<Item = FieldError>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<FieldError>> for FieldErrorList {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for FieldErrorList {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
