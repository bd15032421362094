//! Label selector compilation.
//!
//! Turns a `matchLabels` map into a selector predicate, rejecting keys and
//! values that Kubernetes would not accept as labels. Keys are qualified
//! names (`[prefix/]name`), values are empty or at most 63 characters.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::field::{FieldError, FieldPath};

const QUALIFIED_NAME_MAX_LEN: usize = 63;
const LABEL_VALUE_MAX_LEN: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LEN: usize = 253;

const QUALIFIED_NAME_FMT: &str = "([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]";
const DNS1123_SUBDOMAIN_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?(\\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*";

static QUALIFIED_NAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(&format!("^{QUALIFIED_NAME_FMT}$")).ok());
static DNS1123_SUBDOMAIN_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(&format!("^{DNS1123_SUBDOMAIN_FMT}$")).ok());

/// A `matchLabels` entry could not be turned into a selector requirement.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct LabelSelectorError(FieldError);

impl LabelSelectorError {
    pub fn field_error(&self) -> &FieldError {
        &self.0
    }
}

/// Equality-based label selector compiled from `matchLabels`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<(String, String)>,
}

impl LabelSelector {
    /// Compile `match_labels` into a selector.
    ///
    /// Entries are checked in key order and the first bad entry is reported.
    pub fn from_match_labels(
        match_labels: &BTreeMap<String, String>,
    ) -> Result<Self, LabelSelectorError> {
        let mut requirements = Vec::with_capacity(match_labels.len());
        for (key, value) in match_labels {
            let errs = validate_label_key(key);
            if !errs.is_empty() {
                return Err(LabelSelectorError(FieldError::invalid(
                    FieldPath::new("key"),
                    key.as_str(),
                    errs.join("; "),
                )));
            }

            let errs = validate_label_value(value);
            if !errs.is_empty() {
                return Err(LabelSelectorError(FieldError::invalid(
                    FieldPath::new("values").index(0),
                    value.as_str(),
                    errs.join("; "),
                )));
            }

            requirements.push((key.clone(), value.clone()));
        }

        Ok(Self { requirements })
    }

    /// Whether `labels` satisfies every requirement. An empty selector
    /// matches everything.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

fn matches_pattern(re: &LazyLock<Option<Regex>>, s: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(s))
}

/// Validate a label key as a qualified name with an optional DNS subdomain
/// prefix. Returns every problem found.
pub fn validate_label_key(key: &str) -> Vec<String> {
    let mut errs = Vec::new();

    let parts: Vec<&str> = key.split('/').collect();
    let name = match parts.as_slice() {
        [name] => *name,
        [prefix, name] => {
            if prefix.is_empty() {
                errs.push("prefix part must be non-empty".to_string());
            } else {
                if prefix.len() > DNS1123_SUBDOMAIN_MAX_LEN {
                    errs.push(format!(
                        "prefix part must be no more than {} characters",
                        DNS1123_SUBDOMAIN_MAX_LEN
                    ));
                }
                if !matches_pattern(&DNS1123_SUBDOMAIN_RE, prefix) {
                    errs.push(format!(
                        "prefix part a lowercase RFC 1123 subdomain must consist of lower case \
                         alphanumeric characters, '-' or '.', and must start and end with an \
                         alphanumeric character (e.g. 'example.com', regex used for validation \
                         is '{}')",
                        DNS1123_SUBDOMAIN_FMT
                    ));
                }
            }
            *name
        }
        _ => {
            errs.push(format!(
                "a qualified name must consist of alphanumeric characters, '-', '_' or '.', and \
                 must start and end with an alphanumeric character (e.g. 'MyName',  or \
                 'my.name',  or '123-abc', regex used for validation is '{}') with an optional \
                 DNS subdomain prefix and '/' (e.g. 'example.com/MyName')",
                QUALIFIED_NAME_FMT
            ));
            return errs;
        }
    };

    if name.is_empty() {
        errs.push("name part must be non-empty".to_string());
    } else if name.len() > QUALIFIED_NAME_MAX_LEN {
        errs.push(format!(
            "name part must be no more than {} characters",
            QUALIFIED_NAME_MAX_LEN
        ));
    }
    if !matches_pattern(&QUALIFIED_NAME_RE, name) {
        errs.push(format!(
            "name part must consist of alphanumeric characters, '-', '_' or '.', and must start \
             and end with an alphanumeric character (e.g. 'MyName',  or 'my.name',  or \
             '123-abc', regex used for validation is '{}')",
            QUALIFIED_NAME_FMT
        ));
    }

    errs
}

/// Validate a label value. The empty string is a valid value.
pub fn validate_label_value(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > LABEL_VALUE_MAX_LEN {
        errs.push(format!(
            "must be no more than {} characters",
            LABEL_VALUE_MAX_LEN
        ));
    }
    if !value.is_empty() && !matches_pattern(&QUALIFIED_NAME_RE, value) {
        errs.push(format!(
            "a valid label must be an empty string or consist of alphanumeric characters, '-', \
             '_' or '.', and must start and end with an alphanumeric character (e.g. \
             'MyValue',  or 'my_value',  or '12345', regex used for validation is '({})?')",
            QUALIFIED_NAME_FMT
        ));
    }
    errs
}
