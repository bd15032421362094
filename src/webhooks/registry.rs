//! Names of the approver plugins a policy may configure.

/// Ordered set of registered plugin names.
///
/// Fixed when the validator is built. Membership is exact name match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PluginRegistry {
    names: Vec<String>,
}

impl PluginRegistry {
    /// Build a registry from `names`, keeping the first occurrence of any
    /// duplicate.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !deduped.contains(&name) {
                deduped.push(name);
            }
        }
        Self { names: deduped }
    }

    /// Parse a comma separated list, ignoring blank entries.
    pub fn from_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|known| known == name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
