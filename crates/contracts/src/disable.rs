//! DisableRegistry - operator switch for whole record families

use std::collections::HashSet;

use crate::StreamName;

/// Set of stream names whose registration is suppressed
#[derive(Debug, Clone, Default)]
pub struct DisableRegistry {
    disabled: HashSet<StreamName>,
}

impl DisableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configured names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StreamName>,
    {
        Self {
            disabled: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` is disabled
    pub fn include(&self, name: &str) -> bool {
        self.disabled.contains(name)
    }

    pub fn len(&self) -> usize {
        self.disabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disabled.is_empty()
    }
}
