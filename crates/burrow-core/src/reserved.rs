use std::collections::HashSet;

/// Route names served by the front end that no code may shadow.
pub const DEFAULT_RESERVED: &[&str] = &[
    "index", "home", "login", "src", "url", "images", "image", "sign", "admin",
];

/// A configured set of paths that can never be assigned.
///
/// Matching is exact and case-sensitive, the same way paths are routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedNames {
    names: HashSet<String>,
}

impl ReservedNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.names.contains(path)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ReservedNames {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED.iter().copied())
    }
}
