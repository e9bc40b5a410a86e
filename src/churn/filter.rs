use crate::paths;
use regex::Regex;
use std::collections::HashSet;

/// Inclusion policy for churn paths.
///
/// A path is rejected when it matches the exclusion pattern, or when an
/// extension allow-list is set and the path's extension is not on it.
/// Paths without an extension always pass the extension check.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    exclude: Option<Regex>,
    extensions: Option<HashSet<String>>,
}

impl PathFilter {
    pub fn new(exclude: Option<Regex>) -> Self {
        Self {
            exclude,
            extensions: None,
        }
    }

    /// Restrict to the given extensions; an empty list means "allow all".
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: HashSet<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        self.extensions = (!set.is_empty()).then_some(set);
        self
    }

    pub fn allows(&self, path: &str) -> bool {
        if self
            .exclude
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(path))
        {
            return false;
        }

        match (&self.extensions, paths::extension(path)) {
            (Some(allowed), Some(ext)) => allowed.contains(ext),
            _ => true,
        }
    }
}
