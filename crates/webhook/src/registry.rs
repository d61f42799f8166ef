use std::collections::BTreeSet;
use std::fmt;

/// The set of extended resource names that require a matching toleration.
///
/// Built once at startup from the repeated `--target-resource` flag and
/// shared read-only (behind an `Arc`) with every request handler, so no
/// locking is needed while serving.
#[derive(Debug, Clone, Default)]
pub struct TargetResources {
    names: BTreeSet<String>,
}

impl TargetResources {
    /// Build the registry from raw flag values. Names are trimmed of
    /// surrounding whitespace, empty names are dropped and duplicates
    /// collapse into one entry.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl fmt::Display for TargetResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for name in &self.names {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{name}")?;
            first = false;
        }
        Ok(())
    }
}
