use std::fmt;

/// Namespace used for collections when nobody is logged in.
pub const ANONYMOUS_NAMESPACE: &str = "anonymous";

/// A storage key of the form `<prefix>_<namespace>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// A key that is shared by every session, e.g. the current identity.
    pub fn global(name: &str) -> Self {
        StorageKey(name.to_string())
    }

    /// A key scoped to a user handle, falling back to the anonymous namespace.
    pub fn scoped(prefix: &str, handle: Option<&str>) -> Self {
        let namespace = match handle {
            Some(handle) if !handle.is_empty() => handle,
            _ => ANONYMOUS_NAMESPACE,
        };
        StorageKey(format!("{}_{}", prefix, namespace))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
