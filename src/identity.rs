use std::fmt;

/// Opaque caller identity used to scope remote calls
///
/// Never empty: a blank user id means "no identity" and is represented as
/// `None` at the call sites.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Wrap a raw user id as-is; blank input means no identity.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Parse an optional raw value, treating blank as absent
    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        raw.and_then(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Identities are credentials of a sort; keep them out of logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity(..{})", self.0.len())
    }
}
