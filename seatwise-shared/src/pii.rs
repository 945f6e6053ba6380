use serde::{Deserialize, Serialize};
use std::fmt;

/// Contact data that must not leak through `Debug` or log formatting.
///
/// Serialization keeps the real value: records written for persistence need it,
/// log lines built with `{:?}` or `{}` do not.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the raw value. Callers take responsibility for where it goes.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Masked(********)")
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep the last two characters so operators can tell records apart.
        let raw = self.0.as_ref();
        let tail: String = raw.chars().rev().take(2).collect::<Vec<_>>().into_iter().rev().collect();
        if raw.chars().count() <= 2 {
            write!(f, "********")
        } else {
            write!(f, "********{}", tail)
        }
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}
