//! Scope sets and their canonical string form.
//!
//! A scope set is stored in the `users.scopes` column and embedded in the
//! token's `scopes` claim using the same encoding: scopes sorted ascending,
//! de-duplicated, joined with `,`. The empty set encodes to `""`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::AuthError;

const SEPARATOR: char = ',';

/// An ordered, de-duplicated set of granted scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary strings, rejecting any invalid scope.
    pub fn from_scopes<I, S>(scopes: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for scope in scopes {
            let scope = scope.into();
            validate_scope(&scope)?;
            set.insert(scope);
        }
        Ok(Self(set))
    }

    /// Canonical string form.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, scope) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            out.push_str(scope);
        }
        out
    }

    /// Inverse of [`ScopeSet::encode`].
    ///
    /// Rejects empty segments (`"a,,b"`, `",a"`) and whitespace, so only
    /// strings produced by `encode` round-trip.
    pub fn decode(encoded: &str) -> Result<Self, AuthError> {
        if encoded.is_empty() {
            return Ok(Self::default());
        }
        Self::from_scopes(encoded.split(SEPARATOR))
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn is_subset(&self, other: &ScopeSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

fn validate_scope(scope: &str) -> Result<(), AuthError> {
    if scope.is_empty() {
        return Err(AuthError::InvalidScope("empty scope".into()));
    }
    if scope.contains(SEPARATOR) || scope.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidScope(format!(
            "scope '{}' contains a separator or whitespace",
            scope
        )));
    }
    Ok(())
}

impl TryFrom<Vec<String>> for ScopeSet {
    type Error = AuthError;

    fn try_from(scopes: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_scopes(scopes)
    }
}

impl From<ScopeSet> for Vec<String> {
    fn from(set: ScopeSet) -> Self {
        set.0.into_iter().collect()
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
