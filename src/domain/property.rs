//! Keyed property lookup
//!
//! Repository credentials and URLs are resolved through keys of the form
//! `repository.<kind>.<key>.<field>`, e.g. `repository.maven.mock.release`.
//! The lookup order (project file, root file, user file, environment) is the
//! concern of the concrete [`PropertySource`]; this module only knows keys.

use std::collections::HashMap;

use thiserror::Error;

/// Prefix shared by all repository properties
pub const REPOSITORY_PREFIX: &str = "repository";

#[derive(Debug, Error, PartialEq)]
pub enum PropertyError {
    #[error("Failed to find property '{0}'. Add it to gradle.properties or set ORG_GRADLE_PROJECT_{0}")]
    Missing(String),
}

/// A source of build properties
pub trait PropertySource {
    /// Returns the value of the named property, if defined
    fn property(&self, name: &str) -> Option<String>;

    /// Returns true if the named property is defined
    fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }
}

impl PropertySource for HashMap<String, String> {
    fn property(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Property source with nothing in it
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProperties;

impl PropertySource for NoProperties {
    fn property(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Resolves fields below one `repository.<scope>` prefix
pub struct PropertyResolver<'a> {
    source: &'a dyn PropertySource,
    scope: String,
}

impl<'a> PropertyResolver<'a> {
    /// Creates a resolver for `repository.<scope>.*`
    pub fn new(source: &'a dyn PropertySource, scope: impl Into<String>) -> Self {
        Self {
            source,
            scope: scope.into(),
        }
    }

    /// Full property name of a field
    pub fn key(&self, field: &str) -> String {
        format!("{}.{}.{}", REPOSITORY_PREFIX, self.scope, field)
    }

    /// Returns the field value or the given default
    pub fn optional(&self, field: &str, default: &str) -> String {
        self.source
            .property(&self.key(field))
            .unwrap_or_else(|| default.to_string())
    }

    /// Returns the field value if it is defined
    pub fn lookup(&self, field: &str) -> Option<String> {
        self.source.property(&self.key(field))
    }

    /// Returns the field value, failing if it is not defined
    pub fn required(&self, field: &str) -> Result<String, PropertyError> {
        let key = self.key(field);
        self.source
            .property(&key)
            .ok_or(PropertyError::Missing(key))
    }
}
