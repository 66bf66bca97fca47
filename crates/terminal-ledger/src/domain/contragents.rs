//! # Contragent Registry
//!
//! Counterparties a terminal can be shipped or rented to.
//!
//! The visible list is a projection: names derived from shipments and rental
//! events, merged with a manually maintained set. Only the manual set is
//! stored. Comparison is case-insensitive and duplicates collapse onto the
//! first spelling seen.

use serde::{Deserialize, Serialize};

/// Case-insensitive name equality.
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Manually registered contragents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContragentRegistry {
    manual: Vec<String>,
}

impl ContragentRegistry {
    /// Seeds the manual set, collapsing blank and duplicate names.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::default();
        for name in names {
            registry.add(name.as_ref(), &[]);
        }
        registry
    }

    /// Manual entries in insertion order.
    pub fn manual(&self) -> &[String] {
        &self.manual
    }

    /// Merges `derived` names (already in display order) with the manual set.
    pub fn list(&self, derived: &[String]) -> Vec<String> {
        let mut merged: Vec<String> = Vec::new();
        for name in derived.iter().chain(self.manual.iter()) {
            let name = name.trim();
            if name.is_empty() || merged.iter().any(|known| same_name(known, name)) {
                continue;
            }
            merged.push(name.to_string());
        }
        merged
    }

    /// Adds a manual entry.
    ///
    /// Returns false for a blank name or when a case-insensitive match is
    /// already visible, derived or manual.
    pub fn add(&mut self, name: &str, derived: &[String]) -> bool {
        let name = name.trim();
        if name.is_empty() || self.find(name, derived).is_some() {
            return false;
        }
        self.manual.push(name.to_string());
        true
    }

    /// Removes case-insensitive matches from the manual set.
    ///
    /// Derived names stay visible. Returns true if anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.manual.len();
        self.manual.retain(|known| !same_name(known, name));
        self.manual.len() != before
    }

    /// Returns the canonical spelling of `name`, registering it if unknown.
    ///
    /// Returns `None` for a blank name.
    pub fn resolve(&mut self, name: &str, derived: &[String]) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(existing) = self.find(name, derived) {
            return Some(existing);
        }
        self.manual.push(name.to_string());
        Some(name.to_string())
    }

    fn find(&self, name: &str, derived: &[String]) -> Option<String> {
        derived
            .iter()
            .chain(self.manual.iter())
            .find(|known| same_name(known, name))
            .map(|known| known.trim().to_string())
    }
}
