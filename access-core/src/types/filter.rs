//! Legend filters and the active filter set.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::LocationRecord;

/// One legend filter.
///
/// Unknown names are kept as [`Filter::Other`] and never exclude anything.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Filter {
    /// Show everything
    All,
    /// Tags mention food
    Food,
    /// Has a wifi code or mentions wifi
    Wifi,
    /// Restroom with public/exposed stalls
    Public,
    /// Restroom with private stalls
    Private,
    /// Unrecognized filter name (permissive)
    Other(String),
}

impl Filter {
    /// Parses a filter name, case-insensitively.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "all" => Filter::All,
            "food" => Filter::Food,
            "wifi" => Filter::Wifi,
            "public" => Filter::Public,
            "private" => Filter::Private,
            other => Filter::Other(other.to_string()),
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        match self {
            Filter::All => "all",
            Filter::Food => "food",
            Filter::Wifi => "wifi",
            Filter::Public => "public",
            Filter::Private => "private",
            Filter::Other(name) => name,
        }
    }

    /// Predicate for a single filter.
    pub fn matches(&self, record: &LocationRecord) -> bool {
        match self {
            Filter::All | Filter::Other(_) => true,
            Filter::Food => record.tags_lower().contains("food"),
            Filter::Wifi => {
                let has_code = record
                    .wifi_code
                    .as_deref()
                    .map(|c| !c.trim().is_empty())
                    .unwrap_or(false);
                has_code
                    || record.tags_lower().contains("wifi")
                    || record.notes_lower().contains("wifi")
            }
            Filter::Public => record.has_restroom_signal() && record.is_public(),
            Filter::Private => record.has_restroom_signal() && !record.is_public(),
        }
    }
}

impl From<&str> for Filter {
    fn from(name: &str) -> Self {
        Filter::parse(name)
    }
}

impl From<String> for Filter {
    fn from(name: String) -> Self {
        Filter::parse(&name)
    }
}

impl From<Filter> for String {
    fn from(filter: Filter) -> Self {
        filter.name().to_string()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable set of active filters.
///
/// Never empty: an empty selection collapses back to `{all}`.
/// Visibility is the logical AND of every active filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Filter>", into = "Vec<Filter>")]
pub struct FilterSet {
    active: BTreeSet<Filter>,
}

impl FilterSet {
    /// The default `{all}` set.
    pub fn all() -> Self {
        let mut active = BTreeSet::new();
        active.insert(Filter::All);
        Self { active }
    }

    /// Builds a set from filter names; an empty input yields `{all}`.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| Filter::parse(n.as_ref()))
            .collect::<Vec<_>>()
            .into()
    }

    /// True when every record is visible.
    pub fn is_all(&self) -> bool {
        self.active.is_empty() || self.active.contains(&Filter::All)
    }

    /// True if the named filter is active.
    pub fn contains(&self, name: &str) -> bool {
        self.active.contains(&Filter::parse(name))
    }

    /// Active filters in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.active.iter()
    }

    /// Number of active filters.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Active filter names.
    pub fn names(&self) -> Vec<String> {
        self.active.iter().map(|f| f.name().to_string()).collect()
    }

    /// Returns the set after a legend click on `name`.
    ///
    /// - `all` itself is a no-op (the legend uses it to expand, not to filter)
    /// - any other filter drops `all`, then flips its own membership
    /// - deselecting the last filter restores `all`
    pub fn toggle(&self, name: &str) -> FilterSet {
        let filter = Filter::parse(name);
        if filter == Filter::All {
            return self.clone();
        }

        let mut active = self.active.clone();
        active.remove(&Filter::All);
        if !active.remove(&filter) {
            active.insert(filter);
        }
        if active.is_empty() {
            active.insert(Filter::All);
        }
        FilterSet { active }
    }

    /// Visibility of a record under this set.
    pub fn matches(&self, record: &LocationRecord) -> bool {
        self.is_all() || self.active.iter().all(|f| f.matches(record))
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Vec<Filter>> for FilterSet {
    fn from(filters: Vec<Filter>) -> Self {
        let active: BTreeSet<Filter> = filters.into_iter().collect();
        if active.is_empty() {
            FilterSet::all()
        } else {
            FilterSet { active }
        }
    }
}

impl From<FilterSet> for Vec<Filter> {
    fn from(set: FilterSet) -> Self {
        set.active.into_iter().collect()
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}
