//! Merge, dedup, and filter visibility.

use std::collections::HashSet;

use tracing::debug;

use access_core::{AppState, DisplayEntry, DisplaySet, FilterSet, LocationRecord};

/// Keeps the first record for each normalized name, in order.
pub fn dedup<'a, I>(records: I) -> Vec<LocationRecord>
where
    I: IntoIterator<Item = &'a LocationRecord>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.normalized_name()))
        .cloned()
        .collect()
}

/// Rebuilds `state.display` from the current inputs and returns it.
///
/// Sheet records come first so they win any name conflict with API records.
/// Filters only set visibility; they never drop entries.
pub fn recompute(state: &mut AppState) -> &DisplaySet {
    let api: &[LocationRecord] = if state.show_api_locations {
        &state.api_locations
    } else {
        &[]
    };

    let entries: Vec<DisplayEntry> = dedup(state.sheet_locations.iter().chain(api))
        .into_iter()
        .map(|record| DisplayEntry {
            visible: state.active_filters.matches(&record),
            record,
        })
        .collect();

    state.display = DisplaySet::new(entries);
    debug!(
        total = state.display.len(),
        visible = state.display.visible_count(),
        filters = %state.active_filters,
        "Display set recomputed"
    );
    &state.display
}

/// Shows or hides API records.
pub fn toggle_api_locations(state: &mut AppState) -> &DisplaySet {
    state.show_api_locations = !state.show_api_locations;
    recompute(state)
}

/// Applies a legend click on `name`.
pub fn toggle_filter<'a>(state: &'a mut AppState, name: &str) -> &'a DisplaySet {
    state.active_filters = state.active_filters.toggle(name);
    recompute(state)
}

/// Replaces the whole filter selection.
pub fn set_filters(state: &mut AppState, filters: FilterSet) -> &DisplaySet {
    state.active_filters = filters;
    recompute(state)
}
