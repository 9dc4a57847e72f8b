//! Load orchestration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use access_cache::CacheStore;
use access_core::constants::{API_UNAVAILABLE_MESSAGE, SHEET_UNAVAILABLE_MESSAGE};
use access_core::error::Result;
use access_core::{
    datetime_from_millis, AppState, Blocklist, BlocklistProvider, CacheOrigin, LocationSource,
    Notification, SheetStatus, SourceLoad,
};
use access_sources::{BlocklistSource, HttpClient, RefugeSource, SheetSource};

use crate::aggregate::recompute;
use crate::config::AccessConfig;

// ═══════════════════════════════════════════════════════════════════════════════
// REPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// What one source contributed to a load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Records kept after blocking
    pub records: usize,
    /// Records removed by the blocklist
    pub blocked: usize,
    /// Freshness of the data
    pub origin: CacheOrigin,
}

impl From<&SourceLoad> for SourceSummary {
    fn from(load: &SourceLoad) -> Self {
        Self {
            records: load.records.len(),
            blocked: load.blocked,
            origin: load.origin,
        }
    }
}

/// Outcome of [`DataService::load_all`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Names on the blocklist
    pub blocklist_size: usize,
    /// Sheet outcome
    pub sheet: SourceSummary,
    /// API outcome
    pub api: SourceSummary,
    /// Resulting sheet status
    pub status: SheetStatus,
    /// Entries in the published display set
    pub displayed: usize,
    /// Entries visible under the active filters
    pub visible: usize,
}

/// Maps a sheet load onto the status badge.
pub fn sheet_status(load: &SourceLoad) -> SheetStatus {
    match load.origin {
        CacheOrigin::Fresh { fetched_at: at } | CacheOrigin::Hit { stored_at: at } => SheetStatus::Fresh {
            updated: load.last_modified.unwrap_or_else(|| datetime_from_millis(at)),
        },
        CacheOrigin::Stale { .. } => SheetStatus::Offline {
            last_modified: load.last_modified,
        },
        CacheOrigin::Default => SheetStatus::Unavailable,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// Wires the blocklist and both location sources to the application state.
pub struct DataService {
    blocklist: Arc<dyn BlocklistProvider>,
    sheet: Arc<dyn LocationSource>,
    api: Arc<dyn LocationSource>,
}

impl DataService {
    /// Creates a service from explicit sources.
    pub fn new(
        blocklist: Arc<dyn BlocklistProvider>,
        sheet: Arc<dyn LocationSource>,
        api: Arc<dyn LocationSource>,
    ) -> Self {
        Self { blocklist, sheet, api }
    }

    /// Builds the production sources from `config`, all sharing `cache`.
    pub fn from_config(config: &AccessConfig, cache: Arc<CacheStore>) -> Result<Self> {
        config.validate()?;
        let http = Arc::new(HttpClient::new(&config.http_config())?);

        let blocklist = BlocklistSource::new(config.blocklist_url.clone(), http.clone(), cache.clone())
            .with_ttl(config.blocklist_ttl());
        let sheet = SheetSource::new(config.sheet_url.clone(), http.clone(), cache.clone())
            .with_ttl(config.sheet_ttl());
        let api = RefugeSource::new(config.api_url.clone(), config.latitude, config.longitude, http, cache)
            .with_ttl(config.api_ttl());

        Ok(Self::new(Arc::new(blocklist), Arc::new(sheet), Arc::new(api)))
    }

    /// Loads only the blocklist.
    pub async fn load_blocklist(&self) -> Blocklist {
        self.blocklist.load().await
    }

    /// Refreshes every source into `state` and republishes the display set.
    ///
    /// The blocklist is awaited first; the sheet and API then load concurrently
    /// and neither outcome can prevent the other from being used. When the sheet
    /// is unavailable its previous records stay in place.
    #[instrument(skip_all)]
    pub async fn load_all(&self, state: &mut AppState) -> LoadReport {
        let blocklist = self.blocklist.load().await;

        let (sheet, api) = tokio::join!(self.sheet.load(&blocklist), self.api.load(&blocklist));

        let sheet_summary = SourceSummary::from(&sheet);
        let api_summary = SourceSummary::from(&api);
        let status = sheet_status(&sheet);

        state.notifications.clear();
        match &status {
            SheetStatus::Unavailable => {
                error!(source = self.sheet.name(), "Primary data unavailable and no offline copy");
                state.notifications.push(Notification::error(SHEET_UNAVAILABLE_MESSAGE));
            }
            SheetStatus::Offline { .. } => {
                warn!(source = self.sheet.name(), "Serving offline copy of primary data");
                state.sheet_locations = sheet.records;
            }
            _ => state.sheet_locations = sheet.records,
        }

        if api.origin.is_default() {
            warn!(source = self.api.name(), "Supplementary data unavailable");
            state.notifications.push(Notification::error(API_UNAVAILABLE_MESSAGE));
        }
        state.api_locations = api.records;
        state.status = status.clone();

        let display = recompute(state);
        let report = LoadReport {
            blocklist_size: blocklist.len(),
            sheet: sheet_summary,
            api: api_summary,
            status,
            displayed: display.len(),
            visible: display.visible_count(),
        };

        info!(
            sheet = report.sheet.records,
            api = report.api.records,
            displayed = report.displayed,
            visible = report.visible,
            status = %report.status,
            "Load complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_core::LocationRecord;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    /// Records the order sources were called in.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<&'static str>>);

    impl Recorder {
        fn push(&self, name: &'static str) {
            self.0.lock().push(name);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.0.lock().clone()
        }
    }

    struct FixedBlocklist(Blocklist, Arc<Recorder>);

    #[async_trait]
    impl BlocklistProvider for FixedBlocklist {
        async fn load(&self) -> Blocklist {
            self.1.push("blocklist");
            self.0.clone()
        }
    }

    struct FixedSource {
        name: &'static str,
        records: Vec<LocationRecord>,
        origin: CacheOrigin,
        last_modified: Option<chrono::DateTime<Utc>>,
        recorder: Arc<Recorder>,
    }

    #[async_trait]
    impl LocationSource for FixedSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn load(&self, blocklist: &Blocklist) -> SourceLoad {
            self.recorder.push(self.name);
            let (records, blocked) = blocklist.partition(self.records.clone());
            SourceLoad {
                records,
                origin: self.origin,
                blocked: blocked.len(),
                last_modified: self.last_modified,
            }
        }
    }

    fn service(
        sheet: Vec<LocationRecord>,
        sheet_origin: CacheOrigin,
        api: Vec<LocationRecord>,
        api_origin: CacheOrigin,
    ) -> (DataService, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let service = DataService::new(
            Arc::new(FixedBlocklist(Blocklist::from_names(["blocked"]), recorder.clone())),
            Arc::new(FixedSource {
                name: "sheet",
                records: sheet,
                origin: sheet_origin,
                last_modified: None,
                recorder: recorder.clone(),
            }),
            Arc::new(FixedSource {
                name: "api",
                records: api,
                origin: api_origin,
                last_modified: None,
                recorder: recorder.clone(),
            }),
        );
        (service, recorder)
    }

    fn rec(name: &str) -> LocationRecord {
        LocationRecord::new(name).unwrap()
    }

    const T: i64 = 1_704_067_200_000;

    #[test]
    fn test_sheet_status_mapping() {
        let mut load = SourceLoad::empty(CacheOrigin::Fresh { fetched_at: T });
        assert_eq!(
            sheet_status(&load),
            SheetStatus::Fresh {
                updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            }
        );

        let stamp = Utc.with_ymd_and_hms(2023, 12, 31, 18, 0, 0).unwrap();
        load.last_modified = Some(stamp);
        assert_eq!(sheet_status(&load), SheetStatus::Fresh { updated: stamp });

        load.origin = CacheOrigin::Stale { stored_at: T };
        assert_eq!(sheet_status(&load), SheetStatus::Offline { last_modified: Some(stamp) });

        load.origin = CacheOrigin::Default;
        assert_eq!(sheet_status(&load), SheetStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_load_all_merges_and_blocks() {
        let (service, recorder) = service(
            vec![rec("A"), rec("Blocked")],
            CacheOrigin::Fresh { fetched_at: T },
            vec![rec("a").from_api(), rec("B").from_api()],
            CacheOrigin::Hit { stored_at: T },
        );
        let mut state = AppState::new();
        let report = service.load_all(&mut state).await;

        assert_eq!(recorder.calls()[0], "blocklist");
        assert_eq!(report.sheet.blocked, 1);
        assert_eq!(report.displayed, 2);
        assert!(state.notifications.is_empty());
        let names: Vec<_> = state.display.records().map(|r| r.location.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_sheet_unavailable_keeps_previous_records() {
        let (service, _) = service(
            vec![],
            CacheOrigin::Default,
            vec![rec("B").from_api()],
            CacheOrigin::Fresh { fetched_at: T },
        );
        let mut state = AppState::new();
        state.sheet_locations = vec![rec("Old")];

        let report = service.load_all(&mut state).await;
        assert_eq!(report.status, SheetStatus::Unavailable);
        assert_eq!(state.sheet_locations, vec![rec("Old")]);
        assert_eq!(state.notifications, vec![Notification::error(SHEET_UNAVAILABLE_MESSAGE)]);
        assert_eq!(state.display.len(), 2);
    }

    #[tokio::test]
    async fn test_api_failure_is_non_blocking() {
        let (service, _) = service(
            vec![rec("A")],
            CacheOrigin::Stale { stored_at: T },
            vec![],
            CacheOrigin::Default,
        );
        let mut state = AppState::new();
        state.api_locations = vec![rec("Gone").from_api()];

        let report = service.load_all(&mut state).await;
        assert_eq!(report.status, SheetStatus::Offline { last_modified: None });
        assert_eq!(state.status.to_string(), "Using Offline Data");
        assert!(state.api_locations.is_empty());
        assert_eq!(state.notifications, vec![Notification::error(API_UNAVAILABLE_MESSAGE)]);
        assert_eq!(state.display.len(), 1);
    }

    #[tokio::test]
    async fn test_notifications_reset_each_load() {
        let (failing, _) = service(vec![], CacheOrigin::Default, vec![], CacheOrigin::Default);
        let mut state = AppState::new();
        failing.load_all(&mut state).await;
        assert_eq!(state.notifications.len(), 2);

        let (ok, _) = service(
            vec![rec("A")],
            CacheOrigin::Fresh { fetched_at: T },
            vec![],
            CacheOrigin::Fresh { fetched_at: T },
        );
        ok.load_all(&mut state).await;
        assert!(state.notifications.is_empty());
        assert!(matches!(state.status, SheetStatus::Fresh { .. }));
    }

    #[tokio::test]
    async fn test_load_respects_filters_and_api_toggle() {
        let (service, _) = service(
            vec![rec("Diner").with_tags("Food")],
            CacheOrigin::Fresh { fetched_at: T },
            vec![rec("Hall").with_privacy("Public").from_api()],
            CacheOrigin::Fresh { fetched_at: T },
        );
        let mut state = AppState::new();
        state.show_api_locations = false;
        state.active_filters = state.active_filters.toggle("food");

        let report = service.load_all(&mut state).await;
        assert_eq!(report.displayed, 1);
        assert_eq!(report.visible, 1);
        assert_eq!(state.api_locations.len(), 1);
    }
}
