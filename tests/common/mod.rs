//! Shared mock collaborators and fixture builders for the watcher tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use compliwatch::domain::error::StoreError;
use compliwatch::domain::models::{
    CheckResult, ComplianceIntegration, OperatorStatus, Profile, ReportSnapshot, Scan,
    ScanConfiguration, SensorSession, ScanWatcherResult, CHECK_COUNT_ANNOTATION_KEY,
    LAST_SCANNED_ANNOTATION_KEY,
};
use compliwatch::domain::ports::{
    CheckResultStore, IntegrationStore, ProfileStore, ScanStore, SnapshotStore,
};
use compliwatch::services::MINIMUM_OPERATOR_VERSION;

/// Install the env-filtered log subscriber for a test binary. Safe to call
/// from every test; only the first call in a process wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ========================
// Fixture builders
// ========================

pub fn scan_message(
    scan_id: &str,
    cluster_id: &str,
    check_count: Option<&str>,
    last_started: Option<DateTime<Utc>>,
) -> Scan {
    let mut annotations = HashMap::new();
    if let Some(count) = check_count {
        annotations.insert(CHECK_COUNT_ANNOTATION_KEY.to_string(), count.to_string());
    }
    Scan {
        id: scan_id.to_string(),
        cluster_id: cluster_id.to_string(),
        scan_name: format!("{scan_id}-name"),
        scan_ref_id: format!("{scan_id}-ref"),
        last_started_time: last_started,
        annotations,
        ..Scan::default()
    }
}

pub fn check_message(check_id: &str, last_scanned: Option<DateTime<Utc>>) -> CheckResult {
    let mut annotations = HashMap::new();
    if let Some(ts) = last_scanned {
        annotations.insert(
            LAST_SCANNED_ANNOTATION_KEY.to_string(),
            ts.to_rfc3339(),
        );
    }
    CheckResult {
        id: format!("{check_id}-result"),
        check_id: check_id.to_string(),
        scan_ref_id: String::new(),
        annotations,
    }
}

pub fn child_result(scan_id: &str, cluster_id: &str) -> ScanWatcherResult {
    ScanWatcherResult {
        watcher_id: format!("{cluster_id}:{scan_id}"),
        sensor_session: SensorSession::new(),
        scan: Some(scan_message(scan_id, cluster_id, None, None)),
        check_results: std::collections::HashSet::new(),
        error: None,
    }
}

pub fn scan_config(id: &str, profiles: &[&str], cluster_ids: &[&str]) -> ScanConfiguration {
    ScanConfiguration {
        id: id.to_string(),
        name: format!("{id}-name"),
        profiles: profiles.iter().map(ToString::to_string).collect(),
        clusters: cluster_ids
            .iter()
            .map(|c| compliwatch::domain::models::ClusterRef {
                cluster_id: (*c).to_string(),
                cluster_name: format!("{c}-name"),
            })
            .collect(),
    }
}

pub fn healthy_integration(cluster_id: &str) -> ComplianceIntegration {
    ComplianceIntegration {
        cluster_id: cluster_id.to_string(),
        cluster_name: format!("{cluster_id}-name"),
        version: MINIMUM_OPERATOR_VERSION.to_string(),
        operator_installed: true,
        status: OperatorStatus::Healthy,
    }
}

// ========================
// Mock stores
// ========================

/// Profile store answering every search with a fixed profile list.
pub struct StaticProfileStore {
    profiles: Vec<Profile>,
    error: Option<StoreError>,
    pub search_calls: AtomicUsize,
}

impl StaticProfileStore {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            profiles,
            error: None,
            search_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_profile_per_name(names: &[&str]) -> Self {
        Self::new(
            names
                .iter()
                .map(|name| Profile {
                    id: format!("profile-{name}"),
                    name: (*name).to_string(),
                    profile_ref_id: format!("profile-{name}-ref"),
                    cluster_id: String::new(),
                })
                .collect(),
        )
    }

    pub fn failing(error: StoreError) -> Self {
        Self {
            profiles: Vec::new(),
            error: Some(error),
            search_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProfileStore for StaticProfileStore {
    async fn search_profiles(
        &self,
        _names: &[String],
        _cluster_ids: &[String],
    ) -> Result<Vec<Profile>, StoreError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.profiles.clone()),
        }
    }
}

/// Scan store answering searches with a fixed scan list.
pub struct StaticScanStore {
    scans: Vec<Scan>,
    search_error: Option<StoreError>,
    get_error: Option<StoreError>,
    pub search_calls: AtomicUsize,
}

impl StaticScanStore {
    pub fn new(scans: Vec<Scan>) -> Self {
        Self {
            scans,
            search_error: None,
            get_error: None,
            search_calls: AtomicUsize::new(0),
        }
    }

    /// `count` scans named scan-0..scan-N for one cluster.
    pub fn with_scans(cluster_id: &str, count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|i| scan_message(&format!("scan-{i}"), cluster_id, None, None))
                .collect(),
        )
    }

    pub fn failing_search(error: StoreError) -> Self {
        Self {
            scans: Vec::new(),
            search_error: Some(error),
            get_error: None,
            search_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_get_error(mut self, error: StoreError) -> Self {
        self.get_error = Some(error);
        self
    }
}

#[async_trait]
impl ScanStore for StaticScanStore {
    async fn search_scans(
        &self,
        _profile_ref_ids: &[String],
        _cluster_ids: &[String],
    ) -> Result<Vec<Scan>, StoreError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        match &self.search_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.scans.clone()),
        }
    }

    async fn search_scans_by_ref(&self, scan_ref_id: &str) -> Result<Vec<Scan>, StoreError> {
        match &self.search_error {
            Some(err) => Err(err.clone()),
            None => Ok(self
                .scans
                .iter()
                .filter(|s| s.scan_ref_id == scan_ref_id)
                .cloned()
                .collect()),
        }
    }

    async fn get_scan(&self, id: &str) -> Result<Option<Scan>, StoreError> {
        match &self.get_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.scans.iter().find(|s| s.id == id).cloned()),
        }
    }
}

/// In-memory snapshot store recording upserts.
pub struct InMemorySnapshotStore {
    snapshots: StdMutex<HashMap<String, ReportSnapshot>>,
    upsert_error: Option<StoreError>,
    pub upserts: AtomicUsize,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshots: StdMutex::new(HashMap::new()),
            upsert_error: None,
            upserts: AtomicUsize::new(0),
        }
    }

    pub fn with_snapshots(report_ids: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut snapshots = store.snapshots.lock().unwrap();
            for id in report_ids {
                snapshots.insert(
                    (*id).to_string(),
                    ReportSnapshot {
                        report_id: (*id).to_string(),
                        ..ReportSnapshot::default()
                    },
                );
            }
        }
        store
    }

    pub fn failing_upserts(mut self, error: StoreError) -> Self {
        self.upsert_error = Some(error);
        self
    }

    pub fn snapshot(&self, report_id: &str) -> Option<ReportSnapshot> {
        self.snapshots.lock().unwrap().get(report_id).cloned()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn get_snapshot(&self, report_id: &str) -> Result<Option<ReportSnapshot>, StoreError> {
        Ok(self.snapshots.lock().unwrap().get(report_id).cloned())
    }

    async fn upsert_snapshot(&self, snapshot: ReportSnapshot) -> Result<(), StoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.upsert_error {
            return Err(err.clone());
        }
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.report_id.clone(), snapshot);
        Ok(())
    }
}

/// Integration store answering health lookups per cluster.
pub struct StaticIntegrationStore {
    by_cluster: HashMap<String, Vec<ComplianceIntegration>>,
    error: Option<StoreError>,
    pub lookups: AtomicUsize,
}

impl StaticIntegrationStore {
    pub fn new() -> Self {
        Self {
            by_cluster: HashMap::new(),
            error: None,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_integration(mut self, integration: ComplianceIntegration) -> Self {
        self.by_cluster
            .entry(integration.cluster_id.clone())
            .or_default()
            .push(integration);
        self
    }

    pub fn failing(error: StoreError) -> Self {
        Self {
            by_cluster: HashMap::new(),
            error: Some(error),
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IntegrationStore for StaticIntegrationStore {
    async fn get_integrations_by_cluster(
        &self,
        cluster_id: &str,
    ) -> Result<Vec<ComplianceIntegration>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self
                .by_cluster
                .get(cluster_id)
                .cloned()
                .unwrap_or_default()),
        }
    }
}

/// Check-result store recording deletions.
pub struct RecordingCheckResultStore {
    pub deletes: StdMutex<Vec<(Option<DateTime<Utc>>, String, bool)>>,
    error: Option<StoreError>,
}

impl RecordingCheckResultStore {
    pub fn new() -> Self {
        Self {
            deletes: StdMutex::new(Vec::new()),
            error: None,
        }
    }

    pub fn failing(error: StoreError) -> Self {
        Self {
            deletes: StdMutex::new(Vec::new()),
            error: Some(error),
        }
    }
}

#[async_trait]
impl CheckResultStore for RecordingCheckResultStore {
    async fn delete_old_results(
        &self,
        older_than: Option<DateTime<Utc>>,
        scan_ref_id: &str,
        include_unset: bool,
    ) -> Result<(), StoreError> {
        self.deletes
            .lock()
            .unwrap()
            .push((older_than, scan_ref_id.to_string(), include_unset));
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
