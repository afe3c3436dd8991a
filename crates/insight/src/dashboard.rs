use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use segview_protocol::{InsightMap, Record, ResultPayload};

use crate::error::Result;
use crate::view::{build_view, DashboardView};

/// Where result payloads come from.
#[async_trait]
pub trait SegmentationSource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<Record>>;

    async fn fetch_insights(&self) -> Result<InsightMap>;
}

/// Immutable payload committed by a successful refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    payload: ResultPayload,
}

impl Snapshot {
    pub fn new(records: Vec<Record>, insights: InsightMap) -> Self {
        Self {
            payload: ResultPayload { records, insights },
        }
    }

    /// Parses the two service responses as they arrive on the wire.
    pub fn from_json(records: &str, insights: &str) -> Result<Self> {
        let records: Vec<Record> = serde_json::from_str(records)?;
        let insights: InsightMap = serde_json::from_str(insights)?;
        Ok(Self::new(records, insights))
    }

    pub fn records(&self) -> &[Record] {
        &self.payload.records
    }

    pub fn insights(&self) -> &InsightMap {
        &self.payload.insights
    }

    /// Recomputed on every call; nothing derived is cached.
    pub fn view(&self) -> DashboardView {
        build_view(self.records(), self.insights())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated { records: usize, segments: usize },
    /// The service answered with no records; the previous snapshot stays.
    NoData,
}

/// Owns the current snapshot and replaces it whole on each successful refresh.
///
/// Refreshes may overlap. None is cancelled and whichever finishes last wins.
pub struct Dashboard<S> {
    source: S,
    current: RwLock<Option<Arc<Snapshot>>>,
    in_flight: AtomicUsize,
}

struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<S: SegmentationSource> Dashboard<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn view(&self) -> Option<DashboardView> {
        self.snapshot().map(|snapshot| snapshot.view())
    }

    /// Fetches records, then insights. On any failure the previous snapshot is
    /// kept and the error is returned; nothing is retried.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let _loading = LoadingGuard::enter(&self.in_flight);

        let records = self.source.fetch_records().await.inspect_err(|err| {
            log::error!("Error fetching data: {err}");
        })?;
        let insights = self.source.fetch_insights().await.inspect_err(|err| {
            log::error!("Error fetching data: {err}");
        })?;

        if records.is_empty() {
            log::info!("Service returned no records; keeping current view");
            return Ok(RefreshOutcome::NoData);
        }

        let outcome = RefreshOutcome::Updated {
            records: records.len(),
            segments: insights.len(),
        };
        let snapshot = Arc::new(Snapshot::new(records, insights));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        log::debug!("Committed snapshot: {outcome:?}");
        Ok(outcome)
    }
}
