//! Process-wide cache of per-project analysis results.
//!
//! Each project owns a slot holding its latest snapshot and a single-flight
//! flag. A recomputation fetches build history without holding any lock,
//! classifies on the blocking pool and then swaps the snapshot in only if its
//! version is newer than the cached one. Readers always see a whole snapshot.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::test_classifier::TestClassifier;
use crate::domain::errors::DomainError;
use crate::domain::models::{AnalysisConfig, TestAnalysisResult};
use crate::domain::ports::{AnalysisWindow, BuildHistoryStore};

/// Event emitted by the holder for observability consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisEvent {
    /// A recomputation pass started.
    Started { project_id: String, version: u64 },
    /// A pass finished and its snapshot was installed.
    Completed {
        project_id: String,
        version: u64,
        flaky: usize,
        suspicious: usize,
        always_failing: usize,
        duration_ms: u64,
    },
    /// A pass finished after being superseded; its result was dropped.
    Discarded { project_id: String, version: u64 },
    /// A pass failed; the previous snapshot stays in place.
    Failed {
        project_id: String,
        version: u64,
        error: String,
    },
}

/// Outcome of one recomputation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecomputeStatus {
    /// The new snapshot is now cached.
    Applied { version: u64 },
    /// A newer snapshot (or an invalidation) won; this result was dropped.
    Discarded { version: u64 },
    /// Fetching or classifying failed; the previous snapshot is retained.
    Failed { version: u64, error: String },
    /// Another pass for the project was already running.
    Coalesced,
}

/// Result of asking for a background recomputation.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// A pass was spawned.
    Started {
        version: u64,
        handle: JoinHandle<RecomputeStatus>,
    },
    /// A pass for the project is already in flight.
    Coalesced,
}

impl TriggerOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}

#[derive(Debug)]
struct Snapshot {
    version: u64,
    result: Arc<TestAnalysisResult>,
}

#[derive(Debug)]
struct ProjectSlot {
    in_flight: AtomicBool,
    snapshot: RwLock<Snapshot>,
}

impl ProjectSlot {
    fn new(project_id: &str, version: u64) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            snapshot: RwLock::new(Snapshot {
                version,
                result: Arc::new(TestAnalysisResult::not_computed(project_id)),
            }),
        }
    }
}

/// Clears the slot's in-flight flag when the pass ends, however it ends.
struct InFlightGuard {
    slot: Arc<ProjectSlot>,
}

impl InFlightGuard {
    fn acquire(slot: &Arc<ProjectSlot>) -> Option<Self> {
        slot.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { slot: Arc::clone(slot) })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.slot.in_flight.store(false, Ordering::Release);
    }
}

/// Cache of the latest [`TestAnalysisResult`] per project.
pub struct TestAnalysisResultHolder<S: BuildHistoryStore + ?Sized> {
    store: Arc<S>,
    classifier: Arc<TestClassifier>,
    window_days: u32,
    slots: Arc<RwLock<HashMap<String, Arc<ProjectSlot>>>>,
    versions: Arc<AtomicU64>,
    event_sender: Option<mpsc::Sender<AnalysisEvent>>,
}

impl<S: BuildHistoryStore + ?Sized> Clone for TestAnalysisResultHolder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            classifier: Arc::clone(&self.classifier),
            window_days: self.window_days,
            slots: Arc::clone(&self.slots),
            versions: Arc::clone(&self.versions),
            event_sender: self.event_sender.clone(),
        }
    }
}

impl<S: BuildHistoryStore + ?Sized + 'static> TestAnalysisResultHolder<S> {
    /// Create a holder reading from `store`.
    pub fn new(store: Arc<S>, config: &AnalysisConfig) -> Self {
        Self {
            store,
            classifier: Arc::new(TestClassifier::from_config(config)),
            window_days: config.window_days,
            slots: Arc::new(RwLock::new(HashMap::new())),
            versions: Arc::new(AtomicU64::new(0)),
            event_sender: None,
        }
    }

    /// Publish [`AnalysisEvent`]s on `sender`.
    pub fn with_event_sender(mut self, sender: mpsc::Sender<AnalysisEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Latest snapshot for `project_id`.
    ///
    /// Returns a result with `start_date == None` if the project was never
    /// computed. Callers wanting a fallback walk up the project tree, see
    /// [`find_computed_result`](super::result_lookup::find_computed_result).
    pub async fn get_result(&self, project_id: &str) -> Arc<TestAnalysisResult> {
        let slot = self.slots.read().await.get(project_id).cloned();
        match slot {
            Some(slot) => Arc::clone(&slot.snapshot.read().await.result),
            None => Arc::new(TestAnalysisResult::not_computed(project_id)),
        }
    }

    /// Start a background recomputation unless one is already running.
    pub async fn trigger_recompute(&self, project_id: &str) -> TriggerOutcome {
        let slot = self.slot(project_id).await;
        let Some(guard) = InFlightGuard::acquire(&slot) else {
            debug!(project_id, "recomputation already in flight, coalescing trigger");
            return TriggerOutcome::Coalesced;
        };

        let version = self.next_version();
        let holder = self.clone();
        let project_id = project_id.to_string();
        let handle =
            tokio::spawn(async move { holder.run_pass(project_id, version, slot, guard).await });

        TriggerOutcome::Started { version, handle }
    }

    /// Run one recomputation pass in the current task.
    ///
    /// Shares the single-flight guard with [`Self::trigger_recompute`].
    pub async fn recompute(&self, project_id: &str) -> RecomputeStatus {
        let slot = self.slot(project_id).await;
        let Some(guard) = InFlightGuard::acquire(&slot) else {
            debug!(project_id, "recomputation already in flight, coalescing");
            return RecomputeStatus::Coalesced;
        };

        let version = self.next_version();
        self.run_pass(project_id.to_string(), version, slot, guard)
            .await
    }

    /// Drop the cached snapshot for `project_id`.
    ///
    /// Any pass already running for the project is superseded: its result is
    /// discarded when it completes, and a new trigger may start right away.
    pub async fn invalidate(&self, project_id: &str) {
        let version = self.next_version();
        let fresh = Arc::new(ProjectSlot::new(project_id, version));
        self.slots
            .write()
            .await
            .insert(project_id.to_string(), fresh);
        info!(project_id, version, "analysis result invalidated");
    }

    /// Whether a pass for `project_id` is currently running.
    pub async fn is_recomputing(&self, project_id: &str) -> bool {
        self.slots
            .read()
            .await
            .get(project_id)
            .is_some_and(|slot| slot.in_flight.load(Ordering::Acquire))
    }

    /// Ids of projects that have a computed snapshot, sorted.
    pub async fn computed_projects(&self) -> Vec<String> {
        let slots: Vec<(String, Arc<ProjectSlot>)> = self
            .slots
            .read()
            .await
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();

        let mut computed = Vec::new();
        for (id, slot) in slots {
            if slot.snapshot.read().await.result.is_computed() {
                computed.push(id);
            }
        }
        computed.sort();
        computed
    }

    async fn slot(&self, project_id: &str) -> Arc<ProjectSlot> {
        if let Some(slot) = self.slots.read().await.get(project_id) {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().await;
        Arc::clone(
            slots
                .entry(project_id.to_string())
                .or_insert_with(|| Arc::new(ProjectSlot::new(project_id, 0))),
        )
    }

    fn next_version(&self) -> u64 {
        self.versions.fetch_add(1, Ordering::AcqRel) + 1
    }

    async fn run_pass(
        &self,
        project_id: String,
        version: u64,
        slot: Arc<ProjectSlot>,
        _guard: InFlightGuard,
    ) -> RecomputeStatus {
        let started_at = Utc::now();
        let timer = Instant::now();
        info!(project_id = %project_id, version, "recomputation started");
        self.emit(AnalysisEvent::Started {
            project_id: project_id.clone(),
            version,
        });

        let window = AnalysisWindow::last_days(self.window_days, started_at);
        let records = match self.store.fetch_executions(&project_id, &window).await {
            Ok(records) => records,
            Err(err) => return self.fail(&project_id, version, &err),
        };
        debug!(project_id = %project_id, version, records = records.len(), "build history fetched");

        let classifier = Arc::clone(&self.classifier);
        let pass_project = project_id.clone();
        let classified = tokio::task::spawn_blocking(move || {
            classifier.classify_project(&pass_project, records, started_at)
        })
        .await;

        let result = match classified {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => return self.fail(&project_id, version, &err),
            Err(join_err) => {
                let err = DomainError::ValidationFailed(format!("classification aborted: {join_err}"));
                return self.fail(&project_id, version, &err);
            }
        };

        let (flaky, suspicious, always_failing) = (
            result.flaky_tests.len(),
            result.suspicious_tests.len(),
            result.always_failing_tests.len(),
        );

        if !self.apply(&project_id, &slot, version, result).await {
            warn!(project_id = %project_id, version, "stale recomputation result discarded");
            self.emit(AnalysisEvent::Discarded {
                project_id,
                version,
            });
            return RecomputeStatus::Discarded { version };
        }

        let duration_ms = u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            project_id = %project_id,
            version,
            flaky,
            suspicious,
            always_failing,
            duration_ms,
            "recomputation completed"
        );
        self.emit(AnalysisEvent::Completed {
            project_id,
            version,
            flaky,
            suspicious,
            always_failing,
            duration_ms,
        });
        RecomputeStatus::Applied { version }
    }

    /// Install `result` if `slot` is still the project's slot and `version`
    /// is newer than its snapshot.
    async fn apply(
        &self,
        project_id: &str,
        slot: &Arc<ProjectSlot>,
        version: u64,
        result: TestAnalysisResult,
    ) -> bool {
        let current = self.slots.read().await.get(project_id).cloned();
        if !current.is_some_and(|current| Arc::ptr_eq(&current, slot)) {
            return false;
        }

        let mut snapshot = slot.snapshot.write().await;
        if version <= snapshot.version {
            return false;
        }
        *snapshot = Snapshot {
            version,
            result: Arc::new(result),
        };
        true
    }

    fn fail(&self, project_id: &str, version: u64, err: &DomainError) -> RecomputeStatus {
        error!(
            project_id,
            version,
            error = %err,
            "recomputation failed, keeping previous result"
        );
        self.emit(AnalysisEvent::Failed {
            project_id: project_id.to_string(),
            version,
            error: err.to_string(),
        });
        RecomputeStatus::Failed {
            version,
            error: err.to_string(),
        }
    }

    fn emit(&self, event: AnalysisEvent) {
        if let Some(ref sender) = self.event_sender {
            if let Err(err) = sender.try_send(event) {
                debug!(error = %err, "analysis event dropped");
            }
        }
    }
}
