//! Trust/reputation manager
//!
//! Owns the [`TrustRecord`] of every agent. Updates to one agent are
//! serialized by that agent's lock; different agents update in parallel.
//! Every new score is mirrored into the [`AgentRegistry`].
//!
//! Store writes happen behind the lock, in background tasks: the lock only
//! covers in-memory work. Each change bumps the agent's revision and a save
//! is skipped once a newer revision has reached the store, so the store
//! converges on the latest record even when writes finish out of order.

use crate::config::TrustParams;
use crate::ports::metrics::{MetricEvent, MetricsSink, NoMetrics};
use crate::ports::persistence::TrustStore;
use crate::services::registry::{AgentRegistry, RegistryError};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use verity_domain::{AgentId, ConsensusResult, TrustRecord, TrustSnapshot, VerdictRole};

struct RecordEntry {
    record: Mutex<TrustRecord>,
    /// Bumped under the record lock on every change
    revision: AtomicU64,
    /// Highest revision written to the store
    persisted: Mutex<u64>,
}

impl RecordEntry {
    fn new(record: TrustRecord) -> Self {
        Self {
            record: Mutex::new(record),
            revision: AtomicU64::new(0),
            persisted: Mutex::new(0),
        }
    }
}

type RecordHandle = Arc<RecordEntry>;

pub struct TrustManager {
    registry: Arc<AgentRegistry>,
    store: Arc<dyn TrustStore>,
    metrics: Arc<dyn MetricsSink>,
    params: TrustParams,
    records: RwLock<HashMap<AgentId, RecordHandle>>,
    /// Store writes not yet awaited by [`TrustManager::flush`]
    pending: StdMutex<Vec<JoinHandle<()>>>,
}

impl TrustManager {
    pub fn new(registry: Arc<AgentRegistry>, store: Arc<dyn TrustStore>, params: TrustParams) -> Self {
        Self {
            registry,
            store,
            metrics: Arc::new(NoMetrics),
            params,
            records: RwLock::new(HashMap::new()),
            pending: StdMutex::new(Vec::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn params(&self) -> &TrustParams {
        &self.params
    }

    /// Record handle for a registered agent, created from the registry's
    /// current score on first use
    fn record(&self, id: &AgentId) -> Result<RecordHandle, RegistryError> {
        if let Some(handle) = self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
        {
            return Ok(Arc::clone(handle));
        }

        let score = self.registry.get_trust(id)?;
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let handle = records
            .entry(id.clone())
            .or_insert_with(|| Arc::new(RecordEntry::new(TrustRecord::with_score(id.clone(), score))));
        Ok(Arc::clone(handle))
    }

    fn handles(&self) -> Vec<RecordHandle> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    /// Queue a store write of `record`.
    ///
    /// Must be called while the record lock is still held so revisions follow
    /// the order of changes; the write itself runs in the background.
    fn persist(&self, handle: &RecordHandle, record: &TrustRecord) {
        let revision = handle.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let record = record.clone();
        let handle = Arc::clone(handle);
        let store = Arc::clone(&self.store);
        let metrics = Arc::clone(&self.metrics);

        let task = tokio::spawn(async move {
            let mut persisted = handle.persisted.lock().await;
            if *persisted >= revision {
                debug!("Trust record {} revision {} superseded", record.agent_id, revision);
                return;
            }
            match store.save_trust_record(&record).await {
                Ok(()) => *persisted = revision,
                Err(e) => {
                    warn!("Failed to save trust record for {}: {}", record.agent_id, e);
                    metrics.record(MetricEvent::PersistenceFailure { store: "trust" });
                }
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|t| !t.is_finished());
        pending.push(task);
    }

    /// Wait for every queued store write to finish
    pub async fn flush(&self) {
        let pending = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *pending)
        };
        for task in pending {
            if let Err(e) = task.await {
                warn!("Trust store write task failed: {}", e);
            }
        }
    }

    /// Remove an agent from the registry and forget its trust record.
    ///
    /// Queued writes of the old record may still land in the store; a later
    /// agent registered under the same id starts from its configured score.
    pub fn deregister(&self, id: &AgentId) -> Result<(), RegistryError> {
        self.registry.deregister(id)?;
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        Ok(())
    }

    /// Load persisted records for every registered agent.
    ///
    /// Returns the number of records restored. Agents without a stored record
    /// keep their configured score.
    pub async fn hydrate(&self) -> usize {
        let ids: Vec<AgentId> = self.registry.list_all().into_iter().map(|a| a.id).collect();
        let mut restored = 0;

        for id in ids {
            match self.store.load_trust_record(&id).await {
                Ok(Some(mut record)) => {
                    record.agent_id = id.clone();
                    record.score = record.score.clamp(0.0, 1.0);
                    if self.registry.set_trust(&id, record.score).is_ok() {
                        self.records
                            .write()
                            .unwrap_or_else(|e| e.into_inner())
                            .insert(id, Arc::new(RecordEntry::new(record)));
                        restored += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to load trust record for {}: {}", id, e),
            }
        }

        info!("Restored {} trust records", restored);
        restored
    }

    pub fn get_score(&self, id: &AgentId) -> Result<f64, RegistryError> {
        self.registry.get_trust(id)
    }

    /// Fold one consensus outcome into an agent's score.
    ///
    /// Applies the flap penalty when the agent's health changed at least
    /// `flap_threshold` times within the flap window. Returns the new score.
    pub async fn update(&self, id: &AgentId, matched: bool, weight: f64) -> Result<f64, RegistryError> {
        let handle = self.record(id)?;
        let mut record = handle.record.lock().await;
        let policy = &self.params.policy;

        let before = record.score;
        record.apply_outcome(matched, weight, policy);

        let flaps = self.registry.flap_count(id, self.params.flap_window)?;
        if policy.flap_threshold > 0 && flaps >= policy.flap_threshold {
            record.apply_flap_penalty(policy);
            self.registry.clear_transitions(id)?;
            info!(
                "Agent {} flapped {} times; trust penalized to {:.3}",
                id, flaps, record.score
            );
        }

        self.registry.set_trust(id, record.score)?;
        debug!(
            "Trust {}: {:.3} -> {:.3} (matched={}, weight={:.2})",
            id, before, record.score, matched, weight
        );
        self.persist(&handle, &record);
        Ok(record.score)
    }

    /// Add a reported confidence to the agent's history
    pub async fn observe_confidence(&self, id: &AgentId, confidence: f64) -> Result<(), RegistryError> {
        let handle = self.record(id)?;
        handle.record.lock().await.observe_confidence(confidence);
        Ok(())
    }

    /// Update every agent that contributed to a consensus.
    ///
    /// Reported confidences always join the agents' histories; scores change
    /// only for a `Decided` result. A moderator ruling is not a panel verdict
    /// and never feeds the moderator's own trust. Returns the number of
    /// scores updated.
    pub async fn apply_resolution(&self, result: &ConsensusResult) -> usize {
        let usable: Vec<_> = result
            .usable_verdicts()
            .filter(|v| v.role == VerdictRole::Panelist)
            .collect();

        let observed = usable
            .iter()
            .map(|v| self.observe_confidence(&v.agent_id, v.confidence));
        for outcome in join_all(observed).await {
            if let Err(e) = outcome {
                debug!("Skipping confidence history: {}", e);
            }
        }

        if !result.is_decided() {
            debug!("Consensus {} not decided; trust unchanged", result.status);
            return 0;
        }

        let updates = usable.iter().map(|v| {
            self.update(&v.agent_id, v.verdict == result.verdict, v.confidence)
        });
        let mut updated = 0;
        for outcome in join_all(updates).await {
            match outcome {
                Ok(_) => updated += 1,
                // The agent was deregistered while the request was in flight
                Err(e) => debug!("Skipping trust update: {}", e),
            }
        }
        updated
    }

    /// Move every score toward the neutral prior. Returns the agents decayed.
    pub async fn decay(&self) -> usize {
        for agent in self.registry.list_all() {
            // Make sure agents never updated also decay
            let _ = self.record(&agent.id);
        }

        let decays = self.handles().into_iter().map(|handle| async move {
            let mut record = handle.record.lock().await;
            record.decay(&self.params.policy);
            match self.registry.set_trust(&record.agent_id, record.score) {
                Ok(()) => {
                    self.persist(&handle, &record);
                    true
                }
                Err(_) => false,
            }
        });
        let count = join_all(decays).await.into_iter().filter(|d| *d).count();
        debug!("Decayed trust of {} agents", count);
        count
    }

    /// Admin action: reset an agent to the neutral prior and clear its history
    pub async fn reset(&self, id: &AgentId) -> Result<f64, RegistryError> {
        let handle = self.record(id)?;
        let mut record = handle.record.lock().await;
        *record = TrustRecord::new(id.clone(), &self.params.policy);
        self.registry.set_trust(id, record.score)?;
        self.registry.clear_transitions(id)?;
        info!("Trust of {} reset to {:.2}", id, record.score);
        self.persist(&handle, &record);
        Ok(record.score)
    }

    /// Point-in-time view of every registered agent's trust
    pub async fn snapshot(&self) -> TrustSnapshot {
        let mut snapshot = TrustSnapshot::new().with_default_score(self.params.policy.neutral_prior);
        for agent in self.registry.list_all() {
            let handle = self
                .records
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .get(&agent.id)
                .cloned();
            match handle {
                Some(handle) => {
                    let record = handle.record.lock().await;
                    snapshot.insert(agent.id, record.score, record.confidence);
                }
                None => snapshot.insert(agent.id, agent.trust_score, Default::default()),
            }
        }
        snapshot
    }

    /// Run `decay` every `interval` until `token` is cancelled
    pub fn spawn_decay(self: Arc<Self>, interval: Duration, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Trust decay task stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.decay().await;
                    }
                }
            }
        })
    }
}
