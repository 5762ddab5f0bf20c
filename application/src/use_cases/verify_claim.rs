//! Verify Claim use case
//!
//! Orchestrates one verification: select agents, fan out evaluation tasks,
//! collect verdicts under a deadline, resolve consensus, escalate contested
//! results to debate, then update trust and persist the result.
//!
//! ```text
//! request ─▶ select ─▶ JoinSet { evaluate × N } ─▶ consensus ─┬─▶ trust ─▶ result
//!                          │ fast-path: cancel rest           │
//!                          └───────────────────────────────── └─▶ debate ─▶ consensus
//! ```

use crate::config::{DebateParams, EngineConfig, VerifyParams};
use crate::ports::evidence_gateway::{EvaluationRequest, EvidenceGateway, GatewayError};
use crate::ports::metrics::{MetricEvent, MetricsSink, NoMetrics};
use crate::ports::persistence::{NoPersistence, ResultStore};
use crate::ports::progress::{NoProgress, VerificationProgress};
use crate::services::debate_controller::DebateController;
use crate::services::registry::AgentRegistry;
use crate::services::trust_manager::TrustManager;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{Instant, error::Elapsed};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use verity_domain::{
    Agent, AgentId, AgentVerdict, Capability, ConsensusEngine, DomainError, HealthStatus,
    Priority, ReasoningStep, StepKind, TrustSnapshot, VerificationMetadata, VerificationRequest,
    VerificationResult, VerdictRole, infer_domain, select_agents,
};

/// Request-level errors
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] DomainError),

    #[error("No agents configured")]
    NoAgentsConfigured,

    #[error("No eligible agent is available")]
    AgentUnavailable,

    #[error("Overloaded: no capacity for {requested} agent tasks within {waited_ms}ms")]
    Overloaded { requested: usize, waited_ms: u64 },

    #[error("Verification cancelled")]
    Cancelled,
}

impl VerifyError {
    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, VerifyError::Overloaded { .. })
    }
}

/// Input for the VerifyClaim use case
#[derive(Debug, Clone)]
pub struct VerifyClaimInput {
    pub claim: String,
    pub context: Option<String>,
    pub priority: Priority,
    pub require_sources: bool,
    /// Falls back to [`VerifyParams::default_deadline`]
    pub deadline: Option<Duration>,
    pub cancellation_token: Option<CancellationToken>,
}

impl VerifyClaimInput {
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            context: None,
            priority: Priority::Normal,
            require_sources: false,
            deadline: None,
            cancellation_token: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_require_sources(mut self, require: bool) -> Self {
        self.require_sources = require;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }
}

/// Outcome of one evaluation task
type TaskOutcome = (AgentId, Result<Result<AgentVerdict, GatewayError>, Elapsed>, Duration);

/// Per-request state shared by the dispatch phase
struct RequestScope<'a> {
    request: &'a VerificationRequest,
    snapshot: &'a TrustSnapshot,
    /// Each evaluation task is cut off here
    task_deadline: Instant,
    /// Collection is abandoned at `deadline_at + grace`
    deadline_at: Instant,
    token: &'a CancellationToken,
    progress: &'a dyn VerificationProgress,
}

/// What the collection phase produced
struct Collected {
    /// Verdicts in dispatch order
    verdicts: Vec<AgentVerdict>,
    trace: Vec<ReasoningStep>,
    fast_path: bool,
}

/// Use case for verifying a claim
pub struct VerifyClaimUseCase {
    registry: Arc<AgentRegistry>,
    trust: Arc<TrustManager>,
    gateway: Arc<dyn EvidenceGateway>,
    results: Arc<dyn ResultStore>,
    metrics: Arc<dyn MetricsSink>,
    engine: ConsensusEngine,
    debate: DebateController,
    params: VerifyParams,
    permits: Arc<Semaphore>,
}

impl VerifyClaimUseCase {
    pub fn new(
        registry: Arc<AgentRegistry>,
        trust: Arc<TrustManager>,
        gateway: Arc<dyn EvidenceGateway>,
        config: EngineConfig,
    ) -> Self {
        let engine = ConsensusEngine::new(config.consensus);
        let debate = DebateController::new(Arc::clone(&gateway), engine.clone(), config.debate);
        let permits = Arc::new(Semaphore::new(config.verify.max_in_flight.max(1)));
        Self {
            registry,
            trust,
            gateway,
            results: Arc::new(NoPersistence),
            metrics: Arc::new(NoMetrics),
            engine,
            debate,
            params: config.verify,
            permits,
        }
    }

    pub fn with_result_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.results = store;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn params(&self) -> &VerifyParams {
        &self.params
    }

    pub fn debate_params(&self) -> &DebateParams {
        self.debate.params()
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: VerifyClaimInput) -> Result<VerificationResult, VerifyError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: VerifyClaimInput,
        progress: &dyn VerificationProgress,
    ) -> Result<VerificationResult, VerifyError> {
        let started = Instant::now();
        let deadline = input.deadline.unwrap_or(self.params.default_deadline);
        let request = VerificationRequest::new(
            input.claim,
            input.context,
            input.priority,
            input.require_sources,
            deadline,
        )?;
        let token = input.cancellation_token.unwrap_or_default();

        if self.registry.is_empty() {
            return Err(VerifyError::NoAgentsConfigured);
        }
        let eligible = self.registry.list_eligible(&BTreeSet::new());
        if eligible.is_empty() {
            return Err(VerifyError::AgentUnavailable);
        }

        let domain = infer_domain(request.claim());
        let mut selected = select_agents(
            &eligible,
            domain,
            request.priority(),
            &self.params.selection,
        );
        selected.truncate(self.params.max_in_flight.max(1));

        info!(
            "Verifying request {} ({} priority, domain {}) with {} agents",
            request.id(),
            request.priority(),
            domain,
            selected.len()
        );

        let deadline_at = started + request.deadline();
        let permits = self.acquire_permits(selected.len(), deadline_at).await?;

        let snapshot = self.trust.snapshot().await;
        let ids: Vec<AgentId> = selected.iter().map(|a| a.id.clone()).collect();
        let mut trace = vec![
            ReasoningStep::new(
                StepKind::Selection,
                format!(
                    "Selected {} of {} eligible agents for a {} claim: {}",
                    selected.len(),
                    eligible.len(),
                    domain,
                    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
                ),
            )
            .with_meta("domain", domain)
            .with_meta("priority", request.priority()),
        ];

        progress.on_dispatch(&ids);
        let scope = RequestScope {
            request: &request,
            snapshot: &snapshot,
            task_deadline: started + self.params.task_budget(request.deadline()),
            deadline_at,
            token: &token,
            progress,
        };
        let collected = self.dispatch(&scope, &selected, domain, permits).await?;
        trace.extend(collected.trace);

        let first = self.engine.resolve(&collected.verdicts, &snapshot);
        progress.on_consensus(&first);
        trace.extend(first.reasoning.iter().cloned());

        let mut escalated = false;
        let mut debate_summary = None;
        let final_result = if first.needs_escalation
            && !first.is_unresolved()
            && self.debate.params().enabled
        {
            escalated = true;
            self.metrics.record(MetricEvent::Escalation);
            trace.push(
                ReasoningStep::new(
                    StepKind::Escalation,
                    format!(
                        "Confidence {:.2} below {:.2} with disagreeing agents; escalating to debate",
                        first.confidence,
                        self.engine.policy().escalation_threshold
                    ),
                )
                .with_meta("confidence", format!("{:.4}", first.confidence)),
            );

            let roster: Vec<AgentId> = self
                .registry
                .list_eligible(&BTreeSet::new())
                .into_iter()
                .map(|a| a.id)
                .collect();
            let debate_deadline = deadline_at + self.params.grace;
            match self
                .debate
                .run(&request, &first, &snapshot, &roster, debate_deadline, progress)
                .await
            {
                Ok(outcome) => {
                    trace.extend(outcome.trace);
                    debate_summary = outcome.summary;
                    if debate_summary.is_some() {
                        progress.on_consensus(&outcome.result);
                        trace.extend(outcome.result.reasoning.iter().cloned());
                    }
                    outcome.result
                }
                Err(e) => {
                    warn!("Debate aborted for {}: {}", request.id(), e);
                    first
                }
            }
        } else {
            first
        };

        self.trust.apply_resolution(&final_result).await;
        self.metrics.record(MetricEvent::ConsensusConfidence {
            verdict: final_result.verdict,
            confidence: final_result.confidence,
        });

        let metadata = VerificationMetadata {
            agents_dispatched: selected.len(),
            agents_responded: collected.verdicts.iter().filter(|v| !v.is_error()).count(),
            fast_path: collected.fast_path,
            escalated,
            debate_rounds: debate_summary.as_ref().map(|d| d.rounds).unwrap_or(0),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        let result =
            VerificationResult::assemble(&request, &final_result, trace, debate_summary, metadata);

        // Trust writes already run in the background; the result write may
        // use whatever is left of the grace period and no more
        let save_by = deadline_at + self.params.grace;
        match tokio::time::timeout_at(save_by, self.results.save_result(&result)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Failed to save result {}: {}", result.request_id, e);
                self.metrics
                    .record(MetricEvent::PersistenceFailure { store: "result" });
            }
            Err(_) => {
                warn!("Result {} not saved before the grace deadline", result.request_id);
                self.metrics
                    .record(MetricEvent::PersistenceFailure { store: "result" });
            }
        }

        info!(
            "Request {} resolved {} ({:.2}, {}) in {}ms",
            result.request_id,
            result.verdict,
            result.confidence,
            result.status,
            result.metadata.elapsed_ms
        );
        Ok(result)
    }

    /// Reserve one permit per agent task, waiting at most `queue_timeout`
    /// and never past the request deadline
    async fn acquire_permits(
        &self,
        count: usize,
        deadline_at: Instant,
    ) -> Result<Vec<OwnedSemaphorePermit>, VerifyError> {
        let wait = self
            .params
            .queue_timeout
            .min(deadline_at.saturating_duration_since(Instant::now()));

        let semaphore = Arc::clone(&self.permits);
        let acquire = async move {
            let mut permits = Vec::with_capacity(count);
            for _ in 0..count {
                permits.push(Arc::clone(&semaphore).acquire_owned().await?);
            }
            Ok::<_, tokio::sync::AcquireError>(permits)
        };

        match tokio::time::timeout(wait, acquire).await {
            Ok(Ok(permits)) => Ok(permits),
            _ => {
                warn!("No capacity for {} agent tasks after {:?}", count, wait);
                self.metrics.record(MetricEvent::Overloaded);
                Err(VerifyError::Overloaded {
                    requested: count,
                    waited_ms: wait.as_millis() as u64,
                })
            }
        }
    }

    /// Fan out one evaluation task per agent and collect their verdicts
    async fn dispatch(
        &self,
        scope: &RequestScope<'_>,
        selected: &[Agent],
        domain: Capability,
        permits: Vec<OwnedSemaphorePermit>,
    ) -> Result<Collected, VerifyError> {
        let RequestScope {
            request,
            snapshot,
            task_deadline,
            deadline_at,
            token,
            progress,
        } = *scope;
        let guard = tokio::time::sleep_until(deadline_at + self.params.grace);
        tokio::pin!(guard);

        let mut join_set = JoinSet::new();
        for (agent, permit) in selected.iter().zip(permits) {
            let gateway = Arc::clone(&self.gateway);
            let task = EvaluationRequest {
                agent_id: agent.id.clone(),
                claim: request.claim().text().to_string(),
                context: request.context().map(str::to_string),
                capability: agent.capability_for(domain),
                require_sources: request.require_sources(),
            };

            join_set.spawn(async move {
                let _permit = permit;
                let started = Instant::now();
                let outcome =
                    tokio::time::timeout_at(task_deadline, gateway.evaluate(&task)).await;
                (task.agent_id, outcome, started.elapsed())
            });
        }

        let mut pending: Vec<AgentId> = selected.iter().map(|a| a.id.clone()).collect();
        let mut received: Vec<AgentVerdict> = Vec::with_capacity(selected.len());
        let mut trace = Vec::new();
        let mut fast_path = false;
        let mut overran = false;

        loop {
            let joined = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    join_set.abort_all();
                    join_set.shutdown().await;
                    info!("Request {} cancelled", request.id());
                    return Err(VerifyError::Cancelled);
                }
                _ = &mut guard => {
                    warn!("Request {} passed its deadline; abandoning {} tasks", request.id(), pending.len());
                    overran = true;
                    break;
                }
                joined = join_set.join_next() => joined,
            };

            let Some(joined) = joined else {
                break;
            };
            let (agent_id, outcome, elapsed): TaskOutcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Evaluation task failed: {}", e);
                    continue;
                }
            };
            pending.retain(|id| id != &agent_id);

            let verdict = self.settle(request, agent_id, outcome, elapsed, &mut trace);
            progress.on_agent_complete(&verdict);
            received.push(verdict);

            let usable = received.iter().filter(|v| !v.is_error()).count();
            if !pending.is_empty() && usable * 2 > selected.len() {
                let partial = self.engine.resolve(&received, snapshot);
                let bound = self.engine.pending_weight_bound(&pending, snapshot);
                if self
                    .engine
                    .is_settled(&partial, bound, self.params.certainty_threshold)
                {
                    fast_path = true;
                    break;
                }
            }
        }

        join_set.abort_all();
        join_set.shutdown().await;

        if fast_path {
            info!(
                "Fast path for {}: cancelled {} outstanding tasks",
                request.id(),
                pending.len()
            );
            self.metrics.record(MetricEvent::FastPath {
                cancelled: pending.len(),
            });
            progress.on_fast_path(pending.len());
            trace.push(
                ReasoningStep::new(
                    StepKind::FastPath,
                    format!(
                        "{} of {} agents agreed with certainty; cancelled {} outstanding tasks",
                        received.len(),
                        selected.len(),
                        pending.len()
                    ),
                )
                .with_meta("cancelled", pending.len()),
            );
        } else {
            // Tasks that panicked or outlived the guard count as timeouts
            for agent_id in pending {
                let latency = if overran {
                    request.deadline().as_millis() as u64
                } else {
                    0
                };
                let verdict = AgentVerdict::timeout(agent_id, latency);
                self.mark_failure(&verdict.agent_id);
                progress.on_agent_complete(&verdict);
                received.push(verdict);
            }
        }

        // Dispatch order keeps the result independent of arrival order
        received.sort_by_key(|v| {
            selected
                .iter()
                .position(|a| a.id == v.agent_id)
                .unwrap_or(usize::MAX)
        });

        Ok(Collected {
            verdicts: received,
            trace,
            fast_path,
        })
    }

    /// Turn a task outcome into a verdict and update the agent's health
    fn settle(
        &self,
        request: &VerificationRequest,
        agent_id: AgentId,
        outcome: Result<Result<AgentVerdict, GatewayError>, Elapsed>,
        elapsed: Duration,
        trace: &mut Vec<ReasoningStep>,
    ) -> AgentVerdict {
        let latency_ms = elapsed.as_millis() as u64;

        let verdict = match outcome {
            Ok(Ok(verdict)) if !verdict.is_error() => {
                // Only the debate controller casts moderator rulings
                let confidence = if verdict.confidence.is_nan() {
                    0.0
                } else {
                    verdict.confidence.clamp(0.0, 1.0)
                };
                let mut verdict = AgentVerdict {
                    agent_id: agent_id.clone(),
                    confidence,
                    latency_ms,
                    failure: None,
                    role: VerdictRole::Panelist,
                    ..verdict
                };
                debug!(
                    "Agent {} answered {} ({:.2}) in {}ms",
                    agent_id, verdict.verdict, verdict.confidence, latency_ms
                );
                trace.push(
                    ReasoningStep::new(
                        StepKind::AgentVerdict,
                        format!(
                            "{} answered {} with confidence {:.2}",
                            agent_id, verdict.verdict, verdict.confidence
                        ),
                    )
                    .with_meta("agent", &agent_id)
                    .with_meta("latency_ms", latency_ms),
                );
                if request.require_sources() && verdict.demote_if_unsourced() {
                    trace.push(
                        ReasoningStep::new(
                            StepKind::SourceRequirement,
                            format!("{} cited no sources; verdict demoted to UNCERTAIN", agent_id),
                        )
                        .with_meta("agent", &agent_id),
                    );
                }
                self.mark_success(&agent_id);
                verdict
            }
            Ok(Ok(verdict)) => {
                let reason = if verdict.reasoning.is_empty() {
                    "agent reported an error".to_string()
                } else {
                    verdict.reasoning
                };
                warn!("Agent {} returned an error verdict: {}", agent_id, reason);
                self.mark_failure(&agent_id);
                AgentVerdict::gateway_failure(agent_id, reason, latency_ms)
            }
            Ok(Err(e)) => {
                warn!("Agent {} failed: {}", agent_id, e);
                self.mark_failure(&agent_id);
                AgentVerdict::gateway_failure(agent_id, e.to_string(), latency_ms)
            }
            Err(_) => {
                warn!("Agent {} timed out after {}ms", agent_id, latency_ms);
                self.mark_failure(&agent_id);
                AgentVerdict::timeout(agent_id, latency_ms)
            }
        };

        self.metrics.record(MetricEvent::AgentLatency {
            agent_id: verdict.agent_id.clone(),
            latency_ms,
            success: !verdict.is_error(),
        });
        verdict
    }

    fn mark_success(&self, id: &AgentId) {
        if let Ok(agent) = self.registry.get(id) {
            if agent.health == HealthStatus::Degraded {
                let _ = self.registry.mark_health(id, HealthStatus::Healthy);
                info!("Agent {} recovered", id);
            }
            let _ = self.registry.touch(id);
        }
    }

    fn mark_failure(&self, id: &AgentId) {
        if let Ok(agent) = self.registry.get(id)
            && agent.health == HealthStatus::Healthy
        {
            let _ = self.registry.mark_health(id, HealthStatus::Degraded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrustParams;
    use crate::ports::evidence_gateway::{DebateBrief, ModerationBrief};
    use crate::ports::persistence::{StoreError, TrustStore};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use verity_domain::{
        Argument, ConsensusStatus, Evidence, NEUTRAL_TRUST, SelectionPolicy, Verdict,
    };

    #[derive(Clone)]
    enum Behavior {
        Answer {
            verdict: Verdict,
            confidence: f64,
            delay: Duration,
            source: Option<&'static str>,
        },
        Fail,
        /// Fails on the first call, answers afterwards
        FailOnce(Verdict, f64),
        Hang,
        /// Returns this verdict exactly as given
        Raw(AgentVerdict),
    }

    fn answer(verdict: Verdict, confidence: f64) -> Behavior {
        Behavior::Answer {
            verdict,
            confidence,
            delay: Duration::ZERO,
            source: Some("https://example.org/evidence"),
        }
    }

    struct MockGateway {
        behaviors: HashMap<AgentId, Behavior>,
        calls: Mutex<HashMap<AgentId, usize>>,
        ruling: Option<(Verdict, f64)>,
    }

    impl MockGateway {
        fn new(behaviors: Vec<(&str, Behavior)>) -> Self {
            Self {
                behaviors: behaviors
                    .into_iter()
                    .map(|(id, b)| (AgentId::new(id), b))
                    .collect(),
                calls: Mutex::new(HashMap::new()),
                ruling: None,
            }
        }

        fn with_ruling(mut self, verdict: Verdict, confidence: f64) -> Self {
            self.ruling = Some((verdict, confidence));
            self
        }
    }

    #[async_trait]
    impl EvidenceGateway for MockGateway {
        async fn evaluate(&self, request: &EvaluationRequest) -> Result<AgentVerdict, GatewayError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                let count = calls.entry(request.agent_id.clone()).or_insert(0);
                *count += 1;
                *count
            };
            let behavior = self
                .behaviors
                .get(&request.agent_id)
                .cloned()
                .unwrap_or(Behavior::Fail);

            match behavior {
                Behavior::Answer {
                    verdict,
                    confidence,
                    delay,
                    source,
                } => {
                    tokio::time::sleep(delay).await;
                    let mut evidence = Evidence::new(format!("{} findings", request.agent_id));
                    if let Some(source) = source {
                        evidence = evidence.with_source(source);
                    }
                    // The orchestrator overwrites the id and latency
                    Ok(AgentVerdict::new("spoofed", verdict, confidence)
                        .with_evidence(vec![evidence])
                        .with_latency(999_999))
                }
                Behavior::Fail => Err(GatewayError::RequestFailed("backend down".to_string())),
                Behavior::FailOnce(verdict, confidence) => {
                    if call == 1 {
                        Err(GatewayError::ConnectionError("reset".to_string()))
                    } else {
                        Ok(AgentVerdict::new("x", verdict, confidence)
                            .with_evidence(vec![Evidence::new("ok").with_source("s")]))
                    }
                }
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(GatewayError::Timeout)
                }
                Behavior::Raw(verdict) => Ok(verdict),
            }
        }

        async fn argue(&self, brief: &DebateBrief) -> Result<Argument, GatewayError> {
            Ok(Argument::new(
                brief.agent_id.clone(),
                brief.role,
                format!("round {} for {}", brief.round, brief.role),
            ))
        }

        async fn moderate(&self, brief: &ModerationBrief) -> Result<AgentVerdict, GatewayError> {
            let (verdict, confidence) = self.ruling.ok_or(GatewayError::Timeout)?;
            Ok(AgentVerdict::new(brief.agent_id.clone(), verdict, confidence)
                .with_evidence(vec![Evidence::new("ruling").with_source("court")]))
        }
    }

    #[derive(Default)]
    struct RecordingResults {
        saved: Mutex<Vec<VerificationResult>>,
    }

    #[async_trait]
    impl ResultStore for RecordingResults {
        async fn save_result(&self, result: &VerificationResult) -> Result<(), StoreError> {
            self.saved.lock().unwrap().push(result.clone());
            Ok(())
        }
    }

    /// Store that answers every write after `delay`, or fails when `delay` is `None`
    struct TestStore {
        delay: Option<Duration>,
    }

    impl TestStore {
        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self { delay: Some(delay) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { delay: None })
        }

        async fn write(&self) -> Result<(), StoreError> {
            match self.delay {
                Some(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(())
                }
                None => Err(StoreError::Unavailable("disk full".to_string())),
            }
        }
    }

    #[async_trait]
    impl ResultStore for TestStore {
        async fn save_result(&self, _result: &VerificationResult) -> Result<(), StoreError> {
            self.write().await
        }
    }

    #[async_trait]
    impl TrustStore for TestStore {
        async fn load_trust_record(
            &self,
            _agent_id: &AgentId,
        ) -> Result<Option<verity_domain::TrustRecord>, StoreError> {
            Ok(None)
        }

        async fn save_trust_record(
            &self,
            _record: &verity_domain::TrustRecord,
        ) -> Result<(), StoreError> {
            self.write().await
        }
    }

    #[derive(Default)]
    struct RecordingMetrics {
        events: Mutex<Vec<MetricEvent>>,
    }

    impl RecordingMetrics {
        fn persistence_failures(&self, store: &str) -> usize {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| matches!(e, MetricEvent::PersistenceFailure { store: s } if *s == store))
                .count()
        }
    }

    impl MetricsSink for RecordingMetrics {
        fn record(&self, event: MetricEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    /// Use case whose stores are `store` and whose metrics land in the returned sink
    fn with_store(
        agents: Vec<Agent>,
        gateway: MockGateway,
        store: Arc<TestStore>,
    ) -> (VerifyClaimUseCase, Arc<TrustManager>, Arc<RecordingMetrics>) {
        let registry = Arc::new(AgentRegistry::with_agents(agents).unwrap());
        let metrics = Arc::new(RecordingMetrics::default());
        let trust = Arc::new(
            TrustManager::new(
                Arc::clone(&registry),
                Arc::clone(&store) as Arc<dyn TrustStore>,
                TrustParams::default(),
            )
            .with_metrics(Arc::clone(&metrics) as Arc<dyn MetricsSink>),
        );
        let use_case = VerifyClaimUseCase::new(
            registry,
            Arc::clone(&trust),
            Arc::new(gateway),
            EngineConfig::default(),
        )
        .with_result_store(store)
        .with_metrics(Arc::clone(&metrics) as Arc<dyn MetricsSink>);
        (use_case, trust, metrics)
    }

    struct Fixture {
        use_case: VerifyClaimUseCase,
        registry: Arc<AgentRegistry>,
        trust: Arc<TrustManager>,
    }

    fn fixture(agents: Vec<Agent>, gateway: MockGateway, config: EngineConfig) -> Fixture {
        let registry = Arc::new(AgentRegistry::with_agents(agents).unwrap());
        let trust = Arc::new(TrustManager::new(
            Arc::clone(&registry),
            Arc::new(NoPersistence),
            TrustParams::default(),
        ));
        let use_case = VerifyClaimUseCase::new(
            Arc::clone(&registry),
            Arc::clone(&trust),
            Arc::new(gateway),
            config,
        );
        Fixture {
            use_case,
            registry,
            trust,
        }
    }

    /// Fast path disabled, so every verdict is waited for
    fn wait_for_all() -> EngineConfig {
        EngineConfig {
            verify: VerifyParams::default().with_certainty_threshold(1.1),
            ..Default::default()
        }
    }

    fn general(id: &str, trust: f64) -> Agent {
        Agent::new(id, [verity_domain::Capability::General]).with_trust(trust)
    }

    const CLAIM: &str = "The museum reopened to visitors last spring";

    #[tokio::test]
    async fn test_trust_weighted_verdict() {
        let gateway = MockGateway::new(vec![
            ("a", answer(Verdict::True, 0.9)),
            ("b", answer(Verdict::True, 0.7)),
            ("c", answer(Verdict::False, 0.95)),
        ]);
        let f = fixture(
            vec![general("a", 0.8), general("b", 0.6), general("c", 0.3)],
            gateway,
            wait_for_all(),
        );

        let result = f.use_case.execute(VerifyClaimInput::new(CLAIM)).await.unwrap();

        assert_eq!(result.verdict, Verdict::True);
        assert!((result.confidence - 0.80).abs() < 0.01);
        assert_eq!(result.status, ConsensusStatus::Decided);
        assert_eq!(result.metadata.agents_dispatched, 3);
        assert_eq!(result.metadata.agents_responded, 3);
        assert!(!result.metadata.escalated);
        assert!(!result.metadata.fast_path);
        assert_eq!(result.reasoning[0].kind, StepKind::Selection);

        // Verdicts keep dispatch order and the orchestrator's own ids
        let ids: Vec<&str> = result.agent_verdicts.iter().map(|v| v.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(result.agent_verdicts.iter().all(|v| v.latency_ms < 999_999));

        assert!(f.trust.get_score(&AgentId::new("a")).unwrap() > 0.8);
        assert!(f.trust.get_score(&AgentId::new("c")).unwrap() < 0.3);
        assert_eq!(result.sources, vec!["https://example.org/evidence"]);
    }

    #[tokio::test]
    async fn test_all_agents_time_out() {
        let gateway = MockGateway::new(vec![
            ("a", Behavior::Hang),
            ("b", Behavior::Hang),
            ("c", Behavior::Hang),
        ]);
        let f = fixture(
            vec![general("a", 0.5), general("b", 0.5), general("c", 0.5)],
            gateway,
            EngineConfig::default(),
        );

        let started = std::time::Instant::now();
        let result = f
            .use_case
            .execute(VerifyClaimInput::new(CLAIM).with_deadline(Duration::from_millis(300)))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_millis(300) + Duration::from_secs(1));
        assert_eq!(result.verdict, Verdict::Uncertain);
        assert_eq!(result.confidence, 0.0);
        assert!(result.is_unresolved());
        let timeouts = result
            .reasoning
            .iter()
            .filter(|s| s.kind == StepKind::AgentTimeout)
            .count();
        assert_eq!(timeouts, 3);
        assert!(result
            .reasoning
            .iter()
            .any(|s| s.kind == StepKind::ConsensusUnresolved));

        for id in ["a", "b", "c"] {
            let agent = f.registry.get(&AgentId::new(id)).unwrap();
            assert_eq!(agent.health, HealthStatus::Degraded);
            // Unresolved consensus never moves trust
            assert_eq!(agent.trust_score, 0.5);
        }
    }

    #[tokio::test]
    async fn test_contested_result_escalates_to_debate() {
        let gateway = MockGateway::new(vec![
            ("a", answer(Verdict::True, 0.55)),
            ("b", answer(Verdict::False, 0.45)),
        ])
        .with_ruling(Verdict::False, 0.9);
        let config = EngineConfig {
            verify: VerifyParams::default()
                .with_certainty_threshold(1.1)
                .with_selection(SelectionPolicy {
                    max_agents: 2,
                    high_priority_cap: 7,
                }),
            ..Default::default()
        };
        let f = fixture(
            vec![general("a", 1.0), general("b", 1.0), general("m", 0.8)],
            gateway,
            config,
        );

        let result = f.use_case.execute(VerifyClaimInput::new(CLAIM)).await.unwrap();

        assert!(result.metadata.escalated);
        assert_eq!(result.metadata.debate_rounds, 3);
        let debate = result.debate.as_ref().unwrap();
        assert_eq!(debate.moderator, AgentId::new("m"));
        assert_eq!(debate.ruling, Some(Verdict::False));

        // The re-resolved result, not the first pass
        assert_eq!(result.verdict, Verdict::False);
        assert_eq!(result.agent_verdicts.len(), 3);
        let kinds: Vec<StepKind> = result.reasoning.iter().map(|s| s.kind).collect();
        assert!(kinds.contains(&StepKind::Escalation));
        assert!(kinds.contains(&StepKind::Moderation));
        assert_eq!(kinds.iter().filter(|k| **k == StepKind::Consensus).count(), 2);

        // Trust follows the final verdict
        let a = f.trust.get_score(&AgentId::new("a")).unwrap();
        let b = f.trust.get_score(&AgentId::new("b")).unwrap();
        assert!(a < 1.0);
        assert!(a < b);
    }

    #[tokio::test]
    async fn test_debate_disabled_returns_first_pass() {
        let gateway = MockGateway::new(vec![
            ("a", answer(Verdict::True, 0.55)),
            ("b", answer(Verdict::False, 0.45)),
        ]);
        let config = EngineConfig {
            verify: VerifyParams::default().with_certainty_threshold(1.1),
            debate: DebateParams::disabled(),
            ..Default::default()
        };
        let f = fixture(vec![general("a", 1.0), general("b", 1.0)], gateway, config);

        let result = f.use_case.execute(VerifyClaimInput::new(CLAIM)).await.unwrap();
        assert!(!result.metadata.escalated);
        assert!(result.debate.is_none());
        assert_eq!(result.verdict, Verdict::True);
    }

    #[tokio::test]
    async fn test_fast_path_cancels_stragglers() {
        let gateway = MockGateway::new(vec![
            ("a", answer(Verdict::True, 0.95)),
            ("b", answer(Verdict::True, 0.95)),
            ("c", Behavior::Hang),
        ]);
        let f = fixture(
            vec![general("a", 0.9), general("b", 0.9), general("c", 0.5)],
            gateway,
            EngineConfig::default(),
        );

        let started = std::time::Instant::now();
        let result = f
            .use_case
            .execute(VerifyClaimInput::new(CLAIM).with_deadline(Duration::from_secs(20)))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(result.metadata.fast_path);
        assert_eq!(result.verdict, Verdict::True);
        assert_eq!(result.agent_verdicts.len(), 2);
        assert!(result.reasoning.iter().any(|s| s.kind == StepKind::FastPath));
        // Cancelled agents are not penalized
        assert_eq!(
            f.registry.get(&AgentId::new("c")).unwrap().health,
            HealthStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_require_sources_demotes_unsourced() {
        let gateway = MockGateway::new(vec![(
            "a",
            Behavior::Answer {
                verdict: Verdict::True,
                confidence: 0.9,
                delay: Duration::ZERO,
                source: None,
            },
        )]);
        let f = fixture(vec![general("a", 0.5)], gateway, EngineConfig::default());

        let result = f
            .use_case
            .execute(VerifyClaimInput::new(CLAIM).with_require_sources(true))
            .await
            .unwrap();

        assert_eq!(result.verdict, Verdict::Uncertain);
        assert!(result
            .reasoning
            .iter()
            .any(|s| s.kind == StepKind::SourceRequirement));
    }

    #[tokio::test]
    async fn test_request_errors() {
        let f = fixture(vec![general("a", 0.5)], MockGateway::new(vec![]), EngineConfig::default());
        assert!(matches!(
            f.use_case.execute(VerifyClaimInput::new("   ")).await,
            Err(VerifyError::InvalidRequest(DomainError::EmptyClaim))
        ));
        assert!(matches!(
            f.use_case
                .execute(VerifyClaimInput::new("x".repeat(5001)))
                .await,
            Err(VerifyError::InvalidRequest(DomainError::ClaimTooLong { .. }))
        ));

        let empty = fixture(vec![], MockGateway::new(vec![]), EngineConfig::default());
        assert!(matches!(
            empty.use_case.execute(VerifyClaimInput::new(CLAIM)).await,
            Err(VerifyError::NoAgentsConfigured)
        ));

        let down = fixture(
            vec![general("a", 0.5).with_health(HealthStatus::Unavailable)],
            MockGateway::new(vec![]),
            EngineConfig::default(),
        );
        assert!(matches!(
            down.use_case.execute(VerifyClaimInput::new(CLAIM)).await,
            Err(VerifyError::AgentUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_overloaded_is_retryable() {
        let config = EngineConfig {
            verify: VerifyParams::default()
                .with_max_in_flight(1)
                .with_queue_timeout(Duration::from_millis(50)),
            ..Default::default()
        };
        let f = fixture(
            vec![general("a", 0.5)],
            MockGateway::new(vec![("a", answer(Verdict::True, 0.9))]),
            config,
        );

        let held = Arc::clone(&f.use_case.permits).acquire_owned().await.unwrap();
        let err = f.use_case.execute(VerifyClaimInput::new(CLAIM)).await.unwrap_err();
        assert!(matches!(err, VerifyError::Overloaded { requested: 1, .. }));
        assert!(err.is_retryable());

        drop(held);
        assert!(f.use_case.execute(VerifyClaimInput::new(CLAIM)).await.is_ok());
    }

    #[tokio::test]
    async fn test_failure_degrades_then_success_recovers() {
        let gateway = MockGateway::new(vec![("a", Behavior::FailOnce(Verdict::True, 0.8))]);
        let f = fixture(vec![general("a", 0.5)], gateway, EngineConfig::default());
        let id = AgentId::new("a");

        let first = f.use_case.execute(VerifyClaimInput::new(CLAIM)).await.unwrap();
        assert!(first.is_unresolved());
        assert!(first
            .reasoning
            .iter()
            .any(|s| s.kind == StepKind::GatewayFailure));
        assert_eq!(f.registry.get(&id).unwrap().health, HealthStatus::Degraded);

        let second = f.use_case.execute(VerifyClaimInput::new(CLAIM)).await.unwrap();
        assert_eq!(second.verdict, Verdict::True);
        let agent = f.registry.get(&id).unwrap();
        assert_eq!(agent.health, HealthStatus::Healthy);
        assert!(agent.last_active > 0);
    }

    #[tokio::test]
    async fn test_cancellation() {
        let gateway = MockGateway::new(vec![("a", Behavior::Hang)]);
        let f = fixture(vec![general("a", 0.5)], gateway, EngineConfig::default());

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result = f
            .use_case
            .execute(VerifyClaimInput::new(CLAIM).with_cancellation(token))
            .await;
        assert!(matches!(result, Err(VerifyError::Cancelled)));
    }

    #[tokio::test]
    async fn test_result_persisted() {
        let store = Arc::new(RecordingResults::default());
        let f = fixture(
            vec![general("a", NEUTRAL_TRUST)],
            MockGateway::new(vec![("a", answer(Verdict::False, 0.7))]),
            EngineConfig::default(),
        );
        let use_case = f
            .use_case
            .with_result_store(Arc::clone(&store) as Arc<dyn ResultStore>);

        let result = use_case.execute(VerifyClaimInput::new(CLAIM)).await.unwrap();
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].request_id, result.request_id);
    }

    #[tokio::test]
    async fn test_slow_persistence_stays_within_deadline() {
        let (use_case, _trust, metrics) = with_store(
            vec![general("a", 0.5)],
            MockGateway::new(vec![("a", answer(Verdict::True, 0.9))]),
            TestStore::slow(Duration::from_secs(3)),
        );
        let deadline = Duration::from_millis(500);
        let limit = deadline + use_case.params().grace + Duration::from_millis(250);

        let started = std::time::Instant::now();
        let first = use_case
            .execute(VerifyClaimInput::new(CLAIM).with_deadline(deadline))
            .await
            .unwrap();
        assert!(started.elapsed() < limit);
        assert_eq!(first.verdict, Verdict::True);

        // The first request's trust write is still in flight
        let started = std::time::Instant::now();
        let second = use_case
            .execute(VerifyClaimInput::new(CLAIM).with_deadline(deadline))
            .await
            .unwrap();
        assert!(started.elapsed() < limit);
        assert_eq!(second.verdict, Verdict::True);

        assert_eq!(metrics.persistence_failures("result"), 2);
    }

    #[tokio::test]
    async fn test_failed_saves_are_reported() {
        let (use_case, trust, metrics) = with_store(
            vec![general("a", 0.5)],
            MockGateway::new(vec![("a", answer(Verdict::False, 0.8))]),
            TestStore::failing(),
        );

        let result = use_case.execute(VerifyClaimInput::new(CLAIM)).await.unwrap();
        assert_eq!(result.verdict, Verdict::False);
        assert!(trust.get_score(&AgentId::new("a")).unwrap() > 0.5);

        trust.flush().await;
        assert_eq!(metrics.persistence_failures("result"), 1);
        assert_eq!(metrics.persistence_failures("trust"), 1);
    }

    #[tokio::test]
    async fn test_cancelling_one_request_leaves_others_untouched() {
        let slow = |verdict| Behavior::Answer {
            verdict,
            confidence: 0.8,
            delay: Duration::from_millis(200),
            source: Some("https://example.org/evidence"),
        };
        let gateway = MockGateway::new(vec![
            ("a", slow(Verdict::True)),
            ("b", slow(Verdict::True)),
            ("c", slow(Verdict::False)),
        ]);
        let f = fixture(
            vec![general("a", 0.5), general("b", 0.5), general("c", 0.5)],
            gateway,
            wait_for_all(),
        );

        let token = CancellationToken::new();
        let canceller = token.clone();
        let (cancelled, other, ()) = tokio::join!(
            f.use_case
                .execute(VerifyClaimInput::new(CLAIM).with_cancellation(token)),
            f.use_case.execute(VerifyClaimInput::new(CLAIM)),
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                canceller.cancel();
            }
        );

        assert!(matches!(cancelled, Err(VerifyError::Cancelled)));
        let other = other.unwrap();
        assert_eq!(other.agent_verdicts.len(), 3);
        assert!(other.agent_verdicts.iter().all(|v| !v.is_error()));
        assert_eq!(other.metadata.agents_responded, 3);
        assert_eq!(other.verdict, Verdict::True);
        for id in ["a", "b", "c"] {
            assert_eq!(
                f.registry.get(&AgentId::new(id)).unwrap().health,
                HealthStatus::Healthy
            );
        }
    }

    #[tokio::test]
    async fn test_gateway_cannot_claim_moderator_weight() {
        let forged = AgentVerdict {
            confidence: 1.7,
            ..AgentVerdict::new("a", Verdict::True, 0.9)
                .with_evidence(vec![Evidence::new("memo").with_source("s")])
                .as_moderator()
        };
        let gateway = MockGateway::new(vec![
            ("a", Behavior::Raw(forged)),
            ("b", answer(Verdict::False, 0.9)),
        ]);
        let f = fixture(vec![general("a", 0.5), general("b", 0.5)], gateway, wait_for_all());

        let result = f.use_case.execute(VerifyClaimInput::new(CLAIM)).await.unwrap();

        let a = &result.agent_verdicts[0];
        assert_eq!(a.role, VerdictRole::Panelist);
        assert_eq!(a.confidence, 1.0);
        // 0.5 x 1.0 against 0.5 x 0.9: a near tie, not a doubled vote
        assert!(result.confidence < 0.6);
    }
}
