//! Metrics sink feeding a background aggregator over a bounded channel.
//!
//! `record` never blocks: when the channel is full the event is dropped and
//! counted. The aggregator keeps counters and per-agent latency histograms, traces
//! every event under the `verity::metrics` target and returns its summary
//! when stopped.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use verity_application::{MetricEvent, MetricsSink};
use verity_domain::AgentId;

/// Upper bounds (ms) of the latency histogram buckets; the last bucket is
/// unbounded
pub const LATENCY_BUCKETS_MS: [u64; 7] = [50, 100, 250, 500, 1_000, 2_500, 5_000];

/// Counts per [`LATENCY_BUCKETS_MS`] bucket, plus one overflow bucket
pub type LatencyHistogram = [u64; LATENCY_BUCKETS_MS.len() + 1];

fn bucket_for(latency_ms: u64) -> usize {
    LATENCY_BUCKETS_MS
        .iter()
        .position(|bound| latency_ms <= *bound)
        .unwrap_or(LATENCY_BUCKETS_MS.len())
}

/// Task outcomes of one agent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentLatencyStats {
    pub calls: u64,
    pub failures: u64,
    pub histogram: LatencyHistogram,
}

/// Totals accumulated by the aggregator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSummary {
    pub agent_calls: u64,
    pub agent_failures: u64,
    /// All agents combined
    pub latency_histogram: LatencyHistogram,
    pub per_agent: BTreeMap<AgentId, AgentLatencyStats>,
    pub requests: u64,
    confidence_sum: f64,
    pub escalations: u64,
    pub fast_paths: u64,
    pub cancelled_tasks: u64,
    pub overloaded: u64,
    pub persistence_failures: u64,
}

impl MetricsSummary {
    pub fn observe(&mut self, event: &MetricEvent) {
        match event {
            MetricEvent::AgentLatency {
                agent_id,
                latency_ms,
                success,
            } => {
                let bucket = bucket_for(*latency_ms);
                let agent = self.per_agent.entry(agent_id.clone()).or_default();
                agent.calls += 1;
                agent.histogram[bucket] += 1;
                self.agent_calls += 1;
                self.latency_histogram[bucket] += 1;
                if !success {
                    agent.failures += 1;
                    self.agent_failures += 1;
                }
            }
            MetricEvent::ConsensusConfidence { confidence, .. } => {
                self.requests += 1;
                self.confidence_sum += confidence;
            }
            MetricEvent::Escalation => self.escalations += 1,
            MetricEvent::FastPath { cancelled } => {
                self.fast_paths += 1;
                self.cancelled_tasks += *cancelled as u64;
            }
            MetricEvent::Overloaded => self.overloaded += 1,
            MetricEvent::PersistenceFailure { .. } => self.persistence_failures += 1,
        }
    }

    /// Mean final confidence over all requests
    pub fn mean_confidence(&self) -> Option<f64> {
        (self.requests > 0).then(|| self.confidence_sum / self.requests as f64)
    }
}

/// Non-blocking [`MetricsSink`] in front of a background aggregator
pub struct ChannelMetricsSink {
    tx: mpsc::Sender<MetricEvent>,
    dropped: AtomicU64,
}

impl ChannelMetricsSink {
    /// Start the aggregator.
    ///
    /// It runs until `token` is cancelled or every sink is dropped, then
    /// drains what is queued and yields the summary.
    pub fn spawn(capacity: usize, token: CancellationToken) -> (Self, JoinHandle<MetricsSummary>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(aggregate(rx, token));
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            handle,
        )
    }

    /// Events discarded because the channel was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl MetricsSink for ChannelMetricsSink {
    fn record(&self, event: MetricEvent) {
        if self.tx.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

async fn aggregate(mut rx: mpsc::Receiver<MetricEvent>, token: CancellationToken) -> MetricsSummary {
    let mut summary = MetricsSummary::default();

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => observe(&mut summary, &event),
                None => break,
            },
        }
    }

    rx.close();
    while let Ok(event) = rx.try_recv() {
        observe(&mut summary, &event);
    }

    info!(
        target: "verity::metrics",
        requests = summary.requests,
        agent_calls = summary.agent_calls,
        agent_failures = summary.agent_failures,
        escalations = summary.escalations,
        fast_paths = summary.fast_paths,
        overloaded = summary.overloaded,
        "Metrics summary"
    );
    for (agent, stats) in &summary.per_agent {
        debug!(
            target: "verity::metrics",
            agent = %agent,
            calls = stats.calls,
            failures = stats.failures,
            "Latency histogram {:?}",
            stats.histogram
        );
    }
    summary
}

fn observe(summary: &mut MetricsSummary, event: &MetricEvent) {
    debug!(target: "verity::metrics", event = event.name(), "{:?}", event);
    summary.observe(event);
}
