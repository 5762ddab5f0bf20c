//! Metrics adapters

mod channel_sink;

pub use channel_sink::{
    AgentLatencyStats, ChannelMetricsSink, LATENCY_BUCKETS_MS, LatencyHistogram, MetricsSummary,
};
