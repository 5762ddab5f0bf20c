//! CLI entrypoint for verity
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use verity_application::{
    AgentRegistry, AgentStatusUseCase, MetricsSink, NoPersistence, NoProgress, ResultStore,
    TrustManager, TrustStore, VerificationProgress, VerifyClaimInput, VerifyClaimUseCase,
};
use verity_domain::{AgentId, ConfigIssue, Severity};
use verity_infrastructure::config::FileLoggingConfig;
use verity_infrastructure::{
    ChannelMetricsSink, CommandEvidenceGateway, ConfigLoader, FileConfig, JsonTrustStore,
    JsonlResultStore, MetricsSummary,
};
use verity_presentation::{
    AgentsArgs, Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, VerifyArgs,
};

/// Events buffered between the engine and the metrics aggregator
const METRICS_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };

    let _log_guard = init_logging(cli.verbose, &config.logging)?;
    info!("Starting verity");

    if let Command::Config = cli.command {
        show_config(&cli, &config);
        return Ok(());
    }

    let runtime = Runtime::build(&config).await?;
    let outcome = match &cli.command {
        Command::Verify(args) => run_verify(&runtime, args, cli.quiet).await,
        Command::Agents(args) => run_agents(&runtime, args).await,
        Command::Config => Ok(()),
    };
    runtime.shutdown().await;
    outcome
}

/// Install the tracing subscriber.
///
/// `-v` flags win over `RUST_LOG`, which wins over `[logging] filter`. The
/// returned guard flushes the log file on drop.
fn init_logging(verbose: u8, logging: &FileLoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(logging.filter.as_deref().unwrap_or("warn"))
        }),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let (file_layer, guard) = match &logging.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| ".".into());
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

fn show_config(cli: &Cli, config: &FileConfig) {
    if cli.no_config {
        println!("Configuration files disabled (--no-config); using built-in defaults");
    } else {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
    }

    let issues = config.validate();
    println!();
    println!("Agents: {}", config.agents.len());
    if issues.is_empty() {
        println!("Configuration OK");
    } else {
        println!("{}", ConsoleFormatter::format_issues(&issues));
    }
}

/// Long-lived services shared by every command
struct Runtime {
    registry: Arc<AgentRegistry>,
    trust: Arc<TrustManager>,
    verify: VerifyClaimUseCase,
    shutdown: CancellationToken,
    decay: Option<JoinHandle<()>>,
    metrics: JoinHandle<MetricsSummary>,
}

impl Runtime {
    async fn build(config: &FileConfig) -> Result<Self> {
        let issues = config.validate();
        for issue in issues.iter().filter(|i| i.severity == Severity::Warning) {
            warn!("{}", issue);
        }
        if ConfigIssue::any_errors(&issues) {
            bail!(
                "invalid configuration:\n{}",
                ConsoleFormatter::format_issues(&issues)
            );
        }

        let (engine, _) = config.to_engine_config();
        let (agents, _) = config.parse_agents();
        let registry = Arc::new(AgentRegistry::with_agents(agents)?);

        let (results, trust_store) = open_stores(config)?;

        let shutdown = CancellationToken::new();
        let (sink, metrics) = ChannelMetricsSink::spawn(METRICS_CAPACITY, shutdown.clone());
        let sink: Arc<dyn MetricsSink> = Arc::new(sink);

        let trust = Arc::new(
            TrustManager::new(Arc::clone(&registry), trust_store, engine.trust.clone())
                .with_metrics(Arc::clone(&sink)),
        );
        trust.hydrate().await;
        let decay = engine
            .trust
            .decay_interval
            .map(|interval| Arc::clone(&trust).spawn_decay(interval, shutdown.clone()));

        let gateway = Arc::new(CommandEvidenceGateway::from_config(config));
        let verify = VerifyClaimUseCase::new(
            Arc::clone(&registry),
            Arc::clone(&trust),
            gateway,
            engine,
        )
        .with_result_store(results)
        .with_metrics(sink);

        Ok(Self {
            registry,
            trust,
            verify,
            shutdown,
            decay,
            metrics,
        })
    }

    async fn shutdown(self) {
        self.shutdown.cancel();
        if let Some(decay) = self.decay {
            let _ = decay.await;
        }
        self.trust.flush().await;
        if let Ok(summary) = self.metrics.await {
            debug!(
                "Session: {} requests, {} agent calls ({} failed)",
                summary.requests, summary.agent_calls, summary.agent_failures
            );
        }
    }
}

fn open_stores(config: &FileConfig) -> Result<(Arc<dyn ResultStore>, Arc<dyn TrustStore>)> {
    if !config.storage.enabled {
        return Ok((Arc::new(NoPersistence), Arc::new(NoPersistence)));
    }

    let results: Arc<dyn ResultStore> = match config.storage.results_path() {
        Some(path) => match JsonlResultStore::open(&path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!("Results will not be saved: {}: {}", path.display(), e);
                Arc::new(NoPersistence)
            }
        },
        None => Arc::new(NoPersistence),
    };

    // A trust file that cannot be read must not be silently replaced
    let trust: Arc<dyn TrustStore> = match config.storage.trust_path() {
        Some(path) => Arc::new(
            JsonTrustStore::open(&path)
                .with_context(|| format!("cannot open trust store {}", path.display()))?,
        ),
        None => Arc::new(NoPersistence),
    };

    Ok((results, trust))
}

async fn run_verify(runtime: &Runtime, args: &VerifyArgs, quiet: bool) -> Result<()> {
    let token = runtime.shutdown.child_token();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let mut input = VerifyClaimInput::new(args.claim.clone())
        .with_priority(args.priority.into())
        .with_require_sources(args.require_sources)
        .with_cancellation(token);
    if let Some(context) = &args.context {
        input = input.with_context(context.clone());
    }
    if let Some(deadline) = args.deadline() {
        input = input.with_deadline(deadline);
    }

    let progress: Box<dyn VerificationProgress> = if quiet {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new(runtime.verify.debate_params().max_rounds))
    };

    let result = match runtime
        .verify
        .execute_with_progress(input, progress.as_ref())
        .await
    {
        Ok(result) => result,
        Err(e) if e.is_retryable() => bail!("{} (retry later)", e),
        Err(e) => bail!(e),
    };

    let output = match args.output {
        OutputFormat::Text => ConsoleFormatter::format(&result),
        OutputFormat::Json => ConsoleFormatter::format_json(&result),
    };
    println!("{}", output);
    Ok(())
}

async fn run_agents(runtime: &Runtime, args: &AgentsArgs) -> Result<()> {
    let use_case = AgentStatusUseCase::new(Arc::clone(&runtime.registry), Arc::clone(&runtime.trust));

    if let Some(id) = &args.reset {
        let status = use_case.reset_trust(&AgentId::try_new(id.as_str())?).await?;
        eprintln!("Reset trust of {} to {:.3}", status.agent_id, status.trust_score);
    }

    let agents = use_case.execute();
    let output = match args.output {
        OutputFormat::Text => ConsoleFormatter::format_agents(&agents),
        OutputFormat::Json => ConsoleFormatter::format_agents_json(&agents),
    };
    print!("{}", output);
    Ok(())
}
