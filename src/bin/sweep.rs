use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use site_monitoring::{
    Orchestrator, SweepSettings,
    actors::dispatcher::DispatchHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, read_config_file},
    monitors::probe::HttpProber,
    notifier::SinkNotifier,
    scheduler::{HttpScheduler, RetryScheduler},
    util::{get_addr, get_port, get_secret},
};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// How fast retries reach the `/check` entry point
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchedulerKind {
    /// In-process timer
    Local,
    /// Call this service's own public URL
    Http,
}

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: Option<String>,

    #[arg(long, value_enum, default_value_t = SchedulerKind::Local)]
    scheduler: SchedulerKind,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new()
        .with_targets(vec![
            ("site_monitoring", LevelFilter::TRACE),
            ("guardia_sweep", LevelFilter::TRACE),
            ("tower_http", LevelFilter::DEBUG),
        ])
        .with_default(LevelFilter::INFO);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(file) => read_config_file(file)?,
        None => Config::default(),
    }
    .apply_env();
    config.warn_missing_sinks();

    let registry = Arc::new(config.registry()?);
    info!("monitoring {} target(s)", registry.len());

    let prober = Arc::new(HttpProber::new(config.probe_timeout)?);
    let notifier = Arc::new(SinkNotifier::new(
        config.down_sink.clone(),
        config.up_sink.clone(),
        config.delivery.clone(),
    )?);
    let secret = get_secret();

    let (dispatch, receiver) = DispatchHandle::channel();
    let scheduler: Arc<dyn RetryScheduler> = match args.scheduler {
        SchedulerKind::Local => Arc::new(dispatch.clone()),
        SchedulerKind::Http => Arc::new(HttpScheduler::new(&config.app_url, secret.clone())),
    };

    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        prober,
        notifier,
        scheduler.clone(),
        SweepSettings::from(&config),
    ));

    let dispatcher = match args.scheduler {
        SchedulerKind::Local => Some(DispatchHandle::spawn_actor(orchestrator.clone(), receiver)),
        SchedulerKind::Http => None,
    };

    let api_config = ApiConfig {
        bind_addr: SocketAddr::from((get_addr(), get_port())),
        internal_secret: secret,
    };
    spawn_api_server(api_config, ApiState::new(orchestrator, scheduler)).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    dispatch.shutdown().await;
    if let Some(dispatcher) = dispatcher {
        dispatcher.await?;
    }

    Ok(())
}
