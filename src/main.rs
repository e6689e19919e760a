use slipway::server::{self, AppState};
use slipway::{BuildEngine, Catalog, SlipwayConfig, VERSION};

use clap::Parser;
use std::env;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "slipway", version, about = "Repo-to-image build service")]
struct CliArgs {
    /// Socket address to bind (overrides SLIPWAY_LISTEN_ADDR)
    #[arg(long)]
    listen: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let mut config = SlipwayConfig::default();
    if let Some(listen) = &args.listen {
        config.listen_addr = listen.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.to_lowercase();
    } else if args.verbose {
        config.log_level = "debug".to_string();
    }

    init_logging(&config);
    config.validate()?;

    debug!("slipway v{} starting", VERSION);
    debug!("{}", config);

    let engine = BuildEngine::connect()?;
    if engine.is_available().await {
        info!("Container engine connected");
    } else {
        // The daemon may come up after us; each build checks again.
        tracing::warn!("Container engine not reachable at startup");
    }

    let state = AppState {
        engine: Arc::new(engine),
        catalog: Arc::new(Catalog::builtin()),
        config: Arc::new(config),
    };

    server::serve(state).await
}

fn init_logging(config: &SlipwayConfig) {
    use std::sync::Once;
    static INIT: Once = Once::new();

    let level = parse_level(&config.log_level);
    let use_json = config.log_json;

    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            filter = filter
                .add_directive(format!("slipway={}", level).parse().unwrap())
                .add_directive("tower_http=info".parse().unwrap())
                .add_directive("h2=warn".parse().unwrap())
                .add_directive("hyper=warn".parse().unwrap());
        }

        if use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .init();
        }
    });
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}
