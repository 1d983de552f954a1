//! Rester demo server.
//!
//! Serves a small controller with CORS enabled:
//! - `GET /health`
//! - `GET /echo/{word}?k=v`
//! - `POST /echo` (echoes the decoded body)

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use rester::config::{load_config, ResterConfig};
use rester::lifecycle::signals::spawn_signal_listener;
use rester::observability::{logging, metrics};
use rester::{Controller, ParamBinding, Rester, RouteDefinition, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "rester", version, about = "Rester demo server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overriding the configuration file.
    #[arg(long)]
    log_level: Option<String>,
}

fn demo_controller(app: &Rester) -> Result<Controller, rester::StartupError> {
    Ok(Controller::new("demo")
        .handler(app.cors_handler()?)
        .route(RouteDefinition::get("/health").target(|_| async move {
            Ok(json!({ "status": "ok" }))
        }))
        .route(
            RouteDefinition::get("/echo/{word}")
                .bind(ParamBinding::path_variable("word"))
                .bind(ParamBinding::PathQuery)
                .target(|args| async move {
                    let word = args[0].as_str().map(str::to_string);
                    let query = args[1].as_query().map(|q| q.to_json());
                    Ok(json!({ "word": word, "query": query }))
                }),
        )
        .route(
            RouteDefinition::post("/echo")
                .bind(ParamBinding::RequestBody)
                .target(|args| async move { Ok(args[0].as_body().map(|b| b.to_json())) }),
        ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ResterConfig::default(),
    };

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.observability.log_level.clone());
    logging::init_tracing(&level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        addresses = config.addresses.len(),
        "rester starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = Rester::new(config);
    let controller = demo_controller(&app)?;
    let app = app
        .controller(controller)
        .on_startup("announce", || async {
            tracing::info!("Demo controller ready");
            Ok::<(), rester::BoxError>(())
        });

    let shutdown = Shutdown::new();
    let signals = spawn_signal_listener(shutdown.clone());

    app.bootstrap(&shutdown).await?;
    signals.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
