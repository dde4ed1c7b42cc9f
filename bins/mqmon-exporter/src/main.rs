//! Queue manager metrics exporter.
//!
//! Loads the collector configuration, drives collection cycles on a timer,
//! and serves the resulting gauges over HTTP for Prometheus to poll.
//! Assembled reports additionally go to the configured reporting backend.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use mqmon_collector::{build_exporter, Collector, CollectorConfig, Exporter, GaugeRegistry};
use mqmon_metric::MockQmgrSource;

/// mqmon queue manager metrics exporter
#[derive(Parser, Debug)]
#[command(name = "mqmon-exporter", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mqmon.toml")]
    config: String,

    /// Dump default configuration and exit
    #[arg(long)]
    dump_default_config: bool,
}

struct AppState {
    gauges: Arc<GaugeRegistry>,
    metric_path: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.dump_default_config {
        print!("{}", CollectorConfig::render_default());
        return Ok(());
    }

    let config = CollectorConfig::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!(qmgr = %config.qmgr_name, "starting mqmon exporter");

    // The middleware connection stays behind the QmgrSource trait; until a
    // live client implements it this binary runs the scripted demo source.
    let source = MockQmgrSource::demo();
    let store = source.discover();
    let collector = Collector::new(config.clone(), store, source);

    let gauges = Arc::new(GaugeRegistry::new("mqmon"));
    let exporter: Option<Arc<dyn Exporter>> = build_exporter(&config).map(Arc::from);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let collect_handle = tokio::spawn(collection_loop(
        collector,
        gauges.clone(),
        exporter,
        shutdown_rx.clone(),
    ));

    let state = Arc::new(AppState {
        gauges,
        metric_path: config.http_metric_path.clone(),
    });
    let app = Router::new()
        .route("/", get(landing_page))
        .route(&config.http_metric_path, get(metrics))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.listen_port)).await?;
    tracing::info!(port = config.listen_port, path = %config.http_metric_path, "listening");

    let mut server_shutdown = shutdown_rx.clone();
    let server_handle = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "http server failed");
        }
    });

    wait_for_shutdown_signal().await;
    let _ = shutdown_tx.send(true);
    let _ = collect_handle.await;
    let _ = server_handle.await;

    tracing::info!("mqmon exporter stopped");
    Ok(())
}

/// Run collection cycles until shutdown. Gauge updates and report export
/// happen only after a cycle's report is fully assembled.
async fn collection_loop(
    mut collector: Collector<MockQmgrSource>,
    gauges: Arc<GaugeRegistry>,
    exporter: Option<Arc<dyn Exporter>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(collector.config().collect_interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match collector.run_cycle() {
                    Ok(Some(report)) => {
                        if let Err(e) = gauges.update(&report) {
                            tracing::error!(error = %e, "failed to update gauges");
                        }
                        if let Some(exporter) = &exporter {
                            if let Err(e) = exporter.export(&report).await {
                                tracing::error!(error = %e, "failed to export report");
                            }
                        }
                    }
                    Ok(None) => tracing::debug!("first collection cycle discarded"),
                    Err(e) => tracing::error!(error = %e, "collection cycle failed"),
                }
            }
            _ = shutdown.changed() => {
                tracing::info!("collection loop shutting down");
                break;
            }
        }
    }
}

async fn landing_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        "<html>\n<head><title>mqmon metrics exporter</title></head>\n<body>\n\
         <h1>mqmon metrics exporter</h1>\n<p><a href='{}'>Metrics</a></p>\n</body>\n</html>\n",
        state.metric_path
    ))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.gauges.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Wait for CTRL+C or SIGTERM.
async fn wait_for_shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");
    tokio::select! {
        _ = ctrl_c => tracing::info!("received CTRL+C"),
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
    }
}
