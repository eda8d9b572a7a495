use axum::routing::get;
use axum::Router;

use elroi_server::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    elroi_shared::middleware::init_tracing("elroi-server");

    let config = AppConfig::load()?;
    let port = config.port;

    let metrics_handle = elroi_shared::middleware::init_metrics()?;
    let state = elroi_server::build_state(config).await?;

    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(metrics_handle.render())))
        .merge(elroi_server::router(state));

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "elroi-server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
