use std::net::SocketAddr;

use axum::http::{header, Method};
use axum::middleware;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use dispatcher::{handlers, routes, shared, system};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    system::tracing::initialize()?;

    let config = shared::config::load_config()?;
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server.bind '{}': {}", config.server.bind, e))?;

    system::middleware::request_logger::set_timezone(shared::dates::parse_timezone(
        &config.workflow.timezone,
    ));
    handlers::leave::initialize(config)?;
    handlers::leave::warm_up().await;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = routes::configure_routes()
        .layer(middleware::from_fn(system::middleware::request_logger))
        .layer(cors);

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!("Error: {} is already in use", addr);
            } else {
                tracing::error!("Failed to bind to {}. Error: {}", addr, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
