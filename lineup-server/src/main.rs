use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use lineup_persistence::{
    connection::connect_and_migrate,
    repositories::{RosterRepository, StatsRepository},
};
use lineup_server::{
    config::Config, create_routes, session_manager::SessionManager, upload::ImageHost,
    websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Lineup server...");

    // Initialize application state
    let config = Config::new();
    let connection_manager = Arc::new(ConnectionManager::new());

    // Initialize database connection and run migrations
    let db = match connect_and_migrate().await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };
    let roster_repository = RosterRepository::new(db.clone());
    let stats_repository = StatsRepository::new(db);

    let session_manager = Arc::new(SessionManager::new(
        roster_repository,
        stats_repository,
        config.rules(),
    ));

    let image_host = Arc::new(ImageHost::from_config(
        config.image_host_url.clone(),
        config.image_host_api_key.clone(),
    ));
    if image_host.is_none() {
        info!("Image host not configured, roster image uploads are disabled");
    }

    let routes = create_routes(
        connection_manager.clone(),
        session_manager.clone(),
        image_host,
    );

    // Start cleanup task
    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_session_manager = session_manager.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            interval.tick().await;
            let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
            let session_timeout = Duration::from_secs(config.session_timeout_minutes * 60);

            cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
            cleanup_session_manager
                .cleanup_idle_sessions(session_timeout)
                .await;
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().unwrap(),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
