// Web Server - main.rs
// web-server/src/main.rs
mod agent_api;
mod api;
mod auth;
mod error;
mod middleware;
mod relay;
mod static_files;

use actix_web::{web, App, HttpServer};
use agent_api::AgentApi;
use common::{setup_tracing, Config};
use middleware::route_guard::RouteGuard;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration before logging so the level can be configured
    let config = Config::from_env();
    setup_tracing(&config.log_level);

    // Save address before moving config into web::Data
    let server_addr = config.web_server_addr.clone();

    match config.agent_base_url() {
        Some(url) => tracing::info!("Relaying to agent API at {}", url),
        None => tracing::warn!("Agent API URL is not set; chat and auth routes will fail"),
    }

    // Upstream client shared by all workers
    let agent = web::Data::new(AgentApi::from_config(&config));
    let static_config = config.static_files.clone();
    let config_data = web::Data::new(config);

    tracing::info!("Starting Web Server on {}", server_addr);

    HttpServer::new(move || {
        let static_config = static_config.clone();
        App::new()
            .app_data(config_data.clone())
            .app_data(agent.clone())
            .wrap(RouteGuard::new())
            .configure(api::configure)
            .configure(move |cfg| static_files::configure(cfg, &static_config))
    })
    .bind(&server_addr)?
    .run()
    .await
}
