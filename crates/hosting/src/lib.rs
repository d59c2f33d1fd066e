//! WebSocket hosting for live commons sessions.
//!
//! Serves the HTTP surface (health, session creation) and one WebSocket
//! per participant, bridging sockets to the session registry.
//!
//! - [`Lobby`] — Registry plus connection hub, shared by all workers
//! - [`Hub`] — Connection table; the registry's outbound gateway
//! - [`Args`] — Command line and environment configuration
mod args;
mod bridge;
mod hub;

pub mod handlers;

pub use args::*;
pub use bridge::*;
pub use hub::*;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;

pub async fn run(args: Args) -> anyhow::Result<()> {
    let lobby = web::Data::new(Lobby::new(args.settings()));
    log::info!("[hosting] listening on {}", args.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(lobby.clone())
            .configure(handlers::routes)
    })
    .workers(args.workers)
    .bind(&args.bind)?
    .run()
    .await?;
    Ok(())
}
