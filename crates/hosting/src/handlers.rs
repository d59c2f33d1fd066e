use super::*;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use commons_gameroom::*;
use serde::Deserialize;

/// Body of `POST /session`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSession {
    pub instructor_name: String,
    #[serde(default)]
    pub config: Overrides,
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
pub async fn create(lobby: web::Data<Lobby>, body: web::Json<CreateSession>) -> impl Responder {
    let CreateSession {
        instructor_name,
        config,
    } = body.into_inner();
    match lobby.registry().create(&instructor_name, config).await {
        Ok((code, config)) => {
            HttpResponse::Created().json(serde_json::json!({ "code": code, "config": config }))
        }
        Err(e) => HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": e.to_string(), "reason": e.reason() })),
    }
}
pub async fn connect(lobby: web::Data<Lobby>, body: web::Payload, req: HttpRequest) -> impl Responder {
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            lobby.bridge(session, stream);
            response.map_into_left_body()
        }
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}

/// Mounts every route on an app.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/session", web::post().to(create))
        .route("/ws", web::get().to(connect));
}
