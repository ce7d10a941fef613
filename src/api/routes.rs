// src/api/routes.rs
use actix_web::web;
use super::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(handlers::json_error))
            .route("/health", web::get().to(handlers::health_check))
            .route("/candidates", web::get().to(handlers::get_candidates))
            .route("/grade", web::post().to(handlers::grade)),
    );
}
