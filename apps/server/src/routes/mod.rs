use actix_web::web::ServiceConfig;

pub mod health;
pub mod monitors;

/// Register all application routes.
pub fn routes(cfg: &mut ServiceConfig) {
    health::routes(cfg);
    monitors::routes(cfg);
}
