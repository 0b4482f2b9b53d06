use actix_web::{HttpResponse, Responder, get};

macros_utils::routes! {
    route health_route,
}

/// Liveness route
/// An empty 200 is all the deployment platform looks at.
#[get("/")]
pub async fn health_route() -> impl Responder {
    HttpResponse::Ok()
}
