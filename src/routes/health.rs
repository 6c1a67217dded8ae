use actix_web::{HttpResponse, Responder};

/// Liveness probe. No upstream is touched; a 200 only means the process
/// is serving requests.
#[tracing::instrument(name = "Health check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok()
}
