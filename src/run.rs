use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::routes::health::health_check;
use crate::routes::signup::{method_not_allowed, signup, SignupError};
use crate::startup::SignupServices;

pub fn run(listener: TcpListener, services: SignupServices) -> Result<Server, std::io::Error> {
    let services = web::Data::new(services);
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(health_check))
            .service(
                web::resource("/api/waitlist")
                    // a body the extractor cannot parse is treated like any
                    // other invalid email, not surfaced as an actix error
                    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                        tracing::warn!("Rejecting signup with an unreadable body: {}", err);
                        SignupError::InvalidEmail.into()
                    }))
                    .route(web::post().to(signup))
                    // any other method gets the 405 body
                    .route(web::route().to(method_not_allowed)),
            )
            .app_data(services.clone())
    })
    .listen(listener)?
    .run())
}
