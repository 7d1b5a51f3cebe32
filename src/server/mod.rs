pub mod handlers;

use crate::config::Config;
use crate::error::GatewayError;
use crate::provider::ProviderClient;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};
use serde_json::json;

/// Shared server state. Requests are independent; the client holds no
/// mutable state, so no locking is needed.
pub struct AppState {
    pub client: ProviderClient,
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(GatewayError::status_code(self))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(ResponseError::status_code(self))
            .json(json!({ "detail": self.to_string() }))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::generate_image)
        .service(handlers::change_background)
        .service(handlers::generate_pose)
        .service(handlers::test_route);
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let port = config.port.unwrap_or(8000);
    let client = ProviderClient::new(config.provider)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let state = web::Data::new(AppState { client });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
