use super::AppState;
use crate::error::GatewayError;
use crate::models::{BackgroundChange, ImageGeneration, PoseGeneration};
use actix_web::{get, post, web, HttpResponse};
use serde_json::{json, Value};

#[post("/generate-image")]
pub async fn generate_image(
    state: web::Data<AppState>,
    body: web::Json<ImageGeneration>,
) -> Result<web::Json<Value>, GatewayError> {
    let response = state.client.generate_image(body.into_inner()).await?;
    Ok(web::Json(response))
}

#[post("/change-background")]
pub async fn change_background(
    state: web::Data<AppState>,
    body: web::Json<BackgroundChange>,
) -> Result<web::Json<Value>, GatewayError> {
    let response = state.client.change_background(body.into_inner()).await?;
    Ok(web::Json(response))
}

#[post("/generate-pose")]
pub async fn generate_pose(
    state: web::Data<AppState>,
    body: web::Json<PoseGeneration>,
) -> Result<web::Json<Value>, GatewayError> {
    let response = state.client.generate_pose(body.into_inner()).await?;
    Ok(web::Json(response))
}

#[get("/test")]
pub async fn test_route() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "API is running" }))
}
