use actix_web::{web, HttpResponse, Result};

use crate::api_error::ApiError;
use crate::http::proposal_handler::AppState;

pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    state.health.ping().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "database": "ok"
    })))
}
