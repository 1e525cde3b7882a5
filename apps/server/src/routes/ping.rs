use actix_web::{HttpResponse, get, web};
use pulse_service::monitoring::CheckProcessor;
use uuid::Uuid;

use crate::error::ApiError;

macros_utils::routes! {
    route ping_route,
}

/// Heartbeat for cron monitors
#[get("/ping/{monitor_id}")]
pub async fn ping_route(
    processor: web::Data<CheckProcessor>,
    monitor_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    // Ids that are not UUIDs cannot name a monitor.
    let monitor_id = Uuid::parse_str(&monitor_id).map_err(|_| ApiError::NotFound("Monitor not found"))?;

    let receipt = processor.record_heartbeat(monitor_id).await?;
    Ok(HttpResponse::Ok().json(receipt))
}
