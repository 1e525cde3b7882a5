use actix_web::{HttpResponse, delete, post, web};
use pulse_service::monitoring::{CheckProcessor, TestProbeRequest};
use pulse_service::scheduler::{ScheduleManager, ScheduleOutcome};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;

macros_utils::routes! {
    route test_probe_route,
    route pause_route,
    route resume_route,
    route delete_route,
}

fn parse_monitor_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Monitor not found"))
}

/// Run one probe against a target without saving anything
#[post("/monitors/test")]
pub async fn test_probe_route(
    processor: web::Data<CheckProcessor>,
    request: web::Json<TestProbeRequest>,
) -> HttpResponse {
    let result = processor.test_probe(&request).await;
    HttpResponse::Ok().json(result)
}

#[post("/monitors/{monitor_id}/pause")]
pub async fn pause_route(
    scheduler: web::Data<ScheduleManager>,
    monitor_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let monitor_id = parse_monitor_id(&monitor_id)?;
    scheduler.pause_monitor(monitor_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "id": monitor_id, "isPaused": true })))
}

/// Resume and reschedule; the monitor stays paused if scheduling fails
#[post("/monitors/{monitor_id}/resume")]
pub async fn resume_route(
    scheduler: web::Data<ScheduleManager>,
    monitor_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let monitor_id = parse_monitor_id(&monitor_id)?;
    let outcome = scheduler.resume_monitor(monitor_id).await?;
    let scheduled = matches!(outcome, ScheduleOutcome::Scheduled { .. });
    Ok(HttpResponse::Ok().json(json!({ "id": monitor_id, "isPaused": false, "scheduled": scheduled })))
}

/// Drop the schedule, then the monitor with its results and incidents
#[delete("/monitors/{monitor_id}")]
pub async fn delete_route(
    scheduler: web::Data<ScheduleManager>,
    monitor_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let monitor_id = parse_monitor_id(&monitor_id)?;
    if !scheduler.delete_monitor(monitor_id).await? {
        return Err(ApiError::NotFound("Monitor not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}
