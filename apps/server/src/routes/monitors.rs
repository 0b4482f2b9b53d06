use actix_web::{HttpResponse, post, web};
use serde::Serialize;

use crate::AppState;
use crate::auth::WorkspaceContext;
use crate::error::ApiError;

macros_utils::routes! {
    route trigger_monitor_route,
}

/// Body of a successful trigger response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    /// Id of the run record created for this trigger.
    pub result_id: i64,
}

/// Start a manual check run for one monitor.
///
/// Responds as soon as the run is recorded and every regional dispatch has
/// settled; per-region outcomes are not part of the contract.
#[post("/v1/monitors/{id}/trigger")]
pub async fn trigger_monitor_route(
    state: web::Data<AppState>,
    context: WorkspaceContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let monitor_id = path.into_inner();

    let run_id = state
        .trigger
        .trigger_monitor(&context.workspace, &context.limits, monitor_id)
        .await?;

    Ok(HttpResponse::Ok().json(TriggerResponse { result_id: run_id }))
}
