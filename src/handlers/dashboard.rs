use axum::extract::State;
use axum::Json;

use crate::auth::AuthenticatedClient;
use crate::services::dashboard::DashboardPayload;
use crate::{ApiResponse, ApiResult, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    summary = "Dashboard analytics",
    responses(
        (status = 200, description = "Dashboard payload", body = ApiResponse<DashboardPayload>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthenticatedClient(client_id): AuthenticatedClient,
) -> ApiResult<DashboardPayload> {
    let payload = state.dashboard_service().build_payload(client_id).await?;
    Ok(Json(ApiResponse::success(payload)))
}
