use axum::extract::{Query, RawQuery};
use axum::http::StatusCode;
use axum::Json;
use contracts::usecases::common::UseCaseError;
use contracts::usecases::u101_apply_leave::{
    DateRangeChangeRequest, LeaveActionResponse, LeaveStateView, LeaveWorkflowState,
    SubmitLeaveRequest,
};
use contracts::usecases::u102_capacity::{CapacityView, DriverListView};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::category::FilterSources;
use crate::shared::api_client::HttpLeaveApi;
use crate::shared::config::Config;
use crate::usecases::u101_apply_leave::{AppliedLeave, LeaveWorkflow, SubmitOutcome, WorkflowError};
use crate::usecases::u103_leave_notification::DispatchReport;

/// One dispatcher workspace: at most one operation in flight
struct LeaveService {
    workflow: Mutex<LeaveWorkflow<HttpLeaveApi>>,
    config: Config,
}

static LEAVE_SERVICE: OnceCell<LeaveService> = OnceCell::new();

/// Создать сервис (один раз при старте)
pub fn initialize(config: Config) -> anyhow::Result<()> {
    let api = Arc::new(HttpLeaveApi::new(&config.api)?);
    let service = LeaveService {
        workflow: Mutex::new(LeaveWorkflow::new(api, &config)),
        config,
    };
    LEAVE_SERVICE
        .set(service)
        .map_err(|_| anyhow::anyhow!("Leave service already initialized"))
}

fn service() -> Result<&'static LeaveService, ApiFailure> {
    LEAVE_SERVICE.get().ok_or_else(|| {
        tracing::error!("Leave service is not initialized");
        ApiFailure::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "internal",
            UseCaseError::internal("Leave service is not initialized"),
        )
    })
}

/// Initial driver directory load; failures are logged and the service keeps running
pub async fn warm_up() {
    let Ok(service) = service() else {
        return;
    };
    let filter = filter_sources(&service.config, None, None);
    if let Err(e) = service.workflow.lock().await.load_drivers(&filter).await {
        tracing::warn!("Initial driver load failed: {}", e);
    }
}

/// Error body `{ok:false, kind, code, message, details}`
pub struct ApiFailure(StatusCode, Value);

impl ApiFailure {
    fn new(status: StatusCode, kind: &str, error: UseCaseError) -> Self {
        ApiFailure(
            status,
            json!({
                "ok": false,
                "kind": kind,
                "code": error.code,
                "message": error.message,
                "details": error.details,
            }),
        )
    }
}

impl axum::response::IntoResponse for ApiFailure {
    fn into_response(self) -> axum::response::Response {
        (self.0, Json(self.1)).into_response()
    }
}

impl From<WorkflowError> for ApiFailure {
    fn from(err: WorkflowError) -> Self {
        let status = match &err {
            WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
            WorkflowError::Business(_) => StatusCode::CONFLICT,
            WorkflowError::Transport(_) => StatusCode::BAD_GATEWAY,
        };
        let kind = err.kind();
        ApiFailure::new(status, kind, UseCaseError::from(err))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaveQuery {
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub category_filter: Option<String>,
}

/// Static sources from config, dynamic ones from the request
fn filter_sources(config: &Config, text_input: Option<&str>, query: Option<&str>) -> FilterSources {
    FilterSources::standard(
        &config.workflow.driver_select_filter,
        text_input.unwrap_or_default(),
        config.workflow.tagged_filters.clone(),
        query.unwrap_or_default(),
    )
}

fn notification_suffix(report: &DispatchReport) -> String {
    match report.first_error() {
        Some(error) => format!(" Gagal menghantar mesej kelulusan: {}", error),
        None => String::new(),
    }
}

fn applied_response(state: LeaveWorkflowState, message: String, applied: AppliedLeave) -> LeaveActionResponse {
    LeaveActionResponse {
        ok: true,
        state,
        message: format!("{}{}", message, notification_suffix(&applied.notification)),
        applied_dates: applied.applied_dates,
        pending_force_start: None,
        notification_steps: applied.notification.steps,
    }
}

/// GET /api/leave/state
pub async fn get_state(
    Query(params): Query<LeaveQuery>,
    RawQuery(raw): RawQuery,
) -> Result<Json<LeaveStateView>, ApiFailure> {
    let service = service()?;
    let filter = filter_sources(&service.config, params.category_filter.as_deref(), raw.as_deref());
    let mut workflow = service.workflow.lock().await;
    workflow.select_driver(params.driver_id.as_deref());
    Ok(Json(workflow.state_view(&filter)))
}

/// GET /api/leave/drivers
pub async fn list_drivers(
    Query(params): Query<LeaveQuery>,
    RawQuery(raw): RawQuery,
) -> Result<Json<DriverListView>, ApiFailure> {
    let service = service()?;
    let filter = filter_sources(&service.config, params.category_filter.as_deref(), raw.as_deref());
    let mut workflow = service.workflow.lock().await;
    workflow.select_driver(params.driver_id.as_deref());
    match workflow.load_drivers(&filter).await {
        // a capacity failure does not hide an already loaded directory
        Err(e) if workflow.context().drivers.is_empty() => Err(e.into()),
        _ => Ok(Json(workflow.driver_list(&filter))),
    }
}

/// POST /api/leave/range
pub async fn set_range(
    RawQuery(raw): RawQuery,
    Json(request): Json<DateRangeChangeRequest>,
) -> Result<Json<LeaveStateView>, ApiFailure> {
    let service = service()?;
    let filter = filter_sources(&service.config, request.category_filter.as_deref(), raw.as_deref());
    let mut workflow = service.workflow.lock().await;
    workflow.select_driver(request.driver_id.as_deref());
    let changed = if request.instants.is_empty() {
        workflow.set_date_range(&request.dates, request.closed, &filter).await
    } else {
        workflow
            .set_picker_instants(&request.instants, request.closed, &filter)
            .await
    };
    if let Err(e) = changed {
        // the view carries the capacity error status
        tracing::warn!("Capacity refresh after range change failed: {}", e);
    }
    Ok(Json(workflow.state_view(&filter)))
}

/// GET /api/leave/capacity
pub async fn get_capacity(
    Query(params): Query<LeaveQuery>,
    RawQuery(raw): RawQuery,
) -> Result<Json<CapacityView>, ApiFailure> {
    let service = service()?;
    let filter = filter_sources(&service.config, params.category_filter.as_deref(), raw.as_deref());
    let mut workflow = service.workflow.lock().await;
    workflow.select_driver(params.driver_id.as_deref());
    workflow.refresh_capacity(&filter).await?;
    Ok(Json(workflow.context().last_capacity.clone().unwrap_or_default()))
}

/// POST /api/leave/submit
pub async fn submit(
    RawQuery(raw): RawQuery,
    Json(request): Json<SubmitLeaveRequest>,
) -> Result<Json<LeaveActionResponse>, ApiFailure> {
    let service = service()?;
    let filter = filter_sources(&service.config, request.category_filter.as_deref(), raw.as_deref());
    let mut workflow = service.workflow.lock().await;

    let outcome = workflow.submit(&request, &filter).await?;
    let state = workflow.context().state;
    let response = match outcome {
        SubmitOutcome::Applied(applied) => {
            let message = format!("Permohonan dihantar untuk {} hari", applied.applied_dates.len());
            applied_response(state, message, applied)
        }
        SubmitOutcome::CapacityConflict { start, .. } => LeaveActionResponse {
            ok: false,
            state,
            message: workflow.context().status.clone(),
            applied_dates: Vec::new(),
            pending_force_start: Some(start),
            notification_steps: Vec::new(),
        },
    };
    Ok(Json(response))
}

/// POST /api/leave/force/confirm
pub async fn confirm_force(RawQuery(raw): RawQuery) -> Result<Json<LeaveActionResponse>, ApiFailure> {
    let service = service()?;
    let filter = filter_sources(&service.config, None, raw.as_deref());
    let mut workflow = service.workflow.lock().await;

    let applied = workflow.confirm_force(&filter).await?;
    let state = workflow.context().state;
    let message = workflow.context().status.clone();
    Ok(Json(applied_response(state, message, applied)))
}

/// POST /api/leave/force/cancel
pub async fn cancel_force() -> Result<Json<LeaveActionResponse>, ApiFailure> {
    let service = service()?;
    let mut workflow = service.workflow.lock().await;
    workflow.cancel_force();
    Ok(Json(LeaveActionResponse {
        ok: true,
        state: workflow.context().state,
        ..Default::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::api_client::ApiError;
    use crate::shared::config::default_config;
    use crate::shared::dates;
    use contracts::usecases::u103_leave_notification::{DispatchStepOutcome, DispatchStepView};

    #[test]
    fn test_workflow_errors_map_to_status_codes() {
        let validation = ApiFailure::from(WorkflowError::Validation("Sila pilih pemandu".into()));
        assert_eq!(validation.0, StatusCode::BAD_REQUEST);
        assert_eq!(validation.1["kind"], "validation");
        assert_eq!(validation.1["message"], "Sila pilih pemandu");

        let business = ApiFailure::from(WorkflowError::Business("Driver inactive".into()));
        assert_eq!(business.0, StatusCode::CONFLICT);
        assert_eq!(business.1["code"], "BUSINESS_ERROR");

        let transport = ApiFailure::from(WorkflowError::Transport(ApiError::Status {
            status: 500,
            message: "Request failed (500)".into(),
        }));
        assert_eq!(transport.0, StatusCode::BAD_GATEWAY);
        assert_eq!(transport.1["details"], "Request failed (500)");
        assert_eq!(transport.1["ok"], false);
    }

    #[test]
    fn test_uninitialized_service_reports_internal_error() {
        let Err(failure) = service() else {
            panic!("no test initializes the service");
        };
        assert_eq!(failure.0, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(failure.1["kind"], "internal");
        assert_eq!(failure.1["code"], "INTERNAL_ERROR");
    }

    #[test]
    fn test_filter_sources_combine_config_and_request() {
        let mut config = default_config().unwrap();
        config.workflow.driver_select_filter = "ksk".into();
        let sources = filter_sources(&config, Some("lowbed"), Some("driver_category=trailer"));
        assert_eq!(
            sources.sources(),
            vec!["selector_dataset", "text_input", "tagged_nodes", "query_params"]
        );
        let registry = crate::domain::category::CategoryRegistry::default();
        assert_eq!(sources.collect(&registry).tokens, vec!["ksk", "lowbed", "trailer"]);
    }

    #[test]
    fn test_applied_response_surfaces_send_failure() {
        let applied = AppliedLeave {
            applied_dates: vec![dates::parse_iso("2024-03-05").unwrap()],
            notification: DispatchReport {
                steps: vec![DispatchStepView {
                    name: "admin_approval".into(),
                    chat_id: "admin@g.us".into(),
                    outcome: DispatchStepOutcome::Failed,
                    error: Some("gateway down".into()),
                }],
            },
        };
        let response = applied_response(LeaveWorkflowState::Applied, "Permohonan dihantar untuk 1 hari".into(), applied);
        assert!(response.ok);
        assert_eq!(
            response.message,
            "Permohonan dihantar untuk 1 hari Gagal menghantar mesej kelulusan: gateway down"
        );
        assert_eq!(response.notification_steps.len(), 1);
    }
}
