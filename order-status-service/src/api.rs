use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use shared::Order;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::usecase::{OrderWorkflow, ReconcileOutcome};

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<OrderWorkflow>,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub order_id: String,
    #[serde(flatten)]
    pub outcome: ReconcileOutcome,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/orders/status", post(update_status))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

pub async fn update_status(
    State(state): State<AppState>,
    Json(order): Json<Order>,
) -> Result<Json<UpdateStatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    if order.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "order_id is required".to_string(),
            }),
        ));
    }

    match state.workflow.reconcile(&order).await {
        Ok(outcome) => Ok(Json(UpdateStatusResponse {
            order_id: order.order_id,
            outcome,
        })),
        Err(e) => {
            tracing::error!("Failed to reconcile order {}: {}", order.order_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to reconcile order status: {}", e),
                }),
            ))
        }
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
