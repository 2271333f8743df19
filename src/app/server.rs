use crate::app::dto::{
    LayoutRequest, LayoutResponse, PlanView, PreferencesRequest, PreferencesResponse,
    SeatAssignment, SeatInfo, ServiceInfo, SolveRequest, SolveResponse,
};
use crate::app::error::ApiError;
use crate::core::export::{
    export_bundle, render_assignment_svg, render_layout_svg, render_relationship_svg,
};
use crate::core::layout::SeatLayout;
use crate::core::metrics::AssignmentSummary;
use crate::core::optimizer::SolverOptions;
use crate::core::pipeline::{plan_seats, resolve_weights};
use crate::domain::model::{PlanOutcome, PreferenceKind};
use crate::utils::error::{PlannerError, Result};
use crate::utils::monitor::SystemMonitor;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const HEALTH_PATH: &str = "/_stcore/health";

pub struct ServerHandle {
    local_addr: SocketAddr,
    tx_shutdown: oneshot::Sender<()>,
    server_join_handle: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn stop(self) {
        drop(self.tx_shutdown);
        let _ = self.server_join_handle.await;
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub solver_defaults: SolverOptions,
    pub monitor: bool,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/layout", post(layout))
        .route("/preferences", post(preferences))
        .route("/solve", post(solve))
        .route("/export", post(export));

    Router::new()
        .route(HEALTH_PATH, get(health))
        .route("/", get(index))
        .nest("/api", api)
        .with_state(Arc::new(state))
}

/// 綁定位址並在背景執行，回傳可停止的 handle
pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<ServerHandle> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::debug!("listening on {}", local_addr);

    let (tx_shutdown, rx_shutdown) = oneshot::channel::<()>();

    let server = axum::serve(listener, router(state)).with_graceful_shutdown(async move {
        let _ = rx_shutdown.await;
    });

    let server_join_handle = tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!("Seat planner server error: {}", e);
        }
    });

    Ok(ServerHandle {
        local_addr,
        tx_shutdown,
        server_join_handle,
    })
}

pub async fn health() -> &'static str {
    "ok"
}

async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn layout(Json(request): Json<LayoutRequest>) -> std::result::Result<Json<LayoutResponse>, ApiError> {
    let num_people = request.num_people.unwrap_or(0);
    let layout = SeatLayout::build(request.to_spec(num_people)?, num_people)?;

    let seats = layout
        .seats
        .iter()
        .enumerate()
        .map(|(index, seat)| SeatInfo {
            index,
            label: seat.label(),
            col: seat.col,
            row: seat.row,
        })
        .collect();

    Ok(Json(LayoutResponse {
        total_seats: layout.seat_count(),
        adjacent_pairs: layout.adjacent_pair_count(),
        svg: render_layout_svg(&layout),
        seats,
    }))
}

async fn preferences(
    Json(request): Json<PreferencesRequest>,
) -> std::result::Result<Json<PreferencesResponse>, ApiError> {
    let input = request.parse()?;
    tracing::debug!(
        "Parsed {} people, {} willing and {} unwilling pairs",
        input.people.len(),
        input.preferences.willing_count(),
        input.preferences.unwilling_count()
    );
    Ok(Json(PreferencesResponse::from(input)))
}

/// 在 blocking pool 上求解，避免佔住 async worker
async fn run_plan(state: &AppState, request: SolveRequest) -> Result<PlanOutcome> {
    let monitor = SystemMonitor::new(state.monitor);
    let input = request.input.parse()?;
    if input.people.is_empty() {
        return Err(PlannerError::validation("The roster is empty"));
    }

    let weights = resolve_weights(
        &input.preferences,
        &request.weights.like,
        &request.weights.dislike,
        &input.custom_pairs,
    );
    let spec = request.layout.to_spec(input.people.len())?;
    let options = request.solver.to_options(&state.solver_defaults)?;
    monitor.log_stats("Parse");

    tracing::info!(
        "🧮 Solving {} people on {} seats (top_n={}, time_limit={:?})",
        input.people.len(),
        spec.total_seats(),
        options.top_n,
        options.time_limit
    );

    let outcome = tokio::task::spawn_blocking(move || {
        plan_seats(input.people, input.preferences, weights, spec, &options, None)
    })
    .await
    .map_err(|e| PlannerError::ProcessingError {
        message: format!("Solver task failed: {}", e),
    })??;

    monitor.log_stats("Solve");
    monitor.log_final_stats();
    Ok(outcome)
}

async fn solve(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SolveRequest>,
) -> std::result::Result<Json<SolveResponse>, ApiError> {
    let options = request.export_options();
    let outcome = run_plan(&state, request).await?;
    let layout = SeatLayout::build(outcome.layout.clone(), outcome.people.len())?;

    let plans = outcome
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| PlanView {
            plan: i + 1,
            summary: AssignmentSummary::from(result),
            metrics: result.metrics.clone(),
            seats: result
                .assignment
                .iter()
                .map(|(name, &seat)| SeatAssignment {
                    name: name.clone(),
                    seat_index: seat,
                    seat: layout.label(seat),
                })
                .collect(),
            svg: render_assignment_svg(&result.assignment, &layout, &outcome.weights, options),
            positive_svg: options.split_visualization.then(|| {
                render_relationship_svg(
                    &result.assignment,
                    &layout,
                    &outcome.weights,
                    PreferenceKind::Willing,
                    options,
                )
            }),
            negative_svg: options.split_visualization.then(|| {
                render_relationship_svg(
                    &result.assignment,
                    &layout,
                    &outcome.weights,
                    PreferenceKind::Unwilling,
                    options,
                )
            }),
        })
        .collect();

    Ok(Json(SolveResponse {
        people: outcome.people.len(),
        total_seats: layout.seat_count(),
        weighted_pairs: outcome.weights.len(),
        plans,
        levels: outcome.levels,
    }))
}

async fn export(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SolveRequest>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let options = request.export_options();
    let outcome = run_plan(&state, request).await?;
    let bundle = export_bundle(&outcome, options)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"seat_plans.zip\"",
            ),
        ],
        bundle,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port_and_stops() {
        let handle = run_server("127.0.0.1:0".parse().unwrap(), AppState::default())
            .await
            .unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        handle.stop().await;
    }
}
