use axum::extract::{Query, State};
use slping::QueryOutcome;

use crate::{structures::StatusParams, AppState, Json};

pub async fn handle_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> Json<QueryOutcome> {
    let query = match params.into_query(state.timeouts) {
        Ok(query) => query,
        Err(error) => return Json(QueryOutcome::failure(error.to_string())),
    };
    let hostname = query.hostname.clone().unwrap_or_default();
    let outcome = slping::get_status(&*state.resolver, query).await;
    if outcome.success {
        info!(%hostname, message = %outcome.message, "status query succeeded");
    } else {
        warn!(%hostname, message = %outcome.message, "status query failed");
    }
    Json(outcome)
}
