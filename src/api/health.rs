//! The /health endpoint: cache and loader state for probes and dashboards.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::routes::ApiState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Normalized quotes currently cached; null before the first load.
    pub quotes_cached: Option<usize>,
    /// Whether the value-bet table came from the precomputed source.
    pub precomputed_table: bool,
    /// Rows dropped during the last raw load, by reason.
    pub rejected_rows: Option<RejectedRows>,
}

#[derive(Serialize)]
pub struct RejectedRows {
    pub malformed: usize,
    pub missing_field: usize,
    pub bad_point: usize,
    pub bad_price: usize,
    pub unknown_label: usize,
}

pub async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let rejected = state.store.last_load_stats().map(|s| RejectedRows {
        malformed: s.rejected_malformed,
        missing_field: s.rejected_missing_field,
        bad_point: s.rejected_bad_point,
        bad_price: s.rejected_bad_price,
        unknown_label: s.rejected_label,
    });

    Json(HealthResponse {
        status: "ok",
        quotes_cached: state.store.cached_quote_count(),
        precomputed_table: state.store.precomputed_loaded(),
        rejected_rows: rejected,
    })
}
