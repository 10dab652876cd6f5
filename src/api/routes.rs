use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::health::get_health;
use crate::engine::{arbitrage, stake, summary, value};
use crate::error::AppError;
use crate::filters;
use crate::format::format_bet_display;
use crate::state::QuoteStore;
use crate::types::{
    ArbitragePair, OutcomeLabel, PointKey, PriceSummary, Quote, StakeSolution, ValueBetResult,
};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<QuoteStore>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/api/value-bets", get(get_value_bets))
        .route("/api/arbitrage", get(get_arbitrage))
        .route("/api/stakes", get(get_stakes))
        .route("/api/bets/:player/:label/:market/:point", get(get_bet_detail))
        .route("/api/lines", get(get_line_detail))
        .route("/api/options", get(get_options))
        .route("/api/refresh", post(post_refresh))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ScopeQuery {
    /// Restrict to the local-bookmaker allow-list before aggregation.
    pub local_only: Option<bool>,
    /// Restrict to one stat category (points / rebounds / assists).
    pub category: Option<String>,
}

impl ScopeQuery {
    fn is_unscoped(&self) -> bool {
        self.local_only != Some(true) && self.category.is_none()
    }

    fn apply(&self, quotes: &[Quote]) -> Vec<Quote> {
        let mut scoped = if self.local_only == Some(true) {
            filters::filter_local(quotes)
        } else {
            quotes.to_vec()
        };
        if let Some(category) = &self.category {
            scoped = filters::filter_market_category(&scoped, category);
        }
        scoped
    }
}

#[derive(Deserialize)]
pub struct StakesQuery {
    pub over: Option<f64>,
    pub under: Option<f64>,
    pub target: Option<f64>,
}

#[derive(Deserialize)]
pub struct LineQuery {
    pub game: String,
    pub player: String,
    pub category: String,
    pub point: f64,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct BookmakerPrice {
    pub bookmaker: String,
    pub price: f64,
}

#[derive(Serialize)]
pub struct BetDetailResponse {
    pub bet: String,
    pub bet_display: String,
    pub bookmakers: Vec<BookmakerPrice>,
    pub summary: PriceSummary,
}

#[derive(Serialize)]
pub struct LineSide {
    pub rows: Vec<BookmakerPrice>,
    pub summary: PriceSummary,
}

#[derive(Serialize)]
pub struct LineDetailResponse {
    pub over: LineSide,
    pub under: LineSide,
}

#[derive(Serialize)]
pub struct OptionsResponse {
    pub games: Vec<String>,
    pub players_by_game: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub quotes: usize,
    pub value_bets: usize,
    pub precomputed_table: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Top 50 value bets. Unscoped requests serve the cached table (precomputed
/// when available); any filter forces the raw-quote path because the
/// precomputed table cannot be re-scoped after the fact.
async fn get_value_bets(
    State(state): State<ApiState>,
    Query(scope): Query<ScopeQuery>,
) -> Result<Json<Vec<ValueBetResult>>, AppError> {
    if scope.is_unscoped() {
        let bets = state.store.value_bets().await?;
        return Ok(Json(bets.as_ref().clone()));
    }

    let quotes = state.store.quotes().await?;
    let scoped = scope.apply(&quotes);
    Ok(Json(value::top_value_bets(&scoped)))
}

/// Every profitable over/under pairing, best edge first. Never truncated.
async fn get_arbitrage(
    State(state): State<ApiState>,
    Query(scope): Query<ScopeQuery>,
) -> Result<Json<Vec<ArbitragePair>>, AppError> {
    let quotes = state.store.quotes().await?;
    let scoped = scope.apply(&quotes);
    Ok(Json(arbitrage::find_pairs(&scoped)))
}

/// Stake split for a chosen pair and target payout. Bad input is JSON null,
/// not an error status — the caller presents "invalid input" itself.
async fn get_stakes(Query(params): Query<StakesQuery>) -> Json<Option<StakeSolution>> {
    let over = params.over.unwrap_or(0.0);
    let under = params.under.unwrap_or(0.0);
    let target = params.target.unwrap_or(0.0);
    Json(stake::solve(over, under, target))
}

/// Bookmaker rows plus a distribution summary for one specific bet.
/// Unknown bets (or unparseable label segments) come back with zero rows
/// and an empty summary rather than an error.
async fn get_bet_detail(
    State(state): State<ApiState>,
    Path((player, label, market, point)): Path<(String, String, String, f64)>,
) -> Result<Json<BetDetailResponse>, AppError> {
    let quotes = state.store.quotes().await?;

    let parsed_label = OutcomeLabel::parse(&label);
    let point_key = PointKey::from_point(point);

    let rows: Vec<BookmakerPrice> = quotes
        .iter()
        .filter(|q| {
            Some(q.label) == parsed_label
                && q.player == player
                && q.market == market
                && PointKey::from_point(q.point) == point_key
        })
        .map(|q| BookmakerPrice {
            bookmaker: q.bookmaker.clone(),
            price: q.price,
        })
        .collect();

    let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();

    let (bet, bet_display) = match parsed_label {
        Some(label) => {
            let key = crate::types::BetKey {
                player,
                label,
                market,
                point: point_key,
            };
            (key.canonical(), format_bet_display(&key))
        }
        None => (String::new(), String::new()),
    };

    Ok(Json(BetDetailResponse {
        bet,
        bet_display,
        bookmakers: rows,
        summary: summary::summarize(&prices),
    }))
}

/// Over and under bookmaker rows plus per-side summaries for one line,
/// selected by game, player, stat category, and point.
async fn get_line_detail(
    State(state): State<ApiState>,
    Query(params): Query<LineQuery>,
) -> Result<Json<LineDetailResponse>, AppError> {
    let quotes = state.store.quotes().await?;
    let point_key = PointKey::from_point(params.point);

    let scoped = filters::filter_market_category(&quotes, &params.category);
    let line: Vec<&Quote> = scoped
        .iter()
        .filter(|q| {
            q.game == params.game
                && q.player == params.player
                && PointKey::from_point(q.point) == point_key
        })
        .collect();

    Ok(Json(LineDetailResponse {
        over: line_side(&line, OutcomeLabel::Over),
        under: line_side(&line, OutcomeLabel::Under),
    }))
}

fn line_side(line: &[&Quote], label: OutcomeLabel) -> LineSide {
    let mut rows: Vec<BookmakerPrice> = line
        .iter()
        .filter(|q| q.label == label)
        .map(|q| BookmakerPrice {
            bookmaker: q.bookmaker.clone(),
            price: q.price,
        })
        .collect();
    // Best price first; names break ties so the order is stable.
    rows.sort_by(|a, b| b.price.total_cmp(&a.price).then_with(|| a.bookmaker.cmp(&b.bookmaker)));

    let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
    LineSide {
        summary: summary::summarize(&prices),
        rows,
    }
}

/// Sorted game list and game → players map for selection dropdowns.
async fn get_options(State(state): State<ApiState>) -> Result<Json<OptionsResponse>, AppError> {
    let quotes = state.store.quotes().await?;

    let mut players_by_game: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for quote in quotes.iter() {
        players_by_game
            .entry(quote.game.clone())
            .or_default()
            .insert(quote.player.clone());
    }

    Ok(Json(OptionsResponse {
        games: players_by_game.keys().cloned().collect(),
        players_by_game: players_by_game
            .into_iter()
            .map(|(game, players)| (game, players.into_iter().collect()))
            .collect(),
    }))
}

/// Drop both caches and reload from source.
async fn post_refresh(State(state): State<ApiState>) -> Result<Json<RefreshResponse>, AppError> {
    state.store.invalidate();
    let quotes = state.store.quotes().await?;
    let bets = state.store.value_bets().await?;
    Ok(Json(RefreshResponse {
        quotes: quotes.len(),
        value_bets: bets.len(),
        precomputed_table: state.store.precomputed_loaded(),
    }))
}
