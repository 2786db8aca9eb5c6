use crate::errors::{PricerResult, PricingError};
use crate::models::{OptionKind, PricingModel, PricingRequest};
use crate::state::{AppState, CountersSnapshot};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use portable_atomic::Ordering::Relaxed;
use serde_json::{json, Value};
use std::sync::Arc;

const PRICING_FIELDS: [&str; 7] = [
    "stock_price",
    "strike_price",
    "time_to_maturity",
    "risk_free_rate",
    "volatility",
    "simulations",
    "option_type",
];

const REFERENCE_FIELDS: [&str; 6] = [
    "stock_price",
    "strike_price",
    "time_to_maturity",
    "risk_free_rate",
    "volatility",
    "option_type",
];

type ApiResponse = (StatusCode, Json<Value>);

/// POST /calculate-option-price -- Monte Carlo price (blocking pool)
pub async fn calculate_option_price(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResponse {
    let request = match parse_request(&body, &PRICING_FIELDS) {
        Ok(r) => r,
        Err(e) => return reject(&state, e),
    };

    if request.simulations > state.config.max_simulations {
        let e = PricingError::invalid(
            "simulations",
            format!(
                "{} exceeds the service limit of {}",
                request.simulations, state.config.max_simulations
            ),
        );
        return reject(&state, e);
    }

    let engine = state.engine;
    let result = match tokio::task::spawn_blocking(move || engine.estimate(&request)).await {
        Ok(r) => r,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(estimate) => {
            state.counters.requests_priced.fetch_add(1, Relaxed);
            tracing::debug!(
                kind = %request.kind,
                simulations = estimate.simulations,
                price = estimate.option_price,
                std_error = estimate.std_error,
                "option priced"
            );
            (
                StatusCode::OK,
                Json(json!({ "option_price": estimate.option_price })),
            )
        }
        Err(e) => reject(&state, e),
    }
}

/// POST /calculate-reference-price -- closed-form Black-Scholes cross-check
pub async fn calculate_reference_price(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResponse {
    let result = parse_request(&body, &REFERENCE_FIELDS)
        .and_then(|request| state.reference.price(&request));

    match result {
        Ok(price) => {
            state.counters.reference_prices.fetch_add(1, Relaxed);
            tracing::debug!(
                model = state.reference.name(),
                price = price,
                "reference price computed"
            );
            (StatusCode::OK, Json(json!({ "option_price": price })))
        }
        Err(e) => reject(&state, e),
    }
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<CountersSnapshot> {
    Json(state.counters.snapshot())
}

fn reject(state: &AppState, e: PricingError) -> ApiResponse {
    match &e {
        PricingError::MissingField => {
            state.counters.requests_rejected.fetch_add(1, Relaxed);
            tracing::warn!("pricing request missing required fields");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing required fields" })),
            )
        }
        PricingError::InvalidArgument { field, reason } => {
            state.counters.requests_rejected.fetch_add(1, Relaxed);
            tracing::warn!(field = *field, reason = %reason, "pricing request rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string(), "field": field })),
            )
        }
        _ => {
            state.counters.computations_failed.fetch_add(1, Relaxed);
            tracing::warn!(error = %e, "pricing computation failed");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

/// Presence check over `required` first, then value conversion.
/// A missing field never reaches the pricers.
fn parse_request(body: &Value, required: &[&str]) -> PricerResult<PricingRequest> {
    let fields = body.as_object().ok_or(PricingError::MissingField)?;
    if !required.iter().all(|f| fields.contains_key(*f)) {
        return Err(PricingError::MissingField);
    }

    let simulations = if required.contains(&"simulations") {
        count(body, "simulations")?
    } else {
        1
    };

    let kind = match &body["option_type"] {
        Value::String(s) => s.parse::<OptionKind>()?,
        other => {
            return Err(PricingError::invalid(
                "option_type",
                format!("expected \"call\" or \"put\", got {other}"),
            ))
        }
    };

    Ok(PricingRequest {
        spot: number(body, "stock_price")?,
        strike: number(body, "strike_price")?,
        maturity: number(body, "time_to_maturity")?,
        rate: number(body, "risk_free_rate")?,
        volatility: number(body, "volatility")?,
        simulations,
        kind,
    })
}

/// JSON number or numeric string (the landing page form posts strings).
fn number(body: &Value, field: &'static str) -> PricerResult<f64> {
    match &body[field] {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| PricingError::invalid(field, format!("{n} is not representable"))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| PricingError::invalid(field, format!("{s:?} is not a number: {e}"))),
        other => Err(PricingError::invalid(field, format!("expected a number, got {other}"))),
    }
}

/// Non-negative integer, given as an integer, an integral float, or a string of either.
fn count(body: &Value, field: &'static str) -> PricerResult<u64> {
    if let Some(n) = body[field].as_u64() {
        return Ok(n);
    }
    let value = number(body, field)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 {
        Ok(value as u64)
    } else {
        Err(PricingError::invalid(
            field,
            format!("expected a non-negative whole number, got {value}"),
        ))
    }
}
