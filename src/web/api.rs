use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::{
    AppState, ForecastRequest, ForecastResponse, InputsParams, InputsResponse, PredictResponse,
    SeriesPoint, SummaryResponse,
};
use crate::engine::target_date;
use crate::error::ForecastError;
use crate::types::{CovariateLookup, ForecastQuery, ForecastResult};

// === Data Endpoints ===

pub async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let series = state.context.series();
    Json(SummaryResponse {
        cutoff: series.cutoff(),
        first_date: series.first_date(),
        last_date: series.last_date(),
        history_rows: series.history_len(),
        future_rows: series.future_len(),
        default_alpha: state.default_alpha,
        default_date: series.last_date(),
    })
}

pub async fn get_series(State(state): State<AppState>) -> impl IntoResponse {
    let points: Vec<SeriesPoint> = state
        .context
        .series()
        .observed_values()
        .map(|(date, value)| SeriesPoint { date, value })
        .collect();
    Json(points)
}

pub async fn get_inputs(
    State(state): State<AppState>,
    params: Result<Query<InputsParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => return error_body(rejection.status(), rejection.body_text()),
    };
    let query = match parse_query(&params.date, params.alpha, state.default_alpha) {
        Ok(q) => q,
        Err(response) => return response,
    };

    let target = target_date(query.query_date);
    match state.context.lookup_covariates(target) {
        CovariateLookup::Available { values, .. } => (
            StatusCode::OK,
            Json(InputsResponse {
                date: query.query_date,
                target_date: target,
                alpha: query.alpha,
                covariates: values,
            }),
        )
            .into_response(),
        CovariateLookup::NotAvailable { date } => {
            let series = state.context.series();
            (StatusCode::NOT_FOUND, Json(json!({
                "error": format!(
                    "Exogenous variables not available for {}. Available range: {} to {}",
                    date,
                    series.first_date(),
                    series.last_date()
                ),
                "target_date": date,
                "available_from": series.first_date(),
                "available_to": series.last_date(),
            }))).into_response()
        }
    }
}

// === Forecast Endpoints ===

pub async fn post_forecast(
    State(state): State<AppState>,
    request: Result<Json<ForecastRequest>, JsonRejection>,
) -> Response {
    let request = match read_body(request) {
        Ok(r) => r,
        Err(response) => return response,
    };
    let result = match run_forecast(&state, &request) {
        Ok(r) => r,
        Err(response) => return response,
    };

    let covariates = state
        .context
        .lookup_covariates(result.target_date)
        .values()
        .copied();

    (StatusCode::OK, Json(ForecastResponse { result, covariates })).into_response()
}

/// Minimal variant returning only the ensemble value
pub async fn post_predict(
    State(state): State<AppState>,
    request: Result<Json<ForecastRequest>, JsonRejection>,
) -> Response {
    let request = match read_body(request) {
        Ok(r) => r,
        Err(response) => return response,
    };
    match run_forecast(&state, &request) {
        Ok(result) => (
            StatusCode::OK,
            Json(PredictResponse {
                date: result.query_date,
                prediction: result.ensemble_forecast,
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}

fn read_body(request: Result<Json<ForecastRequest>, JsonRejection>) -> Result<ForecastRequest, Response> {
    request
        .map(|Json(body)| body)
        .map_err(|rejection| error_body(rejection.status(), rejection.body_text()))
}

fn run_forecast(state: &AppState, request: &ForecastRequest) -> Result<ForecastResult, Response> {
    let query = parse_query(&request.date, request.alpha, state.default_alpha)?;

    let result = state
        .context
        .forecast(query.query_date, query.alpha)
        .map_err(error_response)?;

    info!(
        "Forecast {} (alpha {}): {:.0}",
        result.query_date, result.alpha, result.ensemble_forecast
    );
    Ok(result)
}

fn parse_query(date: &str, alpha: Option<f64>, default_alpha: f64) -> Result<ForecastQuery, Response> {
    let query = ForecastQuery::parse(date, alpha.unwrap_or(default_alpha))
        .map_err(|e| error_body(StatusCode::BAD_REQUEST, e))?;

    if !query.alpha_in_unit_range() {
        warn!("Request alpha {} is outside [0, 1]", query.alpha);
    }
    Ok(query)
}

fn error_response(err: ForecastError) -> Response {
    let status = match &err {
        ForecastError::CovariateHorizonExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ForecastError::InvalidData(_) => StatusCode::BAD_REQUEST,
        _ => {
            error!("Forecast failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_body(status, err.to_string())
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

// === Health Check ===

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::super::build_router;
    use super::*;
    use crate::engine::orchestrator::tests::real_context;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use axum::Router;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::new(Arc::new(real_context()), 0.5))
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_summary() {
        let (status, body) = send(get("/api/summary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cutoff"], "2021-12-01");
        assert_eq!(body["first_date"], "2017-01-01");
        assert_eq!(body["default_date"], "2022-12-01");
        assert_eq!(body["history_rows"], 60);
        assert_eq!(body["future_rows"], 12);
        assert_eq!(body["default_alpha"], 0.5);
    }

    #[tokio::test]
    async fn test_series_lists_observed_values_only() {
        let (status, body) = send(get("/api/series")).await;
        assert_eq!(status, StatusCode::OK);
        let points = body.as_array().unwrap();
        assert_eq!(points.len(), 60);
        assert_eq!(points[0]["date"], "2017-01-01");
        assert_eq!(points[59]["value"], 55_900.0);
    }

    #[tokio::test]
    async fn test_forecast_endpoint() {
        let (status, body) = send(post_json(
            "/api/forecast",
            json!({"date": "2022-03-01", "alpha": 0.5}),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["target_date"], "2022-02-01");
        assert_eq!(body["steps_ahead"], 3);
        assert_eq!(body["days_diff"], 62);
        assert_eq!(body["crisis_period"], false);
        assert_eq!(body["autoregressive_forecast"], 55_900.0);
        assert!(body["covariates"]["exchange_rate"].is_number());
    }

    #[tokio::test]
    async fn test_forecast_defaults_alpha_and_ignores_extra_fields() {
        let (status, body) = send(post_json(
            "/api/forecast",
            json!({"date": "2022-03-15", "EUR_TL": 30.1, "Faiz": 14.0}),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alpha"], 0.5);
        // No row on 2022-02-15, forecast still returned
        assert!(body["covariates"].is_null());
    }

    #[tokio::test]
    async fn test_forecast_rejects_bad_date() {
        let (status, body) = send(post_json("/api/forecast", json!({"date": "01.03.2022"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn test_malformed_bodies_return_json_errors() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/forecast")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"date\": "))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        // Missing date field
        let (status, body) = send(post_json("/api/predict", json!({"alpha": 0.5}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("date"));

        let (status, body) = send(get("/api/inputs?alpha=0.5")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_forecast_beyond_horizon() {
        let (status, body) = send(post_json("/api/forecast", json!({"date": "2025-01-01"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("beyond available covariate horizon"));
    }

    #[tokio::test]
    async fn test_predict_endpoint() {
        let (status, body) = send(post_json(
            "/api/predict",
            json!({"date": "2022-03-01", "alpha": 0.0}),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["date"], "2022-03-01");
        assert_eq!(body["prediction"], 55_900.0);
    }

    #[tokio::test]
    async fn test_inputs_endpoint() {
        let (status, body) = send(get("/api/inputs?date=2022-03-01&alpha=0.3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["target_date"], "2022-02-01");
        assert_eq!(body["alpha"], 0.3);
        assert!(body["covariates"]["tax_rate"].is_number());

        let (status, body) = send(get("/api/inputs?date=2030-01-01")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["available_to"], "2022-12-01");
    }

    #[tokio::test]
    async fn test_dashboard_page() {
        let response = app().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("/api/forecast"));
    }
}
