//! REST API endpoints for the greenhouse service.
//!
//! The sensor endpoints use the Spanish field names of the greenhouse
//! dashboard (`ultimos_datos`, `historial_completo`, ...). Service endpoints
//! live under `/api`.
//!
//! ## Error Handling
//!
//! Endpoints that can fail return structured JSON errors via [`AppError`].
//!
//! # Example
//!
//! ```ignore
//! use greenhouse_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use greenhouse_core::{Reading, SensorKind};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::error;

use crate::collector::Collector;
use crate::export::{self, ExportError, Snapshot};
use crate::state::AppState;

/// Number of readings returned by `GET /temperatura` in `ultimos_10`.
const TEMPERATURE_WINDOW: usize = 10;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // Sensor data
        .route("/temperatura", get(get_temperature))
        .route("/humedad", get(get_humidity))
        .route("/ph", get(get_ph))
        .route("/guardar-datos", post(save_data))
        // Health and status
        .route("/api/health", get(health))
        .route("/api/status", get(get_status))
        .route("/api/sensors/{kind}", get(get_sensor))
        // Collector control
        .route("/api/collector/start", post(collector_start))
        .route("/api/collector/stop", post(collector_stop))
}

// ==========================================================================
// Sensor Endpoints
// ==========================================================================

/// Response for `GET /temperatura`.
#[derive(Debug, Serialize)]
pub struct TemperatureResponse {
    pub ultimos_datos: Option<Reading>,
    pub ultimos_10: Vec<Reading>,
}

async fn get_temperature(State(state): State<Arc<AppState>>) -> Json<TemperatureResponse> {
    let sensor = state.registry.get(SensorKind::Temperature);
    Json(TemperatureResponse {
        ultimos_datos: sensor.last(),
        ultimos_10: sensor.latest(TEMPERATURE_WINDOW),
    })
}

/// Response for `GET /humedad`.
#[derive(Debug, Serialize)]
pub struct HumidityResponse {
    pub ultimos_datos: Option<Reading>,
    pub historial_completo: Vec<Reading>,
}

async fn get_humidity(State(state): State<Arc<AppState>>) -> Json<HumidityResponse> {
    let sensor = state.registry.get(SensorKind::Humidity);
    Json(HumidityResponse {
        ultimos_datos: sensor.last(),
        historial_completo: sensor.all(),
    })
}

/// Response for `GET /ph`.
#[derive(Debug, Serialize)]
pub struct PhResponse {
    pub historial_completo: Vec<Reading>,
}

async fn get_ph(State(state): State<Arc<AppState>>) -> Json<PhResponse> {
    Json(PhResponse {
        historial_completo: state.registry.get(SensorKind::Ph).all(),
    })
}

/// Response for `POST /guardar-datos`.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub mensaje: String,
}

/// Write every sensor's history to a timestamped JSON file.
///
/// The snapshot is taken before touching the filesystem, so a failed write
/// never affects sensor state.
async fn save_data(State(state): State<Arc<AppState>>) -> Result<Json<SaveResponse>, AppError> {
    let snapshot = Snapshot::capture(&state.registry);
    let directory = state.config.read().await.export.directory.clone();
    let at = state.registry.now();

    let path = tokio::task::spawn_blocking(move || {
        export::write_snapshot(&snapshot, &directory, at)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Export task failed: {}", e)))??;

    Ok(Json(SaveResponse {
        mensaje: format!("Datos guardados en {}", path.display()),
    }))
}

/// Query parameters for `GET /api/sensors/{kind}`.
#[derive(Debug, Deserialize)]
pub struct SensorQuery {
    /// Return only the most recent `limit` readings.
    pub limit: Option<usize>,
}

/// Sensor details and readings.
#[derive(Debug, Serialize)]
pub struct SensorResponse {
    pub kind: SensorKind,
    pub name: String,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub count: usize,
    pub readings: Vec<Reading>,
}

/// Get one sensor by kind (`temperature`, `humedad`, `ph`, ...).
async fn get_sensor(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(query): Query<SensorQuery>,
) -> Result<Json<SensorResponse>, AppError> {
    let kind: SensorKind = kind
        .parse()
        .map_err(|e: greenhouse_core::Error| AppError::NotFound(e.to_string()))?;
    let sensor = state.registry.get(kind);

    let (count, readings) = sensor.latest_with_len(query.limit.unwrap_or(usize::MAX));

    Ok(Json(SensorResponse {
        kind,
        name: sensor.name().to_string(),
        unit: sensor.unit().to_string(),
        min: sensor.range().min(),
        max: sensor.range().max(),
        count,
        readings,
    }))
}

// ==========================================================================
// Service Status and Collector Control
// ==========================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

/// Service status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service version.
    pub version: &'static str,
    /// Current timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Collector status.
    pub collector: CollectorStatus,
    /// Per-sensor statistics.
    pub sensors: Vec<SensorStats>,
}

/// Collector status.
#[derive(Debug, Serialize)]
pub struct CollectorStatus {
    /// Whether the collector is running.
    pub running: bool,
    /// When the collector was started (if running).
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    /// How long the collector has been running (in seconds).
    pub uptime_seconds: Option<u64>,
}

/// Statistics for a single sensor.
#[derive(Debug, Serialize)]
pub struct SensorStats {
    pub kind: SensorKind,
    pub name: String,
    pub unit: String,
    /// Producer interval in seconds.
    pub interval: u64,
    /// Readings currently retained.
    pub count: usize,
    /// Timestamp of the newest reading.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_reading_at: Option<OffsetDateTime>,
}

/// Get service status including collector state and sensor stats.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let running = state.collector.is_running();
    let started_at = state.collector.started_at();
    let uptime_seconds = started_at.map(|s| {
        let now = OffsetDateTime::now_utc();
        (now - s).whole_seconds().max(0) as u64
    });

    let config = state.config.read().await;
    let sensors = state
        .registry
        .iter()
        .map(|(kind, sensor)| SensorStats {
            kind,
            name: sensor.name().to_string(),
            unit: sensor.unit().to_string(),
            interval: config.sensors.interval(kind).as_secs(),
            count: sensor.len(),
            last_reading_at: sensor.last().map(|r| r.timestamp),
        })
        .collect();

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
        collector: CollectorStatus {
            running,
            started_at,
            uptime_seconds,
        },
        sensors,
    })
}

/// Response for collector control actions.
#[derive(Debug, Serialize)]
pub struct CollectorActionResponse {
    pub success: bool,
    pub message: String,
    pub running: bool,
}

/// Start the collector.
async fn collector_start(State(state): State<Arc<AppState>>) -> Json<CollectorActionResponse> {
    let collector = Collector::new(Arc::clone(&state));
    if !collector.start().await {
        return Json(CollectorActionResponse {
            success: false,
            message: "Collector is already running".to_string(),
            running: true,
        });
    }

    Json(CollectorActionResponse {
        success: true,
        message: "Collector started".to_string(),
        running: true,
    })
}

/// Stop the collector.
async fn collector_stop(State(state): State<Arc<AppState>>) -> Json<CollectorActionResponse> {
    let message = match Collector::new(Arc::clone(&state)).stop().await {
        None => {
            return Json(CollectorActionResponse {
                success: false,
                message: "Collector is not running".to_string(),
                running: false,
            });
        }
        Some(true) => "Collector stopped",
        Some(false) => "Collector stopped (some tasks timed out and were aborted)",
    };

    Json(CollectorActionResponse {
        success: true,
        message: message.to_string(),
        running: false,
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Export(ExportError),
    Internal(String),
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::Export(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Export(e) => {
                error!("Export failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
