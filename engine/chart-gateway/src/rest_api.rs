//! REST API endpoints for the ChartGateway
//!
//! This module provides REST API endpoints for adding and removing players,
//! querying backups and reading a team's full depth chart.

use chrono::NaiveDate;
use depth_chart::{AddPlayerRequest, DepthChartError, PlayerRequest, ServiceRegistry};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Filter;

/// Largest accepted request body
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Rejection carrying a ready-made error response
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl warp::reject::Reject for ApiError {}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub timestamp: String,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Full chart query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FullChartParams {
    pub chart_date: Option<NaiveDate>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(code: &str, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            error: ErrorDetail { code: code.to_string(), message: message.into(), details },
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Map a depth chart failure to its HTTP status and error body
fn error_response(err: &DepthChartError) -> (StatusCode, ErrorResponse) {
    match err {
        DepthChartError::MissingArgument(field) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(
                "MISSING_ARGUMENT",
                err.to_string(),
                Some(serde_json::json!({ "field": field })),
            ),
        ),
        DepthChartError::InvalidRange { field, value } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(
                "INVALID_RANGE",
                err.to_string(),
                Some(serde_json::json!({ "field": field, "value": value })),
            ),
        ),
        DepthChartError::DuplicatePlayer { position_code, player_id } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(
                "DUPLICATE_PLAYER",
                err.to_string(),
                Some(serde_json::json!({ "positionCode": position_code, "playerId": player_id })),
            ),
        ),
        DepthChartError::UnconfiguredTeam { sport_code, team_code } => (
            StatusCode::NOT_FOUND,
            ErrorResponse::new(
                "TEAM_NOT_CONFIGURED",
                err.to_string(),
                Some(serde_json::json!({ "sportCode": sport_code, "teamCode": team_code })),
            ),
        ),
        DepthChartError::PlayerNotInPosition { position_code, player_id } => (
            StatusCode::NOT_FOUND,
            ErrorResponse::new(
                "PLAYER_NOT_IN_POSITION",
                err.to_string(),
                Some(serde_json::json!({ "positionCode": position_code, "playerId": player_id })),
            ),
        ),
        DepthChartError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("STORAGE_FAILURE", "The depth chart store failed", None),
        ),
        DepthChartError::InvalidConfig(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("CONFIG_ERROR", "The depth chart service is misconfigured", None),
        ),
    }
}

fn reject(err: DepthChartError) -> warp::Rejection {
    let (status, body) = error_response(&err);
    if status.is_server_error() {
        tracing::error!("Depth chart request failed: {}", err);
    } else {
        tracing::debug!("Depth chart request rejected: {}", err);
    }
    warp::reject::custom(ApiError { status, body })
}

/// Add a player to a team's depth chart
pub async fn add_player(
    sport_code: String,
    team_code: String,
    request: AddPlayerRequest,
    registry: Arc<ServiceRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    tracing::debug!("POST add player {}/{}: {:?}", sport_code, team_code, request);

    let service = registry.resolve(&sport_code, &team_code).map_err(reject)?;
    let entry = service.add_player(&team_code, request).await.map_err(reject)?;

    Ok(warp::reply::json(&entry))
}

/// Remove a player from a position
pub async fn remove_player(
    sport_code: String,
    team_code: String,
    params: PlayerRequest,
    registry: Arc<ServiceRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    tracing::debug!("DELETE player {}/{}: {:?}", sport_code, team_code, params);

    let service = registry.resolve(&sport_code, &team_code).map_err(reject)?;
    let removed = service.remove_player(&team_code, params).await.map_err(reject)?;

    Ok(warp::reply::json(&removed))
}

/// Players ranked below the given player
pub async fn get_backups(
    sport_code: String,
    team_code: String,
    params: PlayerRequest,
    registry: Arc<ServiceRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let service = registry.resolve(&sport_code, &team_code).map_err(reject)?;
    let backups = service.get_backups(&team_code, params).await.map_err(reject)?;

    Ok(warp::reply::json(&backups))
}

/// Full depth chart of a team, grouped by position
pub async fn get_full_chart(
    sport_code: String,
    team_code: String,
    params: FullChartParams,
    registry: Arc<ServiceRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let service = registry.resolve(&sport_code, &team_code).map_err(reject)?;
    let chart = service.get_full_chart(&team_code, params.chart_date).await.map_err(reject)?;

    Ok(warp::reply::json(&chart))
}

/// Turn every rejection into the JSON error envelope
pub async fn handle_rejection(err: warp::Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, body) = if let Some(api) = err.find::<ApiError>() {
        (api.status, api.body.clone())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", "Route not found", None))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, ErrorResponse::new("INVALID_BODY", e.to_string(), None))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, ErrorResponse::new("INVALID_QUERY", e.to_string(), None))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorResponse::new("PAYLOAD_TOO_LARGE", "Request body too large", None),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorResponse::new("UNSUPPORTED_MEDIA_TYPE", "Expected application/json", None),
        )
    } else if let Some(e) = err.find::<warp::filters::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, ErrorResponse::new("CORS_FORBIDDEN", e.to_string(), None))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorResponse::new("METHOD_NOT_ALLOWED", "Method not allowed", None),
        )
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("INTERNAL_ERROR", "Internal server error", None),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

/// Create all REST API routes
pub fn create_routes(
    registry: Arc<ServiceRegistry>,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let registry_filter = warp::any().map(move || registry.clone());

    // Add player endpoint
    let add = warp::path("api")
        .and(warp::path("depthchart"))
        .and(warp::path("add-player-to-depth-chart"))
        .and(warp::path::param::<String>())
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<AddPlayerRequest>())
        .and(registry_filter.clone())
        .and_then(add_player);

    // Remove player endpoint
    let remove = warp::path("api")
        .and(warp::path("depthchart"))
        .and(warp::path::param::<String>())
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::delete())
        .and(warp::query::<PlayerRequest>())
        .and(registry_filter.clone())
        .and_then(remove_player);

    // Backups endpoint
    let backups = warp::path("api")
        .and(warp::path("depthchart"))
        .and(warp::path("backups"))
        .and(warp::path::param::<String>())
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<PlayerRequest>())
        .and(registry_filter.clone())
        .and_then(get_backups);

    // Full chart endpoint
    let full = warp::path("api")
        .and(warp::path("depthchart"))
        .and(warp::path("full"))
        .and(warp::path::param::<String>())
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<FullChartParams>())
        .and(registry_filter)
        .and_then(get_full_chart);

    // Health check endpoint
    let health = warp::path("health").and(warp::path::end()).and(warp::get()).map(|| {
        warp::reply::json(&HealthResponse {
            status: "healthy".to_string(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    });

    // Combine all routes
    add.or(remove)
        .or(backups)
        .or(full)
        .or(health)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_headers(vec!["content-type"])
                .allow_methods(vec!["GET", "POST", "DELETE", "OPTIONS"]),
        )
        .recover(handle_rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use depth_chart::{
        builtin_registrations, ChartEntry, ChartPeriod, FullDepthChart, InMemoryChartStore,
        PlayerSummary,
    };

    const BASE: &str = "/api/depthchart";
    const TEAM: &str = "NFL/TampaBayBuccaneers";

    fn registry() -> Arc<ServiceRegistry> {
        let store = Arc::new(InMemoryChartStore::new());
        Arc::new(ServiceRegistry::new(builtin_registrations(ChartPeriod::default()), store).unwrap())
    }

    fn add_body(position: &str, id: i32, name: &str, depth: Option<i32>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "positionCode": position,
            "playerId": id,
            "playerName": name,
            "chartDate": "2024-09-01",
        });
        if let Some(depth) = depth {
            body["depth"] = depth.into();
        }
        body
    }

    fn post(team: &str, body: serde_json::Value) -> warp::test::RequestBuilder {
        warp::test::request()
            .method("POST")
            .path(&format!("{BASE}/add-player-to-depth-chart/{team}"))
            .json(&body)
    }

    fn error_code(body: &[u8]) -> String {
        let parsed: ErrorResponse = serde_json::from_slice(body).unwrap();
        parsed.error.code
    }

    #[tokio::test]
    async fn test_add_and_full_chart() {
        let routes = create_routes(registry());

        let resp = post(TEAM, add_body("LT", 1, "Alice", None)).reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let entry: ChartEntry = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(entry.depth, 1);

        let resp = post(TEAM, add_body("LT", 2, "Bob", Some(1))).reply(&routes).await;
        let entry: ChartEntry = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(entry.depth, 1);

        let resp = warp::test::request()
            .path(&format!("{BASE}/full/{TEAM}?chartDate=2024-09-01"))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let chart: FullDepthChart = serde_json::from_slice(resp.body()).unwrap();
        let lt = chart.position("LT").unwrap();
        let ids: Vec<i32> = lt.players.iter().map(|p| p.player_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_backups_and_remove() {
        let routes = create_routes(registry());
        post(TEAM, add_body("QB", 12, "Tom Brady", None)).reply(&routes).await;
        post(TEAM, add_body("QB", 11, "Blaine Gabbert", None)).reply(&routes).await;

        let resp = warp::test::request()
            .path(&format!("{BASE}/backups/{TEAM}?positionCode=QB&playerId=12&chartDate=2024-09-01"))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let backups: Vec<PlayerSummary> = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].player_name, "Blaine Gabbert");

        let resp = warp::test::request()
            .method("DELETE")
            .path(&format!("{BASE}/{TEAM}?positionCode=QB&playerId=12&chartDate=2024-09-01"))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let removed: PlayerSummary = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(removed.player_id, 12);

        let resp = warp::test::request()
            .method("DELETE")
            .path(&format!("{BASE}/{TEAM}?positionCode=QB&playerId=12&chartDate=2024-09-01"))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_code(resp.body()), "PLAYER_NOT_IN_POSITION");
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let routes = create_routes(registry());

        let resp = post("NFL/Chiefs", add_body("QB", 15, "Pat", None)).reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_code(resp.body()), "TEAM_NOT_CONFIGURED");

        let resp = post(TEAM, serde_json::json!({ "positionCode": "QB", "playerId": 1 }))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(resp.body()), "MISSING_ARGUMENT");

        let resp = post(TEAM, add_body("QB", 1, "A", Some(0))).reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(resp.body()), "INVALID_RANGE");

        post(TEAM, add_body("QB", 1, "A", None)).reply(&routes).await;
        let resp = post(TEAM, add_body("QB", 1, "A", None)).reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(resp.body()), "DUPLICATE_PLAYER");

        let resp = post(TEAM, serde_json::json!({ "playerId": "twelve" })).reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(resp.body()), "INVALID_BODY");

        let resp = warp::test::request()
            .path(&format!("{BASE}/backups/{TEAM}?positionCode=QB&playerId=abc"))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_server_errors_keep_their_own_codes() {
        let (status, body) =
            error_response(&DepthChartError::InvalidConfig("duplicate sport".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "CONFIG_ERROR");

        let (status, body) =
            error_response(&DepthChartError::Storage(depth_chart::StoreError::conflict("gap")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "STORAGE_FAILURE");
    }

    #[tokio::test]
    async fn test_health_and_unknown_route() {
        let routes = create_routes(registry());

        let resp = warp::test::request().path("/health").reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let health: HealthResponse = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(health.status, "healthy");

        let resp = warp::test::request().path("/api/nothing").reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_code(resp.body()), "NOT_FOUND");
    }
}
