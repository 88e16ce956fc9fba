//! AWS Lambda handler for scenario projections
//!
//! Accepts scenario parameters as JSON and returns the summary figures, the
//! break-even month and the schedule. When a list of named scenarios is
//! posted instead, returns their side-by-side comparison.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use log::warn;
use serde::{Deserialize, Serialize};

use mortgage_system::comparison::ComparedScenario;
use mortgage_system::projection::MonthRow;
use mortgage_system::report::Resolution;
use mortgage_system::{compare, compute, ProjectionError, ScenarioParameters, ScenarioSummary};

/// Input for a projection; omitted scenario fields take the default values
#[derive(Debug, Deserialize)]
pub struct ProjectionRequest {
    #[serde(flatten)]
    pub parameters: ScenarioParameters,

    /// Schedule granularity in the response (default: yearly)
    #[serde(default = "default_resolution")]
    pub resolution: Resolution,

    /// Named scenarios to compare instead of projecting `parameters`
    #[serde(default)]
    pub scenarios: Option<Vec<NamedScenario>>,

    /// Scenario names to compare (default: all posted scenarios, in order)
    #[serde(default)]
    pub selected: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct NamedScenario {
    pub name: String,
    #[serde(default)]
    pub parameters: ScenarioParameters,
}

fn default_resolution() -> Resolution { Resolution::Yearly }

/// Output for a single projection
#[derive(Debug, Serialize)]
pub struct ProjectionResponse {
    pub summary: ScenarioSummary,
    pub break_even_month: Option<u32>,
    pub resolution: Resolution,
    pub schedule: Vec<MonthRow>,
    pub execution_time_ms: u64,
}

/// Output for a comparison
#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub scenarios: Vec<ComparedScenario>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheapest: Option<String>,
    pub execution_time_ms: u64,
}

fn error_response(status: u16, message: &str) -> Result<Response<Body>, Error> {
    let body = serde_json::json!({ "error": message });
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Text(body.to_string()))?)
}

fn json_response<T: Serialize>(body: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Text(serde_json::to_string(body)?))?)
}

/// Map engine failures onto HTTP status codes
fn projection_error_response(err: &ProjectionError) -> Result<Response<Body>, Error> {
    warn!("Projection request failed: {}", err);
    let status = match err {
        ProjectionError::ScheduleDidNotConverge { .. } => 422,
        ProjectionError::InvalidScenario { .. }
        | ProjectionError::InsufficientScenarios { .. }
        | ProjectionError::UnknownScenario(_) => 400,
    };
    error_response(status, &err.to_string())
}

/// Lambda handler function
async fn handler(event: Request) -> Result<Response<Body>, Error> {
    let start = std::time::Instant::now();

    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(Response::builder()
            .status(200)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .body(Body::Empty)?);
    }

    // Parse request body
    let body_str = match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => "{}".to_string(),
    };

    let request: ProjectionRequest = match serde_json::from_str(&body_str) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };

    if let Some(scenarios) = request.scenarios {
        let named: Vec<(String, ScenarioParameters)> = scenarios
            .into_iter()
            .map(|s| (s.name, s.parameters))
            .collect();
        let selected = request
            .selected
            .unwrap_or_else(|| named.iter().map(|(name, _)| name.clone()).collect());

        let report = match compare(&named, &selected) {
            Ok(report) => report,
            Err(e) => return projection_error_response(&e),
        };

        let response = ComparisonResponse {
            cheapest: report.cheapest().map(|entry| entry.name.clone()),
            scenarios: report.iter().cloned().collect(),
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        return json_response(&response);
    }

    let projection = match compute(&request.parameters) {
        Ok(projection) => projection,
        Err(e) => return projection_error_response(&e),
    };

    let response = ProjectionResponse {
        break_even_month: projection.schedule.break_even_month(),
        schedule: request
            .resolution
            .rows(&projection.schedule)
            .into_iter()
            .cloned()
            .collect(),
        resolution: request.resolution,
        summary: projection.summary,
        execution_time_ms: start.elapsed().as_millis() as u64,
    };

    json_response(&response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}
