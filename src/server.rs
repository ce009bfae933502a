use crate::data::{ScheduleError, SchedulingInput, SolveReport};
use crate::solver::{self, SolveOptions};
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(flatten)]
    input: SchedulingInput,
    #[serde(default)]
    best_effort: bool,
    /// Time budget in milliseconds; the deadline is owned here, not by the
    /// engine.
    deadline_ms: Option<u64>,
}

async fn generate_handler(
    Json(request): Json<GenerateRequest>,
) -> Result<Json<SolveReport>, (axum::http::StatusCode, String)> {
    let options = SolveOptions {
        best_effort: request.best_effort,
        deadline: request
            .deadline_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms)),
    };
    match solver::generate(&request.input, &options) {
        Ok(report) => Ok(Json(report)),
        Err(err @ ScheduleError::InvalidReferences(_)) => {
            Err((axum::http::StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))
        }
        Err(err) => Err((axum::http::StatusCode::INTERNAL_SERVER_ERROR, err.to_string())),
    }
}

pub async fn run_server() {
    let app = Router::new().route("/v1/timetable/generate", post(generate_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
