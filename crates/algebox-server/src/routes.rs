//! HTTP handlers
//!
//! Code-level failures (runtime errors, timeouts) are HTTP 200 with
//! `success=false`; only validation problems and server misconfiguration
//! become HTTP error statuses.

use crate::stats::StatsStore;
use actix_web::{HttpResponse, get, post, web};
use algebox_core::{AlgeboxError, SandboxConfig, executor, probe};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
}

/// Error body in the shape API clients already expect.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl ErrorBody {
    fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[post("/execute")]
pub async fn execute(
    body: web::Json<ExecuteRequest>,
    sandbox: web::Data<SandboxConfig>,
) -> HttpResponse {
    match executor::execute(&body.code, &sandbox).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(AlgeboxError::Validation(msg)) => {
            HttpResponse::BadRequest().json(ErrorBody::new(msg))
        }
        Err(e @ AlgeboxError::BinaryNotFound(_)) => {
            tracing::error!(error = %e, "interpreter missing");
            HttpResponse::InternalServerError().json(ErrorBody::new(format!(
                "{e}. Ensure the interpreter is installed and on PATH."
            )))
        }
        Err(e) => {
            tracing::error!(error = %e, "unclassified execution failure");
            HttpResponse::InternalServerError()
                .json(ErrorBody::new(format!("execution error: {e}")))
        }
    }
}

#[get("/health")]
pub async fn health(sandbox: web::Data<SandboxConfig>) -> HttpResponse {
    let status = probe::probe(&sandbox.interpreter_path).await;
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "interpreter_available": status.available,
        "interpreter_version": status.version,
        "resource_limits": {
            "timeout_seconds": sandbox.limits.wall_clock_timeout.as_secs(),
            "memory_limit_mb": sandbox.limits.max_memory_bytes / 1_000_000,
            "cpu_time_limit_seconds": sandbox.limits.max_cpu_seconds,
        },
    }))
}

#[get("/admin/stats")]
pub async fn admin_stats(stats: web::Data<StatsStore>) -> HttpResponse {
    HttpResponse::Ok().json(stats.snapshot())
}
