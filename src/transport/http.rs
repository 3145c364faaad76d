//! HTTP API served with warp
//!
//! | Method | Path                  | Response                                   |
//! |--------|-----------------------|--------------------------------------------|
//! | POST   | `/tasks/add`          | `{task_id}`                                |
//! | GET    | `/tasks`              | all tasks in creation order                |
//! | GET    | `/tasks/{id}`         | one task                                   |
//! | GET    | `/tasks/{id}/result`  | 200 `{result}`, 202 pending, 422 failed    |
//! | GET    | `/operations`         | operator catalog                           |
//! | GET    | `/health`             | pool and queue health                      |
//! | GET    | `/metrics`            | metrics snapshot                           |

use crate::agent::PoolStatus;
use crate::error::ServiceError;
use crate::evaluator::OperationCatalog;
use crate::observability::{metrics, HealthReport};
use crate::tasks::{TaskId, TaskOutcome, TaskService};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::Filter;

/// Largest accepted submission body
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Message returned while a task is queued or calculating
pub const PENDING_MESSAGE: &str = "Task is not completed yet";

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    expression: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: TaskId,
}

#[derive(Debug, Serialize)]
struct PendingResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ResultResponse {
    result: f64,
}

#[derive(Debug, Serialize)]
struct FailedResponse {
    status: &'static str,
    error: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

/// Shared state behind every route
pub struct HttpApi {
    service: Arc<TaskService>,
    catalog: Arc<OperationCatalog>,
    pool: Arc<PoolStatus>,
}

impl HttpApi {
    pub fn new(
        service: Arc<TaskService>,
        catalog: Arc<OperationCatalog>,
        pool: Arc<PoolStatus>,
    ) -> Self {
        Self {
            service,
            catalog,
            pool,
        }
    }

    /// All API routes
    pub fn routes(
        self: &Arc<Self>,
    ) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
        let submit = warp::path!("tasks" / "add")
            .and(warp::post())
            .and(warp::body::content_length_limit(MAX_BODY_BYTES))
            .and(warp::body::bytes())
            .and(with_api(self))
            .and_then(|body: Bytes, api: Arc<HttpApi>| async move {
                Ok::<_, Infallible>(api.submit(&body).await)
            });

        let list = warp::path!("tasks")
            .and(warp::get())
            .and(with_api(self))
            .map(|api: Arc<HttpApi>| json_reply(&api.service.list(), StatusCode::OK));

        let get = warp::path!("tasks" / String)
            .and(warp::get())
            .and(with_api(self))
            .map(|raw: String, api: Arc<HttpApi>| api.get_task(&raw));

        let result = warp::path!("tasks" / String / "result")
            .and(warp::get())
            .and(with_api(self))
            .map(|raw: String, api: Arc<HttpApi>| api.task_result(&raw));

        let operations = warp::path!("operations")
            .and(warp::get())
            .and(with_api(self))
            .map(|api: Arc<HttpApi>| json_reply(&api.catalog.operations(), StatusCode::OK));

        let health = warp::path!("health")
            .and(warp::get())
            .and(with_api(self))
            .map(|api: Arc<HttpApi>| api.health());

        let metrics_route = warp::path!("metrics")
            .and(warp::get())
            .map(|| json_reply(&metrics().get_metrics(), StatusCode::OK));

        submit
            .or(list)
            .unify()
            .or(get)
            .unify()
            .or(result)
            .unify()
            .or(operations)
            .unify()
            .or(health)
            .unify()
            .or(metrics_route)
            .unify()
    }

    /// Serve until `shutdown` resolves
    pub async fn serve<F>(
        self: Arc<Self>,
        addr: SocketAddr,
        shutdown: F,
    ) -> Result<(), ServiceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let routes = self.routes().with(warp::trace::request());

        let (bound, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .map_err(|e| ServiceError::internal_error(format!("failed to bind {addr}: {e}")))?;

        info!("HTTP server listening on {}", bound);
        server.await;
        info!("HTTP server stopped");
        Ok(())
    }

    async fn submit(&self, body: &[u8]) -> Response {
        let request: SubmitRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Rejecting undecodable submission");
                return error_reply(&ServiceError::decode_error(e.to_string()));
            }
        };

        match self.service.submit(&request.expression).await {
            Ok(task_id) => json_reply(&SubmitResponse { task_id }, StatusCode::OK),
            Err(e) => error_reply(&e),
        }
    }

    fn get_task(&self, raw: &str) -> Response {
        match parse_task_id(raw).and_then(|id| self.service.get(id)) {
            Ok(task) => json_reply(&task, StatusCode::OK),
            Err(e) => error_reply(&e),
        }
    }

    fn task_result(&self, raw: &str) -> Response {
        let outcome = match parse_task_id(raw).and_then(|id| self.service.result(id)) {
            Ok(outcome) => outcome,
            Err(e) => return error_reply(&e),
        };

        match outcome {
            TaskOutcome::Completed(result) => {
                json_reply(&ResultResponse { result }, StatusCode::OK)
            }
            TaskOutcome::Pending => json_reply(
                &PendingResponse {
                    status: PENDING_MESSAGE,
                },
                StatusCode::ACCEPTED,
            ),
            TaskOutcome::Failed(failure) => json_reply(
                &FailedResponse {
                    status: "Task failed",
                    error: failure.to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        }
    }

    fn health(&self) -> Response {
        let report = HealthReport::collect(
            &self.pool,
            self.service.queue(),
            self.service.registry(),
        );
        let status = if report.is_serving() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        json_reply(&report, status)
    }
}

fn with_api(
    api: &Arc<HttpApi>,
) -> impl Filter<Extract = (Arc<HttpApi>,), Error = Infallible> + Clone {
    let api = Arc::clone(api);
    warp::any().map(move || Arc::clone(&api))
}

fn parse_task_id(raw: &str) -> Result<TaskId, ServiceError> {
    raw.parse::<TaskId>()
        .map_err(|_| ServiceError::invalid_task_id(raw))
}

fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

fn error_reply(err: &ServiceError) -> Response {
    json_reply(
        &ErrorResponse {
            error: err.to_string(),
            kind: err.kind(),
        },
        err.status_code(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_id() {
        assert_eq!(parse_task_id("12").unwrap(), 12);
        assert!(matches!(
            parse_task_id("abc"),
            Err(ServiceError::InvalidTaskId { .. })
        ));
        assert!(parse_task_id("-1").is_err());
        assert!(parse_task_id("").is_err());
    }

    #[test]
    fn test_error_reply_status() {
        let response = error_reply(&ServiceError::NotFound { id: 5 });
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
