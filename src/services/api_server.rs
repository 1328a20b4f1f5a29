// src/services/api_server.rs
//! HTTP surface for the certificate engine.
//!
//! Built with Axum. Two endpoints:
//! - `POST /certificates`: issue (or idempotently return) a certificate
//!   for a completed enrollment; the actor identity arrives in the
//!   `x-user-id` header, resolved by the authentication layer upstream.
//! - `GET /verify/:hash`: public verification by fingerprint.

use crate::services::issuer::{IssuanceCoordinator, IssueError};
use crate::services::verifier::{VerificationOutcome, VerificationService};
use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

/// Request payload for issuing a certificate
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCertificateRequest {
    student_id: String,
    course_id: String,
}

/// API server state containing the two engine services
pub struct ApiServer {
    /// Coordinator for certificate issuance
    issuer: Arc<IssuanceCoordinator>,

    /// Service for public verification lookups
    verifier: Arc<VerificationService>,
}

impl ApiServer {
    pub fn new(issuer: IssuanceCoordinator, verifier: VerificationService) -> Self {
        ApiServer {
            issuer: Arc::new(issuer),
            verifier: Arc::new(verifier),
        }
    }

    /// Builds the route table. Split from `run` so tests can drive the
    /// router directly without binding a socket.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/certificates", post(Self::issue_certificate_handler))
            .route("/verify/:hash", get(Self::verify_certificate_handler))
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        axum::serve(listener, app).await.unwrap();
    }

    /// Issues a certificate for a completed enrollment
    ///
    /// # Endpoint
    /// POST /certificates
    ///
    /// # Responses
    /// - 200 OK: certificate plus rendered artifact (artifact may be
    ///   null if rendering failed; the certificate is durable either way)
    /// - 400 Bad Request: enrollment missing or not completed
    /// - 401 Unauthorized: no actor identity header
    /// - 503 Service Unavailable: store unreachable, caller may retry
    async fn issue_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        Json(payload): Json<IssueCertificateRequest>,
    ) -> Response {
        let actor_id = match headers.get("x-user-id").and_then(|v| v.to_str().ok()) {
            Some(actor) if !actor.is_empty() => actor.to_string(),
            _ => {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Missing actor identity" })),
                )
                    .into_response()
            }
        };

        match state
            .issuer
            .issue(&payload.student_id, &payload.course_id, &actor_id)
            .await
        {
            Ok(issuance) => (
                StatusCode::OK,
                Json(json!({
                    "certificate": issuance.certificate,
                    "artifact": issuance.artifact,
                    "alreadyIssued": issuance.already_issued,
                })),
            )
                .into_response(),
            Err(IssueError::NotEligible { .. }) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Course not completed" })),
            )
                .into_response(),
            Err(IssueError::Store(err)) => {
                log::error!("certificate issuance failed: {}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "Certificate store unavailable, retry later" })),
                )
                    .into_response()
            }
        }
    }

    /// Verifies a certificate by its fingerprint
    ///
    /// # Endpoint
    /// GET /verify/:hash
    ///
    /// # Responses
    /// - 200 OK: known fingerprint; `valid` reflects derived validity
    ///   and `certificate` carries the minimal public projection
    /// - 404 Not Found: unknown fingerprint, no projection
    /// - 500 Internal Server Error: store lookup failed
    async fn verify_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        Path(hash): Path<String>,
    ) -> Response {
        match state.verifier.verify(&hash).await {
            Ok(VerificationOutcome::Known { valid, certificate }) => (
                StatusCode::OK,
                Json(json!({ "valid": valid, "certificate": certificate })),
            )
                .into_response(),
            Ok(VerificationOutcome::NotFound) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "valid": false, "error": "Certificate not found" })),
            )
                .into_response(),
            Err(err) => {
                log::error!("certificate verification failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "valid": false, "error": "Verification failed" })),
                )
                    .into_response()
            }
        }
    }
}

// Implement Clone for ApiServer to use with Axum's State
impl Clone for ApiServer {
    fn clone(&self) -> Self {
        ApiServer {
            issuer: Arc::clone(&self.issuer),
            verifier: Arc::clone(&self.verifier),
        }
    }
}
