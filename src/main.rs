// src/main.rs

//! # Certificate Engine - Main Entry Point
//!
//! Wires the certificate issuance and verification engine together and
//! starts the HTTP API.
//!
//! ## Architecture Overview
//! 1. **Storage Layer**: certificate store and enrollment directory
//! 2. **Services Layer**: issuance coordinator, verification service, API
//! 3. **Rendering Layer**: pluggable document renderer for artifacts
//!
//! ## Environment Variables
//! - `BIND_ADDR`: (Optional) socket address to listen on (default 127.0.0.1:3000)
//! - `VERIFY_BASE_URL`: (Optional) public base URL embedded in artifact
//!   verification links (default http://localhost:3000)
//! - `CERT_VALIDITY_DAYS`: (Optional) validity window for new
//!   certificates in days; absent or 0 issues non-expiring certificates
//! - `ENROLLMENT_SEED`: (Optional) path to a JSON array of enrollments
//!   to preload into the in-memory enrollment directory

use crate::models::enrollment::Enrollment;
use crate::render::text::TextRenderer;
use crate::services::api_server::ApiServer;
use crate::services::issuer::IssuanceCoordinator;
use crate::services::verifier::VerificationService;
use crate::storage::memory_enrollments::MemoryEnrollmentDirectory;
use crate::storage::memory_store::MemoryCertificateStore;
use crate::utils::clock::SystemClock;
use anyhow::Context;
use chrono::Duration;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;

mod models;    // Data structures
mod render;    // Document artifact rendering
mod services;  // Business logic and API
mod storage;   // Persistence layer
mod utils;     // Clock, fingerprint codec, number generation

/// Loads enrollment fixtures from a JSON file into the directory.
fn load_enrollment_seed(directory: &MemoryEnrollmentDirectory, path: &str) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read enrollment seed {}", path))?;
    let enrollments: Vec<Enrollment> =
        serde_json::from_str(&raw).context("enrollment seed is not a JSON array of enrollments")?;
    let count = enrollments.len();
    for enrollment in enrollments {
        directory.upsert(enrollment);
    }
    Ok(count)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::init();

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".into())
        .parse()
        .context("BIND_ADDR is not a valid socket address")?;
    let base_url =
        std::env::var("VERIFY_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());
    let validity = match std::env::var("CERT_VALIDITY_DAYS") {
        Ok(days) => {
            let days: i64 = days.parse().context("CERT_VALIDITY_DAYS must be an integer")?;
            (days > 0).then(|| Duration::days(days))
        }
        Err(_) => None,
    };

    // Initialize core components
    let store = Arc::new(MemoryCertificateStore::new());
    let enrollments = Arc::new(MemoryEnrollmentDirectory::new());
    let clock = Arc::new(SystemClock);
    let renderer = Arc::new(TextRenderer::new(base_url.clone()));

    if let Ok(seed_path) = std::env::var("ENROLLMENT_SEED") {
        let count = load_enrollment_seed(&enrollments, &seed_path)?;
        log::info!("loaded {} enrollments from {}", count, seed_path);
    }

    let issuer = IssuanceCoordinator::new(
        store.clone(),
        enrollments.clone(),
        renderer,
        clock.clone(),
        validity,
    );
    let verifier = VerificationService::new(store, enrollments, clock);

    let api_server = ApiServer::new(issuer, verifier);

    log::info!("certificate engine listening on http://{}", addr);
    log::info!("verification links use base URL {}", base_url);

    api_server.run(addr).await;
    Ok(())
}
