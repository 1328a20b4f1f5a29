// src/render/mod.rs
//! Document rendering contract.
//!
//! The issuance coordinator hands a persisted certificate to a renderer
//! and gets back a printable artifact plus the scannable verification
//! pointer. Renderers are stateless and idempotent: rendering the same
//! certificate twice yields equivalent content. A rendering failure is
//! never allowed to roll back an already-persisted certificate.

use crate::models::certificate::Certificate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod text;

/// How many fingerprint characters appear in the human-readable
/// verification line on the document.
pub const FINGERPRINT_DISPLAY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer has no verification base URL configured")]
    MissingBaseUrl,
}

/// A rendered credential document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Base64-encoded printable document body.
    pub document: String,
    /// Media type of the decoded document body.
    pub content_type: String,
    /// Payload for the scannable code; must match exactly what the
    /// verification endpoint accepts.
    pub verification_url: String,
}

/// Produces printable artifacts for persisted certificates.
pub trait DocumentRenderer: Send + Sync {
    fn render(
        &self,
        certificate: &Certificate,
        student_name: &str,
        course_title: &str,
    ) -> Result<Artifact, RenderError>;
}
