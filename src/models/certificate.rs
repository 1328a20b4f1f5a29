// src/models/certificate.rs
//! Certificate data model.
//!
//! Defines the credential record owned by this engine, its lifecycle
//! status, and the minimal public projection returned to third-party
//! verifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a certificate.
///
/// `Expired` is a derived state: the engine never writes it, it is
/// computed at verification time from `expires_at`. It exists in the
/// enum so a store backend may cache the derived state if it chooses.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    Issued,
    Revoked,
    Expired,
}

/// A persisted course-completion certificate.
///
/// Created exactly once by the issuance coordinator after an eligibility
/// check; read-only thereafter except for the explicit revocation
/// transition `Issued -> Revoked`, which is handled outside this engine.
///
/// # Uniqueness
/// - At most one `Issued` record may exist per (student_id, course_id)
///   pair at any time.
/// - `certificate_number` and `verification_hash` are unique across the
///   entire store for all time, revoked and expired records included.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Opaque store-assigned identifier. Never exposed through the
    /// verification path.
    pub id: String,

    /// Reference to the external student record.
    pub student_id: String,

    /// Reference to the external course record.
    pub course_id: String,

    /// Human-readable identifier, e.g. `CERT-1736467200000-stu-4f2a`.
    /// Immutable once set.
    pub certificate_number: String,

    /// 64-character lowercase hex fingerprint. The sole external lookup
    /// key for verification, computed once at issuance and stored
    /// verbatim; never recomputed.
    pub verification_hash: String,

    /// Stored lifecycle status.
    pub status: CertificateStatus,

    /// Issuance timestamp, fixed at creation.
    pub issued_at: DateTime<Utc>,

    /// Optional expiry; `None` means the certificate never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Certificate {
    /// Derived validity at the given instant: issued and not past expiry.
    ///
    /// The stored status is left untouched; a certificate past its
    /// `expires_at` still reports `status == Issued` while being invalid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CertificateStatus::Issued
            && self.expires_at.map_or(true, |expiry| expiry > now)
    }
}

/// Minimal public projection of a certificate, safe to show to any
/// third party holding the verification fingerprint.
///
/// Deliberately excludes internal ids and the full fingerprint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSummary {
    pub number: String,
    pub student_name: String,
    pub course_name: String,
    pub issued_at: DateTime<Utc>,
    pub status: CertificateStatus,
}
