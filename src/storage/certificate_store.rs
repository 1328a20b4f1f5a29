// src/storage/certificate_store.rs
//! Certificate persistence contract.
//!
//! The engine talks to its store through this narrow interface; the
//! issuance coordinator relies on `create` enforcing every uniqueness
//! constraint atomically (equivalent to a serializable check-then-insert)
//! so that concurrent double-submits cannot produce two ISSUED rows.

use crate::models::certificate::{Certificate, CertificateStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by a certificate store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write: an ISSUED row already
    /// exists for the (student, course) pair, or the certificate number
    /// or verification hash is already taken. The coordinator resolves
    /// this internally; it never reaches the caller as a failure.
    #[error("uniqueness constraint violated: {0}")]
    ConstraintViolation(&'static str),

    /// The backend could not be reached or the transaction could not
    /// complete. Transient; safe for the caller to retry.
    #[error("certificate store unavailable: {0}")]
    Unavailable(String),
}

/// Fields of a certificate to be created. The store assigns the opaque
/// id on success.
#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub student_id: String,
    pub course_id: String,
    pub certificate_number: String,
    pub verification_hash: String,
    pub status: CertificateStatus,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Transactional certificate persistence.
pub trait CertificateStore: Send + Sync {
    /// Returns the ISSUED certificate for the pair, if one exists.
    /// Revoked records do not count; a pair may be re-issued after
    /// revocation.
    fn find_issued(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<Certificate>, StoreError>;

    /// Looks a certificate up by its verification fingerprint. This is
    /// the only lookup the public verification path may use.
    fn find_by_hash(&self, hash: &str) -> Result<Option<Certificate>, StoreError>;

    /// Atomically checks every uniqueness constraint and inserts the
    /// record, returning it with its store-assigned id. Exactly one of
    /// two concurrent creates for the same pair succeeds; the loser gets
    /// `ConstraintViolation`.
    fn create(&self, certificate: NewCertificate) -> Result<Certificate, StoreError>;
}
