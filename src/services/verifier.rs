// src/services/verifier.rs
//! Verification Service.
//!
//! Answers "is this credential genuine and still valid?" for any caller
//! holding a verification fingerprint. The fingerprint is used purely as
//! a lookup key; validity is derived from the stored status and expiry
//! against the injected clock, never written back.

use crate::models::certificate::CertificateSummary;
use crate::models::enrollment::EnrollmentDirectory;
use crate::storage::certificate_store::{CertificateStore, StoreError};
use crate::utils::clock::Clock;
use std::sync::Arc;

/// Outcome of a verification lookup.
///
/// `NotFound` (unknown token) is deliberately distinguishable from
/// `Known` with `valid: false` (the credential existed but is revoked or
/// expired); a checker must be able to tell the two apart.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    NotFound,
    Known {
        valid: bool,
        certificate: CertificateSummary,
    },
}

pub struct VerificationService {
    store: Arc<dyn CertificateStore>,
    enrollments: Arc<dyn EnrollmentDirectory>,
    clock: Arc<dyn Clock>,
}

impl VerificationService {
    pub fn new(
        store: Arc<dyn CertificateStore>,
        enrollments: Arc<dyn EnrollmentDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            enrollments,
            clock,
        }
    }

    /// Resolves a fingerprint to its verification outcome.
    ///
    /// Only the minimal public projection leaves this method; internal
    /// ids never do. Revoked and expired certificates come back as
    /// `Known` with `valid: false` and the stored status unchanged.
    pub async fn verify(&self, hash: &str) -> Result<VerificationOutcome, StoreError> {
        let certificate = match self.store.find_by_hash(hash)? {
            Some(certificate) => certificate,
            None => return Ok(VerificationOutcome::NotFound),
        };

        // Display data comes from the enrollment collaborator; a record
        // orphaned there still verifies, with placeholder names.
        let (student_name, course_name) = self
            .enrollments
            .find(&certificate.student_id, &certificate.course_id)
            .map(|e| (e.student_name, e.course_title))
            .unwrap_or_else(|| ("Unknown student".into(), "Unknown course".into()));

        let valid = certificate.is_valid_at(self.clock.now());
        Ok(VerificationOutcome::Known {
            valid,
            certificate: CertificateSummary {
                number: certificate.certificate_number,
                student_name,
                course_name,
                issued_at: certificate.issued_at,
                status: certificate.status,
            },
        })
    }
}
