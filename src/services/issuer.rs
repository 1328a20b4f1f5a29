// src/services/issuer.rs
//! Issuance Coordinator.
//!
//! Turns a completed enrollment into exactly one persisted certificate:
//! checks eligibility against the enrollment directory, resolves repeat
//! requests to the existing record, and on the fresh path generates the
//! certificate number, computes the verification fingerprint over the
//! exact facts being persisted, and creates the row through the store's
//! atomic constraint check. Document rendering happens after the write
//! and can fail without affecting the persisted certificate.

use crate::models::certificate::{Certificate, CertificateStatus};
use crate::models::enrollment::EnrollmentDirectory;
use crate::render::{Artifact, DocumentRenderer};
use crate::storage::certificate_store::{CertificateStore, NewCertificate, StoreError};
use crate::utils::cert_number;
use crate::utils::clock::Clock;
use crate::utils::hash;
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;

/// Attempts at generating a fresh certificate number when the store
/// rejects one as already taken.
const MAX_CREATE_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum IssueError {
    /// The enrollment is missing or not COMPLETED. User-correctable;
    /// never retried automatically.
    #[error("student {student_id} has not completed course {course_id}")]
    NotEligible {
        student_id: String,
        course_id: String,
    },

    /// The store failed. `StoreError::Unavailable` is transient and safe
    /// for the caller to retry; a `ConstraintViolation` only escapes
    /// here after the bounded regeneration attempts are exhausted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of an issuance request.
#[derive(Debug)]
pub struct Issuance {
    pub certificate: Certificate,
    /// Rendered document, absent when rendering failed. The certificate
    /// itself is durable either way; re-requesting issuance re-renders.
    pub artifact: Option<Artifact>,
    /// True when the request resolved to a previously persisted
    /// certificate instead of creating one.
    pub already_issued: bool,
}

/// Orchestrates eligibility, idempotency, number/hash generation,
/// persistence, and rendering.
pub struct IssuanceCoordinator {
    store: Arc<dyn CertificateStore>,
    enrollments: Arc<dyn EnrollmentDirectory>,
    renderer: Arc<dyn DocumentRenderer>,
    clock: Arc<dyn Clock>,
    /// Validity window applied to new certificates; `None` issues
    /// non-expiring certificates.
    validity: Option<Duration>,
}

impl IssuanceCoordinator {
    pub fn new(
        store: Arc<dyn CertificateStore>,
        enrollments: Arc<dyn EnrollmentDirectory>,
        renderer: Arc<dyn DocumentRenderer>,
        clock: Arc<dyn Clock>,
        validity: Option<Duration>,
    ) -> Self {
        Self {
            store,
            enrollments,
            renderer,
            clock,
            validity,
        }
    }

    /// Issues a certificate for the (student, course) pair, or returns
    /// the existing one.
    ///
    /// Exactly one durable write happens on the fresh path; none on the
    /// idempotent-hit path. `actor_id` is the externally authenticated
    /// caller identity, used only for the audit trail.
    pub async fn issue(
        &self,
        student_id: &str,
        course_id: &str,
        actor_id: &str,
    ) -> Result<Issuance, IssueError> {
        let enrollment = self
            .enrollments
            .find(student_id, course_id)
            .filter(|e| e.is_completed())
            .ok_or_else(|| IssueError::NotEligible {
                student_id: student_id.to_string(),
                course_id: course_id.to_string(),
            })?;

        if let Some(existing) = self.store.find_issued(student_id, course_id)? {
            let artifact = self.render(&existing, &enrollment.student_name, &enrollment.course_title);
            return Ok(Issuance {
                certificate: existing,
                artifact,
                already_issued: true,
            });
        }

        let mut last_conflict: Option<StoreError> = None;
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let issued_at = self.clock.now();
            let number = cert_number::generate(self.clock.as_ref(), student_id);
            // Fingerprint over the exact tuple being persisted; it is
            // stored verbatim and never recomputed after this point.
            let verification_hash = hash::fingerprint(&number, student_id, course_id, issued_at);

            match self.store.create(NewCertificate {
                student_id: student_id.to_string(),
                course_id: course_id.to_string(),
                certificate_number: number,
                verification_hash,
                status: CertificateStatus::Issued,
                issued_at,
                expires_at: self.validity.map(|window| issued_at + window),
            }) {
                Ok(certificate) => {
                    log::info!(
                        target: "audit",
                        "certificate {} issued to student {} for course {} by {}",
                        certificate.certificate_number,
                        student_id,
                        course_id,
                        actor_id,
                    );
                    let artifact =
                        self.render(&certificate, &enrollment.student_name, &enrollment.course_title);
                    return Ok(Issuance {
                        certificate,
                        artifact,
                        already_issued: false,
                    });
                }
                Err(StoreError::ConstraintViolation(reason)) => {
                    // A concurrent request may have won the race for the
                    // pair: resolve to the winner's record. A bare
                    // number/hash collision regenerates and retries.
                    if let Some(winner) = self.store.find_issued(student_id, course_id)? {
                        let artifact =
                            self.render(&winner, &enrollment.student_name, &enrollment.course_title);
                        return Ok(Issuance {
                            certificate: winner,
                            artifact,
                            already_issued: true,
                        });
                    }
                    last_conflict = Some(StoreError::ConstraintViolation(reason));
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(last_conflict
            .unwrap_or_else(|| StoreError::ConstraintViolation("retries exhausted"))
            .into())
    }

    fn render(
        &self,
        certificate: &Certificate,
        student_name: &str,
        course_title: &str,
    ) -> Option<Artifact> {
        match self.renderer.render(certificate, student_name, course_title) {
            Ok(artifact) => Some(artifact),
            Err(err) => {
                log::warn!(
                    "rendering failed for certificate {}: {}",
                    certificate.certificate_number,
                    err
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enrollment::{Enrollment, EnrollmentStatus};
    use crate::render::text::TextRenderer;
    use crate::render::RenderError;
    use crate::storage::memory_enrollments::MemoryEnrollmentDirectory;
    use crate::storage::memory_store::MemoryCertificateStore;
    use crate::utils::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    const BASE_URL: &str = "https://academy.example.org";

    fn enrollment(status: EnrollmentStatus) -> Enrollment {
        Enrollment {
            student_id: "S1".into(),
            course_id: "C1".into(),
            status,
            student_name: "Ada Lovelace".into(),
            course_title: "Rust Fundamentals".into(),
        }
    }

    fn coordinator_with(
        store: Arc<MemoryCertificateStore>,
        directory: Arc<MemoryEnrollmentDirectory>,
    ) -> IssuanceCoordinator {
        IssuanceCoordinator::new(
            store,
            directory,
            Arc::new(TextRenderer::new(BASE_URL)),
            Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap(),
            )),
            None,
        )
    }

    #[tokio::test]
    async fn issues_certificate_for_completed_enrollment() {
        let store = Arc::new(MemoryCertificateStore::new());
        let directory = Arc::new(MemoryEnrollmentDirectory::new());
        directory.upsert(enrollment(EnrollmentStatus::Completed));
        let coordinator = coordinator_with(store.clone(), directory);

        let issuance = coordinator.issue("S1", "C1", "S1").await.unwrap();
        assert!(!issuance.already_issued);
        assert_eq!(issuance.certificate.certificate_number, "CERT-1736467200000-S1");
        assert_eq!(issuance.certificate.verification_hash.len(), 64);
        assert_eq!(issuance.certificate.status, CertificateStatus::Issued);
        assert!(issuance.certificate.expires_at.is_none());
        assert_eq!(store.count(), 1);

        let artifact = issuance.artifact.unwrap();
        assert_eq!(
            artifact.verification_url,
            format!("{}/verify/{}", BASE_URL, issuance.certificate.verification_hash)
        );
    }

    #[tokio::test]
    async fn repeat_request_returns_existing_certificate_without_a_write() {
        let store = Arc::new(MemoryCertificateStore::new());
        let directory = Arc::new(MemoryEnrollmentDirectory::new());
        directory.upsert(enrollment(EnrollmentStatus::Completed));
        let coordinator = coordinator_with(store.clone(), directory);

        let first = coordinator.issue("S1", "C1", "S1").await.unwrap();
        let second = coordinator.issue("S1", "C1", "S1").await.unwrap();

        assert!(second.already_issued);
        assert_eq!(first.certificate, second.certificate);
        // Idempotent hit still re-renders on demand.
        assert!(second.artifact.is_some());
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn missing_enrollment_is_not_eligible_and_writes_nothing() {
        let store = Arc::new(MemoryCertificateStore::new());
        let directory = Arc::new(MemoryEnrollmentDirectory::new());
        let coordinator = coordinator_with(store.clone(), directory);

        let err = coordinator.issue("S1", "C1", "S1").await.unwrap_err();
        assert!(matches!(err, IssueError::NotEligible { .. }));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn incomplete_enrollment_is_not_eligible() {
        let store = Arc::new(MemoryCertificateStore::new());
        let directory = Arc::new(MemoryEnrollmentDirectory::new());
        directory.upsert(enrollment(EnrollmentStatus::InProgress));
        let coordinator = coordinator_with(store.clone(), directory);

        let err = coordinator.issue("S1", "C1", "S1").await.unwrap_err();
        assert!(matches!(err, IssueError::NotEligible { .. }));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn concurrent_double_submit_converges_on_one_certificate() {
        let store = Arc::new(MemoryCertificateStore::new());
        let directory = Arc::new(MemoryEnrollmentDirectory::new());
        directory.upsert(enrollment(EnrollmentStatus::Completed));
        let coordinator = Arc::new(coordinator_with(store.clone(), directory));

        let a = {
            let c = coordinator.clone();
            tokio::spawn(async move { c.issue("S1", "C1", "S1").await })
        };
        let b = {
            let c = coordinator.clone();
            tokio::spawn(async move { c.issue("S1", "C1", "S1").await })
        };

        let first = a.await.unwrap().unwrap();
        let second = b.await.unwrap().unwrap();

        assert_eq!(store.count(), 1);
        assert_eq!(
            first.certificate.certificate_number,
            second.certificate.certificate_number
        );
        assert_eq!(
            first.certificate.verification_hash,
            second.certificate.verification_hash
        );
    }

    #[tokio::test]
    async fn validity_window_sets_expiry_from_issuance_time() {
        let store = Arc::new(MemoryCertificateStore::new());
        let directory = Arc::new(MemoryEnrollmentDirectory::new());
        directory.upsert(enrollment(EnrollmentStatus::Completed));
        let issued_at = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let coordinator = IssuanceCoordinator::new(
            store,
            directory,
            Arc::new(TextRenderer::new(BASE_URL)),
            Arc::new(FixedClock(issued_at)),
            Some(Duration::days(365)),
        );

        let issuance = coordinator.issue("S1", "C1", "S1").await.unwrap();
        assert_eq!(
            issuance.certificate.expires_at,
            Some(issued_at + Duration::days(365))
        );
    }

    struct FailingRenderer;

    impl DocumentRenderer for FailingRenderer {
        fn render(
            &self,
            _certificate: &Certificate,
            _student_name: &str,
            _course_title: &str,
        ) -> Result<Artifact, RenderError> {
            Err(RenderError::MissingBaseUrl)
        }
    }

    #[tokio::test]
    async fn render_failure_does_not_lose_the_persisted_certificate() {
        let store = Arc::new(MemoryCertificateStore::new());
        let directory = Arc::new(MemoryEnrollmentDirectory::new());
        directory.upsert(enrollment(EnrollmentStatus::Completed));
        let coordinator = IssuanceCoordinator::new(
            store.clone(),
            directory,
            Arc::new(FailingRenderer),
            Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap(),
            )),
            None,
        );

        let issuance = coordinator.issue("S1", "C1", "S1").await.unwrap();
        assert!(issuance.artifact.is_none());
        assert_eq!(store.count(), 1);
        assert!(store.find_issued("S1", "C1").unwrap().is_some());
    }

    /// Store whose first `create` loses an insert race: a competing
    /// request's row lands just before ours, so the write comes back as
    /// a constraint violation with the winner already persisted.
    struct LosesRaceStore {
        inner: MemoryCertificateStore,
        raced: std::sync::Mutex<bool>,
    }

    impl LosesRaceStore {
        fn new() -> Self {
            Self {
                inner: MemoryCertificateStore::new(),
                raced: std::sync::Mutex::new(false),
            }
        }
    }

    impl CertificateStore for LosesRaceStore {
        fn find_issued(
            &self,
            student_id: &str,
            course_id: &str,
        ) -> Result<Option<Certificate>, StoreError> {
            self.inner.find_issued(student_id, course_id)
        }

        fn find_by_hash(&self, hash: &str) -> Result<Option<Certificate>, StoreError> {
            self.inner.find_by_hash(hash)
        }

        fn create(&self, certificate: NewCertificate) -> Result<Certificate, StoreError> {
            let mut raced = self.raced.lock().unwrap();
            if !*raced {
                *raced = true;
                self.inner
                    .create(NewCertificate {
                        certificate_number: "CERT-1736467199999-S1".into(),
                        verification_hash: "ee".repeat(32),
                        ..certificate
                    })
                    .unwrap();
                return Err(StoreError::ConstraintViolation(
                    "an ISSUED certificate already exists for this student and course",
                ));
            }
            self.inner.create(certificate)
        }
    }

    #[tokio::test]
    async fn lost_insert_race_resolves_to_the_winning_certificate() {
        let store = Arc::new(LosesRaceStore::new());
        let directory = Arc::new(MemoryEnrollmentDirectory::new());
        directory.upsert(enrollment(EnrollmentStatus::Completed));
        let coordinator = IssuanceCoordinator::new(
            store.clone(),
            directory,
            Arc::new(TextRenderer::new(BASE_URL)),
            Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap(),
            )),
            None,
        );

        let issuance = coordinator.issue("S1", "C1", "S1").await.unwrap();

        // The caller sees the winner's record as an idempotent hit, not
        // an error, and no second row exists.
        assert!(issuance.already_issued);
        assert_eq!(
            issuance.certificate.certificate_number,
            "CERT-1736467199999-S1"
        );
        assert_eq!(issuance.certificate.verification_hash, "ee".repeat(32));
        assert_eq!(store.inner.count(), 1);
    }

    /// Store where every insert collides on the certificate number and
    /// no winning row for the pair ever appears.
    struct SaturatedStore {
        attempts: std::sync::Mutex<u32>,
    }

    impl CertificateStore for SaturatedStore {
        fn find_issued(
            &self,
            _student_id: &str,
            _course_id: &str,
        ) -> Result<Option<Certificate>, StoreError> {
            Ok(None)
        }

        fn find_by_hash(&self, _hash: &str) -> Result<Option<Certificate>, StoreError> {
            Ok(None)
        }

        fn create(&self, _certificate: NewCertificate) -> Result<Certificate, StoreError> {
            *self.attempts.lock().unwrap() += 1;
            Err(StoreError::ConstraintViolation("certificate number already taken"))
        }
    }

    #[tokio::test]
    async fn exhausted_regeneration_surfaces_the_conflict_after_three_attempts() {
        let store = Arc::new(SaturatedStore {
            attempts: std::sync::Mutex::new(0),
        });
        let directory = Arc::new(MemoryEnrollmentDirectory::new());
        directory.upsert(enrollment(EnrollmentStatus::Completed));
        let coordinator = IssuanceCoordinator::new(
            store.clone(),
            directory,
            Arc::new(TextRenderer::new(BASE_URL)),
            Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap(),
            )),
            None,
        );

        let err = coordinator.issue("S1", "C1", "S1").await.unwrap_err();
        assert!(matches!(
            err,
            IssueError::Store(StoreError::ConstraintViolation(_))
        ));
        assert_eq!(*store.attempts.lock().unwrap(), 3);
    }
}
