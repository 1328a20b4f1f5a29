// src/storage/memory_store.rs
//! In-memory certificate store.
//!
//! Reference implementation of [`CertificateStore`]: a single mutex
//! around the record vector makes every `create` a serializable
//! check-then-insert, which is exactly the atomicity the issuance
//! coordinator depends on. A SQL-backed store would express the same
//! constraints as unique indexes.

use crate::models::certificate::{Certificate, CertificateStatus};
use crate::storage::certificate_store::{CertificateStore, NewCertificate, StoreError};
use std::sync::Mutex;

pub struct MemoryCertificateStore {
    records: Mutex<Vec<Certificate>>,
}

impl MemoryCertificateStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Certificate>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".into()))
    }

    fn assign_id() -> String {
        let raw: [u8; 16] = rand::random();
        format!("cert_{}", hex::encode(raw))
    }

    /// Flips a record to REVOKED in place. The revocation workflow lives
    /// outside this engine; tests use this to exercise the
    /// known-but-invalid verification path.
    #[cfg(test)]
    pub fn set_status(&self, id: &str, status: CertificateStatus) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|c| c.id == id) {
            record.status = status;
        }
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl Default for MemoryCertificateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateStore for MemoryCertificateStore {
    fn find_issued(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<Certificate>, StoreError> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .find(|c| {
                c.student_id == student_id
                    && c.course_id == course_id
                    && c.status == CertificateStatus::Issued
            })
            .cloned())
    }

    fn find_by_hash(&self, hash: &str) -> Result<Option<Certificate>, StoreError> {
        let records = self.lock()?;
        Ok(records.iter().find(|c| c.verification_hash == hash).cloned())
    }

    fn create(&self, certificate: NewCertificate) -> Result<Certificate, StoreError> {
        let mut records = self.lock()?;

        // All three constraints are checked under the same guard as the
        // insert, so two racing creates serialize and one loses.
        if records.iter().any(|c| {
            c.student_id == certificate.student_id
                && c.course_id == certificate.course_id
                && c.status == CertificateStatus::Issued
        }) {
            return Err(StoreError::ConstraintViolation(
                "an ISSUED certificate already exists for this student and course",
            ));
        }
        if records
            .iter()
            .any(|c| c.certificate_number == certificate.certificate_number)
        {
            return Err(StoreError::ConstraintViolation(
                "certificate number already taken",
            ));
        }
        if records
            .iter()
            .any(|c| c.verification_hash == certificate.verification_hash)
        {
            return Err(StoreError::ConstraintViolation(
                "verification hash already taken",
            ));
        }

        let record = Certificate {
            id: Self::assign_id(),
            student_id: certificate.student_id,
            course_id: certificate.course_id,
            certificate_number: certificate.certificate_number,
            verification_hash: certificate.verification_hash,
            status: certificate.status,
            issued_at: certificate.issued_at,
            expires_at: certificate.expires_at,
        };
        records.push(record.clone());
        Ok(record)
    }
}
