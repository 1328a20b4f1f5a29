// src/render/text.rs
//! Plain-text renderer.
//!
//! Default [`DocumentRenderer`]: lays the certificate out as a printable
//! text document carrying the number, recipient name, course title,
//! issuance date, and a truncated fingerprint display. A deployment that
//! wants PDF output implements the same trait against a PDF library; the
//! coordinator does not care which renderer it holds.

use crate::models::certificate::Certificate;
use crate::render::{Artifact, DocumentRenderer, RenderError, FINGERPRINT_DISPLAY_LEN};

pub struct TextRenderer {
    base_url: String,
}

impl TextRenderer {
    /// `base_url` is the public root of the verification endpoint,
    /// e.g. `https://academy.example.org`. Trailing slashes are trimmed
    /// so the embedded URL always has exactly one `/verify/` segment.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn verification_url(&self, certificate: &Certificate) -> String {
        format!("{}/verify/{}", self.base_url, certificate.verification_hash)
    }
}

impl DocumentRenderer for TextRenderer {
    fn render(
        &self,
        certificate: &Certificate,
        student_name: &str,
        course_title: &str,
    ) -> Result<Artifact, RenderError> {
        if self.base_url.is_empty() {
            return Err(RenderError::MissingBaseUrl);
        }

        let displayed_hash: String = certificate
            .verification_hash
            .chars()
            .take(FINGERPRINT_DISPLAY_LEN)
            .collect();

        let body = format!(
            "Certificate of Completion\n\
             \n\
             {}\n\
             Has successfully completed: {}\n\
             \n\
             Date: {}\n\
             Certificate No: {}\n\
             Verification: {}...\n\
             Verify at: {}\n",
            student_name,
            course_title,
            certificate.issued_at.format("%Y-%m-%d"),
            certificate.certificate_number,
            displayed_hash,
            self.verification_url(certificate),
        );

        Ok(Artifact {
            document: base64::encode(body.as_bytes()),
            content_type: "text/plain; charset=utf-8".into(),
            verification_url: self.verification_url(certificate),
        })
    }
}
