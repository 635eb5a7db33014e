use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(
        r"\b(?:\+1[-.\s]?)?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})\b"
    )
    .unwrap();
    static ref NATIONAL_ID_REGEX: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap();
    static ref MRN_REGEX: Regex = Regex::new(r"\bMRN[-\s]?\d{4,}\b").unwrap();
}

/// Identifier redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_national_ids: bool,
    pub redact_record_numbers: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_national_ids: true,
            redact_record_numbers: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// Identifier redactor for log text
pub struct PatientRedactor {
    config: RedactionConfig,
}

impl PatientRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        if self.config.redact_phones {
            result = self.redact_phones(&result);
        }

        if self.config.redact_national_ids {
            result = self.redact_national_ids(&result);
        }

        if self.config.redact_record_numbers {
            result = self.redact_record_numbers(&result);
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    /// Stable correlation token for a patient id; the raw id never appears
    /// in log text.
    pub fn correlation_token(&self, patient_id: Uuid) -> String {
        format!("PT[{}]", hash_value(&patient_id.to_string()))
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("EMAIL[{}]", hash_value(&caps[0]))
                } else {
                    "***@***".to_string()
                }
            })
            .to_string()
    }

    fn redact_phones(&self, text: &str) -> String {
        PHONE_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("PHONE[{}]", hash_value(&caps[0]))
                } else {
                    "(***) ***-****".to_string()
                }
            })
            .to_string()
    }

    fn redact_national_ids(&self, text: &str) -> String {
        NATIONAL_ID_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("NID[{}]", hash_value(&caps[0]))
                } else {
                    "***-**-****".to_string()
                }
            })
            .to_string()
    }

    fn redact_record_numbers(&self, text: &str) -> String {
        MRN_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("MRN[{}]", hash_value(&caps[0]))
                } else {
                    "MRN******".to_string()
                }
            })
            .to_string()
    }
}

impl Default for PatientRedactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}

fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    // First 8 bytes keep the token short while staying collision-safe for logs
    general_purpose::STANDARD.encode(&result[..8])
}
