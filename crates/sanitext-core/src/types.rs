//! Shared types for detection, mapping, and recovery

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Categories of sensitive data the pipeline can detect
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Email address
    Email,

    /// Phone number
    Phone,

    /// IPv4 or IPv6 address
    IpAddress,

    /// User-owned filesystem path
    FilePath,

    /// HTTP(S) URL
    Url,

    /// Credit card number
    CreditCard,

    /// Calendar date
    Date,

    /// API key (GitHub, Google, AWS, generic)
    ApiKey,

    /// Access token (JWT, vendor-specific)
    AccessToken,

    /// User-supplied category from a custom pattern document
    Custom(String),
}

impl Category {
    /// All built-in categories, in detection-rule order
    pub const BUILTIN: [Category; 9] = [
        Category::Email,
        Category::Phone,
        Category::IpAddress,
        Category::FilePath,
        Category::Url,
        Category::CreditCard,
        Category::Date,
        Category::ApiKey,
        Category::AccessToken,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Email => "email",
            Category::Phone => "phone",
            Category::IpAddress => "ip_address",
            Category::FilePath => "file_path",
            Category::Url => "url",
            Category::CreditCard => "credit_card",
            Category::Date => "date",
            Category::ApiKey => "api_key",
            Category::AccessToken => "access_token",
            Category::Custom(name) => name,
        }
    }

    /// Whether this id belongs to a built-in category
    pub fn is_builtin_id(id: &str) -> bool {
        Category::BUILTIN.iter().any(|c| c.as_str() == id)
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.as_str() {
            "email" => Category::Email,
            "phone" => Category::Phone,
            "ip_address" => Category::IpAddress,
            "file_path" => Category::FilePath,
            "url" => Category::Url,
            "credit_card" => Category::CreditCard,
            "date" => Category::Date,
            "api_key" => Category::ApiKey,
            "access_token" => Category::AccessToken,
            _ => Category::Custom(s),
        }
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved detection: one non-overlapping span of sensitive text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Category of the detected value
    pub category: Category,

    /// Byte offset where the span starts
    pub start: usize,

    /// Byte offset one past the end of the span
    pub end: usize,

    /// The matched text
    pub text: String,

    /// Id of the rule that produced this detection
    pub rule_id: String,
}

/// One entry in the bidirectional original/substitute table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// The sensitive value as it appeared in the source text
    pub original: String,

    /// The synthetic value written in its place
    pub substitute: String,

    /// Category of the value
    pub category: Category,

    /// How many times the original occurred in the source
    pub occurrences: u32,
}

/// Result of one sanitize operation
#[derive(Debug, Clone)]
pub struct SanitizationResult {
    /// Source text with every detected span replaced
    pub sanitized_text: String,

    /// Mapping entries, in order of first occurrence
    pub entries: Vec<MappingEntry>,

    /// Match counts per category
    pub counts: HashMap<Category, usize>,

    /// Non-fatal detection ambiguity warnings
    pub warnings: Vec<String>,

    /// Wall-clock time spent in the pipeline
    pub elapsed: Duration,
}

/// Outcome of the post-recovery checksum comparison
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityVerdict {
    /// True when the restored text hashes to the stored checksum
    pub passed: bool,

    /// Checksum recorded at sanitize time
    pub expected: String,

    /// Checksum of the restored text
    pub actual: String,
}

impl IntegrityVerdict {
    pub fn passing(checksum: String) -> Self {
        Self {
            passed: true,
            expected: checksum.clone(),
            actual: checksum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_string_round_trip() {
        for category in Category::BUILTIN {
            let s = String::from(category.clone());
            assert_eq!(Category::from(s), category);
        }
    }

    #[test]
    fn unknown_id_becomes_custom() {
        let c = Category::from("employee_id".to_string());
        assert_eq!(c, Category::Custom("employee_id".to_string()));
        assert_eq!(c.as_str(), "employee_id");
    }

    #[test]
    fn category_serde_uses_snake_case_ids() {
        let json = serde_json::to_string(&Category::IpAddress).unwrap();
        assert_eq!(json, "\"ip_address\"");

        let back: Category = serde_json::from_str("\"credit_card\"").unwrap();
        assert_eq!(back, Category::CreditCard);
    }

    #[test]
    fn mapping_entry_serde_round_trip() {
        let entry = MappingEntry {
            original: "alice@example.com".to_string(),
            substitute: "user001@example.com".to_string(),
            category: Category::Email,
            occurrences: 2,
        };

        let json = serde_json::to_string(&entry).unwrap();
        let back: MappingEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
