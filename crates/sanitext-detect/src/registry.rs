//! Pattern registry: built-in and user-supplied detection rules
//!
//! The registry is built once per run and handed to the detector read-only.
//! User rules come from a YAML document mapping a category id to its display
//! name, matcher patterns, and replacement template.

use regex::Regex;
use sanitext_core::{Category, Error, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// A single immutable detection rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Stable identifier, unique within the registry
    pub id: String,

    /// Category assigned to matches of this rule
    pub category: Category,

    /// Compiled matcher
    pub matcher: Regex,

    /// Higher priority wins overlap resolution
    pub priority: i32,

    /// Replacement template with a `{counter}` placeholder. Only rules from
    /// a custom document carry one; built-in generation is category-driven.
    pub template: Option<String>,

    /// True when the rule came from a custom pattern document
    pub user_defined: bool,
}

/// One category's entry in a custom pattern document
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomRuleDoc {
    /// Human-readable name shown in previews
    #[serde(rename = "displayName")]
    pub display_name: String,

    /// One or more regex matchers
    pub matchers: Vec<String>,

    /// Replacement template, must contain `{counter}`
    #[serde(rename = "replacementTemplate")]
    pub replacement_template: String,

    /// Overlap-resolution priority (default 50)
    #[serde(default = "default_custom_priority")]
    pub priority: i32,

    /// Must be true to redefine a built-in category
    #[serde(default, rename = "override")]
    pub override_builtin: bool,
}

fn default_custom_priority() -> i32 {
    50
}

/// Immutable set of detection rules for one run
#[derive(Debug)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
}

impl PatternRegistry {
    /// Build a registry from the built-in rules, optionally restricted to a
    /// category subset and extended by a custom pattern document.
    pub fn load(
        custom_doc: Option<&Path>,
        enabled: Option<&HashSet<Category>>,
    ) -> Result<Self> {
        let mut rules = builtin_rules()?;

        let mut overridden: HashSet<Category> = HashSet::new();
        if let Some(path) = custom_doc {
            let custom = Self::parse_custom_document(path)?;
            for rule in &custom {
                if Category::is_builtin_id(rule.category.as_str()) {
                    overridden.insert(rule.category.clone());
                }
            }
            rules.retain(|r| !overridden.contains(&r.category));
            rules.extend(custom);
        }

        if let Some(enabled) = enabled {
            rules.retain(|r| enabled.contains(&r.category));
        }

        info!(rule_count = rules.len(), "pattern registry loaded");
        Ok(Self { rules })
    }

    /// Registry with only the built-in rules
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            rules: builtin_rules()?,
        })
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Templates supplied by the user's pattern document, keyed by category.
    /// These take precedence over built-in dummy generation.
    pub fn user_templates(&self) -> HashMap<Category, String> {
        self.rules
            .iter()
            .filter(|r| r.user_defined)
            .filter_map(|r| {
                r.template
                    .as_ref()
                    .map(|t| (r.category.clone(), t.clone()))
            })
            .collect()
    }

    fn parse_custom_document(path: &Path) -> Result<Vec<PatternRule>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Input(format!("cannot read pattern document: {}", e)))?;

        let doc: HashMap<String, CustomRuleDoc> = serde_yaml::from_str(&contents)
            .map_err(|e| Error::Pattern(format!("invalid pattern document: {}", e)))?;

        let mut rules = Vec::new();
        for (id, entry) in doc {
            let category = Category::from(id.clone());
            if Category::is_builtin_id(&id) && !entry.override_builtin {
                return Err(Error::Pattern(format!(
                    "category '{}' collides with a built-in; set 'override: true' to replace it",
                    id
                )));
            }

            if entry.matchers.is_empty() {
                return Err(Error::Pattern(format!(
                    "category '{}' has no matchers",
                    id
                )));
            }

            if !entry.replacement_template.contains("{counter}") {
                return Err(Error::Pattern(format!(
                    "category '{}' template is missing the {{counter}} placeholder",
                    id
                )));
            }

            for (idx, pattern) in entry.matchers.iter().enumerate() {
                let matcher = Regex::new(pattern).map_err(|e| {
                    Error::Pattern(format!("category '{}' matcher {}: {}", id, idx, e))
                })?;

                rules.push(PatternRule {
                    id: format!("{}_{}", id, idx),
                    category: category.clone(),
                    matcher,
                    priority: entry.priority,
                    template: Some(entry.replacement_template.clone()),
                    user_defined: true,
                });
            }

            debug!(category = %id, matchers = entry.matchers.len(), "loaded custom rules");
        }

        Ok(rules)
    }
}

macro_rules! rule {
    ($id:expr, $category:expr, $priority:expr, $pattern:expr) => {
        PatternRule {
            id: $id.to_string(),
            category: $category,
            matcher: Regex::new($pattern)
                .map_err(|e| Error::Pattern(format!("built-in rule '{}': {}", $id, e)))?,
            priority: $priority,
            template: None,
            user_defined: false,
        }
    };
}

/// The built-in rule set. Priorities: specific credential shapes beat generic
/// ones, URLs beat the emails and paths they may contain.
fn builtin_rules() -> Result<Vec<PatternRule>> {
    Ok(vec![
        // Access tokens
        rule!(
            "access_token_hubspot",
            Category::AccessToken,
            95,
            r"\bpat-[a-z0-9]{2}\d-[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}\b"
        ),
        rule!(
            "access_token_notion",
            Category::AccessToken,
            95,
            r"\bntn_[A-Za-z0-9]{40,50}\b"
        ),
        rule!(
            "access_token_jwt",
            Category::AccessToken,
            95,
            r"\beyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\b"
        ),
        rule!(
            "access_token_generic",
            Category::AccessToken,
            94,
            r"\b[A-Za-z0-9+/]{40,}={0,2}\b"
        ),
        // API keys
        rule!(
            "api_key_github",
            Category::ApiKey,
            90,
            r"\bgh[pousr]_[A-Za-z0-9]{36}\b"
        ),
        rule!(
            "api_key_google",
            Category::ApiKey,
            90,
            r"\bAIza[A-Za-z0-9_-]{35}\b"
        ),
        rule!(
            "api_key_aws",
            Category::ApiKey,
            90,
            r"\bAKIA[A-Z0-9]{16}\b"
        ),
        rule!(
            "api_key_generic",
            Category::ApiKey,
            89,
            r"\b[A-Za-z0-9]{32,64}\b"
        ),
        // URLs
        rule!(
            "url",
            Category::Url,
            85,
            r"https?://[-\w.]+(?::\d+)?(?:/[\w/_.%~-]*)?(?:\?[\w&=%.~-]*)?(?:#[\w.-]*)?"
        ),
        // Emails
        rule!(
            "email",
            Category::Email,
            80,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"
        ),
        // Credit cards (Luhn-guarded)
        rule!(
            "credit_card",
            Category::CreditCard,
            75,
            r"\b(?:\d{4}[-\s]?){3}\d{4,7}\b"
        ),
        // IP addresses
        rule!(
            "ip_v4",
            Category::IpAddress,
            70,
            r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b"
        ),
        rule!(
            "ip_v6",
            Category::IpAddress,
            70,
            r"\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b"
        ),
        // User-owned file paths
        rule!(
            "file_path_unix",
            Category::FilePath,
            60,
            r#"/(?:home|Users)/[^/\s"']+(?:/[^/\s"']+)*"#
        ),
        rule!(
            "file_path_home",
            Category::FilePath,
            60,
            r#"~[/\\](?:[^/\\\s"']+[/\\])*[^/\\\s"']*"#
        ),
        rule!(
            "file_path_windows",
            Category::FilePath,
            60,
            r#"[A-Za-z]:\\(?:Users|Documents)\\(?:[^\\/:*?"<>|\r\n']+\\)*[^\\/:*?"<>|\r\n']*"#
        ),
        // Phone numbers
        rule!(
            "phone_international",
            Category::Phone,
            55,
            r"\+\d{1,3}[-.\s]?\(?\d{1,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4}"
        ),
        rule!(
            "phone_paren",
            Category::Phone,
            55,
            r"\(\d{3}\)\s?\d{3}[-.]?\d{4}"
        ),
        rule!(
            "phone_dashed",
            Category::Phone,
            55,
            r"\b\d{3}[-.]\d{3}[-.]\d{4}\b"
        ),
        // Dates
        rule!(
            "date_slash",
            Category::Date,
            40,
            r"\b\d{1,2}/\d{1,2}/\d{4}\b"
        ),
        rule!(
            "date_dashed",
            Category::Date,
            40,
            r"\b\d{1,2}-\d{1,2}-\d{4}\b"
        ),
        rule!(
            "date_iso",
            Category::Date,
            40,
            r"\b\d{4}-\d{2}-\d{2}\b"
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_registry_loads() {
        let registry = PatternRegistry::builtin().unwrap();
        assert!(!registry.rules().is_empty());
        assert!(registry.user_templates().is_empty());
    }

    #[test]
    fn category_filter_restricts_rules() {
        let enabled: HashSet<Category> =
            [Category::Email, Category::IpAddress].into_iter().collect();
        let registry = PatternRegistry::load(None, Some(&enabled)).unwrap();

        assert!(registry
            .rules()
            .iter()
            .all(|r| enabled.contains(&r.category)));
        assert!(!registry
            .rules()
            .iter()
            .any(|r| r.category == Category::Phone));
    }

    fn write_doc(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn custom_document_adds_rules() {
        let doc = write_doc(
            r#"
employee_id:
  displayName: Employee ID
  matchers:
    - 'EMP-\d{6}'
  replacementTemplate: 'EMP-{counter}'
"#,
        );

        let registry = PatternRegistry::load(Some(doc.path()), None).unwrap();
        let custom = Category::Custom("employee_id".to_string());
        assert!(registry.rules().iter().any(|r| r.category == custom));
        assert_eq!(
            registry.user_templates().get(&custom).map(String::as_str),
            Some("EMP-{counter}")
        );
    }

    #[test]
    fn builtin_collision_requires_override() {
        let doc = write_doc(
            r#"
email:
  displayName: Email
  matchers:
    - '\S+@corp\.internal'
  replacementTemplate: 'user{counter}@corp.internal'
"#,
        );

        let err = PatternRegistry::load(Some(doc.path()), None).unwrap_err();
        assert!(matches!(err, Error::Pattern(_)));
    }

    #[test]
    fn builtin_override_replaces_rules() {
        let doc = write_doc(
            r#"
email:
  displayName: Email
  matchers:
    - '\S+@corp\.internal'
  replacementTemplate: 'user{counter}@corp.internal'
  override: true
"#,
        );

        let registry = PatternRegistry::load(Some(doc.path()), None).unwrap();
        let email_rules: Vec<_> = registry
            .rules()
            .iter()
            .filter(|r| r.category == Category::Email)
            .collect();
        assert_eq!(email_rules.len(), 1);
        assert_eq!(
            email_rules[0].template.as_deref(),
            Some("user{counter}@corp.internal")
        );
    }

    #[test]
    fn malformed_matcher_is_rejected() {
        let doc = write_doc(
            r#"
broken:
  displayName: Broken
  matchers:
    - '([unclosed'
  replacementTemplate: 'X{counter}'
"#,
        );

        let err = PatternRegistry::load(Some(doc.path()), None).unwrap_err();
        assert!(matches!(err, Error::Pattern(_)));
    }

    #[test]
    fn template_without_counter_is_rejected() {
        let doc = write_doc(
            r#"
badtpl:
  displayName: Bad
  matchers:
    - 'X-\d+'
  replacementTemplate: 'static-value'
"#,
        );

        let err = PatternRegistry::load(Some(doc.path()), None).unwrap_err();
        assert!(matches!(err, Error::Pattern(_)));
    }
}
