//! Dummy value generation
//!
//! One monotonically increasing counter per category, for the lifetime of a
//! run. The same original always maps to the same substitute, and no two
//! distinct originals ever share a substitute; collisions are resolved here
//! by incrementing and retrying.

use sanitext_core::Category;
use std::collections::{HashMap, HashSet};

/// Generates format-valid synthetic substitutes per category
#[derive(Debug, Default)]
pub struct DummyGenerator {
    counters: HashMap<Category, u64>,
    by_original: HashMap<String, String>,
    assigned: HashSet<String>,
    user_templates: HashMap<Category, String>,
    source: String,
}

impl DummyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose output honors user-supplied replacement templates.
    /// Templates win over built-in generation for their category.
    pub fn with_templates(user_templates: HashMap<Category, String>) -> Self {
        Self {
            user_templates,
            ..Self::default()
        }
    }

    /// Reject candidates already present verbatim in `text`. Reverse
    /// substitution is a plain string search, so a substitute that collides
    /// with a pre-existing literal would bind both occurrences.
    pub fn for_text(mut self, text: &str) -> Self {
        self.source = text.to_string();
        self
    }

    /// Substitute for `original`, reusing the previous value if this original
    /// was already seen in the run.
    pub fn substitute_for(&mut self, category: &Category, original: &str) -> String {
        if let Some(existing) = self.by_original.get(original) {
            return existing.clone();
        }

        loop {
            let counter = {
                let counter = self.counters.entry(category.clone()).or_insert(0);
                *counter += 1;
                *counter
            };
            let candidate = self.render(category, counter);

            if self.assigned.contains(&candidate) || self.source.contains(&candidate) {
                continue;
            }

            self.assigned.insert(candidate.clone());
            self.by_original
                .insert(original.to_string(), candidate.clone());
            return candidate;
        }
    }

    fn render(&self, category: &Category, counter: u64) -> String {
        if let Some(template) = self.user_templates.get(category) {
            return render_template(template, counter);
        }

        match category {
            Category::Email => format!("user{:03}@example.com", counter),
            Category::Phone => format!("+1-555-{:04}", counter),
            Category::IpAddress => {
                // Spills into higher octets so the value space never wraps
                let n = counter - 1;
                format!("10.{}.{}.{}", n / (254 * 256) % 256, n / 254 % 256, n % 254 + 1)
            }
            Category::FilePath => format!("/home/user{}/file{}.txt", counter, counter),
            Category::Url => format!("https://example{}.com/path", counter),
            Category::CreditCard => dummy_card(counter),
            Category::Date => {
                // Rolls across months and years instead of wrapping
                let n = counter - 1;
                format!("{}-{:02}-{:02}", 2024 + n / 336, n / 28 % 12 + 1, n % 28 + 1)
            }
            Category::ApiKey => {
                format!("DUMMY_API_KEY_{:06}_{}", counter, "a".repeat(32))
            }
            Category::AccessToken => {
                format!("DUMMY_ACCESS_TOKEN_{:06}_{}", counter, "b".repeat(40))
            }
            Category::Custom(name) => {
                format!("DUMMY_{}_{:03}", name.to_uppercase(), counter)
            }
        }
    }
}

fn render_template(template: &str, counter: u64) -> String {
    template.replace("{counter}", &format!("{:03}", counter))
}

/// A Visa-shaped card number that passes the same Luhn test detection uses
fn dummy_card(counter: u64) -> String {
    let body = format!("4000{:011}", counter);
    let digits = format!("{}{}", body, luhn_check_digit(&body));

    digits
        .as_bytes()
        .chunks(4)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("-")
}

fn luhn_check_digit(body: &str) -> u32 {
    let sum: u32 = body
        .chars()
        .filter_map(|c| c.to_digit(10))
        .rev()
        .enumerate()
        .map(|(i, d)| {
            // i counts from the rightmost body digit; the check digit will
            // occupy position 0 overall, so even body indices get doubled
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    (10 - sum % 10) % 10
}
