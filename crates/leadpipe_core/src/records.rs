use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Value the enrichment stage writes when no address was found.
pub const NO_EMAIL_SENTINEL: &str = "N/A";

/// One scraped prospect as returned by `GET /api/data/leads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default)]
    pub emails: Option<String>,
}

impl LeadRecord {
    pub fn new(url: impl Into<String>, emails: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            emails: Some(emails.into()),
        }
    }

    /// True when at least one contact address was found.
    pub fn has_qualified_email(&self) -> bool {
        match self.emails.as_deref().map(str::trim) {
            Some(emails) => !emails.is_empty() && emails != NO_EMAIL_SENTINEL,
            None => false,
        }
    }

    /// Individual addresses from the comma-separated `emails` column.
    pub fn email_list(&self) -> Vec<&str> {
        if !self.has_qualified_email() {
            return Vec::new();
        }
        self.emails
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .collect()
    }
}

/// One scored lead as returned by `GET /api/data/forecast`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reason: String,
}

impl ForecastRecord {
    pub fn new(email: impl Into<String>, category: Category, reason: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            category,
            reason: reason.into(),
        }
    }
}

/// Classification label assigned by the scoring service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Category {
    Hot,
    Warm,
    Cold,
    #[default]
    Unknown,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Hot => "hot",
            Category::Warm => "warm",
            Category::Cold => "cold",
            Category::Unknown => "unknown",
            Category::Other(label) => label,
        }
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        match label {
            "hot" => Category::Hot,
            "warm" => Category::Warm,
            "cold" => Category::Cold,
            "unknown" => Category::Unknown,
            other => Category::Other(other.to_string()),
        }
    }
}

impl From<Option<String>> for Category {
    fn from(label: Option<String>) -> Self {
        label.as_deref().map_or(Category::Unknown, Category::from)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Both result collections of a finished run, plus messages for any that failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    pub forecast: Vec<ForecastRecord>,
    pub leads: Vec<LeadRecord>,
    pub warnings: Vec<String>,
}

// pandas serializes missing cells as null.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
