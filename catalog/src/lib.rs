//! Core library for the message catalog.
//!
//! Holds the value types (domains, key messages, languages), the repository
//! ports, the services built on top of them and the admin view-state models.
//! Storage and HTTP concerns live in the adapter and app crates.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A BCP 47-shaped language tag such as `en`, `fr` or `zh-Hant`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        let mut subtags = val.split('-');
        let primary = subtags.next().unwrap_or_default();
        if !(matches!(primary.len(), 2..=3 | 5..=8)
            && primary.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(CoreError::InvalidLanguageTag(val));
        }
        if !subtags.all(|sub| {
            (1..=8).contains(&sub.len()) && sub.chars().all(|c| c.is_ascii_alphanumeric())
        }) {
            return Err(CoreError::InvalidLanguageTag(val));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LanguageTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LanguageTag {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.0
    }
}

/// A localization project.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Absent until the domain has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    /// An empty string reads as no default.
    #[serde(default, deserialize_with = "empty_tag_as_none")]
    pub default_language_tag: Option<LanguageTag>,
    #[serde(default)]
    pub supported_language_tags: Vec<LanguageTag>,
}

impl Domain {
    pub fn new<S: Into<String>>(code: S, description: S) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn supports(&self, tag: &LanguageTag) -> bool {
        self.supported_language_tags.contains(tag)
    }
}

fn empty_tag_as_none<'de, D>(deserializer: D) -> Result<Option<LanguageTag>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.is_empty() => LanguageTag::new(s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// A single translation entry of a domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub domain_id: String,
    pub key: String,
    pub language_tag: LanguageTag,
    pub content: String,
}

/// A language known to the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: LanguageTag,
    pub label: String,
    pub english_label: String,
}

/// Filter for key message lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageQuery {
    pub domain_id: String,
    pub language_tag: LanguageTag,
    /// Exact key match.
    pub key: Option<String>,
    /// Case-insensitive substring match on the content.
    pub content: Option<String>,
}

impl MessageQuery {
    pub fn new<S: Into<String>>(domain_id: S, language_tag: LanguageTag) -> Self {
        Self {
            domain_id: domain_id.into(),
            language_tag,
            key: None,
            content: None,
        }
    }

    pub fn with_key<S: Into<String>>(mut self, key: S) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn matches(&self, message: &KeyMessage) -> bool {
        if message.domain_id != self.domain_id || message.language_tag != self.language_tag {
            return false;
        }
        if let Some(ref key) = self.key {
            if &message.key != key {
                return false;
            }
        }
        if let Some(ref content) = self.content {
            if !message
                .content
                .to_lowercase()
                .contains(&content.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// A single rejected field with a stable error code such as
/// `domain.code.required`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: &'static str,
}

/// Identifier generator used when persisting new records.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Repository port for domains.
pub trait DomainRepository: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<Domain>, CoreError>;
    fn find_by_code(&self, code: &str) -> Result<Option<Domain>, CoreError>;
    /// All domains ordered by code.
    fn list(&self) -> Result<Vec<Domain>, CoreError>;
    /// Insert a domain whose id is already assigned.
    fn insert(&self, domain: Domain) -> Result<(), CoreError>;
    fn update(&self, domain: &Domain) -> Result<(), CoreError>;
    fn delete(&self, id: &str) -> Result<(), CoreError>;
    /// Whether any domain lists the tag as supported or default.
    fn is_language_used(&self, tag: &LanguageTag) -> Result<bool, CoreError>;
}

/// Repository port for key messages.
pub trait KeyMessageRepository: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<KeyMessage>, CoreError>;
    /// Matching messages ordered by key, then id.
    fn find(&self, query: &MessageQuery) -> Result<Vec<KeyMessage>, CoreError>;
    fn find_one(
        &self,
        domain_id: &str,
        key: &str,
        language_tag: &LanguageTag,
    ) -> Result<Option<KeyMessage>, CoreError>;
    fn insert(&self, message: KeyMessage) -> Result<(), CoreError>;
    fn update(&self, message: &KeyMessage) -> Result<(), CoreError>;
    fn delete(&self, id: &str) -> Result<(), CoreError>;
    /// Remove every message of a domain, returning how many were removed.
    fn delete_by_domain(&self, domain_id: &str) -> Result<usize, CoreError>;
}

/// Repository port for the language catalog.
pub trait LanguageRepository: Send + Sync {
    /// Languages in catalog (insertion) order.
    fn list(&self) -> Result<Vec<Language>, CoreError>;
    fn get(&self, code: &LanguageTag) -> Result<Option<Language>, CoreError>;
    fn insert(&self, language: Language) -> Result<(), CoreError>;
    fn delete(&self, code: &LanguageTag) -> Result<(), CoreError>;
}

impl<T: DomainRepository + ?Sized> DomainRepository for Arc<T> {
    fn get(&self, id: &str) -> Result<Option<Domain>, CoreError> {
        (**self).get(id)
    }
    fn find_by_code(&self, code: &str) -> Result<Option<Domain>, CoreError> {
        (**self).find_by_code(code)
    }
    fn list(&self) -> Result<Vec<Domain>, CoreError> {
        (**self).list()
    }
    fn insert(&self, domain: Domain) -> Result<(), CoreError> {
        (**self).insert(domain)
    }
    fn update(&self, domain: &Domain) -> Result<(), CoreError> {
        (**self).update(domain)
    }
    fn delete(&self, id: &str) -> Result<(), CoreError> {
        (**self).delete(id)
    }
    fn is_language_used(&self, tag: &LanguageTag) -> Result<bool, CoreError> {
        (**self).is_language_used(tag)
    }
}

impl<T: KeyMessageRepository + ?Sized> KeyMessageRepository for Arc<T> {
    fn get(&self, id: &str) -> Result<Option<KeyMessage>, CoreError> {
        (**self).get(id)
    }
    fn find(&self, query: &MessageQuery) -> Result<Vec<KeyMessage>, CoreError> {
        (**self).find(query)
    }
    fn find_one(
        &self,
        domain_id: &str,
        key: &str,
        language_tag: &LanguageTag,
    ) -> Result<Option<KeyMessage>, CoreError> {
        (**self).find_one(domain_id, key, language_tag)
    }
    fn insert(&self, message: KeyMessage) -> Result<(), CoreError> {
        (**self).insert(message)
    }
    fn update(&self, message: &KeyMessage) -> Result<(), CoreError> {
        (**self).update(message)
    }
    fn delete(&self, id: &str) -> Result<(), CoreError> {
        (**self).delete(id)
    }
    fn delete_by_domain(&self, domain_id: &str) -> Result<usize, CoreError> {
        (**self).delete_by_domain(domain_id)
    }
}

impl<T: LanguageRepository + ?Sized> LanguageRepository for Arc<T> {
    fn list(&self) -> Result<Vec<Language>, CoreError> {
        (**self).list()
    }
    fn get(&self, code: &LanguageTag) -> Result<Option<Language>, CoreError> {
        (**self).get(code)
    }
    fn insert(&self, language: Language) -> Result<(), CoreError> {
        (**self).insert(language)
    }
    fn delete(&self, code: &LanguageTag) -> Result<(), CoreError> {
        (**self).delete(code)
    }
}

impl<T: IdGenerator + ?Sized> IdGenerator for Arc<T> {
    fn next_id(&self) -> String {
        (**self).next_id()
    }
}

/// Core errors shared by services and adapters.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid language tag: {0}")]
    InvalidLanguageTag(String),
    #[error("validation failed: {}", join_codes(.0))]
    Validation(Vec<FieldError>),
    #[error("not found")]
    NotFound,
    #[error("resource already exists")]
    AlreadyExists,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("repository error: {0}")]
    Repository(String),
}

fn join_codes(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.code)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Return a short about/version line for the binary to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{} - message catalog", pkg, ver)
}

pub mod adapters;
pub mod admin;
pub mod id;
pub mod service;
pub mod validate;
