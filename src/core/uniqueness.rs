//! Slug uniqueness checks against stored content

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::core::errors::{Result, SlugError};

/// Fixed message for blank candidates
pub const EMPTY_SLUG_MESSAGE: &str = "Slug cannot be empty";

/// Message for a slug that collides with an existing entry
pub const TAKEN_SLUG_MESSAGE: &str = "This slug is already taken";

/// One uniqueness question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugQuery {
    /// Candidate slug
    pub slug: String,
    /// Field holding the slug
    #[serde(rename = "key")]
    pub field: String,
    /// Collection uid, e.g. `api::article.article`
    pub collection_identifier: String,
    /// Entry being edited; never collides with itself
    #[serde(default, rename = "id")]
    pub exclude_id: Option<String>,
    /// Only entries of this locale collide
    #[serde(default)]
    pub locale: Option<String>,
}

/// Where a generated slug will be stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugTarget {
    /// Field holding the slug
    #[serde(rename = "key")]
    pub field: String,
    /// Collection uid, e.g. `api::article.article`
    pub collection_identifier: String,
    /// Entry being edited
    #[serde(default, rename = "id")]
    pub exclude_id: Option<String>,
    /// Only entries of this locale collide
    #[serde(default)]
    pub locale: Option<String>,
    /// Field is localized, so slugs carry a `-{locale}` suffix
    #[serde(default)]
    pub localized: bool,
}

impl SlugTarget {
    /// Uniqueness query for `slug` at this target
    pub fn query(&self, slug: impl Into<String>) -> SlugQuery {
        SlugQuery {
            slug: slug.into(),
            field: self.field.clone(),
            collection_identifier: self.collection_identifier.clone(),
            exclude_id: self.exclude_id.clone(),
            locale: self.locale.clone(),
        }
    }
}

/// Answer returned to the interactive input path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Slug can be saved
    pub is_valid: bool,
    /// Reason when invalid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    /// Slug can be used
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    /// Slug is rejected for `message`
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// Content backend that knows which slugs already exist
#[async_trait]
pub trait UniquenessChecker: Send + Sync {
    /// Whether another entry already stores `query.slug`
    async fn exists(&self, query: &SlugQuery) -> Result<bool>;
}

/// Validate a candidate slug. Backend failures surface as
/// [`SlugError::CheckUnavailable`], never as an invalid slug.
pub async fn check_slug(checker: &dyn UniquenessChecker, query: &SlugQuery) -> Result<CheckResult> {
    if query.slug.trim().is_empty() {
        return Ok(CheckResult::invalid(EMPTY_SLUG_MESSAGE));
    }

    match checker.exists(query).await {
        Ok(true) => {
            debug!("Slug '{}' already exists in {}", query.slug, query.collection_identifier);
            Ok(CheckResult::invalid(TAKEN_SLUG_MESSAGE))
        }
        Ok(false) => Ok(CheckResult::valid()),
        Err(e) => {
            warn!("Uniqueness check for '{}' failed: {}", query.slug, e);
            Err(SlugError::CheckUnavailable {
                message: e.to_string(),
            })
        }
    }
}

/// Stored slug of one content entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedSlug {
    /// Collection uid, e.g. `api::article.article`
    pub collection_identifier: String,
    /// Field holding the slug
    #[serde(rename = "key")]
    pub field: String,
    /// Entry id
    pub id: String,
    /// Only entries of this locale collide
    #[serde(default)]
    pub locale: Option<String>,
    /// Candidate slug
    pub slug: String,
}

/// In-memory slug index
#[derive(Debug, Default)]
pub struct SlugIndex {
    entries: RwLock<Vec<IndexedSlug>>,
}

impl SlugIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of [`IndexedSlug`]
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let entries: Vec<IndexedSlug> = serde_json::from_str(&content)?;
        debug!("Loaded {} indexed slugs from {}", entries.len(), path.display());
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    /// Add one stored slug
    pub async fn insert(&self, entry: IndexedSlug) {
        self.entries.write().await.push(entry);
    }

    /// Number of indexed slugs
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl UniquenessChecker for SlugIndex {
    async fn exists(&self, query: &SlugQuery) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.iter().any(|entry| {
            entry.collection_identifier == query.collection_identifier
                && entry.field == query.field
                && entry.slug == query.slug
                && query.exclude_id.as_deref() != Some(entry.id.as_str())
                && match query.locale.as_deref() {
                    Some(locale) => entry.locale.as_deref() == Some(locale),
                    None => true,
                }
        }))
    }
}
