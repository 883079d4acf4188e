//! Content repository collaborators.
//!
//! The geo index does not own content. It consumes field mutation events
//! through [`FieldObserver`], enumerates stored values through
//! [`ContentRepository`] when rebuilding, and asks the repository to
//! materialize matching items after a search.

pub mod memory;
pub mod seed;

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;

pub use memory::MemoryRepository;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A content item with arbitrary named field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub content_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// A field mutation reported by the repository after it has been stored.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    Written {
        item_id: i64,
        content_type: String,
        field_name: String,
        value: Value,
    },
    Deleted {
        item_id: i64,
        content_type: String,
        field_name: String,
    },
}

impl FieldEvent {
    pub fn item_id(&self) -> i64 {
        match self {
            FieldEvent::Written { item_id, .. } | FieldEvent::Deleted { item_id, .. } => *item_id,
        }
    }
}

/// Receives field mutations synchronously, once per mutation.
pub trait FieldObserver: Send + Sync {
    fn on_event<'a>(&'a self, event: &'a FieldEvent) -> BoxFuture<'a, Result<()>>;
}

/// Criteria the caller already applies to content, independent of geo search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentQuery {
    /// Restrict to these content types; `None` means any type.
    #[serde(default)]
    pub content_types: Option<Vec<String>>,
    /// Case-insensitive title substring.
    #[serde(default)]
    pub title_contains: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ContentQuery {
    pub fn of_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            content_types: Some(types.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        if let Some(types) = &self.content_types {
            if !types.iter().any(|t| t == &item.content_type) {
                return false;
            }
        }
        if let Some(needle) = &self.title_contains {
            if !item.title.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Read access to stored content.
pub trait ContentRepository: Send + Sync {
    /// Every `(item id, raw value)` for items of `content_type` holding `field_name`.
    fn field_values(
        &self,
        content_type: &str,
        field_name: &str,
    ) -> impl Future<Output = Result<Vec<(i64, Value)>>> + Send;

    /// Items among `ids` that satisfy `query`, in the order of `ids`.
    fn fetch_items(
        &self,
        ids: &[i64],
        query: &ContentQuery,
    ) -> impl Future<Output = Result<Vec<ContentItem>>> + Send;
}
