use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// A `(content type, field name)` pair eligible for geo indexing.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "{}.{}", content_type, field_name)]
pub struct FieldSpec {
    pub content_type: String,
    pub field_name: String,
}

impl FieldSpec {
    pub fn new(content_type: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            field_name: field_name.into(),
        }
    }
}

/// Source of the currently registered geo fields.
///
/// Consulted on every event and every query; implementations must not
/// assume the set stays the same between calls.
pub trait FieldRegistry: Send + Sync {
    /// Snapshot of the active field specs.
    fn field_specs(&self) -> Vec<FieldSpec>;

    fn is_indexed(&self, content_type: &str, field_name: &str) -> bool {
        self.field_specs()
            .iter()
            .any(|spec| spec.content_type == content_type && spec.field_name == field_name)
    }

    /// Whether any content type registers `field_name`.
    fn has_field(&self, field_name: &str) -> bool {
        self.field_specs()
            .iter()
            .any(|spec| spec.field_name == field_name)
    }
}

impl<T: FieldRegistry + ?Sized> FieldRegistry for Arc<T> {
    fn field_specs(&self) -> Vec<FieldSpec> {
        (**self).field_specs()
    }
}

/// In-memory registry whose contents can be swapped at runtime.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    specs: RwLock<Vec<FieldSpec>>,
}

impl StaticRegistry {
    pub fn new(specs: Vec<FieldSpec>) -> Self {
        Self {
            specs: RwLock::new(specs),
        }
    }

    /// Replace the whole registered set.
    pub fn replace(&self, specs: Vec<FieldSpec>) {
        let mut guard = self.specs.write().unwrap_or_else(|e| e.into_inner());
        *guard = specs;
    }

    pub fn register(&self, spec: FieldSpec) {
        let mut guard = self.specs.write().unwrap_or_else(|e| e.into_inner());
        if !guard.contains(&spec) {
            guard.push(spec);
        }
    }

    pub fn unregister(&self, content_type: &str, field_name: &str) {
        let mut guard = self.specs.write().unwrap_or_else(|e| e.into_inner());
        guard.retain(|spec| !(spec.content_type == content_type && spec.field_name == field_name));
    }
}

impl FieldRegistry for StaticRegistry {
    fn field_specs(&self) -> Vec<FieldSpec> {
        self.specs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
