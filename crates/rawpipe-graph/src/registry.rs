//! Name-based filter construction.
//!
//! The registry maps a filter type name to a constructor. Built-in filters
//! are registered when the global instance is first used; applications may
//! add their own at any time.
//!
//! # Example
//!
//! ```rust
//! use rawpipe_graph::FilterRegistry;
//!
//! let registry = FilterRegistry::global();
//! assert!(registry.contains("Crop"));
//! assert!(registry.create("NoSuchFilter").is_err());
//! ```

use crate::filter::Filter;
use crate::filters;
use crate::{GraphError, GraphResult};
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Creates a filter with default configuration.
pub type FilterConstructor = fn() -> Box<dyn Filter>;

/// Registry entry.
#[derive(Debug, Clone, Copy)]
pub struct FilterInfo {
    /// Type name used by [`FilterNode::new`](crate::FilterNode::new).
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Constructor.
    pub create: FilterConstructor,
}

/// Thread-safe map from type name to constructor.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    filters: RwLock<HashMap<&'static str, FilterInfo>>,
}

impl FilterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Global registry with the built-in filters.
    pub fn global() -> &'static FilterRegistry {
        static INSTANCE: OnceLock<FilterRegistry> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            let registry = FilterRegistry::new();
            registry.register_builtin_filters();
            registry
        })
    }

    fn register_builtin_filters(&self) {
        self.register(FilterInfo {
            name: filters::InputImage16::NAME,
            description: "Root producer holding a 16-bit image",
            create: || Box::new(filters::InputImage16::default()),
        });
        self.register(FilterInfo {
            name: filters::Crop::NAME,
            description: "Crops to a rectangle",
            create: || Box::new(filters::Crop::default()),
        });
        self.register(FilterInfo {
            name: filters::Resample::NAME,
            description: "Scales to a target size",
            create: || Box::new(filters::Resample::default()),
        });
        self.register(FilterInfo {
            name: filters::Cache::NAME,
            description: "Memoises the last upstream responses",
            create: || Box::new(filters::Cache::default()),
        });
        self.register(FilterInfo {
            name: filters::ColorTransformFilter::NAME,
            description: "Premultiplier, matrix, gamma, contrast and tone curve",
            create: || Box::new(filters::ColorTransformFilter::default()),
        });
    }

    /// Adds or replaces a filter type.
    pub fn register(&self, info: FilterInfo) {
        tracing::debug!(name = info.name, "register filter type");
        self.filters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(info.name, info);
    }

    /// Instantiates a filter by type name.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownFilterType`] if no such type is registered.
    pub fn create(&self, name: &str) -> GraphResult<Box<dyn Filter>> {
        let info = self.info(name).ok_or_else(|| GraphError::UnknownFilterType(name.to_string()))?;
        Ok((info.create)())
    }

    /// Entry for `name`.
    pub fn info(&self, name: &str) -> Option<FilterInfo> {
        self.filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.info(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        let reg = FilterRegistry::global();
        assert_eq!(
            reg.names(),
            vec!["Cache", "ColorTransform", "Crop", "InputImage16", "Resample"]
        );
        for name in reg.names() {
            assert_eq!(reg.create(name).unwrap().type_name(), name);
        }
    }

    #[test]
    fn test_unknown() {
        let reg = FilterRegistry::new();
        assert!(matches!(reg.create("Crop"), Err(GraphError::UnknownFilterType(n)) if n == "Crop"));
    }
}
