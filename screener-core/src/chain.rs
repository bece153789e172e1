use std::sync::Arc;

use screener_types::{Category, ScreenerError};

use crate::source::SourceAdapter;

/// One adapter in a chain with its priority (lower runs first).
#[derive(Clone)]
pub struct ChainEntry {
    /// The adapter.
    pub adapter: Arc<dyn SourceAdapter>,
    /// Priority; ties keep insertion order.
    pub priority: u32,
}

/// Ordered adapters serving one category.
///
/// Chains are static configuration: built once, then shared read-only by
/// every request.
#[derive(Clone)]
pub struct FallbackChain {
    category: Category,
    entries: Vec<ChainEntry>,
}

impl FallbackChain {
    /// Empty chain for `category`.
    #[must_use]
    pub const fn new(category: Category) -> Self {
        Self {
            category,
            entries: Vec::new(),
        }
    }

    /// Append an adapter with the next priority after the current last entry.
    ///
    /// # Errors
    /// Returns `Unsupported` when the adapter cannot serve the chain's category.
    pub fn with(self, adapter: Arc<dyn SourceAdapter>) -> Result<Self, ScreenerError> {
        let priority = self
            .entries
            .iter()
            .map(|e| e.priority)
            .max()
            .map_or(0, |p| p.saturating_add(1));
        self.with_priority(adapter, priority)
    }

    /// Insert an adapter at an explicit priority.
    ///
    /// # Errors
    /// Returns `Unsupported` when the adapter cannot serve the chain's category.
    pub fn with_priority(
        mut self,
        adapter: Arc<dyn SourceAdapter>,
        priority: u32,
    ) -> Result<Self, ScreenerError> {
        if !adapter.supports(self.category) {
            return Err(ScreenerError::Unsupported {
                adapter: adapter.name().to_string(),
                category: self.category,
            });
        }
        self.entries.push(ChainEntry { adapter, priority });
        // Stable sort keeps registration order among equal priorities.
        self.entries.sort_by_key(|e| e.priority);
        Ok(self)
    }

    /// Category this chain serves.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Entries in invocation order.
    #[must_use]
    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    /// Adapter names in invocation order.
    #[must_use]
    pub fn adapter_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.adapter.name()).collect()
    }

    /// Number of adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no adapter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl core::fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FallbackChain")
            .field("category", &self.category)
            .field(
                "adapters",
                &self
                    .entries
                    .iter()
                    .map(|e| (e.adapter.name(), e.priority))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
