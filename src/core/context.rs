//! Per-transformer, per-document collection state.

use serde_json::{Map, Value};

/// Items a transformer collected from one document, plus free-form metadata.
///
/// A fresh context is created for every (transformer, document) pair and is
/// consumed by that transformer's materialization pass.
#[derive(Debug, Clone)]
pub struct CollectionContext<T> {
    collected: Vec<T>,
    meta: Map<String, Value>,
}

impl<T> Default for CollectionContext<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CollectionContext<T> {
    pub fn new() -> Self {
        Self {
            collected: Vec::new(),
            meta: Map::new(),
        }
    }

    /// Append an item; collection order is materialization order.
    pub fn collect(&mut self, item: T) {
        self.collected.push(item);
    }

    pub fn collected(&self) -> &[T] {
        &self.collected
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.meta.insert(key.into(), value.into());
    }

    /// The first collected item, if any.
    pub fn first(&self) -> Option<&T> {
        self.collected.first()
    }

    /// Split into collected items and metadata.
    pub fn into_parts(self) -> (Vec<T>, Map<String, Value>) {
        (self.collected, self.meta)
    }

    pub fn into_items(self) -> Vec<T> {
        self.collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_preserves_order() {
        let mut ctx = CollectionContext::new();
        ctx.collect(3);
        ctx.collect(1);
        ctx.collect(2);

        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.first(), Some(&3));
        assert_eq!(ctx.into_items(), vec![3, 1, 2]);
    }

    #[test]
    fn test_meta() {
        let mut ctx: CollectionContext<u32> = CollectionContext::new();
        assert!(ctx.is_empty());

        ctx.set_meta("rule", "positional");
        let (items, meta) = ctx.into_parts();
        assert!(items.is_empty());
        assert_eq!(meta["rule"], "positional");
    }
}
