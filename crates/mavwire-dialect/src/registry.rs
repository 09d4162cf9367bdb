use std::sync::Arc;

use tracing::debug;

use crate::builtin;
use crate::dialect::{Dialect, MessageInfo};
use crate::error::{DialectError, Result};

/// Ordered list of dialects consulted for crc-extra resolution.
///
/// Dialects are searched in registration order; when two dialects define the
/// same message id, the one registered first wins.
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    dialects: Vec<Arc<Dialect>>,
}

impl DialectRegistry {
    /// Create a registry seeded with an explicit default dialect.
    pub fn new(default: impl Into<Arc<Dialect>>) -> Self {
        let mut registry = Self::empty();
        registry.register(default);
        registry
    }

    /// Create a registry with no dialects. Every lookup fails until one is registered.
    pub fn empty() -> Self {
        Self {
            dialects: Vec::new(),
        }
    }

    /// Append a dialect to the end of the resolution order.
    pub fn register(&mut self, dialect: impl Into<Arc<Dialect>>) {
        let dialect = dialect.into();
        debug!(
            dialect = dialect.name(),
            messages = dialect.len(),
            position = self.dialects.len(),
            "registered dialect"
        );
        self.dialects.push(dialect);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, dialect: impl Into<Arc<Dialect>>) -> Self {
        self.register(dialect);
        self
    }

    /// Resolve the crc-extra seed for a message id.
    pub fn lookup(&self, id: u8) -> Result<u8> {
        self.resolve(id).map(|info| info.crc_extra)
    }

    /// Resolve the full definition of a message id.
    pub fn resolve(&self, id: u8) -> Result<&MessageInfo> {
        self.origin(id)
            .map(|(_, info)| info)
            .ok_or(DialectError::UnknownMessage(id))
    }

    /// The dialect that wins resolution for `id`, along with its definition.
    pub fn origin(&self, id: u8) -> Option<(&Dialect, &MessageInfo)> {
        self.dialects
            .iter()
            .find_map(|dialect| dialect.get(id).map(|info| (dialect.as_ref(), info)))
    }

    pub fn contains(&self, id: u8) -> bool {
        self.origin(id).is_some()
    }

    /// Registered dialects in resolution order.
    pub fn dialects(&self) -> impl Iterator<Item = &Dialect> {
        self.dialects.iter().map(|dialect| dialect.as_ref())
    }

    /// Every resolvable message id once, in ascending order, with its winning dialect.
    pub fn messages(&self) -> Vec<(&Dialect, &MessageInfo)> {
        (0..=u8::MAX).filter_map(|id| self.origin(id)).collect()
    }

    /// Number of registered dialects.
    pub fn len(&self) -> usize {
        self.dialects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialects.is_empty()
    }
}

impl Default for DialectRegistry {
    /// A registry holding the built-in `common` dialect.
    fn default() -> Self {
        Self::new(builtin::common())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect(name: &str, table: &[(u8, &str, u8)]) -> Dialect {
        Dialect::from_static(name, table)
    }

    #[test]
    fn default_registry_resolves_common_messages() {
        let registry = DialectRegistry::default();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(0).unwrap(), 50);
        assert_eq!(registry.resolve(0).unwrap().name, "HEARTBEAT");
    }

    #[test]
    fn unknown_id_fails() {
        let registry = DialectRegistry::new(dialect("a", &[(1, "ONE", 11)]));
        assert!(matches!(
            registry.lookup(2),
            Err(DialectError::UnknownMessage(2))
        ));
        assert!(!registry.contains(2));
    }

    #[test]
    fn empty_registry_rejects_everything() {
        let registry = DialectRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.lookup(0).is_err());
        assert!(registry.messages().is_empty());
    }

    #[test]
    fn first_registered_dialect_wins_on_collision() {
        let registry = DialectRegistry::new(dialect("first", &[(7, "SEVEN_A", 100)]))
            .with(dialect("second", &[(7, "SEVEN_B", 200), (8, "EIGHT", 80)]));

        assert_eq!(registry.lookup(7).unwrap(), 100);
        assert_eq!(registry.lookup(8).unwrap(), 80);

        let (origin, info) = registry.origin(7).unwrap();
        assert_eq!(origin.name(), "first");
        assert_eq!(info.name, "SEVEN_A");
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut registry = DialectRegistry::empty();
        registry.register(dialect("b", &[(1, "X", 2)]));
        registry.register(dialect("a", &[(1, "X", 1)]));

        let names: Vec<&str> = registry.dialects().map(|d| d.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.lookup(1).unwrap(), 2);
    }

    #[test]
    fn messages_are_deduplicated_across_dialects() {
        let registry = DialectRegistry::new(dialect("a", &[(3, "A3", 1), (1, "A1", 1)]))
            .with(dialect("b", &[(1, "B1", 2), (2, "B2", 2)]));

        let listed: Vec<(&str, u8)> = registry
            .messages()
            .into_iter()
            .map(|(d, m)| (d.name(), m.id))
            .collect();
        assert_eq!(listed, vec![("a", 1), ("b", 2), ("a", 3)]);
    }

    #[test]
    fn shared_dialects_are_not_copied() {
        let common = Arc::new(builtin::common());
        let registry = DialectRegistry::new(Arc::clone(&common));
        let clone = registry.clone();

        assert_eq!(Arc::strong_count(&common), 3);
        assert_eq!(clone.lookup(0).unwrap(), registry.lookup(0).unwrap());
    }
}
