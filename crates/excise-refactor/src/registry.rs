//! Ordered delegate registry with first-match dispatch.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use excise_model::{CodeModel, ElementId};

use crate::delegate::SafeDeleteDelegate;
use crate::delegates::{FieldDelegate, MethodDelegate, ParameterDelegate};
use crate::error::SafeDeleteError;
use crate::settings::SettingsKey;

/// Names accepted by [`DelegateRegistry::from_names`], in default order.
pub const BUILTIN_DELEGATES: &[&str] = &[
    ParameterDelegate::NAME,
    MethodDelegate::NAME,
    FieldDelegate::NAME,
];

/// Priority-ordered list of delegates.
#[derive(Clone, Default)]
pub struct DelegateRegistry {
    delegates: Vec<Arc<dyn SafeDeleteDelegate>>,
}

impl DelegateRegistry {
    /// An empty registry: every symbol takes the generic path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in delegates in their default order.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(ParameterDelegate)
            .register(MethodDelegate)
            .register(FieldDelegate);
        registry
    }

    /// Builds a registry from configured delegate names, in the given order.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, SafeDeleteError> {
        let mut registry = Self::new();
        for name in names {
            let delegate = builtin(name.as_ref())
                .ok_or_else(|| SafeDeleteError::UnknownDelegate(name.as_ref().to_string()))?;
            registry.delegates.push(delegate);
        }
        Ok(registry)
    }

    /// Appends a delegate with the lowest priority so far.
    pub fn register(&mut self, delegate: impl SafeDeleteDelegate + 'static) -> &mut Self {
        self.delegates.push(Arc::new(delegate));
        self
    }

    /// Appends an already shared delegate.
    pub fn register_shared(&mut self, delegate: Arc<dyn SafeDeleteDelegate>) -> &mut Self {
        self.delegates.push(delegate);
        self
    }

    /// The first delegate claiming `element`.
    #[must_use]
    pub fn claiming(
        &self,
        model: &dyn CodeModel,
        element: ElementId,
    ) -> Option<&Arc<dyn SafeDeleteDelegate>> {
        let found = self
            .delegates
            .iter()
            .find(|delegate| delegate.handles_element(model, element));
        if let Some(delegate) = found {
            trace!(element = element.0, delegate = delegate.name(), "delegate claims element");
        }
        found
    }

    /// Settings entry used for `element`.
    #[must_use]
    pub fn settings_key(&self, model: &dyn CodeModel, element: ElementId) -> SettingsKey {
        self.claiming(model, element)
            .map_or(SettingsKey::Global, |delegate| {
                SettingsKey::Delegate(delegate.name().into())
            })
    }

    /// All delegates in priority order.
    #[must_use]
    pub fn delegates(&self) -> &[Arc<dyn SafeDeleteDelegate>] {
        &self.delegates
    }

    /// Delegate names in priority order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.delegates.iter().map(|delegate| delegate.name()).collect()
    }

    /// Number of registered delegates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    /// Returns true if no delegate is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl fmt::Debug for DelegateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Looks up a built-in delegate by name.
#[must_use]
pub fn builtin(name: &str) -> Option<Arc<dyn SafeDeleteDelegate>> {
    match name {
        ParameterDelegate::NAME => Some(Arc::new(ParameterDelegate)),
        MethodDelegate::NAME => Some(Arc::new(MethodDelegate)),
        FieldDelegate::NAME => Some(Arc::new(FieldDelegate)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excise_model::WorkspaceBuilder;

    #[test]
    fn defaults_are_ordered() {
        let registry = DelegateRegistry::with_defaults();
        assert_eq!(registry.names(), BUILTIN_DELEGATES.to_vec());
    }

    #[test]
    fn from_names_keeps_configured_order_and_rejects_unknown() {
        let registry = DelegateRegistry::from_names(&["field", "method"]).unwrap();
        assert_eq!(registry.names(), vec!["field", "method"]);

        let err = DelegateRegistry::from_names(&["property"]).unwrap_err();
        assert!(matches!(err, SafeDeleteError::UnknownDelegate(name) if name == "property"));
    }

    #[test]
    fn unclaimed_elements_use_global_settings() {
        let mut b = WorkspaceBuilder::new();
        let file = b.source_file(None, "A.java");
        let class = b.class(file, "A");
        let field = b.field(class, "x");
        let ws = b.finish();

        let registry = DelegateRegistry::with_defaults();
        assert_eq!(registry.settings_key(&ws, class), SettingsKey::Global);
        assert_eq!(
            registry.settings_key(&ws, field),
            SettingsKey::Delegate("field".into())
        );
    }
}
