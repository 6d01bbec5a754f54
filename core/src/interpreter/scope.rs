use super::Value;
use crate::error::RuntimeError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope node. Closures keep their defining scope alive through it.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    constant: bool,
}

/// One lexical scope: its own bindings plus an optional enclosing scope.
///
/// A function defined in a scope and stored in it forms a reference cycle
/// (scope -> function -> captured scope). Such scopes are never freed before
/// the process exits.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Binding>,
    outer: Option<Env>,
}

impl Environment {
    pub fn root() -> Env {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn enclosed(outer: &Env) -> Env {
        tracing::trace!("entering child scope");
        Rc::new(RefCell::new(Self {
            store: HashMap::new(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    /// Looks a name up through the whole scope chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.store.get(name) {
            Some(binding) => Some(binding.value.clone()),
            None => self.outer.as_ref()?.borrow().get(name),
        }
    }

    /// Creates a binding in this scope. Names already bound here cannot be redeclared;
    /// names bound in an outer scope are shadowed.
    pub fn define(&mut self, name: &str, value: Value, constant: bool) -> Result<(), RuntimeError> {
        let span = tracing::debug_span!("define", name = %name, constant);
        let _enter = span.enter();

        if self.store.contains_key(name) {
            return Err(RuntimeError::AlreadyDeclared(name.to_string()));
        }
        self.store
            .insert(name.to_string(), Binding { value, constant });
        Ok(())
    }

    /// Rebinds the nearest existing binding of `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let span = tracing::debug_span!("assign", name = %name);
        let _enter = span.enter();

        match self.store.get_mut(name) {
            Some(binding) if binding.constant => {
                Err(RuntimeError::ConstantAssignment(name.to_string()))
            }
            Some(binding) => {
                binding.value = value;
                Ok(())
            }
            None => match &self.outer {
                Some(outer) => outer.borrow_mut().assign(name, value),
                None => Err(RuntimeError::UndefinedAssignment(name.to_string())),
            },
        }
    }

    /// Bindings of this scope only, sorted by name.
    pub fn bindings(&self) -> Vec<(String, Value, bool)> {
        let mut bindings: Vec<_> = self
            .store
            .iter()
            .map(|(name, binding)| (name.clone(), binding.value.clone(), binding.constant))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }
}
