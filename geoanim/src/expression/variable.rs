use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Source of a variable's value, queried only when the variable is evaluated.
pub trait ValueSupplier: Send + Sync {
    fn supply(&self) -> f64;
}

impl<F> ValueSupplier for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn supply(&self) -> f64 {
        self()
    }
}

struct ConstantSupplier(f64);

impl ValueSupplier for ConstantSupplier {
    fn supply(&self) -> f64 {
        self.0
    }
}

/// A named, rebindable value. Expression trees hold it behind an `Arc`, so a rebind is
/// seen by every tree built against the same variable.
pub struct Variable {
    name: String,
    supplier: RwLock<Arc<dyn ValueSupplier>>,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            supplier: RwLock::new(Arc::new(ConstantSupplier(value))),
        }
    }

    pub fn lazy(name: impl Into<String>, supplier: impl ValueSupplier + 'static) -> Self {
        Self {
            name: name.into(),
            supplier: RwLock::new(Arc::new(supplier)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&self, value: f64) {
        self.rebind(Arc::new(ConstantSupplier(value)));
    }

    pub fn set_supplier(&self, supplier: impl ValueSupplier + 'static) {
        self.rebind(Arc::new(supplier));
    }

    pub fn get(&self) -> f64 {
        // Release the lock before supplying: a supplier may rebind this variable.
        let supplier = self
            .supplier
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        supplier.supply()
    }

    fn rebind(&self, supplier: Arc<dyn ValueSupplier>) {
        *self.supplier.write().unwrap_or_else(PoisonError::into_inner) = supplier;
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable").field("name", &self.name).finish()
    }
}

/// Named variables shared between the expression trees of one model or animatable.
/// Names are matched case-insensitively, as the parser reads them.
#[derive(Clone, Debug, Default)]
pub struct VariableScope {
    variables: HashMap<String, Arc<Variable>>,
}

impl VariableScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Variable>> {
        self.variables.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn get_or_create(&mut self, name: &str) -> Arc<Variable> {
        let key = name.to_ascii_lowercase();
        self.variables
            .entry(key)
            .or_insert_with_key(|key| Arc::new(Variable::new(key.as_str(), 0.0)))
            .clone()
    }

    /// Adds `variable`, replacing any variable of the same name for trees built afterwards.
    pub fn register(&mut self, variable: Variable) -> Arc<Variable> {
        let variable = Arc::new(variable);
        self.variables
            .insert(variable.name().to_ascii_lowercase(), variable.clone());
        variable
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.get_or_create(name).set(value);
    }

    pub fn set_supplier(&mut self, name: &str, supplier: impl ValueSupplier + 'static) {
        self.get_or_create(name).set_supplier(supplier);
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
