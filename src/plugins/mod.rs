use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use itertools::Itertools;
use crate::errors::{PluginError, Result};

/// A named plugin over JSON receivers, storable in a [`Registry`].
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn call(&self, this: &mut Value, args: &[Value]) -> Result<Value>;
}

/// Borrow a plugin as a closure the wrapper can invoke.
pub fn as_fn<P: Plugin + ?Sized>(plugin: &P) -> impl Fn(&mut Value, &[Value]) -> Result<Value> + '_ {
    move |this: &mut Value, args: &[Value]| plugin.call(this, args)
}

/// Thread-safe plugin registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn Plugin>>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn with_builtins() -> Self {
        let mut map: HashMap<&'static str, Arc<dyn Plugin>> = HashMap::new();
        map.insert("sum", Arc::new(builtins::Sum));
        map.insert("increment", Arc::new(builtins::Increment));
        map.insert("and", Arc::new(builtins::And));
        map.insert("or", Arc::new(builtins::Or));
        map.insert("xor", Arc::new(builtins::Xor));
        map.insert("push", Arc::new(builtins::Push));
        map.insert("set", Arc::new(builtins::Set));
        map.insert("unique", Arc::new(builtins::Unique));
        map.insert("len", Arc::new(builtins::Len));
        Self { inner: Arc::new(map) }
    }

    pub fn register<P: Plugin + 'static>(&mut self, plugin: P) {
        let mut_map = Arc::make_mut(&mut self.inner);
        debug!(name = plugin.name(), "registering plugin");
        mut_map.insert(plugin.name(), Arc::new(plugin));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.inner.get(name).cloned()
    }

    /// Like [`get`](Self::get), but a missing name is an error.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Plugin>> {
        debug!(name, "resolving plugin");
        self.get(name)
            .ok_or_else(|| PluginError::UnknownPlugin(name.to_string()))
    }

    /// Registered names in alphabetical order.
    pub fn names(&self) -> Vec<&'static str> {
        self.inner.keys().copied().sorted().collect()
    }
}

/// Numeric addition that keeps integers integral.
fn add(plugin: &'static str, a: &Value, b: &Value) -> Result<Value> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x
            .checked_add(y)
            .map(Value::from)
            .ok_or_else(|| PluginError::Runtime(format!("{plugin}: integer overflow")));
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => Ok(Value::from(x + y)),
        _ => Err(PluginError::type_error(plugin, "numbers")),
    }
}

pub mod builtins {
    use super::*;
    use serde_json::Value;

    /// Sum of a numeric array.
    pub struct Sum;
    impl Plugin for Sum {
        fn name(&self) -> &'static str { "sum" }
        fn call(&self, this: &mut Value, _args: &[Value]) -> Result<Value> {
            let items = this
                .as_array()
                .ok_or_else(|| PluginError::type_error("sum", "array of numbers"))?;
            items
                .iter()
                .try_fold(Value::from(0), |acc, item| add("sum", &acc, item))
        }
    }

    /// Adds the first argument (default 1) to a numeric receiver in place.
    pub struct Increment;
    impl Plugin for Increment {
        fn name(&self) -> &'static str { "increment" }
        fn call(&self, this: &mut Value, args: &[Value]) -> Result<Value> {
            let by = args.first().cloned().unwrap_or_else(|| Value::from(1));
            *this = add("increment", this, &by)?;
            Ok(this.clone())
        }
    }

    // Reads boolean fields `a` and `b`, stores `op(a, b)` under the plugin's name.
    fn logic(this: &mut Value, plugin: &'static str, op: fn(bool, bool) -> bool) -> Result<Value> {
        let expected = "object with boolean fields `a` and `b`";
        let obj = this
            .as_object_mut()
            .ok_or_else(|| PluginError::type_error(plugin, expected))?;
        let a = obj.get("a").and_then(Value::as_bool);
        let b = obj.get("b").and_then(Value::as_bool);
        let (Some(a), Some(b)) = (a, b) else {
            return Err(PluginError::type_error(plugin, expected));
        };
        let out = Value::Bool(op(a, b));
        obj.insert(plugin.to_string(), out.clone());
        Ok(out)
    }

    pub struct And;
    impl Plugin for And {
        fn name(&self) -> &'static str { "and" }
        fn call(&self, this: &mut Value, _args: &[Value]) -> Result<Value> {
            logic(this, "and", |a, b| a && b)
        }
    }

    pub struct Or;
    impl Plugin for Or {
        fn name(&self) -> &'static str { "or" }
        fn call(&self, this: &mut Value, _args: &[Value]) -> Result<Value> {
            logic(this, "or", |a, b| a || b)
        }
    }

    pub struct Xor;
    impl Plugin for Xor {
        fn name(&self) -> &'static str { "xor" }
        fn call(&self, this: &mut Value, _args: &[Value]) -> Result<Value> {
            logic(this, "xor", |a, b| a ^ b)
        }
    }

    /// Appends every argument to an array receiver; returns the new length.
    pub struct Push;
    impl Plugin for Push {
        fn name(&self) -> &'static str { "push" }
        fn call(&self, this: &mut Value, args: &[Value]) -> Result<Value> {
            let items = this
                .as_array_mut()
                .ok_or_else(|| PluginError::type_error("push", "array"))?;
            items.extend_from_slice(args);
            Ok(Value::from(items.len()))
        }
    }

    /// `[key, value]`: sets an object field, returning the previous value
    /// or null. A missing value sets null.
    pub struct Set;
    impl Plugin for Set {
        fn name(&self) -> &'static str { "set" }
        fn call(&self, this: &mut Value, args: &[Value]) -> Result<Value> {
            let key = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| PluginError::type_error("set", "string key argument"))?;
            let value = args.get(1).cloned().unwrap_or(Value::Null);
            let obj = this
                .as_object_mut()
                .ok_or_else(|| PluginError::type_error("set", "object"))?;
            Ok(obj.insert(key.to_string(), value).unwrap_or(Value::Null))
        }
    }

    /// Deduplicates an array receiver in place, keeping first occurrences.
    pub struct Unique;
    impl Plugin for Unique {
        fn name(&self) -> &'static str { "unique" }
        fn call(&self, this: &mut Value, _args: &[Value]) -> Result<Value> {
            let items = this
                .as_array_mut()
                .ok_or_else(|| PluginError::type_error("unique", "array"))?;
            let dedup = items
                .drain(..)
                .unique_by(|x| serde_json::to_string(x).unwrap_or_default())
                .collect::<Vec<_>>();
            *items = dedup;
            Ok(Value::Array(items.clone()))
        }
    }

    pub struct Len;
    impl Plugin for Len {
        fn name(&self) -> &'static str { "len" }
        fn call(&self, this: &mut Value, _args: &[Value]) -> Result<Value> {
            let len = match this {
                Value::Array(a) => a.len(),
                Value::Object(o) => o.len(),
                Value::String(s) => s.chars().count(),
                _ => return Err(PluginError::type_error("len", "array, object or string")),
            };
            Ok(Value::from(len))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Echo;
    impl Plugin for Echo {
        fn name(&self) -> &'static str { "echo" }
        fn call(&self, _this: &mut Value, args: &[Value]) -> Result<Value> {
            Ok(Value::Array(args.to_vec()))
        }
    }

    #[test]
    fn register_does_not_touch_clones() {
        let base = Registry::with_builtins();
        let mut extended = base.clone();
        extended.register(Echo);
        assert!(extended.get("echo").is_some());
        assert!(base.get("echo").is_none());
    }

    #[test]
    fn resolve_unknown_name() {
        let err = Registry::new().resolve("nope").err();
        assert_eq!(err, Some(PluginError::UnknownPlugin("nope".into())));
    }

    #[test]
    fn names_are_sorted() {
        assert_eq!(
            Registry::with_builtins().names(),
            vec!["and", "increment", "len", "or", "push", "set", "sum", "unique", "xor"]
        );
    }

    #[test]
    fn add_keeps_integers() {
        assert_eq!(add("t", &json!(1), &json!(2)).unwrap(), json!(3));
        assert_eq!(add("t", &json!(1), &json!(0.5)).unwrap(), json!(1.5));
        assert!(matches!(
            add("t", &json!(i64::MAX), &json!(1)),
            Err(PluginError::Runtime(_))
        ));
        assert_eq!(
            add("t", &json!("x"), &json!(1)),
            Err(PluginError::type_error("t", "numbers"))
        );
    }
}
