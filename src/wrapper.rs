use serde_json::Value;
use tracing::{debug, trace};

/// Holds one value plus a buffer of staged arguments, and invokes plugins
/// against them.
///
/// A plugin is any `FnOnce(&mut T, &[A]) -> Result<R, E>`: the wrapped value
/// is its receiver, the slice its arguments. Arguments come from the staging
/// buffer unless the `*_with` variant of an operation is given a non-empty
/// explicit list, which then wins. Plugin errors are returned as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextWrapper<T, A = Value> {
    value: T,
    staged: Vec<A>,
}

/// Explicit arguments override the staged ones when non-empty.
fn resolve<'a, A>(staged: &'a [A], explicit: &'a [A]) -> (&'a [A], bool) {
    if explicit.is_empty() {
        (staged, false)
    } else {
        (explicit, true)
    }
}

impl<T, A> ContextWrapper<T, A> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            staged: Vec::new(),
        }
    }

    pub fn read(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Arguments queued for the next consuming invocation.
    pub fn staged(&self) -> &[A] {
        &self.staged
    }

    /// Swap in a new value. Staged arguments are left alone.
    pub fn replace(&mut self, value: T) -> &mut Self {
        self.value = value;
        self
    }

    /// Append arguments, in order, to the staging buffer.
    pub fn stage<I>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = A>,
    {
        let before = self.staged.len();
        self.staged.extend(args);
        debug!(
            added = self.staged.len() - before,
            total = self.staged.len(),
            "staged arguments"
        );
        self
    }

    /// Replace the staging buffer wholesale.
    pub fn set_staged(&mut self, args: Vec<A>) -> &mut Self {
        debug!(previous = self.staged.len(), total = args.len(), "reset staged arguments");
        self.staged = args;
        self
    }

    pub fn run_all<I, F, R, E>(&mut self, plugins: I) -> Result<&mut Self, E>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce(&mut T, &[A]) -> Result<R, E>,
    {
        self.run_all_with(plugins, &[])
    }

    /// Run every plugin in order against the value, discarding outputs.
    ///
    /// All plugins see the same argument list. Stops at the first error; in
    /// that case the staging buffer is kept as it was.
    pub fn run_all_with<I, F, R, E>(&mut self, plugins: I, explicit: &[A]) -> Result<&mut Self, E>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce(&mut T, &[A]) -> Result<R, E>,
    {
        let (args, explicit) = resolve(&self.staged, explicit);
        for (index, plugin) in plugins.into_iter().enumerate() {
            trace!(mode = "run_all", index, explicit, argc = args.len(), "invoking plugin");
            plugin(&mut self.value, args)?;
        }
        self.staged.clear();
        Ok(self)
    }

    pub fn run<F, R, E>(&mut self, plugin: F) -> Result<&mut Self, E>
    where
        F: FnOnce(&mut T, &[A]) -> Result<R, E>,
    {
        self.run_with(plugin, &[])
    }

    pub fn run_with<F, R, E>(&mut self, plugin: F, explicit: &[A]) -> Result<&mut Self, E>
    where
        F: FnOnce(&mut T, &[A]) -> Result<R, E>,
    {
        self.invoke("run", plugin, explicit)?;
        Ok(self)
    }

    pub fn apply<F, R, E>(&mut self, plugin: F) -> Result<R, E>
    where
        F: FnOnce(&mut T, &[A]) -> Result<R, E>,
    {
        self.apply_with(plugin, &[])
    }

    /// Invoke the plugin and hand back its output unwrapped.
    pub fn apply_with<F, R, E>(&mut self, plugin: F, explicit: &[A]) -> Result<R, E>
    where
        F: FnOnce(&mut T, &[A]) -> Result<R, E>,
    {
        self.invoke("apply", plugin, explicit)
    }

    pub fn transform<F, R, E>(&mut self, plugin: F) -> Result<ContextWrapper<R, A>, E>
    where
        F: FnOnce(&mut T, &[A]) -> Result<R, E>,
    {
        self.transform_with(plugin, &[])
    }

    /// Like [`apply_with`](Self::apply_with), but the output comes back in a
    /// fresh wrapper with an empty staging buffer. `self` keeps its value.
    pub fn transform_with<F, R, E>(
        &mut self,
        plugin: F,
        explicit: &[A],
    ) -> Result<ContextWrapper<R, A>, E>
    where
        F: FnOnce(&mut T, &[A]) -> Result<R, E>,
    {
        self.invoke("transform", plugin, explicit)
            .map(ContextWrapper::new)
    }

    pub fn with_scope<F, R, E>(&mut self, plugin: F) -> Result<R, E>
    where
        F: FnOnce(&mut T, &mut Vec<A>) -> Result<R, E>,
    {
        self.with_scope_with(plugin, &[])
    }

    /// Hand the plugin both halves of the wrapper: the value and the live
    /// staging buffer, which it may read, extend or drain.
    ///
    /// The buffer is always the live one, even when `explicit` is non-empty;
    /// explicit arguments only show up in the trace event. Staging is not
    /// cleared afterwards.
    pub fn with_scope_with<F, R, E>(&mut self, plugin: F, explicit: &[A]) -> Result<R, E>
    where
        F: FnOnce(&mut T, &mut Vec<A>) -> Result<R, E>,
    {
        let (args, explicit) = resolve(&self.staged, explicit);
        trace!(
            mode = "with_scope",
            explicit,
            argc = args.len(),
            staged = self.staged.len(),
            "invoking scoped plugin"
        );
        plugin(&mut self.value, &mut self.staged)
    }

    fn invoke<F, R, E>(&mut self, mode: &'static str, plugin: F, explicit: &[A]) -> Result<R, E>
    where
        F: FnOnce(&mut T, &[A]) -> Result<R, E>,
    {
        let (args, explicit) = resolve(&self.staged, explicit);
        trace!(mode, explicit, argc = args.len(), "invoking plugin");
        let out = plugin(&mut self.value, args)?;
        self.staged.clear();
        Ok(out)
    }
}

impl<T: Default, A> Default for ContextWrapper<T, A> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T, A> From<T> for ContextWrapper<T, A> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::convert::Infallible;

    fn record(seen: &mut Vec<Value>) -> impl FnOnce(&mut i32, &[Value]) -> Result<(), Infallible> + '_ {
        move |_, args| {
            seen.extend_from_slice(args);
            Ok(())
        }
    }

    #[test]
    fn resolve_prefers_non_empty_explicit() {
        let staged = [json!(1), json!(2)];
        assert_eq!(resolve(&staged, &[]), (&staged[..], false));
        let explicit = [json!(9)];
        assert_eq!(resolve(&staged, &explicit), (&explicit[..], true));
    }

    #[test]
    fn failed_run_keeps_staged_arguments() {
        let mut w: ContextWrapper<i32> = ContextWrapper::new(1);
        w.stage([json!("kept")]);
        let err = w
            .run(|_, _| Err::<(), _>("boom"))
            .unwrap_err();
        assert_eq!(err, "boom");
        assert_eq!(w.staged(), &[json!("kept")]);
    }

    #[test]
    fn explicit_args_leave_staging_to_be_cleared() {
        let mut w: ContextWrapper<i32> = ContextWrapper::new(0);
        w.stage([json!(1), json!(2)]);
        let mut seen = Vec::new();
        w.run_with(record(&mut seen), &[json!(9)]).unwrap();
        assert_eq!(seen, vec![json!(9)]);
        assert!(w.staged().is_empty());
    }

    #[test]
    fn default_and_from() {
        let w: ContextWrapper<String> = ContextWrapper::default();
        assert_eq!(w.read(), "");
        let w: ContextWrapper<i32> = 7.into();
        assert_eq!(*w.read(), 7);
        assert!(w.staged().is_empty());
    }
}
