use context_wrapper::errors::PluginError;
use context_wrapper::plugins::{as_fn, builtins, Registry};
use context_wrapper::{wrap, ContextWrapper};
use serde_json::{json, Value};
use std::convert::Infallible;

#[test]
fn test_sum_sequence() {
    let mut w: ContextWrapper<Vec<i64>> = ContextWrapper::new(vec![1, 2, 3, 4, 5]);
    let total = w
        .apply(|items, _| Ok::<_, Infallible>(items.iter().fold(0, |acc, x| acc + x)))
        .unwrap();
    assert_eq!(total, 15);
}

#[test]
fn test_sum_builtin() {
    let total = wrap(json!([1, 2, 3, 4, 5])).apply(as_fn(&builtins::Sum)).unwrap();
    assert_eq!(total, json!(15));
}

#[test]
fn test_logic_plugins() {
    let registry = Registry::with_builtins();
    let plugins = ["or", "and", "xor"]
        .iter()
        .map(|name| registry.resolve(name))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let mut w = wrap(json!({"a": true, "b": false}));
    w.run_all(plugins.iter().map(|p| as_fn(&**p))).unwrap();
    assert_eq!(w.read()["and"], json!(false));
    assert_eq!(w.read()["or"], json!(true));
    assert_eq!(w.read()["xor"], json!(true));
    assert!(w.staged().is_empty());
}

#[test]
fn test_transform_chain() {
    let increment = |v: &mut i32, _: &[Value]| Ok::<_, Infallible>(*v + 1);
    let mut w: ContextWrapper<i32> = ContextWrapper::new(10);
    let w2 = w.transform(increment).unwrap().transform(increment).unwrap();
    assert_eq!(*w2.read(), 12);
    assert_eq!(*w.read(), 10);
}

#[test]
fn test_transform_changes_payload_type() {
    let mut w = wrap(json!(["b", "a", "b"]));
    let names = w
        .transform(|v, _| {
            let names: Vec<String> = serde_json::from_value(v.clone())
                .map_err(|e| PluginError::Parse(e.to_string()))?;
            Ok::<_, PluginError>(names)
        })
        .unwrap();
    assert_eq!(names.read(), &["b", "a", "b"]);
}

#[test]
fn test_builtin_error_surfaces() {
    let mut w = wrap(json!("text"));
    w.stage([json!(1)]);
    let err = w.run(as_fn(&builtins::Push)).unwrap_err();
    assert_eq!(err, PluginError::Type { plugin: "push", expected: "array" });
    assert_eq!(w.staged(), &[json!(1)]);
}
