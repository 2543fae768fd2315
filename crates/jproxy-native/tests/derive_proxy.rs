//! Integration tests for #[derive(ForeignProxy)].

use std::rc::Rc;

use jproxy_native::ForeignProxy;
use jproxy_sdk::mock::{MockRuntime, RuntimeCall};
use jproxy_sdk::{BridgeError, ForeignProxy as _, JValue, ProxyObject, Value};

#[derive(ForeignProxy)]
#[foreign(class = "java/lang/StringBuilder", constructor = "(Ljava/lang/String;)V")]
#[foreign(method(name = "append", signature = "(Ljava/lang/String;)Ljava/lang/StringBuilder;"))]
#[foreign(method(name = "toString", signature = "()Ljava/lang/String;", member = "contents"))]
#[foreign(method(name = "setLength", signature = "(I)V"))]
#[foreign(static_method(name = "valueOf", signature = "(I)Ljava/lang/String;"))]
struct StringBuilder(ProxyObject);

#[derive(ForeignProxy)]
#[foreign(method(name = "size", signature = "()I"))]
struct Undeclared(ProxyObject);

fn text_of(rt: &MockRuntime, value: JValue) -> String {
    match value {
        JValue::Object(Some(s)) => rt.string_value(s).unwrap_or_default(),
        _ => String::new(),
    }
}

fn runtime() -> Rc<MockRuntime> {
    let rt = MockRuntime::new();
    rt.define_class("java/lang/StringBuilder")
        .constructor("(Ljava/lang/String;)V", |rt, call| {
            let initial = text_of(rt, call.arg(0)?);
            let buf = rt.alloc_string(&initial);
            rt.set_field(call.this()?, "buf", JValue::Object(Some(buf)));
            Ok(JValue::null())
        })
        .method(
            "append",
            "(Ljava/lang/String;)Ljava/lang/StringBuilder;",
            |rt, call| {
                let this = call.this()?;
                let current = text_of(rt, rt.field(this, "buf").unwrap_or(JValue::null()));
                let joined = current + &text_of(rt, call.arg(0)?);
                let buf = rt.alloc_string(&joined);
                rt.set_field(this, "buf", JValue::Object(Some(buf)));
                Ok(JValue::Object(Some(this)))
            },
        )
        .method("toString", "()Ljava/lang/String;", |rt, call| {
            Ok(rt.field(call.this()?, "buf").unwrap_or(JValue::null()))
        })
        .method("setLength", "(I)V", |rt, call| {
            let this = call.this()?;
            let len = match call.arg(0)? {
                JValue::Int(n) => n.max(0) as usize,
                _ => 0,
            };
            let mut text = text_of(rt, rt.field(this, "buf").unwrap_or(JValue::null()));
            text.truncate(len);
            let buf = rt.alloc_string(&text);
            rt.set_field(this, "buf", JValue::Object(Some(buf)));
            Ok(JValue::null())
        })
        .static_method("valueOf", "(I)Ljava/lang/String;", |rt, call| match call.arg(0)? {
            JValue::Int(n) => Ok(JValue::Object(Some(rt.alloc_string(&n.to_string())))),
            other => Err(format!("unexpected {:?}", other).into()),
        });
    Rc::new(rt)
}

#[test]
fn test_generated_definition() {
    let def = StringBuilder::definition();
    assert_eq!(def.name, "StringBuilder");
    assert_eq!(def.class_path.as_deref(), Some("java/lang/StringBuilder"));
    assert_eq!(def.constructor_signature(), "(Ljava/lang/String;)V");

    let members: Vec<_> = def.methods.iter().map(|m| m.member_name()).collect();
    assert_eq!(members, ["append", "contents", "set_length", "value_of"]);
    assert!(def.method("value_of").unwrap().is_static);
    assert_eq!(def.method("contents").unwrap().name, "toString");
}

#[test]
fn test_generated_methods() {
    let rt = runtime();
    let sb = StringBuilder::new(rt.clone(), "foo").unwrap();

    let returned = sb.append("bar").unwrap();
    assert!(returned.as_object().is_some_and(|h| h.is_bound()));
    assert_eq!(sb.contents().unwrap().as_str(), Some("foobar"));

    assert!(matches!(sb.set_length(3).unwrap(), Value::Void));
    assert_eq!(sb.contents().unwrap().as_str(), Some("foo"));

    assert_eq!(sb.value_of(7).unwrap().as_str(), Some("7"));
    assert_eq!(
        rt.count_calls(|c| matches!(
            c,
            RuntimeCall::Call { entry: "call_static_object_method", .. }
        )),
        1
    );
    // Only the builder returned by `append` is still held
    assert_eq!(rt.live_local_refs(), 1);
}

#[test]
fn test_generated_constructor_checks_runtime() {
    let rt = runtime();
    rt.detach();
    let err = StringBuilder::new(rt.clone(), "x").err();
    assert_eq!(err, Some(BridgeError::MissingEnvironment));

    rt.attach();
    let sb = StringBuilder::new(rt, Value::Null).unwrap();
    assert!(sb.handle().is_bound());
    assert_eq!(sb.contents().unwrap().as_str(), Some(""));
}

#[test]
fn test_missing_class_is_a_runtime_error() {
    let rt = runtime();
    let err = Undeclared::new(rt.clone()).err();
    assert_eq!(
        err,
        Some(BridgeError::MissingClassDeclaration("Undeclared".to_string()))
    );
    assert!(rt.calls().is_empty());
}
