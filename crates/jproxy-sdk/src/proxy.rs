//! Proxy classes and bound methods
//!
//! A [`ProxyClassDef`] is the explicit declaration list of a proxy: the
//! foreign class path, an optional constructor signature and the methods to
//! bind. [`ProxyObject::instantiate`] runs the full construction protocol:
//!
//! 1. resolve the class through the attached environment,
//! 2. resolve every declared method to a foreign method id,
//! 3. marshal the constructor arguments and construct the instance.
//!
//! Bound methods hold only their own signature and id. The environment,
//! class and instance are read from the owning proxy at call time through
//! [`MethodRef`].

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::handle::OpaqueHandle;
use crate::marshal::{ArgBuffer, StringContents};
use crate::runtime::{ClassRef, EnvRef, ForeignRuntime, JValue, MethodId, ObjectRef};
use crate::signature::{MethodSignature, TypeDescriptor, DEFAULT_CONSTRUCTOR};
use crate::value::Value;

// ============================================================================
// Declarations
// ============================================================================

/// One method a proxy binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Foreign method name
    pub name: String,

    /// Signature text, e.g. `(I)Ljava/lang/String;`
    pub signature: String,

    /// Resolve through the static lookup and call with the class as receiver
    #[serde(default, rename = "static")]
    pub is_static: bool,

    /// Proxy-side member name (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
}

impl MethodDecl {
    /// Name the method is called by on the proxy
    pub fn member_name(&self) -> &str {
        self.member.as_deref().unwrap_or(&self.name)
    }
}

/// Declaration of a proxy type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyClassDef {
    /// Proxy name, used in messages
    pub name: String,

    /// Foreign class path, e.g. `java/util/ArrayList`
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_path: Option<String>,

    /// Constructor signature (defaults to `()V`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor: Option<String>,

    /// Bound methods, in declaration order
    #[serde(default, rename = "method")]
    pub methods: Vec<MethodDecl>,
}

impl ProxyClassDef {
    /// Start a declaration
    pub fn builder(name: impl Into<String>) -> ProxyClassDefBuilder {
        ProxyClassDefBuilder {
            def: ProxyClassDef {
                name: name.into(),
                class_path: None,
                constructor: None,
                methods: Vec::new(),
            },
        }
    }

    /// Constructor signature text, falling back to `()V`
    pub fn constructor_signature(&self) -> &str {
        self.constructor.as_deref().unwrap_or(DEFAULT_CONSTRUCTOR)
    }

    /// Find a method declaration by member name
    pub fn method(&self, member: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.member_name() == member)
    }
}

/// Builder for [`ProxyClassDef`].
pub struct ProxyClassDefBuilder {
    def: ProxyClassDef,
}

impl ProxyClassDefBuilder {
    /// Set the foreign class path
    pub fn class_path(mut self, path: impl Into<String>) -> Self {
        self.def.class_path = Some(path.into());
        self
    }

    /// Override the constructor signature
    pub fn constructor(mut self, signature: impl Into<String>) -> Self {
        self.def.constructor = Some(signature.into());
        self
    }

    /// Bind an instance method under its own name
    pub fn method(self, name: &str, signature: &str) -> Self {
        self.declare(name, name, signature, false)
    }

    /// Bind a static method under its own name
    pub fn static_method(self, name: &str, signature: &str) -> Self {
        self.declare(name, name, signature, true)
    }

    /// Bind a method under an explicit member name.
    ///
    /// A later declaration with the same member name replaces the earlier one.
    pub fn declare(mut self, member: &str, name: &str, signature: &str, is_static: bool) -> Self {
        let decl = MethodDecl {
            name: name.to_string(),
            signature: signature.to_string(),
            is_static,
            member: (member != name).then(|| member.to_string()),
        };
        match self.def.methods.iter_mut().find(|m| m.member_name() == member) {
            Some(existing) => *existing = decl,
            None => self.def.methods.push(decl),
        }
        self
    }

    /// Finish the declaration
    pub fn build(self) -> ProxyClassDef {
        self.def
    }
}

// ============================================================================
// BoundMethod
// ============================================================================

/// A declared method resolved to a foreign method id.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    member: String,
    name: String,
    signature: MethodSignature,
    is_static: bool,
    id: MethodId,
}

impl BoundMethod {
    /// Proxy-side member name
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Foreign method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed signature
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Check if the method is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Foreign method id
    pub fn id(&self) -> MethodId {
        self.id
    }
}

// ============================================================================
// ProxyClass
// ============================================================================

/// A proxy declaration resolved against the foreign runtime.
///
/// Owns the environment and class handle. Static methods can be called as
/// soon as the class is resolved; instance methods need [`ProxyClass::construct`].
pub struct ProxyClass {
    runtime: Rc<dyn ForeignRuntime>,
    env: EnvRef,
    class: ClassRef,
    name: String,
    class_path: String,
    constructor: MethodSignature,
    methods: HashMap<String, BoundMethod>,
}

impl ProxyClass {
    /// Resolve the class and every declared method.
    pub fn resolve(def: &ProxyClassDef, runtime: Rc<dyn ForeignRuntime>) -> BridgeResult<Self> {
        let class_path = declared_class(def)?;
        let constructor = MethodSignature::parse(def.constructor_signature())?;
        Self::resolve_with(def, runtime, class_path, constructor)
    }

    fn resolve_with(
        def: &ProxyClassDef,
        runtime: Rc<dyn ForeignRuntime>,
        class_path: &str,
        constructor: MethodSignature,
    ) -> BridgeResult<Self> {
        let env = runtime.current_env().ok_or(BridgeError::MissingEnvironment)?;
        let class = runtime
            .find_class(env, class_path)
            .ok_or_else(|| BridgeError::ClassNotFound(class_path.to_string()))?;
        debug!(proxy = %def.name, class = class_path, "resolved foreign class");

        let mut methods = HashMap::with_capacity(def.methods.len());
        for decl in &def.methods {
            let signature = MethodSignature::parse(&decl.signature)?;
            let id = if decl.is_static {
                runtime.static_method_id(env, class, &decl.name, &decl.signature)
            } else {
                runtime.method_id(env, class, &decl.name, &decl.signature)
            }
            .ok_or_else(|| BridgeError::MethodNotFound {
                class: class_path.to_string(),
                name: decl.name.clone(),
                signature: decl.signature.clone(),
            })?;
            debug!(
                member = decl.member_name(),
                method = %decl.name,
                signature = %decl.signature,
                is_static = decl.is_static,
                "resolved foreign method"
            );

            let member = decl.member_name().to_string();
            methods.insert(
                member.clone(),
                BoundMethod {
                    member,
                    name: decl.name.clone(),
                    signature,
                    is_static: decl.is_static,
                    id,
                },
            );
        }

        Ok(Self {
            runtime,
            env,
            class,
            name: def.name.clone(),
            class_path: class_path.to_string(),
            constructor,
            methods,
        })
    }

    /// Construct an instance with the constructor signature of the declaration.
    pub fn construct(self, args: &[Value]) -> BridgeResult<ProxyObject> {
        check_arity("<init>", &self.constructor, args)?;

        let instance = {
            let buffer = ArgBuffer::marshal(
                self.runtime.as_ref(),
                self.env,
                "<init>",
                &self.constructor,
                args,
            )?;
            let ctor = self
                .runtime
                .constructor_id(self.env, self.class, self.constructor.as_str())
                .ok_or_else(|| BridgeError::ConstructorNotFound {
                    class: self.class_path.clone(),
                    signature: self.constructor.to_string(),
                })?;
            self.runtime
                .new_object(self.env, self.class, ctor, buffer.cells())
                .inspect_err(|e| warn!(class = %self.class_path, error = %e, "constructor raised"))?
        };
        debug!(proxy = %self.name, class = %self.class_path, "constructed foreign instance");

        Ok(ProxyObject {
            class: self,
            instance,
        })
    }

    /// Proxy name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Foreign class path
    pub fn class_path(&self) -> &str {
        &self.class_path
    }

    /// Foreign class handle
    pub fn class_ref(&self) -> ClassRef {
        self.class
    }

    /// Environment the class was resolved in
    pub fn env(&self) -> EnvRef {
        self.env
    }

    /// Runtime the class was resolved against
    pub fn runtime(&self) -> &Rc<dyn ForeignRuntime> {
        &self.runtime
    }

    /// Bound methods, in no particular order
    pub fn methods(&self) -> impl Iterator<Item = &BoundMethod> {
        self.methods.values()
    }

    /// Look up a bound method for a static call
    pub fn method(&self, member: &str) -> BridgeResult<MethodRef<'_>> {
        Ok(MethodRef {
            class: self,
            instance: None,
            method: self.bound(member)?,
        })
    }

    /// Call a static method by member name
    pub fn call_static(&self, member: &str, args: &[Value]) -> BridgeResult<Value> {
        self.method(member)?.invoke(args)
    }

    fn bound(&self, member: &str) -> BridgeResult<&BoundMethod> {
        self.methods
            .get(member)
            .ok_or_else(|| BridgeError::UnknownMember {
                proxy: self.name.clone(),
                member: member.to_string(),
            })
    }
}

impl fmt::Debug for ProxyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyClass")
            .field("name", &self.name)
            .field("class_path", &self.class_path)
            .field("methods", &self.methods.len())
            .finish()
    }
}

// ============================================================================
// ProxyObject
// ============================================================================

/// A constructed proxy instance.
#[derive(Debug)]
pub struct ProxyObject {
    class: ProxyClass,
    instance: ObjectRef,
}

impl ProxyObject {
    /// Run the full construction protocol for `def`.
    ///
    /// The declaration and the constructor arity are checked before the
    /// runtime is touched.
    pub fn instantiate(
        def: &ProxyClassDef,
        runtime: Rc<dyn ForeignRuntime>,
        args: &[Value],
    ) -> BridgeResult<Self> {
        let class_path = declared_class(def)?;
        let constructor = MethodSignature::parse(def.constructor_signature())?;
        check_arity("<init>", &constructor, args)?;

        ProxyClass::resolve_with(def, runtime, class_path, constructor)?.construct(args)
    }

    /// Look up a bound method
    pub fn method(&self, member: &str) -> BridgeResult<MethodRef<'_>> {
        Ok(MethodRef {
            class: &self.class,
            instance: Some(self.instance),
            method: self.class.bound(member)?,
        })
    }

    /// Call a bound method by member name
    pub fn call(&self, member: &str, args: &[Value]) -> BridgeResult<Value> {
        self.method(member)?.invoke(args)
    }

    /// Resolved class binding
    pub fn class(&self) -> &ProxyClass {
        &self.class
    }

    /// Handle to the foreign instance, for passing this proxy as an argument
    pub fn handle(&self) -> OpaqueHandle {
        OpaqueHandle::bound(self.instance)
    }
}

// ============================================================================
// MethodRef / invocation
// ============================================================================

/// A bound method together with the proxy it belongs to.
#[derive(Clone, Copy)]
pub struct MethodRef<'p> {
    class: &'p ProxyClass,
    instance: Option<ObjectRef>,
    method: &'p BoundMethod,
}

enum Receiver {
    Instance(ObjectRef),
    Static(ClassRef),
}

macro_rules! typed_call {
    ($rt:expr, $env:expr, $receiver:expr, $id:expr, $args:expr, $inst:ident, $stat:ident) => {
        match $receiver {
            Receiver::Instance(obj) => $rt.$inst($env, obj, $id, $args),
            Receiver::Static(class) => $rt.$stat($env, class, $id, $args),
        }
    };
}

impl<'p> MethodRef<'p> {
    /// The bound method
    pub fn bound(&self) -> &'p BoundMethod {
        self.method
    }

    /// Invoke the method and decode its result.
    pub fn invoke(&self, args: &[Value]) -> BridgeResult<Value> {
        let method = self.method;
        check_arity(&method.member, &method.signature, args)?;

        let ret = method.signature.return_descriptor()?;
        if let TypeDescriptor::ArrayRef(_) = ret {
            return Err(BridgeError::NotImplemented(format!(
                "array return '{}' of '{}'",
                method.signature.return_token(),
                method.member
            )));
        }

        let receiver = if method.is_static {
            Receiver::Static(self.class.class)
        } else {
            Receiver::Instance(
                self.instance
                    .ok_or_else(|| BridgeError::UnboundInstance(method.member.clone()))?,
            )
        };

        let runtime = self.class.runtime.as_ref();
        let env = self.class.env;
        let buffer = ArgBuffer::marshal(runtime, env, &method.member, &method.signature, args)?;
        trace!(
            member = %method.member,
            ret = %ret,
            cells = buffer.len(),
            "dispatching foreign call"
        );

        self.dispatch(runtime, env, receiver, &ret, buffer.cells())
            .inspect_err(|e| warn!(member = %method.member, error = %e, "foreign call failed"))
    }

    fn dispatch(
        &self,
        rt: &dyn ForeignRuntime,
        env: EnvRef,
        receiver: Receiver,
        ret: &TypeDescriptor,
        args: &[JValue],
    ) -> BridgeResult<Value> {
        let id = self.method.id;
        let value = match ret {
            TypeDescriptor::Void => {
                typed_call!(
                    rt, env, receiver, id, args, call_void_method, call_static_void_method
                )?;
                Value::Void
            }
            TypeDescriptor::Boolean => Value::Bool(typed_call!(
                rt, env, receiver, id, args, call_boolean_method, call_static_boolean_method
            )?),
            TypeDescriptor::Byte => Value::Int(typed_call!(
                rt, env, receiver, id, args, call_byte_method, call_static_byte_method
            )? as i64),
            TypeDescriptor::Char => Value::Int(typed_call!(
                rt, env, receiver, id, args, call_char_method, call_static_char_method
            )? as i64),
            TypeDescriptor::Short => Value::Int(typed_call!(
                rt, env, receiver, id, args, call_short_method, call_static_short_method
            )? as i64),
            TypeDescriptor::Int => Value::Int(typed_call!(
                rt, env, receiver, id, args, call_int_method, call_static_int_method
            )? as i64),
            TypeDescriptor::Long => Value::Int(typed_call!(
                rt, env, receiver, id, args, call_long_method, call_static_long_method
            )?),
            TypeDescriptor::Float => Value::Float(typed_call!(
                rt, env, receiver, id, args, call_float_method, call_static_float_method
            )? as f64),
            TypeDescriptor::Double => Value::Float(typed_call!(
                rt, env, receiver, id, args, call_double_method, call_static_double_method
            )?),
            TypeDescriptor::StringRef => match typed_call!(
                rt, env, receiver, id, args, call_object_method, call_static_object_method
            )? {
                Some(string) => {
                    let text = StringContents::read(rt, env, string);
                    rt.delete_local_ref(env, string);
                    Value::Str(text?)
                }
                None => Value::Null,
            },
            // The returned reference becomes the handle and stays live
            TypeDescriptor::ObjectRef(_) => match typed_call!(
                rt, env, receiver, id, args, call_object_method, call_static_object_method
            )? {
                Some(obj) => Value::Object(OpaqueHandle::bound(obj)),
                None => Value::Null,
            },
            TypeDescriptor::ArrayRef(token) => {
                return Err(BridgeError::NotImplemented(format!("array return '[{}'", token)))
            }
        };
        Ok(value)
    }
}

impl fmt::Debug for MethodRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRef")
            .field("proxy", &self.class.name)
            .field("member", &self.method.member)
            .finish()
    }
}

// ============================================================================
// ForeignProxy
// ============================================================================

/// A Rust type backed by a [`ProxyObject`].
///
/// Usually implemented by `#[derive(ForeignProxy)]` from `jproxy-native`.
pub trait ForeignProxy: Sized {
    /// Declaration of the proxy
    fn definition() -> ProxyClassDef;

    /// Wrap a constructed object
    fn from_object(object: ProxyObject) -> Self;

    /// The underlying object
    fn object(&self) -> &ProxyObject;

    /// Resolve and construct a new instance
    fn instantiate(runtime: Rc<dyn ForeignRuntime>, args: &[Value]) -> BridgeResult<Self> {
        ProxyObject::instantiate(&Self::definition(), runtime, args).map(Self::from_object)
    }

    /// Handle to the foreign instance
    fn handle(&self) -> OpaqueHandle {
        self.object().handle()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn declared_class(def: &ProxyClassDef) -> BridgeResult<&str> {
    def.class_path
        .as_deref()
        .ok_or_else(|| BridgeError::MissingClassDeclaration(def.name.clone()))
}

fn check_arity(callee: &str, signature: &MethodSignature, args: &[Value]) -> BridgeResult<()> {
    if args.len() != signature.arity() {
        return Err(BridgeError::ArityMismatch {
            callee: callee.to_string(),
            expected: signature.arity(),
            got: args.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRuntime, RuntimeCall};

    fn runtime() -> Rc<MockRuntime> {
        let rt = MockRuntime::new();
        rt.define_class("demo/Checker")
            .constructor("()V", |_, _| Ok(JValue::null()))
            .method("isPositive", "(I)Z", |_, call| match call.arg(0)? {
                JValue::Int(i) => Ok(JValue::Boolean(i > 0)),
                other => Err(format!("unexpected {:?}", other).into()),
            })
            .static_method("version", "()Ljava/lang/String;", |rt, _| {
                Ok(JValue::Object(Some(rt.alloc_string("1.0"))))
            });
        Rc::new(rt)
    }

    fn checker_def() -> ProxyClassDef {
        ProxyClassDef::builder("Checker")
            .class_path("demo/Checker")
            .declare("is_positive", "isPositive", "(I)Z", false)
            .static_method("version", "()Ljava/lang/String;")
            .build()
    }

    #[test]
    fn test_builder_replaces_duplicate_member() {
        let def = ProxyClassDef::builder("X")
            .method("size", "()I")
            .method("size", "()J")
            .build();
        assert_eq!(def.methods.len(), 1);
        assert_eq!(def.method("size").unwrap().signature, "()J");
        assert_eq!(def.constructor_signature(), "()V");
    }

    #[test]
    fn test_instantiate_and_call() {
        let rt = runtime();
        let obj = ProxyObject::instantiate(&checker_def(), rt.clone(), &[]).unwrap();
        let result = obj.call("is_positive", &[Value::Int(42)]).unwrap();
        assert_eq!(result.as_bool(), Some(true));
        assert_eq!(obj.call("version", &[]).unwrap().as_str(), Some("1.0"));
        assert_eq!(obj.class().methods().count(), 2);
    }

    #[test]
    fn test_static_call_before_construction() {
        let rt = runtime();
        let class = ProxyClass::resolve(&checker_def(), rt.clone()).unwrap();
        assert_eq!(class.call_static("version", &[]).unwrap().as_str(), Some("1.0"));
        assert_eq!(
            class.call_static("is_positive", &[Value::Int(1)]).unwrap_err(),
            BridgeError::UnboundInstance("is_positive".to_string())
        );
        assert_eq!(rt.count_calls(|c| matches!(c, RuntimeCall::NewObject { .. })), 0);
    }

    #[test]
    fn test_unknown_member() {
        let rt = runtime();
        let obj = ProxyObject::instantiate(&checker_def(), rt, &[]).unwrap();
        assert!(matches!(
            obj.call("missing", &[]),
            Err(BridgeError::UnknownMember { .. })
        ));
    }

    #[test]
    fn test_method_not_found() {
        let rt = runtime();
        let def = ProxyClassDef::builder("Checker")
            .class_path("demo/Checker")
            .static_method("isPositive", "(I)Z")
            .build();
        let err = ProxyObject::instantiate(&def, rt, &[]).unwrap_err();
        assert_eq!(
            err,
            BridgeError::MethodNotFound {
                class: "demo/Checker".to_string(),
                name: "isPositive".to_string(),
                signature: "(I)Z".to_string(),
            }
        );
    }
}
