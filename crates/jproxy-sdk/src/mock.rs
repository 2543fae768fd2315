//! An in-memory foreign runtime
//!
//! Classes are defined with closures, objects carry named fields, strings
//! live in the same object table. Every entry point the bridge uses is
//! appended to a call log so tests can check what reached the runtime.
//!
//! # Example
//!
//! ```ignore
//! let rt = MockRuntime::new();
//! rt.define_class("demo/Counter")
//!     .constructor("(I)V", |rt, call| {
//!         rt.set_field(call.this()?, "count", call.args[0]);
//!         Ok(JValue::null())
//!     })
//!     .method("get", "()I", |rt, call| {
//!         Ok(rt.field(call.this()?, "count").unwrap_or(JValue::Int(0)))
//!     });
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{BridgeError, BridgeResult};
use crate::runtime::{ClassRef, EnvRef, ForeignRuntime, JValue, MethodId, ObjectRef};
use crate::signature::STRING_CLASS;

const ENV_RAW: usize = 0xE0;
const OBJECT_BASE: usize = 0x10_0000;
const CONSTRUCTOR_NAME: &str = "<init>";

/// Body of a mock method or constructor
pub type MockMethodFn = Rc<dyn Fn(&MockRuntime, &MockInvocation) -> BridgeResult<JValue>>;

/// Arguments of one mock call
#[derive(Debug, Clone)]
pub struct MockInvocation {
    /// Receiver; `None` for static calls
    pub this: Option<ObjectRef>,
    /// Marshaled argument cells
    pub args: Vec<JValue>,
}

impl MockInvocation {
    /// Receiver of an instance call
    pub fn this(&self) -> BridgeResult<ObjectRef> {
        self.this
            .ok_or_else(|| BridgeError::ForeignException("java.lang.NullPointerException".into()))
    }

    /// Argument at `index`
    pub fn arg(&self, index: usize) -> BridgeResult<JValue> {
        self.args.get(index).copied().ok_or_else(|| {
            BridgeError::ForeignException("java.lang.ArrayIndexOutOfBoundsException".into())
        })
    }
}

/// One entry of the call log
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    /// `find_class`
    FindClass(String),
    /// `constructor_id`
    ConstructorId {
        /// Class path
        class: String,
        /// Signature text
        signature: String,
    },
    /// `method_id` or `static_method_id`
    MethodId {
        /// Class path
        class: String,
        /// Method name
        name: String,
        /// Signature text
        signature: String,
        /// Static lookup
        is_static: bool,
    },
    /// `new_object`
    NewObject {
        /// Class path
        class: String,
        /// Argument cells
        args: Vec<JValue>,
    },
    /// Any `call_*` entry point
    Call {
        /// Entry point used, e.g. `call_static_int_method`
        entry: &'static str,
        /// Method name
        method: String,
        /// Argument cells
        args: Vec<JValue>,
    },
    /// `new_string`
    NewString(String),
    /// `string_contents`
    StringContents,
    /// `release_string_contents`
    ReleaseStringContents,
    /// `delete_local_ref`
    DeleteLocalRef,
}

struct MockMethod {
    class: usize,
    name: String,
    signature: String,
    is_static: bool,
    body: MockMethodFn,
}

#[derive(Default)]
struct MockObject {
    class: Option<usize>,
    fields: HashMap<String, JValue>,
    text: Option<String>,
}

struct MockState {
    attached: bool,
    classes: Vec<String>,
    methods: Vec<MockMethod>,
    objects: HashMap<ObjectRef, MockObject>,
    next_object: usize,
    calls: Vec<RuntimeCall>,
    live_locals: usize,
}

/// In-memory [`ForeignRuntime`].
///
/// Single-threaded; state lives in a `RefCell`.
pub struct MockRuntime {
    state: RefCell<MockState>,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRuntime {
    /// Create an empty runtime with an attached environment
    pub fn new() -> Self {
        Self {
            state: RefCell::new(MockState {
                attached: true,
                classes: Vec::new(),
                methods: Vec::new(),
                objects: HashMap::new(),
                next_object: OBJECT_BASE,
                calls: Vec::new(),
                live_locals: 0,
            }),
        }
    }

    // ========================================================================
    // Definition
    // ========================================================================

    /// Define a class; add members through the returned builder.
    pub fn define_class(&self, path: &str) -> MockClassBuilder<'_> {
        let mut state = self.state.borrow_mut();
        let index = match state.classes.iter().position(|c| c == path) {
            Some(index) => index,
            None => {
                state.classes.push(path.to_string());
                state.classes.len() - 1
            }
        };
        MockClassBuilder {
            runtime: self,
            class: index,
        }
    }

    fn add_method(
        &self,
        class: usize,
        name: &str,
        signature: &str,
        is_static: bool,
        body: MockMethodFn,
    ) {
        self.state.borrow_mut().methods.push(MockMethod {
            class,
            name: name.to_string(),
            signature: signature.to_string(),
            is_static,
            body,
        });
    }

    /// Attach the environment to the calling thread
    pub fn attach(&self) {
        self.state.borrow_mut().attached = true;
    }

    /// Detach the environment; `current_env` returns `None` afterwards
    pub fn detach(&self) {
        self.state.borrow_mut().attached = false;
    }

    // ========================================================================
    // Heap access for method bodies and tests
    // ========================================================================

    /// Allocate a string without going through the call log
    pub fn alloc_string(&self, text: &str) -> ObjectRef {
        self.alloc(MockObject {
            text: Some(text.to_string()),
            ..MockObject::default()
        })
    }

    /// Text of a string object
    pub fn string_value(&self, obj: ObjectRef) -> Option<String> {
        self.state
            .borrow()
            .objects
            .get(&obj)
            .and_then(|o| o.text.clone())
    }

    /// Read a field of an object
    pub fn field(&self, obj: ObjectRef, name: &str) -> Option<JValue> {
        self.state
            .borrow()
            .objects
            .get(&obj)
            .and_then(|o| o.fields.get(name).copied())
    }

    /// Write a field of an object
    pub fn set_field(&self, obj: ObjectRef, name: &str, value: JValue) {
        if let Some(o) = self.state.borrow_mut().objects.get_mut(&obj) {
            o.fields.insert(name.to_string(), value);
        }
    }

    /// Class path of an object
    pub fn class_of(&self, obj: ObjectRef) -> Option<String> {
        let state = self.state.borrow();
        let object = state.objects.get(&obj)?;
        match object.class {
            Some(class) => state.classes.get(class).cloned(),
            None if object.text.is_some() => Some(STRING_CLASS.to_string()),
            None => None,
        }
    }

    fn alloc(&self, object: MockObject) -> ObjectRef {
        let mut state = self.state.borrow_mut();
        state.next_object += 0x10;
        let obj = ObjectRef::from_raw(state.next_object).expect("object base is non-zero");
        state.objects.insert(obj, object);
        obj
    }

    // ========================================================================
    // Call log
    // ========================================================================

    /// Everything that reached the runtime, oldest first
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.state.borrow().calls.clone()
    }

    /// Number of logged calls matching `pred`
    pub fn count_calls(&self, pred: impl Fn(&RuntimeCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    /// Forget the call log
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Local references created by `new_string` or returned as objects, and
    /// not yet deleted
    pub fn live_local_refs(&self) -> usize {
        self.state.borrow().live_locals
    }

    fn log(&self, call: RuntimeCall) {
        self.state.borrow_mut().calls.push(call);
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn lookup(
        &self,
        class: ClassRef,
        name: &str,
        signature: &str,
        is_static: bool,
    ) -> Option<MethodId> {
        let state = self.state.borrow();
        let class = class.as_raw() - 1;
        state
            .methods
            .iter()
            .position(|m| {
                m.class == class
                    && m.name == name
                    && m.signature == signature
                    && m.is_static == is_static
            })
            .and_then(|index| MethodId::from_raw(index + 1))
    }

    fn class_path(&self, class: ClassRef) -> String {
        self.state
            .borrow()
            .classes
            .get(class.as_raw() - 1)
            .cloned()
            .unwrap_or_default()
    }

    fn invoke(
        &self,
        entry: &'static str,
        method: MethodId,
        this: Option<ObjectRef>,
        args: &[JValue],
    ) -> BridgeResult<JValue> {
        let (name, is_static, body) = {
            let state = self.state.borrow();
            let m = state.methods.get(method.as_raw() - 1).ok_or_else(|| {
                BridgeError::ForeignException("java.lang.NoSuchMethodError".into())
            })?;
            (m.name.clone(), m.is_static, m.body.clone())
        };
        self.log(RuntimeCall::Call {
            entry,
            method: name,
            args: args.to_vec(),
        });

        if is_static == this.is_some() {
            return Err(BridgeError::ForeignException(
                "java.lang.IncompatibleClassChangeError".into(),
            ));
        }
        if let Some(obj) = this {
            if !self.state.borrow().objects.contains_key(&obj) {
                return Err(BridgeError::ForeignException(
                    "java.lang.NullPointerException".into(),
                ));
            }
        }

        let result = body(
            self,
            &MockInvocation {
                this,
                args: args.to_vec(),
            },
        )?;
        if let JValue::Object(Some(_)) = result {
            self.state.borrow_mut().live_locals += 1;
        }
        Ok(result)
    }
}

fn wrong_return(expected: &str, got: JValue) -> BridgeError {
    BridgeError::ForeignException(format!(
        "mock method returned {} where {} was declared",
        got.type_name(),
        expected
    ))
}

/// Adds constructors and methods to a mock class.
pub struct MockClassBuilder<'rt> {
    runtime: &'rt MockRuntime,
    class: usize,
}

impl MockClassBuilder<'_> {
    /// Add a constructor. The body runs with `this` set to the new object.
    pub fn constructor(
        self,
        signature: &str,
        body: impl Fn(&MockRuntime, &MockInvocation) -> BridgeResult<JValue> + 'static,
    ) -> Self {
        self.runtime
            .add_method(self.class, CONSTRUCTOR_NAME, signature, false, Rc::new(body));
        self
    }

    /// Add an instance method
    pub fn method(
        self,
        name: &str,
        signature: &str,
        body: impl Fn(&MockRuntime, &MockInvocation) -> BridgeResult<JValue> + 'static,
    ) -> Self {
        self.runtime
            .add_method(self.class, name, signature, false, Rc::new(body));
        self
    }

    /// Add a static method
    pub fn static_method(
        self,
        name: &str,
        signature: &str,
        body: impl Fn(&MockRuntime, &MockInvocation) -> BridgeResult<JValue> + 'static,
    ) -> Self {
        self.runtime
            .add_method(self.class, name, signature, true, Rc::new(body));
        self
    }
}

// ============================================================================
// ForeignRuntime
// ============================================================================

macro_rules! mock_calls {
    ($($inst:ident, $stat:ident => $ty:ty, $expected:literal, $pat:pat => $out:expr;)*) => {
        $(
            fn $inst(
                &self,
                _env: EnvRef,
                obj: ObjectRef,
                method: MethodId,
                args: &[JValue],
            ) -> BridgeResult<$ty> {
                match self.invoke(stringify!($inst), method, Some(obj), args)? {
                    $pat => Ok($out),
                    #[allow(unreachable_patterns)]
                    other => Err(wrong_return($expected, other)),
                }
            }

            fn $stat(
                &self,
                _env: EnvRef,
                _class: ClassRef,
                method: MethodId,
                args: &[JValue],
            ) -> BridgeResult<$ty> {
                match self.invoke(stringify!($stat), method, None, args)? {
                    $pat => Ok($out),
                    #[allow(unreachable_patterns)]
                    other => Err(wrong_return($expected, other)),
                }
            }
        )*
    };
}

impl ForeignRuntime for MockRuntime {
    fn current_env(&self) -> Option<EnvRef> {
        if self.state.borrow().attached {
            EnvRef::from_raw(ENV_RAW)
        } else {
            None
        }
    }

    fn find_class(&self, _env: EnvRef, path: &str) -> Option<ClassRef> {
        self.log(RuntimeCall::FindClass(path.to_string()));
        let state = self.state.borrow();
        let index = state.classes.iter().position(|c| c == path)?;
        ClassRef::from_raw(index + 1)
    }

    fn constructor_id(&self, _env: EnvRef, class: ClassRef, signature: &str) -> Option<MethodId> {
        self.log(RuntimeCall::ConstructorId {
            class: self.class_path(class),
            signature: signature.to_string(),
        });
        self.lookup(class, CONSTRUCTOR_NAME, signature, false)
    }

    fn method_id(
        &self,
        _env: EnvRef,
        class: ClassRef,
        name: &str,
        signature: &str,
    ) -> Option<MethodId> {
        self.log(RuntimeCall::MethodId {
            class: self.class_path(class),
            name: name.to_string(),
            signature: signature.to_string(),
            is_static: false,
        });
        self.lookup(class, name, signature, false)
    }

    fn static_method_id(
        &self,
        _env: EnvRef,
        class: ClassRef,
        name: &str,
        signature: &str,
    ) -> Option<MethodId> {
        self.log(RuntimeCall::MethodId {
            class: self.class_path(class),
            name: name.to_string(),
            signature: signature.to_string(),
            is_static: true,
        });
        self.lookup(class, name, signature, true)
    }

    fn new_object(
        &self,
        _env: EnvRef,
        class: ClassRef,
        ctor: MethodId,
        args: &[JValue],
    ) -> BridgeResult<ObjectRef> {
        self.log(RuntimeCall::NewObject {
            class: self.class_path(class),
            args: args.to_vec(),
        });
        let body = {
            let state = self.state.borrow();
            match state.methods.get(ctor.as_raw() - 1) {
                Some(m) if m.name == CONSTRUCTOR_NAME && m.class == class.as_raw() - 1 => {
                    m.body.clone()
                }
                _ => {
                    return Err(BridgeError::ForeignException(
                        "java.lang.NoSuchMethodError".into(),
                    ))
                }
            }
        };
        let obj = self.alloc(MockObject {
            class: Some(class.as_raw() - 1),
            ..MockObject::default()
        });
        body(
            self,
            &MockInvocation {
                this: Some(obj),
                args: args.to_vec(),
            },
        )?;
        Ok(obj)
    }

    fn delete_local_ref(&self, _env: EnvRef, _obj: ObjectRef) {
        self.log(RuntimeCall::DeleteLocalRef);
        let mut state = self.state.borrow_mut();
        state.live_locals = state.live_locals.saturating_sub(1);
    }

    fn call_void_method(
        &self,
        _env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<()> {
        self.invoke("call_void_method", method, Some(obj), args).map(|_| ())
    }

    fn call_static_void_method(
        &self,
        _env: EnvRef,
        _class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<()> {
        self.invoke("call_static_void_method", method, None, args).map(|_| ())
    }

    mock_calls! {
        call_boolean_method, call_static_boolean_method => bool, "boolean", JValue::Boolean(v) => v;
        call_byte_method, call_static_byte_method => i8, "byte", JValue::Byte(v) => v;
        call_char_method, call_static_char_method => u16, "char", JValue::Char(v) => v;
        call_short_method, call_static_short_method => i16, "short", JValue::Short(v) => v;
        call_int_method, call_static_int_method => i32, "int", JValue::Int(v) => v;
        call_long_method, call_static_long_method => i64, "long", JValue::Long(v) => v;
        call_float_method, call_static_float_method => f32, "float", JValue::Float(v) => v;
        call_double_method, call_static_double_method => f64, "double", JValue::Double(v) => v;
        call_object_method, call_static_object_method =>
            Option<ObjectRef>, "object", JValue::Object(v) => v;
    }

    fn new_string(&self, _env: EnvRef, text: &str) -> BridgeResult<ObjectRef> {
        self.log(RuntimeCall::NewString(text.to_string()));
        let obj = self.alloc_string(text);
        self.state.borrow_mut().live_locals += 1;
        Ok(obj)
    }

    fn string_contents(&self, _env: EnvRef, string: ObjectRef) -> BridgeResult<String> {
        self.log(RuntimeCall::StringContents);
        self.string_value(string).ok_or_else(|| {
            BridgeError::ForeignException("java.lang.ClassCastException: not a string".into())
        })
    }

    fn release_string_contents(&self, _env: EnvRef, _string: ObjectRef) {
        self.log(RuntimeCall::ReleaseStringContents);
    }
}
