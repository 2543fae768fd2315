//! ForeignRuntime trait, the foreign VM's capability surface
//!
//! The bridge never talks to a virtual machine directly. The host supplies an
//! implementation of this trait (a JNI binding, or `MockRuntime` from the `mock`
//! feature in tests) and every lookup, allocation and call goes through it.
//!
//! All entry points are synchronous and assume the calling thread is already
//! attached to the foreign runtime.

use std::num::NonZeroUsize;

use crate::error::BridgeResult;

// ============================================================================
// Foreign handles
// ============================================================================

macro_rules! foreign_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(NonZeroUsize);

        impl $name {
            /// Wrap a raw runtime value. Returns `None` for null.
            #[inline]
            pub const fn from_raw(raw: usize) -> Option<Self> {
                match NonZeroUsize::new(raw) {
                    Some(raw) => Some(Self(raw)),
                    None => None,
                }
            }

            /// Raw runtime value
            #[inline]
            pub const fn as_raw(self) -> usize {
                self.0.get()
            }
        }
    };
}

foreign_handle!(
    /// Attached runtime environment (`JNIEnv*`)
    EnvRef
);
foreign_handle!(
    /// Class reference (`jclass`)
    ClassRef
);
foreign_handle!(
    /// Object reference (`jobject`, including strings)
    ObjectRef
);
foreign_handle!(
    /// Method or constructor identifier (`jmethodID`)
    MethodId
);

// ============================================================================
// JValue
// ============================================================================

/// One call-argument cell, with the widths of the foreign primitive ABI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JValue {
    /// `jboolean`
    Boolean(bool),
    /// `jbyte`
    Byte(i8),
    /// `jchar` (UTF-16 code unit)
    Char(u16),
    /// `jshort`
    Short(i16),
    /// `jint`
    Int(i32),
    /// `jlong`
    Long(i64),
    /// `jfloat`
    Float(f32),
    /// `jdouble`
    Double(f64),
    /// `jobject`; `None` is the null reference
    Object(Option<ObjectRef>),
}

impl JValue {
    /// The null reference
    #[inline]
    pub const fn null() -> Self {
        JValue::Object(None)
    }

    /// Name of the cell type
    pub fn type_name(&self) -> &'static str {
        match self {
            JValue::Boolean(_) => "boolean",
            JValue::Byte(_) => "byte",
            JValue::Char(_) => "char",
            JValue::Short(_) => "short",
            JValue::Int(_) => "int",
            JValue::Long(_) => "long",
            JValue::Float(_) => "float",
            JValue::Double(_) => "double",
            JValue::Object(_) => "object",
        }
    }

    /// Boolean as the runtime's `jboolean` byte
    pub fn as_jboolean(&self) -> Option<u8> {
        match self {
            JValue::Boolean(b) => Some(*b as u8),
            _ => None,
        }
    }
}

// ============================================================================
// ForeignRuntime
// ============================================================================

/// Foreign VM operations the bridge depends on.
///
/// Lookups return `None` when the runtime reports nothing. Calls return
/// `Err(BridgeError::ForeignException)` when the callee raised.
///
/// The `call_*` entry points mirror the runtime's typed invocation table: the
/// bridge picks exactly one of them from the method's return descriptor.
pub trait ForeignRuntime {
    // ========================================================================
    // Environment and lookup
    // ========================================================================

    /// Environment attached to the calling thread
    fn current_env(&self) -> Option<EnvRef>;

    /// Look up a class by its slash-separated path
    fn find_class(&self, env: EnvRef, path: &str) -> Option<ClassRef>;

    /// Look up a constructor by signature
    fn constructor_id(&self, env: EnvRef, class: ClassRef, signature: &str) -> Option<MethodId>;

    /// Look up an instance method
    fn method_id(
        &self,
        env: EnvRef,
        class: ClassRef,
        name: &str,
        signature: &str,
    ) -> Option<MethodId>;

    /// Look up a static method
    fn static_method_id(
        &self,
        env: EnvRef,
        class: ClassRef,
        name: &str,
        signature: &str,
    ) -> Option<MethodId>;

    // ========================================================================
    // Objects
    // ========================================================================

    /// Allocate and construct an instance
    fn new_object(
        &self,
        env: EnvRef,
        class: ClassRef,
        ctor: MethodId,
        args: &[JValue],
    ) -> BridgeResult<ObjectRef>;

    /// Release a local reference created on behalf of a call
    fn delete_local_ref(&self, _env: EnvRef, _obj: ObjectRef) {}

    // ========================================================================
    // Instance calls
    // ========================================================================

    /// Call an instance method returning nothing
    fn call_void_method(
        &self,
        env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<()>;
    /// Call an instance method returning `boolean`
    fn call_boolean_method(
        &self,
        env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<bool>;
    /// Call an instance method returning `byte`
    fn call_byte_method(
        &self,
        env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<i8>;
    /// Call an instance method returning `char`
    fn call_char_method(
        &self,
        env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<u16>;
    /// Call an instance method returning `short`
    fn call_short_method(
        &self,
        env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<i16>;
    /// Call an instance method returning `int`
    fn call_int_method(
        &self,
        env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<i32>;
    /// Call an instance method returning `long`
    fn call_long_method(
        &self,
        env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<i64>;
    /// Call an instance method returning `float`
    fn call_float_method(
        &self,
        env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<f32>;
    /// Call an instance method returning `double`
    fn call_double_method(
        &self,
        env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<f64>;
    /// Call an instance method returning an object or string (may be null)
    fn call_object_method(
        &self,
        env: EnvRef,
        obj: ObjectRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<Option<ObjectRef>>;

    // ========================================================================
    // Static calls
    // ========================================================================

    /// Call a static method returning nothing
    fn call_static_void_method(
        &self,
        env: EnvRef,
        class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<()>;
    /// Call a static method returning `boolean`
    fn call_static_boolean_method(
        &self,
        env: EnvRef,
        class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<bool>;
    /// Call a static method returning `byte`
    fn call_static_byte_method(
        &self,
        env: EnvRef,
        class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<i8>;
    /// Call a static method returning `char`
    fn call_static_char_method(
        &self,
        env: EnvRef,
        class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<u16>;
    /// Call a static method returning `short`
    fn call_static_short_method(
        &self,
        env: EnvRef,
        class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<i16>;
    /// Call a static method returning `int`
    fn call_static_int_method(
        &self,
        env: EnvRef,
        class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<i32>;
    /// Call a static method returning `long`
    fn call_static_long_method(
        &self,
        env: EnvRef,
        class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<i64>;
    /// Call a static method returning `float`
    fn call_static_float_method(
        &self,
        env: EnvRef,
        class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<f32>;
    /// Call a static method returning `double`
    fn call_static_double_method(
        &self,
        env: EnvRef,
        class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<f64>;
    /// Call a static method returning an object or string (may be null)
    fn call_static_object_method(
        &self,
        env: EnvRef,
        class: ClassRef,
        method: MethodId,
        args: &[JValue],
    ) -> BridgeResult<Option<ObjectRef>>;

    // ========================================================================
    // Strings
    // ========================================================================

    /// Create a foreign string from native text
    fn new_string(&self, env: EnvRef, text: &str) -> BridgeResult<ObjectRef>;

    /// Read a foreign string's contents. Must be paired with
    /// [`ForeignRuntime::release_string_contents`] when it succeeds.
    fn string_contents(&self, env: EnvRef, string: ObjectRef) -> BridgeResult<String>;

    /// Release contents obtained from [`ForeignRuntime::string_contents`]
    fn release_string_contents(&self, env: EnvRef, string: ObjectRef);
}
