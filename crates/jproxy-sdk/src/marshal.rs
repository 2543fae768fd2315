//! Argument marshaling and scoped string access
//!
//! [`ArgBuffer`] turns native [`Value`]s into the cell array a foreign call
//! takes. It owns every string reference it created for the call and
//! releases them when dropped, whichever way the call ends.
//!
//! [`StringContents`] pairs a string read with its release.

use tracing::trace;

use crate::error::{BridgeError, BridgeResult};
use crate::runtime::{EnvRef, ForeignRuntime, JValue, ObjectRef};
use crate::signature::{MethodSignature, TypeDescriptor};
use crate::value::Value;

// ============================================================================
// ArgBuffer
// ============================================================================

/// Call-argument cells for one foreign call.
pub struct ArgBuffer<'rt> {
    runtime: &'rt dyn ForeignRuntime,
    env: EnvRef,
    cells: Vec<JValue>,
    locals: Vec<ObjectRef>,
}

impl<'rt> ArgBuffer<'rt> {
    /// Marshal `args` against the argument descriptors of `signature`.
    ///
    /// Arity, array and descriptor checks run before the runtime is touched.
    pub fn marshal(
        runtime: &'rt dyn ForeignRuntime,
        env: EnvRef,
        callee: &str,
        signature: &MethodSignature,
        args: &[Value],
    ) -> BridgeResult<Self> {
        if args.len() != signature.arity() {
            return Err(BridgeError::ArityMismatch {
                callee: callee.to_string(),
                expected: signature.arity(),
                got: args.len(),
            });
        }

        let descriptors = signature.arg_descriptors()?;
        for (token, descriptor) in signature.arg_tokens().iter().zip(&descriptors) {
            match descriptor {
                TypeDescriptor::ArrayRef(_) => {
                    return Err(BridgeError::NotImplemented(format!(
                        "array argument '{}' of '{}'",
                        token, callee
                    )));
                }
                TypeDescriptor::Void => {
                    return Err(BridgeError::InvalidDescriptor(token.clone()));
                }
                _ => {}
            }
        }

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(args.len())
            .map_err(|_| BridgeError::AllocationFailure(args.len()))?;

        let mut buffer = Self {
            runtime,
            env,
            cells,
            locals: Vec::new(),
        };
        for (index, (descriptor, value)) in descriptors.iter().zip(args).enumerate() {
            let token = &signature.arg_tokens()[index];
            let cell = buffer.convert(index, token, descriptor, value)?;
            buffer.cells.push(cell);
        }
        Ok(buffer)
    }

    /// The marshaled cells, in argument order
    pub fn cells(&self) -> &[JValue] {
        &self.cells
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the buffer holds no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn convert(
        &mut self,
        index: usize,
        token: &str,
        descriptor: &TypeDescriptor,
        value: &Value,
    ) -> BridgeResult<JValue> {
        let invalid = || BridgeError::InvalidArgument {
            index,
            descriptor: token.to_string(),
            got: value.type_name(),
        };

        let cell = match (descriptor, value) {
            (TypeDescriptor::Boolean, Value::Bool(b)) => JValue::Boolean(*b),
            (TypeDescriptor::Boolean, Value::Int(i)) => JValue::Boolean(*i != 0),
            (TypeDescriptor::Byte, Value::Int(i)) => JValue::Byte(*i as i8),
            (TypeDescriptor::Char, Value::Int(i)) => JValue::Char(*i as u16),
            (TypeDescriptor::Char, Value::Str(s)) => {
                let mut units = s.encode_utf16();
                match (units.next(), units.next()) {
                    (Some(unit), None) => JValue::Char(unit),
                    _ => return Err(invalid()),
                }
            }
            (TypeDescriptor::Short, Value::Int(i)) => JValue::Short(*i as i16),
            (TypeDescriptor::Int, Value::Int(i)) => JValue::Int(*i as i32),
            (TypeDescriptor::Long, Value::Int(i)) => JValue::Long(*i),
            (TypeDescriptor::Float, Value::Float(f)) => JValue::Float(*f as f32),
            (TypeDescriptor::Float, Value::Int(i)) => JValue::Float(*i as f32),
            (TypeDescriptor::Double, Value::Float(f)) => JValue::Double(*f),
            (TypeDescriptor::Double, Value::Int(i)) => JValue::Double(*i as f64),
            (TypeDescriptor::StringRef, Value::Null) => JValue::null(),
            (TypeDescriptor::StringRef, Value::Str(s)) => {
                let string = self.runtime.new_string(self.env, s)?;
                self.locals.push(string);
                JValue::Object(Some(string))
            }
            (TypeDescriptor::ObjectRef(_), Value::Null) => JValue::null(),
            (TypeDescriptor::ObjectRef(_), Value::Object(handle)) => JValue::Object(handle.raw()),
            _ => return Err(invalid()),
        };
        Ok(cell)
    }
}

impl Drop for ArgBuffer<'_> {
    fn drop(&mut self) {
        for local in self.locals.drain(..) {
            self.runtime.delete_local_ref(self.env, local);
        }
        trace!(cells = self.cells.len(), "released argument buffer");
    }
}

// ============================================================================
// StringContents
// ============================================================================

/// Contents of a foreign string, released when dropped.
pub struct StringContents<'rt> {
    runtime: &'rt dyn ForeignRuntime,
    env: EnvRef,
    string: ObjectRef,
    text: String,
}

impl<'rt> StringContents<'rt> {
    /// Read the contents of `string`.
    pub fn acquire(
        runtime: &'rt dyn ForeignRuntime,
        env: EnvRef,
        string: ObjectRef,
    ) -> BridgeResult<Self> {
        let text = runtime.string_contents(env, string)?;
        Ok(Self {
            runtime,
            env,
            string,
            text,
        })
    }

    /// The text read from the foreign string
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Read a foreign string into native text, releasing it before returning.
    pub fn read(
        runtime: &'rt dyn ForeignRuntime,
        env: EnvRef,
        string: ObjectRef,
    ) -> BridgeResult<String> {
        let mut contents = Self::acquire(runtime, env, string)?;
        Ok(std::mem::take(&mut contents.text))
    }
}

impl Drop for StringContents<'_> {
    fn drop(&mut self) {
        self.runtime.release_string_contents(self.env, self.string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::OpaqueHandle;
    use crate::mock::{MockRuntime, RuntimeCall};

    fn sig(text: &str) -> MethodSignature {
        MethodSignature::parse(text).unwrap()
    }

    #[test]
    fn test_int_argument_cell() {
        let rt = MockRuntime::new();
        let env = rt.current_env().unwrap();
        let buffer =
            ArgBuffer::marshal(&rt, env, "check", &sig("(I)Z"), &[Value::Int(42)]).unwrap();
        assert_eq!(buffer.cells(), [JValue::Int(42)]);
    }

    #[test]
    fn test_primitive_widths_wrap() {
        let rt = MockRuntime::new();
        let env = rt.current_env().unwrap();
        let args = [
            Value::Int(300),
            Value::Int(0x1_0041),
            Value::Int(70_000),
            Value::Int(1 << 40),
            Value::Int(1 << 40),
            Value::Float(1.5),
            Value::Int(3),
            Value::Int(2),
        ];
        let widths = sig("(B;C;S;I;J;F;D;Z)V");
        let buffer = ArgBuffer::marshal(&rt, env, "widths", &widths, &args).unwrap();
        assert_eq!(
            buffer.cells(),
            [
                JValue::Byte(44),
                JValue::Char(0x41),
                JValue::Short(4464),
                JValue::Int(0),
                JValue::Long(1 << 40),
                JValue::Float(1.5),
                JValue::Double(3.0),
                JValue::Boolean(true),
            ]
        );
    }

    #[test]
    fn test_char_from_single_unit_text() {
        let rt = MockRuntime::new();
        let env = rt.current_env().unwrap();
        let buffer = ArgBuffer::marshal(&rt, env, "c", &sig("(C)V"), &["A".into()]).unwrap();
        assert_eq!(buffer.cells(), [JValue::Char(65)]);

        let err = ArgBuffer::marshal(&rt, env, "c", &sig("(C)V"), &["AB".into()]).err();
        assert!(matches!(err, Some(BridgeError::InvalidArgument { index: 0, .. })));
    }

    #[test]
    fn test_null_string_skips_string_service() {
        let rt = MockRuntime::new();
        let env = rt.current_env().unwrap();
        let buffer = ArgBuffer::marshal(
            &rt,
            env,
            "s",
            &sig("(Ljava/lang/String;)V"),
            &[Value::Null],
        )
        .unwrap();
        assert_eq!(buffer.cells(), [JValue::null()]);
        assert!(rt.calls().is_empty());
    }

    #[test]
    fn test_string_locals_released_on_drop() {
        let rt = MockRuntime::new();
        let env = rt.current_env().unwrap();
        {
            let buffer = ArgBuffer::marshal(
                &rt,
                env,
                "s",
                &sig("(Ljava/lang/String;)V"),
                &["hi".into()],
            )
            .unwrap();
            assert_eq!(buffer.len(), 1);
            assert_eq!(rt.live_local_refs(), 1);
        }
        assert_eq!(rt.live_local_refs(), 0);
    }

    #[test]
    fn test_partial_marshal_releases_created_strings() {
        let rt = MockRuntime::new();
        let env = rt.current_env().unwrap();
        let err = ArgBuffer::marshal(
            &rt,
            env,
            "s",
            &sig("(Ljava/lang/String;I)V"),
            &["hi".into(), "not an int".into()],
        )
        .err();
        assert!(matches!(err, Some(BridgeError::InvalidArgument { index: 1, .. })));
        assert_eq!(rt.live_local_refs(), 0);
        assert_eq!(rt.count_calls(|c| matches!(c, RuntimeCall::DeleteLocalRef)), 1);
    }

    #[test]
    fn test_object_argument_requires_handle() {
        let rt = MockRuntime::new();
        let env = rt.current_env().unwrap();
        let obj = ObjectRef::from_raw(0x99).unwrap();
        let buffer = ArgBuffer::marshal(
            &rt,
            env,
            "o",
            &sig("(Ljava/lang/Object;)V"),
            &[OpaqueHandle::bound(obj).into()],
        )
        .unwrap();
        assert_eq!(buffer.cells(), [JValue::Object(Some(obj))]);

        let object_sig = sig("(Ljava/lang/Object;)V");
        let err = ArgBuffer::marshal(&rt, env, "o", &object_sig, &[Value::Int(1)]).err();
        assert!(matches!(err, Some(BridgeError::InvalidArgument { .. })));
    }

    #[test]
    fn test_arity_and_arrays_fail_before_runtime() {
        let rt = MockRuntime::new();
        let env = rt.current_env().unwrap();

        let err = ArgBuffer::marshal(&rt, env, "f", &sig("(I;I)V"), &[Value::Int(1)]).err();
        assert!(matches!(
            err,
            Some(BridgeError::ArityMismatch { expected: 2, got: 1, .. })
        ));

        let err = ArgBuffer::marshal(
            &rt,
            env,
            "f",
            &sig("(Ljava/lang/String;[I)V"),
            &["x".into(), Value::Null],
        )
        .err();
        assert!(matches!(err, Some(BridgeError::NotImplemented(_))));
        assert!(rt.calls().is_empty());
    }

    #[test]
    fn test_string_contents_released_once() {
        let rt = MockRuntime::new();
        let env = rt.current_env().unwrap();
        let string = rt.new_string(env, "hello").unwrap();
        rt.clear_calls();

        let text = StringContents::read(&rt, env, string).unwrap();
        assert_eq!(text, "hello");
        assert_eq!(
            rt.count_calls(|c| matches!(c, RuntimeCall::ReleaseStringContents)),
            1
        );
    }
}
