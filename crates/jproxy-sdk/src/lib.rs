//! jproxy SDK - reflective proxies for classes in a foreign VM
//!
//! A proxy declares a foreign class path, an optional constructor signature
//! and the methods it binds. Constructing the proxy resolves the class and
//! every method by name and signature through a [`ForeignRuntime`], then
//! constructs the foreign instance. Calls marshal native [`Value`]s into
//! argument cells, dispatch on the declared return type and decode the
//! result back into a [`Value`].
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use jproxy_sdk::{ProxyClassDef, ProxyObject, Value};
//!
//! let def = ProxyClassDef::builder("Checker")
//!     .class_path("demo/Checker")
//!     .method("isPositive", "(I)Z")
//!     .build();
//!
//! let checker = ProxyObject::instantiate(&def, runtime.clone(), &[])?;
//! let positive = checker.call("isPositive", &[Value::Int(42)])?;
//! assert_eq!(positive.as_bool(), Some(true));
//! ```
//!
//! Proxies share the runtime through `Rc`, so they stay on the thread that
//! is attached to the foreign VM.

#![warn(missing_docs)]

pub mod error;
pub mod handle;
pub mod manifest;
pub mod marshal;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod proxy;
pub mod runtime;
pub mod signature;
pub mod value;

pub use error::{BridgeError, BridgeResult};
pub use handle::OpaqueHandle;
pub use manifest::{ManifestError, ManifestIssue, ProxyManifest};
pub use marshal::{ArgBuffer, StringContents};
pub use proxy::{
    BoundMethod, ForeignProxy, MethodDecl, MethodRef, ProxyClass, ProxyClassDef,
    ProxyClassDefBuilder, ProxyObject,
};
pub use runtime::{ClassRef, EnvRef, ForeignRuntime, JValue, MethodId, ObjectRef};
pub use signature::{
    MethodSignature, TypeDescriptor, DEFAULT_CONSTRUCTOR, DESCRIPTOR_DELIMITER, STRING_CLASS,
};
pub use value::{FromValue, Value};
