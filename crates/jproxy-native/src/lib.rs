// jproxy-native: declarative proxies for foreign classes
//
// Provides #[derive(ForeignProxy)], which turns a newtype over ProxyObject
// into a typed proxy with a constructor and one method per declaration.
//
// Example:
// ```
// use jproxy_sdk::ProxyObject;
// use jproxy_native::ForeignProxy;
//
// #[derive(ForeignProxy)]
// #[foreign(class = "java/lang/StringBuilder", constructor = "(Ljava/lang/String;)V")]
// #[foreign(method(name = "append", signature = "(Ljava/lang/String;)Ljava/lang/StringBuilder;"))]
// #[foreign(method(name = "toString", signature = "()Ljava/lang/String;", member = "contents"))]
// pub struct StringBuilder(ProxyObject);
// ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod attrs;
mod proxy;

/// Derives `jproxy_sdk::ForeignProxy` for a newtype over `ProxyObject`.
///
/// Declarations are read from `#[foreign(...)]` attributes:
///
/// - `class = "path/to/Class"` - foreign class path
/// - `constructor = "(...)V"` - constructor signature, `()V` when omitted
/// - `method(name = "...", signature = "...", member = "...")` - instance method
/// - `static_method(name = "...", signature = "...", member = "...")` - static method
///
/// `member` defaults to the snake_case form of `name`.
///
/// Generates:
/// - the `ForeignProxy` impl with an explicit, ordered declaration list
/// - `new(runtime, a0, ...)` taking as many arguments as the constructor
/// - one `&self` method per declaration, each argument `impl Into<Value>`,
///   returning `BridgeResult<Value>`
///
/// # Example
///
/// ```ignore
/// #[derive(ForeignProxy)]
/// #[foreign(class = "java/lang/Integer")]
/// #[foreign(static_method(name = "parseInt", signature = "(Ljava/lang/String;)I"))]
/// struct Integer(ProxyObject);
///
/// let int = Integer::new(runtime)?;
/// assert_eq!(int.parse_int("42")?.as_int(), Some(42));
/// ```
#[proc_macro_derive(ForeignProxy, attributes(foreign))]
pub fn derive_foreign_proxy(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    proxy::expand_foreign_proxy(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
