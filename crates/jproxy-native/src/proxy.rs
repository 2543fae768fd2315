// #[derive(ForeignProxy)] implementation
//
// Generates the ForeignProxy impl, a constructor and one method per
// declaration for a newtype over ProxyObject.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Result};

use crate::attrs::{parse_foreign_attrs, MethodAttr};

/// Expands #[derive(ForeignProxy)].
///
/// Example expansion:
/// ```ignore
/// // Input:
/// #[derive(ForeignProxy)]
/// #[foreign(class = "demo/Checker")]
/// #[foreign(method(name = "isPositive", signature = "(I)Z"))]
/// struct Checker(ProxyObject);
///
/// // Output:
/// impl ::jproxy_sdk::ForeignProxy for Checker {
///     fn definition() -> ::jproxy_sdk::ProxyClassDef {
///         ::jproxy_sdk::ProxyClassDef::builder("Checker")
///             .class_path("demo/Checker")
///             .declare("is_positive", "isPositive", "(I)Z", false)
///             .build()
///     }
///     fn from_object(object: ::jproxy_sdk::ProxyObject) -> Self { Self(object) }
///     fn object(&self) -> &::jproxy_sdk::ProxyObject { &self.0 }
/// }
///
/// impl Checker {
///     pub fn new(runtime: Rc<dyn ForeignRuntime>) -> BridgeResult<Self> { ... }
///     pub fn is_positive(&self, a0: impl Into<Value>) -> BridgeResult<Value> { ... }
/// }
/// ```
pub fn expand_foreign_proxy(input: DeriveInput) -> Result<TokenStream> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {}
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "#[derive(ForeignProxy)] requires a newtype struct over ProxyObject",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[derive(ForeignProxy)] can only be applied to structs",
            ))
        }
    }

    let attrs = parse_foreign_attrs(&input.attrs)?;
    let ident = &input.ident;
    let proxy_name = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let class_path = attrs.class.as_ref().map(|path| quote! { .class_path(#path) });
    let constructor = attrs
        .constructor
        .as_ref()
        .map(|sig| {
            let text = &sig.text;
            quote! { .constructor(#text) }
        });
    let ctor_arity = attrs.constructor.as_ref().map_or(0, |sig| sig.arity);

    let declarations = attrs.methods.iter().map(|m| {
        let member = m.member.to_string();
        let name = &m.name;
        let signature = &m.signature.text;
        let is_static = m.is_static;
        quote! { .declare(#member, #name, #signature, #is_static) }
    });

    let ctor_params = params(ctor_arity);
    let ctor_doc = format!(
        "Resolve `{}` and construct an instance",
        attrs.class.as_deref().unwrap_or(&proxy_name)
    );
    let methods = attrs.methods.iter().map(expand_method);

    Ok(quote! {
        impl #impl_generics ::jproxy_sdk::ForeignProxy for #ident #ty_generics #where_clause {
            fn definition() -> ::jproxy_sdk::ProxyClassDef {
                ::jproxy_sdk::ProxyClassDef::builder(#proxy_name)
                    #class_path
                    #constructor
                    #(#declarations)*
                    .build()
            }

            fn from_object(object: ::jproxy_sdk::ProxyObject) -> Self {
                Self(object)
            }

            fn object(&self) -> &::jproxy_sdk::ProxyObject {
                &self.0
            }
        }

        impl #impl_generics #ident #ty_generics #where_clause {
            #[doc = #ctor_doc]
            pub fn new(
                runtime: ::std::rc::Rc<dyn ::jproxy_sdk::ForeignRuntime>,
                #(#ctor_params: impl ::core::convert::Into<::jproxy_sdk::Value>),*
            ) -> ::jproxy_sdk::BridgeResult<Self> {
                <Self as ::jproxy_sdk::ForeignProxy>::instantiate(
                    runtime,
                    &[#(::core::convert::Into::<::jproxy_sdk::Value>::into(#ctor_params)),*],
                )
            }

            #(#methods)*
        }
    })
}

fn expand_method(method: &MethodAttr) -> TokenStream {
    let fn_name = &method.member;
    let member = method.member.to_string();
    let params = params(method.signature.arity);
    let doc = format!(
        "Calls {}`{}{}` on the foreign object",
        if method.is_static { "static " } else { "" },
        method.name,
        method.signature.text
    );

    quote! {
        #[doc = #doc]
        pub fn #fn_name(
            &self,
            #(#params: impl ::core::convert::Into<::jproxy_sdk::Value>),*
        ) -> ::jproxy_sdk::BridgeResult<::jproxy_sdk::Value> {
            ::jproxy_sdk::ForeignProxy::object(self).call(
                #member,
                &[#(::core::convert::Into::<::jproxy_sdk::Value>::into(#params)),*],
            )
        }
    }
}

fn params(arity: usize) -> Vec<syn::Ident> {
    (0..arity)
        .map(|i| format_ident!("a{}", i, span = Span::call_site()))
        .collect()
}
