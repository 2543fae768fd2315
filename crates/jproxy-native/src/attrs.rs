// #[foreign(...)] attribute parsing

use jproxy_sdk::MethodSignature;
use syn::{Attribute, Ident, LitStr, Result};

/// A signature literal, parsed at expansion time.
pub struct SignatureLit {
    pub text: String,
    pub arity: usize,
}

impl SignatureLit {
    fn parse(lit: &LitStr) -> Result<Self> {
        let text = lit.value();
        let signature =
            MethodSignature::parse(&text).map_err(|e| syn::Error::new(lit.span(), e.to_string()))?;
        Ok(Self {
            arity: signature.arity(),
            text,
        })
    }
}

/// One `method(...)` or `static_method(...)` entry.
pub struct MethodAttr {
    pub name: String,
    pub member: Ident,
    pub signature: SignatureLit,
    pub is_static: bool,
}

/// Everything declared through `#[foreign(...)]` on one type.
#[derive(Default)]
pub struct ForeignAttrs {
    pub class: Option<String>,
    pub constructor: Option<SignatureLit>,
    pub methods: Vec<MethodAttr>,
}

pub fn parse_foreign_attrs(attrs: &[Attribute]) -> Result<ForeignAttrs> {
    let mut parsed = ForeignAttrs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("foreign")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("class") {
                let lit: LitStr = meta.value()?.parse()?;
                if parsed.class.is_some() {
                    return Err(syn::Error::new(lit.span(), "duplicate `class`"));
                }
                parsed.class = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("constructor") {
                let lit: LitStr = meta.value()?.parse()?;
                if parsed.constructor.is_some() {
                    return Err(syn::Error::new(lit.span(), "duplicate `constructor`"));
                }
                parsed.constructor = Some(SignatureLit::parse(&lit)?);
                Ok(())
            } else if meta.path.is_ident("method") || meta.path.is_ident("static_method") {
                let is_static = meta.path.is_ident("static_method");
                let mut name: Option<LitStr> = None;
                let mut signature: Option<LitStr> = None;
                let mut member: Option<LitStr> = None;

                meta.parse_nested_meta(|inner| {
                    let slot = if inner.path.is_ident("name") {
                        &mut name
                    } else if inner.path.is_ident("signature") {
                        &mut signature
                    } else if inner.path.is_ident("member") {
                        &mut member
                    } else {
                        return Err(inner.error("expected `name`, `signature` or `member`"));
                    };
                    *slot = Some(inner.value()?.parse()?);
                    Ok(())
                })?;

                let name = name.ok_or_else(|| meta.error("missing `name`"))?;
                let signature = signature.ok_or_else(|| meta.error("missing `signature`"))?;
                let member = match member {
                    Some(lit) => member_ident(&lit.value(), &lit)?,
                    None => member_ident(&to_snake_case(&name.value()), &name)?,
                };

                if parsed.methods.iter().any(|m| m.member == member) {
                    return Err(syn::Error::new(
                        member.span(),
                        format!("member `{}` is declared twice", member),
                    ));
                }
                parsed.methods.push(MethodAttr {
                    name: name.value(),
                    member,
                    signature: SignatureLit::parse(&signature)?,
                    is_static,
                });
                Ok(())
            } else {
                Err(meta.error(
                    "expected `class`, `constructor`, `method(...)` or `static_method(...)`",
                ))
            }
        })?;
    }

    Ok(parsed)
}

fn member_ident(name: &str, lit: &LitStr) -> Result<Ident> {
    syn::parse_str::<Ident>(name)
        .map(|ident| Ident::new(&ident.to_string(), lit.span()))
        .map_err(|_| {
            syn::Error::new(
                lit.span(),
                format!("`{}` is not a usable method name; set `member`", name),
            )
        })
}

/// `isPositive` -> `is_positive`, `getURL` -> `get_url`
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower =
                i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if prev_lower || (prev_upper && next_lower) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("isPositive"), "is_positive");
        assert_eq!(to_snake_case("valueOf"), "value_of");
        assert_eq!(to_snake_case("getURL"), "get_url");
        assert_eq!(to_snake_case("parseHTTPHeader"), "parse_http_header");
        assert_eq!(to_snake_case("size"), "size");
        assert_eq!(to_snake_case("get2D"), "get2_d");
    }

    #[test]
    fn test_parse_attrs() {
        let item: syn::DeriveInput = syn::parse_quote! {
            #[foreign(class = "java/util/ArrayList", constructor = "(I)V")]
            #[foreign(method(name = "isEmpty", signature = "()Z"))]
            #[foreign(static_method(
                name = "of",
                signature = "()Ljava/util/List;",
                member = "empty"
            ))]
            struct List(ProxyObject);
        };
        let attrs = parse_foreign_attrs(&item.attrs).unwrap();
        assert_eq!(attrs.class.as_deref(), Some("java/util/ArrayList"));
        assert_eq!(attrs.constructor.as_ref().map(|c| c.arity), Some(1));
        assert_eq!(attrs.methods.len(), 2);
        assert_eq!(attrs.methods[0].member, "is_empty");
        assert!(!attrs.methods[0].is_static);
        assert_eq!(attrs.methods[1].member, "empty");
        assert!(attrs.methods[1].is_static);
    }

    #[test]
    fn test_rejects_bad_declarations() {
        let malformed: syn::DeriveInput = syn::parse_quote! {
            #[foreign(method(name = "size", signature = "I)V"))]
            struct List(ProxyObject);
        };
        assert!(parse_foreign_attrs(&malformed.attrs).is_err());

        let unknown: syn::DeriveInput = syn::parse_quote! {
            #[foreign(klass = "java/util/List")]
            struct List(ProxyObject);
        };
        assert!(parse_foreign_attrs(&unknown.attrs).is_err());

        let keyword: syn::DeriveInput = syn::parse_quote! {
            #[foreign(method(name = "type", signature = "()I"))]
            struct List(ProxyObject);
        };
        assert!(parse_foreign_attrs(&keyword.attrs).is_err());

        let duplicate: syn::DeriveInput = syn::parse_quote! {
            #[foreign(method(name = "size", signature = "()I"))]
            #[foreign(method(name = "length", signature = "()I", member = "size"))]
            struct List(ProxyObject);
        };
        assert!(parse_foreign_attrs(&duplicate.attrs).is_err());
    }
}
