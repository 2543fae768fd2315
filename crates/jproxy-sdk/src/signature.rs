//! Method signature parsing
//!
//! A signature has the form `(<arg-descriptors>)<return-descriptor>`, with
//! argument descriptors separated by [`DESCRIPTOR_DELIMITER`], e.g.
//! `(I;Ljava/lang/String;)Z`. Parsing only splits the text into descriptor
//! tokens; a token is decoded into a [`TypeDescriptor`] the first time it is
//! used, so an unknown type surfaces at marshaling or dispatch time.

use std::fmt;

use crate::error::{BridgeError, BridgeResult};

/// Signature used when a proxy declares no constructor
pub const DEFAULT_CONSTRUCTOR: &str = "()V";

/// Class path decoded as [`TypeDescriptor::StringRef`]
pub const STRING_CLASS: &str = "java/lang/String";

/// Separator between argument descriptors
pub const DESCRIPTOR_DELIMITER: char = ';';

// ============================================================================
// TypeDescriptor
// ============================================================================

/// Decoded type of one argument or return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// `Z`
    Boolean,
    /// `B`
    Byte,
    /// `C`
    Char,
    /// `S`
    Short,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `F`
    Float,
    /// `D`
    Double,
    /// `V`
    Void,
    /// `Ljava/lang/String;`
    StringRef,
    /// `L<path>;` for any other class; `None` when the path is empty
    ObjectRef(Option<String>),
    /// `[<elem>`; unsupported, kept so the caller can report it
    ArrayRef(String),
}

impl TypeDescriptor {
    /// Decode a single descriptor token by its leading character.
    ///
    /// Primitive tokens are decided by the tag alone. An object token is
    /// `L<path>`, with an optional trailing `;` as written in return position.
    pub fn parse(token: &str) -> BridgeResult<Self> {
        let mut chars = token.chars();
        let Some(lead) = chars.next() else {
            return Err(BridgeError::InvalidDescriptor(token.to_string()));
        };
        let rest = chars.as_str();

        let descriptor = match lead {
            'Z' => TypeDescriptor::Boolean,
            'B' => TypeDescriptor::Byte,
            'C' => TypeDescriptor::Char,
            'S' => TypeDescriptor::Short,
            'I' => TypeDescriptor::Int,
            'J' => TypeDescriptor::Long,
            'F' => TypeDescriptor::Float,
            'D' => TypeDescriptor::Double,
            'V' => TypeDescriptor::Void,
            'L' => match rest.strip_suffix(DESCRIPTOR_DELIMITER).unwrap_or(rest) {
                STRING_CLASS => TypeDescriptor::StringRef,
                "" => TypeDescriptor::ObjectRef(None),
                path => TypeDescriptor::ObjectRef(Some(path.to_string())),
            },
            '[' => TypeDescriptor::ArrayRef(rest.to_string()),
            _ => return Err(BridgeError::InvalidDescriptor(token.to_string())),
        };
        Ok(descriptor)
    }

    /// Leading tag character of the descriptor
    pub fn tag(&self) -> char {
        match self {
            TypeDescriptor::Boolean => 'Z',
            TypeDescriptor::Byte => 'B',
            TypeDescriptor::Char => 'C',
            TypeDescriptor::Short => 'S',
            TypeDescriptor::Int => 'I',
            TypeDescriptor::Long => 'J',
            TypeDescriptor::Float => 'F',
            TypeDescriptor::Double => 'D',
            TypeDescriptor::Void => 'V',
            TypeDescriptor::StringRef | TypeDescriptor::ObjectRef(_) => 'L',
            TypeDescriptor::ArrayRef(_) => '[',
        }
    }

    /// Check if this is one of the eight primitive value types
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Boolean
                | TypeDescriptor::Byte
                | TypeDescriptor::Char
                | TypeDescriptor::Short
                | TypeDescriptor::Int
                | TypeDescriptor::Long
                | TypeDescriptor::Float
                | TypeDescriptor::Double
        )
    }

    /// Human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Boolean => "boolean",
            TypeDescriptor::Byte => "byte",
            TypeDescriptor::Char => "char",
            TypeDescriptor::Short => "short",
            TypeDescriptor::Int => "int",
            TypeDescriptor::Long => "long",
            TypeDescriptor::Float => "float",
            TypeDescriptor::Double => "double",
            TypeDescriptor::Void => "void",
            TypeDescriptor::StringRef => "string",
            TypeDescriptor::ObjectRef(_) => "object",
            TypeDescriptor::ArrayRef(_) => "array",
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::StringRef => write!(f, "L{};", STRING_CLASS),
            TypeDescriptor::ObjectRef(Some(path)) => write!(f, "L{};", path),
            TypeDescriptor::ObjectRef(None) => write!(f, "L;"),
            TypeDescriptor::ArrayRef(elem) => write!(f, "[{}", elem),
            other => write!(f, "{}", other.tag()),
        }
    }
}

// ============================================================================
// MethodSignature
// ============================================================================

/// Parsed method or constructor signature.
///
/// Holds the descriptor tokens exactly as written. The argument count is
/// fixed here and every call site must supply exactly that many values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    text: String,
    args: Vec<String>,
    ret: String,
}

impl MethodSignature {
    /// Parse `(<args>)<ret>` into descriptor tokens.
    pub fn parse(text: &str) -> BridgeResult<Self> {
        let malformed = || BridgeError::MalformedSignature(text.to_string());

        let body = text.strip_prefix('(').ok_or_else(malformed)?;
        let parts: Vec<&str> = body.split(')').collect();
        let [args, ret] = parts.as_slice() else {
            return Err(malformed());
        };

        Ok(Self {
            text: text.to_string(),
            args: split_descriptors(args),
            ret: ret.to_string(),
        })
    }

    /// Original signature text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of declared arguments
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Argument descriptor tokens, in order
    pub fn arg_tokens(&self) -> &[String] {
        &self.args
    }

    /// Return descriptor token
    pub fn return_token(&self) -> &str {
        &self.ret
    }

    /// Decode every argument token.
    pub fn arg_descriptors(&self) -> BridgeResult<Vec<TypeDescriptor>> {
        self.args.iter().map(|token| TypeDescriptor::parse(token)).collect()
    }

    /// Decode the return token.
    pub fn return_descriptor(&self) -> BridgeResult<TypeDescriptor> {
        TypeDescriptor::parse(&self.ret)
            .map_err(|_| BridgeError::InvalidReturnDescriptor(self.ret.clone()))
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Cut the argument portion into descriptor tokens.
///
/// One trailing empty token, left by a terminal delimiter, is dropped.
/// Joining the tokens with the delimiter gives back the input, up to that
/// terminal delimiter.
fn split_descriptors(args: &str) -> Vec<String> {
    if args.is_empty() {
        return Vec::new();
    }
    let mut tokens: Vec<String> = args.split(DESCRIPTOR_DELIMITER).map(str::to_string).collect();
    if tokens.last().is_some_and(|last| last.is_empty()) {
        tokens.pop();
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive_signature() {
        let sig = MethodSignature::parse("(I)Z").unwrap();
        assert_eq!(sig.arity(), 1);
        assert_eq!(sig.arg_tokens(), ["I"]);
        assert_eq!(sig.return_token(), "Z");
        assert_eq!(sig.arg_descriptors().unwrap(), vec![TypeDescriptor::Int]);
        assert_eq!(sig.return_descriptor().unwrap(), TypeDescriptor::Boolean);
    }

    #[test]
    fn test_parse_empty_arguments() {
        let sig = MethodSignature::parse(DEFAULT_CONSTRUCTOR).unwrap();
        assert_eq!(sig.arity(), 0);
        assert_eq!(sig.return_descriptor().unwrap(), TypeDescriptor::Void);
    }

    #[test]
    fn test_parse_mixed_tokens() {
        let sig = MethodSignature::parse("(I;Ljava/lang/String;[J;Ljava/util/List;D)V").unwrap();
        assert_eq!(
            sig.arg_tokens(),
            ["I", "Ljava/lang/String", "[J", "Ljava/util/List", "D"]
        );
        assert_eq!(
            sig.arg_descriptors().unwrap(),
            vec![
                TypeDescriptor::Int,
                TypeDescriptor::StringRef,
                TypeDescriptor::ArrayRef("J".to_string()),
                TypeDescriptor::ObjectRef(Some("java/util/List".to_string())),
                TypeDescriptor::Double,
            ]
        );
    }

    #[test]
    fn test_tokens_split_on_delimiter() {
        assert_eq!(MethodSignature::parse("(II)V").unwrap().arg_tokens(), ["II"]);
        assert_eq!(
            MethodSignature::parse("(ILjava/lang/String;)V").unwrap().arg_tokens(),
            ["ILjava/lang/String"]
        );
        assert_eq!(
            MethodSignature::parse("(Ljava/lang/String;Ljava/lang/Object;)V")
                .unwrap()
                .arg_tokens(),
            ["Ljava/lang/String", "Ljava/lang/Object"]
        );
        // Only one trailing empty token is dropped
        assert_eq!(MethodSignature::parse("(I;;)V").unwrap().arg_tokens(), ["I", ""]);
    }

    #[test]
    fn test_tokens_rejoin_losslessly() {
        let cases = [
            "I",
            "Z;B;C;S;I;J;F;D",
            "Ljava/lang/String",
            "Ljava/lang/String;I;Ljava/lang/Object",
            "[I;[[Ljava/lang/String;J",
        ];
        for args in cases {
            let sig = MethodSignature::parse(&format!("({})V", args)).unwrap();
            assert_eq!(sig.arg_tokens().join(";"), args, "args portion {:?}", args);

            let terminated = format!("{};", args);
            let sig = MethodSignature::parse(&format!("({})V", terminated)).unwrap();
            assert_eq!(
                format!("{};", sig.arg_tokens().join(";")),
                terminated,
                "args portion {:?}",
                terminated
            );
        }
        assert!(MethodSignature::parse("()V").unwrap().arg_tokens().is_empty());
    }

    #[test]
    fn test_malformed_signatures() {
        for text in ["", "I)V", "(IV", "(I)V)", "(I))V"] {
            assert_eq!(
                MethodSignature::parse(text).unwrap_err(),
                BridgeError::MalformedSignature(text.to_string()),
                "signature {:?}",
                text
            );
        }
    }

    #[test]
    fn test_descriptor_decoding() {
        assert_eq!(TypeDescriptor::parse("J").unwrap(), TypeDescriptor::Long);
        assert_eq!(
            TypeDescriptor::parse("Ljava/lang/String;").unwrap(),
            TypeDescriptor::StringRef
        );
        assert_eq!(
            TypeDescriptor::parse("Ljava/util/Map;").unwrap(),
            TypeDescriptor::ObjectRef(Some("java/util/Map".to_string()))
        );
        assert_eq!(
            TypeDescriptor::parse("Ljava/util/Map").unwrap(),
            TypeDescriptor::ObjectRef(Some("java/util/Map".to_string()))
        );
        assert_eq!(TypeDescriptor::parse("L;").unwrap(), TypeDescriptor::ObjectRef(None));
        assert_eq!(TypeDescriptor::parse("L").unwrap(), TypeDescriptor::ObjectRef(None));
        // Decided by the leading character alone
        assert_eq!(TypeDescriptor::parse("II").unwrap(), TypeDescriptor::Int);
        assert_eq!(
            TypeDescriptor::parse("[I").unwrap(),
            TypeDescriptor::ArrayRef("I".to_string())
        );
    }

    #[test]
    fn test_invalid_descriptors_fail_lazily() {
        // Parsing the signature succeeds; decoding the tokens does not.
        let sig = MethodSignature::parse("(Q)X").unwrap();
        assert_eq!(
            sig.arg_descriptors().unwrap_err(),
            BridgeError::InvalidDescriptor("Q".to_string())
        );
        assert_eq!(
            sig.return_descriptor().unwrap_err(),
            BridgeError::InvalidReturnDescriptor("X".to_string())
        );
        assert!(TypeDescriptor::parse("").is_err());
        assert!(TypeDescriptor::parse(";").is_err());
    }

    #[test]
    fn test_display_round_trips_descriptor() {
        for token in ["Z", "C", "Ljava/lang/String;", "Ljava/util/Map;", "[I"] {
            assert_eq!(TypeDescriptor::parse(token).unwrap().to_string(), token);
        }
    }
}
