//! Error types for the bridge
//!
//! Every failure, whether in resolution, construction or a single call, is
//! reported as one `BridgeError`. Nothing is retried; the operation in
//! progress is abandoned without partial effects.

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// Proxy type declares no foreign class path
    #[error("Proxy '{0}' does not declare a foreign class")]
    MissingClassDeclaration(String),

    /// No foreign environment is attached to the calling thread
    #[error("No foreign runtime environment is attached to the current thread")]
    MissingEnvironment,

    /// Class lookup returned nothing
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// Method lookup returned nothing
    #[error("Method not found: {class}.{name}{signature}")]
    MethodNotFound {
        /// Foreign class path
        class: String,
        /// Foreign method name
        name: String,
        /// Signature text
        signature: String,
    },

    /// Constructor lookup returned nothing
    #[error("Constructor not found: {class}.<init>{signature}")]
    ConstructorNotFound {
        /// Foreign class path
        class: String,
        /// Signature text
        signature: String,
    },

    /// Supplied argument count differs from the signature
    #[error("'{callee}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        /// Method or constructor being called
        callee: String,
        /// Number of descriptors in the signature
        expected: usize,
        /// Number of supplied values
        got: usize,
    },

    /// Signature is not of the form `(<args>)<ret>`
    #[error("Malformed signature: '{0}'")]
    MalformedSignature(String),

    /// Descriptor token is not a known type
    #[error("Invalid type descriptor: '{0}'")]
    InvalidDescriptor(String),

    /// Native value cannot be converted for its descriptor
    #[error("Argument {index}: descriptor '{descriptor}' cannot accept {got}")]
    InvalidArgument {
        /// Zero-based argument position
        index: usize,
        /// Descriptor token at that position
        descriptor: String,
        /// Kind of the supplied value
        got: &'static str,
    },

    /// Return descriptor is not a known type
    #[error("Invalid return descriptor: '{0}'")]
    InvalidReturnDescriptor(String),

    /// Unsupported feature (array arguments and returns)
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Argument buffer could not be reserved
    #[error("Failed to allocate an argument buffer of {0} cells")]
    AllocationFailure(usize),

    /// The foreign call raised
    #[error("Foreign exception: {0}")]
    ForeignException(String),

    /// Instance method called before an instance exists
    #[error("Method '{0}' needs an instance but the proxy has not been constructed")]
    UnboundInstance(String),

    /// Decoded result does not have the requested Rust type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Member is not declared on the proxy
    #[error("Proxy '{proxy}' has no member '{member}'")]
    UnknownMember {
        /// Proxy name
        proxy: String,
        /// Requested member
        member: String,
    },
}

impl From<String> for BridgeError {
    fn from(s: String) -> Self {
        BridgeError::ForeignException(s)
    }
}

impl From<&str> for BridgeError {
    fn from(s: &str) -> Self {
        BridgeError::ForeignException(s.to_string())
    }
}
