//! Proxy manifest parsing (jproxy.toml)
//!
//! A manifest registers proxy declarations without code:
//!
//! ```toml
//! [[proxy]]
//! name = "StringBuilder"
//! class = "java/lang/StringBuilder"
//! constructor = "(Ljava/lang/String;)V"
//!
//! [[proxy.method]]
//! name = "append"
//! signature = "(Ljava/lang/String;)Ljava/lang/StringBuilder;"
//!
//! [[proxy.method]]
//! name = "valueOf"
//! member = "value_of"
//! signature = "(I)Ljava/lang/String;"
//! static = true
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::BridgeError;
use crate::proxy::ProxyClassDef;
use crate::signature::{MethodSignature, TypeDescriptor};

/// Errors that can occur while loading a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read manifest file
    #[error("Failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid manifest: {0}")]
    Validation(String),
}

/// A set of proxy declarations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyManifest {
    /// Declared proxies, in file order
    #[serde(default, rename = "proxy")]
    pub proxies: Vec<ProxyClassDef>,
}

/// A declaration that would fail once it reaches the runtime
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestIssue {
    /// Proxy name
    pub proxy: String,
    /// Member name, or `None` for class-level issues
    pub member: Option<String>,
    /// What resolution or invocation would report
    pub error: BridgeError,
}

impl ProxyManifest {
    /// Load from a file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        let manifest: ProxyManifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check structural rules: non-empty, unique proxy names and unique
    /// member names within each proxy.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut names = HashSet::new();
        for proxy in &self.proxies {
            if proxy.name.is_empty() {
                return Err(ManifestError::Validation(
                    "proxy name cannot be empty".to_string(),
                ));
            }
            if !names.insert(proxy.name.as_str()) {
                return Err(ManifestError::Validation(format!(
                    "duplicate proxy '{}'",
                    proxy.name
                )));
            }

            let mut members = HashSet::new();
            for method in &proxy.methods {
                if method.name.is_empty() {
                    return Err(ManifestError::Validation(format!(
                        "proxy '{}' declares a method without a name",
                        proxy.name
                    )));
                }
                if !members.insert(method.member_name()) {
                    return Err(ManifestError::Validation(format!(
                        "proxy '{}' declares member '{}' twice",
                        proxy.name,
                        method.member_name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Find a proxy by name
    pub fn get(&self, name: &str) -> Option<&ProxyClassDef> {
        self.proxies.iter().find(|p| p.name == name)
    }

    /// Decode every signature eagerly and report what would fail at runtime.
    ///
    /// Arrays are reported as `NotImplemented`, matching what a call would
    /// return. Lookups against the runtime are not attempted.
    pub fn lint(&self) -> Vec<ManifestIssue> {
        let mut issues = Vec::new();
        for proxy in &self.proxies {
            let mut report = |member: Option<&str>, error: BridgeError| {
                issues.push(ManifestIssue {
                    proxy: proxy.name.clone(),
                    member: member.map(str::to_string),
                    error,
                })
            };

            if proxy.class_path.is_none() {
                report(None, BridgeError::MissingClassDeclaration(proxy.name.clone()));
            }
            if let Err(error) = check_signature(proxy.constructor_signature(), true) {
                report(None, error);
            }
            for method in &proxy.methods {
                if let Err(error) = check_signature(&method.signature, false) {
                    report(Some(method.member_name()), error);
                }
            }
        }
        issues
    }
}

fn check_signature(text: &str, constructor: bool) -> Result<(), BridgeError> {
    let signature = MethodSignature::parse(text)?;
    for (token, descriptor) in signature.arg_tokens().iter().zip(signature.arg_descriptors()?) {
        match descriptor {
            TypeDescriptor::ArrayRef(_) => {
                return Err(BridgeError::NotImplemented(format!("array argument '{}'", token)))
            }
            TypeDescriptor::Void => return Err(BridgeError::InvalidDescriptor(token.clone())),
            _ => {}
        }
    }

    match signature.return_descriptor()? {
        TypeDescriptor::ArrayRef(_) => Err(BridgeError::NotImplemented(format!(
            "array return '{}'",
            signature.return_token()
        ))),
        TypeDescriptor::Void => Ok(()),
        _ if constructor => Err(BridgeError::InvalidReturnDescriptor(
            signature.return_token().to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BUILDER: &str = r#"
[[proxy]]
name = "StringBuilder"
class = "java/lang/StringBuilder"
constructor = "(Ljava/lang/String;)V"

[[proxy.method]]
name = "append"
signature = "(Ljava/lang/String;)Ljava/lang/StringBuilder;"

[[proxy.method]]
name = "valueOf"
member = "value_of"
signature = "(I)Ljava/lang/String;"
static = true
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = ProxyManifest::from_str(BUILDER).unwrap();
        let def = manifest.get("StringBuilder").unwrap();
        assert_eq!(def.class_path.as_deref(), Some("java/lang/StringBuilder"));
        assert_eq!(def.methods.len(), 2);
        assert!(!def.methods[0].is_static);

        let value_of = def.method("value_of").unwrap();
        assert_eq!(value_of.name, "valueOf");
        assert!(value_of.is_static);
        assert!(manifest.lint().is_empty());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUILDER.as_bytes()).unwrap();
        let manifest = ProxyManifest::from_file(file.path()).unwrap();
        assert_eq!(manifest.proxies.len(), 1);

        let missing = ProxyManifest::from_file(Path::new("/nonexistent/jproxy.toml"));
        assert!(matches!(missing, Err(ManifestError::Io(_))));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let content = r#"
[[proxy]]
name = "List"
class = "java/util/ArrayList"

[[proxy.method]]
name = "size"
signature = "()I"

[[proxy.method]]
name = "length"
member = "size"
signature = "()I"
"#;
        assert!(matches!(
            ProxyManifest::from_str(content),
            Err(ManifestError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            ProxyManifest::from_str("[[proxy]\nname ="),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn test_lint_reports_runtime_failures() {
        let content = r#"
[[proxy]]
name = "Broken"
constructor = "(I)I"

[[proxy.method]]
name = "sum"
signature = "([I)I"

[[proxy.method]]
name = "odd"
signature = "(Q)V"

[[proxy.method]]
name = "bad"
signature = "I)V"
"#;
        let manifest = ProxyManifest::from_str(content).unwrap();
        let issues = manifest.lint();
        assert_eq!(issues.len(), 5);
        assert_eq!(
            issues[0].error,
            BridgeError::MissingClassDeclaration("Broken".to_string())
        );
        assert_eq!(
            issues[1].error,
            BridgeError::InvalidReturnDescriptor("I".to_string())
        );
        assert_eq!(issues[2].member.as_deref(), Some("sum"));
        assert!(matches!(issues[2].error, BridgeError::NotImplemented(_)));
        assert_eq!(issues[3].error, BridgeError::InvalidDescriptor("Q".to_string()));
        assert_eq!(issues[4].error, BridgeError::MalformedSignature("I)V".to_string()));
    }
}
