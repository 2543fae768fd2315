//! `jproxy describe`: decode a method signature.

use jproxy_sdk::{BridgeResult, MethodSignature, TypeDescriptor};
use serde::Serialize;
use termcolor::WriteColor;

use crate::output::StyledOutput;

/// One decoded descriptor token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorReport {
    /// Token as written
    pub token: String,
    /// Decoded type name, when the token decodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Decode error, when it doesn't
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DescriptorReport {
    fn new(token: &str, decoded: BridgeResult<TypeDescriptor>) -> Self {
        match decoded {
            Ok(descriptor) => Self {
                token: token.to_string(),
                kind: Some(describe_type(&descriptor)),
                error: None,
            },
            Err(e) => Self {
                token: token.to_string(),
                kind: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Decoded signature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignatureReport {
    /// Signature text
    pub signature: String,
    /// Number of arguments
    pub arity: usize,
    /// Argument descriptors, in order
    pub args: Vec<DescriptorReport>,
    /// Return descriptor
    #[serde(rename = "return")]
    pub ret: DescriptorReport,
}

impl SignatureReport {
    /// Check if every token decodes
    pub fn is_valid(&self) -> bool {
        self.ret.error.is_none() && self.args.iter().all(|a| a.error.is_none())
    }
}

/// Parse `text` and decode each token on its own.
pub fn describe(text: &str) -> BridgeResult<SignatureReport> {
    let signature = MethodSignature::parse(text)?;
    let args = signature
        .arg_tokens()
        .iter()
        .map(|token| DescriptorReport::new(token, TypeDescriptor::parse(token)))
        .collect();
    Ok(SignatureReport {
        signature: signature.to_string(),
        arity: signature.arity(),
        args,
        ret: DescriptorReport::new(signature.return_token(), signature.return_descriptor()),
    })
}

fn describe_type(descriptor: &TypeDescriptor) -> String {
    match descriptor {
        TypeDescriptor::ObjectRef(Some(path)) => format!("object {}", path),
        TypeDescriptor::ArrayRef(element) => format!("array of {} (unsupported)", element),
        other => other.type_name().to_string(),
    }
}

/// Render a report for the terminal
pub fn render<W: WriteColor>(report: &SignatureReport, out: &mut StyledOutput<W>) {
    out.bold(&report.signature);
    out.newline();

    out.plain("  returns  ");
    render_descriptor(&report.ret, out);
    if report.args.is_empty() {
        out.plain("  no arguments");
        out.newline();
    }
    for (i, arg) in report.args.iter().enumerate() {
        out.plain(&format!("  arg {:<4} ", i));
        render_descriptor(arg, out);
    }
}

fn render_descriptor<W: WriteColor>(report: &DescriptorReport, out: &mut StyledOutput<W>) {
    out.info(&format!("{:<24}", report.token));
    match (&report.kind, &report.error) {
        (Some(kind), _) => out.plain(kind),
        (None, Some(error)) => out.error(error),
        (None, None) => {}
    }
    out.newline();
}

/// Run the command. Returns the process exit code.
pub fn execute<W: WriteColor>(
    signature: &str,
    json: bool,
    out: &mut StyledOutput<W>,
) -> anyhow::Result<i32> {
    let report = match describe(signature) {
        Ok(report) => report,
        Err(e) => {
            if json {
                out.plain(&serde_json::to_string_pretty(&serde_json::json!({
                    "signature": signature,
                    "error": e.to_string(),
                }))?);
                out.newline();
            } else {
                out.error("error");
                out.plain(&format!(": {}", e));
                out.newline();
            }
            return Ok(1);
        }
    };

    if json {
        out.plain(&serde_json::to_string_pretty(&report)?);
        out.newline();
    } else {
        render(&report, out);
    }
    Ok(if report.is_valid() { 0 } else { 1 })
}
