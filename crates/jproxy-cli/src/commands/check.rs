//! `jproxy check`: load and lint a proxy manifest.

use std::path::Path;

use anyhow::Context;
use jproxy_sdk::{ManifestIssue, ProxyManifest};
use serde::Serialize;
use termcolor::WriteColor;
use tracing::debug;

use crate::output::StyledOutput;

/// One lint finding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueReport {
    /// Proxy name
    pub proxy: String,
    /// Member, for method-level issues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    /// Error the bridge would report
    pub error: String,
}

impl From<ManifestIssue> for IssueReport {
    fn from(issue: ManifestIssue) -> Self {
        Self {
            proxy: issue.proxy,
            member: issue.member,
            error: issue.error.to_string(),
        }
    }
}

/// Summary of a checked manifest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    /// Manifest path as given
    pub manifest: String,
    /// Number of proxies declared
    pub proxies: usize,
    /// Number of methods declared across all proxies
    pub methods: usize,
    /// Findings, in declaration order
    pub issues: Vec<IssueReport>,
}

/// Load `path` and lint every declaration.
pub fn check(path: &Path) -> anyhow::Result<CheckReport> {
    let manifest = ProxyManifest::from_file(path)
        .with_context(|| format!("failed to load manifest {}", path.display()))?;
    debug!(path = %path.display(), proxies = manifest.proxies.len(), "loaded manifest");

    Ok(CheckReport {
        manifest: path.display().to_string(),
        proxies: manifest.proxies.len(),
        methods: manifest.proxies.iter().map(|p| p.methods.len()).sum(),
        issues: manifest.lint().into_iter().map(IssueReport::from).collect(),
    })
}

/// Render a report for the terminal
pub fn render<W: WriteColor>(report: &CheckReport, out: &mut StyledOutput<W>) {
    for issue in &report.issues {
        out.error("error");
        out.plain(": ");
        out.bold(&issue.proxy);
        if let Some(member) = &issue.member {
            out.plain(&format!(".{}", member));
        }
        out.plain(&format!(": {}", issue.error));
        out.newline();
    }

    let summary = format!(
        "{} proxies, {} methods",
        report.proxies, report.methods
    );
    if report.issues.is_empty() {
        out.success("ok");
        out.plain(&format!(": {} ({})", report.manifest, summary));
    } else {
        out.warning(&format!("{} issue(s)", report.issues.len()));
        out.plain(&format!(" in {} ({})", report.manifest, summary));
    }
    out.newline();
}

/// Run the command. Returns the process exit code.
pub fn execute<W: WriteColor>(
    path: &Path,
    json: bool,
    out: &mut StyledOutput<W>,
) -> anyhow::Result<i32> {
    let report = check(path)?;
    if json {
        out.plain(&serde_json::to_string_pretty(&report)?);
        out.newline();
    } else {
        render(&report, out);
    }
    Ok(if report.issues.is_empty() { 0 } else { 1 })
}
