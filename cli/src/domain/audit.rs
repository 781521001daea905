//! Pre-flight security audit of a service entry file.
//!
//! Pure: callers read the file content and mode bits, this module only
//! inspects them. The rules are a best-effort heuristic gate, not a sandbox.
//! Every rule is evaluated independently and every match is reported.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Finding severity. Critical findings block `start`; warnings never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical,
    Warning,
}

/// A single audit result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFinding {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Findings split by severity, in rule order then line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub critical: Vec<AuditFinding>,
    pub warning: Vec<AuditFinding>,
}

impl AuditReport {
    /// Returns `true` when at least one critical finding was raised.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        !self.critical.is_empty()
    }

    /// Critical finding messages, for [`crate::domain::error::ServiceError::AuditRejected`].
    #[must_use]
    pub fn critical_messages(&self) -> Vec<String> {
        self.critical.iter().map(ToString::to_string).collect()
    }

    fn push(&mut self, severity: Severity, message: String) {
        let finding = AuditFinding { severity, message };
        match severity {
            Severity::Critical => self.critical.push(finding),
            Severity::Warning => self.warning.push(finding),
        }
    }
}

struct Rule {
    severity: Severity,
    description: &'static str,
    pattern: Regex,
    /// Secondary pattern that must also match the same line.
    requires: Option<Regex>,
}

impl Rule {
    fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line) && self.requires.as_ref().is_none_or(|r| r.is_match(line))
    }
}

#[allow(clippy::expect_used)]
fn rule(severity: Severity, description: &'static str, pattern: &str) -> Rule {
    Rule {
        severity,
        description,
        pattern: Regex::new(pattern).expect("valid regex"),
        requires: None,
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let mut env_concat = rule(
        Severity::Critical,
        "environment variable concatenated into a command",
        r"(?:\bexec(?:Sync)?|\bspawn(?:Sync)?|\bexecFile(?:Sync)?|Bun\.spawn(?:Sync)?|\$)\s*[(`]",
    );
    #[allow(clippy::expect_used)]
    {
        env_concat.requires = Some(
            Regex::new(
                r"(?:process\.env|Bun\.env|import\.meta\.env)[\w.\[\]'\x22]*\s*\+|\+\s*(?:process\.env|Bun\.env|import\.meta\.env)|\$\{\s*(?:process\.env|Bun\.env|import\.meta\.env)",
            )
            .expect("valid regex"),
        );
    }
    vec![
        rule(
            Severity::Critical,
            "dynamic code execution (eval)",
            r"(?:^|[^.\w])eval\s*\(",
        ),
        rule(
            Severity::Critical,
            "dynamic code execution (new Function)",
            r"\bnew\s+Function\s*\(",
        ),
        rule(
            Severity::Critical,
            "raw shell execution",
            r#"(?:^|[^.\w])exec(?:Sync)?\s*\(|child_process['"]?\)?\s*\.\s*exec(?:Sync)?\b|\bshell\s*:\s*true\b"#,
        ),
        rule(
            Severity::Critical,
            "direct filesystem module import",
            r#"require\(\s*['"](?:node:)?fs(?:/promises)?['"]\s*\)|from\s+['"](?:node:)?fs(?:/promises)?['"]|import\s+['"](?:node:)?fs['"]"#,
        ),
        env_concat,
        rule(
            Severity::Warning,
            "outbound network call",
            r"\bfetch\s*\(|\bhttps?\.(?:request|get)\s*\(|\bnew\s+WebSocket\s*\(|\bBun\.connect\s*\(|\bnet\.connect\s*\(|\baxios\b",
        ),
        rule(
            Severity::Warning,
            "filesystem write",
            r"\b(?:writeFile(?:Sync)?|appendFile(?:Sync)?|createWriteStream|unlink(?:Sync)?|rmSync)\s*\(|\bBun\.write\s*\(|\bfs\.rm\s*\(",
        ),
    ]
});

/// Returns `true` for lines that are obviously comments.
fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

/// Audit the entry file content and its Unix permission bits.
///
/// `mode` is `None` on platforms without Unix permissions.
#[must_use]
pub fn audit_source(content: &str, mode: Option<u32>) -> AuditReport {
    let mut report = AuditReport::default();

    if let Some(mode) = mode.filter(|m| m & 0o002 != 0) {
        report.push(
            Severity::Critical,
            format!("file is world-writable (mode {:o})", mode & 0o7777),
        );
    }

    for rule in RULES.iter() {
        let lines: Vec<usize> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !is_comment(line) && rule.matches(line))
            .map(|(i, _)| i + 1)
            .collect();
        if lines.is_empty() {
            continue;
        }
        let where_ = lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let plural = if lines.len() == 1 { "" } else { "s" };
        report.push(
            rule.severity,
            format!("{} at line{plural} {where_}", rule.description),
        );
    }
    report
}
