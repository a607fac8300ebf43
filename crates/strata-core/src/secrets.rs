use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One secret found in a file. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretFinding {
    pub line: usize,
    pub column: usize,
    pub secret_type: String,
    pub message: String,
}

/// Secret detection capability. Implementations may fail per file; callers
/// treat a failure as "no findings" for that file.
pub trait SecretScanner: Send + Sync {
    fn detect_secrets(&self, content: &str, path: &str) -> Result<Vec<SecretFinding>>;
}

static SECRET_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (
            r#"(?i)(api[_-]?key|apikey)\s*[:=]\s*['"`][\w\-]{20,}['"`]"#,
            "API key",
        ),
        (
            r#"(?i)(secret|password|passwd|pwd)\s*[:=]\s*['"`][^'"`\s]{8,}['"`]"#,
            "Password or secret",
        ),
        (
            r#"(?i)(token|bearer)\s*[:=]\s*['"`][\w\-\.]{20,}['"`]"#,
            "Authentication token",
        ),
        (r"\b(AKIA|ASIA)[0-9A-Z]{16}\b", "AWS access key"),
        (
            r#"(?i)aws[_-]?secret[_-]?access[_-]?key\s*[:=]\s*['"`][A-Za-z0-9/+=]{40}['"`]"#,
            "AWS secret key",
        ),
        (r"\b[sr]k_live_[0-9a-zA-Z]{24,}\b", "Stripe live key"),
        (r"-----BEGIN (RSA |EC |DSA |OPENSSH )?PRIVATE KEY-----", "Private key"),
    ]
    .into_iter()
    .map(|(pattern, name)| {
        let regex = Regex::new(pattern).unwrap_or_else(|e| panic!("invalid secret pattern: {e}"));
        (regex, name)
    })
    .collect()
});

/// Line-oriented regex secret scanner. Reports at most one finding per line,
/// the first pattern in table order that matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexSecretScanner;

impl RegexSecretScanner {
    pub fn new() -> Self {
        Self
    }
}

impl SecretScanner for RegexSecretScanner {
    fn detect_secrets(&self, content: &str, _path: &str) -> Result<Vec<SecretFinding>> {
        let mut findings = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let hit = SECRET_PATTERNS
                .iter()
                .find_map(|(regex, name)| regex.find(line).map(|m| (m, *name)));
            if let Some((m, name)) = hit {
                let column = line[..m.start()].chars().count() + 1;
                findings.push(SecretFinding {
                    line: idx + 1,
                    column,
                    secret_type: name.to_string(),
                    message: format!("Hardcoded {name} detected"),
                });
            }
        }
        Ok(findings)
    }
}
