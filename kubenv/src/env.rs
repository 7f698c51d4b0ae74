use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KubeEnvError {
    #[error("malformed kube-env line {line_no}: no `: ` separator in {line:?}")]
    MalformedLine { line_no: usize, line: String },
}

/// A parsed kube-env blob: newline-separated `KEY: VALUE` pairs.
///
/// The mapping keeps the last value for a repeated key, while the original
/// lines are kept in order so the environment file can be re-emitted without
/// reshuffling anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KubeEnv {
    fields: BTreeMap<String, String>,
    lines: Vec<(String, String)>,
}

impl KubeEnv {
    pub fn parse(blob: &str) -> Result<KubeEnv, KubeEnvError> {
        let mut fields = BTreeMap::new();
        let mut lines = Vec::new();

        for (idx, line) in blob.lines().enumerate() {
            if line.is_empty() {
                continue;
            }

            // Values may themselves contain `: `, so only the first
            // occurrence separates key from value.
            let (key, value) = line.split_once(": ").ok_or_else(|| KubeEnvError::MalformedLine {
                line_no: idx + 1,
                line: line.to_owned(),
            })?;

            fields.insert(key.to_owned(), value.to_owned());
            lines.push((key.to_owned(), value.to_owned()));
        }

        Ok(KubeEnv { fields, lines })
    }

    /// Mapping lookup; an absent key is the empty string.
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    /// Every input line in original order, reformatted as `KEY=VALUE\n`.
    pub fn environment_text(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.lines {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
