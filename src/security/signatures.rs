//! Attack-signature scanning.
//!
//! A match never blocks the request; it only produces an alert for the
//! audit channel.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

/// Fixed signature set, compiled once at startup.
pub struct SignatureScanner {
    signatures: Vec<(&'static str, Regex)>,
}

impl SignatureScanner {
    pub fn new() -> Self {
        let signatures = vec![
            (
                "path-traversal",
                Regex::new(r"\.\./|\.\.\\").expect("path traversal pattern"),
            ),
            (
                "script-injection",
                Regex::new(r"(?i)<script|javascript\s*:").expect("script pattern"),
            ),
            (
                "sql-set-operation",
                Regex::new(r"(?i)\b(union\s+select|insert\s+into|drop\s+table)\b|'\s*(or|and)\s+'?\d+'?\s*=\s*'?\d+")
                    .expect("sql pattern"),
            ),
            (
                "code-execution",
                Regex::new(r"(?i)\b(eval|exec|system|popen|passthru)\s*\(")
                    .expect("code execution pattern"),
            ),
        ];
        Self { signatures }
    }

    /// First matching signature id in the text, if any.
    pub fn scan_text(&self, text: &str) -> Option<&'static str> {
        self.signatures
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(id, _)| *id)
    }

    /// Scan a serialized projection of path + query + body.
    pub fn scan_request(
        &self,
        path: &str,
        query: &HashMap<String, String>,
        body: Option<&Value>,
    ) -> Option<&'static str> {
        if let Some(id) = self.scan_text(path) {
            return Some(id);
        }
        for (key, value) in query {
            if let Some(id) = self.scan_text(key).or_else(|| self.scan_text(value)) {
                return Some(id);
            }
        }
        if let Some(body) = body {
            if let Some(id) = self.scan_text(&body.to_string()) {
                return Some(id);
            }
        }
        None
    }
}

impl Default for SignatureScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_path_traversal() {
        let scanner = SignatureScanner::new();
        assert_eq!(
            scanner.scan_text("/files/../../etc/passwd"),
            Some("path-traversal")
        );
    }

    #[test]
    fn detects_sql_set_operations() {
        let scanner = SignatureScanner::new();
        assert_eq!(
            scanner.scan_text("q=1 UNION SELECT password FROM users"),
            Some("sql-set-operation")
        );
        assert_eq!(
            scanner.scan_text("name=' OR '1'='1"),
            Some("sql-set-operation")
        );
    }

    #[test]
    fn detects_code_execution_calls() {
        let scanner = SignatureScanner::new();
        assert_eq!(scanner.scan_text("eval(atob('...'))"), Some("code-execution"));
        assert_eq!(scanner.scan_text("system('rm -rf /')"), Some("code-execution"));
    }

    #[test]
    fn clean_request_matches_nothing() {
        let scanner = SignatureScanner::new();
        let mut query = HashMap::new();
        query.insert("q".to_string(), "running shoes".to_string());
        let body = json!({"name": "Alice", "rating": 5});
        assert_eq!(scanner.scan_request("/search", &query, Some(&body)), None);
    }

    #[test]
    fn scans_all_projections() {
        let scanner = SignatureScanner::new();
        let empty = HashMap::new();

        assert!(scanner.scan_request("/a/../b", &empty, None).is_some());

        let mut query = HashMap::new();
        query.insert("redirect".to_string(), "javascript:alert(1)".to_string());
        assert!(scanner.scan_request("/ok", &query, None).is_some());

        let body = json!({"comment": "x'; DROP TABLE orders"});
        assert!(scanner.scan_request("/ok", &empty, Some(&body)).is_some());
    }
}
