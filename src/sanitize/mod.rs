//! Input sanitization.
//!
//! # Responsibilities
//! - Strip script/markup injection vectors from every string scalar
//! - Drop object keys that read as document-store operators (`$`-prefixed)
//!   or contain a path separator (`.`)
//! - Apply the same rules element-wise to arrays, at every nesting depth
//!
//! # Design Decisions
//! - Sanitization is total: it never fails, it only narrows
//! - Rewriting runs to a fixed point, so sanitizing already-sanitized
//!   input yields the same output
//! - Dropped keys are discarded with their values, not recursed into

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

/// Rewrites untrusted structured input in place.
///
/// Compiled once at startup and shared; all methods take `&self`.
pub struct Sanitizer {
    script_blocks: Regex,
    markup_tags: Regex,
    event_handlers: Regex,
    script_schemes: Regex,
}

impl Sanitizer {
    pub fn new() -> Self {
        Self {
            // <script ...>...</script>, content included
            script_blocks: Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>")
                .expect("script block pattern"),
            // any remaining opening/closing markup tag
            markup_tags: Regex::new(r"(?i)</?[a-z][^>]*>").expect("markup tag pattern"),
            // inline event-handler attributes: onerror=..., onload="..."
            event_handlers: Regex::new(r#"(?i)\bon[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
                .expect("event handler pattern"),
            script_schemes: Regex::new(r"(?i)javascript\s*:").expect("script scheme pattern"),
        }
    }

    /// Sanitize a single string scalar.
    ///
    /// Patterns are applied repeatedly until the output stops changing, so
    /// split vectors ("<scr<script></script>ipt>") cannot survive one pass
    /// and reassemble.
    pub fn clean_str(&self, input: &str) -> String {
        let mut current = input.to_string();
        loop {
            let mut next = self.script_blocks.replace_all(&current, "").into_owned();
            next = self.event_handlers.replace_all(&next, "").into_owned();
            next = self.markup_tags.replace_all(&next, "").into_owned();
            next = self.script_schemes.replace_all(&next, "").into_owned();
            if next == current {
                return next;
            }
            current = next;
        }
    }

    /// True when an object key must be dropped entirely.
    fn is_forbidden_key(key: &str) -> bool {
        key.starts_with('$') || key.contains('.')
    }

    /// Sanitize an arbitrarily nested JSON value in place.
    ///
    /// Structure is preserved: objects stay objects, arrays stay arrays,
    /// non-string scalars pass through unchanged.
    pub fn clean_value(&self, value: &mut Value) {
        match value {
            Value::String(s) => {
                *s = self.clean_str(s);
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.clean_value(item);
                }
            }
            Value::Object(map) => {
                map.retain(|key, _| !Self::is_forbidden_key(key));
                for (_, nested) in map.iter_mut() {
                    self.clean_value(nested);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    /// Sanitize a flat query-parameter map in place.
    pub fn clean_query(&self, query: &mut HashMap<String, String>) {
        query.retain(|key, _| !Self::is_forbidden_key(key));
        for (_, v) in query.iter_mut() {
            *v = self.clean_str(v);
        }
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sanitize(mut value: Value) -> Value {
        Sanitizer::new().clean_value(&mut value);
        value
    }

    #[test]
    fn strips_script_blocks_with_content() {
        let out = sanitize(json!({"name": "<script>alert(1)</script>"}));
        assert_eq!(out, json!({"name": ""}));
    }

    #[test]
    fn drops_operator_keys_with_values() {
        let out = sanitize(json!({"name": "ok", "$where": "1==1"}));
        assert_eq!(out, json!({"name": "ok"}));
    }

    #[test]
    fn drops_path_separator_keys_at_depth() {
        let out = sanitize(json!({
            "outer": {
                "a.b": {"$gt": 1},
                "list": [{"$set": {"role": "admin"}}, {"fine": "yes"}]
            }
        }));
        assert_eq!(out, json!({"outer": {"list": [{}, {"fine": "yes"}]}}));
    }

    #[test]
    fn removes_event_handlers_and_schemes() {
        let out = sanitize(json!({
            "bio": "<img src=x onerror=alert(1)>",
            "link": "javascript:alert(1)"
        }));
        assert_eq!(out, json!({"bio": "", "link": "alert(1)"}));
    }

    #[test]
    fn survives_split_vector_reassembly() {
        // Removing the inner tag must not leave a working outer tag behind.
        let out = sanitize(json!({"v": "<scr<script></script>ipt>alert(1)</script>"}));
        let s = out["v"].as_str().unwrap();
        assert!(!s.to_lowercase().contains("<script"));
    }

    #[test]
    fn non_string_scalars_pass_through() {
        let input = json!({"count": 3, "price": 9.99, "flag": true, "missing": null});
        assert_eq!(sanitize(input.clone()), input);
    }

    #[test]
    fn idempotent_over_nested_input() {
        let inputs = vec![
            json!({"name": "<script>alert(1)</script>", "$where": "1==1"}),
            json!([{"a.b": 1}, "javascript:void(0)", [["<b>x</b>"]], 42]),
            json!({"deep": {"deeper": {"$inc": {"n": 1}, "text": "<iframe src=evil>"}}}),
            json!("plain text"),
            json!(null),
        ];
        let sanitizer = Sanitizer::new();
        for input in inputs {
            let mut once = input.clone();
            sanitizer.clean_value(&mut once);
            let mut twice = once.clone();
            sanitizer.clean_value(&mut twice);
            assert_eq!(once, twice, "sanitize must be idempotent for {input}");
        }
    }

    #[test]
    fn query_map_is_cleaned() {
        let sanitizer = Sanitizer::new();
        let mut query: HashMap<String, String> = HashMap::new();
        query.insert("q".into(), "<script>x</script>shoes".into());
        query.insert("$gt".into(), "0".into());
        sanitizer.clean_query(&mut query);
        assert_eq!(query.get("q").map(String::as_str), Some("shoes"));
        assert!(!query.contains_key("$gt"));
    }
}
