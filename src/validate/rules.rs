//! Declarative per-field validation rules.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// A single failing predicate, reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// One predicate over a declared field.
#[derive(Debug, Clone)]
pub enum Rule {
    /// String length at least `n` characters.
    MinLength(usize),
    /// String length at most `n` characters.
    MaxLength(usize),
    /// Lowercase + uppercase + digit + symbol classes, minimum length 8.
    Password,
    /// RFC-ish mailbox shape, good enough for input gating.
    Email,
    /// 24 hexadecimal characters (document-store object id).
    ObjectId,
    /// Integer within the inclusive range.
    IntRange(i64, i64),
    /// Full string matches a compiled pattern.
    Matches(Regex),
    /// String equal to one of the allowed values.
    OneOf(&'static [&'static str]),
}

impl Rule {
    /// Compile a pattern rule. Rule sets are built once at startup, so a bad
    /// pattern is a programming error.
    pub fn matches(pattern: &str) -> Self {
        Rule::Matches(Regex::new(pattern).expect("rule pattern"))
    }
}

/// A declared field with its ordered predicates.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub rules: Vec<Rule>,
}

/// Ordered rule set for one route; loaded once at startup, immutable at
/// request time.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<FieldRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn required(mut self, field: &'static str, rules: Vec<Rule>) -> Self {
        self.fields.push(FieldRule {
            field,
            required: true,
            rules,
        });
        self
    }

    pub fn optional(mut self, field: &'static str, rules: Vec<Rule>) -> Self {
        self.fields.push(FieldRule {
            field,
            required: false,
            rules,
        });
        self
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }
}

/// Evaluates rule sets against sanitized input.
///
/// Holds the compiled format patterns; constructed once and shared.
pub struct Validator {
    email: Regex,
    object_id: Regex,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
                .expect("email pattern"),
            object_id: Regex::new(r"^[0-9a-fA-F]{24}$").expect("object id pattern"),
        }
    }

    /// Evaluate every predicate for every declared field.
    ///
    /// Never short-circuits across fields or predicates: the returned list
    /// holds all failures in declaration order. Empty means pass.
    pub fn evaluate(&self, rules: &RuleSet, body: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();

        for field_rule in rules.fields() {
            let value = body.get(field_rule.field);

            let Some(value) = value.filter(|v| !v.is_null()) else {
                if field_rule.required {
                    errors.push(FieldError {
                        field: field_rule.field.to_string(),
                        message: format!("{} is required", field_rule.field),
                    });
                }
                // optional and absent: predicates are not evaluated at all
                continue;
            };

            for rule in &field_rule.rules {
                if let Some(message) = self.check(rule, value) {
                    errors.push(FieldError {
                        field: field_rule.field.to_string(),
                        message,
                    });
                }
            }
        }

        errors
    }

    /// Apply one predicate; `Some` carries the failure message.
    fn check(&self, rule: &Rule, value: &Value) -> Option<String> {
        match rule {
            Rule::MinLength(min) => {
                let Some(s) = value.as_str() else {
                    return Some("must be a string".into());
                };
                (s.chars().count() < *min)
                    .then(|| format!("must be at least {min} characters"))
            }
            Rule::MaxLength(max) => {
                let Some(s) = value.as_str() else {
                    return Some("must be a string".into());
                };
                (s.chars().count() > *max)
                    .then(|| format!("must be at most {max} characters"))
            }
            Rule::Password => {
                let Some(s) = value.as_str() else {
                    return Some("must be a string".into());
                };
                if s.chars().count() < 8 {
                    return Some("must be at least 8 characters".into());
                }
                let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
                let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
                let has_digit = s.chars().any(|c| c.is_ascii_digit());
                let has_symbol = s.chars().any(|c| !c.is_ascii_alphanumeric());
                (!(has_lower && has_upper && has_digit && has_symbol)).then(|| {
                    "must contain a lowercase letter, an uppercase letter, a digit, and a symbol"
                        .into()
                })
            }
            Rule::Email => {
                let Some(s) = value.as_str() else {
                    return Some("must be a string".into());
                };
                (!self.email.is_match(s)).then(|| "must be a valid email address".into())
            }
            Rule::ObjectId => {
                let Some(s) = value.as_str() else {
                    return Some("must be a string".into());
                };
                (!self.object_id.is_match(s)).then(|| "must be a valid id".into())
            }
            Rule::IntRange(lo, hi) => {
                let Some(n) = value.as_i64() else {
                    return Some("must be an integer".into());
                };
                (n < *lo || n > *hi).then(|| format!("must be between {lo} and {hi}"))
            }
            Rule::Matches(pattern) => {
                let Some(s) = value.as_str() else {
                    return Some("must be a string".into());
                };
                (!pattern.is_match(s)).then(|| "has an invalid format".into())
            }
            Rule::OneOf(allowed) => {
                let Some(s) = value.as_str() else {
                    return Some("must be a string".into());
                };
                (!allowed.iter().any(|a| *a == s))
                    .then(|| format!("must be one of: {}", allowed.join(", ")))
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
