//! Type-directed formatting-call rewrite
//!
//! A single-argument call to a print function becomes a call to its
//! format-string variant, with the verb chosen by the argument's static
//! type: `fmt.Println(42)` becomes `fmt.Printf("%d", 42)`. Arguments whose
//! type has no configured verb are left alone.

use std::collections::HashMap;
use std::path::Path;

use callsift_calls::CallKind;
use callsift_types::{BasicCategory, ObjectKind};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RewriteError};
use crate::rule::{ArgTemplate, CallTemplate, CalleeTemplate, MatchContext, RewriteRule};

/// `package path` + function name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionPath {
    pub package: String,
    pub name: String,
}

/// One formatting rule, as read from a rules file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRuleConfig {
    pub name: String,
    /// The function whose calls are rewritten
    pub function: FunctionPath,
    /// Name of the format-string variant in the same package
    pub replacement: String,
    /// Verb per basic type category
    #[serde(default = "default_specifiers")]
    pub specifiers: HashMap<BasicCategory, String>,
    /// Append `\n` to the format string
    #[serde(default)]
    pub newline: bool,
}

fn default_specifiers() -> HashMap<BasicCategory, String> {
    HashMap::from([
        (BasicCategory::Integer, "%d".to_string()),
        (BasicCategory::String, "%s".to_string()),
        (BasicCategory::Float, "%f".to_string()),
        (BasicCategory::Boolean, "%t".to_string()),
    ])
}

impl Default for FormatRuleConfig {
    fn default() -> Self {
        Self {
            name: "println-to-printf".to_string(),
            function: FunctionPath {
                package: "fmt".to_string(),
                name: "Println".to_string(),
            },
            replacement: "Printf".to_string(),
            specifiers: default_specifiers(),
            newline: false,
        }
    }
}

impl FormatRuleConfig {
    fn validate(&self) -> Result<()> {
        let invalid = |message: &str| RewriteError::InvalidRule {
            rule: self.name.clone(),
            message: message.to_string(),
        };
        if self.replacement == self.function.name {
            return Err(invalid("replacement must differ from the rewritten function"));
        }
        if !is_identifier(&self.replacement) {
            return Err(invalid("replacement is not an identifier"));
        }
        if self
            .specifiers
            .values()
            .any(|verb| verb.contains(['"', '\\', '\n']))
        {
            return Err(invalid("verbs may not contain quotes, backslashes or newlines"));
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Parse a JSON rules file: a single rule object or an array of them
pub fn parse_rules(json: &str) -> Result<Vec<FormatRuleConfig>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Rules {
        Many(Vec<FormatRuleConfig>),
        One(FormatRuleConfig),
    }
    let rules = match serde_json::from_str::<Rules>(json)? {
        Rules::Many(rules) => rules,
        Rules::One(rule) => vec![rule],
    };
    for rule in &rules {
        rule.validate()?;
    }
    Ok(rules)
}

pub fn load_rules(path: &Path) -> Result<Vec<FormatRuleConfig>> {
    let json = std::fs::read_to_string(path)?;
    parse_rules(&json)
}

/// [`RewriteRule`] for one [`FormatRuleConfig`]
#[derive(Debug, Clone)]
pub struct FormatCallRule {
    config: FormatRuleConfig,
}

impl FormatCallRule {
    pub fn new(config: FormatRuleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FormatRuleConfig {
        &self.config
    }

    /// Whether the call resolves to the configured function. Resolution
    /// goes through the oracle, so aliased imports match too.
    fn targets_function(&self, cx: &MatchContext<'_>) -> bool {
        if cx.site.kind != CallKind::PackageFunction {
            return false;
        }
        let Some(obj) = cx.callee_object() else {
            return false;
        };
        let object = cx.info.object(obj);
        object.kind == ObjectKind::Function
            && object.name == self.config.function.name
            && cx.info.package_path_of(obj) == Some(self.config.function.package.as_str())
    }

    /// Verb for the single argument, if its type is an unnamed basic type
    /// with a configured verb. Untyped constants use their default type.
    fn verb(&self, cx: &MatchContext<'_>) -> Option<&str> {
        let ty = cx.arg_type(0)?;
        let kind = cx.info.basic(ty)?.default_kind();
        self.config
            .specifiers
            .get(&kind.category())
            .map(String::as_str)
    }
}

impl RewriteRule for FormatCallRule {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn rewrite(&self, cx: &MatchContext<'_>) -> Option<CallTemplate> {
        if cx.args().len() != 1 || cx.has_ellipsis() || !self.targets_function(cx) {
            return None;
        }
        let verb = self.verb(cx)?;
        let format = if self.config.newline {
            format!("\"{}\\n\"", verb)
        } else {
            format!("\"{}\"", verb)
        };
        Some(CallTemplate {
            callee: CalleeTemplate::SameQualifier(self.config.replacement.clone()),
            args: vec![ArgTemplate::Literal(format), ArgTemplate::Original(0)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_and_many() {
        let one = r#"{
            "name": "log",
            "function": { "package": "log", "name": "Println" },
            "replacement": "Printf",
            "newline": true
        }"#;
        let rules = parse_rules(one).expect("parse");
        assert_eq!(rules.len(), 1);
        assert!(rules[0].newline);
        assert_eq!(rules[0].specifiers.get(&BasicCategory::Integer).map(String::as_str), Some("%d"));

        let many = r#"[
            { "name": "a", "function": { "package": "fmt", "name": "Println" }, "replacement": "Printf",
              "specifiers": { "integer": "%x" } },
            { "name": "b", "function": { "package": "fmt", "name": "Sprint" }, "replacement": "Sprintf" }
        ]"#;
        let rules = parse_rules(many).expect("parse");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].specifiers.len(), 1);
        assert_eq!(rules[0].specifiers.get(&BasicCategory::Integer).map(String::as_str), Some("%x"));
    }

    #[test]
    fn test_invalid_rules() {
        let same = r#"{ "name": "x", "function": { "package": "fmt", "name": "Println" }, "replacement": "Println" }"#;
        assert!(matches!(parse_rules(same), Err(RewriteError::InvalidRule { .. })));

        let quoted = r#"{ "name": "x", "function": { "package": "fmt", "name": "Println" },
            "replacement": "Printf", "specifiers": { "string": "%q\"" } }"#;
        assert!(matches!(parse_rules(quoted), Err(RewriteError::InvalidRule { .. })));

        assert!(matches!(parse_rules("{"), Err(RewriteError::Config(_))));
    }

    #[test]
    fn test_default_config() {
        let config = FormatRuleConfig::default();
        assert_eq!(config.function.package, "fmt");
        assert_eq!(config.replacement, "Printf");
        assert_eq!(config.specifiers.len(), 4);
        assert!(FormatCallRule::new(config).is_ok());
    }
}
