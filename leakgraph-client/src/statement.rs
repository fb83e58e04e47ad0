//! Parameterized Cypher statements

use crate::error::{ClientError, ClientResult};

/// Value bound to a `$name` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Boolean(value)
    }
}

impl ParamValue {
    /// Parse a command line literal: integer, float, boolean, else string
    pub fn parse_literal(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return ParamValue::Integer(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return ParamValue::Float(f);
            }
        }
        match raw {
            "true" => ParamValue::Boolean(true),
            "false" => ParamValue::Boolean(false),
            _ => ParamValue::String(raw.to_string()),
        }
    }
}

/// A query string, its bound parameters and the columns read from each row
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    params: Vec<(String, ParamValue)>,
    columns: Vec<String>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Bind a parameter, replacing any earlier binding of the same key
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Declare the columns decoded from each returned row, in output order
    pub fn returns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[(String, ParamValue)] {
        &self.params
    }

    pub fn get_param(&self, key: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Distinct `$name` references in order of first appearance.
    /// String literals, backtick identifiers and comments are skipped.
    pub fn placeholders(&self) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut chars = self.text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\'' | '"' | '`' => {
                    let mut escaped = false;
                    for inner in chars.by_ref() {
                        if escaped {
                            escaped = false;
                        } else if inner == '\\' && c != '`' {
                            escaped = true;
                        } else if inner == c {
                            break;
                        }
                    }
                }
                '/' if chars.peek() == Some(&'/') => {
                    for inner in chars.by_ref() {
                        if inner == '\n' {
                            break;
                        }
                    }
                }
                '$' => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            name.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let starts_ok = name
                        .chars()
                        .next()
                        .map_or(false, |first| !first.is_ascii_digit());
                    if starts_ok && !found.contains(&name) {
                        found.push(name);
                    }
                }
                _ => {}
            }
        }

        found
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.text.trim().is_empty() {
            return Err(ClientError::QueryError("statement is empty".to_string()));
        }

        let unbound: Vec<String> = self
            .placeholders()
            .into_iter()
            .filter(|name| self.get_param(name).is_none())
            .collect();
        if !unbound.is_empty() {
            return Err(ClientError::QueryError(format!(
                "unbound parameters: {}",
                unbound
                    .iter()
                    .map(|n| format!("${}", n))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        if self.columns.is_empty() {
            return Err(ClientError::QueryError(
                "statement declares no return columns".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_rebinding_replaces() {
        let stmt = Statement::new("RETURN $x AS x")
            .param("x", 1i64)
            .param("x", "two");
        assert_eq!(stmt.params().len(), 1);
        assert_eq!(stmt.get_param("x"), Some(&ParamValue::String("two".into())));
    }

    #[test]
    fn test_placeholders_skip_literals() {
        let stmt = Statement::new(
            "MATCH (a {name: $name}) // ignore $commented\n\
             WHERE a.note <> '$not_a_param' AND a.`$odd` = $name \
             RETURN a.name AS name LIMIT $limit",
        );
        assert_eq!(stmt.placeholders(), vec!["name", "limit"]);
    }

    #[test]
    fn test_placeholders_ignore_escaped_quotes() {
        let stmt = Statement::new(r#"RETURN "say \"$x\"" AS s, $y AS y"#);
        assert_eq!(stmt.placeholders(), vec!["y"]);
    }

    #[test]
    fn test_validate_reports_unbound() {
        let stmt = Statement::new("RETURN $a AS a, $b AS b")
            .param("a", true)
            .returns(["a", "b"]);
        let err = stmt.validate().unwrap_err();
        assert!(err.to_string().contains("$b"));
        assert!(!err.to_string().contains("$a"));
    }

    #[test]
    fn test_validate_requires_columns_and_text() {
        assert!(Statement::new("   ").returns(["x"]).validate().is_err());
        assert!(Statement::new("RETURN 1 AS x").validate().is_err());
        assert!(Statement::new("RETURN 1 AS x").returns(["x"]).validate().is_ok());
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(ParamValue::parse_literal("42"), ParamValue::Integer(42));
        assert_eq!(ParamValue::parse_literal("-1.5"), ParamValue::Float(-1.5));
        assert_eq!(ParamValue::parse_literal("true"), ParamValue::Boolean(true));
        assert_eq!(
            ParamValue::parse_literal("Stuart Onslow-Smith"),
            ParamValue::String("Stuart Onslow-Smith".into())
        );
        assert_eq!(
            ParamValue::parse_literal("NaN"),
            ParamValue::String("NaN".into())
        );
    }
}
