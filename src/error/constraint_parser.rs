use regex::Regex;
use std::sync::OnceLock;

/// Tables owned by this service, longest first so that prefix matching picks
/// `mortgage_applications` before a shorter table sharing its prefix.
const KNOWN_TABLES: &[&str] = &["mortgage_applications", "mortgage_rates", "banks"];

/// Constraint name suffixes PostgreSQL generates by default.
const CONSTRAINT_SUFFIXES: &[&str] = &["_key", "_fkey", "_check", "_idx", "_pkey"];

/// Utility for parsing PostgreSQL constraint violation messages.
///
/// Regex patterns are compiled once and cached.
pub struct ConstraintParser;

struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    table_name: Regex,
}

impl RegexPatterns {
    fn new() -> Self {
        Self {
            // Matches "Key (field)=(value)" in the DETAIL line
            key_value: Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").expect("valid key/value regex"),
            column_name: Regex::new(r#"column "([^"]+)""#).expect("valid column regex"),
            table_name: Regex::new(r#"(?:table|relation) "([^"]+)""#).expect("valid table regex"),
        }
    }
}

static REGEX_PATTERNS: OnceLock<RegexPatterns> = OnceLock::new();

impl ConstraintParser {
    fn patterns() -> &'static RegexPatterns {
        REGEX_PATTERNS.get_or_init(RegexPatterns::new)
    }

    /// Parses a unique constraint violation into `(entity, field, value)`.
    ///
    /// The constraint name decides entity and field when it follows the
    /// `{table}_{column}_key` convention; the DETAIL line supplies the value.
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let detail = Self::extract_key_value_from_message(message);

        if let Some((entity, field)) = constraint_name.and_then(Self::parse_constraint_name) {
            let value = detail
                .map(|(_, value)| value)
                .unwrap_or_else(|| "duplicate_value".to_string());
            return Some((entity, field, value));
        }

        detail.map(|(field, value)| {
            let entity =
                Self::extract_table_from_message(message).unwrap_or_else(|| "resource".to_string());
            (entity, field, value)
        })
    }

    /// Parses a not-null violation into `(entity, field)`.
    pub fn parse_not_null_violation(message: &str) -> Option<(String, String)> {
        let field = Self::extract_column_from_message(message)?;
        let entity =
            Self::extract_table_from_message(message).unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    /// Parses a check violation into `(entity, field)`.
    pub fn parse_check_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        constraint_name
            .and_then(Self::parse_constraint_name)
            .or_else(|| Self::parse_not_null_violation(message))
    }

    /// Splits a constraint name such as `mortgage_applications_application_no_key`
    /// into `("mortgage_applications", "application_no")`.
    pub fn parse_constraint_name(constraint_name: &str) -> Option<(String, String)> {
        let stem = CONSTRAINT_SUFFIXES
            .iter()
            .find_map(|suffix| constraint_name.strip_suffix(suffix))?;

        KNOWN_TABLES.iter().find_map(|table| {
            stem.strip_prefix(table)
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|field| !field.is_empty())
                .map(|field| (table.to_string(), field.to_string()))
        })
    }

    pub fn extract_column_from_message(message: &str) -> Option<String> {
        Self::patterns()
            .column_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract_table_from_message(message: &str) -> Option<String> {
        Self::patterns()
            .table_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        let caps = Self::patterns().key_value.captures(message)?;
        let field = caps.get(1)?.as_str().to_string();
        let value = caps.get(2)?.as_str().to_string();
        Some((field, value))
    }
}
