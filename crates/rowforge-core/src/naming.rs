//! Column naming conventions.
//!
//! A convention is configured per connection and applied when a shape's
//! field names are first mapped to column names.

/// How field names are converted to column names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamingConvention {
    /// `FirstName` becomes `first_name`, `ID` becomes `id`.
    SnakeCase,
    /// Underscores are stripped, letter case is preserved:
    /// `first_name` becomes `firstname`, `FirstName` stays `FirstName`.
    CamelPreserving,
    /// The field name is wrapped verbatim in the configured quote
    /// characters.
    Quoted {
        /// Opening quote character.
        start: char,
        /// Closing quote character.
        end: char,
    },
}

impl NamingConvention {
    /// Converts a field name into a column name under this convention.
    #[must_use]
    pub fn column_name(&self, field: &str) -> String {
        match self {
            Self::SnakeCase => to_snake_case(field),
            Self::CamelPreserving => field.split('_').collect(),
            Self::Quoted { start, end } => format!("{start}{field}{end}"),
        }
    }
}

/// Converts a name to snake_case, treating consecutive uppercase
/// letters as one run: `ID` -> `id`, `HTTPServer` -> `http_server`.
fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_lowercase();
            let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if i > 0 && (prev_lower || prev_digit || (prev_upper && next_lower)) {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(*c);
        }
    }

    result
}
