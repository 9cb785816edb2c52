// file: src/document/front_matter.rs
// description: two-style front matter parsing with canonical serialization
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    // key="value"
    static ref EQ_STRING: Regex =
        Regex::new(r#"^(\w+)\s*=\s*"(.*)"\s*$"#).expect("EQ_STRING regex is valid");

    // key=["a", "b"]
    static ref EQ_LIST: Regex =
        Regex::new(r"^(\w+)\s*=\s*\[(.*)\]\s*$").expect("EQ_LIST regex is valid");

    // key=true / key=bare
    static ref EQ_BARE: Regex =
        Regex::new(r"^(\w+)\s*=\s*(\S+)\s*$").expect("EQ_BARE regex is valid");

    // key: value (value may itself be a [list] or "quoted")
    static ref COLON: Regex =
        Regex::new(r"^(\w+)\s*:\s*(.*?)\s*$").expect("COLON regex is valid");
}

/// Assignment style a field was written in. Canonical output always uses
/// `Equals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStyle {
    Equals,
    Colon,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    List(Vec<String>),
    Bool(bool),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness the way the original front matter dialect spells booleans:
    /// a real boolean, or one of the accepted yes-strings.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::String(s) => {
                matches!(s.to_ascii_lowercase().as_str(), "true" | "yes" | "y")
            }
            FieldValue::List(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub style: FieldStyle,
}

/// Recoverable diagnostic: a single block assigned fields in both the
/// `key="value"` and `key: value` styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedFormatError {
    pub file: String,
}

impl fmt::Display for MixedFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mixed front matter styles in {}", self.file)
    }
}

/// Recoverable diagnostic: a required field is absent. Reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFieldError {
    pub field: String,
}

impl fmt::Display for MissingFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing required field: {}", self.field)
    }
}

/// Ordered front matter block. Field order is preserved through parsing and
/// canonicalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrontMatter {
    fields: Vec<Field>,
}

impl FrontMatter {
    /// Parse the raw block between the delimiters. Returns the line text of
    /// the first unparseable non-empty line on failure.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut fields = Vec::new();

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = EQ_STRING.captures(line) {
                fields.push(Field {
                    name: caps[1].to_string(),
                    value: FieldValue::String(caps[2].to_string()),
                    style: FieldStyle::Equals,
                });
            } else if let Some(caps) = EQ_LIST.captures(line) {
                fields.push(Field {
                    name: caps[1].to_string(),
                    value: FieldValue::List(parse_list_items(&caps[2])),
                    style: FieldStyle::Equals,
                });
            } else if let Some(caps) = EQ_BARE.captures(line) {
                fields.push(Field {
                    name: caps[1].to_string(),
                    value: parse_bare_value(&caps[2]),
                    style: FieldStyle::Equals,
                });
            } else if let Some(caps) = COLON.captures(line) {
                let raw_value = &caps[2];
                let value = if raw_value.starts_with('[') && raw_value.ends_with(']') {
                    FieldValue::List(parse_list_items(&raw_value[1..raw_value.len() - 1]))
                } else {
                    parse_bare_value(raw_value.trim_matches('"'))
                };
                fields.push(Field {
                    name: caps[1].to_string(),
                    value,
                    style: FieldStyle::Colon,
                });
            } else {
                return Err(line.to_string());
            }
        }

        Ok(Self { fields })
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when the block mixes `key="value"` and `key: value` assignments.
    pub fn is_mixed_format(&self) -> bool {
        let has_equals = self.fields.iter().any(|f| f.style == FieldStyle::Equals);
        let has_colon = self.fields.iter().any(|f| f.style == FieldStyle::Colon);
        has_equals && has_colon
    }

    pub fn missing_fields(&self, required: &[String]) -> Vec<MissingFieldError> {
        required
            .iter()
            .filter(|name| self.get(name).is_none())
            .map(|name| MissingFieldError {
                field: name.clone(),
            })
            .collect()
    }

    /// Rewrite every field to the canonical `key="value"` style, preserving
    /// order and values.
    pub fn canonicalize(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .map(|field| Field {
                    name: field.name.clone(),
                    value: field.value.clone(),
                    style: FieldStyle::Equals,
                })
                .collect(),
        }
    }

    /// Canonical text form. `parse(to_canonical(x))` reproduces the same
    /// fields, so canonicalization is byte-for-byte idempotent.
    pub fn to_canonical(&self) -> String {
        let mut lines = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            match &field.value {
                FieldValue::String(s) => lines.push(format!("{}=\"{}\"", field.name, s)),
                FieldValue::Bool(b) => lines.push(format!("{}={}", field.name, b)),
                FieldValue::List(items) => {
                    let quoted: Vec<String> =
                        items.iter().map(|item| format!("\"{}\"", item)).collect();
                    lines.push(format!("{}=[{}]", field.name, quoted.join(", ")));
                }
            }
        }
        lines.join("\n")
    }
}

fn parse_bare_value(raw: &str) -> FieldValue {
    match raw {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        other => FieldValue::String(other.to_string()),
    }
}

/// Split a list body on commas, but only commas outside quotes, so a quoted
/// item may itself contain commas. Quoted items keep their content verbatim;
/// bare items are trimmed.
fn parse_list_items(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted = false;

    let mut flush = |current: &mut String, quoted: &mut bool| {
        let item = if *quoted {
            current.clone()
        } else {
            current.trim().to_string()
        };
        if !item.is_empty() {
            items.push(item);
        }
        current.clear();
        *quoted = false;
    };

    for c in raw.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    quoted = true;
                }
                ',' => flush(&mut current, &mut quoted),
                _ => current.push(c),
            },
        }
    }
    flush(&mut current, &mut quoted);

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_equals_style() {
        let fm = FrontMatter::parse("title=\"Hello\"\ndraft=false").unwrap();
        assert_eq!(
            fm.get("title"),
            Some(&FieldValue::String("Hello".to_string()))
        );
        assert_eq!(fm.get("draft"), Some(&FieldValue::Bool(false)));
        assert!(!fm.is_mixed_format());
    }

    #[test]
    fn test_parse_colon_style() {
        let fm = FrontMatter::parse("title: Hello\ndate: \"2024-01-01\"").unwrap();
        assert_eq!(
            fm.get("date"),
            Some(&FieldValue::String("2024-01-01".to_string()))
        );
        assert!(!fm.is_mixed_format());
    }

    #[test]
    fn test_mixed_format_detected() {
        let fm = FrontMatter::parse("title=\"x\"\ndate: \"2024-01-01\"").unwrap();
        assert!(fm.is_mixed_format());
    }

    #[test]
    fn test_list_round_trip_preserves_order() {
        let fm = FrontMatter::parse("tags=[\"rust\", \"async\", \"cache\"]").unwrap();
        assert_eq!(
            fm.get("tags"),
            Some(&FieldValue::List(vec![
                "rust".to_string(),
                "async".to_string(),
                "cache".to_string()
            ]))
        );
        assert_eq!(fm.to_canonical(), "tags=[\"rust\", \"async\", \"cache\"]");
    }

    #[test]
    fn test_list_item_with_comma_survives_round_trip() {
        let raw = "tags=[\"hello, world\", \"rust\"]";
        let fm = FrontMatter::parse(raw).unwrap();
        assert_eq!(
            fm.get("tags"),
            Some(&FieldValue::List(vec![
                "hello, world".to_string(),
                "rust".to_string()
            ]))
        );
        assert_eq!(fm.to_canonical(), raw);
        assert_eq!(FrontMatter::parse(&fm.to_canonical()).unwrap(), fm);
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let fm = FrontMatter::parse("title: My Post\ntags: [a, b]\ndraft: true").unwrap();
        let first = fm.canonicalize().to_canonical();
        let second = FrontMatter::parse(&first).unwrap().to_canonical();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mixed_rewritten_to_uniform_equals() {
        let fm = FrontMatter::parse("title=\"x\"\ndate: \"2024-01-01\"").unwrap();
        assert_eq!(fm.to_canonical(), "title=\"x\"\ndate=\"2024-01-01\"");
        assert!(!FrontMatter::parse(&fm.to_canonical()).unwrap().is_mixed_format());
    }

    #[test]
    fn test_unparseable_line_reported() {
        let err = FrontMatter::parse("title=\"ok\"\n!!garbage!!").unwrap_err();
        assert_eq!(err, "!!garbage!!");
    }

    #[test]
    fn test_missing_fields_reported_not_raised() {
        let fm = FrontMatter::parse("date=\"2024-01-01\"").unwrap();
        let missing = fm.missing_fields(&["title".to_string(), "date".to_string()]);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].field, "title");
    }

    #[test]
    fn test_truthy_strings() {
        assert!(FieldValue::String("Yes".to_string()).is_truthy());
        assert!(FieldValue::Bool(true).is_truthy());
        assert!(!FieldValue::String("no".to_string()).is_truthy());
    }
}
