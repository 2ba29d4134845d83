//! Field schema: typed, defaulted, validated flat form records.
//!
//! # Design
//! - One [`FieldSpec`] per form field, in display order; nested form objects
//!   (the seedbox `traefik` block) carry their own member specs.
//! - Validation never stops at the first failure; every invalid or missing
//!   required field is reported in one [`ValidationErrors`] pass.
//! - Absent and `null` inputs take the field default. Fields without a default
//!   are required.
//! - Unknown input keys are dropped from the validated record.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SettingsResult, ValidationErrors};
use crate::path::{self, DocumentPath};
use crate::validate::{
    NumberIssue, coerce_bool, coerce_decimal, coerce_integer, is_domain, is_email,
};

/// Authentication methods accepted by reverse-proxy settings.
pub const AUTH_METHODS: &[&str] = &["basique", "oauth", "authelia", "aucune"];

/// Format rule applied to a text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRule {
    /// Any string is accepted.
    Any,
    /// String must contain at least `min` characters.
    MinLength {
        /// Minimum character count.
        min: usize,
        /// Message reported when the string is too short.
        message: &'static str,
    },
    /// String must look like an email address.
    Email {
        /// Message reported for malformed addresses.
        message: &'static str,
    },
    /// String must look like a dotted domain name with an alphabetic TLD.
    Domain {
        /// Message reported for malformed domains.
        message: &'static str,
    },
}

/// Semantic type of a form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Boolean toggle.
    Bool,
    /// Free or formatted text.
    Text(TextRule),
    /// Whole number with an inclusive lower bound; numeric strings are coerced.
    Integer {
        /// Inclusive minimum (`-1` commonly means "no limit").
        min: i64,
    },
    /// Record identifier: whole numbers and numeric strings become integers,
    /// other strings are kept verbatim and blank means `0`.
    Identifier,
    /// Real number with an inclusive lower bound; numeric strings are coerced.
    Decimal {
        /// Inclusive minimum.
        min: f64,
    },
    /// One value out of a fixed set.
    Choice(&'static [&'static str]),
    /// Ordered list of strings.
    TextList,
    /// Ordered list of `{label}` objects.
    LabelList,
    /// String-keyed map of strings.
    TextMap {
        /// Whether `null` map values are kept.
        nullable: bool,
    },
    /// String-keyed map whose values come from a fixed set.
    ChoiceMap(&'static [&'static str]),
    /// Nested form object with its own member fields.
    Object(Vec<FieldSpec>),
}

/// Declaration of one form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: Cow<'static, str>,
    kind: FieldKind,
    default: Option<Value>,
}

impl FieldSpec {
    /// Declare a field with an explicit kind and default.
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind, default: Option<Value>) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
            default,
        }
    }

    /// Boolean toggle with a default.
    #[must_use]
    pub const fn boolean(name: &'static str, default: bool) -> Self {
        Self::new(name, FieldKind::Bool, Some(Value::Bool(default)))
    }

    /// Unconstrained text with a default.
    #[must_use]
    pub fn text(name: &'static str, default: &str) -> Self {
        Self::new(
            name,
            FieldKind::Text(TextRule::Any),
            Some(Value::String(default.to_string())),
        )
    }

    /// Required text governed by `rule`.
    #[must_use]
    pub const fn required_text(name: &'static str, rule: TextRule) -> Self {
        Self::new(name, FieldKind::Text(rule), None)
    }

    /// Integer with inclusive lower bound `min` and a default.
    #[must_use]
    pub fn integer(name: &'static str, min: i64, default: i64) -> Self {
        Self::new(name, FieldKind::Integer { min }, Some(Value::from(default)))
    }

    /// Identifier defaulting to `0`.
    #[must_use]
    pub fn identifier(name: &'static str) -> Self {
        Self::new(name, FieldKind::Identifier, Some(Value::from(0)))
    }

    /// Decimal with inclusive lower bound `min` and a default.
    #[must_use]
    pub fn decimal(name: &'static str, min: f64, default: f64) -> Self {
        Self::new(name, FieldKind::Decimal { min }, Some(Value::from(default)))
    }

    /// Single choice out of `options`, required unless a default is attached.
    #[must_use]
    pub const fn choice(name: &'static str, options: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Choice(options), None)
    }

    /// List of strings, empty by default.
    #[must_use]
    pub const fn text_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::TextList, Some(Value::Array(Vec::new())))
    }

    /// List of `{label}` objects, empty by default.
    #[must_use]
    pub const fn label_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::LabelList, Some(Value::Array(Vec::new())))
    }

    /// Map of strings, empty by default.
    #[must_use]
    pub fn text_map(name: &'static str, nullable: bool) -> Self {
        Self::new(
            name,
            FieldKind::TextMap { nullable },
            Some(Value::Object(Map::new())),
        )
    }

    /// Map of choices out of `options`, empty by default.
    #[must_use]
    pub fn choice_map(name: &'static str, options: &'static [&'static str]) -> Self {
        Self::new(
            name,
            FieldKind::ChoiceMap(options),
            Some(Value::Object(Map::new())),
        )
    }

    /// Nested object whose default is assembled from its members' defaults.
    ///
    /// When any member is required the object itself has no default.
    #[must_use]
    pub fn object(name: &'static str, members: Vec<Self>) -> Self {
        let default = members
            .iter()
            .map(|member| {
                member
                    .default
                    .clone()
                    .map(|value| (member.name.to_string(), value))
            })
            .collect::<Option<Map<String, Value>>>()
            .map(Value::Object);
        Self::new(name, FieldKind::Object(members), default)
    }

    /// Replace the default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Drop the default so the field becomes required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.default = None;
        self
    }

    /// Same field under another form name.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Form field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic type.
    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Default used when the field is absent, `None` for required fields.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether input must supply the field.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }

    fn validate(&self, input: Option<&Value>, field: &str, errors: &mut ValidationErrors) -> Option<Value> {
        let supplied = input.filter(|value| !value.is_null());
        match (supplied, &self.kind) {
            (None, FieldKind::Object(members)) => {
                let seed = self
                    .default
                    .clone()
                    .unwrap_or_else(|| Value::Object(Map::new()));
                Some(validate_members(members, &seed, field, errors))
            }
            (None, _) => {
                if self.default.is_none() {
                    errors.push(field, "Required");
                }
                self.default.clone()
            }
            (Some(value), kind) => check_kind(kind, value, field, errors),
        }
    }
}

fn validate_members(
    members: &[FieldSpec],
    input: &Value,
    parent: &str,
    errors: &mut ValidationErrors,
) -> Value {
    let Some(object) = input.as_object() else {
        errors.push(if parent.is_empty() { "form" } else { parent }, "Expected object");
        return Value::Null;
    };
    let mut record = Map::new();
    for member in members {
        let field = if parent.is_empty() {
            member.name.to_string()
        } else {
            format!("{parent}.{}", member.name)
        };
        if let Some(value) = member.validate(object.get(member.name()), &field, errors) {
            record.insert(member.name.to_string(), value);
        }
    }
    Value::Object(record)
}

fn check_kind(kind: &FieldKind, value: &Value, field: &str, errors: &mut ValidationErrors) -> Option<Value> {
    match kind {
        FieldKind::Bool => coerce_bool(value).map(Value::Bool).or_else(|| {
            errors.push(field, "Expected boolean");
            None
        }),
        FieldKind::Text(rule) => check_text(rule, value, field, errors),
        FieldKind::Integer { min } => match coerce_integer(value) {
            Ok(number) if number >= *min => Some(Value::from(number)),
            Ok(_) => {
                errors.push(field, format!("Number must be greater than or equal to {min}"));
                None
            }
            Err(issue) => {
                errors.push(field, number_issue_message(issue));
                None
            }
        },
        FieldKind::Identifier => match value {
            Value::String(raw) if raw.trim().is_empty() => Some(Value::from(0)),
            Value::String(_) | Value::Number(_) => Some(
                coerce_integer(value).map_or_else(|_| value.clone(), Value::from),
            ),
            _ => {
                errors.push(field, "Expected number or string");
                None
            }
        },
        FieldKind::Decimal { min } => match coerce_decimal(value) {
            Ok(number) if number >= *min => {
                if value.is_number() {
                    Some(value.clone())
                } else {
                    Some(Value::from(number))
                }
            }
            Ok(_) => {
                errors.push(field, format!("Number must be greater than or equal to {min}"));
                None
            }
            Err(issue) => {
                errors.push(field, number_issue_message(issue));
                None
            }
        },
        FieldKind::Choice(options) => match value.as_str() {
            Some(choice) if options.contains(&choice) => Some(value.clone()),
            _ => {
                errors.push(field, choice_message(options));
                None
            }
        },
        FieldKind::TextList => check_list(value, field, errors, |item, item_field, errors| {
            if item.is_string() {
                Some(item.clone())
            } else {
                errors.push(item_field, "Expected string");
                None
            }
        }),
        FieldKind::LabelList => check_list(value, field, errors, |item, item_field, errors| {
            match item.get("label").and_then(Value::as_str) {
                Some(label) => Some(serde_json::json!({ "label": label })),
                None => {
                    errors.push(format!("{item_field}.label"), "Required");
                    None
                }
            }
        }),
        FieldKind::TextMap { nullable } => check_map(value, field, errors, |entry, entry_field, errors| {
            match entry {
                Value::String(_) => Some(entry.clone()),
                Value::Null if *nullable => Some(Value::Null),
                _ => {
                    errors.push(entry_field, "Expected string");
                    None
                }
            }
        }),
        FieldKind::ChoiceMap(options) => check_map(value, field, errors, |entry, entry_field, errors| {
            match entry.as_str() {
                Some(choice) if options.contains(&choice) => Some(entry.clone()),
                _ => {
                    errors.push(entry_field, choice_message(options));
                    None
                }
            }
        }),
        FieldKind::Object(members) => {
            if value.is_object() {
                Some(validate_members(members, value, field, errors))
            } else {
                errors.push(field, "Expected object");
                None
            }
        }
    }
}

fn check_text(rule: &TextRule, value: &Value, field: &str, errors: &mut ValidationErrors) -> Option<Value> {
    let Some(text) = value.as_str() else {
        errors.push(field, "Expected string");
        return None;
    };
    let failure = match rule {
        TextRule::Any => None,
        TextRule::MinLength { min, message } => (text.chars().count() < *min).then_some(*message),
        TextRule::Email { message } => (!is_email(text)).then_some(*message),
        TextRule::Domain { message } => (!is_domain(text)).then_some(*message),
    };
    if let Some(message) = failure {
        errors.push(field, message);
        return None;
    }
    Some(value.clone())
}

fn check_list(
    value: &Value,
    field: &str,
    errors: &mut ValidationErrors,
    check_item: impl Fn(&Value, String, &mut ValidationErrors) -> Option<Value>,
) -> Option<Value> {
    let Some(items) = value.as_array() else {
        errors.push(field, "Expected array");
        return None;
    };
    let before = errors.len();
    let checked: Vec<Value> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| check_item(item, format!("{field}.{index}"), errors))
        .collect();
    (errors.len() == before).then_some(Value::Array(checked))
}

fn check_map(
    value: &Value,
    field: &str,
    errors: &mut ValidationErrors,
    check_entry: impl Fn(&Value, String, &mut ValidationErrors) -> Option<Value>,
) -> Option<Value> {
    let Some(entries) = value.as_object() else {
        errors.push(field, "Expected object");
        return None;
    };
    let before = errors.len();
    let checked: Map<String, Value> = entries
        .iter()
        .filter_map(|(key, entry)| {
            check_entry(entry, format!("{field}.{key}"), errors).map(|value| (key.clone(), value))
        })
        .collect();
    (errors.len() == before).then_some(Value::Object(checked))
}

const fn number_issue_message(issue: NumberIssue) -> &'static str {
    match issue {
        NumberIssue::NotANumber => "Expected number",
        NumberIssue::NotAnInteger => "Expected integer",
    }
}

fn choice_message(options: &[&str]) -> String {
    let expected = options
        .iter()
        .map(|option| format!("'{option}'"))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("Invalid enum value. Expected {expected}")
}

/// Ordered set of fields making up one settings form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Build a schema from fields in display order.
    #[must_use]
    pub const fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Fields in display order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    /// Look up a top-level field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Default for the (possibly nested) form field at `form_path`.
    #[must_use]
    pub fn default_at(&self, form_path: &DocumentPath) -> Option<&Value> {
        let (first, rest) = form_path.segments().split_first()?;
        let mut spec = self.field(first)?;
        for segment in rest {
            let FieldKind::Object(members) = &spec.kind else {
                return None;
            };
            spec = members.iter().find(|member| member.name() == segment.as_str())?;
        }
        spec.default.as_ref()
    }

    /// Produce a record holding every field's default (required fields omitted).
    #[must_use]
    pub fn defaults(&self) -> FlatFields {
        FlatFields(
            self.fields
                .iter()
                .filter_map(|spec| {
                    spec.default
                        .clone()
                        .map(|value| (spec.name.to_string(), value))
                })
                .collect(),
        )
    }

    /// Validate loosely-typed input into a complete, type-correct record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing one entry per invalid or missing
    /// required field.
    pub fn validate(&self, input: &Value) -> Result<FlatFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let empty = Value::Object(Map::new());
        let source = if input.is_null() { &empty } else { input };
        let record = validate_members(&self.fields, source, "", &mut errors);
        let fields = match record {
            Value::Object(map) => FlatFields(map),
            _ => FlatFields::new(),
        };
        errors.into_result(fields)
    }
}

/// Flat, form-friendly field record keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatFields(Map<String, Value>);

impl FlatFields {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a record from a JSON object; other values yield an empty record.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    /// Value of a top-level field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Value of a (possibly nested) field.
    #[must_use]
    pub fn get_path(&self, form_path: &DocumentPath) -> Option<&Value> {
        let mut current = self.0.get(form_path.root())?;
        for segment in form_path.segments().iter().skip(1) {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// String value of a top-level field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Set a top-level field.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Set a (possibly nested) field.
    ///
    /// # Errors
    ///
    /// Returns an error when a parent segment already holds a non-object value.
    pub fn insert_path(&mut self, form_path: &DocumentPath, value: Value) -> SettingsResult<()> {
        path::insert(&mut self.0, form_path, value)
    }

    /// Whether a top-level field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Borrow the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
