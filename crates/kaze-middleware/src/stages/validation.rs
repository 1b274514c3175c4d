//! Schema validation for route params and query strings.
//!
//! An [`ObjectSchema`] is a list of [`FieldSchema`] rules checked against
//! the string values of the request params or query. Failures are
//! collected per field and returned as a validation error, so the
//! dispatcher hands them to the validation handler.
//!
//! ```
//! use kaze_middleware::stages::validation::{query_validate, FieldSchema, ObjectSchema};
//!
//! let schema = ObjectSchema::builder()
//!     .field(FieldSchema::builder("page").required().number())
//!     .field(FieldSchema::builder("email").email())
//!     .build()
//!     .unwrap();
//!
//! let stage = query_validate(schema);
//! ```
//!
//! Schema construction is checked eagerly: an empty field name, a field
//! declared twice, or a field that is both a number and a string rule
//! fails with an `InvalidSchema` error.

use std::sync::Arc;

use indexmap::IndexMap;
use kaze_core::{
    BoxFuture, BoxedHandler, Context, Handler, HandlerResult, KazeError, KazeResult, Next,
    ValidationErrors,
};
use serde_json::{Map, Value};

/// Something that checks a flat string map.
pub trait Schema: Send + Sync + 'static {
    /// Checks `input`, returning every failure keyed by field.
    fn validate(&self, input: &IndexMap<String, String>) -> ValidationErrors;

    /// Converts `input` into JSON values, turning declared number fields
    /// into JSON numbers. Only called after `validate` succeeded.
    fn coerce(&self, input: &IndexMap<String, String>) -> Map<String, Value>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Required,
    Number,
    Email,
    MinLen(usize),
}

/// Rules for one field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    name: String,
    rules: Vec<Rule>,
}

impl FieldSchema {
    /// Starts a field definition.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> FieldSchemaBuilder {
        FieldSchemaBuilder {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// The field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_number(&self) -> bool {
        self.rules.contains(&Rule::Number)
    }

    fn check(&self, value: Option<&str>, errors: &mut ValidationErrors) {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            if self.rules.contains(&Rule::Required) {
                errors.add(&self.name, "required");
            }
            return;
        };

        for rule in &self.rules {
            match rule {
                Rule::Required => {}
                Rule::Number => {
                    if parse_number(value).is_none() {
                        errors.add(&self.name, "must be a number");
                    }
                }
                Rule::Email => {
                    if !is_email(value) {
                        errors.add(&self.name, "must be a valid email");
                    }
                }
                Rule::MinLen(min) => {
                    if value.chars().count() < *min {
                        errors.add(&self.name, format!("must be at least {min} characters"));
                    }
                }
            }
        }
    }
}

/// Builder for [`FieldSchema`].
#[derive(Debug, Clone)]
pub struct FieldSchemaBuilder {
    name: String,
    rules: Vec<Rule>,
}

impl FieldSchemaBuilder {
    /// The field must be present and non-empty.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.rules.push(Rule::Required);
        self
    }

    /// The field must parse as a finite number.
    #[must_use]
    pub fn number(mut self) -> Self {
        self.rules.push(Rule::Number);
        self
    }

    /// The field must look like an email address.
    #[must_use]
    pub fn email(mut self) -> Self {
        self.rules.push(Rule::Email);
        self
    }

    /// The field must have at least `len` characters.
    #[must_use]
    pub fn min_len(mut self, len: usize) -> Self {
        self.rules.push(Rule::MinLen(len));
        self
    }

    /// Checks the rule set.
    pub fn build(self) -> KazeResult<FieldSchema> {
        if self.name.trim().is_empty() {
            return Err(KazeError::invalid_schema("field name must not be empty"));
        }
        let number = self.rules.contains(&Rule::Number);
        let stringy = self
            .rules
            .iter()
            .any(|r| matches!(r, Rule::Email | Rule::MinLen(_)));
        if number && stringy {
            return Err(KazeError::invalid_schema(format!(
                "field '{}' cannot be both a number and a string rule",
                self.name
            )));
        }
        Ok(FieldSchema {
            name: self.name,
            rules: self.rules,
        })
    }
}

/// A set of field rules.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<FieldSchema>,
}

impl ObjectSchema {
    /// Starts a schema definition.
    #[must_use]
    pub fn builder() -> ObjectSchemaBuilder {
        ObjectSchemaBuilder::default()
    }

    /// The fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }
}

impl Schema for ObjectSchema {
    fn validate(&self, input: &IndexMap<String, String>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in &self.fields {
            field.check(input.get(&field.name).map(String::as_str), &mut errors);
        }
        errors
    }

    fn coerce(&self, input: &IndexMap<String, String>) -> Map<String, Value> {
        input
            .iter()
            .map(|(key, raw)| {
                let number = self
                    .fields
                    .iter()
                    .find(|f| &f.name == key)
                    .filter(|f| f.is_number())
                    .and_then(|_| parse_number(raw));
                (key.clone(), number.unwrap_or_else(|| Value::String(raw.clone())))
            })
            .collect()
    }
}

/// Builder for [`ObjectSchema`].
#[derive(Debug, Default)]
pub struct ObjectSchemaBuilder {
    fields: Vec<FieldSchemaBuilder>,
}

impl ObjectSchemaBuilder {
    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldSchemaBuilder) -> Self {
        self.fields.push(field);
        self
    }

    /// Builds every field and checks for duplicates.
    pub fn build(self) -> KazeResult<ObjectSchema> {
        let mut fields: Vec<FieldSchema> = Vec::with_capacity(self.fields.len());
        for builder in self.fields {
            let field = builder.build()?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(KazeError::invalid_schema(format!(
                    "field '{}' is declared twice",
                    field.name
                )));
            }
            fields.push(field);
        }
        Ok(ObjectSchema { fields })
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::from(int));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, rest)| !host.is_empty() && !rest.is_empty() && !rest.ends_with('.'))
}

/// Params that passed validation, as JSON values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedParams(pub Map<String, Value>);

/// Query values that passed validation, with number fields coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery(pub Map<String, Value>);

#[derive(Debug, Clone, Copy)]
enum Source {
    Params,
    Query,
}

struct ValidationMiddleware {
    schema: Arc<dyn Schema>,
    source: Source,
}

impl Handler for ValidationMiddleware {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let input: IndexMap<String, String> = match self.source {
                Source::Params => ctx
                    .params()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                Source::Query => ctx.query().clone(),
            };

            let errors = self.schema.validate(&input);
            if !errors.is_empty() {
                return Err(KazeError::Validation(errors));
            }

            match self.source {
                Source::Params => {
                    ctx.set_extension(ValidatedParams(self.schema.coerce(&input)));
                }
                Source::Query => {
                    ctx.set_extension(ValidatedQuery(self.schema.coerce(&input)));
                }
            }
            next.run(ctx).await
        })
    }

    fn name(&self) -> &str {
        match self.source {
            Source::Params => "params_validate",
            Source::Query => "query_validate",
        }
    }
}

/// Validates route params; the result is stored as [`ValidatedParams`].
pub fn params_validate(schema: impl Schema) -> BoxedHandler {
    Arc::new(ValidationMiddleware {
        schema: Arc::new(schema),
        source: Source::Params,
    })
}

/// Validates the query string; the result, with number fields coerced,
/// is stored as [`ValidatedQuery`].
pub fn query_validate(schema: impl Schema) -> BoxedHandler {
    Arc::new(ValidationMiddleware {
        schema: Arc::new(schema),
        source: Source::Query,
    })
}
