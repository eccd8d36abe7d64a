//! Converter pipeline (§4.2): translates a decoded wire value into the
//! field's exposed value and back, picking among conditioned alternatives.

use std::sync::Arc;

use crate::context::Scope;
use crate::error::{Error, FieldError, Result};
use crate::value::Value;

pub type ConvertFn = Arc<dyn Fn(Value) -> std::result::Result<Value, String> + Send + Sync>;
pub type ValidateFn = Arc<dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync>;

/// A pair of pure functions mapping wire representation <-> user
/// representation. Both are total on their declared domain; any
/// failure becomes a `ConverterError`/`ValidationError` tagged with the
/// field it occurred in.
#[derive(Clone)]
pub struct Converter {
    pub decode: ConvertFn,
    pub encode: ConvertFn,
}

impl Converter {
    pub fn identity() -> Self {
        Converter {
            decode: Arc::new(Ok),
            encode: Arc::new(Ok),
        }
    }

    pub fn new<D, E>(decode: D, encode: E) -> Self
    where
        D: Fn(Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
        E: Fn(Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        Converter {
            decode: Arc::new(decode),
            encode: Arc::new(encode),
        }
    }
}

#[derive(Clone)]
struct Alternative {
    condition: String,
    converter: Converter,
}

/// An ordered list of `(condition, converter)` alternatives plus a
/// mandatory default, per §3.
#[derive(Clone)]
pub struct ConverterSet {
    alternatives: Arc<Vec<Alternative>>,
    default: Converter,
}

impl ConverterSet {
    pub fn identity() -> Self {
        ConverterSet {
            alternatives: Arc::new(Vec::new()),
            default: Converter::identity(),
        }
    }

    pub fn new(default: Converter) -> Self {
        ConverterSet {
            alternatives: Arc::new(Vec::new()),
            default,
        }
    }

    pub fn with_alternative(mut self, condition: impl Into<String>, converter: Converter) -> Self {
        let mut alts = (*self.alternatives).clone();
        alts.push(Alternative {
            condition: condition.into(),
            converter,
        });
        self.alternatives = Arc::new(alts);
        self
    }

    /// Picks the first alternative whose condition evaluates true
    /// against the current scope; falls back to the default.
    fn choose(&self, scope: &Scope) -> Result<&Converter> {
        for alt in self.alternatives.iter() {
            let matched = crate::eval::eval_bool(&alt.condition, scope).map_err(|e| {
                Error::decode(
                    FieldError {
                        type_name: "ConverterSet",
                        field_name: "condition",
                    },
                    e.to_string(),
                )
            })?;
            if matched {
                return Ok(&alt.converter);
            }
        }
        Ok(&self.default)
    }

    /// Condition strings of every alternative, for the validator (§4.7):
    /// the dynamic `Value` model carries no declared wire/input types to
    /// check assignability against, so the checkable residue of "strict
    /// mode" is that every alternative's selector at least parses.
    pub fn conditions(&self) -> impl Iterator<Item = &str> {
        self.alternatives.iter().map(|alt| alt.condition.as_str())
    }

    pub fn decode(&self, wire: Value, scope: &Scope, at: FieldError) -> Result<Value> {
        let converter = self.choose(scope)?;
        (converter.decode)(wire).map_err(|e| Error::converter(at, e))
    }

    pub fn encode(&self, user: Value, scope: &Scope, at: FieldError) -> Result<Value> {
        let converter = self.choose(scope)?;
        (converter.encode)(user).map_err(|e| Error::converter(at, e))
    }
}

/// An optional predicate applied to a converted value; failure becomes a
/// `ValidationError`.
#[derive(Clone, Default)]
pub struct Validator(Option<ValidateFn>);

impl Validator {
    pub fn none() -> Self {
        Validator(None)
    }

    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        Validator(Some(Arc::new(f)))
    }

    pub fn validate(&self, value: &Value, at: FieldError) -> Result<()> {
        if let Some(f) = &self.0 {
            f(value).map_err(|e| Error::validation(at, e))?;
        }
        Ok(())
    }
}
