//! # Schema — Record Validation
//!
//! A [`Schema`] runs its rules in declaration order against one input
//! record and builds a fresh output record. Rule failures are collected,
//! not raised: every rule runs, and the caller receives one error tree
//! keyed by field (or `*` for whole-record rules).
//!
//! ## Output Record
//!
//! The output starts as a copy of the input entries that some field rule
//! targets. Unexpected entries are copied too under
//! [`UnexpectedKeys::Keep`]. Rules then overwrite, add or remove entries
//! according to their [`Storage`]. The input is never modified and never
//! shared with the output.
//!
//! ## Faults
//!
//! A program fault raised by any step aborts validation immediately and is
//! returned as is. It is never recorded in the error tree.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use keel_core::message::{COULD_NOT_COMPUTE, FIELD_MISSING, UNEXPECTED_KEY};
use keel_core::{Error, Failure, FilterError, Kind, MessageCatalog, Record, GLOBAL_KEY};
use keel_filter::{run_chain, wrong_type, ChainStep, Filter};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rule::{DefaultValue, Presence, Rule, Storage, Target};

/// What to do with input keys no field rule targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnexpectedKeys {
    /// Report each one as "Unexpected key.".
    #[default]
    Fail,
    /// Copy them into the output unchanged.
    Keep,
    /// Drop them silently.
    Delete,
}

/// An ordered set of rules over a record. Cheap to clone; one instance can
/// validate from any number of threads.
#[derive(Debug, Clone)]
pub struct Schema {
    rules: Arc<[Rule]>,
    expected: Arc<BTreeSet<String>>,
    unexpected_keys: UnexpectedKeys,
    catalog: Option<Arc<MessageCatalog>>,
}

impl Schema {
    /// A schema failing on unexpected keys and rendering through the
    /// built-in catalog.
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        SchemaBuilder::default().rules(rules).build()
    }

    /// Start a builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The rules, in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The unexpected-key policy.
    pub fn unexpected_keys(&self) -> UnexpectedKeys {
        self.unexpected_keys
    }

    /// Whether some field rule targets `key`.
    pub fn expects(&self, key: &str) -> bool {
        self.expected.contains(key)
    }

    fn catalog(&self) -> &MessageCatalog {
        match &self.catalog {
            Some(catalog) => catalog,
            None => MessageCatalog::builtin(),
        }
    }

    /// Validate `input`, rendering failures in `lang` (or the catalog's
    /// default language).
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] carrying the whole error tree when any rule
    /// failed; [`Error::Fault`] when a caller-supplied function faulted.
    pub fn validate_record(&self, input: &Record, lang: Option<&str>) -> Result<Record, Error> {
        self.run_record(input)
            .map_err(|err| err.render(self.catalog(), lang))
    }

    /// Validate `input` without rendering failures.
    ///
    /// # Errors
    ///
    /// [`FilterError::Invalid`] holding a [`Failure::Fields`] tree, or the
    /// first program fault.
    pub fn run_record(&self, input: &Record) -> Result<Record, FilterError> {
        tracing::debug!(
            rules = self.rules.len(),
            keys = input.len(),
            "validating record"
        );
        let mut errors: BTreeMap<String, Failure> = BTreeMap::new();
        let mut output = self.seed(input, &mut errors);
        let mut global_failures: Vec<Failure> = Vec::new();

        for (index, rule) in self.rules.iter().enumerate() {
            match &rule.target {
                Target::Field(key) => {
                    tracing::trace!(rule = index, field = %key, "running field rule");
                    Self::run_field_rule(rule, key, input, &mut output, &mut errors)?;
                }
                Target::Global => {
                    tracing::trace!(rule = index, "running global rule");
                    if let Some(failure) = Self::run_global_rule(rule, input, &mut output)? {
                        global_failures.push(failure);
                    }
                }
            }
        }

        let global = match global_failures.len() {
            0 => None,
            1 => global_failures.pop(),
            _ => Some(Failure::Many(global_failures)),
        };
        if let Some(failure) = global {
            errors.insert(GLOBAL_KEY.to_string(), failure);
        }

        tracing::debug!(errors = errors.len(), "record validated");
        if errors.is_empty() {
            Ok(output)
        } else {
            Err(FilterError::Invalid(Failure::Fields(errors)))
        }
    }

    fn seed(&self, input: &Record, errors: &mut BTreeMap<String, Failure>) -> Record {
        let mut output = Record::new();
        for (key, value) in input {
            if self.expected.contains(key) {
                output.insert(key.clone(), value.clone());
                continue;
            }
            match self.unexpected_keys {
                UnexpectedKeys::Keep => {
                    output.insert(key.clone(), value.clone());
                }
                UnexpectedKeys::Fail => {
                    errors.insert(key.clone(), Failure::message(UNEXPECTED_KEY));
                }
                UnexpectedKeys::Delete => {}
            }
        }
        output
    }

    fn run_field_rule(
        rule: &Rule,
        key: &str,
        input: &Record,
        output: &mut Record,
        errors: &mut BTreeMap<String, Failure>,
    ) -> Result<(), FilterError> {
        let raw = match input.get(key) {
            Some(value) if rule.discard.contains(value) => {
                output.remove(key);
                None
            }
            other => other.cloned(),
        };

        let value = match (raw, &rule.presence) {
            (Some(value), _) => value,
            (None, Presence::Optional) => return Ok(()),
            (None, Presence::Required) => {
                errors.insert(key.to_string(), Failure::message(FIELD_MISSING));
                return Ok(());
            }
            (None, Presence::Default(default)) => {
                if !errors.is_empty() && matches!(default, DefaultValue::Computed(_)) {
                    return Ok(());
                }
                let value = default.produce(input);
                output.insert(key.to_string(), value.clone());
                value
            }
        };

        match run_chain(&rule.steps, value) {
            Ok(value) => {
                store(rule.storage.as_ref(), key, value, output);
                Ok(())
            }
            Err(FilterError::Invalid(failure)) => {
                errors.insert(key.to_string(), failure);
                if let Some(alternate) = rule.storage.as_ref().and_then(Storage::alternate_key) {
                    errors
                        .entry(alternate.to_string())
                        .or_insert_with(|| Failure::message(COULD_NOT_COMPUTE));
                }
                Ok(())
            }
            Err(fault) => Err(fault),
        }
    }

    fn run_global_rule(
        rule: &Rule,
        input: &Record,
        output: &mut Record,
    ) -> Result<Option<Failure>, FilterError> {
        let value = match run_chain(&rule.steps, Value::Object(input.clone())) {
            Ok(value) => value,
            Err(FilterError::Invalid(failure)) => return Ok(Some(failure)),
            Err(fault) => return Err(fault),
        };
        match rule.storage.as_ref() {
            Some(Storage::SaveAs(key)) => {
                output.insert(key.clone(), value);
            }
            None => {}
            Some(Storage::Save | Storage::MoveTo(_) | Storage::Delete) => {
                tracing::debug!("storage without a field key ignored on a global rule");
            }
        }
        Ok(None)
    }
}

fn store(storage: Option<&Storage>, key: &str, value: Value, output: &mut Record) {
    match storage {
        None | Some(Storage::Save) => {
            output.insert(key.to_string(), value);
        }
        Some(Storage::SaveAs(alternate)) => {
            output.insert(alternate.clone(), value);
        }
        Some(Storage::MoveTo(alternate)) => {
            output.remove(key);
            output.insert(alternate.clone(), value);
        }
        Some(Storage::Delete) => {
            output.remove(key);
        }
    }
}

impl Filter for Schema {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        match value {
            Value::Object(record) => self.run_record(&record).map(Value::Object),
            other => Err(wrong_type(&[Kind::Dict], &other).into()),
        }
    }

    fn validate(&self, value: Value, lang: Option<&str>) -> Result<Value, Error> {
        self.validate_with(value, self.catalog(), lang)
    }
}

impl From<Schema> for ChainStep {
    fn from(schema: Schema) -> Self {
        ChainStep::Filter(Arc::new(schema))
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    rules: Vec<Rule>,
    unexpected_keys: UnexpectedKeys,
    catalog: Option<Arc<MessageCatalog>>,
}

impl SchemaBuilder {
    /// Append a rule.
    pub fn rule(mut self, rule: impl Into<Rule>) -> Self {
        self.rules.push(rule.into());
        self
    }

    /// Append several rules.
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Set the unexpected-key policy.
    pub fn unexpected_keys(mut self, policy: UnexpectedKeys) -> Self {
        self.unexpected_keys = policy;
        self
    }

    /// Render through `catalog` instead of the built-in one.
    pub fn catalog(mut self, catalog: impl Into<Arc<MessageCatalog>>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Finish the schema.
    pub fn build(self) -> Schema {
        let expected = self
            .rules
            .iter()
            .filter_map(|rule| rule.field_key().map(str::to_string))
            .collect();
        Schema {
            rules: self.rules.into(),
            expected: Arc::new(expected),
            unexpected_keys: self.unexpected_keys,
            catalog: self.catalog,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_filter::{Apply, Type};
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not a record: {other}"),
        }
    }

    fn details(schema: &Schema, input: Value) -> Value {
        let err = schema.validate_record(&record(input), None).unwrap_err();
        err.error_details().expect("validation error").to_json()
    }

    #[test]
    fn test_seed_copies_expected_keys_only() {
        let schema = Schema::builder()
            .rule(Rule::field("a"))
            .unexpected_keys(UnexpectedKeys::Delete)
            .build();
        let out = schema.validate_record(&record(json!({"a": 1, "z": 2})), None).unwrap();
        assert_eq!(Value::Object(out), json!({"a": 1}));
    }

    #[test]
    fn test_rule_without_steps_copies_value() {
        let schema = Schema::new([Rule::field("a").save()]);
        let out = schema.validate_record(&record(json!({"a": [1, 2]})), None).unwrap();
        assert_eq!(Value::Object(out), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_last_write_wins_for_colliding_keys() {
        let schema = Schema::new([
            Rule::field("a").map(|_| json!("first")).save_as("out"),
            Rule::field("b").map(|_| json!("second")).save_as("out"),
        ]);
        let out = schema
            .validate_record(&record(json!({"a": 1, "b": 2})), None)
            .unwrap();
        assert_eq!(out["out"], json!("second"));
    }

    #[test]
    fn test_failed_move_reports_target() {
        let schema = Schema::new([Rule::field("age").then(Type::of(Kind::Float)).move_to("years")]);
        assert_eq!(
            details(&schema, json!({"age": "old"})),
            json!({
                "age": "Wrong type. Expected float. Got str instead.",
                "years": "Couldn't compute field."
            })
        );
    }

    #[test]
    fn test_default_is_written_before_chain() {
        let schema = Schema::new([Rule::field("n").default_value(4).then(Type::of(Kind::Int)).delete()]);
        let out = schema.validate_record(&Record::new(), None).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_computed_default_skipped_after_errors() {
        let schema = Schema::new([
            Rule::field("a").then(Type::of(Kind::Int)).save(),
            Rule::field("b")
                .default_with(|_| panic!("producer must not run on a failing record"))
                .save(),
        ]);
        assert_eq!(
            details(&schema, json!({"a": "x"})),
            json!({"a": "Wrong type. Expected int. Got str instead."})
        );
    }

    #[test]
    fn test_global_rule_keeps_field_storage_and_dropped_keys() {
        let schema = Schema::builder()
            .rule(Rule::field("a").map(|_| json!(100)).save())
            .rule(Rule::global().map(|record| record))
            .unexpected_keys(UnexpectedKeys::Delete)
            .build();
        let out = schema.validate_record(&record(json!({"a": 1, "z": 9})), None).unwrap();
        assert_eq!(Value::Object(out), json!({"a": 100}));
    }

    #[test]
    fn test_global_save_as_and_input_view() {
        let schema = Schema::new([
            Rule::field("a").map(|_| json!(100)).save(),
            Rule::global().map(|record| record["a"].clone()).save_as("original_a"),
        ]);
        let out = schema.validate_record(&record(json!({"a": 1})), None).unwrap();
        assert_eq!(Value::Object(out), json!({"a": 100, "original_a": 1}));
    }

    #[test]
    fn test_fault_aborts_validation() {
        #[derive(Debug)]
        struct Bug;
        impl std::fmt::Display for Bug {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("bug")
            }
        }
        impl std::error::Error for Bug {}

        let schema = Schema::new([
            Rule::field("a")
                .then(Apply::new(|_: Value| -> Result<Value, Bug> { Err(Bug) }).catch::<std::num::ParseIntError>())
                .save(),
            Rule::field("b").save(),
        ]);
        let err = schema.validate_record(&record(json!({"a": 1})), None).unwrap_err();
        assert!(err.is_fault());
    }

    #[test]
    fn test_non_record_input() {
        let schema = Schema::new([Rule::field("a").save()]);
        let err = schema.validate(json!([1]), None).unwrap_err();
        assert_eq!(
            err.error_details().unwrap(),
            "Wrong type. Expected dict. Got list instead."
        );
    }

    #[test]
    fn test_schema_catalog_used_by_validate() {
        let catalog = MessageCatalog::bundled().with_default_lang("fr");
        let schema = Schema::builder()
            .rule(Rule::field("a"))
            .catalog(catalog)
            .build();
        let err = schema.validate(json!({}), None).unwrap_err();
        assert_eq!(
            err.error_details().unwrap().to_json(),
            json!({"a": "Champ manquant."})
        );
    }

    #[test]
    fn test_unexpected_keys_policy_serde() {
        let policy: UnexpectedKeys = serde_yaml::from_str("keep").unwrap();
        assert_eq!(policy, UnexpectedKeys::Keep);
        assert_eq!(serde_json::to_value(UnexpectedKeys::Fail).unwrap(), json!("fail"));
    }

    #[test]
    fn test_expects() {
        let schema = Schema::new([Rule::field("a").save_as("b"), Rule::from(Rule::global())]);
        assert!(schema.expects("a"));
        assert!(!schema.expects("b"));
        assert_eq!(schema.rules().len(), 2);
        assert_eq!(schema.unexpected_keys(), UnexpectedKeys::Fail);
    }
}
