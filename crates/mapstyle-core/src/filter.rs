//! Filter compilation.
//!
//! Turns a request's filter (raw expression, flat attribute object or
//! `filterProperties`) plus the template's default clauses into one filter
//! expression, validating and correcting attribute values against the catalog
//! on the way.

use indexmap::IndexMap;
use mapstyle_catalog::{
    AttributeCatalog, AttributeDomain, AttributeSpec, FilterClause, LayerTemplate,
    SourceLayerSchema,
};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::corrections::{Correction, CorrectionCode, CorrectionLog};
use crate::expression;
use crate::request::LayerRequest;
use crate::similarity::{best_match, closest_names, loosely_equal, strip_separators};

/// Attributes searched first when a filter key isn't a real attribute.
const REWRITE_PRIORITY: &[&str] = &[
    "type",
    "class",
    "maki",
    "structure",
    "surface",
    "mode",
    "stop_type",
];

/// Shortest needle allowed in substring matching.
const MIN_SUBSTRING_LEN: usize = 3;

/// Legal values listed in a hint before eliding the rest.
const HINT_VALUE_LIMIT: usize = 8;

pub struct FilterCompiler<'a> {
    catalog: &'a AttributeCatalog,
    config: &'a EngineConfig,
}

/// Per-attribute compilation state, in first-seen order.
#[derive(Debug)]
enum Constraint {
    Values { values: Vec<Value>, inclusion: bool },
    Presence(bool),
}

/// A filter pair whose key was mapped onto a real attribute.
#[derive(Debug, PartialEq)]
struct Rewrite {
    attribute: String,
    values: Vec<Value>,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(catalog: &'a AttributeCatalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Compile the effective filter of `request` against `template`.
    pub fn compile(
        &self,
        template: &LayerTemplate,
        request: &LayerRequest,
        log: &mut CorrectionLog,
    ) -> Option<Value> {
        let layer = request.layer_type.as_str();
        let mut props: IndexMap<String, Value> = IndexMap::new();

        match &request.filter {
            Some(Value::Array(items)) if items.first().is_some_and(Value::is_string) => {
                tracing::debug!(layer_type = layer, "Using raw filter expression");
                return request.filter.clone();
            }
            Some(Value::Object(map)) => {
                props.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            None | Some(Value::Null) => {}
            Some(other) => log.push(
                Correction::new(
                    CorrectionCode::MalformedFilter,
                    layer,
                    format!("ignored filter {}", other),
                )
                .with_hint("a filter must be an expression array or an attribute object"),
            ),
        }
        if let Some(explicit) = &request.filter_properties {
            for (key, value) in explicit {
                props.insert(key.clone(), value.clone());
            }
        }

        let schema = template
            .source_layer
            .as_deref()
            .and_then(|name| self.catalog.source_layer(name));
        let defaults = template.filter_clauses();

        if props.is_empty() {
            let clauses = defaults
                .iter()
                .map(|clause| compile_clause(clause, schema))
                .collect();
            return expression::all(clauses);
        }

        let constraints = self.compile_properties(&props, schema, layer, log);
        let mut clauses: Vec<Value> = defaults
            .iter()
            .filter(|clause| !constraints.contains_key(&clause.attribute))
            .map(|clause| compile_clause(clause, schema))
            .collect();
        clauses.extend(
            constraints
                .into_iter()
                .filter_map(|(attribute, constraint)| constraint_expression(&attribute, constraint)),
        );
        expression::all(clauses)
    }

    fn compile_properties(
        &self,
        props: &IndexMap<String, Value>,
        schema: Option<&SourceLayerSchema>,
        layer: &str,
        log: &mut CorrectionLog,
    ) -> IndexMap<String, Constraint> {
        let mut constraints: IndexMap<String, Constraint> = IndexMap::new();

        for (key, raw) in props {
            let Some(schema) = schema else {
                let values = literal_values(key, raw, layer, log);
                if !values.is_empty() {
                    add_values(&mut constraints, key, values, raw.is_array());
                }
                continue;
            };

            if self.config.is_presence_only(key) && schema.has_attribute(key) {
                let present = boolean_like(raw).unwrap_or(true);
                tracing::debug!(attribute = %key, present, "Presence-only filter");
                constraints.insert(key.clone(), Constraint::Presence(present));
                continue;
            }

            if let Some(spec) = schema.attribute(key) {
                let values: Vec<Value> = literal_values(key, raw, layer, log)
                    .iter()
                    .filter_map(|value| self.check_value(key, spec, value, layer, log))
                    .collect();
                if !values.is_empty() {
                    add_values(&mut constraints, key, values, raw.is_array());
                }
                continue;
            }

            match rewrite(schema, key, raw) {
                Some(_) if boolean_like(raw) == Some(false) => log.push(Correction::new(
                    CorrectionCode::RewrittenPairDropped,
                    layer,
                    format!("dropped filter '{}: {}' (a false value cannot be rewritten)", key, raw),
                )),
                Some(Rewrite { attribute, values }) => {
                    log.record(
                        CorrectionCode::AttributeRewritten,
                        layer,
                        format!(
                            "filter '{}: {}' rewritten as '{}: {}'",
                            key,
                            raw,
                            attribute,
                            Value::Array(values.clone())
                        ),
                    );
                    add_values(&mut constraints, &attribute, values, true);
                }
                None => {
                    let mut entry = Correction::new(
                        CorrectionCode::FilterAttributeUnresolvable,
                        layer,
                        format!("dropped filter '{}: {}' (no matching attribute or value)", key, raw),
                    );
                    if let Some(name) =
                        closest_names(key, schema.attributes.keys().map(String::as_str)).first()
                    {
                        entry = entry.with_hint(format!("did you mean '{}'?", name));
                    }
                    log.push(entry);
                }
            }
        }

        constraints
    }

    /// Validate one caller value for a real attribute, correcting it if possible.
    ///
    /// `None` drops the value from the filter.
    fn check_value(
        &self,
        attribute: &str,
        spec: &AttributeSpec,
        value: &Value,
        layer: &str,
        log: &mut CorrectionLog,
    ) -> Option<Value> {
        match &spec.domain {
            AttributeDomain::Enumerated(legal) => {
                Some(self.check_enumerated(attribute, spec, legal, value, layer, log))
            }
            AttributeDomain::Range { min, max } => {
                check_range(attribute, *min, *max, value, layer, log)
            }
            AttributeDomain::FreeText => Some(value.clone()),
        }
    }

    fn check_enumerated(
        &self,
        attribute: &str,
        spec: &AttributeSpec,
        legal: &[String],
        value: &Value,
        layer: &str,
        log: &mut CorrectionLog,
    ) -> Value {
        if spec.has_string_booleans()
            && let Some(flag) = boolean_like(value)
        {
            return Value::String(flag.to_string());
        }

        let text = label_text(value);

        if legal.contains(&text) {
            return Value::String(text);
        }

        let lowered = text.to_lowercase();
        if let Some(canonical) = legal.iter().find(|v| v.to_lowercase() == lowered) {
            tracing::trace!(attribute, from = %text, to = %canonical, "Normalized value case");
            return Value::String(canonical.clone());
        }

        let stripped = strip_separators(&text);
        let corrected = legal
            .iter()
            .find(|v| strip_separators(v) == stripped)
            .map(String::as_str)
            .or_else(|| best_match(&text, legal, &self.config.similarity).map(|(best, _)| best));

        match corrected {
            Some(canonical) => {
                log.record(
                    CorrectionCode::ValueCorrected,
                    layer,
                    format!("{} '{}' corrected to '{}'", attribute, text, canonical),
                );
                Value::String(canonical.to_string())
            }
            None => {
                log.push(not_in_set(attribute, legal, value, layer));
                Value::String(text)
            }
        }
    }
}

fn not_in_set(attribute: &str, legal: &[String], value: &Value, layer: &str) -> Correction {
    let mut listed: Vec<&str> = legal
        .iter()
        .take(HINT_VALUE_LIMIT)
        .map(String::as_str)
        .collect();
    if legal.len() > HINT_VALUE_LIMIT {
        listed.push("...");
    }
    Correction::new(
        CorrectionCode::ValueOutOfEnumeratedSet,
        layer,
        format!("{} value {} is not a known value; passed through", attribute, value),
    )
    .with_hint(format!("expected one of: {}", listed.join(", ")))
}

fn check_range(
    attribute: &str,
    min: f64,
    max: f64,
    value: &Value,
    layer: &str,
    log: &mut CorrectionLog,
) -> Option<Value> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(number) = number else {
        log.record(
            CorrectionCode::ValueOutOfRange,
            layer,
            format!(
                "dropped {} value {} (expects a number between {} and {})",
                attribute, value, min, max
            ),
        );
        return None;
    };
    if number < min || number > max {
        log.record(
            CorrectionCode::ValueOutOfRange,
            layer,
            format!("{} value {} is outside {}..{}; passed through", attribute, number, min, max),
        );
    }
    Some(expression::num(number))
}

/// Map a pair whose key isn't an attribute onto a real attribute.
///
/// Searches the key, then the values, for an exact legal value; then both
/// again for a substring match. Attributes are tried in priority order.
fn rewrite(schema: &SourceLayerSchema, key: &str, raw: &Value) -> Option<Rewrite> {
    let order = rewrite_order(schema);
    let needles: Vec<String> = scalars(raw)
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();

    let matchers: [fn(&str, &[String]) -> Option<String>; 2] = [exact_value, partial_value];
    for matcher in matchers {
        for (attribute, spec) in &order {
            if let Some(value) = matcher(key, spec.legal_values()) {
                return Some(Rewrite {
                    attribute: attribute.to_string(),
                    values: vec![Value::String(value)],
                });
            }
        }
        for (attribute, spec) in &order {
            let mut values: Vec<Value> = Vec::new();
            for needle in &needles {
                if let Some(value) = matcher(needle, spec.legal_values()) {
                    let value = Value::String(value);
                    if !values.contains(&value) {
                        values.push(value);
                    }
                }
            }
            if !values.is_empty() {
                return Some(Rewrite {
                    attribute: attribute.to_string(),
                    values,
                });
            }
        }
    }
    None
}

fn exact_value(needle: &str, legal: &[String]) -> Option<String> {
    legal.iter().find(|v| loosely_equal(v, needle)).cloned()
}

fn partial_value(needle: &str, legal: &[String]) -> Option<String> {
    let needle = strip_separators(needle);
    if needle.len() < MIN_SUBSTRING_LEN {
        return None;
    }
    legal
        .iter()
        .find(|v| {
            let candidate = strip_separators(v);
            candidate.len() >= MIN_SUBSTRING_LEN
                && (candidate.contains(&needle) || needle.contains(&candidate))
        })
        .cloned()
}

/// Enumerated attributes of a layer, priority attributes first.
fn rewrite_order(schema: &SourceLayerSchema) -> Vec<(&str, &AttributeSpec)> {
    let mut order: Vec<(&str, &AttributeSpec)> = REWRITE_PRIORITY
        .iter()
        .filter_map(|name| schema.attributes.get_key_value(*name))
        .map(|(name, spec)| (name.as_str(), spec))
        .collect();
    order.extend(
        schema
            .attributes
            .iter()
            .filter(|(name, _)| !REWRITE_PRIORITY.contains(&name.as_str()))
            .map(|(name, spec)| (name.as_str(), spec)),
    );
    order.retain(|(_, spec)| spec.is_enumerated());
    order
}

fn add_values(
    constraints: &mut IndexMap<String, Constraint>,
    attribute: &str,
    values: Vec<Value>,
    inclusion: bool,
) {
    let entry = constraints
        .entry(attribute.to_string())
        .or_insert(Constraint::Values {
            values: Vec::new(),
            inclusion: false,
        });
    if matches!(entry, Constraint::Presence(_)) {
        *entry = Constraint::Values {
            values: Vec::new(),
            inclusion: false,
        };
    }
    if let Constraint::Values {
        values: existing,
        inclusion: forced,
    } = entry
    {
        for value in values {
            if !existing.contains(&value) {
                existing.push(value);
            }
        }
        *forced |= inclusion;
    }
}

fn constraint_expression(attribute: &str, constraint: Constraint) -> Option<Value> {
    match constraint {
        Constraint::Presence(true) => Some(expression::has(attribute)),
        Constraint::Presence(false) => Some(expression::not(expression::has(attribute))),
        Constraint::Values { values, .. } if values.is_empty() => None,
        Constraint::Values {
            mut values,
            inclusion,
        } => {
            if values.len() == 1 && !inclusion {
                values.pop().map(|value| expression::equals(attribute, value))
            } else {
                Some(expression::one_of(attribute, uniform_labels(values)))
            }
        }
    }
}

/// Compile a default `attr: v1|v2` clause to an inclusion test.
///
/// Values of numeric range attributes are emitted as numbers.
fn compile_clause(clause: &FilterClause, schema: Option<&SourceLayerSchema>) -> Value {
    let numeric = schema
        .and_then(|s| s.attribute(&clause.attribute))
        .is_some_and(|spec| spec.range().is_some());
    let values = clause
        .values
        .iter()
        .map(|value| match value.parse::<f64>() {
            Ok(n) if numeric => expression::num(n),
            _ => Value::String(value.clone()),
        })
        .collect();
    expression::one_of(&clause.attribute, values)
}

/// The scalar values of a filter property (arrays are flattened one level).
fn scalars(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Scalars of a filter property usable as expression literals.
///
/// Objects, nested arrays and nulls are dropped with a warning.
fn literal_values(key: &str, raw: &Value, layer: &str, log: &mut CorrectionLog) -> Vec<Value> {
    let mut literals = Vec::new();
    for value in scalars(raw) {
        match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => literals.push(value),
            other => log.push(
                Correction::new(
                    CorrectionCode::MalformedFilter,
                    layer,
                    format!("dropped filter value '{}: {}'", key, other),
                )
                .with_hint("filter values must be strings, numbers or booleans"),
            ),
        }
    }
    literals
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `match` labels must all be numbers or all be strings.
fn uniform_labels(values: Vec<Value>) -> Vec<Value> {
    if values.iter().all(Value::is_number) {
        return values;
    }
    let mut labels: Vec<Value> = Vec::new();
    for value in values {
        let label = Value::String(label_text(&value));
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

/// Interpret a caller value as a boolean, if it looks like one.
fn boolean_like(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Some(false),
            Some(x) if x == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
