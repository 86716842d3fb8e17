//! Typed parameter values and the validator that produces them from raw
//! JSON request parameters.
use crate::constants::QUERY_MAX_ARRAY;
use crate::date;
use crate::flavor::{self, Flavor, ParamDecl, ParamType};
use crate::metadata::Model;
use crate::result::{QueryError, QueryResult};
use crate::util;
use json::JsonValue;
use std::collections::BTreeMap;

/// A validated parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// A nested query description, kept raw until the builder runs it.
    Query(JsonValue),
}

impl Value {
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Bool(b) => JsonValue::from(*b),
            Value::Int(n) => JsonValue::from(*n),
            Value::Float(f) => JsonValue::from(*f),
            Value::Str(s) => JsonValue::from(s.as_str()),
            Value::List(vals) => {
                JsonValue::Array(vals.iter().map(|v| v.to_json()).collect())
            }
            Value::Query(q) => q.clone(),
        }
    }
}

/// Validated parameters for one query, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues {
    map: BTreeMap<String, Value>,
}

impl ParamValues {
    pub fn new() -> Self {
        ParamValues { map: BTreeMap::new() }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn insert(&mut self, name: &str, val: Value) {
        self.map.insert(name.to_string(), val);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.map.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.map.iter()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Float(f)) => Some(*f),
            Some(Value::Int(n)) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_list(&self, name: &str) -> Option<&[Value]> {
        match self.get(name) {
            Some(Value::List(vals)) => Some(vals.as_slice()),
            _ => None,
        }
    }

    /// Integer members of a list parameter.
    pub fn get_id_list(&self, name: &str) -> Option<Vec<i64>> {
        self.get_list(name).map(|vals| {
            vals.iter()
                .filter_map(|v| match v {
                    Value::Int(n) => Some(*n),
                    _ => None,
                })
                .collect()
        })
    }

    /// String members of a list parameter.
    pub fn get_str_list(&self, name: &str) -> Option<Vec<&str>> {
        self.get_list(name).map(|vals| {
            vals.iter()
                .filter_map(|v| match v {
                    Value::Str(s) if !s.is_empty() => Some(s.as_str()),
                    _ => None,
                })
                .collect()
        })
    }

    /// First/second members of a two-element range parameter, as strings.
    pub fn get_str_pair(&self, name: &str) -> (Option<&str>, Option<&str>) {
        match self.get_list(name) {
            Some(vals) => {
                let get = |i: usize| match vals.get(i) {
                    Some(Value::Str(s)) if !s.is_empty() => Some(s.as_str()),
                    _ => None,
                };
                (get(0), get(1))
            }
            None => (None, None),
        }
    }

    /// First/second members of a two-element numeric range parameter.
    pub fn get_float_pair(&self, name: &str) -> (Option<f64>, Option<f64>) {
        match self.get_list(name) {
            Some(vals) => {
                let get = |i: usize| match vals.get(i) {
                    Some(Value::Float(f)) => Some(*f),
                    Some(Value::Int(n)) => Some(*n as f64),
                    _ => None,
                };
                (get(0), get(1))
            }
            None => (None, None),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let mut obj = JsonValue::new_object();
        for (name, val) in self.map.iter() {
            obj[name.as_str()] = val.to_json();
        }
        obj
    }
}

/// Parameter declarations for a (model, flavor) pair: the flavor's own
/// schema, then the model-wide filters, then the globals.  Earlier
/// declarations win on name collisions.
pub fn declarations(model: Model, flavor: Flavor) -> Vec<ParamDecl> {
    let mut decls: Vec<ParamDecl> = Vec::new();
    let layers = [
        flavor::flavor_params(flavor),
        flavor::model_params(model),
        flavor::GLOBAL_PARAMS,
    ];
    for layer in layers {
        for decl in layer {
            if !decls.iter().any(|d| d.name == decl.name) {
                decls.push(*decl);
            }
        }
    }
    decls
}

/// Validate raw request parameters against the declared schema.
///
/// Missing required parameters, unexpected parameters, malformed values,
/// and out-of-set enum values are all reported as typed errors naming the
/// offending parameter.
pub fn validate(model: Model, flavor: Flavor, raw: &JsonValue) -> QueryResult<ParamValues> {
    if !raw.is_object() && !raw.is_null() {
        return Err("Query parameters must be a JSON object".into());
    }

    let decls = declarations(model, flavor);
    let mut out = ParamValues::new();

    for decl in &decls {
        let val = &raw[decl.name];
        let validated = if is_blank(val) {
            None
        } else {
            validate_value(decl.name, &decl.ptype, val)?
        };

        match validated {
            Some(v) => out.insert(decl.name, v),
            None => {
                if decl.required {
                    return Err(QueryError::MissingParam(decl.name.to_string()));
                }
            }
        }
    }

    for (key, _) in raw.entries() {
        if !decls.iter().any(|d| d.name == key) {
            return Err(QueryError::UnexpectedParam(key.to_string()));
        }
    }

    Ok(out)
}

fn is_blank(val: &JsonValue) -> bool {
    val.is_null() || val.as_str().map(|s| s.trim().is_empty()).unwrap_or(false)
}

fn type_error(param: &str, expected: &'static str) -> QueryError {
    QueryError::InvalidValueType {
        param: param.to_string(),
        expected,
    }
}

fn validate_value(
    param: &str,
    ptype: &ParamType,
    val: &JsonValue,
) -> QueryResult<Option<Value>> {
    match ptype {
        ParamType::Boolean => match util::json_bool(val) {
            Some(b) => Ok(Some(Value::Bool(b))),
            None => Err(type_error(param, "boolean")),
        },
        ParamType::Float => match util::json_float(val) {
            Some(f) => Ok(Some(Value::Float(f))),
            None => Err(type_error(param, "a float")),
        },
        ParamType::String => match util::json_string(val) {
            Some(s) => Ok(Some(Value::Str(s))),
            None => Err(type_error(param, "a string")),
        },
        ParamType::Date => {
            let s = util::json_string(val)
                .ok_or_else(|| type_error(param, "a date (YYYY-MM-DD or MM-DD)"))?;
            match date::parse_date(&s) {
                Ok(Some(_)) => Ok(Some(Value::Str(s.trim().to_string()))),
                Ok(None) => Ok(None),
                Err(_) => Err(type_error(param, "a date (YYYY-MM-DD or MM-DD)")),
            }
        }
        ParamType::Time => {
            let s = util::json_string(val)
                .ok_or_else(|| type_error(param, "a time (YYYY-MM-DD-HH-MM-SS)"))?;
            match date::parse_time(&s) {
                Ok(Some(_)) => Ok(Some(Value::Str(s.trim().to_string()))),
                Ok(None) => Ok(None),
                Err(_) => Err(type_error(param, "a time (YYYY-MM-DD-HH-MM-SS)")),
            }
        }
        ParamType::Id | ParamType::AnyRecord => match util::json_id(val) {
            Some(id) => Ok(Some(Value::Int(id))),
            None => Err(type_error(param, "a positive id")),
        },
        ParamType::Record(_) | ParamType::NameRef => {
            if let Some(id) = util::json_id(val) {
                return Ok(Some(Value::Int(id)));
            }
            match util::json_string(val) {
                Some(s) => Ok(Some(Value::Str(s))),
                None => Err(type_error(param, "an id or lookup string")),
            }
        }
        ParamType::EnumStr(set) => {
            let s = util::json_string(val).ok_or_else(|| type_error(param, "a string"))?;
            if set.contains(&s.as_str()) {
                Ok(Some(Value::Str(s)))
            } else {
                Err(QueryError::InvalidEnum {
                    param: param.to_string(),
                    value: s,
                })
            }
        }
        ParamType::IdList => {
            let members = as_members(val);
            let mut ids = Vec::new();
            for m in members.iter().take(QUERY_MAX_ARRAY) {
                match util::json_id(m) {
                    Some(id) => ids.push(Value::Int(id)),
                    None => return Err(type_error(param, "a list of positive ids")),
                }
            }
            Ok(Some(Value::List(ids)))
        }
        ParamType::List(inner) => {
            let members = as_members(val);
            let mut vals = Vec::new();
            for m in members.iter().take(QUERY_MAX_ARRAY) {
                if is_blank(m) {
                    // Range parameters use nulls for open ends; keep the
                    // slot so [nil, max] stays a pure upper bound.
                    vals.push(Value::Str(String::new()));
                    continue;
                }
                if let Some(v) = validate_value(param, inner, m)? {
                    vals.push(v);
                }
            }
            if vals.iter().all(|v| matches!(v, Value::Str(s) if s.is_empty())) {
                return Ok(None);
            }
            Ok(Some(Value::List(vals)))
        }
        ParamType::QueryRef => {
            if val.is_object() {
                Ok(Some(Value::Query(val.clone())))
            } else {
                Err(type_error(param, "a nested query description"))
            }
        }
    }
}

fn as_members(val: &JsonValue) -> Vec<JsonValue> {
    if val.is_array() {
        val.members().cloned().collect()
    } else {
        vec![val.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_param_enforced() {
        let raw = json::object! {};
        match validate(Model::Observation, Flavor::ByUser, &raw) {
            Err(QueryError::MissingParam(p)) => assert_eq!(p, "user"),
            other => panic!("expected MissingParam, got {other:?}"),
        }
    }

    #[test]
    fn unexpected_param_rejected() {
        let raw = json::object! { user: 42, frobnicate: true };
        match validate(Model::Observation, Flavor::ByUser, &raw) {
            Err(QueryError::UnexpectedParam(p)) => assert_eq!(p, "frobnicate"),
            other => panic!("expected UnexpectedParam, got {other:?}"),
        }
    }

    #[test]
    fn record_accepts_id_or_string() {
        let raw = json::object! { user: 42 };
        let params = validate(Model::Observation, Flavor::ByUser, &raw).unwrap();
        assert_eq!(params.get_int("user"), Some(42));

        let raw = json::object! { user: "mary" };
        let params = validate(Model::Observation, Flavor::ByUser, &raw).unwrap();
        assert_eq!(params.get_str("user"), Some("mary"));
    }

    #[test]
    fn enum_values_checked() {
        let raw = json::object! { name: 1, nonconsensus: "sometimes" };
        match validate(Model::Observation, Flavor::OfName, &raw) {
            Err(QueryError::InvalidEnum { param, value }) => {
                assert_eq!(param, "nonconsensus");
                assert_eq!(value, "sometimes");
            }
            other => panic!("expected InvalidEnum, got {other:?}"),
        }
    }

    #[test]
    fn model_params_merged_in() {
        let raw = json::object! {
            user: 42,
            has_specimen: "yes",
            date: ["2010-01", "2010-06"],
        };
        let params = validate(Model::Observation, Flavor::ByUser, &raw).unwrap();
        assert_eq!(params.get_bool("has_specimen"), Some(true));
        let (min, max) = params.get_str_pair("date");
        assert_eq!(min, Some("2010-01"));
        assert_eq!(max, Some("2010-06"));
    }

    #[test]
    fn open_ended_ranges_keep_position() {
        let raw = json::object! { user: 42, date: [null, "2010-06"] };
        let params = validate(Model::Observation, Flavor::ByUser, &raw).unwrap();
        let (min, max) = params.get_str_pair("date");
        assert_eq!(min, None);
        assert_eq!(max, Some("2010-06"));
    }

    #[test]
    fn id_list_validated() {
        let raw = json::object! { ids: [1, 2, "17"] };
        let params = validate(Model::Observation, Flavor::InSet, &raw).unwrap();
        assert_eq!(params.get_id_list("ids"), Some(vec![1, 2, 17]));

        let raw = json::object! { ids: ["seventeen"] };
        assert!(validate(Model::Observation, Flavor::InSet, &raw).is_err());
    }

    #[test]
    fn blank_values_dropped() {
        let raw = json::object! { user: 42, notes_has: "" };
        let params = validate(Model::Observation, Flavor::ByUser, &raw).unwrap();
        assert!(!params.contains("notes_has"));
    }
}
