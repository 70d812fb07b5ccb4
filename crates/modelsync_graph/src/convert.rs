//! Conversion of wire data and untyped values into typed graphs.

use crate::error::{GraphError, GraphResult};
use crate::value::{Instance, InstanceRef, Value};
use crate::visitor::ValueVisitor;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use modelsync_schema::{ClassDescriptor, Domain, EnumDescriptor, TypeDescriptor};
use std::collections::HashMap;
use std::sync::Arc;

/// Converts a wire JSON object into a typed instance of the given class.
///
/// Every declared property of the result is present; properties missing
/// from the payload hold [`Value::Null`]. Navigation and collection
/// properties are converted recursively.
pub fn convert_to_model(
    domain: &Domain,
    json: &serde_json::Value,
    class: &Arc<ClassDescriptor>,
) -> GraphResult<InstanceRef> {
    let mut converter = Converter::new(domain);
    match converter.instance_from_json(json, class)? {
        Value::Object(instance) => Ok(instance),
        other => Err(GraphError::TypeMismatch {
            expected: "object".into(),
            actual: other.kind_name().into(),
        }),
    }
}

/// Re-converts an already-typed value against a descriptor.
///
/// This is an in-place operation for objects: the same [`InstanceRef`] is
/// returned, with any missing properties force-initialized to null and
/// children converted recursively. An identity map scoped to this call
/// makes the traversal terminate on cyclic graphs and makes repeated
/// conversion idempotent. An object annotated with a conflicting class
/// fails with [`GraphError::MetadataMismatch`].
pub fn convert_value(domain: &Domain, value: &Value, ty: &TypeDescriptor) -> GraphResult<Value> {
    Converter::new(domain).visit(value, ty)
}

/// Copies every declared property of `source` onto `target`.
///
/// The target keeps its identity, so external references and subscriptions
/// to it remain valid. Both instances must be annotated with the same
/// class.
pub fn update_from_model(target: &InstanceRef, source: &InstanceRef) -> GraphResult<()> {
    if Arc::ptr_eq(target, source) {
        return Ok(());
    }
    let (class, values) = {
        let source = source.read();
        let class = source.class().clone();
        let values: Vec<(String, Value)> = class
            .properties()
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    source.get(&p.name).cloned().unwrap_or(Value::Null),
                )
            })
            .collect();
        (class, values)
    };
    let mut target = target.write();
    if target.class().name != class.name {
        return Err(GraphError::MetadataMismatch {
            expected: target.class().name.clone(),
            found: class.name.clone(),
        });
    }
    for (name, value) in values {
        target.set(&name, value)?;
    }
    Ok(())
}

/// The conversion visitor.
///
/// `seen` maps source-object identity to the converted object so that a
/// previously visited object is returned memoized instead of recursed
/// into. The map lives for exactly one traversal.
struct Converter<'d> {
    domain: &'d Domain,
    seen: HashMap<usize, Value>,
}

impl<'d> Converter<'d> {
    fn new(domain: &'d Domain) -> Self {
        Self {
            domain,
            seen: HashMap::new(),
        }
    }

    /// Builds a typed instance from a wire JSON object.
    fn instance_from_json(
        &mut self,
        json: &serde_json::Value,
        class: &Arc<ClassDescriptor>,
    ) -> GraphResult<Value> {
        let map = match json {
            serde_json::Value::Null => return Ok(Value::Null),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(GraphError::TypeMismatch {
                    expected: format!("object of type `{}`", class.name),
                    actual: json_kind(other).into(),
                })
            }
        };

        let instance = Instance::new_shared(class.clone());
        {
            let mut guard = instance.write();
            for property in class.properties() {
                let Some(raw) = map.get(&property.name) else {
                    continue;
                };
                let converted = self.value_from_json(raw, &property.ty)?;
                guard.set(&property.name, converted)?;
            }
        }
        Ok(Value::Object(instance))
    }

    /// Converts one wire JSON value against a descriptor.
    fn value_from_json(
        &mut self,
        json: &serde_json::Value,
        ty: &TypeDescriptor,
    ) -> GraphResult<Value> {
        if json.is_null() {
            return Ok(Value::Null);
        }
        match ty {
            TypeDescriptor::Model(name) | TypeDescriptor::Object(name) => {
                let class = self.domain.class(name)?;
                self.instance_from_json(json, &class)
            }
            TypeDescriptor::Collection(element) => match json {
                serde_json::Value::Array(items) => {
                    let mut converted = Vec::with_capacity(items.len());
                    for item in items {
                        converted.push(self.value_from_json(item, element)?);
                    }
                    Ok(Value::List(converted))
                }
                other => Err(GraphError::TypeMismatch {
                    expected: "collection".into(),
                    actual: json_kind(other).into(),
                }),
            },
            TypeDescriptor::Date => date_from_json(json),
            TypeDescriptor::Enum(_)
            | TypeDescriptor::String
            | TypeDescriptor::Number
            | TypeDescriptor::Boolean => scalar_from_json(json).ok_or_else(|| {
                GraphError::TypeMismatch {
                    expected: ty.kind_name().into(),
                    actual: json_kind(json).into(),
                }
            }),
        }
    }
}

impl ValueVisitor for Converter<'_> {
    type Output = Value;

    fn domain(&self) -> &Domain {
        self.domain
    }

    fn visit_object(
        &mut self,
        value: &Value,
        class: &Arc<ClassDescriptor>,
    ) -> GraphResult<Self::Output> {
        let instance = match value {
            Value::Null => return Ok(Value::Null),
            Value::Object(instance) => instance,
            other => {
                return Err(GraphError::TypeMismatch {
                    expected: format!("object of type `{}`", class.name),
                    actual: other.kind_name().into(),
                })
            }
        };

        let key = Arc::as_ptr(instance) as usize;
        if let Some(memoized) = self.seen.get(&key) {
            return Ok(memoized.clone());
        }
        // Memoize before recursing; this is what terminates cyclic graphs.
        self.seen.insert(key, Value::Object(instance.clone()));

        {
            let guard = instance.read();
            if guard.class().name != class.name {
                return Err(GraphError::MetadataMismatch {
                    expected: class.name.clone(),
                    found: guard.class().name.clone(),
                });
            }
        }

        for property in class.properties() {
            let current = instance
                .read()
                .get(&property.name)
                .cloned()
                .unwrap_or(Value::Null);
            let converted = self.visit(&current, &property.ty)?;
            instance.write().set(&property.name, converted)?;
        }

        Ok(Value::Object(instance.clone()))
    }

    fn visit_collection(
        &mut self,
        value: &Value,
        element: &TypeDescriptor,
    ) -> GraphResult<Self::Output> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::List(items) => {
                let mut converted = Vec::with_capacity(items.len());
                for item in items {
                    converted.push(self.visit(item, element)?);
                }
                Ok(Value::List(converted))
            }
            other => Err(GraphError::TypeMismatch {
                expected: "collection".into(),
                actual: other.kind_name().into(),
            }),
        }
    }

    fn visit_enum(
        &mut self,
        value: &Value,
        _descriptor: &Arc<EnumDescriptor>,
    ) -> GraphResult<Self::Output> {
        Ok(value.clone())
    }

    fn visit_date(&mut self, value: &Value) -> GraphResult<Self::Output> {
        match value {
            Value::Date(_) | Value::Null => Ok(value.clone()),
            Value::String(text) => parse_date(text)
                .map(Value::Date)
                .ok_or_else(|| GraphError::UnparsableDate(text.clone())),
            Value::Number(millis) => millis_to_date(*millis)
                .map(Value::Date)
                .ok_or_else(|| GraphError::UnparsableDate(millis.to_string())),
            other => Err(GraphError::UnparsableDate(other.kind_name().into())),
        }
    }

    fn visit_primitive(
        &mut self,
        value: &Value,
        _ty: &TypeDescriptor,
    ) -> GraphResult<Self::Output> {
        Ok(value.clone())
    }
}

fn scalar_from_json(json: &serde_json::Value) -> Option<Value> {
    match json {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        _ => None,
    }
}

fn date_from_json(json: &serde_json::Value) -> GraphResult<Value> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::String(text) => parse_date(text)
            .map(Value::Date)
            .ok_or_else(|| GraphError::UnparsableDate(text.clone())),
        serde_json::Value::Number(n) => n
            .as_f64()
            .and_then(millis_to_date)
            .map(Value::Date)
            .ok_or_else(|| GraphError::UnparsableDate(n.to_string())),
        other => Err(GraphError::UnparsableDate(json_kind(other).into())),
    }
}

/// Parses a textual date: RFC 3339, with an offset-less fallback read as UTC.
pub(crate) fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed);
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

fn millis_to_date(millis: f64) -> Option<DateTime<FixedOffset>> {
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .map(|utc| utc.fixed_offset())
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "collection",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsync_schema::{Domain, PropertyDescriptor};
    use serde_json::json;

    fn domain() -> Domain {
        Domain::builder()
            .class(
                ClassDescriptor::model(
                    "Case",
                    "Cases",
                    "caseId",
                    vec![
                        PropertyDescriptor::primary_key("caseId", TypeDescriptor::Number),
                        PropertyDescriptor::value("title", TypeDescriptor::String),
                        PropertyDescriptor::value("openedDate", TypeDescriptor::Date),
                        PropertyDescriptor::foreign_key(
                            "assigneeId",
                            TypeDescriptor::Number,
                            "Person",
                            Some("assignee"),
                        ),
                        PropertyDescriptor::reference_navigation("assignee", "Person", "assigneeId"),
                    ],
                )
                .with_display_property("title"),
            )
            .class(
                ClassDescriptor::model(
                    "Person",
                    "People",
                    "personId",
                    vec![
                        PropertyDescriptor::primary_key("personId", TypeDescriptor::Number),
                        PropertyDescriptor::value("name", TypeDescriptor::String),
                        PropertyDescriptor::collection_navigation(
                            "casesAssigned",
                            "Case",
                            Some("assigneeId"),
                        ),
                    ],
                )
                .with_display_property("name"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn converts_nested_graph_and_backfills_missing_properties() {
        let domain = domain();
        let class = domain.class("Case").unwrap();
        let instance = convert_to_model(
            &domain,
            &json!({
                "caseId": 1,
                "title": "Broken printer",
                "assignee": { "personId": 5, "name": "Ada" }
            }),
            &class,
        )
        .unwrap();

        let guard = instance.read();
        assert_eq!(guard.get("caseId").unwrap().as_f64(), Some(1.0));
        // Missing from the payload, still declared: initialized to null.
        assert!(guard.get("openedDate").unwrap().is_null());
        assert!(guard.get("assigneeId").unwrap().is_null());
        let assignee = guard.get("assignee").unwrap().as_object().unwrap();
        assert_eq!(
            assignee.read().get("name").unwrap().as_str(),
            Some("Ada")
        );
    }

    #[test]
    fn parses_dates_and_rejects_garbage() {
        let domain = domain();
        let class = domain.class("Case").unwrap();
        let instance = convert_to_model(
            &domain,
            &json!({ "caseId": 1, "openedDate": "2024-03-01T09:30:00.000+02:00" }),
            &class,
        )
        .unwrap();
        assert!(matches!(
            instance.read().get("openedDate").unwrap(),
            Value::Date(_)
        ));

        let err = convert_to_model(
            &domain,
            &json!({ "caseId": 1, "openedDate": "not a date" }),
            &class,
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::UnparsableDate(_)));
    }

    #[test]
    fn reconversion_is_idempotent_and_preserves_identity() {
        let domain = domain();
        let class = domain.class("Case").unwrap();
        let instance =
            convert_to_model(&domain, &json!({ "caseId": 2, "title": "x" }), &class).unwrap();

        let ty = TypeDescriptor::Model("Case".into());
        let first = convert_value(&domain, &Value::Object(instance.clone()), &ty).unwrap();
        let second = convert_value(&domain, &first, &ty).unwrap();
        let result = second.as_object().unwrap();
        assert!(Arc::ptr_eq(result, &instance));
    }

    #[test]
    fn cyclic_graphs_terminate() {
        let domain = domain();
        let case_class = domain.class("Case").unwrap();
        let person_class = domain.class("Person").unwrap();

        let case = Instance::new_shared(case_class);
        let person = Instance::new_shared(person_class);
        case.write()
            .set("assignee", Value::Object(person.clone()))
            .unwrap();
        person
            .write()
            .set("casesAssigned", Value::List(vec![Value::Object(case.clone())]))
            .unwrap();

        let converted = convert_value(
            &domain,
            &Value::Object(case.clone()),
            &TypeDescriptor::Model("Case".into()),
        )
        .unwrap();
        assert!(Arc::ptr_eq(converted.as_object().unwrap(), &case));
    }

    #[test]
    fn metadata_conflict_is_fatal() {
        let domain = domain();
        let person_class = domain.class("Person").unwrap();
        let person = Instance::new_shared(person_class);

        let err = convert_value(
            &domain,
            &Value::Object(person),
            &TypeDescriptor::Model("Case".into()),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::MetadataMismatch { .. }));
    }

    #[test]
    fn collection_descriptor_requires_a_list() {
        let domain = domain();
        let err = convert_value(
            &domain,
            &Value::String("nope".into()),
            &TypeDescriptor::Collection(Box::new(TypeDescriptor::Number)),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
    }

    #[test]
    fn update_from_model_preserves_target_identity() {
        let domain = domain();
        let class = domain.class("Person").unwrap();
        let target =
            convert_to_model(&domain, &json!({ "personId": 1, "name": "Old" }), &class).unwrap();
        let source =
            convert_to_model(&domain, &json!({ "personId": 1, "name": "New" }), &class).unwrap();

        let before = Arc::as_ptr(&target);
        update_from_model(&target, &source).unwrap();
        assert_eq!(Arc::as_ptr(&target), before);
        assert_eq!(target.read().get("name").unwrap().as_str(), Some("New"));
    }

    #[test]
    fn update_from_model_rejects_class_mismatch() {
        let domain = domain();
        let person = Instance::new_shared(domain.class("Person").unwrap());
        let case = Instance::new_shared(domain.class("Case").unwrap());
        assert!(matches!(
            update_from_model(&person, &case),
            Err(GraphError::MetadataMismatch { .. })
        ));
    }
}
