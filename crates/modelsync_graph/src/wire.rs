//! Depth-limited projection of typed graphs into wire payloads.

use crate::convert::parse_date;
use crate::error::{GraphError, GraphResult};
use crate::value::{InstanceRef, Value};
use crate::visitor::ValueVisitor;
use modelsync_schema::{ClassDescriptor, Domain, EnumDescriptor, PropertyRole, TypeDescriptor};
use std::sync::Arc;
use tracing::warn;

/// Default maximum traversal depth for wire payloads.
///
/// At depth 1 only the top-level object's scalar properties are emitted;
/// nested objects and collections are omitted entirely, which keeps
/// payloads bounded even for cyclic graphs.
pub const DEFAULT_MAX_DEPTH: u32 = 1;

/// Projects an instance into a plain JSON object at the default depth.
pub fn map_to_wire(domain: &Domain, instance: &InstanceRef) -> GraphResult<serde_json::Value> {
    map_to_wire_with_depth(domain, instance, DEFAULT_MAX_DEPTH)
}

/// Projects an instance into a plain JSON object at the given depth.
pub fn map_to_wire_with_depth(
    domain: &Domain,
    instance: &InstanceRef,
    max_depth: u32,
) -> GraphResult<serde_json::Value> {
    let class = instance.read().class().clone();
    let mut projector = Projector {
        domain,
        max_depth,
        depth: 0,
    };
    Ok(projector
        .visit_object(&Value::Object(instance.clone()), &class)?
        .unwrap_or(serde_json::Value::Null))
}

/// Projects a single value against a descriptor, for transport.
///
/// Used for parameter values; values beyond the depth limit render as
/// `null`.
pub fn map_value_to_wire(
    domain: &Domain,
    value: &Value,
    ty: &TypeDescriptor,
) -> GraphResult<serde_json::Value> {
    let mut projector = Projector {
        domain,
        max_depth: DEFAULT_MAX_DEPTH,
        depth: 0,
    };
    Ok(projector.visit(value, ty)?.unwrap_or(serde_json::Value::Null))
}

/// The wire payload builder.
///
/// `Output` is `None` when a value must be omitted from the payload
/// entirely (objects and collections beyond the depth limit, non-scalar
/// values in scalar slots).
struct Projector<'d> {
    domain: &'d Domain,
    max_depth: u32,
    depth: u32,
}

impl Projector<'_> {
    /// Substitutes the paired navigation object's primary key for a null
    /// foreign key, so callers can set a navigation object without
    /// managing the key themselves.
    fn backfill_foreign_key(
        instance: &InstanceRef,
        navigation: &str,
    ) -> Option<serde_json::Value> {
        // Clone out of the owner's lock first; the navigation slot may hold
        // the owner itself.
        let nav_value = instance.read().get(navigation).cloned()?;
        let nav_instance = nav_value.as_object()?;
        let key = nav_instance.read().primary_key()?;
        scalar_to_json(&key)
    }
}

impl ValueVisitor for Projector<'_> {
    type Output = Option<serde_json::Value>;

    fn domain(&self) -> &Domain {
        self.domain
    }

    fn visit_object(
        &mut self,
        value: &Value,
        class: &Arc<ClassDescriptor>,
    ) -> GraphResult<Self::Output> {
        if self.depth >= self.max_depth {
            return Ok(None);
        }
        let instance = match value {
            Value::Null => return Ok(Some(serde_json::Value::Null)),
            Value::Object(instance) => instance,
            _ => return Ok(None),
        };

        let mut map = serde_json::Map::new();
        for property in class.properties() {
            let current = instance
                .read()
                .get(&property.name)
                .cloned()
                .unwrap_or(Value::Null);

            if current.is_null() {
                if let PropertyRole::ForeignKey {
                    navigation: Some(navigation),
                    ..
                } = &property.role
                {
                    if let Some(key) = Self::backfill_foreign_key(instance, navigation) {
                        map.insert(property.name.clone(), key);
                        continue;
                    }
                }
            }

            self.depth += 1;
            let projected = self.visit(&current, &property.ty);
            self.depth -= 1;
            if let Some(json) = projected? {
                map.insert(property.name.clone(), json);
            }
        }
        Ok(Some(serde_json::Value::Object(map)))
    }

    fn visit_collection(
        &mut self,
        value: &Value,
        element: &TypeDescriptor,
    ) -> GraphResult<Self::Output> {
        if self.depth >= self.max_depth {
            return Ok(None);
        }
        match value {
            Value::Null => Ok(Some(serde_json::Value::Null)),
            Value::List(items) => {
                let mut projected = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(json) = self.visit(item, element)? {
                        projected.push(json);
                    }
                }
                Ok(Some(serde_json::Value::Array(projected)))
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
        Ok(scalar_to_json(value))
    }

    fn visit_date(&mut self, value: &Value) -> GraphResult<Self::Output> {
        match value {
            Value::Null => Ok(Some(serde_json::Value::Null)),
            Value::Date(date) => Ok(Some(serde_json::Value::String(
                date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
            ))),
            Value::String(text) => match parse_date(text) {
                Some(date) => Ok(Some(serde_json::Value::String(
                    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
                ))),
                None => {
                    warn!(value = %text, "invalid date dropped from wire payload");
                    Ok(Some(serde_json::Value::Null))
                }
            },
            other => {
                warn!(kind = other.kind_name(), "invalid date dropped from wire payload");
                Ok(Some(serde_json::Value::Null))
            }
        }
    }

    fn visit_primitive(&mut self, value: &Value, _ty: &TypeDescriptor) -> GraphResult<Self::Output> {
        Ok(scalar_to_json(value))
    }
}

/// Renders a scalar value as JSON; non-scalars yield `None` (omitted).
fn scalar_to_json(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::Null => Some(serde_json::Value::Null),
        Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
        Value::Number(n) => Some(
            serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        ),
        Value::String(s) => Some(serde_json::Value::String(s.clone())),
        Value::Date(date) => Some(serde_json::Value::String(
            date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
        )),
        Value::Object(_) | Value::List(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert_to_model;
    use modelsync_schema::PropertyDescriptor;
    use serde_json::json;

    fn domain() -> Domain {
        Domain::builder()
            .class(ClassDescriptor::model(
                "Case",
                "Cases",
                "caseId",
                vec![
                    PropertyDescriptor::primary_key("caseId", TypeDescriptor::Number),
                    PropertyDescriptor::value("title", TypeDescriptor::String),
                    PropertyDescriptor::value("openedDate", TypeDescriptor::Date),
                    PropertyDescriptor::foreign_key(
                        "companyId",
                        TypeDescriptor::Number,
                        "Company",
                        Some("company"),
                    ),
                    PropertyDescriptor::reference_navigation("company", "Company", "companyId"),
                ],
            ))
            .class(ClassDescriptor::model(
                "Company",
                "Companies",
                "companyId",
                vec![
                    PropertyDescriptor::primary_key("companyId", TypeDescriptor::Number),
                    PropertyDescriptor::value("name", TypeDescriptor::String),
                ],
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn depth_one_omits_nested_objects_and_backfills_foreign_keys() {
        let domain = domain();
        let class = domain.class("Case").unwrap();
        let case = convert_to_model(
            &domain,
            &json!({
                "caseId": 1,
                "title": "A",
                "company": { "companyId": 5, "name": "X" }
            }),
            &class,
        )
        .unwrap();

        let wire = map_to_wire(&domain, &case).unwrap();
        assert_eq!(
            wire,
            json!({
                "caseId": 1.0,
                "title": "A",
                "openedDate": null,
                "companyId": 5.0
            })
        );
    }

    #[test]
    fn explicit_foreign_key_wins_over_backfill() {
        let domain = domain();
        let class = domain.class("Case").unwrap();
        let case = convert_to_model(
            &domain,
            &json!({
                "caseId": 1,
                "companyId": 9,
                "company": { "companyId": 5 }
            }),
            &class,
        )
        .unwrap();

        let wire = map_to_wire(&domain, &case).unwrap();
        assert_eq!(wire["companyId"], json!(9.0));
    }

    #[test]
    fn unkeyed_navigation_leaves_foreign_key_null() {
        let domain = domain();
        let class = domain.class("Case").unwrap();
        let case = convert_to_model(
            &domain,
            &json!({ "caseId": 1, "company": { "name": "X" } }),
            &class,
        )
        .unwrap();

        let wire = map_to_wire(&domain, &case).unwrap();
        assert_eq!(wire["companyId"], json!(null));
    }

    #[test]
    fn deeper_limit_includes_one_level_of_nesting() {
        let domain = domain();
        let class = domain.class("Case").unwrap();
        let case = convert_to_model(
            &domain,
            &json!({
                "caseId": 1,
                "company": { "companyId": 5, "name": "X" }
            }),
            &class,
        )
        .unwrap();

        let wire = map_to_wire_with_depth(&domain, &case, 2).unwrap();
        assert_eq!(wire["company"], json!({ "companyId": 5.0, "name": "X" }));
    }

    #[test]
    fn dates_render_canonically_and_garbage_drops_to_null() {
        let domain = domain();
        let class = domain.class("Case").unwrap();
        let case = convert_to_model(
            &domain,
            &json!({ "caseId": 1, "openedDate": "2024-03-01T09:30:00.000+00:00" }),
            &class,
        )
        .unwrap();
        let wire = map_to_wire(&domain, &case).unwrap();
        assert_eq!(wire["openedDate"], json!("2024-03-01T09:30:00.000+00:00"));

        // A date-typed slot holding garbage drops to null instead of
        // failing the payload.
        case.write()
            .set("openedDate", Value::String("garbage".into()))
            .unwrap();
        let wire = map_to_wire(&domain, &case).unwrap();
        assert_eq!(wire["openedDate"], json!(null));
    }

    #[test]
    fn single_values_project_for_transport() {
        let domain = domain();
        assert_eq!(
            map_value_to_wire(&domain, &Value::Number(5.0), &TypeDescriptor::Number).unwrap(),
            json!(5.0)
        );
        assert_eq!(
            map_value_to_wire(&domain, &Value::Null, &TypeDescriptor::String).unwrap(),
            json!(null)
        );
        let date = Value::String("2024-03-01T09:30:00.000+00:00".into());
        assert_eq!(
            map_value_to_wire(&domain, &date, &TypeDescriptor::Date).unwrap(),
            json!("2024-03-01T09:30:00.000+00:00")
        );
    }

    #[test]
    fn cyclic_graph_projects_without_recursing() {
        let domain = domain();
        let class = domain.class("Case").unwrap();
        let case = convert_to_model(&domain, &json!({ "caseId": 1 }), &class).unwrap();
        // A self-referential object slot is fine: depth limiting omits it.
        case.write()
            .set("company", Value::Object(case.clone()))
            .unwrap();
        let wire = map_to_wire(&domain, &case).unwrap();
        assert!(wire.get("company").is_none());
    }
}
