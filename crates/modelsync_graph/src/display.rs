//! Human-readable display rendering.

use crate::error::{GraphError, GraphResult};
use crate::value::{InstanceRef, Value};
use crate::visitor::ValueVisitor;
use modelsync_schema::{ClassDescriptor, Domain, EnumDescriptor, TypeDescriptor};
use std::collections::HashSet;
use std::sync::Arc;

/// Renders a whole instance as a display string.
///
/// Uses the class's designated display property when one exists, otherwise
/// a structural stringification of the first-level scalar fields.
pub fn model_display(domain: &Domain, instance: &InstanceRef) -> GraphResult<String> {
    let class = instance.read().class().clone();
    DisplayVisitor::new(domain).visit_object(&Value::Object(instance.clone()), &class)
}

/// Renders a single property of an instance as a display string.
///
/// Unknown property names fail with [`GraphError::UnknownProperty`].
pub fn prop_display(domain: &Domain, instance: &InstanceRef, property: &str) -> GraphResult<String> {
    let (value, ty) = {
        let guard = instance.read();
        let descriptor =
            guard
                .class()
                .property(property)
                .ok_or_else(|| GraphError::UnknownProperty {
                    class: guard.class().name.clone(),
                    property: property.into(),
                })?;
        (
            guard.get(property).cloned().unwrap_or(Value::Null),
            descriptor.ty.clone(),
        )
    };
    DisplayVisitor::new(domain).visit(&value, &ty)
}

/// Renders a bare value against a descriptor as a display string.
pub fn value_display(domain: &Domain, value: &Value, ty: &TypeDescriptor) -> GraphResult<String> {
    DisplayVisitor::new(domain).visit(value, ty)
}

/// The display visitor.
///
/// `active` tracks the objects on the current recursion path so that
/// display-property chains through cyclic graphs terminate.
struct DisplayVisitor<'d> {
    domain: &'d Domain,
    active: HashSet<usize>,
}

impl<'d> DisplayVisitor<'d> {
    fn new(domain: &'d Domain) -> Self {
        Self {
            domain,
            active: HashSet::new(),
        }
    }

    /// First-level structural fallback: scalar fields only, rendered as a
    /// compact JSON object.
    fn structural(&mut self, instance: &InstanceRef, class: &ClassDescriptor) -> String {
        let mut map = serde_json::Map::new();
        for property in class.properties() {
            let value = instance
                .read()
                .get(&property.name)
                .cloned()
                .unwrap_or(Value::Null);
            let rendered = match &value {
                Value::Object(_) | Value::List(_) => continue,
                Value::Null => continue,
                _ => self
                    .visit(&value, &property.ty)
                    .unwrap_or_default(),
            };
            map.insert(property.name.clone(), serde_json::Value::String(rendered));
        }
        serde_json::Value::Object(map).to_string()
    }
}

impl ValueVisitor for DisplayVisitor<'_> {
    type Output = String;

    fn domain(&self) -> &Domain {
        self.domain
    }

    fn visit_object(
        &mut self,
        value: &Value,
        class: &Arc<ClassDescriptor>,
    ) -> GraphResult<Self::Output> {
        let instance = match value {
            Value::Null => return Ok(String::new()),
            Value::Object(instance) => instance,
            other => return Ok(other.as_str().map(String::from).unwrap_or_default()),
        };

        let key = Arc::as_ptr(instance) as usize;
        if !self.active.insert(key) {
            // Already on the recursion path: cut the cycle.
            return Ok(String::new());
        }

        let result = match &class.display_property {
            Some(name) => match class.property(name) {
                Some(descriptor) => {
                    let value = instance
                        .read()
                        .get(name)
                        .cloned()
                        .unwrap_or(Value::Null);
                    self.visit(&value, &descriptor.ty)
                }
                None => Ok(self.structural(instance, class)),
            },
            None => Ok(self.structural(instance, class)),
        };

        self.active.remove(&key);
        result
    }

    fn visit_collection(
        &mut self,
        value: &Value,
        element: &TypeDescriptor,
    ) -> GraphResult<Self::Output> {
        let items = match value {
            Value::Null => return Ok(String::new()),
            Value::List(items) => items,
            other => {
                return Err(GraphError::TypeMismatch {
                    expected: "collection".into(),
                    actual: other.kind_name().into(),
                })
            }
        };

        if items.is_empty() {
            return Ok(String::new());
        }
        if items.len() <= 5 {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                let rendered = self.visit(item, element)?;
                parts.push(if rendered.is_empty() {
                    "???".into()
                } else {
                    rendered
                });
            }
            return Ok(parts.join(", "));
        }
        Ok(format_count(items.len()))
    }

    fn visit_enum(
        &mut self,
        value: &Value,
        descriptor: &Arc<EnumDescriptor>,
    ) -> GraphResult<Self::Output> {
        let member = match value {
            Value::Null => return Ok(String::new()),
            Value::Number(n) => descriptor.by_value(*n as i64),
            Value::String(s) => descriptor.by_name(s),
            _ => None,
        };
        Ok(member.map(|m| m.display_name.clone()).unwrap_or_default())
    }

    fn visit_date(&mut self, value: &Value) -> GraphResult<Self::Output> {
        Ok(match value {
            Value::Date(date) => date.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::String(text) => text.clone(),
            _ => String::new(),
        })
    }

    fn visit_primitive(&mut self, value: &Value, _ty: &TypeDescriptor) -> GraphResult<Self::Output> {
        Ok(match value {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Date(date) => date.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Object(_) | Value::List(_) => String::new(),
        })
    }
}

/// Formats a number without a trailing `.0` for whole values.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Formats a count with thousands separators.
fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert_to_model;
    use crate::value::Instance;
    use modelsync_schema::{EnumMember, PropertyDescriptor};
    use serde_json::json;

    fn domain() -> Domain {
        let status = EnumDescriptor::new(
            "CaseStatus",
            vec![
                EnumMember::new("Open", 0),
                EnumMember::new("InProgress", 1).with_display_name("In Progress"),
            ],
        )
        .unwrap();
        Domain::builder()
            .class(
                ClassDescriptor::model(
                    "Case",
                    "Cases",
                    "caseId",
                    vec![
                        PropertyDescriptor::primary_key("caseId", TypeDescriptor::Number),
                        PropertyDescriptor::value("title", TypeDescriptor::String),
                        PropertyDescriptor::value(
                            "status",
                            TypeDescriptor::Enum(Arc::new(status.clone())),
                        ),
                    ],
                )
                .with_display_property("title"),
            )
            .class(ClassDescriptor::model(
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
            ))
            .enumeration(status)
            .build()
            .unwrap()
    }

    fn case(domain: &Domain, title: &str) -> InstanceRef {
        convert_to_model(
            domain,
            &json!({ "caseId": 1, "title": title }),
            &domain.class("Case").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn object_display_uses_display_property() {
        let domain = domain();
        let case = case(&domain, "Broken printer");
        assert_eq!(model_display(&domain, &case).unwrap(), "Broken printer");
    }

    #[test]
    fn object_display_falls_back_to_structural_form() {
        let domain = domain();
        let person = convert_to_model(
            &domain,
            &json!({ "personId": 3, "name": "Ada" }),
            &domain.class("Person").unwrap(),
        )
        .unwrap();
        let display = model_display(&domain, &person).unwrap();
        assert!(display.contains("\"personId\":\"3\""));
        assert!(display.contains("\"name\":\"Ada\""));
    }

    #[test]
    fn collection_display_rules() {
        let domain = domain();
        let element = TypeDescriptor::Model("Case".into());
        let collection = |n: usize| {
            Value::List(
                (0..n)
                    .map(|i| Value::Object(case(&domain, &format!("c{i}"))))
                    .collect(),
            )
        };
        let ty = TypeDescriptor::Collection(Box::new(element));

        assert_eq!(
            value_display(&domain, &Value::List(vec![]), &ty).unwrap(),
            ""
        );
        assert_eq!(
            value_display(&domain, &collection(3), &ty).unwrap(),
            "c0, c1, c2"
        );
        assert_eq!(value_display(&domain, &collection(6), &ty).unwrap(), "6");
    }

    #[test]
    fn large_counts_get_thousands_separators() {
        assert_eq!(format_count(6), "6");
        assert_eq!(format_count(1234), "1,234");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn enum_display_resolves_both_representations() {
        let domain = domain();
        let case = case(&domain, "x");
        case.write().set("status", Value::Number(1.0)).unwrap();
        assert_eq!(prop_display(&domain, &case, "status").unwrap(), "In Progress");

        case.write()
            .set("status", Value::String("Open".into()))
            .unwrap();
        assert_eq!(prop_display(&domain, &case, "status").unwrap(), "Open");

        case.write().set("status", Value::Number(42.0)).unwrap();
        assert_eq!(prop_display(&domain, &case, "status").unwrap(), "");
    }

    #[test]
    fn unknown_property_is_an_error() {
        let domain = domain();
        let case = case(&domain, "x");
        assert!(matches!(
            prop_display(&domain, &case, "nope"),
            Err(GraphError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn cyclic_display_chain_terminates() {
        let domain = Domain::builder()
            .class(
                ClassDescriptor::object(
                    "A",
                    vec![PropertyDescriptor::value(
                        "b",
                        TypeDescriptor::Object("B".into()),
                    )],
                )
                .with_display_property("b"),
            )
            .class(
                ClassDescriptor::object(
                    "B",
                    vec![PropertyDescriptor::value(
                        "a",
                        TypeDescriptor::Object("A".into()),
                    )],
                )
                .with_display_property("a"),
            )
            .build()
            .unwrap();

        let a = Instance::new_shared(domain.class("A").unwrap());
        let b = Instance::new_shared(domain.class("B").unwrap());
        a.write().set("b", Value::Object(b.clone())).unwrap();
        b.write().set("a", Value::Object(a.clone())).unwrap();

        // The display chain a -> b -> a is cut at the revisit.
        assert_eq!(model_display(&domain, &a).unwrap(), "");
    }
}
