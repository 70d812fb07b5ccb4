//! The sample domain.

use modelsync_api::{HttpTransport, ModelApiClient};
use modelsync_schema::{
    ClassDescriptor, Domain, EnumDescriptor, EnumMember, PropertyDescriptor, TypeDescriptor,
};
use std::sync::Arc;

/// Builds the sample domain: `Case`, `Person`, `Company` and the
/// `CaseStatus` enum.
///
/// `Case.assignee` and `Person.casesAssigned` form a cyclic navigation
/// pair, which is what the cycle-safety tests traverse.
pub fn sample_domain() -> Arc<Domain> {
    let status = EnumDescriptor::new(
        "CaseStatus",
        vec![
            EnumMember::new("Open", 0),
            EnumMember::new("InProgress", 1).with_display_name("In Progress"),
            EnumMember::new("Closed", 2),
        ],
    )
    .expect("fixture enum keys are unique");

    let domain = Domain::builder()
        .class(
            ClassDescriptor::model(
                "Case",
                "Cases",
                "caseId",
                vec![
                    PropertyDescriptor::primary_key("caseId", TypeDescriptor::Number),
                    PropertyDescriptor::value("title", TypeDescriptor::String),
                    PropertyDescriptor::value("description", TypeDescriptor::String),
                    PropertyDescriptor::value("openedDate", TypeDescriptor::Date),
                    PropertyDescriptor::value(
                        "status",
                        TypeDescriptor::Enum(Arc::new(status.clone())),
                    ),
                    PropertyDescriptor::foreign_key(
                        "assigneeId",
                        TypeDescriptor::Number,
                        "Person",
                        Some("assignee"),
                    ),
                    PropertyDescriptor::reference_navigation("assignee", "Person", "assigneeId"),
                    PropertyDescriptor::foreign_key(
                        "companyId",
                        TypeDescriptor::Number,
                        "Company",
                        Some("company"),
                    ),
                    PropertyDescriptor::reference_navigation("company", "Company", "companyId"),
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
        .class(
            ClassDescriptor::model(
                "Company",
                "Companies",
                "companyId",
                vec![
                    PropertyDescriptor::primary_key("companyId", TypeDescriptor::Number),
                    PropertyDescriptor::value("name", TypeDescriptor::String),
                ],
            )
            .with_display_property("name"),
        )
        .enumeration(status)
        .build()
        .expect("fixture domain is well-formed");

    Arc::new(domain)
}

/// Creates an API client for the `Case` entity over the given transport.
pub fn case_client(transport: Arc<dyn HttpTransport>) -> Arc<ModelApiClient> {
    Arc::new(
        ModelApiClient::new(sample_domain(), "Case", transport)
            .expect("Case is an entity in the sample domain"),
    )
}

/// Creates an API client for the `Person` entity over the given transport.
pub fn person_client(transport: Arc<dyn HttpTransport>) -> Arc<ModelApiClient> {
    Arc::new(
        ModelApiClient::new(sample_domain(), "Person", transport)
            .expect("Person is an entity in the sample domain"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_domain_resolves_the_cyclic_pair() {
        let domain = sample_domain();
        let case = domain.class("Case").unwrap();
        let person = domain.class("Person").unwrap();
        assert_eq!(case.navigation_for_key("assigneeId").unwrap().name, "assignee");
        assert_eq!(
            person.property("casesAssigned").unwrap().ty.element().unwrap().class_name(),
            Some("Case")
        );
        assert!(domain.enumeration("CaseStatus").is_ok());
    }
}
