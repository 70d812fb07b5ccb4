//! Result envelopes of the consumed CRUD API.

use serde::{Deserialize, Serialize};

/// A field-level validation error returned by a save endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Name of the offending property.
    pub property: String,
    /// Description of the problem.
    pub issue: String,
}

/// Envelope for endpoints returning a single item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult<T> {
    /// Whether the operation succeeded on the server.
    pub was_successful: bool,
    /// Server-provided message, usually set on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The principal payload.
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub object: Option<T>,
    /// Field-level validation errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_issues: Vec<ValidationIssue>,
}

impl<T> ItemResult<T> {
    /// Creates a successful envelope around a payload.
    pub fn success(object: T) -> Self {
        Self {
            was_successful: true,
            message: None,
            object: Some(object),
            validation_issues: Vec::new(),
        }
    }

    /// Creates a failed envelope with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            was_successful: false,
            message: Some(message.into()),
            object: None,
            validation_issues: Vec::new(),
        }
    }

    /// Transforms the payload, carrying every other field across.
    pub fn map_object<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<ItemResult<U>, E> {
        let object = self.object.map(f).transpose()?;
        Ok(ItemResult {
            was_successful: self.was_successful,
            message: self.message,
            object,
            validation_issues: self.validation_issues,
        })
    }
}

/// Envelope for endpoints returning a page of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    /// Whether the operation succeeded on the server.
    pub was_successful: bool,
    /// Server-provided message, usually set on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The page of items.
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<T>>,
    /// The 1-based page that was returned.
    #[serde(default)]
    pub page: u32,
    /// The requested page size.
    #[serde(default)]
    pub page_size: u32,
    /// Total number of pages.
    #[serde(default)]
    pub page_count: u32,
    /// Total number of matching items; may be `-1` when unknown.
    #[serde(default)]
    pub total_count: i64,
}

impl<T> ListResult<T> {
    /// Creates a successful envelope around a full page description.
    pub fn success(list: Vec<T>, page: u32, page_size: u32, page_count: u32, total_count: i64) -> Self {
        Self {
            was_successful: true,
            message: None,
            list: Some(list),
            page,
            page_size,
            page_count,
            total_count,
        }
    }

    /// Creates a failed envelope with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            was_successful: false,
            message: Some(message.into()),
            list: None,
            page: 0,
            page_size: 0,
            page_count: 0,
            total_count: 0,
        }
    }

    /// Transforms every item, carrying every other field across.
    pub fn map_list<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<ListResult<U>, E> {
        let list = self
            .list
            .map(|items| items.into_iter().map(f).collect::<Result<Vec<_>, E>>())
            .transpose()?;
        Ok(ListResult {
            was_successful: self.was_successful,
            message: self.message,
            list,
            page: self.page,
            page_size: self.page_size,
            page_count: self.page_count,
            total_count: self.total_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_envelope_decodes_camel_case() {
        let envelope: ItemResult<serde_json::Value> = serde_json::from_value(json!({
            "wasSuccessful": true,
            "object": { "caseId": 1 }
        }))
        .unwrap();
        assert!(envelope.was_successful);
        assert!(envelope.message.is_none());
        assert_eq!(envelope.object.unwrap()["caseId"], json!(1));
        assert!(envelope.validation_issues.is_empty());
    }

    #[test]
    fn item_envelope_decodes_validation_issues() {
        let envelope: ItemResult<serde_json::Value> = serde_json::from_value(json!({
            "wasSuccessful": false,
            "message": "Validation failed",
            "validationIssues": [{ "property": "title", "issue": "Required" }]
        }))
        .unwrap();
        assert!(!envelope.was_successful);
        assert_eq!(envelope.validation_issues[0].property, "title");
    }

    #[test]
    fn list_envelope_decodes_paging_fields() {
        let envelope: ListResult<serde_json::Value> = serde_json::from_value(json!({
            "wasSuccessful": true,
            "list": [{ "caseId": 1 }, { "caseId": 2 }],
            "page": 1,
            "pageSize": 25,
            "pageCount": 3,
            "totalCount": 60
        }))
        .unwrap();
        assert_eq!(envelope.list.as_ref().unwrap().len(), 2);
        assert_eq!(envelope.page_count, 3);
        assert_eq!(envelope.total_count, 60);
    }
}
