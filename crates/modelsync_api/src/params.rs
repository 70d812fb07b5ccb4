//! Parameter objects for the standard endpoints.

/// A named server-side data source variant plus its parameter values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataSourceSpec {
    /// Data source name, as declared on the server.
    pub name: String,
    /// Parameter values, pre-rendered for transport.
    pub params: Vec<(String, String)>,
}

impl DataSourceSpec {
    /// Creates a data source reference with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Adds a parameter value.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

/// Parameters accepted by the `get`, `save` and `delete` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataSourceParams {
    /// Include string the server may use to shape the result.
    pub includes: Option<String>,
    /// Data source variant to load through.
    pub data_source: Option<DataSourceSpec>,
}

impl DataSourceParams {
    /// Sets the include string.
    pub fn with_includes(mut self, includes: impl Into<String>) -> Self {
        self.includes = Some(includes.into());
        self
    }

    /// Sets the data source.
    pub fn with_data_source(mut self, data_source: DataSourceSpec) -> Self {
        self.data_source = Some(data_source);
        self
    }
}

/// Parameters accepted by the `count` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterParams {
    /// Data-source parameters.
    pub data_source: DataSourceParams,
    /// Free-text search term; behavior is server-defined.
    pub search: Option<String>,
    /// Field/value pairs to filter by, one query key per field.
    pub filter: Vec<(String, String)>,
}

impl FilterParams {
    /// Sets the include string.
    pub fn with_includes(mut self, includes: impl Into<String>) -> Self {
        self.data_source.includes = Some(includes.into());
        self
    }

    /// Sets the data source.
    pub fn with_data_source(mut self, data_source: DataSourceSpec) -> Self {
        self.data_source.data_source = Some(data_source);
        self
    }

    /// Sets the search term.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Adds a field filter.
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.push((field.into(), value.into()));
        self
    }
}

/// Parameters accepted by the `list` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Filter parameters.
    pub filter: FilterParams,
    /// 1-based page to request.
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
    /// Field to order by, ascending.
    pub order_by: Option<String>,
    /// Field to order by, descending.
    pub order_by_descending: Option<String>,
    /// Restricts the populated fields of the results.
    pub fields: Vec<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            filter: FilterParams::default(),
            page: 1,
            page_size: 25,
            order_by: None,
            order_by_descending: None,
            fields: Vec::new(),
        }
    }
}

impl ListParams {
    /// Sets the page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the ascending order field.
    pub fn with_order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Sets the descending order field.
    pub fn with_order_by_descending(mut self, field: impl Into<String>) -> Self {
        self.order_by_descending = Some(field.into());
        self
    }

    /// Requests a specific field in the results.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Sets the search term.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.filter.search = Some(search.into());
        self
    }

    /// Adds a field filter.
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.filter.push((field.into(), value.into()));
        self
    }

    /// Sets the include string.
    pub fn with_includes(mut self, includes: impl Into<String>) -> Self {
        self.filter.data_source.includes = Some(includes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_defaults() {
        let params = ListParams::default();
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, 25);
        assert!(params.order_by.is_none());
    }

    #[test]
    fn builders_compose() {
        let params = ListParams::default()
            .with_page(3)
            .with_search("printer")
            .with_filter("status", "Open")
            .with_includes("details")
            .with_field("title");
        assert_eq!(params.page, 3);
        assert_eq!(params.filter.search.as_deref(), Some("printer"));
        assert_eq!(params.filter.filter[0].0, "status");
        assert_eq!(
            params.filter.data_source.includes.as_deref(),
            Some("details")
        );
        assert_eq!(params.fields, ["title"]);
    }

    #[test]
    fn params_support_deep_comparison() {
        let a = ListParams::default().with_search("x");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.page = 2;
        assert_ne!(a, b);
    }
}
