//! Query-string encoding of parameter objects.

use crate::params::{DataSourceParams, FilterParams, ListParams};

/// Encodes data-source parameters as query pairs.
///
/// A data source contributes `dataSource=<name>` plus one
/// `dataSource.<param>` pair per parameter value; this flat form is what
/// the server-side model binder expects.
pub fn data_source_query(params: &DataSourceParams) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(includes) = &params.includes {
        pairs.push(("includes".into(), includes.clone()));
    }
    if let Some(data_source) = &params.data_source {
        pairs.push(("dataSource".into(), data_source.name.clone()));
        for (name, value) in &data_source.params {
            pairs.push((format!("dataSource.{name}"), value.clone()));
        }
    }
    pairs
}

/// Encodes filter parameters as query pairs.
///
/// Each filtered field becomes its own `filter.<field>` query key.
pub fn filter_query(params: &FilterParams) -> Vec<(String, String)> {
    let mut pairs = data_source_query(&params.data_source);
    if let Some(search) = &params.search {
        pairs.push(("search".into(), search.clone()));
    }
    for (field, value) in &params.filter {
        pairs.push((format!("filter.{field}"), value.clone()));
    }
    pairs
}

/// Encodes list parameters as query pairs.
pub fn list_query(params: &ListParams) -> Vec<(String, String)> {
    let mut pairs = filter_query(&params.filter);
    pairs.push(("page".into(), params.page.to_string()));
    pairs.push(("pageSize".into(), params.page_size.to_string()));
    if let Some(order_by) = &params.order_by {
        pairs.push(("orderBy".into(), order_by.clone()));
    }
    if let Some(order_by_descending) = &params.order_by_descending {
        pairs.push(("orderByDescending".into(), order_by_descending.clone()));
    }
    for field in &params.fields {
        pairs.push(("fields[]".into(), field.clone()));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DataSourceSpec;

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.into(), value.into())
    }

    #[test]
    fn empty_params_encode_nothing() {
        assert!(data_source_query(&DataSourceParams::default()).is_empty());
        assert!(filter_query(&FilterParams::default()).is_empty());
    }

    #[test]
    fn data_source_encodes_name_and_flat_params() {
        let params = DataSourceParams::default()
            .with_includes("details")
            .with_data_source(
                DataSourceSpec::new("WithRelations").with_param("minimumDate", "2024-01-01"),
            );
        assert_eq!(
            data_source_query(&params),
            vec![
                pair("includes", "details"),
                pair("dataSource", "WithRelations"),
                pair("dataSource.minimumDate", "2024-01-01"),
            ]
        );
    }

    #[test]
    fn filters_get_one_key_per_field() {
        let params = FilterParams::default()
            .with_search("printer")
            .with_filter("status", "Open")
            .with_filter("companyId", "5");
        assert_eq!(
            filter_query(&params),
            vec![
                pair("search", "printer"),
                pair("filter.status", "Open"),
                pair("filter.companyId", "5"),
            ]
        );
    }

    #[test]
    fn list_params_encode_paging_ordering_and_fields() {
        let params = ListParams::default()
            .with_page(2)
            .with_page_size(10)
            .with_order_by("title")
            .with_field("title")
            .with_field("caseId");
        assert_eq!(
            list_query(&params),
            vec![
                pair("page", "2"),
                pair("pageSize", "10"),
                pair("orderBy", "title"),
                pair("fields[]", "title"),
                pair("fields[]", "caseId"),
            ]
        );
    }
}
