use shared::protocol::{FilterClause, PageState, SearchRequest, SortOrder, SortSpec};

/// Assembles an advanced-search request from UI-level selections.
///
/// Pure and deterministic: clauses missing a field or value are treated as
/// not yet specified and dropped, a sort with an empty field collapses to
/// "no sort", and a blank callback URL means synchronous mode. Field names
/// are passed through verbatim; whether they name real columns is the
/// server's concern. Page values are likewise not clamped here.
pub fn build_search_request(
    clauses: &[FilterClause],
    sort: Option<SortSpec>,
    page: PageState,
    callback_url: Option<&str>,
) -> SearchRequest {
    let filters = clauses
        .iter()
        .filter(|clause| clause.is_active())
        .cloned()
        .collect();

    let sort = sort.filter(|spec| !spec.field.is_empty());

    let callback_url = callback_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    SearchRequest {
        filters,
        sort,
        page,
        callback_url,
    }
}

/// Parameters of one simple listing fetch (GET /people).
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    /// Flattens the query into request parameters. Filters with an empty
    /// name or value are inactive and dropped here, right before dispatch.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ];
        if !self.sort_by.is_empty() {
            pairs.push(("sortBy".to_string(), self.sort_by.clone()));
            pairs.push(("sortOrder".to_string(), self.sort_order.as_str().to_string()));
        }
        pairs.extend(
            self.filters
                .iter()
                .filter(|(name, value)| !name.is_empty() && !value.is_empty())
                .cloned(),
        );
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared::protocol::FilterOperator;

    #[test]
    fn drops_incomplete_clauses() {
        let clauses = vec![
            FilterClause::new("name", FilterOperator::Eq, "Ada"),
            FilterClause::new("", FilterOperator::Eq, "ignored"),
            FilterClause::new("height", FilterOperator::Gt, ""),
        ];
        let request = build_search_request(&clauses, None, PageState::default(), None);
        assert_eq!(request.filters, vec![clauses[0].clone()]);
    }

    #[test]
    fn empty_sort_field_means_no_sort() {
        let sort = SortSpec {
            field: String::new(),
            order: SortOrder::Desc,
        };
        let request = build_search_request(&[], Some(sort), PageState::default(), None);
        assert!(request.sort.is_none());
    }

    #[test]
    fn blank_callback_url_stays_synchronous() {
        let request = build_search_request(&[], None, PageState::default(), Some("   "));
        assert!(request.callback_url.is_none());

        let request =
            build_search_request(&[], None, PageState::default(), Some("http://cb.example"));
        assert_eq!(request.callback_url.as_deref(), Some("http://cb.example"));
    }

    #[test]
    fn page_values_pass_through_unclamped() {
        let page = PageState {
            index: 9999,
            size: 3,
        };
        let request = build_search_request(&[], None, page, None);
        assert_eq!(request.page, page);
    }

    #[test]
    fn list_query_pairs_skip_empty_filters_and_sort() {
        let query = ListQuery {
            page: 2,
            page_size: 20,
            sort_by: String::new(),
            sort_order: SortOrder::Asc,
            filters: vec![
                ("name".to_string(), "Ada".to_string()),
                ("eyeColor".to_string(), String::new()),
            ],
        };
        let pairs = query.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("pageSize".to_string(), "20".to_string()),
                ("name".to_string(), "Ada".to_string()),
            ]
        );
    }

    fn operator_strategy() -> impl Strategy<Value = FilterOperator> {
        prop_oneof![
            Just(FilterOperator::Eq),
            Just(FilterOperator::Ne),
            Just(FilterOperator::Gt),
            Just(FilterOperator::Lt),
            Just(FilterOperator::Gte),
            Just(FilterOperator::Lte),
        ]
    }

    fn clause_strategy() -> impl Strategy<Value = FilterClause> {
        (
            prop_oneof![Just(String::new()), "[a-z.]{1,12}"],
            operator_strategy(),
            prop_oneof![Just(String::new()), "[a-zA-Z0-9_]{1,12}"],
        )
            .prop_map(|(field, operator, value)| FilterClause {
                field,
                operator,
                value,
            })
    }

    proptest! {
        #[test]
        fn built_requests_contain_exactly_the_active_clauses(
            clauses in proptest::collection::vec(clause_strategy(), 0..8)
        ) {
            let request = build_search_request(&clauses, None, PageState::default(), None);
            prop_assert!(request.filters.iter().all(FilterClause::is_active));
            let expected: Vec<_> = clauses
                .iter()
                .filter(|clause| clause.is_active())
                .cloned()
                .collect();
            prop_assert_eq!(request.filters, expected);
        }

        #[test]
        fn building_twice_from_identical_inputs_is_idempotent(
            clauses in proptest::collection::vec(clause_strategy(), 0..8),
            sort_field in prop_oneof![Just(String::new()), "[a-z.]{1,12}"],
            index in 0u32..1000,
            size in 1u32..100,
            callback in prop_oneof![Just(None), Just(Some("http://cb.example/hook".to_string()))],
        ) {
            let sort = Some(SortSpec { field: sort_field, order: SortOrder::Desc });
            let page = PageState { index, size };
            let first = build_search_request(&clauses, sort.clone(), page, callback.as_deref());
            let second = build_search_request(&clauses, sort, page, callback.as_deref());
            prop_assert_eq!(first, second);
        }
    }
}
