use trialvault_core::filter::{AssetFilter, SortDirection, SortField};

/// Query builder for the asset list, stats and export endpoints. Parameter
/// names mirror what the server parses.
#[derive(Debug, Clone, Default)]
pub struct AssetQuery {
    pub filter: AssetFilter,
    pub sort: Option<SortField>,
    pub order: Option<SortDirection>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl AssetQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: AssetFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn sorted_by(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort = Some(field);
        self.order = Some(direction);
        self
    }

    /// Key/value pairs for the request query string
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        let f = &self.filter;
        if let Some(id) = f.trial_id {
            push("trial_id", id.to_string());
        }
        if let Some(id) = f.site_id {
            push("site_id", id.to_string());
        }
        if let Some(id) = f.subject_id {
            push("subject_id", id.to_string());
        }
        if let Some(id) = f.event_id {
            push("event_id", id.to_string());
        }
        if let Some(id) = f.procedure_id {
            push("procedure_id", id.to_string());
        }
        if let Some(status) = f.review_status {
            push("review_status", status.as_str().to_string());
        }
        if let Some(modality) = f.modality {
            push("modality", modality.as_str().to_string());
        }
        if let Some(ref arm) = f.study_arm {
            push("study_arm", arm.clone());
        }
        if let Some(ref country) = f.country {
            push("country", country.clone());
        }
        if let Some(ts) = f.uploaded_from {
            push("uploaded_from", ts.to_rfc3339());
        }
        if let Some(ts) = f.uploaded_to {
            push("uploaded_to", ts.to_rfc3339());
        }
        if let Some(v) = f.min_duration_seconds {
            push("min_duration_seconds", v.to_string());
        }
        if let Some(v) = f.max_duration_seconds {
            push("max_duration_seconds", v.to_string());
        }
        if let Some(ref search) = f.search {
            if !search.is_empty() {
                push("search", search.clone());
            }
        }
        if let Some(sort) = self.sort {
            push("sort", sort.as_str().to_string());
        }
        if let Some(order) = self.order {
            push("order", order.as_str().to_string());
        }
        if let Some(page) = self.page {
            push("page", page.to_string());
        }
        if let Some(per_page) = self.per_page {
            push("per_page", per_page.to_string());
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialvault_core::model::ReviewStatus;
    use uuid::Uuid;

    fn get<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_empty_query_has_no_params() {
        assert!(AssetQuery::new().to_params().is_empty());
    }

    #[test]
    fn test_params_mirror_server_names() {
        let trial_id = Uuid::new_v4();
        let query = AssetQuery::with_filter(AssetFilter {
            trial_id: Some(trial_id),
            review_status: Some(ReviewStatus::Query),
            country: Some("DE".to_string()),
            ..Default::default()
        })
        .sorted_by(SortField::SizeBytes, SortDirection::Asc)
        .page(3)
        .per_page(50);

        let params = query.to_params();
        assert_eq!(get(&params, "trial_id"), Some(trial_id.to_string().as_str()));
        assert_eq!(get(&params, "review_status"), Some("query"));
        assert_eq!(get(&params, "country"), Some("DE"));
        assert_eq!(get(&params, "sort"), Some("size_bytes"));
        assert_eq!(get(&params, "order"), Some("asc"));
        assert_eq!(get(&params, "page"), Some("3"));
        assert_eq!(get(&params, "per_page"), Some("50"));
    }

    #[test]
    fn test_empty_search_is_omitted() {
        let query = AssetQuery::with_filter(AssetFilter {
            search: Some(String::new()),
            ..Default::default()
        });
        assert!(get(&query.to_params(), "search").is_none());
    }
}
