use serde::Deserialize;

use super::DateWindow;

/// A single read-only report query.
///
/// Names use the reporting API's `ga:` syntax. Several metrics may be
/// requested at once by comma-separating them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub metrics: String,
    pub dimensions: Option<String>,
    pub filters: Option<String>,
    pub sort: Option<String>,
}

impl MetricQuery {
    pub fn new(metrics: impl Into<String>) -> Self {
        Self {
            metrics: metrics.into(),
            dimensions: None,
            filters: None,
            sort: None,
        }
    }

    pub fn with_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.dimensions = Some(dimension.into());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filters = Some(filter.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

/// Everything needed to issue one query for a view over a window.
#[derive(Debug, Clone, Copy)]
pub struct ReportRequest<'a> {
    pub view_id: &'a str,
    pub window: &'a DateWindow,
    pub query: &'a MetricQuery,
}

impl ReportRequest<'_> {
    /// Query string parameters for the `data/ga` endpoint.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ids", format!("ga:{}", self.view_id)),
            ("start-date", self.window.start_param()),
            ("end-date", self.window.end_param()),
            ("metrics", self.query.metrics.clone()),
        ];
        if let Some(dimensions) = &self.query.dimensions {
            params.push(("dimensions", dimensions.clone()));
        }
        if let Some(filters) = &self.query.filters {
            params.push(("filters", filters.clone()));
        }
        if let Some(sort) = &self.query.sort {
            params.push(("sort", sort.clone()));
        }
        params
    }
}

/// Tabular query result.
///
/// Each row holds dimension values first, then metric values, all as
/// strings. The API omits `rows` entirely when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First cell of the first row, if any.
    pub fn first_cell(&self) -> Option<&str> {
        self.rows.first().and_then(|row| row.first()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_params_minimal() {
        let window = DateWindow::ending_yesterday(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 30);
        let query = MetricQuery::new("ga:sessions");
        let request = ReportRequest {
            view_id: "12345",
            window: &window,
            query: &query,
        };

        assert_eq!(
            request.params(),
            vec![
                ("ids", "ga:12345".to_string()),
                ("start-date", "2024-01-01".to_string()),
                ("end-date", "2024-01-31".to_string()),
                ("metrics", "ga:sessions".to_string()),
            ]
        );
    }

    #[test]
    fn test_params_with_dimension_filter_sort() {
        let window = DateWindow::ending_yesterday(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 30);
        let query = MetricQuery::new("ga:sessions")
            .with_dimension("ga:medium")
            .with_filter("ga:userType==New Visitor")
            .with_sort("-ga:sessions");
        let request = ReportRequest {
            view_id: "1",
            window: &window,
            query: &query,
        };

        let params = request.params();
        assert!(params.contains(&("dimensions", "ga:medium".to_string())));
        assert!(params.contains(&("filters", "ga:userType==New Visitor".to_string())));
        assert!(params.contains(&("sort", "-ga:sessions".to_string())));
    }

    #[test]
    fn test_result_without_rows_is_empty() {
        let result: QueryResult =
            serde_json::from_str(r#"{"kind":"analytics#gaData","totalResults":0}"#).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.first_cell(), None);
    }

    #[test]
    fn test_result_rows_preserved_in_order() {
        let result: QueryResult = serde_json::from_str(
            r#"{"rows":[["20240101","10"],["20240102","15"]],"totalResults":2}"#,
        )
        .unwrap();
        assert_eq!(
            result,
            QueryResult::from_rows([["20240101", "10"], ["20240102", "15"]])
        );
        assert_eq!(result.first_cell(), Some("20240101"));
    }
}
