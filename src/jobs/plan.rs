use crate::{analytics::MetricQuery, widgets::Shape};

/// One query of a run and the event it feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMetric {
    pub event_name: String,
    pub query: MetricQuery,
    pub shape: Shape,
}

impl PlannedMetric {
    fn new(event_name: impl Into<String>, query: MetricQuery, shape: Shape) -> Self {
        Self {
            event_name: event_name.into(),
            query,
            shape,
        }
    }
}

/// The ordered list of queries executed by every run.
///
/// Site-wide metrics come first, then three entries per goal in the order
/// given, then the session chart.
pub fn build_plan(goal_ids: &[u32]) -> Vec<PlannedMetric> {
    let mut plan = Vec::with_capacity(5 + goal_ids.len() * 3);

    plan.push(PlannedMetric::new(
        "ga_sessions",
        MetricQuery::new("ga:sessions"),
        Shape::Count,
    ));
    plan.push(PlannedMetric::new(
        "ga_new_sessions",
        MetricQuery::new("ga:sessions").with_filter("ga:userType==New Visitor"),
        Shape::Count,
    ));
    plan.push(PlannedMetric::new(
        "ga_traffic_sources",
        MetricQuery::new("ga:sessions")
            .with_dimension("ga:medium")
            .with_sort("-ga:sessions"),
        Shape::Labels,
    ));
    plan.push(PlannedMetric::new(
        "ga_bounce_rate",
        MetricQuery::new("ga:bounceRate"),
        Shape::Percent,
    ));

    for id in goal_ids {
        let completions = format!("ga:goal{id}Completions");
        plan.push(PlannedMetric::new(
            format!("ga_goal_{id}_completions"),
            MetricQuery::new(completions.as_str()),
            Shape::Count,
        ));
        plan.push(PlannedMetric::new(
            format!("ga_goal_{id}_conversion_rate"),
            MetricQuery::new(format!("ga:goal{id}ConversionRate")),
            Shape::Percent,
        ));
        plan.push(PlannedMetric::new(
            format!("ga_goal_{id}_completions_chart"),
            MetricQuery::new(completions).with_dimension("ga:date"),
            Shape::Series,
        ));
    }

    plan.push(PlannedMetric::new(
        "ga_session_chart",
        MetricQuery::new("ga:sessions").with_dimension("ga:date"),
        Shape::Series,
    ));

    plan
}
