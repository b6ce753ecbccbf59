use serde::{Deserialize, Deserializer};

use crate::error::ApiError;

/// Decode `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The sixteen per-day counters SendGrid reports for an account or category.
/// Fields absent from the response, or `null`, decode as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatMetrics {
    #[serde(deserialize_with = "null_as_default")]
    pub blocks: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bounce_drops: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bounces: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub clicks: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub deferred: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub delivered: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub invalid_emails: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub opens: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub processed: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub requests: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub spam_report_drops: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub spam_reports: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub unique_clicks: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub unique_opens: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub unsubscribe_drops: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub unsubscribes: i64,
}

/// Maps one counter of [`StatMetrics`] to its exported metric name.
#[derive(Clone, Copy)]
pub struct MetricField {
    pub name: &'static str,
    pub value: fn(&StatMetrics) -> i64,
}

/// Every counter, in exposition order. Emitting from this table guarantees
/// that all sixteen gauges are present for each stats entry.
pub const METRIC_FIELDS: [MetricField; 16] = [
    MetricField { name: "blocks", value: |m| m.blocks },
    MetricField { name: "bounce_drops", value: |m| m.bounce_drops },
    MetricField { name: "bounces", value: |m| m.bounces },
    MetricField { name: "clicks", value: |m| m.clicks },
    MetricField { name: "deferred", value: |m| m.deferred },
    MetricField { name: "delivered", value: |m| m.delivered },
    MetricField { name: "invalid_emails", value: |m| m.invalid_emails },
    MetricField { name: "opens", value: |m| m.opens },
    MetricField { name: "processed", value: |m| m.processed },
    MetricField { name: "requests", value: |m| m.requests },
    MetricField { name: "spam_report_drops", value: |m| m.spam_report_drops },
    MetricField { name: "spam_reports", value: |m| m.spam_reports },
    MetricField { name: "unique_clicks", value: |m| m.unique_clicks },
    MetricField { name: "unique_opens", value: |m| m.unique_opens },
    MetricField { name: "unsubscribe_drops", value: |m| m.unsubscribe_drops },
    MetricField { name: "unsubscribes", value: |m| m.unsubscribes },
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalStatEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: StatMetrics,
}

/// One day of account-wide stats from `GET /stats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalStat {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: Vec<GlobalStatEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryStatEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: StatMetrics,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
}

/// One day of per-category stats from `GET /categories/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryStat {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: Vec<CategoryStatEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Day,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Day => "day",
        }
    }
}

/// Date range and bucket size shared by both stats endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    pub start_date: String,
    pub end_date: String,
    pub aggregated_by: Aggregation,
}

impl StatsQuery {
    /// A single-day query, as issued on every scrape.
    pub fn daily(date: &str) -> Self {
        Self {
            start_date: date.to_string(),
            end_date: date.to_string(),
            aggregated_by: Aggregation::Day,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.start_date.is_empty() {
            return Err(ApiError::Validation("start_date is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_counters_default_to_zero() {
        let body = r#"[{"date":"2024-03-01","stats":[{"metrics":{"blocks":5,"clicks":3}}]}]"#;
        let stats: Vec<GlobalStat> = serde_json::from_str(body).unwrap();

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].date, "2024-03-01");
        let metrics = &stats[0].stats[0].metrics;
        assert_eq!(metrics.blocks, 5);
        assert_eq!(metrics.clicks, 3);
        assert_eq!(
            StatMetrics {
                blocks: 5,
                clicks: 3,
                ..Default::default()
            },
            *metrics
        );
    }

    #[test]
    fn test_category_entry_decodes_name_and_type() {
        let body = r#"[{"date":"2024-03-01","stats":[
            {"metrics":{"delivered":10},"name":"promo","type":"category"},
            {"name":"alerts","type":"category"}
        ]}]"#;
        let stats: Vec<CategoryStat> = serde_json::from_str(body).unwrap();

        let entries = &stats[0].stats;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "promo");
        assert_eq!(entries[0].kind, "category");
        assert_eq!(entries[0].metrics.delivered, 10);
        assert_eq!(entries[1].metrics, StatMetrics::default());
    }

    #[test]
    fn test_null_values_decode_as_defaults() {
        let body = r#"[{"date":"2024-03-01","stats":[{"metrics":{"blocks":null,"clicks":3}}]}]"#;
        let stats: Vec<GlobalStat> = serde_json::from_str(body).unwrap();
        let metrics = &stats[0].stats[0].metrics;
        assert_eq!(metrics.blocks, 0);
        assert_eq!(metrics.clicks, 3);

        let body = r#"[{"date":null,"stats":null}]"#;
        let stats: Vec<GlobalStat> = serde_json::from_str(body).unwrap();
        assert_eq!(stats[0].date, "");
        assert!(stats[0].stats.is_empty());

        let body = r#"[{"date":"2024-03-01","stats":[{"metrics":null}]}]"#;
        let stats: Vec<GlobalStat> = serde_json::from_str(body).unwrap();
        assert_eq!(stats[0].stats[0].metrics, StatMetrics::default());

        let body = r#"[{"date":"2024-03-01","stats":[{"metrics":null,"name":null,"type":null}]}]"#;
        let stats: Vec<CategoryStat> = serde_json::from_str(body).unwrap();
        let entry = &stats[0].stats[0];
        assert_eq!(entry.metrics, StatMetrics::default());
        assert_eq!(entry.name, "");
        assert_eq!(entry.kind, "");
    }

    #[test]
    fn test_metric_table_reads_every_field() {
        let metrics = StatMetrics {
            blocks: 1,
            bounce_drops: 2,
            bounces: 3,
            clicks: 4,
            deferred: 5,
            delivered: 6,
            invalid_emails: 7,
            opens: 8,
            processed: 9,
            requests: 10,
            spam_report_drops: 11,
            spam_reports: 12,
            unique_clicks: 13,
            unique_opens: 14,
            unsubscribe_drops: 15,
            unsubscribes: 16,
        };

        let values: Vec<i64> = METRIC_FIELDS.iter().map(|f| (f.value)(&metrics)).collect();
        assert_eq!(values, (1..=16).collect::<Vec<i64>>());

        let names: std::collections::HashSet<&str> =
            METRIC_FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), 16);
    }

    #[test]
    fn test_query_requires_start_date() {
        let query = StatsQuery {
            start_date: String::new(),
            end_date: "2024-03-01".into(),
            aggregated_by: Aggregation::Day,
        };
        assert!(matches!(query.validate(), Err(ApiError::Validation(_))));
        assert!(StatsQuery::daily("2024-03-01").validate().is_ok());
        assert_eq!(StatsQuery::daily("2024-03-01").aggregated_by.as_str(), "day");
    }
}
