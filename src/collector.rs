use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use prometheus::core::Desc;
use prometheus::proto::{Gauge, LabelPair, Metric, MetricFamily, MetricType};

use crate::error::ApiError;
use crate::models::stats::{StatMetrics, StatsQuery, METRIC_FIELDS};
use crate::stats_api::StatsApi;
use crate::util::{reporting_date, ReportingZone};

pub const NAMESPACE: &str = "sendgrid";

const USER_NAME_LABEL: &str = "user_name";
const CATEGORY_LABEL: &str = "category";

/// One gauge value produced by a scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub metric: &'static str,
    pub user_name: String,
    pub category: String,
    pub value: i64,
}

/// Turns a scrape into SendGrid API calls and labeled gauge samples.
///
/// Descriptors are built once here; each scrape only produces values. The
/// collector holds no mutable state, so concurrent scrapes need no locking.
pub struct StatsCollector {
    api: Arc<dyn StatsApi>,
    user_name: String,
    categories: Vec<String>,
    zone: Option<ReportingZone>,
    descs: Vec<Desc>,
}

impl StatsCollector {
    pub fn new(
        api: Arc<dyn StatsApi>,
        user_name: impl Into<String>,
        categories: Vec<String>,
        zone: Option<ReportingZone>,
    ) -> Result<Self, prometheus::Error> {
        let descs = METRIC_FIELDS
            .iter()
            .map(|field| {
                Desc::new(
                    format!("{NAMESPACE}_{}", field.name),
                    field.name.to_string(),
                    vec![USER_NAME_LABEL.to_string(), CATEGORY_LABEL.to_string()],
                    HashMap::new(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            api,
            user_name: user_name.into(),
            categories,
            zone,
            descs,
        })
    }

    pub async fn collect(&self) -> Vec<Sample> {
        self.collect_at(Utc::now()).await
    }

    /// Run one scrape as if the clock read `now`. A failure of the global or
    /// the category call is logged and only drops that family's samples.
    pub async fn collect_at(&self, now: DateTime<Utc>) -> Vec<Sample> {
        let today = reporting_date(now, self.zone.as_ref());
        let query = StatsQuery::daily(&today);
        let mut samples = Vec::new();

        if let Err(e) = self.collect_global_stats(&query, &mut samples).await {
            tracing::error!(family = "global", date = %today, error = %e, "Failed to collect SendGrid stats");
        }

        if !self.categories.is_empty() {
            if let Err(e) = self.collect_category_stats(&query, &mut samples).await {
                tracing::error!(family = "category", date = %today, error = %e, "Failed to collect SendGrid stats");
            }
        }

        samples
    }

    async fn collect_global_stats(
        &self,
        query: &StatsQuery,
        samples: &mut Vec<Sample>,
    ) -> Result<(), ApiError> {
        let stats = self.api.global_stats(query).await?;

        let Some(day) = stats.first() else {
            tracing::debug!(family = "global", date = %query.start_date, "No stats returned for date");
            return Ok(());
        };

        for entry in &day.stats {
            self.push_samples(&entry.metrics, "", samples);
        }
        Ok(())
    }

    async fn collect_category_stats(
        &self,
        query: &StatsQuery,
        samples: &mut Vec<Sample>,
    ) -> Result<(), ApiError> {
        let stats = self.api.category_stats(query, &self.categories).await?;

        let Some(day) = stats.first() else {
            tracing::debug!(family = "category", date = %query.start_date, "No stats returned for date");
            return Ok(());
        };

        for entry in &day.stats {
            self.push_samples(&entry.metrics, &entry.name, samples);
        }
        Ok(())
    }

    fn push_samples(&self, metrics: &StatMetrics, category: &str, samples: &mut Vec<Sample>) {
        samples.extend(METRIC_FIELDS.iter().map(|field| Sample {
            metric: field.name,
            user_name: self.user_name.clone(),
            category: category.to_string(),
            value: (field.value)(metrics),
        }));
    }

    /// Group `samples` into one gauge family per descriptor. Families without
    /// samples are left out.
    pub fn metric_families(&self, samples: &[Sample]) -> Vec<MetricFamily> {
        self.descs
            .iter()
            .zip(METRIC_FIELDS.iter())
            .filter_map(|(desc, field)| {
                let metrics: Vec<Metric> = samples
                    .iter()
                    .filter(|s| s.metric == field.name)
                    .map(gauge_metric)
                    .collect();
                if metrics.is_empty() {
                    return None;
                }

                let mut family = MetricFamily::default();
                family.set_name(desc.fq_name.clone());
                family.set_help(desc.help.clone());
                family.set_field_type(MetricType::GAUGE);
                for metric in metrics {
                    family.mut_metric().push(metric);
                }
                Some(family)
            })
            .collect()
    }
}

fn gauge_metric(sample: &Sample) -> Metric {
    // Label pairs are kept sorted by name, as the text encoder expects.
    let mut metric = Metric::default();
    metric.mut_label().push(label_pair(CATEGORY_LABEL, &sample.category));
    metric.mut_label().push(label_pair(USER_NAME_LABEL, &sample.user_name));

    let mut gauge = Gauge::default();
    gauge.set_value(sample.value as f64);
    metric.set_gauge(gauge);
    metric
}

fn label_pair(name: &str, value: &str) -> LabelPair {
    let mut pair = LabelPair::default();
    pair.set_name(name.to_string());
    pair.set_value(value.to_string());
    pair
}
