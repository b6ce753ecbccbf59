use prometheus::{Encoder, Registry, TextEncoder};

use crate::collector::{Sample, StatsCollector};

pub use prometheus::TEXT_FORMAT as CONTENT_TYPE;

/// Register metrics about the exporter process itself.
pub fn register_exporter_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    #[cfg(target_os = "linux")]
    registry.register(Box::new(
        prometheus::process_collector::ProcessCollector::for_self(),
    ))?;
    #[cfg(not(target_os = "linux"))]
    let _ = registry;
    Ok(())
}

/// Render the registry's metrics followed by the scraped SendGrid samples in
/// the Prometheus text format.
pub fn render(
    registry: &Registry,
    collector: &StatsCollector,
    samples: &[Sample],
) -> Result<String, prometheus::Error> {
    let mut families = registry.gather();
    families.extend(collector.metric_families(samples));

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::stats::{CategoryStat, GlobalStat, StatsQuery};
    use crate::stats_api::StatsApi;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoData;

    #[async_trait]
    impl StatsApi for NoData {
        async fn global_stats(&self, _query: &StatsQuery) -> Result<Vec<GlobalStat>, ApiError> {
            Ok(Vec::new())
        }

        async fn category_stats(
            &self,
            _query: &StatsQuery,
            _categories: &[String],
        ) -> Result<Vec<CategoryStat>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn sample(metric: &'static str, category: &str, value: i64) -> Sample {
        Sample {
            metric,
            user_name: "acct".into(),
            category: category.into(),
            value,
        }
    }

    #[test]
    fn test_render_text_format() {
        let collector = StatsCollector::new(Arc::new(NoData), "acct", Vec::new(), None).unwrap();
        let samples = vec![sample("delivered", "", 12), sample("delivered", "promo", 3)];

        let text = render(&Registry::new(), &collector, &samples).unwrap();

        assert!(text.contains("# HELP sendgrid_delivered delivered"));
        assert!(text.contains("# TYPE sendgrid_delivered gauge"));
        assert!(text.contains(r#"sendgrid_delivered{category="",user_name="acct"} 12"#));
        assert!(text.contains(r#"sendgrid_delivered{category="promo",user_name="acct"} 3"#));
        assert!(!text.contains("sendgrid_blocks"));
    }

    #[test]
    fn test_render_empty_is_empty() {
        let collector = StatsCollector::new(Arc::new(NoData), "", Vec::new(), None).unwrap();
        let text = render(&Registry::new(), &collector, &[]).unwrap();
        assert!(text.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_exporter_metrics_include_process_collector() {
        let registry = Registry::new();
        register_exporter_metrics(&registry).unwrap();
        let collector = StatsCollector::new(Arc::new(NoData), "", Vec::new(), None).unwrap();

        let text = render(&registry, &collector, &[]).unwrap();
        assert!(text.contains("process_"));
    }
}
