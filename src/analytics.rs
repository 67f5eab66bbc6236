// Read-only aggregation of stored reports for the dashboard charts.
use crate::storage::ReportRecord;
use serde::Serialize;

const BUCKET_WIDTH: i64 = 10;
const BUCKET_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub created_at: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionBucket {
    pub label: String,
    pub count: i64,
}

/// Chart-ready view over the stored reports. Purely derived; the client
/// decides how to render it.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub has_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub total_reports: usize,
    pub risk_series: Vec<SeriesPoint>,
    pub confidence_series: Vec<SeriesPoint>,
    pub risk_distribution: Vec<DistributionBucket>,
}

/// Builds the time series (oldest first, by `created_at`) and the bucketed
/// risk-score distribution. An empty store yields a placeholder message
/// instead of chart data.
pub fn summarize(reports: &[ReportRecord]) -> AnalyticsSummary {
    if reports.is_empty() {
        return AnalyticsSummary {
            has_data: false,
            message: Some("No reports stored yet.".to_string()),
            total_reports: 0,
            risk_series: Vec::new(),
            confidence_series: Vec::new(),
            risk_distribution: Vec::new(),
        };
    }

    // Reports arrive newest first; charts read left to right in time.
    let mut ordered: Vec<&ReportRecord> = reports.iter().collect();
    ordered.reverse();

    let risk_series = ordered
        .iter()
        .map(|record| SeriesPoint {
            created_at: record.created_at.clone(),
            value: record.risk_score,
        })
        .collect();
    let confidence_series = ordered
        .iter()
        .map(|record| SeriesPoint {
            created_at: record.created_at.clone(),
            value: record.confidence,
        })
        .collect();

    let mut counts = [0i64; BUCKET_COUNT];
    for record in &ordered {
        let bucket = bucket_index(record.risk_score);
        counts[bucket] += 1;
    }
    let risk_distribution = counts
        .iter()
        .enumerate()
        .map(|(index, count)| DistributionBucket {
            label: bucket_label(index),
            count: *count,
        })
        .collect();

    AnalyticsSummary {
        has_data: true,
        message: None,
        total_reports: reports.len(),
        risk_series,
        confidence_series,
        risk_distribution,
    }
}

/// Scores land in ten-wide buckets; 100 shares the top bucket.
fn bucket_index(score: i64) -> usize {
    let clamped = score.clamp(0, 100);
    ((clamped / BUCKET_WIDTH) as usize).min(BUCKET_COUNT - 1)
}

fn bucket_label(index: usize) -> String {
    let low = index as i64 * BUCKET_WIDTH;
    if index == BUCKET_COUNT - 1 {
        format!("{low}-100")
    } else {
        format!("{}-{}", low, low + BUCKET_WIDTH - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, risk_score: i64, confidence: i64, created_at: &str) -> ReportRecord {
        ReportRecord {
            id,
            summary: format!("report {id}"),
            risks: Vec::new(),
            findings: Vec::new(),
            recommendation: String::new(),
            risk_score,
            confidence,
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn empty_store_yields_placeholder() {
        let summary = summarize(&[]);
        assert!(!summary.has_data);
        assert_eq!(summary.message.as_deref(), Some("No reports stored yet."));
        assert!(summary.risk_series.is_empty());
        assert!(summary.risk_distribution.is_empty());
    }

    #[test]
    fn series_run_oldest_to_newest() {
        // fetch order is newest first
        let reports = vec![
            record(2, 80, 95, "2024-01-02 10:00:00"),
            record(1, 40, 90, "2024-01-01 10:00:00"),
        ];
        let summary = summarize(&reports);
        assert!(summary.has_data);
        assert_eq!(summary.total_reports, 2);
        assert_eq!(
            summary.risk_series,
            vec![
                SeriesPoint {
                    created_at: "2024-01-01 10:00:00".to_string(),
                    value: 40,
                },
                SeriesPoint {
                    created_at: "2024-01-02 10:00:00".to_string(),
                    value: 80,
                },
            ]
        );
        assert_eq!(summary.confidence_series[0].value, 90);
    }

    #[test]
    fn distribution_buckets_scores_including_hundred() {
        let reports = vec![
            record(3, 100, 95, "2024-01-03 10:00:00"),
            record(2, 95, 95, "2024-01-02 10:00:00"),
            record(1, 0, 90, "2024-01-01 10:00:00"),
        ];
        let summary = summarize(&reports);
        assert_eq!(summary.risk_distribution.len(), 10);
        assert_eq!(summary.risk_distribution[0].label, "0-9");
        assert_eq!(summary.risk_distribution[0].count, 1);
        assert_eq!(summary.risk_distribution[9].label, "90-100");
        assert_eq!(summary.risk_distribution[9].count, 2);
    }
}
