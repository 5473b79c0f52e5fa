use serde::Serialize;

use super::domain::{KycRequest, KycStatus, RiskLevel};

/// Dashboard aggregates, recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    pub review_required: usize,
    pub risk_distribution: Vec<RiskBucket>,
    pub requests_over_time: Vec<DailyVolume>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskBucket {
    pub name: &'static str,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyVolume {
    pub date: &'static str,
    pub requests: usize,
}

/// Placeholder series shown on the dashboard chart until real volumes are tracked.
const REQUESTS_OVER_TIME: [(&str, usize); 5] = [
    ("2025-05-01", 12),
    ("2025-05-02", 19),
    ("2025-05-03", 15),
    ("2025-05-04", 25),
    ("2025-05-05", 32),
];

impl AdminStats {
    pub fn from_requests(requests: &[KycRequest]) -> Self {
        let risk_distribution = RiskLevel::ordered()
            .into_iter()
            .map(|level| RiskBucket {
                name: level.label(),
                value: count(requests, |request| request.risk_level == Some(level)),
            })
            .collect();

        Self {
            total: requests.len(),
            approved: count(requests, |request| request.status == KycStatus::Verified),
            pending: count(requests, |request| request.status == KycStatus::InProgress),
            review_required: count(requests, |request| request.status.awaits_review()),
            risk_distribution,
            requests_over_time: REQUESTS_OVER_TIME
                .iter()
                .map(|&(date, requests)| DailyVolume { date, requests })
                .collect(),
        }
    }
}

fn count(requests: &[KycRequest], predicate: impl Fn(&KycRequest) -> bool) -> usize {
    requests.iter().filter(|request| predicate(request)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_collection_yields_zeroed_buckets() {
        let stats = AdminStats::from_requests(&[]);
        let value = serde_json::to_value(&stats).expect("serializes");

        assert_eq!(value["total"], json!(0));
        assert_eq!(value["approved"], json!(0));
        assert_eq!(value["pending"], json!(0));
        assert_eq!(value["reviewRequired"], json!(0));
        assert_eq!(
            value["riskDistribution"],
            json!([
                {"name": "Low", "value": 0},
                {"name": "Medium", "value": 0},
                {"name": "High", "value": 0}
            ])
        );
        assert_eq!(value["requestsOverTime"].as_array().map(Vec::len), Some(5));
        assert_eq!(
            value["requestsOverTime"][0],
            json!({"date": "2025-05-01", "requests": 12})
        );
    }
}
