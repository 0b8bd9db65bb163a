// lib/src/stats.rs

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use models::Claim;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketStats {
    pub count: usize,
    pub billed: Decimal,
    pub paid: Decimal,
}

impl BucketStats {
    fn add(&mut self, claim: &Claim) {
        self.count += 1;
        self.billed += claim.billed_amount;
        self.paid += claim.paid_amount;
    }
}

/// Portfolio totals for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClaimStats {
    pub total_claims: usize,
    pub total_billed: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
    /// Paid as a percentage of billed, two decimal places; zero when nothing is billed.
    pub collection_rate: Decimal,
    pub flagged_claims: usize,
    pub by_status: BTreeMap<String, BucketStats>,
    pub by_insurer: BTreeMap<String, BucketStats>,
}

pub fn compute_stats(claims: &[Claim], flagged_ids: &HashSet<u64>) -> ClaimStats {
    let mut stats = ClaimStats::default();
    for claim in claims {
        stats.total_claims += 1;
        stats.total_billed += claim.billed_amount;
        stats.total_paid += claim.paid_amount;
        if flagged_ids.contains(&claim.id) {
            stats.flagged_claims += 1;
        }
        stats.by_status.entry(claim.status.clone()).or_default().add(claim);
        stats.by_insurer.entry(claim.insurer_name.clone()).or_default().add(claim);
    }
    stats.outstanding = stats.total_billed - stats.total_paid;
    if !stats.total_billed.is_zero() {
        stats.collection_rate = (stats.total_paid * Decimal::ONE_HUNDRED / stats.total_billed).round_dp(2);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn claim(id: u64, billed: i64, paid: i64, status: &str, insurer: &str) -> Claim {
        Claim {
            id,
            claim_id: id as i64 + 1000,
            patient_name: format!("Patient {}", id),
            billed_amount: Decimal::new(billed, 2),
            paid_amount: Decimal::new(paid, 2),
            status: status.to_string(),
            insurer_name: insurer.to_string(),
            discharge_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    #[test]
    fn should_total_and_bucket_claims() {
        let claims = vec![
            claim(1, 100_00, 100_00, "Paid", "Acme"),
            claim(2, 200_00, 0, "Denied", "Acme"),
            claim(3, 50_50, 25_25, "Paid", "Blue Shield"),
        ];
        let flagged: HashSet<u64> = [2, 99].into_iter().collect();
        let stats = compute_stats(&claims, &flagged);

        assert_eq!(stats.total_claims, 3);
        assert_eq!(stats.total_billed, Decimal::new(350_50, 2));
        assert_eq!(stats.total_paid, Decimal::new(125_25, 2));
        assert_eq!(stats.outstanding, Decimal::new(225_25, 2));
        assert_eq!(stats.collection_rate, Decimal::new(35_73, 2));
        assert_eq!(stats.flagged_claims, 1);
        assert_eq!(stats.by_status["Paid"].count, 2);
        assert_eq!(stats.by_status["Paid"].paid, Decimal::new(125_25, 2));
        assert_eq!(stats.by_insurer["Acme"].billed, Decimal::new(300_00, 2));
        assert_eq!(stats.by_insurer.keys().collect::<Vec<_>>(), vec!["Acme", "Blue Shield"]);
    }

    #[test]
    fn should_handle_empty_portfolio() {
        let stats = compute_stats(&[], &HashSet::new());
        assert_eq!(stats.total_claims, 0);
        assert!(stats.collection_rate.is_zero());
        assert!(stats.by_status.is_empty());
    }
}
