// Metrics aggregation engine.
//
// Every function here is a pure transformation of the records it is handed:
// no I/O, no shared state. Rounding is left to the caller so results stay at
// full precision.
use crate::types::{
    ratio_pct, DemandRecord, FulfillmentSummary, Keyed, OverallTotals, UtilizationRecord,
    UtilizationSummary,
};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Records whose key field equals `group_key`, in input order.
pub fn filter_by_group<R: Keyed + Clone>(records: &[R], group_key: &str) -> Vec<R> {
    records
        .iter()
        .filter(|r| r.group_key() == group_key)
        .cloned()
        .collect()
}

/// Records whose key field is one of `keys`, in input order.
pub fn filter_by_groups<R, S>(records: &[R], keys: &[S]) -> Vec<R>
where
    R: Keyed + Clone,
    S: AsRef<str>,
{
    if keys.is_empty() {
        return Vec::new();
    }
    let wanted: HashSet<&str> = keys.iter().map(|k| k.as_ref()).collect();
    records
        .iter()
        .filter(|r| wanted.contains(r.group_key()))
        .cloned()
        .collect()
}

/// Distinct key values in order of first occurrence.
pub fn distinct_keys<R: Keyed>(records: &[R]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    records
        .iter()
        .map(|r| r.group_key())
        .filter(|k| seen.insert(*k))
        .map(str::to_string)
        .collect()
}

/// Sums `(numerator, denominator)` per key, keeping first-seen key order.
fn group_sums<R, F>(records: &[R], mut values: F) -> Vec<(String, f64, f64)>
where
    R: Keyed,
    F: FnMut(&R) -> (f64, f64),
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, f64, f64)> = Vec::new();
    for r in records {
        let key = r.group_key();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key.to_string(), 0.0, 0.0));
            groups.len() - 1
        });
        let (num, den) = values(r);
        let e = &mut groups[slot];
        e.1 += num;
        e.2 += den;
    }
    groups
}

pub fn summarize_utilization(records: &[UtilizationRecord]) -> Vec<UtilizationSummary> {
    group_sums(records, |r| (r.quantity, r.capacity()))
        .into_iter()
        .map(|(line, total_production, total_capacity)| {
            let utilization_pct = ratio_pct(total_production, total_capacity);
            if utilization_pct.is_none() {
                debug!("line {line}: zero total capacity, utilization undefined");
            }
            UtilizationSummary {
                line,
                total_production,
                total_capacity,
                utilization_pct,
            }
        })
        .collect()
}

pub fn summarize_fulfillment(records: &[DemandRecord]) -> Vec<FulfillmentSummary> {
    group_sums(records, |r| (r.optimized_plan_quantity, r.sale_demand))
        .into_iter()
        .map(|(product, total_plan, total_demand)| {
            let fulfillment_pct = ratio_pct(total_plan, total_demand);
            if fulfillment_pct.is_none() {
                debug!("product {product}: zero total demand, fulfillment undefined");
            }
            FulfillmentSummary {
                product,
                total_plan,
                total_demand,
                fulfillment_pct,
            }
        })
        .collect()
}

pub fn overall_utilization(summaries: &[UtilizationSummary]) -> OverallTotals {
    let numerator: f64 = summaries.iter().map(|s| s.total_production).sum();
    let denominator: f64 = summaries.iter().map(|s| s.total_capacity).sum();
    OverallTotals {
        groups: summaries.len(),
        numerator,
        denominator,
        pct: ratio_pct(numerator, denominator),
    }
}

pub fn overall_fulfillment(summaries: &[FulfillmentSummary]) -> OverallTotals {
    let numerator: f64 = summaries.iter().map(|s| s.total_plan).sum();
    let denominator: f64 = summaries.iter().map(|s| s.total_demand).sum();
    OverallTotals {
        groups: summaries.len(),
        numerator,
        denominator,
        pct: ratio_pct(numerator, denominator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn util(line: &str, quantity: f64, days: f64, cap: f64) -> UtilizationRecord {
        UtilizationRecord {
            line: line.to_string(),
            month: "2024-01".to_string(),
            month_label: "January".to_string(),
            quantity,
            total_working_days: days,
            daily_capacity: cap,
        }
    }

    fn demand(product: &str, plan: f64, sale: f64) -> DemandRecord {
        DemandRecord {
            product: product.to_string(),
            month: "2024-01".to_string(),
            optimized_plan_quantity: plan,
            sale_demand: sale,
        }
    }

    #[test]
    fn utilization_summary_matches_worked_example() {
        let records = vec![util("L1", 80.0, 20.0, 5.0), util("L1", 40.0, 10.0, 5.0)];
        let summary = summarize_utilization(&records);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].line, "L1");
        assert_eq!(summary[0].total_production, 120.0);
        assert_eq!(summary[0].total_capacity, 150.0);
        assert_eq!(summary[0].utilization_pct, Some(80.0));
    }

    #[test]
    fn fulfillment_summary_matches_worked_example() {
        let records = vec![demand("P1", 90.0, 100.0), demand("P1", 10.0, 50.0)];
        let summary = summarize_fulfillment(&records);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].total_plan, 100.0);
        assert_eq!(summary[0].total_demand, 150.0);
        let pct = summary[0].fulfillment_pct.unwrap();
        assert!((pct - 66.6667).abs() < 1e-3);
    }

    #[test]
    fn zero_capacity_group_has_undefined_ratio_but_valid_totals() {
        let records = vec![
            util("L1", 10.0, 0.0, 5.0),
            util("L2", 50.0, 10.0, 10.0),
            util("L1", 5.0, 0.0, 8.0),
        ];
        let summary = summarize_utilization(&records);
        assert_eq!(summary[0].line, "L1");
        assert_eq!(summary[0].total_production, 15.0);
        assert_eq!(summary[0].total_capacity, 0.0);
        assert_eq!(summary[0].utilization_pct, None);
        assert_eq!(summary[1].utilization_pct, Some(50.0));
    }

    #[test]
    fn zero_demand_group_has_undefined_ratio() {
        let summary = summarize_fulfillment(&[demand("P9", 12.0, 0.0)]);
        assert_eq!(summary[0].total_plan, 12.0);
        assert_eq!(summary[0].fulfillment_pct, None);
    }

    #[test]
    fn groups_follow_first_occurrence_order() {
        let records = vec![
            demand("B", 1.0, 1.0),
            demand("A", 1.0, 1.0),
            demand("B", 1.0, 1.0),
            demand("C", 1.0, 1.0),
        ];
        let keys: Vec<String> = summarize_fulfillment(&records)
            .into_iter()
            .map(|s| s.product)
            .collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
        assert_eq!(distinct_keys(&records), vec!["B", "A", "C"]);
    }

    #[test]
    fn filter_by_group_preserves_order_and_handles_unknown_key() {
        let records = vec![
            util("L1", 1.0, 1.0, 1.0),
            util("L2", 2.0, 1.0, 1.0),
            util("L1", 3.0, 1.0, 1.0),
        ];
        let l1 = filter_by_group(&records, "L1");
        assert_eq!(l1.len(), 2);
        assert_eq!(l1[0].quantity, 1.0);
        assert_eq!(l1[1].quantity, 3.0);
        assert!(filter_by_group(&records, "L7").is_empty());
    }

    #[test]
    fn filter_by_groups_membership() {
        let records = vec![
            demand("A", 1.0, 1.0),
            demand("B", 2.0, 1.0),
            demand("C", 3.0, 1.0),
        ];
        let empty: [&str; 0] = [];
        assert!(filter_by_groups(&records, &empty).is_empty());
        let picked = filter_by_groups(&records, &["C", "A"]);
        assert_eq!(picked, vec![records[0].clone(), records[2].clone()]);
        let all = filter_by_groups(&records, &distinct_keys(&records));
        assert_eq!(all, records);
    }

    #[test]
    fn overall_totals_roll_up_groups() {
        let records = vec![util("L1", 80.0, 20.0, 5.0), util("L2", 20.0, 10.0, 10.0)];
        let totals = overall_utilization(&summarize_utilization(&records));
        assert_eq!(totals.groups, 2);
        assert_eq!(totals.numerator, 100.0);
        assert_eq!(totals.denominator, 200.0);
        assert_eq!(totals.pct, Some(50.0));

        let totals = overall_fulfillment(&[]);
        assert_eq!(totals.groups, 0);
        assert_eq!(totals.pct, None);
    }
}
