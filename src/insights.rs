// Derived ratios shown next to the raw totals.
use crate::types::{DerivedTotals, Insights};
use crate::util::round_to;
use crate::window::{expected_period_length, WindowKind};

/// Orders per 100 doctor visits, one decimal place; 0 without visits.
pub fn conversion_rate(totals: &DerivedTotals) -> f64 {
    if totals.doctors == 0 {
        return 0.0;
    }
    round_to(totals.orders as f64 / totals.doctors as f64 * 100.0, 1)
}

pub fn avg_order_value(totals: &DerivedTotals) -> f64 {
    if totals.orders == 0 {
        return 0.0;
    }
    totals.value / totals.orders as f64
}

/// All ratios are guarded so empty input yields zeros, never NaN.
pub fn compute_insights(
    totals: &DerivedTotals,
    bucket_count: usize,
    window: WindowKind,
) -> Insights {
    Insights {
        avg_doctors_per_bucket: totals.doctors as f64 / bucket_count.max(1) as f64,
        conversion_rate: conversion_rate(totals),
        avg_order_value: avg_order_value(totals),
        activity_ratio: totals.report_count as f64 / expected_period_length(window) as f64
            * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_totals_give_zero_ratios() {
        let i = compute_insights(&DerivedTotals::default(), 0, WindowKind::Week);
        assert_eq!(i, Insights::default());
        assert!(!i.avg_doctors_per_bucket.is_nan());
    }

    #[test]
    fn ratios_from_totals() {
        let totals = DerivedTotals {
            doctors: 30,
            orders: 4,
            value: 1500.0,
            report_count: 7,
            ..DerivedTotals::default()
        };
        let i = compute_insights(&totals, 3, WindowKind::Week);
        assert_eq!(i.avg_doctors_per_bucket, 10.0);
        assert_eq!(i.conversion_rate, 13.3);
        assert_eq!(i.avg_order_value, 375.0);
        assert_eq!(i.activity_ratio, 100.0);

        let quarter = compute_insights(&totals, 3, WindowKind::Quarter);
        assert!((quarter.activity_ratio - 7.0 / 90.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn orders_without_visits_do_not_divide_by_zero() {
        let totals = DerivedTotals {
            orders: 2,
            value: 50.0,
            ..DerivedTotals::default()
        };
        let i = compute_insights(&totals, 0, WindowKind::Month);
        assert_eq!(i.conversion_rate, 0.0);
        assert_eq!(i.avg_order_value, 25.0);
        assert_eq!(i.avg_doctors_per_bucket, 0.0);
    }
}
