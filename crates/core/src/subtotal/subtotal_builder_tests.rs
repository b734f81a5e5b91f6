//! Tests for the recursive subtotal builder.

#[cfg(test)]
mod tests {
    use crate::subtotal::{
        AggregationKind, Balance, GatherKind, SubtotalBuilder, SubtotalKey, SubtotalLevel,
        SubtotalNode, SubtotalSpec,
    };
    use chrono::NaiveDate;
    use proptest::prelude::*;

    // ==================== Grouping Tests ====================

    #[test]
    fn test_group_by_title_then_month() {
        let rows = vec![
            row(1001, date(2024, 1, 5), 10.0),
            row(1001, date(2024, 1, 20), 5.0),
            row(1001, date(2024, 2, 3), 7.0),
            row(6602, date(2024, 1, 8), -22.0),
        ];
        let spec = spec(vec![SubtotalLevel::Title, SubtotalLevel::Month]);
        let root = SubtotalBuilder::new(&spec).build(rows);

        assert_eq!(root.children.len(), 2);
        let by_1001 = &root.children[0];
        assert_eq!(by_1001.key, Some(SubtotalKey::Title(Some(1001))));
        assert_eq!(by_1001.children.len(), 2); // Jan, Feb
        assert_eq!(
            by_1001.children[0].key,
            Some(SubtotalKey::Date(Some(date(2024, 1, 1))))
        );
        assert!((by_1001.children[0].fund - 15.0).abs() < 1e-9);
        assert!((by_1001.fund - 22.0).abs() < 1e-9);
        assert!((root.fund - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_week_bucketing_starts_monday() {
        // 2024-01-03 is a Wednesday; its week starts 2024-01-01.
        let rows = vec![row(1001, date(2024, 1, 3), 4.0)];
        let spec = spec(vec![SubtotalLevel::Week]);
        let root = SubtotalBuilder::new(&spec).build(rows);
        assert_eq!(
            root.children[0].key,
            Some(SubtotalKey::Date(Some(date(2024, 1, 1))))
        );
    }

    #[test]
    fn test_undated_rows_group_separately() {
        let rows = vec![
            Balance {
                date: None,
                fund: 3.0,
                ..row(1001, date(2024, 1, 1), 0.0)
            },
            row(1001, date(2024, 1, 1), 4.0),
        ];
        let spec = spec(vec![SubtotalLevel::Day]);
        let root = SubtotalBuilder::new(&spec).build(rows);
        assert_eq!(root.children.len(), 2);
        // Undated bucket orders first
        assert_eq!(root.children[0].key, Some(SubtotalKey::Date(None)));
    }

    // ==================== Total Preservation ====================

    #[test]
    fn test_internal_nodes_sum_children() {
        let rows = vec![
            row(1001, date(2024, 1, 5), 1.5),
            row(1001, date(2024, 2, 5), 2.5),
            row(6602, date(2024, 1, 5), -1.0),
            row(6602, date(2024, 3, 5), 4.0),
        ];
        let spec = spec(vec![SubtotalLevel::Title, SubtotalLevel::Month]);
        let root = SubtotalBuilder::new(&spec).build(rows);
        assert_sums_consistent(&root);
        assert!((root.fund - 7.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_total_preservation(
            funds in proptest::collection::vec(-100.0f64..100.0, 0..40),
        ) {
            let rows: Vec<Balance> = funds
                .iter()
                .enumerate()
                .map(|(i, fund)| row(
                    1000 + (i % 3) as i32,
                    date(2024, 1 + (i % 12) as u32, 1 + (i % 28) as u32),
                    *fund,
                ))
                .collect();
            let total: f64 = funds.iter().sum();
            let spec = spec(vec![SubtotalLevel::Title, SubtotalLevel::Month, SubtotalLevel::Day]);
            let root = SubtotalBuilder::new(&spec).build(rows);
            prop_assert!((root.fund - total).abs() < 1e-6);
            assert_sums_consistent(&root);
        }
    }

    // ==================== Gathering Tests ====================

    #[test]
    fn test_non_zero_drops_zero_rows() {
        let rows = vec![
            row(1001, date(2024, 1, 1), 5.0),
            row(1002, date(2024, 1, 1), 0.0),
        ];
        let mut spec = spec(vec![SubtotalLevel::Title]);
        spec.gather = GatherKind::NonZero;
        let root = SubtotalBuilder::new(&spec).build(rows);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].key, Some(SubtotalKey::Title(Some(1001))));
    }

    #[test]
    fn test_non_zero_exempted_under_changed_day() {
        // The zero row's day must still appear in the running series.
        let rows = vec![
            row(1001, date(2024, 1, 1), 5.0),
            row(1001, date(2024, 1, 2), 0.0),
        ];
        let mut s = spec(vec![]);
        s.gather = GatherKind::NonZero;
        s.aggregation = AggregationKind::ChangedDay;
        let root = SubtotalBuilder::new(&s).build(rows);
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_count_gathering() {
        let rows = vec![
            row(1001, date(2024, 1, 1), 5.0),
            row(1001, date(2024, 1, 2), -5.0),
            row(1002, date(2024, 1, 3), 0.0),
        ];
        let mut s = spec(vec![SubtotalLevel::Title]);
        s.gather = GatherKind::Count;
        let root = SubtotalBuilder::new(&s).build(rows);
        assert!((root.fund - 3.0).abs() < 1e-9);
        assert!((root.children[0].fund - 2.0).abs() < 1e-9);
    }

    // ==================== Running Series Tests ====================

    #[test]
    fn test_changed_day_emits_cumulative_per_transaction_day() {
        let rows = vec![
            row(1001, date(2024, 1, 1), 10.0),
            row(1001, date(2024, 1, 1), 5.0),
            row(1001, date(2024, 1, 7), -3.0),
        ];
        let mut s = spec(vec![]);
        s.aggregation = AggregationKind::ChangedDay;
        let root = SubtotalBuilder::new(&s).build(rows);
        assert_eq!(root.children.len(), 2);
        assert!((root.children[0].fund - 15.0).abs() < 1e-9);
        assert!((root.children[1].fund - 12.0).abs() < 1e-9);
        assert!((root.fund - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_every_day_density() {
        let rows = vec![
            row(1001, date(2024, 1, 2), 10.0),
            row(1001, date(2024, 1, 5), 2.0),
        ];
        let mut s = spec(vec![]);
        s.aggregation = AggregationKind::EveryDay {
            start: Some(date(2024, 1, 1)),
            end: Some(date(2024, 1, 7)),
        };
        let root = SubtotalBuilder::new(&s).build(rows);
        // Exactly end - start + 1 nodes
        assert_eq!(root.children.len(), 7);
        let funds: Vec<f64> = root.children.iter().map(|c| c.fund).collect();
        assert_eq!(funds, vec![0.0, 10.0, 10.0, 10.0, 12.0, 12.0, 12.0]);
    }

    #[test]
    fn test_every_day_open_ends_default_to_transaction_span() {
        let rows = vec![
            row(1001, date(2024, 1, 3), 1.0),
            row(1001, date(2024, 1, 5), 1.0),
        ];
        let mut s = spec(vec![]);
        s.aggregation = AggregationKind::EveryDay {
            start: None,
            end: None,
        };
        let root = SubtotalBuilder::new(&s).build(rows);
        assert_eq!(root.children.len(), 3); // Jan 3, 4, 5
        assert_eq!(
            root.children[0].key,
            Some(SubtotalKey::Date(Some(date(2024, 1, 3))))
        );
    }

    #[test]
    fn test_every_day_counts_transactions_before_window() {
        let rows = vec![
            row(1001, date(2023, 12, 20), 8.0),
            row(1001, date(2024, 1, 2), 1.0),
        ];
        let mut s = spec(vec![]);
        s.aggregation = AggregationKind::EveryDay {
            start: Some(date(2024, 1, 1)),
            end: Some(date(2024, 1, 3)),
        };
        let root = SubtotalBuilder::new(&s).build(rows);
        let funds: Vec<f64> = root.children.iter().map(|c| c.fund).collect();
        assert_eq!(funds, vec![8.0, 9.0, 9.0]);
    }

    // ==================== Helper Functions ====================

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn row(title: i32, date: NaiveDate, fund: f64) -> Balance {
        Balance {
            date: Some(date),
            title: Some(title),
            sub_title: None,
            content: None,
            remark: None,
            currency: Some("BASE".to_string()),
            user: Some("book".to_string()),
            value: None,
            fund,
        }
    }

    fn spec(levels: Vec<SubtotalLevel>) -> SubtotalSpec {
        SubtotalSpec {
            levels,
            aggregation: AggregationKind::None,
            gather: GatherKind::All,
        }
    }

    /// Recursively asserts every internal node's fund equals the sum of its
    /// children's funds (only meaningful under plain-sum aggregation).
    fn assert_sums_consistent(node: &SubtotalNode) {
        if node.children.is_empty() {
            return;
        }
        let sum: f64 = node.children.iter().map(|c| c.fund).sum();
        assert!(
            (node.fund - sum).abs() < 1e-6,
            "node fund {} != children sum {}",
            node.fund,
            sum
        );
        for child in &node.children {
            assert_sums_consistent(child);
        }
    }
}
