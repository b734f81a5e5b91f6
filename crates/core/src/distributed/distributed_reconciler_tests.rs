//! Tests for the shared reconciliation rules.

#[cfg(test)]
mod tests {
    use crate::distributed::{
        bind_candidates, reconcile_voucher, scale_template, ReconcileOutcome,
    };
    use crate::vouchers::{Voucher, VoucherDetail, VoucherType};
    use chrono::NaiveDate;

    // ==================== scale_template Tests ====================

    #[test]
    fn test_scale_two_leg_template() {
        let template = create_test_voucher(vec![
            detail(6602, Some(1.0)),
            detail(1123, Some(-1.0)),
        ]);
        let expected = scale_template(&template, 250.0);
        assert_eq!(expected.len(), 2);
        assert!((expected[0].1 - 250.0).abs() < 1e-9);
        assert!((expected[1].1 + 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_split_template_preserves_proportions() {
        let template = create_test_voucher(vec![
            detail(6602, Some(3.0)),
            detail(6603, Some(1.0)),
            detail(1123, Some(-4.0)),
        ]);
        let expected = scale_template(&template, 100.0);
        assert!((expected[0].1 - 75.0).abs() < 1e-9);
        assert!((expected[1].1 - 25.0).abs() < 1e-9);
        assert!((expected[2].1 + 100.0).abs() < 1e-9);
    }

    // ==================== reconcile_voucher Tests ====================

    #[test]
    fn test_reconcile_unchanged_when_funds_match() {
        let template = create_test_voucher(vec![
            detail(6602, Some(1.0)),
            detail(1123, Some(-1.0)),
        ]);
        let expected = scale_template(&template, 50.0);
        let mut voucher = create_test_voucher(vec![
            detail(6602, Some(50.0)),
            detail(1123, Some(-50.0)),
        ]);
        assert_eq!(
            reconcile_voucher(&mut voucher, &expected),
            ReconcileOutcome::Unchanged
        );
    }

    #[test]
    fn test_reconcile_adjusts_divergent_leg_only() {
        let template = create_test_voucher(vec![
            detail(6602, Some(1.0)),
            detail(1123, Some(-1.0)),
        ]);
        let expected = scale_template(&template, 50.0);
        let mut voucher = create_test_voucher(vec![
            detail(6602, Some(49.0)),
            detail(1123, Some(-50.0)),
        ]);
        assert_eq!(
            reconcile_voucher(&mut voucher, &expected),
            ReconcileOutcome::Modified
        );
        assert_eq!(voucher.details[0].fund, Some(50.0));
        assert_eq!(voucher.details[1].fund, Some(-50.0));
    }

    #[test]
    fn test_reconcile_adds_missing_leg_for_nonzero_amount() {
        let template = create_test_voucher(vec![
            detail(6602, Some(1.0)),
            detail(1123, Some(-1.0)),
        ]);
        let expected = scale_template(&template, 50.0);
        let mut voucher = create_test_voucher(vec![detail(6602, Some(50.0))]);
        assert_eq!(
            reconcile_voucher(&mut voucher, &expected),
            ReconcileOutcome::Modified
        );
        assert_eq!(voucher.details.len(), 2);
        assert_eq!(voucher.details[1].fund, Some(-50.0));
    }

    #[test]
    fn test_reconcile_ambiguous_leaves_voucher_untouched() {
        let template = create_test_voucher(vec![detail(6602, Some(1.0))]);
        let expected = scale_template(&template, 50.0);
        // Two stored legs share the template shape
        let mut voucher = create_test_voucher(vec![
            detail(6602, Some(20.0)),
            detail(6602, Some(30.0)),
        ]);
        let before = serde_json::to_string(&voucher).unwrap();
        assert_eq!(
            reconcile_voucher(&mut voucher, &expected),
            ReconcileOutcome::Ambiguous
        );
        assert_eq!(serde_json::to_string(&voucher).unwrap(), before);
    }

    // ==================== bind_candidates Tests ====================

    #[test]
    fn test_unique_candidate_binds() {
        let candidates = vec![dated_voucher(2024, 1, 31)];
        let open = vec![(0, date(2024, 1, 31)), (1, date(2024, 2, 29))];
        assert_eq!(bind_candidates(&candidates, &open), vec![Some(0)]);
    }

    #[test]
    fn test_two_candidates_one_slot_both_ambiguous() {
        let candidates = vec![dated_voucher(2024, 1, 31), dated_voucher(2024, 1, 31)];
        let open = vec![(0, date(2024, 1, 31))];
        assert_eq!(bind_candidates(&candidates, &open), vec![None, None]);
    }

    #[test]
    fn test_candidate_matching_two_slots_is_ambiguous() {
        let candidates = vec![dated_voucher(2024, 1, 31)];
        let open = vec![(0, date(2024, 1, 31)), (1, date(2024, 1, 31))];
        assert_eq!(bind_candidates(&candidates, &open), vec![None]);
    }

    #[test]
    fn test_no_matching_slot_stays_unbound() {
        let candidates = vec![dated_voucher(2024, 3, 31)];
        let open = vec![(0, date(2024, 1, 31))];
        assert_eq!(bind_candidates(&candidates, &open), vec![None]);
    }

    // ==================== Helper Functions ====================

    fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn detail(title: i32, fund: Option<f64>) -> VoucherDetail {
        VoucherDetail {
            user: "book".to_string(),
            currency: "BASE".to_string(),
            title,
            sub_title: None,
            content: None,
            fund,
            remark: None,
        }
    }

    fn create_test_voucher(details: Vec<VoucherDetail>) -> Voucher {
        Voucher {
            id: None,
            date: date(2024, 1, 31),
            vtype: VoucherType::Amortization,
            currency: "BASE".to_string(),
            remark: None,
            details,
        }
    }

    fn dated_voucher(year: i32, month: u32, day: u32) -> Voucher {
        Voucher {
            date: date(year, month, day),
            ..create_test_voucher(vec![detail(6602, Some(1.0))])
        }
    }
}
