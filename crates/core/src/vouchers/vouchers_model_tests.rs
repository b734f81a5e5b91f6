//! Tests for voucher domain models: balancing, canonical order, templates.

#[cfg(test)]
mod tests {
    use crate::vouchers::{Voucher, VoucherDetail, VoucherType};
    use chrono::NaiveDate;

    // ==================== Balancing Tests ====================

    #[test]
    fn test_balance_resolves_single_plug() {
        let mut voucher = create_test_voucher(vec![
            detail(1001, Some(100.0)),
            detail(6602, Some(20.0)),
            detail(2241, None),
        ]);
        voucher.balance().unwrap();
        assert_eq!(voucher.details[2].fund, Some(-120.0));
        assert!(voucher.is_balanced());
    }

    #[test]
    fn test_balance_accepts_already_balanced() {
        let mut voucher =
            create_test_voucher(vec![detail(1001, Some(50.0)), detail(6602, Some(-50.0))]);
        voucher.balance().unwrap();
        assert!(voucher.is_balanced());
    }

    #[test]
    fn test_balance_rejects_unbalanced_without_plug() {
        let mut voucher =
            create_test_voucher(vec![detail(1001, Some(50.0)), detail(6602, Some(-49.0))]);
        assert!(voucher.balance().is_err());
    }

    #[test]
    fn test_balance_rejects_multiple_plugs() {
        let mut voucher = create_test_voucher(vec![
            detail(1001, Some(50.0)),
            detail(6602, None),
            detail(2241, None),
        ]);
        assert!(voucher.balance().is_err());
    }

    #[test]
    fn test_balance_rejects_empty_voucher() {
        let mut voucher = create_test_voucher(vec![]);
        assert!(voucher.balance().is_err());
    }

    #[test]
    fn test_balance_tolerates_rounding_residue() {
        let mut voucher = create_test_voucher(vec![
            detail(1001, Some(0.1 + 0.2)),
            detail(6602, Some(-0.3)),
        ]);
        voucher.balance().unwrap();
        assert!(voucher.is_balanced());
    }

    // ==================== Canonicalization Tests ====================

    #[test]
    fn test_canonicalize_orders_details() {
        let mut voucher = create_test_voucher(vec![
            detail(6602, Some(-30.0)),
            detail(1001, Some(20.0)),
            detail(1001, Some(10.0)),
        ]);
        voucher.canonicalize();
        let titles: Vec<i32> = voucher.details.iter().map(|d| d.title).collect();
        assert_eq!(titles, vec![1001, 1001, 6602]);
        // Equal titles tie-break on fund
        assert_eq!(voucher.details[0].fund, Some(10.0));
        assert_eq!(voucher.details[1].fund, Some(20.0));
    }

    #[test]
    fn test_canonicalize_is_stable_under_repeat() {
        let mut voucher = create_test_voucher(vec![
            detail(6602, Some(-30.0)),
            detail(1001, Some(30.0)),
        ]);
        voucher.canonicalize();
        let first = serde_json::to_string(&voucher).unwrap();
        voucher.canonicalize();
        let second = serde_json::to_string(&voucher).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_canonicalize_uppercases_currencies() {
        let mut voucher = create_test_voucher(vec![VoucherDetail {
            currency: "usd".to_string(),
            ..detail(1001, Some(1.0))
        }]);
        voucher.currency = "usd".to_string();
        voucher.canonicalize();
        assert_eq!(voucher.currency, "USD");
        assert_eq!(voucher.details[0].currency, "USD");
    }

    #[test]
    fn test_structurally_equal_vouchers_serialize_identically() {
        let mut a = create_test_voucher(vec![
            detail(1001, Some(10.0)),
            detail(6602, Some(-10.0)),
        ]);
        let mut b = create_test_voucher(vec![
            detail(6602, Some(-10.0)),
            detail(1001, Some(10.0)),
        ]);
        a.canonicalize();
        b.canonicalize();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    // ==================== Template Matching Tests ====================

    #[test]
    fn test_matches_template_ignores_funds() {
        let template = create_test_voucher(vec![detail(1001, None), detail(6602, None)]);
        let voucher =
            create_test_voucher(vec![detail(6602, Some(-75.0)), detail(1001, Some(75.0))]);
        assert!(voucher.matches_template(&template));
    }

    #[test]
    fn test_matches_template_rejects_extra_leg() {
        let template = create_test_voucher(vec![detail(1001, None), detail(6602, None)]);
        let voucher = create_test_voucher(vec![
            detail(1001, Some(75.0)),
            detail(6602, Some(-70.0)),
            detail(2241, Some(-5.0)),
        ]);
        assert!(!voucher.matches_template(&template));
    }

    #[test]
    fn test_matches_template_rejects_different_content() {
        let template = create_test_voucher(vec![VoucherDetail {
            content: Some("rent".to_string()),
            ..detail(6602, None)
        }]);
        let voucher = create_test_voucher(vec![VoucherDetail {
            content: Some("utilities".to_string()),
            ..detail(6602, Some(10.0))
        }]);
        assert!(!voucher.matches_template(&template));
    }

    // ==================== VoucherType Filter Tests ====================

    #[test]
    fn test_general_filter_excludes_carries() {
        assert!(VoucherType::Ordinary.satisfies(VoucherType::General));
        assert!(VoucherType::Amortization.satisfies(VoucherType::General));
        assert!(VoucherType::Depreciation.satisfies(VoucherType::General));
        assert!(!VoucherType::Carry.satisfies(VoucherType::General));
        assert!(!VoucherType::AnnualCarry.satisfies(VoucherType::General));
    }

    #[test]
    fn test_concrete_filter_requires_exact_type() {
        assert!(VoucherType::Carry.satisfies(VoucherType::Carry));
        assert!(!VoucherType::Ordinary.satisfies(VoucherType::Carry));
        assert!(!VoucherType::Depreciation.satisfies(VoucherType::Devalue));
    }

    // ==================== Serde Tests ====================

    #[test]
    fn test_voucher_round_trip() {
        let mut voucher = create_test_voucher(vec![
            detail(1001, Some(10.0)),
            detail(6602, Some(-10.0)),
        ]);
        voucher.id = Some("abc".to_string());
        voucher.canonicalize();
        let json = serde_json::to_string(&voucher).unwrap();
        let back: Voucher = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id.as_deref(), Some("abc"));
        assert_eq!(back.details.len(), 2);
        assert_eq!(back.details[0].fund, Some(10.0));
    }

    #[test]
    fn test_voucher_type_serialization() {
        assert_eq!(
            serde_json::to_string(&VoucherType::AnnualCarry).unwrap(),
            "\"ANNUAL_CARRY\""
        );
        assert_eq!(
            serde_json::from_str::<VoucherType>("\"DEVALUE\"").unwrap(),
            VoucherType::Devalue
        );
    }

    // ==================== Helper Functions ====================

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
            date: NaiveDate::from_ymd_opt(2024, 3, 15),
            vtype: VoucherType::Ordinary,
            currency: "BASE".to_string(),
            remark: None,
            details,
        }
    }
}
