//! End-to-end tests: services wired to the in-memory repositories.

use std::sync::Arc;

use chrono::NaiveDate;

use tallybook_core::amortizations::{amortize, AmortInterval, Amortization, AmortizationService};
use tallybook_core::query::{
    DateRange, DetailQueryAtom, FundDirection, Query, VoucherQueryAtom,
};
use tallybook_core::subtotal::{
    AggregationKind, GatherKind, SubtotalKey, SubtotalLevel, SubtotalSpec,
};
use tallybook_core::vouchers::{
    Voucher, VoucherDetail, VoucherService, VoucherServiceTrait, VoucherType,
};
use tallybook_storage_memory::{MemoryAmortizationRepository, MemoryVoucherRepository};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn detail(title: i32, content: Option<&str>, fund: Option<f64>) -> VoucherDetail {
    VoucherDetail {
        user: "book".to_string(),
        currency: "BASE".to_string(),
        title,
        sub_title: None,
        content: content.map(str::to_string),
        fund,
        remark: None,
    }
}

fn voucher(day: NaiveDate, details: Vec<VoucherDetail>) -> Voucher {
    Voucher {
        id: None,
        date: Some(day),
        vtype: VoucherType::Ordinary,
        currency: "BASE".to_string(),
        remark: None,
        details,
    }
}

fn voucher_service() -> VoucherService {
    VoucherService::new(Arc::new(MemoryVoucherRepository::new()))
}

#[tokio::test]
async fn upsert_assigns_id_and_resolves_plug() {
    let service = voucher_service();
    let stored = service
        .upsert_voucher(voucher(
            date(2024, 1, 5),
            vec![
                detail(6602, Some("rent"), Some(800.0)),
                detail(1001, None, None),
            ],
        ))
        .await
        .unwrap();
    assert!(stored.id.is_some());
    assert!(stored.is_balanced());

    let read_back = service.get_voucher(stored.id.as_deref().unwrap()).unwrap();
    let cash_leg = read_back
        .unwrap()
        .details
        .iter()
        .find(|d| d.title == 1001)
        .cloned()
        .unwrap();
    assert!((cash_leg.fund.unwrap() + 800.0).abs() < 1e-9);
}

#[tokio::test]
async fn select_by_compound_query() {
    let service = voucher_service();
    for (day, title, fund) in [
        (date(2024, 1, 5), 6602, 800.0),
        (date(2024, 1, 20), 6602, 120.0),
        (date(2024, 2, 3), 6401, 75.0),
    ] {
        service
            .upsert_voucher(voucher(
                day,
                vec![detail(title, None, Some(fund)), detail(1001, None, None)],
            ))
            .await
            .unwrap();
    }

    let january_expenses = Query::intersect(vec![
        Query::atom(VoucherQueryAtom {
            range: DateRange::between(date(2024, 1, 1), date(2024, 1, 31)),
            ..Default::default()
        }),
        Query::atom(VoucherQueryAtom {
            details: Query::atom(DetailQueryAtom {
                title: Some(6602),
                direction: FundDirection::Debit,
                ..Default::default()
            }),
            ..Default::default()
        }),
    ]);
    let matched = service.select_vouchers(&january_expenses).unwrap();
    assert_eq!(matched.len(), 2);

    let everything_else = Query::subtract(Query::All, january_expenses);
    let rest = service.select_vouchers(&everything_else).unwrap();
    assert_eq!(rest.len(), 1);
}

#[tokio::test]
async fn subtotal_pipeline_groups_and_sums() {
    let service = voucher_service();
    for (day, title, fund) in [
        (date(2024, 1, 5), 6602, 800.0),
        (date(2024, 1, 20), 6602, 120.0),
        (date(2024, 2, 3), 6602, 75.0),
    ] {
        service
            .upsert_voucher(voucher(
                day,
                vec![detail(title, None, Some(fund)), detail(1001, None, None)],
            ))
            .await
            .unwrap();
    }

    let spec = SubtotalSpec {
        levels: vec![SubtotalLevel::Month],
        aggregation: AggregationKind::None,
        gather: GatherKind::All,
    };
    let expense_legs = Query::atom(DetailQueryAtom {
        title: Some(6602),
        ..Default::default()
    });
    let root = service
        .subtotal(&Query::All, &expense_legs, &spec)
        .unwrap();
    assert!((root.fund - 995.0).abs() < 1e-9);
    assert_eq!(root.children.len(), 2);
    assert_eq!(
        root.children[0].key,
        Some(SubtotalKey::Date(Some(date(2024, 1, 1))))
    );
    assert!((root.children[0].fund - 920.0).abs() < 1e-9);
}

#[tokio::test]
async fn delete_by_query_removes_matches() {
    let service = voucher_service();
    for day in [date(2024, 1, 5), date(2024, 2, 5)] {
        service
            .upsert_voucher(voucher(
                day,
                vec![detail(6602, None, Some(10.0)), detail(1001, None, None)],
            ))
            .await
            .unwrap();
    }
    let january = Query::atom(VoucherQueryAtom {
        range: DateRange::between(date(2024, 1, 1), date(2024, 1, 31)),
        ..Default::default()
    });
    let removed = service.delete_vouchers(&january).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(service.select_vouchers(&Query::All).unwrap().len(), 1);
}

#[tokio::test]
async fn amortization_full_cycle() {
    let vouchers: Arc<VoucherService> = Arc::new(voucher_service());
    let amortizations = AmortizationService::new(
        Arc::new(MemoryAmortizationRepository::new()),
        vouchers.clone(),
    );

    let mut amort = Amortization {
        id: None,
        user: "book".to_string(),
        name: Some("hosting".to_string()),
        date: Some(date(2024, 1, 1)),
        value: 360.0,
        total_days: 91, // through 2024-03-31
        interval: AmortInterval::LastDayOfMonth,
        template: Voucher {
            id: None,
            date: None,
            vtype: VoucherType::Amortization,
            currency: "BASE".to_string(),
            remark: None,
            details: vec![
                detail(6602, Some("hosting"), Some(1.0)),
                detail(1123, Some("hosting"), Some(-1.0)),
            ],
        },
        remark: None,
        schedule: Vec::new(),
    };
    amortize(&mut amort).unwrap();
    assert_eq!(amort.schedule.len(), 3);
    let mut amort = amortizations.upsert_amortization(amort).await.unwrap();

    // Generate a voucher per period
    let failures = amortizations
        .update(&mut amort, &DateRange::unbounded(), false, false)
        .await
        .unwrap();
    assert!(failures.is_empty());
    let generated = vouchers.select_vouchers(&Query::All).unwrap();
    assert_eq!(generated.len(), 3);
    let booked: f64 = generated
        .iter()
        .flat_map(|v| &v.details)
        .filter(|d| d.title == 6602)
        .filter_map(|d| d.fund)
        .sum();
    assert!((booked - 360.0).abs() < 1e-6);

    // Idempotent second pass
    let failures = amortizations
        .update(&mut amort, &DateRange::unbounded(), false, false)
        .await
        .unwrap();
    assert!(failures.is_empty());
    assert_eq!(vouchers.select_vouchers(&Query::All).unwrap().len(), 3);

    // The stored entity reflects the links
    let reloaded = amortizations
        .get_amortization(amort.id.unwrap())
        .unwrap()
        .unwrap();
    assert!(reloaded
        .schedule
        .iter()
        .all(|item| item.core.voucher_id.is_some()));
}
