use super::*;
use rstest::rstest;
use rust_decimal_macros::dec;

#[test]
fn test_days_constants() {
    assert_eq!(Days::ZERO.amount(), dec!(0));
    assert_eq!(Days::HALF.amount(), dec!(0.5));
    assert_eq!(Days::ONE.amount(), dec!(1));
}

#[rstest]
#[case(dec!(10), dec!(5), dec!(5))]
#[case(dec!(3), dec!(0.5), dec!(2.5))]
#[case(dec!(2), dec!(5), dec!(0))]
#[case(dec!(0), dec!(1), dec!(0))]
#[case(dec!(4), dec!(4), dec!(0))]
fn test_saturating_sub_floors_at_zero(
    #[case] balance: Decimal,
    #[case] debit: Decimal,
    #[case] expected: Decimal,
) {
    assert_eq!(
        Days::new(balance).saturating_sub(Days::new(debit)),
        Days::new(expected)
    );
}

#[test]
fn test_checked_add() {
    assert_eq!(
        Days::new(dec!(2.5)).checked_add(Days::HALF),
        Some(Days::whole(3))
    );
    assert_eq!(Days::new(Decimal::MAX).checked_add(Days::ONE), None);
}

#[test]
fn test_sign_helpers() {
    assert!(Days::ZERO.is_zero());
    assert!(Days::HALF.is_positive());
    assert!(Days::new(dec!(-1)).is_negative());
    assert_eq!(Days::new(dec!(-1)).non_negative(), Days::ZERO);
    assert_eq!(Days::HALF.non_negative(), Days::HALF);
}

#[test]
fn test_sum() {
    let parts = [Days::HALF, Days::ONE, Days::whole(3)];
    let total: Days = parts.iter().sum();
    assert_eq!(total, Days::new(dec!(4.5)));
}

#[test]
fn test_display_is_normalized() {
    assert_eq!(Days::new(dec!(5.00)).to_string(), "5");
    assert_eq!(Days::new(dec!(2.50)).to_string(), "2.5");
    assert_eq!(Days::new(dec!(1.26)).to_string(), "1.3");
}

#[test]
fn test_serde_is_transparent() {
    let json = serde_json::to_string(&Days::new(dec!(2.5))).unwrap();
    assert_eq!(json, "\"2.5\"");

    let back: Days = serde_json::from_str("\"0.5\"").unwrap();
    assert_eq!(back, Days::HALF);
}
