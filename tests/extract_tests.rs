mod common;

use chrono::{NaiveDate, Weekday};

use pocketplan::extract::amount::{amount_candidates, extract_amount, format_money, to_major, to_minor};
use pocketplan::extract::budget::budget_rule;
use pocketplan::extract::category::split_category_at_merchant;
use pocketplan::extract::datetime::{find_date, find_duration, find_time, resolve_weekday, WeekdayQualifier};
use pocketplan::extract::expense::expense_rule;
use pocketplan::extract::flow::flow_rule;
use pocketplan::intent::{ClockTime, DateHint, EntryKind, Intent};

use common::*;

#[test]
fn test_symbol_amount_beats_bare_numbers() {
    let amount = extract_amount("bought 2 tickets for $30", "USD").unwrap();
    assert_eq!(amount.minor, 3000, "The $-marked amount must win over the bare 2");
    assert_eq!(amount.currency.as_deref(), Some("USD"));

    // even when the bare number comes later
    let amount = extract_amount("€12 lunch for 4 of us", "USD").unwrap();
    assert_eq!(amount.minor, 1200);
    assert_eq!(amount.currency.as_deref(), Some("EUR"));
}

#[test]
fn test_currency_words_and_precision() {
    let amount = extract_amount("paid 20 euros for parking", "USD").unwrap();
    assert_eq!((amount.minor, amount.currency.as_deref()), (2000, Some("EUR")));

    let amount = extract_amount("¥500 ramen", "USD").unwrap();
    assert_eq!((amount.minor, amount.currency.as_deref()), (500, Some("JPY")));

    // bare amounts are read in the default currency
    let amount = extract_amount("1,200 for rent", "JPY").unwrap();
    assert_eq!(amount.minor, 1200);
    assert!(amount.currency.is_none());
}

#[test]
fn test_accented_words_before_amounts() {
    let amount = extract_amount("lunch at café 12", "USD").expect("amount after an accented word");
    assert_eq!((amount.minor, amount.currency.as_deref()), (1200, None));

    let amount = extract_amount("jalapeño eur 12", "USD").unwrap();
    assert_eq!((amount.minor, amount.currency.as_deref()), (1200, Some("EUR")));

    let plan = expense_rule("paid Zoë 40 for pizza", &snapshot()).expect("expense rule should fire");
    let Intent::AddExpense(input) = &plan.intent else { panic!("expected add_expense, got {:?}", plan.intent) };
    assert_eq!(input.amount_minor, Some(4000));
    assert_eq!(input.category.as_deref(), Some("pizza"));
}

#[test]
fn test_huge_durations_stop_at_one_day() {
    let duration = find_duration("block 80000000 hours for focus").expect("duration should be read");
    assert_eq!(duration.minutes, 24 * 60);
}

#[test]
fn test_times_and_durations_are_not_money() {
    assert!(amount_candidates("schedule a 30 minute call at 3pm").is_empty());
    assert!(amount_candidates("split 3 ways").is_empty());
    assert!(amount_candidates("on 10/24").is_empty());
}

#[test]
fn test_minor_units_round_trip() {
    for (major, currency) in [(42.5, "USD"), (0.99, "EUR"), (1200.0, "JPY"), (12.345, "KWD")] {
        assert_eq!(to_major(to_minor(major, currency), currency), major, "{major} {currency} must round-trip");
    }
    assert_eq!(to_minor(42.5, "USD"), 4250);
    assert_eq!(to_minor(1200.0, "JPY"), 1200);
}

#[test]
fn test_money_formatting() {
    assert_eq!(format_money(4250, "USD"), "$42.50");
    assert_eq!(format_money(500, "JPY"), "¥500");
    assert_eq!(format_money(12500, "KWD"), "12.500 KWD");
}

#[test]
fn test_weekday_resolution_from_wednesday() {
    let wed = today();
    assert_eq!(wed.format("%A").to_string(), "Wednesday");

    let next = resolve_weekday(wed, Weekday::Mon, WeekdayQualifier::Next);
    assert!((next - wed).num_days() > 6, "next Monday must be more than six days out");
    assert_eq!(next, NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());

    let this = resolve_weekday(wed, Weekday::Mon, WeekdayQualifier::This);
    assert!((this - wed).num_days() <= 6);
    assert_eq!(this, NaiveDate::from_ymd_opt(2026, 10, 26).unwrap());

    assert_eq!(
        find_date("lunch next monday", wed).map(|m| m.hint),
        Some(DateHint::On(NaiveDate::from_ymd_opt(2026, 11, 2).unwrap()))
    );
    assert_eq!(find_date("call on thursday", wed).map(|m| m.hint), Some(DateHint::Tomorrow));
}

#[test]
fn test_date_forms() {
    let wed = today();
    assert_eq!(find_date("dinner yesterday", wed).map(|m| m.hint), Some(DateHint::Yesterday));
    assert_eq!(
        find_date("paid on 2026-09-30", wed).map(|m| m.hint),
        Some(DateHint::On(NaiveDate::from_ymd_opt(2026, 9, 30).unwrap()))
    );
    assert_eq!(
        find_date("flight on 11/3", wed).map(|m| m.hint),
        Some(DateHint::On(NaiveDate::from_ymd_opt(2026, 11, 3).unwrap()))
    );
    assert_eq!(
        find_date("dentist Dec 5th", wed).map(|m| m.hint),
        Some(DateHint::On(NaiveDate::from_ymd_opt(2026, 12, 5).unwrap()))
    );
    assert!(find_date("add 20 for lunch", wed).is_none());
}

#[test]
fn test_time_and_duration_forms() {
    assert_eq!(find_time("call at 3pm").map(|t| t.time), ClockTime::new(15, 0));
    assert_eq!(find_time("standup 9:30 am").map(|t| t.time), ClockTime::new(9, 30));
    assert_eq!(find_time("lunch at noon").map(|t| t.time), ClockTime::new(12, 0));
    assert_eq!(find_time("sync at 14:15").map(|t| t.time), ClockTime::new(14, 15));
    // bare early hours read as afternoon
    assert_eq!(find_time("meet at 4").map(|t| t.time), ClockTime::new(16, 0));

    assert_eq!(find_duration("a 30 minute call").map(|d| d.minutes), Some(30));
    assert_eq!(find_duration("block 2 hours").map(|d| d.minutes), Some(120));
    assert_eq!(find_duration("an hour and a half").map(|d| d.minutes), Some(90));
    assert_eq!(find_duration("half an hour").map(|d| d.minutes), Some(30));
}

#[test]
fn test_category_at_merchant_split() {
    let slots = split_category_at_merchant("groceries at Trader Joes");
    assert_eq!(slots.category.as_deref(), Some("groceries"));
    assert_eq!(slots.merchant.as_deref(), Some("Trader Joes"));

    let slots = split_category_at_merchant("Fuel");
    assert_eq!(slots.category.as_deref(), Some("gas"));
    assert!(slots.merchant.is_none());
}

#[test]
fn test_unmatched_group_keeps_confidence_low() {
    let snapshot = snapshot_with(vec![roommates()], vec![]);

    let plan = expense_rule("42.50 at Trader Joes for groceries", &snapshot).expect("expense rule should fire");
    let Intent::AddExpense(input) = &plan.intent else { panic!("expected add_expense, got {:?}", plan.intent) };

    assert_eq!(input.amount_minor, Some(4250));
    assert_eq!(input.category.as_deref(), Some("groceries"));
    assert_eq!(input.merchant.as_deref(), Some("Trader Joes"));
    assert!(input.group_id.is_none(), "No group should be matched");
    assert!(plan.confidence <= 0.35, "Unmatched group must cap confidence, got {}", plan.confidence);
    assert!(plan.message.contains("Roommates"), "Message should list the known groups: {}", plan.message);
}

#[test]
fn test_expense_with_group_participants_and_category() {
    let snapshot = snapshot();

    let plan = expense_rule("spent $30 on dinner with Alice in Ski Trip", &snapshot).unwrap();
    let Intent::AddExpense(input) = &plan.intent else { panic!("expected add_expense") };

    assert_eq!(input.amount_minor, Some(3000));
    assert_eq!(input.group_id.as_deref(), Some("g-ski"));
    assert_eq!(input.participant_hints, vec!["Alice"]);
    assert_eq!(input.category.as_deref(), Some("dinner"));
    assert!(plan.confidence >= 0.75, "Matched group plus category should be confident: {}", plan.confidence);
    assert_eq!(plan.message, "Add $30.00 to Ski Trip for dinner?");

    let editable = plan.editable.expect("expense plans are editable");
    assert_eq!(editable.value("group"), Some("Ski Trip"));
    assert_eq!(editable.value("amount"), Some("30.00"));
}

#[test]
fn test_budget_wording_defers_from_expense_rule() {
    let snapshot = snapshot();
    assert!(expense_rule("add 15 to travel budget", &snapshot).is_none());
}

#[test]
fn test_travel_budget_resolves_through_synonyms() {
    let snapshot = snapshot();

    let plan = budget_rule("add 15 to travel budget", &snapshot).expect("budget rule should fire");
    let Intent::AddBudgetEntry(input) = &plan.intent else { panic!("expected add_budget_entry") };

    assert_eq!(input.amount_minor, Some(1500));
    assert_eq!(input.budget_id.as_deref(), Some("b-travel"));
    assert_eq!(input.kind, EntryKind::Expense);
    assert!(plan.confidence >= 0.65, "Resolved hint should be confident: {}", plan.confidence);

    // "vacation" folds to "travel"
    let plan = budget_rule("put 40 in the vacation budget", &snapshot).unwrap();
    let Intent::AddBudgetEntry(input) = &plan.intent else { panic!("expected add_budget_entry") };
    assert_eq!(input.budget_id.as_deref(), Some("b-travel"));
}

#[test]
fn test_income_entry() {
    let snapshot = snapshot_with(vec![roommates()], vec![travel_fund()]);

    let plan = budget_rule("earned 2000 salary", &snapshot).unwrap();
    let Intent::AddBudgetEntry(input) = &plan.intent else { panic!("expected add_budget_entry") };
    assert_eq!(input.kind, EntryKind::Income);
    assert_eq!(input.amount_minor, Some(200000));
    // no hint: the only budget
    assert_eq!(input.budget_id.as_deref(), Some("b-travel"));
}

#[test]
fn test_group_wording_is_not_a_budget_entry() {
    let snapshot = snapshot();
    assert!(budget_rule("split 30 for gas with the ski trip group", &snapshot).is_none());
}

#[test]
fn test_schedule_call_scenario() {
    let snapshot = snapshot();

    let plan = flow_rule("schedule a 30 minute call tomorrow at 3pm", &snapshot).expect("flow rule should fire");
    let Intent::AddFlowTask(input) = &plan.intent else { panic!("expected add_flow_task") };

    assert_eq!(input.title.as_deref(), Some("Call"));
    assert_eq!(input.duration_minutes, Some(30));
    assert_eq!(input.scheduled_for, Some(DateHint::Tomorrow));
    assert_eq!(input.starts_at.map(|t| t.to_string()).as_deref(), Some("3:00pm"));
    assert_eq!(input.category.as_deref(), Some("call"));
    assert_eq!(plan.message, "Schedule \"Call\" tomorrow at 3:00pm for 30 minutes?");
}

#[test]
fn test_flow_rule_ignores_money() {
    let snapshot = snapshot();
    assert!(flow_rule("add $20 to the meeting snacks", &snapshot).is_none());
}
