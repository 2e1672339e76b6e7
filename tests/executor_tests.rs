mod common;

use std::sync::Arc;

use pocketplan::executor::expense::even_splits;
use pocketplan::executor::{summarize_state, Executor};
use pocketplan::intent::{
    BudgetEntryInput, ClockTime, DateHint, EntryKind, ExpenseInput, FlowTaskInput, Intent, ToolName,
};
use pocketplan::snapshot::{Snapshot, SnapshotBuilder};
use pocketplan::stores::{MemoryStore, StoreArea, UserIdentity};

use common::*;

async fn setup() -> (Arc<MemoryStore>, Executor, Snapshot) {
    let store = memory_store();
    let snapshot = SnapshotBuilder::new(stores(&store), &config()).build(&me(), today()).await;
    let executor = Executor::new(stores(&store), &config());
    (store, executor, snapshot)
}

fn expense_input(amount: i64, group_id: &str) -> ExpenseInput {
    ExpenseInput {
        amount_minor: Some(amount),
        currency: Some("USD".to_string()),
        description: Some("groceries".to_string()),
        group_id: Some(group_id.to_string()),
        ..ExpenseInput::default()
    }
}

#[tokio::test]
async fn test_expense_splits_evenly_across_the_group() {
    let (store, executor, snapshot) = setup().await;

    let result = executor.execute(&Intent::AddExpense(expense_input(1000, "g-room")), &snapshot).await;

    assert!(result.success, "expense should be written: {}", result.result_summary);
    assert_eq!(result.tool, ToolName::AddExpense);
    assert_eq!(result.result_summary, "Added $10.00 to Roommates for groceries, paid by Jordan and split 3 ways.");

    let written = store.expenses("g-room").await;
    assert_eq!(written.len(), 1);
    let shares: Vec<i64> = written[0].splits.iter().map(|s| s.amount_minor).collect();
    assert_eq!(shares, vec![334, 333, 333], "Leftover cent goes to the first participant");
    assert_eq!(shares.iter().sum::<i64>(), 1000);
    assert_eq!(written[0].payer_id, "u-me", "Requester pays by default");
}

#[test]
fn test_even_splits_always_sum_to_the_amount() {
    let members = vec![member("a", "A"), member("b", "B"), member("c", "C"), member("d", "D")];
    let refs: Vec<_> = members.iter().collect();
    for amount in [1, 7, 1000, 1003] {
        let splits = even_splits(amount, &refs);
        assert_eq!(splits.iter().map(|s| s.amount_minor).sum::<i64>(), amount);
        let spread = splits.iter().map(|s| s.amount_minor).max().unwrap() - splits.iter().map(|s| s.amount_minor).min().unwrap();
        assert!(spread <= 1, "Shares differ by at most one unit");
    }
    assert!(even_splits(100, &[]).is_empty());
}

#[tokio::test]
async fn test_named_participants_and_payer() {
    let (store, executor, snapshot) = setup().await;
    let input = ExpenseInput {
        participant_hints: vec!["Alice".to_string()],
        payer_hint: Some("alice".to_string()),
        group_id: None,
        group_hint: Some("ski trip".to_string()),
        occurred_on: Some(DateHint::Yesterday),
        ..expense_input(3000, "")
    };

    let result = executor.execute(&Intent::AddExpense(input), &snapshot).await;

    assert!(result.success, "{}", result.result_summary);
    let written = store.expenses("g-ski").await;
    let members: Vec<&str> = written[0].splits.iter().map(|s| s.member_id.as_str()).collect();
    assert_eq!(members, vec!["u-me", "u-alice"], "Named people plus the requester");
    assert_eq!(written[0].payer_id, "u-alice");
    assert_eq!(written[0].occurred_at, today().pred_opt().unwrap());
}

#[tokio::test]
async fn test_expense_preconditions_block_the_write() {
    let (store, executor, snapshot) = setup().await;

    let zero = executor.execute(&Intent::AddExpense(expense_input(0, "g-room")), &snapshot).await;
    assert!(!zero.success);
    assert_eq!(zero.error.as_deref(), Some("invalid_amount"));

    let stranger = ExpenseInput { participant_hints: vec!["Zed".to_string()], ..expense_input(1000, "g-room") };
    let result = executor.execute(&Intent::AddExpense(stranger), &snapshot).await;
    assert_eq!(result.error.as_deref(), Some("unknown_participant"));
    assert!(result.result_summary.contains("Zed"));

    let ambiguous = ExpenseInput { group_id: None, ..expense_input(1000, "") };
    let result = executor.execute(&Intent::AddExpense(ambiguous), &snapshot).await;
    assert_eq!(result.error.as_deref(), Some("no_group"), "Two groups and no hint cannot be resolved");

    assert_eq!(store.write_count(), 0, "Failed preconditions must not write");
}

#[tokio::test]
async fn test_no_groups_fails() {
    let store = Arc::new(MemoryStore::new());
    let snapshot = Snapshot::empty(me(), today(), "USD");
    let executor = Executor::new(stores(&store), &config());

    let result = executor.execute(&Intent::AddExpense(expense_input(1000, "g-room")), &snapshot).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("no_group"));
}

#[tokio::test]
async fn test_store_failure_is_reported_not_raised() {
    let (store, executor, snapshot) = setup().await;
    store.set_unavailable(StoreArea::Expenses, true).await;

    let result = executor.execute(&Intent::AddExpense(expense_input(1000, "g-room")), &snapshot).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("store_error"));
    assert!(!result.result_summary.contains("Unavailable"), "Raw store errors stay out of the summary");
}

#[tokio::test]
async fn test_budget_entry_prepends_to_month() {
    let (store, executor, snapshot) = setup().await;
    let input = BudgetEntryInput {
        amount_minor: Some(1500),
        description: Some("train tickets".to_string()),
        budget_hint: Some("travel".to_string()),
        ..BudgetEntryInput::default()
    };

    let first = executor.execute(&Intent::AddBudgetEntry(input.clone()), &snapshot).await;
    let second = executor
        .execute(
            &Intent::AddBudgetEntry(BudgetEntryInput { description: Some("hotel".to_string()), ..input }),
            &snapshot,
        )
        .await;

    assert!(first.success && second.success);
    assert_eq!(first.result_summary, "Added $15.00 to Travel Fund for train tickets.");
    let month = store.month("b-travel", "2026-10").await.expect("month document saved");
    let descriptions: Vec<&str> = month.entries.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(descriptions, vec!["hotel", "train tickets"], "Newest entry first");
    assert_eq!(month.spent_minor(), 3000);
}

#[tokio::test]
async fn test_income_uses_entry_month() {
    let (store, executor, snapshot) = setup().await;
    let input = BudgetEntryInput {
        amount_minor: Some(200000),
        kind: EntryKind::Income,
        budget_id: Some("b-home".to_string()),
        occurred_on: Some(DateHint::On(chrono::NaiveDate::from_ymd_opt(2026, 9, 30).unwrap())),
        ..BudgetEntryInput::default()
    };

    let result = executor.execute(&Intent::AddBudgetEntry(input), &snapshot).await;

    assert!(result.success, "{}", result.result_summary);
    assert_eq!(result.result_summary, "Recorded $2000.00 income in Household.");
    let month = store.month("b-home", "2026-09").await.expect("September ledger");
    assert_eq!(month.income_minor, 200000);
    assert_eq!(month.spent_minor(), 0);
}

#[tokio::test]
async fn test_budget_refuses_foreign_currency() {
    let (store, executor, snapshot) = setup().await;
    let before = store.call_count();
    let input = BudgetEntryInput {
        amount_minor: Some(2000),
        currency: Some("EUR".to_string()),
        budget_hint: Some("travel".to_string()),
        ..BudgetEntryInput::default()
    };

    let result = executor.execute(&Intent::AddBudgetEntry(input), &snapshot).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("currency_mismatch"));
    assert!(result.result_summary.contains("Travel Fund"), "{}", result.result_summary);
    assert_eq!(store.call_count(), before, "The ledger is not opened for a mismatched currency");
}

#[tokio::test]
async fn test_budget_needs_a_target() {
    let store = Arc::new(MemoryStore::new());
    let snapshot = Snapshot::empty(me(), today(), "USD");
    let executor = Executor::new(stores(&store), &config());

    let input = BudgetEntryInput { amount_minor: Some(1500), ..BudgetEntryInput::default() };
    let result = executor.execute(&Intent::AddBudgetEntry(input), &snapshot).await;
    assert_eq!(result.error.as_deref(), Some("no_budget"));
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_flow_tasks_chain_through_the_day() {
    let (store, executor, snapshot) = setup().await;
    let input = FlowTaskInput {
        title: Some("Deep work".to_string()),
        scheduled_for: Some(DateHint::Tomorrow),
        ..FlowTaskInput::default()
    };

    let first = executor.execute(&Intent::AddFlowTask(input.clone()), &snapshot).await;
    let second = executor.execute(&Intent::AddFlowTask(input), &snapshot).await;

    assert_eq!(first.result_summary, "Scheduled \"Deep work\" tomorrow from 9:00am to 9:30am.");
    assert_eq!(second.result_summary, "Scheduled \"Deep work\" tomorrow from 9:30am to 10:00am.");
    let plan = store.day_plan("2026-10-22").await.unwrap();
    let sequences: Vec<u32> = plan.tasks.iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![1, 2]);
}

#[tokio::test]
async fn test_flow_task_guards() {
    let (store, executor, snapshot) = setup().await;

    let late = FlowTaskInput {
        title: Some("Late call".to_string()),
        starts_at: ClockTime::new(23, 45),
        duration_minutes: Some(30),
        ..FlowTaskInput::default()
    };
    let result = executor.execute(&Intent::AddFlowTask(late), &snapshot).await;
    assert_eq!(result.error.as_deref(), Some("past_midnight"));

    let mut anonymous = snapshot.clone();
    anonymous.user = UserIdentity { id: None, email: Some("jordan@example.com".to_string()) };
    let result = executor.execute(&Intent::AddFlowTask(FlowTaskInput::default()), &anonymous).await;
    assert_eq!(result.error.as_deref(), Some("no_user_id"));

    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_oversized_duration_is_refused() {
    let (store, executor, snapshot) = setup().await;
    let input = FlowTaskInput {
        title: Some("Focus".to_string()),
        starts_at: ClockTime::new(9, 0),
        duration_minutes: Some(u32::MAX),
        ..FlowTaskInput::default()
    };

    let result = executor.execute(&Intent::AddFlowTask(input), &snapshot).await;

    assert_eq!(result.error.as_deref(), Some("past_midnight"));
    assert_eq!(store.write_count(), 0, "An overflowing task must not be written");
}

#[tokio::test]
async fn test_summary_makes_no_store_call() {
    let (store, executor, snapshot) = setup().await;
    let before = store.call_count();

    let result = executor.execute(&Intent::unrecognized("not_a_command"), &snapshot).await;

    assert!(result.success);
    assert_eq!(store.call_count(), before, "summarize_state must not touch the stores");
    assert_eq!(result.result_summary, summarize_state(&snapshot));
    assert_eq!(
        result.result_summary,
        "No changes made. You have 2 expense groups, $0.00 spent in Travel Fund this month, 0 tasks today and \
         2 recently saved items."
    );
}
