mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use pocketplan::config::ExecutionMode;
use pocketplan::executor::ToolExecution;
use pocketplan::intent::{ExpenseInput, Intent, ToolName};
use pocketplan::orchestrator::{response_message, Assistant, AssistantRequest, AssistantResponse, IntentOverride};
use pocketplan::stores::{MemoryStore, UserIdentity};
use pocketplan::AssistantConfig;

use common::*;

fn assistant(store: &Arc<MemoryStore>, config: AssistantConfig) -> Assistant {
    Assistant::packaged(config, stores(store)).expect("packaged models load")
}

#[tokio::test]
async fn test_missing_identity_fails_before_any_io() {
    let store = memory_store();
    let assistant = assistant(&store, config());

    let request = AssistantRequest::new(UserIdentity::default(), "add 20 for lunch to Roommates").executing();
    let response = assistant.handle_on(request, today()).await;

    assert_eq!(response.status(), "failed");
    assert_eq!(store.call_count(), 0, "No store may be touched without an identity");

    let blank = UserIdentity { id: Some("  ".to_string()), email: Some(String::new()) };
    let response = assistant.handle_on(AssistantRequest::new(blank, "add 20"), today()).await;
    assert_eq!(response.status(), "failed");
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_empty_text_fails_before_any_io() {
    let store = memory_store();
    let assistant = assistant(&store, config());

    let response = assistant.handle_on(AssistantRequest::new(me(), "   "), today()).await;

    assert!(matches!(response, AssistantResponse::Failed { .. }));
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_default_mode_asks_for_confirmation() {
    let store = memory_store();
    let assistant = assistant(&store, config());

    let response = assistant.handle_on(AssistantRequest::new(me(), "add 20 for lunch to Roommates"), today()).await;

    let AssistantResponse::NeedsConfirmation { intent, editable, trace, .. } = &response else {
        panic!("expected needs_confirmation, got {response:?}");
    };
    assert_eq!(intent.tool(), ToolName::AddExpense);
    assert!(editable.is_some());
    assert!(trace.is_empty(), "Trace is only returned in debug contexts");
    assert_eq!(store.write_count(), 0, "Confirmation must not write");
    assert!(store.read_count() > 0, "The snapshot was built");
}

#[tokio::test]
async fn test_debug_flag_returns_trace() {
    let store = memory_store();
    let assistant = assistant(&store, config());

    let mut request = AssistantRequest::new(me(), "add 15 to travel budget");
    request.context.debug = true;
    let response = assistant.handle_on(request, today()).await;

    let AssistantResponse::NeedsConfirmation { trace, .. } = response else { panic!("expected needs_confirmation") };
    assert_eq!(trace.first().map(|t| t.phase.as_str()), Some("classifier"));
}

#[tokio::test]
async fn test_execute_writes_and_reports() {
    let store = memory_store();
    let assistant = assistant(&store, config());

    let request = AssistantRequest::new(me(), "spent $30 on dinner with Alice in Ski Trip").executing();
    let response = assistant.handle_on(request, today()).await;

    let AssistantResponse::Executed { message, actions, .. } = &response else {
        panic!("expected executed, got {response:?}");
    };
    assert_eq!(actions.len(), 1);
    assert!(actions[0].success, "{}", actions[0].result_summary);
    assert_eq!(message, "Added $30.00 to Ski Trip for dinner, paid by Jordan and split 2 ways.");

    let written = store.expenses("g-ski").await;
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].amount_minor, 3000);
}

#[tokio::test]
async fn test_auto_mode_executes_without_flags() {
    let store = memory_store();
    let mut config = config();
    config.execution_mode = ExecutionMode::Auto;
    let assistant = assistant(&store, config);

    let response = assistant
        .handle_on(AssistantRequest::new(me(), "schedule a 30 minute call tomorrow at 3pm"), today())
        .await;

    assert_eq!(response.status(), "executed");
    assert_eq!(response.message(), "Scheduled \"Call\" tomorrow from 3:00pm to 3:30pm.");
    let plan = store.day_plan("2026-10-22").await.unwrap();
    assert_eq!(plan.tasks.len(), 1);
}

#[tokio::test]
async fn test_huge_task_duration_fails_cleanly() {
    let store = memory_store();
    let assistant = assistant(&store, config());

    let request = AssistantRequest::new(me(), "block 80000000 hours for focus tomorrow at 9am").executing();
    let response = assistant.handle_on(request, today()).await;

    let AssistantResponse::Executed { intent, actions, .. } = &response else {
        panic!("expected executed, got {response:?}");
    };
    let Intent::AddFlowTask(input) = intent else { panic!("expected add_flow_task, got {intent:?}") };
    assert_eq!(input.duration_minutes, Some(24 * 60));
    assert_eq!(actions[0].error.as_deref(), Some("past_midnight"));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_failed_action_message_comes_through() {
    let store = memory_store();
    let assistant = assistant(&store, config());

    // two groups and none named
    let intent = Intent::AddExpense(ExpenseInput { amount_minor: Some(2000), ..ExpenseInput::default() });
    let over = IntentOverride { intent, fields: BTreeMap::new() };
    let response = assistant.handle_on(AssistantRequest::new(me(), "").with_override(over).executing(), today()).await;

    let AssistantResponse::Executed { message, actions, .. } = &response else {
        panic!("expected executed, got {response:?}");
    };
    assert!(!actions[0].success);
    assert_eq!(actions[0].error.as_deref(), Some("no_group"));
    assert_eq!(message, &actions[0].result_summary);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_override_rederives_edited_fields() {
    let store = memory_store();
    let assistant = assistant(&store, config());

    // first round: plan only
    let planned = assistant.handle_on(AssistantRequest::new(me(), "add 20 for lunch to Roommates"), today()).await;
    let AssistantResponse::NeedsConfirmation { intent, .. } = planned else { panic!("expected needs_confirmation") };

    // second round: user edits amount, group and description
    let mut fields = BTreeMap::new();
    fields.insert("amount".to_string(), "18.50".to_string());
    fields.insert("group".to_string(), "ski trip".to_string());
    fields.insert("description".to_string(), "coffee at Blue Bottle".to_string());
    let request = AssistantRequest::new(me(), "").with_override(IntentOverride { intent, fields }).executing();
    let response = assistant.handle_on(request, today()).await;

    let AssistantResponse::Executed { intent, actions, .. } = &response else {
        panic!("expected executed, got {response:?}");
    };
    let Intent::AddExpense(input) = intent else { panic!("expected add_expense") };
    assert_eq!(input.amount_minor, Some(1850));
    assert_eq!(input.group_id, None, "An edited group name replaces the planned id");
    assert_eq!(input.category.as_deref(), Some("coffee"));
    assert_eq!(input.merchant.as_deref(), Some("Blue Bottle"));
    assert!(actions[0].success, "{}", actions[0].result_summary);

    assert!(store.expenses("g-room").await.is_empty());
    assert_eq!(store.expenses("g-ski").await[0].amount_minor, 1850);
}

#[tokio::test]
async fn test_response_serializes_with_status_tag() {
    let store = memory_store();
    let assistant = assistant(&store, config());

    let response = assistant.handle_on(AssistantRequest::new(me(), "hello how are you"), today()).await;
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["status"], "needs_confirmation");
    assert_eq!(json["intent"]["tool"], "summarize_state");
    assert!(json.get("trace").is_none());

    let failed = serde_json::to_value(AssistantResponse::failed("nope")).unwrap();
    assert_eq!(failed, serde_json::json!({ "status": "failed", "error": "nope" }));
}

fn action(success: bool, summary: &str) -> ToolExecution {
    ToolExecution {
        tool: ToolName::AddExpense,
        input: Intent::AddExpense(ExpenseInput::default()),
        success,
        result_summary: summary.to_string(),
        error: (!success).then(|| "store_error".to_string()),
    }
}

#[test]
fn test_message_prefers_first_success() {
    assert_eq!(response_message(&[], "planned"), "planned");
    assert_eq!(response_message(&[action(false, "broke"), action(true, "done")], "planned"), "done");
    assert_eq!(response_message(&[action(false, "broke")], "planned"), "broke");
}
