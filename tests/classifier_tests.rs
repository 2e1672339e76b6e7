use pocketplan::classifier::{Classifier, ModelError};
use pocketplan::intent::ToolName;

const COMMAND: &str = r#"{
    "version": 1,
    "classes": ["command"],
    "ngram_range": [1, 1],
    "vocabulary": {"add": 0, "hello": 1},
    "idf": [1.0, 1.0],
    "coefficients": [[4.0, -4.0]],
    "intercepts": [0.0]
}"#;

const TOOL: &str = r#"{
    "version": 1,
    "classes": ["add_expense", "add_flow_task"],
    "ngram_range": [1, 1],
    "vocabulary": {"add": 0, "schedule": 1},
    "idf": [1.0, 1.0],
    "coefficients": [[2.0, -2.0], [-2.0, 2.0]],
    "intercepts": [0.0, 0.0]
}"#;

#[test]
fn test_unrecognized_text_scores_zero() {
    let classifier = Classifier::packaged().expect("packaged models load");

    for text in ["xyzzy plugh", "", "   ", "!!!"] {
        let signal = classifier.classify(text);
        assert_eq!(signal.prob_command, 0.0, "No known tokens in {text:?} must give probability 0");
        assert!(!signal.is_command, "{text:?} must not be a command");
        assert!(signal.top_intent.is_none());
        assert!(signal.intent_probabilities.is_none());
    }
}

#[test]
fn test_small_talk_is_not_a_command() {
    let classifier = Classifier::packaged().unwrap();
    assert!(!classifier.classify("hello how are you").is_command);
    assert!(!classifier.classify("what's the weather").is_command);
}

#[test]
fn test_commands_predict_their_tool() {
    let classifier = Classifier::packaged().unwrap();

    let cases = [
        ("schedule a 30 minute call tomorrow at 3pm", ToolName::AddFlowTask),
        ("add 15 to travel budget", ToolName::AddBudgetEntry),
        ("spent 30 on dinner with Alice in Ski Trip", ToolName::AddExpense),
    ];
    for (text, tool) in cases {
        let signal = classifier.classify(text);
        assert!(signal.is_command, "{text:?} should read as a command ({})", signal.prob_command);
        assert_eq!(signal.top_tool(), Some(tool), "Wrong tool for {text:?}");
        let probabilities = signal.intent_probabilities.expect("commands carry per-tool probabilities");
        assert_eq!(probabilities.len(), 3);
    }
}

#[test]
fn test_threshold_gates_command_detection() {
    let classifier = Classifier::from_json(COMMAND, TOOL).unwrap();

    // "add" alone: sigmoid(4 * 1.0) ~ 0.98
    let signal = classifier.classify_with_threshold("add", 0.99);
    assert!(!signal.is_command, "Probability under the threshold must not count as a command");
    assert!(signal.prob_command > 0.9);

    let signal = classifier.classify_with_threshold("add", 0.5);
    assert!(signal.is_command);
    assert_eq!(signal.top_intent.as_deref(), Some("add_expense"));
}

#[test]
fn test_packaged_models_load_once() {
    let a = Classifier::packaged().unwrap();
    let b = Classifier::packaged().unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b), "Packaged classifier must be shared");
}

#[test]
fn test_malformed_artifacts_fail_at_construction() {
    assert!(matches!(Classifier::from_json("not json", TOOL), Err(ModelError::Parse(_))));

    let wrong_version = COMMAND.replace("\"version\": 1", "\"version\": 2");
    assert!(matches!(
        Classifier::from_json(&wrong_version, TOOL),
        Err(ModelError::Version { found: 2, expected: 1 })
    ));

    let short_idf = TOOL.replace("[1.0, 1.0]", "[1.0]");
    assert!(matches!(Classifier::from_json(COMMAND, &short_idf), Err(ModelError::IdfLength { idf: 1, vocab: 2 })));

    // the command model must be binary
    assert!(Classifier::from_json(TOOL, TOOL).is_err());
}
