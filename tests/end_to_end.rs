use serde_json::{Value, json};
use tooleval::evaluator::NO_TOOL_CALLS_FOUND;
use tooleval::{
    EvalStage, EvaluationSample, Evaluator, ParseError, Status, TagPair, ToolCall, ToolSpec,
    compare_arguments, expected_calls_from_value, normalize, parse_block, parse_tool_call_value,
    parse_tool_specs,
};

fn weather_tools() -> Vec<ToolSpec> {
    parse_tool_specs(&json!([{
        "name": "get_weather",
        "parameters": {"city": {"type": "string", "required": true}}
    }]))
    .unwrap()
}

fn paris() -> Vec<ToolCall> {
    expected_calls_from_value(&json!({"name": "get_weather", "arguments": {"city": "Paris"}}))
        .unwrap()
}

fn args(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn well_formed_block_yields_one_call() {
    let extraction = Evaluator::default()
        .extract_calls(r#"Calling now <tool_call>{"name":"f","arguments":{"a":1}}</tool_call>"#);
    assert_eq!(extraction.calls, vec![ToolCall::new("f", args(json!({"a": 1})))]);
    assert!(extraction.diagnostics.is_empty());
}

#[test]
fn python_literal_paris_passes() {
    let tools = weather_tools();
    let expected = paris();
    let text = "<tool_call>{'name': 'get_weather', 'arguments': {'city': 'Paris'}}</tool_call>";

    let eval = Evaluator::default().evaluate(&EvaluationSample::new(text, &expected, &tools));
    assert_eq!(eval.verdict.status, Status::Passed);
    assert_eq!(eval.verdict.matched_calls.len(), 1);
    assert_eq!(eval.verdict.matched_calls[0].name, "get_weather");
}

#[test]
fn lowercase_paris_fails() {
    let tools = weather_tools();
    let expected = paris();
    let text = r#"<tool_call>{"name": "get_weather", "arguments": {"city": "paris"}}</tool_call>"#;

    let eval = Evaluator::default().evaluate(&EvaluationSample::new(text, &expected, &tools));
    assert_eq!(eval.verdict.status, Status::Failed);
    assert!(
        eval.verdict
            .diagnostics
            .iter()
            .any(|d| d == "argument mismatch for get_weather")
    );
}

#[test]
fn cardinality_mismatch_fails_even_with_exact_match() {
    let tools = parse_tool_specs(&json!([
        {"name": "get_weather", "parameters": {"city": {"type": "string"}}},
        {"name": "get_time", "parameters": {}}
    ]))
    .unwrap();
    let expected = expected_calls_from_value(&json!([
        {"name": "get_weather", "arguments": {"city": "Paris"}},
        {"name": "get_time", "arguments": {}}
    ]))
    .unwrap();
    let text = r#"<tool_call>{"name": "get_weather", "arguments": {"city": "Paris"}}</tool_call>"#;

    let eval = Evaluator::default().evaluate(&EvaluationSample::new(text, &expected, &tools));
    assert_eq!(eval.verdict.status, Status::Failed);
    assert_eq!(eval.verdict.stage, EvalStage::Matching);
    assert_eq!(eval.verdict.diagnostics[0], "expected 2 tool calls, got 1");
}

#[test]
fn text_without_blocks_reports_no_tool_calls() {
    let tools = weather_tools();
    let expected = paris();
    let eval = Evaluator::default()
        .evaluate(&EvaluationSample::new("The weather is nice.", &expected, &tools));
    assert_eq!(eval.verdict.status, Status::Failed);
    assert_eq!(eval.verdict.diagnostics, vec![NO_TOOL_CALLS_FOUND]);
}

#[test]
fn quoted_bare_string_parses_but_is_discarded() {
    assert_eq!(parse_block("'hello'").unwrap(), json!("hello"));
    assert!(matches!(
        parse_tool_call_value("'hello'"),
        Err(ParseError::NotAMapping(_))
    ));

    let extraction = Evaluator::default().extract_calls("<tool_call>'hello'</tool_call>");
    assert_eq!(extraction.block_count, 1);
    assert!(extraction.calls.is_empty());
}

#[test]
fn comparator_cases() {
    assert_eq!(
        compare_arguments(&args(json!({"x": 5})), &args(json!({"x": 5.0}))),
        Status::Passed
    );
    assert_eq!(
        compare_arguments(&args(json!({"x": [1, 2]})), &args(json!({"x": [2, 1]}))),
        Status::Failed
    );
    assert_eq!(
        compare_arguments(
            &args(json!({"x": {"a": 1, "b": 2}})),
            &args(json!({"x": {"b": 2, "a": 1}}))
        ),
        Status::Passed
    );
}

#[test]
fn normalizing_canonical_record_is_identity() {
    let canonical = args(json!({"name": "f", "arguments": {"a": 1, "b": [true, null]}}));
    let raw = normalize(&canonical);
    assert_eq!(raw.to_value(), Value::Object(canonical));
}

#[test]
fn strict_json_wins_over_literal_parsing() {
    let extraction = Evaluator::default()
        .extract_calls(r#"<tool_call>{"name": "f", "arguments": {"n": "5"}}</tool_call>"#);
    assert_eq!(extraction.calls[0].arguments.get("n"), Some(&json!("5")));
}

#[test]
fn broken_block_does_not_sink_its_neighbours() {
    let tools = weather_tools();
    let expected = paris();
    let text = "<tool_call>{\"name\": broken</tool_call>\n\
                <tool_call>{\"name\": \"get_weather\", \"arguments\": {\"city\": \"Paris\"}}</tool_call>";

    let eval = Evaluator::default().evaluate(&EvaluationSample::new(text, &expected, &tools));
    assert_eq!(eval.verdict.status, Status::Passed);
    assert!(eval.verdict.diagnostics[0].starts_with("block 0 dropped"));
}

#[test]
fn wrapped_and_flattened_shapes_normalize() {
    let tools = weather_tools();
    let expected = paris();
    for text in [
        r#"<tool_call>{"function": {"name": "get_weather", "arguments": {"city": "Paris"}}}</tool_call>"#,
        r#"<tool_call>{"name": "get_weather", "city": "Paris"}</tool_call>"#,
        "<tool_call>\\n{\"name\": \"get_weather\",\\n \"arguments\": {\"city\": \"Paris\"}}\\n</tool_call>",
    ] {
        let eval = Evaluator::default().evaluate(&EvaluationSample::new(text, &expected, &tools));
        assert_eq!(eval.verdict.status, Status::Passed, "{text}: {:?}", eval.verdict.diagnostics);
    }
}

#[test]
fn custom_tags_drive_extraction_and_pairs() {
    let tools = weather_tools();
    let expected = paris();
    let evaluator = Evaluator::new(TagPair::new("<function_call>", "</function_call>"))
        .unwrap()
        .with_preference_pairs(true);

    let text = r#"<tool_call>{"name": "get_weather", "arguments": {"city": "Paris"}}</tool_call>"#;
    let eval = evaluator.evaluate(&EvaluationSample::new(text, &expected, &tools));
    assert_eq!(eval.verdict.status, Status::Failed);

    let pair = eval.preference_pair.unwrap();
    insta::assert_snapshot!(pair.chosen.trim_end(), @r###"
    <function_call>
    {"name":"get_weather","arguments":{"city":"Paris"}}
    </function_call>
    "###);
}

#[test]
fn exact_copy_with_escapes_and_spacing_passes() {
    let tools = parse_tool_specs(&json!([
        {"name": "send_email", "parameters": {"body": {"type": "string", "required": true}}},
        {"name": "f", "parameters": {"s": {"type": "string"}}}
    ]))
    .unwrap();
    let expected = expected_calls_from_value(&json!([
        {"name": "send_email", "arguments": {"body": "Hi,\nthanks"}},
        {"name": "f", "arguments": {"s": "a  b"}}
    ]))
    .unwrap();
    let text = r#"<tool_call>{"name":"send_email","arguments":{"body":"Hi,\nthanks"}}</tool_call>
<tool_call>{"name": "f", "arguments": {"s": "a  b"}}</tool_call>"#;

    let eval = Evaluator::default().evaluate(&EvaluationSample::new(text, &expected, &tools));
    assert_eq!(eval.verdict.status, Status::Passed, "{:?}", eval.verdict.diagnostics);
    assert_eq!(
        eval.generated_calls[0].arguments.get("body"),
        Some(&json!("Hi,\nthanks"))
    );
}
