use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use tooleval::{EvaluationSample, Evaluator, expected_calls_from_value, parse_block, parse_tool_specs};

const JSON_CALL: &str =
    r#"<tool_call>{"name": "get_weather", "arguments": {"city": "Paris", "days": 3}}</tool_call>"#;
const LITERAL_CALL: &str =
    "<tool_call>{'name': 'get_weather', 'arguments': {'city': 'Paris', 'days': 3, 'metric': True}}</tool_call>";

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_block");

    group.bench_function("strict_json", |b| {
        let block = r#"{"name": "f", "arguments": {"a": [1, 2, 3], "b": {"c": null}}}"#;
        b.iter(|| parse_block(black_box(block)));
    });

    group.bench_function("python_literal", |b| {
        let block = "{'name': 'f', 'arguments': {'a': (1, 2, 3), 'b': {'c': None}}}";
        b.iter(|| parse_block(black_box(block)));
    });

    group.bench_function("deep_nesting", |b| {
        let block = format!("{}1{}", "[".repeat(64), "]".repeat(64));
        b.iter(|| parse_block(black_box(&block)));
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let evaluator = Evaluator::default();
    let tools = parse_tool_specs(&json!([{
        "name": "get_weather",
        "parameters": {
            "city": {"type": "string", "required": true},
            "days": {"type": "integer"},
            "metric": {"type": "boolean"}
        }
    }]))
    .unwrap();
    let expected = expected_calls_from_value(
        &json!({"name": "get_weather", "arguments": {"city": "Paris", "days": 3}}),
    )
    .unwrap();

    group.bench_function("json_call", |b| {
        b.iter(|| evaluator.evaluate(&EvaluationSample::new(black_box(JSON_CALL), &expected, &tools)));
    });

    group.bench_function("literal_call", |b| {
        b.iter(|| {
            evaluator.evaluate(&EvaluationSample::new(black_box(LITERAL_CALL), &expected, &tools))
        });
    });

    group.bench_function("many_blocks", |b| {
        let text = JSON_CALL.repeat(32);
        b.iter(|| evaluator.extract_calls(black_box(&text)));
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_evaluate);
criterion_main!(benches);
