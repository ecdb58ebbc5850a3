/// Constants and variables are traced through the functions that read them.

mod common;

use common::*;
use ripples::application::TraceContext;
use ripples::{ImpactTracer, Position};

#[test]
fn test_constant_reaches_server_through_reader() {
    let results = analyzer(constant_snapshot()).analyze(&[max_retries()]).unwrap();
    assert_eq!(names(&results), vec!["server"]);
    assert_eq!(
        results[0].trace_path,
        vec![
            format!("{}.main (main)", constant_pkg("cmd/server")),
            format!("{}.DoWithRetry (Changed)", constant_pkg("internal/service")),
        ]
    );
}

#[test]
fn test_reference_sites_in_one_function_trace_once() {
    let tracer = ImpactTracer::new(provider(constant_snapshot()), &test_config());
    let paths = tracer.trace(&max_retries(), &TraceContext::default()).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].binary_name, "server");
    let names: Vec<&str> = paths[0].path.iter().map(|n| n.function_name.as_str()).collect();
    assert_eq!(names, vec!["main", "DoWithRetry"]);
}

#[test]
fn test_package_level_variable_use_affects_nothing() {
    let results = analyzer(constant_snapshot()).analyze(&[default_timeout()]).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_function_and_constant_agree() {
    let results = analyzer(constant_snapshot())
        .analyze(&[do_with_retry(), max_retries()])
        .unwrap();
    assert_eq!(names(&results), vec!["server"]);
    assert_eq!(results[0].trace_path.len(), 2);
}

#[test]
fn test_readers_in_different_functions_report_binary_once() {
    let service = constant_pkg("internal/service");
    let snapshot = constant_snapshot()
        .function("Backoff", &service, "service", Position::new("internal/service/backoff.go", 3, 6))
        .call("cmd/server/main.go:8:6", "internal/service/backoff.go:3:6")
        .reference(
            "internal/config/config.go:4:7",
            Position::new("internal/service/backoff.go", 4, 20),
            Some("internal/service/backoff.go:3:6"),
        );

    let tracer = ImpactTracer::new(provider(snapshot.clone()), &test_config());
    let paths = tracer.trace(&max_retries(), &TraceContext::default()).unwrap();
    assert_eq!(paths.len(), 1);

    let results = analyzer(snapshot).analyze(&[max_retries()]).unwrap();
    assert_eq!(names(&results), vec!["server"]);
}
