//! Lifecycle hooks observed during real runs.


use rivulet_stream::hooks::HookRegistrationError;
use rivulet_stream::prelude::*;
use test_utils::{EventLog, doubled, times};

fn observed(executor: &StreamExecutor) -> EventLog {
    let log = EventLog::new();
    executor
        .hooks()
        .register_observer::<(
            OnRunStart,
            OnRunComplete,
            OnRunFailure,
            OnRoundComplete,
            OnNodeExecuted,
            OnNodeFinished,
        ), _>("log", log.recorder())
        .unwrap();
    log
}

#[tokio::test]
async fn run_events_bracket_node_events() {
    let executor = StreamExecutor::new();
    let log = observed(&executor);

    let mut graph = Graph::new();
    let double = doubled(&mut graph, vec![1, 2, 3]);
    let result = executor.run(&mut graph, double).await.unwrap();

    let names = log.schedule_names();
    assert_eq!(names.first(), Some(&"OnRunStart"));
    assert_eq!(names.last(), Some(&"OnRunComplete"));
    assert_eq!(log.count("OnRunFailure"), 0);
    assert_eq!(log.count("OnRoundComplete"), result.rounds);

    // Source, double and collector each finish exactly once.
    assert_eq!(log.count("OnNodeFinished"), 3);
    // Three values pass through the source, the double node and the collector.
    assert_eq!(log.count("OnNodeExecuted"), 9);

    let Some(StreamEvent::RunStart { node_count }) = log.events().first().cloned() else {
        panic!("first event must be RunStart");
    };
    assert_eq!(node_count, 3);
}

#[tokio::test]
async fn executed_events_carry_the_emitted_value() {
    let executor = StreamExecutor::new();
    let log = observed(&executor);

    let mut graph = Graph::new();
    let double = doubled(&mut graph, vec![5]);
    executor.run(&mut graph, double).await.unwrap();

    let doubled_values: Vec<Signal> = log
        .events()
        .into_iter()
        .filter_map(|event| match event {
            StreamEvent::NodeExecuted { node_id, value, .. } if node_id == double => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(doubled_values, vec![Signal::from(10)]);
}

#[tokio::test]
async fn failure_fires_run_failure_only() {
    let executor = StreamExecutor::new();
    let log = observed(&executor);

    let mut graph = Graph::new();
    let words = graph
        .add_node(NodeConfig::new("Words"), Callable::values(["x"]))
        .unwrap();
    let double = graph
        .pipe(words, NodeConfig::new("Double").inputs(1), times(2))
        .unwrap();

    assert!(executor.run(&mut graph, double).await.is_err());

    assert_eq!(log.count("OnRunFailure"), 1);
    assert_eq!(log.count("OnRunComplete"), 0);
    let Some(StreamEvent::RunFailure { error }) = log.events().last().cloned() else {
        panic!("last event must be RunFailure");
    };
    assert!(error.contains("Double#"), "{error}");
}

#[test]
fn duplicate_hook_names_are_rejected() {
    let executor = StreamExecutor::new();
    executor
        .hooks()
        .register_observer::<OnNodeFinished, _>("finish", |_| {})
        .unwrap();

    let err = executor
        .hooks()
        .register_observer::<OnNodeFinished, _>("finish", |_| {})
        .unwrap_err();

    assert!(matches!(err, HookRegistrationError::DuplicateName { .. }));
}

#[tokio::test]
async fn hooks_without_observers_do_not_change_output() {
    let mut graph = Graph::new();
    let double = doubled(&mut graph, vec![1, 2]);

    let result = StreamExecutor::new().run(&mut graph, double).await.unwrap();

    assert_eq!(result.output, vec![Value::Int(2), Value::Int(4)]);
}
