//! Tests for logging configuration and format parsing

use calc_agents::observability::logging::{parse_flag, parse_level, LogFormat};
use tracing::Level;

#[test]
fn test_log_format_parse_known_formats() {
    assert!(matches!(LogFormat::parse("json"), LogFormat::Json));
    assert!(matches!(LogFormat::parse("PRETTY"), LogFormat::Pretty));
    assert!(matches!(LogFormat::parse("Compact"), LogFormat::Compact));
}

#[test]
fn test_log_format_parse_invalid_defaults_to_json() {
    assert!(matches!(LogFormat::parse("invalid"), LogFormat::Json));
    assert!(matches!(LogFormat::parse(""), LogFormat::Json));
    assert!(matches!(LogFormat::parse("xml"), LogFormat::Json));
}

#[test]
fn test_log_format_parse_whitespace() {
    assert!(matches!(LogFormat::parse("  pretty  "), LogFormat::Pretty));
    assert!(matches!(LogFormat::parse("json\n"), LogFormat::Json));
    assert!(matches!(LogFormat::parse("\tcompact"), LogFormat::Compact));
}

#[test]
fn test_parse_level() {
    assert_eq!(parse_level("error"), Level::ERROR);
    assert_eq!(parse_level("WARN"), Level::WARN);
    assert_eq!(parse_level("Debug"), Level::DEBUG);
    assert_eq!(parse_level(" trace "), Level::TRACE);
    assert_eq!(parse_level("loud"), Level::INFO);
    assert_eq!(parse_level(""), Level::INFO);
}

#[test]
fn test_parse_flag() {
    assert!(parse_flag("true"));
    assert!(parse_flag("TRUE"));
    assert!(!parse_flag("1"));
    assert!(!parse_flag("yes"));
    assert!(!parse_flag(""));
}

#[test]
fn test_span_macros_build_named_spans() {
    let task = calc_agents::task_span!(task_id = 7u64);
    let agent = calc_agents::agent_span!(agent_id = 1u32);

    // Without a subscriber the spans are disabled, but metadata is still attached
    if let Some(meta) = task.metadata() {
        assert_eq!(meta.name(), "task_evaluation");
    }
    if let Some(meta) = agent.metadata() {
        assert_eq!(meta.name(), "worker_agent");
    }
}
