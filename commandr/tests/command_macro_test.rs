//! Tests for the `#[command]` attribute macro

use commandr::{
    command, extract, json, wraps, ArgumentKind, Callable, CommandrError, Dispatcher, Outcome,
    Registry, RunOptions, Value,
};
use std::cell::RefCell;

thread_local! {
    static SEEN: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record(line: String) {
    SEEN.with(|seen| seen.borrow_mut().push(line));
}

fn take_seen() -> Vec<String> {
    SEEN.with(|seen| seen.borrow_mut().drain(..).collect())
}

/// Greet someone.
///
/// Arguments:
///   name - Name to greet.
///   title - Title of the person to greet.
///   times - Number of time to say the greeting.
///   comma - Whether to add a comma after
///           the greeting.
#[command("greet")]
fn say_greeting(
    name: String,
    #[arg(default = "Mr.")] title: String,
    #[arg(default = 1)] times: i64,
    #[arg(default = false)] comma: bool,
) {
    record(format!("{name}|{title}|{times}|{comma}"));
}

/// Takes nothing.
#[command]
fn ping() {
    record("pong".to_string());
}

#[command(name = "refuse")]
fn refuse_everyone(name: String) -> anyhow::Result<()> {
    Err(commandr::usage(format!("not today, {name}")))
}

fn shout(_name: &str, raw: &str) -> Result<Value, String> {
    Ok(json!(raw.to_uppercase()))
}

#[command(validate(name = ["ANA", "BO"]), transform(name = shout))]
fn picky(#[arg(default = null)] name: Option<String>) {
    record(format!("{name:?}"));
}

#[command(validate(count = |_, value| value.as_i64().is_some_and(|n| n > 0)))]
fn positive(#[arg(default = 1)] count: i64) {
    record(count.to_string());
}

fn dispatcher() -> Dispatcher {
    let registry = Registry::strict()
        .with(say_greeting_command())
        .and_then(|r| r.with(ping_command()))
        .and_then(|r| r.with(refuse_everyone_command()))
        .and_then(|r| r.with(picky_command()))
        .and_then(|r| r.with(positive_command()))
        .unwrap();
    Dispatcher::new(registry, RunOptions::new().program("test"))
}

#[test]
fn test_signature_from_function() {
    let callable = say_greeting_callable();
    let signature = callable.signature().unwrap();

    assert_eq!(callable.name(), "say_greeting");
    let params: Vec<(&str, Option<&Value>)> = signature
        .parameters()
        .iter()
        .map(|p| (p.name(), p.default()))
        .collect();
    assert_eq!(
        params,
        vec![
            ("name", None),
            ("title", Some(&json!("Mr."))),
            ("times", Some(&json!(1))),
            ("comma", Some(&json!(false))),
        ]
    );
}

#[test]
fn test_documentation_from_doc_comments() {
    let schema = say_greeting_command().build().unwrap();

    assert_eq!(schema.name(), "greet");
    assert_eq!(schema.summary(), "Greet someone.");
    assert_eq!(schema.argument("name").unwrap().help(), "Name to greet.");
    assert_eq!(
        schema.argument("comma").unwrap().help(),
        "Whether to add a comma after the greeting."
    );
    assert_eq!(schema.argument("comma").unwrap().kind(), ArgumentKind::Flag);
    assert_eq!(schema.argument("times").unwrap().kind(), ArgumentKind::Integer);
}

#[test]
fn test_declared_name_without_explicit_name() {
    assert_eq!(ping_command().command_name(), "ping");
    assert_eq!(refuse_everyone_command().command_name(), "refuse");
}

#[test]
fn test_macro_command_runs() {
    let dispatcher = dispatcher();
    take_seen();

    dispatcher
        .dispatch(["greet", "--name", "Ana", "--times", "2", "--comma"])
        .unwrap();
    dispatcher.dispatch(["ping"]).unwrap();

    assert_eq!(take_seen(), vec!["Ana|Mr.|2|true", "pong"]);
}

#[test]
fn test_macro_rules() {
    let dispatcher = dispatcher();
    take_seen();

    dispatcher.dispatch(["picky", "--name", "ana"]).unwrap();
    dispatcher.dispatch(["picky"]).unwrap();
    let error = dispatcher.dispatch(["picky", "--name", "cy"]).unwrap_err();
    assert!(matches!(
        error.usage_error(),
        Some(CommandrError::Validation { .. })
    ));

    dispatcher.dispatch(["positive", "--count", "3"]).unwrap();
    assert!(dispatcher.dispatch(["positive", "--count", "0"]).is_err());

    assert_eq!(take_seen(), vec!["Some(\"ANA\")", "None", "3"]);
}

#[test]
fn test_usage_from_result_return() {
    let error = dispatcher().dispatch(["refuse", "Ana"]).unwrap_err();
    assert_eq!(
        error.usage_error(),
        Some(&CommandrError::Usage {
            message: "not today, Ana".to_string()
        })
    );
}

#[test]
fn test_wrapped_macro_command_keeps_signature() {
    let wrapped = wraps(say_greeting_callable(), |inner, args| inner.call(args));
    let direct = say_greeting_callable();

    let extracted = extract(&wrapped).unwrap();
    assert!(extracted.is_wrapper);
    assert_eq!(Some(extracted.signature), direct.signature());
    assert_eq!(Some(extracted.doc), direct.doc());
}

#[test]
fn test_help_lists_macro_commands() {
    let Outcome::Help(listing) = dispatcher().dispatch(["help"]).unwrap() else {
        panic!("expected help");
    };
    for name in ["greet", "ping", "refuse", "picky", "positive"] {
        assert!(listing.contains(name), "{name} missing from {listing}");
    }
}
