//! Greeting commands

use commandr::{command, json, wraps, Callable, CommandSpec, Registry, Validator, Value};
use std::collections::BTreeMap;

/// Greet someone.
///
/// Arguments:
///   name - Name to greet.
///   title - Title of the person to greet.
///   times - Number of time to say the greeting.
///   comma - Whether to add a comma after the greeting.
///   caps_lock - Whether to output in ALL CAPS.
#[command("greet")]
pub fn say_greeting(
    name: String,
    #[arg(default = "Mr.")] title: String,
    #[arg(default = 1)] times: u32,
    #[arg(default = false)] comma: bool,
    #[arg(default = false)] caps_lock: bool,
) {
    let mut message = format!("Hi{} {} {}!", if comma { "," } else { "" }, title, name);
    if caps_lock {
        message = message.to_uppercase();
    }

    for _ in 0..times {
        println!("{message}");
    }
}

/// A command with no options of its own that can refuse its input.
///
/// Arguments:
///   name - Name to greet.
#[command]
pub fn simple_greet(name: String) -> anyhow::Result<()> {
    if name == "John" {
        return Err(commandr::usage("We don't like John"));
    }
    println!("Hi {name}!");
    Ok(())
}

/// Converts text of the form `a=b;c=d` into a map.
pub fn convert_to_dict(_name: &str, raw: &str) -> Result<Value, String> {
    raw.split(';')
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.to_string(), json!(value)))
                .ok_or_else(|| format!("'{pair}' is not of the form key=value"))
        })
        .collect::<Result<serde_json::Map<_, _>, _>>()
        .map(Value::Object)
}

/// Upper-case the first letter and lower-case the rest.
pub fn capitalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A command restricting the possible values for name.
///
/// This overrides the global capitalization check.
///
/// Arguments:
///   name - Name to greet.  It must be capitalized.
///   extra - Containing the 'hi' message and the end of the sentence '!'.
///           Format: --extra "hi=Hi;end=..."
#[command(
    validate(name = ["Kevin", "Nick", "Mike", "Wade"]),
    transform(name = |_, raw| Ok(json!(capitalize(raw))), extra = convert_to_dict)
)]
pub fn another_simple_greet(
    #[arg(default = null)] name: Option<String>,
    #[arg(default = {"hi": "Aloha", "end": "!"})] extra: BTreeMap<String, String>,
) {
    let hi = extra.get("hi").map(String::as_str).unwrap_or_default();
    let end = extra.get("end").map(String::as_str).unwrap_or_default();
    println!("{hi} {}{end}", name.unwrap_or_default());
}

/// An example of a command behind a wrapping layer.
#[command]
pub fn decorated_function(arg1: String, #[arg(default = 1)] arg2: i64) {
    println!("{arg1} {arg2}");
}

/// Announce the call, then run the wrapped command
pub fn some_decorator<C: Callable + 'static>(inner: C) -> commandr::Wrapper {
    wraps(inner, |inner, args| {
        println!("Wrapper Here!");
        inner.call(args)
    })
}

/// Whether `value` is a capitalized name
pub fn name_check(_name: &str, value: &Value) -> bool {
    value.as_str().is_some_and(|name| name == capitalize(name))
}

/// Shown when [`name_check`] fails, up to the first empty line
pub const NAME_CHECK_DOC: &str = "A name must be capitalized.

This text is never shown.";

/// The global rule for `name`, used unless a command sets its own
pub fn name_validator() -> Validator {
    Validator::predicate(name_check).with_description(NAME_CHECK_DOC)
}

/// Every greeting command
pub fn registry() -> commandr::Result<Registry> {
    Registry::new()
        .with(say_greeting_command())?
        .with(simple_greet_command())?
        .with(another_simple_greet_command())?
        .with(
            CommandSpec::new(some_decorator(decorated_function_callable())).name("test_decorated"),
        )
}
