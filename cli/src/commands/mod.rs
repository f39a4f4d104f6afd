mod catalogue;

use clap::{arg, builder::Str, value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use serde_json::Value;
use std::time::Duration;
use vvx_proto::HttpMethod;
use vvx_rest::{Dispatcher, DispatchOptions, PushMessage, PushPriority};

use crate::cli::{get_mandatory_arg, get_optional_arg};
use crate::config::VvxConfig;
use crate::error::{ExecResult, ExecutionError};
use crate::render;

pub use catalogue::{find, BodyInput, BodyKind, Entry, CATALOGUE};

pub const DEVICE_ARG: &str = "DEVICE";

pub fn device_arg() -> Arg {
    Arg::new(DEVICE_ARG)
        .help("phone host name or IP address, repeat for a batch")
        .required(true)
        .num_args(1..)
}

pub fn devices(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>(DEVICE_ARG)
        .map(|devices| devices.cloned().collect())
        .unwrap_or_default()
}

fn entry_command(entry: &'static Entry) -> Command {
    let mut command = Command::new(entry.name)
        .about(entry.about)
        .arg(device_arg());
    match entry.body {
        BodyKind::ParamList => {
            command = command.arg(
                Arg::new("param")
                    .long("param")
                    .value_name("NAME")
                    .help("configuration parameter to read, repeatable")
                    .action(ArgAction::Append)
                    .required(true),
            );
        }
        BodyKind::ParamMap => {
            command = command.arg(
                Arg::new("set")
                    .long("set")
                    .value_name("NAME=VALUE")
                    .help("configuration parameter to write, repeatable")
                    .action(ArgAction::Append)
                    .required(true),
            );
        }
        _ => {}
    }
    for field in entry.fields() {
        command = command.arg(
            Arg::new(field.arg)
                .long(field.arg)
                .help(field.help)
                .required(field.default.is_none()),
        );
    }
    command
}

pub fn make_commands() -> Vec<Command> {
    let mut commands: Vec<Command> = CATALOGUE.iter().map(entry_command).collect();
    commands.push(make_rest_command("rest"));
    commands.push(make_get_command("get"));
    commands.push(make_push_command("push"));
    commands
}

fn make_rest_command(name: impl Into<Str>) -> Command {
    Command::new(name)
        .about("Call any REST API command")
        .args(&[
            device_arg(),
            arg!(--command <PATH> "command path, e.g. mgmt/device/info").required(true),
            arg!(-X --method <METHOD> "HTTP method")
                .value_parser(|s: &str| s.parse::<HttpMethod>())
                .default_value("GET"),
            arg!(--body <JSON> "request data, wrapped into {\"data\": ...}")
                .value_parser(|s: &str| serde_json::from_str::<Value>(s)),
            arg!(--base <BASE> "API base path").default_value(DispatchOptions::DEFAULT_BASE),
        ])
}

fn make_get_command(name: impl Into<Str>) -> Command {
    Command::new(name)
        .about("GET full URIs and classify the answers")
        .arg(
            Arg::new("URI")
                .help("e.g. http://10.0.0.5/api/v1/mgmt/lineInfo")
                .required(true)
                .num_args(1..),
        )
}

fn make_push_command(name: impl Into<Str>) -> Command {
    Command::new(name)
        .about("Show a push notification on the phone screen")
        .args(&[
            device_arg(),
            arg!(-m --message <TEXT> "plain text, escaped"),
            arg!(--markup <XML> "content sent verbatim inside <Data>"),
            arg!(--priority <PRIORITY> "Normal, Important or Critical")
                .value_parser(|s: &str| s.parse::<PushPriority>())
                .default_value("Normal"),
            arg!(--"push-port" <PORT> "push server port").value_parser(value_parser!(u16)),
        ])
        .group(
            ArgGroup::new("content")
                .args(["message", "markup"])
                .required(true),
        )
}

/// REST options shared by every command; `timeout` is the default of the
/// command, a configured timeout wins over it.
pub fn rest_options(config: &VvxConfig, timeout: Duration) -> DispatchOptions {
    DispatchOptions::default()
        .with_protocol(config.protocol.clone())
        .with_port(config.rest_port)
        .with_retry_count(config.retry_count)
        .with_timeout(config.request_timeout.unwrap_or(timeout))
        .with_credential(config.credential.clone())
}

/// Runs `op` for every item, in order. A failure is reported and the batch
/// goes on. Returns `true` when every item succeeded.
pub fn run_batch<T, F, R>(items: &[String], mut op: F, mut show: R) -> bool
where
    F: FnMut(&str) -> ExecResult<T>,
    R: FnMut(&str, &T),
{
    let mut all_ok = true;
    for item in items.iter() {
        match op(item) {
            Ok(value) => show(item, &value),
            Err(err) => {
                all_ok = false;
                render::warning(item, &err);
            }
        }
    }
    all_ok
}

/// Only ids declared by the entry's command are looked up.
fn body_input(entry: &Entry, matches: &ArgMatches) -> BodyInput {
    let many = |id: &str| -> Vec<String> {
        matches
            .get_many::<String>(id)
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    };
    BodyInput {
        params: match entry.body {
            BodyKind::ParamList => many("param"),
            _ => vec![],
        },
        settings: match entry.body {
            BodyKind::ParamMap => many("set"),
            _ => vec![],
        },
        fields: entry
            .fields()
            .iter()
            .filter_map(|field| {
                get_optional_arg::<String>(matches, field.arg).map(|v| (field.arg.to_string(), v))
            })
            .collect(),
    }
}

fn exec_entry(entry: &'static Entry, matches: &ArgMatches, config: &VvxConfig) -> ExecResult<bool> {
    let mut options =
        rest_options(config, Duration::from_millis(entry.timeout_ms)).with_method(entry.method);
    if let Some(body) = entry.build_body(&body_input(entry, matches))? {
        options = options.with_body(body);
    }
    let dispatcher = Dispatcher::with_tls_policy(config.ignore_tls_errors)?;

    Ok(run_batch(
        &devices(matches),
        |device| Ok(dispatcher.dispatch(device, entry.path, &options)?),
        render::value,
    ))
}

fn exec_rest(matches: &ArgMatches, config: &VvxConfig) -> ExecResult<bool> {
    let command: String = get_mandatory_arg(matches, "command");
    let mut options = rest_options(config, Duration::from_millis(DispatchOptions::DEFAULT_TIMEOUT_MS))
        .with_method(get_mandatory_arg(matches, "method"))
        .with_base(get_mandatory_arg::<String>(matches, "base"));
    if let Some(body) = get_optional_arg::<Value>(matches, "body") {
        options = options.with_body(body);
    }
    let dispatcher = Dispatcher::with_tls_policy(config.ignore_tls_errors)?;

    Ok(run_batch(
        &devices(matches),
        |device| Ok(dispatcher.dispatch(device, &command, &options)?),
        render::value,
    ))
}

fn exec_get(matches: &ArgMatches, config: &VvxConfig) -> ExecResult<bool> {
    let uris: Vec<String> = matches
        .get_many::<String>("URI")
        .map(|uris| uris.cloned().collect())
        .unwrap_or_default();
    let options = rest_options(config, Duration::from_millis(DispatchOptions::FETCH_TIMEOUT_MS));
    let dispatcher = Dispatcher::with_tls_policy(config.ignore_tls_errors)?;

    Ok(run_batch(
        &uris,
        |uri| Ok(dispatcher.dispatch_uri(uri, &options)?),
        render::value,
    ))
}

fn exec_push(matches: &ArgMatches, config: &VvxConfig) -> ExecResult<bool> {
    let priority: PushPriority = get_mandatory_arg(matches, "priority");
    let message = match get_optional_arg::<String>(matches, "message") {
        Some(text) => PushMessage::text(priority, &text),
        None => PushMessage::markup(priority, get_mandatory_arg::<String>(matches, "markup")),
    };
    let port = get_optional_arg::<u16>(matches, "push-port").unwrap_or(config.push_port);
    let options = DispatchOptions::push()
        .with_protocol(config.protocol.clone())
        .with_port(port)
        .with_retry_count(config.retry_count)
        .with_timeout(
            config
                .request_timeout
                .unwrap_or_else(|| Duration::from_millis(DispatchOptions::DEFAULT_TIMEOUT_MS)),
        )
        .with_credential(config.credential.clone());
    let dispatcher = Dispatcher::with_tls_policy(config.ignore_tls_errors)?;

    Ok(run_batch(
        &devices(matches),
        |device| Ok(dispatcher.push(device, &message, &options)?),
        |device, answer: &String| render::text(device, answer),
    ))
}

/// Runs a REST subcommand: a catalogue entry, `rest`, `get` or `push`.
pub fn exec_command(name: &str, matches: &ArgMatches, config: &VvxConfig) -> ExecResult<bool> {
    match name {
        "rest" => exec_rest(matches, config),
        "get" => exec_get(matches, config),
        "push" => exec_push(matches, config),
        name => match find(name) {
            Some(entry) => exec_entry(entry, matches, config),
            None => Err(ExecutionError::InvalidArgument(format!(
                "unknown command {}",
                name
            ))),
        },
    }
}
