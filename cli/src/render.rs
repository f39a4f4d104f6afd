use colored::{ColoredString, Colorize};
use serde::Serialize;
use serde_json::Value;

use crate::error::ExecutionError;
use crate::probe::{DiscoveryResult, NotifyResult, ProbeStatus};

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| format!("<{}>", err))
}

fn status(status: ProbeStatus) -> ColoredString {
    match status {
        ProbeStatus::Online => status.as_str().green().bold(),
        ProbeStatus::NoResponse | ProbeStatus::NoDataReceived | ProbeStatus::NonVVXDevice => {
            status.as_str().yellow()
        }
        _ => status.as_str().red(),
    }
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

/// Payload of a successful REST call.
pub fn value(device: &str, value: &Value) {
    println!("{}", device.green().bold());
    match value {
        Value::Null => println!("OK"),
        value => println!("{}", pretty(value)),
    }
}

pub fn text(device: &str, text: &str) {
    println!("{}\n{}", device.green().bold(), text);
}

/// Failure of one device inside a batch.
pub fn warning(device: &str, err: &ExecutionError) {
    eprintln!("{} {}: {}", "warning:".yellow().bold(), device, err);
}

pub fn error(err: &ExecutionError) {
    eprintln!("{} {}", "error:".red().bold(), err);
}

pub fn discovery(result: &DiscoveryResult, json: bool) {
    if json {
        println!("{}", pretty(result));
        return;
    }
    println!(
        "{:<20} {:<16} {:<10} {:<28} {:<24} {}",
        result.device,
        status(result.status),
        or_dash(&result.device_type),
        or_dash(&result.sip_user),
        or_dash(&result.lync_server),
        or_dash(&result.user_agent),
    );
}

pub fn notify(result: &NotifyResult, json: bool) {
    if json {
        println!("{}", pretty(result));
        return;
    }
    let user = match (result.status, result.registered) {
        (ProbeStatus::Online, false) => "<no user logged in>",
        _ => or_dash(&result.sip_user),
    };
    println!(
        "{:<20} {:<16} {:<10} {:<28} {:<24} {}",
        result.device,
        status(result.status),
        or_dash(&result.device_type),
        user,
        or_dash(&result.lync_server),
        or_dash(&result.client_app),
    );
}
