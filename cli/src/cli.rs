use clap::{arg, builder::Str, value_parser, ArgMatches, Command};
use std::net::IpAddr;
use std::time::Duration;
use vvx_proto::Protocol;
use vvx_rest::Credential;

use crate::commands::{self, device_arg, devices};
use crate::config::{VvxConfig, VvxConfigSrc};
use crate::error::{ExecResult, ExecutionError};
use crate::local_net;
use crate::logger::init_logger;
use crate::probe::{self, ProbeSettings, ProbeTarget};
use crate::render;

pub fn make_command() -> Command {
    Command::new("vvx")
        .about("Discover and manage Polycom VVX phones")
        .version(env!("CARGO_PKG_VERSION"))
        .args(&[
            arg!(-c --config <FILE> "TOML configuration file").global(true),
            arg!(--protocol <PROTOCOL> "HTTP or HTTPS")
                .value_parser(|s: &str| s.parse::<Protocol>())
                .global(true),
            arg!(--"rest-port" <PORT> "REST API port").value_parser(value_parser!(u16)).global(true),
            arg!(--retry <COUNT> "retries after a transport failure")
                .value_parser(value_parser!(u32))
                .global(true),
            arg!(--timeout <MS> "HTTP timeout in milliseconds")
                .value_parser(value_parser!(u64))
                .global(true),
            arg!(--insecure "accept any TLS certificate").global(true),
            arg!(-u --username <USERNAME> "phone web user").global(true),
            arg!(-p --password <PASSWORD> "phone web password").global(true),
            arg!(--"log-level" <LEVEL> "error, warn, info or debug").global(true),
        ])
        .subcommand(make_probe_command("discover").about("Find SIP devices with a NOTIFY probe"))
        .subcommand(
            make_probe_command("notify")
                .about("Send a SIP event and report the logged in user")
                .arg(arg!(--event <EVENT> "event name, check-sync by default")),
        )
        .subcommands(commands::make_commands())
}

fn make_probe_command(name: impl Into<Str>) -> Command {
    Command::new(name).args(&[
        device_arg(),
        arg!(--"sip-port" <PORT> "SIP port of the phones").value_parser(value_parser!(u16)),
        arg!(--wait <MS> "time to wait for an answer, in milliseconds")
            .value_parser(value_parser!(u64)),
        arg!(--"local-ip" <IP> "local address to send from"),
        arg!(--"local-port" <PORT> "local port to send from").value_parser(value_parser!(u16)),
        arg!(--json "print results as JSON"),
    ])
}

pub fn get_mandatory_arg<T>(matches: &ArgMatches, id: &str) -> T
where
    T: Clone + Send + Sync + 'static,
{
    matches
        .get_one(id)
        .cloned()
        .unwrap_or_else(|| panic!("mandatory argument \"{}\" should be Some", id))
}

pub fn get_optional_arg<T>(matches: &ArgMatches, id: &str) -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    matches.get_one(id).cloned()
}

/// Command line values win over the configuration file.
fn apply_overrides(mut config: VvxConfig, matches: &ArgMatches) -> ExecResult<VvxConfig> {
    if let Some(protocol) = get_optional_arg::<Protocol>(matches, "protocol") {
        config.protocol = protocol;
    }
    if let Some(port) = get_optional_arg::<u16>(matches, "rest-port") {
        config.rest_port = port;
    }
    if let Some(retry_count) = get_optional_arg::<u32>(matches, "retry") {
        config.retry_count = retry_count;
    }
    if let Some(timeout) = get_optional_arg::<u64>(matches, "timeout") {
        config.request_timeout = Some(Duration::from_millis(timeout));
    }
    if matches.get_flag("insecure") {
        config.ignore_tls_errors = true;
    }
    if let Some(log_level) = get_optional_arg::<String>(matches, "log-level") {
        VvxConfigSrc::validate_log_level(&Some(log_level.clone()))?;
        config.log_level = log_level;
    }

    let username = get_optional_arg::<String>(matches, "username");
    let password = get_optional_arg::<String>(matches, "password");
    config.credential = match (username, password, config.credential.take()) {
        (Some(username), Some(password), _) => Some(Credential::new(username, password)),
        (Some(username), None, known) => Some(Credential::new(
            username,
            known.as_ref().map(|c| c.password()).unwrap_or_default(),
        )),
        (None, Some(password), Some(known)) => Some(Credential::new(known.username, password)),
        (None, Some(_), None) => {
            return Err(ExecutionError::InvalidArgument(
                "--password needs a username".into(),
            ))
        }
        (None, None, known) => known,
    };
    Ok(config)
}

fn load_config(matches: &ArgMatches) -> ExecResult<VvxConfig> {
    let config = match get_optional_arg::<String>(matches, "config") {
        Some(path) => VvxConfig::from_file(path)?,
        None => VvxConfig::default(),
    };
    apply_overrides(config, matches)
}

fn probe_settings(matches: &ArgMatches, config: &VvxConfig) -> ExecResult<ProbeSettings> {
    let local_ip = match get_optional_arg::<String>(matches, "local-ip").or(config.local_ip.clone())
    {
        Some(local_ip) => local_ip,
        None => local_net::local_ipv4()?.to_string(),
    };
    let local_port = match get_optional_arg::<u16>(matches, "local-port").or(config.local_port) {
        Some(port) => port,
        None => {
            let ip = local_ip.parse::<IpAddr>().map_err(|err| {
                ExecutionError::InvalidArgument(format!("local ip {}: {}", local_ip, err))
            })?;
            local_net::free_udp_port(ip)?
        }
    };
    let wait_time = get_optional_arg::<u64>(matches, "wait")
        .map(Duration::from_millis)
        .unwrap_or(config.wait_time);
    Ok(ProbeSettings::new(local_ip, local_port, wait_time))
}

fn probe_targets(matches: &ArgMatches, config: &VvxConfig) -> Vec<ProbeTarget> {
    let port = get_optional_arg::<u16>(matches, "sip-port").unwrap_or(config.sip_port);
    devices(matches)
        .into_iter()
        .map(|device| ProbeTarget::new(device, port))
        .collect()
}

fn exec_discover(matches: &ArgMatches, config: &VvxConfig) -> ExecResult<bool> {
    let settings = probe_settings(matches, config)?;
    let json = matches.get_flag("json");
    for result in probe::discover_batch(&probe_targets(matches, config), &settings) {
        render::discovery(&result, json);
    }
    Ok(true)
}

fn exec_notify(matches: &ArgMatches, config: &VvxConfig) -> ExecResult<bool> {
    let settings = probe_settings(matches, config)?;
    let event = get_optional_arg::<String>(matches, "event").unwrap_or_else(|| config.event.clone());
    let json = matches.get_flag("json");
    for result in probe::notify_batch(&probe_targets(matches, config), &settings, &event) {
        render::notify(&result, json);
    }
    Ok(true)
}

/// Runs the `name` subcommand. `Ok(false)` when some device of a batch
/// failed.
pub fn exec_command(name: &str, matches: &ArgMatches) -> ExecResult<bool> {
    let config = load_config(matches)?;
    init_logger(&config)?;

    match name {
        "discover" => exec_discover(matches, &config),
        "notify" => exec_notify(matches, &config),
        name => commands::exec_command(name, matches, &config),
    }
}
