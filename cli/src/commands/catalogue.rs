use serde_json::{json, Map, Value};
use std::collections::HashMap;
use vvx_proto::HttpMethod;
use vvx_rest::DispatchOptions;

use crate::error::{ExecResult, ExecutionError};

/// A body field filled from a command line option.
#[derive(Debug, PartialEq)]
pub struct Field {
    /// JSON key
    pub key: &'static str,
    /// long option name
    pub arg: &'static str,
    pub help: &'static str,
    pub default: Option<&'static str>,
}

#[derive(Debug, PartialEq)]
pub enum BodyKind {
    /// no entity at all
    Nothing,
    /// `{}`
    EmptyObject,
    /// list of parameter names, from `--param`
    ParamList,
    /// parameter mapping, from `--set name=value`
    ParamMap,
    Fields(&'static [Field]),
}

/// Values collected from the command line for building a body.
#[derive(Debug, Default)]
pub struct BodyInput {
    pub params: Vec<String>,
    pub settings: Vec<String>,
    pub fields: HashMap<String, String>,
}

#[derive(Debug)]
pub struct Entry {
    pub name: &'static str,
    pub about: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
    pub body: BodyKind,
    pub timeout_ms: u64,
}

impl Entry {
    /// `None` means the request carries no entity.
    pub fn build_body(&self, input: &BodyInput) -> ExecResult<Option<Value>> {
        match self.body {
            BodyKind::Nothing => Ok(None),
            BodyKind::EmptyObject => Ok(Some(json!({}))),
            BodyKind::ParamList => {
                if input.params.is_empty() {
                    return Err(ExecutionError::InvalidArgument(format!(
                        "{} needs at least one --param",
                        self.name
                    )));
                }
                Ok(Some(Value::from(input.params.clone())))
            }
            BodyKind::ParamMap => {
                let mut body = Map::new();
                for setting in input.settings.iter() {
                    let (name, value) = setting.split_once('=').ok_or_else(|| {
                        ExecutionError::InvalidArgument(format!(
                            "\"{}\" is not in the name=value form",
                            setting
                        ))
                    })?;
                    body.insert(name.to_string(), Value::from(value));
                }
                if body.is_empty() {
                    return Err(ExecutionError::InvalidArgument(format!(
                        "{} needs at least one --set",
                        self.name
                    )));
                }
                Ok(Some(Value::Object(body)))
            }
            BodyKind::Fields(fields) => {
                let mut body = Map::new();
                for field in fields {
                    let value = input
                        .fields
                        .get(field.arg)
                        .map(String::as_str)
                        .or(field.default)
                        .ok_or_else(|| {
                            ExecutionError::InvalidArgument(format!("--{} is missing", field.arg))
                        })?;
                    body.insert(field.key.to_string(), Value::from(value));
                }
                Ok(Some(Value::Object(body)))
            }
        }
    }

    pub fn fields(&self) -> &'static [Field] {
        match self.body {
            BodyKind::Fields(fields) => fields,
            _ => &[],
        }
    }
}

const GENERIC: u64 = DispatchOptions::DEFAULT_TIMEOUT_MS;

const fn get(name: &'static str, about: &'static str, path: &'static str) -> Entry {
    Entry {
        name,
        about,
        method: HttpMethod::Get,
        path,
        body: BodyKind::Nothing,
        timeout_ms: GENERIC,
    }
}

const fn post(
    name: &'static str,
    about: &'static str,
    path: &'static str,
    body: BodyKind,
) -> Entry {
    Entry {
        name,
        about,
        method: HttpMethod::Post,
        path,
        body,
        timeout_ms: GENERIC,
    }
}

pub const CATALOGUE: &[Entry] = &[
    get("device-info", "Model, firmware and uptime", "mgmt/device/info"),
    get("network-info", "Addressing and DNS settings", "mgmt/network/info"),
    get("network-stats", "Packet counters", "mgmt/network/stats"),
    get("running-config", "Provisioning and boot configuration", "mgmt/device/runningConfig"),
    get("line-info", "Registered lines", "mgmt/lineInfo"),
    get("call-status", "Active call", "webCallControl/callStatus"),
    get("sip-status", "SIP registration state", "webCallControl/sipStatus"),
    get("call-logs", "Missed, received and placed calls", "mgmt/callLogs"),
    get("session-stats", "Media statistics of the running session", "mgmt/media/sessionStats"),
    get("transfer-type", "Default transfer type", "mgmt/transferType/get"),
    post("reboot", "Reboot the phone", "mgmt/safeReboot", BodyKind::EmptyObject),
    post("restart", "Restart the phone application", "mgmt/safeRestart", BodyKind::EmptyObject),
    post("factory-reset", "Restore factory defaults", "mgmt/factoryReset", BodyKind::EmptyObject),
    post("config-reset", "Drop local and web configuration", "mgmt/configReset", BodyKind::EmptyObject),
    post(
        "update-config",
        "Fetch configuration from the provisioning server",
        "mgmt/updateConfiguration",
        BodyKind::EmptyObject,
    ),
    post("config-get", "Read configuration parameters", "mgmt/config/get", BodyKind::ParamList),
    post("config-set", "Write configuration parameters", "mgmt/config/set", BodyKind::ParamMap),
    post(
        "set-transfer-type",
        "Change the default transfer type",
        "mgmt/transferType/set",
        BodyKind::Fields(&[Field {
            key: "Type",
            arg: "type",
            help: "Blind or Consultative",
            default: None,
        }]),
    ),
    Entry {
        name: "dial",
        about: "Place an outbound call",
        method: HttpMethod::Post,
        path: "callctrl/dial",
        body: BodyKind::Fields(&[
            Field {
                key: "Dest",
                arg: "dest",
                help: "number or URI to call",
                default: None,
            },
            Field {
                key: "Line",
                arg: "line",
                help: "line to call from",
                default: Some("1"),
            },
            Field {
                key: "Type",
                arg: "type",
                help: "SIP or TEL",
                default: Some("SIP"),
            },
        ]),
        timeout_ms: DispatchOptions::CALL_TIMEOUT_MS,
    },
    post(
        "end-call",
        "Hang up a call",
        "callctrl/endCall",
        BodyKind::Fields(&[Field {
            key: "Ref",
            arg: "ref",
            help: "call reference from call-status",
            default: None,
        }]),
    ),
    post(
        "simulate-key",
        "Press a key",
        "mgmt/simulateKeyEvent",
        BodyKind::Fields(&[Field {
            key: "Key",
            arg: "key",
            help: "key name, e.g. Home or Line1",
            default: None,
        }]),
    ),
];

pub fn find(name: &str) -> Option<&'static Entry> {
    CATALOGUE.iter().find(|entry| entry.name == name)
}
