use std::io::Error as IoError;
use thiserror::Error;
use vvx_rest::RestError;

use crate::config::VvxConfigError;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("configuration error: {0}")]
    Config(#[from] VvxConfigError),

    #[error("logger error: {0}")]
    Logger(String),

    #[error(transparent)]
    Rest(#[from] RestError),

    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error("cannot list network interfaces: {0}")]
    NetworkInterface(#[from] network_interface::Error),

    #[error("no usable local IPv4 address found")]
    NoLocalAddress,

    #[error("no free local UDP port found after {0} tries")]
    NoFreePort(usize),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type ExecResult<T> = Result<T, ExecutionError>;
