use crate::config::{VvxConfig, VvxConfigSrc};
use crate::error::{ExecResult, ExecutionError};
use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target as ConsoleAppenderTarget},
        file::FileAppender,
        Append,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    init_config,
};

const LOG_PATTERN: &str = "{d(%H:%M:%S%.3f)} {h({l:<5})} {m}{n}";

fn level_filter(log_level: &str) -> ExecResult<LevelFilter> {
    match log_level {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        level => Err(ExecutionError::Logger(format!(
            "Unsupported logging level {}",
            level
        ))),
    }
}

fn appender(log_dest: &str) -> ExecResult<Box<dyn Append>> {
    let encoder = Box::new(PatternEncoder::new(LOG_PATTERN));
    if log_dest == VvxConfigSrc::LOG_DEST_STDOUT {
        Ok(Box::new(
            ConsoleAppender::builder()
                .encoder(encoder)
                .target(ConsoleAppenderTarget::Stdout)
                .build(),
        ))
    } else if log_dest == VvxConfigSrc::LOG_DEST_STDERR {
        Ok(Box::new(
            ConsoleAppender::builder()
                .encoder(encoder)
                .target(ConsoleAppenderTarget::Stderr)
                .build(),
        ))
    } else if let Some(path) = log_dest.strip_prefix("file:") {
        let file = FileAppender::builder()
            .encoder(encoder)
            .build(path)
            .map_err(|err| ExecutionError::Logger(format!("cannot open {}: {}", path, err)))?;
        Ok(Box::new(file))
    } else {
        Err(ExecutionError::Logger(format!(
            "Unsupported log destination \"{}\"",
            log_dest
        )))
    }
}

pub fn init_logger(config: &VvxConfig) -> ExecResult<()> {
    let level_filter = level_filter(&config.log_level)?;
    let log_config = Config::builder()
        .appender(Appender::builder().build("vvx", appender(&config.log_dest)?))
        .build(Root::builder().appender("vvx").build(level_filter))
        .map_err(|err| ExecutionError::Logger(err.to_string()))?;

    init_config(log_config)
        .map(|_| ())
        .map_err(|err| ExecutionError::Logger(err.to_string()))
}
