extern crate bytes;
extern crate clap;
extern crate colored;
extern crate log;
extern crate log4rs;
#[cfg(test)]
extern crate maplit;
extern crate network_interface;
extern crate rand;
extern crate regex;
extern crate serde;
extern crate serde_json;
extern crate sip_packets;
extern crate socket2;
extern crate tokio_util;
extern crate toml;
extern crate vvx_proto;
extern crate vvx_rest;

mod cli;
mod commands;
mod config;
mod error;
mod local_net;
mod logger;
mod probe;
mod render;

use std::process::exit;

fn main() {
    let mut cmd = cli::make_command();
    let args = cmd.clone().get_matches();

    let code = match args.subcommand() {
        Some((name, sub_args)) => match cli::exec_command(name, sub_args) {
            Ok(true) => 0,
            // some device of the batch failed, already reported
            Ok(false) => 1,
            Err(err) => {
                render::error(&err);
                2
            }
        },
        None => {
            println!("{}", cmd.render_help());
            0
        }
    };
    exit(code);
}
