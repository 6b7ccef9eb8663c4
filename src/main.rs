mod commands;
mod config;
mod github;

use std::process::ExitCode;

fn main() -> ExitCode {
    match commands::Cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            if err.downcast_ref::<config::NotConfigured>().is_some() {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}
