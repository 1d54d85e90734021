#[macro_use]
mod config;
mod gpio;
mod power_switch;
mod rppal_gpio;
mod shutdown;
mod sysfs;

use chrono::Local;
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use config::{Config, DEFAULT_READY_TIMEOUT};
use gpio::GpioControl;
use power_switch::{PowerSwitch, SequenceError};
use rppal_gpio::RppalGpio;
use shutdown::ReportOnly;
use simple_signal::{self, Signal};
use std::process::ExitCode;
use sysfs::SysfsGpio;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Boot-time check of a power switch wired to a Raspberry Pi GPIO
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// GPIO watched for a shutdown request, 26 unless given as plain digits
    pin: Option<String>,

    /// Print every GPIO operation
    #[arg(short, long)]
    verbose: bool,

    /// How the GPIO lines are accessed
    #[arg(long, value_enum, default_value_t = Backend::Sysfs)]
    backend: Backend,

    /// Upper bound in milliseconds to wait for exported pins to become configurable
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_READY_TIMEOUT.as_millis() as u64)]
    ready_timeout: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Legacy /sys/class/gpio pseudo-files
    Sysfs,
    /// rppal register access on a Raspberry Pi
    Rppal,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(usage_exit_code(err.kind()));
        }
    };

    let config = Config::new(
        args.pin.as_deref(),
        args.verbose,
        Duration::from_millis(args.ready_timeout),
    );

    println!(
        "Pi Shutdown Check on GPIO {} at {}",
        config.input_pin,
        Local::now().format("%d-%m-%Y %H:%M:%S")
    );
    verbose!(config, "Verbose mode on");

    match check(&args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error {} - {}", err.exit_code(), err);
            ExitCode::from(err.exit_code())
        }
    }
}

/// Help and version requests succeed, any other parse error is a usage failure.
fn usage_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

async fn check(args: &Args, config: &Config) -> Result<(), SequenceError> {
    let mut gpio = open_backend(args)?;
    let cancellation_token = setup_signals();

    let report = PowerSwitch::new(gpio.as_mut(), config)
        .run(cancellation_token)
        .await?;

    if !power_switch::decide(&report, &ReportOnly) {
        verbose!(config, "No shutdown requested ({})", report.shutdown_count);
    }

    Ok(())
}

fn open_backend(args: &Args) -> Result<Box<dyn GpioControl>, SequenceError> {
    Ok(match args.backend {
        Backend::Sysfs => Box::new(SysfsGpio::new()),
        Backend::Rppal => Box::new(RppalGpio::new().map_err(SequenceError::Unavailable)?),
    })
}

fn setup_signals() -> CancellationToken {
    let cancellation_token = CancellationToken::new();

    // Sigint: Ctrl+C  Sigterm: Nice shutdown
    simple_signal::set_handler(&[Signal::Int, Signal::Term], {
        let cancellation_token_clone = cancellation_token.clone();
        move |_| {
            cancellation_token_clone.cancel();
        }
    });

    cancellation_token
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("pi-power-switch").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_without_arguments() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.pin, None);
        assert!(!args.verbose);
        assert_eq!(args.backend, Backend::Sysfs);
        assert_eq!(args.ready_timeout, 100);
        assert_eq!(Duration::from_millis(args.ready_timeout), DEFAULT_READY_TIMEOUT);
    }

    #[test]
    fn pin_and_verbose_flag() {
        let args = parse(&["17", "-v"]).unwrap();
        assert_eq!(args.pin.as_deref(), Some("17"));
        assert!(args.verbose);
    }

    #[test]
    fn non_numeric_pin_is_accepted_and_ignored() {
        let args = parse(&["abc"]).unwrap();
        let config = Config::new(args.pin.as_deref(), args.verbose, Duration::ZERO);
        assert_eq!(config.input_pin, 26);
    }

    #[test]
    fn help_is_not_a_usage_error() {
        let err = parse(&["-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(usage_exit_code(err.kind()), 0);
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        let err = parse(&["-x"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_eq!(usage_exit_code(err.kind()), 1);
    }

    #[test]
    fn usage_errors_do_not_collide_with_direction_failure() {
        let err = parse(&["17", "extra"]).unwrap_err();
        assert_eq!(usage_exit_code(err.kind()), 1);
        assert_eq!(usage_exit_code(ErrorKind::DisplayVersion), 0);
        assert_ne!(usage_exit_code(ErrorKind::InvalidValue), 2);
    }

    #[test]
    fn backend_selection() {
        let args = parse(&["--backend", "rppal", "--ready-timeout", "250"]).unwrap();
        assert_eq!(args.backend, Backend::Rppal);
        assert_eq!(args.ready_timeout, 250);
    }
}
