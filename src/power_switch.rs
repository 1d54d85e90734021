use crate::config::{Config, SAMPLE_COUNT, SAMPLE_INTERVAL, SHUTDOWN_THRESHOLD};
use crate::gpio::{Direction, GpioControl, GpioError, Level, PinNumber};
use crate::shutdown::ShutdownAction;
use thiserror::Error;
use tokio::select;
use tokio::time::{sleep, Duration, Instant};
use tokio_util::sync::CancellationToken;

/// First pause between direction attempts while a fresh export settles.
const READY_BACKOFF: Duration = Duration::from_millis(10);

/// Contribution of a failed read to the shutdown count.
const READ_FAILURE: i32 = -1;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("GPIO control surface unavailable: {0}")]
    Unavailable(#[source] GpioError),

    #[error("Failed to export GPIO {pin}: {source}")]
    Export { pin: PinNumber, source: GpioError },

    #[error("Failed to set direction of GPIO {pin}: {source}")]
    Direction { pin: PinNumber, source: GpioError },

    #[error("Failed to blink light on GPIO {pin}: {source}")]
    Write { pin: PinNumber, source: GpioError },

    #[error("Failed to unexport GPIO {pin}: {source}")]
    Unexport { pin: PinNumber, source: GpioError },

    #[error("Failed to reset GPIO {pin}: {source}")]
    Reset { pin: PinNumber, source: GpioError },

    #[error("Interrupted before sampling finished.")]
    Interrupted,
}

impl SequenceError {
    /// Process exit status reported for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            SequenceError::Unavailable(_) | SequenceError::Export { .. } => 1,
            SequenceError::Direction { .. } => 2,
            SequenceError::Write { .. } => 3,
            SequenceError::Unexport { .. } => 4,
            SequenceError::Reset { .. } => 5,
            SequenceError::Interrupted => 130,
        }
    }
}

/// Outcome of a completed sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// One entry per sample, `None` where the read failed.
    pub samples: Vec<Option<Level>>,
    pub shutdown_count: i32,
}

impl Report {
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_count >= SHUTDOWN_THRESHOLD
    }
}

/// Hand the report to `action` if it asks for a shutdown.
pub fn decide(report: &Report, action: &dyn ShutdownAction) -> bool {
    if report.shutdown_requested() {
        action.shutdown(report.shutdown_count);
        return true;
    }

    false
}

pub struct PowerSwitch<'a> {
    gpio: &'a mut dyn GpioControl,
    config: &'a Config,
}

impl<'a> PowerSwitch<'a> {
    pub fn new(gpio: &'a mut dyn GpioControl, config: &'a Config) -> PowerSwitch<'a> {
        PowerSwitch { gpio, config }
    }

    /// Export, sample the input pin while blinking the output pin, then release both.
    pub async fn run(&mut self, cancellation_token: CancellationToken) -> Result<Report, SequenceError> {
        self.setup().await?;

        let report = match self.sample(&cancellation_token).await {
            Ok(report) => report,
            Err(err) => {
                self.release();
                return Err(err);
            }
        };

        self.teardown()?;
        verbose!(self.config, "Done!");

        Ok(report)
    }

    fn pins(&self) -> [(PinNumber, Direction); 2] {
        [
            (self.config.output_pin, Direction::Out),
            (self.config.input_pin, Direction::In),
        ]
    }

    async fn setup(&mut self) -> Result<(), SequenceError> {
        let mut exported = Vec::with_capacity(2);

        for (pin, _) in self.pins() {
            verbose!(self.config, "GPIO Export {}", pin);

            if let Err(source) = self.gpio.export(pin) {
                self.rollback(&exported);
                return Err(SequenceError::Export { pin, source });
            }
            exported.push(pin);
        }

        let deadline = Instant::now() + self.config.ready_timeout;

        for (pin, direction) in self.pins() {
            verbose!(self.config, "GPIO Direction {} {}", pin, direction);

            if let Err(source) = self.configure(pin, direction, deadline).await {
                self.rollback(&exported);
                return Err(SequenceError::Direction { pin, source });
            }
        }

        Ok(())
    }

    /// Freshly exported pins can take a moment to appear, so retry until `deadline`.
    async fn configure(
        &mut self,
        pin: PinNumber,
        direction: Direction,
        deadline: Instant,
    ) -> Result<(), GpioError> {
        let mut backoff = READY_BACKOFF;

        loop {
            match self.gpio.set_direction(pin, direction) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(err);
                    }

                    verbose!(self.config, "GPIO {} not ready: {}", pin, err);
                    sleep(backoff.min(deadline - now)).await;
                    backoff *= 2;
                }
            }
        }
    }

    async fn sample(&mut self, cancellation_token: &CancellationToken) -> Result<Report, SequenceError> {
        let output_pin = self.config.output_pin;
        let input_pin = self.config.input_pin;
        let mut samples = Vec::with_capacity(SAMPLE_COUNT as usize);
        let mut shutdown_count = 0;

        for remaining in (0..SAMPLE_COUNT).rev() {
            let level = Level::from_parity(remaining);
            verbose!(self.config, "GPIO Write {} {}", output_pin, level);

            self.gpio
                .write_value(output_pin, level)
                .map_err(|source| SequenceError::Write {
                    pin: output_pin,
                    source,
                })?;

            match self.gpio.read_value(input_pin) {
                Ok(level) => {
                    verbose!(self.config, "Found value {} in GPIO {}", level, input_pin);
                    shutdown_count += level.value();
                    samples.push(Some(level));
                }
                Err(err) => {
                    eprintln!("Failed to read GPIO {}: {}", input_pin, err);
                    shutdown_count += READ_FAILURE;
                    samples.push(None);
                }
            }

            select! {
                _ = cancellation_token.cancelled() => return Err(SequenceError::Interrupted),
                _ = sleep(SAMPLE_INTERVAL) => {}
            }
        }

        Ok(Report {
            samples,
            shutdown_count,
        })
    }

    fn teardown(&mut self) -> Result<(), SequenceError> {
        let input_pin = self.config.input_pin;
        let output_pin = self.config.output_pin;

        for pin in [input_pin, output_pin] {
            verbose!(self.config, "GPIO Direction {} {}", pin, Direction::In);
            self.gpio
                .set_direction(pin, Direction::In)
                .map_err(|source| SequenceError::Reset { pin, source })?;
        }

        for pin in [input_pin, output_pin] {
            verbose!(self.config, "GPIO Unexport {}", pin);
            self.gpio
                .unexport(pin)
                .map_err(|source| SequenceError::Unexport { pin, source })?;
        }

        Ok(())
    }

    /// Best-effort teardown after a failure once both pins are configured.
    fn release(&mut self) {
        let pins = [self.config.input_pin, self.config.output_pin];

        for pin in pins {
            if let Err(err) = self.gpio.set_direction(pin, Direction::In) {
                verbose!(self.config, "Ignoring reset failure: {}", err);
            }
        }

        self.rollback(&pins);
    }

    fn rollback(&mut self, exported: &[PinNumber]) {
        for pin in exported {
            if let Err(err) = self.gpio.unexport(*pin) {
                verbose!(self.config, "Ignoring unexport failure: {}", err);
            }
        }
    }
}
