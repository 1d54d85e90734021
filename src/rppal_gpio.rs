use crate::gpio::{Direction, GpioControl, GpioError, Level, PinNumber};
use rppal::gpio::{self, Gpio, IoPin, Mode};
use std::collections::HashMap;

/// GPIO access through rppal on a Raspberry Pi.
///
/// Exporting acquires the pin from rppal, unexporting drops it, which
/// restores the pin mode rppal found it in.
#[derive(Debug)]
pub struct RppalGpio {
    gpio: Gpio,
    pins: HashMap<PinNumber, IoPin>,
}

impl RppalGpio {
    pub fn new() -> Result<RppalGpio, GpioError> {
        Ok(RppalGpio {
            gpio: Gpio::new()?,
            pins: HashMap::new(),
        })
    }

    fn pin(&mut self, pin: PinNumber) -> Result<&mut IoPin, GpioError> {
        self.pins.get_mut(&pin).ok_or(GpioError::NotExported(pin))
    }
}

impl GpioControl for RppalGpio {
    fn export(&mut self, pin: PinNumber) -> Result<(), GpioError> {
        if self.pins.contains_key(&pin) {
            return Ok(());
        }

        let bcm = u8::try_from(pin).map_err(|_| GpioError::PinOutOfRange(pin))?;
        let io_pin = self.gpio.get(bcm)?.into_io(Mode::Input);
        self.pins.insert(pin, io_pin);

        Ok(())
    }

    fn unexport(&mut self, pin: PinNumber) -> Result<(), GpioError> {
        self.pins
            .remove(&pin)
            .map(drop)
            .ok_or(GpioError::NotExported(pin))
    }

    fn set_direction(&mut self, pin: PinNumber, direction: Direction) -> Result<(), GpioError> {
        let mode = match direction {
            Direction::In => Mode::Input,
            Direction::Out => Mode::Output,
        };
        self.pin(pin)?.set_mode(mode);

        Ok(())
    }

    fn read_value(&mut self, pin: PinNumber) -> Result<Level, GpioError> {
        Ok(match self.pin(pin)?.read() {
            gpio::Level::Low => Level::Low,
            gpio::Level::High => Level::High,
        })
    }

    fn write_value(&mut self, pin: PinNumber, level: Level) -> Result<(), GpioError> {
        let level = match level {
            Level::Low => gpio::Level::Low,
            Level::High => gpio::Level::High,
        };
        self.pin(pin)?.write(level);

        Ok(())
    }
}
