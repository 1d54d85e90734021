use crate::gpio::{Direction, GpioControl, GpioError, Level, PinNumber};
use sysfs_gpio::Pin;

/// GPIO access through the legacy `/sys/class/gpio` interface.
///
/// Export and unexport are no-ops when the pin is already in the requested
/// state, so a pin left exported by an earlier run is picked up again.
#[derive(Debug, Default)]
pub struct SysfsGpio;

impl SysfsGpio {
    pub fn new() -> SysfsGpio {
        SysfsGpio
    }

    fn pin(pin: PinNumber) -> Pin {
        Pin::new(u64::from(pin))
    }
}

impl GpioControl for SysfsGpio {
    fn export(&mut self, pin: PinNumber) -> Result<(), GpioError> {
        Ok(Self::pin(pin).export()?)
    }

    fn unexport(&mut self, pin: PinNumber) -> Result<(), GpioError> {
        Ok(Self::pin(pin).unexport()?)
    }

    fn set_direction(&mut self, pin: PinNumber, direction: Direction) -> Result<(), GpioError> {
        let direction = match direction {
            Direction::In => sysfs_gpio::Direction::In,
            Direction::Out => sysfs_gpio::Direction::Out,
        };

        Ok(Self::pin(pin).set_direction(direction)?)
    }

    fn read_value(&mut self, pin: PinNumber) -> Result<Level, GpioError> {
        match Self::pin(pin).get_value()? {
            0 => Ok(Level::Low),
            1 => Ok(Level::High),
            value => Err(GpioError::Malformed {
                pin,
                value: value.to_string(),
            }),
        }
    }

    fn write_value(&mut self, pin: PinNumber, level: Level) -> Result<(), GpioError> {
        let value = match level {
            Level::Low => 0,
            Level::High => 1,
        };

        Ok(Self::pin(pin).set_value(value)?)
    }
}
