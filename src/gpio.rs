use thiserror::Error;

/// GPIO line number as understood by the kernel.
pub type PinNumber = u32;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl Level {
    /// Level for the parity of a countdown value: even is low, odd is high.
    pub fn from_parity(value: u32) -> Level {
        if value % 2 == 0 {
            Level::Low
        } else {
            Level::High
        }
    }

    pub fn value(&self) -> i32 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Control surface for a set of GPIO lines addressed by number.
///
/// Implementations are expected to be called in the order
/// export, set_direction, read/write, set_direction, unexport.
pub trait GpioControl {
    fn export(&mut self, pin: PinNumber) -> Result<(), GpioError>;

    fn unexport(&mut self, pin: PinNumber) -> Result<(), GpioError>;

    fn set_direction(&mut self, pin: PinNumber, direction: Direction) -> Result<(), GpioError>;

    fn read_value(&mut self, pin: PinNumber) -> Result<Level, GpioError>;

    fn write_value(&mut self, pin: PinNumber, level: Level) -> Result<(), GpioError>;
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GpioError {
    #[error("GPIO {pin} returned malformed value {value:?}.")]
    Malformed { pin: PinNumber, value: String },

    #[error("GPIO {0} is not exported.")]
    NotExported(PinNumber),

    #[error("GPIO {0} is out of range for this backend.")]
    PinOutOfRange(PinNumber),

    #[error(transparent)]
    Sysfs(#[from] sysfs_gpio::Error),

    #[error(transparent)]
    Rppal(#[from] rppal::gpio::Error),
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_levels() {
        assert_eq!(Level::from_parity(4), Level::Low);
        assert_eq!(Level::from_parity(3), Level::High);
        assert_eq!(Level::from_parity(0), Level::Low);
    }

    #[test]
    fn display_strings() {
        assert_eq!(Direction::In.to_string(), "in");
        assert_eq!(Direction::Out.to_string(), "out");
        assert_eq!(Level::Low.to_string(), "0");
        assert_eq!(Level::High.to_string(), "1");
    }
}
