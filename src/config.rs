use crate::gpio::PinNumber;
use tokio::time::Duration;

/// Print a diagnostic line when the configuration asks for verbose output.
macro_rules! verbose {
    ($config:expr, $($arg:tt)*) => {
        if $config.verbose {
            println!($($arg)*);
        }
    };
}

/// Header pin 37.
pub const DEFAULT_INPUT_PIN: PinNumber = 26;
/// Header pin 36.
pub const OUTPUT_PIN: PinNumber = 16;

pub const SAMPLE_COUNT: u32 = 5;
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);
pub const SHUTDOWN_THRESHOLD: i32 = 4;
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(100);

/// Settings for a single check, fixed before the first GPIO is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_pin: PinNumber,
    pub output_pin: PinNumber,
    pub verbose: bool,
    pub ready_timeout: Duration,
}

impl Config {
    pub fn new(pin_arg: Option<&str>, verbose: bool, ready_timeout: Duration) -> Config {
        Config {
            input_pin: resolve_input_pin(pin_arg),
            output_pin: OUTPUT_PIN,
            verbose,
            ready_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new(None, false, DEFAULT_READY_TIMEOUT)
    }
}

/// True for a non-empty string made only of ASCII decimal digits.
pub fn is_valid_gpio(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Input pin named by the first argument, or the default if it is not a pin.
pub fn resolve_input_pin(pin_arg: Option<&str>) -> PinNumber {
    pin_arg
        .filter(|arg| is_valid_gpio(arg))
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_INPUT_PIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_are_valid() {
        for value in ["0", "7", "26", "0042", "123456789"] {
            assert!(is_valid_gpio(value), "{}", value);
        }
    }

    #[test]
    fn empty_and_non_digits_are_invalid() {
        for value in ["", "abc", "2a", "a2", " 26", "26 ", "-5", "+5", "1.5", "٣"] {
            assert!(!is_valid_gpio(value), "{:?}", value);
        }
    }

    #[test]
    fn valid_argument_overrides_input_pin() {
        assert_eq!(resolve_input_pin(Some("17")), 17);
        assert_eq!(resolve_input_pin(Some("007")), 7);
        assert_eq!(Config::new(Some("5"), false, DEFAULT_READY_TIMEOUT).input_pin, 5);
    }

    #[test]
    fn invalid_argument_falls_back_to_default() {
        assert_eq!(resolve_input_pin(None), DEFAULT_INPUT_PIN);
        assert_eq!(resolve_input_pin(Some("abc")), 26);
        assert_eq!(resolve_input_pin(Some("")), 26);
        assert_eq!(resolve_input_pin(Some("99999999999999999999")), 26);
    }

    #[test]
    fn output_pin_is_fixed() {
        let config = Config::new(Some("16"), true, DEFAULT_READY_TIMEOUT);
        assert_eq!(config.output_pin, OUTPUT_PIN);
        assert_eq!(Config::default().output_pin, 16);
        assert!(!Config::default().verbose);
    }
}
