use assert2::let_assert;
use serial_line::{Config, Port};
use std::time::Duration;

static SERIAL_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
const DEFAULT_SERIAL_PATH: &str = "/dev/ttyUSB0";
const DEFAULT_BAUD: u32 = 9600;

/// Run a test against a real serial port with its TX and RX lines connected.
///
/// The port is taken from `SERIAL_PATH` and the baud rate from `SERIAL_BAUD`.
pub fn run(test: impl FnOnce(Config, Port)) {
	// prevent multiple threads trying to use the serial port
	let _lock = SERIAL_MUTEX.lock();
	let path = std::env::var("SERIAL_PATH").unwrap_or(DEFAULT_SERIAL_PATH.to_string());
	let baud = std::env::var("SERIAL_BAUD")
		.map(|s| {
			let_assert!(Ok(s) = s.parse(), "unable to parse SERIAL_BAUD {} into u32", s);
			s
		})
		.unwrap_or(DEFAULT_BAUD);
	let config = Config::with_baud_rate(baud).timeout(Duration::from_millis(100));
	let_assert!(Ok(port) = Port::open(&path, &config), "unable to open serial port at {}", path);
	test(config, port)
}
