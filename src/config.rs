//! Serial line settings.

use core::time::Duration;

/// Common baud rates.
///
/// Any other rate may be used as well, as long as the driver of the port supports it.
pub mod baud {
	pub const B110: u32 = 110;
	pub const B300: u32 = 300;
	pub const B600: u32 = 600;
	pub const B1200: u32 = 1200;
	pub const B2400: u32 = 2400;
	pub const B4800: u32 = 4800;
	pub const B9600: u32 = 9600;
	pub const B14400: u32 = 14400;
	pub const B19200: u32 = 19200;
	pub const B38400: u32 = 38400;
	pub const B57600: u32 = 57600;
	pub const B115200: u32 = 115200;
	pub const B128000: u32 = 128000;
	pub const B256000: u32 = 256000;
}

/// The supported numbers of data bits per character.
pub mod data_bits {
	pub const DB5: u8 = 5;
	pub const DB6: u8 = 6;
	pub const DB7: u8 = 7;
	pub const DB8: u8 = 8;
}

/// The number of stop bits per character.
///
/// The wrapped value is the raw configuration value.
/// Native state read back from a port may contain values that have no named constant,
/// those are reported unchanged.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct StopBits(pub u8);

impl StopBits {
	/// One stop bit.
	pub const ONE: Self = Self(1);

	/// One and a half stop bits.
	///
	/// Only supported on Windows.
	pub const ONE_AND_HALF: Self = Self(15);

	/// Two stop bits.
	pub const TWO: Self = Self(2);
}

impl core::fmt::Debug for StopBits {
	fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
		match *self {
			Self::ONE => write!(f, "StopBits::ONE"),
			Self::ONE_AND_HALF => write!(f, "StopBits::ONE_AND_HALF"),
			Self::TWO => write!(f, "StopBits::TWO"),
			Self(raw) => write!(f, "StopBits({})", raw),
		}
	}
}

impl core::fmt::Display for StopBits {
	fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
		match *self {
			Self::ONE => write!(f, "1"),
			Self::ONE_AND_HALF => write!(f, "1.5"),
			Self::TWO => write!(f, "2"),
			Self(raw) => write!(f, "unknown ({})", raw),
		}
	}
}

/// The parity mode of the line.
///
/// The wrapped value is the raw configuration value.
/// Native state read back from a port may contain values that have no named constant,
/// those are reported unchanged.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Parity(pub u8);

impl Parity {
	/// No parity bit.
	pub const NONE: Self = Self(0);

	/// Odd parity.
	pub const ODD: Self = Self(1);

	/// Even parity.
	pub const EVEN: Self = Self(2);

	/// Parity bit always set.
	///
	/// Only supported on Windows.
	pub const MARK: Self = Self(3);

	/// Parity bit always cleared.
	///
	/// Only supported on Windows.
	pub const SPACE: Self = Self(4);
}

impl core::fmt::Debug for Parity {
	fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
		match *self {
			Self::NONE => write!(f, "Parity::NONE"),
			Self::ODD => write!(f, "Parity::ODD"),
			Self::EVEN => write!(f, "Parity::EVEN"),
			Self::MARK => write!(f, "Parity::MARK"),
			Self::SPACE => write!(f, "Parity::SPACE"),
			Self(raw) => write!(f, "Parity({})", raw),
		}
	}
}

impl core::fmt::Display for Parity {
	fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
		match *self {
			Self::NONE => write!(f, "none"),
			Self::ODD => write!(f, "odd"),
			Self::EVEN => write!(f, "even"),
			Self::MARK => write!(f, "mark"),
			Self::SPACE => write!(f, "space"),
			Self(raw) => write!(f, "unknown ({})", raw),
		}
	}
}

/// Configuration of a serial line.
///
/// A [`Config`] is a plain value.
/// It is checked against the rules of the current platform when it is applied to a [`Port`](crate::Port),
/// or explicitly with [`Config::validate()`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
	/// The baud rate in bits per second.
	pub baud_rate: u32,

	/// The number of data bits per character: 5, 6, 7 or 8.
	pub data_bits: u8,

	/// The number of stop bits.
	pub stop_bits: StopBits,

	/// The parity mode.
	pub parity: Parity,

	/// The maximum time a read waits for the first byte.
	///
	/// When it expires the read returns whatever has arrived, possibly nothing.
	/// The exact meaning depends on the platform:
	///
	/// * On Unix the timeout has a granularity of 100 milliseconds and saturates at 25.5 seconds.
	///   A timeout below 100 milliseconds (including zero) makes reads block until at least one byte is available, without any upper bound.
	/// * On Windows the timeout has a granularity of 1 millisecond.
	///   A timeout of zero makes reads return immediately with the bytes that are already buffered.
	pub timeout: Duration,
}

impl Default for Config {
	/// 115200 baud, 8 data bits, 1 stop bit, no parity and a 100 millisecond timeout.
	fn default() -> Self {
		Self {
			baud_rate: baud::B115200,
			data_bits: data_bits::DB8,
			stop_bits: StopBits::ONE,
			parity: Parity::NONE,
			timeout: Duration::from_millis(100),
		}
	}
}

impl Config {
	/// Create the default configuration with a different baud rate.
	pub fn with_baud_rate(baud_rate: u32) -> Self {
		Self {
			baud_rate,
			..Self::default()
		}
	}

	/// Set the number of data bits.
	#[must_use]
	pub fn data_bits(mut self, data_bits: u8) -> Self {
		self.data_bits = data_bits;
		self
	}

	/// Set the number of stop bits.
	#[must_use]
	pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
		self.stop_bits = stop_bits;
		self
	}

	/// Set the parity mode.
	#[must_use]
	pub fn parity(mut self, parity: Parity) -> Self {
		self.parity = parity;
		self
	}

	/// Set the read timeout.
	#[must_use]
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Check if the configuration can be applied on the current platform.
	pub fn validate(&self) -> Result<(), crate::InvalidField> {
		use crate::sys::Translator;
		crate::validate::validate(self, crate::sys::NativeTranslator::RULES)
	}
}
