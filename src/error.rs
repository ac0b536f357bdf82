use core::time::Duration;
use std::path::{Path, PathBuf};

use crate::{Parity, StopBits};

/// An error that can occur while opening, configuring or using a serial port.
#[derive(Debug)]
pub enum Error {
	InvalidField(InvalidField),
	InvalidPort(InvalidPort),
	Syscall(SyscallFailure),
}

/// A [`Config`](crate::Config) field holds a value the platform can not represent.
///
/// This error is raised before any native call is made,
/// so the port (if any) is left in its previous state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InvalidField {
	DataBits(u8),
	StopBits(StopBits),
	Parity(Parity),
	Timeout(Duration),
}

/// The serial port could not be opened.
#[derive(Debug)]
pub struct InvalidPort {
	pub path: PathBuf,
	pub source: std::io::Error,
}

/// A native call failed.
#[derive(Debug)]
pub struct SyscallFailure {
	pub operation: Operation,
	pub source: std::io::Error,
}

/// The native operation that failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Operation {
	/// Reading the line settings (`TCGETS2`, `tcgetattr` or `GetCommState`).
	GetState,
	/// Applying the line settings (`TCSETS2`, `tcsetattr` or `SetCommState`).
	SetState,
	/// Reading the timeouts (`GetCommTimeouts`).
	GetTimeouts,
	/// Applying the timeouts (`SetCommTimeouts`).
	SetTimeouts,
	Read,
	Write,
	/// Purging the input and output queues.
	Discard,
	Close,
}

impl InvalidField {
	/// The name of the offending field.
	pub fn name(&self) -> &'static str {
		match self {
			Self::DataBits(_) => "data_bits",
			Self::StopBits(_) => "stop_bits",
			Self::Parity(_) => "parity",
			Self::Timeout(_) => "timeout",
		}
	}
}

impl InvalidPort {
	pub fn new(path: &Path, source: std::io::Error) -> Self {
		Self {
			path: path.to_owned(),
			source,
		}
	}
}

impl SyscallFailure {
	pub fn new(operation: Operation, source: std::io::Error) -> Self {
		Self { operation, source }
	}

	/// Wrap the last OS error of the current thread.
	pub fn last_os_error(operation: Operation) -> Self {
		Self::new(operation, std::io::Error::last_os_error())
	}

	/// Get the raw OS error code, if any.
	pub fn raw_os_error(&self) -> Option<i32> {
		self.source.raw_os_error()
	}
}

impl Error {
	/// Get the raw OS error code, if the error came from the operating system.
	pub fn raw_os_error(&self) -> Option<i32> {
		match self {
			Self::InvalidField(_) => None,
			Self::InvalidPort(e) => e.source.raw_os_error(),
			Self::Syscall(e) => e.raw_os_error(),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::InvalidField(_) => None,
			Self::InvalidPort(e) => Some(&e.source),
			Self::Syscall(e) => Some(&e.source),
		}
	}
}

impl std::error::Error for InvalidField {}

impl std::error::Error for InvalidPort {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.source)
	}
}

impl std::error::Error for SyscallFailure {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.source)
	}
}

impl From<InvalidField> for Error {
	fn from(other: InvalidField) -> Self {
		Self::InvalidField(other)
	}
}

impl From<InvalidPort> for Error {
	fn from(other: InvalidPort) -> Self {
		Self::InvalidPort(other)
	}
}

impl From<SyscallFailure> for Error {
	fn from(other: SyscallFailure) -> Self {
		Self::Syscall(other)
	}
}

impl From<Error> for std::io::Error {
	fn from(other: Error) -> Self {
		match other {
			Error::InvalidField(e) => std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
			Error::InvalidPort(e) => e.source,
			Error::Syscall(e) => e.source,
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::InvalidField(e) => write!(f, "{}", e),
			Self::InvalidPort(e) => write!(f, "{}", e),
			Self::Syscall(e) => write!(f, "{}", e),
		}
	}
}

impl std::fmt::Display for InvalidField {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::DataBits(x) => write!(f, "invalid data bits, expected 5, 6, 7 or 8, got {}", x),
			Self::StopBits(x) => write!(f, "stop bits not supported on this platform: {}", x),
			Self::Parity(x) => write!(f, "parity not supported on this platform: {}", x),
			Self::Timeout(x) => write!(f, "timeout can not be represented on this platform: {:?}", x),
		}
	}
}

impl std::fmt::Display for InvalidPort {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "failed to open serial port {}: {}", self.path.display(), self.source)
	}
}

impl std::fmt::Display for Operation {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::GetState => write!(f, "read line settings"),
			Self::SetState => write!(f, "apply line settings"),
			Self::GetTimeouts => write!(f, "read timeouts"),
			Self::SetTimeouts => write!(f, "apply timeouts"),
			Self::Read => write!(f, "read from serial port"),
			Self::Write => write!(f, "write to serial port"),
			Self::Discard => write!(f, "discard buffers"),
			Self::Close => write!(f, "close serial port"),
		}
	}
}

impl std::fmt::Display for SyscallFailure {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "failed to {}: {}", self.operation, self.source)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::{assert, let_assert};

	#[test]
	fn invalid_field_names_the_field_and_value() {
		let e = InvalidField::DataBits(9);
		assert!(e.name() == "data_bits");
		assert!(e.to_string() == "invalid data bits, expected 5, 6, 7 or 8, got 9");
		assert!(InvalidField::Parity(Parity::MARK).to_string() == "parity not supported on this platform: mark");
	}

	#[test]
	fn syscall_failure_keeps_the_os_error() {
		let e = Error::from(SyscallFailure::new(Operation::Close, std::io::Error::from_raw_os_error(9)));
		assert!(e.raw_os_error() == Some(9));
		assert!(e.to_string().starts_with("failed to close serial port: "));
		let_assert!(Some(source) = std::error::Error::source(&e));
		let_assert!(Some(io) = source.downcast_ref::<std::io::Error>());
		assert!(io.raw_os_error() == Some(9));
	}

	#[test]
	fn invalid_field_becomes_invalid_input() {
		let io = std::io::Error::from(Error::from(InvalidField::Timeout(Duration::from_micros(1))));
		assert!(io.kind() == std::io::ErrorKind::InvalidInput);
		assert!(io.raw_os_error() == None);
	}
}
