//! Native back-ends.
//!
//! The [`Translator`] trait converts a [`Config`] to and from the native control structures of a platform,
//! and applies them to a native [`Handle`].
//! Exactly one translator is selected at build time and exposed as [`NativeTranslator`].

use std::path::Path;

use crate::validate::Rules;
use crate::{Config, SyscallFailure};

#[cfg(unix)]
pub mod unix;

#[cfg(any(windows, test))]
pub mod windows;

#[cfg(unix)]
pub type NativeTranslator = unix::Termios;

#[cfg(windows)]
pub type NativeTranslator = windows::CommState;

#[cfg(not(any(unix, windows)))]
compile_error!("serial-line only supports Unix and Windows targets");

/// An open native handle to a serial device.
///
/// These are the raw operating system primitives a [`Port`](crate::Port) delegates to.
/// A closed handle must keep issuing the native calls, so that they fail with the error the OS reports for an invalid handle.
pub trait Handle: Sized {
	/// Open the device at the given path for reading and writing.
	fn open(path: &Path) -> std::io::Result<Self>;

	/// Read available bytes into the buffer, blocking according to the configured timeout.
	fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize>;

	/// Write bytes from the buffer, returning how many were accepted.
	fn write(&mut self, buffer: &[u8]) -> std::io::Result<usize>;

	/// Discard received but unread bytes and written but untransmitted bytes.
	fn discard_buffers(&mut self) -> std::io::Result<()>;

	/// Release the native handle.
	///
	/// The handle is invalid afterwards, even if the native call reported an error.
	fn close(&mut self) -> std::io::Result<()>;

	/// Check if the handle has not been closed yet.
	fn is_open(&self) -> bool;
}

/// Conversion between a [`Config`] and the native control structures of a platform.
pub trait Translator {
	/// The native handle the control structures are applied to.
	type Handle: Handle;

	/// The native representation of a configuration.
	type Block;

	/// The values each [`Config`] field may take on this platform.
	const RULES: &'static Rules;

	/// Translate a validated configuration into its native representation.
	///
	/// # Panics
	/// May panic if the configuration did not pass [`validate()`](crate::validate::validate) with [`Self::RULES`].
	fn forward(config: &Config) -> Self::Block;

	/// Translate a native representation back into a configuration.
	///
	/// This never fails: native values without a named constant are passed through as raw values.
	fn reverse(block: &Self::Block) -> Config;

	/// Apply the native representation to an open handle.
	fn apply(handle: &mut Self::Handle, block: &Self::Block) -> Result<(), SyscallFailure>;

	/// Read the live native representation from an open handle.
	fn query(handle: &Self::Handle) -> Result<Self::Block, SyscallFailure>;
}
