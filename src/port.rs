use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::error::{Error, InvalidPort, Operation, SyscallFailure};
use crate::sys::{Handle, NativeTranslator, Translator};
use crate::Config;

/// An open and configured serial port.
///
/// A port exclusively owns its native handle.
/// It is created by [`Port::open()`] and released by [`Port::close()`] or when it is dropped.
///
/// The `T` type argument selects the [`Translator`] and defaults to the one for the current platform.
/// It only needs to be specified to substitute a different back-end, such as a mock in tests.
pub struct Port<T: Translator = NativeTranslator> {
	/// The path the port was opened with.
	path: PathBuf,

	/// The native handle.
	handle: T::Handle,

	_translator: PhantomData<fn() -> T>,
}

impl Port {
	/// Open the serial port at the given path and apply the configuration.
	///
	/// If the configuration can not be applied, the port is closed again before the error is returned.
	pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self, Error> {
		Self::open_with_translator(path, config)
	}
}

impl<T: Translator> Port<T> {
	/// Open a serial port using a specific translator.
	///
	/// This is [`Port::open()`] for back-ends other than the native one.
	#[cfg_attr(not(feature = "log"), allow(unused_variables))]
	pub fn open_with_translator(path: impl AsRef<Path>, config: &Config) -> Result<Self, Error> {
		let path = path.as_ref();
		let handle = <T::Handle as Handle>::open(path).map_err(|e| InvalidPort::new(path, e))?;
		debug!("opened serial port {}", path.display());

		let mut port = Self {
			path: path.to_owned(),
			handle,
			_translator: PhantomData,
		};

		if let Err(e) = port.set_config(config) {
			debug!("failed to configure {}, closing it again: {}", path.display(), e);
			if let Err(close_error) = port.handle.close() {
				warn!("failed to close {} after configuration error: {}", path.display(), close_error);
			}
			return Err(e);
		}

		Ok(port)
	}

	/// Get the path the port was opened with.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Get a reference to the native handle.
	pub fn handle(&self) -> &T::Handle {
		&self.handle
	}

	/// Read up to `buffer.len()` bytes.
	///
	/// Blocks according to the configured [`Config::timeout`].
	/// Returning zero bytes means the timeout expired without data arriving, which is not an error.
	pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Error> {
		let read = self.handle.read(buffer).map_err(|e| SyscallFailure::new(Operation::Read, e))?;
		trace!("read {} bytes from {}: {:02X?}", read, self.path.display(), &buffer[..read]);
		Ok(read)
	}

	/// Write bytes to the port.
	///
	/// Returns the number of bytes transmitted or queued, which may be less than `buffer.len()`.
	/// Use [`std::io::Write::write_all()`] to treat a short write as an error.
	pub fn write(&mut self, buffer: &[u8]) -> Result<usize, Error> {
		let written = self.handle.write(buffer).map_err(|e| SyscallFailure::new(Operation::Write, e))?;
		trace!("wrote {} of {} bytes to {}: {:02X?}", written, buffer.len(), self.path.display(), &buffer[..written]);
		Ok(written)
	}

	/// Discard all received but unread bytes and all written but untransmitted bytes.
	pub fn discard_buffers(&mut self) -> Result<(), Error> {
		self.handle
			.discard_buffers()
			.map_err(|e| SyscallFailure::new(Operation::Discard, e))?;
		trace!("discarded buffers of {}", self.path.display());
		Ok(())
	}

	/// Apply a new configuration.
	///
	/// The configuration is validated first.
	/// If it is invalid, no native call is made and the port keeps its current settings.
	pub fn set_config(&mut self, config: &Config) -> Result<(), Error> {
		crate::validate::validate(config, T::RULES)?;
		let block = T::forward(config);
		T::apply(&mut self.handle, &block)?;
		debug!("applied configuration to {}: {:?}", self.path.display(), config);
		Ok(())
	}

	/// Read the live configuration of the port.
	///
	/// The result may differ from the last applied configuration where the platform rounds values,
	/// such as the timeout granularity.
	pub fn config(&self) -> Result<Config, Error> {
		let block = T::query(&self.handle)?;
		Ok(T::reverse(&block))
	}

	/// Close the port.
	///
	/// Using the port after it has been closed, including closing it again,
	/// fails with the error the operating system reports for an invalid handle.
	pub fn close(&mut self) -> Result<(), Error> {
		debug!("closing serial port {}", self.path.display());
		self.handle
			.close()
			.map_err(|e| SyscallFailure::new(Operation::Close, e))?;
		Ok(())
	}
}

impl<T: Translator> Drop for Port<T> {
	#[cfg_attr(not(feature = "log"), allow(unused_variables))]
	fn drop(&mut self) {
		if self.handle.is_open() {
			if let Err(e) = self.handle.close() {
				warn!("failed to close serial port {}: {}", self.path.display(), e);
			}
		}
	}
}

impl<T> std::fmt::Debug for Port<T>
where
	T: Translator,
	T::Handle: std::fmt::Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Port")
			.field("path", &self.path)
			.field("handle", &self.handle)
			.finish()
	}
}

impl<T: Translator> std::io::Read for Port<T> {
	fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
		Ok(Port::<T>::read(self, buffer)?)
	}
}

impl<T: Translator> std::io::Write for Port<T> {
	fn write(&mut self, buffer: &[u8]) -> std::io::Result<usize> {
		Ok(Port::<T>::write(self, buffer)?)
	}

	/// Writes are not buffered in user space, so there is nothing to flush.
	///
	/// Note that this does not discard anything either, see [`Port::discard_buffers()`] for that.
	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

#[cfg(unix)]
impl<T> std::os::unix::io::AsRawFd for Port<T>
where
	T: Translator,
	T::Handle: std::os::unix::io::AsRawFd,
{
	fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
		self.handle.as_raw_fd()
	}
}

#[cfg(windows)]
impl<T> std::os::windows::io::AsRawHandle for Port<T>
where
	T: Translator,
	T::Handle: std::os::windows::io::AsRawHandle,
{
	fn as_raw_handle(&self) -> std::os::windows::io::RawHandle {
		self.handle.as_raw_handle()
	}
}
