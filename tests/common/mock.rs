use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serial_line::sys::{Handle, Translator};
use serial_line::validate::{self, Rules};
use serial_line::{Config, Operation, Port, SyscallFailure};

thread_local! {
	/// Devices that can be opened by path from the current test thread.
	static DEVICES: RefCell<HashMap<PathBuf, MockDevice>> = RefCell::new(HashMap::new());
}

/// Everything the mock back-end observed, and the knobs to make it misbehave.
#[derive(Debug, Default)]
pub struct DeviceState {
	/// The last applied settings.
	pub settings: Option<Config>,

	/// Bytes waiting to be read by the port.
	pub incoming: VecDeque<u8>,

	/// Bytes written by the port.
	pub outgoing: Vec<u8>,

	pub apply_calls: usize,
	pub query_calls: usize,
	pub discard_calls: usize,
	pub close_calls: usize,

	/// Make every apply fail after it was counted.
	pub fail_apply: bool,

	/// Accept at most this many bytes per write.
	pub write_limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MockDevice {
	state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
	/// Create a device and make it available under the given path.
	pub fn install(path: impl Into<PathBuf>) -> Self {
		let device = Self::default();
		DEVICES.with(|devices| devices.borrow_mut().insert(path.into(), device.clone()));
		device
	}

	pub fn state(&self) -> MutexGuard<'_, DeviceState> {
		self.state.lock().unwrap()
	}
}

/// A handle to a [`MockDevice`].
///
/// Like a real handle, it keeps failing every operation once it has been closed.
#[derive(Debug)]
pub struct MockHandle {
	device: Option<MockDevice>,
}

fn closed() -> std::io::Error {
	std::io::Error::new(std::io::ErrorKind::Other, "mock handle is closed")
}

impl MockHandle {
	fn device(&self) -> std::io::Result<&MockDevice> {
		self.device.as_ref().ok_or_else(closed)
	}
}

impl Handle for MockHandle {
	fn open(path: &Path) -> std::io::Result<Self> {
		let device = DEVICES.with(|devices| devices.borrow().get(path).cloned());
		match device {
			Some(device) => Ok(Self { device: Some(device) }),
			None => Err(std::io::ErrorKind::NotFound.into()),
		}
	}

	fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
		let mut state = self.device()?.state();
		let count = buffer.len().min(state.incoming.len());
		for (target, byte) in buffer.iter_mut().zip(state.incoming.drain(..count)) {
			*target = byte;
		}
		Ok(count)
	}

	fn write(&mut self, buffer: &[u8]) -> std::io::Result<usize> {
		let mut state = self.device()?.state();
		let count = state.write_limit.map_or(buffer.len(), |limit| limit.min(buffer.len()));
		state.outgoing.extend_from_slice(&buffer[..count]);
		Ok(count)
	}

	fn discard_buffers(&mut self) -> std::io::Result<()> {
		let mut state = self.device()?.state();
		state.discard_calls += 1;
		state.incoming.clear();
		state.outgoing.clear();
		Ok(())
	}

	fn close(&mut self) -> std::io::Result<()> {
		let device = self.device.take().ok_or_else(closed)?;
		device.state().close_calls += 1;
		Ok(())
	}

	fn is_open(&self) -> bool {
		self.device.is_some()
	}
}

/// A translator that stores the configuration as-is,
/// except for rounding the timeout down to 100 milliseconds like termios does.
pub enum MockTranslator {}

impl Translator for MockTranslator {
	type Handle = MockHandle;
	type Block = Config;

	const RULES: &'static Rules = &validate::POSIX;

	fn forward(config: &Config) -> Config {
		let tenths = config.timeout.as_millis() / 100;
		Config {
			timeout: Duration::from_millis(tenths as u64 * 100),
			..*config
		}
	}

	fn reverse(block: &Config) -> Config {
		*block
	}

	fn apply(handle: &mut MockHandle, block: &Config) -> Result<(), SyscallFailure> {
		let device = handle.device().map_err(|e| SyscallFailure::new(Operation::SetState, e))?;
		let mut state = device.state();
		state.apply_calls += 1;
		if state.fail_apply {
			return Err(SyscallFailure::new(
				Operation::SetState,
				std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
			));
		}
		state.settings = Some(*block);
		Ok(())
	}

	fn query(handle: &MockHandle) -> Result<Config, SyscallFailure> {
		let device = handle.device().map_err(|e| SyscallFailure::new(Operation::GetState, e))?;
		let mut state = device.state();
		state.query_calls += 1;
		state.settings.ok_or_else(|| {
			SyscallFailure::new(
				Operation::GetState,
				std::io::Error::new(std::io::ErrorKind::Other, "device was never configured"),
			)
		})
	}
}

pub type MockPort = Port<MockTranslator>;

/// Install a mock device and open a port on it with the given configuration.
pub fn open(path: &str, config: &Config) -> (MockDevice, MockPort) {
	let device = MockDevice::install(path);
	let port = MockPort::open_with_translator(path, config).unwrap();
	(device, port)
}
