//! Windows communications back-end.
//!
//! The line settings live in a `DCB` and the read timeout in a separate `COMMTIMEOUTS` structure.
//! The structures are defined here with explicit integer fields instead of the bit-field layout of the C headers.
//! The conversion code is plain Rust, the native calls are only compiled on Windows.

use core::time::Duration;

use crate::{Config, Parity, StopBits};

/// The `MAXDWORD` sentinel value.
pub const MAXDWORD: u32 = u32::MAX;

/// Bits of the [`Dcb::flags`] word (the `fBinary .. fDummy2` bit-field of the C header).
pub mod dcb_flags {
	/// `fBinary`, bit 0: binary mode. Windows only supports binary mode, so it must always be set.
	pub const BINARY: u32 = 1 << 0;

	/// `fParity`, bit 1: enable parity checking.
	pub const PARITY: u32 = 1 << 1;

	/// `fOutxCtsFlow`, bit 2: CTS output flow control.
	pub const OUTX_CTS_FLOW: u32 = 1 << 2;

	/// `fOutxDsrFlow`, bit 3: DSR output flow control.
	pub const OUTX_DSR_FLOW: u32 = 1 << 3;

	/// `fDtrControl`, bits 4-5.
	pub const DTR_CONTROL_MASK: u32 = 0b11 << 4;

	/// `fOutX`, bit 8: XON/XOFF output flow control.
	pub const OUT_X: u32 = 1 << 8;

	/// `fInX`, bit 9: XON/XOFF input flow control.
	pub const IN_X: u32 = 1 << 9;

	/// `fRtsControl`, bits 12-13.
	pub const RTS_CONTROL_MASK: u32 = 0b11 << 12;

	/// `fAbortOnError`, bit 14.
	pub const ABORT_ON_ERROR: u32 = 1 << 14;
}

/// The `DCB` structure.
///
/// Field offsets are in bytes, the total size is 28 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Dcb {
	/// Offset 0, 4 bytes: `DCBlength`, must hold the size of the structure.
	pub length: u32,
	/// Offset 4, 4 bytes: `BaudRate`.
	pub baud_rate: u32,
	/// Offset 8, 4 bytes: the bit-field word, see [`dcb_flags`].
	pub flags: u32,
	/// Offset 12, 2 bytes: `wReserved`, must be zero.
	pub reserved: u16,
	/// Offset 14, 2 bytes: `XonLim`.
	pub xon_lim: u16,
	/// Offset 16, 2 bytes: `XoffLim`.
	pub xoff_lim: u16,
	/// Offset 18, 1 byte: `ByteSize`, the number of data bits.
	pub byte_size: u8,
	/// Offset 19, 1 byte: `Parity`.
	pub parity: u8,
	/// Offset 20, 1 byte: `StopBits`.
	pub stop_bits: u8,
	/// Offset 21, 1 byte: `XonChar`.
	pub xon_char: i8,
	/// Offset 22, 1 byte: `XoffChar`.
	pub xoff_char: i8,
	/// Offset 23, 1 byte: `ErrorChar`.
	pub error_char: i8,
	/// Offset 24, 1 byte: `EofChar`.
	pub eof_char: i8,
	/// Offset 25, 1 byte: `EvtChar`.
	pub evt_char: i8,
	/// Offset 26, 2 bytes: `wReserved1`.
	pub reserved1: u16,
}

/// The `COMMTIMEOUTS` structure: five 4 byte fields, 20 bytes in total.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CommTimeouts {
	/// Offset 0: `ReadIntervalTimeout`.
	pub read_interval_timeout: u32,
	/// Offset 4: `ReadTotalTimeoutMultiplier`.
	pub read_total_timeout_multiplier: u32,
	/// Offset 8: `ReadTotalTimeoutConstant`.
	pub read_total_timeout_constant: u32,
	/// Offset 12: `WriteTotalTimeoutMultiplier`.
	pub write_total_timeout_multiplier: u32,
	/// Offset 16: `WriteTotalTimeoutConstant`.
	pub write_total_timeout_constant: u32,
}

const _: () = assert!(core::mem::size_of::<Dcb>() == 28);
const _: () = assert!(core::mem::size_of::<CommTimeouts>() == 20);

/// The complete native state of a communications device.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CommSettings {
	pub dcb: Dcb,
	pub timeouts: CommTimeouts,
}

/// The DCB translator.
#[derive(Debug)]
pub enum CommState {}

static STOP_BITS: [(StopBits, u8); 3] = [
	(StopBits::ONE, 0),          // ONESTOPBIT
	(StopBits::ONE_AND_HALF, 1), // ONE5STOPBITS
	(StopBits::TWO, 2),          // TWOSTOPBITS
];

static PARITY: [(Parity, u8); 5] = [
	(Parity::NONE, 0),  // NOPARITY
	(Parity::ODD, 1),   // ODDPARITY
	(Parity::EVEN, 2),  // EVENPARITY
	(Parity::MARK, 3),  // MARKPARITY
	(Parity::SPACE, 4), // SPACEPARITY
];

impl Dcb {
	/// Create an empty structure with the length field stamped.
	pub fn new() -> Self {
		Self {
			length: core::mem::size_of::<Self>() as u32,
			..Self::default()
		}
	}
}

impl CommState {
	/// Translate a validated configuration into native settings.
	///
	/// # Panics
	/// Panics if the stop bits or parity are not in [`WINDOWS`](crate::validate::WINDOWS).
	pub fn encode(config: &Config) -> CommSettings {
		let stop_bits = match STOP_BITS.iter().find(|(key, _)| *key == config.stop_bits) {
			Some(&(_, native)) => native,
			None => unreachable!("stop bits must be validated before translation, got {:?}", config.stop_bits),
		};
		let parity = match PARITY.iter().find(|(key, _)| *key == config.parity) {
			Some(&(_, native)) => native,
			None => unreachable!("parity must be validated before translation, got {:?}", config.parity),
		};

		let mut flags = dcb_flags::BINARY;
		if config.parity != Parity::NONE {
			flags |= dcb_flags::PARITY;
		}

		let dcb = Dcb {
			baud_rate: config.baud_rate,
			flags,
			byte_size: config.data_bits,
			parity,
			stop_bits,
			..Dcb::new()
		};

		CommSettings {
			dcb,
			timeouts: encode_timeouts(config.timeout),
		}
	}

	/// Translate native settings back into a configuration.
	///
	/// Unknown native values are passed through as raw values.
	pub fn decode(settings: &CommSettings) -> Config {
		let dcb = &settings.dcb;
		let stop_bits = STOP_BITS
			.iter()
			.find(|(_, native)| *native == dcb.stop_bits)
			.map_or(StopBits(dcb.stop_bits), |&(key, _)| key);
		let parity = PARITY
			.iter()
			.find(|(_, native)| *native == dcb.parity)
			.map_or(Parity(dcb.parity), |&(key, _)| key);

		Config {
			baud_rate: dcb.baud_rate,
			data_bits: dcb.byte_size,
			stop_bits,
			parity,
			timeout: Duration::from_millis(settings.timeouts.read_total_timeout_constant.into()),
		}
	}
}

/// Encode the read timeout.
///
/// A non-zero timeout uses the documented combination of
/// `ReadIntervalTimeout = ReadTotalTimeoutMultiplier = MAXDWORD` and `0 < ReadTotalTimeoutConstant < MAXDWORD`:
/// a read returns as soon as any byte arrives, or after the constant expires with nothing.
///
/// A zero timeout only sets `ReadIntervalTimeout = MAXDWORD`,
/// which makes a read return immediately with whatever is buffered.
/// An all-zero structure would instead block until the buffer is full.
fn encode_timeouts(timeout: Duration) -> CommTimeouts {
	let millis = timeout.as_millis().min(u128::from(MAXDWORD - 1)) as u32;
	if millis == 0 {
		return CommTimeouts {
			read_interval_timeout: MAXDWORD,
			..CommTimeouts::default()
		};
	}

	CommTimeouts {
		read_interval_timeout: MAXDWORD,
		read_total_timeout_multiplier: MAXDWORD,
		read_total_timeout_constant: millis,
		write_total_timeout_multiplier: 0,
		write_total_timeout_constant: millis,
	}
}

#[cfg(windows)]
pub use self::native::ComHandle;

#[cfg(windows)]
mod native {
	use std::os::windows::ffi::OsStrExt;
	use std::os::windows::io::{AsRawHandle, RawHandle};
	use std::path::Path;

	use winapi::shared::minwindef::DWORD;
	use winapi::um::{commapi, fileapi, handleapi, winbase, winnt};

	use super::{CommSettings, CommState, CommTimeouts, Dcb};
	use crate::error::{Operation, SyscallFailure};
	use crate::validate::{self, Rules};
	use crate::Config;

	const _: () = assert!(core::mem::size_of::<Dcb>() == core::mem::size_of::<winbase::DCB>());
	const _: () = assert!(core::mem::size_of::<CommTimeouts>() == core::mem::size_of::<winbase::COMMTIMEOUTS>());

	/// An open handle to a communications device.
	///
	/// After [`Handle::close()`](crate::sys::Handle::close) the handle is set to null,
	/// so any further call fails with `ERROR_INVALID_HANDLE`.
	#[derive(Debug)]
	pub struct ComHandle(winnt::HANDLE);

	// The handle is an owned kernel object reference, usable from any thread.
	unsafe impl Send for ComHandle {}

	impl AsRawHandle for ComHandle {
		fn as_raw_handle(&self) -> RawHandle {
			self.0.cast()
		}
	}

	/// Prefix plain names with `\\.\`, which is required for COM10 and above.
	fn device_name(path: &Path) -> Vec<u16> {
		let path: Vec<u16> = path.as_os_str().encode_wide().collect();
		let mut name: Vec<u16> = Vec::with_capacity(path.len() + 5);
		if !path.starts_with(&[b'\\' as u16, b'\\' as u16]) {
			name.extend(r"\\.\".encode_utf16());
		}
		name.extend_from_slice(&path);
		name.push(0);
		name
	}

	impl crate::sys::Handle for ComHandle {
		fn open(path: &Path) -> std::io::Result<Self> {
			let name = device_name(path);
			let handle = unsafe {
				fileapi::CreateFileW(
					name.as_ptr(),
					winnt::GENERIC_READ | winnt::GENERIC_WRITE,
					0,
					std::ptr::null_mut(),
					fileapi::OPEN_EXISTING,
					0,
					std::ptr::null_mut(),
				)
			};
			if handle == handleapi::INVALID_HANDLE_VALUE {
				return Err(std::io::Error::last_os_error());
			}
			Ok(Self(handle))
		}

		fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
			let len = buffer.len().min(DWORD::MAX as usize) as DWORD;
			let mut read: DWORD = 0;
			if unsafe { fileapi::ReadFile(self.0, buffer.as_mut_ptr().cast(), len, &mut read, std::ptr::null_mut()) } == 0 {
				return Err(std::io::Error::last_os_error());
			}
			Ok(read as usize)
		}

		fn write(&mut self, buffer: &[u8]) -> std::io::Result<usize> {
			let len = buffer.len().min(DWORD::MAX as usize) as DWORD;
			let mut written: DWORD = 0;
			if unsafe { fileapi::WriteFile(self.0, buffer.as_ptr().cast(), len, &mut written, std::ptr::null_mut()) } == 0 {
				return Err(std::io::Error::last_os_error());
			}
			Ok(written as usize)
		}

		fn discard_buffers(&mut self) -> std::io::Result<()> {
			if unsafe { commapi::PurgeComm(self.0, winbase::PURGE_RXCLEAR | winbase::PURGE_TXCLEAR) } == 0 {
				return Err(std::io::Error::last_os_error());
			}
			Ok(())
		}

		fn close(&mut self) -> std::io::Result<()> {
			// Null rather than INVALID_HANDLE_VALUE: the latter doubles as the current process pseudo handle.
			let handle = std::mem::replace(&mut self.0, std::ptr::null_mut());
			if unsafe { handleapi::CloseHandle(handle) } == 0 {
				return Err(std::io::Error::last_os_error());
			}
			Ok(())
		}

		fn is_open(&self) -> bool {
			!self.0.is_null()
		}
	}

	impl crate::sys::Translator for CommState {
		type Handle = ComHandle;
		type Block = CommSettings;

		const RULES: &'static Rules = &validate::WINDOWS;

		fn forward(config: &Config) -> CommSettings {
			CommState::encode(config)
		}

		fn reverse(block: &CommSettings) -> Config {
			CommState::decode(block)
		}

		fn apply(handle: &mut ComHandle, block: &CommSettings) -> Result<(), SyscallFailure> {
			let mut dcb = block.dcb;
			dcb.length = core::mem::size_of::<Dcb>() as u32;
			if unsafe { commapi::SetCommState(handle.0, (&mut dcb as *mut Dcb).cast()) } == 0 {
				return Err(SyscallFailure::last_os_error(Operation::SetState));
			}

			let mut timeouts = block.timeouts;
			if unsafe { commapi::SetCommTimeouts(handle.0, (&mut timeouts as *mut CommTimeouts).cast()) } == 0 {
				return Err(SyscallFailure::last_os_error(Operation::SetTimeouts));
			}
			Ok(())
		}

		fn query(handle: &ComHandle) -> Result<CommSettings, SyscallFailure> {
			let mut settings = CommSettings {
				dcb: Dcb::new(),
				timeouts: CommTimeouts::default(),
			};
			if unsafe { commapi::GetCommState(handle.0, (&mut settings.dcb as *mut Dcb).cast()) } == 0 {
				return Err(SyscallFailure::last_os_error(Operation::GetState));
			}
			if unsafe { commapi::GetCommTimeouts(handle.0, (&mut settings.timeouts as *mut CommTimeouts).cast()) } == 0 {
				return Err(SyscallFailure::last_os_error(Operation::GetTimeouts));
			}
			Ok(settings)
		}
	}

}
