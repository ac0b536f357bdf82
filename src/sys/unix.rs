//! POSIX termios back-end.
//!
//! On Linux the `termios2` structure is used with the `TCGETS2` and `TCSETS2` ioctls,
//! so that any baud rate can be set through `BOTHER`.
//! Other Unix systems use the plain `termios` structure, whose speed fields hold the numeric baud rate.

use core::time::Duration;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

use crate::error::{Operation, SyscallFailure};
use crate::validate::{self, Rules};
use crate::{Config, Parity, StopBits};

/// The native control block.
#[cfg(target_os = "linux")]
pub type ControlBlock = libc::termios2;

/// The native control block.
#[cfg(not(target_os = "linux"))]
pub type ControlBlock = libc::termios;

/// The granularity of the `VTIME` timer.
pub const TIMER_GRANULARITY: Duration = Duration::from_millis(100);

/// Character size flags, looked up in both directions.
static DATA_BITS: [(u8, libc::tcflag_t); 4] = [
	(5, libc::CS5),
	(6, libc::CS6),
	(7, libc::CS7),
	(8, libc::CS8),
];

/// An open file descriptor for a terminal device.
///
/// After [`Handle::close()`](super::Handle::close) the descriptor is set to `-1`,
/// so any further call fails with `EBADF` without touching a descriptor that may have been reused.
#[derive(Debug)]
pub struct Fd(RawFd);

/// The termios translator.
#[derive(Debug)]
pub enum Termios {}

impl AsRawFd for Fd {
	fn as_raw_fd(&self) -> RawFd {
		self.0
	}
}

impl super::Handle for Fd {
	fn open(path: &Path) -> std::io::Result<Self> {
		let path = CString::new(path.as_os_str().as_bytes())?;
		let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDWR | libc::O_NOCTTY | libc::O_CLOEXEC) };
		if fd < 0 {
			return Err(std::io::Error::last_os_error());
		}
		Ok(Self(fd))
	}

	fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
		let read = unsafe { libc::read(self.0, buffer.as_mut_ptr().cast(), buffer.len()) };
		if read < 0 {
			return Err(std::io::Error::last_os_error());
		}
		Ok(read as usize)
	}

	fn write(&mut self, buffer: &[u8]) -> std::io::Result<usize> {
		let written = unsafe { libc::write(self.0, buffer.as_ptr().cast(), buffer.len()) };
		if written < 0 {
			return Err(std::io::Error::last_os_error());
		}
		Ok(written as usize)
	}

	fn discard_buffers(&mut self) -> std::io::Result<()> {
		if unsafe { libc::tcflush(self.0, libc::TCIOFLUSH) } != 0 {
			return Err(std::io::Error::last_os_error());
		}
		Ok(())
	}

	fn close(&mut self) -> std::io::Result<()> {
		// Linux releases the descriptor even when close() fails, so never retry it.
		let fd = std::mem::replace(&mut self.0, -1);
		if unsafe { libc::close(fd) } != 0 {
			return Err(std::io::Error::last_os_error());
		}
		Ok(())
	}

	fn is_open(&self) -> bool {
		self.0 >= 0
	}
}

impl super::Translator for Termios {
	type Handle = Fd;
	type Block = ControlBlock;

	const RULES: &'static Rules = &validate::POSIX;

	fn forward(config: &Config) -> ControlBlock {
		// All-zero is a valid termios: raw mode, no echo, no output processing.
		let mut block: ControlBlock = unsafe { std::mem::zeroed() };

		// Enable the receiver and ignore modem control lines.
		block.c_cflag = libc::CREAD | libc::CLOCAL | data_bits_flag(config.data_bits);
		set_speed(&mut block, config.baud_rate);

		match config.stop_bits {
			StopBits::ONE => (),
			StopBits::TWO => block.c_cflag |= libc::CSTOPB,
			other => unreachable!("stop bits must be validated before translation, got {:?}", other),
		}

		// PARENB enables parity generation and checking, PARODD selects odd parity, INPCK checks input parity.
		match config.parity {
			Parity::NONE => (),
			Parity::ODD => {
				block.c_cflag |= libc::PARENB | libc::PARODD;
				block.c_iflag |= libc::INPCK;
			},
			Parity::EVEN => {
				block.c_cflag |= libc::PARENB;
				block.c_iflag |= libc::INPCK;
			},
			other => unreachable!("parity must be validated before translation, got {:?}", other),
		}

		// VTIME >= 1 with VMIN = 0: wait up to VTIME deciseconds for the first byte.
		// VTIME = 0 with VMIN = 1: block until at least one byte is available, without limit.
		let units = timer_units(config.timeout);
		if units > 0 {
			block.c_cc[libc::VMIN] = 0;
			block.c_cc[libc::VTIME] = units;
		} else {
			block.c_cc[libc::VMIN] = 1;
			block.c_cc[libc::VTIME] = 0;
		}

		block
	}

	fn reverse(block: &ControlBlock) -> Config {
		let stop_bits = if block.c_cflag & libc::CSTOPB == 0 {
			StopBits::ONE
		} else {
			StopBits::TWO
		};

		let parity = if block.c_cflag & libc::PARENB == 0 {
			Parity::NONE
		} else if block.c_cflag & libc::PARODD == 0 {
			Parity::EVEN
		} else {
			Parity::ODD
		};

		Config {
			baud_rate: speed(block),
			data_bits: data_bits_from_flags(block.c_cflag),
			stop_bits,
			parity,
			timeout: TIMER_GRANULARITY * u32::from(block.c_cc[libc::VTIME]),
		}
	}

	fn apply(handle: &mut Fd, block: &ControlBlock) -> Result<(), SyscallFailure> {
		set_control_block(handle.0, block).map_err(|e| SyscallFailure::new(Operation::SetState, e))
	}

	fn query(handle: &Fd) -> Result<ControlBlock, SyscallFailure> {
		get_control_block(handle.0).map_err(|e| SyscallFailure::new(Operation::GetState, e))
	}
}

/// Convert a timeout to `VTIME` units, rounding down and saturating at the maximum the field can hold.
fn timer_units(timeout: Duration) -> libc::cc_t {
	let units = timeout.as_millis() / TIMER_GRANULARITY.as_millis();
	units.min(u128::from(libc::cc_t::MAX)) as libc::cc_t
}

fn data_bits_flag(data_bits: u8) -> libc::tcflag_t {
	match DATA_BITS.iter().find(|(bits, _)| *bits == data_bits) {
		Some(&(_, flag)) => flag,
		None => unreachable!("data bits must be validated before translation, got {}", data_bits),
	}
}

fn data_bits_from_flags(c_cflag: libc::tcflag_t) -> u8 {
	// CSIZE covers exactly the four CSn values, so the lookup can not miss.
	let size = c_cflag & libc::CSIZE;
	DATA_BITS
		.iter()
		.find(|(_, flag)| *flag == size)
		.map_or(8, |&(bits, _)| bits)
}

#[cfg(target_os = "linux")]
fn set_speed(block: &mut ControlBlock, baud_rate: u32) {
	block.c_cflag &= !libc::CBAUD;
	block.c_cflag |= libc::BOTHER as libc::tcflag_t;
	block.c_ispeed = baud_rate as libc::speed_t;
	block.c_ospeed = baud_rate as libc::speed_t;
}

#[cfg(target_os = "linux")]
fn speed(block: &ControlBlock) -> u32 {
	block.c_ospeed as u32
}

#[cfg(target_os = "linux")]
fn get_control_block(fd: RawFd) -> std::io::Result<ControlBlock> {
	let mut block: ControlBlock = unsafe { std::mem::zeroed() };
	if unsafe { libc::ioctl(fd, libc::TCGETS2, &mut block as *mut ControlBlock) } != 0 {
		return Err(std::io::Error::last_os_error());
	}
	Ok(block)
}

#[cfg(target_os = "linux")]
fn set_control_block(fd: RawFd, block: &ControlBlock) -> std::io::Result<()> {
	if unsafe { libc::ioctl(fd, libc::TCSETS2, block as *const ControlBlock) } != 0 {
		return Err(std::io::Error::last_os_error());
	}
	Ok(())
}

#[cfg(not(target_os = "linux"))]
fn set_speed(block: &mut ControlBlock, baud_rate: u32) {
	// Only fails for rates the speed_t type can not hold, which a u32 always fits in here.
	unsafe {
		libc::cfsetispeed(block, baud_rate as libc::speed_t);
		libc::cfsetospeed(block, baud_rate as libc::speed_t);
	}
}

#[cfg(not(target_os = "linux"))]
fn speed(block: &ControlBlock) -> u32 {
	unsafe { libc::cfgetospeed(block) as u32 }
}

#[cfg(not(target_os = "linux"))]
fn get_control_block(fd: RawFd) -> std::io::Result<ControlBlock> {
	let mut block: ControlBlock = unsafe { std::mem::zeroed() };
	if unsafe { libc::tcgetattr(fd, &mut block) } != 0 {
		return Err(std::io::Error::last_os_error());
	}
	Ok(block)
}

#[cfg(not(target_os = "linux"))]
fn set_control_block(fd: RawFd, block: &ControlBlock) -> std::io::Result<()> {
	if unsafe { libc::tcsetattr(fd, libc::TCSANOW, block) } != 0 {
		return Err(std::io::Error::last_os_error());
	}
	Ok(())
}
