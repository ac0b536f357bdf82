//! Portable configuration of and blocking I/O on serial ports.
//!
//! A [`Port`] is opened with a [`Config`] describing the baud rate, framing, parity and read timeout.
//! The configuration is translated to the native representation of the platform:
//! the termios structure on Unix and the `DCB` and `COMMTIMEOUTS` structures on Windows.
//!
//! ```no_run
//! # fn main() -> Result<(), serial_line::Error> {
//! use serial_line::{Config, Port};
//!
//! let mut port = Port::open("/dev/ttyUSB0", &Config::with_baud_rate(9600))?;
//! port.write(b"AB")?;
//!
//! let mut buffer = [0; 64];
//! let read = port.read(&mut buffer)?;
//! println!("received {:02X?}", &buffer[..read]);
//! port.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Platform differences
//!
//! * 1.5 stop bits and mark/space parity are only supported on Windows.
//! * On Unix the read timeout has a granularity of 100 milliseconds.
//!   Shorter timeouts, including zero, make a read block until at least one byte is available.
//! * On Windows a zero timeout makes a read return immediately with the buffered bytes.
//!
//! # Features
//!
//! * `log`: log opening, configuring and closing ports, and transferred data, with the `log` crate.

#[macro_use]
mod log;

mod config;
mod error;
mod port;

pub mod sys;
pub mod validate;

pub use config::{baud, data_bits};
pub use config::{Config, Parity, StopBits};
pub use error::{Error, InvalidField, InvalidPort, Operation, SyscallFailure};
pub use port::Port;
