//! Echo every byte received on a serial port back to the sender.
//!
//! Usage: echo [PATH] [BAUD]

use serial_line::{Config, Port};
use std::path::PathBuf;

fn main() {
	env_logger::init();

	let mut args = std::env::args_os().skip(1);
	let serial_port: PathBuf = args.next().map_or_else(|| "/dev/ttyUSB0".into(), PathBuf::from);
	let baud_rate = args
		.next()
		.map(|arg| arg.to_string_lossy().parse().unwrap_or_else(|e| panic!("invalid baud rate {:?}: {}", arg, e)))
		.unwrap_or(serial_line::baud::B115200);

	let config = Config::with_baud_rate(baud_rate);
	let mut port = Port::open(&serial_port, &config)
		.map_err(|e| println!("Failed to open serial port: {}", e))
		.unwrap();
	println!("Echoing on {} with {:?}", serial_port.display(), port.config().unwrap());

	let mut buffer = [0; 256];
	loop {
		let read = match port.read(&mut buffer) {
			Ok(read) => read,
			Err(e) => panic!("Error: {}", e),
		};
		if read == 0 {
			continue;
		}
		let mut data = &buffer[..read];
		while !data.is_empty() {
			let written = port.write(data).unwrap();
			data = &data[written..];
		}
	}
}
