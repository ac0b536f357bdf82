//! Tests against a real serial port with TX and RX connected.
//!
//! Run with `cargo test --features integration_test`, optionally setting `SERIAL_PATH` and `SERIAL_BAUD`.

#![cfg(feature = "integration_test")]

use assert2::{assert, let_assert};
use serial_line::{Parity, StopBits};
use test_log::test;

mod common;

#[test]
fn loopback() {
	common::real::run(|_config, mut port| {
		let_assert!(Ok(()) = port.discard_buffers());
		let_assert!(Ok(2) = port.write(&[0x41, 0x42]));

		let mut buffer = [0; 2];
		let mut filled = 0;
		while filled < buffer.len() {
			let_assert!(Ok(read) = port.read(&mut buffer[filled..]));
			assert!(read > 0, "no loopback data after {} bytes", filled);
			filled += read;
		}
		assert!(buffer == [0x41, 0x42]);
	})
}

#[test]
fn config_read_back() {
	common::real::run(|config, mut port| {
		let_assert!(Ok(read_back) = port.config());
		assert!(read_back == config);
		let_assert!(Ok(()) = port.close());
	})
}

#[test]
fn framing_read_back() {
	common::real::run(|config, mut port| {
		let config = config.data_bits(7).parity(Parity::EVEN).stop_bits(StopBits::TWO);
		let_assert!(Ok(()) = port.set_config(&config));
		let_assert!(Ok(read_back) = port.config());
		assert!(read_back == config);
	})
}
