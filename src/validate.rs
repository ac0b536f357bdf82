//! Platform independent checks of a [`Config`].

use core::time::Duration;

use crate::config::data_bits;
use crate::{Config, InvalidField, Parity, StopBits};

/// The data bit counts every platform supports.
const DATA_BITS: [u8; 4] = [data_bits::DB5, data_bits::DB6, data_bits::DB7, data_bits::DB8];

/// How a platform represents the read timeout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TimeoutRule {
	/// Any timeout is accepted and rounded down to the granularity, saturating at the maximum.
	Saturating {
		granularity: Duration,
		max: Duration,
	},

	/// The timeout is stored in whole milliseconds below a sentinel value.
	///
	/// A non-zero timeout that rounds to zero milliseconds is rejected,
	/// since zero has its own meaning on the platform.
	Milliseconds {
		sentinel: u32,
	},
}

/// The legal values for each [`Config`] field on one platform.
#[derive(Debug)]
pub struct Rules {
	/// The stop bit settings the platform can encode.
	pub stop_bits: &'static [StopBits],

	/// The parity modes the platform can encode.
	pub parity: &'static [Parity],

	/// How the read timeout is encoded.
	pub timeout: TimeoutRule,
}

/// Rules for the POSIX termios translator.
pub const POSIX: Rules = Rules {
	stop_bits: &[StopBits::ONE, StopBits::TWO],
	parity: &[Parity::NONE, Parity::ODD, Parity::EVEN],
	timeout: TimeoutRule::Saturating {
		granularity: Duration::from_millis(100),
		max: Duration::from_millis(25_500),
	},
};

/// Rules for the Windows DCB translator.
pub const WINDOWS: Rules = Rules {
	stop_bits: &[StopBits::ONE, StopBits::ONE_AND_HALF, StopBits::TWO],
	parity: &[Parity::NONE, Parity::ODD, Parity::EVEN, Parity::MARK, Parity::SPACE],
	timeout: TimeoutRule::Milliseconds { sentinel: u32::MAX },
};

/// Check a configuration against the rules of a platform.
///
/// All fields are checked independently.
/// The error names the first offending field in declaration order.
pub fn validate(config: &Config, rules: &Rules) -> Result<(), InvalidField> {
	if !DATA_BITS.contains(&config.data_bits) {
		return Err(InvalidField::DataBits(config.data_bits));
	}

	if !rules.stop_bits.contains(&config.stop_bits) {
		return Err(InvalidField::StopBits(config.stop_bits));
	}

	if !rules.parity.contains(&config.parity) {
		return Err(InvalidField::Parity(config.parity));
	}

	check_timeout(config.timeout, &rules.timeout)
}

fn check_timeout(timeout: Duration, rule: &TimeoutRule) -> Result<(), InvalidField> {
	match *rule {
		TimeoutRule::Saturating { .. } => Ok(()),
		TimeoutRule::Milliseconds { sentinel } => {
			let millis = timeout.as_millis();
			if !timeout.is_zero() && millis == 0 {
				Err(InvalidField::Timeout(timeout))
			} else if millis >= u128::from(sentinel) {
				Err(InvalidField::Timeout(timeout))
			} else {
				Ok(())
			}
		},
	}
}
