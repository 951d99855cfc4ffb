use crate::error::{Error, InvalidReason};
use crate::BatteryState;

/// Size in bytes of both the request and the response report
pub const PACKET_SIZE: usize = 17;
/// Report ID of the battery query and of its response
pub const REPORT_ID: u8 = 0x08;
/// Command ID of the battery query
pub const COMMAND_ID: u8 = 0x04;

/// All bytes of a well formed report, checksum included, add up to this value
const CHECKSUM_SEED: u8 = 0x55;

/// A verbatim message to send which requests the battery state
pub(crate) const REQUEST: [u8; PACKET_SIZE] = [
    REPORT_ID, COMMAND_ID, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x49,
];

/// The battery query report to write to the device
pub fn build_request() -> [u8; PACKET_SIZE] {
    REQUEST
}

/// Compute the checksum byte for the given report bytes, excluding the checksum itself
pub fn checksum(data: &[u8]) -> u8 {
    let sum = data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    CHECKSUM_SEED.wrapping_sub(sum)
}

/// Decode a battery report without looking at its checksum byte.
pub fn parse_response(buffer: &[u8]) -> Result<BatteryState, Error> {
    Ok(BatteryMessage::new(buffer)?.battery_state())
}

/// Decode a battery report, rejecting it if the checksum byte does not match.
pub fn parse_response_verified(buffer: &[u8]) -> Result<BatteryState, Error> {
    let message = BatteryMessage::new(buffer)?;
    if !message.checksum_ok() {
        return Err(Error::invalid(InvalidReason::ChecksumMismatch, buffer));
    }
    Ok(message.battery_state())
}

/// A battery report received from the mouse.
///
/// The message format is:
///
/// Start Byte | End Byte | Meaning
/// 0          | 0        | Report ID, always 0x08
/// 1          | 1        | Command ID echo, 0x04
/// 2          | 2        | Command status
/// 3          | 4        | EEPROM address, big endian
/// 5          | 5        | Reserved
/// 6          | 6        | Battery level in %
/// 7          | 7        | Charging flag
/// 8          | 9        | Battery voltage in mV, big endian
/// 10         | 15       | Reserved
/// 16         | 16       | Checksum, see [`checksum`]
pub(crate) struct BatteryMessage([u8; PACKET_SIZE]);

impl BatteryMessage {
    pub fn new(buffer: &[u8]) -> Result<Self, Error> {
        let data: [u8; PACKET_SIZE] = buffer
            .try_into()
            .map_err(|_| Error::invalid(InvalidReason::UnexpectedLength, buffer))?;

        if data[0] != REPORT_ID {
            return Err(Error::invalid(InvalidReason::UnexpectedReportId, buffer));
        }

        Ok(Self(data))
    }

    pub fn command_id(&self) -> u8 {
        self.0[1]
    }

    pub fn command_status(&self) -> u8 {
        self.0[2]
    }

    pub fn eeprom_address(&self) -> u16 {
        u16::from_be_bytes([self.0[3], self.0[4]])
    }

    pub fn state_of_charge_pct(&self) -> u8 {
        self.0[6]
    }

    pub fn charge_flag(&self) -> u8 {
        self.0[7]
    }

    pub fn battery_voltage_mv(&self) -> u16 {
        u16::from_be_bytes([self.0[8], self.0[9]])
    }

    pub fn checksum_ok(&self) -> bool {
        checksum(&self.0[..PACKET_SIZE - 1]) == self.0[PACKET_SIZE - 1]
    }

    pub fn battery_state(&self) -> BatteryState {
        BatteryState::new(
            self.state_of_charge_pct(),
            self.charge_flag(),
            self.battery_voltage_mv(),
        )
    }
}

#[cfg(test)]
fn sample_response() -> Vec<u8> {
    hex::decode("08040000000241000f8300000000000074").unwrap()
}

#[cfg(test)]
fn assert_invalid(result: Result<BatteryState, Error>, expected: InvalidReason) {
    match result {
        Err(Error::InvalidResponse { reason, .. }) => assert_eq!(reason, expected),
        other => panic!("expected {expected}, got {other:?}"),
    }
}

#[test]
fn test_parse_response_happy() {
    let state = parse_response(&sample_response()).unwrap();
    assert_eq!(state.state_of_charge_pct, 65);
    assert!(!state.charging);
    assert_eq!(state.battery_voltage_mv, 3971);
}

#[test]
fn test_message_header_fields() {
    let message = BatteryMessage::new(&sample_response()).unwrap();
    assert_eq!(message.command_id(), COMMAND_ID);
    assert_eq!(message.command_status(), 0);
    assert_eq!(message.eeprom_address(), 0);
    assert!(message.checksum_ok());
}

#[test]
fn test_parse_response_wrong_length() {
    let mut long = sample_response();
    long.push(0x00);
    let short = &sample_response()[..16];

    assert_invalid(parse_response(short), InvalidReason::UnexpectedLength);
    assert_invalid(parse_response(&long), InvalidReason::UnexpectedLength);
    assert_invalid(parse_response(&[]), InvalidReason::UnexpectedLength);
    assert_invalid(parse_response(&[0xff; 64]), InvalidReason::UnexpectedLength);
    // Length is checked before the report id
    assert_invalid(parse_response(&[0x00; 3]), InvalidReason::UnexpectedLength);
}

#[test]
fn test_parse_response_wrong_report_id() {
    for report_id in [0x00, 0x01, 0x07, 0x09, 0x80, 0xff] {
        let mut buffer = sample_response();
        buffer[0] = report_id;
        assert_invalid(parse_response(&buffer), InvalidReason::UnexpectedReportId);
    }
}

#[test]
fn test_parse_response_accepts_any_payload() {
    for fill in [0x00, 0x01, 0x64, 0xaa, 0xff] {
        let mut buffer = [fill; PACKET_SIZE];
        buffer[0] = REPORT_ID;
        let state = parse_response(&buffer).unwrap();
        assert_eq!(state.state_of_charge_pct, fill);
        assert_eq!(state.charging, fill != 0);
        assert_eq!(state.battery_voltage_mv, u16::from_be_bytes([fill, fill]));
    }
}

#[test]
fn test_parse_response_charging() {
    let buffer = hex::decode("0804000000025a010fd20000000000000b").unwrap();
    let state = parse_response(&buffer).unwrap();
    assert_eq!(state.state_of_charge_pct, 90);
    assert!(state.charging);
    assert_eq!(state.battery_voltage_mv, 0x0fd2);
    assert_eq!(parse_response_verified(&buffer).unwrap(), state);
}

#[test]
fn test_parse_response_verified_bad_checksum() {
    let mut buffer = sample_response();
    assert!(parse_response_verified(&buffer).is_ok());

    buffer[16] = 0x75;
    assert_invalid(parse_response_verified(&buffer), InvalidReason::ChecksumMismatch);
    assert!(parse_response(&buffer).is_ok());
}

#[test]
fn test_build_request() {
    let expected = hex::decode("0804000000000000000000000000000049").unwrap();
    assert_eq!(build_request().to_vec(), expected);
    assert_eq!(build_request(), build_request());
}

#[test]
fn test_checksum() {
    assert_eq!(checksum(&REQUEST[..PACKET_SIZE - 1]), 0x49);
    assert_eq!(checksum(&sample_response()[..PACKET_SIZE - 1]), 0x74);
}
