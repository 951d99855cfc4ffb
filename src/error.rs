use hidapi::HidError;
use thiserror::Error;

/// Why a response was not accepted as a battery report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    UnexpectedLength,
    UnexpectedReportId,
    ChecksumMismatch,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            InvalidReason::UnexpectedLength => "unexpected length",
            InvalidReason::UnexpectedReportId => "unexpected report id",
            InvalidReason::ChecksumMismatch => "checksum mismatch",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("HID library error: {0}")]
    HidApi(#[source] HidError),
    #[error("No HID devices found with VID={vendor_id:#06x} PID={product_id:#06x}")]
    NoDeviceFound { vendor_id: u16, product_id: u16 },
    #[error("No matching HID device exposes interface {interface}")]
    NoMatchingInterface { interface: i32 },
    #[error("Failed to open device: {0}")]
    OpenFailed(#[source] HidError),
    #[error("Failed to send battery request: {0}")]
    WriteFailed(#[source] HidError),
    #[error("Failed to read battery response: {0}")]
    ReadFailed(#[source] HidError),
    #[error("Invalid response: {reason}: {}", hex::encode(.raw))]
    InvalidResponse { reason: InvalidReason, raw: Vec<u8> },
}

impl Error {
    pub(crate) fn invalid(reason: InvalidReason, raw: &[u8]) -> Self {
        Error::InvalidResponse { reason, raw: raw.to_vec() }
    }
}

#[test]
fn test_invalid_response_message_includes_raw_bytes() {
    let err = Error::invalid(InvalidReason::UnexpectedReportId, &[0x09, 0x04, 0xff]);
    assert_eq!(err.to_string(), "Invalid response: unexpected report id: 0904ff");
}

#[test]
fn test_no_device_found_message() {
    let err = Error::NoDeviceFound { vendor_id: 0x3554, product_id: 0xf58a };
    assert_eq!(err.to_string(), "No HID devices found with VID=0x3554 PID=0xf58a");
}
