use hidapi::{DeviceInfo, HidApi, HidDevice, HidError};
use log::{debug, info, warn};
use tokio::time::Duration;

use crate::config::{ChecksumPolicy, ClientConfig, SelectionPolicy};
use crate::error::{Error, InvalidReason};
use crate::message::battery_message::{self, BatteryMessage};
use crate::BatteryState;

/// Large enough for any input report the dongle sends, so oversized replies are
/// seen as such instead of being truncated to a valid looking packet
const READ_BUFFER_SIZE: usize = 64;

/// Raw byte access to an open HID interface
pub trait Transport {
    fn write(&self, data: &[u8]) -> Result<usize, HidError>;
    fn read(&self, buf: &mut [u8]) -> Result<usize, HidError>;
}

impl Transport for HidDevice {
    fn write(&self, data: &[u8]) -> Result<usize, HidError> {
        HidDevice::write(self, data)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, HidError> {
        HidDevice::read(self, buf)
    }
}

/// The identifying parts of an enumerated HID interface
pub trait DeviceCandidate {
    fn vendor_id(&self) -> u16;
    fn product_id(&self) -> u16;
    fn interface_number(&self) -> i32;
}

impl DeviceCandidate for DeviceInfo {
    fn vendor_id(&self) -> u16 {
        DeviceInfo::vendor_id(self)
    }

    fn product_id(&self) -> u16 {
        DeviceInfo::product_id(self)
    }

    fn interface_number(&self) -> i32 {
        DeviceInfo::interface_number(self)
    }
}

/// Pick, in enumeration order, the interfaces which should be queried for the battery state.
pub fn matching_candidates<'a, D, I>(devices: I, config: &ClientConfig) -> Result<Vec<&'a D>, Error>
where
    D: DeviceCandidate + 'a,
    I: IntoIterator<Item = &'a D>,
{
    let devices: Vec<&D> = devices
        .into_iter()
        .filter(|d| d.vendor_id() == config.vendor_id && d.product_id() == config.product_id)
        .collect();

    if devices.is_empty() {
        return Err(Error::NoDeviceFound {
            vendor_id: config.vendor_id,
            product_id: config.product_id,
        });
    }

    let candidates: Vec<&D> = devices
        .into_iter()
        .filter(|d| d.interface_number() == config.interface)
        .collect();

    if candidates.is_empty() {
        return Err(Error::NoMatchingInterface { interface: config.interface });
    }

    Ok(match config.selection {
        SelectionPolicy::FirstMatch => candidates.into_iter().take(1).collect(),
        SelectionPolicy::AnyMatch => candidates,
    })
}

/// Find the mouse, query it and return its battery state.
///
/// Each candidate interface is opened, queried once and closed again. Which
/// candidates are tried is decided by [`ClientConfig::selection`]; when more than
/// one is tried the error of the last one is returned if none succeeds.
pub async fn read_battery(api: &HidApi, config: &ClientConfig) -> Result<BatteryState, Error> {
    let candidates = matching_candidates(api.device_list(), config)?;
    for candidate in &candidates {
        info!(
            "Found HID device {} {} at {:?}",
            candidate.manufacturer_string().unwrap_or("(unknown manufacturer)"),
            candidate.product_string().unwrap_or("(unknown product)"),
            candidate.path()
        );
    }

    query_candidates(&candidates, config, |candidate: &DeviceInfo| candidate.open_device(api)).await
}

/// Open and query the given candidates in order until one of them yields a reading.
///
/// A failure is only logged here when another candidate is left to try, the
/// final error is returned to the caller.
pub async fn query_candidates<D, T, F>(
    candidates: &[&D],
    config: &ClientConfig,
    mut open: F,
) -> Result<BatteryState, Error>
where
    T: Transport,
    F: FnMut(&D) -> Result<T, HidError>,
{
    let mut last_err = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let result = match open(*candidate) {
            Ok(device) => BatteryClient::new(device, config).fetch_state().await,
            Err(err) => Err(Error::OpenFailed(err)),
        };

        match result {
            Ok(state) => return Ok(state),
            Err(err) => {
                if i + 1 < candidates.len() {
                    warn!("Candidate {} failed, trying the next one: {err}", i + 1);
                }
                last_err = Some(err);
            }
        }
    }

    Err(last_err.unwrap_or(Error::NoMatchingInterface { interface: config.interface }))
}

/// An open session with the battery reporting interface of the mouse
pub struct BatteryClient<T: Transport = HidDevice> {
    device: T,
    settle_delay: Duration,
    checksum: ChecksumPolicy,
}

impl<T: Transport> BatteryClient<T> {
    pub fn new(device: T, config: &ClientConfig) -> Self {
        Self {
            device,
            settle_delay: config.settle_delay,
            checksum: config.checksum,
        }
    }

    /// Read the current state from the battery
    pub async fn fetch_state(&mut self) -> Result<BatteryState, Error> {
        let rsp = self.request_response(&battery_message::build_request()).await?;
        let message = BatteryMessage::new(&rsp)?;

        debug!(
            "Command {:#04x} status {:#04x} EEPROM address {:#06x}",
            message.command_id(),
            message.command_status(),
            message.eeprom_address()
        );

        if !message.checksum_ok() {
            match self.checksum {
                ChecksumPolicy::Ignore => {}
                ChecksumPolicy::Warn => {
                    warn!("Checksum mismatch in battery response: {}", hex::encode(&rsp))
                }
                ChecksumPolicy::Enforce => {
                    return Err(Error::invalid(InvalidReason::ChecksumMismatch, &rsp))
                }
            }
        }

        Ok(message.battery_state())
    }

    /// Write the request, give the device time to process it, then read the reply.
    async fn request_response(&mut self, rq: &[u8]) -> Result<Vec<u8>, Error> {
        let h = hex::encode(rq);
        debug!("TX: {h}");

        self.device.write(rq).map_err(Error::WriteFailed)?;

        tokio::time::sleep(self.settle_delay).await;

        let mut buf = [0u8; READ_BUFFER_SIZE];
        let len = self.device.read(&mut buf).map_err(Error::ReadFailed)?;

        let rsp = buf[..len].to_vec();
        debug!("RX: {}", hex::encode(&rsp));

        Ok(rsp)
    }
}

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::VecDeque;

/// Replays canned responses and records what is written
#[cfg(test)]
#[derive(Default)]
struct MockTransport {
    written: RefCell<Vec<Vec<u8>>>,
    response: Option<Vec<u8>>,
    fail_write: bool,
}

#[cfg(test)]
impl MockTransport {
    fn responding(hex_rsp: &str) -> Self {
        Self { response: Some(hex::decode(hex_rsp).unwrap()), ..Self::default() }
    }
}

#[cfg(test)]
impl Transport for MockTransport {
    fn write(&self, data: &[u8]) -> Result<usize, HidError> {
        if self.fail_write {
            return Err(HidError::HidApiError { message: "device disconnected".into() });
        }
        self.written.borrow_mut().push(data.to_vec());
        Ok(data.len())
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, HidError> {
        match &self.response {
            Some(rsp) => {
                buf[..rsp.len()].copy_from_slice(rsp);
                Ok(rsp.len())
            }
            None => Err(HidError::HidApiError { message: "read error".into() }),
        }
    }
}

#[cfg(test)]
struct Candidate(u16, u16, i32);

#[cfg(test)]
impl DeviceCandidate for Candidate {
    fn vendor_id(&self) -> u16 {
        self.0
    }

    fn product_id(&self) -> u16 {
        self.1
    }

    fn interface_number(&self) -> i32 {
        self.2
    }
}

#[cfg(test)]
const SAMPLE_RESPONSE: &str = "08040000000241000f8300000000000074";

#[tokio::test]
async fn test_fetch_state_happy() {
    let config = ClientConfig::default();
    let mut client = BatteryClient::new(MockTransport::responding(SAMPLE_RESPONSE), &config);

    let state = client.fetch_state().await.unwrap();
    assert_eq!(state.state_of_charge_pct, 65);
    assert!(!state.charging);
    assert_eq!(state.battery_voltage_mv, 3971);

    let written = client.device.written.borrow();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0], battery_message::build_request().to_vec());
}

#[tokio::test]
async fn test_fetch_state_write_failed() {
    let transport = MockTransport { fail_write: true, ..MockTransport::responding(SAMPLE_RESPONSE) };
    let mut client = BatteryClient::new(transport, &ClientConfig::default());
    assert!(matches!(client.fetch_state().await, Err(Error::WriteFailed(_))));
}

#[tokio::test]
async fn test_fetch_state_read_failed() {
    let mut client = BatteryClient::new(MockTransport::default(), &ClientConfig::default());
    assert!(matches!(client.fetch_state().await, Err(Error::ReadFailed(_))));
}

#[tokio::test]
async fn test_fetch_state_short_read_is_invalid() {
    let transport = MockTransport::responding("08040000000241000f83");
    let mut client = BatteryClient::new(transport, &ClientConfig::default());
    match client.fetch_state().await {
        Err(Error::InvalidResponse { reason, raw }) => {
            assert_eq!(reason, InvalidReason::UnexpectedLength);
            assert_eq!(raw.len(), 10);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_state_checksum_policy() {
    let bad_checksum = "08040000000241000f8300000000000075";

    let warn = ClientConfig::default();
    let mut client = BatteryClient::new(MockTransport::responding(bad_checksum), &warn);
    assert!(client.fetch_state().await.is_ok());

    let enforce = ClientConfig { checksum: ChecksumPolicy::Enforce, ..ClientConfig::default() };
    let mut client = BatteryClient::new(MockTransport::responding(bad_checksum), &enforce);
    assert!(matches!(
        client.fetch_state().await,
        Err(Error::InvalidResponse { reason: InvalidReason::ChecksumMismatch, .. })
    ));

    let mut client = BatteryClient::new(MockTransport::responding(SAMPLE_RESPONSE), &enforce);
    assert!(client.fetch_state().await.is_ok());
}

#[test]
fn test_matching_candidates_first_match() {
    let devices = [
        Candidate(0x3554, 0xf58a, 0),
        Candidate(0x046d, 0xc547, 1),
        Candidate(0x3554, 0xf58a, 1),
        Candidate(0x3554, 0xf58a, 1),
    ];
    let candidates = matching_candidates(&devices, &ClientConfig::default()).unwrap();
    assert_eq!(candidates.len(), 1);
    assert!(std::ptr::eq(candidates[0], &devices[2]));
}

#[test]
fn test_matching_candidates_any_match() {
    let devices = [
        Candidate(0x3554, 0xf58a, 1),
        Candidate(0x3554, 0xf58a, 2),
        Candidate(0x3554, 0xf58a, 1),
    ];
    let config = ClientConfig { selection: SelectionPolicy::AnyMatch, ..ClientConfig::default() };
    let candidates = matching_candidates(&devices, &config).unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(std::ptr::eq(candidates[0], &devices[0]));
    assert!(std::ptr::eq(candidates[1], &devices[2]));
}

#[test]
fn test_matching_candidates_no_device() {
    let devices = [Candidate(0x3554, 0xf58c, 1), Candidate(0x046d, 0xf58a, 1)];
    assert!(matches!(
        matching_candidates(&devices, &ClientConfig::default()),
        Err(Error::NoDeviceFound { vendor_id: 0x3554, product_id: 0xf58a })
    ));
}

#[test]
fn test_matching_candidates_no_interface() {
    let devices = [Candidate(0x3554, 0xf58a, 0), Candidate(0x3554, 0xf58a, 2)];
    assert!(matches!(
        matching_candidates(&devices, &ClientConfig::default()),
        Err(Error::NoMatchingInterface { interface: 1 })
    ));
}

#[tokio::test]
async fn test_fetch_state_oversized_read_is_invalid() {
    let transport = MockTransport::responding("08040000000241000f830000000000007400");
    let mut client = BatteryClient::new(transport, &ClientConfig::default());
    match client.fetch_state().await {
        Err(Error::InvalidResponse { reason, raw }) => {
            assert_eq!(reason, InvalidReason::UnexpectedLength);
            assert_eq!(raw.len(), 18);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn test_query_candidates_first_match_is_final() {
    let devices = [Candidate(0x3554, 0xf58a, 1), Candidate(0x3554, 0xf58a, 1)];
    let config = ClientConfig::default();
    let candidates = matching_candidates(&devices, &config).unwrap();

    let mut transports = VecDeque::from([MockTransport::default(), MockTransport::responding(SAMPLE_RESPONSE)]);
    let result = query_candidates(&candidates, &config, |_: &Candidate| Ok(transports.pop_front().unwrap())).await;

    assert!(matches!(result, Err(Error::ReadFailed(_))));
    // The second interface was never opened
    assert_eq!(transports.len(), 1);
}

#[tokio::test]
async fn test_query_candidates_first_match_open_failed() {
    let devices = [Candidate(0x3554, 0xf58a, 1), Candidate(0x3554, 0xf58a, 1)];
    let config = ClientConfig::default();
    let candidates = matching_candidates(&devices, &config).unwrap();

    let mut opened = 0;
    let result = query_candidates(&candidates, &config, |_: &Candidate| -> Result<MockTransport, HidError> {
        opened += 1;
        Err(HidError::HidApiError { message: "permission denied".into() })
    })
    .await;

    assert!(matches!(result, Err(Error::OpenFailed(_))));
    assert_eq!(opened, 1);
}

#[tokio::test]
async fn test_query_candidates_any_match_moves_on() {
    let devices = [Candidate(0x3554, 0xf58a, 1), Candidate(0x3554, 0xf58a, 1)];
    let config = ClientConfig { selection: SelectionPolicy::AnyMatch, ..ClientConfig::default() };
    let candidates = matching_candidates(&devices, &config).unwrap();

    let mut transports = VecDeque::from([MockTransport::default(), MockTransport::responding(SAMPLE_RESPONSE)]);
    let state = query_candidates(&candidates, &config, |_: &Candidate| Ok(transports.pop_front().unwrap()))
        .await
        .unwrap();

    assert_eq!(state.state_of_charge_pct, 65);
    assert!(transports.is_empty());
}

#[tokio::test]
async fn test_query_candidates_any_match_returns_last_error() {
    let devices = [Candidate(0x3554, 0xf58a, 1), Candidate(0x3554, 0xf58a, 1)];
    let config = ClientConfig { selection: SelectionPolicy::AnyMatch, ..ClientConfig::default() };
    let candidates = matching_candidates(&devices, &config).unwrap();

    let mut transports = VecDeque::from([
        MockTransport::default(),
        MockTransport { fail_write: true, ..MockTransport::default() },
    ]);
    let result = query_candidates(&candidates, &config, |_: &Candidate| Ok(transports.pop_front().unwrap())).await;

    assert!(matches!(result, Err(Error::WriteFailed(_))));
    assert!(transports.is_empty());
}
