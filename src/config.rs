use std::time::Duration;

/// USB vendor id of the VXE Dragonfly R1 Pro Max
pub const VENDOR_ID: u16 = 0x3554;
/// Product id of the 2.4 GHz wireless dongle
pub const DONGLE_PRODUCT_ID: u16 = 0xf58a;
/// Product id of the mouse when connected by cable
pub const WIRED_PRODUCT_ID: u16 = 0xf58c;
/// The HID interface which accepts the battery query
pub const TARGET_INTERFACE: i32 = 1;
/// How long the device needs between receiving the request and having the response ready
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);
/// How often the periodic monitor re-polls the battery
pub const POLL_INTERVAL: Duration = Duration::from_secs(120);

/// How the candidate interfaces found during enumeration are tried
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Query the first matching interface once and report its outcome, whatever it is
    #[default]
    FirstMatch,
    /// Query each matching interface in turn until one of them produces a reading
    AnyMatch,
}

/// What to do with the trailing checksum byte of a response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Do not look at the checksum
    Ignore,
    /// Accept the response but log a warning on mismatch
    #[default]
    Warn,
    /// Reject responses whose checksum does not match
    Enforce,
}

/// Everything needed to locate the mouse and talk to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: i32,
    pub settle_delay: Duration,
    pub selection: SelectionPolicy,
    pub checksum: ChecksumPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: DONGLE_PRODUCT_ID,
            interface: TARGET_INTERFACE,
            settle_delay: SETTLE_DELAY,
            selection: SelectionPolicy::default(),
            checksum: ChecksumPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// The default configuration, but for the mouse connected by cable
    pub fn wired() -> Self {
        Self {
            product_id: WIRED_PRODUCT_ID,
            ..Self::default()
        }
    }
}

#[test]
fn test_default_config_targets_dongle() {
    let config = ClientConfig::default();
    assert_eq!(config.vendor_id, 0x3554);
    assert_eq!(config.product_id, 0xf58a);
    assert_eq!(config.interface, 1);
    assert_eq!(config.settle_delay, Duration::from_millis(50));
    assert_eq!(config.selection, SelectionPolicy::FirstMatch);
    assert_eq!(config.checksum, ChecksumPolicy::Warn);
}

#[test]
fn test_wired_config_only_changes_product() {
    let config = ClientConfig::wired();
    assert_eq!(config.product_id, 0xf58c);
    assert_eq!(ClientConfig { product_id: DONGLE_PRODUCT_ID, ..config }, ClientConfig::default());
}
