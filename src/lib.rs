//! Read the battery state of the VXE Dragonfly R1 Pro Max wireless mouse over USB HID
//!
//! Tested with the 2.4 GHz dongle (USB id `3554:f58a`).
//!
//! The dongle exposes several HID interfaces. Interface 1 accepts a vendor specific 17 byte
//! report which asks the mouse for its battery state, and answers with a 17 byte report of
//! the same shape. The protocol is not documented; the layout used here was worked out from
//! captures.
//!
//! Currently the following data can be accessed:
//!
//! - Battery level (%)
//! - Charging flag
//! - Battery voltage (mV)
//!
//! # Example
//!
//! ```rust,no_run
//! # #[tokio::main(flavor = "current_thread")]
//! # pub async fn main(){
//!     let api = hidapi::HidApi::new().unwrap();
//!     let config = vxe_battery::ClientConfig::default();
//!     let battery_state = vxe_battery::read_battery(&api, &config).await.unwrap();
//!     println!("{battery_state}");
//! # }
//! ```
//!
//! The codec can also be used on its own:
//!
//! ```rust
//! use vxe_battery::message::battery_message::{build_request, parse_response};
//!
//! assert_eq!(build_request()[0], 0x08);
//! let rsp = [0x08, 0x04, 0x00, 0x00, 0x00, 0x02, 0x41, 0x00, 0x0f, 0x83, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x74];
//! let state = parse_response(&rsp).unwrap();
//! assert_eq!(state.state_of_charge_pct, 65);
//! assert_eq!(state.battery_voltage_mv, 3971);
//! ```

mod battery_client;
mod battery_state;
pub mod config;
mod error;
pub mod message;

pub use battery_client::{matching_candidates, query_candidates, read_battery, BatteryClient, DeviceCandidate, Transport};
pub use battery_state::{BatteryState, ChargeState};
pub use config::{ChecksumPolicy, ClientConfig, SelectionPolicy};
pub use error::{Error, InvalidReason};
