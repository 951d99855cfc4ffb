//! Encoding and decoding of the vendor battery report.

pub mod battery_message;
