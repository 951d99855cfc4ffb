use std::fmt;

/// Charge state as signalled by the charging flag of the battery report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    NotCharging,
    Charging,
    /// A flag value other than 0 or 1 has not been observed, but is kept as is
    Unknown(u8),
}

impl From<u8> for ChargeState {
    fn from(flag: u8) -> Self {
        match flag {
            0x00 => ChargeState::NotCharging,
            0x01 => ChargeState::Charging,
            other => ChargeState::Unknown(other),
        }
    }
}

impl fmt::Display for ChargeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargeState::NotCharging => write!(f, "Not Charging"),
            ChargeState::Charging => write!(f, "Charging"),
            ChargeState::Unknown(flag) => write!(f, "Unknown ({flag})"),
        }
    }
}

/// The reported state of the mouse battery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryState {
    /// The state of charge of the battery in %, 0-100
    pub state_of_charge_pct: u8,
    /// Whether the charging flag is set at all
    pub charging: bool,
    /// The battery voltage in mV
    pub battery_voltage_mv: u16,
    pub charge_state: ChargeState,
}

impl BatteryState {
    pub(crate) fn new(state_of_charge_pct: u8, charge_flag: u8, battery_voltage_mv: u16) -> Self {
        Self {
            state_of_charge_pct,
            charging: charge_flag != 0,
            battery_voltage_mv,
            charge_state: ChargeState::from(charge_flag),
        }
    }

    /// The battery voltage in µV, the unit power supply interfaces use
    pub fn battery_voltage_uv(&self) -> u32 {
        u32::from(self.battery_voltage_mv) * 1000
    }
}

impl fmt::Display for BatteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Battery Level: {}%, Status: {}, Voltage: {} mV",
            self.state_of_charge_pct, self.charge_state, self.battery_voltage_mv
        )
    }
}

#[test]
fn test_charge_flag_mapping() {
    assert_eq!(ChargeState::from(0), ChargeState::NotCharging);
    assert_eq!(ChargeState::from(1), ChargeState::Charging);
    assert_eq!(ChargeState::from(7), ChargeState::Unknown(7));

    let state = BatteryState::new(50, 7, 4000);
    assert!(state.charging);
    assert_eq!(state.charge_state, ChargeState::Unknown(7));
}

#[test]
fn test_display_and_microvolts() {
    let state = BatteryState::new(65, 0, 3971);
    assert_eq!(state.battery_voltage_uv(), 3_971_000);
    assert_eq!(state.to_string(), "Battery Level: 65%, Status: Not Charging, Voltage: 3971 mV");
}
