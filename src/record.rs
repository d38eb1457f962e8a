use std::fmt;
use std::str::FromStr;

/// Operating state of the vehicle at the time of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Polling,
    Charging,
    Driving,
    Standby,
    Conditioning,
    Offline,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Polling => "Polling",
            Mode::Charging => "Charging",
            Mode::Driving => "Driving",
            Mode::Standby => "Standby",
            Mode::Conditioning => "Conditioning",
            Mode::Offline => "Offline",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad so `{:<8}` works in the raw record line
        f.pad(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "polling" => Ok(Mode::Polling),
            "charging" => Ok(Mode::Charging),
            "driving" => Ok(Mode::Driving),
            "standby" => Ok(Mode::Standby),
            "conditioning" => Ok(Mode::Conditioning),
            "offline" => Ok(Mode::Offline),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// One normalized telemetry snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: i64,
    pub mode: Mode,
    pub vehicle_id: Option<i64>,
    pub vin: Option<String>,
    pub display_name: Option<String>,
    pub car_version: Option<String>,
    pub odometer: Option<f64>,
    pub usable_battery_level: Option<i64>,
    pub battery_range: Option<f64>,
    pub speed: Option<f64>,
    pub charge_energy_added: Option<f64>,
    pub charge_miles_added: Option<f64>,
    pub charge_rate: Option<f64>,
    pub charger_power: Option<f64>,
}

impl Record {
    /// A record with only a timestamp and mode set.
    pub fn new(timestamp: i64, mode: Mode) -> Self {
        Self {
            timestamp,
            mode,
            vehicle_id: None,
            vin: None,
            display_name: None,
            car_version: None,
            odometer: None,
            usable_battery_level: None,
            battery_range: None,
            speed: None,
            charge_energy_added: None,
            charge_miles_added: None,
            charge_rate: None,
            charger_power: None,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.mode == Mode::Polling
    }
}
