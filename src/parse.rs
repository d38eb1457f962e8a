use crate::record::{Mode, Record};
use serde::Deserialize;

/// One poller line. Readings may be flat or nested the way the vehicle_data
/// endpoint returns them.
#[derive(Deserialize, Default)]
struct RawLine {
    #[serde(default)]
    time: Option<f64>,
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    retrevial_time: Option<f64>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    vehicle_id: Option<i64>,
    #[serde(default)]
    vin: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(flatten)]
    flat: Readings,
    #[serde(default)]
    charge_state: Option<ChargeState>,
    #[serde(default)]
    drive_state: Option<DriveState>,
    #[serde(default)]
    climate_state: Option<ClimateState>,
    #[serde(default)]
    vehicle_state: Option<VehicleState>,
}

#[derive(Deserialize, Default)]
struct Readings {
    #[serde(default)]
    odometer: Option<f64>,
    #[serde(default)]
    usable_battery_level: Option<f64>,
    #[serde(default)]
    battery_range: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    charge_energy_added: Option<f64>,
    #[serde(default)]
    charge_miles_added: Option<f64>,
    #[serde(default)]
    charge_rate: Option<f64>,
    #[serde(default)]
    charger_power: Option<f64>,
    #[serde(default)]
    car_version: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChargeState {
    #[serde(default)]
    charging_state: Option<String>,
    #[serde(default)]
    usable_battery_level: Option<f64>,
    #[serde(default)]
    battery_range: Option<f64>,
    #[serde(default)]
    charge_energy_added: Option<f64>,
    #[serde(default, alias = "charge_miles_added_rated")]
    charge_miles_added: Option<f64>,
    #[serde(default)]
    charge_rate: Option<f64>,
    #[serde(default)]
    charger_power: Option<f64>,
}

#[derive(Deserialize, Default)]
struct DriveState {
    #[serde(default)]
    shift_state: Option<String>,
    #[serde(default)]
    speed: Option<f64>,
}

#[derive(Deserialize, Default)]
struct ClimateState {
    #[serde(default)]
    is_climate_on: Option<bool>,
}

#[derive(Deserialize, Default)]
struct VehicleState {
    #[serde(default)]
    odometer: Option<f64>,
    #[serde(default)]
    car_version: Option<String>,
}

/// Parse one input line. Returns `None` for anything that is not a usable
/// record, and for Offline records unless `want_offline` is set.
pub fn parse_record(line: &str, want_offline: bool) -> Option<Record> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let raw: RawLine = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            log::debug!("skipping unparseable line: {e}");
            return None;
        }
    };

    let Some(time) = raw.time.or(raw.timestamp).or(raw.retrevial_time) else {
        log::debug!("skipping line without timestamp");
        return None;
    };

    let mode = match derive_mode(&raw) {
        Ok(m) => m,
        Err(e) => {
            log::debug!("skipping line: {e}");
            return None;
        }
    };

    if mode == Mode::Offline && !want_offline {
        return None;
    }

    let charge = raw.charge_state.unwrap_or_default();
    let drive = raw.drive_state.unwrap_or_default();
    let vehicle = raw.vehicle_state.unwrap_or_default();
    let flat = raw.flat;

    Some(Record {
        timestamp: epoch_secs(time),
        mode,
        vehicle_id: raw.vehicle_id,
        vin: raw.vin,
        display_name: raw.display_name,
        car_version: vehicle.car_version.or(flat.car_version),
        odometer: vehicle.odometer.or(flat.odometer),
        usable_battery_level: charge
            .usable_battery_level
            .or(flat.usable_battery_level)
            .map(|l| l.round() as i64),
        battery_range: charge.battery_range.or(flat.battery_range),
        speed: drive.speed.or(flat.speed),
        charge_energy_added: charge.charge_energy_added.or(flat.charge_energy_added),
        charge_miles_added: charge.charge_miles_added.or(flat.charge_miles_added),
        charge_rate: charge.charge_rate.or(flat.charge_rate),
        charger_power: charge.charger_power.or(flat.charger_power),
    })
}

/// Epoch seconds; values past year ~5000 in seconds are taken as milliseconds.
fn epoch_secs(time: f64) -> i64 {
    if time > 1e11 {
        (time / 1000.0) as i64
    } else {
        time as i64
    }
}

fn derive_mode(raw: &RawLine) -> Result<Mode, String> {
    if let Some(m) = raw.mode.as_deref() {
        return m.parse();
    }

    if matches!(raw.state.as_deref(), Some("offline" | "asleep")) {
        return Ok(Mode::Offline);
    }

    if raw.charge_state.is_none() && raw.drive_state.is_none() {
        return Ok(Mode::Polling);
    }

    if let Some(cs) = &raw.charge_state
        && matches!(cs.charging_state.as_deref(), Some("Charging" | "Starting"))
    {
        return Ok(Mode::Charging);
    }

    if let Some(ds) = &raw.drive_state {
        let shifted = matches!(ds.shift_state.as_deref(), Some("D" | "R" | "N"));
        let moving = ds.speed.is_some_and(|s| s > 0.0);
        if shifted || moving {
            return Ok(Mode::Driving);
        }
    }

    if raw
        .climate_state
        .as_ref()
        .and_then(|c| c.is_climate_on)
        .unwrap_or(false)
    {
        return Ok(Mode::Conditioning);
    }

    Ok(Mode::Standby)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_line_with_mode() {
        let r = parse_record(
            r#"{"time":1500000000,"mode":"Driving","vehicle_id":7,"odometer":1234.5,"usable_battery_level":70,"battery_range":180.2,"speed":55}"#,
            false,
        )
        .unwrap();
        assert_eq!(r.timestamp, 1_500_000_000);
        assert_eq!(r.mode, Mode::Driving);
        assert_eq!(r.vehicle_id, Some(7));
        assert_eq!(r.odometer, Some(1234.5));
        assert_eq!(r.usable_battery_level, Some(70));
        assert_eq!(r.speed, Some(55.0));
        assert!(r.charge_rate.is_none());
    }

    #[test]
    fn nested_vehicle_data_derives_charging() {
        let line = r#"{"retrevial_time":1500000000123,"vehicle_id":7,"display_name":"Red",
            "charge_state":{"charging_state":"Charging","usable_battery_level":55,"battery_range":140.5,
                "charge_energy_added":7.5,"charge_miles_added_rated":25.0,"charge_rate":22.0,"charger_power":11},
            "drive_state":{"shift_state":null,"speed":null},
            "climate_state":{"is_climate_on":false},
            "vehicle_state":{"odometer":2000.25,"car_version":"2019.8.5"}}"#;
        let r = parse_record(&line.replace('\n', " "), false).unwrap();
        assert_eq!(r.timestamp, 1_500_000_000);
        assert_eq!(r.mode, Mode::Charging);
        assert_eq!(r.display_name.as_deref(), Some("Red"));
        assert_eq!(r.car_version.as_deref(), Some("2019.8.5"));
        assert_eq!(r.odometer, Some(2000.25));
        assert_eq!(r.charge_miles_added, Some(25.0));
        assert_eq!(r.charger_power, Some(11.0));
    }

    #[test]
    fn time_wins_over_other_time_keys() {
        let r = parse_record(
            r#"{"time":1500000000,"timestamp":1400000000,"retrevial_time":1300000000000,"mode":"Standby"}"#,
            false,
        )
        .unwrap();
        assert_eq!(r.timestamp, 1_500_000_000);

        let r = parse_record(
            r#"{"timestamp":1400000000,"retrevial_time":1300000000000,"mode":"Standby"}"#,
            false,
        )
        .unwrap();
        assert_eq!(r.timestamp, 1_400_000_000);
    }

    #[test]
    fn derives_driving_conditioning_standby() {
        let driving = r#"{"time":1,"charge_state":{"charging_state":"Disconnected"},"drive_state":{"shift_state":"D","speed":30}}"#;
        let cond = r#"{"time":1,"charge_state":{},"drive_state":{"shift_state":"P"},"climate_state":{"is_climate_on":true}}"#;
        let standby = r#"{"time":1,"charge_state":{},"drive_state":{"shift_state":null}}"#;
        assert_eq!(parse_record(driving, false).unwrap().mode, Mode::Driving);
        assert_eq!(parse_record(cond, false).unwrap().mode, Mode::Conditioning);
        assert_eq!(parse_record(standby, false).unwrap().mode, Mode::Standby);
    }

    #[test]
    fn bare_poll_is_polling() {
        let r = parse_record(r#"{"time":1500000000,"state":"online"}"#, false).unwrap();
        assert_eq!(r.mode, Mode::Polling);
    }

    #[test]
    fn offline_only_when_wanted() {
        let line = r#"{"time":1500000000,"state":"asleep"}"#;
        assert!(parse_record(line, false).is_none());
        assert_eq!(parse_record(line, true).unwrap().mode, Mode::Offline);
    }

    #[test]
    fn junk_is_skipped() {
        assert!(parse_record("", false).is_none());
        assert!(parse_record("not json", false).is_none());
        assert!(parse_record(r#"{"mode":"Driving"}"#, false).is_none());
        assert!(parse_record(r#"{"time":1,"mode":"Hovering"}"#, false).is_none());
    }
}
