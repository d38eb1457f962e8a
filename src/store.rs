use crate::TeslalogError;
use crate::record::Record;
use rusqlite::{Connection, OptionalExtension, params};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    /// A status row for this (vehicle, timestamp) already exists.
    Duplicate,
    /// Record carried no vehicle id.
    Skipped,
}

/// Insert the vehicle on first sight, or refresh name/version/last_seen.
fn upsert_vehicle(conn: &Connection, vehicle_id: i64, record: &Record) -> Result<(), TeslalogError> {
    let existing: Option<(Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT display_name, car_version FROM vehicle WHERE vehicle_id = ?1",
            params![vehicle_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;

    let Some((name, version)) = existing else {
        conn.execute(
            "INSERT INTO vehicle (vehicle_id, vin, display_name, car_version, first_seen, last_seen)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                vehicle_id,
                record.vin,
                record.display_name,
                record.car_version,
                record.timestamp,
            ],
        )?;
        log::info!("new vehicle {vehicle_id}");
        return Ok(());
    };

    if let Some(new_name) = record.display_name.as_deref()
        && name.as_deref() != Some(new_name)
    {
        log::info!(
            "vehicle {vehicle_id} name changed from '{}' to '{new_name}'",
            name.as_deref().unwrap_or("")
        );
    }
    if let Some(new_version) = record.car_version.as_deref()
        && version.as_deref() != Some(new_version)
    {
        log::info!("vehicle {vehicle_id} was updated to version {new_version}");
    }

    conn.execute(
        "UPDATE vehicle SET
             vin = COALESCE(?2, vin),
             display_name = COALESCE(?3, display_name),
             car_version = COALESCE(?4, car_version),
             last_seen = MAX(last_seen, ?5)
         WHERE vehicle_id = ?1",
        params![
            vehicle_id,
            record.vin,
            record.display_name,
            record.car_version,
            record.timestamp,
        ],
    )?;
    Ok(())
}

/// Persist one record. Re-storing the same (vehicle, timestamp) is a no-op.
pub fn store_record(conn: &Connection, record: &Record) -> Result<StoreOutcome, TeslalogError> {
    let Some(vehicle_id) = record.vehicle_id else {
        return Ok(StoreOutcome::Skipped);
    };

    let tx = conn.unchecked_transaction()?;
    upsert_vehicle(&tx, vehicle_id, record)?;

    let inserted = tx.execute(
        "INSERT INTO vehicle_status (vehicle_id, ts, mode, odometer, usable_battery_level,
             battery_range, speed, charge_energy_added, charge_miles_added, charge_rate, charger_power)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT (vehicle_id, ts) DO NOTHING",
        params![
            vehicle_id,
            record.timestamp,
            record.mode.as_str(),
            record.odometer,
            record.usable_battery_level,
            record.battery_range,
            record.speed,
            record.charge_energy_added,
            record.charge_miles_added,
            record.charge_rate,
            record.charger_power,
        ],
    )?;
    tx.commit()?;

    if inserted == 0 {
        log::info!(
            "did not insert status for vehicle {vehicle_id}: duplicate timestamp {}",
            record.timestamp
        );
        Ok(StoreOutcome::Duplicate)
    } else {
        Ok(StoreOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_db;
    use crate::record::Mode;
    use tempfile::TempDir;

    fn setup_db() -> (TempDir, Connection) {
        let dir = TempDir::new().unwrap();
        let conn = open_db(&dir.path().join("test.db")).unwrap();
        (dir, conn)
    }

    fn rec(ts: i64, name: &str, version: Option<&str>) -> Record {
        Record {
            vehicle_id: Some(42),
            display_name: Some(name.into()),
            car_version: version.map(String::from),
            odometer: Some(1000.0),
            usable_battery_level: Some(80),
            battery_range: Some(200.0),
            ..Record::new(ts, Mode::Standby)
        }
    }

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn stores_vehicle_and_status() {
        let (_dir, conn) = setup_db();
        let outcome = store_record(&conn, &rec(100, "Red", Some("2019.8"))).unwrap();
        assert_eq!(outcome, StoreOutcome::Inserted);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM vehicle"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM vehicle_status"), 1);

        let (mode, level): (String, i64) = conn
            .query_row(
                "SELECT mode, usable_battery_level FROM vehicle_status WHERE vehicle_id = 42",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(mode, "Standby");
        assert_eq!(level, 80);
    }

    #[test]
    fn same_timestamp_is_idempotent() {
        let (_dir, conn) = setup_db();
        store_record(&conn, &rec(100, "Red", None)).unwrap();
        let outcome = store_record(&conn, &rec(100, "Red", None)).unwrap();
        assert_eq!(outcome, StoreOutcome::Duplicate);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM vehicle_status"), 1);
    }

    #[test]
    fn rename_and_version_update_vehicle() {
        let (_dir, conn) = setup_db();
        store_record(&conn, &rec(100, "Red", Some("2019.8"))).unwrap();
        store_record(&conn, &rec(200, "Blue", None)).unwrap();
        store_record(&conn, &rec(300, "Blue", Some("2019.12"))).unwrap();

        let (name, version, first, last): (String, String, i64, i64) = conn
            .query_row(
                "SELECT display_name, car_version, first_seen, last_seen FROM vehicle WHERE vehicle_id = 42",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(name, "Blue");
        assert_eq!(version, "2019.12");
        assert_eq!(first, 100);
        assert_eq!(last, 300);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM vehicle_status"), 3);
    }

    #[test]
    fn record_without_vehicle_is_skipped() {
        let (_dir, conn) = setup_db();
        let outcome = store_record(&conn, &Record::new(1, Mode::Polling)).unwrap();
        assert_eq!(outcome, StoreOutcome::Skipped);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM vehicle"), 0);
    }
}
