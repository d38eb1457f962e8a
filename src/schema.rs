use rusqlite_migration::{M, Migrations};
use std::sync::LazyLock;

pub static MIGRATIONS: LazyLock<Migrations<'static>> = LazyLock::new(|| {
    Migrations::new(vec![
        M::up(
            "
CREATE TABLE vehicle (
    vehicle_id   INTEGER PRIMARY KEY,
    vin          TEXT,
    display_name TEXT,
    car_version  TEXT,
    first_seen   INTEGER NOT NULL,
    last_seen    INTEGER NOT NULL
);

CREATE TABLE vehicle_status (
    vehicle_id           INTEGER NOT NULL REFERENCES vehicle(vehicle_id),
    ts                   INTEGER NOT NULL,
    mode                 TEXT NOT NULL,
    odometer             REAL,
    usable_battery_level INTEGER,
    battery_range        REAL,
    speed                REAL,
    charge_energy_added  REAL,
    charge_miles_added   REAL,
    charge_rate          REAL,
    charger_power        REAL,
    PRIMARY KEY (vehicle_id, ts)
);

CREATE INDEX idx_status_mode ON vehicle_status(mode, ts);
",
        ),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_valid() {
        assert!(MIGRATIONS.validate().is_ok());
    }

    #[test]
    fn migrations_apply_to_memory_db() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        MIGRATIONS.to_latest(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"vehicle".into()));
        assert!(tables.contains(&"vehicle_status".into()));
    }
}
