use crate::TeslalogError;
use crate::db::open_db_readonly;
use chrono::{TimeZone, Utc};
use std::path::Path;

pub fn handle_status(db_path: &Path) -> Result<(), TeslalogError> {
    if !db_path.exists() {
        eprintln!("teslalog: no database at {}", db_path.display());
        return Ok(());
    }

    // File sizes
    let db_size = std::fs::metadata(db_path)?.len();
    let wal_path = db_path.with_extension("db-wal");
    let wal_size = std::fs::metadata(&wal_path).map(|m| m.len()).ok();

    let conn = open_db_readonly(db_path)?;

    let vehicle_count: i64 = conn.query_row("SELECT COUNT(*) FROM vehicle", [], |r| r.get(0))?;
    let status_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM vehicle_status", [], |r| r.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT mode, COUNT(*) FROM vehicle_status GROUP BY mode ORDER BY COUNT(*) DESC",
    )?;
    let mode_breakdown: Vec<(String, i64)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT v.vehicle_id, v.display_name, MAX(s.ts)
         FROM vehicle v LEFT JOIN vehicle_status s ON s.vehicle_id = v.vehicle_id
         GROUP BY v.vehicle_id ORDER BY v.vehicle_id",
    )?;
    let last_seen: Vec<(i64, Option<String>, Option<i64>)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
        .collect::<Result<_, _>>()?;

    match wal_size {
        Some(ws) => eprintln!("teslalog: database — {} (+{} WAL)", fmt_size(db_size), fmt_size(ws)),
        None => eprintln!("teslalog: database — {}", fmt_size(db_size)),
    }

    eprintln!("teslalog: vehicles — {vehicle_count}");

    if mode_breakdown.is_empty() {
        eprintln!("teslalog: status records — {status_count}");
    } else {
        let parts: Vec<String> = mode_breakdown
            .iter()
            .map(|(m, c)| format!("{m}: {c}"))
            .collect();
        eprintln!("teslalog: status records — {status_count} ({})", parts.join(", "));
    }

    for (id, name, ts) in last_seen {
        let name = name.unwrap_or_else(|| "unnamed".into());
        match ts {
            Some(ts) => eprintln!("teslalog: vehicle {id} ({name}) — last record {}", format_utc(ts)),
            None => eprintln!("teslalog: vehicle {id} ({name}) — no records"),
        }
    }

    Ok(())
}

fn format_utc(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => ts.to_string(),
    }
}

fn fmt_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
