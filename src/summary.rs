use crate::episode::Episode;
use crate::record::{Mode, Record};
use chrono::{Local, TimeZone};
use std::fmt;

/// Everything a calculator needs when an episode closes.
pub struct Closing<'a> {
    pub episode: &'a Episode,
    /// Last record of the episode before the closing one.
    pub baseline: Option<&'a Record>,
    /// First record of the next mode.
    pub transition: &'a Record,
    /// End of the closing episode, corrected for the latest Polling contact.
    pub ended_at: i64,
}

impl Closing<'_> {
    pub fn elapsed_secs(&self) -> i64 {
        self.ended_at - self.episode.started_at()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeSummary {
    pub started_at: i64,
    pub elapsed_secs: i64,
    pub delta_level: i64,
    pub level: i64,
    pub energy_added: f64,
    pub delta_range: f64,
    /// Range gained per hour of charging.
    pub rate_per_hour: f64,
    /// kWh per 100% of battery.
    pub efficiency: f64,
    /// Projected range at 100%.
    pub max_range: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriveSummary {
    pub started_at: i64,
    pub elapsed_secs: i64,
    pub distance: f64,
    pub battery_used: i64,
    pub range_used: f64,
    pub efficiency: f64,
}

/// Standby and Conditioning share one formula.
#[derive(Debug, Clone, PartialEq)]
pub struct IdleSummary {
    pub mode: Mode,
    pub started_at: i64,
    pub elapsed_secs: i64,
    pub battery_lost: i64,
    pub range_lost: f64,
    pub per_day: f64,
    pub level: i64,
}

/// One line of the summary stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Charged(ChargeSummary),
    Drove(DriveSummary),
    Idled(IdleSummary),
    NoPreviousState { started_at: i64, mode: Mode },
    Unhandled(Mode),
}

/// Summarize a closing episode. `None` means nothing should be printed.
pub fn summarize(closing: &Closing<'_>) -> Option<Report> {
    let episode = closing.episode;
    let baseline = match closing.baseline {
        Some(b) if has_deltas_base(b) => b,
        _ => {
            return Some(Report::NoPreviousState {
                started_at: episode.started_at(),
                mode: episode.mode,
            });
        }
    };

    match episode.mode {
        Mode::Charging => Some(Report::Charged(charging(closing, baseline))),
        Mode::Driving => driving(closing, baseline).map(Report::Drove),
        Mode::Standby | Mode::Conditioning => Some(Report::Idled(idle(closing, baseline))),
        Mode::Polling | Mode::Offline => {
            log::debug!("no calculator for {} episode", episode.mode);
            Some(Report::Unhandled(episode.mode))
        }
    }
}

/// Whether `baseline` can anchor deltas. A zero level or odometer counts as
/// missing.
pub fn has_deltas_base(baseline: &Record) -> bool {
    baseline.usable_battery_level.is_some_and(|l| l != 0)
        && baseline.odometer.is_some_and(|o| o != 0.0)
}

/// Higher of two readings; `other` only wins when strictly higher.
fn peak<T: PartialOrd + Copy>(own: Option<T>, other: Option<T>) -> Option<T> {
    match (own, other) {
        (Some(a), Some(b)) => Some(if b > a { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Lower of two readings; `other` only wins when strictly lower.
fn low<T: PartialOrd + Copy>(own: Option<T>, other: Option<T>) -> Option<T> {
    match (own, other) {
        (Some(a), Some(b)) => Some(if b < a { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Baseline level and range. Both are present after the guard in `summarize`,
/// except the range, which falls back to `fallback` so deltas come out as zero.
fn base_values(baseline: &Record, fallback: Option<f64>) -> (i64, f64) {
    let level = baseline.usable_battery_level.unwrap_or(0);
    let range = baseline.battery_range.or(fallback).unwrap_or(0.0);
    (level, range)
}

fn charging(closing: &Closing<'_>, baseline: &Record) -> ChargeSummary {
    let last = &closing.episode.last;
    let next = closing.transition;
    let elapsed = closing.elapsed_secs();

    let range = peak(last.battery_range, next.battery_range);
    let (base_level, base_range) = base_values(baseline, range);
    let range = range.unwrap_or(base_range);
    let level = peak(last.usable_battery_level, next.usable_battery_level).unwrap_or(base_level);
    let energy_added = peak(last.charge_energy_added, next.charge_energy_added).unwrap_or(0.0);
    let full_level = next.usable_battery_level.unwrap_or(level);

    let delta_level = level - base_level;
    let delta_range = range - base_range;

    ChargeSummary {
        started_at: closing.episode.started_at(),
        elapsed_secs: elapsed,
        delta_level,
        level,
        energy_added,
        delta_range,
        rate_per_hour: if elapsed > 0 {
            delta_range * 3600.0 / elapsed as f64
        } else {
            0.0
        },
        efficiency: if delta_level > 0 {
            energy_added * 100.0 / delta_level as f64
        } else {
            0.0
        },
        // projected full range is scaled by the transition record's own level
        max_range: if full_level > 0 {
            range * 100.0 / full_level as f64
        } else {
            0.0
        },
    }
}

fn driving(closing: &Closing<'_>, baseline: &Record) -> Option<DriveSummary> {
    let last = &closing.episode.last;
    let next = closing.transition;

    let range = low(last.battery_range, next.battery_range);
    let (base_level, base_range) = base_values(baseline, range);
    let range = range.unwrap_or(base_range);
    let level = low(last.usable_battery_level, next.usable_battery_level).unwrap_or(base_level);

    let base_odometer = baseline.odometer.unwrap_or(0.0);
    let distance = last.odometer.or(next.odometer).unwrap_or(base_odometer) - base_odometer;
    let range_used = base_range - range;

    // odometer went backwards; close the episode without a line
    if distance <= -1.0 {
        log::info!(
            "drive starting {} has negative distance {distance:.2}, not reported",
            closing.episode.started_at()
        );
        return None;
    }

    Some(DriveSummary {
        started_at: closing.episode.started_at(),
        elapsed_secs: closing.elapsed_secs(),
        distance,
        battery_used: base_level - level,
        range_used,
        efficiency: if range_used > 0.0 {
            distance * 100.0 / range_used
        } else {
            0.0
        },
    })
}

fn idle(closing: &Closing<'_>, baseline: &Record) -> IdleSummary {
    let last = &closing.episode.last;
    let elapsed = closing.elapsed_secs();

    let range = low(last.battery_range, closing.transition.battery_range);
    let (base_level, base_range) = base_values(baseline, range);
    let range = range.unwrap_or(base_range);
    // the episode's own last level, not the lower of the pair
    let level = last.usable_battery_level.unwrap_or(base_level);
    let range_lost = base_range - range;

    IdleSummary {
        mode: closing.episode.mode,
        started_at: closing.episode.started_at(),
        elapsed_secs: elapsed,
        battery_lost: base_level - level,
        range_lost,
        per_day: if elapsed > 0 {
            range_lost / (elapsed as f64 / 86400.0)
        } else {
            0.0
        },
        level,
    }
}

/// `YYYY-MM-DD HH:MM:SS` in local time.
pub fn format_local(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

/// Elapsed time as `H:MM:SS`, with a `N day(s), ` prefix past one day.
pub fn format_elapsed(secs: i64) -> String {
    let days = secs.div_euclid(86400);
    let rem = secs.rem_euclid(86400);
    let hms = format!("{}:{:02}:{:02}", rem / 3600, rem % 3600 / 60, rem % 60);
    match days {
        0 => hms,
        1 | -1 => format!("{days} day, {hms}"),
        _ => format!("{days} days, {hms}"),
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Charged(c) => write!(
                f,
                "{} +{:<16} Charged   {:3}% (to {:3}%) {:5.2}kW {:5.1}M ({:3}mph, {:4.1}kW {:5.1}M max)",
                format_local(c.started_at),
                format_elapsed(c.elapsed_secs),
                c.delta_level,
                c.level,
                c.energy_added,
                c.delta_range,
                c.rate_per_hour as i64,
                c.efficiency,
                c.max_range,
            ),
            Report::Drove(d) => write!(
                f,
                "{} +{:<16} Drove  {:6.2}M at cost of {:2}% {:5.1}M at {:5.1}% efficiency",
                format_local(d.started_at),
                format_elapsed(d.elapsed_secs),
                d.distance,
                d.battery_used,
                d.range_used,
                d.efficiency,
            ),
            Report::Idled(s) => {
                let label = if s.mode == Mode::Conditioning {
                    "Conditioned"
                } else {
                    "Sat&Lost"
                };
                write!(
                    f,
                    "{} +{:<16} {label} {:2}% {:5.1}M or {:5.1}M/d (to {:3}%)",
                    format_local(s.started_at),
                    format_elapsed(s.elapsed_secs),
                    s.battery_lost,
                    s.range_lost,
                    s.per_day,
                    s.level,
                )
            }
            Report::NoPreviousState { started_at, mode } => write!(
                f,
                "{}            ending {}, but did not have previous state to compute deltas",
                format_local(*started_at),
                mode.as_str(),
            ),
            Report::Unhandled(mode) => write!(f, "Do not handle mode {}", mode.as_str()),
        }
    }
}

/// Verbose one-line dump of a single record.
pub fn raw_line(r: &Record) -> String {
    let odo = match r.odometer {
        Some(o) if o != 0.0 => format!("{o:.2}"),
        _ => String::new(),
    };
    let spd = match r.speed {
        Some(s) if s != 0.0 && s.fract() == 0.0 => format!("{}", s as i64),
        Some(s) if s != 0.0 => format!("{s}"),
        _ => String::new(),
    };
    let bat = match r.usable_battery_level {
        Some(l) if l != 0 => format!("{l:3}%/{:.2}M", r.battery_range.unwrap_or(0.0)),
        _ => String::new(),
    };
    let rate = match r.charge_rate {
        Some(cr) if cr != 0.0 => format!(
            "{}kW/{}M",
            r.charger_power.unwrap_or(0.0) as i64,
            cr as i64
        ),
        _ => String::new(),
    };
    let add = match r.charge_energy_added {
        Some(e) if e != 0.0 => format!("{e:5.2}/{:.1}M", r.charge_miles_added.unwrap_or(0.0)),
        _ => String::new(),
    };

    format!(
        "{} {:<8} odo={odo:<7} spd={spd:<3} bat={bat:<12} chg@{rate:<12} add={add}",
        format_local(r.timestamp),
        r.mode,
    )
}
