use crate::TeslalogError;
use chrono::{TimeZone, Utc};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const CURRENT_LINK: &str = "cur.json";

/// Appends raw input lines to one file per UTC day under `outdir`.
pub struct DailySplitter {
    outdir: PathBuf,
    /// Start of the next UTC hour; the target file is re-resolved once past it.
    next_check: i64,
    file: Option<File>,
}

impl DailySplitter {
    pub fn new(outdir: &Path) -> Result<Self, TeslalogError> {
        if !outdir.exists() {
            std::fs::create_dir_all(outdir)?;
        }
        Ok(Self {
            outdir: outdir.to_path_buf(),
            next_check: i64::MIN,
            file: None,
        })
    }

    /// Write `line` into the file for the day containing `ts`.
    pub fn write(&mut self, ts: i64, line: &str) -> Result<(), TeslalogError> {
        let file = self.file_for(ts)?;
        file.write_all(line.as_bytes())?;
        if !line.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        Ok(())
    }

    fn file_for(&mut self, ts: i64) -> Result<&mut File, TeslalogError> {
        if ts >= self.next_check || self.file.is_none() {
            self.next_check = (ts.div_euclid(3600) + 1) * 3600;
            let name = daily_file_name(ts);
            let path = self.outdir.join(&name);
            log::debug!("split output now {}", path.display());
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            self.file = Some(file);
            self.link_current(&name)?;
        }
        self.file
            .as_mut()
            .ok_or_else(|| TeslalogError::Config("split output not open".into()))
    }

    #[cfg(unix)]
    fn link_current(&self, name: &str) -> Result<(), TeslalogError> {
        let link = self.outdir.join(CURRENT_LINK);
        if link.symlink_metadata().is_ok() {
            std::fs::remove_file(&link)?;
        }
        std::os::unix::fs::symlink(name, &link)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn link_current(&self, _name: &str) -> Result<(), TeslalogError> {
        Ok(())
    }
}

/// `YYYY-MM-DD.json` for the UTC date of `ts`.
pub fn daily_file_name(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d.json").to_string(),
        None => "invalid-time.json".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_name_uses_utc_date() {
        assert_eq!(daily_file_name(0), "1970-01-01.json");
        // 2017-07-14 02:40:00 UTC
        assert_eq!(daily_file_name(1_500_000_000), "2017-07-14.json");
        assert_eq!(daily_file_name(1_500_000_000 + 86_400), "2017-07-15.json");
    }

    #[test]
    fn lines_land_in_their_day() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("daily");
        let mut splitter = DailySplitter::new(&out).unwrap();

        splitter.write(1_500_000_000, "{\"a\":1}\n").unwrap();
        splitter.write(1_500_000_060, "{\"a\":2}").unwrap();
        splitter.write(1_500_086_400, "{\"a\":3}\n").unwrap();

        let day1 = std::fs::read_to_string(out.join("2017-07-14.json")).unwrap();
        let day2 = std::fs::read_to_string(out.join("2017-07-15.json")).unwrap();
        assert_eq!(day1, "{\"a\":1}\n{\"a\":2}\n");
        assert_eq!(day2, "{\"a\":3}\n");
    }

    #[cfg(unix)]
    #[test]
    fn current_link_follows_latest_day() {
        let dir = TempDir::new().unwrap();
        let mut splitter = DailySplitter::new(dir.path()).unwrap();
        splitter.write(1_500_000_000, "x").unwrap();
        splitter.write(1_500_086_400, "y").unwrap();

        let target = std::fs::read_link(dir.path().join(CURRENT_LINK)).unwrap();
        assert_eq!(target, PathBuf::from("2017-07-15.json"));
    }

    #[test]
    fn appends_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut splitter = DailySplitter::new(dir.path()).unwrap();
            splitter.write(1_500_000_000, "first").unwrap();
        }
        let mut splitter = DailySplitter::new(dir.path()).unwrap();
        splitter.write(1_500_000_100, "second").unwrap();
        let content = std::fs::read_to_string(dir.path().join("2017-07-14.json")).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}
