use crate::TeslalogError;
use crate::cli::ParseArgs;
use crate::config::{DEFAULT_NUMLINES, TeslalogConfig};
use crate::db::open_db;
use crate::input::{InputStream, Source};
use crate::parse::parse_record;
use crate::segment::Segmenter;
use crate::split::DailySplitter;
use crate::store::{StoreOutcome, store_record};
use crate::summary::raw_line;
use rusqlite::Connection;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessStats {
    pub lines: usize,
    pub records: usize,
    pub skipped: usize,
    pub stored: usize,
    pub duplicates: usize,
}

/// Consumes input lines for one stream. State carries across sources, so an
/// episode may span a file boundary.
pub struct Processor {
    segmenter: Segmenter,
    verbose: u8,
    summary: bool,
    splitter: Option<DailySplitter>,
    store: Option<Connection>,
    stats: ProcessStats,
}

impl Processor {
    pub fn new(verbose: u8, summary: bool) -> Self {
        Self {
            segmenter: Segmenter::new(),
            verbose,
            summary,
            splitter: None,
            store: None,
            stats: ProcessStats::default(),
        }
    }

    pub fn with_splitter(mut self, splitter: DailySplitter) -> Self {
        self.splitter = Some(splitter);
        self
    }

    /// Stored records are consumed by the store and not summarized.
    pub fn with_store(mut self, conn: Connection) -> Self {
        self.store = Some(conn);
        self
    }

    pub fn stats(&self) -> &ProcessStats {
        &self.stats
    }

    pub fn process_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<(), TeslalogError> {
        self.stats.lines += 1;
        let Some(record) = parse_record(line, self.verbose > 2) else {
            self.stats.skipped += 1;
            return Ok(());
        };
        self.stats.records += 1;

        if let Some(conn) = &self.store {
            match store_record(conn, &record) {
                Ok(StoreOutcome::Inserted) => self.stats.stored += 1,
                Ok(StoreOutcome::Duplicate) => self.stats.duplicates += 1,
                Ok(StoreOutcome::Skipped) => {
                    log::debug!("record at {} has no vehicle id, not stored", record.timestamp)
                }
                Err(e) => log::warn!("failed to store record at {}: {e}", record.timestamp),
            }
            return Ok(());
        }

        if let Some(splitter) = self.splitter.as_mut() {
            splitter.write(record.timestamp, line)?;
        }

        if record.is_polling() {
            if self.verbose > 1 {
                writeln!(out, "{}", raw_line(&record))?;
            }
            if self.summary {
                self.segmenter.feed(record);
            }
            return Ok(());
        }

        let echo = (self.verbose > 0).then(|| raw_line(&record));
        if self.summary
            && let Some(report) = self.segmenter.feed(record)
        {
            writeln!(out, "{report}")?;
        }
        if let Some(echo) = echo {
            writeln!(out, "{echo}")?;
        }
        Ok(())
    }

    pub fn run<W: Write>(&mut self, sources: &[Source], out: &mut W) -> Result<(), TeslalogError> {
        for source in sources {
            let mut input = InputStream::open(source)?;
            while let Some(line) = input.next_line()? {
                self.process_line(&line, out)?;
            }
            out.flush()?;
        }
        Ok(())
    }
}

pub fn handle_parse(
    args: &ParseArgs,
    verbose: u8,
    db_path: &Path,
    config: &TeslalogConfig,
) -> Result<(), TeslalogError> {
    let numlines = args
        .numlines
        .or(config.follow.numlines)
        .unwrap_or(DEFAULT_NUMLINES);
    let sources = Source::plan(&args.files, args.follow.as_ref(), numlines);
    if sources.is_empty() {
        return Err(TeslalogError::Config(
            "no input: give files or --follow".into(),
        ));
    }

    let summary = !args.nosummary && config.summary.enabled;
    let mut processor = Processor::new(verbose, summary);

    if args.store {
        let conn = open_db(db_path)?;
        log::info!("storing records in {}", db_path.display());
        processor = processor.with_store(conn);
    }

    if let Some(outdir) = args.outdir.as_ref().or(config.split.outdir.as_ref()) {
        processor = processor.with_splitter(DailySplitter::new(outdir)?);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    processor.run(&sources, &mut out)?;

    let stats = processor.stats();
    log::info!(
        "{} lines, {} records, {} skipped, {} stored, {} duplicates",
        stats.lines,
        stats.records,
        stats.skipped,
        stats.stored,
        stats.duplicates
    );
    Ok(())
}
