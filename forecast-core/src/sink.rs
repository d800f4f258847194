use anyhow::{Context, Result};
use std::{fs, io, path::Path};

use crate::model::ForecastRecord;

/// CSV writer for forecast records. The header row is written up front,
/// so an empty batch still produces a well-formed file.
pub struct CsvSink<W: io::Write> {
    writer: csv::Writer<W>,
}

impl<W: io::Write> CsvSink<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer
            .write_record(ForecastRecord::HEADERS)
            .context("Failed to write CSV header")?;

        Ok(Self { writer })
    }

    pub fn write(&mut self, record: &ForecastRecord) -> Result<()> {
        self.writer
            .serialize(record)
            .with_context(|| format!("Failed to write record for {:?}", record.local_date))
    }

    pub fn write_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a ForecastRecord>,
    ) -> Result<usize> {
        let mut written = 0;
        for record in records {
            self.write(record)?;
            written += 1;
        }
        Ok(written)
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))
    }
}

/// Write `records` to `path`, creating parent directories as needed.
pub fn write_csv_file(path: &Path, records: &[ForecastRecord]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    let mut sink = CsvSink::new(file)?;
    let written = sink.write_all(records)?;
    sink.into_inner()?;

    Ok(written)
}
