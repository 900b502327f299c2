//! CSV storage for the merged dataset.
//!
//! File layout (one header row, one row per country and year):
//! `Country,Country_Code,Year,GDP_per_capita,Life_Expectancy,Health_Exp_per_Capita,Child_Mortality,Region`
//!
//! Missing values are empty fields. The file is always rewritten wholesale.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use tracing::info;

use super::continent::Continent;
use super::models::{Dataset, Indicator, MergedRecord};
use crate::error::{Error, Result};

/// File name of the dataset inside the data directory
pub const DATASET_FILE: &str = "final_dataset.csv";

const KEY_COLUMNS: [&str; 3] = ["Country", "Country_Code", "Year"];

/// Storage interface for the dataset file in a data directory
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: PathBuf) -> Self {
        Storage { data_dir }
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(DATASET_FILE)
    }

    pub fn exists(&self) -> bool {
        self.dataset_path().is_file()
    }

    /// Replace the dataset file.
    ///
    /// Rows go to a sibling temp file first and are renamed into place, so an
    /// interrupted write never leaves a truncated dataset behind.
    pub fn write(&self, dataset: &Dataset) -> Result<PathBuf> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.dataset_path();
        let tmp = path.with_extension("csv.tmp");

        let result = File::create(&tmp)
            .map_err(Error::from)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                write_dataset(&mut writer, dataset)?;
                writer.flush()?;
                Ok(())
            })
            .and_then(|()| fs::rename(&tmp, &path).map_err(Error::from));

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result?;

        info!(path = %path.display(), rows = dataset.len(), "Wrote dataset");
        Ok(path)
    }

    /// Load and validate the dataset file
    pub fn read(&self) -> Result<Dataset> {
        let path = self.dataset_path();
        let file = File::open(&path)?;
        let dataset = read_dataset(BufReader::new(file))?;
        info!(path = %path.display(), rows = dataset.len(), "Loaded dataset");
        Ok(dataset)
    }
}

/// Serialize a dataset as CSV
pub fn write_dataset<W: Write>(writer: W, dataset: &Dataset) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if dataset.is_empty() {
        // serde only emits headers alongside the first record
        let mut header: Vec<&str> = KEY_COLUMNS.to_vec();
        header.extend(Indicator::ALL.iter().map(|i| i.column()));
        header.push("Region");
        csv_writer.write_record(&header)?;
    }
    for record in dataset.records() {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Parse and validate a CSV dataset.
///
/// Every key and indicator column must be present. The region column is
/// optional and is derived from the country code when blank.
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let required = KEY_COLUMNS
        .iter()
        .copied()
        .chain(Indicator::ALL.iter().map(|i| i.column()));
    let missing: Vec<&str> = required
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Schema(format!(
            "missing column(s): {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<MergedRecord>() {
        let mut record = row?;
        if record.region.is_none() {
            record.region = Continent::from_iso3(&record.country_code);
        }
        records.push(record);
    }

    Dataset::from_records(records)
}
