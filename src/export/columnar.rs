use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Date32Array, Float64Array, UInt64Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::{Duration, NaiveDate};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    path::Path,
    sync::Arc,
};
use tracing::{debug, info};

use crate::surveillance::{Period, ResistanceRecord};

const MONTH_COL: &str = "month";
const TOTAL_COL: &str = "total";
const MOM_COL: &str = "mom_change_pct";
const YOY_COL: &str = "yoy_change_pct";
const RESERVED_COLS: [&str; 4] = [MONTH_COL, TOTAL_COL, MOM_COL, YOY_COL];

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn to_date32(d: NaiveDate) -> i32 {
    (d - epoch()).num_days() as i32
}

fn from_date32(days: i32) -> NaiveDate {
    epoch() + Duration::days(days as i64)
}

/// Build the export batch: month, total, one column per phenotype, change rates.
pub fn records_to_batch(records: &[ResistanceRecord]) -> Result<RecordBatch> {
    let phenotypes: BTreeSet<&String> = records.iter().flat_map(|r| r.phenotypes.keys()).collect();
    if let Some(clash) = phenotypes
        .iter()
        .find(|name| RESERVED_COLS.iter().any(|c| c.eq_ignore_ascii_case(name.as_str())))
    {
        return Err(anyhow!("phenotype column {:?} collides with a reserved export column", clash));
    }

    let mut fields = vec![
        Field::new(MONTH_COL, DataType::Date32, false),
        Field::new(TOTAL_COL, DataType::UInt64, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(
            records.iter().map(|r| to_date32(r.month.first_day())).collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(records.iter().map(|r| r.total).collect::<Vec<_>>())),
    ];

    for name in &phenotypes {
        fields.push(Field::new(name.as_str(), DataType::UInt64, false));
        columns.push(Arc::new(UInt64Array::from(
            records
                .iter()
                .map(|r| r.phenotypes.get(*name).copied().unwrap_or(0))
                .collect::<Vec<_>>(),
        )));
    }

    fields.push(Field::new(MOM_COL, DataType::Float64, true));
    fields.push(Field::new(YOY_COL, DataType::Float64, true));
    columns.push(Arc::new(Float64Array::from(
        records.iter().map(|r| r.mom_change_pct).collect::<Vec<_>>(),
    )));
    columns.push(Arc::new(Float64Array::from(
        records.iter().map(|r| r.yoy_change_pct).collect::<Vec<_>>(),
    )));

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context("building export batch")
}

/// Write enriched records to a Snappy-compressed Parquet file.
#[tracing::instrument(level = "info", skip(records), fields(path = %path.as_ref().display(), rows = records.len()))]
pub fn write_records_parquet<P: AsRef<Path>>(records: &[ResistanceRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let batch = records_to_batch(records)?;
    let file = File::create(path).with_context(|| format!("creating export file {:?}", path))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer for export")?;
    writer.write(&batch).context("writing export batch")?;
    writer.close().context("closing export writer")?;
    info!("export written");
    Ok(())
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("export is missing column {:?} or it has the wrong type", name))
}

/// Read an export written by `write_records_parquet` back into records.
pub fn read_records_parquet<P: AsRef<Path>>(path: P) -> Result<Vec<ResistanceRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening export {:?}", path))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of {:?}", path))?
        .build()?;

    let mut out = Vec::new();
    for batch in reader {
        let batch = batch.context("reading export batch")?;
        let months = column::<Date32Array>(&batch, MONTH_COL)?;
        let totals = column::<UInt64Array>(&batch, TOTAL_COL)?;
        let mom = column::<Float64Array>(&batch, MOM_COL)?;
        let yoy = column::<Float64Array>(&batch, YOY_COL)?;

        let schema = batch.schema();
        let mut phenotype_cols: Vec<(String, &UInt64Array)> = Vec::new();
        for f in schema.fields().iter() {
            if f.name() != TOTAL_COL && f.data_type() == &DataType::UInt64 {
                phenotype_cols.push((f.name().clone(), column::<UInt64Array>(&batch, f.name())?));
            }
        }

        for row in 0..batch.num_rows() {
            let month = Period::containing(from_date32(months.value(row)));
            let phenotypes: BTreeMap<String, u64> = phenotype_cols
                .iter()
                .map(|(name, arr)| (name.clone(), arr.value(row)))
                .collect();
            let mut rec = ResistanceRecord::new(month, totals.value(row), phenotypes);
            rec.mom_change_pct = (!mom.is_null(row)).then(|| mom.value(row));
            rec.yoy_change_pct = (!yoy.is_null(row)).then(|| yoy.value(row));
            out.push(rec);
        }
    }

    debug!(rows = out.len(), "read export");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surveillance::compute_change_rates;
    use crate::surveillance::record::tests::record;
    use tempfile::tempdir;

    #[test]
    fn export_preserves_records() -> Result<()> {
        let mut recs: Vec<ResistanceRecord> = (1..=3).map(|m| record(2024, m, 100 + m as u64 * 10, m as u64, 0)).collect();
        recs[2].phenotypes.insert("Wild".into(), 77);
        let recs = compute_change_rates(recs)?;

        let dir = tempdir()?;
        let path = dir.path().join("records.parquet");
        write_records_parquet(&recs, &path)?;
        let back = read_records_parquet(&path)?;

        assert_eq!(back.len(), 3);
        assert_eq!(back[0].mom_change_pct, None);
        assert_eq!(back[1].mom_change_pct, recs[1].mom_change_pct);
        assert_eq!(back[2].month, recs[2].month);
        assert_eq!(back[2].day, recs[2].day);
        assert_eq!(back[2].count("Wild"), 77);
        // phenotypes missing from a record are exported as zero
        assert_eq!(back[0].count("Wild"), 0);
        assert_eq!(back[1].mrsa(), 2);
        Ok(())
    }

    #[test]
    fn batch_layout() -> Result<()> {
        let batch = records_to_batch(&[record(2024, 1, 10, 2, 1)])?;
        let names: Vec<String> = batch.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(names, vec!["month", "total", "MRSA", "VRSA", "mom_change_pct", "yoy_change_pct"]);
        assert_eq!(column::<Date32Array>(&batch, MONTH_COL)?.value(0), 19723);
        Ok(())
    }

    #[test]
    fn reserved_phenotype_names_are_rejected() -> Result<()> {
        let mut rec = record(2024, 1, 10, 2, 1);
        rec.phenotypes.insert("Total".into(), 3);
        assert!(records_to_batch(std::slice::from_ref(&rec)).is_err());

        let dir = tempdir()?;
        let path = dir.path().join("clash.parquet");
        assert!(write_records_parquet(&[rec], &path).is_err());
        assert!(!path.exists());
        Ok(())
    }
}
