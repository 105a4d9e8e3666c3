use parquet::file::reader::{FileReader, SerializedFileReader};
use staphwatch::{export::read_records_parquet, render};
use std::{env, fs::File, path::Path, process::exit};

fn main() {
    // Expect exactly one CLI argument: path to an export file.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <EXPORT_PARQUET>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect_export(Path::new(&args[1])) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Print file metadata, then the records as a table.
fn inspect_export(path: &Path) -> anyhow::Result<()> {
    let reader = SerializedFileReader::new(File::open(path)?)?;
    let meta = reader.metadata();
    let file_meta = meta.file_metadata();

    println!("=== Export: {} ===", path.display());
    println!(
        "Created by:           {}",
        file_meta.created_by().unwrap_or("<unknown>")
    );
    println!("Total rows:           {}", file_meta.num_rows());
    println!("Number of row groups: {}", meta.num_row_groups());
    println!("File-size on disk:    {} bytes", std::fs::metadata(path)?.len());
    println!();

    let records = read_records_parquet(path)?;
    render::records_table(&records).printstd();
    Ok(())
}
