use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use csv::ReaderBuilder;
use prettytable::{Cell, Row, Table};

use heapdb::{
    Database, DatabaseError, Delete, FieldDef, FieldType, Insert, OpIterator, Schema, SeqScan,
    StorageConfig, TransactionId, Tuple, Values,
};

/// Page-oriented heap table storage
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding table files and manifests
    #[arg(short = 'D', long, default_value = "./heapdb_data")]
    data_dir: PathBuf,

    /// JSON storage configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page size in bytes (overrides the configuration file)
    #[arg(long)]
    page_size: Option<usize>,

    /// Buffer pool capacity in pages (overrides the configuration file)
    #[arg(long)]
    pool_pages: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty table
    Create {
        table: String,
        /// Comma-separated `name:type` list, e.g. `id:int,name:char(16)`
        #[arg(long)]
        columns: String,
    },
    /// Append the rows of a CSV file to a table
    Load {
        table: String,
        csv: PathBuf,
        /// The first CSV line is a header
        #[arg(long)]
        header: bool,
    },
    /// Print every row of a table
    Scan {
        table: String,
        #[arg(long)]
        alias: Option<String>,
    },
    /// Delete every row of a table
    Delete { table: String },
}

fn main() {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => StorageConfig::from_json_file(path)?,
        None => StorageConfig::default(),
    };
    if let Some(page_size) = args.page_size {
        config = config.with_page_size(page_size);
    }
    if let Some(pages) = args.pool_pages {
        config = config.with_buffer_pool_pages(pages);
    }

    let db = Database::new(&args.data_dir, config)?;
    let txn = TransactionId::next();

    match args.command {
        Command::Create { table, columns } => {
            let schema = parse_columns(&columns)?;
            db.create_table(&table, schema)?;
            println!("Created table {}", table);
        }
        Command::Load { table, csv, header } => {
            let count = load_csv(&db, txn, &table, &csv, header)?;
            println!("Inserted {} rows", count);
        }
        Command::Scan { table, alias } => {
            scan_table(&db, txn, &table, alias.as_deref())?;
        }
        Command::Delete { table } => {
            let table_id = db.open_table(&table)?;
            let scan = SeqScan::with_table_name(db.context(), txn, table_id)?;
            let mut delete = Delete::new(db.context(), txn, Box::new(scan));
            delete.open()?;
            let count = first_int(&delete.next()?);
            delete.close();
            println!("Deleted {} rows", count);
        }
    }

    db.flush()?;
    db.buffer_pool().transaction_complete(txn);
    Ok(())
}

/// Parse `id:int,name:char(16)` into a schema
fn parse_columns(spec: &str) -> Result<Schema, Box<dyn Error>> {
    let mut fields = Vec::new();
    for column in spec.split(',') {
        let (name, ty) = column
            .split_once(':')
            .ok_or_else(|| format!("Column '{}' must be written name:type", column))?;
        let field_type: FieldType = ty.parse()?;
        fields.push(FieldDef::new(name.trim(), field_type));
    }
    Ok(Schema::new(fields))
}

fn load_csv(
    db: &Database,
    txn: TransactionId,
    table: &str,
    path: &Path,
    header: bool,
) -> Result<i64, Box<dyn Error>> {
    let table_id = db.open_table(table)?;
    let schema = db
        .catalog()
        .schema(table_id)
        .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))?;

    let mut reader = ReaderBuilder::new().has_headers(header).from_path(path)?;
    let mut tuples = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != schema.num_fields() {
            return Err(format!(
                "Row has {} values but table {} has {} columns",
                record.len(),
                table,
                schema.num_fields()
            )
            .into());
        }

        let mut tuple = Tuple::new(schema.clone());
        for (idx, (text, field)) in record.iter().zip(schema.iter()).enumerate() {
            tuple.set_field(idx, field.field_type.parse_value(text)?)?;
        }
        tuples.push(tuple);
    }

    let values = Values::new(schema, tuples)?;
    let mut insert = Insert::new(db.context(), txn, Box::new(values), table_id)?;
    insert.open()?;
    let count = first_int(&insert.next()?);
    insert.close();
    Ok(count)
}

fn scan_table(
    db: &Database,
    txn: TransactionId,
    table: &str,
    alias: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let table_id = db.open_table(table)?;
    let mut scan = SeqScan::new(db.context(), txn, table_id, alias.unwrap_or(table))?;

    let mut output = Table::new();
    let titles = scan
        .schema()
        .iter()
        .map(|field| Cell::new(field.name.as_deref().unwrap_or("null")))
        .collect();
    output.set_titles(Row::new(titles));

    scan.open()?;
    while scan.has_next()? {
        let tuple = scan.next()?;
        let cells = tuple
            .fields()
            .map(|value| match value {
                Some(v) => Cell::new(&v.to_string()),
                None => Cell::new("null"),
            })
            .collect();
        output.add_row(Row::new(cells));
    }
    scan.close();

    output.printstd();
    Ok(())
}

fn first_int(tuple: &Tuple) -> i64 {
    match tuple.field(0) {
        Ok(Some(heapdb::Value::Int(n))) => i64::from(*n),
        _ => 0,
    }
}
