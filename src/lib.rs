//! xlsxrecords - Spreadsheet-to-records extraction pipeline
//!
//! This crate reads spreadsheet files (XLS/XLSX) as rows of string fields.
//! Binary decoding is delegated to an external converter process; the crate
//! enumerates worksheets, tokenizes the CSV the converter writes, and applies
//! optional skip-empty compaction and term search.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xlsxrecords::{ExcelParserBuilder, ParseOptions, ParsedRecords};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // `python convert.py` as the converter
//!     let parser = ExcelParserBuilder::new().build()?;
//!
//!     // First worksheet only
//!     let records = parser.parse(&ParseOptions::new("master.xlsx").with_worksheet_id(1))?;
//!     if let ParsedRecords::Single(rows) = records {
//!         println!("{} rows", rows.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # All Worksheets
//!
//! Without a worksheet selector every worksheet is read, one after another,
//! in ascending worksheet-id order:
//!
//! ```rust,no_run
//! use xlsxrecords::{ExcelParserBuilder, ParseOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let parser = ExcelParserBuilder::new().build()?;
//!     let sheets = parser.parse(&ParseOptions::new("master.xlsx"))?.into_sheets();
//!     for (index, rows) in sheets.iter().enumerate() {
//!         println!("sheet {}: {} rows", index + 1, rows.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Search and Skip-Empty
//!
//! ```rust,no_run
//! use xlsxrecords::{ExcelParserBuilder, ParseOptions, SearchSpec};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let parser = ExcelParserBuilder::new()
//!         .with_program("python3")
//!         .with_program_args(["/opt/excel-parser/convert.py"])
//!         .build()?;
//!
//!     let options = ParseOptions::new("master.xls")
//!         .with_worksheet_name("Sheet1")
//!         .with_search(SearchSpec::strict(["Denim"]))
//!         .skip_empty(true);
//!     let records = parser.parse(&options)?;
//!     println!("found {} records", records.len());
//!
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod csv;
mod error;
mod filter;
mod process;
mod types;
mod worksheets;

// 公開API
pub use api::{ParseOptions, ParsedRecords, Record, SearchMode, SearchSpec, WorksheetSelector};
pub use builder::{list_worksheets, parse, ExcelParser, ExcelParserBuilder, CONVERTER_ENV};
pub use csv::tokenize;
pub use error::ExcelParseError;
pub use filter::RecordFilter;
pub use process::{CommandRunner, ConverterProcess, ConverterRequest, SheetArg};
pub use types::WorksheetDescriptor;
