//! Integration Tests for xlsxrecords
//!
//! Drives the public pipeline with a scripted converter that serves a fixed
//! workbook: worksheet listing, CSV output per worksheet, and failures.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use xlsxrecords::{
    CommandRunner, ExcelParseError, ExcelParser, ExcelParserBuilder, ParseOptions, ParsedRecords,
    SearchSpec, WorksheetDescriptor,
};

// Helper module for the scripted converter
mod fixtures {
    use super::*;

    pub const MASTER_SHEET: &str = "Name,Description,Price\r\n\
        Denim,\"Heavy, blue \"\"raw\"\" denim\",10\r\n\
        Baker,,20\r\n\
        Denims,jacket/coat,30\r\n\
        denim,,\r\n\
        BAKERY,fresh/bread,5\r\n";

    pub const REGION_SHEET: &str = "Region,Total\r\nNorth,100\r\nSouth,\r\n";

    /// A workbook served by a scripted converter
    #[derive(Debug, Clone, Default)]
    pub struct Workbook {
        sheets: BTreeMap<u32, (String, Result<String, String>)>,
        pub calls: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl Workbook {
        pub fn master() -> Self {
            Self::default()
                .with_sheet(1, "Sheet1", MASTER_SHEET)
                .with_sheet(2, "Empty", "")
                .with_sheet(3, "Regions", REGION_SHEET)
        }

        pub fn with_sheet(mut self, id: u32, name: &str, csv: &str) -> Self {
            self.sheets
                .insert(id, (name.to_string(), Ok(csv.to_string())));
            self
        }

        pub fn with_broken_sheet(mut self, id: u32, name: &str, stderr: &str) -> Self {
            self.sheets
                .insert(id, (name.to_string(), Err(stderr.to_string())));
            self
        }

        pub fn extract_calls(&self) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|args| args.iter().any(|arg| arg == "-c"))
                .count()
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a String> {
        args.windows(2)
            .find(|pair| pair[0] == flag)
            .map(|pair| &pair[1])
    }

    impl CommandRunner for Workbook {
        fn run(&self, args: &[OsString]) -> Result<String, ExcelParseError> {
            let args: Vec<String> = args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect();
            self.calls.lock().unwrap().push(args.clone());

            if args.iter().any(|arg| arg == "-W") {
                let listing: Vec<String> = self
                    .sheets
                    .iter()
                    .map(|(id, (name, _))| format!(r#"{{"id": {}, "name": "{}"}}"#, id, name))
                    .collect();
                return Ok(format!("\n[{}]\n\n", listing.join(", ")));
            }

            let entry = match (value_after(&args, "-n"), value_after(&args, "-w")) {
                (Some(id), _) => id
                    .parse::<u32>()
                    .ok()
                    .and_then(|id| self.sheets.get(&id)),
                (None, Some(name)) => self.sheets.values().find(|(n, _)| n == name),
                _ => None,
            };
            let csv_path = PathBuf::from(value_after(&args, "-c").unwrap());

            match entry {
                Some((_, Ok(csv))) => {
                    std::fs::write(csv_path, csv).unwrap();
                    Ok(String::new())
                }
                Some((_, Err(stderr))) => Err(ExcelParseError::Process(stderr.clone())),
                None => Err(ExcelParseError::Process("exit status: 1".to_string())),
            }
        }
    }

    /// An existing input file for the existence check
    pub fn input_file() -> tempfile::NamedTempFile {
        tempfile::Builder::new()
            .prefix("master")
            .suffix(".xlsx")
            .tempfile()
            .unwrap()
    }

    /// Install a test subscriber driven by `RUST_LOG`
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    pub fn parser(workbook: &Workbook) -> ExcelParser {
        init_tracing();
        ExcelParserBuilder::new()
            .with_runner(workbook.clone())
            .build()
            .unwrap()
    }
}

use fixtures::*;

fn single(result: ParsedRecords) -> Vec<Vec<String>> {
    result.into_single().expect("expected a single worksheet result")
}

#[test]
fn test_list_worksheets_in_sheet_order() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let worksheets = parser.list_worksheets(file.path()).unwrap();
    let ids: Vec<u32> = worksheets.iter().map(WorksheetDescriptor::id).collect();

    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(worksheets[0].name(), "Sheet1");
    assert_eq!(worksheets[1].id(), 2);
}

#[test]
fn test_list_worksheets_missing_file() {
    let workbook = Workbook::master();
    let parser = parser(&workbook);

    let result = parser.list_worksheets("tests/no_such_master.xls");
    assert!(matches!(result, Err(ExcelParseError::FileNotFound(_))));
    assert!(workbook.calls.lock().unwrap().is_empty());
}

#[test]
fn test_parse_first_worksheet() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let records = single(
        parser
            .parse(&ParseOptions::new(file.path()).with_worksheet_id(1))
            .unwrap(),
    );

    assert_eq!(records.len(), 6);
    assert_eq!(records[0][0], "Name");
    assert_eq!(records[1][1], "Heavy, blue \"raw\" denim");
    assert_eq!(records[2], vec!["Baker", "", "20"]);
    assert_eq!(records[5][0], "BAKERY");
}

#[test]
fn test_parse_worksheet_by_name() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let by_name = parser
        .parse(&ParseOptions::new(file.path()).with_worksheet_name("Regions"))
        .unwrap();
    let by_id = parser
        .parse(&ParseOptions::new(file.path()).with_worksheet_id(3))
        .unwrap();

    assert_eq!(by_name, by_id);
    assert_eq!(single(by_name)[2], vec!["South", ""]);
}

#[test]
fn test_parse_empty_worksheet() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let records = single(
        parser
            .parse(&ParseOptions::new(file.path()).with_worksheet_id(2))
            .unwrap(),
    );
    assert_eq!(records.len(), 0);
}

#[test]
fn test_parse_unknown_worksheet_is_process_error() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let result = parser.parse(&ParseOptions::new(file.path()).with_worksheet_id(9));
    assert!(matches!(result, Err(ExcelParseError::Process(_))));
}

#[test]
fn test_search_loose() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let options = ParseOptions::new(file.path())
        .with_worksheet_id(1)
        .with_search(SearchSpec::loose(["baker"]));
    let records = single(parser.parse(&options).unwrap());

    assert_eq!(records.len(), 2);
    assert_eq!(records[0][0], "Baker");
    assert_eq!(records[1][0], "BAKERY");
}

#[test]
fn test_search_strict() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let options = ParseOptions::new(file.path())
        .with_worksheet_id(1)
        .with_search(SearchSpec::strict(["Denim"]));
    let records = single(parser.parse(&options).unwrap());

    // "Denims" と小文字の "denim" は一致しない
    assert_eq!(records.len(), 1);
    assert_eq!(records[0][0], "Denim");
}

#[test]
fn test_search_loose_matches_every_case_variant() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let options = ParseOptions::new(file.path())
        .with_worksheet_id(1)
        .with_search(SearchSpec::loose(["DENIM"]));
    let records = single(parser.parse(&options).unwrap());

    let first: Vec<&str> = records.iter().map(|row| row[0].as_str()).collect();
    assert_eq!(first, vec!["Denim", "Denims", "denim"]);
}

#[test]
fn test_search_ignores_slashes() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let options = ParseOptions::new(file.path())
        .with_worksheet_id(1)
        .with_search(SearchSpec::strict(["jacketcoat"]));
    let records = single(parser.parse(&options).unwrap());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0][2], "30");
}

#[test]
fn test_skip_empty_keeps_row_count() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let plain = single(
        parser
            .parse(&ParseOptions::new(file.path()).with_worksheet_id(1))
            .unwrap(),
    );
    let compacted = single(
        parser
            .parse(
                &ParseOptions::new(file.path())
                    .with_worksheet_id(1)
                    .skip_empty(true),
            )
            .unwrap(),
    );

    assert_eq!(plain.len(), compacted.len());
    assert_eq!(compacted[2], vec!["Baker", "20"]);
    assert_eq!(compacted[4], vec!["denim"]);
}

#[test]
fn test_skip_empty_then_search() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    // 空フィールドを除去してから連結するので "Baker 20" になる
    let options = ParseOptions::new(file.path())
        .with_worksheet_id(1)
        .skip_empty(true)
        .with_search(SearchSpec::strict(["Baker 20"]));
    let records = single(parser.parse(&options).unwrap());
    assert_eq!(records, vec![vec!["Baker", "20"]]);

    let options = ParseOptions::new(file.path())
        .with_worksheet_id(1)
        .with_search(SearchSpec::strict(["Baker 20"]));
    assert!(single(parser.parse(&options).unwrap()).is_empty());
}

#[test]
fn test_parse_all_worksheets_matches_single_parses() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let sheets = match parser.parse(&ParseOptions::new(file.path())).unwrap() {
        ParsedRecords::Multi(sheets) => sheets,
        other => panic!("Expected Multi, got {:?}", other),
    };
    assert_eq!(sheets.len(), 3);

    for (index, sheet) in sheets.iter().enumerate() {
        let expected = single(
            parser
                .parse(&ParseOptions::new(file.path()).with_worksheet_id(index as u32 + 1))
                .unwrap(),
        );
        assert_eq!(sheet, &expected);
    }
}

#[test]
fn test_parse_all_worksheets_applies_filters_per_sheet() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let options = ParseOptions::new(file.path()).with_search(SearchSpec::loose(["north", "baker"]));
    let sheets = parser.parse(&options).unwrap().into_sheets();

    assert_eq!(sheets.len(), 3);
    assert_eq!(sheets[0].len(), 2);
    assert!(sheets[1].is_empty());
    assert_eq!(sheets[2], vec![vec!["North", "100"]]);
}

#[test]
fn test_parse_all_worksheets_fails_fast() {
    let file = input_file();
    let workbook = Workbook::default()
        .with_sheet(1, "First", "a,b\n")
        .with_broken_sheet(2, "Second", "Traceback: corrupt sheet")
        .with_sheet(3, "Third", "c,d\n");
    let parser = parser(&workbook);

    match parser.parse(&ParseOptions::new(file.path())) {
        Err(ExcelParseError::Process(msg)) => assert!(msg.contains("corrupt sheet")),
        other => panic!("Expected Process error, got {:?}", other),
    }
    // シート3の抽出は行われない
    assert_eq!(workbook.extract_calls(), 2);
}

#[test]
fn test_parse_without_worksheets() {
    let file = input_file();
    let parser = parser(&Workbook::default());

    let result = parser.parse(&ParseOptions::new(file.path()));
    assert!(matches!(result, Err(ExcelParseError::NoWorksheetsFound)));
}

#[test]
fn test_parse_from_json_options() {
    let file = input_file();
    let parser = parser(&Workbook::master());

    let json = serde_json::json!({
        "inFile": file.path(),
        "worksheet": 1,
        "searchFor": { "term": ["Denim"], "type": "strict" },
        "skipEmpty": true
    });
    let options = ParseOptions::from_json(&json.to_string()).unwrap();
    let records = single(parser.parse(&options).unwrap());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].len(), 3);
}

#[test]
fn test_result_serializes_like_nested_arrays() {
    let file = input_file();
    let parser = parser(&Workbook::default().with_sheet(1, "Only", "x,y\n"));

    let result = parser.parse(&ParseOptions::new(file.path())).unwrap();
    assert_eq!(serde_json::to_string(&result).unwrap(), r#"[[["x","y"]]]"#);
}

#[test]
fn test_parser_is_shareable_across_threads() {
    let file = input_file();
    let parser = Arc::new(parser(&Workbook::master()));
    let path = file.path().to_path_buf();

    let handles: Vec<_> = (1..=3)
        .map(|id| {
            let parser = Arc::clone(&parser);
            let path = path.clone();
            std::thread::spawn(move || {
                parser
                    .parse(&ParseOptions::new(path).with_worksheet_id(id))
                    .map(|records| records.len())
            })
        })
        .collect();

    let lengths: Vec<usize> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();
    assert_eq!(lengths, vec![6, 0, 3]);
}
