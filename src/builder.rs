//! Builder Module
//!
//! Fluent Builder APIを提供し、`ExcelParser`インスタンスを段階的に構築する。
//! `ExcelParser`はワークシートの選択、コンバーターの呼び出し、CSVの字句解析、
//! フィルター適用を順に実行するパイプラインのファサードです。

use crate::api::{ParseOptions, ParsedRecords, Record, WorksheetSelector};
use crate::csv::tokenize;
use crate::error::ExcelParseError;
use crate::filter::RecordFilter;
use crate::process::{CommandRunner, ConverterProcess, ConverterRequest, SheetArg};
use crate::types::WorksheetDescriptor;
use crate::worksheets;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// コンバーターの実行ファイルを上書きする環境変数
pub const CONVERTER_ENV: &str = "XLSXRECORDS_CONVERTER";

/// 一時ディレクトリ内のCSVファイル名
const CSV_FILE_NAME: &str = "convert.csv";

/// パイプラインの設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ParserConfig {
    /// コンバーターの実行ファイル
    pub program: OsString,

    /// 実行ファイルの直後に渡す固定引数
    pub program_args: Vec<OsString>,

    /// コンバーターの作業ディレクトリ（Noneの場合は継承）
    pub working_dir: Option<PathBuf>,

    /// 一時ディレクトリ名の接頭辞
    pub temp_prefix: String,

    /// 読み戻す一時CSVファイルの最大サイズ（バイト）
    pub max_csv_size: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            program: OsString::from("python"),
            program_args: vec![OsString::from("convert.py")],
            working_dir: None,
            temp_prefix: "xlsxrecords".to_string(),
            max_csv_size: 536_870_912, // 512MB
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxrecords::ExcelParserBuilder;
///
/// # fn main() -> Result<(), xlsxrecords::ExcelParseError> {
/// let parser = ExcelParserBuilder::new()
///     .with_program("python3")
///     .with_program_args(["/opt/excel-parser/convert.py"])
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExcelParserBuilder {
    /// 内部設定（構築中）
    config: ParserConfig,

    /// 差し替え用のコマンド実行器
    runner: Option<Box<dyn CommandRunner>>,
}

impl Default for ExcelParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExcelParserBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - コンバーター: `python convert.py`
    /// - 作業ディレクトリ: 呼び出し元を継承
    /// - 一時ディレクトリ接頭辞: `xlsxrecords`
    /// - CSVサイズ上限: 512MB
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
            runner: None,
        }
    }

    /// 環境変数`XLSXRECORDS_CONVERTER`で実行ファイルを上書きしたビルダーを生成する
    pub fn from_env() -> Self {
        let builder = Self::new();
        match std::env::var_os(CONVERTER_ENV) {
            Some(program) if !program.is_empty() => builder.with_program(program),
            _ => builder,
        }
    }

    /// コンバーターの実行ファイルを指定する
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.config.program = program.into();
        self
    }

    /// 実行ファイルの直後に渡す固定引数を指定する
    ///
    /// スクリプト形式のコンバーターでは、スクリプトのパスをここに渡します。
    pub fn with_program_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.config.program_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// コンバーターの作業ディレクトリを指定する
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.working_dir = Some(dir.into());
        self
    }

    /// 一時ディレクトリ名の接頭辞を指定する
    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.temp_prefix = prefix.into();
        self
    }

    /// 読み戻す一時CSVファイルの最大サイズを指定する
    ///
    /// 上限を超えた場合、解析は`ExcelParseError::CsvRead`で失敗します。
    pub fn with_max_csv_size(mut self, bytes: u64) -> Self {
        self.config.max_csv_size = bytes;
        self
    }

    /// コマンド実行器を差し替える
    ///
    /// 指定した場合、実行ファイル・固定引数・作業ディレクトリの設定は使われません。
    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Some(Box::new(runner));
        self
    }

    /// 設定を検証し、`ExcelParser`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(ExcelParser)` - 設定が有効な場合
    /// * `Err(ExcelParseError::Config)` - 実行ファイルが空、接頭辞が空またはパス区切りを含む、
    ///   CSVサイズ上限が0の場合
    pub fn build(self) -> Result<ExcelParser, ExcelParseError> {
        // 1. コンバーターの検証
        if self.runner.is_none() && self.config.program.is_empty() {
            return Err(ExcelParseError::Config(
                "Converter program must not be empty".to_string(),
            ));
        }

        // 2. 一時ディレクトリ接頭辞の検証
        let prefix = &self.config.temp_prefix;
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(ExcelParseError::Config(format!(
                "Invalid temp prefix: '{}'",
                prefix
            )));
        }

        // 3. サイズ上限の検証
        if self.config.max_csv_size == 0 {
            return Err(ExcelParseError::Config(
                "max_csv_size must be greater than zero".to_string(),
            ));
        }

        let runner = match self.runner {
            Some(runner) => runner,
            None => Box::new(
                ConverterProcess::new(self.config.program.clone())
                    .with_leading_args(self.config.program_args.clone())
                    .with_working_dir(self.config.working_dir.clone()),
            ),
        };

        Ok(ExcelParser {
            config: self.config,
            runner,
        })
    }
}

/// 解析パイプラインのファサード
///
/// 保持するのは不変の設定だけなので、複数スレッドから同時に呼び出せます。
/// 呼び出しごとに一意の一時ディレクトリを作成し、呼び出しの終了時に削除します。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxrecords::{ExcelParserBuilder, ParseOptions, SearchSpec};
///
/// # fn main() -> Result<(), xlsxrecords::ExcelParseError> {
/// let parser = ExcelParserBuilder::new().build()?;
///
/// for sheet in parser.list_worksheets("master.xlsx")? {
///     println!("{}: {}", sheet.id(), sheet.name());
/// }
///
/// let options = ParseOptions::new("master.xlsx")
///     .with_worksheet_id(1)
///     .with_search(SearchSpec::loose(["baker"]));
/// let records = parser.parse(&options)?;
/// println!("found {} records", records.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExcelParser {
    /// パイプライン設定
    config: ParserConfig,

    /// コンバーターの実行器
    runner: Box<dyn CommandRunner>,
}

impl ExcelParser {
    /// ワークシート一覧を取得する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<WorksheetDescriptor>)` - ID昇順のワークシート記述子
    /// * `Err(ExcelParseError::FileNotFound)` - 入力ファイルが存在しない場合
    /// * `Err(ExcelParseError::MalformedOutput)` - 一覧がJSONとして不正な場合
    /// * `Err(ExcelParseError::NoWorksheetsFound)` - 一覧が空の場合
    pub fn list_worksheets(
        &self,
        in_file: impl AsRef<Path>,
    ) -> Result<Vec<WorksheetDescriptor>, ExcelParseError> {
        worksheets::list_worksheets(self.runner.as_ref(), in_file.as_ref())
    }

    /// スプレッドシートを解析してレコードを取り出す
    ///
    /// # 処理フロー
    ///
    /// 1. オプションの検証（検索パターンのコンパイルを含む）
    /// 2. 入力ファイルの存在確認
    /// 3. ワークシート指定あり: そのシートだけを処理して`Single`を返す
    /// 4. 指定なし: ワークシートを列挙し、ID昇順に1枚ずつ処理して`Multi`を返す
    ///
    /// いずれかのシートで失敗した場合、それまでの結果は破棄してそのエラーを返します。
    pub fn parse(&self, options: &ParseOptions) -> Result<ParsedRecords, ExcelParseError> {
        // 1. オプションの検証
        let filter = RecordFilter::from_options(options)?;
        let selected = options.worksheet().map(sheet_arg).transpose()?;

        // 2. 入力ファイルの解決
        let input = worksheets::resolve_input(options.in_file())?;

        // 3. 単一シート
        if let Some(sheet) = selected {
            let records = self.extract_sheet(&input, sheet, &filter)?;
            return Ok(ParsedRecords::Single(records));
        }

        // 4. 全シートを順番に処理
        let descriptors = worksheets::enumerate(self.runner.as_ref(), &input)?;
        let sheets = descriptors
            .iter()
            .map(|descriptor| {
                debug!(
                    "ExcelParser: extracting worksheet id={} name='{}'",
                    descriptor.id(),
                    descriptor.name()
                );
                self.extract_sheet(&input, SheetArg::Id(descriptor.id()), &filter)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ParsedRecords::Multi(sheets))
    }

    /// 1枚のワークシートについてコンバーター → 字句解析 → フィルターを実行する
    fn extract_sheet(
        &self,
        input: &Path,
        sheet: SheetArg,
        filter: &RecordFilter,
    ) -> Result<Vec<Record>, ExcelParseError> {
        let temp_dir = tempfile::Builder::new()
            .prefix(&self.config.temp_prefix)
            .tempdir()?;
        let csv_path = temp_dir.path().join(CSV_FILE_NAME);

        let request = ConverterRequest::Extract {
            input: input.to_path_buf(),
            sheet: sheet.clone(),
            csv_path: csv_path.clone(),
        };
        self.runner.run(&request.to_args())?;

        let raw_csv = self.read_csv(&csv_path)?;
        let records = tokenize(&raw_csv);
        drop(raw_csv);

        if let Err(e) = temp_dir.close() {
            warn!("ExcelParser: failed to remove temp dir: {}", e);
        }

        let records = filter.apply(records);
        info!(
            "ExcelParser: worksheet {:?} yielded {} records",
            sheet,
            records.len()
        );
        Ok(records)
    }

    /// 一時CSVファイルを読み込む
    ///
    /// UTF-8として不正なバイト列は置換文字に置き換えて読み込みます。
    fn read_csv(&self, path: &Path) -> Result<String, ExcelParseError> {
        let metadata = std::fs::metadata(path).map_err(ExcelParseError::CsvRead)?;
        if metadata.len() > self.config.max_csv_size {
            return Err(ExcelParseError::CsvRead(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "CSV size exceeds maximum: {} bytes (max: {} bytes)",
                    metadata.len(),
                    self.config.max_csv_size
                ),
            )));
        }
        let bytes = std::fs::read(path).map_err(ExcelParseError::CsvRead)?;
        match String::from_utf8(bytes) {
            Ok(raw_csv) => Ok(raw_csv),
            Err(e) => {
                warn!(
                    "ExcelParser: CSV is not valid UTF-8, decoding lossily: {}",
                    e.utf8_error()
                );
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }
}

/// ワークシート選択をコンバーター引数に変換する
fn sheet_arg(selector: &WorksheetSelector) -> Result<SheetArg, ExcelParseError> {
    match selector {
        WorksheetSelector::Id(0) => Err(ExcelParseError::InvalidArguments(
            "worksheet id is 1-based and must not be 0".to_string(),
        )),
        WorksheetSelector::Id(id) => Ok(SheetArg::Id(*id)),
        WorksheetSelector::Name(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(ExcelParseError::InvalidArguments(
                    "worksheet name must not be blank".to_string(),
                ));
            }
            Ok(SheetArg::Name(name.to_string()))
        }
    }
}

/// デフォルト設定（環境変数による上書きを含む）でワークシート一覧を取得する
pub fn list_worksheets(
    in_file: impl AsRef<Path>,
) -> Result<Vec<WorksheetDescriptor>, ExcelParseError> {
    ExcelParserBuilder::from_env().build()?.list_worksheets(in_file)
}

/// デフォルト設定（環境変数による上書きを含む）でスプレッドシートを解析する
pub fn parse(options: &ParseOptions) -> Result<ParsedRecords, ExcelParseError> {
    ExcelParserBuilder::from_env().build()?.parse(options)
}
