//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use std::path::PathBuf;
use thiserror::Error;

/// xlsxrecordsクレート全体で使用するエラー型
///
/// ワークシートの列挙、外部コンバーターの呼び出し、CSVの読み込みと解析、
/// 検索パターンの構築の各段階で発生するエラーを統一的に扱います。
/// どの段階でもリトライは行わず、最初のエラーがそのまま呼び出し元に返されます。
///
/// # エラーの種類
///
/// - `InvalidArguments`: 解析オプションが不正
/// - `FileNotFound`: 入力ファイルが存在しない
/// - `Process`: コンバーターの異常終了、または標準エラー出力への書き込み
/// - `MalformedOutput`: ワークシート一覧がJSONとして解析できない
/// - `NoWorksheetsFound`: ワークシート一覧が空
/// - `CsvRead`: 一時CSVファイルが読み込めない
/// - `Io`: 一時ディレクトリの作成などその他のI/Oエラー
/// - `Config`: ビルダー設定の検証に失敗
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxrecords::{ExcelParseError, ExcelParserBuilder, ParseOptions};
///
/// # fn main() -> Result<(), ExcelParseError> {
/// let parser = ExcelParserBuilder::new().build()?;
/// match parser.parse(&ParseOptions::new("missing.xlsx")) {
///     Err(ExcelParseError::FileNotFound(path)) => {
///         println!("ファイルがありません: {}", path.display());
///     }
///     other => println!("{:?}", other),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum ExcelParseError {
    /// 解析オプションが不正
    ///
    /// 入力パスが空、ワークシートIDが0、ワークシート名が空白のみ、
    /// 検索語が1つも指定されていない場合などに発生します。
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// 入力ファイルが存在しない
    ///
    /// コンバーターを起動する前に検査されます。
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// コンバープロセスの失敗
    ///
    /// 起動失敗、非ゼロ終了、または終了コードに関わらず標準エラー出力に
    /// 何かが書き込まれた場合に発生します。
    #[error("Converter process failed: {0}")]
    Process(String),

    /// ワークシート一覧のJSONが不正
    ///
    /// `#[from]`属性により、`serde_json::Error`から自動的に変換されます。
    #[error("Malformed worksheet listing: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    /// ワークシート一覧が空、または出力がなかった
    #[error("No worksheets found in the given spreadsheet")]
    NoWorksheetsFound,

    /// 一時CSVファイルの読み込みに失敗
    ///
    /// コンバーターがファイルを書き出さなかった場合や、サイズ上限を超えた場合にも
    /// 発生します。
    #[error("Failed to read converted CSV: {0}")]
    CsvRead(#[source] std::io::Error),

    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 設定の検証に失敗したエラー
    ///
    /// `ExcelParserBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),
}
