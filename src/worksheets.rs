//! Worksheet Enumeration Module
//!
//! コンバーターにワークシート一覧を問い合わせ、記述子の列に変換するモジュール。

use crate::error::ExcelParseError;
use crate::process::{CommandRunner, ConverterRequest};
use crate::types::WorksheetDescriptor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 入力ファイルを検証し、コンバーターに渡す絶対パスに解決する
///
/// # 戻り値
///
/// * `Ok(PathBuf)` - 正規化された入力パス
/// * `Err(ExcelParseError::InvalidArguments)` - パスが空の場合
/// * `Err(ExcelParseError::FileNotFound)` - ファイルが存在しない場合
pub(crate) fn resolve_input(in_file: &Path) -> Result<PathBuf, ExcelParseError> {
    if in_file.as_os_str().is_empty() {
        return Err(ExcelParseError::InvalidArguments(
            "File is missing in arguments".to_string(),
        ));
    }

    if !in_file.exists() {
        return Err(ExcelParseError::FileNotFound(in_file.to_path_buf()));
    }

    std::fs::canonicalize(in_file).map_err(|_| ExcelParseError::FileNotFound(in_file.to_path_buf()))
}

/// ワークシート一覧を取得する
///
/// 入力ファイルの存在を確認してからコンバーターを起動します。
/// 結果はキャッシュせず、呼び出しのたびに問い合わせます。
pub(crate) fn list_worksheets(
    runner: &dyn CommandRunner,
    in_file: &Path,
) -> Result<Vec<WorksheetDescriptor>, ExcelParseError> {
    let input = resolve_input(in_file)?;
    enumerate(runner, &input)
}

/// 解決済みの入力パスについてワークシート一覧を取得する
pub(crate) fn enumerate(
    runner: &dyn CommandRunner,
    input: &Path,
) -> Result<Vec<WorksheetDescriptor>, ExcelParseError> {
    let request = ConverterRequest::ListWorksheets {
        input: input.to_path_buf(),
    };
    let stdout = runner.run(&request.to_args())?;
    let worksheets = parse_listing(&stdout)?;

    info!(
        "WorksheetEnumerator: found {} worksheets in {}",
        worksheets.len(),
        input.display()
    );
    Ok(worksheets)
}

/// コンバーターの一覧出力を解析する
///
/// 空行を取り除いた残りをJSON配列として解析し、ID昇順に並べ替えます。
fn parse_listing(stdout: &str) -> Result<Vec<WorksheetDescriptor>, ExcelParseError> {
    let body = stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if body.is_empty() {
        debug!("WorksheetEnumerator: converter produced no listing");
        return Err(ExcelParseError::NoWorksheetsFound);
    }

    let mut worksheets: Vec<WorksheetDescriptor> =
        serde_json::from_str::<Option<Vec<WorksheetDescriptor>>>(&body)?.unwrap_or_default();

    if worksheets.is_empty() {
        return Err(ExcelParseError::NoWorksheetsFound);
    }

    worksheets.sort_by_key(WorksheetDescriptor::id);
    Ok(worksheets)
}
