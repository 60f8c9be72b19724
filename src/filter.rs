//! Record Filter Module
//!
//! 字句解析後のレコード列に対する空フィールド除去と検索を提供するモジュール。
//! 2つの段階は常に「空フィールド除去 → 検索」の順で適用されます。

use crate::api::{ParseOptions, Record, SearchMode, SearchSpec};
use crate::error::ExcelParseError;
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// レコードフィルター
///
/// 検索パターンは生成時に一度だけコンパイルされ、複数シートの処理で再利用されます。
///
/// # 使用例
///
/// ```rust
/// use xlsxrecords::{RecordFilter, SearchSpec};
///
/// # fn main() -> Result<(), xlsxrecords::ExcelParseError> {
/// let filter = RecordFilter::new(true, Some(&SearchSpec::strict(["Denim"])))?;
/// let records = vec![
///     vec!["Denim".to_string(), "".to_string(), "jacket".to_string()],
///     vec!["Denims".to_string(), "jacket".to_string()],
/// ];
/// assert_eq!(filter.apply(records), vec![vec!["Denim".to_string(), "jacket".to_string()]]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RecordFilter {
    skip_empty: bool,
    search: Option<Regex>,
}

impl RecordFilter {
    /// フィルターを生成する
    ///
    /// # 引数
    ///
    /// * `skip_empty` - 各行から空のフィールドを取り除くか
    /// * `search` - 検索条件（`None`の場合はすべての行を残す）
    ///
    /// # 戻り値
    ///
    /// * `Ok(RecordFilter)` - 生成に成功した場合
    /// * `Err(ExcelParseError::InvalidArguments)` - 検索パターンをコンパイルできない場合
    pub fn new(skip_empty: bool, search: Option<&SearchSpec>) -> Result<Self, ExcelParseError> {
        let search = search.map(compile_search).transpose()?;
        Ok(Self { skip_empty, search })
    }

    /// 解析オプションからフィルターを生成する
    pub fn from_options(options: &ParseOptions) -> Result<Self, ExcelParseError> {
        Self::new(options.skips_empty(), options.search())
    }

    /// レコード列にフィルターを適用する
    ///
    /// 空フィールド除去は行数を変えません。検索に一致しなかった行だけが
    /// 元の順序を保ったまま取り除かれます。
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        let total = records.len();

        let records = if self.skip_empty {
            records.into_iter().map(compact).collect()
        } else {
            records
        };

        let Some(pattern) = &self.search else {
            return records;
        };

        let matched: Vec<Record> = records
            .into_iter()
            .filter(|record| pattern.is_match(&project(record)))
            .collect();

        debug!(
            "RecordFilter: search kept {} of {} rows pattern='{}'",
            matched.len(),
            total,
            pattern.as_str()
        );
        matched
    }
}

/// 行から空のフィールドを取り除く
fn compact(record: Record) -> Record {
    record.into_iter().filter(|field| !field.is_empty()).collect()
}

/// 検索対象の文字列に射影する
///
/// フィールドを半角スペース1つで連結し、`/`を取り除きます。
fn project(record: &Record) -> String {
    record.join(" ").replace('/', "")
}

/// 検索条件から正規表現をコンパイルする
///
/// 検索語は`/`を取り除いた上でリテラルとして扱います。
/// 検索語が1つもない場合と、looseで空の検索語を含む場合はすべての行に一致します。
/// strictの空の検索語は単語境界を1つでも含む行に一致します。
fn compile_search(spec: &SearchSpec) -> Result<Regex, ExcelParseError> {
    let terms: Vec<String> = spec
        .terms
        .iter()
        .map(|term| regex::escape(&term.replace('/', "")))
        .collect();

    let pattern = match spec.mode {
        SearchMode::Strict if !terms.is_empty() => format!(
            "({})",
            terms
                .iter()
                .map(|term| format!(r"\b{}\b", term))
                .collect::<Vec<_>>()
                .join("|")
        ),
        SearchMode::Loose if !terms.is_empty() && !terms.iter().any(String::is_empty) => {
            format!("({})", terms.join("|"))
        }
        // 空の選択肢は任意の位置に一致する
        _ => String::new(),
    };

    RegexBuilder::new(&pattern)
        .case_insensitive(spec.mode == SearchMode::Loose)
        .build()
        .map_err(|e| ExcelParseError::InvalidArguments(format!("Invalid search term: {}", e)))
}
