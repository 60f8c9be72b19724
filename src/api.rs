//! Public API Types
//!
//! 公開APIで使用するオプション型と結果型を定義するモジュール。

use crate::error::ExcelParseError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 1行分のレコード（フィールド文字列の並び）
///
/// 行ごとにフィールド数が異なっていても構いません。
pub type Record = Vec<String>;

/// ワークシート選択方式
///
/// 読み込むワークシートをIDまたは名前のどちらか一方で指定します。
/// `ParseOptions`で指定しない場合はすべてのワークシートが対象になります。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WorksheetSelector {
    /// ID指定（1始まり、コンバーターが付与したシート順）
    ///
    /// 例: `WorksheetSelector::Id(1)` は最初のシートを選択
    Id(u32),

    /// シート名指定
    ///
    /// 前後の空白はコンバーターに渡す前に取り除かれます。
    Name(String),
}

/// 検索モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SearchMode {
    /// 大文字小文字を区別しない部分一致（デフォルト）
    #[default]
    Loose,

    /// 大文字小文字を区別する単語単位の一致
    ///
    /// `Denim`は`Denim jacket`に一致しますが、`Denims jacket`には一致しません。
    Strict,
}

impl SearchMode {
    /// 文字列から検索モードを解決する
    ///
    /// 完全に`"strict"`と一致する場合だけ`Strict`です。前後に空白がある値や
    /// 未知の値はすべて`Loose`として扱います。
    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "strict" => SearchMode::Strict,
            _ => SearchMode::Loose,
        }
    }
}

/// 検索条件
///
/// いずれかの検索語に一致した行だけが結果に残ります。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    /// 検索語のリスト
    pub terms: Vec<String>,

    /// 検索モード
    pub mode: SearchMode,
}

impl SearchSpec {
    /// 検索語とモードから検索条件を生成
    pub fn new<I, S>(terms: I, mode: SearchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    /// 部分一致検索の条件を生成
    pub fn loose<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(terms, SearchMode::Loose)
    }

    /// 単語単位検索の条件を生成
    pub fn strict<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(terms, SearchMode::Strict)
    }
}

/// 解析オプション
///
/// 呼び出し元が所有し、パイプラインからは読み取り専用で参照されます。
///
/// # 使用例
///
/// ```rust
/// use xlsxrecords::{ParseOptions, SearchSpec};
///
/// let options = ParseOptions::new("master.xlsx")
///     .with_worksheet_id(1)
///     .with_search(SearchSpec::strict(["Denim"]))
///     .skip_empty(true);
///
/// assert!(options.skips_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    in_file: PathBuf,
    worksheet: Option<WorksheetSelector>,
    search: Option<SearchSpec>,
    skip_empty: bool,
}

impl ParseOptions {
    /// 入力ファイルを指定してオプションを生成する
    ///
    /// ワークシート未指定（全シート）、検索なし、空フィールドを保持する設定になります。
    pub fn new(in_file: impl Into<PathBuf>) -> Self {
        Self {
            in_file: in_file.into(),
            worksheet: None,
            search: None,
            skip_empty: false,
        }
    }

    /// ワークシートをIDで選択する（1始まり）
    pub fn with_worksheet_id(mut self, id: u32) -> Self {
        self.worksheet = Some(WorksheetSelector::Id(id));
        self
    }

    /// ワークシートを名前で選択する
    pub fn with_worksheet_name(mut self, name: impl Into<String>) -> Self {
        self.worksheet = Some(WorksheetSelector::Name(name.into()));
        self
    }

    /// ワークシート選択を直接指定する（`None`ですべてのシート）
    pub fn with_worksheet(mut self, selector: Option<WorksheetSelector>) -> Self {
        self.worksheet = selector;
        self
    }

    /// 検索条件を指定する
    pub fn with_search(mut self, search: SearchSpec) -> Self {
        self.search = Some(search);
        self
    }

    /// 各行から空のフィールドを取り除くかを指定する
    ///
    /// 行そのものは削除されないため、行数は変わりません。
    pub fn skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }

    pub fn in_file(&self) -> &Path {
        &self.in_file
    }

    pub fn worksheet(&self) -> Option<&WorksheetSelector> {
        self.worksheet.as_ref()
    }

    pub fn search(&self) -> Option<&SearchSpec> {
        self.search.as_ref()
    }

    pub fn skips_empty(&self) -> bool {
        self.skip_empty
    }

    /// JSON形式のオプションオブジェクトから生成する
    ///
    /// `inFile`、`worksheet`（数値または文字列）、`searchFor { term, type }`、
    /// `skipEmpty`を受け付けます。`worksheet`が`0`または空文字列の場合は
    /// 全シート指定として扱い、`skipEmpty`が真偽値でない場合は無視します。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxrecords::{ParseOptions, SearchMode, WorksheetSelector};
    ///
    /// # fn main() -> Result<(), xlsxrecords::ExcelParseError> {
    /// let options = ParseOptions::from_json(
    ///     r#"{"inFile": "master.xls", "worksheet": 1, "searchFor": {"term": ["baker"], "type": "loose"}}"#,
    /// )?;
    /// assert_eq!(options.worksheet(), Some(&WorksheetSelector::Id(1)));
    /// assert_eq!(options.search().map(|s| s.mode), Some(SearchMode::Loose));
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ExcelParseError> {
        let raw: RawParseOptions = serde_json::from_str(json)
            .map_err(|e| ExcelParseError::InvalidArguments(format!("Invalid options: {}", e)))?;
        raw.try_into()
    }
}

/// JSONオプションの受け皿
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParseOptions {
    in_file: Option<PathBuf>,
    #[serde(default)]
    worksheet: Option<RawWorksheet>,
    #[serde(default)]
    search_for: Option<RawSearch>,
    #[serde(default)]
    skip_empty: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawWorksheet {
    Id(u32),
    Name(String),
}

#[derive(Debug, Deserialize)]
struct RawSearch {
    #[serde(default)]
    term: Option<Vec<String>>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl TryFrom<RawParseOptions> for ParseOptions {
    type Error = ExcelParseError;

    fn try_from(raw: RawParseOptions) -> Result<Self, Self::Error> {
        let in_file = match raw.in_file {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => {
                return Err(ExcelParseError::InvalidArguments(
                    "File is missing in arguments".to_string(),
                ))
            }
        };

        let worksheet = match raw.worksheet {
            Some(RawWorksheet::Id(0)) | None => None,
            Some(RawWorksheet::Id(id)) => Some(WorksheetSelector::Id(id)),
            Some(RawWorksheet::Name(name)) if name.is_empty() => None,
            Some(RawWorksheet::Name(name)) => Some(WorksheetSelector::Name(name)),
        };

        // termが無い検索指定は検索なしと同じ
        let search = raw.search_for.and_then(|search| {
            let mode = search
                .kind
                .as_deref()
                .map(SearchMode::from_str_lossy)
                .unwrap_or_default();
            search.term.map(|terms| SearchSpec { terms, mode })
        });

        let skip_empty = raw
            .skip_empty
            .and_then(|value| value.as_bool())
            .unwrap_or(false);

        Ok(Self {
            in_file,
            worksheet,
            search,
            skip_empty,
        })
    }
}

/// 解析結果
///
/// ワークシートを指定した場合は`Single`、指定しなかった場合はワークシートID順の
/// `Multi`になります。JSONへはそれぞれ配列、配列の配列としてシリアライズされます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParsedRecords {
    /// 単一ワークシートのレコード列
    Single(Vec<Record>),

    /// ワークシートごとのレコード列（ワークシートID昇順）
    Multi(Vec<Vec<Record>>),
}

impl ParsedRecords {
    /// 外側の要素数（`Single`は行数、`Multi`はワークシート数）
    pub fn len(&self) -> usize {
        match self {
            ParsedRecords::Single(records) => records.len(),
            ParsedRecords::Multi(sheets) => sheets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Single`の場合のみレコード列を取り出す
    pub fn into_single(self) -> Option<Vec<Record>> {
        match self {
            ParsedRecords::Single(records) => Some(records),
            ParsedRecords::Multi(_) => None,
        }
    }

    /// ワークシートごとのレコード列として取り出す
    ///
    /// `Single`は要素1つの列として返します。
    pub fn into_sheets(self) -> Vec<Vec<Record>> {
        match self {
            ParsedRecords::Single(records) => vec![records],
            ParsedRecords::Multi(sheets) => sheets,
        }
    }
}
