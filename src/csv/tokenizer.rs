//! CsvTokenizer Module
//!
//! コンバーターが出力したCSVテキストを行とフィールドに分解する有限状態スキャナー。

use crate::api::Record;

use super::state::{Delimiter, ScanState};

/// CSVテキストをレコード列に分解する
///
/// 先頭から順に「区切り記号（`,`、改行、入力の先頭）＋フィールド」を読み取ります。
/// フィールドは引用符付き（`""`は1つの`"`）か、`,`・`"`・改行を含まない文字の並びです。
///
/// # 行の区切り
///
/// - 改行（または入力の先頭）を読んだ時点で、構築中の行に1つ以上フィールドがあれば新しい行を開始
/// - 構築中の行が空のままの改行は行を増やさない
/// - 最終行のフィールドが1つだけの場合は末尾改行の名残として削除
///
/// # 戻り値
///
/// 空文字列は空のレコード列になります（空の行1つではありません）。
///
/// # 使用例
///
/// ```rust
/// use xlsxrecords::tokenize;
///
/// let records = tokenize("Name,Note\r\nBaker,\"a,b\"\"c\"\r\n");
/// assert_eq!(records, vec![
///     vec!["Name".to_string(), "Note".to_string()],
///     vec!["Baker".to_string(), "a,b\"c".to_string()],
/// ]);
/// ```
pub fn tokenize(raw_csv: &str) -> Vec<Record> {
    if raw_csv.is_empty() {
        return Vec::new();
    }
    Scanner::new(raw_csv).run()
}

/// スキャナー本体
///
/// 位置はバイト単位で管理します。区切り記号と引用符はすべてASCIIなので、
/// スライス位置は常に文字境界に一致します。
struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    state: ScanState,
    rows: Vec<Record>,

    /// 引用符なしフィールドの開始位置
    field_start: usize,

    /// 引用符付きフィールドの開き引用符の位置
    quote_open: usize,

    /// 引用符付きフィールドのうち、まだ`quoted`に移していない部分の開始位置
    segment_start: usize,

    /// 引用符付きフィールドの内容（エスケープ解除済み）
    quoted: String,

    /// 閉じ引用符になり得る最後の`"`の位置と、その時点の`quoted`の長さ
    ///
    /// 閉じ引用符が見つからないまま入力が終わった場合、ここまで巻き戻します。
    close_candidate: Option<(usize, usize)>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            state: ScanState::RowStart,
            rows: vec![Vec::new()],
            field_start: 0,
            quote_open: 0,
            segment_start: 0,
            quoted: String::new(),
            close_candidate: None,
        }
    }

    fn run(mut self) -> Vec<Record> {
        loop {
            if self.pos >= self.bytes.len() {
                if self.finish_state() {
                    continue;
                }
                break;
            }
            self.step();
        }

        if self.rows.last().is_some_and(|row| row.len() == 1) {
            self.rows.pop();
        }
        self.rows
    }

    /// 1文字分（または1区切り記号分）状態を進める
    fn step(&mut self) {
        let byte = self.bytes[self.pos];

        match self.state {
            ScanState::RowStart => {
                // 先頭が区切り記号ならそれを読み、そうでなければ暗黙の区切り記号として扱う
                if let Some((delimiter, len)) = Delimiter::at(self.bytes, self.pos) {
                    self.consume_delimiter(delimiter, len);
                } else {
                    self.state = ScanState::FieldStart;
                }
            }
            ScanState::FieldStart => {
                if byte == b'"' {
                    self.quote_open = self.pos;
                    self.pos += 1;
                    self.segment_start = self.pos;
                    self.quoted.clear();
                    self.close_candidate = None;
                    self.state = ScanState::InQuotedField;
                } else {
                    self.field_start = self.pos;
                    self.state = ScanState::InUnquotedField;
                }
            }
            ScanState::InUnquotedField => {
                if matches!(byte, b',' | b'\r' | b'\n' | b'"') {
                    let field = self.input[self.field_start..self.pos].to_string();
                    self.push_field(field);
                    self.state = ScanState::Discarding;
                } else {
                    self.pos += 1;
                }
            }
            ScanState::InQuotedField => {
                if byte == b'"' {
                    self.quoted
                        .push_str(&self.input[self.segment_start..self.pos]);
                    self.close_candidate = Some((self.pos, self.quoted.len()));
                    self.pos += 1;
                    self.state = ScanState::AfterQuote;
                } else {
                    self.pos += 1;
                }
            }
            ScanState::AfterQuote => {
                if byte == b'"' {
                    self.quoted.push('"');
                    self.pos += 1;
                    self.segment_start = self.pos;
                    self.state = ScanState::InQuotedField;
                } else {
                    self.close_quoted_field();
                }
            }
            ScanState::Discarding => {
                if let Some((delimiter, len)) = Delimiter::at(self.bytes, self.pos) {
                    self.consume_delimiter(delimiter, len);
                } else {
                    self.pos += 1;
                }
            }
        }
    }

    /// 入力終端での状態ごとの後処理
    ///
    /// 巻き戻しによって走査を再開する場合は`true`を返します。
    fn finish_state(&mut self) -> bool {
        match self.state {
            ScanState::RowStart | ScanState::Discarding => false,
            // 区切り記号の直後で終わった場合は空フィールドが1つある
            ScanState::FieldStart => {
                self.push_field(String::new());
                self.state = ScanState::Discarding;
                false
            }
            ScanState::InUnquotedField => {
                let field = self.input[self.field_start..].to_string();
                self.push_field(field);
                self.state = ScanState::Discarding;
                false
            }
            ScanState::AfterQuote => {
                self.close_quoted_field();
                false
            }
            ScanState::InQuotedField => {
                self.recover_unterminated_quote();
                true
            }
        }
    }

    /// 閉じ引用符のないまま終端に達した引用符付きフィールドを処理する
    ///
    /// 閉じ引用符になり得た最後の`"`があればそこでフィールドを閉じ、
    /// なければ開き引用符の位置に長さ0のフィールドがあったものとして扱います。
    /// いずれの場合もその直後から区切り記号を探して走査を続けます。
    fn recover_unterminated_quote(&mut self) {
        match self.close_candidate.take() {
            Some((quote_pos, content_len)) => {
                self.quoted.truncate(content_len);
                let field = std::mem::take(&mut self.quoted);
                self.push_field(field);
                self.pos = quote_pos + 1;
            }
            None => {
                self.quoted.clear();
                self.push_field(String::new());
                self.pos = self.quote_open + 1;
            }
        }
        self.state = ScanState::Discarding;
    }

    fn close_quoted_field(&mut self) {
        let field = std::mem::take(&mut self.quoted);
        self.push_field(field);
        self.close_candidate = None;
        self.state = ScanState::Discarding;
    }

    fn consume_delimiter(&mut self, delimiter: Delimiter, len: usize) {
        if delimiter.starts_row() && self.current_row_has_fields() {
            self.rows.push(Vec::new());
        }
        self.pos += len;
        self.state = ScanState::FieldStart;
    }

    fn current_row_has_fields(&self) -> bool {
        self.rows.last().is_some_and(|row| !row.is_empty())
    }

    fn push_field(&mut self, field: String) {
        if let Some(row) = self.rows.last_mut() {
            row.push(field);
        }
    }
}
