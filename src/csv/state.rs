//! ScanState Module
//!
//! CSVスキャナーの状態と区切り記号の定義を提供します。

/// スキャナーの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanState {
    /// 入力の先頭（暗黙の区切り記号の位置）
    RowStart,

    /// 区切り記号の直後、フィールドの開始位置
    FieldStart,

    /// 引用符で囲まれたフィールドの内部
    InQuotedField,

    /// 引用符なしフィールドの内部
    InUnquotedField,

    /// 引用符付きフィールド内で`"`を読んだ直後
    ///
    /// 次が`"`ならエスケープされた引用符、それ以外ならフィールドの終端です。
    AfterQuote,

    /// 区切り記号が現れるまで読み飛ばす
    ///
    /// フィールドの直後に区切り記号以外の文字が続いた場合に入ります。
    Discarding,
}

/// 区切り記号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delimiter {
    /// `,`
    Comma,

    /// `\r\n`、`\n`、`\r`のいずれか
    LineBreak,
}

impl Delimiter {
    /// `pos`から始まる区切り記号を判定し、その種類とバイト長を返す
    pub fn at(bytes: &[u8], pos: usize) -> Option<(Delimiter, usize)> {
        match bytes.get(pos)? {
            b',' => Some((Delimiter::Comma, 1)),
            b'\r' if bytes.get(pos + 1) == Some(&b'\n') => Some((Delimiter::LineBreak, 2)),
            b'\r' | b'\n' => Some((Delimiter::LineBreak, 1)),
            _ => None,
        }
    }

    /// 新しい行を開始し得る区切り記号かどうか
    pub fn starts_row(&self) -> bool {
        matches!(self, Delimiter::LineBreak)
    }
}
