//! Process Module
//!
//! 外部コンバーターの呼び出しを抽象化するモジュール。
//! シェルを介さず、型付きの引数リストで子プロセスを起動します。

use crate::error::ExcelParseError;
use std::ffi::OsString;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// コンバーター呼び出しの抽象
///
/// 引数リストを受け取ってコンバーターを1回実行し、標準出力を返します。
/// テストではスクリプト化した実装に差し替えられます。
pub trait CommandRunner: Debug + Send + Sync {
    /// コンバーターを実行する
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - 正常終了し、標準エラー出力が空だった場合の標準出力
    /// * `Err(ExcelParseError::Process)` - 起動失敗、異常終了、標準エラー出力あり
    fn run(&self, args: &[OsString]) -> Result<String, ExcelParseError>;
}

/// コンバーターに渡すシート指定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetArg {
    /// `-n <id>`
    Id(u32),

    /// `-w <name>`
    Name(String),
}

/// コンバーターへの1回分の要求
///
/// 引数の組み立てを型で表現し、文字列連結によるクォート漏れを防ぎます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverterRequest {
    /// `-x <input> -W`: ワークシート一覧を標準出力にJSONで出力
    ListWorksheets { input: PathBuf },

    /// `-x <input> (-n <id> | -w <name>) -c <csv>`: 指定シートをCSVファイルに出力
    Extract {
        input: PathBuf,
        sheet: SheetArg,
        csv_path: PathBuf,
    },
}

impl ConverterRequest {
    /// コマンドライン引数に変換する
    pub fn to_args(&self) -> Vec<OsString> {
        match self {
            ConverterRequest::ListWorksheets { input } => {
                vec!["-x".into(), input.into(), "-W".into()]
            }
            ConverterRequest::Extract {
                input,
                sheet,
                csv_path,
            } => {
                let mut args: Vec<OsString> = vec!["-x".into(), input.into()];
                match sheet {
                    SheetArg::Id(id) => {
                        args.push("-n".into());
                        args.push(id.to_string().into());
                    }
                    SheetArg::Name(name) => {
                        args.push("-w".into());
                        args.push(name.into());
                    }
                }
                args.push("-c".into());
                args.push(csv_path.into());
                args
            }
        }
    }
}

/// 子プロセスとしてコンバーターを起動する標準実装
///
/// `program`と`leading_args`（例: `python convert.py`）が固定の呼び出し接頭辞になります。
#[derive(Debug, Clone)]
pub struct ConverterProcess {
    program: OsString,
    leading_args: Vec<OsString>,
    working_dir: Option<PathBuf>,
}

impl ConverterProcess {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}

impl CommandRunner for ConverterProcess {
    fn run(&self, args: &[OsString]) -> Result<String, ExcelParseError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!(
            "ConverterProcess: spawning program={:?} args={:?}",
            self.program, args
        );

        let output = command.output().map_err(|e| {
            ExcelParseError::Process(format!(
                "failed to start {}: {}",
                self.program.to_string_lossy(),
                e
            ))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            warn!(
                "ConverterProcess: exited abnormally status={} stderr='{}'",
                output.status,
                stderr.trim()
            );
            // コンバーターは例外を標準出力に書くことがある
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(ExcelParseError::Process(format!(
                "{}: {}",
                output.status, detail
            )));
        }

        if !stderr.is_empty() {
            warn!(
                "ConverterProcess: wrote to stderr despite success stderr='{}'",
                stderr.trim()
            );
            return Err(ExcelParseError::Process(stderr.trim().to_string()));
        }

        Ok(stdout)
    }
}
