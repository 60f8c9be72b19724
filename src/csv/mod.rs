//! CSV Module
//!
//! コンバーターが一時ファイルに書き出したCSVテキストの字句解析を提供します。

mod state;
mod tokenizer;

pub use tokenizer::tokenize;
