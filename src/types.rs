//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// ワークシート記述子
///
/// コンバーターがシート順に付与した1始まりのIDと表示名の組です。
/// ワークシート列挙からのみ生成され、生成後は変更されません。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct WorksheetDescriptor {
    id: u32,
    name: String,
}

impl WorksheetDescriptor {
    #[cfg(test)]
    pub(crate) fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// 1始まりのワークシートID
    pub fn id(&self) -> u32 {
        self.id
    }

    /// ワークシートの表示名
    pub fn name(&self) -> &str {
        &self.name
    }
}
