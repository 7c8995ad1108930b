//! 棋谱 JSON
//!
//! 导出格式：`{ "metadata": {...}, "moves": [HistoryEntry...] }`，字段名为 camelCase。
//! 导入时先做结构校验，校验通过后才改动对局状态。

use crate::error::NotationError;
use crate::fen::parse_fen;
use crate::flip::FlipMode;
use crate::history::HistoryEntry;
use serde::{Deserialize, Serialize};

/// 棋谱元信息
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_fen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flip_mode: Option<FlipMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_fen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_comment: Option<String>,
}

/// 棋谱
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameNotation {
    pub metadata: NotationMetadata,
    pub moves: Vec<HistoryEntry>,
}

impl GameNotation {
    /// 解析 JSON；缺少 `metadata` 或 `moves` 时报错
    pub fn from_json(json: &str) -> Result<GameNotation, NotationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, NotationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 导入前的校验：所有 FEN 都能解析，走法条目不为空
    pub fn validate(&self) -> Result<(), NotationError> {
        for fen in [&self.metadata.initial_fen, &self.metadata.current_fen]
            .into_iter()
            .flatten()
        {
            parse_fen(fen)?;
        }

        for (index, entry) in self.moves.iter().enumerate() {
            if entry.data.trim().is_empty() {
                return Err(NotationError::BadMove {
                    index,
                    mv: entry.data.clone(),
                });
            }
            parse_fen(&entry.fen)?;
        }
        Ok(())
    }
}
