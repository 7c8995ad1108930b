//! 走子历史
//!
//! 记录走子与调整条目，游标指向当前显示的局面。
//! 在游标不在末尾时走子，会丢弃游标之后的全部条目（分支覆盖）。

use crate::error::HistoryError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 局面编辑条目的数据前缀
pub const POSITION_EDIT_PREFIX: &str = "position_edit:";

/// 条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Move,
    Adjust,
}

/// 着法评注
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Annotation {
    #[serde(rename = "!!")]
    Brilliant,
    #[serde(rename = "!")]
    Good,
    #[serde(rename = "!?")]
    Interesting,
    #[serde(rename = "?!")]
    Dubious,
    #[serde(rename = "?")]
    Mistake,
    #[serde(rename = "??")]
    Blunder,
}

impl Annotation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Annotation::Brilliant => "!!",
            Annotation::Good => "!",
            Annotation::Interesting => "!?",
            Annotation::Dubious => "?!",
            Annotation::Mistake => "?",
            Annotation::Blunder => "??",
        }
    }
}

impl FromStr for Annotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "!!" => Ok(Annotation::Brilliant),
            "!" => Ok(Annotation::Good),
            "!?" => Ok(Annotation::Interesting),
            "?!" => Ok(Annotation::Dubious),
            "?" => Ok(Annotation::Mistake),
            "??" => Ok(Annotation::Blunder),
            _ => Err(format!("Unknown annotation: {}", s)),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 历史条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// 走法编码或调整编码
    pub data: String,
    /// 该条目之后的局面
    pub fen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_score: Option<f64>,
    /// 毫秒
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_nodes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_requested_movetime: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl HistoryEntry {
    pub fn new(kind: EntryKind, data: impl Into<String>, fen: impl Into<String>) -> Self {
        HistoryEntry {
            kind,
            data: data.into(),
            fen: fen.into(),
            comment: None,
            annotation: None,
            engine_score: None,
            engine_time: None,
            engine_depth: None,
            engine_nodes: None,
            engine_requested_movetime: None,
            timestamp: None,
        }
    }

    /// 导出用副本：去掉时间戳、搜索深度、节点数和请求的思考时间
    pub fn sanitized(&self) -> HistoryEntry {
        HistoryEntry {
            engine_depth: None,
            engine_nodes: None,
            engine_requested_movetime: None,
            timestamp: None,
            ..self.clone()
        }
    }

    pub fn is_position_edit(&self) -> bool {
        self.kind == EntryKind::Adjust && self.data.starts_with(POSITION_EDIT_PREFIX)
    }
}

/// 记录条目时附带的外部信息（引擎分析、时间戳），对规则本身不透明
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordContext {
    pub engine_score: Option<f64>,
    pub engine_time: Option<u64>,
    pub engine_depth: Option<u32>,
    pub engine_nodes: Option<u64>,
    pub engine_requested_movetime: Option<u64>,
    pub timestamp: Option<u64>,
}

impl RecordContext {
    pub(crate) fn apply_to(&self, entry: &mut HistoryEntry) {
        entry.engine_score = self.engine_score;
        entry.engine_time = self.engine_time;
        entry.engine_depth = self.engine_depth;
        entry.engine_nodes = self.engine_nodes;
        entry.engine_requested_movetime = self.engine_requested_movetime;
        entry.timestamp = self.timestamp;
    }
}

/// 历史记录与游标
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    /// 超过该长度时裁剪
    limit: usize,
    /// 裁剪后保留的最新条目数
    keep: usize,
}

impl History {
    pub fn new(limit: usize, keep: usize) -> Self {
        History {
            entries: Vec::new(),
            cursor: 0,
            limit,
            keep: keep.min(limit),
        }
    }

    #[inline]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor == self.entries.len()
    }

    /// 从游标处截断后追加条目，游标移到末尾
    pub fn record(&mut self, entry: HistoryEntry) {
        if self.cursor < self.entries.len() {
            debug!(
                "Discarding {} entries after cursor {}",
                self.entries.len() - self.cursor,
                self.cursor
            );
            self.entries.truncate(self.cursor);
        }
        self.entries.push(entry);
        self.prune();
        self.cursor = self.entries.len();
    }

    /// 超过上限时只保留最新的 `keep` 条
    fn prune(&mut self) {
        if self.entries.len() > self.limit {
            let dropped = self.entries.len() - self.keep;
            warn!("History exceeded {} entries, pruning {} oldest", self.limit, dropped);
            self.entries.drain(..dropped);
        }
    }

    /// 移动游标，不允许超出历史长度
    pub fn set_cursor(&mut self, index: usize) -> Result<(), HistoryError> {
        if index > self.entries.len() {
            return Err(HistoryError::OutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    /// 第 `index` 步之后的局面；0 表示初始局面，返回 None
    pub fn fen_after(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|e| e.fen.as_str())
    }

    /// 截断到 `len` 条
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
        self.cursor = self.cursor.min(self.entries.len());
    }

    /// 整体替换（导入棋谱），游标移到末尾
    pub fn replace(&mut self, entries: Vec<HistoryEntry>) {
        self.entries = entries;
        self.prune();
        self.cursor = self.entries.len();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut HistoryEntry> {
        self.entries.get_mut(index)
    }
}
