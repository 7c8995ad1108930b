//! 错误类型
//!
//! 规则引擎对外暴露的失败信号。非法走子、暗子池耗尽属于正常对局情况，
//! 调用方拿到的是这些错误值而不是 panic。

use crate::types::{PieceKind, Side};

/// FEN 结构错误，加载失败时局面保持不变
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN: expected 2 to 7 fields, got {0}")]
    FieldCount(usize),

    #[error("Invalid board: expected 10 ranks, got {0}")]
    RankCount(usize),

    #[error("Rank {rank} has {width} columns, expected 9")]
    RankWidth { rank: i8, width: i8 },

    #[error("Invalid character in board: {0}")]
    BadChar(char),

    #[error("Invalid side to move: {0}")]
    BadSide(String),

    #[error("Invalid pool field: {0}")]
    BadPool(String),

    #[error("Duplicate pool entry: {0}")]
    DuplicatePoolEntry(char),

    #[error("Pool count for {kind} is {count}, above the initial total {limit}")]
    PoolOverflow { kind: PieceKind, count: u8, limit: u8 },

    #[error("Invalid move counter: {0}")]
    BadCounter(String),

    #[error("Dark piece at {0} is not on an origin square of its own half")]
    DarkOffOrigin(String),

    #[error("Invalid position command: {0}")]
    BadCommand(String),
}

/// 走子失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Illegal move")]
    Illegal,

    #[error("No piece at {0}")]
    NoPiece(String),

    #[error("Piece at {0} does not belong to the side to move")]
    WrongSide(String),

    #[error("A flip is pending; resolve or cancel it first")]
    FlipPending,

    #[error("Malformed move: {0}")]
    MalformedMove(String),

    #[error("No hidden pieces left in the {0} pool")]
    PoolExhausted(Side),

    #[error("Pool has no {0} left")]
    PoolEntryMissing(PieceKind),
}

/// 翻子决定失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlipError {
    #[error("No flip is pending")]
    NotPending,

    #[error("{0} cannot be chosen by the flipping side")]
    WrongSide(PieceKind),

    #[error("Pool has no {0} left")]
    PoolExhausted(PieceKind),
}

/// 手动调整暗子池或校验失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("{0} already at its initial total")]
    LimitReached(PieceKind),

    #[error("No {0} left to remove")]
    Empty(PieceKind),

    #[error("{side} has {dark} dark pieces but only {pool} pool entries")]
    DarkExceedsPool { side: Side, dark: usize, pool: usize },

    #[error("A flip is pending; resolve or cancel it first")]
    FlipPending,
}

/// 棋谱导入 / 中文记谱失败
#[derive(Debug, thiserror::Error)]
pub enum NotationError {
    #[error("Invalid notation JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid FEN in notation: {0}")]
    Fen(#[from] FenError),

    #[error("Invalid move at ply {index}: {mv}")]
    BadMove { index: usize, mv: String },
}

/// 历史导航失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("History index {index} out of range (length {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("Stored position is invalid: {0}")]
    BadFen(#[from] FenError),

    #[error("A flip is pending; resolve or cancel it first")]
    FlipPending,
}
