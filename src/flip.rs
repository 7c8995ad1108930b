//! 翻子状态机
//!
//! 暗子走动后需要确定身份。随机模式立即从本方暗子池中均匀抽取；
//! 自由模式交给走子方选择，池中只剩一种兵种时直接确定。
//! 等待选择期间不接受新的走子。

use crate::error::MoveError;
use crate::history::RecordContext;
use crate::pool::PoolCounts;
use crate::types::{MoveCode, PieceKind, Side};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 翻子模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipMode {
    #[default]
    Random,
    Free,
}

/// 挂起的翻子操作
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFlip {
    /// 已经走到目标格的暗子
    pub piece_id: u32,
    /// 走法（规范坐标，尚未带揭子字母）
    pub move_code: MoveCode,
    /// 需要做选择的一方
    pub side: Side,
    /// 记录条目时附带的信息
    pub context: RecordContext,
}

/// 翻子状态
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FlipState {
    #[default]
    Idle,
    AwaitingChoice(PendingFlip),
}

impl FlipState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FlipState::AwaitingChoice(_))
    }

    pub fn pending(&self) -> Option<&PendingFlip> {
        match self {
            FlipState::Idle => None,
            FlipState::AwaitingChoice(pending) => Some(pending),
        }
    }
}

/// 翻子决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reveal {
    /// 身份已确定
    Now(PieceKind),
    /// 需要从这些兵种中选择
    Ask(Vec<PieceKind>),
}

/// 根据翻子模式决定走动暗子的身份
pub fn decide_reveal<R: Rng + ?Sized>(
    mode: FlipMode,
    pool: &PoolCounts,
    side: Side,
    rng: &mut R,
) -> Result<Reveal, MoveError> {
    match mode {
        FlipMode::Random => pool
            .entries_for(side)
            .choose(rng)
            .map(|kind| Reveal::Now(*kind))
            .ok_or(MoveError::PoolExhausted(side)),
        FlipMode::Free => {
            let kinds = pool.kinds_for(side);
            match kinds.as_slice() {
                [] => Err(MoveError::PoolExhausted(side)),
                [only] => Ok(Reveal::Now(*only)),
                _ => Ok(Reveal::Ask(kinds)),
            }
        }
    }
}

/// 随机模式下吃掉对方暗子时，从对方暗子池中均匀抽取被吃身份
pub fn draw_captured_identity<R: Rng + ?Sized>(
    pool: &PoolCounts,
    side: Side,
    rng: &mut R,
) -> Option<PieceKind> {
    pool.entries_for(side).choose(rng).copied()
}
