//! 暗子池
//!
//! 14 种符号各自剩余的暗子数量。一局中同时存在两个实例：
//! 未翻开的暗子池，以及以暗子身份被吃掉的棋子池。

use crate::error::{FenError, PoolError};
use crate::types::{PieceKind, Role, Side};
use std::fmt;

/// 每种符号的计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PoolCounts {
    counts: [u8; PieceKind::COUNT],
}

impl PoolCounts {
    /// 空池
    pub fn empty() -> Self {
        PoolCounts::default()
    }

    /// 开局暗子池：除将以外全部兵种满额
    pub fn start_position() -> Self {
        let mut pool = PoolCounts::empty();
        for kind in PieceKind::all().filter(|k| k.role != Role::King) {
            pool.set(kind, kind.initial_count());
        }
        pool
    }

    #[inline]
    pub fn get(&self, kind: PieceKind) -> u8 {
        self.counts[kind.index()]
    }

    #[inline]
    pub fn set(&mut self, kind: PieceKind, count: u8) {
        self.counts[kind.index()] = count;
    }

    /// 加一，不超过该符号的开局总数；已满返回 false
    pub fn increment(&mut self, kind: PieceKind) -> bool {
        let slot = &mut self.counts[kind.index()];
        if *slot >= kind.initial_count() {
            return false;
        }
        *slot += 1;
        true
    }

    /// 减一；已经为零返回 false
    pub fn decrement(&mut self, kind: PieceKind) -> bool {
        let slot = &mut self.counts[kind.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// 某方剩余条目总数
    pub fn total(&self, side: Side) -> usize {
        PieceKind::all()
            .filter(|k| k.side == side)
            .map(|k| self.get(k) as usize)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// 某方尚有剩余的不同符号
    pub fn kinds_for(&self, side: Side) -> Vec<PieceKind> {
        PieceKind::all()
            .filter(|k| k.side == side && self.get(*k) > 0)
            .collect()
    }

    /// 某方全部条目（按数量展开），用于均匀随机抽取
    pub fn entries_for(&self, side: Side) -> Vec<PieceKind> {
        PieceKind::all()
            .filter(|k| k.side == side)
            .flat_map(|k| std::iter::repeat(k).take(self.get(k) as usize))
            .collect()
    }

    /// 遍历非零条目
    pub fn iter(&self) -> impl Iterator<Item = (PieceKind, u8)> + '_ {
        PieceKind::all()
            .map(move |k| (k, self.get(k)))
            .filter(|(_, c)| *c > 0)
    }

    /// 解析 FEN 暗子池字段（如 `R2r2N2n2P5p5`，空池为 `-`）
    pub fn parse(field: &str) -> Result<PoolCounts, FenError> {
        let mut pool = PoolCounts::empty();
        if field == "-" {
            return Ok(pool);
        }

        let mut seen = [false; PieceKind::COUNT];
        let mut chars = field.chars().peekable();
        while let Some(ch) = chars.next() {
            let kind =
                PieceKind::from_fen_char(ch).ok_or_else(|| FenError::BadPool(field.to_string()))?;

            let mut digits = String::new();
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(*d);
                chars.next();
            }
            let count: u8 = digits
                .parse()
                .map_err(|_| FenError::BadPool(field.to_string()))?;

            if seen[kind.index()] {
                return Err(FenError::DuplicatePoolEntry(ch));
            }
            seen[kind.index()] = true;

            if count > kind.initial_count() {
                return Err(FenError::PoolOverflow {
                    kind,
                    count,
                    limit: kind.initial_count(),
                });
            }
            pool.set(kind, count);
        }

        Ok(pool)
    }

    /// 生成 FEN 暗子池字段
    pub fn to_fen_field(&self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        self.iter()
            .map(|(kind, count)| format!("{}{}", kind, count))
            .collect()
    }
}

impl fmt::Display for PoolCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen_field())
    }
}

/// 局面与暗子池的一致性检查
///
/// `revealed` 是棋盘上明子的计数，`dark` 是双方暗子个数（红、黑）。
pub fn validate(
    revealed: &PoolCounts,
    dark: [usize; 2],
    pool: &PoolCounts,
    captured: &PoolCounts,
) -> Result<(), PoolError> {
    for (side, dark_count) in Side::ALL.into_iter().zip(dark) {
        let available = pool.total(side);
        if dark_count > available {
            return Err(PoolError::DarkExceedsPool {
                side,
                dark: dark_count,
                pool: available,
            });
        }
    }

    for kind in PieceKind::all() {
        let used = revealed.get(kind) as u16 + pool.get(kind) as u16 + captured.get(kind) as u16;
        if used > kind.initial_count() as u16 {
            return Err(PoolError::LimitReached(kind));
        }
    }

    Ok(())
}
