//! 双视角暗子池
//!
//! 上帝视角就是真实的暗子池。人机对局时，引擎视角要隐藏人类方吃掉的暗子：
//! 从最近一次局面编辑（或开局）回放到游标，人类吃暗子的每一步都把对应符号加回引擎视角的暗子池。
//! 这里只读历史，不维护任何增量状态。

use crate::fen::parse_fen;
use crate::history::{EntryKind, History};
use crate::pool::PoolCounts;
use crate::types::{MoveCode, Side};
use log::warn;

/// 四个暗子池
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualPools {
    pub god_view: PoolCounts,
    pub engine_view: PoolCounts,
    pub god_view_captured: PoolCounts,
    pub engine_view_captured: PoolCounts,
}

/// 计算上帝视角和引擎视角的暗子池
///
/// `ai_side` 为 None 表示不是人机对局，两个视角相同。
pub fn calculate_dual_pools(
    pool: &PoolCounts,
    captured: &PoolCounts,
    ai_side: Option<Side>,
    initial_fen: &str,
    history: &History,
) -> DualPools {
    let mut pools = DualPools {
        god_view: *pool,
        engine_view: *pool,
        god_view_captured: *captured,
        engine_view_captured: *captured,
    };

    let Some(ai_side) = ai_side else {
        return pools;
    };
    let human_side = ai_side.opposite();

    // 引擎只知道自己吃掉的暗子
    for (kind, _) in captured.iter().filter(|(k, _)| k.side == ai_side) {
        pools.engine_view_captured.set(kind, 0);
    }

    let entries = &history.entries()[..history.cursor()];
    let start = entries
        .iter()
        .rposition(|e| e.is_position_edit())
        .map_or(0, |i| i + 1);

    for i in start..entries.len() {
        let entry = &entries[i];
        if entry.kind != EntryKind::Move || entry.data.len() <= 4 {
            continue;
        }

        let prev_fen = match i {
            0 => initial_fen,
            _ => entries[i - 1].fen.as_str(),
        };
        let before = match parse_fen(prev_fen) {
            Ok(state) => state,
            Err(e) => {
                warn!("Skipping fog-of-war replay of {}: {}", entry.data, e);
                continue;
            }
        };
        if before.side_to_move != human_side {
            continue;
        }

        let Some(mv) = MoveCode::parse(&entry.data, human_side) else {
            continue;
        };
        let Some(captured_kind) = mv.captured else {
            continue;
        };

        // 吃的是明子就不是隐藏信息
        let hit_known = before
            .pieces
            .iter()
            .any(|p| p.position == mv.to && p.kind.is_some());
        if !hit_known {
            pools.engine_view.increment(captured_kind);
        }
    }

    pools
}
