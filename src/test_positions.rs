//! 揭棋测试局面库
//!
//! 提供命名的 FEN 测试局面（新格式），方便测试和调试
//!
//! 命名规范:
//! - START: 初始局面
//! - EARLY_n: 开局后几步
//! - MIDGAME: 明暗混合的中局
//! - 其余按用途命名（将军、杀棋、翻子、吃子）

use crate::fen::START_FEN;

// =============================================================================
// 开局
// =============================================================================

/// 初始局面 - 所有棋子暗置，仅将帅明摆
pub const START: &str = START_FEN;

/// 红方第一步 a3a4 翻出兵
pub const EARLY_1: &str = "xxxxkxxxx/9/1x5x1/x1x1x1x1x/9/P8/2X1X1X1X/1X5X1/9/XXXXKXXXX b R2r2N2n2B2b2A2a2C2c2P4p5 - 1 1";

// =============================================================================
// 中局
// =============================================================================

/// 明暗混合，双方各有一个暗兵被吃
pub const MIDGAME: &str = "x1xxkxx1x/9/1x2n2x1/x1x3x1x/4p4/2P6/X3X1X1X/1X2C4/9/XXXXKXXR1 w R1r2N2n1B2b2A2a2C1c2P3p3 P1p1 0 9";

/// 明车吃明车，池中仍有暗子
pub const KNOWN_CAPTURE: &str = "xxx1k4/9/9/9/4r4/9/9/9/9/X2KR4 w R1r1n2b2 - 0 1";

// =============================================================================
// 将军 / 杀棋
// =============================================================================

/// 将帅对面
pub const FACING_KINGS: &str = "4k4/9/9/9/9/9/9/9/9/4K4 w - - 0 1";

/// 双车错杀，黑方无子可走
pub const MATE: &str = "R3k4/R8/9/9/9/9/9/9/9/3K5 b - - 0 30";

// =============================================================================
// 翻子
// =============================================================================

/// 红方池中只剩一种兵种
pub const SINGLE_KIND: &str = "3k5/9/9/9/9/9/X8/9/9/4K4 w P1 - 0 1";

/// 红方池中有两种兵种
pub const TWO_KINDS: &str = "3k5/9/9/9/9/9/X8/9/9/4K4 w R1P1 - 0 1";

/// 所有测试局面
pub const ALL_POSITIONS: [&str; 8] = [
    START,
    EARLY_1,
    MIDGAME,
    KNOWN_CAPTURE,
    FACING_KINGS,
    MATE,
    SINGLE_KIND,
    TWO_KINDS,
];
