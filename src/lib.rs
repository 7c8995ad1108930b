//! Jieqi (dark Xiangqi) rules engine
//!
//! 揭棋规则引擎 - 走法合法性、翻子、双视角暗子池、双格式 FEN 与对局历史

pub mod board;
pub mod chinese;
pub mod error;
pub mod fen;
pub mod flip;
pub mod fog;
pub mod game;
pub mod history;
pub mod notation;
pub mod pool;
pub mod rules;
pub mod test_positions;
pub mod types;

pub use board::{Board, Piece};
pub use chinese::uci_to_chinese;
pub use error::{FenError, FlipError, HistoryError, MoveError, NotationError, PoolError};
pub use fen::{convert_format, parse_fen, FenFormat, FenState, PositionCommand, START_FEN};
pub use flip::{FlipMode, FlipState, PendingFlip};
pub use fog::{calculate_dual_pools, DualPools};
pub use game::{GameConfig, GameEnd, GameState, MoveOutcome, PoolDelta};
pub use history::{Annotation, EntryKind, History, HistoryEntry, RecordContext};
pub use notation::{GameNotation, NotationMetadata};
pub use pool::PoolCounts;
pub use types::{GameResult, MoveCode, Orientation, PieceKind, Position, Role, Side};
