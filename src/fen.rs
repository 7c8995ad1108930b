//! FEN 解析和生成
//!
//! 揭棋 FEN 有新旧两种格式，通过第二个字段是否为 `w`/`b` 区分：
//!
//! - 新格式: `<棋盘> <行棋方> <暗子池> <被吃暗子池> <半回合> <回合数>`
//! - 旧格式: `<棋盘> <暗子池> <行棋方> - - <半回合> <回合数>`（没有被吃暗子池）
//!
//! 新格式可以省略尾部字段（最少 `<棋盘> <行棋方>`），旧格式最少 `<棋盘> <暗子池> <行棋方>`。
//!
//! 棋盘符号：
//! - 红方明子：K(帅) A(仕) B(相) N(马) R(车) C(炮) P(兵)
//! - 黑方明子：k a b n r c p
//! - 红方暗子：X
//! - 黑方暗子：x
//! - 空格：数字 (1-9)
//!
//! 这里的坐标一律是规范坐标，与棋盘朝向无关。

use crate::error::FenError;
use crate::pool::PoolCounts;
use crate::types::{origin_role, PieceKind, Position, Role, Side};
use serde::{Deserialize, Serialize};

/// 标准开局
pub const START_FEN: &str =
    "xxxxkxxxx/9/1x5x1/x1x1x1x1x/9/9/X1X1X1X1X/1X5X1/9/XXXXKXXXX w A2B2N2R2C2P5a2b2n2r2c2p5 - 0 1";

/// FEN 格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FenFormat {
    #[default]
    New,
    Old,
}

/// FEN 中的棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenPiece {
    pub position: Position,
    pub side: Side,
    /// 明子身份，None 表示暗子
    pub kind: Option<PieceKind>,
}

impl FenPiece {
    /// 棋盘字段中的字母
    pub fn letter(&self) -> char {
        match (self.kind, self.side) {
            (Some(kind), _) => kind.to_fen_char(),
            (None, Side::Red) => 'X',
            (None, Side::Black) => 'x',
        }
    }
}

/// FEN 解析后的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenState {
    pub pieces: Vec<FenPiece>,
    pub side_to_move: Side,
    pub pool: PoolCounts,
    pub captured_pool: PoolCounts,
    pub halfmove: u32,
    pub fullmove: u32,
}

impl FenState {
    /// 标准开局，与 [`START_FEN`] 等价
    pub fn start() -> FenState {
        let mut pieces = Vec::with_capacity(32);
        for row in (0..10).rev() {
            for col in 0..9 {
                let position = Position::new(row, col);
                let Some(role) = origin_role(position) else {
                    continue;
                };
                let side = if row <= 4 { Side::Red } else { Side::Black };
                let kind = (role == Role::King).then(|| PieceKind::new(side, role));
                pieces.push(FenPiece {
                    position,
                    side,
                    kind,
                });
            }
        }

        FenState {
            pieces,
            side_to_move: Side::Red,
            pool: PoolCounts::start_position(),
            captured_pool: PoolCounts::empty(),
            halfmove: 0,
            fullmove: 1,
        }
    }

    /// 生成指定格式的 FEN
    pub fn to_fen(&self, format: FenFormat) -> String {
        let board = board_field(&self.pieces);
        let side = self.side_to_move.to_fen_char();
        match format {
            FenFormat::New => format!(
                "{} {} {} {} {} {}",
                board,
                side,
                self.pool.to_fen_field(),
                self.captured_pool.to_fen_field(),
                self.halfmove,
                self.fullmove
            ),
            FenFormat::Old => format!(
                "{} {} {} - - {} {}",
                board,
                self.pool.to_fen_field(),
                side,
                self.halfmove,
                self.fullmove
            ),
        }
    }
}

/// 按格式拆好的原始字段
struct Fields<'a> {
    board: &'a str,
    side: &'a str,
    pool: &'a str,
    captured: &'a str,
    halfmove: &'a str,
    fullmove: &'a str,
}

/// 判断 FEN 格式
pub fn detect_format(fen: &str) -> FenFormat {
    match fen.split_whitespace().nth(1) {
        Some("w") | Some("b") => FenFormat::New,
        _ => FenFormat::Old,
    }
}

fn split_fields(fen: &str) -> Result<(FenFormat, Fields<'_>), FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    let format = detect_format(fen);

    let mut fields = Fields {
        board: "",
        side: "",
        pool: "-",
        captured: "-",
        halfmove: "0",
        fullmove: "1",
    };

    match (format, parts.as_slice()) {
        (FenFormat::New, [board, side]) => {
            fields.board = board;
            fields.side = side;
        }
        (FenFormat::New, [board, side, pool]) => {
            fields.board = board;
            fields.side = side;
            fields.pool = pool;
        }
        (FenFormat::New, [board, side, pool, captured]) => {
            fields.board = board;
            fields.side = side;
            fields.pool = pool;
            fields.captured = captured;
        }
        (FenFormat::New, [board, side, pool, halfmove, fullmove]) => {
            fields.board = board;
            fields.side = side;
            fields.pool = pool;
            fields.halfmove = halfmove;
            fields.fullmove = fullmove;
        }
        (FenFormat::New, [board, side, pool, captured, halfmove, fullmove]) => {
            fields.board = board;
            fields.side = side;
            fields.pool = pool;
            fields.captured = captured;
            fields.halfmove = halfmove;
            fields.fullmove = fullmove;
        }
        (FenFormat::Old, [board, pool, side, rest @ ..]) if rest.len() <= 4 => {
            fields.board = board;
            fields.pool = pool;
            fields.side = side;
            if let Some(halfmove) = rest.get(2) {
                fields.halfmove = halfmove;
            }
            if let Some(fullmove) = rest.get(3) {
                fields.fullmove = fullmove;
            }
        }
        (FenFormat::Old, [_, side]) => return Err(FenError::BadSide(side.to_string())),
        _ => return Err(FenError::FieldCount(parts.len())),
    }

    Ok((format, fields))
}

/// 解析 FEN 字符串（自动识别新旧格式）
pub fn parse_fen(fen: &str) -> Result<FenState, FenError> {
    let (_, fields) = split_fields(fen)?;

    let pieces = parse_board(fields.board)?;
    let side_to_move =
        Side::from_fen_token(fields.side).ok_or_else(|| FenError::BadSide(fields.side.to_string()))?;
    let pool = PoolCounts::parse(fields.pool)?;
    let captured_pool = PoolCounts::parse(fields.captured)?;
    let halfmove = parse_counter(fields.halfmove)?;
    let fullmove = parse_counter(fields.fullmove)?;

    Ok(FenState {
        pieces,
        side_to_move,
        pool,
        captured_pool,
        halfmove,
        fullmove,
    })
}

fn parse_counter(s: &str) -> Result<u32, FenError> {
    s.parse().map_err(|_| FenError::BadCounter(s.to_string()))
}

/// 解析棋盘字段
fn parse_board(board_str: &str) -> Result<Vec<FenPiece>, FenError> {
    let ranks: Vec<&str> = board_str.split('/').collect();
    if ranks.len() != 10 {
        return Err(FenError::RankCount(ranks.len()));
    }

    let mut pieces = Vec::new();

    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        // FEN 从上往下是 row 9 到 row 0
        let row = (9 - rank_idx) as i8;
        let mut col: i8 = 0;

        for ch in rank_str.chars() {
            if col >= 9 {
                return Err(FenError::RankWidth {
                    rank: row,
                    width: col + 1,
                });
            }

            match ch {
                '1'..='9' => {
                    col += (ch as u8 - b'0') as i8;
                    continue;
                }
                'X' | 'x' => {
                    let position = Position::new(row, col);
                    let side = Side::of_letter(ch);
                    if origin_role(position).is_none() || !is_home_half(position, side) {
                        return Err(FenError::DarkOffOrigin(position.to_fen_str()));
                    }
                    pieces.push(FenPiece {
                        position,
                        side,
                        kind: None,
                    });
                }
                _ => {
                    let kind = PieceKind::from_fen_char(ch).ok_or(FenError::BadChar(ch))?;
                    pieces.push(FenPiece {
                        position: Position::new(row, col),
                        side: kind.side,
                        kind: Some(kind),
                    });
                }
            }
            col += 1;
        }

        if col != 9 {
            return Err(FenError::RankWidth {
                rank: row,
                width: col,
            });
        }
    }

    Ok(pieces)
}

fn is_home_half(pos: Position, side: Side) -> bool {
    match side {
        Side::Red => pos.row <= 4,
        Side::Black => pos.row >= 5,
    }
}

/// 生成棋盘字段
fn board_field(pieces: &[FenPiece]) -> String {
    let mut grid: [Option<char>; 90] = [None; 90];
    for piece in pieces {
        grid[piece.position.to_index()] = Some(piece.letter());
    }

    let mut ranks = Vec::with_capacity(10);
    for row in (0..10).rev() {
        let mut rank = String::new();
        let mut empty = 0;
        for col in 0..9 {
            match grid[Position::new(row, col).to_index()] {
                Some(ch) => {
                    if empty > 0 {
                        rank.push_str(&empty.to_string());
                        empty = 0;
                    }
                    rank.push(ch);
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            rank.push_str(&empty.to_string());
        }
        ranks.push(rank);
    }

    ranks.join("/")
}

/// 新旧格式互转
///
/// 只重排字段、补齐缺省值，不做完整解析。目标格式与当前格式相同时原样返回。
/// 旧格式没有被吃暗子池，转成旧格式时该字段丢弃，转回新格式时为 `-`。
pub fn convert_format(fen: &str, target: FenFormat) -> Result<String, FenError> {
    let (format, f) = split_fields(fen)?;
    if format == target {
        return Ok(fen.to_string());
    }

    Ok(match target {
        FenFormat::Old => format!(
            "{} {} {} - - {} {}",
            f.board, f.pool, f.side, f.halfmove, f.fullmove
        ),
        FenFormat::New => format!(
            "{} {} {} {} {} {}",
            f.board, f.side, f.pool, f.captured, f.halfmove, f.fullmove
        ),
    })
}

/// 局面命令：基础 FEN 加走法列表
///
/// 接受 `position fen <fen>`、`fen <fen>`、`position <fen>`、`startpos`，
/// 以及尾部的 ` moves <uci...>`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCommand {
    pub fen: String,
    pub moves: Vec<String>,
}

impl PositionCommand {
    pub fn parse(input: &str) -> Result<PositionCommand, FenError> {
        let mut text = input.trim();
        for prefix in ["position fen ", "fen ", "position "] {
            if let Some(rest) = text.strip_prefix(prefix) {
                text = rest.trim_start();
                break;
            }
        }

        let expanded;
        if let Some(rest) = text.strip_prefix("startpos") {
            expanded = format!("{} {}", START_FEN, rest.trim_start());
            text = expanded.trim_end();
        }

        if text.is_empty() {
            return Err(FenError::BadCommand(input.to_string()));
        }

        let (fen, moves) = match text.find(" moves") {
            Some(idx) => {
                let moves = text[idx + " moves".len()..]
                    .split_whitespace()
                    .filter(|m| m.len() >= 4)
                    .map(str::to_string)
                    .collect();
                (text[..idx].trim(), moves)
            }
            None => (text, Vec::new()),
        };

        Ok(PositionCommand {
            fen: fen.to_string(),
            moves,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_fen() {
        let state = parse_fen(START_FEN).unwrap();
        assert_eq!(state.pieces.len(), 32);
        assert_eq!(state.side_to_move, Side::Red);
        assert_eq!(state.pool, PoolCounts::start_position());
        assert!(state.captured_pool.is_empty());
        assert_eq!(state.halfmove, 0);
        assert_eq!(state.fullmove, 1);

        let kings: Vec<_> = state.pieces.iter().filter(|p| p.kind.is_some()).collect();
        assert_eq!(kings.len(), 2);
        assert_eq!(kings[0].kind.map(|k| k.role), Some(Role::King));
        assert_eq!(kings[0].position, Position::new(9, 4));
        assert_eq!(kings[1].position, Position::new(0, 4));
    }

    #[test]
    fn test_start_state_matches_start_fen() {
        assert_eq!(FenState::start(), parse_fen(START_FEN).unwrap());
    }

    #[test]
    fn test_round_trip_both_formats() {
        let fens = [
            START_FEN,
            "4k4/9/9/9/9/9/9/9/4R4/4K4 b - - 3 20",
            "1xxxkxxx1/9/1x5x1/x1x1x1x1x/9/9/X1X1X1X1X/1X5X1/9/1XXXKXXX1 w N2n2B2b2A2a2C2c2P5p5 R2r2 2 2",
        ];
        for fen in fens {
            let state = parse_fen(fen).unwrap();
            let regenerated = state.to_fen(FenFormat::New);
            assert_eq!(parse_fen(&regenerated).unwrap(), state);
            if fen != START_FEN {
                assert_eq!(regenerated, fen);
            }

            let old = state.to_fen(FenFormat::Old);
            let reparsed = parse_fen(&old).unwrap();
            assert_eq!(reparsed.pieces, state.pieces);
            assert_eq!(reparsed.pool, state.pool);
            assert_eq!(reparsed.side_to_move, state.side_to_move);
            assert_eq!(reparsed.halfmove, state.halfmove);
            assert_eq!(reparsed.fullmove, state.fullmove);
        }
    }

    #[test]
    fn test_detect_and_convert() {
        let old = "xxxxkxxxx/9/1x5x1/x1x1x1x1x/9/9/X1X1X1X1X/1X5X1/9/XXXXKXXXX A2B2N2R2C2P5a2b2n2r2c2p5 w - - 0 1";
        assert_eq!(detect_format(START_FEN), FenFormat::New);
        assert_eq!(detect_format(old), FenFormat::Old);

        assert_eq!(convert_format(START_FEN, FenFormat::Old).unwrap(), old);
        assert_eq!(convert_format(old, FenFormat::New).unwrap(), START_FEN);

        // 同格式原样返回
        assert_eq!(convert_format(START_FEN, FenFormat::New).unwrap(), START_FEN);
        let once = convert_format(START_FEN, FenFormat::Old).unwrap();
        assert_eq!(convert_format(&once, FenFormat::Old).unwrap(), once);
    }

    #[test]
    fn test_short_new_format() {
        let state = parse_fen("4k4/9/9/9/9/9/9/9/9/4K4 b").unwrap();
        assert_eq!(state.side_to_move, Side::Black);
        assert!(state.pool.is_empty());
        assert_eq!(state.fullmove, 1);

        let state = parse_fen("4k4/9/9/9/9/9/9/9/9/4K4 w - 7 9").unwrap();
        assert_eq!(state.halfmove, 7);
        assert_eq!(state.fullmove, 9);
    }

    #[test]
    fn test_malformed_fens() {
        assert!(matches!(parse_fen("4k4/9/9"), Err(FenError::FieldCount(1))));
        assert!(matches!(
            parse_fen("4k4/9/9/9/9/9/9/9/9 w"),
            Err(FenError::RankCount(9))
        ));
        assert!(matches!(
            parse_fen("4k5/9/9/9/9/9/9/9/9/4K4 w"),
            Err(FenError::RankWidth { .. })
        ));
        assert!(matches!(
            parse_fen("4q4/9/9/9/9/9/9/9/9/4K4 w"),
            Err(FenError::BadChar('q'))
        ));
        assert!(matches!(
            parse_fen("4k4/9/9/9/9/9/9/9/9/4K4 - r"),
            Err(FenError::BadSide(_))
        ));
        assert!(matches!(
            parse_fen("4k4/9/9/9/9/9/9/9/9/4K4 w P6"),
            Err(FenError::PoolOverflow { .. })
        ));
        assert!(matches!(
            parse_fen("4k4/9/9/9/9/9/9/9/9/4K4 w - - x 1"),
            Err(FenError::BadCounter(_))
        ));
    }

    #[test]
    fn test_dark_piece_must_sit_on_origin() {
        // e4 不是任何开局位置
        assert!(matches!(
            parse_fen("4k4/9/9/9/9/4X4/9/9/9/4K4 w P1"),
            Err(FenError::DarkOffOrigin(_))
        ));
        // 红方暗子不能在黑方半场
        assert!(matches!(
            parse_fen("4k4/9/9/X8/9/9/9/9/9/4K4 w P1"),
            Err(FenError::DarkOffOrigin(_))
        ));
        assert!(parse_fen("4k4/9/9/x8/9/9/9/9/9/4K4 w p1").is_ok());
    }

    #[test]
    fn test_position_command() {
        let cmd = PositionCommand::parse("startpos").unwrap();
        assert_eq!(cmd.fen, START_FEN);
        assert!(cmd.moves.is_empty());

        let cmd = PositionCommand::parse("position startpos moves a3a4 a6a5").unwrap();
        assert_eq!(cmd.fen, START_FEN);
        assert_eq!(cmd.moves, vec!["a3a4", "a6a5"]);

        let cmd =
            PositionCommand::parse("position fen 4k4/9/9/9/9/9/9/9/9/4K4 w - - 0 1 moves e0d0")
                .unwrap();
        assert_eq!(cmd.fen, "4k4/9/9/9/9/9/9/9/9/4K4 w - - 0 1");
        assert_eq!(cmd.moves, vec!["e0d0"]);

        let cmd = PositionCommand::parse("fen 4k4/9/9/9/9/9/9/9/9/4K4 w").unwrap();
        assert_eq!(cmd.fen, "4k4/9/9/9/9/9/9/9/9/4K4 w");

        assert!(PositionCommand::parse("   ").is_err());
    }
}
