//! 中文记谱
//!
//! 把走法序列转换为中文纵线记谱，例如 `炮二平五`、`前马进三`、`兵九进一翻车`。
//! 转换时跟踪局面：暗子按开局位置的兵种命名，走动后按揭出的身份（或开局兵种）继续。
//! 红方用中文数字，黑方用全角数字。

use crate::error::{FenError, NotationError};
use crate::fen::parse_fen;
use crate::types::{origin_role, MoveCode, PieceKind, Position, Role, Side};

/// 红方纵线，从 a 线（红方左手）开始
const RED_FILES: [char; 9] = ['九', '八', '七', '六', '五', '四', '三', '二', '一'];
const RED_NUMBERS: [char; 10] = ['零', '一', '二', '三', '四', '五', '六', '七', '八', '九'];
const FULL_WIDTH: [char; 10] = ['０', '１', '２', '３', '４', '５', '６', '７', '８', '９'];

/// 中文棋子名
pub fn piece_name(kind: PieceKind) -> char {
    match (kind.role, kind.side) {
        (Role::Chariot, _) => '车',
        (Role::Horse, _) => '马',
        (Role::Elephant, Side::Red) => '相',
        (Role::Elephant, Side::Black) => '象',
        (Role::Advisor, Side::Red) => '仕',
        (Role::Advisor, Side::Black) => '士',
        (Role::Cannon, _) => '炮',
        (Role::Soldier, Side::Red) => '兵',
        (Role::Soldier, Side::Black) => '卒',
        (Role::King, Side::Red) => '帅',
        (Role::King, Side::Black) => '将',
    }
}

fn file_char(side: Side, col: i8) -> char {
    match side {
        Side::Red => RED_FILES[col as usize],
        Side::Black => FULL_WIDTH[col as usize + 1],
    }
}

fn number_char(side: Side, n: i8) -> char {
    match side {
        Side::Red => RED_NUMBERS[n as usize],
        Side::Black => FULL_WIDTH[n as usize],
    }
}

/// 同一纵线上同名棋子的前后标记，`index` 从最前面数起
fn file_label(count: usize, index: usize, pawn: bool) -> char {
    const PAWN_MIDDLE: [char; 4] = ['二', '三', '四', '五'];
    match count {
        2 => {
            if index == 0 {
                '前'
            } else {
                '后'
            }
        }
        3 => ['前', '中', '后'][index],
        4..=6 if pawn => {
            if index == 0 {
                '前'
            } else if index == count - 1 {
                '后'
            } else {
                PAWN_MIDDLE[index - 1]
            }
        }
        _ => {
            if index == 0 {
                '前'
            } else if index == count - 1 {
                '后'
            } else {
                '中'
            }
        }
    }
}

/// 记谱用的简化棋盘，暗子记为开局兵种
struct Tracker {
    cells: [[Option<PieceKind>; 9]; 10],
    side_to_move: Side,
}

impl Tracker {
    fn from_fen(fen: &str) -> Result<Tracker, NotationError> {
        let state = parse_fen(fen)?;
        let mut cells = [[None; 9]; 10];
        for piece in &state.pieces {
            let kind = match piece.kind {
                Some(kind) => kind,
                None => {
                    let role = origin_role(piece.position)
                        .ok_or_else(|| FenError::DarkOffOrigin(piece.position.to_fen_str()))?;
                    PieceKind::new(piece.side, role)
                }
            };
            cells[piece.position.row as usize][piece.position.col as usize] = Some(kind);
        }
        Ok(Tracker {
            cells,
            side_to_move: state.side_to_move,
        })
    }

    fn at(&self, pos: Position) -> Option<PieceKind> {
        self.cells[pos.row as usize][pos.col as usize]
    }

    fn describe(&self, mv: &MoveCode, kind: PieceKind) -> String {
        let side = kind.side;
        let (from, to) = (mv.from, mv.to);

        // 同一纵线上的同名棋子，按前后排序
        let mut rows: Vec<i8> = (0..10)
            .filter(|&row| self.cells[row as usize][from.col as usize] == Some(kind))
            .collect();
        match side {
            Side::Red => rows.sort_by(|a, b| b.cmp(a)),
            Side::Black => rows.sort(),
        }

        let forward = match side {
            Side::Red => to.row > from.row,
            Side::Black => to.row < from.row,
        };
        let direction = if from.row == to.row {
            '平'
        } else if forward {
            '进'
        } else {
            '退'
        };

        let straight = matches!(
            kind.role,
            Role::Chariot | Role::Cannon | Role::Soldier | Role::King
        );
        let last = if direction != '平' && straight {
            number_char(side, (to.row - from.row).abs())
        } else {
            file_char(side, to.col)
        };

        let name = piece_name(kind);
        let mut text = String::new();
        match rows.iter().position(|&r| r == from.row) {
            Some(index) if rows.len() > 1 => {
                text.push(file_label(rows.len(), index, kind.role == Role::Soldier));
                text.push(name);
            }
            _ => {
                text.push(name);
                text.push(file_char(side, from.col));
            }
        }
        text.push(direction);
        text.push(last);

        if let Some(reveal) = mv.reveal {
            text.push('翻');
            text.push(piece_name(reveal));
        }
        if let Some(captured) = mv.captured {
            text.push('吃');
            text.push(piece_name(captured));
        }
        text
    }

    fn apply(&mut self, mv: &MoveCode, kind: PieceKind) {
        let placed = mv.reveal.unwrap_or(kind);
        self.cells[mv.from.row as usize][mv.from.col as usize] = None;
        self.cells[mv.to.row as usize][mv.to.col as usize] = Some(placed);
        self.side_to_move = self.side_to_move.opposite();
    }
}

/// 把走法序列转换为中文记谱
pub fn uci_to_chinese<S: AsRef<str>>(fen: &str, moves: &[S]) -> Result<Vec<String>, NotationError> {
    let mut tracker = Tracker::from_fen(fen)?;
    let mut out = Vec::with_capacity(moves.len());

    for (index, text) in moves.iter().enumerate() {
        let text = text.as_ref();
        let bad = || NotationError::BadMove {
            index,
            mv: text.to_string(),
        };
        let mv = MoveCode::parse(text, tracker.side_to_move).ok_or_else(bad)?;
        let kind = tracker.at(mv.from).ok_or_else(bad)?;

        out.push(tracker.describe(&mv, kind));
        tracker.apply(&mv, kind);
    }
    Ok(out)
}
