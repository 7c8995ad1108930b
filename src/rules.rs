//! 走法合法性
//!
//! 形状与路径检查在显示坐标上做（镜像不改变距离和中点），
//! 九宫、前进方向、过河以及暗士限制在规范坐标上判断。

use crate::board::{Board, Piece};
use crate::types::{Position, Role, Side};

/// 暗士在原位时禁止的斜线（规范坐标）
const DARK_ADVISOR_FORBIDDEN: [((i8, i8), (i8, i8)); 4] = [
    ((0, 3), (1, 2)),
    ((0, 5), (1, 6)),
    ((9, 3), (8, 2)),
    ((9, 5), (8, 6)),
];

/// 模拟走子，离开作用域时无条件还原
struct SimulatedMove<'a> {
    board: &'a mut Board,
    from: Position,
    to: Position,
    captured: Option<Piece>,
}

impl<'a> SimulatedMove<'a> {
    fn apply(board: &'a mut Board, from: Position, to: Position) -> Self {
        let captured = board.relocate(from, to);
        SimulatedMove {
            board,
            from,
            to,
            captured,
        }
    }
}

impl Drop for SimulatedMove<'_> {
    fn drop(&mut self) {
        self.board.relocate(self.to, self.from);
        if let Some(piece) = self.captured.take() {
            self.board.place(piece);
        }
    }
}

impl Board {
    /// 两点之间（不含端点）的棋子数，只对同一直线有意义
    pub fn count_between(&self, from: Position, to: Position) -> usize {
        if from.row == to.row {
            let (lo, hi) = (from.col.min(to.col), from.col.max(to.col));
            ((lo + 1)..hi)
                .filter(|&col| self.has_piece(Position::new(from.row, col)))
                .count()
        } else if from.col == to.col {
            let (lo, hi) = (from.row.min(to.row), from.row.max(to.row));
            ((lo + 1)..hi)
                .filter(|&row| self.has_piece(Position::new(row, from.col)))
                .count()
        } else {
            0
        }
    }

    /// 只看走法形状和路径，不管走后是否被将
    pub fn is_mechanically_legal(&self, from: Position, to: Position) -> bool {
        if !to.is_valid() || from == to {
            return false;
        }
        let Some(piece) = self.piece_at(from) else {
            return false;
        };
        let side = self.side_of(piece);
        if let Some(target) = self.piece_at(to) {
            if self.side_of(target) == side {
                return false;
            }
        }
        self.shape_allows(piece, side, to)
    }

    fn shape_allows(&self, piece: &Piece, side: Side, to: Position) -> bool {
        let Some(role) = piece.movement_role() else {
            return false;
        };

        let from = piece.position();
        let d_row = to.row - from.row;
        let d_col = to.col - from.col;
        let (abs_row, abs_col) = (d_row.abs(), d_col.abs());

        match role {
            Role::King => abs_row + abs_col == 1 && self.canonical(to).is_in_palace(side),
            Role::Advisor => {
                if !piece.is_known() {
                    let (cf, ct) = (self.canonical(from), self.canonical(to));
                    let forbidden = DARK_ADVISOR_FORBIDDEN.iter().any(|&((fr, fc), (tr, tc))| {
                        cf == Position::new(fr, fc) && ct == Position::new(tr, tc)
                    });
                    if forbidden {
                        return false;
                    }
                }
                abs_row == 1 && abs_col == 1
            }
            Role::Elephant => {
                // 象眼
                abs_row == 2
                    && abs_col == 2
                    && !self.has_piece(from.offset(d_row / 2, d_col / 2))
            }
            Role::Horse => {
                if !((abs_row == 2 && abs_col == 1) || (abs_row == 1 && abs_col == 2)) {
                    return false;
                }
                // 马腿
                let leg = if abs_row == 2 {
                    from.offset(d_row / 2, 0)
                } else {
                    from.offset(0, d_col / 2)
                };
                !self.has_piece(leg)
            }
            Role::Chariot => (d_row == 0 || d_col == 0) && self.count_between(from, to) == 0,
            Role::Cannon => {
                if d_row != 0 && d_col != 0 {
                    return false;
                }
                let between = self.count_between(from, to);
                if self.has_piece(to) {
                    between == 1
                } else {
                    between == 0
                }
            }
            Role::Soldier => {
                let (cf, ct) = (self.canonical(from), self.canonical(to));
                let forward = match side {
                    Side::Red => 1,
                    Side::Black => -1,
                };
                let (c_row, c_col) = (ct.row - cf.row, ct.col - cf.col);
                let straight = c_row == forward && c_col == 0;
                let sideways = cf.has_crossed_river(side) && c_row == 0 && c_col.abs() == 1;
                straight || sideways
            }
        }
    }

    /// 某格是否被 `attacker` 方的明子攻击（含飞将）
    pub fn is_square_attacked(&self, target: Position, attacker: Side) -> bool {
        self.all_pieces()
            .filter(|p| p.is_known() && self.side_of(p) == attacker)
            .any(|p| {
                if p.movement_role() == Some(Role::King) {
                    // 飞将：同列且中间无子
                    p.position().col == target.col && self.count_between(p.position(), target) == 0
                } else {
                    self.shape_allows(p, attacker, target)
                }
            })
    }

    /// 某方是否被将军；没有明将时视为未被将军
    pub fn is_in_check(&self, side: Side) -> bool {
        match self.find_king(side) {
            Some(king) => self.is_square_attacked(king, side.opposite()),
            None => false,
        }
    }

    /// 模拟走子后走子方是否被将
    pub fn would_be_in_check_after_move(&mut self, from: Position, to: Position) -> bool {
        let Some(side) = self.piece_at(from).map(|p| self.side_of(p)) else {
            return false;
        };
        let sim = SimulatedMove::apply(self, from, to);
        sim.board.is_in_check(side)
    }

    /// 完整合法性：形状合法且走后不被将
    pub fn is_legal(&self, from: Position, to: Position) -> bool {
        self.is_mechanically_legal(from, to) && !self.clone().would_be_in_check_after_move(from, to)
    }

    /// 某子的全部合法目标
    pub fn legal_targets(&self, from: Position) -> Vec<Position> {
        let mut scratch = self.clone();
        self.targets_with(&mut scratch, from)
    }

    fn targets_with(&self, scratch: &mut Board, from: Position) -> Vec<Position> {
        (0..90)
            .map(Position::from_index)
            .filter(|&to| {
                self.is_mechanically_legal(from, to) && !scratch.would_be_in_check_after_move(from, to)
            })
            .collect()
    }

    /// 某方全部合法走法（显示坐标）
    pub fn all_legal_moves(&self, side: Side) -> Vec<(Position, Position)> {
        let mut scratch = self.clone();
        let movers: Vec<Position> = self
            .all_pieces()
            .filter(|p| self.side_of(p) == side)
            .map(|p| p.position())
            .collect();

        let mut moves = Vec::new();
        for from in movers {
            for to in self.targets_with(&mut scratch, from) {
                moves.push((from, to));
            }
        }
        moves
    }
}
