//! 揭棋棋盘
//!
//! 使用 90 格数组存储棋子。格子按显示坐标存放，棋盘翻转时整体镜像；
//! 需要规范坐标的地方统一经过 [`Orientation::canonical`]。

use crate::error::FenError;
use crate::fen::{parse_fen, FenPiece, FenState};
use crate::pool::PoolCounts;
use crate::types::{origin_role, Orientation, PieceKind, Position, Role, Side};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// 棋子身份
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Identity {
    Known(PieceKind),
    /// 暗子：阵营在加载时确定，走动后不变；
    /// `assigned` 是私下分配的身份，只为保持对象完整，从不对外暴露
    Dark {
        side: Side,
        assigned: Option<PieceKind>,
    },
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    id: u32,
    /// 显示坐标
    position: Position,
    identity: Identity,
    /// 开局位置对应的兵种，暗子按它走
    origin_role: Option<Role>,
}

impl Piece {
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        matches!(self.identity, Identity::Known(_))
    }

    /// 明子身份；暗子返回 None
    #[inline]
    pub fn revealed_kind(&self) -> Option<PieceKind> {
        match self.identity {
            Identity::Known(kind) => Some(kind),
            Identity::Dark { .. } => None,
        }
    }

    /// 开局兵种，只对暗子有意义
    #[inline]
    pub fn origin_role(&self) -> Option<Role> {
        self.origin_role
    }

    /// 走法兵种：明子按真实身份，暗子按开局位置
    #[inline]
    pub(crate) fn movement_role(&self) -> Option<Role> {
        match self.identity {
            Identity::Known(kind) => Some(kind.role),
            Identity::Dark { .. } => self.origin_role,
        }
    }

    pub(crate) fn reveal(&mut self, kind: PieceKind) {
        self.identity = Identity::Known(kind);
    }

    #[cfg(test)]
    pub(crate) fn assigned_identity(&self) -> Option<PieceKind> {
        match self.identity {
            Identity::Known(_) => None,
            Identity::Dark { assigned, .. } => assigned,
        }
    }
}

/// 棋盘
#[derive(Debug, Clone)]
pub struct Board {
    /// 90 个格子 (10行 x 9列)，显示坐标
    squares: [Option<Piece>; 90],
    orientation: Orientation,
}

impl Board {
    /// 从 FEN 字符串创建棋盘（正常朝向）
    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let state = parse_fen(fen)?;
        Ok(Board::from_fen_state(&state, fen, Orientation::Normal))
    }

    /// 从解析好的 FEN 创建棋盘
    ///
    /// 暗子的私有身份从暗子池中按阵营抽取，随机数种子由 `seed_source` 的哈希决定，
    /// 同一 FEN 每次加载得到相同的分配。
    pub fn from_fen_state(state: &FenState, seed_source: &str, orientation: Orientation) -> Board {
        let mut rng = StdRng::seed_from_u64(fen_seed(seed_source));
        let mut identities: [Vec<PieceKind>; 2] = [
            state.pool.entries_for(Side::Red),
            state.pool.entries_for(Side::Black),
        ];
        for bag in identities.iter_mut() {
            bag.shuffle(&mut rng);
        }

        let mut squares = [None; 90];
        for (idx, fp) in state.pieces.iter().enumerate() {
            let identity = match fp.kind {
                Some(kind) => Identity::Known(kind),
                None => {
                    let bag = match fp.side {
                        Side::Red => &mut identities[0],
                        Side::Black => &mut identities[1],
                    };
                    Identity::Dark {
                        side: fp.side,
                        assigned: bag.pop(),
                    }
                }
            };
            let position = orientation.canonical(fp.position);
            squares[position.to_index()] = Some(Piece {
                id: idx as u32 + 1,
                position,
                identity,
                origin_role: origin_role(fp.position),
            });
        }

        Board {
            squares,
            orientation,
        }
    }

    /// 导出为 FEN 棋子列表（规范坐标）
    pub fn to_fen_pieces(&self) -> Vec<FenPiece> {
        let mut pieces: Vec<FenPiece> = self
            .all_pieces()
            .map(|p| FenPiece {
                position: self.orientation.canonical(p.position),
                side: self.side_of(p),
                kind: p.revealed_kind(),
            })
            .collect();
        pieces.sort_by_key(|p| (std::cmp::Reverse(p.position.row), p.position.col));
        pieces
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// 显示坐标 → 规范坐标（反之亦然）
    #[inline]
    pub fn canonical(&self, pos: Position) -> Position {
        self.orientation.canonical(pos)
    }

    /// 翻转棋盘：所有棋子的显示位置镜像，局面本身不变
    pub fn toggle_orientation(&mut self) {
        let mut squares = [None; 90];
        for piece in self.squares.iter().flatten() {
            let mut piece = *piece;
            piece.position = Orientation::Flipped.canonical(piece.position);
            squares[piece.position.to_index()] = Some(piece);
        }
        self.squares = squares;
        self.orientation = self.orientation.toggled();
    }

    /// 获取某位置（显示坐标）的棋子
    #[inline]
    pub fn piece_at(&self, pos: Position) -> Option<&Piece> {
        if !pos.is_valid() {
            return None;
        }
        self.squares[pos.to_index()].as_ref()
    }

    #[inline]
    pub(crate) fn piece_at_mut(&mut self, pos: Position) -> Option<&mut Piece> {
        if !pos.is_valid() {
            return None;
        }
        self.squares[pos.to_index()].as_mut()
    }

    pub fn piece_by_id(&self, id: u32) -> Option<&Piece> {
        self.all_pieces().find(|p| p.id == id)
    }

    #[inline]
    pub(crate) fn has_piece(&self, pos: Position) -> bool {
        pos.is_valid() && self.squares[pos.to_index()].is_some()
    }

    /// 所有棋子
    pub fn all_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.squares.iter().flatten()
    }

    /// 棋子所属阵营
    ///
    /// 暗子的阵营在加载时由开局半场确定，走到对方半场后（等待翻子时）仍属原方。
    pub fn side_of(&self, piece: &Piece) -> Side {
        match piece.identity {
            Identity::Known(kind) => kind.side,
            Identity::Dark { side, .. } => side,
        }
    }

    /// 找到某方明将的位置
    pub fn find_king(&self, side: Side) -> Option<Position> {
        self.all_pieces()
            .find(|p| p.revealed_kind() == Some(PieceKind::new(side, Role::King)))
            .map(|p| p.position)
    }

    /// 棋盘上明子的计数
    pub fn revealed_counts(&self) -> PoolCounts {
        let mut counts = PoolCounts::empty();
        for kind in self.all_pieces().filter_map(|p| p.revealed_kind()) {
            counts.set(kind, counts.get(kind).saturating_add(1));
        }
        counts
    }

    /// 双方暗子个数（红、黑）
    pub fn dark_counts(&self) -> [usize; 2] {
        let mut counts = [0; 2];
        for piece in self.all_pieces().filter(|p| !p.is_known()) {
            match self.side_of(piece) {
                Side::Red => counts[0] += 1,
                Side::Black => counts[1] += 1,
            }
        }
        counts
    }

    /// 把 `from` 的棋子移到 `to`，返回被吃的棋子
    pub(crate) fn relocate(&mut self, from: Position, to: Position) -> Option<Piece> {
        let mut piece = self.squares[from.to_index()].take()?;
        let captured = self.squares[to.to_index()].take();
        piece.position = to;
        self.squares[to.to_index()] = Some(piece);
        captured
    }

    /// 把棋子放回它记录的位置
    pub(crate) fn place(&mut self, piece: Piece) {
        self.squares[piece.position.to_index()] = Some(piece);
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a，结果不随编译器版本变化，同一 FEN 的暗子分配在任何构建下都一致
fn fen_seed(fen: &str) -> u64 {
    fen.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
