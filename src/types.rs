//! 揭棋核心类型定义
//!
//! 定义阵营、兵种、14 种棋子符号、坐标、棋盘朝向以及走法编码

use serde::{Deserialize, Serialize};
use std::fmt;

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Red,
    Black,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Red, Side::Black];

    /// 获取对方阵营
    pub fn opposite(&self) -> Side {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }

    /// 从 FEN 行棋方字段解析（`w` 红方，`b` 黑方）
    pub fn from_fen_token(token: &str) -> Option<Side> {
        match token {
            "w" => Some(Side::Red),
            "b" => Some(Side::Black),
            _ => None,
        }
    }

    /// 转换为 FEN 行棋方字符
    pub fn to_fen_char(&self) -> char {
        match self {
            Side::Red => 'w',
            Side::Black => 'b',
        }
    }

    /// 棋子字母的大小写决定阵营：大写红方，小写黑方
    pub fn of_letter(c: char) -> Side {
        if c.is_ascii_uppercase() {
            Side::Red
        } else {
            Side::Black
        }
    }

    fn index(&self) -> usize {
        match self {
            Side::Red => 0,
            Side::Black => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Red => write!(f, "Red"),
            Side::Black => write!(f, "Black"),
        }
    }
}

/// 兵种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// 将/帅
    King,
    /// 士/仕
    Advisor,
    /// 象/相
    Elephant,
    /// 马
    Horse,
    /// 车
    Chariot,
    /// 炮
    Cannon,
    /// 卒/兵
    Soldier,
}

impl Role {
    /// 暗子池的书写顺序
    pub const FEN_ORDER: [Role; 7] = [
        Role::Chariot,
        Role::Horse,
        Role::Elephant,
        Role::Advisor,
        Role::King,
        Role::Cannon,
        Role::Soldier,
    ];

    /// 从 FEN 字母解析（忽略大小写）
    pub fn from_fen_char(c: char) -> Option<Role> {
        match c.to_ascii_uppercase() {
            'K' => Some(Role::King),
            'A' => Some(Role::Advisor),
            'B' => Some(Role::Elephant),
            'N' => Some(Role::Horse),
            'R' => Some(Role::Chariot),
            'C' => Some(Role::Cannon),
            'P' => Some(Role::Soldier),
            _ => None,
        }
    }

    /// 转换为 FEN 字母（大写）
    pub fn to_fen_char(&self) -> char {
        match self {
            Role::King => 'K',
            Role::Advisor => 'A',
            Role::Elephant => 'B',
            Role::Horse => 'N',
            Role::Chariot => 'R',
            Role::Cannon => 'C',
            Role::Soldier => 'P',
        }
    }

    /// 每方开局时该兵种的数量
    pub fn initial_count(&self) -> u8 {
        match self {
            Role::King => 1,
            Role::Soldier => 5,
            _ => 2,
        }
    }

    fn order_index(&self) -> usize {
        match self {
            Role::Chariot => 0,
            Role::Horse => 1,
            Role::Elephant => 2,
            Role::Advisor => 3,
            Role::King => 4,
            Role::Cannon => 5,
            Role::Soldier => 6,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::King => "King",
            Role::Advisor => "Advisor",
            Role::Elephant => "Elephant",
            Role::Horse => "Horse",
            Role::Chariot => "Chariot",
            Role::Cannon => "Cannon",
            Role::Soldier => "Soldier",
        };
        write!(f, "{}", name)
    }
}

/// 棋子身份：阵营 + 兵种，对应 14 个 FEN 字母之一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceKind {
    pub side: Side,
    pub role: Role,
}

impl PieceKind {
    /// 符号总数（7 兵种 × 2 阵营）
    pub const COUNT: usize = 14;

    pub fn new(side: Side, role: Role) -> Self {
        PieceKind { side, role }
    }

    /// 从 FEN 字母解析，大小写决定阵营
    pub fn from_fen_char(c: char) -> Option<PieceKind> {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let role = Role::from_fen_char(c)?;
        Some(PieceKind::new(Side::of_letter(c), role))
    }

    /// 转换为 FEN 字母
    pub fn to_fen_char(&self) -> char {
        let ch = self.role.to_fen_char();
        match self.side {
            Side::Red => ch,
            Side::Black => ch.to_ascii_lowercase(),
        }
    }

    /// 开局总数（将 1，兵 5，其余 2）
    pub fn initial_count(&self) -> u8 {
        self.role.initial_count()
    }

    /// 在 14 元数组中的下标，顺序与 `all()` 一致
    pub fn index(&self) -> usize {
        self.role.order_index() * 2 + self.side.index()
    }

    /// 按 `R r N n B b A a K k C c P p` 顺序遍历全部符号
    pub fn all() -> impl Iterator<Item = PieceKind> {
        Role::FEN_ORDER
            .into_iter()
            .flat_map(|role| Side::ALL.into_iter().map(move |side| PieceKind::new(side, role)))
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen_char())
    }
}

/// 棋盘位置 (row, col)
///
/// 规范坐标下 row 即 UCI 的 rank（0 是红方底线），col 即 file（`a` = 0）。
/// 棋盘内部按显示坐标存放，两者通过 [`Orientation::canonical`] 互换。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i8,
    pub col: i8,
}

impl Position {
    pub fn new(row: i8, col: i8) -> Self {
        Position { row, col }
    }

    /// 检查位置是否在棋盘范围内
    pub fn is_valid(&self) -> bool {
        (0..=9).contains(&self.row) && (0..=8).contains(&self.col)
    }

    /// 检查规范坐标是否在该方九宫内
    pub fn is_in_palace(&self, side: Side) -> bool {
        if !(3..=5).contains(&self.col) {
            return false;
        }
        match side {
            Side::Red => (0..=2).contains(&self.row),
            Side::Black => (7..=9).contains(&self.row),
        }
    }

    /// 规范坐标下该方棋子是否已过河
    pub fn has_crossed_river(&self, side: Side) -> bool {
        match side {
            Side::Red => self.row >= 5,
            Side::Black => self.row <= 4,
        }
    }

    /// 位置加偏移量
    pub fn offset(&self, row_delta: i8, col_delta: i8) -> Position {
        Position {
            row: self.row + row_delta,
            col: self.col + col_delta,
        }
    }

    /// 90 格数组下标
    #[inline]
    pub fn to_index(&self) -> usize {
        self.row as usize * 9 + self.col as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Position {
        Position::new((index / 9) as i8, (index % 9) as i8)
    }

    /// 从 UCI 坐标解析（如 "a0"）
    pub fn from_fen_str(s: &str) -> Option<Position> {
        let mut chars = s.chars();
        let (file, rank) = (chars.next()?, chars.next()?);
        if chars.next().is_some() {
            return None;
        }
        let col = match file {
            'a'..='i' => (file as u8 - b'a') as i8,
            _ => return None,
        };
        let row = match rank {
            '0'..='9' => (rank as u8 - b'0') as i8,
            _ => return None,
        };
        Some(Position { row, col })
    }

    /// 转换为 UCI 坐标（如 "a0"）
    pub fn to_fen_str(&self) -> String {
        let col_char = (b'a' + self.col as u8) as char;
        format!("{}{}", col_char, self.row)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen_str())
    }
}

/// 棋盘朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Normal,
    /// 上下、左右同时镜像
    Flipped,
}

impl Orientation {
    /// 显示坐标与规范坐标互换（对合映射，两个方向用同一个函数）
    #[inline]
    pub fn canonical(&self, pos: Position) -> Position {
        match self {
            Orientation::Normal => pos,
            Orientation::Flipped => Position::new(9 - pos.row, 8 - pos.col),
        }
    }

    pub fn toggled(&self) -> Orientation {
        match self {
            Orientation::Normal => Orientation::Flipped,
            Orientation::Flipped => Orientation::Normal,
        }
    }
}

lazy_static::lazy_static! {
    static ref ORIGIN_ROLES: [Option<Role>; 90] = build_origin_roles();
}

fn build_origin_roles() -> [Option<Role>; 90] {
    let mut table = [None; 90];
    let back_rank = [
        Role::Chariot,
        Role::Horse,
        Role::Elephant,
        Role::Advisor,
        Role::King,
        Role::Advisor,
        Role::Elephant,
        Role::Horse,
        Role::Chariot,
    ];
    for (col, role) in back_rank.into_iter().enumerate() {
        table[Position::new(0, col as i8).to_index()] = Some(role);
        table[Position::new(9, col as i8).to_index()] = Some(role);
    }
    for col in [1, 7] {
        table[Position::new(2, col).to_index()] = Some(Role::Cannon);
        table[Position::new(7, col).to_index()] = Some(Role::Cannon);
    }
    for col in [0, 2, 4, 6, 8] {
        table[Position::new(3, col).to_index()] = Some(Role::Soldier);
        table[Position::new(6, col).to_index()] = Some(Role::Soldier);
    }
    table
}

/// 规范坐标对应的开局兵种（暗子按此走法移动）
pub fn origin_role(pos: Position) -> Option<Role> {
    if !pos.is_valid() {
        return None;
    }
    ORIGIN_ROLES[pos.to_index()]
}

/// 扩展 UCI 走法
///
/// 格式：`<file><rank><file><rank>` 加 0-2 个字母。
/// - 一个字母：与走子方同色为揭出的身份，否则为被吃暗子的身份
/// - 两个字母：依次为揭出身份、被吃暗子身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveCode {
    pub from: Position,
    pub to: Position,
    pub reveal: Option<PieceKind>,
    pub captured: Option<PieceKind>,
}

impl MoveCode {
    pub fn new(from: Position, to: Position) -> Self {
        MoveCode {
            from,
            to,
            reveal: None,
            captured: None,
        }
    }

    /// 解析走法字符串，`mover` 用于区分单个扩展字母的含义
    pub fn parse(s: &str, mover: Side) -> Option<MoveCode> {
        let s = s.trim();
        if !s.is_ascii() || !(4..=6).contains(&s.len()) {
            return None;
        }

        let from = Position::from_fen_str(&s[0..2])?;
        let to = Position::from_fen_str(&s[2..4])?;

        let extension: Vec<PieceKind> = s[4..]
            .chars()
            .map(PieceKind::from_fen_char)
            .collect::<Option<_>>()?;

        let (reveal, captured) = match extension.as_slice() {
            [] => (None, None),
            [kind] if kind.side == mover => (Some(*kind), None),
            [kind] => (None, Some(*kind)),
            [reveal, captured] => (Some(*reveal), Some(*captured)),
            _ => return None,
        };

        Some(MoveCode {
            from,
            to,
            reveal,
            captured,
        })
    }

    /// 只含坐标的 4 字符部分
    pub fn base(&self) -> String {
        format!("{}{}", self.from.to_fen_str(), self.to.to_fen_str())
    }

    pub fn has_extension(&self) -> bool {
        self.reveal.is_some() || self.captured.is_some()
    }
}

impl fmt::Display for MoveCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base())?;
        if let Some(kind) = self.reveal {
            write!(f, "{}", kind)?;
        }
        if let Some(kind) = self.captured {
            write!(f, "{}", kind)?;
        }
        Ok(())
    }
}

/// 游戏结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Ongoing,
    RedWin,
    BlackWin,
    Draw,
}

impl GameResult {
    /// 棋谱中的结果字段
    pub fn to_notation_str(&self) -> &'static str {
        match self {
            GameResult::Ongoing => "*",
            GameResult::RedWin => "1-0",
            GameResult::BlackWin => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }
}
