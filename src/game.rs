//! 对局状态
//!
//! [`GameState`] 是局面、暗子池、历史和翻子状态的唯一所有者。
//! 所有对外操作都经过它，调用之间状态始终一致：
//! 要么完整执行并记录一条历史，要么返回错误且不改动任何东西。
//! 唯一的中间状态是自由翻子模式下等待选择的挂起翻子。

use crate::board::{Board, Piece};
use crate::error::{FenError, FlipError, HistoryError, MoveError, NotationError, PoolError};
use crate::fen::{parse_fen, FenFormat, FenState, PositionCommand, START_FEN};
use crate::flip::{decide_reveal, draw_captured_identity, FlipMode, FlipState, PendingFlip, Reveal};
use crate::fog::{self, DualPools};
use crate::history::{
    Annotation, EntryKind, History, HistoryEntry, RecordContext, POSITION_EDIT_PREFIX,
};
use crate::notation::{GameNotation, NotationMetadata};
use crate::pool::{self, PoolCounts};
use crate::types::{GameResult, MoveCode, Orientation, PieceKind, Position, Side};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// 对局配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub flip_mode: FlipMode,
    pub fen_format: FenFormat,
    /// 人机对局时 AI 执哪一方；None 表示不启用引擎视角
    pub ai_side: Option<Side>,
    /// 随机翻子的种子；None 时取系统熵
    pub seed: Option<u64>,
    /// 历史超过该长度时裁剪
    pub history_limit: usize,
    /// 裁剪后保留的条目数
    pub history_keep: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            flip_mode: FlipMode::Random,
            fen_format: FenFormat::New,
            ai_side: None,
            seed: None,
            history_limit: 2000,
            history_keep: 1000,
        }
    }
}

/// 走子结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// 已记录，附带写入历史的走法编码
    Completed { record: String },
    /// 暗子已走到目标格，等待从这些兵种中选择身份
    AwaitingFlip { choices: Vec<PieceKind> },
}

/// 人机对局结束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    HumanWins,
    AiWins,
}

/// 手动调整的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolDelta {
    Add,
    Remove,
}

impl PoolDelta {
    fn sign(&self) -> char {
        match self {
            PoolDelta::Add => '+',
            PoolDelta::Remove => '-',
        }
    }
}

/// 对局
#[derive(Debug, Clone)]
pub struct GameState {
    config: GameConfig,
    board: Board,
    side_to_move: Side,
    pool: PoolCounts,
    captured_pool: PoolCounts,
    halfmove: u32,
    fullmove: u32,
    history: History,
    initial_fen: String,
    opening_comment: String,
    flip: FlipState,
    rng: StdRng,
}

impl GameState {
    /// 创建新对局（标准开局）
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let start = FenState::start();
        GameState {
            board: Board::from_fen_state(&start, START_FEN, Orientation::Normal),
            side_to_move: start.side_to_move,
            pool: start.pool,
            captured_pool: start.captured_pool,
            halfmove: start.halfmove,
            fullmove: start.fullmove,
            history: History::new(config.history_limit, config.history_keep),
            initial_fen: START_FEN.to_string(),
            opening_comment: String::new(),
            flip: FlipState::Idle,
            rng,
            config,
        }
    }

    // ========== 访问器 ==========

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    pub fn pool(&self) -> &PoolCounts {
        &self.pool
    }

    pub fn captured_pool(&self) -> &PoolCounts {
        &self.captured_pool
    }

    pub fn halfmove(&self) -> u32 {
        self.halfmove
    }

    pub fn fullmove(&self) -> u32 {
        self.fullmove
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn initial_fen(&self) -> &str {
        &self.initial_fen
    }

    pub fn opening_comment(&self) -> &str {
        &self.opening_comment
    }

    pub fn flip_state(&self) -> &FlipState {
        &self.flip
    }

    pub fn set_flip_mode(&mut self, mode: FlipMode) {
        self.config.flip_mode = mode;
    }

    pub fn set_ai_side(&mut self, side: Option<Side>) {
        self.config.ai_side = side;
    }

    // ========== 局面加载 ==========

    /// 回到标准开局，清空历史和开局评注
    pub fn setup_new_game(&mut self) {
        let start = FenState::start();
        self.apply_state(&start, START_FEN);
        self.initial_fen = START_FEN.to_string();
        self.history.clear();
        self.opening_comment.clear();
        info!("New game");
    }

    /// 加载 FEN，不改动历史；失败时局面保持不变
    pub fn load_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let state = parse_fen(fen)?;
        self.apply_state(&state, fen);
        debug!("Loaded {}", fen);
        Ok(())
    }

    fn apply_state(&mut self, state: &FenState, fen: &str) {
        self.board = Board::from_fen_state(state, fen, self.board.orientation());
        self.side_to_move = state.side_to_move;
        self.pool = state.pool;
        self.captured_pool = state.captured_pool;
        self.halfmove = state.halfmove;
        self.fullmove = state.fullmove;
        self.flip = FlipState::Idle;
    }

    /// 执行局面命令：加载 FEN，清空历史，然后依次走子，遇到第一步失败即停
    ///
    /// 返回成功执行的步数。
    pub fn set_position(&mut self, input: &str) -> Result<usize, FenError> {
        let command = PositionCommand::parse(input)?;
        self.load_fen(&command.fen)?;
        self.history.clear();
        self.opening_comment.clear();
        self.initial_fen = self.generate_fen();

        let mut played = 0;
        for uci in &command.moves {
            if let Err(e) = self.play_uci(uci, RecordContext::default()) {
                warn!("Position command stopped at {}: {}", uci, e);
                break;
            }
            played += 1;
        }
        Ok(played)
    }

    // ========== FEN ==========

    fn current_state(&self) -> FenState {
        FenState {
            pieces: self.board.to_fen_pieces(),
            side_to_move: self.side_to_move,
            pool: self.pool,
            captured_pool: self.captured_pool,
            halfmove: self.halfmove,
            fullmove: self.fullmove,
        }
    }

    /// 当前局面（上帝视角）
    pub fn generate_fen(&self) -> String {
        self.current_state().to_fen(self.config.fen_format)
    }

    /// 发给引擎的局面：人机对局时使用引擎视角的暗子池
    pub fn generate_fen_for_engine(&self) -> String {
        if self.config.ai_side.is_none() {
            return self.generate_fen();
        }
        let pools = self.calculate_dual_pools();
        let mut state = self.current_state();
        state.pool = pools.engine_view;
        state.captured_pool = pools.engine_view_captured;
        state.to_fen(self.config.fen_format)
    }

    pub fn calculate_dual_pools(&self) -> DualPools {
        fog::calculate_dual_pools(
            &self.pool,
            &self.captured_pool,
            self.config.ai_side,
            &self.initial_fen,
            &self.history,
        )
    }

    // ========== 走子 ==========

    /// 按显示坐标走子（棋盘点击）
    pub fn try_move(&mut self, from: Position, to: Position) -> Result<MoveOutcome, MoveError> {
        let mv = MoveCode::new(self.board.canonical(from), self.board.canonical(to));
        self.perform_move(mv, RecordContext::default())
    }

    /// 按走法字符串走子，成功（包括进入等待翻子）返回 true
    pub fn play_move_from_uci(&mut self, uci: &str) -> bool {
        match self.play_uci(uci, RecordContext::default()) {
            Ok(_) => true,
            Err(e) => {
                debug!("Rejected {}: {}", uci, e);
                false
            }
        }
    }

    /// 按走法字符串走子，附带引擎分析等记录信息
    pub fn play_uci(&mut self, uci: &str, context: RecordContext) -> Result<MoveOutcome, MoveError> {
        let uci = uci.trim();
        let mv = MoveCode::parse(uci, self.side_to_move)
            .ok_or_else(|| MoveError::MalformedMove(uci.to_string()))?;
        self.perform_move(mv, context)
    }

    /// 走子核心流程
    ///
    /// 所有校验（合法性、揭子 / 吃子字母、暗子池余量）都在改动局面之前完成。
    fn perform_move(&mut self, mv: MoveCode, context: RecordContext) -> Result<MoveOutcome, MoveError> {
        if self.flip.is_pending() {
            return Err(MoveError::FlipPending);
        }

        let from = self.board.canonical(mv.from);
        let to = self.board.canonical(mv.to);
        let piece = *self
            .board
            .piece_at(from)
            .ok_or_else(|| MoveError::NoPiece(mv.from.to_fen_str()))?;
        let side = self.board.side_of(&piece);
        if side != self.side_to_move {
            return Err(MoveError::WrongSide(mv.from.to_fen_str()));
        }
        if !self.board.is_legal(from, to) {
            return Err(MoveError::Illegal);
        }

        let reveal = self.plan_reveal(&piece, side, &mv)?;
        let target = self.board.piece_at(to).copied();
        let captured_kind = match target {
            Some(t) if !t.is_known() => {
                let target_side = self.board.side_of(&t);
                match mv.captured {
                    Some(kind) => {
                        if kind.side != target_side {
                            return Err(MoveError::MalformedMove(mv.to_string()));
                        }
                        if self.pool.get(kind) == 0 {
                            return Err(MoveError::PoolEntryMissing(kind));
                        }
                        Some(kind)
                    }
                    None if self.config.flip_mode == FlipMode::Random => {
                        draw_captured_identity(&self.pool, target_side, &mut self.rng)
                    }
                    None => None,
                }
            }
            Some(_) => {
                if let Some(kind) = mv.captured {
                    warn!("Ignoring capture letter {} on a revealed target in {}", kind, mv);
                }
                None
            }
            None => {
                if mv.captured.is_some() {
                    return Err(MoveError::MalformedMove(mv.to_string()));
                }
                None
            }
        };

        // 以下不再失败
        self.board.relocate(from, to);
        if let Some(kind) = captured_kind {
            self.pool.decrement(kind);
            self.captured_pool.increment(kind);
        }
        if target.is_some() {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }
        if side == Side::Black {
            self.fullmove += 1;
        }

        let mut record = MoveCode {
            from: mv.from,
            to: mv.to,
            reveal: None,
            captured: captured_kind,
        };

        match reveal {
            None => {}
            Some(Reveal::Now(kind)) => {
                self.reveal_at(to, kind);
                record.reveal = Some(kind);
            }
            Some(Reveal::Ask(choices)) => {
                debug!("Awaiting flip choice for {} among {:?}", record, choices);
                self.flip = FlipState::AwaitingChoice(PendingFlip {
                    piece_id: piece.id(),
                    move_code: record,
                    side,
                    context,
                });
                return Ok(MoveOutcome::AwaitingFlip { choices });
            }
        }

        let data = record.to_string();
        self.finalize(EntryKind::Move, data.clone(), &context);
        Ok(MoveOutcome::Completed { record: data })
    }

    /// 走动暗子的身份：明子返回 None
    fn plan_reveal(
        &mut self,
        piece: &Piece,
        side: Side,
        mv: &MoveCode,
    ) -> Result<Option<Reveal>, MoveError> {
        if piece.is_known() {
            if mv.reveal.is_some() {
                return Err(MoveError::MalformedMove(mv.to_string()));
            }
            return Ok(None);
        }

        match mv.reveal {
            Some(kind) => {
                if kind.side != side {
                    return Err(MoveError::MalformedMove(mv.to_string()));
                }
                if self.pool.get(kind) == 0 {
                    return Err(MoveError::PoolEntryMissing(kind));
                }
                Ok(Some(Reveal::Now(kind)))
            }
            None => decide_reveal(self.config.flip_mode, &self.pool, side, &mut self.rng).map(Some),
        }
    }

    fn reveal_at(&mut self, display: Position, kind: PieceKind) {
        self.pool.decrement(kind);
        if let Some(piece) = self.board.piece_at_mut(display) {
            piece.reveal(kind);
        }
    }

    /// 自由翻子：选定身份，完成挂起的走子
    pub fn resolve_flip(&mut self, kind: PieceKind) -> Result<String, FlipError> {
        let pending = self.flip.pending().cloned().ok_or(FlipError::NotPending)?;
        if kind.side != pending.side {
            return Err(FlipError::WrongSide(kind));
        }
        if self.pool.get(kind) == 0 {
            return Err(FlipError::PoolExhausted(kind));
        }

        let display = self
            .board
            .piece_by_id(pending.piece_id)
            .map(|p| p.position())
            .unwrap_or_else(|| self.board.canonical(pending.move_code.to));
        self.reveal_at(display, kind);
        self.flip = FlipState::Idle;

        let mut record = pending.move_code;
        record.reveal = Some(kind);
        let data = record.to_string();
        debug!("Flip resolved: {}", data);
        self.finalize(EntryKind::Move, data.clone(), &pending.context);
        Ok(data)
    }

    /// 放弃挂起的翻子，从游标处的历史局面恢复
    pub fn cancel_pending_flip(&mut self) -> bool {
        if !self.flip.is_pending() {
            return false;
        }
        let fen = self.fen_at_cursor();
        if let Err(e) = self.load_fen(&fen) {
            warn!("Could not restore {} after cancelling flip: {}", fen, e);
        }
        self.flip = FlipState::Idle;
        debug!("Pending flip cancelled");
        true
    }

    fn fen_at_cursor(&self) -> String {
        self.history
            .fen_after(self.history.cursor())
            .unwrap_or(self.initial_fen.as_str())
            .to_string()
    }

    /// 记录条目：走子条目切换走子方，生成局面，从游标处截断后追加
    ///
    /// 等待翻子时棋盘上有离开原位的暗子，此时的局面不能写入历史。
    pub fn record_and_finalize(
        &mut self,
        kind: EntryKind,
        data: impl Into<String>,
        context: &RecordContext,
    ) -> Result<(), HistoryError> {
        if self.flip.is_pending() {
            return Err(HistoryError::FlipPending);
        }
        self.finalize(kind, data, context);
        Ok(())
    }

    fn finalize(&mut self, kind: EntryKind, data: impl Into<String>, context: &RecordContext) {
        if kind == EntryKind::Move {
            self.side_to_move = self.side_to_move.opposite();
        }
        let mut entry = HistoryEntry::new(kind, data, self.generate_fen());
        context.apply_to(&mut entry);
        debug!("Recorded {:?} {}", entry.kind, entry.data);
        self.history.record(entry);
    }

    // ========== 合法性查询 ==========

    /// 显示坐标下的走子是否可行（轮到该方、无挂起翻子、走法合法）
    pub fn is_move_valid(&self, from: Position, to: Position) -> bool {
        if self.flip.is_pending() {
            return false;
        }
        match self.board.piece_at(from) {
            Some(piece) => {
                self.board.side_of(piece) == self.side_to_move && self.board.is_legal(from, to)
            }
            None => false,
        }
    }

    /// 某子的合法目标（显示坐标）；不是走子方的子返回空
    pub fn legal_moves_for(&self, from: Position) -> Vec<Position> {
        if self.flip.is_pending() {
            return Vec::new();
        }
        match self.board.piece_at(from) {
            Some(piece) if self.board.side_of(piece) == self.side_to_move => {
                self.board.legal_targets(from)
            }
            _ => Vec::new(),
        }
    }

    /// 走子方全部合法走法（规范坐标的 4 字符编码）；等待翻子时为空
    pub fn all_legal_moves(&self) -> Vec<String> {
        if self.flip.is_pending() {
            return Vec::new();
        }
        self.board
            .all_legal_moves(self.side_to_move)
            .into_iter()
            .map(|(from, to)| MoveCode::new(self.board.canonical(from), self.board.canonical(to)).base())
            .collect()
    }

    // ========== 历史导航 ==========

    /// 悔棋：删掉游标前一条及其后的所有条目
    pub fn undo_last_move(&mut self) -> bool {
        let cursor = self.history.cursor();
        if cursor == 0 {
            return false;
        }
        let target = self
            .history
            .fen_after(cursor - 1)
            .unwrap_or(self.initial_fen.as_str())
            .to_string();
        if let Err(e) = self.load_fen(&target) {
            warn!("Undo failed to restore {}: {}", target, e);
            return false;
        }
        self.history.truncate(cursor - 1);
        debug!("Undo to {}", self.history.len());
        true
    }

    /// 跳到第 `index` 步之后的局面，0 为初始局面；历史本身不变
    pub fn replay_to_move(&mut self, index: usize) -> Result<(), HistoryError> {
        if index > self.history.len() {
            return Err(HistoryError::OutOfRange {
                index,
                len: self.history.len(),
            });
        }
        let target = self
            .history
            .fen_after(index)
            .unwrap_or(self.initial_fen.as_str())
            .to_string();
        self.load_fen(&target)?;
        self.history.set_cursor(index)?;
        debug!("Replayed to {}", index);
        Ok(())
    }

    // ========== 暗子池调整 / 局面编辑 ==========

    /// 手动增减某兵种的暗子数
    pub fn adjust_unrevealed_count(&mut self, kind: PieceKind, delta: PoolDelta) -> Result<(), PoolError> {
        if self.flip.is_pending() {
            return Err(PoolError::FlipPending);
        }
        match delta {
            PoolDelta::Remove => {
                if !self.pool.decrement(kind) {
                    return Err(PoolError::Empty(kind));
                }
            }
            PoolDelta::Add => {
                if self.used_count(kind) >= kind.initial_count() as u16 {
                    return Err(PoolError::LimitReached(kind));
                }
                self.pool.increment(kind);
            }
        }
        self.finalize(
            EntryKind::Adjust,
            format!("{}{}", kind, delta.sign()),
            &RecordContext::default(),
        );
        Ok(())
    }

    /// 在暗子池和被吃暗子池之间移动一个符号
    ///
    /// `Add` 把暗子池的一个移入被吃池，`Remove` 反向。
    pub fn adjust_captured_unrevealed_count(
        &mut self,
        kind: PieceKind,
        delta: PoolDelta,
    ) -> Result<(), PoolError> {
        if self.flip.is_pending() {
            return Err(PoolError::FlipPending);
        }
        match delta {
            PoolDelta::Add => {
                if !self.pool.decrement(kind) {
                    return Err(PoolError::Empty(kind));
                }
                self.captured_pool.increment(kind);
            }
            PoolDelta::Remove => {
                if self.captured_pool.get(kind) == 0 {
                    return Err(PoolError::Empty(kind));
                }
                let on_board = self.board.revealed_counts().get(kind) + self.pool.get(kind);
                if on_board >= kind.initial_count() {
                    return Err(PoolError::LimitReached(kind));
                }
                self.captured_pool.decrement(kind);
                self.pool.increment(kind);
            }
        }
        self.finalize(
            EntryKind::Adjust,
            format!("captured_{}{}", kind, delta.sign()),
            &RecordContext::default(),
        );
        Ok(())
    }

    /// 明子 + 暗子池 + 被吃暗子池
    fn used_count(&self, kind: PieceKind) -> u16 {
        self.board.revealed_counts().get(kind) as u16
            + self.pool.get(kind) as u16
            + self.captured_pool.get(kind) as u16
    }

    /// 对局中编辑局面，记录为调整条目
    pub fn apply_position_edit(&mut self, fen: &str) -> Result<(), HistoryError> {
        if self.flip.is_pending() {
            return Err(HistoryError::FlipPending);
        }
        self.load_fen(fen)?;
        let edited = self.generate_fen();
        self.finalize(
            EntryKind::Adjust,
            format!("{}{}", POSITION_EDIT_PREFIX, edited),
            &RecordContext::default(),
        );
        info!("Position edited: {}", edited);
        Ok(())
    }

    /// 翻转棋盘显示
    pub fn toggle_orientation(&mut self) {
        self.board.toggle_orientation();
    }

    // ========== 评注 ==========

    pub fn update_move_comment(&mut self, index: usize, comment: &str) -> Result<(), HistoryError> {
        let len = self.history.len();
        let entry = self
            .history
            .entry_mut(index)
            .ok_or(HistoryError::OutOfRange { index, len })?;
        let comment = comment.trim();
        entry.comment = (!comment.is_empty()).then(|| comment.to_string());
        Ok(())
    }

    pub fn update_move_annotation(
        &mut self,
        index: usize,
        annotation: Option<Annotation>,
    ) -> Result<(), HistoryError> {
        let len = self.history.len();
        let entry = self
            .history
            .entry_mut(index)
            .ok_or(HistoryError::OutOfRange { index, len })?;
        entry.annotation = annotation;
        Ok(())
    }

    pub fn update_opening_comment(&mut self, comment: &str) {
        self.opening_comment = comment.trim().to_string();
    }

    // ========== 结果 / 校验 ==========

    /// 走子方无子可走即负；等待翻子时对局未结束
    pub fn determine_game_result(&self) -> GameResult {
        if self.flip.is_pending() || !self.all_legal_moves().is_empty() {
            return GameResult::Ongoing;
        }
        match self.side_to_move {
            Side::Red => GameResult::BlackWin,
            Side::Black => GameResult::RedWin,
        }
    }

    /// 人机对局的胜负；非人机对局或未结束返回 None
    pub fn check_game_end(&self) -> Option<GameEnd> {
        let ai_side = self.config.ai_side?;
        if self.flip.is_pending() || !self.all_legal_moves().is_empty() {
            return None;
        }
        if self.side_to_move == ai_side {
            Some(GameEnd::HumanWins)
        } else {
            Some(GameEnd::AiWins)
        }
    }

    /// 局面与暗子池是否一致
    pub fn validation_status(&self) -> Result<(), PoolError> {
        pool::validate(
            &self.board.revealed_counts(),
            self.board.dark_counts(),
            &self.pool,
            &self.captured_pool,
        )
    }

    // ========== 棋谱 ==========

    /// 导出棋谱；走法条目去掉时间戳和搜索统计
    pub fn generate_game_notation(&self, date: Option<String>) -> GameNotation {
        GameNotation {
            metadata: NotationMetadata {
                event: Some("揭棋对局".to_string()),
                site: Some("jieqi-core".to_string()),
                date,
                round: None,
                white: Some("红方".to_string()),
                black: Some("黑方".to_string()),
                result: Some(self.determine_game_result().to_notation_str().to_string()),
                initial_fen: Some(self.initial_fen.clone()),
                flip_mode: Some(self.config.flip_mode),
                current_fen: Some(self.generate_fen()),
                opening_comment: (!self.opening_comment.is_empty())
                    .then(|| self.opening_comment.clone()),
            },
            moves: self.history.entries().iter().map(HistoryEntry::sanitized).collect(),
        }
    }

    /// 导入棋谱，校验失败时不改动任何状态
    pub fn apply_game_notation(&mut self, notation: GameNotation) -> Result<(), NotationError> {
        notation.validate()?;
        let GameNotation { metadata, moves } = notation;

        if let Some(mode) = metadata.flip_mode {
            self.config.flip_mode = mode;
        }
        self.opening_comment = metadata.opening_comment.unwrap_or_default();
        self.initial_fen = metadata
            .initial_fen
            .unwrap_or_else(|| START_FEN.to_string());
        let target = metadata
            .current_fen
            .or_else(|| moves.last().map(|e| e.fen.clone()))
            .unwrap_or_else(|| self.initial_fen.clone());
        self.history.replace(moves);
        self.load_fen(&target)?;

        info!("Imported notation with {} entries", self.history.len());
        Ok(())
    }

    pub fn apply_game_notation_json(&mut self, json: &str) -> Result<(), NotationError> {
        self.apply_game_notation(GameNotation::from_json(json)?)
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_positions::{KNOWN_CAPTURE, MATE, SINGLE_KIND, TWO_KINDS};

    fn kind(c: char) -> PieceKind {
        PieceKind::from_fen_char(c).unwrap()
    }

    fn seeded(mode: FlipMode) -> GameState {
        GameState::new(GameConfig {
            flip_mode: mode,
            seed: Some(42),
            ..Default::default()
        })
    }

    fn last_data(game: &GameState) -> String {
        game.history().entries().last().unwrap().data.clone()
    }

    /// 每个兵种：明子 + 暗子池 + 被吃暗子池 不超过初始数
    fn assert_conserved(game: &GameState) {
        assert!(game.validation_status().is_ok(), "{:?}", game.validation_status());
    }

    /// 只吃暗子时每个兵种：明子 + 暗子池 + 被吃暗子池 恰好等于初始数
    fn assert_exactly_conserved(game: &GameState) {
        let revealed = game.board().revealed_counts();
        for k in PieceKind::all() {
            assert_eq!(
                revealed.get(k) + game.pool().get(k) + game.captured_pool().get(k),
                k.initial_count(),
                "{} after {:?}",
                k,
                game.history().entries().last().map(|e| &e.data)
            );
        }
    }

    #[test]
    fn test_random_flip_records_reveal() {
        let mut game = seeded(FlipMode::Random);
        assert!(game.play_move_from_uci("a3a4"));

        let data = last_data(&game);
        assert_eq!(data.len(), 5);
        assert!(data.starts_with("a3a4"));
        let revealed = kind(data.chars().nth(4).unwrap());
        assert_eq!(revealed.side, Side::Red);
        assert_eq!(game.pool().get(revealed), revealed.initial_count() - 1);
        assert_eq!(game.pool().total(Side::Red), 14);
        assert_eq!(game.side_to_move(), Side::Black);
        assert_eq!(game.halfmove(), 1);
        assert_eq!(game.fullmove(), 1);

        let at = game.board().piece_at(Position::new(4, 0)).unwrap();
        assert_eq!(at.revealed_kind(), Some(revealed));
        assert_conserved(&game);
    }

    #[test]
    fn test_random_dark_capture_moves_symbol_to_captured_pool() {
        let mut game = seeded(FlipMode::Random);
        assert!(game.play_move_from_uci("b2b9"));

        let data = last_data(&game);
        assert_eq!(data.len(), 6);
        let chars: Vec<char> = data.chars().collect();
        assert!(chars[4].is_ascii_uppercase());
        assert!(chars[5].is_ascii_lowercase());

        let captured = kind(chars[5]);
        assert_eq!(game.pool().get(captured), captured.initial_count() - 1);
        assert_eq!(game.captured_pool().get(captured), 1);
        assert_eq!(game.pool().total(Side::Black), 14);
        assert_eq!(game.halfmove(), 0);
        assert_conserved(&game);
    }

    #[test]
    fn test_known_capture_leaves_pools() {
        let mut game = seeded(FlipMode::Random);
        game.set_position(KNOWN_CAPTURE).unwrap();
        let pool = *game.pool();

        assert_eq!(
            game.play_uci("e0e5", RecordContext::default()),
            Ok(MoveOutcome::Completed {
                record: "e0e5".to_string()
            })
        );
        assert_eq!(*game.pool(), pool);
        assert!(game.captured_pool().is_empty());
        assert_eq!(game.halfmove(), 0);
    }

    #[test]
    fn test_capture_letter_on_known_target_ignored() {
        let mut game = seeded(FlipMode::Random);
        game.set_position(KNOWN_CAPTURE).unwrap();
        assert!(game.play_move_from_uci("e0e5r"));
        assert_eq!(last_data(&game), "e0e5");
        assert_eq!(game.pool().get(kind('r')), 1);
    }

    #[test]
    fn test_explicit_letters() {
        let mut game = seeded(FlipMode::Random);
        assert!(game.play_move_from_uci("a3a4R"));
        assert_eq!(last_data(&game), "a3a4R");
        assert_eq!(game.pool().get(kind('R')), 1);

        // 单个小写字母在红方走子时表示被吃的暗子
        let mut game = seeded(FlipMode::Random);
        assert!(game.play_move_from_uci("b2b9n"));
        let data = last_data(&game);
        assert_eq!(data.len(), 6);
        assert!(data.ends_with('n'));
        assert_eq!(game.pool().get(kind('n')), 1);
        assert_eq!(game.captured_pool().get(kind('n')), 1);
        assert_conserved(&game);
    }

    #[test]
    fn test_bad_letters_rejected_before_mutation() {
        let mut game = seeded(FlipMode::Random);
        let before = game.generate_fen();

        assert_eq!(
            game.play_uci("a3a4n", RecordContext::default()),
            Err(MoveError::MalformedMove("a3a4n".to_string()))
        );
        assert_eq!(
            game.play_uci("a3a4Pr", RecordContext::default()),
            Err(MoveError::MalformedMove("a3a4Pr".to_string()))
        );
        game.set_position(TWO_KINDS).unwrap();
        let before_two = game.generate_fen();
        assert_eq!(
            game.play_uci("a3a4C", RecordContext::default()),
            Err(MoveError::PoolEntryMissing(kind('C')))
        );
        assert_eq!(game.generate_fen(), before_two);
        assert_ne!(before, before_two);
    }

    #[test]
    fn test_rejected_moves() {
        let mut game = seeded(FlipMode::Random);
        let before = game.generate_fen();
        assert!(!game.play_move_from_uci("zz"));
        assert!(!game.play_move_from_uci("a3a5"));
        assert!(!game.play_move_from_uci("a4a5"));
        assert_eq!(
            game.play_uci("a6a5", RecordContext::default()),
            Err(MoveError::WrongSide("a6".to_string()))
        );
        assert_eq!(game.generate_fen(), before);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_random_mode_empty_pool_reverts() {
        let mut game = seeded(FlipMode::Random);
        game.set_position("3k5/9/9/9/9/9/X8/9/9/4K4 w - - 0 1").unwrap();
        let before = game.generate_fen();
        assert_eq!(
            game.play_uci("a3a4", RecordContext::default()),
            Err(MoveError::PoolExhausted(Side::Red))
        );
        assert_eq!(game.generate_fen(), before);
        assert!(matches!(
            game.validation_status(),
            Err(PoolError::DarkExceedsPool { side: Side::Red, dark: 1, pool: 0 })
        ));
    }

    #[test]
    fn test_free_mode_single_kind_auto_resolves() {
        let mut game = seeded(FlipMode::Free);
        game.set_position(SINGLE_KIND).unwrap();
        assert_eq!(
            game.play_uci("a3a4", RecordContext::default()),
            Ok(MoveOutcome::Completed {
                record: "a3a4P".to_string()
            })
        );
        assert!(game.pool().is_empty());
    }

    #[test]
    fn test_free_mode_pending_flip() {
        let mut game = seeded(FlipMode::Free);
        game.set_position(TWO_KINDS).unwrap();
        assert_eq!(
            game.play_uci("a3a4", RecordContext::default()),
            Ok(MoveOutcome::AwaitingFlip {
                choices: vec![kind('R'), kind('P')]
            })
        );
        assert!(game.flip_state().is_pending());
        assert!(game.history().is_empty());

        // 等待选择期间不接受新走子
        assert_eq!(
            game.play_uci("e0e1", RecordContext::default()),
            Err(MoveError::FlipPending)
        );
        assert!(!game.is_move_valid(Position::new(0, 4), Position::new(1, 4)));

        assert_eq!(game.resolve_flip(kind('r')), Err(FlipError::WrongSide(kind('r'))));
        assert_eq!(game.resolve_flip(kind('C')), Err(FlipError::PoolExhausted(kind('C'))));
        assert!(game.flip_state().is_pending());

        assert_eq!(game.resolve_flip(kind('P')), Ok("a3a4P".to_string()));
        assert!(!game.flip_state().is_pending());
        assert_eq!(game.side_to_move(), Side::Black);
        assert_eq!(game.pool().get(kind('R')), 1);
        assert_eq!(game.pool().get(kind('P')), 0);
        assert_eq!(last_data(&game), "a3a4P");
        assert_eq!(game.resolve_flip(kind('R')), Err(FlipError::NotPending));
    }

    #[test]
    fn test_pending_flip_keeps_mover_side() {
        let mut game = seeded(FlipMode::Free);
        game.set_position("x2k5/9/9/9/9/9/9/9/9/X3K4 w R1P1r1 - 0 1").unwrap();
        assert_eq!(
            game.play_uci("a0a9", RecordContext::default()),
            Ok(MoveOutcome::AwaitingFlip {
                choices: vec![kind('R'), kind('P')]
            })
        );

        // 红方暗车已到黑方底线，仍然属于红方
        let mover = game.board().piece_at(Position::new(9, 0)).unwrap();
        assert!(!mover.is_known());
        assert_eq!(game.board().side_of(mover), Side::Red);
        assert_eq!(game.board().dark_counts(), [1, 0]);
        assert!(game.generate_fen().starts_with("X2k5/"));
        assert_eq!(game.validation_status(), Ok(()));

        assert_eq!(game.resolve_flip(kind('R')), Ok("a0a9R".to_string()));
        assert!(game.generate_fen().starts_with("R2k5/"));
        assert_eq!(game.validation_status(), Ok(()));
    }

    #[test]
    fn test_pending_flip_blocks_other_changes() {
        let mut game = seeded(FlipMode::Free);
        game.set_position(TWO_KINDS).unwrap();
        game.play_uci("a3a4", RecordContext::default()).unwrap();
        let pool = *game.pool();

        assert_eq!(
            game.adjust_unrevealed_count(kind('R'), PoolDelta::Remove),
            Err(PoolError::FlipPending)
        );
        assert_eq!(
            game.adjust_captured_unrevealed_count(kind('R'), PoolDelta::Add),
            Err(PoolError::FlipPending)
        );
        assert_eq!(
            game.apply_position_edit(KNOWN_CAPTURE),
            Err(HistoryError::FlipPending)
        );
        assert_eq!(
            game.record_and_finalize(EntryKind::Adjust, "R-", &RecordContext::default()),
            Err(HistoryError::FlipPending)
        );
        assert!(game.all_legal_moves().is_empty());
        assert_eq!(game.determine_game_result(), GameResult::Ongoing);
        assert_eq!(*game.pool(), pool);
        assert!(game.history().is_empty());

        // 选定身份后历史中的每个局面都能重新加载
        game.resolve_flip(kind('P')).unwrap();
        assert_eq!(game.history().len(), 1);
        game.replay_to_move(0).unwrap();
        assert_eq!(game.generate_fen(), TWO_KINDS);
        game.replay_to_move(1).unwrap();
        assert!(game.undo_last_move());
        assert_eq!(game.generate_fen(), TWO_KINDS);
    }

    #[test]
    fn test_cancel_pending_flip_restores_position() {
        let mut game = seeded(FlipMode::Free);
        game.set_position(TWO_KINDS).unwrap();
        assert!(!game.cancel_pending_flip());

        game.play_uci("a3a4", RecordContext::default()).unwrap();
        assert!(game.cancel_pending_flip());
        assert_eq!(game.generate_fen(), TWO_KINDS);
        assert!(game.history().is_empty());
        assert!(game.play_move_from_uci("a3a4R"));
    }

    #[test]
    fn test_undo_and_replay_are_exact() {
        let mut game = seeded(FlipMode::Random);
        let fen0 = game.generate_fen();
        assert!(game.play_move_from_uci("a3a4"));
        let fen1 = game.generate_fen();
        assert!(game.play_move_from_uci("a6a5"));
        let fen2 = game.generate_fen();

        game.replay_to_move(0).unwrap();
        assert_eq!(game.generate_fen(), fen0);
        game.replay_to_move(1).unwrap();
        assert_eq!(game.generate_fen(), fen1);
        game.replay_to_move(2).unwrap();
        assert_eq!(game.generate_fen(), fen2);
        assert_eq!(
            game.replay_to_move(3),
            Err(HistoryError::OutOfRange { index: 3, len: 2 })
        );

        assert!(game.undo_last_move());
        assert_eq!(game.generate_fen(), fen1);
        assert_eq!(game.history().len(), 1);
        assert!(game.undo_last_move());
        assert_eq!(game.generate_fen(), fen0);
        assert!(!game.undo_last_move());
    }

    #[test]
    fn test_undo_then_replay_recorded_move() {
        let mut game = seeded(FlipMode::Random);
        for uci in ["b2b9", "h7h0"] {
            assert!(game.play_move_from_uci(uci), "{}", uci);
            let recorded = last_data(&game);
            let fen = game.generate_fen();

            assert!(game.undo_last_move());
            assert!(game.play_move_from_uci(&recorded), "{}", recorded);
            assert_eq!(game.generate_fen(), fen);
            assert_eq!(last_data(&game), recorded);
        }
        assert_eq!(game.history().len(), 2);
    }

    #[test]
    fn test_pool_conservation_with_dark_captures() {
        let mut game = seeded(FlipMode::Random);
        assert_exactly_conserved(&game);
        for uci in ["b2b9", "h7h0", "a3a4", "i6i5"] {
            assert!(game.play_move_from_uci(uci), "{}", uci);
            assert_exactly_conserved(&game);
        }
        assert_eq!(game.captured_pool().total(Side::Red), 1);
        assert_eq!(game.captured_pool().total(Side::Black), 1);

        game.replay_to_move(1).unwrap();
        assert_exactly_conserved(&game);
    }

    #[test]
    fn test_branch_overwrite() {
        let mut game = seeded(FlipMode::Random);
        assert!(game.play_move_from_uci("a3a4"));
        assert!(game.play_move_from_uci("a6a5"));
        game.replay_to_move(1).unwrap();
        assert!(game.play_move_from_uci("i6i5"));
        assert_eq!(game.history().len(), 2);
        assert!(last_data(&game).starts_with("i6i5"));
    }

    #[test]
    fn test_set_position_with_moves() {
        let mut game = seeded(FlipMode::Random);
        assert_eq!(game.set_position("position startpos moves a3a4 a6a5"), Ok(2));
        assert_eq!(game.history().len(), 2);
        assert_eq!(game.initial_fen(), GameState::default().generate_fen());

        // 第二步非法，之后的走法不再执行
        assert_eq!(game.set_position("startpos moves a3a4 a3a5 a6a5"), Ok(1));
        assert_eq!(game.history().len(), 1);

        assert_eq!(game.set_position(&format!("fen {}", KNOWN_CAPTURE)), Ok(0));
        assert_eq!(game.generate_fen(), KNOWN_CAPTURE);
        assert!(game.set_position("position fen not a fen").is_err());
        assert_eq!(game.generate_fen(), KNOWN_CAPTURE);
    }

    #[test]
    fn test_adjust_unrevealed_count() {
        let mut game = seeded(FlipMode::Random);
        let p = kind('P');
        assert_eq!(
            game.adjust_unrevealed_count(p, PoolDelta::Add),
            Err(PoolError::LimitReached(p))
        );
        game.adjust_unrevealed_count(p, PoolDelta::Remove).unwrap();
        assert_eq!(game.pool().get(p), 4);
        assert_eq!(last_data(&game), "P-");
        assert_eq!(game.history().entries()[0].kind, EntryKind::Adjust);
        assert_eq!(game.side_to_move(), Side::Red);

        game.adjust_unrevealed_count(p, PoolDelta::Add).unwrap();
        assert_eq!(last_data(&game), "P+");
        assert_eq!(game.pool().get(p), 5);

        let k = kind('K');
        assert_eq!(
            game.adjust_unrevealed_count(k, PoolDelta::Remove),
            Err(PoolError::Empty(k))
        );
    }

    #[test]
    fn test_adjust_captured_unrevealed_count() {
        let mut game = seeded(FlipMode::Random);
        let n = kind('n');
        assert_eq!(
            game.adjust_captured_unrevealed_count(n, PoolDelta::Remove),
            Err(PoolError::Empty(n))
        );
        game.adjust_captured_unrevealed_count(n, PoolDelta::Add).unwrap();
        assert_eq!(game.pool().get(n), 1);
        assert_eq!(game.captured_pool().get(n), 1);
        assert_eq!(last_data(&game), "captured_n+");
        assert_conserved(&game);

        game.adjust_captured_unrevealed_count(n, PoolDelta::Remove).unwrap();
        assert_eq!(game.pool().get(n), 2);
        assert!(game.captured_pool().is_empty());
        assert_eq!(last_data(&game), "captured_n-");
    }

    #[test]
    fn test_position_edit() {
        let mut game = seeded(FlipMode::Random);
        assert!(game.play_move_from_uci("a3a4"));
        game.apply_position_edit(KNOWN_CAPTURE).unwrap();

        assert_eq!(game.history().len(), 2);
        let entry = game.history().entries().last().unwrap();
        assert!(entry.is_position_edit());
        assert_eq!(entry.data, format!("{}{}", POSITION_EDIT_PREFIX, KNOWN_CAPTURE));
        assert_eq!(entry.fen, KNOWN_CAPTURE);

        assert!(game.apply_position_edit("bad").is_err());
        assert_eq!(game.history().len(), 2);
    }

    #[test]
    fn test_fog_hides_human_captures() {
        let mut game = GameState::new(GameConfig {
            seed: Some(7),
            ai_side: Some(Side::Black),
            ..Default::default()
        });
        assert!(game.play_move_from_uci("b2b9"));
        let captured = kind(last_data(&game).chars().nth(5).unwrap());

        let pools = game.calculate_dual_pools();
        assert_eq!(pools.god_view.get(captured), captured.initial_count() - 1);
        assert_eq!(pools.engine_view.get(captured), captured.initial_count());
        assert!(pools.engine_view_captured.is_empty());
        assert_ne!(game.generate_fen_for_engine(), game.generate_fen());

        // 引擎不执棋时两个视角一致
        game.set_ai_side(None);
        assert_eq!(game.generate_fen_for_engine(), game.generate_fen());
    }

    #[test]
    fn test_game_end() {
        let mut game = GameState::new(GameConfig {
            ai_side: Some(Side::Black),
            ..Default::default()
        });
        assert_eq!(game.determine_game_result(), GameResult::Ongoing);
        assert_eq!(game.check_game_end(), None);

        game.set_position(MATE).unwrap();
        assert!(game.all_legal_moves().is_empty());
        assert_eq!(game.determine_game_result(), GameResult::RedWin);
        assert_eq!(game.check_game_end(), Some(GameEnd::HumanWins));

        game.set_ai_side(Some(Side::Red));
        assert_eq!(game.check_game_end(), Some(GameEnd::AiWins));
        game.set_ai_side(None);
        assert_eq!(game.check_game_end(), None);
    }

    #[test]
    fn test_orientation_uses_display_coordinates() {
        let mut game = seeded(FlipMode::Random);
        let fen = game.generate_fen();
        game.toggle_orientation();
        assert_eq!(game.generate_fen(), fen);

        // 规范 a3 显示在 (6, 8)
        assert!(game.is_move_valid(Position::new(6, 8), Position::new(5, 8)));
        assert_eq!(game.legal_moves_for(Position::new(6, 8)), vec![Position::new(5, 8)]);
        let outcome = game.try_move(Position::new(6, 8), Position::new(5, 8)).unwrap();
        match outcome {
            MoveOutcome::Completed { record } => assert!(record.starts_with("a3a4")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(game.all_legal_moves().iter().all(|m| m.len() == 4));
    }

    #[test]
    fn test_comments_and_annotations() {
        let mut game = seeded(FlipMode::Random);
        assert!(game.play_move_from_uci("a3a4"));
        game.update_move_comment(0, " 好棋 ").unwrap();
        game.update_move_annotation(0, Some(Annotation::Good)).unwrap();
        game.update_opening_comment("仙人指路");
        assert_eq!(game.history().entries()[0].comment.as_deref(), Some("好棋"));
        assert_eq!(game.history().entries()[0].annotation, Some(Annotation::Good));
        assert_eq!(game.opening_comment(), "仙人指路");

        game.update_move_comment(0, "").unwrap();
        assert_eq!(game.history().entries()[0].comment, None);
        assert_eq!(
            game.update_move_comment(5, "x"),
            Err(HistoryError::OutOfRange { index: 5, len: 1 })
        );
    }

    #[test]
    fn test_notation_round_trip() {
        let mut game = seeded(FlipMode::Free);
        game.set_flip_mode(FlipMode::Random);
        let context = RecordContext {
            engine_score: Some(12.5),
            engine_depth: Some(8),
            timestamp: Some(1_700_000_000),
            ..Default::default()
        };
        game.play_uci("a3a4", context).unwrap();
        assert!(game.play_move_from_uci("a6a5"));
        game.update_opening_comment("测试");

        let notation = game.generate_game_notation(Some("2024.01.01".to_string()));
        assert_eq!(notation.metadata.white.as_deref(), Some("红方"));
        assert_eq!(notation.metadata.result.as_deref(), Some("*"));
        assert_eq!(notation.moves[0].engine_score, Some(12.5));
        assert_eq!(notation.moves[0].engine_depth, None);
        assert_eq!(notation.moves[0].timestamp, None);

        let json = notation.to_json_pretty().unwrap();
        let mut other = GameState::new(GameConfig {
            flip_mode: FlipMode::Free,
            ..Default::default()
        });
        other.apply_game_notation_json(&json).unwrap();
        assert_eq!(other.generate_fen(), game.generate_fen());
        assert_eq!(other.history().len(), 2);
        assert_eq!(other.history().cursor(), 2);
        assert_eq!(other.config().flip_mode, FlipMode::Random);
        assert_eq!(other.opening_comment(), "测试");

        other.replay_to_move(0).unwrap();
        assert_eq!(other.generate_fen(), GameState::default().generate_fen());
    }

    #[test]
    fn test_invalid_notation_leaves_state() {
        let mut game = seeded(FlipMode::Random);
        assert!(game.play_move_from_uci("a3a4"));
        let fen = game.generate_fen();

        assert!(game.apply_game_notation_json("{\"moves\": []}").is_err());
        let bad = r#"{"metadata": {}, "moves": [{"type": "move", "data": "a3a4", "fen": "oops"}]}"#;
        assert!(game.apply_game_notation_json(bad).is_err());
        assert_eq!(game.generate_fen(), fen);
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_imported_notation_respects_history_cap() {
        let mut game = seeded(FlipMode::Random);
        let p = kind('P');
        for _ in 0..3 {
            game.adjust_unrevealed_count(p, PoolDelta::Remove).unwrap();
            game.adjust_unrevealed_count(p, PoolDelta::Add).unwrap();
        }
        let notation = game.generate_game_notation(None);
        assert_eq!(notation.moves.len(), 6);

        let mut capped = GameState::new(GameConfig {
            history_limit: 4,
            history_keep: 2,
            ..Default::default()
        });
        capped.apply_game_notation(notation).unwrap();
        assert_eq!(capped.history().len(), 2);
        assert_eq!(capped.history().cursor(), 2);
        assert_eq!(capped.generate_fen(), game.generate_fen());
    }

    #[test]
    fn test_history_cap() {
        let mut game = GameState::new(GameConfig {
            seed: Some(1),
            history_limit: 4,
            history_keep: 2,
            ..Default::default()
        });
        let p = kind('P');
        for _ in 0..3 {
            game.adjust_unrevealed_count(p, PoolDelta::Remove).unwrap();
            game.adjust_unrevealed_count(p, PoolDelta::Add).unwrap();
        }
        assert!(game.history().len() <= 4);
        assert_eq!(game.history().cursor(), game.history().len());
        assert_eq!(last_data(&game), "P+");
    }
}
