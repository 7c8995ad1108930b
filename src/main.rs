//! Jieqi rules CLI
//!
//! 命令行界面，用于检查局面和走法
//!
//! 支持两种模式：
//! 1. 单次命令模式：每次执行一个命令
//! 2. Server 模式：长驻进程，持有一局对局，通过 stdin/stdout 逐行交换 JSON

use clap::{Parser, Subcommand};
use jieqi_core::{
    convert_format, parse_fen, uci_to_chinese, Board, FenFormat, FlipMode, GameConfig, GameNotation,
    GameState, MoveOutcome, PieceKind, PoolDelta, RecordContext, Side, START_FEN,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};

#[derive(Parser)]
#[command(name = "jieqi")]
#[command(about = "Jieqi (dark Xiangqi) rules engine", long_about = None)]
struct Cli {
    /// 配置文件（JSON，GameConfig）
    #[arg(long, global = true)]
    config: Option<String>,

    /// 翻子模式 (random, free)
    #[arg(long, global = true)]
    flip_mode: Option<String>,

    /// 随机数种子
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// AI 执哪一方 (red, black)，启用引擎视角
    #[arg(long, global = true)]
    ai_side: Option<String>,

    /// 输出旧格式 FEN
    #[arg(long, global = true)]
    old_fen: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 获取合法走法
    Moves {
        /// FEN 字符串
        #[arg(long)]
        fen: String,
    },

    /// 转换 FEN 格式
    Convert {
        /// FEN 字符串
        #[arg(long)]
        fen: String,

        /// 转为旧格式（默认转为新格式）
        #[arg(long)]
        old: bool,
    },

    /// 从局面开始走子，输出最终局面和每步记录
    Play {
        /// FEN 或局面命令（默认标准开局）
        #[arg(long)]
        fen: Option<String>,

        /// 走法列表
        moves: Vec<String>,

        /// JSON 输出（棋谱格式）
        #[arg(long)]
        json: bool,
    },

    /// 中文记谱
    Chinese {
        /// FEN 字符串
        #[arg(long)]
        fen: Option<String>,

        /// 走法列表
        moves: Vec<String>,
    },

    /// 检查 FEN 与暗子池是否一致
    Validate {
        /// FEN 字符串
        #[arg(long)]
        fen: String,
    },

    /// 启动 server 模式（stdin/stdout 通信）
    Server,
}

// Server 模式的请求和响应结构
#[derive(Serialize, Deserialize, Default)]
struct ServerRequest {
    cmd: String,
    #[serde(default)]
    fen: Option<String>,
    #[serde(default, rename = "move")]
    mv: Option<String>,
    /// 翻子或调整的兵种字母
    #[serde(default)]
    piece: Option<String>,
    /// "+" 或 "-"
    #[serde(default)]
    delta: Option<String>,
    /// 调整被吃暗子池
    #[serde(default)]
    captured: bool,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    notation: Option<GameNotation>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Serialize, Deserialize, Default)]
struct ServerResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    choices: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    legal_moves: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notation: Option<GameNotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServerResponse {
    fn success_fen(fen: String) -> Self {
        Self {
            ok: true,
            fen: Some(fen),
            ..Default::default()
        }
    }

    fn success_legal_moves(legal_moves: Vec<String>) -> Self {
        Self {
            ok: true,
            legal_moves: Some(legal_moves),
            ..Default::default()
        }
    }

    fn error(msg: &str) -> Self {
        Self {
            ok: false,
            error: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

fn parse_side(s: &str) -> Result<Side, String> {
    match s {
        "red" | "w" => Ok(Side::Red),
        "black" | "b" => Ok(Side::Black),
        _ => Err(format!("Invalid side: {}", s)),
    }
}

fn parse_flip_mode(s: &str) -> Result<FlipMode, String> {
    match s {
        "random" => Ok(FlipMode::Random),
        "free" => Ok(FlipMode::Free),
        _ => Err(format!("Invalid flip mode: {}", s)),
    }
}

fn parse_piece(s: Option<&str>) -> Result<PieceKind, String> {
    let s = s.ok_or("Missing piece")?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => PieceKind::from_fen_char(c).ok_or(format!("Invalid piece: {}", s)),
        _ => Err(format!("Invalid piece: {}", s)),
    }
}

/// 配置文件 + 命令行覆盖
fn load_config(cli: &Cli) -> Result<GameConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
            serde_json::from_str(&text).map_err(|e| format!("{}: {}", path, e))?
        }
        None => GameConfig::default(),
    };

    if let Some(mode) = &cli.flip_mode {
        config.flip_mode = parse_flip_mode(mode)?;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(side) = &cli.ai_side {
        config.ai_side = Some(parse_side(side)?);
    }
    if cli.old_fen {
        config.fen_format = FenFormat::Old;
    }
    debug!("Config: {:?}", config);
    Ok(config)
}

fn exit_with(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(&cli).unwrap_or_else(|e| exit_with(e));

    match cli.command {
        Commands::Moves { fen } => {
            let mut game = GameState::new(config);
            if let Err(e) = game.load_fen(&fen) {
                exit_with(e);
            }
            let moves = game.all_legal_moves();
            println!("Legal moves ({}):", moves.len());
            for mv in &moves {
                println!("  {}", mv);
            }
        }

        Commands::Convert { fen, old } => {
            let target = if old { FenFormat::Old } else { FenFormat::New };
            match convert_format(&fen, target) {
                Ok(converted) => println!("{}", converted),
                Err(e) => exit_with(e),
            }
        }

        Commands::Play { fen, moves, json } => {
            let mut game = GameState::new(config);
            if let Some(fen) = fen {
                if let Err(e) = game.set_position(&fen) {
                    exit_with(e);
                }
            }

            for mv in &moves {
                match game.play_uci(mv, RecordContext::default()) {
                    Ok(MoveOutcome::Completed { record }) => {
                        if !json {
                            println!("{} -> {}", mv, record);
                        }
                    }
                    Ok(MoveOutcome::AwaitingFlip { choices }) => {
                        let choices: Vec<String> = choices.iter().map(|k| k.to_string()).collect();
                        exit_with(format!("{} needs a flip choice among {}", mv, choices.join(",")));
                    }
                    Err(e) => exit_with(format!("{}: {}", mv, e)),
                }
            }

            if json {
                let notation = game.generate_game_notation(None);
                match notation.to_json_pretty() {
                    Ok(text) => println!("{}", text),
                    Err(e) => exit_with(e),
                }
            } else {
                println!("FEN: {}", game.generate_fen());
                println!("Result: {}", game.determine_game_result().to_notation_str());
            }
        }

        Commands::Chinese { fen, moves } => {
            let fen = fen.unwrap_or_else(|| START_FEN.to_string());
            match uci_to_chinese(&fen, &moves) {
                Ok(lines) => {
                    for (mv, line) in moves.iter().zip(&lines) {
                        println!("{}\t{}", mv, line);
                    }
                }
                Err(e) => exit_with(e),
            }
        }

        Commands::Validate { fen } => {
            let state = parse_fen(&fen).unwrap_or_else(|e| exit_with(e));
            let board = Board::from_fen(&fen).unwrap_or_else(|e| exit_with(e));
            println!("Side to move: {}", state.side_to_move);
            println!("Pool: {}", state.pool);
            println!("Captured pool: {}", state.captured_pool);
            match jieqi_core::pool::validate(
                &board.revealed_counts(),
                board.dark_counts(),
                &state.pool,
                &state.captured_pool,
            ) {
                Ok(()) => println!("OK"),
                Err(e) => exit_with(e),
            }
        }

        Commands::Server => {
            run_server(GameState::new(config));
        }
    }
}

/// Server 模式主循环
/// 从 stdin 读取 JSON 请求，返回 JSON 响应到 stdout
fn run_server(mut game: GameState) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    info!("Server started");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        // 空行跳过
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ServerRequest>(&line) {
            Ok(request) if request.cmd == "quit" => break,
            Ok(request) => handle_request(&mut game, request),
            Err(e) => ServerResponse::error(&format!("Invalid JSON: {}", e)),
        };

        match serde_json::to_string(&response) {
            Ok(text) => println!("{}", text),
            Err(e) => println!("{{\"ok\":false,\"error\":\"{}\"}}", e),
        }
        let _ = stdout.flush();
    }
    info!("Server stopped");
}

/// 处理一条请求
fn handle_request(game: &mut GameState, request: ServerRequest) -> ServerResponse {
    let result = match request.cmd.as_str() {
        "new" => {
            game.setup_new_game();
            Ok(ServerResponse::success_fen(game.generate_fen()))
        }
        "position" => handle_position(game, &request),
        "move" => handle_move(game, &request),
        "flip" => handle_flip(game, &request),
        "cancel" => {
            if game.cancel_pending_flip() {
                Ok(ServerResponse::success_fen(game.generate_fen()))
            } else {
                Err("No flip is pending".to_string())
            }
        }
        "undo" => {
            if game.undo_last_move() {
                Ok(ServerResponse::success_fen(game.generate_fen()))
            } else {
                Err("Nothing to undo".to_string())
            }
        }
        "replay" => {
            let index = request.index.unwrap_or(0);
            game.replay_to_move(index)
                .map(|_| ServerResponse::success_fen(game.generate_fen()))
                .map_err(|e| e.to_string())
        }
        "fen" => Ok(ServerResponse::success_fen(game.generate_fen())),
        "engine_fen" => Ok(ServerResponse::success_fen(game.generate_fen_for_engine())),
        "moves" => Ok(ServerResponse::success_legal_moves(game.all_legal_moves())),
        "result" => Ok(ServerResponse {
            ok: true,
            result: Some(game.determine_game_result().to_notation_str().to_string()),
            ..Default::default()
        }),
        "export" => Ok(ServerResponse {
            ok: true,
            notation: Some(game.generate_game_notation(request.date.clone())),
            ..Default::default()
        }),
        "import" => match request.notation {
            Some(notation) => game
                .apply_game_notation(notation)
                .map(|_| ServerResponse::success_fen(game.generate_fen()))
                .map_err(|e| e.to_string()),
            None => Err("Missing notation".to_string()),
        },
        "adjust" => handle_adjust(game, &request),
        "flip_board" => {
            game.toggle_orientation();
            Ok(ServerResponse::success_fen(game.generate_fen()))
        }
        _ => Err(format!("Unknown command: {}", request.cmd)),
    };

    result.unwrap_or_else(|e| ServerResponse::error(&e))
}

/// 处理 position 命令
fn handle_position(game: &mut GameState, request: &ServerRequest) -> Result<ServerResponse, String> {
    let input = request.fen.as_deref().ok_or("Missing fen")?;
    let played = game.set_position(input).map_err(|e| e.to_string())?;
    debug!("Position set, {} moves played", played);
    Ok(ServerResponse::success_fen(game.generate_fen()))
}

/// 处理 move 命令
fn handle_move(game: &mut GameState, request: &ServerRequest) -> Result<ServerResponse, String> {
    let mv = request.mv.as_deref().ok_or("Missing move")?;
    match game.play_uci(mv, RecordContext::default()) {
        Ok(MoveOutcome::Completed { record }) => Ok(ServerResponse {
            ok: true,
            fen: Some(game.generate_fen()),
            record: Some(record),
            ..Default::default()
        }),
        Ok(MoveOutcome::AwaitingFlip { choices }) => Ok(ServerResponse {
            ok: true,
            choices: Some(choices.iter().map(|k| k.to_string()).collect()),
            ..Default::default()
        }),
        Err(e) => Err(e.to_string()),
    }
}

/// 处理 flip 命令（自由翻子的选择）
fn handle_flip(game: &mut GameState, request: &ServerRequest) -> Result<ServerResponse, String> {
    let kind = parse_piece(request.piece.as_deref())?;
    let record = game.resolve_flip(kind).map_err(|e| e.to_string())?;
    Ok(ServerResponse {
        ok: true,
        fen: Some(game.generate_fen()),
        record: Some(record),
        ..Default::default()
    })
}

/// 处理 adjust 命令（手动调整暗子池）
fn handle_adjust(game: &mut GameState, request: &ServerRequest) -> Result<ServerResponse, String> {
    let kind = parse_piece(request.piece.as_deref())?;
    let delta = match request.delta.as_deref() {
        Some("+") => PoolDelta::Add,
        Some("-") => PoolDelta::Remove,
        other => return Err(format!("Invalid delta: {:?}", other)),
    };

    let result = if request.captured {
        game.adjust_captured_unrevealed_count(kind, delta)
    } else {
        game.adjust_unrevealed_count(kind, delta)
    };
    result.map_err(|e| e.to_string())?;
    Ok(ServerResponse::success_fen(game.generate_fen()))
}
