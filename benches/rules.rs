//! 规则引擎基准测试

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jieqi_core::test_positions::{MIDGAME, START};
use jieqi_core::{parse_fen, Board, FenFormat, GameConfig, GameState, Side};

fn bench_legal_moves_start(c: &mut Criterion) {
    let board = Board::from_fen(START).unwrap();
    c.bench_function("legal_moves_start", |b| {
        b.iter(|| black_box(board.all_legal_moves(Side::Red)))
    });
}

fn bench_legal_moves_midgame(c: &mut Criterion) {
    let board = Board::from_fen(MIDGAME).unwrap();
    c.bench_function("legal_moves_midgame", |b| {
        b.iter(|| black_box(board.all_legal_moves(Side::Red)))
    });
}

fn bench_fen_round_trip(c: &mut Criterion) {
    c.bench_function("fen_round_trip", |b| {
        b.iter(|| {
            let state = parse_fen(black_box(MIDGAME)).unwrap();
            black_box(state.to_fen(FenFormat::Old))
        })
    });
}

fn bench_play_and_undo(c: &mut Criterion) {
    c.bench_function("play_and_undo", |b| {
        b.iter(|| {
            let mut game = GameState::new(GameConfig {
                seed: Some(1),
                ..Default::default()
            });
            game.play_move_from_uci("h2e2");
            game.play_move_from_uci("h7e7");
            game.undo_last_move();
            black_box(game.generate_fen())
        })
    });
}

criterion_group!(
    benches,
    bench_legal_moves_start,
    bench_legal_moves_midgame,
    bench_fen_round_trip,
    bench_play_and_undo,
);
criterion_main!(benches);
