use remote_tetris::core::{decode, encode, BoardFormat, CodecError};
use remote_tetris::types::{Board, BOARD_HEIGHT, BOARD_WIDTH};

/// Deterministic pseudo-random boards for round trips.
fn boards() -> Vec<Board> {
    let mut out = vec![Board::new()];
    let mut full = Board::new();
    for r in 0..BOARD_HEIGHT {
        for c in 0..BOARD_WIDTH {
            full.set(r, c, true);
        }
    }
    out.push(full);

    let mut seed = 0x2545_f491_u32;
    for _ in 0..8 {
        let mut b = Board::new();
        for r in 0..BOARD_HEIGHT {
            for c in 0..BOARD_WIDTH {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                b.set(r, c, seed % 3 == 0);
            }
        }
        out.push(b);
    }
    out
}

#[test]
fn every_format_round_trips() {
    for board in boards() {
        for format in BoardFormat::ALL {
            assert_eq!(decode(&encode(&board, format)), Ok(board), "{format:?}");
        }
    }
}

#[test]
fn top_row_scenario() {
    let mut rows = vec![vec![false; 10]; 19];
    rows.push([vec![true; 5], vec![false; 5]].concat());
    let board = decode(&serde_json::to_string(&rows).unwrap()).unwrap();

    assert_eq!(board.filled_count(), 5);
    for c in 0..BOARD_WIDTH {
        assert_eq!(board.get(19, c), c < 5);
    }
}

#[test]
fn last_glyph_is_bottom_right() {
    let mut tokens = vec!["□"; 200];
    tokens[199] = "■";
    let board = decode(&tokens.join(" ")).unwrap();
    assert!(board.get(0, 9));
    assert_eq!(board.filled_count(), 1);
}

#[test]
fn shape_errors_are_malformed() {
    let too_many_rows = serde_json::to_string(&vec![vec![false; 10]; 23]).unwrap();
    assert!(matches!(decode(&too_many_rows), Err(CodecError::MalformedBoard(_))));
    assert!(matches!(decode(&"■ ".repeat(230)), Err(CodecError::MalformedBoard(_))));
    assert!(matches!(decode("42"), Err(CodecError::UnsupportedFormat(_))));
}
