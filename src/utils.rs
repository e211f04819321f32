use crate::board::{Board, Cell, Piece, SpecialKind, HEIGHT, WIDTH};
use crate::error::BoardParseError;

/// Parses rows of whitespace-separated tokens into a `Board` with no obstacles.
///
/// Exactly `HEIGHT` rows of exactly `WIDTH` tokens are expected. The first row is the
/// **top** of the board (`y = HEIGHT - 1`) and the last row is the bottom (`y = 0`), so the
/// text reads the way the board is drawn.
///
/// Valid tokens are:
/// - `.`: an empty cell
/// - a digit `0..=9` below `type_count`: a plain piece of that base type
/// - a digit followed by `h`, `v`, `w` or `b`: a piece carrying `LineHorizontal`,
///   `LineVertical`, `Wrapped` or `ColorBomb`
///
/// `type_count` is clamped the same way `Board::new_empty` clamps it.
///
/// # Examples
/// ```
/// use match3_engine::utils::board_from_str_array;
/// use match3_engine::board::{Cell, Piece, SpecialKind};
///
/// let rows = [
///     "0 1 2 3 4 5 0 1",
///     ". . . . . . . .",
///     ". . . . . . . .",
///     ". . . . . . . .",
///     ". . . . . . . .",
///     ". . . . . . . .",
///     ". . . . . . . .",
///     "2b . . . . . . 3h",
/// ];
/// let board = board_from_str_array(&rows, 6).unwrap();
/// assert_eq!(board.get(Cell::new(0, 7)), Some(Piece::plain(0)));
/// assert_eq!(board.get(Cell::new(0, 0)), Some(Piece::new(2, SpecialKind::ColorBomb)));
/// assert_eq!(board.get(Cell::new(7, 0)), Some(Piece::new(3, SpecialKind::LineHorizontal)));
/// assert_eq!(board.get(Cell::new(1, 0)), None);
///
/// assert!(board_from_str_array(&rows[..3], 6).is_err());
/// ```
pub fn board_from_str_array(rows: &[&str], type_count: u8) -> Result<Board, BoardParseError> {
    if rows.len() != HEIGHT {
        return Err(BoardParseError::RowCount {
            expected: HEIGHT,
            found: rows.len(),
        });
    }

    let mut board = Board::new_empty(type_count);
    let type_count = board.type_count();

    for (row, line) in rows.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != WIDTH {
            return Err(BoardParseError::RowLength {
                row,
                expected: WIDTH,
                found: tokens.len(),
            });
        }

        let y = HEIGHT - 1 - row;
        for (x, token) in tokens.into_iter().enumerate() {
            let Some(piece) = parse_token(token, row, x)? else {
                continue;
            };
            if piece.base >= type_count {
                return Err(BoardParseError::BaseOutOfRange {
                    base: piece.base,
                    type_count,
                    row,
                    col: x,
                });
            }
            board.set_piece_value(Cell::new(x, y), piece);
        }
    }
    Ok(board)
}

fn parse_token(token: &str, row: usize, col: usize) -> Result<Option<Piece>, BoardParseError> {
    let bad_token = || BoardParseError::BadToken {
        token: token.to_string(),
        row,
        col,
    };

    if token == "." {
        return Ok(None);
    }

    let mut chars = token.chars();
    let base = chars
        .next()
        .and_then(|c| c.to_digit(10))
        .ok_or_else(bad_token)? as u8;
    let special = match chars.next() {
        None => SpecialKind::None,
        Some(c) => SpecialKind::from_char(c).ok_or_else(bad_token)?,
    };
    if chars.next().is_some() {
        return Err(bad_token());
    }
    Ok(Some(Piece::new(base, special)))
}

/// Renders a board in the text format accepted by `board_from_str_array`.
/// Obstacle layers are not part of the format.
pub fn board_to_str_rows(board: &Board) -> Vec<String> {
    (0..HEIGHT)
        .rev()
        .map(|y| {
            (0..WIDTH)
                .map(|x| match board.get(Cell::new(x, y)) {
                    None => ".".to_string(),
                    Some(piece) => match piece.special.to_char() {
                        None => piece.base.to_string(),
                        Some(marker) => format!("{}{}", piece.base, marker),
                    },
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
