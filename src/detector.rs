//! Stateless match analysis over a `Board`.
//!
//! - `find_match_groups`: maximal horizontal and vertical runs of three or more equal base types.
//! - `has_any_possible_move`: whether any single adjacent swap produces a match.
//! - `shuffle_board`: rearranges the base types into a match-free board with at least one move.
//! - `find_best_move_hint`: the swap producing the most matched cells.
use crate::board::{Board, Cell, Piece, HEIGHT, WIDTH};
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle permutations tried before the last one is kept regardless.
pub const SHUFFLE_MAX_RETRIES: usize = 30;

/// Minimum run length that counts as a match.
pub const MIN_MATCH_LEN: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Shape flag of a match group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchShape {
    /// A straight run that shares no cell with any other run.
    Line,
    /// A run crossing another run (T or L intersection).
    LShape,
}

/// One maximal run of same-base-type pieces.
///
/// Cells are ordered along the run: left to right for horizontal runs, bottom to top for
/// vertical runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchGroup {
    pub cells: Vec<Cell>,
    pub orientation: Orientation,
    pub shape: MatchShape,
}

impl MatchGroup {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// The middle cell of the run, used as the default special-creation cell.
    pub fn middle(&self) -> Cell {
        self.cells[self.cells.len() / 2]
    }

    fn shares_cell_with(&self, other: &MatchGroup) -> bool {
        self.cells.iter().any(|c| other.contains(*c))
    }
}

/// Best swap found by `find_best_move_hint`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveHint {
    /// `true` if the swap produces at least one matched cell.
    pub found: bool,
    pub from: Cell,
    pub to: Cell,
    /// Total number of matched cells over every group the swap produces.
    pub score: usize,
}

/// Finds every match group on the board.
///
/// Rows are scanned bottom to top, then columns left to right. Special kinds are ignored
/// for matching and empty cells break runs. Every pair of groups sharing at least one cell
/// is marked `MatchShape::LShape`; all other groups stay `MatchShape::Line`.
///
/// # Examples
/// ```
/// use match3_engine::detector::{find_match_groups, MatchShape, Orientation};
/// use match3_engine::utils::board_from_str_array;
///
/// let board = board_from_str_array(&[
///     ". . . . . . . .",
///     ". . . . . . . .",
///     ". . . . . . . .",
///     ". . . . . . . .",
///     ". . . . . . . .",
///     ". . . . . . . .",
///     ". . . . . . . .",
///     "1 1 1h 2 . . . .",
/// ], 6).unwrap();
/// let groups = find_match_groups(&board);
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].len(), 3);
/// assert_eq!(groups[0].orientation, Orientation::Horizontal);
/// assert_eq!(groups[0].shape, MatchShape::Line);
/// ```
pub fn find_match_groups(board: &Board) -> Vec<MatchGroup> {
    let mut groups = Vec::new();

    for y in 0..HEIGHT {
        collect_runs(
            board,
            (0..WIDTH).map(|x| Cell::new(x, y)).collect(),
            Orientation::Horizontal,
            &mut groups,
        );
    }
    for x in 0..WIDTH {
        collect_runs(
            board,
            (0..HEIGHT).map(|y| Cell::new(x, y)).collect(),
            Orientation::Vertical,
            &mut groups,
        );
    }

    for i in 0..groups.len() {
        for j in (i + 1)..groups.len() {
            if groups[i].shares_cell_with(&groups[j]) {
                groups[i].shape = MatchShape::LShape;
                groups[j].shape = MatchShape::LShape;
            }
        }
    }
    groups
}

fn collect_runs(
    board: &Board,
    line: Vec<Cell>,
    orientation: Orientation,
    groups: &mut Vec<MatchGroup>,
) {
    let mut start = 0;
    while start < line.len() {
        let Some(base) = board.base_at(line[start]) else {
            start += 1;
            continue;
        };
        let mut len = 1;
        while start + len < line.len() && board.base_at(line[start + len]) == Some(base) {
            len += 1;
        }
        if len >= MIN_MATCH_LEN {
            groups.push(MatchGroup {
                cells: line[start..start + len].to_vec(),
                orientation,
                shape: MatchShape::Line,
            });
        }
        start += len;
    }
}

/// Returns `true` if the two cells are orthogonal neighbours (Manhattan distance 1).
///
/// # Examples
/// ```
/// use match3_engine::board::Cell;
/// use match3_engine::detector::is_adjacent;
/// assert!(is_adjacent(Cell::new(2, 2), Cell::new(2, 3)));
/// assert!(!is_adjacent(Cell::new(2, 2), Cell::new(3, 3)));
/// assert!(!is_adjacent(Cell::new(2, 2), Cell::new(2, 2)));
/// ```
pub fn is_adjacent(a: Cell, b: Cell) -> bool {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y) == 1
}

/// Every horizontally and vertically adjacent pair, scanning columns left to right and
/// each column bottom to top; for each cell the right neighbour comes before the upper one.
fn adjacent_pairs() -> impl Iterator<Item = (Cell, Cell)> {
    (0..WIDTH).flat_map(|x| {
        (0..HEIGHT).flat_map(move |y| {
            let from = Cell::new(x, y);
            [from.offset(1, 0), from.offset(0, 1)]
                .into_iter()
                .flatten()
                .map(move |to| (from, to))
        })
    })
}

/// Swaps `a` and `b` on `probe`, runs `f`, and swaps them back.
fn with_swapped<T>(probe: &mut Board, a: Cell, b: Cell, f: impl FnOnce(&Board) -> T) -> T {
    probe.swap_pieces(a, b);
    let result = f(probe);
    probe.swap_pieces(a, b);
    result
}

/// Returns `true` if swapping `a` and `b` would create at least one match group.
pub fn would_swap_match(board: &Board, a: Cell, b: Cell) -> bool {
    let mut probe = board.clone();
    with_swapped(&mut probe, a, b, |p| !find_match_groups(p).is_empty())
}

/// Returns `true` if at least one adjacent swap produces a match.
///
/// Locked cells are not excluded here; the check only asks whether the arrangement of base
/// types admits a match.
pub fn has_any_possible_move(board: &Board) -> bool {
    let mut probe = board.clone();
    adjacent_pairs()
        .any(|(a, b)| with_swapped(&mut probe, a, b, |p| !find_match_groups(p).is_empty()))
}

/// Rearranges the board's base types at random, stripping every special kind.
///
/// Pieces stay on the cells that currently hold pieces and obstacle layers are untouched.
/// A permutation is accepted as soon as it has no immediate match and at least one possible
/// move. After `SHUFFLE_MAX_RETRIES` failed permutations the last one is kept as-is.
///
/// # Returns
/// `true` if the kept permutation satisfies both conditions, `false` if the retry budget
/// ran out (or the board holds no pieces at all).
pub fn shuffle_board(board: &mut Board, rng: &mut impl Rng) -> bool {
    let occupied: Vec<Cell> = Cell::all().filter(|&c| board.get(c).is_some()).collect();
    let mut pool: Vec<u8> = occupied
        .iter()
        .filter_map(|&c| board.base_at(c))
        .collect();
    if pool.is_empty() {
        return false;
    }

    for _ in 0..SHUFFLE_MAX_RETRIES {
        pool.shuffle(rng);
        for (&cell, &base) in occupied.iter().zip(pool.iter()) {
            board.set_piece_value(cell, Piece::plain(base));
        }
        if find_match_groups(board).is_empty() && has_any_possible_move(board) {
            return true;
        }
    }
    false
}

/// Finds the swap that matches the most cells.
///
/// Pairs involving a locked cell are skipped. Pairs are scanned in the same order as
/// `has_any_possible_move`; on ties the first pair found wins. When no unlocked pair
/// exists the returned hint has `found == false` and `score == 0`.
pub fn find_best_move_hint(board: &Board) -> MoveHint {
    let mut probe = board.clone();
    let mut best: Option<MoveHint> = None;

    for (from, to) in adjacent_pairs() {
        if board.is_locked(from) || board.is_locked(to) {
            continue;
        }
        let score = with_swapped(&mut probe, from, to, |p| {
            find_match_groups(p).iter().map(MatchGroup::len).sum::<usize>()
        });
        if best.map_or(true, |h| score > h.score) {
            best = Some(MoveHint {
                found: score > 0,
                from,
                to,
                score,
            });
        }
    }

    best.unwrap_or(MoveHint {
        found: false,
        from: Cell::new(0, 0),
        to: Cell::new(0, 0),
        score: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SpecialKind;
    use crate::utils::board_from_str_array;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// Match-free, move-free filler: base type `(x + 2y) % 6` never repeats along a row
    /// or column and no swap can line three up.
    fn stripes() -> Board {
        board_from_str_array(
            &[
                "2 3 4 5 0 1 2 3",
                "0 1 2 3 4 5 0 1",
                "4 5 0 1 2 3 4 5",
                "2 3 4 5 0 1 2 3",
                "0 1 2 3 4 5 0 1",
                "4 5 0 1 2 3 4 5",
                "2 3 4 5 0 1 2 3",
                "0 1 2 3 4 5 0 1",
            ],
            6,
        )
        .unwrap()
    }

    #[test]
    fn test_stripes_have_no_matches_and_no_moves() {
        let board = stripes();
        assert!(find_match_groups(&board).is_empty());
        assert!(!has_any_possible_move(&board));
        assert!(!find_best_move_hint(&board).found);
    }

    #[test]
    fn test_find_match_groups_horizontal_and_vertical() {
        let board = board_from_str_array(
            &[
                "2 3 4 5 0 1 2 3",
                "0 1 2 3 4 5 0 1",
                "4 5 0 1 2 3 4 5",
                "2 3 4 5 0 1 2 3",
                "0 1 2 3 4 5 0 5",
                "4 5 0 1 2 3 4 1",
                "2 3 4 5 0 1 2 1",
                "3 3 3 3 4 5 0 1",
            ],
            6,
        )
        .unwrap();
        let groups = find_match_groups(&board);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].orientation, Orientation::Horizontal);
        assert_eq!(
            groups[0].cells,
            vec![
                Cell::new(0, 0),
                Cell::new(1, 0),
                Cell::new(2, 0),
                Cell::new(3, 0)
            ]
        );
        assert_eq!(groups[0].shape, MatchShape::Line);

        assert_eq!(groups[1].orientation, Orientation::Vertical);
        assert_eq!(
            groups[1].cells,
            vec![Cell::new(7, 0), Cell::new(7, 1), Cell::new(7, 2)]
        );
        assert_eq!(groups[1].shape, MatchShape::Line);
    }

    #[test]
    fn test_find_match_groups_marks_intersections() {
        let board = board_from_str_array(
            &[
                "2 3 4 5 0 1 2 3",
                "0 1 2 3 4 5 0 1",
                "4 5 0 1 2 3 4 5",
                "2 3 4 5 0 1 2 3",
                "0 1 2 3 4 5 0 1",
                "4 5 3 1 2 3 4 5",
                "2 3 3 5 0 1 2 3",
                "3 3 3 1 4 5 0 1",
            ],
            6,
        )
        .unwrap();
        let groups = find_match_groups(&board);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.shape == MatchShape::LShape));
        assert_eq!(groups[0].len() + groups[1].len(), 6);
    }

    #[test]
    fn test_find_match_groups_ignores_specials_and_gaps() {
        let board = board_from_str_array(
            &[
                ". . . . . . . .",
                ". . . . . . . .",
                ". . . . . . . .",
                ". . . . . . . .",
                ". . . . . . . .",
                ". . . . . . . .",
                ". . . . . . . .",
                "1 1 . 1 2w 2b 2 .",
            ],
            6,
        )
        .unwrap();
        let groups = find_match_groups(&board);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].cells,
            vec![Cell::new(4, 0), Cell::new(5, 0), Cell::new(6, 0)]
        );
        assert_eq!(
            board.get(groups[0].cells[0]).map(|p| p.special),
            Some(SpecialKind::Wrapped)
        );
    }

    #[test]
    fn test_is_adjacent() {
        assert!(is_adjacent(Cell::new(2, 2), Cell::new(2, 3)));
        assert!(is_adjacent(Cell::new(2, 2), Cell::new(1, 2)));
        assert!(!is_adjacent(Cell::new(2, 2), Cell::new(3, 3)));
        assert!(!is_adjacent(Cell::new(0, 0), Cell::new(0, 2)));
    }

    #[test]
    fn test_has_any_possible_move_finds_single_swap() {
        let mut board = stripes();
        // Bottom row becomes 0 0 2 0 ...: swapping (2,0) with (3,0) lines up 0 0 0.
        board.set_piece_value(Cell::new(1, 0), Piece::plain(0));
        board.set_piece_value(Cell::new(3, 0), Piece::plain(0));
        assert!(find_match_groups(&board).is_empty());
        assert!(has_any_possible_move(&board));
        assert!(would_swap_match(&board, Cell::new(2, 0), Cell::new(3, 0)));
        assert!(!would_swap_match(&board, Cell::new(5, 5), Cell::new(5, 6)));
    }

    #[test]
    fn test_has_any_possible_move_leaves_board_untouched() {
        let mut rng = SmallRng::seed_from_u64(21);
        let board = Board::generate(6, &mut rng);
        let before = board.clone();
        has_any_possible_move(&board);
        find_best_move_hint(&board);
        assert_eq!(board, before);
    }

    #[test]
    fn test_find_best_move_hint_prefers_larger_match() {
        let mut board = stripes();
        // Row 0: 0 0 2 0 -> swapping (2,0)/(3,0) gives three.
        board.set_piece_value(Cell::new(1, 0), Piece::plain(0));
        board.set_piece_value(Cell::new(3, 0), Piece::plain(0));
        // Row 4: 4 4 5 4 4 -> swapping (2,4) with (2,5) gives five when (2,5) holds a 4.
        board.set_piece_value(Cell::new(0, 4), Piece::plain(4));
        board.set_piece_value(Cell::new(1, 4), Piece::plain(4));
        board.set_piece_value(Cell::new(2, 4), Piece::plain(5));
        board.set_piece_value(Cell::new(3, 4), Piece::plain(4));
        board.set_piece_value(Cell::new(4, 4), Piece::plain(4));
        board.set_piece_value(Cell::new(2, 5), Piece::plain(4));
        assert!(find_match_groups(&board).is_empty());

        let hint = find_best_move_hint(&board);
        assert!(hint.found);
        assert_eq!(hint.from, Cell::new(2, 4));
        assert_eq!(hint.to, Cell::new(2, 5));
        assert_eq!(hint.score, 5);
    }

    #[test]
    fn test_find_best_move_hint_skips_locked_cells() {
        let mut board = stripes();
        board.set_piece_value(Cell::new(1, 0), Piece::plain(0));
        board.set_piece_value(Cell::new(3, 0), Piece::plain(0));
        board.set_chain(Cell::new(3, 0), 1);

        let hint = find_best_move_hint(&board);
        assert!(!hint.found);
        assert_eq!(hint.score, 0);
        // The arrangement still admits a move even though the hint cannot use it.
        assert!(has_any_possible_move(&board));
    }

    #[test]
    fn test_shuffle_board_produces_safe_board() {
        let mut template = stripes();
        template.set_piece_value(Cell::new(0, 0), Piece::new(0, SpecialKind::ColorBomb));
        template.set_ice(Cell::new(4, 4), 2);

        let mut before_counts = [0usize; 6];
        for cell in Cell::all() {
            before_counts[template.base_at(cell).unwrap() as usize] += 1;
        }

        let mut successes = 0;
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut board = template.clone();
            let safe = shuffle_board(&mut board, &mut rng);
            if safe {
                successes += 1;
                assert!(find_match_groups(&board).is_empty());
                assert!(has_any_possible_move(&board));
            }
            assert_eq!(board.ice(Cell::new(4, 4)), 2);

            let mut after_counts = [0usize; 6];
            for cell in Cell::all() {
                let piece = board.get(cell).unwrap();
                assert!(!piece.is_special());
                after_counts[piece.base as usize] += 1;
            }
            assert_eq!(before_counts, after_counts);
        }
        assert!(successes > 0, "no seed produced a safe shuffle");
    }

    #[test]
    fn test_shuffle_board_reports_exhausted_budget() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut board = Board::new_empty(3);
        for cell in Cell::all() {
            board.set_piece_value(cell, Piece::plain(1));
        }
        assert!(!shuffle_board(&mut board, &mut rng));
        assert!(board.is_full());

        let mut empty = Board::new_empty(6);
        assert!(!shuffle_board(&mut empty, &mut rng));
    }
}
