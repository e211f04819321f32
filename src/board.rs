//! Board state for the match-3 engine.
//!
//! This module defines the data the rest of the engine operates on:
//! - `Cell`: a coordinate on the fixed `WIDTH` x `HEIGHT` grid, with `y = 0` at the bottom.
//! - `SpecialKind` and `Piece`: the base type ("color") of a piece plus any power-up it carries.
//! - `Board`: the grid of pieces and the two obstacle layers (ice and chain), together with
//!   the primitive mutators (swap, remove, fill, gravity, obstacle damage).
//!
//! The board performs no match logic of its own; see `detector` and `cascade` for that.
//! Every mutator silently ignores out-of-range cells.
use rand::Rng;
use std::fmt;

/// Number of columns on the board.
pub const WIDTH: usize = 8;
/// Number of rows on the board.
pub const HEIGHT: usize = 8;

/// Lowest accepted number of distinct base types.
pub const MIN_TYPE_COUNT: u8 = 3;
/// Highest accepted number of distinct base types.
pub const MAX_TYPE_COUNT: u8 = 6;

/// Multiplier separating the base type from the special rank in an encoded piece value.
pub const SPECIAL_MULTIPLIER: i32 = 10;

/// Value used for an empty cell in the integer encoding.
pub const EMPTY_VALUE: i32 = -1;

/// Candidate draws per cell during `Board::init` before a possibly-matching type is accepted.
pub const INIT_MAX_ATTEMPTS: usize = 20;

/// Random draws allowed per obstacle layer in `Board::place_obstacles`.
pub const OBSTACLE_PLACEMENT_GUARD: usize = 500;

/// A coordinate on the board.
///
/// `x` is the column (0 = left) and `y` is the row (0 = bottom). Gravity pulls pieces
/// towards `y = 0` and refills enter from `y = HEIGHT - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    /// Creates a cell. No bounds check is performed; see `Cell::in_bounds`.
    pub const fn new(x: usize, y: usize) -> Self {
        Cell { x, y }
    }

    /// Returns `true` if the cell lies on the board.
    pub fn in_bounds(&self) -> bool {
        self.x < WIDTH && self.y < HEIGHT
    }

    /// Returns the cell displaced by `(dx, dy)`, or `None` if it would leave the board.
    ///
    /// # Examples
    /// ```
    /// use match3_engine::board::{Cell, WIDTH};
    /// assert_eq!(Cell::new(0, 0).offset(1, 0), Some(Cell::new(1, 0)));
    /// assert_eq!(Cell::new(0, 0).offset(-1, 0), None);
    /// assert_eq!(Cell::new(WIDTH - 1, 0).offset(1, 0), None);
    /// ```
    pub fn offset(&self, dx: isize, dy: isize) -> Option<Cell> {
        let nx = self.x as isize + dx;
        let ny = self.y as isize + dy;
        if nx < 0 || ny < 0 || nx >= WIDTH as isize || ny >= HEIGHT as isize {
            return None;
        }
        Some(Cell::new(nx as usize, ny as usize))
    }

    /// The up-to-four orthogonal neighbours that lie on the board.
    pub fn neighbors(self) -> impl Iterator<Item = Cell> {
        const DELTAS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        DELTAS
            .into_iter()
            .filter_map(move |(dx, dy)| self.offset(dx, dy))
    }

    /// Iterates over every board cell in row-major order, bottom row first.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..HEIGHT).flat_map(|y| (0..WIDTH).map(move |x| Cell::new(x, y)))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Power-up carried by a piece.
///
/// Variants are declared in rank order, so the derived `Ord` doubles as the creation
/// priority when two matches propose a special at the same cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialKind {
    #[default]
    None,
    /// Clears its whole row when triggered.
    LineHorizontal,
    /// Clears its whole column when triggered.
    LineVertical,
    /// Clears the 3x3 block around it when triggered.
    Wrapped,
    /// Clears every piece sharing its base type when triggered.
    ColorBomb,
}

impl SpecialKind {
    /// Rank used by the integer piece encoding.
    pub fn rank(&self) -> i32 {
        match self {
            SpecialKind::None => 0,
            SpecialKind::LineHorizontal => 1,
            SpecialKind::LineVertical => 2,
            SpecialKind::Wrapped => 3,
            SpecialKind::ColorBomb => 4,
        }
    }

    /// Inverse of `rank`. Unknown ranks yield `None`.
    pub fn from_rank(rank: i32) -> Option<SpecialKind> {
        match rank {
            0 => Some(SpecialKind::None),
            1 => Some(SpecialKind::LineHorizontal),
            2 => Some(SpecialKind::LineVertical),
            3 => Some(SpecialKind::Wrapped),
            4 => Some(SpecialKind::ColorBomb),
            _ => None,
        }
    }

    /// Single-character marker used by the text format and terminal display.
    pub fn to_char(&self) -> Option<char> {
        match self {
            SpecialKind::None => None,
            SpecialKind::LineHorizontal => Some('h'),
            SpecialKind::LineVertical => Some('v'),
            SpecialKind::Wrapped => Some('w'),
            SpecialKind::ColorBomb => Some('b'),
        }
    }

    /// Parses a marker produced by `to_char`.
    pub fn from_char(c: char) -> Option<SpecialKind> {
        match c {
            'h' => Some(SpecialKind::LineHorizontal),
            'v' => Some(SpecialKind::LineVertical),
            'w' => Some(SpecialKind::Wrapped),
            'b' => Some(SpecialKind::ColorBomb),
            _ => None,
        }
    }
}

/// A piece sitting in a board cell: its base type plus an optional special kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub base: u8,
    pub special: SpecialKind,
}

impl Piece {
    pub const fn new(base: u8, special: SpecialKind) -> Self {
        Piece { base, special }
    }

    /// A piece of the given base type with no special kind.
    pub const fn plain(base: u8) -> Self {
        Piece::new(base, SpecialKind::None)
    }

    pub fn is_special(&self) -> bool {
        self.special != SpecialKind::None
    }

    /// Encodes the piece as `base + rank * SPECIAL_MULTIPLIER`.
    ///
    /// # Examples
    /// ```
    /// use match3_engine::board::{Piece, SpecialKind};
    /// assert_eq!(Piece::plain(3).encode(), 3);
    /// assert_eq!(Piece::new(2, SpecialKind::Wrapped).encode(), 32);
    /// assert_eq!(Piece::decode(42), Some(Piece::new(2, SpecialKind::ColorBomb)));
    /// assert_eq!(Piece::decode(-1), None);
    /// ```
    pub fn encode(&self) -> i32 {
        self.base as i32 + self.special.rank() * SPECIAL_MULTIPLIER
    }

    /// Decodes an integer piece value. Negative values (the empty sentinel) and unknown
    /// ranks decode to `None`.
    pub fn decode(value: i32) -> Option<Piece> {
        if value < 0 {
            return None;
        }
        let special = SpecialKind::from_rank(value / SPECIAL_MULTIPLIER)?;
        Some(Piece::new((value % SPECIAL_MULTIPLIER) as u8, special))
    }
}

/// A piece moved by gravity from `from` down to `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fall {
    pub from: Cell,
    pub to: Cell,
    pub piece: Piece,
}

/// Draws a random base type in `[0, type_count)`.
pub(crate) fn random_base(rng: &mut impl Rng, type_count: u8) -> u8 {
    rng.gen_range(0..type_count)
}

/// The match-3 board: a `WIDTH` x `HEIGHT` grid of optional pieces plus two independent
/// obstacle layers.
///
/// A cell with `chain > 0` is *locked*: it cannot be swapped and absorbs clears.
/// A cell with `ice > 0` is damaged by clears on or next to it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Option<Piece>; WIDTH]; HEIGHT],
    ice: [[u8; WIDTH]; HEIGHT],
    chain: [[u8; WIDTH]; HEIGHT],
    type_count: u8,
}

impl Board {
    /// Creates a board with every cell empty and no obstacles.
    ///
    /// `type_count` is clamped to `[MIN_TYPE_COUNT, MAX_TYPE_COUNT]`.
    ///
    /// # Examples
    /// ```
    /// use match3_engine::board::{Board, Cell};
    /// let board = Board::new_empty(9);
    /// assert_eq!(board.type_count(), 6);
    /// assert_eq!(board.get(Cell::new(0, 0)), None);
    /// ```
    pub fn new_empty(type_count: u8) -> Self {
        Board {
            cells: [[None; WIDTH]; HEIGHT],
            ice: [[0; WIDTH]; HEIGHT],
            chain: [[0; WIDTH]; HEIGHT],
            type_count: type_count.clamp(MIN_TYPE_COUNT, MAX_TYPE_COUNT),
        }
    }

    /// Creates a freshly initialized board; see `Board::init`.
    pub fn generate(type_count: u8, rng: &mut impl Rng) -> Self {
        let mut board = Board::new_empty(type_count);
        board.init(rng);
        board
    }

    /// Number of base types pieces are drawn from.
    pub fn type_count(&self) -> u8 {
        self.type_count
    }

    /// Refills the whole board and clears both obstacle layers.
    ///
    /// Cells are filled in row-major order. Each draw avoids completing a run of three with
    /// the two already-placed neighbours to the left or below. After `INIT_MAX_ATTEMPTS`
    /// rejected draws the next random type is accepted as-is, so an immediate match is
    /// possible but vanishingly rare.
    pub fn init(&mut self, rng: &mut impl Rng) {
        self.cells = [[None; WIDTH]; HEIGHT];
        self.ice = [[0; WIDTH]; HEIGHT];
        self.chain = [[0; WIDTH]; HEIGHT];

        for cell in Cell::all() {
            let base = self.random_base_no_match(cell, rng);
            self.cells[cell.y][cell.x] = Some(Piece::plain(base));
        }
    }

    fn random_base_no_match(&self, cell: Cell, rng: &mut impl Rng) -> u8 {
        for _ in 0..INIT_MAX_ATTEMPTS {
            let base = random_base(rng, self.type_count);
            let left = |dx: usize| self.base_at(Cell::new(cell.x - dx, cell.y));
            if cell.x >= 2 && left(1) == Some(base) && left(2) == Some(base) {
                continue;
            }
            let below = |dy: usize| self.base_at(Cell::new(cell.x, cell.y - dy));
            if cell.y >= 2 && below(1) == Some(base) && below(2) == Some(base) {
                continue;
            }
            return base;
        }
        random_base(rng, self.type_count)
    }

    /// Randomly assigns ice and chain layers.
    ///
    /// Each layer is placed independently: a cell may carry both ice and chain, but never
    /// receives the same layer twice. Layer counts are drawn from `[1, max_layer]`. Each
    /// layer gets at most `OBSTACLE_PLACEMENT_GUARD` draws, and hitting that cap leaves
    /// the placement short without error.
    ///
    /// # Returns
    /// The number of `(ice, chain)` cells actually placed.
    pub fn place_obstacles(
        &mut self,
        ice_count: usize,
        chain_count: usize,
        max_ice_layer: u8,
        max_chain_layer: u8,
        rng: &mut impl Rng,
    ) -> (usize, usize) {
        let ice = Self::place_layer(&mut self.ice, ice_count, max_ice_layer, rng);
        let chain = Self::place_layer(&mut self.chain, chain_count, max_chain_layer, rng);
        (ice, chain)
    }

    fn place_layer(
        layer: &mut [[u8; WIDTH]; HEIGHT],
        count: usize,
        max_layer: u8,
        rng: &mut impl Rng,
    ) -> usize {
        let mut placed = 0;
        let mut guard = 0;
        while placed < count && guard < OBSTACLE_PLACEMENT_GUARD {
            guard += 1;
            let x = rng.gen_range(0..WIDTH);
            let y = rng.gen_range(0..HEIGHT);
            if layer[y][x] > 0 {
                continue;
            }
            layer[y][x] = rng.gen_range(1..=max_layer.max(1));
            placed += 1;
        }
        placed
    }

    /// Returns the piece at `cell`, or `None` if the cell is empty or off the board.
    pub fn get(&self, cell: Cell) -> Option<Piece> {
        if !cell.in_bounds() {
            return None;
        }
        self.cells[cell.y][cell.x]
    }

    /// Integer encoding of the cell contents; `EMPTY_VALUE` for empty or off-board cells.
    pub fn value_at(&self, cell: Cell) -> i32 {
        self.get(cell).map_or(EMPTY_VALUE, |p| p.encode())
    }

    /// Base type at `cell`, ignoring any special kind.
    pub fn base_at(&self, cell: Cell) -> Option<u8> {
        self.get(cell).map(|p| p.base)
    }

    /// Overwrites the piece at `cell`. Used to materialize special pieces.
    ///
    /// Pieces whose base type is outside `[0, type_count)` are ignored.
    pub fn set_piece_value(&mut self, cell: Cell, piece: Piece) {
        if !cell.in_bounds() || piece.base >= self.type_count {
            return;
        }
        self.cells[cell.y][cell.x] = Some(piece);
    }

    /// Exchanges the pieces of two cells without any validation.
    pub fn swap_pieces(&mut self, a: Cell, b: Cell) {
        if !a.in_bounds() || !b.in_bounds() {
            return;
        }
        let tmp = self.cells[a.y][a.x];
        self.cells[a.y][a.x] = self.cells[b.y][b.x];
        self.cells[b.y][b.x] = tmp;
    }

    /// Empties `cell`.
    pub fn remove_piece(&mut self, cell: Cell) {
        if cell.in_bounds() {
            self.cells[cell.y][cell.x] = None;
        }
    }

    /// Places a fresh random plain piece at `cell` and returns it.
    pub fn fill_piece(&mut self, cell: Cell, rng: &mut impl Rng) -> Option<Piece> {
        if !cell.in_bounds() {
            return None;
        }
        let piece = Piece::plain(random_base(rng, self.type_count));
        self.cells[cell.y][cell.x] = Some(piece);
        Some(piece)
    }

    /// Ice layers at `cell` (0 off the board).
    pub fn ice(&self, cell: Cell) -> u8 {
        if cell.in_bounds() {
            self.ice[cell.y][cell.x]
        } else {
            0
        }
    }

    /// Chain layers at `cell` (0 off the board).
    pub fn chain(&self, cell: Cell) -> u8 {
        if cell.in_bounds() {
            self.chain[cell.y][cell.x]
        } else {
            0
        }
    }

    pub fn set_ice(&mut self, cell: Cell, layers: u8) {
        if cell.in_bounds() {
            self.ice[cell.y][cell.x] = layers;
        }
    }

    pub fn set_chain(&mut self, cell: Cell, layers: u8) {
        if cell.in_bounds() {
            self.chain[cell.y][cell.x] = layers;
        }
    }

    /// A locked cell carries at least one chain layer and cannot be swapped.
    pub fn is_locked(&self, cell: Cell) -> bool {
        self.chain(cell) > 0
    }

    /// Returns `true` if the cell carries ice or chain.
    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.ice(cell) > 0 || self.chain(cell) > 0
    }

    /// Removes up to `amount` chain layers and returns the layers left.
    pub fn damage_chain(&mut self, cell: Cell, amount: u8) -> u8 {
        if !cell.in_bounds() {
            return 0;
        }
        let layer = &mut self.chain[cell.y][cell.x];
        *layer = layer.saturating_sub(amount);
        *layer
    }

    /// Removes up to `amount` ice layers and returns the layers left.
    pub fn damage_ice(&mut self, cell: Cell, amount: u8) -> u8 {
        if !cell.in_bounds() {
            return 0;
        }
        let layer = &mut self.ice[cell.y][cell.x];
        *layer = layer.saturating_sub(amount);
        *layer
    }

    /// Counts cells carrying ice or chain.
    pub fn count_obstacle_cells(&self) -> usize {
        Cell::all().filter(|&c| self.is_obstacle(c)).count()
    }

    /// Counts empty cells.
    pub fn empty_count(&self) -> usize {
        Cell::all().filter(|&c| self.get(c).is_none()).count()
    }

    pub fn is_full(&self) -> bool {
        self.empty_count() == 0
    }

    /// Compacts every column downwards.
    ///
    /// Pieces keep their relative order inside the column; after the call no column has an
    /// empty cell below a piece. Obstacle layers stay where they are.
    ///
    /// # Returns
    /// One `Fall` per piece that actually moved, column by column from the bottom up.
    pub fn apply_gravity(&mut self) -> Vec<Fall> {
        let mut falls = Vec::new();
        for x in 0..WIDTH {
            let mut write_y = 0;
            for y in 0..HEIGHT {
                if let Some(piece) = self.cells[y][x] {
                    if y != write_y {
                        self.cells[write_y][x] = Some(piece);
                        self.cells[y][x] = None;
                        falls.push(Fall {
                            from: Cell::new(x, y),
                            to: Cell::new(x, write_y),
                            piece,
                        });
                    }
                    write_y += 1;
                }
            }
        }
        falls
    }

    /// Fills every empty cell with a random plain piece.
    ///
    /// After `apply_gravity` the empty cells are exactly the vacated top of each column.
    pub fn refill(&mut self, rng: &mut impl Rng) -> Vec<(Cell, Piece)> {
        let mut filled = Vec::new();
        for x in 0..WIDTH {
            for y in 0..HEIGHT {
                let cell = Cell::new(x, y);
                if self.cells[y][x].is_none() {
                    if let Some(piece) = self.fill_piece(cell, rng) {
                        filled.push((cell, piece));
                    }
                }
            }
        }
        filled
    }

    /// Renders the board for a terminal, top row first, using ANSI background colors.
    ///
    /// Each cell is two characters wide: the first shows the special marker (`h`, `v`, `w`,
    /// `b`), the second shows `@` for chain or `~` for ice. Cells listed in `highlight`
    /// are drawn as `<>`.
    pub fn to_string_with_highlight(&self, highlight: &[Cell]) -> String {
        let mut output = String::from("  ");
        for x in 0..WIDTH {
            output.push_str(&format!("{:<2}", x));
        }
        output.push('\n');

        for y in (0..HEIGHT).rev() {
            output.push_str(&format!("{:<2}", y));
            for x in 0..WIDTH {
                let cell = Cell::new(x, y);
                let piece = self.get(cell);
                let color = piece.map_or("40", |p| ansi_color_code(p.base));
                let content = if highlight.contains(&cell) {
                    "<>".to_string()
                } else {
                    let special = piece.and_then(|p| p.special.to_char()).unwrap_or(' ');
                    let obstacle = if self.chain(cell) > 0 {
                        '@'
                    } else if self.ice(cell) > 0 {
                        '~'
                    } else {
                        ' '
                    };
                    format!("{}{}", special, obstacle)
                };
                output.push_str(&format!("\x1b[1;{};m{}\x1b[m", color, content));
            }
            if y > 0 {
                output.push('\n');
            }
        }
        output
    }
}

fn ansi_color_code(base: u8) -> &'static str {
    match base {
        0 => "41",
        1 => "42",
        2 => "44",
        3 => "43",
        4 => "45",
        _ => "46",
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_highlight(&[]))
    }
}
