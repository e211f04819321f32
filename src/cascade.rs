//! Building blocks of one cascade iteration.
//!
//! The `engine::Game` state machine strings these together; each function here is a pure
//! transformation of a `Board` plus the cells being cleared.
use crate::board::{random_base, Board, Cell, Fall, Piece, SpecialKind, HEIGHT, WIDTH};
use crate::detector::{MatchGroup, MatchShape, Orientation};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Special pieces to create this iteration, keyed by the cell that survives the clear.
pub type CreationPlan = BTreeMap<Cell, SpecialKind>;

/// The special kind a match group earns.
///
/// Intersecting runs of five or more make a `Wrapped`, straight runs of five or more make a
/// `ColorBomb`, runs of four make a line clear along the run's own orientation, and runs of
/// three make nothing.
pub fn special_for_group(group: &MatchGroup) -> SpecialKind {
    let len = group.len();
    if len >= 5 && group.shape == MatchShape::LShape {
        SpecialKind::Wrapped
    } else if len >= 5 {
        SpecialKind::ColorBomb
    } else if len == 4 {
        match group.orientation {
            Orientation::Horizontal => SpecialKind::LineHorizontal,
            Orientation::Vertical => SpecialKind::LineVertical,
        }
    } else {
        SpecialKind::None
    }
}

/// Decides where special pieces are created this iteration.
///
/// The creation cell is `preferred` (the swap target) when it belongs to the group and the
/// group's middle cell otherwise. When two groups pick the same cell the higher-ranked kind
/// is kept.
pub fn plan_special_creation(groups: &[MatchGroup], preferred: Option<Cell>) -> CreationPlan {
    let mut plan = CreationPlan::new();
    for group in groups {
        let special = special_for_group(group);
        if special == SpecialKind::None {
            continue;
        }
        let cell = match preferred {
            Some(p) if group.contains(p) => p,
            _ => group.middle(),
        };
        let entry = plan.entry(cell).or_insert(special);
        if *entry < special {
            *entry = special;
        }
    }
    plan
}

/// Cells cleared when the special piece at `cell` is triggered.
///
/// Returns an empty list if the cell holds no special piece.
pub fn special_effect_cells(board: &Board, cell: Cell) -> Vec<Cell> {
    let Some(piece) = board.get(cell) else {
        return Vec::new();
    };
    match piece.special {
        SpecialKind::None => Vec::new(),
        SpecialKind::LineHorizontal => (0..WIDTH).map(|x| Cell::new(x, cell.y)).collect(),
        SpecialKind::LineVertical => (0..HEIGHT).map(|y| Cell::new(cell.x, y)).collect(),
        SpecialKind::Wrapped => (-1..=1)
            .flat_map(|dx| (-1..=1).map(move |dy| (dx, dy)))
            .filter_map(|(dx, dy)| cell.offset(dx, dy))
            .collect(),
        SpecialKind::ColorBomb => Cell::all()
            .filter(|&c| board.base_at(c) == Some(piece.base))
            .collect(),
    }
}

/// Grows `clear` with the effect cells of every special piece it contains, breadth first,
/// until no new cell is added. Specials reached through another special's effect are
/// triggered as well.
pub fn expand_triggered_specials(board: &Board, clear: &mut BTreeSet<Cell>) {
    let mut queue: VecDeque<Cell> = clear.iter().copied().collect();
    while let Some(cell) = queue.pop_front() {
        for extra in special_effect_cells(board, cell) {
            if clear.insert(extra) {
                queue.push_back(extra);
            }
        }
    }
}

/// Obstacle layers hit during one clear, with the layers left afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObstacleHits {
    pub chain: Vec<(Cell, u8)>,
    pub ice: Vec<(Cell, u8)>,
}

/// Applies chain and ice damage for a pending clear.
///
/// Every chained cell in `clear` loses one chain layer and is taken out of `clear`: the
/// chain absorbs the hit and the piece stays. Every remaining cell and its orthogonal
/// neighbours then lose one ice layer, each at most once.
pub fn apply_obstacle_damage(board: &mut Board, clear: &mut BTreeSet<Cell>) -> ObstacleHits {
    let mut hits = ObstacleHits::default();

    let chained: Vec<Cell> = clear
        .iter()
        .copied()
        .filter(|&c| board.chain(c) > 0)
        .collect();
    for cell in chained {
        let left = board.damage_chain(cell, 1);
        hits.chain.push((cell, left));
        clear.remove(&cell);
    }

    let mut affected: BTreeSet<Cell> = clear.clone();
    for cell in clear.iter() {
        affected.extend(cell.neighbors());
    }
    for cell in affected {
        if board.ice(cell) > 0 {
            let left = board.damage_ice(cell, 1);
            hits.ice.push((cell, left));
        }
    }
    hits
}

/// Board changes caused by one clear: what was removed, which obstacles absorbed damage,
/// how pieces fell and which cells were refilled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClearDelta {
    pub cleared: Vec<Cell>,
    pub chain_hits: Vec<(Cell, u8)>,
    pub ice_hits: Vec<(Cell, u8)>,
    pub falls: Vec<Fall>,
    pub refilled: Vec<(Cell, Piece)>,
}

/// Removes every cell in `clear`, then applies gravity and refills the board.
pub fn clear_and_refill(
    board: &mut Board,
    clear: BTreeSet<Cell>,
    hits: ObstacleHits,
    rng: &mut impl Rng,
) -> ClearDelta {
    for &cell in &clear {
        board.remove_piece(cell);
    }
    let falls = board.apply_gravity();
    let refilled = board.refill(rng);
    ClearDelta {
        cleared: clear.into_iter().collect(),
        chain_hits: hits.chain,
        ice_hits: hits.ice,
        falls,
        refilled,
    }
}

/// Turns the planned cells into special pieces.
///
/// The base type of whatever piece now sits on the cell is kept; an empty cell gets a
/// random base type.
pub fn materialize_plan(
    board: &mut Board,
    plan: &CreationPlan,
    rng: &mut impl Rng,
) -> Vec<(Cell, Piece)> {
    let mut created = Vec::with_capacity(plan.len());
    for (&cell, &special) in plan {
        let base = board
            .base_at(cell)
            .unwrap_or_else(|| random_base(rng, board.type_count()));
        let piece = Piece::new(base, special);
        board.set_piece_value(cell, piece);
        created.push((cell, piece));
    }
    created
}

/// Fires the specials involved in a swap of `a` and `b`.
///
/// Both swapped cells are cleared along with everything their specials reach. Obstacles
/// absorb and take damage exactly as in a cascade iteration, then gravity and refill run
/// once.
pub fn trigger_special_swap(board: &mut Board, a: Cell, b: Cell, rng: &mut impl Rng) -> ClearDelta {
    let mut clear: BTreeSet<Cell> = [a, b].into_iter().collect();
    expand_triggered_specials(board, &mut clear);
    let hits = apply_obstacle_damage(board, &mut clear);
    clear_and_refill(board, clear, hits, rng)
}
