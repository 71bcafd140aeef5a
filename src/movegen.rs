/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{Board, Move, Piece, PieceKind, Side, Square};

/// The four diagonal directions, as (row, column) steps.
const DIAGONALS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// The legal moves for one side or one piece.
#[derive(Debug, Clone, Default)]
pub struct MoveList {
    pub moves: Vec<Move>,

    /// `true` when the moves are captures, and captures are therefore the
    /// only legal moves here.
    pub forced_capture: bool,
}

impl MoveList {
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter()
    }

    /// Finds the generated move matching a player's partial from/to input.
    ///
    /// Relies on [`Move`] equality ignoring the captured square.
    pub fn find(&self, probe: Move) -> Option<Move> {
        self.moves.iter().find(|mv| **mv == probe).copied()
    }
}

/// Generates legal moves under Russian draughts rules.
///
/// Owns the random source used to shuffle side-level move lists, so the
/// bot's choice among equal-score moves is non-deterministic unless a
/// fixed seed is supplied.
#[derive(Debug)]
pub struct MoveGenerator {
    rng: StdRng,
}

impl MoveGenerator {
    /// `Some(seed)` gives reproducible shuffles (the `NoRandom` setting
    /// passes 0); `None` seeds from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// All legal moves for `side` on `board`.
    ///
    /// If any piece of `side` can capture, the list holds only capturing
    /// moves: the first piece found with a capture discards every quiet
    /// move accumulated so far, and pieces without captures contribute
    /// nothing from then on. The result order is shuffled.
    pub fn legal_moves(&mut self, board: &Board, side: Side) -> MoveList {
        let mut moves = Vec::new();
        let mut forced_capture = false;

        for (sq, _) in board.pieces(side) {
            let piece_moves = Self::piece_moves(board, sq);

            if piece_moves.forced_capture && !forced_capture {
                forced_capture = true;
                moves.clear();
            }

            if piece_moves.forced_capture || !forced_capture {
                moves.extend(piece_moves.moves);
            }
        }

        moves.shuffle(&mut self.rng);

        MoveList {
            moves,
            forced_capture,
        }
    }

    /// Legal moves for the single piece at `sq`.
    ///
    /// Never shuffled; used for capture chain continuations and for
    /// matching player input. An empty cell yields an empty list.
    pub fn legal_moves_for_piece(&self, board: &Board, sq: Square) -> MoveList {
        Self::piece_moves(board, sq)
    }

    fn piece_moves(board: &Board, sq: Square) -> MoveList {
        let Some(piece) = board.get(sq) else {
            return MoveList::default();
        };

        // Any capture makes captures the only legal moves for this piece.
        let captures = match piece.kind {
            PieceKind::Man => Self::man_captures(board, sq, piece),
            PieceKind::King => Self::king_captures(board, sq, piece),
        };
        if !captures.is_empty() {
            return MoveList {
                moves: captures,
                forced_capture: true,
            };
        }

        let quiet = match piece.kind {
            PieceKind::Man => Self::man_quiet_moves(board, sq, piece),
            PieceKind::King => Self::king_quiet_moves(board, sq),
        };
        MoveList {
            moves: quiet,
            forced_capture: false,
        }
    }

    /// Men capture two squares away in any diagonal direction, over an
    /// opposing piece, onto an empty landing square.
    fn man_captures(board: &Board, sq: Square, piece: Piece) -> Vec<Move> {
        let mut moves = Vec::new();

        for (dr, dc) in DIAGONALS {
            let Some(to) = sq.offset(dr * 2, dc * 2) else {
                continue;
            };
            if board.get(to).is_some() {
                continue;
            }

            // Safety: the midpoint is on the board whenever the landing is.
            let mid = sq.offset(dr, dc).unwrap();
            match board.get(mid) {
                Some(over) if over.side != piece.side => {
                    moves.push(Move::capture(sq, to, mid));
                }
                _ => {}
            }
        }

        moves
    }

    /// Kings capture along a diagonal ray holding exactly one opposing
    /// piece, landing on any empty square beyond it. A same-color piece,
    /// or a second piece after the captured one, blocks the ray.
    fn king_captures(board: &Board, sq: Square, piece: Piece) -> Vec<Move> {
        let mut moves = Vec::new();

        for (dr, dc) in DIAGONALS {
            let mut captured: Option<Square> = None;
            let mut cur = sq;

            while let Some(next) = cur.offset(dr, dc) {
                cur = next;
                match board.get(cur) {
                    Some(other) => {
                        if other.side == piece.side || captured.is_some() {
                            break;
                        }
                        captured = Some(cur);
                    }
                    None => {
                        if let Some(over) = captured {
                            moves.push(Move::capture(sq, cur, over));
                        }
                    }
                }
            }
        }

        moves
    }

    /// Quiet men step one square diagonally toward promotion.
    fn man_quiet_moves(board: &Board, sq: Square, piece: Piece) -> Vec<Move> {
        let mut moves = Vec::new();

        for dc in [-1, 1] {
            if let Some(to) = sq.offset(piece.side.forward(), dc) {
                if board.get(to).is_none() {
                    moves.push(Move::new(sq, to));
                }
            }
        }

        moves
    }

    /// Quiet kings slide through consecutive empty squares on any diagonal.
    fn king_quiet_moves(board: &Board, sq: Square) -> Vec<Move> {
        let mut moves = Vec::new();

        for (dr, dc) in DIAGONALS {
            let mut cur = sq;
            while let Some(next) = cur.offset(dr, dc) {
                if board.get(next).is_some() {
                    break;
                }
                moves.push(Move::new(sq, next));
                cur = next;
            }
        }

        moves
    }
}

impl Default for MoveGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}
