/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Board, Evaluator, Move, MoveGenerator, MoveList, Score, Side, Square};

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Fixed ply depth of the minimax search. A capture chain counts as a
    /// single ply, and depth is the only bound on work: there is no clock
    /// and no cancellation.
    pub max_depth: usize,

    /// When `true`, an `alpha >= beta` cutoff returns immediately with a
    /// nudged non-exact bound instead of finishing the enumeration.
    pub alpha_beta: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            alpha_beta: true,
        }
    }
}

/// Depth-limited minimax with alpha-beta pruning over draughts turns.
///
/// The search works on private copies of the grid (the live board is never
/// touched) and treats a capture chain as multiple moves within one ply,
/// owned by the same mover. Odd depths maximize and even depths minimize;
/// the evaluation's perspective flip at the leaves is tied to the same
/// parity, so callers pick `max_depth`'s parity per the side they search
/// for.
#[derive(Debug)]
pub struct Search<'a> {
    /// Legal-move source. Mutable because side-level generation shuffles
    /// with the generator's own RNG.
    movegen: &'a mut MoveGenerator,

    evaluator: Evaluator,

    config: SearchConfig,
}

impl<'a> Search<'a> {
    pub fn new(movegen: &'a mut MoveGenerator, evaluator: Evaluator, config: SearchConfig) -> Self {
        Self {
            movegen,
            evaluator,
            config,
        }
    }

    /// Returns the best full turn for `color` on `board`: a single quiet
    /// move, or a capture chain in application order.
    ///
    /// Empty when `color` has no legal moves, which is a terminal game
    /// state rather than an error.
    pub fn find_best_sequence(&mut self, board: &Board, color: Side) -> Vec<Move> {
        let (_, sequence) = self.chain_root(*board, color, None, Score::new(-1.0));
        sequence
    }

    /// Explores one node of the mover's own turn.
    ///
    /// At the top level (`from == None`) every legal move of `color` is a
    /// candidate; at a continuation node, only the capturing piece at
    /// `from` may move. Each candidate either continues the chain (same
    /// color, same node kind) or hands the position to the opponent at
    /// depth 0. The chosen suffix sequence is returned by value.
    fn chain_root(
        &mut self,
        board: Board,
        color: Side,
        from: Option<Square>,
        alpha: Score,
    ) -> (Score, Vec<Move>) {
        let MoveList {
            moves,
            forced_capture,
        } = match from {
            Some(sq) => self.movegen.legal_moves_for_piece(&board, sq),
            None => self.movegen.legal_moves(&board, color),
        };

        // The chain has ended: the turn is over, opponent to move.
        if from.is_some() && !forced_capture {
            let score = self.minimax(
                board,
                color.opponent(),
                0,
                alpha,
                Score::INF + 1.0,
                None,
            );
            return (score, Vec::new());
        }

        let mut best_score = Score::new(-1.0);
        let mut best_sequence = Vec::new();

        for mv in moves {
            let next = board.with_move_applied(mv);

            let (score, continuation) = if forced_capture {
                self.chain_root(next, color, Some(mv.to), best_score)
            } else {
                let score = self.minimax(
                    next,
                    color.opponent(),
                    0,
                    best_score,
                    Score::INF + 1.0,
                    None,
                );
                (score, Vec::new())
            };

            if score > best_score {
                best_score = score;
                best_sequence = std::iter::once(mv).chain(continuation).collect();
            }
        }

        (best_score, best_sequence)
    }

    /// Depth-limited minimax with alpha-beta pruning.
    ///
    /// A capture chain keeps `depth` fixed and keeps the same `color`,
    /// threading the capturing piece through `from`: a multi-capture turn
    /// is one ply, not several.
    fn minimax(
        &mut self,
        board: Board,
        color: Side,
        depth: usize,
        mut alpha: Score,
        mut beta: Score,
        from: Option<Square>,
    ) -> Score {
        if depth == self.config.max_depth {
            // The perspective flip is tied to the same depth parity that
            // decides who minimizes, White being index 0.
            let perspective = if depth % 2 == color.index() {
                Side::White
            } else {
                Side::Black
            };
            return self.evaluator.score(&board, perspective);
        }

        let MoveList {
            moves,
            forced_capture,
        } = match from {
            Some(sq) => self.movegen.legal_moves_for_piece(&board, sq),
            None => self.movegen.legal_moves(&board, color),
        };

        // A continuation with no further captures ends the turn.
        if from.is_some() && !forced_capture {
            return self.minimax(board, color.opponent(), depth + 1, alpha, beta, None);
        }

        // No legal moves: an immediate loss for the side to move.
        if moves.is_empty() {
            return if depth % 2 == 1 {
                Score::ZERO
            } else {
                Score::INF
            };
        }

        let mut min_score = Score::INF + 1.0;
        let mut max_score = Score::new(-1.0);

        for mv in moves {
            let next = board.with_move_applied(mv);

            let score = if !forced_capture && from.is_none() {
                self.minimax(next, color.opponent(), depth + 1, alpha, beta, None)
            } else {
                self.minimax(next, color, depth, alpha, beta, Some(mv.to))
            };

            min_score = min_score.min(score);
            max_score = max_score.max(score);

            // Odd depths maximize, even depths minimize.
            if depth % 2 == 1 {
                alpha = alpha.max(max_score);
            } else {
                beta = beta.min(min_score);
            }

            if self.config.alpha_beta && alpha >= beta {
                // Nudge the returned bound past the exact value so a tie
                // can't mislead the parent's strict comparison.
                return if depth % 2 == 1 {
                    max_score + 1.0
                } else {
                    min_score - 1.0
                };
            }
        }

        if depth % 2 == 1 {
            max_score
        } else {
            min_score
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Piece, PieceKind, ScoringMode};

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col)
    }

    fn man(side: Side) -> Option<Piece> {
        Some(Piece::new(side, PieceKind::Man))
    }

    fn best_sequence(
        board: &Board,
        color: Side,
        depth: usize,
        mode: ScoringMode,
    ) -> Vec<Move> {
        let mut movegen = MoveGenerator::new(Some(0));
        let config = SearchConfig {
            max_depth: depth,
            alpha_beta: true,
        };
        Search::new(&mut movegen, Evaluator::new(mode), config).find_best_sequence(board, color)
    }

    #[test]
    fn startpos_depth_one_returns_a_legal_man_advance() {
        let board = Board::startpos();
        let sequence = best_sequence(&board, Side::White, 1, ScoringMode::Number);

        assert_eq!(sequence.len(), 1);
        let mv = sequence[0];
        assert!(!mv.is_capture());
        assert_eq!(mv.from.row() as i8 - mv.to.row() as i8, 1);
        assert_eq!(board.get(mv.from).map(|p| p.side), Some(Side::White));
        assert!(board.get(mv.to).is_none());
    }

    #[test]
    fn forced_capture_is_chosen() {
        let mut board = Board::empty();
        board.set(sq(4, 3), man(Side::White));
        board.set(sq(3, 4), man(Side::Black));

        let sequence = best_sequence(&board, Side::White, 2, ScoringMode::Number);
        assert_eq!(sequence, vec![Move::new(sq(4, 3), sq(2, 5))]);

        // Capturing the last black piece is a win: score 0 for White.
        let after = board.with_move_applied(sequence[0]);
        let eval = Evaluator::new(ScoringMode::Number);
        assert_eq!(eval.score(&after, Side::White), Score::ZERO);
    }

    #[test]
    fn capture_chain_is_returned_as_one_sequence() {
        let mut board = Board::empty();
        board.set(sq(5, 2), man(Side::White));
        board.set(sq(4, 3), man(Side::Black));
        board.set(sq(2, 5), man(Side::Black));

        let sequence = best_sequence(&board, Side::White, 2, ScoringMode::Number);

        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence[0], Move::new(sq(5, 2), sq(3, 4)));
        assert_eq!(sequence[1], Move::new(sq(3, 4), sq(1, 6)));
        // Each link continues from the previous landing square.
        assert_eq!(sequence[0].to, sequence[1].from);
        assert!(sequence.iter().all(Move::is_capture));
    }

    #[test]
    fn chain_promotion_switches_to_king_capture_rules() {
        // The man jumps into the back row, promotes, and must continue
        // the chain as a king.
        let mut board = Board::empty();
        board.set(sq(2, 1), man(Side::White));
        board.set(sq(1, 2), man(Side::Black));
        board.set(sq(1, 4), man(Side::Black));

        let sequence = best_sequence(&board, Side::White, 2, ScoringMode::Number);

        assert!(sequence.len() >= 2);
        assert_eq!(sequence[0], Move::new(sq(2, 1), sq(0, 3)));
        // The second jump runs along a king ray from the promotion square.
        assert_eq!(sequence[1].from, sq(0, 3));
        assert_eq!(sequence[1].captured, Some(sq(1, 4)));
    }

    #[test]
    fn no_legal_moves_yields_an_empty_sequence() {
        let mut board = Board::empty();
        board.set(sq(4, 3), man(Side::White));

        let sequence = best_sequence(&board, Side::Black, 2, ScoringMode::Number);
        assert!(sequence.is_empty());
    }

    #[test]
    fn search_is_deterministic_with_a_fixed_seed() {
        let board = Board::startpos();

        for mode in [ScoringMode::Number, ScoringMode::NumberAndPotential] {
            let a = best_sequence(&board, Side::White, 3, mode);
            let b = best_sequence(&board, Side::White, 3, mode);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn disabling_the_cutoff_does_not_change_the_chosen_turn() {
        let mut board = Board::empty();
        board.set(sq(5, 2), man(Side::White));
        board.set(sq(4, 3), man(Side::Black));
        board.set(sq(2, 5), man(Side::Black));
        board.set(sq(0, 1), man(Side::Black));

        let mut run = |alpha_beta: bool| {
            let mut movegen = MoveGenerator::new(Some(0));
            let config = SearchConfig {
                max_depth: 2,
                alpha_beta,
            };
            Search::new(&mut movegen, Evaluator::new(ScoringMode::Number), config)
                .find_best_sequence(&board, Side::White)
        };

        // The forced capture chain is unique, so pruning cannot affect it.
        assert_eq!(run(true), run(false));
    }
}
