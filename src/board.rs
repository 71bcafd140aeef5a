/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

/// Color of a piece, and of the player owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    #[inline(always)]
    pub const fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// White is 0 and Black is 1.
    ///
    /// The search's depth-parity convention and the evaluation's
    /// perspective flip both key off this index.
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }

    /// Row a man of this side promotes on.
    ///
    /// Row 0 is Black's home edge, so White promotes there, and vice versa.
    #[inline(always)]
    pub const fn promotion_row(self) -> u8 {
        match self {
            Self::White => 0,
            Self::Black => 7,
        }
    }

    /// Row step of a quiet man move: men only step toward promotion.
    #[inline(always)]
    pub const fn forward(self) -> i8 {
        match self {
            Self::White => -1,
            Self::Black => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rank of a piece: a man, or a king it was promoted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Man,
    King,
}

/// A piece on the board: an explicit side + kind record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    #[inline(always)]
    pub const fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    /// Character used when printing the board: men are lowercase.
    pub const fn char(self) -> char {
        match (self.side, self.kind) {
            (Side::White, PieceKind::Man) => 'w',
            (Side::White, PieceKind::King) => 'W',
            (Side::Black, PieceKind::Man) => 'b',
            (Side::Black, PieceKind::King) => 'B',
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

/// A cell on the 8x8 grid.
///
/// Rows run 0..8 top to bottom, with row 0 being Black's home edge;
/// columns run 0..8 left to right. Printed and parsed algebraically,
/// so `a8` is row 0, column 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    #[inline(always)]
    pub fn new(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8, "({row}, {col}) is off the board");
        Self { row, col }
    }

    #[inline(always)]
    pub const fn row(self) -> u8 {
        self.row
    }

    #[inline(always)]
    pub const fn col(self) -> u8 {
        self.col
    }

    /// The square `dr` rows and `dc` columns away, if it is on the board.
    #[inline(always)]
    pub fn offset(self, dr: i8, dc: i8) -> Option<Self> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Self::new(row as u8, col as u8))
        } else {
            None
        }
    }

    /// Only dark squares are ever occupied.
    #[inline(always)]
    pub const fn is_dark(self) -> bool {
        (self.row + self.col) % 2 == 1
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;

    /// Parses algebraic coordinates: `a1` through `h8`.
    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            bail!("invalid square {s:?}: expected a file and a rank, like b6");
        }

        let col = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'0');
        if col > 7 || !(1..=8).contains(&rank) {
            bail!("invalid square {s:?}: files are a-h, ranks are 1-8");
        }

        Ok(Self::new(8 - rank, col))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, 8 - self.row)
    }
}

/// A single directed move: source, destination, and the captured square
/// when the move is a capture.
///
/// Equality deliberately ignores the captured square, so a player's
/// partial from/to input can be matched against the generator's fuller
/// record.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub captured: Option<Square>,
}

impl Move {
    #[inline(always)]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            captured: None,
        }
    }

    #[inline(always)]
    pub const fn capture(from: Square, to: Square, captured: Square) -> Self {
        Self {
            from,
            to,
            captured: Some(captured),
        }
    }

    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl std::hash::Hash for Move {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Must agree with the captured-agnostic equality.
        self.from.hash(state);
        self.to.hash(state);
    }
}

impl FromStr for Move {
    type Err = anyhow::Error;

    /// Parses user input like `c3d4`, `c3-d4`, or `c3xe5`.
    ///
    /// The captured square is never part of the input; the engine resolves
    /// it by matching against the generated legal moves.
    fn from_str(s: &str) -> Result<Self> {
        // Files are a-h, so `x` can only ever be a separator.
        let squares: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() && !matches!(c, 'x' | 'X'))
            .collect();
        if squares.len() != 4 {
            bail!("invalid move {s:?}: expected two squares, like c3-d4");
        }

        let from = squares[..2].parse()?;
        let to = squares[2..].parse()?;
        Ok(Self::new(from, to))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.is_capture() { 'x' } else { '-' };
        write!(f, "{}{sep}{}", self.from, self.to)
    }
}

/// The 8x8 grid of cells.
///
/// `Copy`, so the search can apply moves copy-make style: every recursive
/// call owns an independent grid and sibling branches never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// A board with no pieces on it.
    pub const fn empty() -> Self {
        Self {
            cells: [[None; 8]; 8],
        }
    }

    /// The standard starting position: men on the three rows nearest each
    /// side's home edge, dark squares only.
    pub fn startpos() -> Self {
        let mut board = Self::empty();
        for row in 0..8u8 {
            for col in 0..8u8 {
                let sq = Square::new(row, col);
                if !sq.is_dark() {
                    continue;
                }
                if row < 3 {
                    board.set(sq, Some(Piece::new(Side::Black, PieceKind::Man)));
                } else if row > 4 {
                    board.set(sq, Some(Piece::new(Side::White, PieceKind::Man)));
                }
            }
        }
        board
    }

    #[inline(always)]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.row() as usize][sq.col() as usize]
    }

    #[inline(always)]
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.cells[sq.row() as usize][sq.col() as usize] = piece;
    }

    /// Iterates over all pieces of `side` in row-major order.
    pub fn pieces(&self, side: Side) -> impl Iterator<Item = (Square, Piece)> + '_ {
        (0..8u8).flat_map(move |row| {
            (0..8u8).filter_map(move |col| {
                let sq = Square::new(row, col);
                self.get(sq).filter(|p| p.side == side).map(|p| (sq, p))
            })
        })
    }

    /// Applies a move copy-make style, returning the resulting grid.
    ///
    /// Used by the search on its private copies; the move must come from
    /// the generator, so no validation is repeated here. A man reaching
    /// its promotion row becomes a king before the piece is relocated, so
    /// the continuation of a capture chain sees the promoted piece.
    pub fn with_move_applied(self, mv: Move) -> Self {
        let mut next = self;

        if let Some(captured) = mv.captured {
            next.set(captured, None);
        }

        // Safety: a generated move always originates from an occupied square.
        let mut piece = next.get(mv.from).unwrap();
        if piece.kind == PieceKind::Man && mv.to.row() == piece.side.promotion_row() {
            piece.kind = PieceKind::King;
        }

        next.set(mv.to, Some(piece));
        next.set(mv.from, None);
        next
    }

    /// Promotes the man at `sq` to a king.
    ///
    /// Promotion never stacks: promoting an empty cell or a king is a
    /// contract violation, not a silent no-op.
    pub fn promote(&mut self, sq: Square) -> Result<()> {
        match self.get(sq) {
            None => bail!("can't promote: {sq} is empty"),
            Some(piece) if piece.kind == PieceKind::King => {
                bail!("can't promote: {sq} already holds a king")
            }
            Some(piece) => {
                self.set(sq, Some(Piece::new(piece.side, PieceKind::King)));
                Ok(())
            }
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +---+---+---+---+---+---+---+---+")?;
        for row in 0..8u8 {
            write!(f, "{} |", 8 - row)?;
            for col in 0..8u8 {
                let sq = Square::new(row, col);
                let c = self.get(sq).map(|p| p.char()).unwrap_or(' ');
                write!(f, " {c} |")?;
            }
            writeln!(f)?;
            writeln!(f, "  +---+---+---+---+---+---+---+---+")?;
        }
        write!(f, "    a   b   c   d   e   f   g   h")
    }
}

/// The live board: the grid actually being played on, plus a linear
/// history of grid snapshots used for rendering and rollback.
///
/// `history` and `beat_series` grow in lockstep, one entry per applied
/// move, and always hold at least the starting position.
#[derive(Debug, Clone)]
pub struct BoardState {
    board: Board,
    history: Vec<Board>,
    beat_series: Vec<u32>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::with_board(Board::startpos())
    }

    /// Starts a game from an arbitrary position.
    pub fn with_board(board: Board) -> Self {
        Self {
            board,
            history: vec![board],
            beat_series: vec![0],
        }
    }

    #[inline(always)]
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Applies a move to the live grid and records the snapshot.
    ///
    /// `capture_count` is the running number of captures within the
    /// current turn (0 for a quiet move); rollback uses it to undo a
    /// whole capture chain as one turn.
    ///
    /// Moving out of an empty cell or into an occupied one means the
    /// generator and the executor have desynchronized; both reject
    /// without touching the grid.
    pub fn apply(&mut self, mv: Move, capture_count: u32) -> Result<()> {
        if self.board.get(mv.to).is_some() {
            bail!("final position {} is not empty, can't move", mv.to);
        }
        if self.board.get(mv.from).is_none() {
            bail!("begin position {} is empty, can't move", mv.from);
        }

        self.board = self.board.with_move_applied(mv);
        self.history.push(self.board);
        self.beat_series.push(capture_count);
        Ok(())
    }

    /// Undoes the last full turn.
    ///
    /// A capture chain of N moves was recorded as N history entries with
    /// capture counts 1..=N; all of them are popped together. The initial
    /// entry is never popped.
    pub fn rollback(&mut self) {
        let mut entries = self.beat_series.last().copied().unwrap_or(0).max(1);
        while entries > 0 && self.history.len() > 1 {
            self.history.pop();
            self.beat_series.pop();
            entries -= 1;
        }

        // Safety: the loop guard keeps at least one entry.
        self.board = *self.history.last().unwrap();
    }

    /// Clears the history and re-seeds the standard starting position.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Promotes the man at `sq` on the live grid. See [`Board::promote`].
    pub fn promote(&mut self, sq: Square) -> Result<()> {
        self.board.promote(sq)
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col)
    }

    #[test]
    fn startpos_shape() {
        let board = Board::startpos();

        assert_eq!(board.pieces(Side::White).count(), 12);
        assert_eq!(board.pieces(Side::Black).count(), 12);

        for (square, piece) in board
            .pieces(Side::White)
            .chain(board.pieces(Side::Black))
        {
            assert!(square.is_dark(), "{square} is a light square");
            assert_eq!(piece.kind, PieceKind::Man);
        }
    }

    #[test]
    fn square_parsing_round_trips() {
        assert_eq!("a8".parse::<Square>().unwrap(), sq(0, 0));
        assert_eq!("h1".parse::<Square>().unwrap(), sq(7, 7));
        assert_eq!(sq(4, 3).to_string(), "d4");
        assert_eq!("d4".parse::<Square>().unwrap(), sq(4, 3));

        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
    }

    #[test]
    fn move_equality_ignores_capture() {
        let plain = Move::new(sq(5, 2), sq(3, 4));
        let full = Move::capture(sq(5, 2), sq(3, 4), sq(4, 3));
        assert_eq!(plain, full);

        let other = Move::new(sq(5, 2), sq(4, 1));
        assert_ne!(plain, other);
    }

    #[test]
    fn move_parsing() {
        let mv: Move = "c3-d4".parse().unwrap();
        assert_eq!(mv, Move::new(sq(5, 2), sq(4, 3)));
        assert_eq!("c3d4".parse::<Move>().unwrap(), mv);
        assert_eq!("c3xd4".parse::<Move>().unwrap(), mv);
        assert!("c3".parse::<Move>().is_err());
    }

    #[test]
    fn apply_rejects_contract_violations() {
        let mut state = BoardState::new();

        // Moving out of an empty cell.
        let from_empty = Move::new(sq(4, 1), sq(3, 2));
        assert!(state.apply(from_empty, 0).is_err());

        // Moving into an occupied cell.
        let into_occupied = Move::new(sq(5, 0), sq(6, 1));
        assert!(state.apply(into_occupied, 0).is_err());

        // Neither attempt may touch the grid or the history.
        assert_eq!(*state.board(), Board::startpos());
        assert_eq!(state.history_len(), 1);
    }

    #[test]
    fn apply_and_rollback_round_trip() {
        let mut state = BoardState::new();
        let before = *state.board();

        state.apply(Move::new(sq(5, 0), sq(4, 1)), 0).unwrap();
        assert_ne!(*state.board(), before);
        assert_eq!(state.history_len(), 2);

        state.rollback();
        assert_eq!(*state.board(), before);
        assert_eq!(state.history_len(), 1);
    }

    #[test]
    fn rollback_undoes_a_whole_capture_chain() {
        let mut board = Board::empty();
        board.set(sq(5, 2), Some(Piece::new(Side::White, PieceKind::Man)));
        board.set(sq(4, 3), Some(Piece::new(Side::Black, PieceKind::Man)));
        board.set(sq(2, 5), Some(Piece::new(Side::Black, PieceKind::Man)));

        let mut state = BoardState::with_board(board);
        let before = *state.board();

        state
            .apply(Move::capture(sq(5, 2), sq(3, 4), sq(4, 3)), 1)
            .unwrap();
        state
            .apply(Move::capture(sq(3, 4), sq(1, 6), sq(2, 5)), 2)
            .unwrap();
        assert_eq!(state.history_len(), 3);

        state.rollback();
        assert_eq!(*state.board(), before);
        assert_eq!(state.history_len(), 1);
    }

    #[test]
    fn rollback_never_pops_the_initial_entry() {
        let mut state = BoardState::new();
        state.rollback();
        state.rollback();
        assert_eq!(state.history_len(), 1);
        assert_eq!(*state.board(), Board::startpos());
    }

    #[test]
    fn man_promotes_on_application() {
        let mut board = Board::empty();
        board.set(sq(1, 2), Some(Piece::new(Side::White, PieceKind::Man)));

        let next = board.with_move_applied(Move::new(sq(1, 2), sq(0, 3)));
        assert_eq!(
            next.get(sq(0, 3)),
            Some(Piece::new(Side::White, PieceKind::King))
        );
    }

    #[test]
    fn king_does_not_double_promote_on_application() {
        let mut board = Board::empty();
        board.set(sq(1, 2), Some(Piece::new(Side::White, PieceKind::King)));

        let next = board.with_move_applied(Move::new(sq(1, 2), sq(0, 3)));
        assert_eq!(
            next.get(sq(0, 3)),
            Some(Piece::new(Side::White, PieceKind::King))
        );
    }

    #[test]
    fn promote_is_a_contract_operation() {
        let mut board = Board::empty();
        board.set(sq(4, 1), Some(Piece::new(Side::Black, PieceKind::Man)));

        board.promote(sq(4, 1)).unwrap();
        assert_eq!(
            board.get(sq(4, 1)),
            Some(Piece::new(Side::Black, PieceKind::King))
        );

        // Promoting a king again is an error and leaves it unchanged.
        assert!(board.promote(sq(4, 1)).is_err());
        assert_eq!(
            board.get(sq(4, 1)),
            Some(Piece::new(Side::Black, PieceKind::King))
        );

        // So is promoting an empty cell.
        assert!(board.promote(sq(3, 2)).is_err());
    }

    #[test]
    fn reset_reseeds_a_single_history_entry() {
        let mut state = BoardState::new();
        state.apply(Move::new(sq(5, 0), sq(4, 1)), 0).unwrap();
        state.reset();
        assert_eq!(state.history_len(), 1);
        assert_eq!(*state.board(), Board::startpos());
    }
}
