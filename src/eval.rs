/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::bail;

use crate::{Board, PieceKind, Score, Side, Square};

/// How the bot scores a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringMode {
    /// Piece counts only, with kings weighted 4.
    Number,

    /// Piece counts with kings weighted 5, plus a small bonus per man
    /// proportional to its advancement toward promotion.
    #[default]
    NumberAndPotential,
}

impl ScoringMode {
    /// King weight relative to a man.
    const fn king_weight(self) -> f64 {
        match self {
            Self::Number => 4.0,
            Self::NumberAndPotential => 5.0,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::NumberAndPotential => "NumberAndPotential",
        }
    }
}

impl FromStr for ScoringMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "Number" => Ok(Self::Number),
            "NumberAndPotential" => Ok(Self::NumberAndPotential),
            _ => bail!("unknown scoring mode {s:?}: expected Number or NumberAndPotential"),
        }
    }
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encapsulates the logic of scoring a draughts position.
///
/// The score is the ratio of opponent strength to own strength, so lower
/// is better for the evaluated side: 0 means the opponent has nothing
/// left, [`Score::INF`] means the evaluated side has nothing left.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    mode: ScoringMode,
}

impl Evaluator {
    #[inline(always)]
    pub const fn new(mode: ScoringMode) -> Self {
        Self { mode }
    }

    /// Evaluate `board` from `perspective`'s point of view.
    pub fn score(&self, board: &Board, perspective: Side) -> Score {
        let potential = self.mode == ScoringMode::NumberAndPotential;

        let (mut w, mut wq, mut b, mut bq) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for row in 0..8u8 {
            for col in 0..8u8 {
                let Some(piece) = board.get(Square::new(row, col)) else {
                    continue;
                };
                match (piece.side, piece.kind) {
                    (Side::White, PieceKind::Man) => {
                        w += 1.0;
                        if potential {
                            w += 0.05 * (7 - row) as f64;
                        }
                    }
                    (Side::White, PieceKind::King) => wq += 1.0,
                    (Side::Black, PieceKind::Man) => {
                        b += 1.0;
                        if potential {
                            b += 0.05 * row as f64;
                        }
                    }
                    (Side::Black, PieceKind::King) => bq += 1.0,
                }
            }
        }

        // Swap the counts so (w, wq) is always the evaluated side's own
        // strength and (b, bq) the opponent's.
        if perspective == Side::Black {
            std::mem::swap(&mut w, &mut b);
            std::mem::swap(&mut wq, &mut bq);
        }

        if w + wq == 0.0 {
            return Score::INF;
        }
        if b + bq == 0.0 {
            return Score::ZERO;
        }

        let q = self.mode.king_weight();
        Score::new((b + bq * q) / (w + wq * q))
    }
}
