/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use clap::Parser;

use crate::Square;

/// A command to be sent to the engine.
#[derive(Debug, Clone, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<ENGINE COMMAND>")
)]
pub enum EngineCommand {
    /// Print a visual representation of the current position.
    #[command(alias = "d")]
    Display,

    /// Print the static evaluation of the current position.
    Eval,

    /// Quit the engine.
    #[command(aliases = ["quit", "q"])]
    Exit,

    /// Have the bot play one full turn for the side to move.
    Go,

    /// Apply a move for the side to move, e.g. `move c3-d4` or `move c3xe5`.
    ///
    /// A capture chain is entered jump by jump; the same side stays on
    /// move until its chain is exhausted.
    #[command(alias = "m")]
    Move { mv: String },

    /// Show all legal moves for the side to move, or for one piece.
    Moves { square: Option<Square> },

    /// Start a fresh game from the standard starting position.
    #[command(aliases = ["new", "replay"])]
    NewGame,

    /// Display the current value of the specified setting.
    Option { name: String },

    /// Play bot turns from the current position until the game ends.
    SelfPlay,

    /// Change a setting, e.g. `set BlackBotLevel 6`.
    Set { name: String, value: String },

    /// Take back the last full turn (and the bot's reply, if playing one).
    #[command(alias = "back")]
    Undo,
}

impl FromStr for EngineCommand {
    type Err = clap::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse_from(s.split_ascii_whitespace())
    }
}
