/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// The 8x8 grid, pieces, moves, and the live board with its history.
mod board;

/// Definitions of commands to be sent to the engine.
mod cli;

/// Code related to the engine's functionality, such as user input handling.
mod engine;

/// Evaluation of draughts positions.
mod eval;

/// Legal move generation, including the mandatory-capture rule.
mod movegen;

/// Main engine logic; all search related code.
mod search;

/// Misc utility functions, constants, and types.
mod utils;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use eval::*;
pub use movegen::*;
pub use search::*;
pub use utils::*;
