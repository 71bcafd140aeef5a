/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt, io,
    sync::mpsc::{channel, Receiver, Sender},
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::{
    BoardState, EngineCommand, Evaluator, Move, MoveGenerator, ScoringMode, Search, SearchConfig,
    Side, Square,
};

/// Optimization level of the search. `O0` disables the alpha-beta early
/// return; any other level enables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    O0,
    #[default]
    O1,
}

impl std::str::FromStr for OptLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        // Anything that isn't O0 enables the cutoff.
        match s {
            "O0" => Ok(Self::O0),
            _ => Ok(Self::O1),
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::O0 => f.write_str("O0"),
            Self::O1 => f.write_str("O1"),
        }
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Draw,
    Win(Side),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draw => write!(f, "game over: draw"),
            Self::Win(side) => write!(f, "game over: {side} wins"),
        }
    }
}

/// Runtime settings.
///
/// There is no settings file; values change through the `set` command and
/// are validated there, so the search and generation core never re-checks
/// them.
#[derive(Debug, Clone)]
pub struct Config {
    /// Search depth used when White is played by the bot.
    pub white_bot_level: usize,

    /// Search depth used when Black is played by the bot.
    pub black_bot_level: usize,

    pub is_white_bot: bool,
    pub is_black_bot: bool,

    /// Seed the shuffle RNG with 0, making move choice reproducible.
    pub no_random: bool,

    pub scoring: ScoringMode,
    pub optimization: OptLevel,

    /// The game is declared a draw after this many turns.
    pub max_turns: u32,

    /// Pacing delay applied around bot moves.
    pub bot_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            white_bot_level: 4,
            black_bot_level: 4,
            is_white_bot: false,
            is_black_bot: true,
            no_random: false,
            scoring: ScoringMode::default(),
            optimization: OptLevel::default(),
            max_turns: 130,
            bot_delay_ms: 250,
        }
    }
}

impl Config {
    pub fn bot_level(&self, side: Side) -> usize {
        match side {
            Side::White => self.white_bot_level,
            Side::Black => self.black_bot_level,
        }
    }

    pub fn is_bot(&self, side: Side) -> bool {
        match side {
            Side::White => self.is_white_bot,
            Side::Black => self.is_black_bot,
        }
    }

    /// Sets the setting `name` to `value`.
    ///
    /// Returns an error if `name` isn't a known setting or `value` doesn't
    /// parse for it.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "WhiteBotLevel" => self.white_bot_level = parse_number(name, value)?,
            "BlackBotLevel" => self.black_bot_level = parse_number(name, value)?,
            "IsWhiteBot" => self.is_white_bot = parse_bool(name, value)?,
            "IsBlackBot" => self.is_black_bot = parse_bool(name, value)?,
            "NoRandom" => self.no_random = parse_bool(name, value)?,
            "BotScoringType" => self.scoring = value.parse()?,
            "Optimization" => self.optimization = value.parse()?,
            "MaxNumTurns" => self.max_turns = parse_number(name, value)?,
            "BotDelayMS" => self.bot_delay_ms = parse_number(name, value)?,
            _ => bail!("no setting named {name:?}"),
        }
        Ok(())
    }

    /// Returns the current value of the setting `name`, if it exists.
    pub fn get(&self, name: &str) -> Option<String> {
        let value = match name {
            "WhiteBotLevel" => self.white_bot_level.to_string(),
            "BlackBotLevel" => self.black_bot_level.to_string(),
            "IsWhiteBot" => self.is_white_bot.to_string(),
            "IsBlackBot" => self.is_black_bot.to_string(),
            "NoRandom" => self.no_random.to_string(),
            "BotScoringType" => self.scoring.to_string(),
            "Optimization" => self.optimization.to_string(),
            "MaxNumTurns" => self.max_turns.to_string(),
            "BotDelayMS" => self.bot_delay_ms.to_string(),
            _ => return None,
        };

        Some(value)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => bail!("invalid value {value:?} for {name}: expected a boolean"),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid value {value:?} for {name}: expected a number"))
}

/// The draughts engine: the live board, the settings, and the event loop
/// tying them to user commands.
#[derive(Debug)]
pub struct Engine {
    /// The live board, with the snapshot history used for undo.
    state: BoardState,

    config: Config,

    /// Shared legal-move source for play, search, and display.
    movegen: MoveGenerator,

    /// Turn counter; White moves on even turns.
    turn: u32,

    /// Captures made so far in the human turn currently being entered.
    beat_series: u32,

    /// Set while a human capture chain is in progress: only the piece on
    /// this square may move, and only by capturing.
    chain_from: Option<Square>,

    outcome: Option<Outcome>,

    /// One half of a channel, responsible for sending commands to the engine to execute.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands for the engine to execute.
    receiver: Receiver<EngineCommand>,
}

impl Engine {
    /// Constructs a new [`Engine`] instance to be executed with [`Engine::run`].
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        let config = Config::default();
        let movegen = MoveGenerator::new(config.no_random.then_some(0));

        Self {
            state: BoardState::new(),
            config,
            movegen,
            turn: 0,
            beat_series: 0,
            chain_from: None,
            outcome: None,
            sender,
            receiver,
        }
    }

    /// Returns a string of the engine's name and current version.
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Sends an [`EngineCommand`] to the engine to be executed.
    pub fn send_command(&self, command: EngineCommand) {
        // Safe unwrap: `send` can only fail if its corresponding receiver doesn't exist,
        //  and the only way our engine's `Receiver` can no longer exist is when our engine
        //  doesn't exist either, so this is always safe.
        self.sender.send(command).unwrap();
    }

    /// Execute the main event loop for the engine.
    ///
    /// This function spawns a thread to handle input from `stdin` and waits on received commands.
    pub fn run(&mut self) -> Result<()> {
        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                eprintln!("Input handler thread stopping after fatal error: {err}");
            }
        });

        println!("{}", self.name());

        // Loop on user input
        while let Ok(cmd) = self.receiver.recv() {
            match cmd {
                EngineCommand::Display => self.display(),

                EngineCommand::Eval => self.eval(),

                EngineCommand::Exit => break,

                EngineCommand::Go => {
                    if let Err(e) = self.go() {
                        eprintln!("Error: {e}");
                    }
                }

                EngineCommand::Move { mv } => {
                    if let Err(e) = self.play_move(&mv) {
                        eprintln!("Error: {e}");
                    }
                }

                EngineCommand::Moves { square } => self.moves(square),

                EngineCommand::NewGame => self.new_game(),

                EngineCommand::Option { name } => {
                    if let Some(value) = self.config.get(&name) {
                        println!("{name} := {value}");
                    } else {
                        println!("{} has no option {name:?}", self.name());
                    }
                }

                EngineCommand::SelfPlay => {
                    if let Err(e) = self.selfplay() {
                        eprintln!("Error: {e}");
                    }
                }

                EngineCommand::Set { name, value } => {
                    if let Err(e) = self.set_option(&name, &value) {
                        eprintln!("Error: {e}");
                    }
                }

                EngineCommand::Undo => self.undo(),
            }
        }

        Ok(())
    }

    /// The side whose turn it is.
    fn side_to_move(&self) -> Side {
        if self.turn % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }

    /// Executes the `display` command, printing the current position.
    fn display(&self) {
        println!("{}", self.state.board());
        match self.outcome {
            Some(outcome) => println!("{outcome}"),
            None => println!("{} to move", self.side_to_move()),
        }
    }

    /// Executes the `eval` command, printing an evaluation of the current
    /// position for the side to move. Lower is better.
    fn eval(&self) {
        let evaluator = Evaluator::new(self.config.scoring);
        println!(
            "{}",
            evaluator.score(self.state.board(), self.side_to_move())
        );
    }

    /// Executes the `moves` command, listing legal moves.
    fn moves(&mut self, square: Option<Square>) {
        let board = *self.state.board();
        let list = match square.or(self.chain_from) {
            Some(sq) => self.movegen.legal_moves_for_piece(&board, sq),
            None => self.movegen.legal_moves(&board, self.side_to_move()),
        };

        // If there are none, print "(none)"
        let moves_string = if list.is_empty() {
            String::from("(none)")
        } else {
            list.iter()
                .map(|mv| mv.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("{moves_string}");
    }

    /// Resets the engine's internal game state to a fresh game.
    fn new_game(&mut self) {
        self.state.reset();
        self.turn = 0;
        self.beat_series = 0;
        self.chain_from = None;
        self.outcome = None;
    }

    /// Handles the `set` command; re-seeds the move shuffle when the
    /// `NoRandom` setting changes so determinism takes effect immediately.
    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        self.config.set(name, value)?;
        if name == "NoRandom" {
            self.movegen = MoveGenerator::new(self.config.no_random.then_some(0));
        }
        Ok(())
    }

    /// Applies one player move, entered as a from/to pair.
    ///
    /// The input is matched against the generated legal moves, so the
    /// captured square is resolved here. A capture that leaves further
    /// captures for the same piece keeps the same side on move.
    fn play_move(&mut self, input: &str) -> Result<()> {
        if let Some(outcome) = self.outcome {
            bail!("{outcome}");
        }

        let probe: Move = input.parse()?;
        let side = self.side_to_move();
        let board = *self.state.board();

        let list = match self.chain_from {
            Some(sq) => self.movegen.legal_moves_for_piece(&board, sq),
            None => self.movegen.legal_moves(&board, side),
        };

        let Some(mv) = list.find(probe) else {
            bail!("{probe} is not a legal move for {side}");
        };

        self.beat_series = if mv.is_capture() {
            self.beat_series + 1
        } else {
            0
        };
        self.state.apply(mv, self.beat_series)?;
        println!("{side} plays {mv}");

        // A mandatory chain keeps the same side on move.
        if mv.is_capture() {
            let continuation = self.movegen.legal_moves_for_piece(self.state.board(), mv.to);
            if continuation.forced_capture {
                self.chain_from = Some(mv.to);
                println!("capture chain continues from {}", mv.to);
                return Ok(());
            }
        }

        self.finish_turn();

        // The configured bot replies on its own turn.
        if self.outcome.is_none() {
            let next = self.side_to_move();
            if self.config.is_bot(next) {
                self.bot_turn(next)?;
                self.finish_turn();
            }
        }

        Ok(())
    }

    /// Executes the `go` command: one full bot turn for the side to move.
    fn go(&mut self) -> Result<()> {
        if let Some(outcome) = self.outcome {
            bail!("{outcome}");
        }
        if self.chain_from.is_some() {
            bail!("a capture chain is in progress; finish it with `move`");
        }

        let side = self.side_to_move();
        self.bot_turn(side)?;
        self.finish_turn();
        Ok(())
    }

    /// Executes the `selfplay` command: bot turns until the game ends or a
    /// side that isn't bot-controlled comes on move.
    fn selfplay(&mut self) -> Result<()> {
        if self.chain_from.is_some() {
            bail!("a capture chain is in progress; finish it with `move`");
        }

        while self.outcome.is_none() {
            let side = self.side_to_move();
            if !self.config.is_bot(side) {
                println!("{side} is not bot-controlled; use `move`, or `set Is{side}Bot 1`");
                break;
            }
            self.bot_turn(side)?;
            self.finish_turn();
        }

        self.display();
        Ok(())
    }

    /// Searches for and applies the bot's turn for `side`.
    ///
    /// The pacing delay elapses on its own thread while the search runs
    /// here; the sequence is applied only after both have finished, with
    /// the delay repeated between the sub-moves of a capture chain.
    fn bot_turn(&mut self, side: Side) -> Result<()> {
        let start = Instant::now();
        let delay = Duration::from_millis(self.config.bot_delay_ms);
        let pacer = thread::spawn(move || thread::sleep(delay));

        let board = *self.state.board();
        let config = SearchConfig {
            max_depth: self.config.bot_level(side),
            alpha_beta: self.config.optimization != OptLevel::O0,
        };
        let evaluator = Evaluator::new(self.config.scoring);
        let sequence =
            Search::new(&mut self.movegen, evaluator, config).find_best_sequence(&board, side);

        if pacer.join().is_err() {
            eprintln!("Failed to join the pacing thread");
        }

        // No moves to play: `side` has lost.
        if sequence.is_empty() {
            self.outcome = Some(Outcome::Win(side.opponent()));
            return Ok(());
        }

        let mut beat_series = 0;
        for (i, mv) in sequence.into_iter().enumerate() {
            if i > 0 {
                thread::sleep(delay);
            }
            beat_series += mv.is_capture() as u32;
            self.state.apply(mv, beat_series)?;
            println!("{side} plays {mv}");
        }

        println!(
            "info turn {} searched in {} ms",
            self.turn,
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Closes out the turn being entered: advances the turn counter and
    /// checks whether the game has ended.
    fn finish_turn(&mut self) {
        self.chain_from = None;
        self.beat_series = 0;

        if self.outcome.is_none() {
            self.turn += 1;
            self.check_outcome();
        }

        if let Some(outcome) = self.outcome {
            println!("{outcome}");
        }
    }

    /// Declares a draw at the turn cap, or a win when the side to move has
    /// no legal moves. No-move situations are terminal states, not errors.
    fn check_outcome(&mut self) {
        if self.outcome.is_some() {
            return;
        }

        if self.turn >= self.config.max_turns {
            self.outcome = Some(Outcome::Draw);
            return;
        }

        let board = *self.state.board();
        let side = self.side_to_move();
        if self.movegen.legal_moves(&board, side).is_empty() {
            self.outcome = Some(Outcome::Win(side.opponent()));
        }
    }

    /// Executes the `undo` command, taking back the last full turn.
    ///
    /// When the side coming on move is a bot, its reply was just undone,
    /// so the turn underneath is taken back as well and the human is back
    /// on move. An in-progress capture chain is abandoned with its turn.
    fn undo(&mut self) {
        if self.state.history_len() <= 1 {
            println!("nothing to undo");
            return;
        }

        self.chain_from = None;
        self.beat_series = 0;
        self.outcome = None;

        self.state.rollback();
        self.turn = self.turn.saturating_sub(1);

        if self.config.is_bot(self.side_to_move()) && self.state.history_len() > 1 {
            self.state.rollback();
            self.turn = self.turn.saturating_sub(1);
        }
    }

    #[cfg(test)]
    fn set_position(&mut self, board: crate::Board) {
        self.state = BoardState::with_board(board);
        self.turn = 0;
        self.beat_series = 0;
        self.chain_from = None;
        self.outcome = None;
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048); // Seems like a good amount of space to pre-allocate

    loop {
        // Clear the buffer, read input, and trim the trailing newline
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing commands")?;

        // For ctrl + d
        if 0 == bytes {
            // Send the Exit command and exit this function
            sender
                .send(EngineCommand::Exit)
                .context("Failed to send 'exit' command after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        // Trim any leading/trailing whitespace
        let buf = buffer.trim();

        // Ignore empty lines
        if buf.is_empty() {
            continue;
        }

        match EngineCommand::try_parse_from(buf.split_ascii_whitespace()) {
            // If successful, send the command to the engine
            Ok(cmd) => sender
                .send(cmd)
                .context("Failed to send command to engine")?,

            // If an invalid command was received, just print the error and continue running
            Err(err) => eprintln!("{err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, Piece, PieceKind};

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col)
    }

    /// An engine with no bot opponent and no pacing delay.
    fn manual_engine() -> Engine {
        let mut engine = Engine::new();
        engine.set_option("IsBlackBot", "0").unwrap();
        engine.set_option("BotDelayMS", "0").unwrap();
        engine.set_option("NoRandom", "1").unwrap();
        engine
    }

    #[test]
    fn config_set_and_get_round_trip() {
        let mut config = Config::default();

        config.set("BlackBotLevel", "6").unwrap();
        assert_eq!(config.black_bot_level, 6);
        assert_eq!(config.get("BlackBotLevel").as_deref(), Some("6"));

        config.set("BotScoringType", "Number").unwrap();
        assert_eq!(config.scoring, ScoringMode::Number);

        config.set("Optimization", "O0").unwrap();
        assert_eq!(config.optimization, OptLevel::O0);

        assert!(config.set("NoSuchSetting", "1").is_err());
        assert!(config.set("MaxNumTurns", "many").is_err());
        assert!(config.set("IsWhiteBot", "maybe").is_err());
        assert_eq!(config.get("NoSuchSetting"), None);
    }

    #[test]
    fn play_move_applies_legal_input_and_rejects_the_rest() {
        let mut engine = manual_engine();

        // Not a legal move from the start position.
        assert!(engine.play_move("c3-c4").is_err());
        // Not parseable at all.
        assert!(engine.play_move("onward!").is_err());

        engine.play_move("c3-d4").unwrap();
        assert_eq!(engine.side_to_move(), Side::Black);
        assert_eq!(engine.state.history_len(), 2);
    }

    #[test]
    fn human_capture_chain_keeps_the_side_on_move() {
        let mut engine = manual_engine();

        let mut board = Board::empty();
        board.set(sq(5, 2), Some(Piece::new(Side::White, PieceKind::Man)));
        board.set(sq(4, 3), Some(Piece::new(Side::Black, PieceKind::Man)));
        board.set(sq(2, 5), Some(Piece::new(Side::Black, PieceKind::Man)));
        board.set(sq(0, 1), Some(Piece::new(Side::Black, PieceKind::Man)));
        engine.set_position(board);

        // First jump; the chain must continue, so White stays on move.
        engine.play_move("c3-e5").unwrap();
        assert_eq!(engine.side_to_move(), Side::White);
        assert_eq!(engine.chain_from, Some(sq(3, 4)));

        // Mid-chain, only the chaining piece may move.
        assert!(engine.play_move("b8-a7").is_err());

        // Second jump finishes the chain and the turn.
        engine.play_move("e5-g7").unwrap();
        assert_eq!(engine.side_to_move(), Side::Black);
        assert_eq!(engine.chain_from, None);

        // Both captured men are gone.
        assert_eq!(engine.state.board().pieces(Side::Black).count(), 1);
    }

    #[test]
    fn undo_takes_back_a_full_turn() {
        let mut engine = manual_engine();
        let before = *engine.state.board();

        engine.play_move("c3-d4").unwrap();
        engine.undo();

        assert_eq!(*engine.state.board(), before);
        assert_eq!(engine.side_to_move(), Side::White);
        assert_eq!(engine.state.history_len(), 1);
    }

    #[test]
    fn stuck_side_loses() {
        let mut engine = manual_engine();

        // Black's only man is wedged against the edge: its one forward
        // square is occupied and the jump over it lands on another man.
        let mut board = Board::empty();
        board.set(sq(5, 0), Some(Piece::new(Side::Black, PieceKind::Man)));
        board.set(sq(6, 1), Some(Piece::new(Side::White, PieceKind::Man)));
        board.set(sq(7, 2), Some(Piece::new(Side::White, PieceKind::Man)));
        board.set(sq(5, 6), Some(Piece::new(Side::White, PieceKind::Man)));
        engine.set_position(board);

        // White moves elsewhere; Black then has no legal moves.
        engine.play_move("g3-f4").unwrap();
        assert_eq!(engine.outcome, Some(Outcome::Win(Side::White)));
    }

    #[test]
    fn turn_cap_is_a_draw() {
        let mut engine = manual_engine();
        engine.set_option("MaxNumTurns", "1").unwrap();

        engine.play_move("c3-d4").unwrap();
        assert_eq!(engine.outcome, Some(Outcome::Draw));
    }
}
