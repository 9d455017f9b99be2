//! Command-line front end for the typing-stats leaderboard.

pub mod logging;
pub mod sentences;
pub mod settings;
pub mod terminal_modal;
