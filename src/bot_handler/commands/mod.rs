pub mod help;
pub mod search;
pub mod start;

use teloxide::prelude::*;

use crate::bot_handler::{BotHandler, CommandDialogue};

/// Groups the data needed by all command handlers.
pub struct Context<'a> {
    pub handler: &'a BotHandler,
    pub message: &'a Message,
    pub dialogue: &'a CommandDialogue,
}
