use std::sync::Arc;

use teloxide::{
    dispatching::{
        DefaultKey, DpHandlerDescription,
        dialogue::{Dialogue, InMemStorage},
    },
    dptree::{deps, filter_map},
    prelude::*,
    types::{InlineQuery, Update},
};

use crate::bot_handler::{BotHandler, BotHandlerError, Command, CommandState, resolve_target_chat};

/// Type alias to simplify handler type signatures.
type BotResultHandler =
    Handler<'static, DependencyMap, Result<(), BotHandlerError>, DpHandlerDescription>;

/// Encapsulates the dispatcher logic for the bot.
pub struct BotDispatcher {
    handler: Arc<BotHandler>,
    dialogue_storage: Arc<InMemStorage<CommandState>>,
}

impl BotDispatcher {
    /// Creates a new `BotDispatcher`.
    pub fn new(handler: Arc<BotHandler>, dialogue_storage: Arc<InMemStorage<CommandState>>) -> Self {
        Self { handler, dialogue_storage }
    }

    /// Builds the dispatcher using the provided `bot` instance.
    #[must_use = "This function returns a Dispatcher that should not be ignored"]
    pub fn build(&self, bot: Bot) -> Dispatcher<Bot, BotHandlerError, DefaultKey> {
        Dispatcher::builder(
            bot,
            dptree::entry()
                .branch(self.build_commands_branch())
                .branch(self.build_callback_queries_branch())
                .branch(self.build_inline_queries_branch())
                .branch(self.build_force_reply_branch())
                .branch(self.build_text_branch()),
        )
        .dependencies(deps![self.dialogue_storage.clone(), self.handler.clone()])
        .enable_ctrlc_handler()
        .build()
    }

    /// Builds the branch for handling text commands.
    fn build_commands_branch(&self) -> BotResultHandler {
        Update::filter_message()
            .filter_command::<Command>()
            .chain(filter_map(extract_dialogue))
            .endpoint(
                |msg: Message,
                 cmd: Command,
                 dialogue: Dialogue<CommandState, InMemStorage<CommandState>>,
                 handler: Arc<BotHandler>| async move {
                    handler.handle_commands(&msg, cmd, dialogue).await
                },
            )
    }

    /// Builds the branch for handling callback queries. Routing by the data
    /// prefix happens inside the handler, because export callbacks may arrive
    /// without any chat attached.
    fn build_callback_queries_branch(&self) -> BotResultHandler {
        Update::filter_callback_query().chain(filter_map(extract_callback_dialogue)).endpoint(
            |query: CallbackQuery,
             dialogue: Dialogue<CommandState, InMemStorage<CommandState>>,
             handler: Arc<BotHandler>| async move {
                handler.handle_callback_query(&query, dialogue).await
            },
        )
    }

    /// Builds the branch for handling inline queries (`@bot <query>`).
    fn build_inline_queries_branch(&self) -> BotResultHandler {
        Update::filter_inline_query().endpoint(
            |query: InlineQuery, handler: Arc<BotHandler>| async move {
                handler.handle_inline_query(&query).await
            },
        )
    }

    /// Builds the branch for handling messages that are force-reply responses.
    fn build_force_reply_branch(&self) -> BotResultHandler {
        Update::filter_message()
            .filter(|msg: Message| msg.reply_to_message().is_some())
            .chain(filter_map(extract_dialogue))
            .endpoint(
                |msg: Message,
                 dialogue: Dialogue<CommandState, InMemStorage<CommandState>>,
                 handler: Arc<BotHandler>| async move {
                    handler.handle_reply(&msg, &dialogue).await
                },
            )
    }

    /// Builds the branch for plain text messages: coordinate pairs and ad-hoc
    /// search queries sent without the /search command.
    fn build_text_branch(&self) -> BotResultHandler {
        Update::filter_message()
            .filter(|msg: Message| msg.text().is_some_and(|text| !text.starts_with('/')))
            .endpoint(|msg: Message, handler: Arc<BotHandler>| async move {
                handler.handle_text(&msg).await
            })
    }
}

/// Extracts a dialogue for a callback query. Callbacks from inline messages
/// carry no chat, so the dialogue is keyed by the resolved target chat
/// instead of dropping the update.
fn extract_callback_dialogue(
    query: CallbackQuery,
    storage: Arc<InMemStorage<CommandState>>,
) -> Option<Dialogue<CommandState, InMemStorage<CommandState>>> {
    Some(Dialogue::new(storage, resolve_target_chat(&query)))
}

/// Extracts a dialogue from an update using the provided dialogue storage.
fn extract_dialogue(
    update: Update,
    storage: Arc<InMemStorage<CommandState>>,
) -> Option<Dialogue<CommandState, InMemStorage<CommandState>>> {
    update.chat().map(|chat| Dialogue::new(storage, chat.id))
}
