mod callbacks;
mod commands;
#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use teloxide::{
    dispatching::dialogue::{Dialogue, InMemStorage, InMemStorageError},
    prelude::*,
    types::{InlineQuery, Message},
    utils::command::BotCommands,
};
use thiserror::Error;
use tracing::error;

use crate::{
    bot_handler::commands::Context,
    coords::{self, Coordinates},
    export::ExportService,
    messaging::{MessagingError, MessagingService},
    search::{SearchError, SearchService},
};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and show welcome message.")]
    Start,
    #[command(description = "Show this help text.")]
    Help,
    #[command(description = "Search coordinate systems by name or SRID.")]
    Search,
}

/// The state of the command.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub enum CommandState {
    #[default]
    None,
    AwaitingQuery,
}

/// Dialogue type used by all handlers.
pub type CommandDialogue = Dialogue<CommandState, InMemStorage<CommandState>>;

#[derive(Debug, Error)]
pub enum BotHandlerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Export failed: {0}")]
    ExportFailed(String),
    #[error("Something went wrong, please try again later.")]
    Internal,
    #[error("Failed to send message: {0}")]
    MessagingError(#[from] MessagingError),
    #[error("Failed to update dialogue state: {0}")]
    DialogueError(#[from] InMemStorageError),
}

pub type BotHandlerResult<T> = std::result::Result<T, BotHandlerError>;

/// Encapsulates the services behind the bot's update handlers.
pub struct BotHandler {
    pub(crate) messaging_service: Arc<dyn MessagingService>,
    pub(crate) search_service: Arc<dyn SearchService>,
    pub(crate) export_service: Arc<dyn ExportService>,
}

impl BotHandler {
    /// Creates a new `BotHandler` instance.
    pub fn new(
        messaging_service: Arc<dyn MessagingService>,
        search_service: Arc<dyn SearchService>,
        export_service: Arc<dyn ExportService>,
    ) -> Self {
        Self { messaging_service, search_service, export_service }
    }

    /// Dispatches the incoming command to the appropriate handler.
    pub async fn handle_commands(
        &self,
        msg: &Message,
        cmd: Command,
        dialogue: CommandDialogue,
    ) -> BotHandlerResult<()> {
        let ctx = Context { handler: self, message: msg, dialogue: &dialogue };
        match cmd {
            Command::Start => commands::start::handle(ctx).await,
            Command::Help => commands::help::handle(ctx).await,
            Command::Search => commands::search::handle(ctx).await,
        }
    }

    /// Handles a force-reply response when we are waiting for a search query.
    pub async fn handle_reply(
        &self,
        msg: &Message,
        dialogue: &CommandDialogue,
    ) -> BotHandlerResult<()> {
        let state = dialogue.get().await.map_err(BotHandlerError::DialogueError)?;
        match (state, msg.text()) {
            (Some(CommandState::AwaitingQuery), Some(text)) => {
                self.process_text(msg.chat.id, text).await?;
                dialogue.exit().await.map_err(BotHandlerError::DialogueError)?;
            }
            _ => {
                self.messaging_service
                    .send_error_msg(
                        msg.chat.id,
                        BotHandlerError::InvalidInput("I was not waiting for a reply.".to_string()),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// Handles a plain text message: a coordinate pair lists the systems
    /// covering that point, anything else is a search query.
    pub async fn handle_text(&self, msg: &Message) -> BotHandlerResult<()> {
        let Some(text) = msg.text() else {
            return Ok(());
        };
        self.process_text(msg.chat.id, text).await
    }

    /// Routes a callback query by its data prefix.
    pub async fn handle_callback_query(
        &self,
        query: &CallbackQuery,
        dialogue: CommandDialogue,
    ) -> BotHandlerResult<()> {
        let Some(data) = query.data.as_deref() else {
            return Ok(());
        };

        if let Some(srid) = data.strip_prefix("crs_") {
            return callbacks::select::handle(self, query, srid).await;
        }
        if data.starts_with("export_") {
            return callbacks::export::handle(self, query, data).await;
        }

        let chat_id = resolve_target_chat(query);
        match data {
            "menu_help" => {
                self.messaging_service.answer_callback_query(&query.id, "").await?;
                self.messaging_service.send_help_msg(chat_id).await?;
            }
            "menu_search" => {
                self.messaging_service.answer_callback_query(&query.id, "").await?;
                self.messaging_service.prompt_for_query(chat_id).await?;
                dialogue.update(CommandState::AwaitingQuery).await?;
            }
            other => {
                self.messaging_service
                    .answer_callback_query(&query.id, &format!("Unknown action: {other}"))
                    .await?;
            }
        }
        Ok(())
    }

    /// Answers an inline query with matching coordinate systems.
    pub async fn handle_inline_query(&self, query: &InlineQuery) -> BotHandlerResult<()> {
        let records = match self.search_service.search(&query.query).await {
            Ok(records) => records,
            Err(SearchError::QueryTooShort(_)) => Vec::new(),
            Err(e) => {
                error!("Inline query search failed: {e}");
                Vec::new()
            }
        };
        self.messaging_service.answer_inline_query(&query.id, records).await?;
        Ok(())
    }

    async fn process_text(&self, chat_id: ChatId, text: &str) -> BotHandlerResult<()> {
        if coords::looks_like_coordinates(text) {
            return match text.parse::<Coordinates>() {
                Ok(coords) => self.process_point(chat_id, coords).await,
                Err(e) => {
                    self.messaging_service
                        .send_error_msg(chat_id, BotHandlerError::InvalidInput(e.to_string()))
                        .await?;
                    Ok(())
                }
            };
        }
        self.process_query(chat_id, text).await
    }

    /// Runs a text search and reports the results.
    async fn process_query(&self, chat_id: ChatId, text: &str) -> BotHandlerResult<()> {
        match self.search_service.search(text).await {
            Ok(records) if records.is_empty() => {
                self.messaging_service.send_search_empty_msg(chat_id, text).await?;
            }
            Ok(records) => {
                self.messaging_service.send_search_results_msg(chat_id, records).await?;
            }
            Err(e @ SearchError::QueryTooShort(_)) => {
                self.messaging_service
                    .send_error_msg(chat_id, BotHandlerError::InvalidInput(e.to_string()))
                    .await?;
            }
            Err(e) => {
                error!("Search failed: {e}");
                self.messaging_service.send_error_msg(chat_id, BotHandlerError::Internal).await?;
            }
        }
        Ok(())
    }

    async fn process_point(&self, chat_id: ChatId, coords: Coordinates) -> BotHandlerResult<()> {
        match self.search_service.locate(coords).await {
            Ok(matches) if matches.is_empty() => {
                self.messaging_service
                    .send_search_empty_msg(chat_id, &coords.to_string())
                    .await?;
            }
            Ok(matches) => {
                self.messaging_service.send_point_matches_msg(chat_id, coords, matches).await?;
            }
            Err(e) => {
                error!("Point lookup failed: {e}");
                self.messaging_service.send_error_msg(chat_id, BotHandlerError::Internal).await?;
            }
        }
        Ok(())
    }
}

/// The chat an answer to a callback query should go to. Callbacks from inline
/// messages carry no message at all, so the last resort is the private chat
/// with the user who pressed the button.
pub(crate) fn resolve_target_chat(query: &CallbackQuery) -> ChatId {
    match &query.message {
        Some(message) => message.chat().id,
        None => ChatId(query.from.id.0 as i64),
    }
}
