#[cfg(test)]
mod tests;

use async_trait::async_trait;
use lazy_static::lazy_static;
use mockall::automock;
use teloxide::{
    prelude::*,
    types::{
        ChatId, ForceReply, InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryResult,
        InlineQueryResultArticle, InputFile, InputMessageContent, InputMessageContentText,
        ParseMode,
    },
    utils::{command::BotCommands, html},
};
use thiserror::Error;

use crate::{
    bot_handler::{BotHandlerError, Command},
    coords::Coordinates,
    export::{ExportFormat, ExportedFile},
    search::PointMatch,
    storage::CrsRecord,
};

/// Longest WKT/proj4 excerpt embedded in a message before truncation.
const MAX_DEFINITION_EXCERPT: usize = 1000;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Teloxide API request failed: {0}")]
    TeloxideRequest(#[from] teloxide::RequestError),
}

type Result<T> = std::result::Result<T, MessagingError>;

/// Trait for sending messages to the user.
#[automock]
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Sends a text message to the provided chat with a keyboard. If no
    /// keyboard is provided, the default command keyboard is used.
    async fn send_response_with_keyboard(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()>;

    /// Sends a start message to the user.
    async fn send_start_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Sends a help message to the user.
    async fn send_help_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Prompts the user for a search query.
    async fn prompt_for_query(&self, chat_id: ChatId) -> Result<()>;

    /// Sends an error message to the provided chat.
    async fn send_error_msg(&self, chat_id: ChatId, error: BotHandlerError) -> Result<()>;

    /// Sends a message to the user that the search found nothing.
    async fn send_search_empty_msg(&self, chat_id: ChatId, query: &str) -> Result<()>;

    /// Sends search results as a keyboard with one button per record.
    async fn send_search_results_msg(
        &self,
        chat_id: ChatId,
        records: Vec<CrsRecord>,
    ) -> Result<()>;

    /// Sends the details of a selected record with the export format
    /// keyboard.
    async fn send_export_menu_msg(&self, chat_id: ChatId, record: &CrsRecord) -> Result<()>;

    /// Sends coordinate systems applicable at a point, with projected
    /// coordinates where available.
    async fn send_point_matches_msg(
        &self,
        chat_id: ChatId,
        coords: Coordinates,
        matches: Vec<PointMatch>,
    ) -> Result<()>;

    /// Delivers an exported file as a document.
    async fn send_document(&self, chat_id: ChatId, file: &ExportedFile) -> Result<()>;

    /// Sends a callback query answer to the user when they click on a button.
    async fn answer_callback_query(&self, query_id: &str, text: &str) -> Result<()>;

    /// Answers an inline query with one article per search hit. Each article
    /// message carries the export keyboard.
    async fn answer_inline_query(&self, query_id: &str, records: Vec<CrsRecord>) -> Result<()>;
}

/// Telegram messaging service.
pub struct TelegramMessagingService {
    bot: Bot,
}

impl TelegramMessagingService {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn format_record_details(record: &CrsRecord) -> String {
        let mut text = format!(
            "🌐 <b>{}</b>\nSRID: <code>{}</code>",
            html::escape(&record.display_name()),
            record.srid
        );
        if let Some(srtext) = record.srtext.as_deref().filter(|s| !s.is_empty()) {
            text.push_str(&format!("\n\nWKT:\n<code>{}</code>", html::escape(&excerpt(srtext))));
        }
        if let Some(proj4) = record.proj4text.as_deref().filter(|s| !s.is_empty()) {
            text.push_str(&format!("\n\nproj4:\n<code>{}</code>", html::escape(&excerpt(proj4))));
        }
        text.push_str("\n\nChoose an export format:");
        text
    }

    fn format_point_matches(coords: Coordinates, matches: &[PointMatch]) -> String {
        let mut lines = vec![format!(
            "📍 Coordinate systems at <code>{}</code>:",
            html::escape(&coords.to_string())
        )];
        for m in matches {
            let mut line =
                format!("\n<b>{}</b> (SRID <code>{}</code>)", html::escape(&m.name), m.srid);
            if let Some(info) = m.info.as_deref().filter(|i| !i.is_empty()) {
                line.push_str(&format!("\n{}", html::escape(info)));
            }
            match m.projected {
                Some((x, y)) => line.push_str(&format!("\nx = {x:.3}, y = {y:.3}")),
                None => line.push_str("\n(point could not be projected)"),
            }
            lines.push(line);
        }
        lines.push("\nTap a button to export one of them:".to_string());
        lines.join("\n")
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= MAX_DEFINITION_EXCERPT {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_DEFINITION_EXCERPT).collect();
    format!("{cut}…")
}

#[async_trait]
impl MessagingService for TelegramMessagingService {
    async fn send_response_with_keyboard(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        // If no keyboard is provided, use the default command keyboard.
        let keyboard = keyboard.unwrap_or(COMMAND_KEYBOARD.clone());

        self.bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn send_start_msg(&self, chat_id: ChatId) -> Result<()> {
        let start_text = "👋 Welcome! Send me a coordinate system name or SRID, or a \
                          coordinate pair like <code>55.7558;37.6173</code>, and I will find \
                          matching coordinate systems and export them for CAD/GIS software.";
        self.send_response_with_keyboard(chat_id, start_text.to_string(), None).await
    }

    async fn send_help_msg(&self, chat_id: ChatId) -> Result<()> {
        let help_text = format!(
            "{}\n\nYou can also send me text directly:\n\
             - a name or SRID searches the registry,\n\
             - <code>lat;lon</code> (also <code>$</code> or <code>%</code> as separator, \
             degrees-minutes-seconds accepted) lists systems covering that point.",
            Command::descriptions()
        );
        self.send_response_with_keyboard(chat_id, help_text, None).await
    }

    async fn prompt_for_query(&self, chat_id: ChatId) -> Result<()> {
        let prompt = "Please reply with a coordinate system name or SRID.";
        self.bot
            .send_message(chat_id, prompt)
            .reply_markup(ForceReply::new())
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn send_error_msg(&self, chat_id: ChatId, error: BotHandlerError) -> Result<()> {
        self.send_response_with_keyboard(chat_id, html::escape(&error.to_string()), None).await
    }

    async fn send_search_empty_msg(&self, chat_id: ChatId, query: &str) -> Result<()> {
        let text = format!("Nothing found for <code>{}</code>.", html::escape(query));
        self.send_response_with_keyboard(chat_id, text, None).await
    }

    async fn send_search_results_msg(
        &self,
        chat_id: ChatId,
        records: Vec<CrsRecord>,
    ) -> Result<()> {
        let keyboard = build_search_results_keyboard(&records);
        self.send_response_with_keyboard(
            chat_id,
            "🔍 Found coordinate systems:".to_string(),
            Some(keyboard),
        )
        .await
    }

    async fn send_export_menu_msg(&self, chat_id: ChatId, record: &CrsRecord) -> Result<()> {
        let text = Self::format_record_details(record);
        self.send_response_with_keyboard(chat_id, text, Some(build_export_keyboard(record.srid)))
            .await
    }

    async fn send_point_matches_msg(
        &self,
        chat_id: ChatId,
        coords: Coordinates,
        matches: Vec<PointMatch>,
    ) -> Result<()> {
        let text = Self::format_point_matches(coords, &matches);
        let keyboard = build_point_matches_keyboard(&matches);
        self.send_response_with_keyboard(chat_id, text, Some(keyboard)).await
    }

    async fn send_document(&self, chat_id: ChatId, file: &ExportedFile) -> Result<()> {
        let document = InputFile::file(file.path.clone()).file_name(file.file_name.clone());
        self.bot
            .send_document(chat_id, document)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn answer_callback_query(&self, query_id: &str, text: &str) -> Result<()> {
        self.bot
            .answer_callback_query(query_id.to_string())
            .text(text)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn answer_inline_query(&self, query_id: &str, records: Vec<CrsRecord>) -> Result<()> {
        let results: Vec<InlineQueryResult> = records
            .iter()
            .map(|record| {
                let content = InputMessageContentText::new(Self::format_record_details(record))
                    .parse_mode(ParseMode::Html);
                let article = InlineQueryResultArticle::new(
                    record.srid.to_string(),
                    record.display_name(),
                    InputMessageContent::Text(content),
                )
                .description(format!("SRID {}", record.srid))
                .reply_markup(build_export_keyboard(record.srid));
                InlineQueryResult::Article(article)
            })
            .collect();

        self.bot
            .answer_inline_query(query_id.to_string(), results)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }
}

/// One button per record, callback `crs_{srid}`.
fn build_search_results_keyboard(records: &[CrsRecord]) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = records
        .iter()
        .map(|record| {
            vec![InlineKeyboardButton::callback(
                record.to_string(),
                format!("crs_{}", record.srid),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// One button per point match, callback `crs_{srid}`.
fn build_point_matches_keyboard(matches: &[PointMatch]) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = matches
        .iter()
        .map(|m| {
            vec![InlineKeyboardButton::callback(
                format!("{} ({})", m.name, m.srid),
                format!("crs_{}", m.srid),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// One button per export format, callback `export_{token}_{srid}`.
fn build_export_keyboard(srid: i32) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = ExportFormat::ALL
        .iter()
        .map(|format| {
            vec![InlineKeyboardButton::callback(
                format.key().to_string(),
                format!("export_{}_{srid}", format.callback_token()),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

lazy_static! {
    static ref COMMAND_KEYBOARD: InlineKeyboardMarkup = InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("ℹ️ Help", "menu_help")],
        vec![InlineKeyboardButton::callback("🔍 New search", "menu_search")],
    ]);
}
