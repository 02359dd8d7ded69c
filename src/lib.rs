#![warn(missing_docs)]
//! A Telegram bot for finding and exporting coordinate reference systems.
//!
//! The bot looks up CRS records in a PostGIS database by SRID, name or a
//! coordinate pair and exports a selected record as a Civil3D XML or a
//! Global Mapper v20/v25 PRJ file.

/// The main handler for the bot's logic.
pub mod bot_handler;
/// The configuration for the application.
pub mod config;
/// Coordinate input parsing.
pub mod coords;
/// The dispatcher for routing updates to the correct handlers.
pub mod dispatcher;
/// The export pipeline producing CAD/GIS files.
pub mod export;
/// The service for sending messages to the user.
pub mod messaging;
/// Search over the coordinate-system registry.
pub mod search;
/// The storage layer over the PostGIS database.
pub mod storage;

use std::sync::Arc;

use teloxide::{dispatching::dialogue::InMemStorage, prelude::*};

use crate::{
    bot_handler::BotHandler, config::Config, export::FileExportService,
    messaging::TelegramMessagingService, search::DbSearchService, storage::postgres::PgStorage,
};

/// Runs the bot.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let storage = Arc::new(PgStorage::new(&config.database_url).await?);
    let bot = Bot::new(config.telegram_bot_token.clone());

    let messaging_service = Arc::new(TelegramMessagingService::new(bot.clone()));
    let search_service = Arc::new(DbSearchService::new(storage.clone(), config.max_search_results));
    let export_service = Arc::new(FileExportService::new(
        storage.clone(),
        config.output_dir.clone(),
        config.max_field_length,
    ));

    let dialogue_storage = InMemStorage::new();
    let handler = Arc::new(BotHandler::new(messaging_service, search_service, export_service));
    let mut dispatcher = dispatcher::BotDispatcher::new(handler, dialogue_storage).build(bot);
    tracing::debug!("Dispatcher built successfully.");

    dispatcher.dispatch().await;

    Ok(())
}
