use teloxide::types::CallbackQuery;

use crate::bot_handler::{BotHandler, BotHandlerResult, resolve_target_chat};

/// Handles a `crs_{srid}` callback by showing the record's details with the
/// export format keyboard.
pub async fn handle(
    handler: &BotHandler,
    query: &CallbackQuery,
    srid: &str,
) -> BotHandlerResult<()> {
    let chat_id = resolve_target_chat(query);

    let Ok(srid) = srid.parse::<i32>() else {
        handler
            .messaging_service
            .answer_callback_query(&query.id, &format!("Malformed SRID: {srid}"))
            .await?;
        return Ok(());
    };

    let records = match handler.search_service.search(&srid.to_string()).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("SRID lookup for callback failed: {e}");
            handler
                .messaging_service
                .answer_callback_query(&query.id, "Lookup failed, please try again later.")
                .await?;
            return Ok(());
        }
    };

    let Some(record) = records.first() else {
        handler
            .messaging_service
            .answer_callback_query(&query.id, &format!("SRID {srid} not found."))
            .await?;
        return Ok(());
    };

    handler.messaging_service.answer_callback_query(&query.id, "").await?;
    handler.messaging_service.send_export_menu_msg(chat_id, record).await?;
    Ok(())
}
