use teloxide::types::CallbackQuery;
use tracing::{error, info};

use crate::{
    bot_handler::{BotHandler, BotHandlerError, BotHandlerResult, resolve_target_chat},
    export::ExportFormat,
};

/// A parsed `export_{token}_{srid}` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub srid: i32,
}

impl ExportRequest {
    pub fn parse(data: &str) -> Option<Self> {
        let rest = data.strip_prefix("export_")?;
        let (token, srid) = rest.rsplit_once('_')?;
        let format = ExportFormat::from_callback_token(token)?;
        let srid = srid.parse().ok()?;
        Some(Self { format, srid })
    }
}

/// Handles an `export_{token}_{srid}` callback: runs the export pipeline and
/// delivers the file to the resolved chat.
pub async fn handle(handler: &BotHandler, query: &CallbackQuery, data: &str) -> BotHandlerResult<()> {
    let chat_id = resolve_target_chat(query);

    let Some(request) = ExportRequest::parse(data) else {
        handler
            .messaging_service
            .answer_callback_query(&query.id, &format!("Malformed export request: {data}"))
            .await?;
        return Ok(());
    };

    handler
        .messaging_service
        .answer_callback_query(&query.id, &format!("Exporting {}…", request.format))
        .await?;

    match handler.export_service.export(request.format, request.srid).await {
        Ok(file) => {
            info!("Delivering {} to chat {chat_id}", file.file_name);
            handler.messaging_service.send_document(chat_id, &file).await?;
        }
        Err(e) if e.is_user_facing() => {
            handler
                .messaging_service
                .send_error_msg(chat_id, BotHandlerError::ExportFailed(e.to_string()))
                .await?;
        }
        Err(e) => {
            error!("Export of SRID {} as {} failed: {e}", request.srid, request.format);
            handler.messaging_service.send_error_msg(chat_id, BotHandlerError::Internal).await?;
        }
    }
    Ok(())
}
