use crate::bot_handler::{BotHandlerError, BotHandlerResult, CommandState, commands::Context};

/// Prompts for a search query and waits for the force-reply response.
pub async fn handle(ctx: Context<'_>) -> BotHandlerResult<()> {
    ctx.handler.messaging_service.prompt_for_query(ctx.message.chat.id).await?;
    ctx.dialogue
        .update(CommandState::AwaitingQuery)
        .await
        .map_err(BotHandlerError::DialogueError)?;
    Ok(())
}
