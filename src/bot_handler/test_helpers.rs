use chrono::Utc;
use teloxide::{
    dispatching::dialogue::{Dialogue, InMemStorage},
    types::{
        CallbackQuery, Chat, ChatId, ChatKind, ChatPrivate, InlineQuery, MaybeInaccessibleMessage,
        MediaKind, MediaText, Message, MessageCommon, MessageId, MessageKind, User, UserId,
    },
};

use crate::bot_handler::CommandState;

pub const CHAT_ID: ChatId = ChatId(123);
pub const USER_ID: UserId = UserId(99);

pub fn new_dialogue() -> Dialogue<CommandState, InMemStorage<CommandState>> {
    Dialogue::new(InMemStorage::<CommandState>::new(), CHAT_ID)
}

pub fn mock_user() -> User {
    User {
        id: USER_ID,
        is_bot: false,
        first_name: "Test".to_string(),
        last_name: None,
        username: Some("testuser".to_string()),
        language_code: None,
        is_premium: false,
        added_to_attachment_menu: false,
    }
}

// Helper to create a mock teloxide message to reduce boilerplate in tests
pub fn mock_message(chat_id: ChatId, text: &str) -> Message {
    Message {
        id: MessageId(1),
        date: Utc::now(),
        chat: Chat {
            id: chat_id,
            kind: ChatKind::Private(ChatPrivate {
                username: Some("test".to_string()),
                first_name: Some("Test".to_string()),
                last_name: None,
            }),
        },
        kind: MessageKind::Common(MessageCommon {
            media_kind: MediaKind::Text(MediaText {
                text: text.to_string(),
                entities: vec![],
                link_preview_options: None,
            }),
            reply_to_message: None,
            reply_markup: None,
            edit_date: None,
            author_signature: None,
            has_protected_content: false,
            is_automatic_forward: false,
            effect_id: None,
            forward_origin: None,
            external_reply: None,
            quote: None,
            reply_to_story: None,
            sender_boost_count: None,
            is_from_offline: false,
            business_connection_id: None,
        }),
        from: None,
        is_topic_message: false,
        sender_business_bot: None,
        sender_chat: None,
        thread_id: None,
        via_bot: None,
    }
}

// Helper to create a mock message that is a reply to a prompt
pub fn mock_reply_message(chat_id: ChatId, text: &str) -> Message {
    let mut msg = mock_message(chat_id, text);
    if let MessageKind::Common(common) = &mut msg.kind {
        common.reply_to_message = Some(Box::new(mock_message(chat_id, "prompt")));
    }
    msg
}

// Helper to create a mock callback query attached to a regular chat message
pub fn mock_callback_query(chat_id: ChatId, data: &str) -> CallbackQuery {
    let msg = mock_message(chat_id, "This is a message with a keyboard.");
    CallbackQuery {
        id: "test_callback_id".to_string(),
        from: mock_user(),
        message: Some(MaybeInaccessibleMessage::Regular(Box::new(msg))),
        inline_message_id: None,
        chat_instance: "test_instance".to_string(),
        data: Some(data.to_string()),
        game_short_name: None,
    }
}

// Helper to create a mock callback query coming from an inline message, which
// carries no message at all
pub fn mock_inline_callback_query(data: &str) -> CallbackQuery {
    CallbackQuery {
        id: "test_callback_id".to_string(),
        from: mock_user(),
        message: None,
        inline_message_id: Some("inline_message_id".to_string()),
        chat_instance: "test_instance".to_string(),
        data: Some(data.to_string()),
        game_short_name: None,
    }
}

// Helper to create a mock inline query
pub fn mock_inline_query(query: &str) -> InlineQuery {
    InlineQuery {
        id: "test_inline_query_id".to_string(),
        from: mock_user(),
        query: query.to_string(),
        offset: String::new(),
        chat_type: None,
        location: None,
    }
}
