//! Diesel schema for conversation and message persistence.
//!
//! The `conversations` table carries a unique index over
//! `(property_id, buyer_id, seller_id)`; `messages` over
//! `(conversation_id, sequence_number)`.

diesel::table! {
    /// Conversation thread records.
    conversations (id) {
        /// Internal conversation identifier.
        id -> Uuid,
        /// External property identifier the thread is about.
        #[max_length = 100]
        property_id -> Varchar,
        /// External identity of the buyer.
        #[max_length = 100]
        buyer_id -> Varchar,
        /// External identity of the seller.
        #[max_length = 100]
        seller_id -> Varchar,
        /// Ordered participant set as a JSONB array.
        participants -> Jsonb,
        /// Lifecycle status (`active`, `pending`, `resolved`).
        #[max_length = 50]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Timestamp of the most recent message.
        last_message_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only message log.
    messages (id) {
        /// Internal message identifier.
        id -> Uuid,
        /// Owning conversation.
        conversation_id -> Uuid,
        /// Monotonic order within the conversation.
        sequence_number -> Int8,
        /// External identity of the sender.
        #[max_length = 100]
        sender_id -> Varchar,
        /// Display name captured at send time.
        #[max_length = 255]
        sender_name -> Varchar,
        /// Sender role captured at send time.
        #[max_length = 50]
        sender_role -> Varchar,
        /// Payload (text or image reference) as JSONB.
        body -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Reader identity to read timestamp, as a JSONB object.
        read_receipts -> Jsonb,
    }
}

diesel::joinable!(messages -> conversations (conversation_id));
diesel::allow_tables_to_appear_in_same_query!(conversations, messages);
