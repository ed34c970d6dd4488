use crate::error::ValidationError;
use crate::models::message::MessageId;

/// Highest message id incorporated into the visible thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThreadCursor {
    last_seen_id: MessageId,
}

pub fn validate_cursor_seed(seed: MessageId) -> Result<(), ValidationError> {
    if seed < 0 {
        return Err(ValidationError::InvalidInput {
            value: seed.to_string(),
            reason: "last message id should be >= 0".to_string(),
        });
    }
    Ok(())
}

impl ThreadCursor {
    pub fn seeded(seed: MessageId) -> Result<Self, ValidationError> {
        validate_cursor_seed(seed)?;
        Ok(Self { last_seen_id: seed })
    }

    pub fn last_seen_id(&self) -> MessageId {
        self.last_seen_id
    }

    /// Lower bound for the next feed request, `None` until anything is known.
    pub fn after_id(&self) -> Option<MessageId> {
        (self.last_seen_id != 0).then_some(self.last_seen_id)
    }

    /// Moves the watermark forward, never back.
    pub fn advance(&mut self, id: MessageId) -> MessageId {
        self.last_seen_id = self.last_seen_id.max(id);
        self.last_seen_id
    }
}
