use crate::domain::chat::ChatId;
use crate::domain::ports::NotificationSink;
use crate::error::Result;

/// A message produced by the tracking engine for one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub image: Option<String>,
}

impl Notification {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(text: impl Into<String>, image: Option<String>) -> Self {
        Self {
            text: text.into(),
            image,
        }
    }
}

/// Sends a notification, falling back to plain text when the image is
/// rejected. Only a failed text send is reported to the caller.
pub async fn deliver(
    sink: &dyn NotificationSink,
    chat_id: ChatId,
    notification: &Notification,
) -> Result<()> {
    if let Some(image) = &notification.image {
        match sink.send_image(chat_id, image, &notification.text).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(chat_id, image = %image, error = %e, "image send failed, falling back to text");
            }
        }
    }
    sink.send_text(chat_id, &notification.text).await
}
