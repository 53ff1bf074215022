/// User-input errors raised by the store and managers.
///
/// None of these are fatal: the dialog layer turns each one into a chat reply
/// via [`BotError::user_message`] and the interaction ends there.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BotError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDateFormat(String),

    #[error("no start date set for this user")]
    NoRecord,

    #[error("item must look like 'Category: Item'")]
    BadItemFormat,

    #[error("item name is empty")]
    EmptyItemName,

    #[error("category name is empty")]
    EmptyCategoryName,

    #[error("category not found: {0}")]
    CategoryNotFound(String),
}

impl BotError {
    /// Chat-facing text for this error.
    pub fn user_message(&self) -> String {
        match self {
            BotError::InvalidDateFormat(_) => {
                "❌ Please use the format: /setdate YYYY-MM-DD.".to_string()
            }
            BotError::NoRecord => "❌ No date set. Please use /setdate first.".to_string(),
            BotError::BadItemFormat => "❌ Please use the format: Category: Item Name.".to_string(),
            BotError::EmptyItemName => "❌ Please send a non-empty item name.".to_string(),
            BotError::EmptyCategoryName => "❌ Please send a non-empty category name.".to_string(),
            BotError::CategoryNotFound(name) => format!("❌ Category '{}' does not exist.", name),
        }
    }
}
