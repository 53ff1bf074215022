use std::fmt;

/// Transport-level user identifier. In private chats this doubles as the chat id.
pub type UserId = u64;

/// Which free-text reply the bot expects next from a user.
///
/// Exactly one value per user. Arming a new state replaces whatever was
/// pending before; there is no queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingInput {
    #[default]
    Idle,
    AwaitingItem,
    AwaitingCategory,
    AwaitingSplitCategory,
    AwaitingLike,
    AwaitingDislike,
}

impl PendingInput {
    pub fn is_idle(&self) -> bool {
        matches!(self, PendingInput::Idle)
    }
}

/// Inline-keyboard actions. The callback data on the wire is `as_str()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    AddItem,
    ViewAll,
    ViewLiked,
    ManageCategories,
    SplitCategories,
    Like,
    Dislike,
}

impl ButtonAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonAction::AddItem => "add_item",
            ButtonAction::ViewAll => "view_all",
            ButtonAction::ViewLiked => "view_liked",
            ButtonAction::ManageCategories => "manage_categories",
            ButtonAction::SplitCategories => "split_categories",
            ButtonAction::Like => "like",
            ButtonAction::Dislike => "dislike",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ButtonAction::AddItem => "Add Item",
            ButtonAction::ViewAll => "View All Items",
            ButtonAction::ViewLiked => "View Liked Items",
            ButtonAction::ManageCategories => "Manage Categories",
            ButtonAction::SplitCategories => "Split Categories",
            ButtonAction::Like => "Like Item",
            ButtonAction::Dislike => "Dislike Item",
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "add_item" => ButtonAction::AddItem,
            "view_all" => ButtonAction::ViewAll,
            "view_liked" => ButtonAction::ViewLiked,
            "manage_categories" => ButtonAction::ManageCategories,
            "split_categories" => ButtonAction::SplitCategories,
            "like" => ButtonAction::Like,
            "dislike" => ButtonAction::Dislike,
            _ => return None,
        };
        Some(action)
    }
}

impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A previously sent message that can be edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ButtonAction; 7] = [
        ButtonAction::AddItem,
        ButtonAction::ViewAll,
        ButtonAction::ViewLiked,
        ButtonAction::ManageCategories,
        ButtonAction::SplitCategories,
        ButtonAction::Like,
        ButtonAction::Dislike,
    ];

    #[test]
    fn callback_data_parses_back_to_action() {
        for action in ALL {
            assert_eq!(ButtonAction::parse(action.as_str()), Some(action));
        }
    }

    #[test]
    fn unknown_callback_data_is_rejected() {
        assert_eq!(ButtonAction::parse("approve:once:123"), None);
        assert_eq!(ButtonAction::parse(""), None);
        assert_eq!(ButtonAction::parse("Like"), None);
    }

    #[test]
    fn pending_input_defaults_to_idle() {
        assert!(PendingInput::default().is_idle());
        assert!(!PendingInput::AwaitingLike.is_idle());
    }
}
