use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

use crate::errors::BotError;

/// Suffix appended to a category name when it is split.
pub const SPLIT_SUFFIX: &str = "_split";

const SECONDS_PER_DAY: i64 = 86_400;

/// Everything the bot knows about one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub start_date: NaiveDate,
    pub reminders_enabled: bool,
    /// Category -> items, both in insertion order.
    pub lists: IndexMap<String, Vec<String>>,
    pub liked: Vec<String>,
    pub disliked: Vec<String>,
    /// Categories declared through "Manage Categories". Not synced with `lists`.
    pub categories: BTreeSet<String>,
}

impl UserRecord {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            reminders_enabled: false,
            lists: IndexMap::new(),
            liked: Vec::new(),
            disliked: Vec::new(),
            categories: BTreeSet::new(),
        }
    }

    /// Whole days from midnight of `start_date` to `now`, floored. A start
    /// date later than `now` gives a negative count.
    pub fn days_since(&self, now: NaiveDateTime) -> i64 {
        let start = self.start_date.and_time(chrono::NaiveTime::MIN);
        (now - start).num_seconds().div_euclid(SECONDS_PER_DAY)
    }

    /// Parse `Category: Item` and append the item. Returns `(category, item)` as stored.
    pub fn add_item(&mut self, raw: &str) -> Result<(String, String), BotError> {
        let (category, item) = parse_item(raw)?;
        self.lists
            .entry(category.clone())
            .or_default()
            .push(item.clone());
        Ok((category, item))
    }

    /// Insert into the declared-categories set. Returns the trimmed name.
    pub fn declare_category(&mut self, name: &str) -> Result<String, BotError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BotError::EmptyCategoryName);
        }
        self.categories.insert(name.to_string());
        Ok(name.to_string())
    }

    /// Move a category's items under `<name>_split`, overwriting anything already there.
    ///
    /// An existing `_split` key keeps its position; otherwise the new key goes last.
    /// Returns the new category name.
    pub fn split_category(&mut self, name: &str) -> Result<String, BotError> {
        let name = name.trim();
        let items = self
            .lists
            .shift_remove(name)
            .ok_or_else(|| BotError::CategoryNotFound(name.to_string()))?;
        let new_name = format!("{}{}", name, SPLIT_SUFFIX);
        self.lists.insert(new_name.clone(), items);
        Ok(new_name)
    }

    pub fn like(&mut self, item: &str) -> Result<String, BotError> {
        let item = non_empty_item(item)?;
        self.liked.push(item.clone());
        Ok(item)
    }

    pub fn dislike(&mut self, item: &str) -> Result<String, BotError> {
        let item = non_empty_item(item)?;
        self.disliked.push(item.clone());
        Ok(item)
    }

    pub fn list_all(&self) -> Listing<'_> {
        Listing { lists: &self.lists }
    }

    pub fn list_liked(&self) -> String {
        if self.liked.is_empty() {
            return "❌ No liked items.".to_string();
        }
        format!("❤️ Liked Items:\n{}", self.liked.join("\n"))
    }

    pub fn list_categories(&self) -> String {
        if self.categories.is_empty() {
            return "❌ No categories declared yet.".to_string();
        }
        let names: Vec<&str> = self.categories.iter().map(String::as_str).collect();
        format!("🏷️ Categories:\n{}", names.join("\n"))
    }
}

/// Split on `:` into exactly two trimmed, non-empty parts.
pub fn parse_item(raw: &str) -> Result<(String, String), BotError> {
    let mut parts = raw.split(':');
    let (Some(category), Some(item), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(BotError::BadItemFormat);
    };
    let (category, item) = (category.trim(), item.trim());
    if category.is_empty() || item.is_empty() {
        return Err(BotError::BadItemFormat);
    }
    Ok((category.to_string(), item.to_string()))
}

fn non_empty_item(raw: &str) -> Result<String, BotError> {
    let item = raw.trim();
    if item.is_empty() {
        return Err(BotError::EmptyItemName);
    }
    Ok(item.to_string())
}

/// Borrowed view over a user's lists.
///
/// Nothing is rendered until [`Listing::lines`] is iterated or the listing is
/// formatted, and the view can be walked any number of times.
#[derive(Debug, Clone, Copy)]
pub struct Listing<'a> {
    lists: &'a IndexMap<String, Vec<String>>,
}

impl<'a> Listing<'a> {
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// One `Category: a, b` line per category.
    pub fn lines(&self) -> impl Iterator<Item = String> + Clone + 'a {
        let lists = self.lists;
        lists
            .iter()
            .map(|(category, items)| format!("{}: {}", category, items.join(", ")))
    }
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("❌ No items found.");
        }
        f.write_str("🗂️ All Items:")?;
        for line in self.lines() {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}
