//! Catalog browsing: item filters and the per-category showcase.

use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::model::Item;

/// Categories the shop's catalog is organized by, in display order.
pub const CATEGORIES: [&str; 5] = ["noiva", "noivo", "debutante", "formatura", "crianca"];

/// Normalize `raw` to a known category.
///
/// # Errors
/// Returns `BookingError::Validation` for anything outside [`CATEGORIES`].
pub fn category(raw: &str) -> Result<&'static str> {
    let wanted = raw.trim().to_lowercase();
    CATEGORIES
        .iter()
        .copied()
        .find(|c| *c == wanted)
        .ok_or_else(|| BookingError::validation(format!("unknown category: {}", raw.trim())))
}

/// Narrows an item listing. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemFilter {
    /// Rental or sale.
    pub kind: Option<String>,
    /// Dress or suit.
    pub model: Option<String>,
    pub available: Option<bool>,
    pub category: Option<String>,
}

impl ItemFilter {
    /// Validate the category and drop blank text filters.
    pub fn normalized(&self) -> Result<ItemFilter> {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let category = match text(&self.category) {
            Some(raw) => Some(category(&raw)?.to_string()),
            None => None,
        };
        Ok(ItemFilter {
            kind: text(&self.kind),
            model: text(&self.model),
            available: self.available,
            category,
        })
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.kind.as_ref().map_or(true, |k| item.kind == *k)
            && self.model.as_ref().map_or(true, |m| item.model == *m)
            && self.available.map_or(true, |a| item.available == a)
            && self.category.as_ref().map_or(true, |c| item.category == *c)
    }
}

/// Items matching `filter`, ordered by name.
pub fn filter_items(items: Vec<Item>, filter: &ItemFilter) -> Vec<Item> {
    let mut found: Vec<Item> = items.into_iter().filter(|i| filter.matches(i)).collect();
    found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    found
}

/// One category tile on the catalog page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub count: usize,
    /// The lowest-id item in the category, shown as its cover.
    pub featured: Option<Item>,
}

/// A summary for every category, including empty ones.
pub fn showcase(items: &[Item]) -> Vec<CategorySummary> {
    CATEGORIES
        .iter()
        .map(|&category| {
            let members = items.iter().filter(|i| i.category == category);
            CategorySummary {
                category: category.to_string(),
                count: members.clone().count(),
                featured: members.min_by_key(|i| i.id).cloned(),
            }
        })
        .collect()
}
