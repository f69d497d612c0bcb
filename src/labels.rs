//! Presentation-time resolution of category and wallet references.
//!
//! Aggregates carry bare ids; names and colors are filled in here, with a
//! placeholder whenever the referenced record is missing or unreadable.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::models::{Category, Wallet};
use crate::store::Directory;

pub(crate) const UNCATEGORIZED: &str = "Uncategorized";
pub(crate) const UNCATEGORIZED_COLOR: &str = "#808080";
pub(crate) const UNKNOWN_WALLET: &str = "Unknown";
pub(crate) const OVERALL: &str = "Overall";
pub(crate) const NONE: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryLabel {
    pub(crate) id: Option<i64>,
    pub(crate) name: String,
    pub(crate) color: String,
    pub(crate) icon: String,
}

impl CategoryLabel {
    fn placeholder(id: Option<i64>) -> Self {
        Self {
            id,
            name: UNCATEGORIZED.to_string(),
            color: UNCATEGORIZED_COLOR.to_string(),
            icon: String::new(),
        }
    }

    fn from_category(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            color: category.color.clone(),
            icon: category.icon.clone(),
        }
    }
}

/// Per-request memo of directory lookups.
pub(crate) struct Labels<'a, D: Directory + ?Sized> {
    dir: &'a D,
    categories: HashMap<i64, Option<Category>>,
    wallets: HashMap<i64, Option<Wallet>>,
}

impl<'a, D: Directory + ?Sized> Labels<'a, D> {
    pub(crate) fn new(dir: &'a D) -> Self {
        Self {
            dir,
            categories: HashMap::new(),
            wallets: HashMap::new(),
        }
    }

    pub(crate) fn category(&mut self, id: Option<i64>) -> CategoryLabel {
        let Some(id) = id else {
            return CategoryLabel::placeholder(None);
        };
        match self.lookup_category(id) {
            Some(category) => CategoryLabel::from_category(category),
            None => CategoryLabel::placeholder(Some(id)),
        }
    }

    /// Scope label of a budget: its category name, or "Overall".
    pub(crate) fn budget_scope(&mut self, category_id: Option<i64>) -> String {
        match category_id {
            None => OVERALL.to_string(),
            Some(id) => self
                .lookup_category(id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
        }
    }

    pub(crate) fn wallet_name(&mut self, id: i64) -> String {
        let dir = self.dir;
        self.wallets
            .entry(id)
            .or_insert_with(|| {
                dir.wallet_by_id(id).unwrap_or_else(|e| {
                    warn!(wallet_id = id, error = %e, "wallet lookup failed");
                    None
                })
            })
            .as_ref()
            .map(|w| w.name.clone())
            .unwrap_or_else(|| UNKNOWN_WALLET.to_string())
    }

    fn lookup_category(&mut self, id: i64) -> Option<&Category> {
        let dir = self.dir;
        self.categories
            .entry(id)
            .or_insert_with(|| {
                dir.category_by_id(id).unwrap_or_else(|e| {
                    warn!(category_id = id, error = %e, "category lookup failed");
                    None
                })
            })
            .as_ref()
    }
}
