//! Component string parsing.
//!
//! Grammar: `"<invType>, <b0>, <b1>, <level>|<skin>||<tok1> <tok2> ...|<extra>"`
//! where a token is `{id}` or `{key:[id id ...]}`. A token with a `:` is a
//! parent-scoped group; one without is item-scoped. The first id overall is
//! the item's own identifying id, not a part.

use thiserror::Error;

/// Malformed component string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid format: missing `||` separator")]
    MissingSeparator,
    #[error("no item id or parts found")]
    NoIds,
}

/// The structured result of parsing a component string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedComponents {
    /// Inventory type id from the header's first comma field.
    pub inv_type_id: String,
    /// The item's own identifying id (first id in encounter order).
    pub item_id: String,
    /// Item-scoped part ids, item id removed.
    pub item_part_ids: Vec<u32>,
    /// Parent-scoped part ids (from `{key:...}` tokens).
    pub parent_part_ids: Vec<u32>,
}

impl ParsedComponents {
    /// Parses a component string.
    ///
    /// # Example
    ///
    /// ```
    /// use gearforge_codec::ParsedComponents;
    ///
    /// let parsed = ParsedComponents::parse("5, 0, 1, 20| 2, 999||{1} {2} {3}|").unwrap();
    /// assert_eq!(parsed.inv_type_id, "5");
    /// assert_eq!(parsed.item_id, "1");
    /// assert_eq!(parsed.item_part_ids, vec![2, 3]);
    /// assert!(parsed.parent_part_ids.is_empty());
    /// ```
    pub fn parse(component: &str) -> Result<Self, ParseError> {
        let first_section = component.split('|').next().unwrap_or("");
        let inv_type_id = first_section
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .to_string();

        let body = component
            .split_once("||")
            .ok_or(ParseError::MissingSeparator)?
            .1;
        let parts_block = body.split('|').next().unwrap_or("");

        let mut item_part_ids = Vec::new();
        let mut parent_part_ids = Vec::new();
        let mut all_ordered = Vec::new();

        for token in tokens(parts_block) {
            let token = token.trim();
            let (parent_scoped, values) = match token.split_once(':') {
                Some((_, rhs)) => (true, rhs),
                None => (false, token),
            };
            let mut ids = Vec::new();
            for field in values
                .replace(['[', ']'], "")
                .replace(',', " ")
                .split_whitespace()
            {
                if let Ok(id) = field.parse::<u32>() {
                    ids.push(id);
                }
            }
            if parent_scoped {
                parent_part_ids.extend(&ids);
            } else {
                item_part_ids.extend(&ids);
            }
            all_ordered.extend(ids);
        }

        if all_ordered.is_empty() {
            return Err(ParseError::NoIds);
        }

        let item_id = all_ordered[0];
        // The item's own id is only stripped when it leads the item-scoped
        // bucket; an id that appears only parent-scoped stays put.
        if item_part_ids.first() == Some(&item_id) {
            item_part_ids.remove(0);
        }

        Ok(ParsedComponents {
            inv_type_id,
            item_id: item_id.to_string(),
            item_part_ids,
            parent_part_ids,
        })
    }

    /// Every part id across both scopes.
    pub fn all_part_ids(&self) -> Vec<u32> {
        let mut ids = self.item_part_ids.clone();
        ids.extend(&self.parent_part_ids);
        ids
    }
}

/// Yields the inside of each brace-delimited token. Bracketed id lists may
/// contain spaces and commas; braces do not nest.
fn tokens(block: &str) -> impl Iterator<Item = &str> {
    let mut rest = block;
    std::iter::from_fn(move || {
        let open = rest.find('{')?;
        let after = &rest[open + 1..];
        let close = after.find('}')?;
        let inner = &after[..close];
        rest = &after[close + 1..];
        Some(inner)
    })
}
