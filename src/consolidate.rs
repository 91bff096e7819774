//! Row consolidation: collapsing the provider's repeated rows into one
//! `Contact` per identity.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::model::{Contact, RawContactRow};

/// Strip all whitespace from a phone number for duplicate detection.
/// The stored number keeps its original formatting.
pub fn squash_number(number: &str) -> String {
    number.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Collapse raw rows into one contact per identity, in first-seen order.
///
/// A row without a display name cannot seed a new identity, but it may
/// still contribute a number or email to an identity an earlier named
/// row already seeded. This makes the result order-sensitive: move the
/// named row after its nameless siblings and their values are dropped
/// with them.
///
/// Numbers are kept unique under whitespace-insensitive comparison;
/// emails are appended as they come, duplicates included.
pub fn consolidate(rows: Vec<RawContactRow>) -> Vec<Contact> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, Contact> = HashMap::new();

    for row in rows {
        let contact = match by_id.entry(row.source_id) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let Some(name) = row.display_name else {
                    continue;
                };
                let id = slot.key().clone();
                order.push(id.clone());
                slot.insert(Contact::new(id, name))
            }
        };

        if let Some(number) = row.phone_number {
            let squashed = squash_number(&number);
            if !contact
                .numbers
                .iter()
                .any(|existing| squash_number(existing) == squashed)
            {
                contact.numbers.push(number);
            }
        }

        if let Some(email) = row.email_address {
            contact.emails.push(email);
        }
    }

    order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
}
