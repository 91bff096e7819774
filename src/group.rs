//! Sectioned index: contacts bucketed by the uppercase first character
//! of their display name.

use thiserror::Error;

use crate::model::Contact;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GroupError {
    /// The contact's name is empty, so no group key can be derived.
    #[error("contact `{id}` has an empty name and cannot be grouped")]
    MalformedEntity { id: String },
}

/// One section of the grouped index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactGroup {
    /// Uppercased first character of the members' names.
    pub key: char,
    /// Members in the order they appeared in the source collection.
    pub members: Vec<Contact>,
}

/// Contacts bucketed by group key.
///
/// Keys keep the order in which they were first encountered while
/// scanning the input; callers wanting an alphabetical section list
/// sort explicitly via [`GroupedIndex::sorted_by_key`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedIndex {
    groups: Vec<ContactGroup>,
}

impl GroupedIndex {
    /// Ordered `(key, members)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (char, &[Contact])> {
        self.groups.iter().map(|g| (g.key, g.members.as_slice()))
    }

    /// Section keys in first-encounter order.
    pub fn keys(&self) -> impl Iterator<Item = char> + '_ {
        self.groups.iter().map(|g| g.key)
    }

    /// Every contact, traversing sections in order.
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.groups.iter().flat_map(|g| g.members.iter())
    }

    pub fn get(&self, key: char) -> Option<&[Contact]> {
        self.groups
            .iter()
            .find(|g| g.key == key)
            .map(|g| g.members.as_slice())
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of contacts across all sections.
    pub fn contact_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    /// Sections reordered alphabetically by key; member order unchanged.
    pub fn sorted_by_key(mut self) -> Self {
        self.groups.sort_by_key(|g| g.key);
        self
    }
}

/// Compute the group key for a display name: uppercase the whole name,
/// then take its first character.
fn group_key(name: &str) -> Option<char> {
    name.to_uppercase().chars().next()
}

/// Bucket contacts by group key.
///
/// Fails on the first contact whose name is empty; callers that prefer
/// to drop such contacts filter them out beforehand.
pub fn group(contacts: &[Contact]) -> Result<GroupedIndex, GroupError> {
    let mut groups: Vec<ContactGroup> = Vec::new();

    for contact in contacts {
        let Some(key) = group_key(&contact.name) else {
            return Err(GroupError::MalformedEntity {
                id: contact.id.clone(),
            });
        };

        match groups.iter_mut().find(|g| g.key == key) {
            Some(section) => section.members.push(contact.clone()),
            None => groups.push(ContactGroup {
                key,
                members: vec![contact.clone()],
            }),
        }
    }

    Ok(GroupedIndex { groups })
}
