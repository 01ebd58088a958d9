use crate::path::PREFIX_SEPARATOR;

/// Normalizes a client-supplied operation name into the key handlers are
/// registered under.
///
/// Prefix separators become underscores, then the name is camel-cased on
/// `-`, `_` and space boundaries: `messages.recipient` and
/// `messages_recipient` both become `messagesRecipient`. Characters inside a
/// word keep their case.
#[must_use]
pub fn operation_key(name: &str) -> String {
    let name = name.replace(PREFIX_SEPARATOR, "_");

    let mut key = String::with_capacity(name.len());
    for word in name.split(['-', '_', ' ']) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            key.extend(first.to_uppercase());
            key.push_str(chars.as_str());
        }
    }

    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => key,
    }
}
