//! Outbound call/email actions.
//!
//! The core only selects the value to act on; placing the call or
//! composing the email is the dispatcher's business, and its outcome is
//! not observed.

use crate::model::Contact;

/// External collaborator that performs a call or composes an email.
pub trait ActionDispatcher {
    fn dial(&self, number: &str);
    fn compose(&self, email: &str);
}

/// Ask `dispatcher` to call `contact`, using the first listed number by
/// convention. Returns false when the contact has no number.
pub fn request_call(contact: &Contact, dispatcher: &dyn ActionDispatcher) -> bool {
    match contact.numbers.first() {
        Some(number) => {
            dispatcher.dial(number);
            true
        }
        None => false,
    }
}

/// Ask `dispatcher` to email `contact`, using the first listed address
/// by convention. Returns false when the contact has no email.
pub fn request_email(contact: &Contact, dispatcher: &dyn ActionDispatcher) -> bool {
    match contact.emails.first() {
        Some(email) => {
            dispatcher.compose(email);
            true
        }
        None => false,
    }
}

/// Stand-in dispatcher for the CLI: prints the `tel:`/`mailto:` URI
/// that a platform shell would open.
pub struct UriPrinter;

impl ActionDispatcher for UriPrinter {
    fn dial(&self, number: &str) {
        println!("tel:{number}");
    }

    fn compose(&self, email: &str) {
        println!("mailto:{email}");
    }
}
