//! Emergency contacts for the convoy.
//!
//! The directory is static: it ships with defaults and can be replaced from
//! the configuration file. Placing the call is left to the host.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Accepted phone number shape: digits and spaces, optional leading `+`.
pub const PHONE_PATTERN: &str = r"^\+?[0-9][0-9 ]*$";

/// One emergency contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role or person behind the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Phone number, if the contact can be called.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Short remark shown under the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Contact {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: None,
            phone: None,
            note: None,
        }
    }

    fn role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    fn phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    /// Whether the contact has a number to call.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

/// A contact as shown in the directory, flagged when it cannot be called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContactListing<'a> {
    /// The contact itself.
    #[serde(flatten)]
    pub contact: &'a Contact,
    /// Whether a call can be placed.
    pub callable: bool,
}

impl<'a> From<&'a Contact> for ContactListing<'a> {
    fn from(contact: &'a Contact) -> Self {
        Self {
            contact,
            callable: contact.is_callable(),
        }
    }
}

/// Build the directory listing for `contacts`, keeping their order.
#[must_use]
pub fn listing(contacts: &[Contact]) -> Vec<ContactListing<'_>> {
    contacts.iter().map(ContactListing::from).collect()
}

/// The contacts shipped with the application.
#[must_use]
pub fn default_contacts() -> Vec<Contact> {
    vec![
        Contact::new("1", "PC Convoi")
            .role("Permanence")
            .phone("+33123456789")
            .note("Contact principal"),
        Contact::new("2", "Chef d'escorte")
            .role("Jean Dupont")
            .phone("+33601020304"),
        Contact::new("3", "Gendarmerie locale")
            .phone("17")
            .note("Urgence"),
        Contact::new("4", "Service voirie").phone("+33555112233"),
        Contact::new("5", "SNCF Passage à niveau").phone("0800123123"),
    ]
}

/// Check a phone number against [`PHONE_PATTERN`].
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE
        .get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is valid"))
        .is_match(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_contacts() {
        let contacts = default_contacts();
        assert_eq!(contacts.len(), 5);
        assert_eq!(contacts[0].name, "PC Convoi");
        assert!(contacts.iter().all(Contact::is_callable));
    }

    #[test]
    fn test_default_phones_valid() {
        for contact in default_contacts() {
            let phone = contact.phone.unwrap();
            assert!(is_valid_phone(&phone), "invalid default phone {phone}");
        }
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("17"));
        assert!(is_valid_phone("+33 6 01 02 03 04"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("+"));
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone("06-01-02"));
    }

    #[test]
    fn test_contact_without_phone_not_callable() {
        let contact = Contact::new("x", "Dépanneuse");
        assert!(!contact.is_callable());

        let blank = Contact::new("y", "Vide").phone("  ");
        assert!(!blank.is_callable());
    }

    #[test]
    fn test_listing_flags_uncallable() {
        let contacts = vec![
            Contact::new("1", "PC Convoi").phone("+33123456789"),
            Contact::new("2", "Dépanneuse"),
        ];
        let entries = listing(&contacts);
        assert!(entries[0].callable);
        assert!(!entries[1].callable);

        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json[0]["callable"], true);
        assert_eq!(json[0]["phone"], "+33123456789");
        assert_eq!(json[1]["callable"], false);
        assert_eq!(json[1]["name"], "Dépanneuse");
        assert!(json[1].get("phone").is_none());
    }

    #[test]
    fn test_contact_deserialize_minimal() {
        let contact: Contact =
            serde_json::from_str(r#"{"id":"9","name":"Mairie"}"#).unwrap();
        assert_eq!(contact.phone, None);
        assert_eq!(contact.role, None);
    }
}
