//! Account payloads: the raw upstream shape and the normalized record.
//!
//! DESIGN
//! ======
//! The Account Service is inconsistent about field casing and about whether
//! identifiers are numbers or strings. [`RawAccount`] accepts every variant as
//! a separate optional field, and [`RawAccount::into_record`] resolves them in
//! a fixed order: camelCase first, snake_case second. The first populated
//! field wins, even if the other spelling is also present.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A JSON scalar that upstream sends as either a string or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// Unnormalized account payload exactly as the Account Service returns it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawAccount {
    pub id: Option<Scalar>,
    #[serde(rename = "userId")]
    pub user_id_camel: Option<Scalar>,
    #[serde(rename = "user_id")]
    pub user_id_snake: Option<Scalar>,
    pub email: Option<String>,
    pub role: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name_camel: Option<String>,
    #[serde(rename = "first_name")]
    pub first_name_snake: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name_camel: Option<String>,
    #[serde(rename = "last_name")]
    pub last_name_snake: Option<String>,
    #[serde(rename = "contactNumber")]
    pub contact_number_camel: Option<Scalar>,
    #[serde(rename = "contact_number")]
    pub contact_number_snake: Option<Scalar>,
    pub address: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at_camel: Option<String>,
    #[serde(rename = "created_at")]
    pub created_at_snake: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at_camel: Option<String>,
    #[serde(rename = "updated_at")]
    pub updated_at_snake: Option<String>,
}

impl RawAccount {
    /// Normalize into the canonical record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when no identifier field is present.
    pub fn into_record(self) -> Result<AccountRecord, ApiError> {
        let id = [self.id, self.user_id_camel, self.user_id_snake]
            .into_iter()
            .flatten()
            .map(Scalar::into_string)
            .map(|id| id.trim().to_owned())
            .find(|id| !id.is_empty())
            .ok_or_else(|| ApiError::Decode("account payload missing id".into()))?;

        Ok(AccountRecord {
            id,
            email: self.email.map(|email| email.trim().to_owned()).unwrap_or_default(),
            role: non_empty(self.role),
            first_name: first_of(self.first_name_camel, self.first_name_snake).unwrap_or_default(),
            last_name: first_of(self.last_name_camel, self.last_name_snake).unwrap_or_default(),
            contact_number: first_of(
                self.contact_number_camel.map(Scalar::into_string),
                self.contact_number_snake.map(Scalar::into_string),
            ),
            address: non_empty(self.address),
            created_at: first_of(self.created_at_camel, self.created_at_snake),
            updated_at: first_of(self.updated_at_camel, self.updated_at_snake),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn first_of(camel: Option<String>, snake: Option<String>) -> Option<String> {
    non_empty(camel).or_else(|| non_empty(snake))
}

/// Normalized identity of the signed-in principal.
///
/// Replaced wholesale on every successful session fetch; never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub id: String,
    pub email: String,
    pub role: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl AccountRecord {
    /// Minimal record with only an id and email; other fields empty.
    #[must_use]
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role: None,
            first_name: String::new(),
            last_name: String::new(),
            contact_number: None,
            address: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = non_empty(Some(role.into()));
        self
    }

    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    /// `"{first} {last}"` trimmed, or the email when both name parts are blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() { self.email.clone() } else { full.to_owned() }
    }

    /// Case-insensitive role comparison. A record without a role matches nothing.
    #[must_use]
    pub fn role_is(&self, candidate: &str) -> bool {
        self.role
            .as_deref()
            .is_some_and(|role| role.trim().eq_ignore_ascii_case(candidate.trim()))
    }
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
