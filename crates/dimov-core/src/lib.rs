pub mod editor;
pub mod settings;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use editor::{Editor, PendingUpdate};
pub use settings::{AiSettings, Settings};

// --- Types ---

/// The content of the business card. Every field is plain text and always
/// present; an empty string means "nothing to show".
///
/// Field order here is the schema order: it is the order used when the record
/// is serialized for the model, when the response schema is generated and
/// when fields are listed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    /// Main company name, e.g. "Dimo". Its first character is drawn as the big glyph.
    pub company_name_main: String,
    /// Label stacked above the rest of the name, e.g. "CONSTRUCTION"
    pub company_name_suffix: String,
    /// Legal form designator under the stars, e.g. "OOD"
    pub company_type: String,
    pub slogan: String,
    pub address: String,
    pub email1: String,
    pub email2: String,
    /// Website without scheme, e.g. "www.example.com"
    pub website: String,
    pub phone1: String,
    pub person1: String,
    pub phone2: String,
    pub person2: String,
    pub phone3: String,
    pub person3: String,
}

impl Default for CardRecord {
    fn default() -> Self {
        Self {
            company_name_main: "Dimo".to_string(),
            company_name_suffix: "CONSTRUCTION".to_string(),
            company_type: "OOD".to_string(),
            slogan: "ПРОЕКТИРАНЕ НА СГРАДИ И СЪОРЪЖЕНИЯ".to_string(),
            address: "офис: гр.Стара Загора,бул.“Цар Симеон Велики“ №4,ет.5,ап.10".to_string(),
            email1: "dimovconstruction.sz@gmail.com".to_string(),
            email2: String::new(),
            website: "www.dimovconstruction.com".to_string(),
            phone1: "0888 536401".to_string(),
            person1: "инж.Пламен Димов".to_string(),
            phone2: "0883 386003".to_string(),
            person2: "инж.Светлозар Димов".to_string(),
            phone3: "0888 574164".to_string(),
            person3: "инж.Димо Димов".to_string(),
        }
    }
}

/// Identity of one `CardRecord` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardField {
    CompanyNameMain,
    CompanyNameSuffix,
    CompanyType,
    Slogan,
    Address,
    Email1,
    Email2,
    Website,
    Phone1,
    Person1,
    Phone2,
    Person2,
    Phone3,
    Person3,
}

impl CardField {
    /// All fields in schema order.
    pub const ALL: [CardField; 14] = [
        CardField::CompanyNameMain,
        CardField::CompanyNameSuffix,
        CardField::CompanyType,
        CardField::Slogan,
        CardField::Address,
        CardField::Email1,
        CardField::Email2,
        CardField::Website,
        CardField::Phone1,
        CardField::Person1,
        CardField::Phone2,
        CardField::Person2,
        CardField::Phone3,
        CardField::Person3,
    ];

    /// The JSON key of this field.
    pub fn key(self) -> &'static str {
        match self {
            CardField::CompanyNameMain => "companyNameMain",
            CardField::CompanyNameSuffix => "companyNameSuffix",
            CardField::CompanyType => "companyType",
            CardField::Slogan => "slogan",
            CardField::Address => "address",
            CardField::Email1 => "email1",
            CardField::Email2 => "email2",
            CardField::Website => "website",
            CardField::Phone1 => "phone1",
            CardField::Person1 => "person1",
            CardField::Phone2 => "phone2",
            CardField::Person2 => "person2",
            CardField::Phone3 => "phone3",
            CardField::Person3 => "person3",
        }
    }

    /// Label shown next to the input for this field.
    pub fn label(self) -> &'static str {
        match self {
            CardField::CompanyNameMain => "Име на фирмата",
            CardField::CompanyNameSuffix => "Наставка",
            CardField::CompanyType => "Вид дружество",
            CardField::Slogan => "Слоган",
            CardField::Address => "Адрес",
            CardField::Email1 => "Имейл",
            CardField::Email2 => "Имейл 2",
            CardField::Website => "Уебсайт",
            CardField::Phone1 => "Телефон 1",
            CardField::Person1 => "Име 1",
            CardField::Phone2 => "Телефон 2",
            CardField::Person2 => "Име 2",
            CardField::Phone3 => "Телефон 3",
            CardField::Person3 => "Име 3",
        }
    }
}

impl fmt::Display for CardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown card field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for CardField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CardField::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Reasons a JSON payload cannot become a `CardRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload is missing keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
    #[error("value for '{0}' is not a string")]
    NotAString(&'static str),
}

impl CardRecord {
    /// A record with every field empty.
    pub fn blank() -> Self {
        let mut record = Self::default();
        for field in CardField::ALL {
            record.field_mut(field).clear();
        }
        record
    }

    pub fn get(&self, field: CardField) -> &str {
        match field {
            CardField::CompanyNameMain => &self.company_name_main,
            CardField::CompanyNameSuffix => &self.company_name_suffix,
            CardField::CompanyType => &self.company_type,
            CardField::Slogan => &self.slogan,
            CardField::Address => &self.address,
            CardField::Email1 => &self.email1,
            CardField::Email2 => &self.email2,
            CardField::Website => &self.website,
            CardField::Phone1 => &self.phone1,
            CardField::Person1 => &self.person1,
            CardField::Phone2 => &self.phone2,
            CardField::Person2 => &self.person2,
            CardField::Phone3 => &self.phone3,
            CardField::Person3 => &self.person3,
        }
    }

    fn field_mut(&mut self, field: CardField) -> &mut String {
        match field {
            CardField::CompanyNameMain => &mut self.company_name_main,
            CardField::CompanyNameSuffix => &mut self.company_name_suffix,
            CardField::CompanyType => &mut self.company_type,
            CardField::Slogan => &mut self.slogan,
            CardField::Address => &mut self.address,
            CardField::Email1 => &mut self.email1,
            CardField::Email2 => &mut self.email2,
            CardField::Website => &mut self.website,
            CardField::Phone1 => &mut self.phone1,
            CardField::Person1 => &mut self.person1,
            CardField::Phone2 => &mut self.phone2,
            CardField::Person2 => &mut self.person2,
            CardField::Phone3 => &mut self.phone3,
            CardField::Person3 => &mut self.person3,
        }
    }

    pub fn set(&mut self, field: CardField, value: impl Into<String>) {
        *self.field_mut(field) = value.into();
    }

    /// Copy of this record with one field replaced. No validation.
    pub fn with_field(&self, field: CardField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.set(field, value);
        next
    }

    /// Fields whose values differ between `self` and `other`, in schema order.
    pub fn diff(&self, other: &CardRecord) -> Vec<CardField> {
        CardField::ALL
            .into_iter()
            .filter(|f| self.get(*f) != other.get(*f))
            .collect()
    }

    /// Decode a record from JSON text, requiring every key.
    pub fn from_complete_json(raw: &str) -> Result<Self, RecordError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| RecordError::Malformed(e.to_string()))?;
        Self::from_complete_value(&value)
    }

    /// Decode a record from a JSON value, requiring every key to be present
    /// with a string value. Missing keys are never defaulted. Keys that are
    /// not card fields are ignored.
    pub fn from_complete_value(value: &serde_json::Value) -> Result<Self, RecordError> {
        let map = value.as_object().ok_or(RecordError::NotAnObject)?;

        let missing: Vec<String> = CardField::ALL
            .into_iter()
            .map(CardField::key)
            .filter(|k| !map.contains_key(*k))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(RecordError::MissingKeys(missing));
        }

        let mut record = Self::blank();
        for field in CardField::ALL {
            match map.get(field.key()) {
                Some(serde_json::Value::String(s)) => record.set(field, s.as_str()),
                _ => return Err(RecordError::NotAString(field.key())),
            }
        }

        for key in map.keys().filter(|k| k.parse::<CardField>().is_err()) {
            log::debug!("ignoring unknown key '{}' in card payload", key);
        }

        Ok(record)
    }

    /// Flat JSON object in schema order.
    pub fn to_json_pretty(&self) -> String {
        // A struct of plain strings always serializes.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
