//! Event Table data model.
//!
//! One [`Event`] is one row of a weekly activity table: who did what, on
//! which machine, and when, plus the numeric micro-features produced for
//! that activity type by the upstream classifiers.

use chrono::NaiveDateTime;
use std::fmt;

/// Categorical activity code of an event.
///
/// The numeric values are the codes used by the downstream tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityCode {
    Other = 0,
    Logon = 1,
    Logoff = 2,
    Connect = 3,
    Disconnect = 4,
    Http = 5,
    Email = 6,
    File = 7,
}

impl ActivityCode {
    /// Parse the `activity` column. Case and surrounding whitespace are
    /// ignored; anything not listed is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = match raw.trim().to_ascii_lowercase().as_str() {
            "logon" => Self::Logon,
            "logoff" => Self::Logoff,
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "http" => Self::Http,
            "email" => Self::Email,
            "file" => Self::File,
            "other" => Self::Other,
            _ => return None,
        };
        Some(code)
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::Logon => "logon",
            Self::Logoff => "logoff",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Http => "http",
            Self::Email => "email",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ActivityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric per-event attribute columns.
///
/// Categorical attributes (`file_type`, `disk`, `http_type`, `Xemail`,
/// `exbccmail`) are small integer codes stored as numbers like the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    UsbDuration,
    FileType,
    FileLen,
    FileWords,
    Disk,
    FileDepth,
    HttpType,
    UrlLen,
    UrlDepth,
    HttpContentLen,
    HttpContentWords,
    Recipients,
    Attachments,
    ExternalEmail,
    ExternalRecipients,
    BccRecipients,
    ExternalBcc,
    EmailSize,
    EmailTextLen,
    EmailTextWords,
}

impl Attribute {
    pub const COUNT: usize = 20;

    /// Column order of the event table.
    pub const ALL: [Self; Self::COUNT] = [
        Self::UsbDuration,
        Self::FileType,
        Self::FileLen,
        Self::FileWords,
        Self::Disk,
        Self::FileDepth,
        Self::HttpType,
        Self::UrlLen,
        Self::UrlDepth,
        Self::HttpContentLen,
        Self::HttpContentWords,
        Self::Recipients,
        Self::Attachments,
        Self::ExternalEmail,
        Self::ExternalRecipients,
        Self::BccRecipients,
        Self::ExternalBcc,
        Self::EmailSize,
        Self::EmailTextLen,
        Self::EmailTextWords,
    ];

    /// Column name in the event table and in generated feature names.
    pub const fn column(self) -> &'static str {
        match self {
            Self::UsbDuration => "usb_dur",
            Self::FileType => "file_type",
            Self::FileLen => "file_len",
            Self::FileWords => "file_nwords",
            Self::Disk => "disk",
            Self::FileDepth => "file_depth",
            Self::HttpType => "http_type",
            Self::UrlLen => "url_len",
            Self::UrlDepth => "url_depth",
            Self::HttpContentLen => "http_c_len",
            Self::HttpContentWords => "http_c_nwords",
            Self::Recipients => "n_des",
            Self::Attachments => "n_atts",
            Self::ExternalEmail => "Xemail",
            Self::ExternalRecipients => "n_exdes",
            Self::BccRecipients => "n_bccdes",
            Self::ExternalBcc => "exbccmail",
            Self::EmailSize => "email_size",
            Self::EmailTextLen => "email_text_slen",
            Self::EmailTextWords => "email_text_nwords",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Values of every [`Attribute`] for one event; absent values are 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventAttributes([f64; Attribute::COUNT]);

impl EventAttributes {
    pub fn get(&self, attribute: Attribute) -> f64 {
        self.0[attribute.index()]
    }

    pub fn set(&mut self, attribute: Attribute, value: f64) {
        self.0[attribute.index()] = value;
    }
}

/// One activity record. Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    pub user: String,
    pub pc: String,
    pub timestamp: NaiveDateTime,
    pub activity: ActivityCode,
    pub attributes: EventAttributes,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        user: impl Into<String>,
        pc: impl Into<String>,
        timestamp: NaiveDateTime,
        activity: ActivityCode,
    ) -> Self {
        Self {
            id: id.into(),
            user: user.into(),
            pc: pc.into(),
            timestamp,
            activity,
            attributes: EventAttributes::default(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute, value: f64) -> Self {
        self.attributes.set(attribute, value);
        self
    }

    pub fn attribute(&self, attribute: Attribute) -> f64 {
        self.attributes.get(attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_parse_case_insensitive() {
        assert_eq!(ActivityCode::parse("Logon"), Some(ActivityCode::Logon));
        assert_eq!(ActivityCode::parse(" LOGOFF "), Some(ActivityCode::Logoff));
        assert_eq!(ActivityCode::parse("http"), Some(ActivityCode::Http));
        assert_eq!(ActivityCode::parse("print"), None);
    }

    #[test]
    fn test_activity_codes() {
        assert_eq!(ActivityCode::Logon.code(), 1);
        assert_eq!(ActivityCode::File.code(), 7);
        assert_eq!(ActivityCode::Other.code(), 0);
    }

    #[test]
    fn test_attribute_columns_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for (i, attribute) in Attribute::ALL.into_iter().enumerate() {
            assert_eq!(attribute.index(), i);
            assert!(seen.insert(attribute.column()));
        }
    }

    #[test]
    fn test_attributes_default_zero() {
        let mut attrs = EventAttributes::default();
        attrs.set(Attribute::UrlLen, 42.0);
        assert_eq!(attrs.get(Attribute::UrlLen), 42.0);
        assert_eq!(attrs.get(Attribute::FileLen), 0.0);
    }
}
