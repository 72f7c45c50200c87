//! Publishing the current word count to the NaNoWriMo word-count API.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;
use sha1::{Digest, Sha1};

/// Endpoint accepting the signed word-count update.
pub const DEFAULT_UPDATE_URL: &str = "https://nanowrimo.org/api/wordcount";
/// Endpoint prefix returning a user's current count; the user name is appended.
pub const DEFAULT_COUNT_URL: &str = "https://nanowrimo.org/wordcount_api/wc/";

/// Result of an update followed by a confirmation query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The service reports exactly the count that was sent.
    Confirmed,
    /// The service reports something else, or nothing parseable.
    Mismatch { reported: Option<String> },
}

/// Lowercase hex SHA-1 of `secret`, `username` and `count`, concatenated.
pub fn sign(secret: &str, username: &str, count: i64) -> String {
    let digest = Sha1::digest(format!("{secret}{username}{count}").as_bytes());
    format!("{digest:x}")
}

/// The confirmation document; only the count is of interest.
#[derive(Debug, Deserialize)]
struct WordCountDocument {
    #[serde(default)]
    user_wordcount: Option<String>,
}

/// Pulls `<user_wordcount>` out of the confirmation document. Malformed
/// documents report nothing.
pub fn parse_reported_count(document: &str) -> Option<String> {
    match quick_xml::de::from_str::<WordCountDocument>(document) {
        Ok(parsed) => parsed.user_wordcount.map(|count| count.trim().to_string()),
        Err(e) => {
            debug!("Unreadable word count document: {e}");
            None
        }
    }
}

pub struct RemoteSync {
    client: reqwest::Client,
    update_url: String,
    count_url: String,
}

impl Default for RemoteSync {
    fn default() -> Self {
        Self::new(DEFAULT_UPDATE_URL, DEFAULT_COUNT_URL)
    }
}

impl RemoteSync {
    pub fn new(update_url: impl Into<String>, count_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            update_url: update_url.into(),
            count_url: count_url.into(),
        }
    }

    /// Sends `count` for `username`, then reads the count back and compares
    /// the two as text.
    pub async fn publish(&self, username: &str, secret: &str, count: i64) -> Result<SyncOutcome> {
        let form = [
            ("hash", sign(secret, username, count)),
            ("name", username.to_string()),
            ("wordcount", count.to_string()),
        ];

        info!("Updating remote word count at {}", self.update_url);
        let response = self
            .client
            .put(&self.update_url)
            .form(&form)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.update_url))?;
        debug!("Update answered {}", response.status());

        let url = format!("{}{}", self.count_url, username);
        let document = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {url}"))?
            .text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;

        let reported = parse_reported_count(&document);
        if reported.as_deref() == Some(count.to_string().as_str()) {
            Ok(SyncOutcome::Confirmed)
        } else {
            Ok(SyncOutcome::Mismatch { reported })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_is_hex_sha1() {
        // sha1("") is the well-known empty digest
        assert_eq!(
            format!("{:x}", Sha1::digest(b"")),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        let signature = sign("secret", "writer", 1200);
        assert_eq!(signature.len(), 40);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(signature, sign("secret", "writer", 1200));
        assert_ne!(signature, sign("secret", "writer", 1201));
    }

    #[test]
    fn test_sign_concatenates_fields() {
        assert_eq!(sign("ab", "c", 1), sign("a", "bc", 1));
    }

    #[test]
    fn test_parse_reported_count() {
        let xml = "<wc><uid>42</uid><uname>writer</uname><user_wordcount>1200</user_wordcount></wc>";
        assert_eq!(parse_reported_count(xml).as_deref(), Some("1200"));
        assert_eq!(
            parse_reported_count("<wc><user_wordcount> 7 </user_wordcount></wc>").as_deref(),
            Some("7")
        );
        assert_eq!(parse_reported_count("<wc><error>no user</error></wc>"), None);
        assert_eq!(parse_reported_count("<wc><user_wordcount>"), None);
    }
}
