//! Carries campaign state across the provider redirect in encrypted cookies.
//!
//! Every field travels in its own cookie. Cookie names are derived from the cookie secret so
//! the callback can find them without any logical name appearing on the wire, and every value
//! is sealed independently and bound to its field, so a value moved into another field's cookie
//! does not open. Reading back is all-or-nothing: one missing, undecryptable or
//! expired cookie fails the whole read.

use std::time::Duration;

use campaign_auth::crypto::Cipher;
use campaign_auth::oauth::ProviderName;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::*;

use crate::campaign::{join_output_ids, split_output_ids, CampaignState};
use crate::error::{campaign_error, CampaignErrorKind, Error};

/// Fixed layout of the `createdAt` cookie, e.g. `Fri Oct 16 09:30:00 2026`.
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ListId,
    ProviderName,
    OutputIds,
    RedirectUrl,
    CreatedAt,
    Nonce,
}

impl Field {
    const ALL: [Field; 6] = [
        Field::ListId,
        Field::ProviderName,
        Field::OutputIds,
        Field::RedirectUrl,
        Field::CreatedAt,
        Field::Nonce,
    ];

    fn logical_name(self) -> &'static str {
        match self {
            Field::ListId => "emailListId",
            Field::ProviderName => "providerName",
            Field::OutputIds => "outputIds",
            Field::RedirectUrl => "redirectUrl",
            Field::CreatedAt => "createdAt",
            Field::Nonce => "nonce",
        }
    }
}

/// State of one campaign attempt: the campaign itself plus what binds it to this visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarriedState {
    pub state: CampaignState,
    /// Truncated to whole seconds, the precision of the cookie layout.
    pub created_at: DateTime<Utc>,
    /// Anti-forgery value sent to the provider as the OAuth `state` parameter.
    pub nonce: String,
}

impl CarriedState {
    pub fn new(state: CampaignState, nonce: String) -> Self {
        Self {
            state,
            created_at: truncate_to_seconds(Utc::now()),
            nonce,
        }
    }
}

/// One cookie to set on (or clear from) the outgoing response.
///
/// The web layer always sends it HttpOnly, Secure, SameSite=Lax and scoped to `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedCookie {
    pub name: String,
    pub value: String,
    pub max_age: Duration,
}

#[derive(Clone, Debug)]
pub struct StateCarrier {
    cipher: Cipher,
    max_age: Duration,
}

impl StateCarrier {
    pub fn new(secret: &[u8], max_age: Duration) -> Result<Self, Error> {
        Ok(Self {
            cipher: Cipher::new(secret)?,
            max_age,
        })
    }

    fn cookie_name(&self, field: Field) -> String {
        format!("cr_{}", self.cipher.derive_name(field.logical_name()))
    }

    /// Seals `carried` into the cookies to set on the redirect to the provider.
    pub fn seal(&self, carried: &CarriedState) -> Result<Vec<SealedCookie>, Error> {
        let output_ids = join_output_ids(&carried.state.output_ids)?;
        let created_at = carried.created_at.format(CREATED_AT_FORMAT).to_string();

        Field::ALL
            .iter()
            .map(|&field| {
                let plaintext = match field {
                    Field::ListId => carried.state.list_id.as_str(),
                    Field::ProviderName => carried.state.provider_name.as_str(),
                    Field::OutputIds => output_ids.as_str(),
                    Field::RedirectUrl => carried.state.redirect_url.as_str(),
                    Field::CreatedAt => created_at.as_str(),
                    Field::Nonce => carried.nonce.as_str(),
                };
                Ok(SealedCookie {
                    name: self.cookie_name(field),
                    value: self.cipher.seal_bound(plaintext, field.logical_name())?,
                    max_age: self.max_age,
                })
            })
            .collect()
    }

    /// Rebuilds the state from the callback's cookies.
    ///
    /// `lookup` returns the raw value of a cookie by name. Any missing, forged or expired
    /// cookie is a `StateTransferFailure`; a partial state is never returned.
    pub fn open<F>(&self, lookup: F) -> Result<CarriedState, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |field: Field| -> Result<String, Error> {
            let raw = lookup(&self.cookie_name(field)).ok_or_else(|| {
                debug!("State cookie {} is missing", field.logical_name());
                state_transfer_failure()
            })?;
            self.cipher.open_bound(&raw, field.logical_name()).map_err(|e| {
                debug!("State cookie {} failed to open", field.logical_name());
                Error::from(e).into_campaign(CampaignErrorKind::StateTransferFailure)
            })
        };

        let list_id = read(Field::ListId)?;
        let provider_name = read(Field::ProviderName)?
            .parse::<ProviderName>()
            .map_err(|_| state_transfer_failure())?;
        let output_ids = split_output_ids(&read(Field::OutputIds)?);
        let redirect_url = read(Field::RedirectUrl)?;
        let created_at = parse_created_at(&read(Field::CreatedAt)?)?;
        let nonce = read(Field::Nonce)?;

        let age = Utc::now().signed_duration_since(created_at);
        if age.num_seconds() > self.max_age.as_secs() as i64 {
            debug!("State cookies expired {}s after creation", age.num_seconds());
            return Err(state_transfer_failure());
        }

        Ok(CarriedState {
            state: CampaignState {
                list_id,
                provider_name,
                output_ids,
                redirect_url,
            },
            created_at,
            nonce,
        })
    }

    /// Cookies that remove every state cookie from the browser.
    pub fn cleared(&self) -> Vec<SealedCookie> {
        Field::ALL
            .iter()
            .map(|&field| SealedCookie {
                name: self.cookie_name(field),
                value: String::new(),
                max_age: Duration::ZERO,
            })
            .collect()
    }
}

fn state_transfer_failure() -> Error {
    campaign_error(CampaignErrorKind::StateTransferFailure)
}

fn parse_created_at(value: &str) -> Result<DateTime<Utc>, Error> {
    NaiveDateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: crate::error::DomainErrorKind::Campaign(
                CampaignErrorKind::StateTransferFailure,
            ),
        })
}

fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &[u8] = b"123456789_123456789_123456789_12";
    const OTHER_SECRET: &[u8] = b"abcdefghij_abcdefghij_abcdefghij";

    fn carrier() -> StateCarrier {
        StateCarrier::new(SECRET, Duration::from_secs(600)).unwrap()
    }

    fn carried() -> CarriedState {
        CarriedState::new(
            CampaignState::new(
                "list-1",
                ProviderName::Google,
                vec!["out-a".to_string(), "out-b".to_string()],
                "https://site.example/thanks?a=1&b=2",
            ),
            "nonce-123".to_string(),
        )
    }

    fn jar(cookies: &[SealedCookie]) -> HashMap<String, String> {
        cookies
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }

    fn is_state_transfer_failure(result: Result<CarriedState, Error>) -> bool {
        matches!(result, Err(e) if e.campaign_kind() == Some(CampaignErrorKind::StateTransferFailure))
    }

    #[test]
    fn open_returns_what_was_sealed() {
        let cookies = carrier().seal(&carried()).unwrap();
        assert_eq!(cookies.len(), Field::ALL.len());

        let jar = jar(&cookies);
        let opened = carrier().open(|name| jar.get(name).cloned()).unwrap();
        assert_eq!(opened, carried());
    }

    #[test]
    fn cookie_names_hide_field_names() {
        let cookies = carrier().seal(&carried()).unwrap();
        for cookie in &cookies {
            for field in Field::ALL {
                assert!(!cookie.name.contains(field.logical_name()));
            }
            assert!(!cookie.value.contains("list-1"));
        }
    }

    #[test]
    fn every_missing_cookie_fails_the_read() {
        let cookies = carrier().seal(&carried()).unwrap();
        for missing in &cookies {
            let mut jar = jar(&cookies);
            jar.remove(&missing.name);
            let result = carrier().open(|name| jar.get(name).cloned());
            assert!(is_state_transfer_failure(result));
        }
    }

    #[test]
    fn corrupted_cookie_fails_the_read() {
        let cookies = carrier().seal(&carried()).unwrap();
        let mut jar = jar(&cookies);
        let victim = &cookies[0].name;
        jar.insert(victim.clone(), "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_string());
        assert!(is_state_transfer_failure(
            carrier().open(|name| jar.get(name).cloned())
        ));
    }

    #[test]
    fn swapped_cookie_values_fail_the_read() {
        let c = carrier();
        let cookies = c.seal(&carried()).unwrap();
        let mut jar = jar(&cookies);
        let list_name = c.cookie_name(Field::ListId);
        let redirect_name = c.cookie_name(Field::RedirectUrl);
        let list_value = jar[&list_name].clone();
        let redirect_value = jar[&redirect_name].clone();
        jar.insert(list_name, redirect_value);
        jar.insert(redirect_name, list_value);

        assert!(is_state_transfer_failure(c.open(|name| jar.get(name).cloned())));
    }

    #[test]
    fn other_secret_cannot_read() {
        let cookies = carrier().seal(&carried()).unwrap();
        let jar = jar(&cookies);
        let other = StateCarrier::new(OTHER_SECRET, Duration::from_secs(600)).unwrap();
        assert!(is_state_transfer_failure(
            other.open(|name| jar.get(name).cloned())
        ));
    }

    #[test]
    fn expired_state_fails_the_read() {
        let mut old = carried();
        old.created_at = truncate_to_seconds(Utc::now() - chrono::Duration::seconds(601));
        let cookies = carrier().seal(&old).unwrap();
        let jar = jar(&cookies);
        assert!(is_state_transfer_failure(
            carrier().open(|name| jar.get(name).cloned())
        ));
    }

    #[test]
    fn unparseable_created_at_fails_the_read() {
        let c = carrier();
        let cookies = c.seal(&carried()).unwrap();
        let mut jar = jar(&cookies);
        let cipher = Cipher::new(SECRET).unwrap();
        jar.insert(
            c.cookie_name(Field::CreatedAt),
            cipher
                .seal_bound("2026-10-16T09:30:00Z", Field::CreatedAt.logical_name())
                .unwrap(),
        );
        assert!(is_state_transfer_failure(c.open(|name| jar.get(name).cloned())));
    }

    #[test]
    fn created_at_layout_round_trips() {
        let at = truncate_to_seconds(Utc::now());
        let formatted = at.format(CREATED_AT_FORMAT).to_string();
        assert_eq!(parse_created_at(&formatted).unwrap(), at);
    }

    #[test]
    fn cleared_cookies_expire_immediately() {
        let cleared = carrier().cleared();
        assert_eq!(cleared.len(), Field::ALL.len());
        assert!(cleared.iter().all(|c| c.value.is_empty()));
        assert!(cleared.iter().all(|c| c.max_age.is_zero()));
    }
}
