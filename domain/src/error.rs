//! Error types for the `domain` layer.
use campaign_auth::error::{Error as CampaignAuthError, ErrorKind as CampaignAuthErrorKind};
use campaign_auth::error::OAuthErrorKind;
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error that caused
/// the domain error, so errors are translated between layers while layer boundaries hold:
/// `web` depends on `domain`, which depends on `entity_api` and `campaign_auth`,
/// but `web` never reaches past `domain`. The `error_kind`s are what `web` uses to pick
/// HTTP status codes for the operator API.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
    Campaign(CampaignErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Config,
    Other(String),
}

/// Entity errors translated up from `entity_api`, reduced to what the domain cares about.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid,
    Duplicate,
    DbTransaction,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Other(String),
}

/// Failures along a single campaign attempt, from link decoding to output delivery.
///
/// `InvalidToken` and `StateTransferFailure` send the visitor to the catch-all URL.
/// The rest happen after the visitor has been redirected and are only logged.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CampaignErrorKind {
    /// Malformed, tampered or undecodable token, or an unknown provider name.
    InvalidToken,
    /// A state cookie is missing, corrupt, expired or for another provider.
    StateTransferFailure,
    /// The callback `state` does not match the nonce carried in the cookies.
    ForgeryStateMismatch,
    /// Token exchange or identity lookup with the provider failed.
    VendorExchangeFailure,
    /// The subscriber insert failed, e.g. a duplicate email address.
    RecordFailure,
    /// One output could not be resolved or its delivery failed.
    OutputDeliveryFailure,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {:?}", self.error_kind)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl Error {
    /// Re-labels an error as a campaign failure while keeping it as the source.
    pub fn into_campaign(self, kind: CampaignErrorKind) -> Self {
        Error {
            source: Some(Box::new(self)),
            error_kind: DomainErrorKind::Campaign(kind),
        }
    }

    /// Like `into_campaign`, but keeps an error that already carries a campaign kind.
    pub fn or_campaign(self, kind: CampaignErrorKind) -> Self {
        match self.error_kind {
            DomainErrorKind::Campaign(_) => self,
            _ => self.into_campaign(kind),
        }
    }

    pub fn campaign_kind(&self) -> Option<CampaignErrorKind> {
        match self.error_kind {
            DomainErrorKind::Campaign(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Creates a campaign error with no underlying source.
pub fn campaign_error(kind: CampaignErrorKind) -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Campaign(kind),
    }
}

/// Creates an invalid-input error with a message for the operator.
pub fn invalid(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid)),
    }
}

pub fn config_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::InvalidQueryTerm => EntityErrorKind::Invalid,
            EntityApiErrorKind::DuplicateRecord => EntityErrorKind::Duplicate,
            EntityApiErrorKind::SystemError => EntityErrorKind::DbTransaction,
            EntityApiErrorKind::Other => EntityErrorKind::Other("EntityErrorKind".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

impl From<CampaignAuthError> for Error {
    fn from(err: CampaignAuthError) -> Self {
        let error_kind = match &err.error_kind {
            CampaignAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            CampaignAuthErrorKind::OAuth(OAuthErrorKind::UnknownProvider) => {
                DomainErrorKind::Campaign(CampaignErrorKind::InvalidToken)
            }
            CampaignAuthErrorKind::OAuth(_) => {
                DomainErrorKind::Campaign(CampaignErrorKind::VendorExchangeFailure)
            }
            CampaignAuthErrorKind::Crypto(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors building the client happen before any network call is made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_auth::error::oauth_error;

    #[test]
    fn duplicate_record_maps_to_duplicate() {
        let err: Error = EntityApiError {
            source: None,
            error_kind: EntityApiErrorKind::DuplicateRecord,
        }
        .into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Duplicate))
        );
    }

    #[test]
    fn oauth_failures_are_vendor_exchange_failures() {
        let err: Error = oauth_error(OAuthErrorKind::TokenExchangeFailed, "denied").into();
        assert_eq!(
            err.campaign_kind(),
            Some(CampaignErrorKind::VendorExchangeFailure)
        );

        let err: Error = oauth_error(OAuthErrorKind::UnknownProvider, "nope").into();
        assert_eq!(err.campaign_kind(), Some(CampaignErrorKind::InvalidToken));
    }

    #[test]
    fn into_campaign_keeps_the_source() {
        let err = config_error("missing").into_campaign(CampaignErrorKind::OutputDeliveryFailure);
        assert_eq!(
            err.campaign_kind(),
            Some(CampaignErrorKind::OutputDeliveryFailure)
        );
        assert!(StdError::source(&err).is_some());
    }
}
