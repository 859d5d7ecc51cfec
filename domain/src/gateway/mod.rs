//! Output integrations, one module per downstream service.

use log::*;
use reqwest_middleware::RequestBuilder;

use crate::error::{CampaignErrorKind, DomainErrorKind, Error, ExternalErrorKind};

pub mod aweber;
pub mod brevo;
pub mod resend;
pub mod telegram;
pub mod webhook;

/// Sends a prepared delivery request. Transport errors and non-2xx statuses are both
/// `OutputDeliveryFailure`.
pub(crate) async fn deliver(request: RequestBuilder, service: &str) -> Result<(), Error> {
    let response = request.send().await.map_err(|e| {
        warn!("Failed to reach {service}: {e:?}");
        Error::from(e).into_campaign(CampaignErrorKind::OutputDeliveryFailure)
    })?;

    let status = response.status();
    if status.is_success() {
        debug!("{service} accepted delivery with status {status}");
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    warn!("{service} rejected delivery: {status} - {body}");
    Err(Error {
        source: Some(format!("{service} responded with {status}").into()),
        error_kind: DomainErrorKind::External(ExternalErrorKind::Other(status.to_string())),
    }
    .into_campaign(CampaignErrorKind::OutputDeliveryFailure))
}
