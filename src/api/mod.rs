pub mod action;
pub mod endpoint;
pub mod error;
pub mod extract;
mod login;
pub mod response;
pub mod transport;

use crate::model::{self, BearerToken, LoggedInApi, SessionDescriptor};
pub use error::{Error, LoginStep};
pub use login::login;
use response::consultar_contador::ConsultarContador;
use response::get_cups::GetCups;
use serde::de::DeserializeOwned;
use serde_json::Value;
use transport::Transport;

use http::header::{HeaderMap, HeaderValue, ACCEPT};

pub fn api(base_url: String, username: String, password: String) -> model::Api {
    model::Api {
        base_url: base_url.trim_end_matches('/').to_string(),
        username,
        password,
        timeout: model::DEFAULT_TIMEOUT,
    }
}

/// Descriptor and bearer token of one login sequence, as sent with every authenticated call.
pub(crate) struct AuraContext<'a> {
    descriptor: &'a SessionDescriptor,
    token: &'a BearerToken,
}

impl<'a> AuraContext<'a> {
    pub(crate) fn new(
        descriptor: &'a SessionDescriptor,
        token: &'a BearerToken,
    ) -> Result<Self, Error> {
        if descriptor.is_empty() || token.as_str().is_empty() {
            return Err(Error::SessionExpired(
                "missing session descriptor or bearer token".to_string(),
            ));
        }
        Ok(AuraContext { descriptor, token })
    }
}

impl LoggedInApi {
    fn aura_context(&self) -> Result<AuraContext<'_>, Error> {
        AuraContext::new(&self.descriptor, &self.token)
    }
}

/// Decode the return value of an action into its response type.
fn from_return_value<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value::<T>(value.clone())
        .map_err(|e| Error::Decode(e.to_string(), value.to_string()))
}

/// Send one action to the aura endpoint and return the response envelope. An answer without
/// a JSON envelope means the portal no longer accepts the session.
async fn post(
    transport: &Transport,
    base_url: &str,
    context: &AuraContext<'_>,
    request: action::ActionRequest,
) -> Result<action::ActionEnvelope, Error> {
    let url = format!("{}{}{}", base_url, endpoint::AURA, request.command());
    let form = action::encode(
        endpoint::DASHBOARD_PAGE_URI,
        Some(context.token),
        context.descriptor,
        &[request],
    )?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let response = transport.post(&url, &form, headers).await?;

    action::decode(response.content_type(), &response.body)?
        .ok_or_else(|| {
            Error::SessionExpired(format!(
                "no action envelope received (server responded {})",
                response.status
            ))
        })
}

/// List the service points (CUPS) visible to the logged in account, in portal order.
pub async fn list_cups(api: &LoggedInApi) -> Result<Vec<model::Cups>, Error> {
    let context = api.aura_context()?;

    let envelope = post(
        &api.transport,
        &api.base_url,
        &context,
        action::get_cups(api.account_id()),
    )
    .await?;

    /* An error envelope here means the portal dropped the session */
    if let Some(message) = envelope.error_message() {
        return Err(Error::SessionExpired(message));
    }
    let value = envelope.into_return_value()?;

    from_return_value::<GetCups>(value).map(|response| {
        response
            .data
            .lst_cups
            .into_iter()
            .map(model::Cups::from)
            .collect()
    })
}

/// Read the meter behind `cups_id`. A reading the portal flags with a warning is returned as
/// `Error::RemoteWarning`, never as data.
pub async fn meter_info(api: &LoggedInApi, cups_id: &str) -> Result<model::MeterInfo, Error> {
    let context = api.aura_context()?;

    let value = post(
        &api.transport,
        &api.base_url,
        &context,
        action::consultar_contador(cups_id),
    )
    .await?
    .into_return_value()?;

    let response = from_return_value::<ConsultarContador>(value)?;
    if response.reject_promise {
        log::debug!("meter reading for {} flagged rejectPromise", cups_id);
    }
    Ok(response.data.into())
}
