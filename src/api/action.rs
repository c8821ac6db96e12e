//! Aura action envelopes: request form encoding and generic response decoding.

use super::Error;
use crate::model::{AccountId, BearerToken, SessionDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/* Sent as `aura.token` before a bearer token exists */
const NO_TOKEN: &str = "undefined";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub id: u32,
    pub descriptor: String,
    pub calling_descriptor: String,
    pub params: BTreeMap<String, String>,
}

impl ActionRequest {
    fn new(id: u32, descriptor: &str, calling_descriptor: &str, params: &[(&str, &str)]) -> Self {
        ActionRequest {
            id,
            descriptor: descriptor.to_string(),
            calling_descriptor: calling_descriptor.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// `Controller.method` name used as query string of the aura endpoint.
    pub fn command(&self) -> String {
        self.descriptor.replacen("/ACTION$", ".", 1)
    }
}

pub fn login(username: &str, password: &str, start_url: &str) -> ActionRequest {
    ActionRequest::new(
        91,
        "LightningLoginFormController/ACTION$login",
        "WP_LoginForm",
        &[
            ("username", username),
            ("password", password),
            ("startUrl", start_url),
        ],
    )
}

pub fn get_login_info() -> ActionRequest {
    ActionRequest::new(
        215,
        "WP_Monitor_CTRL/ACTION$getLoginInfo",
        "WP_Monitor",
        &[("serviceNumber", "S011")],
    )
}

pub fn get_cups(account: &AccountId) -> ActionRequest {
    ActionRequest::new(
        270,
        "WP_ContadorICP_F2_CTRL/ACTION$getCUPSReconectarICP",
        "WP_Reconnect_ICP",
        &[("visSelected", account.as_str())],
    )
}

pub fn consultar_contador(cups_id: &str) -> ActionRequest {
    ActionRequest::new(
        294,
        "WP_ContadorICP_F2_CTRL/ACTION$consultarContador",
        "WP_Reconnect_Detail",
        &[("cupsId", cups_id)],
    )
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub actions: Vec<ActionRequest>,
}

/// Build the four form fields of an aura POST.
pub fn encode(
    page_uri: &str,
    token: Option<&BearerToken>,
    descriptor: &SessionDescriptor,
    actions: &[ActionRequest],
) -> Result<Vec<(&'static str, String)>, Error> {
    let message = serde_json::to_string(&Message {
        actions: actions.to_vec(),
    })
    .map_err(|e| Error::Internal(format!("Unable to encode actions: {}", e)))?;
    let context = serde_json::to_string(descriptor)
        .map_err(|e| Error::Internal(format!("Unable to encode aura.context: {}", e)))?;

    Ok(vec![
        ("message", message),
        ("aura.context", context),
        ("aura.pageURI", page_uri.to_string()),
        (
            "aura.token",
            token.map_or(NO_TOKEN, BearerToken::as_str).to_string(),
        ),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionState {
    Success,
    Error,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    #[serde(default)]
    pub id: Value,
    pub state: ActionState,
    #[serde(default)]
    pub return_value: Value,
    #[serde(default)]
    pub error: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEnvelope {
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub actions: Vec<ActionResponse>,
    #[serde(default)]
    pub event: Value,
    #[serde(default)]
    pub exception_event: bool,
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.trim_start().starts_with("application/json"))
        .unwrap_or(false)
}

/// Decode an aura response body. A non-JSON response yields `Ok(None)` (typically the portal
/// answering with an HTML page); a JSON body that is not an envelope is a decode error.
pub fn decode(content_type: Option<&str>, body: &str) -> Result<Option<ActionEnvelope>, Error> {
    if !is_json(content_type) {
        log::debug!("Non-JSON aura response ({:?})", content_type);
        return Ok(None);
    }

    serde_json::from_str::<ActionEnvelope>(body)
        .map(Some)
        .map_err(|e| Error::Decode(e.to_string(), body.to_string()))
}

fn first_message(errors: &[Value]) -> Option<String> {
    errors
        .iter()
        .filter_map(|e| e.get("message").and_then(Value::as_str))
        .find(|m| !m.is_empty())
        .map(String::from)
}

/// Surface an embedded `hasWarning`/`warning` flag as `RemoteWarning`.
fn check_warning(return_value: &Value) -> Result<(), Error> {
    let message = return_value
        .get("warning")
        .and_then(|w| w.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty());

    match return_value.get("hasWarning").and_then(Value::as_bool) {
        Some(true) => Err(Error::RemoteWarning(
            message.unwrap_or("(no warning message received)").to_string(),
        )),
        Some(false) => Ok(()),
        None => match message {
            Some(m) => Err(Error::RemoteWarning(m.to_string())),
            None => Ok(()),
        },
    }
}

impl ActionEnvelope {
    /// Message of the first action when the portal answered it with `ERROR` state.
    pub fn error_message(&self) -> Option<String> {
        self.actions
            .first()
            .filter(|action| action.state == ActionState::Error)
            .map(|action| {
                first_message(&action.error)
                    .unwrap_or_else(|| format!("action {} failed", action.id))
            })
    }

    /// Return value of the first action, after checking the envelope for session errors,
    /// `ERROR` state and embedded warnings.
    pub fn into_return_value(self) -> Result<Value, Error> {
        if self.exception_event {
            let descriptor = self
                .event
                .get("descriptor")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Err(if descriptor.contains("invalidSession") {
                Error::SessionExpired(descriptor.to_string())
            } else {
                Error::RemoteWarning(format!("exception event {}", descriptor))
            });
        }

        if let Some(message) = self.error_message() {
            return Err(Error::RemoteWarning(message));
        }

        let action = self
            .actions
            .into_iter()
            .next()
            .ok_or_else(|| Error::SessionExpired("response carries no actions".to_string()))?;

        check_warning(&action.return_value)?;
        Ok(action.return_value)
    }
}
