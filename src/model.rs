use crate::api::transport::Transport;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct Api {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

/// Framework context scraped from the login page and echoed back as `aura.context` on every
/// call. Kept as the decoded object, in its original key order, so it goes back as it came.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionDescriptor(Map<String, Value>);

impl SessionDescriptor {
    fn str_field(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn mode(&self) -> &str {
        self.str_field("mode")
    }

    pub fn app(&self) -> &str {
        self.str_field("app")
    }

    /// Framework version fingerprint.
    pub fn fwuid(&self) -> &str {
        self.str_field("fwuid")
    }

    pub fn loaded(&self) -> Option<&Map<String, Value>> {
        self.0.get("loaded").and_then(Value::as_object)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.mode().is_empty() && self.app().is_empty() && self.fwuid().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginInfo {
    pub user_id: String,
    pub name: String,
    pub first_name: String,
    pub account_id: AccountId,
}

/// Authenticated session. Only produced by a completed login, so descriptor, token and cookie
/// store always belong to the same sequence.
#[derive(Debug)]
pub struct LoggedInApi {
    pub(crate) base_url: String,
    pub(crate) transport: Transport,
    pub(crate) descriptor: SessionDescriptor,
    pub(crate) token: BearerToken,
    pub(crate) login_info: LoginInfo,
}

pub type Session = LoggedInApi;

impl LoggedInApi {
    pub fn descriptor(&self) -> &SessionDescriptor {
        &self.descriptor
    }

    pub fn token(&self) -> &BearerToken {
        &self.token
    }

    pub fn account_id(&self) -> &AccountId {
        &self.login_info.account_id
    }

    pub fn login_info(&self) -> &LoginInfo {
        &self.login_info
    }
}

/// Service point (CUPS) as listed by the portal. Values are passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Cups {
    pub id: String,
    pub name: String,
    pub provisioning_address: String,
    pub action_link: String,
}

/// Point-in-time meter reading.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterInfo {
    pub current_power: f64,
    pub contracted_power: f64,
    pub percentage: String,
    pub icp_state: String,
    pub totalizer: String,
}

impl MeterInfo {
    /// Parses `percentage` as sent by the portal, e.g. `"45,3%"` or `"12.5 %"`.
    pub fn percentage_value(&self) -> Option<f64> {
        self.percentage
            .trim()
            .trim_end_matches('%')
            .trim()
            .replace(',', ".")
            .parse()
            .ok()
    }
}
