use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ClientError;

pub const SERVICE_ID_KEY: &str = "sdr_s";
pub const USER_ID_KEY: &str = "sdr_u";
pub const USER_NAME_KEY: &str = "sdr_u.name";
pub const ACCOUNT_ID_KEY: &str = "sdr_o";
pub const ACCOUNT_NAME_KEY: &str = "sdr_odn";
pub const MODULE_KEY: &str = "sdr_m";
pub const ACTION_KEY: &str = "sdr_a";

/// Custom properties attached to a user or an account, kept in insertion order.
pub type Attributes = Map<String, Value>;

/// The identity an event is reported for.
///
/// Used both for the defaults stored in an `EventClient` and for per-call overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub account_id: Option<String>,
    pub account_name: Option<String>,
}

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(user_id: &str) -> Self {
        Self::new().with_user_id(user_id)
    }

    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_owned());
        self
    }

    pub fn with_user_name(mut self, user_name: &str) -> Self {
        self.user_name = Some(user_name.to_owned());
        self
    }

    pub fn with_account_id(mut self, account_id: &str) -> Self {
        self.account_id = Some(account_id.to_owned());
        self
    }

    pub fn with_account_name(mut self, account_name: &str) -> Self {
        self.account_name = Some(account_name.to_owned());
        self
    }

    /// Fill every field missing from these overrides with the matching default.
    pub fn resolve(&self, defaults: &Identity) -> Identity {
        Identity {
            user_id: resolve(&self.user_id, &defaults.user_id),
            user_name: resolve(&self.user_name, &defaults.user_name),
            account_id: resolve(&self.account_id, &defaults.account_id),
            account_name: resolve(&self.account_name, &defaults.account_name),
        }
    }
}

/// An empty override counts as absent.
fn resolve(override_value: &Option<String>, default: &Option<String>) -> Option<String> {
    override_value
        .as_ref()
        .filter(|value| !value.is_empty())
        .or(default.as_ref())
        .cloned()
}

/// Form fields posted to the pixel endpoint, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Payload(Vec<(String, String)>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`. A key that is already present keeps its position and gets the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some(field) => field.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Render the payload as an `application/x-www-form-urlencoded` body.
    pub fn encode(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(self)
    }

    /// Insert every attribute under `{namespace}.{key}`. `Null` values are skipped.
    fn insert_attributes(&mut self, namespace: &str, attributes: &Attributes) {
        for (key, value) in attributes {
            if let Some(value) = attribute_value(value) {
                self.insert(format!("{}.{}", namespace, key), value);
            }
        }
    }
}

fn attribute_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(value) => Some(value.clone()),
        other => Some(other.to_string()),
    }
}

/// Assemble the base payload for an event from the call overrides merged with the client defaults.
pub fn build_payload(
    service_id: &str,
    defaults: &Identity,
    overrides: &Identity,
    user_attributes: &Attributes,
    account_attributes: &Attributes,
) -> Result<Payload, ClientError> {
    let identity = overrides.resolve(defaults);
    let user_id = identity.user_id.ok_or(ClientError::MissingUserId)?;

    let mut payload = Payload::new();
    payload.insert(SERVICE_ID_KEY, service_id);
    payload.insert(USER_ID_KEY, user_id);

    if let Some(user_name) = identity.user_name {
        payload.insert(USER_NAME_KEY, user_name);
    }
    if let Some(account_id) = identity.account_id {
        payload.insert(ACCOUNT_ID_KEY, account_id);
    }
    if let Some(account_name) = identity.account_name {
        payload.insert(ACCOUNT_NAME_KEY, account_name);
    }

    payload.insert_attributes(USER_ID_KEY, user_attributes);
    payload.insert_attributes(ACCOUNT_ID_KEY, account_attributes);

    Ok(payload)
}

/// Which namespace an attribute is reported under.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AttributeScope {
    User,
    Account,
}

/// Classify an attribute key by its `a.` or `u.` prefix, returning the key without that prefix.
/// Keys without a recognized prefix belong to the user and are returned unchanged.
pub fn classify_attribute(key: &str) -> (AttributeScope, &str) {
    if let Some(stripped) = key.strip_prefix("a.") {
        (AttributeScope::Account, stripped)
    } else if let Some(stripped) = key.strip_prefix("u.") {
        (AttributeScope::User, stripped)
    } else {
        (AttributeScope::User, key)
    }
}

/// Split prefixed attributes into `(user_attributes, account_attributes)`.
/// When two keys land on the same attribute, the later one wins.
pub fn split_attributes(attributes: &Attributes) -> (Attributes, Attributes) {
    let mut user_attributes = Attributes::new();
    let mut account_attributes = Attributes::new();

    for (key, value) in attributes {
        match classify_attribute(key) {
            (AttributeScope::User, stripped) => {
                user_attributes.insert(stripped.to_owned(), value.clone());
            }
            (AttributeScope::Account, stripped) => {
                account_attributes.insert(stripped.to_owned(), value.clone());
            }
        }
    }

    (user_attributes, account_attributes)
}
