use std::str::FromStr;
use std::time::Instant;

use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Response, Url};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::ClientError;
use crate::payload::{
    build_payload, split_attributes, Attributes, Identity, Payload, ACTION_KEY, MODULE_KEY,
};
use crate::region::{Region, LEGACY_ENDPOINT};

/// Sent as `User-Agent` with every request.
pub const USER_AGENT: &str = concat!("totango-rs/", env!("CARGO_PKG_VERSION"));

/// A client posting events to Totango's pixel endpoint.
///
/// Every operation resolves the identity of the event from the call arguments and the defaults
/// held by the client, then performs exactly one POST. Nothing is queued or retried.
pub struct EventClient {
    /// Identifies the tracked service in every event.
    service_id: String,
    /// Identity used for any field a call leaves out.
    defaults: Identity,
    /// The region the endpoint was selected for, if any.
    region: Option<Region>,
    /// Where events are posted to.
    endpoint: Url,
    /// Authentication headers, empty when no api token is configured.
    headers: HeaderMap,
    /// The client used for HTTP requests.
    client: reqwest::Client,
}

impl EventClient {
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let region = match config.region.as_deref() {
            None | Some("") => None,
            Some(region) => Some(Region::from_str(region)?),
        };
        let api_token = config.api_token.filter(|token| !token.is_empty());

        let endpoint = match region {
            Some(region) if api_token.is_none() => {
                debug!(%region, "refusing to build a regional client without an api token");
                return Err(ClientError::MissingCredential);
            }
            Some(region) => region.endpoint(),
            None => LEGACY_ENDPOINT,
        };

        let headers = match &api_token {
            Some(token) => auth_headers(token)?,
            None => HeaderMap::new(),
        };

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout.0);
        }
        let client = builder.build()?;

        Ok(Self {
            service_id: config.service_id,
            defaults: Identity {
                user_id: config.user_id,
                user_name: config.user_name,
                account_id: config.account_id,
                account_name: config.account_name,
            },
            region,
            endpoint: Url::parse(endpoint)?,
            headers,
            client,
        })
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn endpoint_url(&self) -> &Url {
        &self.endpoint
    }

    /// Point the client at a different pixel endpoint, e.g. a local test server.
    pub fn set_endpoint_url(&mut self, url: &str) -> Result<(), ClientError> {
        self.endpoint = Url::parse(url)?;
        Ok(())
    }

    pub fn defaults(&self) -> &Identity {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut Identity {
        &mut self.defaults
    }

    /// Build the base payload of an event without sending it.
    pub fn build_payload(
        &self,
        overrides: &Identity,
        user_attributes: &Attributes,
        account_attributes: &Attributes,
    ) -> Result<Payload, ClientError> {
        build_payload(
            &self.service_id,
            &self.defaults,
            overrides,
            user_attributes,
            account_attributes,
        )
    }

    /// Report that the user performed `action` in `module`.
    pub async fn track_activity(
        &self,
        module: &str,
        action: &str,
        overrides: &Identity,
        user_attributes: &Attributes,
        account_attributes: &Attributes,
    ) -> Result<Response, ClientError> {
        let mut payload = self.build_payload(overrides, user_attributes, account_attributes)?;
        payload.insert(MODULE_KEY, module);
        payload.insert(ACTION_KEY, action);

        self.dispatch(&payload).await
    }

    #[deprecated(since = "0.1.0", note = "use `track_activity` instead")]
    pub async fn track(
        &self,
        module: &str,
        action: &str,
        overrides: &Identity,
        user_attributes: &Attributes,
        account_attributes: &Attributes,
    ) -> Result<Response, ClientError> {
        warn!("`track` is deprecated, use `track_activity` instead");

        self.track_activity(
            module,
            action,
            overrides,
            user_attributes,
            account_attributes,
        )
        .await
    }

    /// Send identity and attributes without recording an activity.
    pub async fn send(
        &self,
        overrides: &Identity,
        user_attributes: &Attributes,
        account_attributes: &Attributes,
    ) -> Result<Response, ClientError> {
        let payload = self.build_payload(overrides, user_attributes, account_attributes)?;

        self.dispatch(&payload).await
    }

    pub async fn set_user_attributes(
        &self,
        user_id: &str,
        user_name: Option<&str>,
        attributes: &Attributes,
    ) -> Result<Response, ClientError> {
        let overrides = Identity {
            user_id: Some(user_id.to_owned()),
            user_name: user_name.map(str::to_owned),
            ..Identity::default()
        };

        self.send(&overrides, attributes, &Attributes::new()).await
    }

    /// Update account attributes. Without a default user, the account id stands in as the user.
    pub async fn set_account_attributes(
        &self,
        account_id: &str,
        account_name: Option<&str>,
        attributes: &Attributes,
    ) -> Result<Response, ClientError> {
        let overrides = Identity {
            account_id: Some(account_id.to_owned()),
            account_name: account_name.map(str::to_owned),
            ..self.account_owner(account_id)
        };

        self.send(&overrides, &Attributes::new(), attributes).await
    }

    /// Update user and account attributes at once. Keys prefixed with `a.` go to the account,
    /// keys prefixed with `u.` or without a prefix go to the user.
    pub async fn set_attributes(
        &self,
        overrides: &Identity,
        attributes: &Attributes,
    ) -> Result<Response, ClientError> {
        let (user_attributes, account_attributes) = split_attributes(attributes);

        self.send(overrides, &user_attributes, &account_attributes)
            .await
    }

    fn account_owner(&self, account_id: &str) -> Identity {
        match &self.defaults.user_id {
            Some(user_id) if !user_id.is_empty() => Identity::user(user_id),
            _ => Identity::user(account_id).with_user_name(account_id),
        }
    }

    /// POST a payload to the pixel endpoint.
    ///
    /// Any 2xx response is returned untouched. Other statuses fail with `ClientError::HttpStatus`
    /// carrying the response body.
    pub async fn dispatch(&self, payload: &Payload) -> Result<Response, ClientError> {
        debug!(endpoint = %self.endpoint, fields = payload.len(), "sending pixel event");

        let now = Instant::now();
        let result = self.post(payload).await;
        let elapsed = now.elapsed().as_secs_f64();

        metrics::histogram!("totango_request_duration_seconds").record(elapsed);

        match result {
            Ok(response) => {
                metrics::counter!("totango_events_total").increment(1);
                Ok(response)
            }
            Err(error) => {
                metrics::counter!("totango_events_failed", "reason" => error.reason())
                    .increment(1);
                Err(error)
            }
        }
    }

    async fn post(&self, payload: &Payload) -> Result<Response, ClientError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .form(payload)
            .send()
            .await
            .map_err(|e| {
                error!("failed to reach pixel endpoint {}: {}", self.endpoint, e);
                ClientError::Transport(e)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await?;
        warn!(%status, "pixel endpoint rejected event");

        Err(ClientError::HttpStatus { status, body })
    }
}

fn auth_headers(token: &str) -> Result<HeaderMap, ClientError> {
    let mut authorization = HeaderValue::from_str(&format!("app-token {}", token))
        .map_err(|_| ClientError::InvalidApiToken)?;
    authorization.set_sensitive(true);

    let mut api_token = HeaderValue::from_str(token).map_err(|_| ClientError::InvalidApiToken)?;
    api_token.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(HeaderName::from_static("x-api-token"), api_token);

    Ok(headers)
}
