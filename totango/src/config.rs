use std::str::FromStr;
use std::time;

use envconfig::Envconfig;

/// Settings an `EventClient` is built from.
///
/// Values can be given programmatically through `Config::new` and the `with_*` setters, or read
/// from `TOTANGO_*` environment variables with `Config::init_from_env`. Validation of the region
/// and api token happens when the client is built.
#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "TOTANGO_SERVICE_ID")]
    pub service_id: String,

    #[envconfig(from = "TOTANGO_USER_ID")]
    pub user_id: Option<String>,

    #[envconfig(from = "TOTANGO_USER_NAME")]
    pub user_name: Option<String>,

    #[envconfig(from = "TOTANGO_ACCOUNT_ID")]
    pub account_id: Option<String>,

    #[envconfig(from = "TOTANGO_ACCOUNT_NAME")]
    pub account_name: Option<String>,

    #[envconfig(from = "TOTANGO_REGION")]
    pub region: Option<String>,

    #[envconfig(from = "TOTANGO_API_TOKEN")]
    pub api_token: Option<String>,

    /// Timeout applied by the HTTP transport to every request. Unset means no timeout.
    #[envconfig(from = "TOTANGO_REQUEST_TIMEOUT_MS")]
    pub request_timeout: Option<EnvMsDuration>,
}

impl Config {
    pub fn new(service_id: &str) -> Self {
        Self {
            service_id: service_id.to_owned(),
            user_id: None,
            user_name: None,
            account_id: None,
            account_name: None,
            region: None,
            api_token: None,
            request_timeout: None,
        }
    }

    pub fn with_user(mut self, user_id: &str, user_name: Option<&str>) -> Self {
        self.user_id = Some(user_id.to_owned());
        self.user_name = user_name.map(str::to_owned);
        self
    }

    pub fn with_account(mut self, account_id: &str, account_name: Option<&str>) -> Self {
        self.account_id = Some(account_id.to_owned());
        self.account_name = account_name.map(str::to_owned);
        self
    }

    pub fn with_region(mut self, region: &str, api_token: &str) -> Self {
        self.region = Some(region.to_owned());
        self.api_token = Some(api_token.to_owned());
        self
    }

    /// Authenticate requests without pinning a region.
    pub fn with_api_token(mut self, api_token: &str) -> Self {
        self.api_token = Some(api_token.to_owned());
        self
    }

    pub fn with_request_timeout(mut self, timeout: time::Duration) -> Self {
        self.request_timeout = Some(EnvMsDuration(timeout));
        self
    }
}

/// A duration read from the environment as a whole number of milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_config_from_environment() {
        let env = HashMap::from([
            ("TOTANGO_SERVICE_ID".to_owned(), "SP-123".to_owned()),
            ("TOTANGO_USER_ID".to_owned(), "user-1".to_owned()),
            ("TOTANGO_REGION".to_owned(), "eu".to_owned()),
            ("TOTANGO_API_TOKEN".to_owned(), "secret".to_owned()),
            ("TOTANGO_REQUEST_TIMEOUT_MS".to_owned(), "2500".to_owned()),
        ]);

        let config = Config::init_from_hashmap(&env).unwrap();

        assert_eq!(config.service_id, "SP-123");
        assert_eq!(config.user_id.as_deref(), Some("user-1"));
        assert_eq!(config.user_name, None);
        assert_eq!(config.account_id, None);
        assert_eq!(config.region.as_deref(), Some("eu"));
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(
            config.request_timeout,
            Some(EnvMsDuration(time::Duration::from_millis(2500)))
        );
    }

    #[test]
    fn test_service_id_is_required() {
        let env = HashMap::from([("TOTANGO_USER_ID".to_owned(), "user-1".to_owned())]);

        assert!(Config::init_from_hashmap(&env).is_err());
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        assert_eq!(
            "soon".parse::<EnvMsDuration>(),
            Err(ParseEnvMsDurationError)
        );
    }

    #[test]
    fn test_builder_setters() {
        let config = Config::new("SP-123")
            .with_user("user-1", Some("User One"))
            .with_account("account-1", None)
            .with_region("us", "secret");

        assert_eq!(config.user_name.as_deref(), Some("User One"));
        assert_eq!(config.account_id.as_deref(), Some("account-1"));
        assert_eq!(config.account_name, None);
        assert_eq!(config.region.as_deref(), Some("us"));
        assert_eq!(config.api_token.as_deref(), Some("secret"));
    }
}
