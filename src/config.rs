use std::time::Duration;

use secrecy::{ExposeSecret as _, SecretString};
use url::Url;

use crate::Result;
use crate::error::Error;

/// Production host of the v2 merchant API.
pub const DEFAULT_HOST: &str = "https://api.mch.weixin.qq.com/";

/// Raw merchant values typically passed from app-level config.
#[derive(Clone, Debug)]
pub struct RawMerchantConfig {
    pub app_id: String,
    pub mch_id: String,
    pub api_key: SecretString,
}

/// Merchant identity and the v2 API key used to sign every message.
#[derive(Clone, Debug)]
pub struct MerchantConfig {
    pub host: Url,
    pub app_id: String,
    pub mch_id: String,
    pub api_key: SecretString,
    /// Applied when the client builds its own HTTP client.
    pub timeout: Option<Duration>,
}

impl MerchantConfig {
    pub fn from_raw(host: &str, raw: RawMerchantConfig) -> Result<Self> {
        let host = Url::parse(host)?;

        Self::new(host, raw.app_id, raw.mch_id, raw.api_key)
    }

    /// Configuration against [`DEFAULT_HOST`].
    pub fn production(raw: RawMerchantConfig) -> Result<Self> {
        Self::from_raw(DEFAULT_HOST, raw)
    }

    pub fn new(
        host: Url,
        app_id: String,
        mch_id: String,
        api_key: SecretString,
    ) -> Result<Self> {
        if app_id.trim().is_empty() {
            return Err(Error::validation("app_id must not be empty"));
        }
        if mch_id.trim().is_empty() {
            return Err(Error::validation("mch_id must not be empty"));
        }
        if api_key.expose_secret().is_empty() {
            return Err(Error::validation("api_key must not be empty"));
        }
        if host.cannot_be_a_base() {
            return Err(Error::validation(format!(
                "host {host} cannot be used as a base URL"
            )));
        }

        Ok(Self {
            host,
            app_id,
            mch_id,
            api_key,
            timeout: None,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
