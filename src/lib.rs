//! Client for the WeChat Pay v2 XML merchant API: contract orders, PAP
//! (entrusted) deductions, and the notifications both endpoints send back.
//!
//! ```rust,no_run
//! use secrecy::SecretString;
//! use wechatpay_pap_sdk::config::{MerchantConfig, RawMerchantConfig};
//! use wechatpay_pap_sdk::pap::PapPayApplyRequest;
//! use wechatpay_pap_sdk::Client;
//!
//! # async fn run() -> wechatpay_pap_sdk::Result<()> {
//! let config = MerchantConfig::production(RawMerchantConfig {
//!     app_id: "wxcbda96de0b165486".to_owned(),
//!     mch_id: "10000098".to_owned(),
//!     api_key: SecretString::from("your_api_key"),
//! })?;
//! let client = Client::new(config)?;
//!
//! let request = PapPayApplyRequest::builder()
//!     .body("water bill")
//!     .out_trade_no("1217752501201407033233368018")
//!     .total_fee(888)
//!     .notify_url("https://example.com/wxpay")
//!     .contract_id("Wx15463511252015071056489715")
//!     .build();
//! let response = client.pap_pay_apply(request).await?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
#[cfg(feature = "contract")]
pub mod contract;
pub mod error;
#[cfg(feature = "pap")]
pub mod pap;
pub mod sign;
pub mod types;
pub mod xml;

use reqwest::{Client as ReqwestClient, Request};

pub use client::Client;
pub use config::{MerchantConfig, RawMerchantConfig};
pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Sends `request` once and returns the body of a 2xx reply.
async fn request(client: &ReqwestClient, request: Request) -> Result<Vec<u8>> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    #[cfg(feature = "tracing")]
    tracing::debug!(%method, %path, "sending request");

    let response = client.execute(request).await?;
    let status_code = response.status();

    if !status_code.is_success() {
        let message = failure_message(response.text().await);

        #[cfg(feature = "tracing")]
        tracing::warn!(
            status = %status_code,
            method = %method,
            path = %path,
            message = %message,
            "request failed"
        );

        return Err(Error::status(status_code, method, path, message));
    }

    Ok(response.bytes().await?.to_vec())
}

/// Body of a failed reply, or why it could not be read.
fn failure_message(body: reqwest::Result<String>) -> String {
    body.unwrap_or_else(|e| format!("failed to read response body: {e}"))
}
