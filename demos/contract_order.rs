//! Places a contract order against the production host.
//!
//! ```sh
//! WECHATPAY_APPID=... WECHATPAY_MCHID=... WECHATPAY_API_KEY=... \
//!     cargo run --example contract_order --features tracing
//! ```

use std::env;

use secrecy::SecretString;
use tracing_subscriber::EnvFilter;
use wechatpay_pap_sdk::Client;
use wechatpay_pap_sdk::config::{MerchantConfig, RawMerchantConfig};
use wechatpay_pap_sdk::contract::ContractOrderRequest;
use wechatpay_pap_sdk::types::TradeType;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = MerchantConfig::production(RawMerchantConfig {
        app_id: env::var("WECHATPAY_APPID")?,
        mch_id: env::var("WECHATPAY_MCHID")?,
        api_key: SecretString::from(env::var("WECHATPAY_API_KEY")?),
    })?;
    let client = Client::new(config)?;

    let request = ContractOrderRequest::builder()
        .out_trade_no("123456")
        .body("Ipad mini 16G")
        .notify_url("https://weixin.qq.com")
        .total_fee(888)
        .spbill_create_ip("123.12.12.123")
        .trade_type(TradeType::Jsapi)
        .plan_id(123)
        .contract_code("100001256")
        .request_serial(1000)
        .contract_display_account("recurring payment")
        .contract_notify_url("https://yoursite.com")
        .build();

    let response = client.contract_order(request).await?;
    tracing::info!(
        return_code = %response.return_code,
        prepay_id = ?response.prepay_id,
        contract_result_code = ?response.contract_result_code,
        "contract order placed"
    );

    Ok(())
}
