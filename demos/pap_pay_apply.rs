//! Requests a deduction and answers a (locally built) result notification.

use std::env;

use secrecy::SecretString;
use wechatpay_pap_sdk::Client;
use wechatpay_pap_sdk::config::{MerchantConfig, RawMerchantConfig};
use wechatpay_pap_sdk::pap::PapPayApplyRequest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = MerchantConfig::production(RawMerchantConfig {
        app_id: env::var("WECHATPAY_APPID")?,
        mch_id: env::var("WECHATPAY_MCHID")?,
        api_key: SecretString::from(env::var("WECHATPAY_API_KEY")?),
    })?;
    let client = Client::new(config)?;

    let request = PapPayApplyRequest::builder()
        .body("water bill")
        .out_trade_no("1217752501201407033233368018")
        .total_fee(888)
        .spbill_create_ip("8.8.8.8")
        .notify_url("http://yoursite.com/wxpay.html")
        .contract_id("Wx15463511252015071056489715")
        .build();

    let response = client.pap_pay_apply(request).await?;
    anyhow::ensure!(
        response.is_success(),
        "deduction refused: {:?} {:?}",
        response.err_code,
        response.err_code_des
    );

    // A failed deduction is not signed, so it passes straight through.
    let body = b"<xml><return_code>SUCCESS</return_code><result_code>FAIL</result_code>\
                 <trade_state>PAY_FAIL</trade_state></xml>";
    let (notification, ack) = client.handle_pap_notification(body)?;
    anyhow::ensure!(!notification.is_paid(), "unexpected paid state");
    let _reply: String = ack.to_xml()?;

    Ok(())
}
