#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use std::collections::BTreeMap;

use httpmock::MockServer;
use secrecy::SecretString;
use wechatpay_pap_sdk::config::{MerchantConfig, RawMerchantConfig};
use wechatpay_pap_sdk::sign::{self, SIGN_FIELD};
use wechatpay_pap_sdk::Client;

pub const APP_ID: &str = "wxcbda96de0b165486";
pub const MCH_ID: &str = "1200009811";
pub const API_KEY: &str = "192006250b4c09247ec02edce69f6a2d";

pub fn api_key() -> SecretString {
    SecretString::from(API_KEY)
}

pub fn client(server: &MockServer) -> Client {
    let config = MerchantConfig::from_raw(
        &server.base_url(),
        RawMerchantConfig {
            app_id: APP_ID.to_owned(),
            mch_id: MCH_ID.to_owned(),
            api_key: api_key(),
        },
    )
    .expect("valid merchant config");

    Client::new(config).expect("http client")
}

pub fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

/// Renders a record the way the gateway does, with every value in CDATA.
pub fn to_xml(record: &BTreeMap<String, String>) -> String {
    let mut xml = String::from("<xml>\n");
    for (name, value) in record {
        xml.push_str(&format!("  <{name}><![CDATA[{value}]]></{name}>\n"));
    }
    xml.push_str("</xml>");
    xml
}

/// Signs `pairs` with the test key and renders them as a gateway document.
pub fn signed_xml(pairs: &[(&str, &str)]) -> String {
    let mut rec = record(pairs);
    let signature = sign::sign(&rec, &api_key());
    rec.insert(SIGN_FIELD.to_owned(), signature);
    to_xml(&rec)
}

/// Like [`signed_xml`] but with a signature computed under another key.
pub fn forged_xml(pairs: &[(&str, &str)]) -> String {
    let mut rec = record(pairs);
    let signature = sign::sign(&rec, &SecretString::from("not-the-merchant-key"));
    rec.insert(SIGN_FIELD.to_owned(), signature);
    to_xml(&rec)
}

/// Like [`signed_xml`] with plain text elements instead of CDATA sections.
pub fn signed_plain_xml(pairs: &[(&str, &str)]) -> String {
    let mut rec = record(pairs);
    let signature = sign::sign(&rec, &api_key());
    rec.insert(SIGN_FIELD.to_owned(), signature);
    let elements: String = rec
        .iter()
        .map(|(name, value)| format!("<{name}>{value}</{name}>"))
        .collect();
    format!("<xml>{elements}</xml>")
}
