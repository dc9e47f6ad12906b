use rand::Rng as _;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::Result;

/// Status literal used by `return_code`, `result_code` and friends.
pub const SUCCESS: &str = "SUCCESS";

/// Status literal for failed calls.
pub const FAIL: &str = "FAIL";

const NONCE_LEN: usize = 32;

/// How the payer completes the order.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum TradeType {
    /// In-app browser / official account payment.
    Jsapi,
    /// QR code payment.
    Native,
    App,
    /// Mobile web payment.
    Mweb,
    /// Deduction against a signed contract.
    Pap,
}

impl TradeType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// `change_type` of a contract notification.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeType {
    /// Contract signed.
    Add,
    /// Contract terminated.
    Delete,
}

/// Body a merchant returns to the gateway after receiving a notification.
///
/// It always reports success: the gateway only needs to know the message
/// arrived, not what the merchant did with it.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NotifyAck {
    pub return_code: String,
    pub return_msg: String,
}

impl NotifyAck {
    #[must_use]
    pub fn received() -> Self {
        Self {
            return_code: SUCCESS.to_owned(),
            return_msg: "OK".to_owned(),
        }
    }

    pub fn to_xml(&self) -> Result<String> {
        crate::xml::to_string(self)
    }
}

impl Default for NotifyAck {
    fn default() -> Self {
        Self::received()
    }
}

/// Random 32 character alphanumeric `nonce_str`.
#[must_use]
pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

pub(crate) fn is_success(code: &str) -> bool {
    code == SUCCESS
}

pub(crate) fn is_success_opt(code: Option<&str>) -> bool {
    code.is_some_and(is_success)
}
