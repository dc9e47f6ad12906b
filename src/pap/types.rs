use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as, skip_serializing_none};

use crate::sign::{FieldSet, Reply, Signable};
use crate::types::{TradeType, is_success, is_success_opt};

/// Deduct `total_fee` from the payer of an existing contract.
///
/// `appid`, `mch_id` and `sign` are filled in by
/// [`Client::pap_pay_apply`](crate::Client::pap_pay_apply). `trade_type` is
/// always `PAP`.
#[serde_as]
#[skip_serializing_none]
#[non_exhaustive]
#[derive(Clone, Debug, Serialize, Builder)]
#[builder(on(String, into))]
pub struct PapPayApplyRequest {
    #[builder(default)]
    pub appid: String,
    #[builder(default)]
    pub mch_id: String,
    #[builder(default)]
    pub nonce_str: String,
    #[builder(skip)]
    pub sign: String,
    pub body: String,
    pub detail: Option<String>,
    pub attach: Option<String>,
    pub out_trade_no: String,
    /// Amount in fen.
    pub total_fee: u64,
    /// Defaults to `CNY` on the gateway side.
    pub fee_type: Option<String>,
    pub spbill_create_ip: Option<String>,
    pub goods_tag: Option<String>,
    pub notify_url: String,
    #[builder(skip = TradeType::Pap)]
    #[serde_as(as = "DisplayFromStr")]
    pub trade_type: TradeType,
    /// Id assigned by the gateway when the contract was signed.
    pub contract_id: String,
}

impl Signable for PapPayApplyRequest {
    fn signing_fields(&self) -> FieldSet<'_> {
        FieldSet::new()
            .with("appid", &self.appid)
            .with("mch_id", &self.mch_id)
            .with("nonce_str", &self.nonce_str)
            .with("body", &self.body)
            .with("detail", &self.detail)
            .with("attach", &self.attach)
            .with("out_trade_no", &self.out_trade_no)
            .with("total_fee", self.total_fee)
            .with("fee_type", &self.fee_type)
            .with("spbill_create_ip", &self.spbill_create_ip)
            .with("goods_tag", &self.goods_tag)
            .with("notify_url", &self.notify_url)
            .with("trade_type", self.trade_type.as_str())
            .with("contract_id", &self.contract_id)
    }

    fn signature(&self) -> Option<&str> {
        Some(self.sign.as_str()).filter(|sign| !sign.is_empty())
    }
}

/// Acceptance of a deduction request. The money movement itself is reported
/// later by a [`PapPayNotification`].
#[skip_serializing_none]
#[non_exhaustive]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PapPayApplyResponse {
    pub return_code: String,
    pub return_msg: Option<String>,
    pub mch_id: Option<String>,
    pub appid: Option<String>,
    pub nonce_str: Option<String>,
    pub sign: Option<String>,
    pub result_code: Option<String>,
    pub err_code: Option<String>,
    pub err_code_des: Option<String>,
}

impl PapPayApplyResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        is_success(&self.return_code) && is_success_opt(self.result_code.as_deref())
    }
}

impl Signable for PapPayApplyResponse {
    fn signing_fields(&self) -> FieldSet<'_> {
        FieldSet::new()
            .with("return_code", &self.return_code)
            .with("return_msg", &self.return_msg)
            .with("mch_id", &self.mch_id)
            .with("appid", &self.appid)
            .with("nonce_str", &self.nonce_str)
            .with("result_code", &self.result_code)
            .with("err_code", &self.err_code)
            .with("err_code_des", &self.err_code_des)
    }

    fn signature(&self) -> Option<&str> {
        self.sign.as_deref()
    }
}

impl Reply for PapPayApplyResponse {
    const NAME: &'static str = "pap pay apply response";

    fn is_signed(&self) -> bool {
        is_success(&self.return_code)
    }
}

/// Result of a deduction, posted to the request's `notify_url`.
#[skip_serializing_none]
#[non_exhaustive]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PapPayNotification {
    pub return_code: String,
    pub return_msg: Option<String>,
    pub result_code: Option<String>,
    pub appid: Option<String>,
    pub mch_id: Option<String>,
    pub device_info: Option<String>,
    pub nonce_str: Option<String>,
    pub sign: Option<String>,
    pub err_code: Option<String>,
    pub err_code_des: Option<String>,
    pub openid: Option<String>,
    /// `Y` or `N`.
    pub is_subscribe: Option<String>,
    pub bank_type: Option<String>,
    pub total_fee: Option<u64>,
    pub fee_type: Option<String>,
    pub cash_fee: Option<u64>,
    pub cash_fee_type: Option<String>,
    /// `SUCCESS`, `REFUND`, `NOTPAY`, `CLOSED`, `ACCEPT`, `PAY_FAIL`, ...
    pub trade_state: Option<String>,
    pub transaction_id: Option<String>,
    pub out_trade_no: Option<String>,
    pub attach: Option<String>,
    /// `yyyyMMddHHmmss`.
    pub time_end: Option<String>,
    pub contract_id: Option<String>,
}

impl PapPayNotification {
    /// The deduction went through. Absent `trade_state` follows `result_code`.
    ///
    /// Always `false` for a notification whose status codes leave it unsigned,
    /// since nothing in it was authenticated.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        if !self.is_signed() {
            return false;
        }

        match self.trade_state.as_deref() {
            Some(state) => is_success(state),
            None => is_success_opt(self.result_code.as_deref()),
        }
    }
}

impl Signable for PapPayNotification {
    fn signing_fields(&self) -> FieldSet<'_> {
        FieldSet::new()
            .with("return_code", &self.return_code)
            .with("return_msg", &self.return_msg)
            .with("result_code", &self.result_code)
            .with("appid", &self.appid)
            .with("mch_id", &self.mch_id)
            .with("device_info", &self.device_info)
            .with("nonce_str", &self.nonce_str)
            .with("err_code", &self.err_code)
            .with("err_code_des", &self.err_code_des)
            .with("openid", &self.openid)
            .with("is_subscribe", &self.is_subscribe)
            .with("bank_type", &self.bank_type)
            .with("total_fee", self.total_fee)
            .with("fee_type", &self.fee_type)
            .with("cash_fee", self.cash_fee)
            .with("cash_fee_type", &self.cash_fee_type)
            .with("trade_state", &self.trade_state)
            .with("transaction_id", &self.transaction_id)
            .with("out_trade_no", &self.out_trade_no)
            .with("attach", &self.attach)
            .with("time_end", &self.time_end)
            .with("contract_id", &self.contract_id)
    }

    fn signature(&self) -> Option<&str> {
        self.sign.as_deref()
    }
}

impl Reply for PapPayNotification {
    const NAME: &'static str = "pap pay notification";

    fn is_signed(&self) -> bool {
        is_success(&self.return_code) && is_success_opt(self.result_code.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::sign::{sign, verify};

    fn request() -> PapPayApplyRequest {
        PapPayApplyRequest::builder()
            .nonce_str("5K8264ILTKCH16CQ2502SI8ZNMTM67VS")
            .body("water bill")
            .out_trade_no("1217752501201407033233368018")
            .total_fee(888)
            .spbill_create_ip("8.8.8.8")
            .notify_url("http://example.com/wxpay.html")
            .contract_id("Wx15463511252015071056489715")
            .build()
    }

    #[test]
    fn trade_type_is_fixed_to_pap() {
        let req = request();

        assert_eq!(req.trade_type, TradeType::Pap);
        let canonical = req
            .signing_fields()
            .canonical_string(&SecretString::from("k"));
        assert!(canonical.contains("&trade_type=PAP&"), "{canonical}");
    }

    #[test]
    fn zero_fee_is_left_out_of_signature() {
        let mut req = request();
        req.total_fee = 0;

        assert!(
            !req.signing_fields().signed_names().contains(&"total_fee"),
            "zero amounts are absent"
        );
    }

    #[test]
    fn request_signature_changes_with_amount() {
        let key = SecretString::from("k");
        let mut req = request();
        req.sign = sign(&req, &key);
        assert!(verify(&req, &key), "freshly signed request verifies");

        req.total_fee = 889;
        assert!(!verify(&req, &key), "tampered amount must not verify");
    }

    #[test]
    fn notification_payment_state() {
        let paid = PapPayNotification {
            return_code: "SUCCESS".to_owned(),
            result_code: Some("SUCCESS".to_owned()),
            ..PapPayNotification::default()
        };
        let failed = PapPayNotification {
            trade_state: Some("PAY_FAIL".to_owned()),
            ..paid.clone()
        };

        assert!(paid.is_paid(), "result SUCCESS without trade_state");
        assert!(!failed.is_paid(), "explicit failed trade_state");
        assert!(failed.is_signed(), "status gate depends on codes only");
    }

    #[test]
    fn unsigned_notification_is_never_paid() {
        let failed_result = PapPayNotification {
            return_code: "SUCCESS".to_owned(),
            result_code: Some("FAIL".to_owned()),
            trade_state: Some("SUCCESS".to_owned()),
            ..PapPayNotification::default()
        };
        let no_result = PapPayNotification {
            result_code: None,
            ..failed_result.clone()
        };

        assert!(!failed_result.is_paid(), "result FAIL leaves it unverified");
        assert!(!no_result.is_paid(), "missing result leaves it unverified");
    }
}
