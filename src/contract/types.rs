use bon::Builder;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as, skip_serializing_none};

use crate::sign::{FieldSet, Reply, Signable};
use crate::types::{ChangeType, TradeType, is_success, is_success_opt};

const OPERATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Place an order and sign a deduction contract in the same payment.
///
/// `appid`, `mch_id`, `contract_appid`, `contract_mchid` and `sign` are
/// filled in by [`Client::contract_order`](crate::Client::contract_order);
/// `nonce_str` is generated when left empty.
#[serde_as]
#[skip_serializing_none]
#[non_exhaustive]
#[derive(Clone, Debug, Serialize, Builder)]
#[builder(on(String, into))]
pub struct ContractOrderRequest {
    #[builder(default)]
    pub appid: String,
    #[builder(default)]
    pub mch_id: String,
    #[builder(default)]
    pub contract_mchid: String,
    #[builder(default)]
    pub contract_appid: String,
    pub out_trade_no: String,
    pub device_info: Option<String>,
    #[builder(default)]
    pub nonce_str: String,
    pub body: String,
    pub detail: Option<String>,
    pub attach: Option<String>,
    pub notify_url: String,
    /// Amount in fen.
    pub total_fee: u64,
    pub spbill_create_ip: String,
    /// `yyyyMMddHHmmss`.
    pub time_start: Option<String>,
    /// `yyyyMMddHHmmss`.
    pub time_expire: Option<String>,
    pub goods_tag: Option<String>,
    #[serde_as(as = "DisplayFromStr")]
    pub trade_type: TradeType,
    /// Required for `NATIVE`.
    pub product_id: Option<String>,
    /// Required for `JSAPI`.
    pub openid: Option<String>,
    /// Contract template id.
    pub plan_id: u64,
    /// Merchant side contract number.
    pub contract_code: String,
    pub request_serial: u64,
    pub contract_display_account: String,
    pub contract_notify_url: String,
    #[builder(skip)]
    pub sign: String,
}

impl Signable for ContractOrderRequest {
    fn signing_fields(&self) -> FieldSet<'_> {
        FieldSet::new()
            .with("appid", &self.appid)
            .with("mch_id", &self.mch_id)
            .with("contract_mchid", &self.contract_mchid)
            .with("contract_appid", &self.contract_appid)
            .with("out_trade_no", &self.out_trade_no)
            .with("device_info", &self.device_info)
            .with("nonce_str", &self.nonce_str)
            .with("body", &self.body)
            .with("detail", &self.detail)
            .with("attach", &self.attach)
            .with("notify_url", &self.notify_url)
            .with("total_fee", self.total_fee)
            .with("spbill_create_ip", &self.spbill_create_ip)
            .with("time_start", &self.time_start)
            .with("time_expire", &self.time_expire)
            .with("goods_tag", &self.goods_tag)
            .with("trade_type", self.trade_type.as_str())
            .with("product_id", &self.product_id)
            .with("openid", &self.openid)
            .with("plan_id", self.plan_id)
            .with("contract_code", &self.contract_code)
            .with("request_serial", self.request_serial)
            .with("contract_display_account", &self.contract_display_account)
            .with("contract_notify_url", &self.contract_notify_url)
    }

    fn signature(&self) -> Option<&str> {
        Some(self.sign.as_str()).filter(|sign| !sign.is_empty())
    }
}

#[skip_serializing_none]
#[non_exhaustive]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractOrderResponse {
    pub return_code: String,
    pub return_msg: Option<String>,
    pub result_code: Option<String>,
    pub appid: Option<String>,
    pub mch_id: Option<String>,
    pub nonce_str: Option<String>,
    pub sign: Option<String>,
    pub err_code: Option<String>,
    pub err_code_des: Option<String>,
    /// Outcome of the pre-signing step, independent of the payment result.
    pub contract_result_code: Option<String>,
    pub contract_err_code: Option<String>,
    pub contract_err_code_des: Option<String>,
    pub prepay_id: Option<String>,
    pub trade_type: Option<String>,
    pub code_url: Option<String>,
    pub plan_id: Option<u64>,
    pub request_serial: Option<u64>,
    pub contract_code: Option<String>,
    pub contract_display_account: Option<String>,
    pub mweb_url: Option<String>,
    pub out_trade_no: Option<String>,
}

impl ContractOrderResponse {
    /// Both the transport and the business result report success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        is_success(&self.return_code) && is_success_opt(self.result_code.as_deref())
    }

    #[must_use]
    pub fn contract_accepted(&self) -> bool {
        is_success_opt(self.contract_result_code.as_deref())
    }
}

impl Signable for ContractOrderResponse {
    fn signing_fields(&self) -> FieldSet<'_> {
        FieldSet::new()
            .with("return_code", &self.return_code)
            .with("return_msg", &self.return_msg)
            .with("result_code", &self.result_code)
            .with("appid", &self.appid)
            .with("mch_id", &self.mch_id)
            .with("nonce_str", &self.nonce_str)
            .with("err_code", &self.err_code)
            .with("err_code_des", &self.err_code_des)
            .with("contract_result_code", &self.contract_result_code)
            .with("contract_err_code", &self.contract_err_code)
            .with("contract_err_code_des", &self.contract_err_code_des)
            .with("prepay_id", &self.prepay_id)
            .with("trade_type", &self.trade_type)
            .with("code_url", &self.code_url)
            .with("plan_id", self.plan_id)
            .with("request_serial", self.request_serial)
            .with("contract_code", &self.contract_code)
            .with("contract_display_account", &self.contract_display_account)
            .with("mweb_url", &self.mweb_url)
            .with("out_trade_no", &self.out_trade_no)
    }

    fn signature(&self) -> Option<&str> {
        self.sign.as_deref()
    }
}

impl Reply for ContractOrderResponse {
    const NAME: &'static str = "contract order response";

    fn is_signed(&self) -> bool {
        is_success(&self.return_code)
    }
}

/// Asynchronous notice that a contract was signed or terminated.
#[skip_serializing_none]
#[non_exhaustive]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractNotification {
    pub return_code: String,
    pub return_msg: Option<String>,
    pub result_code: Option<String>,
    pub mch_id: Option<String>,
    pub contract_code: Option<String>,
    pub plan_id: Option<String>,
    pub openid: Option<String>,
    pub sign: Option<String>,
    /// `ADD` or `DELETE`; see [`ContractNotification::change`].
    pub change_type: Option<String>,
    /// `yyyy-MM-dd HH:mm:ss`.
    pub operate_time: Option<String>,
    pub contract_id: Option<String>,
    pub contract_expired_time: Option<String>,
    pub contract_termination_mode: Option<u32>,
    pub request_serial: Option<u64>,
}

impl ContractNotification {
    /// Parsed `change_type`, `None` when absent or not a known value.
    #[must_use]
    pub fn change(&self) -> Option<ChangeType> {
        self.change_type.as_deref()?.parse().ok()
    }

    #[must_use]
    pub fn operated_at(&self) -> Option<NaiveDateTime> {
        let raw = self.operate_time.as_deref()?;
        NaiveDateTime::parse_from_str(raw, OPERATE_TIME_FORMAT).ok()
    }
}

impl Signable for ContractNotification {
    fn signing_fields(&self) -> FieldSet<'_> {
        FieldSet::new()
            .with("return_code", &self.return_code)
            .with("return_msg", &self.return_msg)
            .with("result_code", &self.result_code)
            .with("mch_id", &self.mch_id)
            .with("contract_code", &self.contract_code)
            .with("plan_id", &self.plan_id)
            .with("openid", &self.openid)
            .with("change_type", &self.change_type)
            .with("operate_time", &self.operate_time)
            .with("contract_id", &self.contract_id)
            .with("contract_expired_time", &self.contract_expired_time)
            .with("contract_termination_mode", self.contract_termination_mode)
            .with("request_serial", self.request_serial)
    }

    fn signature(&self) -> Option<&str> {
        self.sign.as_deref()
    }
}

impl Reply for ContractNotification {
    const NAME: &'static str = "contract notification";

    fn is_signed(&self) -> bool {
        is_success(&self.return_code) && is_success_opt(self.result_code.as_deref())
    }
}
