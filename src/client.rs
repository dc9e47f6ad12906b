use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as ReqwestClient, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

#[cfg(feature = "contract")]
use crate::contract::{
    CONTRACT_ORDER_PATH, ContractNotification, ContractOrderRequest, ContractOrderResponse,
};
#[cfg(feature = "pap")]
use crate::pap::{PAP_PAY_APPLY_PATH, PapPayApplyRequest, PapPayApplyResponse, PapPayNotification};
use crate::Result;
use crate::config::MerchantConfig;
use crate::sign::{self, Reply};
use crate::types::{NotifyAck, generate_nonce};
use crate::xml;

const APPLICATION_XML: &str = "application/xml";

/// Merchant client for the v2 XML endpoints.
///
/// Every call signs the request, posts it once and authenticates the reply
/// before handing it back. Nothing is retried.
#[derive(Clone, Debug)]
pub struct Client {
    config: MerchantConfig,
    client: ReqwestClient,
}

impl Client {
    /// Creates a client with its own HTTP client, honouring `config.timeout`.
    pub fn new(config: MerchantConfig) -> Result<Self> {
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_http_client(config, builder.build()?))
    }

    /// Creates a client on top of a caller-configured HTTP client.
    #[must_use]
    pub fn with_http_client(config: MerchantConfig, client: ReqwestClient) -> Self {
        Self { config, client }
    }

    #[must_use]
    pub fn config(&self) -> &MerchantConfig {
        &self.config
    }

    /// Places an order and pre-signs the contract described in `request`.
    ///
    /// The returned response has been authenticated when its `return_code`
    /// is `SUCCESS`; failure replies are unsigned and returned as received.
    #[cfg(feature = "contract")]
    pub async fn contract_order(
        &self,
        mut request: ContractOrderRequest,
    ) -> Result<ContractOrderResponse> {
        request.appid.clone_from(&self.config.app_id);
        request.mch_id.clone_from(&self.config.mch_id);
        request.contract_appid.clone_from(&self.config.app_id);
        request.contract_mchid.clone_from(&self.config.mch_id);
        if request.nonce_str.is_empty() {
            request.nonce_str = generate_nonce();
        }
        request.sign = sign::sign(&request, &self.config.api_key);

        self.post(CONTRACT_ORDER_PATH, &request).await
    }

    /// Decodes and authenticates a contract signing/termination notification.
    ///
    /// The acknowledgement is always `SUCCESS`/`OK`, whatever the notification
    /// says; what to do with it is up to the caller.
    #[cfg(feature = "contract")]
    pub fn handle_contract_notification(
        &self,
        body: &[u8],
    ) -> Result<(ContractNotification, NotifyAck)> {
        self.receive(body)
    }

    /// Requests a deduction against an existing contract.
    #[cfg(feature = "pap")]
    pub async fn pap_pay_apply(
        &self,
        mut request: PapPayApplyRequest,
    ) -> Result<PapPayApplyResponse> {
        request.appid.clone_from(&self.config.app_id);
        request.mch_id.clone_from(&self.config.mch_id);
        request.trade_type = crate::types::TradeType::Pap;
        if request.nonce_str.is_empty() {
            request.nonce_str = generate_nonce();
        }
        request.sign = sign::sign(&request, &self.config.api_key);

        self.post(PAP_PAY_APPLY_PATH, &request).await
    }

    /// Decodes and authenticates a deduction result notification.
    #[cfg(feature = "pap")]
    pub fn handle_pap_notification(&self, body: &[u8]) -> Result<(PapPayNotification, NotifyAck)> {
        self.receive(body)
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned + Reply,
    {
        let request = self
            .client
            .request(Method::POST, self.endpoint(path)?)
            .header(CONTENT_TYPE, APPLICATION_XML)
            .body(xml::to_string(body)?)
            .build()?;

        let body = crate::request(&self.client, request).await?;
        self.accept(&body)
    }

    fn receive<N: DeserializeOwned + Reply>(&self, body: &[u8]) -> Result<(N, NotifyAck)> {
        let notification: N = self.accept(body)?;

        #[cfg(feature = "tracing")]
        tracing::info!(shape = N::NAME, "notification accepted");

        Ok((notification, NotifyAck::received()))
    }

    /// Decodes a gateway document and checks its signature against the text
    /// as it was sent.
    fn accept<R: DeserializeOwned + Reply>(&self, body: &[u8]) -> Result<R> {
        let body = std::str::from_utf8(body)?;
        let reply: R = xml::from_str(body)?;
        let received = xml::text_fields(body)?;
        sign::authenticate_received(&reply, &received, &self.config.api_key)?;

        Ok(reply)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.config.host.join(path)?)
    }
}
