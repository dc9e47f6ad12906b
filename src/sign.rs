//! v2 MD5 signing scheme.
//!
//! Every message shape lists the fields it signs as a [`FieldSet`]. Only
//! present values (non-empty text, non-zero numbers) take part. The names are
//! sorted by byte value and joined as `name=value&...&key=<api key>`, and the
//! MD5 of that string, rendered as uppercase hex, is the signature.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use md5::{Digest as _, Md5};
use secrecy::{ExposeSecret as _, SecretString};

use crate::Result;
use crate::error::Error;

/// Name of the tag that carries the signature.
pub const SIGN_FIELD: &str = "sign";

/// A field value as it enters the canonical string.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value<'a> {
    Text(Cow<'a, str>),
    Number(u64),
    Absent,
}

impl Value<'_> {
    /// Empty text and zero are treated the same as a missing field.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Value::Text(text) => !text.is_empty(),
            Value::Number(number) => *number != 0,
            Value::Absent => false,
        }
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Value::Text(text) => out.push_str(text),
            Value::Number(number) => {
                let _: std::fmt::Result = write!(out, "{number}");
            }
            Value::Absent => {}
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Text(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(value: &'a String) -> Self {
        Value::Text(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Value::Text(Cow::Owned(value))
    }
}

impl<'a> From<&'a Option<String>> for Value<'a> {
    fn from(value: &'a Option<String>) -> Self {
        value.as_deref().map_or(Value::Absent, Value::from)
    }
}

impl From<u64> for Value<'_> {
    fn from(value: u64) -> Self {
        Value::Number(value)
    }
}

impl From<u32> for Value<'_> {
    fn from(value: u32) -> Self {
        Value::Number(u64::from(value))
    }
}

impl From<Option<u64>> for Value<'_> {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Value::Absent, Value::Number)
    }
}

impl From<Option<u32>> for Value<'_> {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Value::Absent, Value::from)
    }
}

/// The signing fields of one message, in declaration order.
///
/// Order of insertion does not matter; [`FieldSet::canonical_string`] sorts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSet<'a> {
    fields: Vec<(Cow<'a, str>, Value<'a>)>,
}

impl<'a> FieldSet<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<Cow<'a, str>>,
        V: Into<Value<'a>>,
    {
        self.push(name, value);
        self
    }

    pub fn push<N, V>(&mut self, name: N, value: V)
    where
        N: Into<Cow<'a, str>>,
        V: Into<Value<'a>>,
    {
        self.fields.push((name.into(), value.into()));
    }

    /// Names of the fields that take part in signing, in canonical order.
    #[must_use]
    pub fn signed_names(&self) -> Vec<&str> {
        self.present().into_iter().map(|(name, _)| name).collect()
    }

    fn present(&self) -> Vec<(&str, &Value<'a>)> {
        let mut present: Vec<_> = self
            .fields
            .iter()
            .filter(|(_, value)| value.is_present())
            .map(|(name, value)| (name.as_ref(), value))
            .collect();
        // `str` ordering is byte-wise, which is what the gateway expects.
        present.sort_by(|(a, _), (b, _)| a.cmp(b));
        present
    }

    /// `a=1&b=2&key=<secret>` over the present fields.
    ///
    /// Values go in verbatim, so a value holding `&` or `=` produces an
    /// ambiguous string. The gateway signs the same way.
    #[must_use]
    pub fn canonical_string(&self, key: &SecretString) -> String {
        let mut out = String::new();
        for (name, value) in self.present() {
            out.push_str(name);
            out.push('=');
            value.write_to(&mut out);
            out.push('&');
        }
        out.push_str("key=");
        out.push_str(key.expose_secret());
        out
    }

    /// Swaps text values for the text exactly as it arrived on the wire.
    ///
    /// Numbers keep their parsed value, so zero stays absent. Names outside
    /// this set are ignored.
    #[must_use]
    pub fn with_received_text(mut self, received: &'a BTreeMap<String, String>) -> Self {
        for (name, value) in &mut self.fields {
            if matches!(value, Value::Number(_)) {
                continue;
            }
            if let Some(text) = received.get(name.as_ref()) {
                *value = Value::Text(Cow::Borrowed(text.as_str()));
            }
        }
        self
    }

    #[must_use]
    pub fn digest(&self, key: &SecretString) -> String {
        hex::encode_upper(Md5::digest(self.canonical_string(key).as_bytes()))
    }
}

/// A message with a fixed table of signing fields.
pub trait Signable {
    /// Fields this message shape signs. Never includes the signature itself.
    fn signing_fields(&self) -> FieldSet<'_>;

    /// The signature carried by the message, if any.
    fn signature(&self) -> Option<&str>;
}

/// An inbound message whose signature is only meaningful on success.
///
/// The gateway does not sign failure replies, so those pass through
/// [`authenticate`] unchecked.
pub trait Reply: Signable {
    /// Human readable name of the shape, used in errors.
    const NAME: &'static str;

    /// Whether the status fields say this message was signed.
    fn is_signed(&self) -> bool;
}

/// Computes the signature of `message` with the merchant API key.
#[must_use]
pub fn sign<S: Signable + ?Sized>(message: &S, key: &SecretString) -> String {
    message.signing_fields().digest(key)
}

/// Returns `true` only when the embedded signature equals the recomputed one.
#[must_use]
pub fn verify<S: Signable + ?Sized>(message: &S, key: &SecretString) -> bool {
    message
        .signature()
        .is_some_and(|received| received == sign(message, key))
}

/// Checks the signature of a reply whose status says it is signed.
///
/// Replies that are not signed are accepted as they are.
pub fn authenticate<R: Reply>(reply: &R, key: &SecretString) -> Result<()> {
    authenticate_received(reply, &BTreeMap::new(), key)
}

/// Like [`authenticate`], with text values taken from `received`, the
/// tag/text pairs of the document as read off the wire (see
/// [`xml::text_fields`](crate::xml::text_fields)).
pub fn authenticate_received<R: Reply>(
    reply: &R,
    received: &BTreeMap<String, String>,
    key: &SecretString,
) -> Result<()> {
    if !reply.is_signed() {
        #[cfg(feature = "tracing")]
        tracing::debug!(shape = R::NAME, "reply not successful, signature check skipped");
        return Ok(());
    }

    let expected = reply.signing_fields().with_received_text(received).digest(key);
    match reply.signature() {
        Some(signature) if signature == expected => Ok(()),
        signature => {
            let signature = signature.unwrap_or_default();
            #[cfg(feature = "tracing")]
            tracing::warn!(shape = R::NAME, received = signature, "signature mismatch");
            Err(Error::signature_mismatch(R::NAME, signature))
        }
    }
}

/// Free-form records sign every entry except [`SIGN_FIELD`].
impl Signable for BTreeMap<String, String> {
    fn signing_fields(&self) -> FieldSet<'_> {
        self.iter()
            .filter(|(name, _)| name.as_str() != SIGN_FIELD)
            .fold(FieldSet::new(), |fields, (name, value)| {
                fields.with(name.as_str(), value)
            })
    }

    fn signature(&self) -> Option<&str> {
        self.get(SIGN_FIELD).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(secret: &str) -> SecretString {
        SecretString::from(secret)
    }

    fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn canonical_string_matches_reference_scenario() {
        let fields = FieldSet::new()
            .with("out_trade_no", "123456")
            .with("total_fee", 888_u64)
            .with("nonce_str", "ABC");

        assert_eq!(
            fields.canonical_string(&key("testkey")),
            "nonce_str=ABC&out_trade_no=123456&total_fee=888&key=testkey"
        );
        assert_eq!(
            fields.digest(&key("testkey")),
            "CBB171544225216629329D0925DB2B76"
        );
    }

    #[test]
    fn empty_and_zero_values_are_left_out() {
        let device_info: Option<String> = None;
        let fields = FieldSet::new()
            .with("attach", "")
            .with("body", "water")
            .with("plan_id", 0_u64)
            .with("device_info", &device_info)
            .with("request_serial", None::<u64>)
            .with("zeta", "z");

        assert_eq!(
            fields.canonical_string(&key("k")),
            "body=water&zeta=z&key=k"
        );
    }

    #[test]
    fn names_sort_by_byte_value() {
        let fields = FieldSet::new()
            .with("nonce_str", "n")
            .with("mch_id", "m")
            .with("appid", "a")
            .with("Zulu", "upper case sorts first");

        assert_eq!(
            fields.signed_names(),
            vec!["Zulu", "appid", "mch_id", "nonce_str"]
        );
    }

    #[test]
    fn no_present_fields_still_appends_key() {
        let fields = FieldSet::new().with("a", "");

        assert_eq!(fields.canonical_string(&key("secret")), "key=secret");
    }

    #[test]
    fn digest_is_uppercase_hex_of_fixed_length() {
        let digest = FieldSet::new().with("a", "1").digest(&key("k"));

        assert_eq!(digest.len(), 32);
        assert!(
            digest
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()),
            "digest should be uppercase hex: {digest}"
        );
    }

    #[test]
    fn record_round_trips_through_verify() {
        let api_key = key("192006250b4c09247ec02edce69f6a2d");
        let mut rec = record(&[
            ("appid", "wxd930ea5d5a258f4f"),
            ("mch_id", "10000100"),
            ("device_info", "1000"),
            ("body", "test"),
            ("nonce_str", "ibuaiVcKdpRxkhJA"),
        ]);
        let signature = sign(&rec, &api_key);
        rec.insert(SIGN_FIELD.to_owned(), signature);

        assert!(verify(&rec, &api_key), "signed record should verify");
        assert!(!verify(&rec, &key("other")), "wrong key must not verify");
    }

    #[test]
    fn signature_is_case_sensitive() {
        let api_key = key("k");
        let mut rec = record(&[("a", "1")]);
        let signature = sign(&rec, &api_key).to_lowercase();
        rec.insert(SIGN_FIELD.to_owned(), signature);

        assert!(!verify(&rec, &api_key), "lowercase digest must be rejected");
    }

    #[test]
    fn record_without_signature_does_not_verify() {
        let rec = record(&[("a", "1")]);

        assert!(!verify(&rec, &key("k")), "missing signature must not verify");
    }

    #[test]
    fn changing_any_field_changes_the_digest() {
        let api_key = key("k");
        let base = record(&[
            ("appid", "wx1"),
            ("mch_id", "100"),
            ("nonce_str", "abc"),
            ("total_fee", "1"),
        ]);
        let mut seen = std::collections::HashSet::new();
        seen.insert(sign(&base, &api_key));

        for name in base.keys() {
            let mut changed = base.clone();
            changed.insert(name.clone(), format!("{}x", base[name]));
            assert!(
                seen.insert(sign(&changed, &api_key)),
                "changing {name} should produce a fresh digest"
            );
        }
    }

    #[test]
    fn received_text_replaces_parsed_text_but_not_numbers() {
        let received = record(&[("attach", " padded "), ("total_fee", "0888")]);
        let attach = Some("padded".to_owned());
        let fields = FieldSet::new()
            .with("attach", &attach)
            .with("total_fee", 888_u64)
            .with("zeta", "z")
            .with_received_text(&received);

        assert_eq!(
            fields.canonical_string(&key("k")),
            "attach= padded &total_fee=888&zeta=z&key=k"
        );
    }

    #[test]
    fn empty_entries_in_record_do_not_change_the_digest() {
        let api_key = key("k");
        let lean = record(&[("a", "1"), ("c", "3")]);
        let padded = record(&[("a", "1"), ("b", ""), ("c", "3")]);

        assert_eq!(sign(&lean, &api_key), sign(&padded, &api_key));
    }
}
