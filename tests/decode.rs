#![cfg(all(feature = "tracing", feature = "pap"))]

use wechatpay_pap_sdk::error::Kind;
use wechatpay_pap_sdk::pap::PapPayNotification;
use wechatpay_pap_sdk::xml;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("wechatpay_pap_sdk=trace")
        .with_test_writer()
        .try_init();
}

#[test]
fn unknown_tags_should_be_skipped() -> anyhow::Result<()> {
    init_tracing();

    let body = "<xml><return_code>SUCCESS</return_code><result_code>SUCCESS</result_code>\
                <total_fee>1</total_fee><coupon_fee>0</coupon_fee>\
                <promotion_detail>none</promotion_detail></xml>";
    let notification: PapPayNotification = xml::from_str(body)?;

    assert_eq!(notification.return_code, "SUCCESS");
    assert_eq!(notification.total_fee, Some(1));

    Ok(())
}

#[test]
fn bad_number_should_name_the_field() {
    init_tracing();

    let body = "<xml><return_code>SUCCESS</return_code><total_fee>ten</total_fee></xml>";
    let err = xml::from_str::<PapPayNotification>(body).expect_err("non-numeric fee must fail");

    assert_eq!(err.kind(), Kind::Encoding);
    assert!(err.to_string().contains("total_fee"), "{err}");
}
