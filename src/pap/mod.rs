//! Deductions against a signed contract (`/pay/pappayapply`) and the payment
//! result notification that follows them.

mod types;

pub use types::{PapPayApplyRequest, PapPayApplyResponse, PapPayNotification};

/// Path of the PAP pay apply endpoint relative to the merchant API host.
pub const PAP_PAY_APPLY_PATH: &str = "pay/pappayapply";
