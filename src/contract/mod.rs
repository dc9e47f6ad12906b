//! Sign a deduction contract while paying (`/pay/contractorder`), and the
//! notification the gateway sends when a contract is signed or terminated.

mod types;

pub use types::{ContractNotification, ContractOrderRequest, ContractOrderResponse};

/// Path of the contract order endpoint relative to the merchant API host.
pub const CONTRACT_ORDER_PATH: &str = "pay/contractorder";
