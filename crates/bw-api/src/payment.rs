use std::collections::HashMap;

use url::Url;

use crate::errors::{ApiError, Result};

/// Response code the gateway sends for a successful payment
pub const GATEWAY_SUCCESS_CODE: &str = "00";

/// Parsed result of the gateway's completion redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub order_id: u64,
    /// Unix timestamp baked into the transaction reference at checkout
    pub initiated_at: i64,
    pub response_code: String,
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        self.response_code == GATEWAY_SUCCESS_CODE
    }

    /// Explanatory message for the shopper; payment callbacks never redirect
    /// silently
    pub fn describe(&self) -> String {
        if self.is_success() {
            format!("Thanh toán thành công cho đơn hàng #{}", self.order_id)
        } else {
            format!(
                "Thanh toán thất bại cho đơn hàng #{} (mã {})",
                self.order_id, self.response_code
            )
        }
    }
}

/// Parse the gateway's completion redirect URL
///
/// The contract is `vnp_TxnRef={orderId}-{timestamp}` plus
/// `vnp_ResponseCode`; anything else is a malformed callback.
pub fn parse_return_url(return_url: &str) -> Result<PaymentOutcome> {
    let url = Url::parse(return_url)?;
    let params: HashMap<_, _> = url.query_pairs().collect();

    let txn_ref = params
        .get("vnp_TxnRef")
        .ok_or(ApiError::MissingPaymentParam("vnp_TxnRef"))?;
    let response_code = params
        .get("vnp_ResponseCode")
        .ok_or(ApiError::MissingPaymentParam("vnp_ResponseCode"))?;

    let (order_id, initiated_at) = split_txn_ref(txn_ref)?;

    Ok(PaymentOutcome {
        order_id,
        initiated_at,
        response_code: response_code.to_string(),
    })
}

/// Split `{orderId}-{timestamp}` into its parts
fn split_txn_ref(txn_ref: &str) -> Result<(u64, i64)> {
    let malformed = || ApiError::InvalidPaymentReference(txn_ref.to_string());

    let (order_id, timestamp) = txn_ref.split_once('-').ok_or_else(malformed)?;
    let order_id = order_id.parse().map_err(|_| malformed())?;
    let timestamp = timestamp.parse().map_err(|_| malformed())?;

    Ok((order_id, timestamp))
}
