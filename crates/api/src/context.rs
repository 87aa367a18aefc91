use siftledger_core::SellerId;

/// Seller context for a request.
///
/// Inserted by the auth middleware; every `/api` handler is scoped to it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SellerContext {
    seller_id: SellerId,
}

impl SellerContext {
    pub fn new(seller_id: SellerId) -> Self {
        Self { seller_id }
    }

    pub fn seller_id(&self) -> SellerId {
        self.seller_id
    }
}
