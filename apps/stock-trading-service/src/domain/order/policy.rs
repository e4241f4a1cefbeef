//! Order evaluation policies.

use super::{Order, OrderSide, Verdict};

/// Failure while evaluating an order. Terminates the calling stream.
#[derive(Debug, Clone, thiserror::Error)]
#[error("order {order_id} could not be evaluated: {reason}")]
pub struct OrderPolicyError {
    /// Order that failed evaluation.
    pub order_id: String,
    /// Failure detail.
    pub reason: String,
}

/// Decides whether an order is accepted.
///
/// A policy must return exactly one verdict per order; returning an error
/// means the order cannot be evaluated at all.
pub trait OrderPolicy: Send + Sync {
    /// Evaluate one order.
    ///
    /// # Errors
    ///
    /// Returns `OrderPolicyError` if the order cannot be evaluated.
    fn evaluate(&self, order: &Order) -> Result<Verdict, OrderPolicyError>;

    /// Policy name for logs and health output.
    fn name(&self) -> &'static str;
}

/// Accepts every order as received.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllPolicy;

impl OrderPolicy for AcceptAllPolicy {
    fn evaluate(&self, _order: &Order) -> Result<Verdict, OrderPolicyError> {
        Ok(Verdict::Accepted)
    }

    fn name(&self) -> &'static str {
        "accept_all"
    }
}

/// Rejects orders with missing identity fields or non-sensical amounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatingPolicy;

impl ValidatingPolicy {
    fn rejection_reason(order: &Order) -> Option<&'static str> {
        if order.order_id.trim().is_empty() {
            return Some("order id must not be empty");
        }
        if order.symbol.trim().is_empty() {
            return Some("symbol must not be empty");
        }
        if order.side == OrderSide::Unspecified {
            return Some("side must be BUY or SELL");
        }
        if !order.price.is_finite() || order.price < 0.0 {
            return Some("price must be a non-negative number");
        }
        if order.quantity <= 0 {
            return Some("quantity must be positive");
        }
        None
    }
}

impl OrderPolicy for ValidatingPolicy {
    fn evaluate(&self, order: &Order) -> Result<Verdict, OrderPolicyError> {
        Ok(Self::rejection_reason(order).map_or(Verdict::Accepted, |reason| {
            Verdict::Rejected {
                reason: reason.to_string(),
            }
        }))
    }

    fn name(&self) -> &'static str {
        "validate"
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn valid_order() -> Order {
        Order {
            order_id: "1".to_string(),
            symbol: "AAPL".to_string(),
            side: OrderSide::Sell,
            price: 126.75,
            quantity: 18,
        }
    }

    #[test]
    fn accept_all_accepts_anything() {
        let mut order = valid_order();
        order.price = -5.0;
        order.side = OrderSide::Unspecified;

        assert_eq!(AcceptAllPolicy.evaluate(&order).unwrap(), Verdict::Accepted);
    }

    #[test]
    fn validating_accepts_well_formed_order() {
        assert_eq!(
            ValidatingPolicy.evaluate(&valid_order()).unwrap(),
            Verdict::Accepted
        );
    }

    #[test_case(|o: &mut Order| o.order_id.clear(), "order id must not be empty" ; "empty id")]
    #[test_case(|o: &mut Order| o.symbol = " ".to_string(), "symbol must not be empty" ; "blank symbol")]
    #[test_case(|o: &mut Order| o.side = OrderSide::Unspecified, "side must be BUY or SELL" ; "no side")]
    #[test_case(|o: &mut Order| o.price = -0.01, "price must be a non-negative number" ; "negative price")]
    #[test_case(|o: &mut Order| o.price = f64::NAN, "price must be a non-negative number" ; "nan price")]
    #[test_case(|o: &mut Order| o.quantity = 0, "quantity must be positive" ; "zero quantity")]
    #[test_case(|o: &mut Order| o.quantity = -4, "quantity must be positive" ; "negative quantity")]
    fn validating_rejects(mutate: fn(&mut Order), expected: &str) {
        let mut order = valid_order();
        mutate(&mut order);

        assert_eq!(
            ValidatingPolicy.evaluate(&order).unwrap(),
            Verdict::Rejected {
                reason: expected.to_string()
            }
        );
    }

    #[test]
    fn policy_names() {
        assert_eq!(AcceptAllPolicy.name(), "accept_all");
        assert_eq!(ValidatingPolicy.name(), "validate");
    }
}
