//! Stored-card and cash-on-delivery flows

use super::*;
use crate::checkout::error::CheckoutError;
use crate::checkout::fulfillment::Actor;
use shared::{OrderStatus, PaymentMethod, PaymentStatus, Role};

#[tokio::test]
async fn test_stored_card_approved() {
    let env = test_env();
    let order = place_order(&env, "c-1");

    let handle = env
        .coordinator
        .initiate_payment("c-1", &order.id, PaymentMethod::StoredCard, Some("tok-1"))
        .await
        .unwrap();
    assert_eq!(handle.status, PaymentStatus::Paid);

    let order = env.storage.get_order(&order.id).unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert!(env.storage.get_cart("c-1").unwrap().unwrap().is_empty());

    let payment = env.storage.get_payment_by_order(&order.id).unwrap().unwrap();
    assert!(payment.external_reference.is_some());
}

#[tokio::test]
async fn test_card_decline_leaves_order_payable() {
    let env = test_env();
    let order = place_order(&env, "c-1");

    env.vault
        .set_behavior(VaultBehavior::Decline("insufficient funds".to_string()));
    let err = env
        .coordinator
        .initiate_payment("c-1", &order.id, PaymentMethod::StoredCard, Some("tok-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::CardDeclined(_)));

    // failed record kept for the audit trail, order still payable,
    // cart intact for another attempt
    let order = env.storage.get_order(&order.id).unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::PendingPayment);
    let payment = env.storage.get_payment_by_order(&order.id).unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert!(!env.storage.get_cart("c-1").unwrap().unwrap().is_empty());

    // retry with a working card succeeds with a fresh payment record
    env.vault.set_behavior(VaultBehavior::Approve);
    let retry = env
        .coordinator
        .initiate_payment("c-1", &order.id, PaymentMethod::StoredCard, Some("tok-2"))
        .await
        .unwrap();
    assert_eq!(retry.status, PaymentStatus::Paid);
    assert_ne!(retry.payment_id, payment.id);
}

#[tokio::test]
async fn test_vault_outage_records_nothing() {
    let env = test_env();
    let order = place_order(&env, "c-1");

    env.vault.set_behavior(VaultBehavior::Unavailable);
    let err = env
        .coordinator
        .initiate_payment("c-1", &order.id, PaymentMethod::StoredCard, Some("tok-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::GatewayUnavailable(_)));

    // fail closed: no payment record either way
    assert!(env.storage.get_payment_by_order(&order.id).unwrap().is_none());
    assert_eq!(
        env.storage.get_order(&order.id).unwrap().unwrap().status,
        OrderStatus::PendingPayment
    );
}

#[tokio::test]
async fn test_missing_card_token_rejected() {
    let env = test_env();
    let order = place_order(&env, "c-1");
    let err = env
        .coordinator
        .initiate_payment("c-1", &order.id, PaymentMethod::StoredCard, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::CardDeclined(_)));
}

#[tokio::test]
async fn test_cash_on_delivery_settles_at_the_door() {
    let env = test_env();
    let order = place_order(&env, "c-1");

    let handle = env
        .coordinator
        .initiate_payment("c-1", &order.id, PaymentMethod::CashOnDelivery, None)
        .await
        .unwrap();
    assert_eq!(handle.status, PaymentStatus::Pending);
    assert!(handle.redirect_url.is_none());

    // order moves to processing with nothing captured
    let order = env.storage.get_order(&order.id).unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert!(env.storage.get_cart("c-1").unwrap().unwrap().is_empty());
    assert!(env.storage.list_pending().unwrap().is_empty());

    // ship and deliver; delivery confirms the payment
    let staff = Actor::Staff {
        id: "s-1".to_string(),
        role: Role::Seller,
    };
    env.fulfillment
        .advance_status(&order.id, &staff, OrderStatus::Shipped)
        .unwrap();
    env.fulfillment
        .advance_status(&order.id, &staff, OrderStatus::Delivered)
        .unwrap();

    let payment = env.storage.get_payment_by_order(&order.id).unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_payment_keeps_lines_added_after_checkout() {
    let env = test_env();
    let order = place_order(&env, "c-1");

    // client keeps shopping while the order awaits payment
    env.carts.add_item("c-1", "p-2", 2).unwrap();

    env.coordinator
        .initiate_payment("c-1", &order.id, PaymentMethod::StoredCard, Some("tok-1"))
        .await
        .unwrap();

    // only the purchased quantities left the cart
    let view = env.carts.view("c-1").unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].product_id, "p-2");
    assert_eq!(view.items[0].quantity, 2);
}

#[tokio::test]
async fn test_paid_order_rejects_further_initiates() {
    let env = test_env();
    let order = place_order(&env, "c-1");
    env.coordinator
        .initiate_payment("c-1", &order.id, PaymentMethod::StoredCard, Some("tok-1"))
        .await
        .unwrap();

    let err = env
        .coordinator
        .initiate_payment("c-1", &order.id, PaymentMethod::Gateway, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::OrderNotPayable(_)));
}
