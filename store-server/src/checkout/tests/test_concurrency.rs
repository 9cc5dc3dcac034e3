//! Competing checkouts against the same stock

use super::*;
use crate::checkout::error::CheckoutError;
use crate::checkout::fulfillment::Actor;
use shared::{OrderStatus, Role};

#[test]
fn test_last_unit_sells_exactly_once() {
    let env = test_env();
    seed_product(&env.storage, "scarce", "99.00", 1);

    env.carts.add_item("c-1", "scarce", 1).unwrap();
    env.carts.add_item("c-2", "scarce", 1).unwrap();

    let handles: Vec<_> = ["c-1", "c-2"]
        .into_iter()
        .map(|client| {
            let checkout = env.checkout.clone();
            std::thread::spawn(move || checkout.create_order(client))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let won = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(won, 1, "exactly one checkout gets the last unit");
    assert!(results.iter().any(|r| matches!(
        r,
        Err(CheckoutError::InsufficientStock { available: 0, .. })
    )));

    let product = env.storage.get_product("scarce").unwrap().unwrap();
    assert_eq!(product.stock, 0);
}

#[test]
fn test_many_competing_checkouts_never_oversell() {
    let env = test_env();
    seed_product(&env.storage, "hot", "5.00", 7);

    let clients: Vec<String> = (0..12).map(|i| format!("client-{i}")).collect();
    for client in &clients {
        env.carts.add_item(client, "hot", 1).unwrap();
    }

    let handles: Vec<_> = clients
        .iter()
        .cloned()
        .map(|client| {
            let checkout = env.checkout.clone();
            std::thread::spawn(move || checkout.create_order(&client))
        })
        .collect();

    let won = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(Result::is_ok)
        .count();

    assert_eq!(won, 7);
    assert_eq!(env.storage.get_product("hot").unwrap().unwrap().stock, 0);
}

#[test]
fn test_simultaneous_ship_calls_yield_one_success() {
    let env = test_env();
    let order = place_order(&env, "c-1");

    let txn = env.storage.begin_write().unwrap();
    let mut paid = env.storage.get_order_txn(&txn, &order.id).unwrap().unwrap();
    paid.status = OrderStatus::Processing;
    env.storage.put_order_txn(&txn, &paid).unwrap();
    txn.commit().unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let fulfillment = env.fulfillment.clone();
            let order_id = order.id.clone();
            std::thread::spawn(move || {
                let staff = Actor::Staff {
                    id: "s-1".to_string(),
                    role: Role::Seller,
                };
                fulfillment.advance_status(&order_id, &staff, OrderStatus::Shipped)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(CheckoutError::InvalidTransition(_))))
    );
    assert_eq!(
        env.storage.get_order(&order.id).unwrap().unwrap().status,
        OrderStatus::Shipped
    );
}
