//! # Example: user_cart
//!
//! One consumer folds two shared topics (`user`, `cart`) into a single state.
//!
//! Demonstrates how to:
//! - Publish values on named topics before anyone listens.
//! - Declare mappers per topic and subscribe once.
//! - Consume merged state through the `watch` receiver on a tokio task.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► publish("user", alice), publish("cart", [])
//!   ├─► Subscriber::subscribe(user → map_user, cart → map_cart)
//!   ├─► spawn consumer: rx.changed().await → print state
//!   └─► publish("cart", [...]) a few times
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example user_cart
//! ```

use std::time::Duration;

use databus::{Mappers, Registry, State, Subscriber};

#[derive(Clone, Debug, PartialEq)]
enum Value {
    User(String),
    Cart(Vec<String>),
}

fn map_user(v: Option<&Value>, _topic: &str) -> State<String> {
    match v {
        Some(Value::User(name)) => State::new()
            .with("user", name.clone())
            .with("logged_in", "yes".to_string()),
        _ => State::new().with("logged_in", "no".to_string()),
    }
}

fn map_cart(v: Option<&Value>, _topic: &str) -> State<String> {
    match v {
        Some(Value::Cart(items)) => State::new()
            .with("cart_size", items.len().to_string())
            .with("cart", items.join(", ")),
        _ => State::new().with("cart_size", "0".to_string()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = Registry::<Value>::new();
    registry.publish("user", Value::User("alice".into()))?;
    registry.publish("cart", Value::Cart(Vec::new()))?;

    let sub = Subscriber::subscribe(
        &registry,
        Mappers::new().map("user", map_user).map("cart", map_cart),
    )?;
    println!("initial: {:?}", sub.state());

    let mut rx = sub.watch();
    let consumer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            println!("update:  {state:?}");
        }
    });

    let mut items = Vec::new();
    for item in ["apple", "pear", "plum"] {
        items.push(item.to_string());
        registry.publish("cart", Value::Cart(items.clone()))?;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // Dropping the subscriber removes its listeners and closes the watch channel.
    drop(sub);
    consumer.await?;
    println!("listeners left on cart: {}", registry.listener_count("cart"));
    Ok(())
}
