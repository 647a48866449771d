//! # Example: teardown
//!
//! Binds a subscriber's lifetime to a cancellation token and watches the
//! registry's lifecycle events while it is set up and torn down.
//!
//! Demonstrates how to:
//! - Attach a custom observer through `Registry::builder`.
//! - Run `teardown_on(token)` on a background task.
//! - Verify that publishes after teardown no longer reach the subscriber.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Registry::builder(cfg).with_observers([Printer]).build()
//!   ├─► Subscriber::subscribe(ticks → count)
//!   ├─► spawn sub.teardown_on(token)
//!   ├─► publish("ticks", 1..=3)
//!   ├─► token.cancel()      → ListenerRemoved, SubscriptionClosed
//!   └─► publish("ticks", 4) → no listener, state unchanged
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example teardown
//! ```

use std::sync::Arc;

use databus::{Config, Event, Mappers, Observe, Registry, State, Subscriber};
use tokio_util::sync::CancellationToken;

struct Printer;

impl Observe for Printer {
    fn on_event(&self, event: &Event) {
        println!(
            "[{:>3}] {:?} topic={:?} listener={:?}",
            event.seq,
            event.kind,
            event.topic.as_deref(),
            event.listener.as_ref().map(|id| id.as_str()),
        );
    }

    fn name(&self) -> &'static str {
        "printer"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = Registry::<u64>::builder(Config::default())
        .with_observers(vec![Arc::new(Printer) as Arc<dyn Observe>])
        .build();

    let sub = Arc::new(Subscriber::subscribe(
        &registry,
        Mappers::new().map("ticks", |v: Option<&u64>, _topic: &str| {
            State::new().with("count", v.copied().unwrap_or(0))
        }),
    )?);

    let token = CancellationToken::new();
    let waiter = {
        let sub = Arc::clone(&sub);
        let token = token.clone();
        tokio::spawn(async move { sub.teardown_on(token).await })
    };

    for tick in 1..=3 {
        registry.publish("ticks", tick)?;
    }
    println!("before teardown: {:?}", sub.state());

    token.cancel();
    waiter.await?;

    registry.publish("ticks", 4)?;
    println!("after teardown:  {:?} (active={})", sub.state(), sub.is_active());
    Ok(())
}
