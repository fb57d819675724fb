//! # First-completion race with a deadline.
//!
//! ```text
//! first_of(client, ready, deadline)
//!   ├─ client completes first (or together with ready) → First::Client
//!   ├─ ready completes first                           → First::Ready
//!   └─ deadline passes before either                   → First::Elapsed
//! ```
//!
//! The client future is polled first on every wake-up, so a client that ends in
//! the same instant its readiness fires is reported as ended. Neither future is
//! cancelled here; callers pass `&mut` handles and decide what to do with the
//! loser.

use std::{future::Future, time::Duration};

use tokio::time;

/// Which side of the race finished.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum First<C, R> {
    Client(C),
    Ready(R),
    Elapsed,
}

pub(crate) async fn first_of<C, R>(
    client: C,
    ready: R,
    deadline: Duration,
) -> First<C::Output, R::Output>
where
    C: Future,
    R: Future,
{
    let race = async {
        tokio::select! {
            biased;
            out = client => First::Client(out),
            out = ready => First::Ready(out),
        }
    };
    time::timeout(deadline, race).await.unwrap_or(First::Elapsed)
}
