//! Bounded pool of registry clients
//!
//! Clients are created lazily up to `max_size`. Once that many exist,
//! `checkout` waits until another task checks one back in. The idle list
//! and the created count live under one mutex; waiters are woken through
//! a [`Notify`] and re-check at least every [`POLL_INTERVAL`].

use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

/// Upper bound on how long a waiter sleeps without re-checking the pool
const POLL_INTERVAL: Duration = Duration::from_millis(20);

struct PoolState<T> {
    idle: Vec<T>,
    created: usize,
}

/// A lazily filled pool holding at most `max_size` clients
pub struct ClientPool<T> {
    state: Mutex<PoolState<T>>,
    available: Notify,
    max_size: usize,
    create: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: Send> ClientPool<T> {
    /// Create an empty pool; `create` builds a new client on demand
    pub fn new(max_size: usize, create: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                created: 0,
            }),
            available: Notify::new(),
            max_size: max_size.max(1),
            create: Box::new(create),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a client, creating one if the pool is below capacity
    pub async fn checkout(&self) -> T {
        loop {
            {
                let mut state = self.lock();
                if let Some(client) = state.idle.pop() {
                    return client;
                }
                if state.created < self.max_size {
                    state.created += 1;
                    drop(state);
                    return (self.create)();
                }
            }

            // notify_one stores a permit when nobody is waiting yet, so a
            // checkin between the unlock above and this await is not lost
            let _ = tokio::time::timeout(POLL_INTERVAL, self.available.notified()).await;
        }
    }

    /// Return a client to the pool and wake one waiter
    pub fn checkin(&self, client: T) {
        self.lock().idle.push(client);
        self.available.notify_one();
    }

    /// Checkout wrapped in a guard that checks the client back in on drop
    pub async fn get(&self) -> PooledClient<'_, T> {
        let client = self.checkout().await;
        PooledClient {
            pool: self,
            client: Some(client),
        }
    }

    /// Number of clients created so far
    pub fn created(&self) -> usize {
        self.lock().created
    }

    /// Number of clients currently sitting idle in the pool
    pub fn idle(&self) -> usize {
        self.lock().idle.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// A checked-out client; returned to its pool when dropped
pub struct PooledClient<'a, T: Send> {
    pool: &'a ClientPool<T>,
    client: Option<T>,
}

impl<T: Send> Deref for PooledClient<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only taken in drop
        self.client.as_ref().unwrap()
    }
}

impl<T: Send> Drop for PooledClient<'_, T> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.checkin(client);
        }
    }
}
