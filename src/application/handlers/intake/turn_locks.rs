//! Per-user turn serialization.
//!
//! Two messages from the same user are handled one after the other inside
//! this process. Versioned session writes cover the multi-process case.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::UserKey;

/// Registry of per-user async mutexes.
///
/// Entries are held weakly and pruned once no turn uses them.
#[derive(Debug, Default)]
pub struct TurnLocks {
    locks: Mutex<HashMap<UserKey, Weak<AsyncMutex<()>>>>,
}

impl TurnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other turn for `user` is running.
    pub async fn acquire(&self, user: &UserKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.retain(|_, weak| weak.strong_count() > 0);
            match locks.get(user).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(user.clone(), Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }

    /// Number of users with a turn in flight or waiting.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn user(key: &str) -> UserKey {
        UserKey::new(key).unwrap()
    }

    #[tokio::test]
    async fn same_user_waits_for_the_running_turn() {
        let locks = Arc::new(TurnLocks::new());
        let guard = locks.acquire(&user("ana")).await;

        let waiting = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&user("ana")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_block_each_other() {
        let locks = TurnLocks::new();
        let _ana = locks.acquire(&user("ana")).await;
        let bob = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&user("bob"))).await;
        assert!(bob.is_ok());
    }

    #[tokio::test]
    async fn released_locks_are_pruned() {
        let locks = TurnLocks::new();
        {
            let _guard = locks.acquire(&user("ana")).await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }
}
