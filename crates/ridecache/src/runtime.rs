// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Spawning of background revalidation tasks.

use std::future::Future;

use tokio::runtime::Handle;

/// Spawns fire-and-forget work onto the ambient tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Runtime;

impl Runtime {
    /// Spawns `work` and returns true, or drops it and returns false when no
    /// tokio runtime is active on the calling thread.
    pub(crate) fn spawn<T>(self, work: T) -> bool
    where
        T: Future<Output = ()> + Send + 'static,
    {
        match Handle::try_current() {
            Ok(handle) => {
                drop(handle.spawn(work));
                true
            }
            Err(_) => false,
        }
    }
}
