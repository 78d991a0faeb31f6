use async_std::task::JoinHandle;
use stop_token::StopSource;

/// Handle to a spawned task that stops when told to.
pub struct ShutdownHandle {
    join_handle: JoinHandle<()>,
    stop_source: StopSource,
}

impl ShutdownHandle {
    pub fn new(join_handle: JoinHandle<()>, stop_source: StopSource) -> Self {
        ShutdownHandle {
            join_handle,
            stop_source,
        }
    }

    pub async fn graceful_shutdown(self) {
        drop(self.stop_source);
        self.join_handle.await;
    }
}
