use std::thread::{self, JoinHandle};

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

/* A named OS thread that runs until its token is cancelled. Dropping it cancels and joins. */
pub struct ServiceThread {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
    shutdown_token: CancellationToken,
}

impl ServiceThread {
    pub fn spawn<F>(name: &'static str, shutdown_token: CancellationToken, f: F) -> std::io::Result<Self>
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        let token = shutdown_token.clone();
        let handle = thread::Builder::new().name(name.into()).spawn(move || f(token))?;
        Ok(Self {
            name,
            handle: Some(handle),
            shutdown_token,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    pub fn shutdown(mut self) {
        self.join_inner();
    }

    fn join_inner(&mut self) {
        self.shutdown_token.cancel();
        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                log::error!("Thread {} panicked", self.name);
            }
        }
    }
}

impl Drop for ServiceThread {
    fn drop(&mut self) {
        self.join_inner();
    }
}

/* Each service thread drives its own single-threaded runtime. */
pub fn local_runtime(name: &str) -> Option<Runtime> {
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(r) => Some(r),
        Err(e) => {
            log::error!("Could not start {} runtime: {}", name, e);
            None
        }
    }
}
