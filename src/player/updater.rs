use log::{debug, error};
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::native::Backend;

/// Thread calling `MikMod_Update` once per interval while a module plays.
pub(crate) struct Updater {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

impl Updater {
    pub fn spawn<B: Backend>(backend: Arc<B>, interval: Duration) -> io::Result<Updater> {
        let (cancel, cancelled) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(String::from("mikmod-update"))
            .spawn(move || run(&*backend, interval, &cancelled))?;
        Ok(Updater { cancel, handle })
    }

    /// Cancels the thread and waits for it to exit. The thread may already be
    /// on its way out after the module reached its end.
    pub fn shutdown(self) {
        // fails if the thread already exited
        let _ = self.cancel.send(());
        if self.handle.join().is_err() {
            error!("mixer update thread panicked");
        }
    }
}

fn run<B: Backend>(backend: &B, interval: Duration, cancelled: &Receiver<()>) {
    debug!("update thread started ({:?})", interval);
    loop {
        match cancelled.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                backend.update();
                if !backend.active() {
                    debug!("module finished, update thread exiting");
                    return;
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!("update thread cancelled");
                return;
            }
        }
    }
}
