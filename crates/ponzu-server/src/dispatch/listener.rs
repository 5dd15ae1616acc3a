//! HTTP accept loop for the dispatcher, built on `tiny_http`.
//!
//! Each received request is dispatched on its own thread. The foreground
//! loop used by `listen` never returns; the background variant used by
//! `spawn` polls a shutdown flag between timed receives.

use std::io;
use std::net::SocketAddr;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tiny_http::Server;
use tracing::{info, warn};

use super::errors::ListenerError;
use super::{DISPATCH_TARGET, Dispatcher};

const RECEIVE_POLL: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// A bound HTTP listener.
pub(crate) struct HttpListener {
    server: Server,
    addr: SocketAddr,
}

impl HttpListener {
    pub(crate) fn bind(addr: SocketAddr) -> Result<Self, ListenerError> {
        let server = Server::http(addr).map_err(|error| ListenerError::Bind {
            addr,
            message: error.to_string(),
        })?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or(ListenerError::LocalAddr)?;
        Ok(Self { server, addr })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Receives requests on the current thread forever.
    pub(crate) fn serve_forever(self, dispatcher: Arc<Dispatcher>) -> ! {
        info!(target: DISPATCH_TARGET, addr = %self.addr, "http listener active");
        let mut last_error = None::<io::ErrorKind>;
        loop {
            match self.server.recv() {
                Ok(request) => {
                    last_error = None;
                    hand_off(request, &dispatcher);
                }
                Err(error) => {
                    note_receive_error(&error, &mut last_error);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
    }

    /// Receives requests on a background thread until shut down.
    pub(crate) fn start(self, dispatcher: Arc<Dispatcher>) -> ListenerHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = thread::spawn(move || self.run_until(&flag, &dispatcher));
        ListenerHandle {
            shutdown,
            handle: Some(handle),
        }
    }

    fn run_until(self, shutdown: &AtomicBool, dispatcher: &Arc<Dispatcher>) {
        info!(target: DISPATCH_TARGET, addr = %self.addr, "http listener active");
        let mut last_error = None::<io::ErrorKind>;
        while !shutdown.load(Ordering::SeqCst) {
            match self.server.recv_timeout(RECEIVE_POLL) {
                Ok(Some(request)) => {
                    last_error = None;
                    hand_off(request, dispatcher);
                }
                Ok(None) => {}
                Err(error) => {
                    note_receive_error(&error, &mut last_error);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        info!(target: DISPATCH_TARGET, addr = %self.addr, "http listener stopped");
    }
}

fn hand_off(request: tiny_http::Request, dispatcher: &Arc<Dispatcher>) {
    let dispatcher = Arc::clone(dispatcher);
    thread::spawn(move || dispatcher.serve_request(request));
}

fn note_receive_error(error: &io::Error, last_error: &mut Option<io::ErrorKind>) {
    let kind = error.kind();
    if *last_error != Some(kind) {
        warn!(target: DISPATCH_TARGET, error = %error, "receive error");
    }
    *last_error = Some(kind);
}

/// Handle to the background listener thread.
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the listener thread; the socket is closed once it returns.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}
