//! The per-thread worker loop.
//!
//! Each worker repeatedly pops a connection off the shared queue and drives
//! it through a fixed sequence: parse the request, classify the method,
//! acquire the resource lock, hand off to the handler, release, audit, close.
//! A panic anywhere in that sequence is caught at the top of the loop so one
//! bad connection never takes a whole worker thread down with it.

use std::io::BufReader;
use std::net::TcpStream;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use hyperdrive::table::LockMode;
use hyperdrive::{BoundedQueue, ResourceLockTable};

use crate::audit::AuditSink;
use crate::handler::{handle_get, handle_put, resolve};
use crate::protocol::Method;
use crate::request::parse_request;
use crate::response::{write_empty_response, write_response, Status};

/// Runs one worker's pop-process loop until the queue is closed for good by
/// process shutdown (in practice: forever, since this server runs until
/// killed).
pub fn run(worker_id: usize, queue: &Arc<BoundedQueue<TcpStream>>, table: &Arc<ResourceLockTable>, root: &Arc<std::path::PathBuf>, audit: &Arc<AuditSink>) {
    loop {
        let stream = queue.pop();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            serve_one(stream, table, root, audit);
        }));
        if let Err(payload) = result {
            log::error!("worker {worker_id} panicked while serving a connection: {}", panic_message(&payload));
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

fn serve_one(stream: TcpStream, table: &Arc<ResourceLockTable>, root: &Path, audit: &AuditSink) {
    let mut reader = BufReader::new(stream);

    // A connection that never yields a well-formed request line and headers
    // never reaches the handlers, so it never reaches the audit trail
    // either: only `handle_get`/`handle_put` outcomes are audited.
    let request = match parse_request(&mut reader) {
        Ok(request) => request,
        Err(e) => {
            log::debug!("bad request: {e}");
            let mut stream = reader.into_inner();
            let _ = write_empty_response(&mut stream, Status::BadRequest);
            return;
        }
    };

    let request_id = request.request_id().map(str::to_owned);

    match request.method {
        Method::Unsupported => {
            let mut stream = reader.into_inner();
            let _ = write_empty_response(&mut stream, Status::NotImplemented);
        }
        Method::Get => {
            let path = resolve(root, &request.uri);
            let guard = table.acquire(&request.uri, LockMode::Shared);
            let (status, body) = handle_get(&path);
            drop(guard);
            let mut stream = reader.into_inner();
            let _ = write_response(&mut stream, status, &body);
            audit.record(Method::Get, &request.uri, status, request_id.as_deref());
        }
        Method::Put => {
            let path = resolve(root, &request.uri);
            let content_length = match request.content_length() {
                Ok(len) => len,
                Err(e) => {
                    log::debug!("bad PUT request: {e}");
                    let mut stream = reader.into_inner();
                    let _ = write_empty_response(&mut stream, Status::BadRequest);
                    return;
                }
            };
            // Existence is checked before the resource lock is acquired: the
            // response code reflects a TOCTOU-prone snapshot, matching this
            // server's documented admission order rather than a check made
            // under the lock.
            let existed = path.exists();
            let guard = table.acquire(&request.uri, LockMode::Exclusive);
            let status = handle_put(&path, existed, &mut reader, content_length);
            drop(guard);
            let mut stream = reader.into_inner();
            let _ = write_empty_response(&mut stream, status);
            audit.record(Method::Put, &request.uri, status, request_id.as_deref());
        }
    }
}
