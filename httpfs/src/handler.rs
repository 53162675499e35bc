//! GET and PUT semantics against the served directory.
//!
//! Each function here runs with the resource's lock already held by the
//! caller; these functions only decide an outcome and touch the filesystem,
//! they never block on anything else. The status-code contract is fixed:
//! `GET` returns `200`/`403`/`404`/`500`; `PUT` returns `200`/`201`/`403`/`500`.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::response::Status;

/// Resolves a validated single-component URI to a path under `root`.
///
/// The URI grammar (`/[A-Za-z0-9.-]{1,63}`) already rules out `/` and `..`
/// inside the component, so this is a plain join, not a sanitizing one.
#[must_use]
pub fn resolve(root: &Path, uri: &str) -> PathBuf {
    root.join(uri.trim_start_matches('/'))
}

/// Serves a GET: reads the whole file into the response body.
///
/// A missing file is `404`; a permissions failure is `403`; any other I/O
/// failure is `500`.
#[must_use]
pub fn handle_get(path: &Path) -> (Status, Vec<u8>) {
    match fs::File::open(path) {
        Ok(mut file) => {
            let mut body = Vec::new();
            match file.read_to_end(&mut body) {
                Ok(_) => (Status::Ok, body),
                Err(e) => (status_for_io_error(&e), Vec::new()),
            }
        }
        Err(e) => (status_for_io_error(&e), Vec::new()),
    }
}

/// Serves a PUT: writes exactly `content_length` bytes read from `body` to
/// `path`, replacing any existing contents.
///
/// `existed` is decided by the caller before the resource lock was acquired,
/// per the server's existence-before-acquisition policy, and is trusted
/// as-is here even if the file's existence changed in the interim: the
/// response code reflects what the caller observed at admission time, not
/// a fresh check.
pub fn handle_put(path: &Path, existed: bool, body: &mut impl Read, content_length: u64) -> Status {
    let file = fs::OpenOptions::new().create(true).write(true).truncate(true).open(path);
    let mut file = match file {
        Ok(file) => file,
        Err(e) => return status_for_io_error(&e),
    };

    let mut limited = body.take(content_length);
    if let Err(e) = std::io::copy(&mut limited, &mut file) {
        return status_for_io_error(&e);
    }
    if let Err(e) = file.flush() {
        return status_for_io_error(&e);
    }

    if existed {
        Status::Ok
    } else {
        Status::Created
    }
}

/// EISDIR on Linux; `ErrorKind` has no stable variant for "is a directory",
/// so this falls back to the raw errno the way code predating
/// `io_error_more` has to.
const EISDIR: i32 = 21;

fn status_for_io_error(e: &std::io::Error) -> Status {
    match e.kind() {
        std::io::ErrorKind::NotFound => Status::NotFound,
        std::io::ErrorKind::PermissionDenied => Status::Forbidden,
        _ if e.raw_os_error() == Some(EISDIR) => Status::Forbidden,
        _ => Status::InternalServerError,
    }
}
