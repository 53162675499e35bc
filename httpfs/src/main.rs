//! Entry point: parse arguments, bind the listening socket, start the
//! worker pool, and run the accept loop on the main thread.

mod audit;
mod cli;
mod error;
mod handler;
mod logging;
mod protocol;
mod request;
mod response;
mod worker;

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use hyperdrive::{BoundedQueue, ResourceLockTable};

use crate::audit::AuditSink;
use crate::cli::Args;

fn main() -> ExitCode {
    logging::init();

    let args = Args::parse();
    if let Err(e) = args.validate() {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    let root: PathBuf = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    match run(&args, root) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, root: PathBuf) -> Result<(), error::StartupError> {
    let port = args.port_u16();
    let listener = TcpListener::bind(("0.0.0.0", port)).map_err(|source| error::StartupError::Bind { port, source })?;

    let threads = args.threads as usize;
    let queue = Arc::new(BoundedQueue::new(threads));
    let table = Arc::new(ResourceLockTable::new(threads));
    let root = Arc::new(root);
    let audit = Arc::new(AuditSink::stderr());

    log::info!("listening on port {port} with {threads} worker threads, serving {}", root.display());

    for worker_id in 0..threads {
        let queue = queue.clone();
        let table = table.clone();
        let root = root.clone();
        let audit = audit.clone();
        thread::spawn(move || worker::run(worker_id, &queue, &table, &root, &audit));
    }

    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => queue.push(stream),
            Err(e) => log::warn!("failed to accept a connection: {e}"),
        }
    }

    Ok(())
}
