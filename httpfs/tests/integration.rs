//! End-to-end tests driving the compiled server binary over real TCP
//! connections, matching the concrete scenarios the interface contract
//! walks through: create, read, replace, miss, unsupported method,
//! malformed request, and concurrent readers alongside a writer.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::process::{Child, Command};
use std::time::Duration;

struct Server {
    child: Child,
    port: u16,
}

impl Server {
    fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let port = pick_port();
        let child = Command::new(env!("CARGO_BIN_EXE_httpfs"))
            .arg("-t")
            .arg("4")
            .arg(port.to_string())
            .current_dir(dir.path())
            .spawn()
            .expect("failed to spawn httpfs binary");

        let server = Self { child, port };
        server.wait_until_ready();
        // Keep the tempdir alive for the server's lifetime by leaking it into
        // the child's current_dir; the OS reclaims it on test process exit.
        std::mem::forget(dir);
        server
    }

    fn wait_until_ready(&self) {
        for _ in 0..100 {
            if TcpStream::connect(("127.0.0.1", self.port)).is_ok() {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!("server did not start listening on port {}", self.port);
    }

    fn connect(&self) -> TcpStream {
        TcpStream::connect(("127.0.0.1", self.port)).unwrap()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn pick_port() -> u16 {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
    listener.local_addr().unwrap().port()
}

fn send(stream: &mut TcpStream, request: &str) -> String {
    stream.write_all(request.as_bytes()).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response);
    String::from_utf8_lossy(&response).into_owned()
}

fn status_line(response: &str) -> &str {
    response.lines().next().unwrap_or("")
}

#[test]
fn get_on_absent_resource_is_404() {
    let server = Server::start();
    let mut stream = server.connect();
    let response = send(&mut stream, "GET /nope HTTP/1.1\r\n\r\n");
    assert!(status_line(&response).contains("404"));
}

#[test]
fn put_creates_then_get_reads_it_back() {
    let server = Server::start();

    let mut stream = server.connect();
    let response = send(&mut stream, "PUT /a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");
    assert!(status_line(&response).contains("201"));

    let mut stream = server.connect();
    let response = send(&mut stream, "GET /a HTTP/1.1\r\n\r\n");
    assert!(status_line(&response).contains("200"));
    assert!(response.ends_with("hello"));
}

#[test]
fn put_on_existing_resource_replaces_it_and_is_200() {
    let server = Server::start();

    let mut stream = server.connect();
    send(&mut stream, "PUT /a HTTP/1.1\r\nContent-Length: 3\r\n\r\nold");

    let mut stream = server.connect();
    let response = send(&mut stream, "PUT /a HTTP/1.1\r\nContent-Length: 3\r\n\r\nnew");
    assert!(status_line(&response).contains("200"));

    let mut stream = server.connect();
    let response = send(&mut stream, "GET /a HTTP/1.1\r\n\r\n");
    assert!(response.ends_with("new"));
}

#[test]
fn put_is_idempotent_under_repeated_identical_writes() {
    let server = Server::start();
    for _ in 0..3 {
        let mut stream = server.connect();
        send(&mut stream, "PUT /a HTTP/1.1\r\nContent-Length: 4\r\n\r\nsame");
    }
    let mut stream = server.connect();
    let response = send(&mut stream, "GET /a HTTP/1.1\r\n\r\n");
    assert!(response.ends_with("same"));
}

#[test]
fn unsupported_method_is_501() {
    let server = Server::start();
    let mut stream = server.connect();
    let response = send(&mut stream, "DELETE /a HTTP/1.1\r\n\r\n");
    assert!(status_line(&response).contains("501"));
}

#[test]
fn malformed_request_line_is_400() {
    let server = Server::start();
    let mut stream = server.connect();
    let response = send(&mut stream, "GARBAGE REQUEST\r\n\r\n");
    assert!(status_line(&response).contains("400"));
}

#[test]
fn concurrent_reads_interleave_with_a_writer_without_corruption() {
    let server = Server::start();
    let mut seed = server.connect();
    send(&mut seed, "PUT /shared HTTP/1.1\r\nContent-Length: 5\r\n\r\nfirst");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let port = server.port;
        handles.push(std::thread::spawn(move || {
            let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
            let response = send(&mut stream, "GET /shared HTTP/1.1\r\n\r\n");
            assert!(status_line(&response).contains("200"));
            let body = response.rsplit("\r\n\r\n").next().unwrap();
            assert!(body == "first" || body == "second");
        }));
    }

    let port = server.port;
    handles.push(std::thread::spawn(move || {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        let response = send(&mut stream, "PUT /shared HTTP/1.1\r\nContent-Length: 6\r\n\r\nsecond");
        assert!(status_line(&response).contains("200"));
    }));

    for h in handles {
        h.join().unwrap();
    }
}
