use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, TcpStream};
use std::path::PathBuf;

use tokio::sync::mpsc;

use super::bind_with_retry;
use crate::actor::messages::InstallerMsg;

fn request(addr: std::net::SocketAddr, method: &str, url: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    write!(
        stream,
        "{method} {url} HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    )
    .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

#[test]
fn test_signals_reach_the_installer() {
    let server = bind_with_retry(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
    let addr = server.addr();
    let handle = server.handle();
    let (tx, mut rx) = mpsc::channel(8);
    let thread = server.spawn(tx).unwrap();

    let response = request(addr, "POST", "/save?path=%2Ffonts%2FA.ufo");
    assert!(response.starts_with("HTTP/1.1 202"), "{response}");
    match rx.blocking_recv() {
        Some(InstallerMsg::Saved(path)) => assert_eq!(path, PathBuf::from("/fonts/A.ufo")),
        other => panic!("unexpected message: {other:?}"),
    }

    let response = request(addr, "POST", "/activity/key-down");
    assert!(response.starts_with("HTTP/1.1 202"), "{response}");
    assert!(matches!(rx.blocking_recv(), Some(InstallerMsg::Activity(_))));

    handle.unblock();
    thread.join().unwrap();
}

#[test]
fn test_bad_requests_are_rejected() {
    let server = bind_with_retry(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
    let addr = server.addr();
    let handle = server.handle();
    let (tx, mut rx) = mpsc::channel(8);
    let thread = server.spawn(tx).unwrap();

    let response = request(addr, "POST", "/nope");
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    let response = request(addr, "POST", "/open");
    assert!(response.starts_with("HTTP/1.1 400"), "{response}");
    assert!(response.contains("path"));
    let response = request(addr, "GET", "/save?path=/a.ufo");
    assert!(response.starts_with("HTTP/1.1 405"), "{response}");

    handle.unblock();
    thread.join().unwrap();
    assert!(rx.try_recv().is_err());
}
