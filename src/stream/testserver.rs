//! Loopback HTTP fixtures for parser tests.

use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::thread;

pub(crate) struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn ok(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type,
            body,
        }
    }
}

/// Serve the given responses to sequential connections on a loopback port
/// and return the base URL. The server thread exits after the last response.
pub(crate) fn serve(responses: Vec<CannedResponse>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for response in responses {
            let (mut socket, _) = match listener.accept() {
                Ok(pair) => pair,
                Err(_) => return,
            };
            // Drain the request head; these fixtures only see body-less GETs.
            let mut seen = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                match socket.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        seen.extend_from_slice(&buf[..n]);
                        if seen.windows(4).any(|window| window == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }
            let head = format!(
                "HTTP/1.1 {} TEST\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                response.status,
                response.content_type,
                response.body.len()
            );
            let _ = socket.write_all(head.as_bytes());
            let _ = socket.write_all(&response.body);
        }
    });
    format!("http://{}", addr)
}

/// A URL nothing listens on: bind an ephemeral port, then release it.
pub(crate) fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// A small but valid JPEG payload.
pub(crate) fn tiny_jpeg() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(4, 4, image::Rgb([120, 20, 40]));
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .unwrap();
    out
}
