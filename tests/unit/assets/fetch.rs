use std::{
    io::{Cursor, Read, Write},
    net::TcpListener,
    thread,
};

use super::*;
use crate::assets::decode::{FALLBACK_HEIGHT, FALLBACK_RGB, FALLBACK_WIDTH};

fn png_bytes(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(w, h, image::Rgb(rgb));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Serve exactly one HTTP response on an ephemeral port and return its URL.
fn serve_once(status: &'static str, content_type: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut req = Vec::new();
        let mut buf = [0u8; 1024];
        while !req.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => req.extend_from_slice(&buf[..n]),
            }
        }
        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&body);
    });
    format!("http://{addr}/product.png")
}

fn fetcher() -> Fetcher {
    Fetcher::new(FetchOpts {
        timeout: Duration::from_secs(5),
        ..FetchOpts::default()
    })
    .unwrap()
}

fn assert_is_fallback(img: &DecodedImage) {
    assert_eq!((img.width, img.height), (FALLBACK_WIDTH, FALLBACK_HEIGHT));
    assert_eq!(&img.pixels[..3], &FALLBACK_RGB);
}

#[test]
fn local_png_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.png");
    std::fs::write(&path, png_bytes(3, 2, [10, 20, 30])).unwrap();

    let img = fetcher().fetch(&ImageSource::Local(path));
    assert_eq!((img.width, img.height, img.channel_count), (3, 2, 3));
    assert_eq!(&img.pixels[..3], &[10, 20, 30]);
}

#[test]
fn missing_local_file_falls_back() {
    let f = fetcher();
    let src = ImageSource::Local("/definitely/not/here.png".into());
    assert_eq!(f.try_fetch(&src).unwrap_err().kind(), "fetch");
    assert_is_fallback(&f.fetch(&src));
}

#[test]
fn oversized_local_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.png");
    std::fs::write(&path, png_bytes(8, 8, [1, 1, 1])).unwrap();

    let f = Fetcher::new(FetchOpts {
        max_bytes: 16,
        ..FetchOpts::default()
    })
    .unwrap();
    assert!(f.try_fetch(&ImageSource::Local(path)).is_err());
}

#[test]
fn remote_png_is_decoded() {
    let url = serve_once("200 OK", "image/png", png_bytes(4, 4, [200, 0, 0]));
    let img = fetcher()
        .try_fetch(&ImageSource::from(url.as_str()))
        .unwrap();
    assert_eq!((img.width, img.height), (4, 4));
    assert_eq!(&img.pixels[..3], &[200, 0, 0]);
}

#[test]
fn remote_non_2xx_falls_back() {
    let url = serve_once("404 Not Found", "image/png", Vec::new());
    assert_is_fallback(&fetcher().fetch(&ImageSource::from(url.as_str())));
}

#[test]
fn remote_html_content_type_falls_back() {
    let url = serve_once("200 OK", "text/html; charset=utf-8", b"<html></html>".to_vec());
    let err = fetcher()
        .try_fetch(&ImageSource::from(url.as_str()))
        .unwrap_err();
    assert!(err.to_string().contains("unsupported content type"));
}

#[test]
fn remote_undecodable_bytes_fall_back() {
    let url = serve_once("200 OK", "image/jpeg", b"not really a jpeg".to_vec());
    assert_is_fallback(&fetcher().fetch(&ImageSource::from(url.as_str())));
}

#[test]
fn unreachable_url_falls_back() {
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let src = ImageSource::from(format!("http://127.0.0.1:{port}/gone.png").as_str());
    assert_is_fallback(&fetcher().fetch(&src));
}

#[test]
fn fetch_all_preserves_scene_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut sources = Vec::new();
    for (i, shade) in [10u8, 60, 110, 160, 210].iter().enumerate() {
        let path = dir.path().join(format!("{i}.png"));
        std::fs::write(&path, png_bytes(1, 1, [*shade, 0, 0])).unwrap();
        sources.push(ImageSource::Local(path));
    }
    sources.insert(2, ImageSource::Local(dir.path().join("missing.png")));

    let f = Fetcher::new(FetchOpts {
        concurrency: 3,
        ..FetchOpts::default()
    })
    .unwrap();
    let imgs = f.fetch_all(&sources);
    assert_eq!(imgs.len(), 6);
    assert_eq!(imgs[0].pixels[0], 10);
    assert_eq!(imgs[1].pixels[0], 60);
    assert_is_fallback(&imgs[2]);
    assert_eq!(imgs[3].pixels[0], 110);
    assert_eq!(imgs[5].pixels[0], 210);
}

#[test]
fn zero_concurrency_is_rejected() {
    let err = Fetcher::new(FetchOpts {
        concurrency: 0,
        ..FetchOpts::default()
    })
    .unwrap_err();
    assert_eq!(err.kind(), "config");
}

#[test]
fn content_type_filter() {
    assert!(is_image_content_type("image/png"));
    assert!(is_image_content_type("IMAGE/JPEG; q=1"));
    assert!(is_image_content_type("application/octet-stream"));
    assert!(!is_image_content_type("text/html"));
    assert!(!is_image_content_type("application/json"));
}
