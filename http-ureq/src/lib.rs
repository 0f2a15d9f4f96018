#![deny(
    single_use_lifetimes,
    missing_debug_implementations,
    large_assignments,
    anonymous_parameters,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    missing_docs,
    non_ascii_idents,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes
)]

//! # reqkit-ureq
//!
//! ## Ureq HTTP 传输实现
//!
//! 基于 Ureq 库实现 [`reqkit_http::HttpCaller`]，仅提供阻塞接口。

mod client;

pub use client::Client;

pub use reqkit_http as http;
pub use ureq;

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::channel::oneshot::channel;
    use md5::{Digest, Md5};
    use rand::{thread_rng, RngCore};
    use reqkit_http::{header::CONTENT_LENGTH, HttpCaller, Method, Request, RequestBody, ResponseErrorKind};
    use std::io::{copy as io_copy, Cursor, Read};
    use tokio::task::spawn_blocking;
    use warp::{
        filters::{body::bytes, method::post},
        header::value as header_value,
        http::{header::HeaderValue, StatusCode as WarpStatusCode},
        path,
        reply::{with_status, Response},
        Filter,
    };

    macro_rules! starts_with_server {
        ($addr:ident, $routes:ident, $code:block) => {{
            let (tx, rx) = channel();
            let ($addr, server) = warp::serve($routes).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                rx.await.ok();
            });
            let handler = tokio::spawn(server);
            $code?;
            tx.send(()).ok();
            handler.await.ok();
        }};
    }

    const BUF_LEN: usize = 1 << 20;
    const MD5_LEN: usize = 16;

    #[tokio::test]
    async fn test_streaming_post() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let routes = path!("dir1" / "dir2" / "file")
            .and(post())
            .and(header_value("x-reqkit-test"))
            .and(bytes())
            .map(|test_header: HeaderValue, req_body: Bytes| {
                assert_eq!(test_header.to_str().unwrap(), "streaming");
                assert_eq!(req_body.len(), BUF_LEN + MD5_LEN);
                {
                    let mut hasher = Md5::new();
                    hasher.update(&req_body[..BUF_LEN]);
                    assert_eq!(hasher.finalize().as_slice(), &req_body[BUF_LEN..]);
                }

                let mut resp_body = vec![0u8; BUF_LEN + MD5_LEN];
                thread_rng().fill_bytes(&mut resp_body[..BUF_LEN]);
                {
                    let mut hasher = Md5::new();
                    hasher.update(&resp_body[..BUF_LEN]);
                    resp_body[BUF_LEN..].copy_from_slice(hasher.finalize().as_slice());
                }
                Response::new(resp_body.into())
            });
        starts_with_server!(addr, routes, {
            spawn_blocking(move || {
                let mut request_body = vec![0u8; BUF_LEN + MD5_LEN];
                thread_rng().fill_bytes(&mut request_body[..BUF_LEN]);
                {
                    let mut hasher = Md5::new();
                    hasher.update(&request_body[..BUF_LEN]);
                    request_body[BUF_LEN..].copy_from_slice(hasher.finalize().as_slice());
                }

                let size = request_body.len() as u64;
                let request = Request::builder()
                    .method(Method::POST)
                    .url(format!("http://{}/dir1/dir2/file", addr).parse()?)
                    .header("x-reqkit-test", HeaderValue::from_static("streaming"))
                    .body(RequestBody::from_reader_with_size(Cursor::new(request_body), size))
                    .build();
                let mut response = Client::default().call(request)?;
                assert_eq!(
                    response.header(CONTENT_LENGTH).map(|h| h.as_bytes()),
                    Some(format!("{}", BUF_LEN + MD5_LEN).as_bytes())
                );

                {
                    let mut body_part = Vec::new();
                    let mut checksum_part = Vec::new();

                    assert_eq!(
                        io_copy(&mut response.body_mut().take(BUF_LEN as u64), &mut body_part)?,
                        BUF_LEN as u64
                    );
                    assert_eq!(
                        io_copy(&mut response.body_mut().take(MD5_LEN as u64), &mut checksum_part)?,
                        MD5_LEN as u64
                    );

                    let mut hasher = Md5::new();
                    hasher.update(&body_part);
                    assert_eq!(hasher.finalize().as_slice(), checksum_part.as_slice());
                }
                Ok::<_, anyhow::Error>(())
            })
            .await?
        });

        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_is_response() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let routes = path!("missing").map(|| with_status("not here", WarpStatusCode::NOT_FOUND));
        starts_with_server!(addr, routes, {
            spawn_blocking(move || {
                let mut response = Client::default().get(&format!("http://{}/missing", addr))?;
                assert_eq!(response.status_code().as_u16(), 404);
                assert_eq!(response.fulfill_body()?, b"not here");
                Ok::<_, anyhow::Error>(())
            })
            .await?
        });

        Ok(())
    }

    #[test]
    fn test_connect_error() {
        env_logger::builder().is_test(true).try_init().ok();

        let err = Client::default().get("http://127.0.0.1:1/").unwrap_err();
        assert_eq!(err.kind(), ResponseErrorKind::ConnectError);
        assert!(err.url().is_some());
    }
}
