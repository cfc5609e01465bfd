#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use aws_sdk_s3::config::{
    BehaviorVersion, Credentials, Region, RequestChecksumCalculation, ResponseChecksumValidation,
};
use axum::{
    Router,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use futures::{StreamExt, TryStreamExt, stream};
use sha1::{Digest, Sha1};
use tokio::net::TcpListener;
use unistore::{ContentStream, Result};

pub const LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";
pub const DENIED_BUCKET: &str = "denied";
pub const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

/// Objects held by a fake server, keyed by path.
pub type Objects = Arc<Mutex<HashMap<String, Bytes>>>;

pub fn content(parts: &[&'static str]) -> ContentStream {
    stream::iter(
        parts
            .iter()
            .map(|p| Ok(Bytes::from_static(p.as_bytes())))
            .collect::<Vec<_>>(),
    )
    .boxed()
}

pub fn from_vec(data: Vec<u8>) -> ContentStream {
    stream::iter(vec![Ok(Bytes::from(data))]).boxed()
}

pub async fn collect(stream: ContentStream) -> Result<Vec<u8>> {
    let chunks: Vec<Bytes> = stream.try_collect().await?;
    Ok(chunks.concat())
}

pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn quoted_sha1(data: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha1::digest(data)))
}

fn object_headers(data: &Bytes) -> [(header::HeaderName, String); 4] {
    [
        (header::ACCEPT_RANGES, "bytes".to_string()),
        (header::CONTENT_LENGTH, data.len().to_string()),
        (header::ETAG, quoted_sha1(data)),
        (header::LAST_MODIFIED, LAST_MODIFIED.to_string()),
    ]
}

fn found_head(data: &Bytes) -> Response {
    let mut builder = Response::builder().status(StatusCode::OK);
    for (name, value) in object_headers(data) {
        builder = builder.header(name, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn found_get(data: Bytes) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, data.len())
        .header(header::ETAG, quoted_sha1(&data))
        .body(Body::from(data))
        .unwrap()
}

/// Plain HTTP object server: HEAD/GET/POST under `/files/`, and a route
/// under `/broken/` that always answers 500.
pub async fn spawn_http_store() -> (String, Objects) {
    let objects = Objects::default();

    async fn head_file(State(objects): State<Objects>, Path(key): Path<String>) -> Response {
        match objects.lock().unwrap().get(&key) {
            Some(data) => found_head(data),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn get_file(State(objects): State<Objects>, Path(key): Path<String>) -> Response {
        let data = objects.lock().unwrap().get(&key).cloned();
        match data {
            Some(data) => found_get(data),
            None => (StatusCode::NOT_FOUND, "no such file").into_response(),
        }
    }

    async fn post_file(
        State(objects): State<Objects>,
        Path(key): Path<String>,
        body: Bytes,
    ) -> Response {
        let etag = quoted_sha1(&body);
        objects.lock().unwrap().insert(key, body);
        (StatusCode::CREATED, [(header::ETAG, etag)]).into_response()
    }

    async fn broken() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    let router = Router::new()
        .route(
            "/files/{*key}",
            get(get_file).head(head_file).post(post_file),
        )
        .route("/broken/{*key}", get(broken).head(broken).post(broken))
        .with_state(objects.clone());

    let addr = spawn(router).await;
    (format!("http://{addr}/files"), objects)
}

/// Just enough of the S3 REST API (path-style HeadObject/GetObject/PutObject)
/// to drive `aws_sdk_s3::Client` against. HEAD in the bucket named
/// [`DENIED_BUCKET`] always answers 403.
pub async fn spawn_s3_store() -> (String, Objects) {
    let objects = Objects::default();

    fn object_key(bucket: &str, key: &str) -> String {
        format!("{bucket}/{key}")
    }

    async fn head_object(
        State(objects): State<Objects>,
        Path((bucket, key)): Path<(String, String)>,
    ) -> Response {
        if bucket == DENIED_BUCKET {
            return StatusCode::FORBIDDEN.into_response();
        }
        match objects.lock().unwrap().get(&object_key(&bucket, &key)) {
            Some(data) => found_head(data),
            // Real S3 answers a missing HEAD with an empty 404.
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn get_object(
        State(objects): State<Objects>,
        Path((bucket, key)): Path<(String, String)>,
    ) -> Response {
        let data = objects.lock().unwrap().get(&object_key(&bucket, &key)).cloned();
        match data {
            Some(data) => found_get(data),
            None => Response::builder()
                .status(StatusCode::NOT_FOUND)
                .header(header::CONTENT_TYPE, "application/xml")
                .body(Body::from(format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                     <Error><Code>NoSuchKey</Code>\
                     <Message>The specified key does not exist.</Message>\
                     <Key>{key}</Key><RequestId>test</RequestId></Error>"
                )))
                .unwrap(),
        }
    }

    async fn put_object(
        State(objects): State<Objects>,
        Path((bucket, key)): Path<(String, String)>,
        body: Bytes,
    ) -> Response {
        let etag = quoted_sha1(&body);
        objects
            .lock()
            .unwrap()
            .insert(object_key(&bucket, &key), body);
        Response::builder()
            .status(StatusCode::OK)
            .header(header::ETAG, etag)
            .header("x-amz-version-id", "v1")
            .body(Body::empty())
            .unwrap()
    }

    let router = Router::new()
        .route(
            "/{bucket}/{*key}",
            put(put_object).get(get_object).head(head_object),
        )
        .with_state(objects.clone());

    let addr = spawn(router).await;
    (format!("http://{addr}"), objects)
}

pub fn s3_client(endpoint_url: &str) -> aws_sdk_s3::Client {
    let conf = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(endpoint_url)
        .credentials_provider(Credentials::new("test", "test", None, None, "test"))
        .force_path_style(true)
        .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
        .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
        .build();
    aws_sdk_s3::Client::from_conf(conf)
}
