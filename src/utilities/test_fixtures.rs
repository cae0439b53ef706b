use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use crate::apis::predict::{Prediction, PredictError, PredictionApi};
use crate::form::{TextElement, TextField};
use crate::handler::{StalePolicy, SubmissionHandler};

pub struct CannedResponse {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl CannedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self { status, content_type: "application/json", body: body.into() }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self { status, content_type: "text/plain", body: body.into() }
    }
}

pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Serves a single HTTP request with a canned response and records what it received.
pub struct OneShotServer {
    port: u16,
    task: JoinHandle<RecordedRequest>,
}

impl OneShotServer {
    pub async fn start(response: CannedResponse) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let task = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;

            let reply = format!(
                "HTTP/1.1 {} Canned\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                response.status,
                response.content_type,
                response.body.len(),
                response.body
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            request
        });

        Self { port, task }
    }

    pub fn endpoint(&self) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}/predict", self.port)).unwrap()
    }

    pub async fn request(self) -> RecordedRequest {
        self.task.await.unwrap()
    }
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> RecordedRequest {
    let mut buffer = Vec::new();
    let mut chunk = [0; 1024];

    let header_end = loop {
        let read = stream.read(&mut chunk).await.unwrap();
        assert!(read > 0, "connection closed before headers were complete");
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8(buffer[..header_end].to_vec()).unwrap();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap().split(' ');
    let method = request_line.next().unwrap().to_owned();
    let path = request_line.next().unwrap().to_owned();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect::<Vec<_>>();

    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .map_or(0, |(_, value)| value.parse::<usize>().unwrap());

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).await.unwrap();
        assert!(read > 0, "connection closed before body was complete");
        body.extend_from_slice(&chunk[..read]);
    }

    RecordedRequest { method, path, headers, body }
}

/// An endpoint on a port nothing listens on.
pub async fn unreachable_endpoint() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}/predict")).unwrap()
}

pub enum FakeReply {
    Prediction(&'static str),
    ServerError,
    Unreachable,
    Malformed,
}

/// In-process stand-in for the prediction service. Replies are consumed in order, each after
/// its own delay; every received URL is recorded.
#[derive(Default)]
pub struct FakeApi {
    replies: Mutex<Vec<(Duration, FakeReply)>>,
    pub received: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn reply(self, reply: FakeReply) -> Self {
        self.reply_after(Duration::ZERO, reply)
    }

    pub fn reply_after(self, delay: Duration, reply: FakeReply) -> Self {
        self.replies.lock().unwrap().push((delay, reply));
        self
    }
}

#[async_trait]
impl PredictionApi for FakeApi {
    async fn predict(&self, url: &str) -> Result<Prediction, PredictError> {
        self.received.lock().unwrap().push(url.into());
        let (delay, reply) = self.replies.lock().unwrap().remove(0);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            FakeReply::Prediction(label) => Ok(Prediction(json!(label))),
            FakeReply::ServerError => {
                Err(PredictError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, None))
            }
            FakeReply::Unreachable => {
                let endpoint = unreachable_endpoint().await;
                let err = reqwest::Client::new().post(endpoint).send().await.unwrap_err();
                Err(PredictError::Request(err))
            }
            FakeReply::Malformed => Err(PredictError::Body(
                serde_json::from_str::<serde_json::Value>("<html>").unwrap_err(),
            )),
        }
    }
}

pub struct HandlerFixture {
    pub api: Arc<FakeApi>,
    pub field: Arc<TextField>,
    pub output: Arc<TextElement>,
    pub handler: Arc<SubmissionHandler>,
}

pub fn handler(api: FakeApi, policy: StalePolicy) -> HandlerFixture {
    let api = Arc::new(api);
    let field = Arc::new(TextField::default());
    let output = Arc::new(TextElement::default());
    let handler =
        Arc::new(SubmissionHandler::new(api.clone(), field.clone(), output.clone(), policy));

    HandlerFixture { api, field, output, handler }
}
