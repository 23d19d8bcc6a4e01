use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

#[derive(Debug, Clone)]
pub struct CannedResponse {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl CannedResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, content_type: &'static str, body: &str) -> Self {
        Self {
            status,
            content_type,
            body: body.to_string(),
        }
    }
}

pub struct TestServer {
    base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl TestServer {
    pub fn serve<F>(requests: usize, respond: F) -> Self
    where
        F: Fn(&RecordedRequest) -> CannedResponse + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
        let base_url = format!(
            "http://{}",
            listener.local_addr().expect("listener address")
        );

        let handle = thread::spawn(move || {
            let mut recorded = Vec::with_capacity(requests);
            for _ in 0..requests {
                let (stream, _) = listener.accept().expect("accept connection");
                let request = handle_connection(stream, &respond);
                recorded.push(request);
            }
            recorded
        });

        Self { base_url, handle }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().expect("server thread")
    }
}

fn handle_connection<F>(stream: TcpStream, respond: &F) -> RecordedRequest
where
    F: Fn(&RecordedRequest) -> CannedResponse,
{
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().expect("content length");
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).expect("request body");
    let request = RecordedRequest {
        method,
        path,
        body: String::from_utf8(body).expect("utf-8 body"),
    };

    let response = respond(&request);
    let mut stream = reader.into_inner();
    write!(
        stream,
        "HTTP/1.1 {} Canned\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.content_type,
        response.body.len(),
        response.body
    )
    .expect("write response");
    stream.flush().expect("flush response");

    request
}
