// stream-client/tests/stream_client_test.rs
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use common::Chunk;
use stream_client::{CloseReason, ConnectionState, StreamClient, StreamConnection};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENT_STREAM: &str = "text/event-stream";

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), EVENT_STREAM)
}

async fn relay(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat"))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

fn client_for(server: &MockServer) -> StreamClient {
    StreamClient::new(format!("{}/api/chat", server.uri()))
}

fn collector() -> (Rc<RefCell<Vec<Chunk>>>, impl FnMut(Chunk) + 'static) {
    let chunks = Rc::new(RefCell::new(Vec::new()));
    let sink = chunks.clone();
    (chunks, move |chunk| sink.borrow_mut().push(chunk))
}

async fn wait_closed(connection: &mut StreamConnection) -> CloseReason {
    tokio::time::timeout(Duration::from_secs(5), connection.closed())
        .await
        .expect("connection did not close in time")
}

#[actix::test]
async fn test_chunks_arrive_in_order_and_done_closes() {
    let server = relay(sse(concat!(
        "event: message\ndata: {\"event\":\"message\",\"data\":\"chunk1\"}\n\n",
        "event: message\ndata: {\"event\":\"message\",\"data\":\"chunk2\"}\n\n",
        "event: message\ndata: {\"event\":\"done\"}\n\n",
        "event: message\ndata: {\"event\":\"message\",\"data\":\"after done\"}\n\n",
    )))
    .await;

    let mut client = client_for(&server);
    let (chunks, on_chunk) = collector();
    let mut connection = client.send_message("hello", on_chunk);

    assert_eq!(wait_closed(&mut connection).await, CloseReason::Done);
    assert_eq!(
        *chunks.borrow(),
        vec![Chunk::message("chunk1"), Chunk::message("chunk2"), Chunk::done()]
    );
    assert_eq!(connection.state(), ConnectionState::Closed(CloseReason::Done));
}

#[actix::test]
async fn test_query_is_percent_encoded_and_event_stream_requested() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat"))
        .and(query_param("query", "hello world"))
        .and(header("accept", EVENT_STREAM))
        .respond_with(sse("event: done\ndata: {\"event\":\"done\"}\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let (_chunks, on_chunk) = collector();
    let mut connection = client.send_message("hello world", on_chunk);
    assert_eq!(wait_closed(&mut connection).await, CloseReason::Done);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("query=hello%20world"));
}

#[actix::test]
async fn test_unauthorized_event_is_reported_once() {
    let server = relay(sse(
        "event: error\ndata: {\"error\":\"Unauthorized - Please log in again\",\"status\":401}\n\n",
    ))
    .await;

    let mut client = client_for(&server);
    let (chunks, on_chunk) = collector();
    let mut connection = client.send_message("hi", on_chunk);

    assert_eq!(wait_closed(&mut connection).await, CloseReason::Error);
    // The stream ending afterwards must not add a "Connection error"
    assert_eq!(*chunks.borrow(), vec![Chunk::unauthorized()]);
}

#[actix::test]
async fn test_relay_json_error_is_a_connection_error() {
    let server = relay(
        ResponseTemplate::new(400)
            .set_body_raw(br#"{"error":"User Query is required"}"#.to_vec(), "application/json"),
    )
    .await;

    let mut client = client_for(&server);
    let (chunks, on_chunk) = collector();
    let mut connection = client.send_message("x", on_chunk);

    assert_eq!(wait_closed(&mut connection).await, CloseReason::Error);
    assert_eq!(*chunks.borrow(), vec![Chunk::connection_error()]);
}

#[actix::test]
async fn test_unreachable_relay_is_a_connection_error() {
    // Nothing listens on the discarded server's port any more
    let url = {
        let server = MockServer::start().await;
        format!("{}/api/chat", server.uri())
    };

    let mut client = StreamClient::new(url);
    let (chunks, on_chunk) = collector();
    let mut connection = client.send_message("x", on_chunk);

    assert_eq!(wait_closed(&mut connection).await, CloseReason::Error);
    assert_eq!(*chunks.borrow(), vec![Chunk::connection_error()]);
}

#[actix::test]
async fn test_malformed_frames_are_skipped() {
    let server = relay(sse(concat!(
        ": keep-alive\n\n",
        "event: message\ndata: invalid json\n\n",
        "data: {\"event\":\"message\",\"data\":\"ok\"}\r\n\r\n",
        "event: done\ndata: {\"event\":\"done\"}\n\n",
    )))
    .await;

    let mut client = client_for(&server);
    let (chunks, on_chunk) = collector();
    let mut connection = client.send_message("x", on_chunk);

    assert_eq!(wait_closed(&mut connection).await, CloseReason::Done);
    assert_eq!(*chunks.borrow(), vec![Chunk::message("ok"), Chunk::done()]);
}

#[actix::test]
async fn test_carriage_return_line_endings() {
    let server = relay(sse(concat!(
        "event: message\rdata: {\"event\":\"message\",\"data\":\"x\"}\r\r",
        "event: done\rdata: {\"event\":\"done\"}\r\r",
    )))
    .await;

    let mut client = client_for(&server);
    let (chunks, on_chunk) = collector();
    let mut connection = client.send_message("x", on_chunk);

    assert_eq!(wait_closed(&mut connection).await, CloseReason::Done);
    assert_eq!(*chunks.borrow(), vec![Chunk::message("x"), Chunk::done()]);
}

#[actix::test]
async fn test_multiline_data_and_unicode_payload() {
    let server = relay(sse(concat!(
        "data: {\"event\":\"message\",\r\ndata: \"data\":\"naïve 日本語\"}\r\n\r\n",
        "event: done\ndata: {\"event\":\"done\"}\n\n",
    )))
    .await;

    let mut client = client_for(&server);
    let (chunks, on_chunk) = collector();
    let mut connection = client.send_message("x", on_chunk);

    assert_eq!(wait_closed(&mut connection).await, CloseReason::Done);
    assert_eq!(*chunks.borrow(), vec![Chunk::message("naïve 日本語"), Chunk::done()]);
}

#[actix::test]
async fn test_stream_ending_without_done_is_a_connection_error() {
    let server = relay(sse(
        "event: message\ndata: {\"event\":\"message\",\"data\":\"partial\"}\n\n",
    ))
    .await;

    let mut client = client_for(&server);
    let (chunks, on_chunk) = collector();
    let mut connection = client.send_message("x", on_chunk);

    assert_eq!(wait_closed(&mut connection).await, CloseReason::Error);
    assert_eq!(
        *chunks.borrow(),
        vec![Chunk::message("partial"), Chunk::connection_error()]
    );
}

#[actix::test]
async fn test_new_message_closes_previous_connection() {
    let slow = relay(
        sse("event: message\ndata: {\"event\":\"message\",\"data\":\"stale\"}\n\n")
            .set_delay(Duration::from_millis(500)),
    )
    .await;

    let mut client = client_for(&slow);
    let (stale_chunks, on_stale) = collector();
    let mut first = client.send_message("first", on_stale);

    let (chunks, on_chunk) = collector();
    let mut second = client.send_message("second", on_chunk);

    assert_eq!(wait_closed(&mut first).await, CloseReason::Caller);
    assert!(first.is_closed());

    // The slow relay answers the second request too, then it is closed here
    second.close();
    assert_eq!(wait_closed(&mut second).await, CloseReason::Caller);

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(stale_chunks.borrow().is_empty());
    assert!(chunks.borrow().is_empty());
}
