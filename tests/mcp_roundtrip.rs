//! Drive an in-process MCP server with raw JSON-RPC lines over a duplex
//! pipe, exactly as a client process would over stdio.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tool_agent::mcp::McpServer;
use tool_agent::tools::{math, ToolRegistry};

type ClientLines = tokio::io::Lines<BufReader<ReadHalf<DuplexStream>>>;
type ClientWriter = WriteHalf<DuplexStream>;

struct TestClient {
    lines: ClientLines,
    writer: ClientWriter,
}

impl TestClient {
    async fn request(&mut self, line: &str) -> serde_json::Value {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
        let response = self
            .lines
            .next_line()
            .await
            .unwrap()
            .expect("server closed unexpectedly");
        serde_json::from_str(&response).unwrap()
    }

    async fn notify(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }
}

fn start_math_server() -> (TestClient, tokio::task::JoinHandle<()>) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);

    let mut registry = ToolRegistry::new();
    math::register_server_tools(&mut registry);
    let server = McpServer::new("math", registry);

    let handle = tokio::spawn(async move {
        server.serve(server_read, server_write).await.unwrap();
    });

    let (client_read, client_write) = tokio::io::split(client_io);
    let client = TestClient {
        lines: BufReader::new(client_read).lines(),
        writer: client_write,
    };
    (client, handle)
}

async fn handshake(client: &mut TestClient) {
    let response = client
        .request(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"0.0.0"}}}"#)
        .await;
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], "math");

    client
        .notify(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
}

#[tokio::test]
async fn full_session_over_the_wire() {
    let (mut client, handle) = start_math_server();
    handshake(&mut client).await;

    // tools/list advertises the registered descriptors.
    let response = client
        .request(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
        .await;
    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 6);
    let add = tools.iter().find(|t| t["name"] == "add").unwrap();
    assert!(add["inputSchema"]["properties"]["a"].is_object());

    // tools/call returns a text content block.
    let response = client
        .request(r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"add","arguments":{"a":2,"b":3}}}"#)
        .await;
    assert_eq!(response["result"]["content"][0]["type"], "text");
    assert_eq!(response["result"]["content"][0]["text"], "5.0");
    assert!(response["result"]["isError"].is_null());

    // A failing tool is still a result, flagged with isError.
    let response = client
        .request(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"divide","arguments":{"a":1,"b":0}}}"#)
        .await;
    assert_eq!(response["result"]["isError"], true);
    assert!(response["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Cannot divide by zero"));

    // Unknown tool name: failed result listing what exists.
    let response = client
        .request(r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#)
        .await;
    assert_eq!(response["result"]["isError"], true);
    assert!(response["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("not found"));

    // Unknown method: JSON-RPC error.
    let response = client
        .request(r#"{"jsonrpc":"2.0","id":6,"method":"resources/list"}"#)
        .await;
    assert_eq!(response["error"]["code"], -32601);

    // Closing the client side ends the serve loop.
    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn requests_before_initialize_are_rejected() {
    let (mut client, handle) = start_math_server();

    let response = client
        .request(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
        .await;
    assert_eq!(response["error"]["code"], -32600);

    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn ping_works_without_initialize() {
    let (mut client, handle) = start_math_server();

    let response = client
        .request(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
        .await;
    assert!(response["error"].is_null());

    drop(client);
    handle.await.unwrap();
}
