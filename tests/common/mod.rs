//! Shared utilities for integration testing: a scriptable ledger node
//! speaking JSON-RPC 2.0 over HTTP.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

struct NodeState {
    chain_id: String,
    rc: AtomicU64,
    /// Transactions received via submit, in arrival order.
    submissions: Mutex<Vec<Value>>,
    /// Scripted rejections for upcoming submits. Empty means accept.
    submit_errors: Mutex<VecDeque<String>>,
    /// Confirmed transaction id -> containing block id.
    confirmed: Mutex<HashMap<String, String>>,
    /// Block id -> height.
    blocks: Mutex<HashMap<String, u64>>,
}

/// In-process ledger node double bound to an ephemeral local port.
pub struct MockNode {
    addr: SocketAddr,
    state: Arc<NodeState>,
}

#[allow(dead_code)]
impl MockNode {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(NodeState {
            chain_id: "relay-test".to_string(),
            rc: AtomicU64::new(1_000),
            submissions: Mutex::new(Vec::new()),
            submit_errors: Mutex::new(VecDeque::new()),
            confirmed: Mutex::new(HashMap::new()),
            blocks: Mutex::new(HashMap::new()),
        });

        let accept_state = state.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let state = accept_state.clone();
                        tokio::spawn(handle_connection(socket, state));
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_rc(&self, rc: u64) {
        self.state.rc.store(rc, Ordering::SeqCst);
    }

    /// The next submit will be answered with a JSON-RPC error object.
    pub fn reject_next_submit(&self, message: &str) {
        self.state
            .submit_errors
            .lock()
            .unwrap()
            .push_back(message.to_string());
    }

    /// Marks a transaction as included in the given block.
    pub fn confirm(&self, transaction_id: &str, block_id: &str, height: u64) {
        self.state
            .confirmed
            .lock()
            .unwrap()
            .insert(transaction_id.to_string(), block_id.to_string());
        self.state
            .blocks
            .lock()
            .unwrap()
            .insert(block_id.to_string(), height);
    }

    pub fn submissions(&self) -> Vec<Value> {
        self.state.submissions.lock().unwrap().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.state.submissions.lock().unwrap().len()
    }

    pub fn submitted_id(&self, index: usize) -> Option<String> {
        self.state
            .submissions
            .lock()
            .unwrap()
            .get(index)
            .and_then(|tx| tx.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

async fn handle_connection(mut socket: TcpStream, state: Arc<NodeState>) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };

    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let params = request.get("params").cloned().unwrap_or(Value::Null);

    let body = match dispatch(&state, &method, &params) {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        }),
    };
    write_response(&mut socket, &body.to_string()).await;
}

fn dispatch(state: &NodeState, method: &str, params: &Value) -> Result<Value, (i64, String)> {
    match method {
        "chain.get_chain_id" => Ok(json!({ "chain_id": state.chain_id })),
        "chain.get_head_info" => Ok(json!({ "height": 100, "id": "head-100" })),
        "chain.get_account_rc" => Ok(json!({ "rc": state.rc.load(Ordering::SeqCst) })),
        "chain.submit_transaction" => {
            let transaction = params.get("transaction").cloned().unwrap_or(Value::Null);
            state
                .submissions
                .lock()
                .unwrap()
                .push(transaction.clone());
            if let Some(message) = state.submit_errors.lock().unwrap().pop_front() {
                return Err((-32000, message));
            }
            let id = transaction.get("id").and_then(Value::as_str).unwrap_or("");
            let payer = transaction
                .pointer("/header/payer")
                .and_then(Value::as_str)
                .unwrap_or("");
            Ok(json!({
                "receipt": { "id": id, "payer": payer, "rc_used": 1, "logs": [] },
            }))
        }
        "chain.get_transaction_blocks" => {
            let transaction_id = params
                .get("transaction_id")
                .and_then(Value::as_str)
                .unwrap_or("");
            let confirmed = state.confirmed.lock().unwrap();
            let containing: Vec<&String> = confirmed.get(transaction_id).into_iter().collect();
            Ok(json!({ "containing_blocks": containing }))
        }
        "chain.get_block_heights" => {
            let blocks = state.blocks.lock().unwrap();
            let heights: Option<Vec<u64>> = params
                .get("block_ids")
                .and_then(Value::as_array)
                .map(|ids| {
                    ids.iter()
                        .filter_map(Value::as_str)
                        .filter_map(|id| blocks.get(id).copied())
                        .collect()
                });
            Ok(json!({ "heights": heights.unwrap_or_default() }))
        }
        other => Err((-32601, format!("unknown method {}", other))),
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<Value> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        if buf.len() > 64 * 1024 {
            return None;
        }
    };

    let headers = std::str::from_utf8(&buf[..header_end]).ok()?;
    let content_length: usize = headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })?;

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    serde_json::from_slice(&buf[header_end..header_end + content_length]).ok()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

async fn write_response(socket: &mut TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}
