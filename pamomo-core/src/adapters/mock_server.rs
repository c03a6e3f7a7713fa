//! Mock Remote Account Service for testing
//!
//! Speaks just enough HTTP/1.1 to serve the wallet endpoints and keeps one
//! balance per email, so withdraw/deposit/transfer change what the next
//! balance call returns:
//! - POST login -> { key } when the password is "secret"
//! - POST registration -> { key }, 400 with field errors for a taken username
//! - POST get-balance -> { balance }
//! - POST wtdr -> { amount, withdrawal_fee, trans_id, time_stamp }
//! - POST deposit / transfer -> { amount, trans_id, time_stamp }

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};

use crate::config::Endpoints;

/// Flat withdrawal fee the mock charges on top of the amount
const MOCK_WITHDRAWAL_FEE: Decimal = Decimal::from_parts(2500, 0, 0, false, 2);

/// Mock account server for testing
pub struct MockAccountServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<MockState>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Answer every balance request with 500
    pub fail_balance: bool,
    /// Serialize balances as strings, the way DRF DecimalField does
    pub balance_as_string: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
    /// Debit withdrawals but answer with a body that is not a receipt
    pub bare_withdraw_ok: bool,
}

#[derive(Default)]
struct MockState {
    balances: Mutex<HashMap<String, Decimal>>,
    next_trans_id: AtomicU64,
    requests: Mutex<Vec<String>>,
}

impl MockState {
    fn balance(&self, email: &str) -> Decimal {
        self.balances
            .lock()
            .unwrap()
            .get(email)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn adjust(&self, email: &str, delta: Decimal) {
        *self
            .balances
            .lock()
            .unwrap()
            .entry(email.to_string())
            .or_insert(Decimal::ZERO) += delta;
    }

    fn trans_id(&self) -> u64 {
        self.next_trans_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl MockAccountServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::new(MockState::default());

        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let state_clone = state.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let state = state_clone.clone();
                        thread::spawn(move || handle_connection(stream, &cfg, &state));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn set_balance(&self, email: &str, balance: Decimal) {
        self.state
            .balances
            .lock()
            .unwrap()
            .insert(email.to_string(), balance);
    }

    pub fn balance(&self, email: &str) -> Decimal {
        self.state.balance(email)
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockAccountServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read one request: head up to the blank line, then Content-Length bytes of body
fn read_request(stream: &mut TcpStream) -> Option<(String, String, String)> {
    let mut data = Vec::new();
    let mut buffer = [0; 4096];

    let head_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < head_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let mut parts = head.lines().next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();
    let body = String::from_utf8_lossy(&data[head_end..]).to_string();
    Some((method, path, body))
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, state: &MockState) {
    let _ = stream.set_nonblocking(false);
    let Some((method, path, body)) = read_request(&mut stream) else {
        return;
    };
    state.requests.lock().unwrap().push(path.clone());

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    if method != "POST" {
        send_response(&mut stream, 405, "Method Not Allowed", r#"{"detail": "Method not allowed."}"#);
        return;
    }

    let body: JsonValue = serde_json::from_str(&body).unwrap_or(JsonValue::Null);
    let text = |key: &str| body[key].as_str().unwrap_or_default().to_string();
    let amount = || -> Option<Decimal> {
        match &body["amount"] {
            JsonValue::Number(n) => n.to_string().parse().ok(),
            JsonValue::String(s) => s.parse().ok(),
            _ => None,
        }
    };

    let endpoints = Endpoints::default();
    let (status, reason, response) = if path == endpoints.login {
        if text("password") == "secret" {
            (200, "OK", json!({ "key": format!("mock_token_{}", text("username")) }))
        } else {
            (
                400,
                "Bad Request",
                json!({ "non_field_errors": ["Unable to log in with provided credentials."] }),
            )
        }
    } else if path == endpoints.register {
        if text("username") == "taken" {
            (
                400,
                "Bad Request",
                json!({ "username": ["A user with that username already exists."] }),
            )
        } else if text("password1") != text("password2") {
            (
                400,
                "Bad Request",
                json!({ "non_field_errors": ["The two password fields didn't match."] }),
            )
        } else {
            (201, "Created", json!({ "key": format!("mock_token_{}", text("username")) }))
        }
    } else if path == endpoints.balance {
        if config.fail_balance {
            (500, "Internal Server Error", json!({ "detail": "boom" }))
        } else {
            let balance = state.balance(&text("email"));
            let value = if config.balance_as_string {
                json!(balance.to_string())
            } else {
                json!(balance.to_string().parse::<f64>().unwrap_or_default())
            };
            (200, "OK", json!({ "balance": value }))
        }
    } else if path == endpoints.withdraw {
        let email = text("email");
        match amount() {
            Some(amount) if amount + MOCK_WITHDRAWAL_FEE <= state.balance(&email) => {
                state.adjust(&email, -(amount + MOCK_WITHDRAWAL_FEE));
                if config.bare_withdraw_ok {
                    (200, "OK", json!({ "status": "ok" }))
                } else {
                    (
                        200,
                        "OK",
                        json!({
                            "amount": amount.to_string(),
                            "withdrawal_fee": MOCK_WITHDRAWAL_FEE.to_string(),
                            "trans_id": state.trans_id(),
                            "time_stamp": "2026-01-01T12:00:00Z",
                        }),
                    )
                }
            }
            Some(_) => (400, "Bad Request", json!({ "non_field_errors": ["Insufficient funds."] })),
            None => (400, "Bad Request", json!({ "amount": ["A valid number is required."] })),
        }
    } else if path == endpoints.deposit {
        match amount() {
            Some(amount) => {
                state.adjust(&text("email"), amount);
                (
                    200,
                    "OK",
                    json!({ "amount": amount.to_string(), "trans_id": state.trans_id().to_string() }),
                )
            }
            None => (400, "Bad Request", json!({ "amount": ["A valid number is required."] })),
        }
    } else if path == endpoints.transfer {
        let sender = text("email");
        match amount() {
            Some(amount) if amount <= state.balance(&sender) => {
                state.adjust(&sender, -amount);
                state.adjust(&text("receiver"), amount);
                (
                    200,
                    "OK",
                    json!({
                        "amount": amount.to_string(),
                        "trans_id": state.trans_id(),
                        "time_stamp": "2026-01-01T12:00:00Z",
                    }),
                )
            }
            Some(_) => (400, "Bad Request", json!({ "detail": "Insufficient funds." })),
            None => (400, "Bad Request", json!({ "amount": ["A valid number is required."] })),
        }
    } else {
        (404, "Not Found", json!({ "detail": "Not found." }))
    };

    send_response(&mut stream, status, reason, &response.to_string());
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
