use std::path::Path;
use std::process::Output;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::process::Command;

use upilink::bank::{
    CardKind, CardRequest, Credentials, DepositRequest, NewAccount, TransferRequest,
    UpiPaymentRequest,
};
use upilink::{Amount, BankApi, Error, HttpBank, PaySubmitter, PaymentIntent, Session};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    body: String,
}

impl Recorded {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

type Reply = (u16, &'static str, String);
type Handler = Arc<dyn Fn(&str, &str) -> Reply + Send + Sync>;

fn json_reply(value: Value) -> Reply {
    (200, "application/json", value.to_string())
}

/// Minimal HTTP/1.1 backend: one request per connection, canned replies.
async fn spawn_backend<F>(respond: F) -> (String, Arc<Mutex<Vec<Recorded>>>)
where
    F: Fn(&str, &str) -> Reply + Send + Sync + 'static,
{
    let handler: Handler = Arc::new(respond);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let log = Arc::new(Mutex::new(Vec::new()));

    let recorded = Arc::clone(&log);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let handler = Arc::clone(&handler);
            let recorded = Arc::clone(&recorded);
            tokio::spawn(async move {
                serve_one(stream, handler, recorded).await;
            });
        }
    });

    (format!("http://{addr}/api"), log)
}

async fn serve_one(mut stream: TcpStream, handler: Handler, log: Arc<Mutex<Vec<Recorded>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.expect("read request");
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.expect("read body");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("").to_string();
    let path = request_line.next().unwrap_or("").to_string();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let (status, content_type, reply) = handler(&method, &path);
    log.lock().unwrap().push(Recorded { method, path, body });

    let response = format!(
        "HTTP/1.1 {status} X\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
        reply.len()
    );
    stream
        .write_all(response.as_bytes())
        .await
        .expect("write response");
    let _ = stream.shutdown().await;
}

fn account_json(balance: f64) -> Value {
    json!({
        "accNo": 1001,
        "name": "Amit Sharma",
        "balance": balance,
        "passwordHash": "ignored",
        "transactions": [
            {"date": "2024-05-01 09:30", "type": "OPEN", "amount": 5000.0, "balanceAfter": 5000.0, "note": "Account opened"}
        ],
        "cards": []
    })
}

#[tokio::test]
async fn customer_login_yields_explicit_session() {
    let (base, log) = spawn_backend(|_, _| {
        json_reply(json!({"status": "ok", "account": account_json(5000.0)}))
    })
    .await;
    let bank = HttpBank::new(&base).unwrap();

    let session = bank
        .login(&Credentials::Customer {
            acc_no: 1001,
            password: "pass123".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        session,
        Session::Customer {
            acc_no: 1001,
            name: Some("Amit Sharma".to_string())
        }
    );

    let requests = log.lock().unwrap();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/login");
    assert_eq!(
        requests[0].json(),
        json!({"role": "customer", "accNo": 1001, "password": "pass123"})
    );
}

#[tokio::test]
async fn failed_login_surfaces_server_message() {
    let (base, _log) = spawn_backend(|_, _| {
        json_reply(json!({"status": "error", "message": "invalid_admin_credentials"}))
    })
    .await;
    let bank = HttpBank::new(&base).unwrap();

    let err = bank
        .login(&Credentials::Admin {
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Backend(_)));
    assert_eq!(err.user_message(), "invalid_admin_credentials");
}

#[tokio::test]
async fn upi_payment_posts_intent_fields() {
    let (base, log) = spawn_backend(|_, _| {
        json_reply(json!({"status": "ok", "balance": 4990.0}))
    })
    .await;
    let bank = HttpBank::new(&base).unwrap();

    let reply = bank
        .pay_upi(
            1001,
            &UpiPaymentRequest {
                upi_id: "merchant@bank".to_string(),
                amount: Amount::from_major(10),
                note: Some("lunch".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(reply.balance, Some(4990.0));

    let requests = log.lock().unwrap();
    assert_eq!(requests[0].path, "/api/accounts/1001/upi");
    assert_eq!(
        requests[0].json(),
        json!({"upiId": "merchant@bank", "amount": 10.0, "note": "lunch"})
    );
}

#[tokio::test]
async fn business_failures_keep_message_or_fall_back() {
    let (base, _log) = spawn_backend(|_, path| {
        if path.ends_with("/upi") {
            json_reply(json!({"status": "error", "message": "insufficient"}))
        } else {
            json_reply(json!({"status": "error"}))
        }
    })
    .await;
    let bank = HttpBank::new(&base).unwrap();
    let request = UpiPaymentRequest {
        upi_id: "a@b".to_string(),
        amount: Amount::from_major(1_000_000),
        note: None,
    };

    let err = bank.pay_upi(1001, &request).await.unwrap_err();
    assert_eq!(err.user_message(), "insufficient");

    let err = bank
        .transfer(
            1001,
            &TransferRequest {
                target: 1002,
                amount: Amount::from_major(5),
                note: String::new(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Transfer failed");
}

#[tokio::test]
async fn error_status_without_message_uses_fallback() {
    let (base, _log) = spawn_backend(|_, path| {
        if path.ends_with("/upi") {
            (400, "application/json", json!({"status": "error"}).to_string())
        } else {
            (500, "application/json", json!({"detail": "boom"}).to_string())
        }
    })
    .await;
    let bank = HttpBank::new(&base).unwrap();
    let request = UpiPaymentRequest {
        upi_id: "a@b".to_string(),
        amount: Amount::from_major(1),
        note: None,
    };

    let err = bank.pay_upi(1001, &request).await.unwrap_err();
    assert!(matches!(err, Error::Backend(ref m) if m == "Payment failed"));

    let err = bank.list_accounts().await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedResponse(_)));
}

#[tokio::test]
async fn account_documents_and_error_envelopes() {
    let (base, _log) = spawn_backend(|_, path| match path {
        "/api/accounts" => json_reply(json!([
            {"accNo": 1001, "name": "Amit Sharma", "balance": 5000.0},
            {"accNo": 1002, "name": "Neha Verma", "balance": 8000.0}
        ])),
        "/api/accounts/1001" => json_reply(account_json(5000.0)),
        _ => json_reply(json!({"status": "error", "message": "not_found"})),
    })
    .await;
    let bank = HttpBank::new(&base).unwrap();

    let accounts = bank.list_accounts().await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[1].name, "Neha Verma");

    let account = bank.account(1001).await.unwrap();
    assert_eq!(account.transactions.len(), 1);
    assert_eq!(account.transactions[0].kind, "OPEN");

    let err = bank.account(9999).await.unwrap_err();
    assert!(matches!(err, Error::Backend(ref m) if m == "not_found"));
}

#[tokio::test]
async fn statement_is_returned_as_csv_text() {
    let (base, _log) = spawn_backend(|_, path| {
        if path == "/api/accounts/1001/statement" {
            (
                200,
                "text/csv",
                "date,type,amount,balanceAfter,note\n\"2024-05-01 09:30\",OPEN,5000.00,5000.00,\"Account opened\"\n"
                    .to_string(),
            )
        } else {
            (200, "text/plain", "Account not found".to_string())
        }
    })
    .await;
    let bank = HttpBank::new(&base).unwrap();

    let csv = bank.statement(1001).await.unwrap();
    assert!(csv.starts_with("date,type,amount,balanceAfter,note"));
    assert_eq!(csv.lines().count(), 2);

    let err = bank.statement(4242).await.unwrap_err();
    assert_eq!(err.user_message(), "Account not found");
}

#[tokio::test]
async fn admin_and_card_operations_send_expected_bodies() {
    let (base, log) = spawn_backend(|method, path| match (method, path) {
        ("POST", "/api/accounts") => {
            json_reply(json!({"status": "ok", "account": {"accNo": 4321, "name": "Ravi", "balance": 100.0}}))
        }
        ("DELETE", _) => json_reply(json!({"status": "ok"})),
        ("POST", "/api/accounts/1001/deposit") => json_reply(json!({"status": "ok", "balance": 5250.0})),
        ("POST", "/api/accounts/1001/cards") => json_reply(json!({
            "status": "ok",
            "card": {"id": "c9", "masked": "**** **** **** 9876", "number": "4111111111119876", "expiry": "05/29", "cvv": "321", "type": "CREDIT", "status": "ACTIVE"}
        })),
        ("GET", "/api/accounts/1001/cards") => json_reply(json!([])),
        _ => (404, "application/json", json!({"status": "error", "message": "no route"}).to_string()),
    })
    .await;
    let bank = HttpBank::new(&base).unwrap();

    let account = bank
        .create_account(&NewAccount {
            name: "Ravi".to_string(),
            balance: Amount::from_major(100),
            password: None,
        })
        .await
        .unwrap();
    assert_eq!(account.acc_no, 4321);

    bank.delete_account(4321).await.unwrap();

    let reply = bank
        .deposit(1001, &DepositRequest { amount: Amount::from_minor(25000) })
        .await
        .unwrap();
    assert_eq!(reply.balance, Some(5250.0));

    let card = bank
        .request_card(1001, &CardRequest { kind: CardKind::Credit })
        .await
        .unwrap();
    assert_eq!(card.masked, "**** **** **** 9876");
    assert!(bank.cards(1001).await.unwrap().is_empty());

    let err = bank.health().await.unwrap_err();
    assert_eq!(err.user_message(), "no route");

    let requests = log.lock().unwrap();
    assert_eq!(requests[0].json(), json!({"name": "Ravi", "balance": 100.0}));
    assert_eq!(requests[1].method, "DELETE");
    assert_eq!(requests[1].path, "/api/accounts/4321");
    assert_eq!(requests[2].json(), json!({"amount": 250.0}));
    assert_eq!(requests[3].json(), json!({"type": "CREDIT"}));
}

#[tokio::test]
async fn unreadable_replies_are_transport_failures() {
    let (base, _log) = spawn_backend(|_, _| {
        (200, "text/html", "<html>proxy error</html>".to_string())
    })
    .await;
    let bank = HttpBank::new(&base).unwrap();

    let err = bank.list_accounts().await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedResponse(_)));
    assert_eq!(err.user_message(), "Network or server error");
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let bank = HttpBank::new(&format!("http://{addr}/api")).unwrap();
    let err = bank.health().await.unwrap_err();

    assert!(matches!(err, Error::Network(_)));
    assert_eq!(err.user_message(), "Network or server error");
}

#[tokio::test]
async fn pay_submitter_reports_refreshed_balance() {
    let (base, log) = spawn_backend(|_, path| {
        if path.ends_with("/upi") {
            json_reply(json!({"status": "ok", "balance": 4990.0}))
        } else {
            json_reply(account_json(4990.0))
        }
    })
    .await;
    let bank = Arc::new(HttpBank::new(&base).unwrap());
    let submitter = PaySubmitter::new(bank);
    let session = Session::Customer {
        acc_no: 1001,
        name: None,
    };
    let intent = PaymentIntent::new("merchant@bank")
        .unwrap()
        .with_amount(Amount::parse("10").unwrap())
        .with_note("lunch");

    let receipt = submitter.submit(&session, &intent).await.unwrap();
    assert_eq!(receipt.message, "Payment successful");
    assert_eq!(receipt.balance, Some(4990.0));
    assert_eq!(
        receipt.uri,
        "upi://pay?pa=merchant%40bank&am=10.00&tn=lunch&cu=INR"
    );

    let requests = log.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/api/accounts/1001/upi");
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].path, "/api/accounts/1001");
}

/// Run the `upilink` binary against `base` from an isolated working directory.
async fn run_cli(base: &str, dir: &Path, args: &[&str], envs: &[(&str, &Path)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_upilink"));
    command
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("UPILINK_PASSWORD")
        .env_remove("UPILINK_ADMIN_PASSWORD")
        .env_remove("UPILINK_API_URL")
        .env_remove("UPILINK_LOG_FILE")
        .arg("--api")
        .arg(base)
        .args(args);
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().await.expect("run upilink")
}

#[tokio::test]
async fn pay_keeps_receipt_when_qr_export_fails() {
    let (base, log) = spawn_backend(|_, path| match path {
        "/api/login" => json_reply(json!({"status": "ok", "account": account_json(5000.0)})),
        "/api/accounts/1001/upi" => json_reply(json!({"status": "ok"})),
        _ => json_reply(account_json(4990.0)),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let not_a_dir = dir.path().join("occupied");
    std::fs::write(&not_a_dir, b"file").unwrap();

    let output = run_cli(
        &base,
        dir.path(),
        &[
            "pay", "--account", "1001", "--password", "pass123", "--upi-id", "merchant@bank",
            "--amount", "10", "--export",
        ],
        &[("UPILINK_EXPORT_DIR", not_a_dir.as_path())],
    )
    .await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Payment successful"));
    assert!(stdout.contains("New balance: ₹4990.00"));
    assert!(stdout.contains("QR not saved"));

    let paths: Vec<String> = log.lock().unwrap().iter().map(|r| r.path.clone()).collect();
    assert_eq!(
        paths,
        ["/api/login", "/api/accounts/1001/upi", "/api/accounts/1001"]
    );
}

#[tokio::test]
async fn pay_exports_confirmed_qr() {
    let (base, _log) = spawn_backend(|_, path| match path {
        "/api/login" => json_reply(json!({"status": "ok", "account": account_json(5000.0)})),
        "/api/accounts/1001/upi" => json_reply(json!({"status": "ok"})),
        _ => json_reply(account_json(4990.0)),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let export_dir = dir.path().join("qr");

    let output = run_cli(
        &base,
        dir.path(),
        &[
            "--json", "pay", "--account", "1001", "--password", "pass123", "--upi-id",
            "merchant@bank", "--amount", "10",
            "--export",
        ],
        &[("UPILINK_EXPORT_DIR", export_dir.as_path())],
    )
    .await;

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["receipt"]["message"], "Payment successful");
    assert!(value["export"]["path"].is_string());
    assert!(export_dir.join("upi_dynamic.png").exists());
}

#[tokio::test]
async fn admin_views_any_account() {
    let (base, log) = spawn_backend(|method, path| match (method, path) {
        ("POST", "/api/login") => json_reply(json!({"status": "ok", "role": "admin"})),
        ("GET", "/api/accounts/1001") => json_reply(account_json(5000.0)),
        _ => (404, "application/json", json!({"status": "error", "message": "no route"}).to_string()),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(
        &base,
        dir.path(),
        &["accounts", "view", "1001", "--admin-password", "admin123"],
        &[],
    )
    .await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.starts_with("Admin"));
    assert!(stdout.contains("Account 1001 - Amit Sharma"));
    assert!(stdout.contains("Account opened"));

    let requests = log.lock().unwrap();
    assert_eq!(
        requests[0].json(),
        json!({"role": "admin", "password": "admin123"})
    );
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].path, "/api/accounts/1001");
}
