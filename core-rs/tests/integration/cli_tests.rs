//! Integration tests for the portserve binary

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_portserve");

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn wait_for_listener(port: u16) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if std::net::TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}

#[test]
fn test_cli_version_output() {
    let output = Command::new(BIN).arg("--version").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("portserve"));
}

#[test]
fn test_probe_occupied_exits_1() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let output = Command::new(BIN)
        .args(["probe", "--port", &port.to_string()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("Port {} is already in use", port)));
}

#[test]
fn test_probe_free_exits_0() {
    let port = free_port();

    let output = Command::new(BIN)
        .args(["probe", "--port", &port.to_string()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("Port {} is available", port)));
}

#[test]
fn test_probe_json_output() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let output = Command::new(BIN)
        .args(["probe", "--format", "json", "--port", &port.to_string()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["outcome"], "occupied");
    assert_eq!(report["port"], port);
    assert_eq!(report["host"], "127.0.0.1");
}

#[test]
fn test_probe_zero_timeout_is_config_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    for format in ["text", "json"] {
        let output = Command::new(BIN)
            .args(["probe", "--format", format, "--probe-timeout", "0", "--port", &port.to_string()])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(2), "format {}", format);
        assert!(output.stdout.is_empty());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("probeTimeoutSecs must be greater than 0"));
    }
}

#[test]
fn test_probe_port_zero_is_config_error() {
    let output = Command::new(BIN)
        .args(["probe", "--port", "0"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid port: 0"));
}

#[test]
fn test_serve_on_occupied_port_exits_1() {
    let dir = TempDir::new().unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let output = Command::new(BIN)
        .args(["--port", &port.to_string()])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("already in use"));
    assert!(!stdout.contains("server started"));
}

#[test]
fn test_serve_missing_root_exits_2() {
    let dir = TempDir::new().unwrap();
    let port = free_port();

    let output = Command::new(BIN)
        .args(["serve", "--port", &port.to_string(), "--root"])
        .arg(dir.path().join("missing"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Root directory not found"));
}

#[test]
fn test_serve_config_file_is_honoured() {
    let dir = TempDir::new().unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let config_path = dir.path().join("portserve.yaml");
    std::fs::write(&config_path, format!("port: {}\nprobeTimeoutSecs: 1\n", port)).unwrap();

    let output = Command::new(BIN)
        .arg("--config")
        .arg(&config_path)
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_serve_answers_get_for_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("test.txt"), "served by the binary").unwrap();
    let port = free_port();

    let mut child = Command::new(BIN)
        .args(["--port", &port.to_string(), "--bind", "127.0.0.1"])
        .current_dir(dir.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    assert!(wait_for_listener(port), "server never started listening");

    let body = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            let response = reqwest::get(format!("http://127.0.0.1:{}/test.txt", port))
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 200);
            response.text().await.unwrap()
        });
    assert_eq!(body, "served by the binary");

    child.kill().unwrap();
    child.wait().unwrap();

    let mut stdout = String::new();
    child.stdout.take().unwrap().read_to_string(&mut stdout).unwrap();
    assert!(stdout.contains(&format!("Port {} is available", port)));
    assert!(stdout.contains(&format!("Test URL: http://localhost:{}", port)));
}
