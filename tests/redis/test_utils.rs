use std::{net::SocketAddr, sync::Arc, time::Duration};

use bytes::BytesMut;
use resp_store::{
    commands::{CommandError, CommandHandler},
    input::read_resp_frame,
    key_value_store::KeyValueStore,
    resp::RespValue,
    server::serve,
};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    sync::Mutex,
    task::JoinHandle,
    time::timeout,
};

/// Test utilities for simplifying command tests
pub struct TestUtils;

/// Test environment containing the store shared by all simulated clients
pub struct TestEnv {
    pub store: Arc<Mutex<KeyValueStore>>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(KeyValueStore::new())),
        }
    }

    /// Clone the environment, sharing the same store
    pub fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }

    /// Execute a command and return the result
    pub async fn exec_command(&self, command: RespValue) -> Result<RespValue, CommandError> {
        let command_handler = CommandHandler::new(command)?;

        command_handler.handle_command(Arc::clone(&self.store)).await
    }

    /// Execute a command and assert it succeeds with the expected encoded reply
    pub async fn exec_command_success_response(&self, command: RespValue, expected_response: &str) {
        let description = format!("{:?}", command);
        let result = self.exec_command(command).await;

        match result {
            Ok(response) => assert_eq!(
                response.encode(),
                expected_response,
                "executing {}",
                description
            ),
            Err(e) => panic!("Expected {} to succeed, got {:?}", description, e),
        }
    }

    /// Execute a command and assert it fails with the expected error
    pub async fn exec_command_error_response(
        &self,
        command: RespValue,
        expected_error: CommandError,
    ) {
        let description = format!("{:?}", command);
        let result = self.exec_command(command).await;

        assert_eq!(result, Err(expected_error), "executing {}", description);
    }

    /// Get a reference to the store for inspection
    pub async fn get_store(&self) -> tokio::sync::MutexGuard<'_, KeyValueStore> {
        self.store.lock().await
    }
}

impl TestUtils {
    /// Create a command from its name and arguments
    pub fn command(parts: &[&str]) -> RespValue {
        RespValue::Array(
            parts
                .iter()
                .map(|part| RespValue::BulkString(part.to_string()))
                .collect(),
        )
    }

    fn command_with_values(name: &str, key: &str, values: &[&str]) -> RespValue {
        let mut parts = vec![name, key];
        parts.extend_from_slice(values);

        Self::command(&parts)
    }

    /// Create a PING command
    pub fn ping_command() -> RespValue {
        Self::command(&["PING"])
    }

    /// Create an ECHO command
    pub fn echo_command(messages: &[&str]) -> RespValue {
        let mut parts = vec!["ECHO"];
        parts.extend_from_slice(messages);

        Self::command(&parts)
    }

    /// Create a GET command
    pub fn get_command(key: &str) -> RespValue {
        Self::command(&["GET", key])
    }

    /// Create a SET command
    pub fn set_command(key: &str, value: &str) -> RespValue {
        Self::command(&["SET", key, value])
    }

    /// Create a SET command with expiration
    pub fn set_command_with_expiration(key: &str, value: &str, expiration_ms: u64) -> RespValue {
        Self::command(&["SET", key, value, "px", &expiration_ms.to_string()])
    }

    /// Create a DEL command
    pub fn del_command(keys: &[&str]) -> RespValue {
        let mut parts = vec!["DEL"];
        parts.extend_from_slice(keys);

        Self::command(&parts)
    }

    /// Create an RPUSH command with multiple values
    pub fn rpush_command(key: &str, values: &[&str]) -> RespValue {
        Self::command_with_values("RPUSH", key, values)
    }

    /// Create an LPUSH command with multiple values
    pub fn lpush_command(key: &str, values: &[&str]) -> RespValue {
        Self::command_with_values("LPUSH", key, values)
    }

    /// Create an LLEN command
    pub fn llen_command(key: &str) -> RespValue {
        Self::command(&["LLEN", key])
    }

    /// Create an LRANGE command
    pub fn lrange_command(key: &str, start: i64, stop: i64) -> RespValue {
        Self::command(&["LRANGE", key, &start.to_string(), &stop.to_string()])
    }

    /// Create an LPOP command
    pub fn lpop_command(key: &str) -> RespValue {
        Self::command(&["LPOP", key])
    }

    /// Create an LPOP command for multiple items
    pub fn lpop_command_multiple_items(key: &str, count: &str) -> RespValue {
        Self::command(&["LPOP", key, count])
    }

    /// Create an RPOP command
    pub fn rpop_command(key: &str) -> RespValue {
        Self::command(&["RPOP", key])
    }

    /// Create an RPOP command for multiple items
    pub fn rpop_command_multiple_items(key: &str, count: &str) -> RespValue {
        Self::command(&["RPOP", key, count])
    }

    /// Create a BLPOP command
    pub fn blpop_command(key: &str, timeout_seconds: &str) -> RespValue {
        Self::command(&["BLPOP", key, timeout_seconds])
    }

    /// Create a TYPE command
    pub fn type_command(key: &str) -> RespValue {
        Self::command(&["TYPE", key])
    }

    /// Create an XADD command
    pub fn xadd_command(key: &str, stream_id: &str, entries: &[&str]) -> RespValue {
        let mut parts = vec!["XADD", key, stream_id];
        parts.extend_from_slice(entries);

        Self::command(&parts)
    }

    /// Create an XRANGE command
    pub fn xrange_command(key: &str, start_stream_id: &str, end_stream_id: &str) -> RespValue {
        Self::command(&["XRANGE", key, start_stream_id, end_stream_id])
    }

    /// Create an XREAD command
    pub fn xread_command(keys: &[&str], start_stream_ids: &[&str]) -> RespValue {
        let mut parts = vec!["XREAD", "STREAMS"];
        parts.extend_from_slice(keys);
        parts.extend_from_slice(start_stream_ids);

        Self::command(&parts)
    }

    /// Spawn a BLPOP task that blocks on the given key
    pub fn spawn_blpop_task(
        env: &TestEnv,
        key: &str,
        timeout_seconds: &str,
    ) -> JoinHandle<Result<RespValue, CommandError>> {
        let env = env.clone();
        let blpop_command = Self::blpop_command(key, timeout_seconds);

        tokio::spawn(async move { env.exec_command(blpop_command).await })
    }

    /// Wait for a task with timeout and return its encoded reply
    pub async fn wait_for_completion(
        task: JoinHandle<Result<RespValue, CommandError>>,
        timeout_duration: Duration,
    ) -> Result<String, CommandError> {
        timeout(timeout_duration, task)
            .await
            .expect("Task should complete within timeout")
            .expect("Task should not panic")
            .map(|response| response.encode())
    }

    /// Create expected bulk string response
    pub fn expected_bulk_string(value: &str) -> String {
        format!("${}\r\n{}\r\n", value.len(), value)
    }

    /// Create expected integer response
    pub fn expected_integer(value: i64) -> String {
        format!(":{}\r\n", value)
    }

    /// Create expected simple string response
    pub fn expected_simple_string(value: &str) -> String {
        format!("+{}\r\n", value)
    }

    /// Create expected error response
    pub fn expected_error(message: &str) -> String {
        format!("-{}\r\n", message)
    }

    /// Create expected null bulk string response
    pub fn expected_null() -> String {
        "$-1\r\n".to_string()
    }

    /// Create expected null array response
    pub fn expected_null_array() -> String {
        "*-1\r\n".to_string()
    }

    /// Create expected bulk string array response
    pub fn expected_bulk_string_array(items: &[&str]) -> String {
        RespValue::encode_array_from_strings(items.iter().map(|item| item.to_string()).collect())
    }

    /// Create expected `[[id, [field, value, ...]], ...]` stream entries
    pub fn expected_stream_entries(entries: &[(&str, &[&str])]) -> RespValue {
        RespValue::Array(
            entries
                .iter()
                .map(|(id, fields)| {
                    RespValue::Array(vec![
                        RespValue::BulkString(id.to_string()),
                        RespValue::Array(
                            fields
                                .iter()
                                .map(|field| RespValue::BulkString(field.to_string()))
                                .collect(),
                        ),
                    ])
                })
                .collect(),
        )
    }

    /// Async sleep helper
    pub async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Start a server on a free local port and return its address
    pub async fn start_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(serve(listener, Arc::new(Mutex::new(KeyValueStore::new()))));

        address
    }

    /// Send raw bytes and read back one reply
    pub async fn send_bytes_and_receive(
        client: &mut TcpStream,
        buffer: &mut BytesMut,
        bytes: &[u8],
    ) -> RespValue {
        client.write_all(bytes).await.unwrap();
        client.flush().await.unwrap();

        timeout(Duration::from_secs(3), read_resp_frame(client, buffer))
            .await
            .expect("Reply should arrive within timeout")
            .expect("Reply should be a valid frame")
    }

    /// Send a command and read back one reply
    pub async fn send_command_and_receive(
        client: &mut TcpStream,
        buffer: &mut BytesMut,
        command: RespValue,
    ) -> RespValue {
        Self::send_bytes_and_receive(client, buffer, command.encode().as_bytes()).await
    }
}
