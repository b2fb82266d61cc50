use bytes::BytesMut;
use resp_store::resp::RespValue;
use tokio::{io::AsyncWriteExt, net::TcpStream};

use crate::test_utils::TestUtils;

#[tokio::test]
async fn test_serve_commands_over_tcp() {
    let address = TestUtils::start_server().await;
    let mut client = TcpStream::connect(address).await.unwrap();
    let mut buffer = BytesMut::new();

    let test_cases = vec![
        (
            TestUtils::ping_command(),
            RespValue::SimpleString("PONG".to_string()),
        ),
        (
            TestUtils::set_command("foo", "123"),
            RespValue::SimpleString("OK".to_string()),
        ),
        (
            TestUtils::get_command("foo"),
            RespValue::BulkString("123".to_string()),
        ),
        (
            TestUtils::command(&["FLUSHALL"]),
            RespValue::Error("ERR unknown command".to_string()),
        ),
        (
            TestUtils::command(&["GET"]),
            RespValue::Error("ERR wrong number of arguments for 'get' command".to_string()),
        ),
        (
            TestUtils::lpop_command("foo"),
            RespValue::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
            ),
        ),
    ];

    for (command, expected_response) in test_cases {
        let description = format!("{:?}", command);

        assert_eq!(
            TestUtils::send_command_and_receive(&mut client, &mut buffer, command).await,
            expected_response,
            "sending {}",
            description
        );
    }
}

#[tokio::test]
async fn test_serve_pipelined_and_split_frames() {
    let address = TestUtils::start_server().await;
    let mut client = TcpStream::connect(address).await.unwrap();
    let mut buffer = BytesMut::new();

    let pipelined = [
        TestUtils::rpush_command("list", &["a", "b"]).encode(),
        TestUtils::llen_command("list").encode(),
    ]
    .concat();

    assert_eq!(
        TestUtils::send_bytes_and_receive(&mut client, &mut buffer, pipelined.as_bytes()).await,
        RespValue::Integer(2)
    );
    assert_eq!(
        TestUtils::send_bytes_and_receive(&mut client, &mut buffer, b"").await,
        RespValue::Integer(2)
    );

    let frame = TestUtils::echo_command(&["mango"]).encode();
    let (head, tail) = frame.as_bytes().split_at(7);

    client.write_all(head).await.unwrap();
    client.flush().await.unwrap();
    TestUtils::sleep_ms(20).await;

    assert_eq!(
        TestUtils::send_bytes_and_receive(&mut client, &mut buffer, tail).await,
        RespValue::BulkString("mango".to_string())
    );
}

#[tokio::test]
async fn test_connection_survives_protocol_errors() {
    let address = TestUtils::start_server().await;
    let mut client = TcpStream::connect(address).await.unwrap();
    let mut buffer = BytesMut::new();

    let response =
        TestUtils::send_bytes_and_receive(&mut client, &mut buffer, b"*1\r\n$x\r\nPING\r\n").await;
    assert_eq!(
        response,
        RespValue::Error("ERR Protocol error: invalid integer 'x'".to_string())
    );

    assert_eq!(
        TestUtils::send_bytes_and_receive(&mut client, &mut buffer, b"~1\r\n").await,
        RespValue::Error("ERR not implemented".to_string())
    );

    assert_eq!(
        TestUtils::send_command_and_receive(&mut client, &mut buffer, TestUtils::ping_command())
            .await,
        RespValue::SimpleString("PONG".to_string())
    );
}

#[tokio::test]
async fn test_blpop_wakes_client_on_another_connection() {
    let address = TestUtils::start_server().await;
    let mut blocked_client = TcpStream::connect(address).await.unwrap();
    let mut pushing_client = TcpStream::connect(address).await.unwrap();

    let blocked = tokio::spawn(async move {
        let mut buffer = BytesMut::new();
        TestUtils::send_command_and_receive(
            &mut blocked_client,
            &mut buffer,
            TestUtils::blpop_command("queue", "0"),
        )
        .await
    });

    TestUtils::sleep_ms(50).await;

    let mut buffer = BytesMut::new();
    assert_eq!(
        TestUtils::send_command_and_receive(
            &mut pushing_client,
            &mut buffer,
            TestUtils::rpush_command("queue", &["job"]),
        )
        .await,
        RespValue::Integer(1)
    );

    assert_eq!(
        blocked.await.unwrap(),
        RespValue::Array(vec![
            RespValue::BulkString("queue".to_string()),
            RespValue::BulkString("job".to_string()),
        ])
    );
}

#[tokio::test]
async fn test_blpop_from_disconnected_client_leaves_element_in_list() {
    let address = TestUtils::start_server().await;
    let mut gone_client = TcpStream::connect(address).await.unwrap();
    let mut pushing_client = TcpStream::connect(address).await.unwrap();
    let mut buffer = BytesMut::new();

    gone_client
        .write_all(TestUtils::blpop_command("jobs", "0").encode().as_bytes())
        .await
        .unwrap();
    gone_client.flush().await.unwrap();
    TestUtils::sleep_ms(50).await;

    drop(gone_client);
    TestUtils::sleep_ms(50).await;

    assert_eq!(
        TestUtils::send_command_and_receive(
            &mut pushing_client,
            &mut buffer,
            TestUtils::rpush_command("jobs", &["job1"]),
        )
        .await,
        RespValue::Integer(1)
    );
    assert_eq!(
        TestUtils::send_command_and_receive(
            &mut pushing_client,
            &mut buffer,
            TestUtils::lrange_command("jobs", 0, -1),
        )
        .await,
        RespValue::Array(vec![RespValue::BulkString("job1".to_string())])
    );
}

#[tokio::test]
async fn test_commands_sent_while_blocked_are_answered_after_wake() {
    let address = TestUtils::start_server().await;
    let mut blocked_client = TcpStream::connect(address).await.unwrap();
    let mut pushing_client = TcpStream::connect(address).await.unwrap();

    let pipelined = [
        TestUtils::blpop_command("queue", "0").encode(),
        TestUtils::ping_command().encode(),
    ]
    .concat();

    let blocked = tokio::spawn(async move {
        let mut buffer = BytesMut::new();
        let popped =
            TestUtils::send_bytes_and_receive(&mut blocked_client, &mut buffer, pipelined.as_bytes())
                .await;
        let pong = TestUtils::send_bytes_and_receive(&mut blocked_client, &mut buffer, b"").await;

        (popped, pong)
    });

    TestUtils::sleep_ms(50).await;

    let mut buffer = BytesMut::new();
    assert_eq!(
        TestUtils::send_command_and_receive(
            &mut pushing_client,
            &mut buffer,
            TestUtils::rpush_command("queue", &["job"]),
        )
        .await,
        RespValue::Integer(1)
    );

    assert_eq!(
        blocked.await.unwrap(),
        (
            RespValue::Array(vec![
                RespValue::BulkString("queue".to_string()),
                RespValue::BulkString("job".to_string()),
            ]),
            RespValue::SimpleString("PONG".to_string())
        )
    );
}
