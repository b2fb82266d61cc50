use resp_store::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_del_command() {
    let env = TestEnv::new();

    env.exec_command_success_response(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_command_success_response(
        TestUtils::rpush_command("fruits", &["apple", "pear"]),
        &TestUtils::expected_integer(2),
    )
    .await;

    env.exec_command_success_response(
        TestUtils::xadd_command("sensor", "1-1", &["temperature", "36"]),
        &TestUtils::expected_bulk_string("1-1"),
    )
    .await;

    env.exec_command_success_response(
        TestUtils::del_command(&["grape", "fruits", "sensor", "missing"]),
        &TestUtils::expected_integer(3),
    )
    .await;

    assert!(env.get_store().await.is_empty());
}

#[tokio::test]
async fn test_handle_del_command_is_idempotent() {
    let env = TestEnv::new();

    env.exec_command_success_response(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let test_cases = vec![1, 0, 0];

    for expected in test_cases {
        env.exec_command_success_response(
            TestUtils::del_command(&["grape"]),
            &TestUtils::expected_integer(expected),
        )
        .await;
    }

    env.exec_command_success_response(TestUtils::get_command("grape"), &TestUtils::expected_null())
        .await;
}

#[tokio::test]
async fn test_handle_del_command_invalid() {
    let env = TestEnv::new();

    env.exec_command_error_response(
        TestUtils::del_command(&[]),
        CommandError::WrongNumberOfArguments("del".to_string()),
    )
    .await;
}
