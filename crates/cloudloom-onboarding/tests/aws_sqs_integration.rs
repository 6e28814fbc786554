//! SQS integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_sqs_integration -- --ignored
//! ```


use aws_test_helpers::*;
use cloudloom_onboarding::aws::AwsContext;
use cloudloom_onboarding::aws::sqs::SqsClient;

/// Test queue create, send, receive and delete lifecycle
#[tokio::test]
#[ignore]
async fn test_queue_message_lifecycle() {
    let region = get_test_region();
    let ctx = AwsContext::new(&region).await;
    let client = SqsClient::from_context(&ctx);

    let queue_name = format!("cloudloom-it-{}", test_run_id());
    let url = client
        .create_queue(&queue_name)
        .await
        .expect("AWS credentials required - set AWS_PROFILE or AWS_ACCESS_KEY_ID");

    // Lookup by name resolves the same queue
    let found = client.queue_url(&queue_name).await.expect("Should look up queue");
    assert_eq!(found.as_deref(), Some(url.as_str()));

    let attributes = client
        .queue_attributes(&url)
        .await
        .expect("Should read queue attributes");
    assert!(attributes.arn.ends_with(&queue_name));

    client
        .send_message(&url, "{\"source\":\"cloudloom.test\"}")
        .await
        .expect("Should send message");

    let messages = client
        .receive_messages(&url, 10, 10)
        .await
        .expect("Should receive message");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].body.contains("cloudloom.test"));

    client
        .delete_message(&url, &messages[0].receipt_handle)
        .await
        .expect("Should delete message");

    ctx.sqs_client()
        .delete_queue()
        .queue_url(&url)
        .send()
        .await
        .expect("Should delete queue");
}

/// Looking up a missing queue is not an error
#[tokio::test]
#[ignore]
async fn test_missing_queue_is_none() {
    let region = get_test_region();
    let ctx = AwsContext::new(&region).await;
    let client = SqsClient::from_context(&ctx);

    let name = format!("cloudloom-missing-{}", test_run_id());
    let url = client.queue_url(&name).await.expect("Lookup should succeed");
    assert!(url.is_none());
}
