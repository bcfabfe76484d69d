// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use crate::integration_tests::common::Harness;

#[tokio::test]
async fn idle_session_is_reaped_after_timeout() {
    let harness = Harness::start(Vec::new(), 2, 10).await.expect("start server");

    let reply = harness
        .register("001010123456789")
        .await
        .expect("send registration")
        .expect("reply within timeout");
    assert_eq!(reply, "created");
    assert_eq!(
        harness.check_subscriber("001010123456789").await.expect("check"),
        "active"
    );

    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(
        harness.check_subscriber("001010123456789").await.expect("check"),
        "not active"
    );
    let lines = harness.audit_lines();
    assert!(lines.iter().any(|l| l.ends_with(",001010123456789,delete")));

    harness.stop().await.expect("stop");
    harness.join().await.expect("clean shutdown");
}
