// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::integration_tests::common::Harness;

#[tokio::test]
async fn denylisted_identity_is_rejected_and_not_audited() {
    let harness = Harness::start(vec!["999999999999999".to_string()], 60, 10)
        .await
        .expect("start server");

    let reply = harness
        .register("999999999999999")
        .await
        .expect("send registration")
        .expect("reply within timeout");
    assert_eq!(reply, "rejected");

    assert_eq!(
        harness.check_subscriber("999999999999999").await.expect("check"),
        "not active"
    );
    assert!(
        harness
            .audit_lines()
            .iter()
            .all(|l| !l.contains("999999999999999"))
    );

    harness.stop().await.expect("stop");
    harness.join().await.expect("clean shutdown");
}
