// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use mini_pgw::cfg::enums::{DrainAuditEvent, DuplicatePolicy};

use crate::integration_tests::common::Harness;

#[tokio::test]
async fn duplicate_registration_under_refresh_policy_renews_the_session() {
    let harness = Harness::start_with_policy(
        Vec::new(),
        60,
        10,
        DuplicatePolicy::Refresh,
        DrainAuditEvent::Delete,
    )
    .await
    .expect("start server");

    let first = harness
        .register("222222222222222")
        .await
        .expect("send first registration")
        .expect("reply within timeout");
    assert_eq!(first, "created");

    let second = harness
        .register("222222222222222")
        .await
        .expect("send second registration")
        .expect("reply within timeout");
    assert_eq!(second, "refreshed");

    assert_eq!(
        harness.check_subscriber("222222222222222").await.expect("check"),
        "active"
    );

    let lines = harness.audit_lines();
    assert_eq!(lines.iter().filter(|l| l.ends_with(",222222222222222,create")).count(), 1);
    assert_eq!(lines.iter().filter(|l| l.ends_with(",222222222222222,renew")).count(), 1);

    harness.stop().await.expect("stop");
    harness.join().await.expect("clean shutdown");
}
