//! End-to-end ingestion pipeline scenarios.

mod common;

use common::{pom_xml, principal, upload, TestContext};
use pomindex::error::AppError;
use pomindex::models::upload::{FetchFlags, IgnoreReason, PublishOutcome};

const SCM: &str = "scm:git:git@github.com:acme/lib.git";
const POM_PATH: &str = "org/acme/lib/1.0.0/lib-1.0.0.pom";

#[tokio::test]
async fn owner_publish_is_indexed() {
    let ctx = TestContext::new().await;
    let pom = pom_xml("org.acme", "lib", "1.0.0", Some(SCM));

    let outcome = ctx
        .publisher
        .publish(upload(POM_PATH, &pom, principal("dev", false, &["acme/lib"])))
        .await
        .unwrap();

    assert!(matches!(outcome, PublishOutcome::Indexed { .. }));

    let project = ctx
        .index
        .find_project_by_reference("org.acme", "lib")
        .await
        .unwrap()
        .expect("project row");
    assert!(project.live_data);

    let releases = ctx
        .index
        .find_releases_by_project_reference("org.acme", "lib")
        .await
        .unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].version, "1.0.0");
    assert!(releases[0].live_data);
    assert_eq!(ctx.staged_file_count(), 0);
}

#[tokio::test]
async fn republish_same_release_does_not_duplicate() {
    let ctx = TestContext::new().await;
    let pom = pom_xml("org.acme", "lib", "1.0.0", Some(SCM));

    let mut first = upload(POM_PATH, &pom, principal("dev", false, &["acme/lib"]));
    first.keywords = vec!["json".into()];
    ctx.publisher.publish(first).await.unwrap();

    let mut second = upload(POM_PATH, &pom, principal("dev", false, &["acme/lib"]));
    second.keywords = vec!["parser".into(), "streaming".into()];
    ctx.publisher.publish(second).await.unwrap();

    let counts = ctx.index.counts().await.unwrap();
    assert_eq!(counts.projects, 1);
    assert_eq!(counts.releases, 1);

    // keywords reflect the last successfully indexed set
    let project = ctx
        .index
        .find_project_by_reference("org.acme", "lib")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(project.keywords, vec!["parser".to_string(), "streaming".to_string()]);
}

#[tokio::test]
async fn unauthorized_publish_is_rejected_without_side_effects() {
    let ctx = TestContext::new().await;
    let pom = pom_xml("org.acme", "lib", "1.0.0", Some(SCM));

    let err = ctx
        .publisher
        .publish(upload(POM_PATH, &pom, principal("stranger", false, &["other/repo"])))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Authorization(_)));
    let counts = ctx.index.counts().await.unwrap();
    assert_eq!(counts.projects, 0);
    assert_eq!(counts.releases, 0);
    assert_eq!(ctx.staged_file_count(), 0);
}

#[tokio::test]
async fn trusted_publisher_may_claim_any_repository() {
    let ctx = TestContext::new().await;
    let pom = pom_xml("org.acme", "lib", "1.0.0", Some(SCM));

    let outcome = ctx
        .publisher
        .publish(upload(POM_PATH, &pom, principal("registry-bot", true, &[])))
        .await
        .unwrap();

    assert!(matches!(outcome, PublishOutcome::Indexed { .. }));
}

#[tokio::test]
async fn non_pom_upload_is_accepted_and_ignored() {
    let ctx = TestContext::new().await;

    let outcome = ctx
        .publisher
        .publish(upload(
            "org/acme/lib/1.0.0/lib-1.0.0.jar",
            "not even xml",
            principal("dev", false, &[]),
        ))
        .await
        .unwrap();

    assert_eq!(outcome, PublishOutcome::Ignored(IgnoreReason::NotPom));
    let counts = ctx.index.counts().await.unwrap();
    assert_eq!(counts.projects, 0);
    assert_eq!(counts.releases, 0);
    assert_eq!(ctx.staged_file_count(), 0);
}

#[tokio::test]
async fn pom_without_scm_is_accepted_and_ignored() {
    let ctx = TestContext::new().await;
    let pom = pom_xml("org.acme", "lib", "1.0.0", None);

    let outcome = ctx
        .publisher
        .publish(upload(POM_PATH, &pom, principal("dev", false, &["acme/lib"])))
        .await
        .unwrap();

    assert_eq!(outcome, PublishOutcome::Ignored(IgnoreReason::NoRepository));
    let counts = ctx.index.counts().await.unwrap();
    assert_eq!(counts.projects, 0);
    assert_eq!(ctx.staged_file_count(), 0);
}

#[tokio::test]
async fn malformed_pom_is_rejected_and_cleaned_up() {
    let ctx = TestContext::new().await;

    let err = ctx
        .publisher
        .publish(upload(
            POM_PATH,
            "<project><groupId>org.acme",
            principal("dev", false, &["acme/lib"]),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Parse(_)));
    assert_eq!(ctx.staged_file_count(), 0);
}

#[tokio::test]
async fn enrichment_failure_never_affects_the_publish_outcome() {
    // The test context points enrichment at an unroutable host; turning all
    // fetches on must still yield an indexed publish.
    let ctx = TestContext::new().await;
    let pom = pom_xml("org.acme", "lib", "1.0.0", Some(SCM));

    let mut up = upload(POM_PATH, &pom, principal("dev", false, &["acme/lib"]));
    up.flags = FetchFlags {
        info: true,
        contributors: true,
        readme: true,
    };

    let outcome = ctx.publisher.publish(up).await.unwrap();
    assert!(matches!(outcome, PublishOutcome::Indexed { .. }));
}

#[tokio::test]
async fn concurrent_publishes_of_same_release_keep_one_row() {
    let ctx = TestContext::new().await;
    let pom = pom_xml("org.acme", "lib", "1.0.0", Some(SCM));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let publisher = ctx.publisher.clone();
        let up = upload(POM_PATH, &pom, principal("dev", false, &["acme/lib"]));
        handles.push(tokio::spawn(async move { publisher.publish(up).await }));
    }

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(matches!(outcome, PublishOutcome::Indexed { .. }));
    }

    let counts = ctx.index.counts().await.unwrap();
    assert_eq!(counts.projects, 1);
    assert_eq!(counts.releases, 1);
}

#[tokio::test]
async fn dependencies_are_recorded_for_new_releases() {
    let ctx = TestContext::new().await;
    let pom = format!(
        r#"<project>
  <groupId>org.acme</groupId>
  <artifactId>app_2.13</artifactId>
  <version>0.1.0</version>
  <scm><connection>{SCM}</connection></scm>
  <dependencies>
    <dependency>
      <groupId>org.typelevel</groupId>
      <artifactId>cats-core_2.13</artifactId>
      <version>2.10.0</version>
    </dependency>
  </dependencies>
</project>"#
    );

    ctx.publisher
        .publish(upload(
            "org/acme/app_2.13/0.1.0/app_2.13-0.1.0.pom",
            &pom,
            principal("dev", false, &["acme/lib"]),
        ))
        .await
        .unwrap();

    let top = ctx.index.most_depended_upon(10).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].group_id, "org.typelevel");
    assert_eq!(top[0].artifact_id, "cats-core_2.13");
    assert_eq!(top[0].dependents, 1);
}
