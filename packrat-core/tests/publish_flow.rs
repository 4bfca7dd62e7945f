use std::cell::Cell;
use tempfile::tempdir;

use packrat_core::contract::{MockVcsClient, StateStore};
use packrat_core::publish::{offer_publish_retry, publish_site, PublishError};
use packrat_core::state::{MemoryStateStore, PublishState};

fn vcs_with_remote(url: &str) -> MockVcsClient {
    let url = url.to_string();
    let mut vcs = MockVcsClient::new();
    vcs.expect_remote_url()
        .returning(move |_| Ok(url.clone()));
    vcs
}

#[tokio::test]
async fn successful_push_clears_the_pending_state() {
    let dir = tempdir().unwrap();
    let site_path = dir.path().join("index.html");
    std::fs::write(&site_path, "<html></html>").unwrap();

    let state = MemoryStateStore::default();
    state.set_pending().unwrap();

    let mut vcs = vcs_with_remote("https://github.com/alice/files");
    vcs.expect_list_branches()
        .returning(|| Ok(vec!["main".into(), "gh-pages".into()]));
    vcs.expect_current_branch()
        .returning(|| Ok("gh-pages".into()));
    vcs.expect_add().returning(|_| Ok(()));
    vcs.expect_commit().returning(|_| Ok(()));
    vcs.expect_push()
        .withf(|remote, branch| remote == "origin" && branch == "gh-pages")
        .returning(|_, _| Ok(()));

    let info = publish_site(&vcs, &state, &site_path, |_, _| false)
        .await
        .expect("publish should succeed");

    assert_eq!(info.branch, "gh-pages");
    assert_eq!(info.repo.pages_url(), "https://alice.github.io/files/");
    assert_eq!(state.load(), PublishState::Clean);
}

#[tokio::test]
async fn failed_push_reasserts_the_pending_state() {
    let dir = tempdir().unwrap();
    let site_path = dir.path().join("index.html");
    std::fs::write(&site_path, "<html></html>").unwrap();

    // Start clean: even a run whose render already cleared and re-set the
    // flag elsewhere must end pending after a failed push.
    let state = MemoryStateStore::default();

    let mut vcs = vcs_with_remote("git@github.com:alice/files.git");
    vcs.expect_list_branches()
        .returning(|| Ok(vec!["main".into()]));
    vcs.expect_current_branch().returning(|| Ok("main".into()));
    vcs.expect_add().returning(|_| Ok(()));
    vcs.expect_commit().returning(|_| Ok(()));
    vcs.expect_push()
        .returning(|_, _| Err("remote hung up".into()));

    let err = publish_site(&vcs, &state, &site_path, |_, _| false)
        .await
        .expect_err("publish should fail");

    assert!(matches!(err, PublishError::Vcs(_)));
    assert!(!err.is_preflight());
    assert_eq!(state.load(), PublishState::PendingPublish);
}

#[tokio::test]
async fn missing_remote_is_preflight_and_leaves_state_untouched() {
    let dir = tempdir().unwrap();
    let site_path = dir.path().join("index.html");

    let state = MemoryStateStore::default();
    let mut vcs = MockVcsClient::new();
    vcs.expect_remote_url()
        .returning(|_| Err("no such remote 'origin'".into()));

    let err = publish_site(&vcs, &state, &site_path, |_, _| false)
        .await
        .expect_err("publish should abort");

    assert!(matches!(err, PublishError::NoRemote(_)));
    assert!(err.is_preflight());
    assert_eq!(state.load(), PublishState::Clean);
}

#[tokio::test]
async fn unparseable_remote_is_preflight_and_leaves_state_untouched() {
    let dir = tempdir().unwrap();
    let site_path = dir.path().join("index.html");

    let state = MemoryStateStore::default();
    state.set_pending().unwrap();
    let vcs = vcs_with_remote("https://example.com/not/github");

    let err = publish_site(&vcs, &state, &site_path, |_, _| false)
        .await
        .expect_err("publish should abort");

    assert!(matches!(err, PublishError::UnparseableRemote(_)));
    // Pre-flight must not clear an already-pending flag either.
    assert_eq!(state.load(), PublishState::PendingPublish);
}

#[tokio::test]
async fn branch_switch_happens_only_when_confirmed() {
    let dir = tempdir().unwrap();
    let site_path = dir.path().join("index.html");
    std::fs::write(&site_path, "<html></html>").unwrap();
    let state = MemoryStateStore::default();

    // Confirmed: checkout of the pages branch is requested.
    let mut vcs = vcs_with_remote("https://github.com/alice/files");
    vcs.expect_list_branches()
        .returning(|| Ok(vec!["main".into(), "gh-pages".into()]));
    vcs.expect_current_branch().returning(|| Ok("main".into()));
    vcs.expect_checkout()
        .times(1)
        .withf(|branch| branch == "gh-pages")
        .returning(|_| Ok(()));
    vcs.expect_add().returning(|_| Ok(()));
    vcs.expect_commit().returning(|_| Ok(()));
    vcs.expect_push().returning(|_, _| Ok(()));

    let asked = Cell::new(false);
    publish_site(&vcs, &state, &site_path, |current, target| {
        asked.set(true);
        assert_eq!(current, "main");
        assert_eq!(target, "gh-pages");
        true
    })
    .await
    .unwrap();
    assert!(asked.get());

    // Declined: no checkout, push still targets the pages branch.
    let mut vcs = vcs_with_remote("https://github.com/alice/files");
    vcs.expect_list_branches()
        .returning(|| Ok(vec!["main".into(), "gh-pages".into()]));
    vcs.expect_current_branch().returning(|| Ok("main".into()));
    vcs.expect_checkout().times(0);
    vcs.expect_add().returning(|_| Ok(()));
    vcs.expect_commit().returning(|_| Ok(()));
    vcs.expect_push()
        .withf(|_, branch| branch == "gh-pages")
        .returning(|_, _| Ok(()));

    publish_site(&vcs, &state, &site_path, |_, _| false)
        .await
        .unwrap();
}

#[tokio::test]
async fn matching_branch_skips_the_confirmation_entirely() {
    let dir = tempdir().unwrap();
    let site_path = dir.path().join("index.html");
    std::fs::write(&site_path, "<html></html>").unwrap();
    let state = MemoryStateStore::default();

    let mut vcs = vcs_with_remote("https://github.com/alice/files");
    vcs.expect_list_branches()
        .returning(|| Ok(vec!["main".into()]));
    vcs.expect_current_branch().returning(|| Ok("main".into()));
    vcs.expect_checkout().times(0);
    vcs.expect_add().returning(|_| Ok(()));
    vcs.expect_commit().returning(|_| Ok(()));
    vcs.expect_push().returning(|_, _| Ok(()));

    publish_site(&vcs, &state, &site_path, |_, _| {
        panic!("confirmation must not be consulted when branches match")
    })
    .await
    .unwrap();
}

#[test]
fn retry_is_offered_only_with_pending_state_and_an_existing_page() {
    let dir = tempdir().unwrap();
    let site_path = dir.path().join("index.html");
    let state = MemoryStateStore::default();

    // Clean state, no page.
    assert!(!offer_publish_retry(&state, &site_path));

    // Pending state but the page is gone: nothing to push.
    state.set_pending().unwrap();
    assert!(!offer_publish_retry(&state, &site_path));

    // Pending state and a rendered page: the orphaned-flag crash case.
    std::fs::write(&site_path, "<html></html>").unwrap();
    assert!(offer_publish_retry(&state, &site_path));

    state.clear().unwrap();
    assert!(!offer_publish_retry(&state, &site_path));
}
