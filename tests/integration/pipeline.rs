//! Full pipeline runs: check → select → download → verify → install →
//! persist, including the failure paths that must leave state untouched.

use tempfile::TempDir;
use wiremock::MockServer;

use srvup::catalog::CatalogClient;
use srvup::config::{InstalledState, StateStore};
use srvup::core::UpdateError;
use srvup::select::Selector;
use srvup::updater::{StateOverrides, UpdateOptions, UpdateOutcome, Updater};

use crate::common::{artifact_name, mount_catalog, sha256_hex};

const OLD_BUILD: &[u8] = b"old server build 10";
const NEW_BUILD: &[u8] = b"new server build 12 with more bytes";

struct Deployment {
    dir: TempDir,
}

impl Deployment {
    /// A server directory with an installed binary and a legacy-shaped
    /// state record claiming version 1.18.1 build 10.
    fn existing() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("server.jar"), OLD_BUILD).unwrap();
        std::fs::write(
            dir.path().join("version_history.json"),
            r#"{"currentVersion": "git-Paper-10 (MC: 1.18.1)"}"#,
        )
        .unwrap();
        Self { dir }
    }

    fn target(&self) -> std::path::PathBuf {
        self.dir.path().join("server.jar")
    }

    fn store(&self) -> StateStore {
        StateStore::for_target(&self.target())
    }

    fn default_options(&self) -> UpdateOptions {
        UpdateOptions {
            target: self.target(),
            default_version: Selector::Latest,
            default_build: Selector::Latest,
            backup: true,
            fresh_install: false,
            output_name: None,
            secondary_copy: None,
        }
    }
}

async fn updater_for(server: &MockServer, deployment: &Deployment) -> Updater {
    Updater::load(
        CatalogClient::new(server.uri()),
        Some(deployment.store()),
        StateOverrides::default(),
    )
    .await
}

#[tokio::test]
async fn end_to_end_update_then_idempotent_check() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["1.17", "1.18.1"], &[10, 11, 12], NEW_BUILD, None).await;

    let deployment = Deployment::existing();
    let mut updater = updater_for(&server, &deployment).await;

    // Installed (1.18.1, 10) vs remote latest (1.18.1, 12).
    assert_eq!(
        updater.installed(),
        &InstalledState {
            version: "1.18.1".to_string(),
            build: 10
        }
    );
    assert!(
        updater
            .check_for_update(&Selector::Latest, &Selector::Latest)
            .await
            .unwrap()
    );

    let outcome = updater
        .perform_update(deployment.default_options())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::Installed {
            version: "1.18.1".to_string(),
            build: 12
        }
    );
    assert_eq!(std::fs::read(deployment.target()).unwrap(), NEW_BUILD);

    // The record was rewritten in the plain shape.
    let state = deployment.store().load().await;
    assert_eq!(state.version, "1.18.1");
    assert_eq!(state.build, 12);

    // A fresh orchestrator sees nothing left to do.
    let updater = updater_for(&server, &deployment).await;
    assert!(
        !updater
            .check_for_update(&Selector::Latest, &Selector::Latest)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn version_mismatch_short_circuits_before_builds() {
    let server = MockServer::start().await;
    // The newest version has no builds at all; only a version-mismatch
    // short circuit can report an update here.
    mount_catalog(&server, &["1.18.1", "1.19"], &[], b"", None).await;

    let deployment = Deployment::existing();
    let updater = updater_for(&server, &deployment).await;

    assert!(
        updater
            .check_for_update(&Selector::Latest, &Selector::Latest)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn selection_failure_aborts_without_mutating_state() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["1.17", "1.18.1"], &[10, 11, 12], NEW_BUILD, None).await;

    let deployment = Deployment::existing();
    let mut updater = updater_for(&server, &deployment).await;

    let mut options = deployment.default_options();
    options.default_version = Selector::Literal("9.99".to_string());

    match updater.perform_update(options).await.unwrap() {
        UpdateOutcome::Aborted { .. } => {}
        other => panic!("expected abort, got {other:?}"),
    }

    // Nothing moved: binary and record are untouched.
    assert_eq!(std::fs::read(deployment.target()).unwrap(), OLD_BUILD);
    assert_eq!(deployment.store().load().await.build, 10);
}

#[tokio::test]
async fn integrity_failure_never_touches_the_target() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        &["1.18.1"],
        &[10, 11, 12],
        NEW_BUILD,
        Some(sha256_hex(b"tampered")),
    )
    .await;

    let deployment = Deployment::existing();
    let mut updater = updater_for(&server, &deployment).await;

    let err = updater
        .perform_update(deployment.default_options())
        .await
        .unwrap_err();
    assert!(matches!(err, UpdateError::Integrity { .. }));

    assert_eq!(std::fs::read(deployment.target()).unwrap(), OLD_BUILD);
    assert_eq!(deployment.store().load().await.build, 10);
}

#[tokio::test]
async fn empty_build_list_is_a_guided_terminal_condition() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["1.18.1"], &[], b"", None).await;

    let deployment = Deployment::existing();
    let mut updater = updater_for(&server, &deployment).await;

    let err = updater
        .perform_update(deployment.default_options())
        .await
        .unwrap_err();
    match err {
        UpdateError::NoBuildsAvailable { version } => assert_eq!(version, "1.18.1"),
        other => panic!("expected no-builds error, got {other:?}"),
    }
}

#[tokio::test]
async fn fresh_install_into_directory_uses_downloaded_name() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["1.18.1"], &[12], NEW_BUILD, None).await;

    let dir = TempDir::new().unwrap();
    let mut updater = Updater::load(
        CatalogClient::new(server.uri()),
        Some(StateStore::for_target(dir.path())),
        StateOverrides::default(),
    )
    .await;

    let options = UpdateOptions {
        target: dir.path().to_path_buf(),
        default_version: Selector::Latest,
        default_build: Selector::Latest,
        backup: false,
        fresh_install: true,
        output_name: None,
        secondary_copy: None,
    };
    let outcome = updater.perform_update(options).await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::Installed { build: 12, .. }));

    let installed = dir.path().join(artifact_name("1.18.1", 12));
    assert_eq!(std::fs::read(installed).unwrap(), NEW_BUILD);
}

#[tokio::test]
async fn output_name_overrides_installed_filename() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["1.18.1"], &[12], NEW_BUILD, None).await;

    let dir = TempDir::new().unwrap();
    let mut updater = Updater::load(
        CatalogClient::new(server.uri()),
        None,
        StateOverrides::default(),
    )
    .await;

    let options = UpdateOptions {
        target: dir.path().to_path_buf(),
        default_version: Selector::Latest,
        default_build: Selector::Latest,
        backup: false,
        fresh_install: true,
        output_name: Some("paper.jar".to_string()),
        secondary_copy: None,
    };
    updater.perform_update(options).await.unwrap();

    assert_eq!(std::fs::read(dir.path().join("paper.jar")).unwrap(), NEW_BUILD);
}

#[tokio::test]
async fn secondary_copy_preserves_the_old_binary() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["1.18.1"], &[10, 11, 12], NEW_BUILD, None).await;

    let deployment = Deployment::existing();
    let copy_old = deployment.dir.path().join("server.jar.old");
    let mut updater = updater_for(&server, &deployment).await;

    let mut options = deployment.default_options();
    options.secondary_copy = Some(copy_old.clone());
    updater.perform_update(options).await.unwrap();

    assert_eq!(std::fs::read(&copy_old).unwrap(), OLD_BUILD);
    assert_eq!(std::fs::read(deployment.target()).unwrap(), NEW_BUILD);
}

#[tokio::test]
async fn installed_state_overrides_take_precedence() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["1.18.1"], &[10, 11, 12], NEW_BUILD, None).await;

    let deployment = Deployment::existing();
    let updater = Updater::load(
        CatalogClient::new(server.uri()),
        Some(deployment.store()),
        StateOverrides {
            version: Some("1.18.1".to_string()),
            build: Some(12),
        },
    )
    .await;

    // The record says build 10 but the override says 12: up to date.
    assert!(
        !updater
            .check_for_update(&Selector::Latest, &Selector::Latest)
            .await
            .unwrap()
    );
}
