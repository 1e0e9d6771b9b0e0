//! Downloader behavior: streaming, progress accounting, integrity, and
//! filename handling.

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use srvup::catalog::CatalogClient;
use srvup::core::UpdateError;
use srvup::download::{ArtifactDownloader, BLOCK_SIZE, BlockProgress};

use crate::common::{mount_catalog, sha256_hex};

/// An artifact bigger than one block with a partial final block.
fn large_artifact() -> Vec<u8> {
    let mut bytes = vec![0xabu8; BLOCK_SIZE * 2];
    bytes.extend_from_slice(&[0xcd; 1000]);
    bytes
}

#[tokio::test]
async fn downloads_into_directory_with_derived_name() {
    let server = MockServer::start().await;
    let artifact = large_artifact();
    mount_catalog(&server, &["1.18.1"], &[12], &artifact, None).await;

    let staging = TempDir::new().unwrap();
    let catalog = CatalogClient::new(server.uri());

    let path = ArtifactDownloader::new(&catalog)
        .download(staging.path(), "1.18.1", 12, None)
        .await
        .unwrap();

    assert_eq!(path, staging.path().join("server-1.18.1-12.jar"));
    assert_eq!(std::fs::read(&path).unwrap(), artifact);
}

#[tokio::test]
async fn progress_covers_every_block_and_ends_exact() {
    let server = MockServer::start().await;
    let artifact = large_artifact();
    mount_catalog(&server, &["1.18.1"], &[12], &artifact, None).await;

    let staging = TempDir::new().unwrap();
    let catalog = CatalogClient::new(server.uri());

    let mut seen: Vec<BlockProgress> = Vec::new();
    let mut on_block = |block: &BlockProgress| seen.push(*block);
    ArtifactDownloader::new(&catalog)
        .download(staging.path(), "1.18.1", 12, Some(&mut on_block))
        .await
        .unwrap();

    let total = artifact.len() as u64;
    let expected_blocks = total.div_ceil(BLOCK_SIZE as u64);
    assert_eq!(seen.len() as u64, expected_blocks);
    assert_eq!(
        seen.iter().map(|b| b.block_index).collect::<Vec<_>>(),
        (0..expected_blocks).collect::<Vec<_>>()
    );

    let last = seen.last().unwrap();
    assert!(last.is_last());
    assert_eq!(last.bytes_complete(), total);
    // Every earlier block reports a whole multiple of the block size.
    for block in &seen[..seen.len() - 1] {
        assert_eq!(block.bytes_complete(), (block.block_index + 1) * BLOCK_SIZE as u64);
    }
}

#[tokio::test]
async fn digest_mismatch_is_an_integrity_error() {
    let server = MockServer::start().await;
    let artifact = large_artifact();
    // Publish the digest of different bytes.
    let published = sha256_hex(b"some other bytes");
    mount_catalog(&server, &["1.18.1"], &[12], &artifact, Some(published.clone())).await;

    let staging = TempDir::new().unwrap();
    let catalog = CatalogClient::new(server.uri());

    let err = ArtifactDownloader::new(&catalog)
        .download(staging.path(), "1.18.1", 12, None)
        .await
        .unwrap_err();

    match err {
        UpdateError::Integrity { path, expected, actual } => {
            assert_eq!(expected, published);
            assert_eq!(actual, sha256_hex(&artifact));
            // The corrupt file stays in staging, never promoted anywhere.
            assert!(path.starts_with(staging.path()));
            assert!(path.is_file());
        }
        other => panic!("expected integrity error, got {other:?}"),
    }
}

#[tokio::test]
async fn uppercase_published_digest_still_verifies() {
    let server = MockServer::start().await;
    let artifact = large_artifact();
    let published = sha256_hex(&artifact).to_uppercase();
    mount_catalog(&server, &["1.18.1"], &[12], &artifact, Some(published)).await;

    let staging = TempDir::new().unwrap();
    let catalog = CatalogClient::new(server.uri());

    ArtifactDownloader::new(&catalog)
        .download(staging.path(), "1.18.1", 12, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn disabled_verification_accepts_any_bytes() {
    let server = MockServer::start().await;
    let artifact = large_artifact();
    mount_catalog(
        &server,
        &["1.18.1"],
        &[12],
        &artifact,
        Some(sha256_hex(b"wrong")),
    )
    .await;

    let staging = TempDir::new().unwrap();
    let catalog = CatalogClient::new(server.uri());

    ArtifactDownloader::new(&catalog)
        .verify(false)
        .download(staging.path(), "1.18.1", 12, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn hostile_disposition_filename_is_rejected() {
    let server = MockServer::start().await;
    let artifact = b"payload".to_vec();
    mount_catalog(&server, &["1.18.1"], &[12], &artifact, None).await;

    // Shadow the artifact mock with one advertising a traversal name.
    let name = "server-1.18.1-12.jar";
    Mock::given(method("GET"))
        .and(path(format!("/versions/1.18.1/builds/12/downloads/{name}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(artifact)
                .insert_header("content-disposition", "attachment; filename=\"../evil.jar\""),
        )
        .with_priority(1)
        .mount(&server)
        .await;

    let staging = TempDir::new().unwrap();
    let catalog = CatalogClient::new(server.uri());

    let err = ArtifactDownloader::new(&catalog)
        .download(staging.path(), "1.18.1", 12, None)
        .await
        .unwrap_err();

    match err {
        UpdateError::UnsafeFilename { name } => assert_eq!(name, "../evil.jar"),
        other => panic!("expected unsafe filename error, got {other:?}"),
    }
    assert!(!staging.path().parent().unwrap().join("evil.jar").exists());
}

#[tokio::test]
async fn explicit_file_destination_is_respected() {
    let server = MockServer::start().await;
    let artifact = large_artifact();
    mount_catalog(&server, &["1.18.1"], &[12], &artifact, None).await;

    let staging = TempDir::new().unwrap();
    let destination = staging.path().join("download.jar");
    let catalog = CatalogClient::new(server.uri());

    let path = ArtifactDownloader::new(&catalog)
        .download(&destination, "1.18.1", 12, None)
        .await
        .unwrap();

    assert_eq!(path, destination);
    assert_eq!(std::fs::read(&path).unwrap(), artifact);
}
