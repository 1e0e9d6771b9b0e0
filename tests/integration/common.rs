//! Shared fixtures: a mock artifact catalog.

use serde_json::json;
use sha2::{Digest, Sha256};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Artifact file name the mock catalog publishes for a build.
pub fn artifact_name(version: &str, build: i64) -> String {
    format!("server-{version}-{build}.jar")
}

/// Mount a full catalog on `server`: a version list, a build list for the
/// newest version, a descriptor for the newest build, and its artifact.
///
/// `published_sha256` lets integrity tests advertise a digest that does not
/// match the served bytes.
pub async fn mount_catalog(
    server: &MockServer,
    versions: &[&str],
    builds: &[i64],
    artifact: &[u8],
    published_sha256: Option<String>,
) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "versions": versions })))
        .mount(server)
        .await;

    let Some(&version) = versions.last() else {
        return;
    };

    Mock::given(method("GET"))
        .and(path(format!("/versions/{version}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "version": version, "builds": builds })),
        )
        .mount(server)
        .await;

    let Some(&build) = builds.last() else {
        return;
    };
    let name = artifact_name(version, build);
    let sha256 = published_sha256.unwrap_or_else(|| sha256_hex(artifact));

    Mock::given(method("GET"))
        .and(path(format!("/versions/{version}/builds/{build}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": version,
            "build": build,
            "time": "2022-01-23T20:46:16.000Z",
            "changes": [
                {"commit": "abc123", "summary": "Fix things", "message": "Fix things\n"}
            ],
            "downloads": {"application": {"name": name, "sha256": sha256}}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/versions/{version}/builds/{build}/downloads/{name}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(artifact.to_vec())
                .insert_header(
                    "content-disposition",
                    format!("attachment; filename=\"{name}\"").as_str(),
                ),
        )
        .mount(server)
        .await;
}
