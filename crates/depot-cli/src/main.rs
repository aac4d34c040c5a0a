//! Demo wiring for the depot core: in-memory stores, one full artifact
//! lifecycle (ingest, dedup, tag, list, retain, purge) printed as it runs.

use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::Arc;

use chrono::{Duration, Utc};
use depot_core::app::{ArtifactService, RetentionManager};
use depot_core::impls::{InMemoryBlobStore, InMemoryMetadataStore};
use depot_core::ports::{SimpleDeadlineParser, SystemClock};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // (A) Wire the ports with in-memory adapters.
    let metadata = Arc::new(InMemoryMetadataStore::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let clock = Arc::new(SystemClock);

    let service = ArtifactService::new(
        metadata.clone(),
        blobs.clone(),
        clock.clone(),
        "https://cdn.example.com",
    );
    let retention = RetentionManager::new(
        metadata,
        blobs,
        clock,
        Arc::new(SimpleDeadlineParser),
    );

    // (B) Ingest a build artifact.
    let mut upload = Cursor::new(b"pretend this is a build tarball".to_vec());
    let outcome = service
        .ingest(&mut upload, "application/gzip", "app-1.0.0.tar.gz")
        .await
        .expect("ingest");
    let id = outcome.artifact.id.clone();
    println!("ingested: id={id}");
    println!("download: {}", service.download_url(&id));

    // (C) Uploading the same bytes again resolves to the existing artifact.
    let mut dup = Cursor::new(b"pretend this is a build tarball".to_vec());
    let dup_outcome = service
        .ingest(&mut dup, "application/gzip", "renamed.tar.gz")
        .await
        .expect("duplicate ingest");
    println!("re-upload already_stored={}", dup_outcome.already_stored);

    // (D) Tag it and list by tag.
    service.add_tag(&id, "release").await.expect("tag");
    service.add_tag(&id, "linux").await.expect("tag");

    let tags: BTreeSet<String> = ["release".to_string(), "linux".to_string()].into();
    let listed = service.list(&tags, 10).await.expect("list");
    println!("tagged {{release,linux}}: {} artifact(s)", listed.len());

    let view = service.view(listed[0].clone());
    println!("view: {}", serde_json::to_string_pretty(&view).expect("json"));

    // (E) Retain for an hour, then run a sweep pretending a day has passed.
    let retained = retention.retain(&id, "in 1 hour").await.expect("retain");
    println!("retained_until: {:?}", retained.retained_until);

    let report = retention.purge(Utc::now() + Duration::days(1)).await.expect("purge");
    println!(
        "purge: deleted={:?} failed={:?}",
        report.deleted, report.failed
    );
}
