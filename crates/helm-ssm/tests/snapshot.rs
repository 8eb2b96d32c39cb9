//! Snapshot tests
//!
//! Resolves each *.yaml file in /tests/fixtures/ individually against a fixed in-memory
//! parameter store and compares if the rendered values change.

use helm_ssm::resolver::Resolver;
use helm_ssm::store::{MemoryStore, ParameterStore, StoreError};
use helm_ssm::values::MergedValues;

fn store() -> MemoryStore {
    MemoryStore::from_iter([
        ("/app/image/tag", "1.25.3"),
        ("/app/db/password", "hunter2"),
        ("/app/db/primary/host", "primary.example"),
        ("/app/db/primary/port", "5432"),
        ("/app/db/replica/host", "replica.example"),
        ("/app/flags/beta", "true"),
        ("/app/flags/dark-mode", "false"),
        ("/app/sidecars/proxy/image", "envoy:1.29"),
        ("/app/sidecars/logger/image", "fluent-bit:3.0"),
        ("/app/sidecars/logger/level", "info"),
    ])
}

#[test]
fn snapshots() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HELM_SSM_LOG"))
        .with_writer(std::io::stderr)
        .init();

    insta::glob!("fixtures/*.yaml", |path| {
        let values = MergedValues::load(&[path.to_owned()]).unwrap();

        let rendered = Resolver::new(Box::new(
            || -> Result<Box<dyn ParameterStore>, StoreError> { Ok(Box::new(store())) },
        ))
        .resolve(&values)
        .expect("must resolve");

        insta::assert_snapshot!(rendered.to_string());
    });
}
