mod common;

use std::collections::HashSet;

use metrics_util::debugging::DebuggingRecorder;
use serde_json::json;

use common::{Harness, TOKEN, body};

#[tokio::test]
async fn pipeline_emits_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let built = Harness::default().rejecting_first_entry().build();
    built
        .service
        .handle(&body(json!({
            "prerenderToken": TOKEN,
            "urls": ["https://example.com/a", "https://example.com/b"]
        })))
        .await
        .expect("pipeline succeeds");
    built
        .service
        .handle(&body(json!({ "prerenderToken": "nobody", "url": "https://example.com/a" })))
        .await
        .expect("rejection is an outcome");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "recache_requests_total",
        "recache_urls_invalidated_total",
        "recache_batches_dispatched_total",
        "recache_entries_failed_total",
        "recache_dispatch_ms",
    ];
    for name in expected {
        assert!(names.contains(name), "missing metric `{name}`");
    }

    let outcomes: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(composite_key, _, _, _)| composite_key.key().name() == "recache_requests_total")
        .flat_map(|(composite_key, _, _, _)| {
            composite_key
                .key()
                .labels()
                .map(|label| label.value().to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    assert!(outcomes.contains("recached"));
    assert!(outcomes.contains("rejected"));
}
