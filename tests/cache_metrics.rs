use std::sync::Arc;
use std::time::Duration;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serial_test::serial;
use risalto::application::engagement::EngagementService;
use risalto::application::rankings::{LimitParam, RankingService};
use risalto::application::repos::{BlogsRepo, NewBlogParams, NewUserParams, UsersRepo};
use risalto::cache::{CacheConfig, RankedQueryCache};
use risalto::config::RankingSettings;
use risalto::domain::slug::BlogSlug;
use risalto::infra::memory::MemoryRepositories;
use time::macros::datetime;

// The debugging recorder installs globally, so every metric-key assertion
// lives in this single test.
#[tokio::test]
#[serial]
async fn cache_and_engagement_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let repos = MemoryRepositories::new();
    let shared = Arc::new(repos.clone());
    let user = repos
        .insert_user(NewUserParams {
            username: "metrics".to_string(),
            email: "metrics@example.com".to_string(),
            first_name: "Metric".to_string(),
            last_name: "Tester".to_string(),
            profile_picture: None,
        })
        .await
        .expect("seed user");
    let blog = repos
        .insert_blog(NewBlogParams {
            owner_id: user.id,
            title: "Metrics post".to_string(),
            content: "body".to_string(),
            video_id: "vid-1".to_string(),
            video_thumbnail: None,
            slug: BlogSlug::new("metrics-post", "abc123456789"),
            created_at: datetime!(2026-01-01 09:00 UTC),
        })
        .await
        .expect("seed blog");

    let cache = Arc::new(RankedQueryCache::new(&CacheConfig::default()));
    let rankings = RankingService::new(shared.clone(), cache, &RankingSettings::default());
    let engagement = EngagementService::new(shared, Duration::from_secs(5));

    // Miss, store, then hit.
    rankings
        .most_viewed_blogs(LimitParam::default())
        .await
        .expect("first ranking");
    rankings
        .most_viewed_blogs(LimitParam::default())
        .await
        .expect("second ranking");

    engagement
        .toggle_blog_like(blog.id, user.id)
        .await
        .expect("toggle like");
    engagement.record_view(blog.id).await.expect("record view");

    let snapshot = snapshotter.snapshot().into_vec();
    let recorded: Vec<String> = snapshot
        .iter()
        .map(|(key, _, _, _)| key.key().name().to_string())
        .collect();

    for expected in [
        "risalto_ranked_cache_miss_total",
        "risalto_ranked_cache_store_total",
        "risalto_ranked_cache_hit_total",
        "risalto_ranked_compute_ms",
        "risalto_like_toggle_total",
        "risalto_view_record_total",
    ] {
        assert!(
            recorded.iter().any(|name| name == expected),
            "missing metric key {expected}, recorded: {recorded:?}"
        );
    }

    let counter_value = |name: &str| -> u64 {
        snapshot
            .iter()
            .find(|(key, _, _, _)| key.key().name() == name)
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(count) => *count,
                other => panic!("{name} is not a counter: {other:?}"),
            })
            .unwrap_or_else(|| panic!("{name} was never recorded"))
    };

    // One cold call counts exactly one miss even though get_or_compute
    // re-checks the entry after taking the flight lock; the warm call
    // counts exactly one hit.
    assert_eq!(counter_value("risalto_ranked_cache_miss_total"), 1);
    assert_eq!(counter_value("risalto_ranked_cache_hit_total"), 1);
    assert_eq!(counter_value("risalto_ranked_cache_store_total"), 1);
}
