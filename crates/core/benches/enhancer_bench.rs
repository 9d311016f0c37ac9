use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sumoguard_common::error::Failure;
use sumoguard_core::{render_failure, ErrorEnhancer, ResilientExecutor};
use sumoguard_domain::{OperationContext, ResilienceSettings};

fn sample_enhancer() -> ErrorEnhancer {
    let settings = ResilienceSettings::default();
    let executor = ResilientExecutor::from_settings(&settings).unwrap();
    ErrorEnhancer::new(Arc::new(executor), &settings.error_handling)
}

fn bench_enhance(c: &mut Criterion) {
    let enhancer = sample_enhancer();
    let context = OperationContext::new().with_entity_id("abc123").with_extra("tool", "monitor_tools");
    let not_found = Failure::api("Not Found", Some(404));
    let invalid = Failure::api("Bad request", Some(400))
        .with_response_body(r#"{"errors":[{"message":"invalid threshold"}]}"#);

    c.bench_function("enhance_not_found", |b| {
        b.iter(|| enhancer.enhance(black_box("get_monitor"), &context, not_found.clone()));
    });
    c.bench_function("enhance_configuration_invalid", |b| {
        b.iter(|| enhancer.enhance(black_box("create_monitor"), &context, invalid.clone()));
    });
}

fn bench_handle_success(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let enhancer = sample_enhancer();

    c.bench_function("handle_success", |b| {
        b.to_async(&runtime).iter(|| async {
            enhancer
                .handle("list_monitors", OperationContext::new(), || async { Ok::<_, Failure>(42) })
                .await
        });
    });
}

fn bench_render(c: &mut Criterion) {
    let failure = Failure::api("Service unavailable", Some(503)).with_request_id("req-1");
    c.bench_function("render_api_failure", |b| {
        b.iter(|| render_failure(black_box("list_monitors"), &failure));
    });
}

criterion_group!(benches, bench_enhance, bench_handle_success, bench_render);
criterion_main!(benches);
