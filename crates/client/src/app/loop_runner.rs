use std::process::ExitCode;

use engine::{run_app_with_services, MetricsHandle, ProfileHandle};
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        scene,
        fullscreen,
        services,
    } = app;
    let metrics = services.metrics.clone();
    let profile = config.profile.then(|| services.profile.clone()).flatten();

    let result = run_app_with_services(config, scene, fullscreen, services);
    log_session_summary(&metrics, profile.as_ref());

    if let Err(err) = result {
        error!(error = %err, "panel_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn log_session_summary(metrics: &MetricsHandle, profile: Option<&ProfileHandle>) {
    let stats = metrics.snapshot();
    info!(
        fps = stats.fps,
        texture_hits = stats.texture_hits,
        texture_misses = stats.texture_misses,
        "session_stats"
    );

    let Some(profile) = profile else {
        return;
    };
    for (stage, average) in profile.stage_averages() {
        info!(
            stage,
            avg_ms = average.as_secs_f64() * 1_000.0,
            frames = profile.len(),
            "profile_stage"
        );
    }
}
