use depthclip::engine::{FrameProcessor, FrameStreamRunner, PipelineEvent};
use depthclip::source::{DepthSource, SyntheticDepthSource};
use depthclip::PipelineConfig;
use log::info;
use std::sync::{Arc, Weak};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Depth Clip - synthetic scene demo");
    println!("=================================\n");

    let config = PipelineConfig::from_json(serde_json::json!({
        "width": 64,
        "height": 48,
        "clip": {
            "near_clip": 0,
            "far_clip": 1500
        },
        "depth_mask_count": 30
    }))?;

    let processor = Arc::new(FrameProcessor::with_name("synthetic", config)?);
    let events = processor.subscribe();

    // weak so the event senders close once main drops the processor
    let watched: Weak<FrameProcessor> = Arc::downgrade(&processor);
    let watcher = std::thread::spawn(move || {
        let mut foreground_frames = 0u64;
        for event in events.iter() {
            let Some(watcher_processor) = watched.upgrade() else {
                break;
            };
            match event {
                PipelineEvent::MaskReady => {
                    println!("{}", watcher_processor.state().status_text());
                }
                PipelineEvent::FrameDone { .. } => {
                    let foreground = watcher_processor
                        .with_output(|view| view.depth.iter().filter(|&&d| d > 0).count());
                    if watcher_processor.state().is_ready() && foreground > 0 {
                        foreground_frames += 1;
                    }
                }
            }
        }
        foreground_frames
    });

    let mut source = SyntheticDepthSource::new();
    source
        .configure(serde_json::json!({
            "width": 64,
            "height": 48,
            "object_after": 30,
            "interval_ms": 5,
            "drop_every": 10,
            "frame_limit": 120
        }))
        .await?;

    let runner = FrameStreamRunner::new(processor.clone());
    let summary = runner.spawn(Box::new(source)).await??;
    info!("Session summary: {:?}", summary);

    println!("\n{}", processor.monitor().generate_report());

    drop(runner);
    drop(processor);
    let foreground_frames = watcher
        .join()
        .map_err(|_| anyhow::anyhow!("Event watcher panicked"))?;
    println!("Frames with foreground after calibration: {}", foreground_frames);

    Ok(())
}
