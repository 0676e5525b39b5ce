use std::path::Path;

use ugc_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "ugc-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;

    let ffmpeg = ugc_media::check_ffmpeg()?;
    println!("ugc-selfcheck: ffmpeg at {}", ffmpeg.display());
    let ffprobe = ugc_media::check_ffprobe()?;
    println!("ugc-selfcheck: ffprobe at {}", ffprobe.display());

    let compose = config.load_compose_config()?;
    println!(
        "ugc-selfcheck: output {}x{} @ {}fps",
        compose.output.width(),
        compose.output.height(),
        compose.output.fps
    );

    println!("ugc-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}
