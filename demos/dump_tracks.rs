use linecount::{BlobCounter, Counting, CounterConfig, CountingLine};
use opencv::{core::Mat, prelude::*, videoio};
use std::io::Write;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args();
    let _ = args.next();
    let in_file_name = args.next().expect("expected video file name");
    let line_y: f32 = args
        .next()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300.0);

    let mut cam = videoio::VideoCapture::from_file(&in_file_name, videoio::CAP_ANY)?;
    if !videoio::VideoCapture::is_opened(&cam)? {
        anyhow::bail!("unable to open video source: {}", in_file_name);
    }

    let width = cam.get(videoio::CAP_PROP_FRAME_WIDTH)? as f32;
    let line = CountingLine::horizontal(line_y, 0.0, width);
    let mut counter = BlobCounter::new(CounterConfig::new(line));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut frame = Mat::default();
    let mut frame_idx = 0usize;

    loop {
        if !cam.read(&mut frame)? {
            break;
        }

        if frame.cols() == 0 || frame.rows() == 0 {
            break;
        }

        frame_idx += 1;
        counter.update(&frame, &in_file_name)?;

        let record = serde_json::json!({
            "frame": frame_idx,
            "count": counter.count(&in_file_name),
            "tracks": counter.tracks(&in_file_name).to_vec(),
        });
        writeln!(out, "{}", record)?;
    }

    Ok(())
}
