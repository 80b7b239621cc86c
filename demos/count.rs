use clap::Parser;
use linecount::detector::BlobDetectorConfig;
use linecount::{BlobCounter, Counting, CounterConfig, CountingLine, Track};
use opencv::{
    core::{self, Mat},
    highgui, imgproc,
    prelude::*,
    videoio,
};

#[derive(Debug, Parser)]
#[command(name = "count", about = "Count vehicles crossing a line in a video")]
struct Opts {
    /// Video file or stream URL to process
    input: String,

    /// y coordinate of the counting line, pixels from the top
    #[arg(long, default_value_t = 300.0)]
    line_y: f32,

    /// Band half-width around the line, pixels
    #[arg(long, default_value_t = 2.0)]
    band: f32,

    /// Minimum blob area, square pixels
    #[arg(long, default_value_t = 500.0)]
    min_area: f32,

    /// Process without a display window
    #[arg(long)]
    headless: bool,
}

fn draw_track(frame: &mut Mat, track: &Track) -> opencv::Result<()> {
    let rect = core::Rect::new(
        track.bbox.left() as i32,
        track.bbox.top() as i32,
        track.bbox.width() as i32,
        track.bbox.height() as i32,
    );

    imgproc::rectangle(
        frame,
        rect,
        core::Scalar::new(0.0, 255.0, 0.0, 0.0),
        2,
        imgproc::LINE_8,
        0,
    )?;

    imgproc::put_text(
        frame,
        &format!("{}", track.track_id),
        core::Point::new(rect.x, rect.y - 6),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.5,
        core::Scalar::new(0.0, 255.0, 0.0, 0.0),
        1,
        imgproc::LINE_AA,
        false,
    )?;

    Ok(())
}

fn draw_line(frame: &mut Mat, line: &CountingLine) -> opencv::Result<()> {
    let (a, b) = line.endpoints();

    imgproc::line(
        frame,
        core::Point::new(a.x as i32, a.y as i32),
        core::Point::new(b.x as i32, b.y as i32),
        core::Scalar::new(0.0, 0.0, 255.0, 0.0),
        2,
        imgproc::LINE_8,
        0,
    )
}

fn draw_hud(frame: &mut Mat, count: u64) -> opencv::Result<()> {
    imgproc::put_text(
        frame,
        &format!("Car Count: {}", count),
        core::Point::new(10, 50),
        imgproc::FONT_HERSHEY_SIMPLEX,
        1.0,
        core::Scalar::new(255.0, 255.0, 255.0, 0.0),
        2,
        imgproc::LINE_AA,
        false,
    )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let opts = Opts::parse();

    let mut cam = videoio::VideoCapture::from_file(&opts.input, videoio::CAP_ANY)?;
    if !videoio::VideoCapture::is_opened(&cam)? {
        anyhow::bail!("unable to open video source: {}", opts.input);
    }

    let width = cam.get(videoio::CAP_PROP_FRAME_WIDTH)? as f32;
    let line = CountingLine::with_band(opts.line_y, 0.0, width, opts.band);

    let mut config = CounterConfig::new(line.clone());
    config.detector = BlobDetectorConfig::new(opts.min_area);
    let mut counter = BlobCounter::new(config);

    let window = "vehicle count";
    if !opts.headless {
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
    }

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
        counter.update(&frame, &opts.input)?;

        if opts.headless {
            continue;
        }

        for track in counter.tracks(&opts.input).iter() {
            draw_track(&mut frame, track)?;
        }
        draw_line(&mut frame, &line)?;
        draw_hud(&mut frame, counter.count(&opts.input))?;

        highgui::imshow(window, &frame)?;

        // any key stops after the current frame
        if highgui::wait_key(30)? >= 0 {
            break;
        }
    }

    tracing::info!(
        frames = frame_idx,
        count = counter.count(&opts.input),
        "finished"
    );

    Ok(())
}
