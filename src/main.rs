use std::fs::File;
use std::io::stdout;
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use glam::Vec3;
use log::{error, info, LevelFilter};
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode, WriteLogger};

use virtual_depth_camera::{
    config::{DisplayTarget, RunCommand, RunOptions, Source},
    create_clap_command, handle_clap_matches, preview, DepthSensor, Error, FrameBuffer,
    Intrinsics, PlaybackSensor, Result, SoftwareRenderer, SyntheticSensor, VirtualDepthCamera,
    KINECT_V2,
};

type Camera<S> = VirtualDepthCamera<S, SoftwareRenderer>;

/// Ticks to wait for the first frame before a snapshot gives up.
const SNAPSHOT_TICKS: usize = 300;

fn main() -> Result<()> {
    let matches = create_clap_command().get_matches();
    let opts = handle_clap_matches(&matches)?;
    init_logging(&opts)?;

    let result = match &opts.source {
        Source::Synthetic => run(
            SyntheticSensor::new(KINECT_V2, Intrinsics::KINECT_V2).with_dropout(opts.dropout),
            &opts,
        ),
        Source::Playback(dir) => run(
            PlaybackSensor::new(dir, KINECT_V2, Intrinsics::KINECT_V2),
            &opts,
        ),
    };
    if let Err(e) = &result {
        error!("{e}");
    }
    result
}

fn init_logging(opts: &RunOptions) -> Result<()> {
    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // log lines would tear through the ANSI preview, send them to a file
    match opts.command {
        RunCommand::View(DisplayTarget::Terminal) => {
            let file = File::create("virtual_depth_camera.log")?;
            WriteLogger::init(level, Config::default(), file)
        }
        _ => TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
    }
    .map_err(|e| Error::Config(e.to_string()))
}

fn run<S: DepthSensor>(sensor: S, opts: &RunOptions) -> Result<()> {
    let mut camera = VirtualDepthCamera::new(sensor, SoftwareRenderer::new(1, 1));
    camera.apply(&opts.settings);
    camera.setup()?;

    let result = match &opts.command {
        RunCommand::View(DisplayTarget::Window) => run_win(&mut camera),
        RunCommand::View(DisplayTarget::Terminal) => run_term(&mut camera),
        RunCommand::Snapshot(path) => snapshot(&mut camera, path),
    };

    // the run's own error takes precedence
    let closed = camera.close();
    if let Err(e) = &closed {
        error!("closing sensor: {e}");
    }
    result.and(closed)
}

fn snapshot<S: DepthSensor>(camera: &mut Camera<S>, path: &Path) -> Result<()> {
    for _ in 0..SNAPSHOT_TICKS {
        camera.update();
        if camera.is_frame_new() {
            camera.pixels().save(path)?;
            info!("wrote {}", path.display());
            return Ok(());
        }
    }
    Err(Error::SensorUnavailable(format!(
        "no frame within {SNAPSHOT_TICKS} updates"
    )))
}

fn run_win<S: DepthSensor>(camera: &mut Camera<S>) -> Result<()> {
    let (width, height) = (camera.width(), camera.height());
    let mut window = Window::new(
        "Virtual Depth Camera - Window Mode",
        width,
        height,
        WindowOptions {
            resize: false,
            scale: Scale::X2,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(30);

    let mut screen = FrameBuffer::new(width, height);
    let mut last_frame = Instant::now();
    while window.is_open() {
        if window.is_key_down(Key::Escape) || window.is_key_down(Key::Q) {
            break;
        }
        let delta = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();
        window_handle_input(&window, camera, delta);

        camera.update();
        if camera.is_frame_new() {
            camera.draw(&mut screen, 0.0, 0.0);
        }
        screen.present_window(&mut window)?;
    }

    Ok(())
}

fn window_handle_input<S: DepthSensor>(window: &Window, camera: &mut Camera<S>, delta: f32) {
    // Base speeds
    let rotate_speed = 45.0; // Degrees per second
    let move_speed = 300.0; // World units per second

    let pose = *camera.pose();
    let mut rotation = pose.scene_rotation;
    let mut position = pose.position;
    for key in window.get_keys() {
        match key {
            Key::Up => rotation.x += rotate_speed * delta,
            Key::Down => rotation.x -= rotate_speed * delta,
            Key::Left => rotation.y -= rotate_speed * delta,
            Key::Right => rotation.y += rotate_speed * delta,
            Key::W => position.z += move_speed * delta,
            Key::S => position.z -= move_speed * delta,
            _ => {}
        }
    }
    camera.set_scene_rotation(rotation);
    camera.set_position(position);

    for key in window.get_keys_pressed(KeyRepeat::No) {
        match key {
            Key::F => camera.set_horizontal_flip(!pose.horizontal_flip),
            Key::Equal => camera.set_ortho_scale(pose.ortho_scale * 0.8),
            Key::Minus => camera.set_ortho_scale(pose.ortho_scale * 1.25),
            Key::R => {
                camera.set_scene_rotation(Vec3::ZERO);
                camera.set_position(Vec3::ZERO);
            }
            _ => {}
        }
    }
}

fn run_term<S: DepthSensor>(camera: &mut Camera<S>) -> Result<()> {
    // 1) Setup crossterm
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(
        stdout,
        terminal::EnterAlternateScreen,
        Hide,
        Clear(ClearType::All)
    )?;

    let result = term_loop(camera);

    // 2) Cleanup, even when the loop failed
    let restored = disable_raw_mode()
        .and_then(|()| execute!(stdout, Show, terminal::LeaveAlternateScreen))
        .map_err(Error::from);
    if let Err(e) = &restored {
        error!("restoring terminal: {e}");
    }
    result.and(restored)
}

fn term_loop<S: DepthSensor>(camera: &mut Camera<S>) -> Result<()> {
    let mut last_frame = Instant::now();
    let frame_duration = Duration::from_millis(33);

    loop {
        if event::poll(Duration::from_millis(1))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => break,
                    KeyCode::Char('f') => {
                        let flip = camera.pose().horizontal_flip;
                        camera.set_horizontal_flip(!flip);
                    }
                    _ => {}
                }
            }
        }

        let now = Instant::now();
        if now - last_frame >= frame_duration {
            camera.update();
            if camera.is_frame_new() {
                let (cols, rows) = terminal::size()?;
                preview::present_terminal(camera.pixels(), cols as usize, rows as usize)?;
            }
            last_frame = now;
        }
    }
    Ok(())
}
