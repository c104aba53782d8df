use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use glam::Vec3;

use crate::core::VirtualPose;
use crate::error::{Error, Result};

/// Everything the virtual camera lets a host tune.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Largest depth jump a triangle edge may span
    pub max_length: f32,
    /// Grid stride used for sampling and triangulation
    pub step_size: usize,
    pub pose: VirtualPose,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_length: 100.0,
            step_size: 2,
            pose: VirtualPose::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayTarget {
    Terminal,
    Window,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Synthetic,
    /// Directory of 16-bit PNG depth frames
    Playback(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunCommand {
    View(DisplayTarget),
    /// Grab the first processed frame and save it as PNG
    Snapshot(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub command: RunCommand,
    pub source: Source,
    pub dropout: f64,
    pub verbose: bool,
    pub settings: Settings,
}

/// Parse "x,y,z" into a vector.
pub fn parse_vec3(s: &str) -> std::result::Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected X,Y,Z but got '{s}'"));
    }
    let mut v = [0.0f32; 3];
    for (slot, part) in v.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number"))?;
    }
    Ok(Vec3::from_array(v))
}

fn camera_args() -> Vec<Arg> {
    vec![
        Arg::new("source")
            .short('s')
            .long("source")
            .value_name("SOURCE")
            .help("'synthetic', or a directory of 16-bit PNG depth frames")
            .default_value("synthetic"),
        Arg::new("step")
            .long("step")
            .value_name("N")
            .help("Grid stride for sampling and triangulation")
            .value_parser(value_parser!(usize)),
        Arg::new("max-length")
            .long("max-length")
            .value_name("DEPTH")
            .help("Largest depth difference a triangle edge may bridge")
            .value_parser(value_parser!(f32)),
        Arg::new("near")
            .long("near")
            .value_name("DIST")
            .help("Near clipping distance, maps to white")
            .value_parser(value_parser!(f32)),
        Arg::new("far")
            .long("far")
            .value_name("DIST")
            .help("Far clipping distance, maps to black")
            .value_parser(value_parser!(f32)),
        Arg::new("ortho-scale")
            .long("ortho-scale")
            .value_name("SCALE")
            .help("World units per output pixel")
            .value_parser(value_parser!(f32)),
        Arg::new("position")
            .long("position")
            .value_name("X,Y,Z")
            .allow_hyphen_values(true)
            .value_parser(parse_vec3),
        Arg::new("scene-rotation")
            .long("scene-rotation")
            .value_name("X,Y,Z")
            .help("Degrees")
            .allow_hyphen_values(true)
            .value_parser(parse_vec3),
        Arg::new("camera-rotation")
            .long("camera-rotation")
            .value_name("X,Y,Z")
            .help("Degrees")
            .allow_hyphen_values(true)
            .value_parser(parse_vec3),
        Arg::new("no-flip")
            .long("no-flip")
            .help("Disable the horizontal mirror")
            .action(ArgAction::SetTrue),
        Arg::new("dropout")
            .long("dropout")
            .value_name("FRACTION")
            .help("Synthetic source only: fraction of pixels reported without depth")
            .value_parser(value_parser!(f64))
            .default_value("0.0"),
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Log at debug level")
            .action(ArgAction::SetTrue),
    ]
}

pub fn create_clap_command() -> Command {
    Command::new("virtual_depth_camera")
        .about("Re-project a depth stream through a virtual orthographic camera")
        .version("0.1")
        .subcommand(
            Command::new("view")
                .about("Show the virtual depth image in a window or the terminal")
                .arg(
                    Arg::new("mode")
                        .short('m')
                        .long("mode")
                        .value_name("MODE")
                        .help("Specify the mode ('window', 'terminal', 'w', or 't')")
                        .value_parser(["window", "terminal", "w", "t"])
                        .default_value("window"),
                )
                .args(camera_args()),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Write the first virtual depth frame to a PNG file")
                .arg(
                    Arg::new("out")
                        .short('o')
                        .long("out")
                        .value_name("FILE")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .args(camera_args()),
        )
}

fn settings_from(matches: &ArgMatches) -> Settings {
    let mut settings = Settings::default();
    if let Some(&step) = matches.get_one::<usize>("step") {
        settings.step_size = step;
    }
    if let Some(&max_length) = matches.get_one::<f32>("max-length") {
        settings.max_length = max_length;
    }
    if let Some(&near) = matches.get_one::<f32>("near") {
        settings.pose.near = near;
    }
    if let Some(&far) = matches.get_one::<f32>("far") {
        settings.pose.far = far;
    }
    if let Some(&scale) = matches.get_one::<f32>("ortho-scale") {
        settings.pose.ortho_scale = scale;
    }
    if let Some(&position) = matches.get_one::<Vec3>("position") {
        settings.pose.position = position;
    }
    if let Some(&rotation) = matches.get_one::<Vec3>("scene-rotation") {
        settings.pose.scene_rotation = rotation;
    }
    if let Some(&rotation) = matches.get_one::<Vec3>("camera-rotation") {
        settings.pose.camera_rotation = rotation;
    }
    if matches.get_flag("no-flip") {
        settings.pose.horizontal_flip = false;
    }
    settings
}

fn options_from(command: RunCommand, matches: &ArgMatches) -> Result<RunOptions> {
    let source = match matches.get_one::<String>("source").map(String::as_str) {
        None | Some("synthetic") => Source::Synthetic,
        Some(dir) => Source::Playback(PathBuf::from(dir)),
    };
    let dropout = matches.get_one::<f64>("dropout").copied().unwrap_or(0.0);
    if !(0.0..=1.0).contains(&dropout) {
        return Err(Error::Config(format!(
            "dropout must be within 0..1, got {dropout}"
        )));
    }
    Ok(RunOptions {
        command,
        source,
        dropout,
        verbose: matches.get_flag("verbose"),
        settings: settings_from(matches),
    })
}

pub fn handle_clap_matches(matches: &ArgMatches) -> Result<RunOptions> {
    match matches.subcommand() {
        Some(("view", sub)) => {
            let target = match sub.get_one::<String>("mode").map(String::as_str) {
                Some("terminal" | "t") => DisplayTarget::Terminal,
                _ => DisplayTarget::Window,
            };
            options_from(RunCommand::View(target), sub)
        }
        Some(("snapshot", sub)) => {
            let out = sub
                .get_one::<PathBuf>("out")
                .cloned()
                .ok_or_else(|| Error::Config("snapshot needs --out".into()))?;
            options_from(RunCommand::Snapshot(out), sub)
        }
        // Default behavior when no subcommand is provided
        _ => Ok(RunOptions {
            command: RunCommand::View(DisplayTarget::Window),
            source: Source::Synthetic,
            dropout: 0.0,
            verbose: false,
            settings: Settings::default(),
        }),
    }
}
