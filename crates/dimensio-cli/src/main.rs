//! Dimensio command-line tool
//!
//! Inspects, validates and upgrades `.dio` project files and runs the
//! gap and alignment queries against them.

use dimensio_core::measure::frame_gap;
use dimensio_core::persist::{self, FORMAT_VERSION, read_document};
use dimensio_core::snap::{AlignLine, AxisSnap};
use dimensio_core::{
    Axis, ConfigError, EditError, EngineConfig, FrameId, PersistError, Project, Session, Workspace,
    WorkspaceError,
};
use kurbo::Rect;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use uuid::Uuid;

/// Environment variable naming an alternative config file.
const CONFIG_ENV: &str = "DIMENSIO_CONFIG";

const USAGE: &str = "\
Usage: dimensio <command> [args]

Commands:
  new <file>                       Create an empty project
  info <file>                      List layers and frames
  validate <file>                  Check a project file
  migrate <file> [<out>]           Rewrite a project in the current format
  gap <file> <frame> <frame>       Gap between two frames
  align <file> <frame> <dx> <dy>   Preview a snapped move
  help                             Show this message

Frames are referenced by id or by name.";

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}\n\n{usage}", usage = USAGE)]
    Usage(String),
    #[error("No frame matches '{0}'")]
    UnknownFrame(String),
    #[error("Several frames are named '{0}'; use the id")]
    AmbiguousFrame(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    New { path: PathBuf },
    Info { path: PathBuf },
    Validate { path: PathBuf },
    Migrate { path: PathBuf, out: Option<PathBuf> },
    Gap { path: PathBuf, a: String, b: String },
    Align { path: PathBuf, frame: String, dx: f64, dy: f64 },
    Help,
}

fn main() -> ExitCode {
    env_logger::init();

    let result = parse_args(std::env::args().skip(1)).and_then(|command| {
        let config = load_config()?;
        let mut out = io::stdout().lock();
        run(command, &config, &mut out)
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("dimensio: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<EngineConfig, ConfigError> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            log::info!("Using config from ${}", CONFIG_ENV);
            EngineConfig::load(Path::new(&path))
        }
        None => EngineConfig::load_default(),
    }
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command, CliError> {
    let mut args = args.into_iter();
    let Some(name) = args.next() else {
        return Ok(Command::Help);
    };
    let rest: Vec<String> = args.collect();

    let file = |index: usize| -> Result<PathBuf, CliError> {
        rest.get(index)
            .map(PathBuf::from)
            .ok_or_else(|| CliError::Usage(format!("'{name}' needs a project file")))
    };
    let text = |index: usize, what: &str| -> Result<String, CliError> {
        rest.get(index)
            .cloned()
            .ok_or_else(|| CliError::Usage(format!("'{name}' needs {what}")))
    };
    let number = |index: usize, what: &str| -> Result<f64, CliError> {
        let raw = text(index, what)?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CliError::Usage(format!("{what} must be a number, got '{raw}'")))
    };
    let expect_len = |len: usize| -> Result<(), CliError> {
        if rest.len() > len {
            Err(CliError::Usage(format!("Too many arguments for '{name}'")))
        } else {
            Ok(())
        }
    };

    let command = match name.as_str() {
        "new" => {
            expect_len(1)?;
            Command::New { path: file(0)? }
        }
        "info" => {
            expect_len(1)?;
            Command::Info { path: file(0)? }
        }
        "validate" => {
            expect_len(1)?;
            Command::Validate { path: file(0)? }
        }
        "migrate" => {
            expect_len(2)?;
            Command::Migrate {
                path: file(0)?,
                out: rest.get(1).map(PathBuf::from),
            }
        }
        "gap" => {
            expect_len(3)?;
            Command::Gap {
                path: file(0)?,
                a: text(1, "two frames")?,
                b: text(2, "two frames")?,
            }
        }
        "align" => {
            expect_len(4)?;
            Command::Align {
                path: file(0)?,
                frame: text(1, "a frame")?,
                dx: number(2, "dx")?,
                dy: number(3, "dy")?,
            }
        }
        "help" | "-h" | "--help" => Command::Help,
        other => return Err(CliError::Usage(format!("Unknown command '{other}'"))),
    };
    Ok(command)
}

fn run(command: Command, config: &EngineConfig, out: &mut impl Write) -> Result<(), CliError> {
    log::debug!("Running {:?}", command);
    match command {
        Command::Help => writeln!(out, "{USAGE}")?,
        Command::New { path } => {
            let mut workspace = Workspace::new(config.clone());
            let written = workspace.save_as(&path)?;
            writeln!(out, "Created {}", written.display())?;
        }
        Command::Info { path } => {
            let (project, version) = read_document(&path)?;
            print_info(&project, version, out)?;
        }
        Command::Validate { path } => {
            let (project, version) = read_document(&path)?;
            writeln!(
                out,
                "{}: valid (format v{}, {} frames)",
                path.display(),
                version,
                project.len()
            )?;
        }
        Command::Migrate { path, out: target } => {
            let (project, version) = read_document(&path)?;
            let target = target.unwrap_or_else(|| path.clone());
            if version == FORMAT_VERSION && target == path {
                writeln!(out, "{} is already at format v{}", path.display(), version)?;
            } else {
                let written = persist::write(&target, &project)?;
                writeln!(
                    out,
                    "Migrated {} from v{} to v{} -> {}",
                    path.display(),
                    version,
                    FORMAT_VERSION,
                    written.display()
                )?;
            }
        }
        Command::Gap { path, a, b } => {
            let project = persist::load(&path)?;
            let a = frame_named(&project, &a)?;
            let b = frame_named(&project, &b)?;
            let spacing = frame_gap(&project, a, b).ok_or(EditError::UnknownFrame(a))?;
            writeln!(out, "horizontal: {}px", spacing.horizontal)?;
            writeln!(out, "vertical: {}px", spacing.vertical)?;
            if spacing.is_overlapping() {
                writeln!(out, "frames overlap")?;
            }
        }
        Command::Align { path, frame, dx, dy } => {
            let project = persist::load(&path)?;
            let id = frame_named(&project, &frame)?;
            let session = Session::with_project(project, config.clone());
            let (rect, alignment) = session.preview_move(id, dx, dy)?;
            writeln!(out, "{}", describe_rect(rect))?;
            for axis in [Axis::X, Axis::Y] {
                match alignment.axis(axis) {
                    Some(snap) => writeln!(out, "{}", describe_snap(axis, snap))?,
                    None => writeln!(out, "{}: free", axis_label(axis))?,
                }
            }
            writeln!(out, "guides: {}", alignment.guides.len())?;
        }
    }
    Ok(())
}

fn print_info(project: &Project, version: u32, out: &mut impl Write) -> Result<(), CliError> {
    writeln!(
        out,
        "format v{} (app {}), {} frames in {} layers",
        version,
        if project.app_version().is_empty() { "unknown" } else { project.app_version() },
        project.len(),
        project.layers().len()
    )?;
    for layer in project.layers() {
        writeln!(out, "{} [{}]", layer.name(), layer.color())?;
        for frame in layer.frame_ids().iter().filter_map(|id| project.frame(*id)) {
            let mut flags = String::new();
            if project.active_frame_id() == Some(frame.id()) {
                flags.push_str(" active");
            }
            if frame.is_locked() {
                flags.push_str(" locked");
            }
            if !frame.is_visible() {
                flags.push_str(" hidden");
            }
            writeln!(
                out,
                "  {} @ {},{} {}{}",
                frame.name(),
                frame.x(),
                frame.y(),
                frame.dimensions_text(),
                flags
            )?;
        }
    }
    Ok(())
}

/// Find a frame by id, or by exact name.
fn frame_named(project: &Project, key: &str) -> Result<FrameId, CliError> {
    if let Ok(id) = Uuid::parse_str(key) {
        if project.frame(id).is_some() {
            return Ok(id);
        }
    }
    let mut matches = project.frames_ordered().into_iter().filter(|f| f.name() == key);
    let found = matches.next().ok_or_else(|| CliError::UnknownFrame(key.to_string()))?;
    if matches.next().is_some() {
        return Err(CliError::AmbiguousFrame(key.to_string()));
    }
    Ok(found.id())
}

fn describe_rect(rect: Rect) -> String {
    format!("{},{} {}x{}", rect.x0, rect.y0, rect.width(), rect.height())
}

fn axis_label(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "x",
        Axis::Y => "y",
    }
}

fn describe_snap(axis: Axis, snap: &AxisSnap) -> String {
    let line = match (axis, snap.line) {
        (Axis::X, AlignLine::Start) => "left",
        (Axis::X, AlignLine::Center) => "center",
        (Axis::X, AlignLine::End) => "right",
        (Axis::Y, AlignLine::Start) => "top",
        (Axis::Y, AlignLine::Center) => "middle",
        (Axis::Y, AlignLine::End) => "bottom",
    };
    format!(
        "{}: {} snapped to {} ({} frames)",
        axis_label(axis),
        line,
        snap.target,
        snap.matched.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimensio_core::Frame;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn output(command: Command) -> String {
        let mut out = Vec::new();
        run(command, &EngineConfig::default(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Two frames: "A" at (0,0) 100x100 and "B" at (150,0) 100x100.
    fn two_frames(path: &Path) {
        let mut session = Session::default();
        let a = session.create_frame(None).unwrap();
        let b = session.create_frame(None).unwrap();
        session.rename(a, "A").unwrap();
        session.rename(b, "B").unwrap();
        for (id, x) in [(a, 0.0), (b, 150.0)] {
            let frame: &Frame = session.project().frame(id).unwrap();
            let (dx, dy) = (x - frame.x(), -frame.y());
            session.move_by(id, dx, dy).unwrap();
            session.set_extent(id, Axis::X, 100.0).unwrap();
            session.set_extent(id, Axis::Y, 100.0).unwrap();
        }
        persist::write(path, session.project()).unwrap();
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_args(args(&[])).unwrap(), Command::Help);
        assert_eq!(
            parse_args(args(&["info", "a.dio"])).unwrap(),
            Command::Info { path: "a.dio".into() }
        );
        assert_eq!(
            parse_args(args(&["migrate", "old.dio", "new.dio"])).unwrap(),
            Command::Migrate {
                path: "old.dio".into(),
                out: Some("new.dio".into())
            }
        );
        assert_eq!(
            parse_args(args(&["align", "a.dio", "Header", "-5", "2.5"])).unwrap(),
            Command::Align {
                path: "a.dio".into(),
                frame: "Header".into(),
                dx: -5.0,
                dy: 2.5
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_args(args(&["frobnicate"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args(&["info"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args(&["info", "a", "b"])), Err(CliError::Usage(_))));
        assert!(matches!(
            parse_args(args(&["align", "a.dio", "A", "left", "0"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(args(&["migrate", "a.dio", "b.dio", "c.dio"])),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn test_new_and_info() {
        let dir = tempfile::tempdir().unwrap();
        let text = output(Command::New {
            path: dir.path().join("fresh"),
        });
        assert!(text.contains("fresh.dio"));

        let text = output(Command::Info {
            path: dir.path().join("fresh.dio"),
        });
        assert!(text.starts_with("format v3"));
        assert!(text.contains("0 frames in 0 layers"));
    }

    #[test]
    fn test_gap_between_named_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.dio");
        two_frames(&path);

        let text = output(Command::Gap {
            path: path.clone(),
            a: "A".into(),
            b: "B".into(),
        });
        assert!(text.contains("horizontal: 50px"));
        assert!(text.contains("vertical: -100px"));
        assert!(!text.contains("frames overlap"));

        let mut sink = Vec::new();
        let err = run(
            Command::Gap {
                path,
                a: "A".into(),
                b: "C".into(),
            },
            &EngineConfig::default(),
            &mut sink,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::UnknownFrame(name) if name == "C"));
    }

    #[test]
    fn test_align_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.dio");
        two_frames(&path);

        // Dragging B 48px left brings its left edge within 4px of A's right edge.
        let text = output(Command::Align {
            path,
            frame: "B".into(),
            dx: -48.0,
            dy: 0.0,
        });
        assert!(text.contains("x: left snapped to 100"));
        assert!(text.starts_with("100,0 100x100"));
    }

    #[test]
    fn test_migrate_legacy_file() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.dio");
        std::fs::write(
            &old,
            r#"{"version": "1.0", "frames": [{"title": "Nav", "x": 0, "y": 0, "width": 80, "height": 600}]}"#,
        )
        .unwrap();

        let text = output(Command::Migrate {
            path: old.clone(),
            out: Some(dir.path().join("new.dio")),
        });
        assert!(text.contains("from v1 to v3"));

        let (project, version) = read_document(&dir.path().join("new.dio")).unwrap();
        assert_eq!(version, 3);
        assert_eq!(project.len(), 1);

        let text = output(Command::Migrate {
            path: dir.path().join("new.dio"),
            out: None,
        });
        assert!(text.contains("already at format v3"));
    }
}
