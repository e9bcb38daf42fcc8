//! End-to-end tests for project files: saving, loading, migration and
//! background writes.

use dimensio_core::model::Corner;
use dimensio_core::persist::{self, read_document};
use dimensio_core::{
    Axis, EngineConfig, FORMAT_VERSION, FrameColor, PersistError, SaveState, SaveWorker, Session,
    Workspace, WorkspaceError,
};
use kurbo::Rect;
use std::fs;
use std::thread;

fn populated_session() -> Session {
    let mut session = Session::new(EngineConfig::default());
    let header = session.create_frame(None).unwrap();
    session.rename(header, "Header").unwrap();
    session.set_extent(header, Axis::X, 1280.0).unwrap();
    session.set_extent(header, Axis::Y, 72.5).unwrap();
    session.set_radius(header, Corner::TopLeft, 8.0).unwrap();

    let sidebar = session.create_frame(None).unwrap();
    session.move_by(sidebar, 0.1, 0.2).unwrap();
    session.set_color(sidebar, FrameColor::from_rgba8(10, 20, 30, 128)).unwrap();
    session.set_filled(sidebar, false).unwrap();
    session.set_locked(sidebar, true).unwrap();

    let layer = session.add_layer("Overlays", FrameColor::palette(3));
    session.create_frame(Some(layer)).unwrap();
    session.select(Some(header)).unwrap();
    session
}

#[test]
fn test_save_and_reload_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let session = populated_session();

    let path = persist::write(&dir.path().join("layout"), session.project()).unwrap();
    assert_eq!(path.extension().unwrap(), "dio");

    let (loaded, version) = read_document(&path).unwrap();
    assert_eq!(version, FORMAT_VERSION);
    assert_eq!(&loaded, session.project());

    // Saving the reloaded project produces the same bytes.
    let first = fs::read(&path).unwrap();
    let again = persist::write(&dir.path().join("again.dio"), &loaded).unwrap();
    assert_eq!(fs::read(again).unwrap(), first);
}

#[test]
fn test_load_legacy_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.dio");
    fs::write(
        &path,
        r##"{
            "version": "1.0",
            "app_version": "1.0.3",
            "created_at": "2023-11-02T09:15:00",
            "frames": [
                {
                    "id": "0f5c2b1e-8a4d-4c3b-9e2f-6a7b8c9d0e1f",
                    "title": "Hero",
                    "x": 0, "y": 0, "width": 1440, "height": 600,
                    "bg_color": "rgba(0, 180, 255, 40)",
                    "border_color": "#e74c3c",
                    "radii": {"tl": 12, "tr": 12, "bl": 0, "br": 0},
                    "locked": true,
                    "fill_enabled": false
                },
                {
                    "title": "Card",
                    "x": 40, "y": 640, "width": 20, "height": 300,
                    "radii": 16
                }
            ]
        }"##,
    )
    .unwrap();

    let (project, version) = read_document(&path).unwrap();
    assert_eq!(version, 1);
    assert_eq!(project.len(), 2);
    assert_eq!(project.layers().len(), 1);
    assert!(project.validate().is_valid());

    let ordered = project.frames_ordered();
    let hero = ordered[0];
    assert_eq!(hero.name(), "Hero");
    assert_eq!(hero.bounds(), Rect::new(0.0, 0.0, 1440.0, 600.0));
    assert!(hero.is_locked());
    assert!(!hero.is_filled());
    assert_eq!(hero.radius().get(Corner::TopLeft), 12.0);
    assert_eq!(hero.color().as_str(), "#e74c3c");

    // The uniform legacy radius is clamped to half the narrow side.
    let card = ordered[1];
    assert_eq!(card.name(), "Card");
    assert_eq!(card.radius().get(Corner::BottomRight), 10.0);
    assert!(card.is_visible());

    let layer = &project.layers()[0];
    assert_eq!(layer.frame_ids(), &[hero.id(), card.id()]);
    assert_eq!(layer.color().as_str(), "#e74c3c");
    assert_eq!(project.active_frame_id(), None);

    // Resaving writes the current format.
    let resaved = persist::write(&dir.path().join("resaved.dio"), &project).unwrap();
    assert_eq!(read_document(&resaved).unwrap().1, FORMAT_VERSION);
}

#[test]
fn test_future_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.dio");
    fs::write(&path, r#"{"formatVersion": 42, "frames": {}, "layers": []}"#).unwrap();

    let err = persist::load(&path).unwrap_err();
    assert!(matches!(err, PersistError::FutureVersion { found: 42, .. }));
}

#[test]
fn test_aborted_write_keeps_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keep.dio");
    let session = populated_session();
    persist::write(&path, session.project()).unwrap();
    let before = fs::read(&path).unwrap();

    let staged = persist::stage(&path, &dimensio_core::Project::new()).unwrap();
    drop(staged);

    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_racing_writers_leave_a_loadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.dio");

    let projects: Vec<_> = (0..4)
        .map(|n| {
            let mut session = Session::default();
            for _ in 0..=n {
                session.create_frame(None).unwrap();
            }
            session.project().clone()
        })
        .collect();

    let handles: Vec<_> = projects
        .iter()
        .cloned()
        .map(|project| {
            let path = path.clone();
            thread::spawn(move || persist::write(&path, &project).map(|_| ()))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let loaded = persist::load(&path).unwrap();
    assert!(projects.contains(&loaded));
}

#[test]
fn test_background_save_through_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let mut worker = SaveWorker::new();
    let mut workspace = Workspace::new(EngineConfig::default());
    let path = workspace.save_as(&dir.path().join("bg")).unwrap();

    let id = workspace.session_mut().create_frame(None).unwrap();
    workspace.save_in_background(&mut worker).unwrap();
    assert_eq!(workspace.save_state(), SaveState::Saving);
    assert!(matches!(
        workspace.save_in_background(&mut worker),
        Err(WorkspaceError::Persist(PersistError::SaveInProgress))
    ));

    let outcome = worker.wait().unwrap();
    assert_eq!(workspace.finish_background_save(outcome).unwrap(), path);
    assert_eq!(workspace.save_state(), SaveState::Saved);
    assert!(persist::load(&path).unwrap().frame(id).is_some());
}

#[test]
fn test_new_project_autosaves_previous() {
    let dir = tempfile::tempdir().unwrap();
    let mut workspace = Workspace::default();
    let path = workspace.save_as(&dir.path().join("draft.dio")).unwrap();
    let id = workspace.session_mut().create_frame(None).unwrap();
    assert_eq!(workspace.title(), "draft.dio*");

    workspace.new_workspace();
    assert_eq!(workspace.title(), "Unsaved Project");
    assert!(persist::load(&path).unwrap().frame(id).is_some());
}
