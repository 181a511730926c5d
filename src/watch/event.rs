// src/watch/event.rs

use std::path::PathBuf;

use notify::event::{EventKind, ModifyKind, RenameMode};
use tracing::trace;

use crate::types::ChangeKind;

/// One filesystem change below the watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Everything observed during one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub events: Vec<ChangeEvent>,
    /// The backend lost track of individual events; treat as "changed".
    pub overflow: bool,
}

impl ChangeBatch {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_changes(&self) -> bool {
        self.overflow || !self.events.is_empty()
    }
}

/// What the notify callback forwards into the watcher's channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSignal {
    Change(ChangeEvent),
    Overflow,
    Error(String),
}

/// Translate one notify callback result into zero or more signals.
///
/// Access events and metadata-only modifications (mtime, permissions) are
/// dropped. Renames become a removal of the old name and a creation of the
/// new one, so a directory moved into the tree gets registered.
pub fn signals_from_notify(res: notify::Result<notify::Event>) -> Vec<WatchSignal> {
    let event = match res {
        Ok(event) => event,
        Err(err) => return vec![WatchSignal::Error(err.to_string())],
    };

    if event.need_rescan() {
        return vec![WatchSignal::Overflow];
    }

    let per_path = |kind: ChangeKind| -> Vec<WatchSignal> {
        if event.paths.is_empty() {
            return vec![WatchSignal::Overflow];
        }
        event
            .paths
            .iter()
            .map(|p| WatchSignal::Change(ChangeEvent::new(kind, p.clone())))
            .collect()
    };

    match event.kind {
        EventKind::Create(_) => per_path(ChangeKind::Created),
        EventKind::Remove(_) => per_path(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => {
            trace!(?event, "ignoring metadata/access event");
            Vec::new()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => per_path(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => per_path(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => vec![
            WatchSignal::Change(ChangeEvent::new(ChangeKind::Removed, event.paths[0].clone())),
            WatchSignal::Change(ChangeEvent::new(ChangeKind::Created, event.paths[1].clone())),
        ],
        EventKind::Modify(_) | EventKind::Any => per_path(ChangeKind::Modified),
        EventKind::Other => {
            trace!(?event, "ignoring backend-specific event");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, MetadataKind, RemoveKind};
    use notify::Event;

    #[test]
    fn create_and_remove_map_to_change_kinds() {
        let created = Event::new(EventKind::Create(CreateKind::File)).add_path("/r/a".into());
        assert_eq!(
            signals_from_notify(Ok(created)),
            vec![WatchSignal::Change(ChangeEvent::new(ChangeKind::Created, "/r/a"))]
        );

        let removed = Event::new(EventKind::Remove(RemoveKind::Folder)).add_path("/r/d".into());
        assert_eq!(
            signals_from_notify(Ok(removed)),
            vec![WatchSignal::Change(ChangeEvent::new(ChangeKind::Removed, "/r/d"))]
        );
    }

    #[test]
    fn metadata_and_access_noise_is_dropped() {
        let meta = Event::new(EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)))
            .add_path("/r/a".into());
        let access = Event::new(EventKind::Access(AccessKind::Any)).add_path("/r/a".into());
        assert!(signals_from_notify(Ok(meta)).is_empty());
        assert!(signals_from_notify(Ok(access)).is_empty());
    }

    #[test]
    fn rescan_and_pathless_events_are_overflow() {
        let rescan = Event::new(EventKind::Any).set_flag(notify::event::Flag::Rescan);
        assert_eq!(signals_from_notify(Ok(rescan)), vec![WatchSignal::Overflow]);

        let pathless = Event::new(EventKind::Create(CreateKind::Any));
        assert_eq!(signals_from_notify(Ok(pathless)), vec![WatchSignal::Overflow]);
    }

    #[test]
    fn rename_both_splits_into_remove_and_create() {
        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path("/r/old".into())
            .add_path("/r/new".into());
        assert_eq!(
            signals_from_notify(Ok(renamed)),
            vec![
                WatchSignal::Change(ChangeEvent::new(ChangeKind::Removed, "/r/old")),
                WatchSignal::Change(ChangeEvent::new(ChangeKind::Created, "/r/new")),
            ]
        );
    }
}
