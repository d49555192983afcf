//! Frame containment.
//!
//! Membership is stored on the member (`frame_id`); frames keep no child
//! list. A member whose frame has been tombstoned is detached the next time
//! the frame's members are asked for.

use crate::id::ElementId;
use crate::mutate::{ElementUpdate, Scene};

fn set_frame(scene: &mut Scene, id: ElementId, frame_id: Option<ElementId>) -> bool {
    let before = scene.get_live(id).map(|e| e.version);
    let after = scene
        .mutate(
            id,
            ElementUpdate {
                frame_id: Some(frame_id),
                ..ElementUpdate::default()
            },
        )
        .map(|e| e.version);
    before.is_some() && before != after
}

/// Put `ids` into `frame_id`. Frames cannot be nested and a frame cannot
/// contain itself. Returns the ids whose membership changed.
pub fn add_to_frame(scene: &mut Scene, ids: &[ElementId], frame_id: ElementId) -> Vec<ElementId> {
    let is_frame = scene
        .get_live(frame_id)
        .is_some_and(|f| f.kind.is_frame());
    if !is_frame {
        log::debug!("add_to_frame: {frame_id} is not a live frame");
        return Vec::new();
    }
    let mut changed = Vec::new();
    for &id in ids {
        let eligible = id != frame_id && scene.get_live(id).is_some_and(|e| !e.kind.is_frame());
        if eligible && set_frame(scene, id, Some(frame_id)) {
            changed.push(id);
        }
    }
    changed
}

/// Detach `ids` from whatever frame they are in.
pub fn remove_from_frame(scene: &mut Scene, ids: &[ElementId]) -> Vec<ElementId> {
    let mut removed = Vec::new();
    for &id in ids {
        let member = scene.get_live(id).is_some_and(|e| e.frame_id.is_some());
        if member && set_frame(scene, id, None) {
            removed.push(id);
        }
    }
    removed
}

/// Live members of `frame_id` in z-order. If the frame itself is gone its
/// former members are detached and nothing is returned.
pub fn frame_members(scene: &mut Scene, frame_id: ElementId) -> Vec<ElementId> {
    let members: Vec<ElementId> = scene
        .iter_live()
        .filter(|e| e.frame_id == Some(frame_id))
        .map(|e| e.id)
        .collect();
    if scene.get_live(frame_id).is_none() {
        if !members.is_empty() {
            log::debug!("detaching {} members of deleted frame {frame_id}", members.len());
            remove_from_frame(scene, &members);
        }
        return Vec::new();
    }
    members
}

/// Read-only variant of [`frame_members`] for callers holding a shared
/// borrow. Dangling memberships are skipped, not repaired.
pub fn live_frame_members(scene: &Scene, frame_id: ElementId) -> Vec<ElementId> {
    if scene.get_live(frame_id).is_none() {
        return Vec::new();
    }
    scene
        .iter_live()
        .filter(|e| e.frame_id == Some(frame_id))
        .map(|e| e.id)
        .collect()
}
