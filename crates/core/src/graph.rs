//! The scene/story graph: every generated scene plus the current selection.
//!
//! Owned by the session controller; all mutation goes through the methods
//! here so derived views (history listing, story listing) never observe a
//! half-updated collection. Persistence is the controller's concern, not
//! this store's.

use crate::error::CoreError;
use crate::overlay::{LogoOverlay, TextOverlay};
use crate::scene::Scene;

/// In-memory collection of scenes with a selection pointer.
#[derive(Debug, Default)]
pub struct SceneStore {
    scenes: Vec<Scene>,
    selected: Option<String>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- reads ---------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// All scenes sorted by creation time descending (newest first).
    pub fn history(&self) -> Vec<&Scene> {
        let mut scenes: Vec<&Scene> = self.scenes.iter().collect();
        scenes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        scenes
    }

    /// The story any scene belongs to: root first, then children sorted
    /// ascending by scene number.
    pub fn derive_story(&self, id: &str) -> Result<Vec<&Scene>, CoreError> {
        let scene = self.get(id).ok_or(CoreError::NotFound {
            entity: "scene",
            id: id.to_string(),
        })?;
        let root_id = scene.story_root_id().to_string();
        let root = self.get(&root_id).ok_or(CoreError::NotFound {
            entity: "scene",
            id: root_id.clone(),
        })?;

        let mut children: Vec<&Scene> = self
            .scenes
            .iter()
            .filter(|s| s.parent_id() == Some(root_id.as_str()))
            .collect();
        children.sort_by_key(|s| s.scene_number());

        let mut story = vec![root];
        story.extend(children);
        Ok(story)
    }

    /// Scene number the next addition to `root_id`'s story would take:
    /// (root + children) + 1.
    pub fn next_scene_number(&self, root_id: &str) -> u32 {
        let count = self
            .scenes
            .iter()
            .filter(|s| s.id == root_id || s.parent_id() == Some(root_id))
            .count();
        count as u32 + 1
    }

    pub fn selected(&self) -> Option<&Scene> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    // -- mutations -----------------------------------------------------------

    /// Insert a newly generated scene and select it.
    ///
    /// A child scene's parent must already be present and must itself be a
    /// root (story chains never nest deeper), and the child's scene number
    /// must be the story's next slot. Violations are logic errors from the
    /// workflow layer, not user-facing conditions.
    pub fn append(&mut self, scene: Scene) -> Result<(), CoreError> {
        if self.get(&scene.id).is_some() {
            return Err(CoreError::Conflict(format!(
                "Scene {} already exists",
                scene.id
            )));
        }
        if let Some(parent_id) = scene.parent_id() {
            let parent = self.get(parent_id).ok_or(CoreError::NotFound {
                entity: "parent scene",
                id: parent_id.to_string(),
            })?;
            if !parent.is_root() {
                return Err(CoreError::Validation(format!(
                    "Scene {parent_id} is not a story root; stories are two levels deep"
                )));
            }
            let expected = self.next_scene_number(parent_id);
            if scene.scene_number() != expected {
                return Err(CoreError::Validation(format!(
                    "Scene number {} out of order; expected {expected}",
                    scene.scene_number()
                )));
            }
        }
        self.selected = Some(scene.id.clone());
        self.scenes.push(scene);
        Ok(())
    }

    /// Remove a scene; removing a root cascades to all of its children.
    ///
    /// If the selection is removed it falls back to the most recently
    /// created remaining scene, or to none.
    pub fn delete(&mut self, id: &str) {
        self.scenes
            .retain(|s| s.id != id && s.parent_id() != Some(id));

        let selection_gone = match self.selected.as_deref() {
            Some(sel) => self.get(sel).is_none(),
            None => false,
        };
        if selection_gone {
            self.selected = self.history().first().map(|newest| newest.id.clone());
        }
    }

    /// Point the selection at an existing scene.
    pub fn select(&mut self, id: &str) -> Result<(), CoreError> {
        if self.get(id).is_none() {
            return Err(CoreError::NotFound {
                entity: "scene",
                id: id.to_string(),
            });
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// Replace a scene's text overlay collection.
    pub fn set_text_overlays(
        &mut self,
        id: &str,
        overlays: Vec<TextOverlay>,
    ) -> Result<(), CoreError> {
        let scene = self.get_mut(id)?;
        scene.text_overlays = overlays;
        Ok(())
    }

    /// Replace (or clear) a scene's logo overlay.
    pub fn set_logo(&mut self, id: &str, logo: Option<LogoOverlay>) -> Result<(), CoreError> {
        let scene = self.get_mut(id)?;
        scene.logo = logo;
        Ok(())
    }

    /// Swap in a loaded history, selecting the newest scene.
    pub fn replace_all(&mut self, scenes: Vec<Scene>) {
        self.scenes = scenes;
        self.selected = self.history().first().map(|newest| newest.id.clone());
    }

    /// Snapshot of every scene, for persistence.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Scene, CoreError> {
        self.scenes
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(CoreError::NotFound {
                entity: "scene",
                id: id.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::AdBrief;
    use crate::scene::StoryLink;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    fn scene(id: &str, minutes_ago: i64, link: StoryLink) -> Scene {
        let brief = AdBrief::default();
        Scene::from_brief(
            id.to_string(),
            Utc::now() - Duration::minutes(minutes_ago),
            &brief,
            vec!["Line.".to_string()],
            link,
        )
    }

    fn store_with_story() -> SceneStore {
        let mut store = SceneStore::new();
        store.append(scene("scene_a", 30, StoryLink::Root)).unwrap();
        store
            .append(scene(
                "scene_b",
                20,
                StoryLink::child("scene_a", 2).unwrap(),
            ))
            .unwrap();
        store
            .append(scene(
                "scene_c",
                10,
                StoryLink::child("scene_a", 3).unwrap(),
            ))
            .unwrap();
        store
    }

    // -- append --

    #[test]
    fn append_selects_new_scene() {
        let mut store = SceneStore::new();
        store.append(scene("scene_a", 0, StoryLink::Root)).unwrap();
        assert_eq!(store.selected_id(), Some("scene_a"));
    }

    #[test]
    fn append_rejects_missing_parent() {
        let mut store = SceneStore::new();
        let orphan = scene("scene_b", 0, StoryLink::child("scene_a", 2).unwrap());
        assert_matches!(store.append(orphan), Err(CoreError::NotFound { .. }));
    }

    #[test]
    fn append_rejects_child_of_child() {
        let mut store = store_with_story();
        let nested = scene("scene_d", 0, StoryLink::child("scene_b", 2).unwrap());
        assert_matches!(store.append(nested), Err(CoreError::Validation(_)));
    }

    #[test]
    fn append_rejects_duplicate_id() {
        let mut store = SceneStore::new();
        store.append(scene("scene_a", 0, StoryLink::Root)).unwrap();
        assert_matches!(
            store.append(scene("scene_a", 0, StoryLink::Root)),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn append_rejects_out_of_order_scene_number() {
        let mut store = SceneStore::new();
        store.append(scene("scene_a", 0, StoryLink::Root)).unwrap();
        let skipped = scene("scene_b", 0, StoryLink::child("scene_a", 3).unwrap());
        assert_matches!(store.append(skipped), Err(CoreError::Validation(_)));
    }

    // -- derive_story --

    #[test]
    fn derive_story_from_root() {
        let store = store_with_story();
        let story = store.derive_story("scene_a").unwrap();
        let ids: Vec<&str> = story.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["scene_a", "scene_b", "scene_c"]);
    }

    #[test]
    fn derive_story_from_child_finds_same_story() {
        let store = store_with_story();
        let story = store.derive_story("scene_c").unwrap();
        let ids: Vec<&str> = story.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["scene_a", "scene_b", "scene_c"]);
    }

    #[test]
    fn derive_story_single_scene() {
        let mut store = SceneStore::new();
        store.append(scene("scene_a", 0, StoryLink::Root)).unwrap();
        let story = store.derive_story("scene_a").unwrap();
        assert_eq!(story.len(), 1);
    }

    #[test]
    fn derive_story_unknown_scene() {
        let store = SceneStore::new();
        assert_matches!(
            store.derive_story("scene_zzz"),
            Err(CoreError::NotFound { .. })
        );
    }

    #[test]
    fn derive_story_sorts_by_scene_number() {
        let store = store_with_story();
        let story = store.derive_story("scene_b").unwrap();
        let numbers: Vec<u32> = story.iter().map(|s| s.scene_number()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    // -- next_scene_number --

    #[test]
    fn next_scene_number_counts_root_plus_children() {
        let store = store_with_story();
        assert_eq!(store.next_scene_number("scene_a"), 4);
    }

    #[test]
    fn next_scene_number_fresh_root() {
        let mut store = SceneStore::new();
        store.append(scene("scene_a", 0, StoryLink::Root)).unwrap();
        assert_eq!(store.next_scene_number("scene_a"), 2);
    }

    // -- delete --

    #[test]
    fn delete_root_cascades_to_children() {
        let mut store = store_with_story();
        store.delete("scene_a");
        assert!(store.is_empty());
    }

    #[test]
    fn delete_child_leaves_rest_of_story() {
        let mut store = store_with_story();
        store.delete("scene_b");
        assert_eq!(store.len(), 2);
        assert!(store.get("scene_a").is_some());
        assert!(store.get("scene_c").is_some());
    }

    #[test]
    fn delete_selected_falls_back_to_newest_remaining() {
        let mut store = store_with_story();
        // A standalone story created most recently.
        store.append(scene("scene_x", 5, StoryLink::Root)).unwrap();
        store.select("scene_c").unwrap();
        store.delete("scene_a"); // removes a, b, c including the selection
        assert_eq!(store.selected_id(), Some("scene_x"));
    }

    #[test]
    fn delete_last_scene_clears_selection() {
        let mut store = SceneStore::new();
        store.append(scene("scene_a", 0, StoryLink::Root)).unwrap();
        store.delete("scene_a");
        assert_eq!(store.selected_id(), None);
    }

    #[test]
    fn delete_unselected_keeps_selection() {
        let mut store = store_with_story();
        store.select("scene_a").unwrap();
        store.delete("scene_b");
        assert_eq!(store.selected_id(), Some("scene_a"));
    }

    // -- history --

    #[test]
    fn history_is_newest_first() {
        let store = store_with_story();
        let ids: Vec<&str> = store.history().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["scene_c", "scene_b", "scene_a"]);
    }

    // -- overlay mutation --

    #[test]
    fn set_text_overlays_replaces_collection() {
        let mut store = store_with_story();
        store.set_text_overlays("scene_a", Vec::new()).unwrap();
        assert!(store.get("scene_a").unwrap().text_overlays.is_empty());
    }

    #[test]
    fn set_logo_and_clear() {
        use crate::overlay::LogoOverlay;
        use crate::scene::MediaRef;

        let mut store = store_with_story();
        let logo = LogoOverlay::centered(MediaRef {
            rel_path: "logo.png".to_string(),
            mime: "image/png".to_string(),
        });
        store.set_logo("scene_a", Some(logo)).unwrap();
        assert!(store.get("scene_a").unwrap().logo.is_some());
        store.set_logo("scene_a", None).unwrap();
        assert!(store.get("scene_a").unwrap().logo.is_none());
    }

    // -- replace_all --

    #[test]
    fn replace_all_selects_newest() {
        let mut store = SceneStore::new();
        store.replace_all(vec![
            scene("scene_old", 60, StoryLink::Root),
            scene("scene_new", 1, StoryLink::Root),
        ]);
        assert_eq!(store.selected_id(), Some("scene_new"));
    }

    #[test]
    fn replace_all_empty_clears_selection() {
        let mut store = store_with_story();
        store.replace_all(Vec::new());
        assert_eq!(store.selected_id(), None);
    }
}
