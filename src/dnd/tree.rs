use crate::dnd::error::DragError;
use crate::models::{Folder, Note, NoteFile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A place an item can live: the root list or a folder.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum ContainerRef {
    Root,
    Folder(String),
}

impl ContainerRef {
    pub fn from_folder_id(folder_id: Option<&str>) -> Self {
        match folder_id {
            Some(id) if !id.trim().is_empty() => Self::Folder(id.to_string()),
            _ => Self::Root,
        }
    }

    /// Folder id as the backend expects it (`None` means root).
    pub fn folder_id(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Folder(id) => Some(id.as_str()),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

impl std::fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Folder(id) => write!(f, "folder:{id}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Item {
    pub id: String,
    pub display_name: String,
    pub parent: ContainerRef,
    pub order_index: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Container {
    pub id: ContainerRef,
    pub name: String,
    pub parent: Option<ContainerRef>,
    pub child_item_ids: Vec<String>,
}

/// Local mirror of the files/folders the backend owns.
///
/// Items and containers are stored in flat maps keyed by id; parent and child
/// links are ids. The root container always exists.
///
/// `revision` increases on every mutation and every refresh and is never
/// reset. `epoch` counts refreshes only, so a late commit can tell whether a
/// refetch replaced the data it optimistically wrote.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FolderTree {
    items: HashMap<String, Item>,
    containers: HashMap<ContainerRef, Container>,
    revision: u64,
    epoch: u64,
}

impl Default for FolderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderTree {
    pub fn new() -> Self {
        let mut containers = HashMap::new();
        containers.insert(
            ContainerRef::Root,
            Container {
                id: ContainerRef::Root,
                name: String::new(),
                parent: None,
                child_item_ids: vec![],
            },
        );

        Self {
            items: HashMap::new(),
            containers,
            revision: 0,
            epoch: 0,
        }
    }

    /// Build the tree from `GET /folders` + `GET /files`.
    ///
    /// Children are sorted by `(order, id)` and re-indexed to `0..N-1`. Files that
    /// point at an unknown folder are placed at the root.
    pub fn from_wire(files: &[NoteFile], folders: &[Folder]) -> Self {
        let mut tree = Self::new();

        for f in folders {
            if f.id.trim().is_empty() {
                continue;
            }
            tree.containers.insert(
                ContainerRef::Folder(f.id.clone()),
                Container {
                    id: ContainerRef::Folder(f.id.clone()),
                    name: f.name.clone(),
                    parent: f.parent_id.as_deref().map(|p| ContainerRef::from_folder_id(Some(p))),
                    child_item_ids: vec![],
                },
            );
        }

        let mut by_container: HashMap<ContainerRef, Vec<&NoteFile>> = HashMap::new();
        for file in files {
            if file.id.trim().is_empty() {
                continue;
            }
            let mut parent = ContainerRef::from_folder_id(file.folder_id.as_deref());
            if !tree.containers.contains_key(&parent) {
                parent = ContainerRef::Root;
            }
            by_container.entry(parent).or_default().push(file);
        }

        for (container, mut list) in by_container {
            list.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
            let ids = list.iter().map(|f| f.id.clone()).collect::<Vec<_>>();
            for (index, file) in list.into_iter().enumerate() {
                tree.items.insert(
                    file.id.clone(),
                    Item {
                        id: file.id.clone(),
                        display_name: file.name.clone(),
                        parent: container.clone(),
                        order_index: index,
                    },
                );
            }
            if let Some(c) = tree.containers.get_mut(&container) {
                c.child_item_ids = ids;
            }
        }

        tree
    }

    /// Build a single flat list from `GET /files/{id}/notes`. Notes live in the
    /// root container; a note's label is the first line of its content.
    pub fn from_notes(notes: &[Note]) -> Self {
        let mut tree = Self::new();

        let mut list = notes.iter().filter(|n| !n.id.trim().is_empty()).collect::<Vec<_>>();
        list.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));

        let ids = list.iter().map(|n| n.id.clone()).collect::<Vec<_>>();
        for (index, note) in list.into_iter().enumerate() {
            tree.items.insert(
                note.id.clone(),
                Item {
                    id: note.id.clone(),
                    display_name: note.label(),
                    parent: ContainerRef::Root,
                    order_index: index,
                },
            );
        }
        tree.write_list(&ContainerRef::Root, ids);
        tree
    }

    /// Swap in freshly fetched data. Counters carry over and advance, so
    /// pending commits see the refresh.
    pub fn refresh(&mut self, mut next: FolderTree) {
        next.revision = self.revision + 1;
        next.epoch = self.epoch + 1;
        *self = next;
    }

    #[cfg(test)]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn container(&self, id: &ContainerRef) -> Option<&Container> {
        self.containers.get(id)
    }

    pub fn children(&self, id: &ContainerRef) -> Option<&[String]> {
        self.containers.get(id).map(|c| c.child_item_ids.as_slice())
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Folders sorted by name (then id) for display.
    pub fn folders(&self) -> Vec<&Container> {
        let mut out = self
            .containers
            .values()
            .filter(|c| !c.id.is_root())
            .collect::<Vec<_>>();
        out.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        out
    }

    /// Where an item currently sits, checked against its container's list.
    pub fn position_of(&self, item_id: &str) -> Result<(ContainerRef, usize), DragError> {
        let item = self
            .items
            .get(item_id)
            .ok_or_else(|| DragError::InvariantViolation(format!("unknown item {item_id}")))?;
        let list = self.children(&item.parent).ok_or_else(|| {
            DragError::InvariantViolation(format!("item {item_id} claims missing {}", item.parent))
        })?;
        let index = list.iter().position(|id| id == item_id).ok_or_else(|| {
            DragError::InvariantViolation(format!(
                "item {item_id} not found in its origin list {}",
                item.parent
            ))
        })?;
        Ok((item.parent.clone(), index))
    }

    /// Replace a container's order. `ids` must be a permutation of the current list.
    pub fn set_order(&mut self, container: &ContainerRef, ids: Vec<String>) -> Result<(), DragError> {
        let current = self
            .children(container)
            .ok_or_else(|| DragError::InvariantViolation(format!("unknown container {container}")))?;

        let mut a = current.to_vec();
        let mut b = ids.clone();
        a.sort();
        b.sort();
        if a != b {
            return Err(DragError::InvariantViolation(format!(
                "new order for {container} is not a permutation of its items"
            )));
        }

        self.write_list(container, ids);
        self.revision += 1;
        Ok(())
    }

    /// Move an item to another container, at `index` or appended.
    pub fn move_item(
        &mut self,
        item_id: &str,
        dest: &ContainerRef,
        index: Option<usize>,
    ) -> Result<(), DragError> {
        if !self.containers.contains_key(dest) {
            return Err(DragError::InvariantViolation(format!("unknown destination {dest}")));
        }
        let (origin, from) = self.position_of(item_id)?;

        let mut origin_list = self.children(&origin).map(<[String]>::to_vec).unwrap_or_default();
        origin_list.remove(from);

        if origin == *dest {
            let at = index.unwrap_or(origin_list.len()).min(origin_list.len());
            origin_list.insert(at, item_id.to_string());
            self.write_list(&origin, origin_list);
        } else {
            let mut dest_list = self.children(dest).map(<[String]>::to_vec).unwrap_or_default();
            let at = index.unwrap_or(dest_list.len()).min(dest_list.len());
            dest_list.insert(at, item_id.to_string());
            self.write_list(&origin, origin_list);
            self.write_list(dest, dest_list);
        }

        self.revision += 1;
        Ok(())
    }

    fn write_list(&mut self, container: &ContainerRef, ids: Vec<String>) {
        for (index, id) in ids.iter().enumerate() {
            if let Some(item) = self.items.get_mut(id) {
                item.parent = container.clone();
                item.order_index = index;
            }
        }
        if let Some(c) = self.containers.get_mut(container) {
            c.child_item_ids = ids;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::testing::{file, folder, ids, note};

    #[test]
    fn test_from_wire_sorts_and_reindexes_children() {
        let tree = FolderTree::from_wire(
            &[
                file("c", 7, None),
                file("a", 2, None),
                file("b", 2, None),
                file("x", 0, Some("f1")),
            ],
            &[folder("f1", "Work")],
        );

        assert_eq!(tree.children(&ContainerRef::Root), Some(ids(&["a", "b", "c"]).as_slice()));
        assert_eq!(tree.item("c").map(|i| i.order_index), Some(2));
        assert_eq!(
            tree.item("x").map(|i| i.parent.clone()),
            Some(ContainerRef::Folder("f1".to_string()))
        );
    }

    #[test]
    fn test_from_wire_unknown_folder_falls_back_to_root() {
        let tree = FolderTree::from_wire(&[file("a", 0, Some("gone"))], &[]);
        assert_eq!(tree.position_of("a").ok(), Some((ContainerRef::Root, 0)));
    }

    #[test]
    fn test_set_order_rejects_non_permutation() {
        let mut tree = FolderTree::from_wire(&[file("a", 0, None), file("b", 1, None)], &[]);
        let before = tree.clone();

        let err = tree.set_order(&ContainerRef::Root, ids(&["a", "z"]));
        assert!(matches!(err, Err(DragError::InvariantViolation(_))));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_move_item_updates_parent_and_indices() {
        let mut tree = FolderTree::from_wire(
            &[file("a", 0, None), file("b", 1, None)],
            &[folder("f", "F")],
        );
        let f = ContainerRef::Folder("f".to_string());

        tree.move_item("a", &f, None).expect("move should succeed");

        assert_eq!(tree.children(&ContainerRef::Root), Some(ids(&["b"]).as_slice()));
        assert_eq!(tree.children(&f), Some(ids(&["a"]).as_slice()));
        assert_eq!(tree.item("b").map(|i| i.order_index), Some(0));
        assert_eq!(tree.position_of("a").ok(), Some((f, 0)));
        assert_eq!(tree.revision(), 1);
    }

    #[test]
    fn test_position_of_detects_orphaned_item() {
        let mut tree = FolderTree::from_wire(&[file("a", 0, None)], &[]);
        tree.containers
            .get_mut(&ContainerRef::Root)
            .expect("root exists")
            .child_item_ids
            .clear();

        assert!(matches!(
            tree.position_of("a"),
            Err(DragError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_refresh_keeps_counters_monotonic() {
        let mut tree = FolderTree::from_wire(&[file("a", 0, None), file("b", 1, None)], &[]);
        tree.set_order(&ContainerRef::Root, ids(&["b", "a"])).expect("set order");
        assert_eq!((tree.revision(), tree.epoch()), (1, 0));

        tree.refresh(FolderTree::from_wire(&[file("a", 0, None), file("b", 1, None)], &[]));
        assert_eq!((tree.revision(), tree.epoch()), (2, 1));
        assert_eq!(tree.children(&ContainerRef::Root), Some(ids(&["a", "b"]).as_slice()));

        tree.refresh(FolderTree::new());
        assert_eq!((tree.revision(), tree.epoch()), (3, 2));
        assert_eq!(tree.item_count(), 0);
    }

    #[test]
    fn test_from_notes_orders_by_order_then_id() {
        let tree = FolderTree::from_notes(&[note("n3", 2, "third"), note("n1", 0, "first\nmore"), note("n2", 0, "")]);

        assert_eq!(tree.children(&ContainerRef::Root), Some(ids(&["n1", "n2", "n3"]).as_slice()));
        assert_eq!(tree.item("n1").map(|i| i.display_name.as_str()), Some("first"));
        assert_eq!(tree.item("n3").map(|i| i.order_index), Some(2));
        assert!(tree.folders().is_empty());
    }

    #[test]
    fn test_container_ref_from_blank_folder_id_is_root() {
        assert_eq!(ContainerRef::from_folder_id(Some("  ")), ContainerRef::Root);
        assert_eq!(ContainerRef::from_folder_id(None), ContainerRef::Root);
        assert_eq!(ContainerRef::Folder("3".into()).folder_id(), Some("3"));
    }
}
