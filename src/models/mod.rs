use serde::{Deserialize, Deserializer, Serialize};

/// A note file as returned by `GET /files`.
///
/// The backend has served ids both as integers and as strings; both are
/// accepted and kept as strings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct NoteFile {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Folder {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// One block of a file, as returned by `GET /files/{id}/notes`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Note {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    /// `text`, `h1`, `h2`, ...
    #[serde(default, deserialize_with = "null_as_empty")]
    pub format: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub file_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub updated_at: String,
}

impl Note {
    /// First non-blank line of the content, or a placeholder.
    pub fn label(&self) -> String {
        self.content
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "Empty note".to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Int(n) => n.to_string(),
            RawId::Str(s) => s.trim().to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawId::deserialize(d).map(RawId::into_string)
}

fn opt_id_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(d)?
        .map(RawId::into_string)
        .filter(|s| !s.is_empty()))
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_file_accepts_numeric_ids() {
        let f: NoteFile = serde_json::from_value(serde_json::json!({
            "id": 12,
            "name": "todo.md",
            "order": 3,
            "folder_id": 4,
            "created_at": "2024-01-01 10:00:00",
            "updated_at": "2024-01-02 10:00:00"
        }))
        .expect("valid file");

        assert_eq!(f.id, "12");
        assert_eq!(f.folder_id.as_deref(), Some("4"));
        assert_eq!(f.order, 3);
    }

    #[test]
    fn test_null_or_blank_folder_means_root() {
        let a: NoteFile =
            serde_json::from_value(serde_json::json!({ "id": "a", "folder_id": null })).expect("null folder");
        let b: NoteFile =
            serde_json::from_value(serde_json::json!({ "id": "b", "folder_id": "" })).expect("blank folder");
        let c: NoteFile = serde_json::from_value(serde_json::json!({ "id": "c" })).expect("missing folder");

        assert_eq!(a.folder_id, None);
        assert_eq!(b.folder_id, None);
        assert_eq!(c.folder_id, None);
        assert_eq!(c.order, 0);
    }

    #[test]
    fn test_folder_parent_id() {
        let f: Folder = serde_json::from_value(serde_json::json!({
            "id": 1, "name": "Work", "parent_id": 9
        }))
        .expect("valid folder");
        assert_eq!(f.parent_id.as_deref(), Some("9"));
    }

    #[test]
    fn test_note_accepts_null_content_and_numeric_file() {
        let n: Note = serde_json::from_value(serde_json::json!({
            "id": 5,
            "content": null,
            "format": "h1",
            "order": 2,
            "file_id": 12,
            "created_at": "2024-01-01T10:00:00",
            "updated_at": "2024-01-01T10:00:00"
        }))
        .expect("valid note");

        assert_eq!(n.id, "5");
        assert_eq!(n.content, "");
        assert_eq!(n.file_id.as_deref(), Some("12"));
        assert_eq!(n.label(), "Empty note");
    }

    #[test]
    fn test_note_label_skips_blank_lines() {
        let n: Note = serde_json::from_value(serde_json::json!({ "id": "a", "content": "\n   \n  Shopping list \n- eggs" }))
            .expect("valid note");
        assert_eq!(n.label(), "Shopping list");
    }
}
