//! Client-side list state for one resource: the fetched rows, an add draft,
//! and at most one row open for editing.

use serde_json::Value;

use crate::client::{ClientError, ResourceApi};
use crate::models::Resource;

/// Edit state. Only one row can be open at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode<F> {
    Viewing,
    Editing { id: i64, draft: F },
}

pub struct ListPresenter<R: Resource, A> {
    api: A,
    rows: Vec<R::Row>,
    mode: Mode<R::Fields>,
    add_draft: R::Fields,
    loaded: bool,
    stale: bool,
    last_error: Option<String>,
}

impl<R, A> ListPresenter<R, A>
where
    R: Resource,
    A: ResourceApi<R>,
{
    pub fn new(api: A) -> Self {
        Self {
            api,
            rows: Vec::new(),
            mode: Mode::Viewing,
            add_draft: R::Fields::default(),
            loaded: false,
            stale: true,
            last_error: None,
        }
    }

    pub fn rows(&self) -> &[R::Row] {
        &self.rows
    }

    pub fn mode(&self) -> &Mode<R::Fields> {
        &self.mode
    }

    pub fn editing_id(&self) -> Option<i64> {
        match self.mode {
            Mode::Editing { id, .. } => Some(id),
            Mode::Viewing => None,
        }
    }

    pub fn add_draft(&self) -> &R::Fields {
        &self.add_draft
    }

    /// True until the first fetch has completed
    pub fn is_loading(&self) -> bool {
        !self.loaded
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch the list. A failed fetch leaves the presenter with no rows.
    pub async fn refresh(&mut self) {
        match self.api.list().await {
            Ok(rows) => {
                self.rows = rows;
                self.last_error = None;
            }
            Err(e) => {
                tracing::debug!("List fetch failed: {}", e);
                self.rows.clear();
                self.last_error = Some(e.to_string());
            }
        }
        self.loaded = true;
        self.stale = false;
    }

    pub async fn refresh_if_stale(&mut self) {
        if self.stale {
            self.refresh().await;
        }
    }

    async fn after_mutation(&mut self) {
        self.stale = true;
        self.refresh().await;
    }

    /// Open the row for editing, or close it if it is already open.
    /// Opening a different row discards the current draft.
    /// Returns false when no such row is listed.
    pub fn toggle_edit(&mut self, id: i64) -> bool {
        if self.editing_id() == Some(id) {
            self.mode = Mode::Viewing;
            return true;
        }

        match self.rows.iter().find(|row| R::row_id(row) == id) {
            Some(row) => {
                self.mode = Mode::Editing {
                    id,
                    draft: R::fields_of(row),
                };
                true
            }
            None => false,
        }
    }

    pub fn set_add_field(&mut self, name: &str, value: &str) -> Result<(), ClientError> {
        self.add_draft = with_field::<R>(&self.add_draft, name, value)?;
        Ok(())
    }

    /// Change a field of the open edit draft; ignored while viewing
    pub fn set_edit_field(&mut self, name: &str, value: &str) -> Result<(), ClientError> {
        if let Mode::Editing { draft, .. } = &mut self.mode {
            *draft = with_field::<R>(draft, name, value)?;
        }
        Ok(())
    }

    /// Send the add draft. It is cleared only once the server accepts it.
    pub async fn submit_add(&mut self) -> Result<(), ClientError> {
        let fields = R::normalize(&self.add_draft)?;
        self.api.create(&fields).await?;

        self.add_draft = R::Fields::default();
        self.after_mutation().await;
        Ok(())
    }

    /// Save the open draft and close the editor. Does nothing while viewing.
    pub async fn save_edit(&mut self) -> Result<(), ClientError> {
        let Mode::Editing { id, draft } = &self.mode else {
            return Ok(());
        };
        let id = *id;
        let fields = R::normalize(draft)?;
        self.api.update(id, &fields).await?;

        self.mode = Mode::Viewing;
        self.after_mutation().await;
        Ok(())
    }

    /// Delete a row; deleting the open row closes the editor
    pub async fn delete(&mut self, id: i64) -> Result<(), ClientError> {
        self.api.delete(id).await?;

        if self.editing_id() == Some(id) {
            self.mode = Mode::Viewing;
        }
        self.after_mutation().await;
        Ok(())
    }

    /// Text rendering, one line per row, the open row marked with `>`
    pub fn render(&self) -> String {
        if self.is_loading() {
            return "Loading...".to_string();
        }
        if self.rows.is_empty() {
            return match &self.last_error {
                Some(e) => format!("No {} ({})", R::PATH, e),
                None => format!("No {} yet", R::PATH),
            };
        }

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        for row in &self.rows {
            let id = R::row_id(row);
            match &self.mode {
                Mode::Editing { id: open, draft } if *open == id => {
                    lines.push(format!("> {}", R::describe(row)));
                    let draft = serde_json::to_string(draft).unwrap_or_default();
                    lines.push(format!("    editing: {}", draft));
                }
                _ => lines.push(format!("  {}", R::describe(row))),
            }
        }
        lines.join("\n")
    }
}

/// `fields` with one string field replaced
fn with_field<R: Resource>(fields: &R::Fields, name: &str, value: &str) -> Result<R::Fields, ClientError> {
    let mut object = match serde_json::to_value(fields) {
        Ok(Value::Object(object)) => object,
        _ => return Err(ClientError::UnknownField(name.to_string())),
    };
    if !object.contains_key(name) {
        return Err(ClientError::UnknownField(name.to_string()));
    }
    object.insert(name.to_string(), Value::String(value.to_string()));

    serde_json::from_value(Value::Object(object)).map_err(|_| ClientError::UnknownField(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    use crate::database::{MemoryStore, Repository, ViewCache};
    use crate::error::ApiError;
    use crate::models::{Contact, Note, NoteFields};

    /// Talks to a repository directly, as one user
    struct LocalApi<R: Resource> {
        repo: Repository<R>,
        user: Uuid,
        offline: Arc<AtomicBool>,
    }

    impl<R: Resource> LocalApi<R> {
        fn new() -> (Self, Arc<AtomicBool>) {
            let offline = Arc::new(AtomicBool::new(false));
            let api = Self {
                repo: Repository::new(Arc::new(MemoryStore::new()), Arc::new(ViewCache::new(true))),
                user: Uuid::new_v4(),
                offline: offline.clone(),
            };
            (api, offline)
        }

        fn check_online(&self) -> Result<(), ClientError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(ApiError::internal_server_error("connection refused").into());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl<R: Resource> ResourceApi<R> for LocalApi<R> {
        async fn list(&self) -> Result<Vec<R::Row>, ClientError> {
            self.check_online()?;
            Ok(self.repo.list(self.user).await.map_err(ApiError::from)?)
        }

        async fn create(&self, fields: &R::Fields) -> Result<Option<R::Row>, ClientError> {
            self.check_online()?;
            Ok(Some(self.repo.create(self.user, fields).await.map_err(ApiError::from)?))
        }

        async fn update(&self, id: i64, fields: &R::Fields) -> Result<(), ClientError> {
            self.check_online()?;
            self.repo.update(self.user, id, fields).await.map_err(ApiError::from)?;
            Ok(())
        }

        async fn delete(&self, id: i64) -> Result<(), ClientError> {
            self.check_online()?;
            self.repo.delete(self.user, id).await.map_err(ApiError::from)?;
            Ok(())
        }
    }

    async fn notes_with(titles: &[&str]) -> (ListPresenter<Note, LocalApi<Note>>, Arc<AtomicBool>) {
        let (api, offline) = LocalApi::<Note>::new();
        let mut presenter = ListPresenter::new(api);
        for title in titles {
            presenter.set_add_field("title", title).unwrap();
            presenter.submit_add().await.unwrap();
        }
        presenter.refresh_if_stale().await;
        (presenter, offline)
    }

    #[tokio::test]
    async fn loading_until_first_fetch() {
        let (api, _) = LocalApi::<Note>::new();
        let mut presenter: ListPresenter<Note, _> = ListPresenter::new(api);
        assert!(presenter.is_loading());
        assert_eq!(presenter.render(), "Loading...");

        presenter.refresh_if_stale().await;
        assert!(!presenter.is_loading());
        assert_eq!(presenter.render(), "No notes yet");
    }

    #[tokio::test]
    async fn added_row_appears_after_refetch() {
        let (presenter, _) = notes_with(&["Buy milk"]).await;
        assert_eq!(
            presenter.rows(),
            &[Note {
                id: 1,
                title: "Buy milk".into()
            }]
        );
        assert_eq!(presenter.add_draft(), &NoteFields::default());
        assert!(!presenter.is_stale());
    }

    #[tokio::test]
    async fn invalid_add_draft_is_kept_and_never_sent() {
        let (mut presenter, _) = notes_with(&[]).await;
        presenter.set_add_field("title", "   ").unwrap();

        let err = presenter.submit_add().await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(presenter.add_draft().title, "   ");
        assert!(presenter.rows().is_empty());
    }

    #[tokio::test]
    async fn failed_add_keeps_user_input() {
        let (mut presenter, offline) = notes_with(&[]).await;
        presenter.set_add_field("title", "Call mom").unwrap();
        offline.store(true, Ordering::SeqCst);

        assert!(presenter.submit_add().await.is_err());
        assert_eq!(presenter.add_draft().title, "Call mom");
    }

    #[tokio::test]
    async fn only_one_row_is_ever_open() {
        let (mut presenter, _) = notes_with(&["a", "b"]).await;

        assert!(presenter.toggle_edit(1));
        presenter.set_edit_field("title", "changed a").unwrap();
        assert_eq!(presenter.editing_id(), Some(1));

        // Switching rows discards the draft for the first one
        assert!(presenter.toggle_edit(2));
        assert_eq!(
            presenter.mode(),
            &Mode::Editing {
                id: 2,
                draft: NoteFields { title: "b".into() }
            }
        );
        presenter.save_edit().await.unwrap();
        assert!(presenter.rows().iter().all(|n| n.title != "changed a"));

        assert!(!presenter.toggle_edit(99));
        assert_eq!(presenter.editing_id(), None);
    }

    #[tokio::test]
    async fn toggling_the_open_row_closes_it() {
        let (mut presenter, _) = notes_with(&["a"]).await;
        presenter.toggle_edit(1);
        presenter.toggle_edit(1);
        assert_eq!(presenter.mode(), &Mode::Viewing);
    }

    #[tokio::test]
    async fn save_closes_editor_and_refetches() {
        let (mut presenter, _) = notes_with(&["draft"]).await;
        presenter.toggle_edit(1);
        presenter.set_edit_field("title", "  final  ").unwrap();
        presenter.save_edit().await.unwrap();

        assert_eq!(presenter.mode(), &Mode::Viewing);
        assert_eq!(presenter.rows()[0].title, "final");
    }

    #[tokio::test]
    async fn failed_save_keeps_editor_open() {
        let (mut presenter, _) = notes_with(&["a"]).await;
        presenter.toggle_edit(1);
        presenter.set_edit_field("title", "").unwrap();

        assert!(presenter.save_edit().await.is_err());
        assert_eq!(presenter.editing_id(), Some(1));
        assert_eq!(presenter.rows()[0].title, "a");
    }

    #[tokio::test]
    async fn deleting_the_open_row_closes_editor() {
        let (mut presenter, _) = notes_with(&["a", "b"]).await;
        presenter.toggle_edit(2);
        presenter.delete(2).await.unwrap();

        assert_eq!(presenter.editing_id(), None);
        assert_eq!(presenter.rows().len(), 1);
        assert!(presenter.delete(2).await.unwrap_err().status() == Some(404));
    }

    #[tokio::test]
    async fn failed_fetch_clears_rows() {
        let (mut presenter, offline) = notes_with(&["a"]).await;
        offline.store(true, Ordering::SeqCst);
        presenter.refresh().await;

        assert!(presenter.rows().is_empty());
        assert!(presenter.last_error().is_some());
        assert!(presenter.render().starts_with("No notes ("));
    }

    #[tokio::test]
    async fn render_marks_the_open_row() {
        let (mut presenter, _) = notes_with(&["one", "two"]).await;
        presenter.toggle_edit(1);

        let text = presenter.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  #2 two");
        assert_eq!(lines[1], "> #1 one");
        assert_eq!(lines[2], r#"    editing: {"title":"one"}"#);
    }

    #[tokio::test]
    async fn unknown_fields_are_rejected() {
        let (api, _) = LocalApi::<Contact>::new();
        let mut presenter: ListPresenter<Contact, _> = ListPresenter::new(api);
        assert!(matches!(
            presenter.set_add_field("email", "x"),
            Err(ClientError::UnknownField(_))
        ));
        presenter.set_add_field("phone", "555").unwrap();
        assert_eq!(presenter.add_draft().phone, "555");
    }
}
