mod common;

use anyhow::Result;
use uuid::Uuid;

use pocket_api::client::{HttpApi, ResourceApi};
use pocket_api::models::{Contact, ContactFields, Note, NoteFields, Todo};
use pocket_api::presenter::{ListPresenter, Mode};

#[tokio::test]
async fn presenter_round_trip_over_http() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = common::token_for(Uuid::new_v4());
    let api = HttpApi::new(&server.base_url, Some(token))?;

    let mut notes: ListPresenter<Note, _> = ListPresenter::new(api);
    assert!(notes.is_loading());
    notes.refresh_if_stale().await;
    assert_eq!(notes.render(), "No notes yet");

    notes.set_add_field("title", "Buy milk")?;
    notes.submit_add().await?;
    notes.set_add_field("title", "Walk dog")?;
    notes.submit_add().await?;
    assert_eq!(notes.render(), "  #2 Walk dog\n  #1 Buy milk");

    assert!(notes.toggle_edit(1));
    notes.set_edit_field("title", "Buy oat milk")?;
    notes.save_edit().await?;
    assert_eq!(notes.mode(), &Mode::Viewing);
    assert_eq!(notes.rows()[1].title, "Buy oat milk");

    notes.toggle_edit(2);
    notes.delete(2).await?;
    assert_eq!(notes.editing_id(), None);
    assert_eq!(
        notes.rows(),
        &[Note {
            id: 1,
            title: "Buy oat milk".into()
        }]
    );
    Ok(())
}

#[tokio::test]
async fn server_validation_errors_reach_the_client() -> Result<()> {
    let server = common::spawn_server().await?;
    let api = HttpApi::new(&server.base_url, Some(common::token_for(Uuid::new_v4())))?;

    let err = ResourceApi::<Contact>::create(
        &api,
        &ContactFields {
            name: "Ann".into(),
            phone: "  ".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.field_errors().unwrap().contains_key("phone"));

    let err = ResourceApi::<Note>::update(&api, 42, &NoteFields { title: "x".into() })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    Ok(())
}

#[tokio::test]
async fn anonymous_client_sees_unauthorized() -> Result<()> {
    let server = common::spawn_server().await?;
    let api = HttpApi::new(&server.base_url, None)?;

    let err = ResourceApi::<Todo>::list(&api).await.unwrap_err();
    assert!(err.is_unauthorized());

    // The presenter shows an empty list rather than stale rows
    let mut todos: ListPresenter<Todo, _> = ListPresenter::new(api);
    todos.refresh().await;
    assert!(todos.rows().is_empty());
    assert!(todos.last_error().is_some());
    Ok(())
}
