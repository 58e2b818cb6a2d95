mod common;

use common::MockSession;
use morsel_engine::config::{By, ElementDescriptor};
use morsel_engine::resolution::{self, ResolutionError};

fn descriptor(by: By, value: &str) -> ElementDescriptor {
    ElementDescriptor {
        by,
        value: value.to_string(),
        multiple: false,
        match_text: None,
    }
}

fn multiple(by: By, value: &str, match_text: &str) -> ElementDescriptor {
    ElementDescriptor {
        by,
        value: value.to_string(),
        multiple: true,
        match_text: Some(match_text.to_string()),
    }
}

#[tokio::test]
async fn single_lookup_delegates_to_find() {
    let mut session = MockSession::new();
    let button = session.make_element("button", "Accept all");
    session.add_element(By::Css, "#accept", button);

    let element = resolution::resolve(&mut session, &descriptor(By::Css, "#accept"))
        .await
        .expect("element should resolve");
    assert_eq!(element.name, "button");
}

#[tokio::test]
async fn single_lookup_misses_with_not_found() {
    let mut session = MockSession::new();
    let result = resolution::resolve(&mut session, &descriptor(By::Css, "#missing")).await;
    assert!(matches!(result, Err(ResolutionError::NotFound(_))));
}

#[tokio::test]
async fn multiple_picks_the_first_text_match_case_insensitively() {
    let mut session = MockSession::new();
    let deny = session.make_element("deny", "Rechazar todo");
    let accept = session.make_element("accept", "ACEPTAR COOKIES");
    let accept_late = session.make_element("accept-late", "aceptar");
    session.add_element(By::TagName, "button", deny);
    session.add_element(By::TagName, "button", accept);
    session.add_element(By::TagName, "button", accept_late);

    let element = resolution::resolve(
        &mut session,
        &multiple(By::TagName, "button", "  Aceptar "),
    )
    .await
    .expect("a candidate should match");
    assert_eq!(element.name, "accept");
}

#[tokio::test]
async fn multiple_without_a_match_is_not_found() {
    let mut session = MockSession::new();
    let deny = session.make_element("deny", "Rechazar todo");
    session.add_element(By::TagName, "button", deny);

    let result =
        resolution::resolve(&mut session, &multiple(By::TagName, "button", "aceptar")).await;
    assert!(matches!(result, Err(ResolutionError::NotFound(_))));
}

#[tokio::test]
async fn multiple_with_no_candidates_is_not_found() {
    let mut session = MockSession::new();
    let result =
        resolution::resolve(&mut session, &multiple(By::Css, ".choice", "accept")).await;
    assert!(matches!(result, Err(ResolutionError::NotFound(_))));
}
