use super::{Found, RouteConflict, Trie};
use crate::route::Route;
use http::Method;
use std::sync::Arc;

// Routes carry no metadata the trie cares about; tag them through the
// response body so tests can tell which one matched.
fn route(tag: &'static str) -> Arc<Route> {
    Arc::new(Route::new(move |_req, res| {
        res.ok(serde_json::json!(tag));
        Ok(())
    }))
}

fn must_match<'a>(trie: &'a Trie, method: Method, path: &str) -> Vec<(String, String)> {
    match trie.find(&method, path) {
        Found::Route { bindings, .. } => bindings.into_vec(),
        Found::MethodNotAllowed { .. } => panic!("{method} {path}: method not allowed"),
        Found::NotFound => panic!("{method} {path}: not found"),
    }
}

#[test]
fn test_literal_route() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/health", route("health")).unwrap();

    assert!(must_match(&trie, Method::GET, "/health").is_empty());
    assert!(matches!(trie.find(&Method::GET, "/nope"), Found::NotFound));
}

#[test]
fn test_root_pattern() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "", route("root")).unwrap();

    assert!(must_match(&trie, Method::GET, "/").is_empty());
    assert!(must_match(&trie, Method::GET, "").is_empty());
}

#[test]
fn test_parameter_binding() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/users/:id", route("get_user")).unwrap();

    let bindings = must_match(&trie, Method::GET, "/users/123");
    assert_eq!(bindings, vec![("id".to_string(), "123".to_string())]);
}

#[test]
fn test_multiple_parameters() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/users/:user_id/posts/:post_id", route("get_post"))
        .unwrap();

    let bindings = must_match(&trie, Method::GET, "/users/123/posts/456");
    assert_eq!(
        bindings,
        vec![
            ("user_id".to_string(), "123".to_string()),
            ("post_id".to_string(), "456".to_string()),
        ]
    );
}

#[test]
fn test_literal_beats_parameter() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/users/:id", route("by_id")).unwrap();
    trie.add(Method::GET, "/users/me", route("me")).unwrap();

    // The literal sibling wins even though the parameter was registered first.
    let bindings = must_match(&trie, Method::GET, "/users/me");
    assert!(bindings.is_empty());

    let bindings = must_match(&trie, Method::GET, "/users/42");
    assert_eq!(bindings, vec![("id".to_string(), "42".to_string())]);
}

#[test]
fn test_backtracks_to_parameter_branch() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/users/me/settings", route("settings"))
        .unwrap();
    trie.add(Method::GET, "/users/:id/profile", route("profile"))
        .unwrap();

    // "me" matches the literal branch, but only the parameter branch has
    // /profile below it; the lookup must back out and rebind.
    let bindings = must_match(&trie, Method::GET, "/users/me/profile");
    assert_eq!(bindings, vec![("id".to_string(), "me".to_string())]);
}

#[test]
fn test_discards_bindings_of_failed_branches() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/a/:x/c", route("one")).unwrap();
    trie.add(Method::GET, "/a/:x/d", route("two")).unwrap();

    let bindings = must_match(&trie, Method::GET, "/a/v/d");
    assert_eq!(bindings, vec![("x".to_string(), "v".to_string())]);
}

#[test]
fn test_catch_all_binds_remainder() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/assets/*path", route("assets")).unwrap();

    let bindings = must_match(&trie, Method::GET, "/assets/css/main.css");
    assert_eq!(
        bindings,
        vec![("path".to_string(), "css/main.css".to_string())]
    );
}

#[test]
fn test_catch_all_binds_empty_for_exact_prefix() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/assets/*path", route("assets")).unwrap();

    let bindings = must_match(&trie, Method::GET, "/assets");
    assert_eq!(bindings, vec![("path".to_string(), String::new())]);
}

#[test]
fn test_literal_beats_catch_all() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/files/*rest", route("rest")).unwrap();
    trie.add(Method::GET, "/files/index", route("index")).unwrap();

    assert!(must_match(&trie, Method::GET, "/files/index").is_empty());
    let bindings = must_match(&trie, Method::GET, "/files/a/b");
    assert_eq!(bindings, vec![("rest".to_string(), "a/b".to_string())]);
}

#[test]
fn test_trailing_slash_equivalent() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/users/", route("users")).unwrap();

    assert!(must_match(&trie, Method::GET, "/users").is_empty());
    assert!(must_match(&trie, Method::GET, "/users/").is_empty());
}

#[test]
fn test_method_selection() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/items", route("list")).unwrap();
    trie.add(Method::POST, "/items", route("create")).unwrap();

    assert!(must_match(&trie, Method::GET, "/items").is_empty());
    assert!(must_match(&trie, Method::POST, "/items").is_empty());

    match trie.find(&Method::PUT, "/items") {
        Found::MethodNotAllowed { allowed } => {
            assert_eq!(allowed.len(), 2);
            assert!(allowed.contains(&Method::GET));
            assert!(allowed.contains(&Method::POST));
        }
        _ => panic!("expected method-not-allowed"),
    }
}

#[test]
fn test_duplicate_registration_replaces() {
    let mut trie = Trie::new();
    assert!(!trie.add(Method::GET, "/x", route("first")).unwrap());
    assert!(trie.add(Method::GET, "/x", route("second")).unwrap());
}

#[test]
fn test_conflicting_param_names_rejected() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/users/:id/posts", route("posts")).unwrap();
    let err = trie
        .add(Method::GET, "/users/:user_id/comments", route("comments"))
        .unwrap_err();
    assert_eq!(
        err,
        RouteConflict::ParamName {
            existing: "id".to_string(),
            new: "user_id".to_string(),
        }
    );
}

#[test]
fn test_lookup_is_deterministic() {
    let mut trie = Trie::new();
    trie.add(Method::GET, "/a/:p", route("param")).unwrap();
    trie.add(Method::GET, "/a/*rest", route("rest")).unwrap();

    // Parameter precedence over catch-all, every time.
    for _ in 0..10 {
        let bindings = must_match(&trie, Method::GET, "/a/x");
        assert_eq!(bindings, vec![("p".to_string(), "x".to_string())]);
    }
}
