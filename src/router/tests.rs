use super::{RouteLookup, Router};
use crate::context::BasicContextFactory;
use crate::endpoint::EndpointRegistration;
use crate::mapper::{DefaultHandleMapper, HandleMapper};
use crate::response::HandlerResponse;
use http::Method;

fn router(routes: &[(Method, &str, &str)]) -> Router {
    let mut mapper = DefaultHandleMapper::new();
    for (method, path, operation) in routes {
        let body = operation.to_string();
        mapper
            .put_handler(
                EndpointRegistration::new(method.clone(), *path, move |_, _| {
                    Ok(HandlerResponse::text(200, body.clone()).boxed())
                })
                .operation(*operation),
            )
            .unwrap();
    }
    mapper.new_router(BasicContextFactory::default())
}

fn operation(lookup: RouteLookup) -> String {
    match lookup {
        RouteLookup::Found(m) => m.route.operation.to_string(),
        other => panic!("expected a match, got {other:?}"),
    }
}

#[test]
fn test_root_path() {
    let r = router(&[(Method::GET, "/", "root")]);
    assert_eq!(operation(r.route(&Method::GET, "/")), "root");
    assert!(matches!(r.route(&Method::GET, "/x"), RouteLookup::NotFound));
}

#[test]
fn test_parameterized_path() {
    let r = router(&[(Method::GET, "/items/{id}", "get_item")]);
    match r.route(&Method::GET, "/items/123") {
        RouteLookup::Found(m) => {
            assert_eq!(m.route.operation.as_ref(), "get_item");
            assert_eq!(m.get_path_param("id"), Some("123"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_nested_params() {
    let r = router(&[(Method::GET, "/users/{user_id}/posts/{post_id}", "get_post")]);
    let RouteLookup::Found(m) = r.route(&Method::GET, "/users/u1/posts/p9") else {
        panic!("no match");
    };
    assert_eq!(m.get_path_param("user_id"), Some("u1"));
    assert_eq!(m.get_path_param("post_id"), Some("p9"));
    assert!(matches!(
        r.route(&Method::GET, "/users/u1/posts"),
        RouteLookup::NotFound
    ));
}

#[test]
fn test_literal_preferred_over_variable() {
    let r = router(&[
        (Method::GET, "/items/{id}", "get_item"),
        (Method::GET, "/items/new", "new_item_form"),
    ]);
    assert_eq!(operation(r.route(&Method::GET, "/items/new")), "new_item_form");
    assert_eq!(operation(r.route(&Method::GET, "/items/7")), "get_item");
}

#[test]
fn test_literal_dead_end_falls_back() {
    let r = router(&[
        (Method::GET, "/files/latest/meta", "latest_meta"),
        (Method::GET, "/files/{name}/raw", "raw_file"),
    ]);
    let RouteLookup::Found(m) = r.route(&Method::GET, "/files/latest/raw") else {
        panic!("no match");
    };
    assert_eq!(m.route.operation.as_ref(), "raw_file");
    assert_eq!(m.get_path_param("name"), Some("latest"));
}

#[test]
fn test_percent_decoded_values() {
    let r = router(&[(Method::GET, "/tags/{tag}", "get_tag")]);
    let RouteLookup::Found(m) = r.route(&Method::GET, "/tags/caf%C3%A9%20au%20lait") else {
        panic!("no match");
    };
    assert_eq!(m.get_path_param("tag"), Some("café au lait"));
}

#[test]
fn test_trailing_slash_matches() {
    let r = router(&[(Method::GET, "/health", "health")]);
    assert_eq!(operation(r.route(&Method::GET, "/health/")), "health");
}

#[test]
fn test_method_not_allowed_lists_methods() {
    let r = router(&[
        (Method::GET, "/items/{id}", "get_item"),
        (Method::DELETE, "/items/{id}", "delete_item"),
    ]);
    match r.route(&Method::PATCH, "/items/3") {
        RouteLookup::MethodNotAllowed(allowed) => {
            assert_eq!(allowed, vec![Method::DELETE, Method::GET]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_routes_listing() {
    let r = router(&[
        (Method::POST, "/b", "create_b"),
        (Method::GET, "/a", "get_a"),
    ]);
    let ops: Vec<&str> = r.routes().map(|route| route.operation.as_ref()).collect();
    assert_eq!(ops, vec!["get_a", "create_b"]);
    r.dump_routes();
}
