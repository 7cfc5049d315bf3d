use fluently_core::{
    Body, ClientContext, Headers, Method, Request, RequestHashExt, RequestHasher,
    RequestHashingOptions, keys,
};
use serde_json::json;

const BASE_URL: &str = "https://sketch7.com/api";

fn default_headers() -> Headers {
    let mut headers = Headers::new();
    headers.add("Accept", ["application/json", "text/json"]).unwrap();
    headers.add("User-Agent", ["fluently"]).unwrap();
    headers
}

fn client() -> ClientContext {
    ClientContext::new("sketch7")
        .with_base_url(BASE_URL)
        .with_default_headers(default_headers())
}

fn hero_request() -> Request {
    Request::new(Method::GET, "/heroes/azmodan")
        .with_header("locale", "en-GB")
        .with_header("X-SSV-VERSION", "2019.02-2")
}

#[test]
fn azmodan_fingerprint_literal() {
    let client = client();
    let hash = RequestHasher::new(&client).compute(&hero_request());

    assert_eq!(
        hash,
        "method=GET;url=https://sketch7.com/api/heroes/azmodan;\
         headers=Accept=application/json,text/json&User-Agent=fluently&locale=en-GB&X-SSV-VERSION=2019.02-2;\
         content="
    );
}

#[test]
fn excluded_header_changes_only_headers_segment() {
    let client = client();
    let hasher = RequestHasher::new(&client);
    let baseline = hasher.compute(&hero_request());

    let request = hero_request()
        .with_header("local", "en-GB")
        .with_header("Authorization", "Bearer 123")
        .with_hashing_options(RequestHashingOptions::new().exclude_header("Authorization"));
    let hash = hasher.compute(&request);

    assert_eq!(hash, baseline.replace(";content=", "&local=en-GB;content="));
}

#[test]
fn fingerprint_is_deterministic() {
    let client = client();
    let hasher = RequestHasher::new(&client);

    let body = json!({ "name": "azmodan", "roles": ["assassin"], "stats": { "hp": 1, "armor": 2 } });
    let reordered = json!({ "stats": { "armor": 2, "hp": 1 }, "roles": ["assassin"], "name": "azmodan" });

    let a = Request::new(Method::POST, "heroes").with_body(body);
    let b = Request::new(Method::POST, "/heroes").with_body(reordered);

    assert_eq!(hasher.compute(&a), hasher.compute(&b));
}

#[test]
fn header_segment_follows_insertion_order() {
    let client = client();
    let hasher = RequestHasher::new(&client);

    let locale_first = Request::new(Method::GET, "/heroes")
        .with_header("locale", "en-GB")
        .with_header("X-SSV-VERSION", "2019.02-2");
    let version_first = Request::new(Method::GET, "/heroes")
        .with_header("X-SSV-VERSION", "2019.02-2")
        .with_header("locale", "en-GB");
    assert_ne!(hasher.compute(&locale_first), hasher.compute(&version_first));

    // Replacing a value keeps the header's original position.
    let mut replaced = Request::new(Method::GET, "/heroes")
        .with_header("locale", "fr-FR")
        .with_header("X-SSV-VERSION", "2019.02-2");
    replaced.headers_mut().set("locale", ["en-GB"]);
    assert_eq!(hasher.compute(&replaced), hasher.compute(&locale_first));

    // A request header overriding a client default keeps the default's slot.
    let accept_override = Request::new(Method::GET, "/heroes").with_header("Accept", "text/json");
    assert!(
        hasher
            .compute(&accept_override)
            .contains("headers=Accept=text/json&User-Agent=fluently;")
    );
}

#[test]
fn fingerprint_is_sensitive() {
    let client = client();
    let hasher = RequestHasher::new(&client);
    let baseline = hasher.compute(&hero_request());

    let other_method = Request::new(Method::DELETE, "/heroes/azmodan")
        .with_header("locale", "en-GB")
        .with_header("X-SSV-VERSION", "2019.02-2");
    let other_url = Request::new(Method::GET, "/heroes/rexxar")
        .with_header("locale", "en-GB")
        .with_header("X-SSV-VERSION", "2019.02-2");
    let other_header = hero_request().with_header("locale", "fr-FR");
    let with_body = hero_request().with_body(json!({ "level": 20 }));

    for request in [other_method, other_url, other_header, with_body] {
        assert_ne!(hasher.compute(&request), baseline);
    }
}

#[test]
fn exclusions_compose_against_baseline() {
    let client = client();
    let hasher = RequestHasher::new(&client);

    let baseline = hasher.compute(&Request::new(Method::GET, "/heroes"));

    let request = Request::new(Method::GET, "/heroes")
        .with_header("Authorization", "Bearer 123")
        .with_header("X-Request-Id", "42")
        .with_hashing_options(
            RequestHashingOptions::new()
                .exclude_header("Authorization")
                .with_headers_exclude(|name, _| name.starts_with("X-Request")),
        );
    assert_eq!(hasher.compute(&request), baseline);
}

#[test]
fn exclusions_do_not_mutate_request() {
    let client = client();
    let request = hero_request()
        .with_header("Authorization", "Bearer 123")
        .with_hashing_options(RequestHashingOptions::new().exclude_header("Authorization"));

    RequestHasher::new(&client).compute(&request);
    assert_eq!(request.headers().get_first("Authorization"), Some("Bearer 123"));
}

#[test]
fn client_options_apply_unless_request_overrides() {
    let client = client().with_hashing(RequestHashingOptions::new().exclude_header("locale"));
    let hasher = RequestHasher::new(&client);

    let hash = hasher.compute(&hero_request());
    assert!(!hash.contains("locale="));

    let overridden = hero_request().with_hashing_options(RequestHashingOptions::new());
    assert!(hasher.compute(&overridden).contains("locale=en-GB"));
}

#[test]
fn uri_manipulation_rewrites_resolved_url() {
    let client = client().with_hashing(
        RequestHashingOptions::new()
            .with_uri_manipulation(|url| url.split('?').next().unwrap_or(url).to_owned()),
    );
    let request = Request::new(Method::GET, "/heroes?cache-bust=123");

    let hash = RequestHasher::new(&client).compute(&request);
    assert!(hash.starts_with("method=GET;url=https://sketch7.com/api/heroes;"));
}

#[test]
fn invariant_body_is_ignored() {
    let client = client();
    let hasher = RequestHasher::new(&client);
    let options = RequestHashingOptions::new().with_invariant_body(true);

    let a = Request::new(Method::POST, "/heroes")
        .with_body(json!({ "name": "azmodan" }))
        .with_hashing_options(options.clone());
    let b = Request::new(Method::POST, "/heroes")
        .with_body(json!({ "name": "rexxar" }))
        .with_hashing_options(options);

    let hash = hasher.compute(&a);
    assert_eq!(hash, hasher.compute(&b));
    assert!(hash.ends_with(";content="));
}

#[test]
fn raw_body_never_contributes() {
    let client = client();
    let request = Request::new(Method::POST, "/upload").with_body(Body::Raw("blob".into()));
    assert!(RequestHasher::new(&client).compute(&request).ends_with(";content="));
}

#[test]
fn generate_caches_on_items() {
    let client = client();
    let hasher = RequestHasher::new(&client);
    let mut request = hero_request();

    let first = hasher.generate(&mut request);
    assert_eq!(request.computed_hash(), Some(first.as_str()));

    request.headers_mut().set("locale", ["fr-FR"]);
    assert_eq!(hasher.generate(&mut request), first);

    let items = request.take_items();
    assert_eq!(items.get::<String>(keys::REQUEST_HASH), Some(&first));
}
