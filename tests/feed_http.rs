// tests/feed_http.rs
use axum::{http::StatusCode, routing::get, Router};
use std::net::SocketAddr;

use spawn_sentinel::feed::http::HttpFeed;
use spawn_sentinel::feed::FeedSource;
use spawn_sentinel::HealthSignal;

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn app() -> Router {
    Router::new()
        .route(
            "/raw_data",
            get(|| async {
                r#"{"pokemons":[
                    {"pokemon_id":16,"lat":40.7581,"lng":-73.9856,"despawn":4102444800},
                    {"pokemon_id":25,"lat":"40.75800","lng":"-73.98550","despawn":4102444800,"move_1":13}
                ]}"#
            }),
        )
        .route("/broken", get(|| async { r#"{"status":"rate limited"}"# }))
        .route("/boom", get(|| async { StatusCode::BAD_GATEWAY }))
        .route("/next_loc", get(|| async { r#"{"result":"ok"}"# }))
        .route("/next_loc_bad", get(|| async { r#"{"status":"slow down"}"# }))
}

#[tokio::test]
async fn fetches_and_decodes_snapshot() {
    let addr = spawn_server(app()).await;
    let feed = HttpFeed::new(format!("http://{addr}/raw_data"));
    let snap = feed.fetch().await.unwrap();
    assert_eq!(snap.signal, HealthSignal::Success);
    assert_eq!(snap.sightings.len(), 2);
    assert_eq!(snap.sightings[1].lat.text, "40.75800");
    assert_eq!(snap.sightings[1].long.text, "-73.98550");
}

#[tokio::test]
async fn status_marker_is_failure() {
    let addr = spawn_server(app()).await;
    let feed = HttpFeed::new(format!("http://{addr}/broken"));
    let snap = feed.fetch().await.unwrap();
    assert_eq!(snap.signal, HealthSignal::Failure);
    assert!(snap.sightings.is_empty());
}

#[tokio::test]
async fn http_error_is_err() {
    let addr = spawn_server(app()).await;
    let feed = HttpFeed::new(format!("http://{addr}/boom"));
    assert!(feed.fetch().await.is_err());
}

#[tokio::test]
async fn refresh_is_classified() {
    let addr = spawn_server(app()).await;
    let base = format!("http://{addr}");

    let none = HttpFeed::new(format!("{base}/raw_data"));
    assert_eq!(none.refresh().await, None);

    let ok = HttpFeed::new(format!("{base}/raw_data"))
        .with_refresh_url(Some(format!("{base}/next_loc")));
    assert_eq!(ok.refresh().await, Some(HealthSignal::Success));

    let marked = HttpFeed::new(format!("{base}/raw_data"))
        .with_refresh_url(Some(format!("{base}/next_loc_bad")));
    assert_eq!(marked.refresh().await, Some(HealthSignal::Failure));

    let down = HttpFeed::new(format!("{base}/raw_data"))
        .with_refresh_url(Some(format!("{base}/boom")));
    assert_eq!(down.refresh().await, Some(HealthSignal::Failure));
}
