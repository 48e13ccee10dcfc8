//! Likes and favorites against in-memory stores, including a self-healed `likes` field.

use std::sync::Arc;

use fieldguide_likes::local::InMemoryKeyValueStore;
use fieldguide_likes::store::{DocumentKey, InMemoryDocumentStore, MapValue, StoreValue};
use fieldguide_likes::LocationInterestService;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let remote = InMemoryDocumentStore::new();
    remote.insert_document(
        DocumentKey::new("locations", "loc1")?,
        [("name", StoreValue::from_string("Clover meadow"))]
            .into_iter()
            .collect::<MapValue>(),
    );
    remote.insert_document(
        DocumentKey::new("locations", "loc2")?,
        [
            ("name", StoreValue::from_string("Butterfly garden")),
            ("likes", StoreValue::from_string("not-an-array")),
        ]
        .into_iter()
        .collect::<MapValue>(),
    );

    let service = LocationInterestService::new(
        Arc::new(remote.clone()),
        Arc::new(InMemoryKeyValueStore::new()),
    );

    println!("loc1 likes: {}", service.get_likes_count("loc1").await);
    println!("u1 likes loc1: {}", service.like_location("u1", "loc1").await);
    println!("loc1 likes: {}", service.get_likes_count("loc1").await);
    println!("toggle -> liked: {}", service.toggle_like_location("u1", "loc1").await);

    println!("u1 likes loc2: {}", service.is_liked("u1", "loc2").await);
    let repaired = remote
        .document(&DocumentKey::new("locations", "loc2")?)
        .and_then(|data| data.get("likes").cloned());
    println!("loc2 likes field after read: {:?}", repaired);

    service.favorite_location("u2", "loc1").await;
    service.favorite_location("u2", "loc2").await;
    for location in service.get_favorite_location_records("u2").await {
        println!("favorite {}: {}", location.id(), location.name().unwrap_or("-"));
    }

    println!("remote operations: {:?}", remote.operation_counts());
    Ok(())
}
