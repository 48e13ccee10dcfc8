//! Favorites persisted on disk survive a new service instance.
//!
//! Set `FIELDGUIDE_LOCAL_STORE_DIR` to choose the directory; it defaults to
//! `./.fieldguide/local`.

use std::sync::Arc;

use fieldguide_likes::local::FileKeyValueStore;
use fieldguide_likes::store::InMemoryDocumentStore;
use fieldguide_likes::LocationInterestService;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let local = FileKeyValueStore::from_env()?;
    println!("storing favorites under {}", local.base_dir().display());

    let service = LocationInterestService::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(local.clone()),
    );
    let now_favorite = service.toggle_favorite_location("u1", "loc1").await;
    println!("loc1 favorited: {now_favorite}");

    let reopened = LocationInterestService::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(FileKeyValueStore::new(local.base_dir().clone())?),
    );
    println!(
        "favorites after reopening: {:?}",
        reopened.get_favorite_locations("u1").await
    );
    Ok(())
}
