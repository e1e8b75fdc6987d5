use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use feed_cache::domain::entities::Author;
use feed_cache::infrastructure::remote::InMemoryFeedServer;
use feed_cache::infrastructure::session::StaticSession;
use feed_cache::shared::logging::init_logging;
use feed_cache::{AppConfig, FeedClient, QueryKey, UserId, Viewer};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = AppConfig::from_env();
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid feed configuration")?;

    let alice = UserId::new("alice").map_err(anyhow::Error::msg)?;
    let bob = UserId::new("bob").map_err(anyhow::Error::msg)?;

    let server = InMemoryFeedServer::new(config.remote.page_size);
    server
        .register_user(Author::new(alice.clone()).with_profile(Some("Alice".to_string()), None))
        .await;
    server
        .register_user(Author::new(bob.clone()).with_profile(Some("Bob".to_string()), None))
        .await;

    let now = Utc::now();
    let mut alice_posts = Vec::new();
    for index in 0..3 {
        let id = server
            .seed_post(
                alice.clone(),
                format!("alice post {index}"),
                now - Duration::minutes(index * 2),
            )
            .await;
        alice_posts.push(id);
    }
    for index in 0..2 {
        server
            .seed_post(
                bob.clone(),
                format!("bob post {index}"),
                now - Duration::minutes(index * 2 + 1),
            )
            .await;
    }
    server.follow(bob.clone(), alice.clone()).await;
    server.sign_in(bob.clone()).await;

    let session = StaticSession::authenticated(Viewer {
        id: bob.clone(),
        name: Some("Bob".to_string()),
        image: None,
    });
    let client = FeedClient::new(&config, Arc::new(server.clone()), Arc::new(session))?;

    let alice_profile = QueryKey::profile(alice.clone());
    for outcome in client
        .loader()
        .load_many(&[QueryKey::AllItems, alice_profile.clone()])
        .await
    {
        info!(?outcome, "Initial load finished");
    }

    let target = alice_posts
        .first()
        .cloned()
        .context("no seeded post to like")?;
    let response = client.toggle_like(target.clone()).await?;
    info!(item = %target, added_like = response.added_like, "Toggled like");

    let created = client.create_item("hello from bob").await?;
    info!(item = %created.id, "Created post");

    for query in [QueryKey::AllItems, alice_profile] {
        let snapshot = client
            .snapshot(&query)
            .await
            .with_context(|| format!("view {query} is not cached"))?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    let state = client.session().await;
    info!(
        can_like = state.can_like(),
        can_post = state.can_post(),
        can_follow_alice = state.can_follow(&alice),
        "Render gates"
    );

    client.logout().await;
    Ok(())
}
