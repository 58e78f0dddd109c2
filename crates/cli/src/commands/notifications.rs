//! Notification feed commands. Only work for admin sessions.

use marketplace_client::notifications::NotificationFeed;
use marketplace_core::NotificationId;

use super::CliError;

/// Refresh and print the most recent notifications.
#[allow(clippy::print_stdout)]
pub async fn list(feed: &NotificationFeed, limit: u32) -> Result<(), CliError> {
    feed.refresh_list(limit).await?;

    for n in feed.notifications() {
        println!(
            "{} {} [{}] {}: {}",
            if n.read { " " } else { "*" },
            n.created_at.format("%Y-%m-%d %H:%M"),
            n.kind,
            n.title,
            n.message
        );
        println!("  id: {}", n.id);
    }
    println!("{} unread", feed.unread_count());
    Ok(())
}

/// Print the server's unread count.
#[allow(clippy::print_stdout)]
pub async fn unread(feed: &NotificationFeed) -> Result<(), CliError> {
    let count = feed.refresh_unread_count().await?;
    println!("{count} unread");
    Ok(())
}

/// Mark one notification as read.
#[allow(clippy::print_stdout)]
pub async fn read(feed: &NotificationFeed, id: &str) -> Result<(), CliError> {
    feed.refresh_list(100).await?;
    feed.mark_read(&NotificationId::new(id)).await?;
    println!("Marked {id} as read, {} unread", feed.unread_count());
    Ok(())
}

/// Mark every notification as read.
#[allow(clippy::print_stdout)]
pub async fn read_all(feed: &NotificationFeed) -> Result<(), CliError> {
    feed.mark_all_read().await?;
    println!("All notifications marked as read");
    Ok(())
}

/// Delete one notification.
#[allow(clippy::print_stdout)]
pub async fn delete(feed: &NotificationFeed, id: &str) -> Result<(), CliError> {
    feed.refresh_list(100).await?;
    feed.delete(&NotificationId::new(id)).await?;
    println!("Deleted {id}, {} unread", feed.unread_count());
    Ok(())
}

/// Delete every notification.
#[allow(clippy::print_stdout)]
pub async fn delete_all(feed: &NotificationFeed) -> Result<(), CliError> {
    feed.delete_all().await?;
    println!("All notifications deleted");
    Ok(())
}
