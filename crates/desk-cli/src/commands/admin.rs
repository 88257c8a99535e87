//! Admin resource listings. Only the `Admin` role may open these.

use super::Desk;
use crate::output::{self, or_dash, OutputFormat};
use anyhow::Result;
use desk_api::{PageRequest, Schedule};
use desk_auth::Role;

pub async fn users_list(
    desk: &Desk,
    role: Option<&str>,
    page: u32,
    format: &OutputFormat,
) -> Result<()> {
    desk.authorize(Some(&[Role::Admin][..]), "/admin/users").await?;
    let users = desk
        .api()
        .list_users(&PageRequest::page(page), role)
        .await?;
    output::print_page("Users", &users, format, |user| {
        println!("#{:<6} {} ({})", user.user_id, user.login, user.role_name);
        output::print_row("Name", &or_dash(user.full_name.as_deref()));
        output::print_row("Contact", &or_dash(user.contact_info.as_deref()));
    });
    Ok(())
}

pub async fn shops_list(desk: &Desk, page: u32, format: &OutputFormat) -> Result<()> {
    desk.authorize(Some(&[Role::Admin][..]), "/admin/shops").await?;
    let shops = desk.api().list_shops(&PageRequest::page(page)).await?;
    output::print_page("Shops", &shops, format, |shop| {
        println!("#{:<6} {}", shop.shop_id, shop.shop_name);
        output::print_row("Address", &or_dash(shop.address.as_deref()));
        output::print_row("Manager", &or_dash(shop.user_login.as_deref()));
    });
    Ok(())
}

pub async fn notifications_list(
    desk: &Desk,
    active: Option<bool>,
    page: u32,
    format: &OutputFormat,
) -> Result<()> {
    desk.authorize(Some(&[Role::Admin][..]), "/admin/notifications")
        .await?;
    let notifications = desk
        .api()
        .list_notifications(&PageRequest::page(page), active)
        .await?;
    output::print_page("Notifications", &notifications, format, |notification| {
        let state = if notification.is_active {
            "active"
        } else {
            "paused"
        };
        println!(
            "#{:<6} {} [{}]",
            notification.notification_id, notification.title, state
        );
        output::print_row("Schedule", &describe(notification.schedule()));
        output::print_row("Recipients", &notification.recipient_chat_ids.len().to_string());
    });
    Ok(())
}

fn describe(schedule: Option<Schedule>) -> String {
    match schedule {
        Some(Schedule::Daily { hour, minute }) => format!("daily at {:02}:{:02}", hour, minute),
        Some(Schedule::Weekly {
            hour,
            minute,
            day_of_week,
        }) => format!(
            "weekly on {} at {:02}:{:02}",
            weekday(day_of_week),
            hour,
            minute
        ),
        Some(Schedule::Monthly {
            hour,
            minute,
            day_of_month,
        }) => format!("monthly on day {} at {:02}:{:02}", day_of_month, hour, minute),
        Some(Schedule::Custom(expression)) => format!("cron {}", expression),
        None => "invalid".to_string(),
    }
}

fn weekday(day: u8) -> &'static str {
    match day {
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "Sunday",
    }
}
