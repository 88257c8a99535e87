//! Maintenance request commands.

use super::Desk;
use crate::output::{self, or_dash, OutputFormat};
use anyhow::Result;
use desk_api::{PageRequest, RequestFilter, SortField};

const LOCATION: &str = "/requests";

/// List active or archived requests, newest first.
pub async fn requests_list(
    desk: &Desk,
    filter: RequestFilter,
    page: u32,
    format: &OutputFormat,
) -> Result<()> {
    desk.authorize(None, LOCATION).await?;
    let page_request = PageRequest::page(page).sorted_by(SortField::desc("createdAt"));
    let requests = desk.api().list_requests(&page_request, &filter).await?;

    let title = if filter.archived {
        "Archived requests"
    } else {
        "Requests"
    };
    output::print_page(title, &requests, format, |request| {
        let overdue = if request.is_overdue() { " (overdue)" } else { "" };
        println!(
            "#{:<6} {}{}",
            request.request_id, request.status, overdue
        );
        output::print_row("Shop", &or_dash(request.shop_name.as_deref()));
        output::print_row("Category", &or_dash(request.work_category_name.as_deref()));
        output::print_row("Urgency", &or_dash(request.urgency_name.as_deref()));
        output::print_row(
            "Contractor",
            &or_dash(request.assigned_contractor_name.as_deref()),
        );
        output::print_row("Days left", &or_dash(request.days_remaining));
        output::print_row("Description", &request.description);
    });
    Ok(())
}

pub async fn requests_show_comments(
    desk: &Desk,
    request_id: i32,
    format: &OutputFormat,
) -> Result<()> {
    desk.authorize(None, LOCATION).await?;
    let comments = desk.api().list_comments(request_id).await?;
    output::print_list(
        &format!("Comments on request #{}", request_id),
        &comments,
        format,
        |comment| {
            let when = comment
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string());
            println!("[{}] {}", or_dash(when), comment.user_login);
            println!("  {}", comment.comment_text);
        },
    );
    Ok(())
}

pub async fn requests_comment(
    desk: &Desk,
    request_id: i32,
    text: &str,
    format: &OutputFormat,
) -> Result<()> {
    desk.authorize(None, LOCATION).await?;
    let comment = desk.api().add_comment(request_id, text).await?;
    output::print_success(
        &format!(
            "Comment #{} added to request #{}",
            comment.comment_id, request_id
        ),
        format,
    );
    Ok(())
}

pub async fn requests_complete(desk: &Desk, request_id: i32, format: &OutputFormat) -> Result<()> {
    desk.authorize(None, LOCATION).await?;
    desk.api().complete_request(request_id).await?;
    output::print_success(&format!("Request #{} completed", request_id), format);
    Ok(())
}
