//! Resource calls against the scripted backend.

use desk_api::{
    ApiError, DeskApi, ImageUpload, PageRequest, PhotoUpload, RequestFilter, RequestStatus,
    SortField,
};
use desk_http::testing::{MockBackend, RefreshOutcome};
use desk_http::{AccessToken, ApiClient, FormPart, RequestBody};
use serde_json::json;
use std::sync::Arc;

fn empty_page() -> serde_json::Value {
    json!({ "content": [], "currentPage": 0, "totalItems": 0, "totalPages": 0 })
}

fn api(backend: &Arc<MockBackend>, token: &str) -> DeskApi {
    backend.set_valid_token(token);
    let client = Arc::new(ApiClient::new(backend.clone()));
    client.attach_access_token(Some(AccessToken::new(token)));
    DeskApi::new(client)
}

fn query_of(backend: &MockBackend, path: &str) -> Vec<(String, String)> {
    backend
        .requests_to(path)
        .last()
        .map(|r| r.query.clone())
        .unwrap_or_default()
}

fn pair(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

#[tokio::test]
async fn list_requests_sends_filters_then_paging() {
    let backend = MockBackend::new();
    backend.route("/api/requests", empty_page());
    let api = api(&backend, "t1");

    let filter = RequestFilter {
        search_term: Some("  leaking tap ".into()),
        shop_id: Some(3),
        overdue: true,
        status: Some(RequestStatus::InWork),
        ..RequestFilter::default()
    };
    let page = PageRequest::page(2).sorted_by(SortField::desc("createdAt"));
    let result = api.list_requests(&page, &filter).await.unwrap();

    assert!(result.content.is_empty());
    assert_eq!(
        query_of(&backend, "/api/requests"),
        vec![
            pair("archived", "false"),
            pair("searchTerm", "leaking tap"),
            pair("shopId", "3"),
            pair("overdue", "true"),
            pair("status", "In work"),
            pair("page", "2"),
            pair("size", "40"),
            pair("sort", "createdAt,desc"),
        ]
    );
}

#[tokio::test]
async fn expired_token_is_refreshed_for_resource_calls() {
    let backend = MockBackend::new();
    backend.route("/api/admin/users", empty_page());
    let api = api(&backend, "t1");
    backend.set_valid_token("rotated-elsewhere");
    backend.push_refresh(RefreshOutcome::Issue("t2".into()));

    api.list_users(&PageRequest::default(), Some("Contractor"))
        .await
        .unwrap();

    let calls = backend.requests_to("/api/admin/users");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].authorization.as_deref(), Some("Bearer t2"));
    assert!(calls[1].query.contains(&pair("role", "Contractor")));
    assert_eq!(backend.refresh_calls(), 1);
}

#[tokio::test]
async fn upload_photos_sends_repeated_file_parts() {
    let backend = MockBackend::new();
    backend.route("/api/requests/7/photos", json!(null));
    let api = api(&backend, "t1");

    let photos = vec![
        PhotoUpload {
            file_name: "a.jpg".into(),
            mime: "image/jpeg".into(),
            bytes: vec![1, 2],
        },
        PhotoUpload {
            file_name: "b.png".into(),
            mime: "image/png".into(),
            bytes: vec![3],
        },
    ];
    api.upload_photos(7, &photos).await.unwrap();

    let sent = backend.requests_to("/api/requests/7/photos");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, "POST");
    let RequestBody::Multipart(form) = &sent[0].body else {
        panic!("expected a multipart body, got {:?}", sent[0].body);
    };
    let files: Vec<_> = form
        .parts()
        .iter()
        .filter_map(|part| match part {
            FormPart::File {
                name, file_name, ..
            } => Some((name.as_str(), file_name.as_str())),
            FormPart::Text { .. } => None,
        })
        .collect();
    assert_eq!(files, vec![("files", "a.jpg"), ("files", "b.png")]);
}

#[tokio::test]
async fn empty_upload_is_rejected_locally() {
    let backend = MockBackend::new();
    let api = api(&backend, "t1");

    let result = api.upload_photos(7, &[]).await;

    assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn add_comment_posts_trimmed_text() {
    let backend = MockBackend::new();
    backend.route(
        "/api/requests/4/comments",
        json!({
            "commentID": 11,
            "requestID": 4,
            "userLogin": "manager",
            "commentText": "On my way",
            "createdAt": "2024-03-01T10:15:00"
        }),
    );
    let api = api(&backend, "t1");

    let comment = api.add_comment(4, "  On my way ").await.unwrap();

    assert_eq!(comment.comment_id, 11);
    let sent = backend.requests_to("/api/requests/4/comments");
    assert_eq!(
        sent[0].body,
        RequestBody::Json(json!({ "commentText": "On my way" }))
    );
}

#[tokio::test]
async fn send_message_with_image_builds_form() {
    let backend = MockBackend::new();
    backend.route("/api/admin/messaging/send-with-image", json!(null));
    let api = api(&backend, "t1");

    let image = ImageUpload {
        file_name: "notice.png".into(),
        mime: "image/png".into(),
        bytes: vec![0x89, 0x50],
    };
    api.send_message_with_image("Store closes early", &[1, 9], Some(&image))
        .await
        .unwrap();

    let sent = backend.requests_to("/api/admin/messaging/send-with-image");
    let RequestBody::Multipart(form) = &sent[0].body else {
        panic!("expected a multipart body");
    };
    assert_eq!(
        form.parts()[1],
        FormPart::Text {
            name: "recipientChatIds".into(),
            value: "1,9".into()
        }
    );
    assert!(matches!(&form.parts()[2], FormPart::File { name, .. } if name == "image"));
}

#[tokio::test]
async fn send_message_requires_recipients() {
    let backend = MockBackend::new();
    let api = api(&backend, "t1");

    let result = api.send_message("hello", &[]).await;

    assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn notifications_filter_by_activity() {
    let backend = MockBackend::new();
    backend.route("/api/admin/notifications", empty_page());
    let api = api(&backend, "t1");

    api.list_notifications(&PageRequest::default(), Some(true))
        .await
        .unwrap();

    assert!(query_of(&backend, "/api/admin/notifications").contains(&pair("isActive", "true")));
}

#[tokio::test]
async fn missing_resource_surfaces_as_not_found() {
    let backend = MockBackend::new();
    let api = api(&backend, "t1");

    let error = api.delete_shop(99).await.unwrap_err();

    assert!(error.is_not_found());
    assert_eq!(error.status_code(), Some(404));
}
