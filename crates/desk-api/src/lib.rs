//! Typed resources of the facility desk REST API.
//!
//! Every call goes through [`desk_http::ApiClient`] and so shares its token
//! refresh behaviour.

pub mod api;
pub mod categories;
pub mod chats;
pub mod cron;
pub mod error;
pub mod messaging;
pub mod notifications;
pub mod pagination;
pub mod requests;
pub mod shops;
pub mod users;

pub use api::DeskApi;
pub use categories::{UrgencyCategoryResponse, WorkCategoryRequest, WorkCategoryResponse};
pub use chats::{ShopContractorChatRequest, ShopContractorChatResponse};
pub use cron::Schedule;
pub use error::{ApiError, ApiResult};
pub use messaging::{ImageUpload, MessageTemplateResponse, TemplateForm};
pub use notifications::{NotificationRequest, NotificationResponse};
pub use pagination::{PageRequest, Paged, SortDirection, SortField, PAGE_SIZE};
pub use requests::{
    CommentResponse, CreateRequestRequest, PhotoUpload, RequestFilter, RequestResponse,
    RequestStatus, UpdateRequestRequest,
};
pub use shops::{ShopRequest, ShopResponse};
pub use users::{CreateUserRequest, RoleResponse, UpdateUserRequest, UserResponse};
