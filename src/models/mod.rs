//! Data models for the bistro-link client library.
//!
//! Request and response structures for the REST collaborators plus the
//! push-frame wire messages.

pub mod auth_response;
pub mod client_frame;
pub mod connection_options;
pub mod connection_state;
pub mod login_request;
pub mod notification;
pub mod notification_page;
pub mod refresh_request;
pub mod refresh_response;
pub mod register_request;
pub mod server_frame;
pub mod unread_count;
pub mod user;


pub use auth_response::AuthResponse;
pub use client_frame::ClientFrame;
pub use connection_options::ConnectionOptions;
pub use connection_state::ConnectionState;
pub use login_request::LoginRequest;
pub use notification::{Notification, NotificationKind};
pub use notification_page::NotificationPage;
pub use refresh_request::RefreshRequest;
pub use refresh_response::RefreshResponse;
pub use register_request::RegisterRequest;
pub use server_frame::ServerFrame;
pub use unread_count::UnreadCountResponse;
pub use user::User;
