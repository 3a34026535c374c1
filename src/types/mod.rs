pub mod filters;
pub mod user;

pub use filters::{JobFilters, JobPage, PageParams, SortBy};
pub use user::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, Role};
