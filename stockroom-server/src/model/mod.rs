use std::sync::Arc;

mod user;
pub use user::{Role, User};

mod context;
pub use context::AppContext;

pub type AxumRouter = axum::Router<Arc<AppContext>>;

pub trait Identifiable<Id> {
    fn id(&self) -> Id;
}
