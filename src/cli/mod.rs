pub mod app;
pub mod call;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod runtime;
pub mod serve;

pub use call::{cmd_call, CallArgs};
pub use serve::{cmd_serve, ServeArgs};
