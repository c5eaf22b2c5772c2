mod builder;
mod server;

pub use {builder::ServerBuilder, server::Server};
