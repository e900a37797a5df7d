pub mod banner;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod event;
pub mod logging;
pub mod message;
pub mod mime;
pub mod relay;
pub mod service;
pub mod services;
pub mod store;
pub mod stores;
pub mod transformer;

pub use banner::*;
pub use codec::*;
pub use config::*;
pub use dispatcher::*;
pub use event::*;
pub use message::*;
pub use mime::*;
pub use relay::*;
pub use service::*;
pub use services::*;
pub use store::*;
pub use stores::*;
pub use transformer::*;
