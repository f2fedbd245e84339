//! 호스트 IaC 프레임워크에 공개하는 스키마와 리소스 핸들러

mod collection;
mod diagnostic;
mod error;
pub mod handler;
pub mod mutation;
mod registry;
mod schema;
mod stack;

pub use collection::{CollectionHandler, CollectionModel};
pub use diagnostic::{Diagnostic, Severity};
pub use error::ProviderError;
pub use handler::{Context, NamedResourceHandler, ResourceHandler};
pub use registry::Provider;
pub use schema::{Attribute, AttributeType, ResourceSchema};
pub use stack::StackHandler;
