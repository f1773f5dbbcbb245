//! Remote resource store client
//!
//! A small abstraction over the Kubernetes API used by the VirtOps operand
//! engine: get / create / update / merge-patch / delete / list on dynamic
//! objects, with "not found" reported as a distinct error.
//!
//! # Example
//!
//! ```no_run
//! use resource_store::{KubeStore, ResourceKey, ResourceStoreTrait};
//! use k8s_openapi::api::core::v1::ConfigMap;
//! use kube::discovery::ApiResource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = KubeStore::new(kube::Client::try_default().await?);
//! let key = ResourceKey {
//!     resource: ApiResource::erase::<ConfigMap>(&()),
//!     namespace: Some("virtops".to_string()),
//!     name: "kubevirt-ui-features".to_string(),
//! };
//! match store.get(&key).await {
//!     Ok(obj) => println!("found {:?}", obj.metadata.uid),
//!     Err(e) if e.is_not_found() => println!("absent"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod key;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeStore;
pub use error::StoreError;
pub use key::ResourceKey;
pub use store_trait::ResourceStoreTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockResourceStore, StoreCall, StoreOp};
