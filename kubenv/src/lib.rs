pub mod env;
pub mod gce;
pub mod kubeconfig;
pub mod select;

pub use env::{KubeEnv, KubeEnvError};
pub use kubeconfig::KubeConfig;
pub use select::{newest_kube_env, InstanceTemplate, MetadataItem, SelectError, Selection};
