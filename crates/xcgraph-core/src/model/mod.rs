//! Descriptions of what the manifest loader hands over: platforms,
//! products, linking enums and the workspace/project/target descriptors.

pub mod descriptor;
pub mod linking;
pub mod platform;
pub mod product;

pub use descriptor::{
    MergedBinaryType, ProjectDescriptor, ProjectKind, TargetDependency, TargetDescriptor,
    WorkspaceDescriptor,
};
pub use linking::{BinaryArchitecture, BinaryLinking, LinkingStatus, PackageKind, SdkSource};
pub use platform::{Platform, UnknownPlatform};
pub use product::Product;
