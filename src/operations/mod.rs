//! Entity operation groups built on the paging and HTTP cores.

mod briefcases;
mod changesets;
mod imodels;
mod named_versions;

pub use briefcases::{AcquireBriefcaseParams, Briefcase, BriefcaseOperations};
pub use changesets::{Changeset, ChangesetOperations};
pub use imodels::{
    CreateIModelParams, IModel, IModelOperations, IModelState, MinimalIModel, UpdateIModelParams,
};
pub use named_versions::{
    CreateNamedVersionParams, NamedVersion, NamedVersionOperations, NamedVersionState,
    UpdateNamedVersionParams,
};

/// Options common to list operations.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Page size hint (`$top`). The server may cap it; pagination follows
    /// the response links either way.
    pub top: Option<u32>,
}
