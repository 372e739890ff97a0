pub mod id;
pub use id::{Resource, ResourceId, SpotifyId};

pub mod session;
pub use session::{ClientCredentials, Session};

pub mod catalog;
pub use catalog::Catalog;

pub mod library;

pub mod lookup;

pub mod resolver;
pub use resolver::{DownloadItem, ResolutionRequest, Resolver};

pub mod select;

pub mod reconcile;

pub mod download;

pub mod sanitize;

pub mod playlist;
