mod bigquery;
mod dataform;
mod gcp;
mod mock;
mod model;
mod rest;
mod source;
mod transfer;

pub use bigquery::{BqClient, BIGQUERY_URL};
pub use dataform::{DataformClient, DATAFORM_URL};
pub use gcp::GcpSource;
pub use mock::MockSource;
pub use rest::{RestClient, TokenSource, ACCESS_TOKEN_ENV};
pub use source::ResourceSource;
pub use transfer::{TransferClient, DATA_TRANSFER_URL};
