//! HTTP clients for the alerting back-ends.
//!
//! Both clients carry a fixed request timeout and map any unexpected status
//! to [`DeliveryError::Protocol`](crate::DeliveryError::Protocol).

pub mod connect;
pub mod tetra;

pub use connect::{ConnectClient, ConnectOverrides, Operation, OperationTemplate, build_operation};
pub use tetra::{CalloutCounter, SdsDefaults, SdsMessage, SdsOverrides, SdsType, TetraClient, build_sds};
