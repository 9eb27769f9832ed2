pub mod asset_store;
pub mod auth;
pub mod authz;
pub mod bootstrap;
pub mod branch_service;
pub mod company_service;
pub mod employee_service;
