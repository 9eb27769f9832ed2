pub mod branch_repo;
pub use branch_repo::BranchRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod lookup_repo;
pub use lookup_repo::LookupRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
