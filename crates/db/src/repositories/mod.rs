//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod category_repo;
pub mod device_repo;
pub mod home_repo;
pub mod person_repo;
pub mod role_repo;
pub mod task_person_repo;
pub mod task_repo;
pub mod tree_repo;
pub mod wish_repo;

pub use category_repo::CategoryRepo;
pub use device_repo::DeviceRepo;
pub use home_repo::HomeRepo;
pub use person_repo::PersonRepo;
pub use role_repo::RoleRepo;
pub use task_person_repo::TaskPersonRepo;
pub use task_repo::TaskRepo;
pub use tree_repo::{TreeRepo, TreeTable};
pub use wish_repo::WishRepo;
