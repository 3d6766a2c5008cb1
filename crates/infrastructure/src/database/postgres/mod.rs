mod postgres_dispatch_repository;
mod postgres_user_repository;

pub use postgres_dispatch_repository::PostgresDispatchRepository;
pub use postgres_user_repository::PostgresUserRepository;
