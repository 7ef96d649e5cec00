pub mod cart_repository;
pub mod order_repository;
pub mod payment_repository;
pub mod session_repository;
pub mod user_repository;

pub use cart_repository::PostgresCartRepository;
pub use order_repository::PostgresOrderRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use session_repository::PostgresSessionRepository;
pub use user_repository::PostgresUserRepository;
