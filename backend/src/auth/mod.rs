pub mod jwt_service;
pub mod middleware;

pub use jwt_service::JwtService;
pub use middleware::AuthMiddleware;
